//! Event structures for matching engine
//!
//! Book events describe level changes for market-data consumers.
//! Settlement events carry trades and cancellations to whatever persists
//! them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use types::ids::{MarketId, OrderId};
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};
use types::trade::Trade;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum BookEventKind {
    /// Quantity added to a level
    OrderOpen,
    /// Quantity taken from a level by a trade
    OrderMatch,
    /// Quantity withdrawn from a level by a cancellation
    OrderCancel,
}

/// Level change on one side of one market
///
/// `side` and `price` identify the level. For a match they are the maker's.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookEvent {
    pub market: MarketId,
    /// Strictly increasing per market
    pub sequence: u64,
    pub kind: BookEventKind,
    pub side: Side,
    pub price: Price,
    pub amount: Quantity,
    /// Quote funds involved; zero for ask opens and cancels
    pub funds: Quantity,
}

/// Order cancelled event
///
/// Carries the order as it stood when cancelled, including partial fills,
/// so the collaborator can return the unfilled remainder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCancelledEvent {
    pub market: MarketId,
    pub order_id: OrderId,
    pub user_id: String,
    pub side: Side,
    pub filled_amount: Quantity,
    pub filled_funds: Quantity,
    /// Base asset returned to an ask's owner
    pub unfilled_amount: Quantity,
    /// Quote funds returned to a bid's owner
    pub unfilled_funds: Quantity,
    pub cancelled_at: DateTime<Utc>,
}

impl OrderCancelledEvent {
    pub fn from_order(market: MarketId, order: &Order) -> Self {
        Self {
            market,
            order_id: order.id,
            user_id: order.user_id.clone(),
            side: order.side,
            filled_amount: order.filled_amount,
            filled_funds: order.filled_funds,
            unfilled_amount: order.remaining_amount,
            unfilled_funds: order.remaining_funds,
            cancelled_at: Utc::now(),
        }
    }
}

/// Side effect handed to the settlement collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementEvent {
    TradeExecuted(Trade),
    OrderCancelled(OrderCancelledEvent),
}
