//! Trade records handed to settlement
//!
//! One Trade per match. Execution price is always the maker's price.

use crate::ids::{MarketId, OrderId, TradeId};
use crate::numeric::{Price, Quantity};
use crate::order::{Order, Side};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub market: MarketId,
    pub ask_order_id: OrderId,
    pub bid_order_id: OrderId,
    pub ask_user_id: String,
    pub bid_user_id: String,
    /// Side of the incoming order
    pub taker_side: Side,
    pub price: Price,
    /// Base asset moved from the ask to the bid
    pub amount: Quantity,
    /// Quote asset moved from the bid to the ask
    pub funds: Quantity,
    pub executed_at: DateTime<Utc>,
}

impl Trade {
    /// Build the record of `amount` matched between `taker` and `maker`
    pub fn between(market: MarketId, taker: &Order, maker: &Order, amount: Quantity) -> Self {
        let (ask, bid) = match taker.side {
            Side::Ask => (taker, maker),
            Side::Bid => (maker, taker),
        };
        Self {
            trade_id: TradeId::new(),
            market,
            ask_order_id: ask.id,
            bid_order_id: bid.id,
            ask_user_id: ask.user_id.clone(),
            bid_user_id: bid.user_id.clone(),
            taker_side: taker.side,
            price: maker.price,
            amount,
            funds: amount.times(maker.price),
            executed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderType;

    #[test]
    fn test_trade_between_bid_taker() {
        let maker = Order::ask(
            OrderId::new(),
            "seller",
            OrderType::Limit,
            Price::from_u64(100),
            Quantity::from_u64(5),
            Utc::now(),
        );
        let taker = Order::bid(
            OrderId::new(),
            "buyer",
            OrderType::Market,
            Price::zero(),
            Quantity::from_u64(1000),
            Utc::now(),
        );

        let trade = Trade::between(MarketId::new("BTC/USDT"), &taker, &maker, Quantity::from_u64(2));

        assert_eq!(trade.ask_order_id, maker.id);
        assert_eq!(trade.bid_order_id, taker.id);
        assert_eq!(trade.ask_user_id, "seller");
        assert_eq!(trade.price, Price::from_u64(100));
        assert_eq!(trade.funds, Quantity::from_u64(200));
        assert_eq!(trade.taker_side, Side::Bid);
    }
}
