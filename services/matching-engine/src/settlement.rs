//! Settlement seam
//!
//! The book reports every match and every cancellation through a
//! [`Settlement`]. Both callbacks run on the market's matching path, so
//! implementations must hand the work off rather than perform it inline.

use tokio::sync::mpsc;
use tracing::warn;
use types::ids::{MarketId, TradeId};
use types::numeric::Quantity;
use types::order::Order;
use types::trade::Trade;

use crate::events::{OrderCancelledEvent, SettlementEvent};

pub trait Settlement: Send + 'static {
    /// Record `amount` matched between `taker` and `maker`
    ///
    /// Both orders already reflect the fill.
    fn transact(&mut self, taker: &Order, maker: &Order, amount: Quantity) -> TradeId;

    /// Return the unfilled remainder of `order` to its owner
    fn cancel(&mut self, order: &Order);
}

/// Settlement that forwards records onto an unbounded channel
///
/// The receiver persists and settles them at its own pace.
#[derive(Debug, Clone)]
pub struct ChannelSettlement {
    market: MarketId,
    sender: mpsc::UnboundedSender<SettlementEvent>,
}

impl ChannelSettlement {
    pub fn new(market: MarketId) -> (Self, mpsc::UnboundedReceiver<SettlementEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { market, sender }, receiver)
    }

    /// Share an existing sender, e.g. one consumer for many markets
    pub fn with_sender(market: MarketId, sender: mpsc::UnboundedSender<SettlementEvent>) -> Self {
        Self { market, sender }
    }

    fn send(&self, event: SettlementEvent) {
        // The match already happened; a vanished consumer is its own problem.
        if self.sender.send(event).is_err() {
            warn!(market = %self.market, "settlement receiver dropped");
        }
    }
}

impl Settlement for ChannelSettlement {
    fn transact(&mut self, taker: &Order, maker: &Order, amount: Quantity) -> TradeId {
        let trade = Trade::between(self.market.clone(), taker, maker, amount);
        let trade_id = trade.trade_id;
        self.send(SettlementEvent::TradeExecuted(trade));
        trade_id
    }

    fn cancel(&mut self, order: &Order) {
        let event = OrderCancelledEvent::from_order(self.market.clone(), order);
        self.send(SettlementEvent::OrderCancelled(event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use types::ids::OrderId;
    use types::numeric::Price;
    use types::order::OrderType;

    #[test]
    fn test_channel_settlement_forwards_trade_and_cancel() {
        let market = MarketId::new("XIN/USDT");
        let (mut settlement, mut rx) = ChannelSettlement::new(market.clone());
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
            OrderType::Limit,
            Price::from_u64(100),
            Quantity::from_u64(300),
            Utc::now(),
        );

        let trade_id = settlement.transact(&taker, &maker, Quantity::from_u64(3));
        settlement.cancel(&maker);

        match rx.try_recv().unwrap() {
            SettlementEvent::TradeExecuted(trade) => {
                assert_eq!(trade.trade_id, trade_id);
                assert_eq!(trade.market, market);
                assert_eq!(trade.funds, Quantity::from_u64(300));
            }
            other => panic!("expected trade, got {:?}", other),
        }
        assert!(matches!(
            rx.try_recv().unwrap(),
            SettlementEvent::OrderCancelled(ref c) if c.order_id == maker.id
        ));
    }

    #[test]
    fn test_dropped_receiver_does_not_panic() {
        let (mut settlement, rx) = ChannelSettlement::new(MarketId::new("XIN/USDT"));
        drop(rx);
        let order = Order::ask(
            OrderId::new(),
            "seller",
            OrderType::Limit,
            Price::from_u64(1),
            Quantity::from_u64(1),
            Utc::now(),
        );
        settlement.cancel(&order);
    }
}
