//! Read-only book snapshots for market-data views

use serde::{Deserialize, Serialize};
use types::ids::MarketId;
use types::numeric::{Price, Quantity};
use types::order::Side;

use crate::book::{Page, PriceLevel};

/// Aggregate view of one price level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub price: Price,
    /// Base amount available: the ask total, or what the bid funds buy
    pub amount: Quantity,
    /// Quote funds committed; zero on the ask side
    pub funds: Quantity,
    pub order_count: usize,
}

impl LevelSnapshot {
    pub fn capture(level: &PriceLevel) -> Self {
        let funds = match level.side() {
            Side::Ask => Quantity::zero(),
            Side::Bid => level.total(),
        };
        Self {
            price: level.price(),
            amount: level.amount(),
            funds,
            order_count: level.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub market: MarketId,
    /// Book event sequence at capture time
    pub sequence: u64,
    /// Best (lowest) price first
    pub asks: Vec<LevelSnapshot>,
    /// Best (highest) price first
    pub bids: Vec<LevelSnapshot>,
}

impl BookSnapshot {
    /// Capture up to `depth` levels per side; 0 means every level
    pub fn capture(
        market: MarketId,
        sequence: u64,
        asks: &Page,
        bids: &Page,
        depth: usize,
    ) -> Self {
        Self {
            market,
            sequence,
            asks: side_levels(asks, depth),
            bids: side_levels(bids, depth),
        }
    }

    pub fn best_ask(&self) -> Option<&LevelSnapshot> {
        self.asks.first()
    }

    pub fn best_bid(&self) -> Option<&LevelSnapshot> {
        self.bids.first()
    }

    pub fn level(&self, side: Side, price: Price) -> Option<&LevelSnapshot> {
        let levels = match side {
            Side::Ask => &self.asks,
            Side::Bid => &self.bids,
        };
        levels.iter().find(|level| level.price == price)
    }
}

fn side_levels(page: &Page, depth: usize) -> Vec<LevelSnapshot> {
    let limit = if depth == 0 { usize::MAX } else { depth };
    page.levels()
        .take(limit)
        .map(LevelSnapshot::capture)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use types::ids::OrderId;
    use types::order::{Order, OrderType};

    fn bid(price: u64, funds: &str) -> Order {
        Order::bid(
            OrderId::new(),
            "buyer",
            OrderType::Limit,
            Price::from_u64(price),
            funds.parse().unwrap(),
            Utc::now(),
        )
    }

    fn ask(price: u64, amount: u64) -> Order {
        Order::ask(
            OrderId::new(),
            "seller",
            OrderType::Limit,
            Price::from_u64(price),
            Quantity::from_u64(amount),
            Utc::now(),
        )
    }

    #[test]
    fn test_bid_amount_floors_per_order() {
        let mut bids = Page::new(Side::Bid, 0);
        // 150 buys 1 and 150 buys 1; pooled 300 would buy 3
        bids.put(bid(100, "150"));
        bids.put(bid(100, "150"));
        let asks = Page::new(Side::Ask, 0);

        let snapshot = BookSnapshot::capture(MarketId::new("XIN/USDT"), 7, &asks, &bids, 0);

        let level = snapshot.best_bid().unwrap();
        assert_eq!(level.amount, Quantity::from_u64(2));
        assert_eq!(level.funds, Quantity::from_u64(300));
        assert_eq!(level.order_count, 2);
        assert_eq!(snapshot.sequence, 7);
        assert!(snapshot.best_ask().is_none());
    }

    #[test]
    fn test_depth_limits_levels() {
        let mut asks = Page::new(Side::Ask, 4);
        for price in [300, 100, 200] {
            asks.put(ask(price, 1));
        }
        let bids = Page::new(Side::Bid, 4);
        let market = MarketId::new("XIN/USDT");

        let top = BookSnapshot::capture(market.clone(), 0, &asks, &bids, 2);
        let prices: Vec<_> = top.asks.iter().map(|l| l.price).collect();
        assert_eq!(prices, vec![Price::from_u64(100), Price::from_u64(200)]);

        let full = BookSnapshot::capture(market, 0, &asks, &bids, 0);
        assert_eq!(full.asks.len(), 3);
        assert!(full.level(Side::Ask, Price::from_u64(300)).is_some());
        assert!(full.asks.iter().all(|l| l.funds.is_zero()));
    }
}
