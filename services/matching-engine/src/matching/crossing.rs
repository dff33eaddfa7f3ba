//! Crossing detection logic
//!
//! Determines whether an incoming order may trade at a resting price.

use types::numeric::Price;
use types::order::{Order, OrderType, Side};

/// Check if a bid and ask can match at given prices
pub fn can_match(bid_price: Price, ask_price: Price) -> bool {
    bid_price >= ask_price
}

/// Check if an incoming order crosses a resting order's price
///
/// Market orders cross any price. A limit ask crosses bids at or above its
/// limit; a limit bid crosses asks at or below its limit.
pub fn crosses(taker: &Order, resting_price: Price) -> bool {
    match (taker.order_type, taker.side) {
        (OrderType::Market, _) => true,
        (OrderType::Limit, Side::Ask) => can_match(resting_price, taker.price),
        (OrderType::Limit, Side::Bid) => can_match(taker.price, resting_price),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use types::ids::OrderId;
    use types::numeric::Quantity;

    fn limit(side: Side, price: u64) -> Order {
        let price = Price::from_u64(price);
        let qty = Quantity::from_u64(1);
        match side {
            Side::Ask => Order::ask(OrderId::new(), "u", OrderType::Limit, price, qty, Utc::now()),
            Side::Bid => Order::bid(OrderId::new(), "u", OrderType::Limit, price, qty, Utc::now()),
        }
    }

    #[test]
    fn test_can_match_crossing() {
        assert!(can_match(Price::from_u64(50000), Price::from_u64(49000)));
        assert!(can_match(Price::from_u64(50000), Price::from_u64(50000)));
        assert!(!can_match(Price::from_u64(49000), Price::from_u64(50000)));
    }

    #[test]
    fn test_limit_ask_crosses_higher_bids() {
        let ask = limit(Side::Ask, 100);
        assert!(crosses(&ask, Price::from_u64(200)));
        assert!(crosses(&ask, Price::from_u64(100)));
        assert!(!crosses(&ask, Price::from_u64(99)));
    }

    #[test]
    fn test_limit_bid_crosses_lower_asks() {
        let bid = limit(Side::Bid, 100);
        assert!(crosses(&bid, Price::from_u64(50)));
        assert!(crosses(&bid, Price::from_u64(100)));
        assert!(!crosses(&bid, Price::from_u64(101)));
    }

    #[test]
    fn test_market_crosses_anything() {
        let market = Order::ask(
            OrderId::new(),
            "u",
            OrderType::Market,
            Price::zero(),
            Quantity::from_u64(1),
            Utc::now(),
        );
        assert!(crosses(&market, Price::from_u64(1)));
        assert!(crosses(&market, Price::from_u64(1_000_000)));
    }
}
