//! Order entity and intent types
//!
//! An ask is denominated in the base asset it sells (`remaining_amount`);
//! a bid is denominated in the quote-asset funds it spends
//! (`remaining_funds`) until it is matched.

use crate::ids::OrderId;
use crate::numeric::{Price, Quantity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    /// Sell order
    Ask,
    /// Buy order
    Bid,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Ask => write!(f, "ASK"),
            Side::Bid => write!(f, "BID"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderType {
    /// Rests on the book at a nonzero price
    Limit,
    /// Matches at any price; an unmatched remainder is cancelled
    Market,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Limit => write!(f, "LIMIT"),
            OrderType::Market => write!(f, "MARKET"),
        }
    }
}

/// What an intent asks the book to do with an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderAction {
    Create,
    Cancel,
}

impl fmt::Display for OrderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderAction::Create => write!(f, "CREATE"),
            OrderAction::Cancel => write!(f, "CANCEL"),
        }
    }
}

/// One resting or incoming order
///
/// Quantities are mutated only by the owning book while matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: String,
    pub side: Side,
    pub order_type: OrderType,
    pub price: Price,
    pub remaining_amount: Quantity,
    pub filled_amount: Quantity,
    pub remaining_funds: Quantity,
    pub filled_funds: Quantity,
    /// Average price of all fills so far
    pub filled_price: Price,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create a sell order for `amount` of the base asset
    ///
    /// # Panics
    /// Panics if the price does not agree with the order type
    pub fn ask(
        id: OrderId,
        user_id: impl Into<String>,
        order_type: OrderType,
        price: Price,
        amount: Quantity,
        created_at: DateTime<Utc>,
    ) -> Self {
        let order = Self {
            id,
            user_id: user_id.into(),
            side: Side::Ask,
            order_type,
            price,
            remaining_amount: amount,
            filled_amount: Quantity::zero(),
            remaining_funds: Quantity::zero(),
            filled_funds: Quantity::zero(),
            filled_price: Price::zero(),
            created_at,
        };
        order.validate();
        order
    }

    /// Create a buy order spending `funds` of the quote asset
    ///
    /// # Panics
    /// Panics if the price does not agree with the order type
    pub fn bid(
        id: OrderId,
        user_id: impl Into<String>,
        order_type: OrderType,
        price: Price,
        funds: Quantity,
        created_at: DateTime<Utc>,
    ) -> Self {
        let order = Self {
            id,
            user_id: user_id.into(),
            side: Side::Bid,
            order_type,
            price,
            remaining_amount: Quantity::zero(),
            filled_amount: Quantity::zero(),
            remaining_funds: funds,
            filled_funds: Quantity::zero(),
            filled_price: Price::zero(),
            created_at,
        };
        order.validate();
        order
    }

    /// Assert the price/type contract
    ///
    /// # Panics
    /// Panics when a limit order has a zero price or a market order has a
    /// nonzero one. Either means the order was corrupted upstream.
    pub fn validate(&self) {
        match self.order_type {
            OrderType::Limit => assert!(
                !self.price.is_zero(),
                "limit order {} must have a nonzero price",
                self.id
            ),
            OrderType::Market => assert!(
                self.price.is_zero(),
                "market order {} must have a zero price, got {}",
                self.id,
                self.price
            ),
        }
    }

    /// Whether a decoded order is fit to reach a book
    ///
    /// The price must agree with the order type, and the quantity of the
    /// other side must be zero: an ask carries no remaining funds and a bid
    /// no remaining amount.
    pub fn is_well_formed(&self) -> bool {
        let priced = match self.order_type {
            OrderType::Limit => !self.price.is_zero(),
            OrderType::Market => self.price.is_zero(),
        };
        let off_side = match self.side {
            Side::Ask => self.remaining_funds,
            Side::Bid => self.remaining_amount,
        };
        priced && off_side.is_zero()
    }

    /// Side-appropriate remaining quantity: amount for asks, funds for bids
    pub fn remaining(&self) -> Quantity {
        match self.side {
            Side::Ask => self.remaining_amount,
            Side::Bid => self.remaining_funds,
        }
    }

    /// Whether the side-appropriate remaining quantity is exactly zero
    pub fn is_filled(&self) -> bool {
        self.remaining().is_zero()
    }

    pub fn is_market(&self) -> bool {
        self.order_type == OrderType::Market
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit_ask(price: u64, amount: &str) -> Order {
        Order::ask(
            OrderId::new(),
            "user",
            OrderType::Limit,
            Price::from_u64(price),
            amount.parse().unwrap(),
            Utc::now(),
        )
    }

    #[test]
    fn test_ask_remaining_is_amount() {
        let order = limit_ask(100, "2.5");
        assert_eq!(order.remaining(), "2.5".parse().unwrap());
        assert!(order.remaining_funds.is_zero());
        assert!(!order.is_filled());
    }

    #[test]
    fn test_bid_remaining_is_funds() {
        let order = Order::bid(
            OrderId::new(),
            "user",
            OrderType::Market,
            Price::zero(),
            Quantity::from_u64(500),
            Utc::now(),
        );
        assert_eq!(order.remaining(), Quantity::from_u64(500));
        assert!(order.remaining_amount.is_zero());
        assert!(order.is_market());
    }

    #[test]
    fn test_bid_filled_when_funds_exhausted() {
        let mut order = Order::bid(
            OrderId::new(),
            "user",
            OrderType::Limit,
            Price::from_u64(10),
            Quantity::from_u64(100),
            Utc::now(),
        );
        order.remaining_funds = Quantity::zero();
        order.filled_funds = Quantity::from_u64(100);
        assert!(order.is_filled());
    }

    #[test]
    #[should_panic(expected = "must have a nonzero price")]
    fn test_limit_with_zero_price_panics() {
        Order::ask(
            OrderId::new(),
            "user",
            OrderType::Limit,
            Price::zero(),
            Quantity::from_u64(1),
            Utc::now(),
        );
    }

    #[test]
    #[should_panic(expected = "must have a zero price")]
    fn test_market_with_price_panics() {
        Order::bid(
            OrderId::new(),
            "user",
            OrderType::Market,
            Price::from_u64(1),
            Quantity::from_u64(1),
            Utc::now(),
        );
    }

    #[test]
    fn test_well_formed() {
        let mut order = limit_ask(100, "1");
        assert!(order.is_well_formed());
        order.price = Price::zero();
        assert!(!order.is_well_formed());

        let mut order = limit_ask(100, "1");
        order.remaining_funds = Quantity::from_u64(500);
        assert!(!order.is_well_formed());

        let mut order = Order::bid(
            OrderId::new(),
            "user",
            OrderType::Limit,
            Price::from_u64(100),
            Quantity::from_u64(1000),
            Utc::now(),
        );
        assert!(order.is_well_formed());
        order.remaining_amount = Quantity::from_u64(5);
        assert!(!order.is_well_formed());
    }

    #[test]
    fn test_decode_rejects_negative_amount() {
        let json = format!(
            r#"{{"id":"{}","user_id":"u","side":"ASK","order_type":"LIMIT","price":"100",
            "remaining_amount":"-5","filled_amount":"0","remaining_funds":"0",
            "filled_funds":"0","filled_price":"0","created_at":"2024-01-01T00:00:00Z"}}"#,
            OrderId::new()
        );
        assert!(serde_json::from_str::<Order>(&json).is_err());

        let valid = json.replace("\"-5\"", "\"5\"");
        let order: Order = serde_json::from_str(&valid).unwrap();
        assert_eq!(order.remaining_amount, Quantity::from_u64(5));
        assert!(order.is_well_formed());
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&Side::Ask).unwrap(), "\"ASK\"");
        assert_eq!(serde_json::to_string(&OrderType::Market).unwrap(), "\"MARKET\"");
        assert_eq!(serde_json::to_string(&OrderAction::Cancel).unwrap(), "\"CANCEL\"");
    }

    #[test]
    fn test_order_serialization() {
        let order = limit_ask(3000, "2.5");
        let json = serde_json::to_string(&order).unwrap();
        let deserialized: Order = serde_json::from_str(&json).unwrap();
        assert_eq!(order, deserialized);
    }
}
