//! Price level implementation with FIFO queue
//!
//! A price level contains all resting orders at one price on one side.
//! Orders are kept in arrival order to enforce time priority, and the level
//! carries the aggregate of their side-appropriate remaining quantity
//! (amount for asks, funds for bids) plus the base amount they add up to.

use std::collections::{HashMap, VecDeque};
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};

#[derive(Debug, Clone)]
pub struct PriceLevel {
    side: Side,
    price: Price,
    /// Sum of `remaining()` over every order in the level
    total: Quantity,
    /// Decimal places of base-asset amounts
    amount_dp: u32,
    /// Base amount available, with each bid's funds floored separately
    amount: Quantity,
    /// Arrival order; the head matches first
    queue: VecDeque<OrderId>,
    orders: HashMap<OrderId, Order>,
}

impl PriceLevel {
    pub fn new(side: Side, price: Price, amount_dp: u32) -> Self {
        Self {
            side,
            price,
            total: Quantity::zero(),
            amount_dp,
            amount: Quantity::zero(),
            queue: VecDeque::new(),
            orders: HashMap::new(),
        }
    }

    /// Append an order at the tail of the queue
    ///
    /// # Panics
    /// Panics if the order belongs to another side or price, or is already
    /// queued here
    pub fn push(&mut self, order: Order) {
        assert!(
            order.side == self.side && order.price == self.price,
            "order {} ({} @ {}) does not belong to level {} @ {}",
            order.id,
            order.side,
            order.price,
            self.side,
            self.price
        );
        assert!(
            !self.orders.contains_key(&order.id),
            "duplicate order {} at level {} @ {}",
            order.id,
            self.side,
            self.price
        );
        self.total = self.total + order.remaining();
        self.amount = self.amount + self.base_amount(&order);
        self.queue.push_back(order.id);
        self.orders.insert(order.id, order);
    }

    /// Remove an order from any queue position
    ///
    /// # Panics
    /// Panics if the order is not queued here
    pub fn remove(&mut self, order_id: &OrderId) -> Order {
        let order = self.orders.remove(order_id).unwrap_or_else(|| {
            panic!("order {} not found at level {} @ {}", order_id, self.side, self.price)
        });
        let position = self
            .queue
            .iter()
            .position(|id| id == order_id)
            .unwrap_or_else(|| panic!("order {} missing from queue at {}", order_id, self.price));
        self.queue.remove(position);
        self.total = self.total - order.remaining();
        self.amount = self.amount - self.base_amount(&order);
        order
    }

    /// Walk orders head first until the visitor signals stop
    ///
    /// The visitor returns the side-appropriate quantity it consumed from
    /// the order, which is taken off the level aggregate. Returns true if
    /// the walk was stopped.
    pub(crate) fn visit<F>(&mut self, visitor: &mut F) -> bool
    where
        F: FnMut(&mut Order) -> (Quantity, bool),
    {
        let (side, price, dp) = (self.side, self.price, self.amount_dp);
        for id in self.queue.iter() {
            let order = self
                .orders
                .get_mut(id)
                .unwrap_or_else(|| panic!("queued order {} has no entry at {}", id, price));
            let before = base_amount(side, price, dp, order);
            let (matched, stop) = visitor(order);
            let after = base_amount(side, price, dp, order);
            self.total = self.total - matched;
            self.amount = self.amount - (before - after);
            if stop {
                return true;
            }
        }
        false
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn price(&self) -> Price {
        self.price
    }

    /// Aggregate remaining quantity at this level
    pub fn total(&self) -> Quantity {
        self.total
    }

    /// Base amount the level offers or bids for
    pub fn amount(&self) -> Quantity {
        self.amount
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn front(&self) -> Option<&Order> {
        self.queue.front().and_then(|id| self.orders.get(id))
    }

    pub fn get(&self, order_id: &OrderId) -> Option<&Order> {
        self.orders.get(order_id)
    }

    /// Orders in arrival order
    pub fn orders(&self) -> impl Iterator<Item = &Order> + '_ {
        self.queue.iter().filter_map(move |id| self.orders.get(id))
    }

    fn base_amount(&self, order: &Order) -> Quantity {
        base_amount(self.side, self.price, self.amount_dp, order)
    }
}

fn base_amount(side: Side, price: Price, dp: u32, order: &Order) -> Quantity {
    match side {
        Side::Ask => order.remaining_amount,
        Side::Bid => order.remaining_funds.buys_at(price, dp),
    }
}
