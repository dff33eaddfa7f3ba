//! One side of a market's book
//!
//! Price levels keyed by price in a BTreeMap for deterministic iteration.
//! Asks are walked ascending (lowest price first), bids descending
//! (highest price first).

use std::collections::{BTreeMap, HashMap};
use types::ids::OrderId;
use types::numeric::{Price, Quantity};
use types::order::{Order, OrderType, Side};

use super::price_level::PriceLevel;

#[derive(Debug, Clone)]
pub struct Page {
    side: Side,
    /// Decimal places of base-asset amounts, for level amount aggregates
    amount_dp: u32,
    levels: BTreeMap<Price, PriceLevel>,
    /// Price of every resting order, for lookup by identifier
    index: HashMap<OrderId, Price>,
}

impl Page {
    pub fn new(side: Side, amount_dp: u32) -> Self {
        Self {
            side,
            amount_dp,
            levels: BTreeMap::new(),
            index: HashMap::new(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    /// Rest an order at the tail of its price level
    ///
    /// # Panics
    /// Panics if the order belongs to the other side, is not a limit order,
    /// or is already resting here
    pub fn put(&mut self, order: Order) {
        assert!(
            order.side == self.side,
            "order {} is {} but page is {}",
            order.id,
            order.side,
            self.side
        );
        assert!(
            order.order_type == OrderType::Limit,
            "market order {} cannot rest on the book",
            order.id
        );
        assert!(
            !self.index.contains_key(&order.id),
            "duplicate order {} on {} page",
            order.id,
            self.side
        );
        let (side, price, dp) = (self.side, order.price, self.amount_dp);
        self.index.insert(order.id, price);
        self.levels
            .entry(price)
            .or_insert_with(|| PriceLevel::new(side, price, dp))
            .push(order);
    }

    /// Take a resting order off the page
    ///
    /// Empty levels are pruned.
    ///
    /// # Panics
    /// Panics if the order is not resting on this page
    pub fn remove(&mut self, order_id: &OrderId) -> Order {
        let price = self
            .index
            .remove(order_id)
            .unwrap_or_else(|| panic!("order {} not resting on {} page", order_id, self.side));
        let level = self
            .levels
            .get_mut(&price)
            .unwrap_or_else(|| panic!("level {} missing for order {}", price, order_id));
        let order = level.remove(order_id);
        if level.is_empty() {
            self.levels.remove(&price);
        }
        order
    }

    /// Walk resting orders in priority order until the visitor says stop
    ///
    /// Levels are visited best price first and orders within a level head
    /// first. The visitor returns the quantity it consumed from the order
    /// and whether to stop; stopping ends the whole walk. Levels past the
    /// stop point are never touched.
    pub fn iterate<F>(&mut self, mut visitor: F)
    where
        F: FnMut(&mut Order) -> (Quantity, bool),
    {
        let levels: Box<dyn Iterator<Item = &mut PriceLevel> + '_> = match self.side {
            Side::Ask => Box::new(self.levels.values_mut()),
            Side::Bid => Box::new(self.levels.values_mut().rev()),
        };
        for level in levels {
            if level.visit(&mut visitor) {
                return;
            }
        }
    }

    /// Levels in priority order
    pub fn levels(&self) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
        match self.side {
            Side::Ask => Box::new(self.levels.values()),
            Side::Bid => Box::new(self.levels.values().rev()),
        }
    }

    pub fn contains(&self, order_id: &OrderId) -> bool {
        self.index.contains_key(order_id)
    }

    pub fn get(&self, order_id: &OrderId) -> Option<&Order> {
        let price = self.index.get(order_id)?;
        self.levels.get(price)?.get(order_id)
    }

    pub fn best(&self) -> Option<&PriceLevel> {
        self.levels().next()
    }

    /// Aggregate at `price`; zero when no level exists
    pub fn level_total(&self, price: Price) -> Quantity {
        self.levels
            .get(&price)
            .map(PriceLevel::total)
            .unwrap_or_else(Quantity::zero)
    }

    /// Resting orders at `price`; zero when no level exists
    pub fn level_size(&self, price: Price) -> usize {
        self.levels.get(&price).map(PriceLevel::len).unwrap_or(0)
    }

    pub fn order_count(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}
