//! Fill computation
//!
//! Applies one match between a taker and a maker. The trade price is the
//! maker's price. A bid spends funds, so the amount it can take is its
//! remaining funds divided by the price, truncated to the market's amount
//! precision; the bid is never charged more than it holds.

use types::numeric::{Precision, Price, Quantity};
use types::order::{Order, Side};

/// Quantities moved by one match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fill {
    /// Base asset moved from the ask to the bid
    pub amount: Quantity,
    /// Quote asset moved from the bid to the ask
    pub funds: Quantity,
}

impl Fill {
    pub fn none() -> Self {
        Self {
            amount: Quantity::zero(),
            funds: Quantity::zero(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.amount.is_zero()
    }

    /// What this fill took from an order of `side`, in that side's unit
    pub fn consumed(&self, side: Side) -> Quantity {
        match side {
            Side::Ask => self.amount,
            Side::Bid => self.funds,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FillCalculator {
    precision: Precision,
}

impl FillCalculator {
    pub fn new(precision: Precision) -> Self {
        Self { precision }
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Largest amount `order` can still take at `price`
    pub fn capacity(&self, order: &Order, price: Price) -> Quantity {
        match order.side {
            Side::Ask => order.remaining_amount,
            Side::Bid => order.remaining_funds.buys_at(price, self.precision.amount),
        }
    }

    /// Whether `order` can no longer trade one amount unit at `price`
    ///
    /// For a bid this is true while dust funds remain; `is_filled` is the
    /// exact-zero check.
    pub fn is_exhausted(&self, order: &Order, price: Price) -> bool {
        self.capacity(order, price).is_zero()
    }

    /// Match `taker` against `maker` at the maker's price
    ///
    /// Updates remaining and filled quantities and the average fill price
    /// of both orders. Returns an empty fill, leaving both untouched, when
    /// either side cannot take a single amount unit.
    pub fn execute(&self, taker: &mut Order, maker: &mut Order) -> Fill {
        assert!(
            taker.side != maker.side,
            "order {} cannot match same-side order {}",
            taker.id,
            maker.id
        );
        let price = maker.price;
        let amount = self.capacity(taker, price).min(self.capacity(maker, price));
        if amount.is_zero() {
            return Fill::none();
        }
        let fill = Fill {
            amount,
            funds: amount.times(price),
        };

        let taker_side = taker.side;
        let (ask, bid) = match taker_side {
            Side::Ask => (taker, maker),
            Side::Bid => (maker, taker),
        };
        ask.remaining_amount = ask.remaining_amount - fill.amount;
        ask.filled_amount = ask.filled_amount + fill.amount;
        ask.filled_funds = ask.filled_funds + fill.funds;
        bid.remaining_funds = bid.remaining_funds - fill.funds;
        bid.filled_funds = bid.filled_funds + fill.funds;
        bid.filled_amount = bid.filled_amount + fill.amount;

        self.update_filled_price(ask);
        self.update_filled_price(bid);
        fill
    }

    fn update_filled_price(&self, order: &mut Order) {
        if !order.filled_amount.is_zero() {
            order.filled_price = self
                .precision
                .floor_price(order.filled_funds.as_decimal() / order.filled_amount.as_decimal());
        }
    }
}
