//! Matching engine core
//!
//! A [`Book`] owns both pages of one market and applies create and cancel
//! intents one at a time. Exactly one actor task drives it (see
//! [`crate::actor`]).

use std::collections::HashSet;
use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use types::ids::{MarketId, OrderId};
use types::numeric::{Precision, Price, Quantity};
use types::order::{Order, OrderAction, Side};

use crate::book::Page;
use crate::events::{BookEvent, BookEventKind};
use crate::matching::{crosses, Fill, FillCalculator};
use crate::settlement::Settlement;
use crate::snapshot::BookSnapshot;

/// One fill against a resting order, kept for event emission
struct MakerFill {
    side: Side,
    price: Price,
    fill: Fill,
}

/// Matching state of a single market
pub struct Book<S: Settlement> {
    market: MarketId,
    calculator: FillCalculator,
    asks: Page,
    bids: Page,
    /// Orders whose create intent has been applied
    created: HashSet<OrderId>,
    /// Orders whose cancel intent has been applied
    cancelled: HashSet<OrderId>,
    settlement: S,
    events: Option<mpsc::UnboundedSender<BookEvent>>,
    sequence: u64,
}

impl<S: Settlement> fmt::Debug for Book<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Book")
            .field("market", &self.market)
            .field("precision", &self.precision())
            .field("asks", &self.asks.order_count())
            .field("bids", &self.bids.order_count())
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}

impl<S: Settlement> Book<S> {
    pub fn new(market: MarketId, precision: Precision, settlement: S) -> Self {
        Self {
            market,
            calculator: FillCalculator::new(precision),
            asks: Page::new(Side::Ask, precision.amount),
            bids: Page::new(Side::Bid, precision.amount),
            created: HashSet::new(),
            cancelled: HashSet::new(),
            settlement,
            events: None,
            sequence: 0,
        }
    }

    /// Publish level changes on `sender`
    pub fn with_events(mut self, sender: mpsc::UnboundedSender<BookEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    pub fn market(&self) -> &MarketId {
        &self.market
    }

    pub fn precision(&self) -> Precision {
        self.calculator.precision()
    }

    pub fn asks(&self) -> &Page {
        &self.asks
    }

    pub fn bids(&self) -> &Page {
        &self.bids
    }

    pub fn page(&self, side: Side) -> &Page {
        match side {
            Side::Ask => &self.asks,
            Side::Bid => &self.bids,
        }
    }

    pub fn settlement(&self) -> &S {
        &self.settlement
    }

    /// Sequence number of the last book event
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Resting copy of an order, if it is on the book
    pub fn resting(&self, order_id: &OrderId) -> Option<&Order> {
        self.asks.get(order_id).or_else(|| self.bids.get(order_id))
    }

    pub fn snapshot(&self, depth: usize) -> BookSnapshot {
        BookSnapshot::capture(
            self.market.clone(),
            self.sequence,
            &self.asks,
            &self.bids,
            depth,
        )
    }

    /// Apply one intent
    ///
    /// # Panics
    /// Panics if the order breaks the price/type contract
    pub fn apply(&mut self, order: Order, action: OrderAction) {
        match action {
            OrderAction::Create => self.create(order),
            OrderAction::Cancel => self.cancel(order),
        }
    }

    /// Match an incoming order, then rest or cancel what is left
    ///
    /// A second create for the same order is ignored.
    pub fn create(&mut self, mut order: Order) {
        order.validate();
        if !self.created.insert(order.id) {
            warn!(market = %self.market, order_id = %order.id, "duplicate create ignored");
            return;
        }
        debug!(
            market = %self.market,
            order_id = %order.id,
            side = %order.side,
            order_type = %order.order_type,
            price = %order.price,
            remaining = %order.remaining(),
            "create"
        );

        if self.cancelled.contains(&order.id) {
            // The cancel overtook its create; nothing ever rested to refund.
            warn!(market = %self.market, order_id = %order.id, "create after cancel, refunding");
            self.settlement.cancel(&order);
            return;
        }

        let (fills, dust) = self.take_liquidity(&mut order);
        for MakerFill { side, price, fill } in fills {
            self.emit(BookEventKind::OrderMatch, side, price, fill.amount, fill.funds);
        }
        for maker in &dust {
            debug!(market = %self.market, order_id = %maker.id, "dust maker cancelled");
            self.emit_level_change(BookEventKind::OrderCancel, maker);
        }

        if order.is_filled() {
            debug!(market = %self.market, order_id = %order.id, "filled");
            return;
        }
        let restable = !order.is_market() && !self.calculator.is_exhausted(&order, order.price);
        if restable {
            self.emit_level_change(BookEventKind::OrderOpen, &order);
            match order.side {
                Side::Ask => self.asks.put(order),
                Side::Bid => self.bids.put(order),
            }
        } else {
            debug!(
                market = %self.market,
                order_id = %order.id,
                filled = %order.filled_amount,
                "remainder cancelled"
            );
            self.settlement.cancel(&order);
        }
    }

    /// Take a resting order off the book and refund it
    ///
    /// A second cancel, or a cancel for an order that is not resting
    /// (filled, never rested, or not yet created), is a no-op.
    pub fn cancel(&mut self, order: Order) {
        order.validate();
        if !self.cancelled.insert(order.id) {
            warn!(market = %self.market, order_id = %order.id, "duplicate cancel ignored");
            return;
        }
        let page = match order.side {
            Side::Ask => &mut self.asks,
            Side::Bid => &mut self.bids,
        };
        if !page.contains(&order.id) {
            debug!(market = %self.market, order_id = %order.id, "cancel of non-resting order");
            return;
        }
        let resting = page.remove(&order.id);
        debug!(
            market = %self.market,
            order_id = %resting.id,
            remaining = %resting.remaining(),
            "cancelled"
        );
        self.settlement.cancel(&resting);
        self.emit_level_change(BookEventKind::OrderCancel, &resting);
    }

    /// Walk the opposing page, filling `taker` in price-time priority
    ///
    /// Filled makers are removed after the walk; makers left with dust are
    /// removed and refunded. Returns the fills and the dust makers.
    fn take_liquidity(&mut self, taker: &mut Order) -> (Vec<MakerFill>, Vec<Order>) {
        let calculator = self.calculator;
        let settlement = &mut self.settlement;
        let opponents = match taker.side {
            Side::Ask => &mut self.bids,
            Side::Bid => &mut self.asks,
        };

        let mut touched = Vec::new();
        let mut fills = Vec::new();
        opponents.iterate(|maker| {
            if !crosses(taker, maker.price) || calculator.is_exhausted(taker, maker.price) {
                return (Quantity::zero(), true);
            }
            touched.push(maker.id);
            let fill = calculator.execute(taker, maker);
            if fill.is_empty() {
                return (Quantity::zero(), false);
            }
            settlement.transact(taker, maker, fill.amount);
            fills.push(MakerFill {
                side: maker.side,
                price: maker.price,
                fill,
            });
            (fill.consumed(maker.side), calculator.is_exhausted(taker, maker.price))
        });

        let mut dust = Vec::new();
        for id in touched {
            let (filled, exhausted) = match opponents.get(&id) {
                Some(maker) => (maker.is_filled(), calculator.is_exhausted(maker, maker.price)),
                None => continue,
            };
            if filled {
                opponents.remove(&id);
            } else if exhausted {
                let maker = opponents.remove(&id);
                settlement.cancel(&maker);
                dust.push(maker);
            }
        }
        (fills, dust)
    }

    /// Emit a level change carrying the order's remaining quantity
    fn emit_level_change(&mut self, kind: BookEventKind, order: &Order) {
        let (amount, funds) = match order.side {
            Side::Ask => (order.remaining_amount, Quantity::zero()),
            Side::Bid => (
                order
                    .remaining_funds
                    .buys_at(order.price, self.precision().amount),
                order.remaining_funds,
            ),
        };
        self.emit(kind, order.side, order.price, amount, funds);
    }

    fn emit(&mut self, kind: BookEventKind, side: Side, price: Price, amount: Quantity, funds: Quantity) {
        self.sequence += 1;
        let Some(sender) = &self.events else {
            return;
        };
        let event = BookEvent {
            market: self.market.clone(),
            sequence: self.sequence,
            kind,
            side,
            price,
            amount,
            funds,
        };
        if sender.send(event).is_err() {
            warn!(market = %self.market, "book event receiver dropped");
            self.events = None;
        }
    }
}
