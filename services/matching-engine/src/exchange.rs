//! Market registry
//!
//! Routes intents to the actor of their market. Markets share nothing, so
//! the registry only holds handles; all matching state lives in the actors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use types::errors::EngineError;
use types::ids::MarketId;
use types::order::{Order, OrderAction};

use crate::actor::{spawn_book, ActorOptions, BookHandle};
use crate::config::{EngineConfig, MarketConfig};
use crate::engine::Book;
use crate::events::BookEvent;
use crate::settlement::Settlement;
use crate::snapshot::BookSnapshot;

/// Intent recorded durably before it reached the book
///
/// Replaying the pending actions of a market in `created_at` order rebuilds
/// its pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    pub order: Order,
    pub action: OrderAction,
    pub created_at: DateTime<Utc>,
}

impl PendingAction {
    pub fn create(order: Order) -> Self {
        let created_at = order.created_at;
        Self {
            order,
            action: OrderAction::Create,
            created_at,
        }
    }

    pub fn cancel(order: Order, created_at: DateTime<Utc>) -> Self {
        Self {
            order,
            action: OrderAction::Cancel,
            created_at,
        }
    }
}

struct Market<S: Settlement> {
    config: MarketConfig,
    handle: BookHandle,
    task: JoinHandle<Book<S>>,
}

pub struct Exchange<S: Settlement> {
    config: EngineConfig,
    markets: BTreeMap<MarketId, Market<S>>,
    book_events: Option<mpsc::UnboundedSender<BookEvent>>,
}

impl<S: Settlement> Exchange<S> {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            markets: BTreeMap::new(),
            book_events: None,
        }
    }

    /// Give every market opened from now on a book event sender
    pub fn with_book_events(mut self, sender: mpsc::UnboundedSender<BookEvent>) -> Self {
        self.book_events = Some(sender);
        self
    }

    /// Open every market listed in the configuration
    pub fn open_configured<F>(&mut self, mut settlement_for: F) -> Result<(), EngineError>
    where
        F: FnMut(&MarketId) -> S,
    {
        for market in self.config.markets.clone() {
            let settlement = settlement_for(&market.market_id());
            self.open_market(market, settlement)?;
        }
        Ok(())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start a market's actor
    pub fn open_market(&mut self, config: MarketConfig, settlement: S) -> Result<BookHandle, EngineError> {
        if !self.config.pair_allowed(&config.base, &config.quote) {
            warn!(base = %config.base, quote = %config.quote, "pair rejected");
            return Err(EngineError::PairNotAllowed {
                base: config.base.clone(),
                quote: config.quote.clone(),
            });
        }
        let market = config.market_id();
        if self.markets.contains_key(&market) {
            return Err(EngineError::MarketExists { market });
        }

        let (handle, task) = self.spawn(&config, settlement);
        info!(
            %market,
            price_precision = config.price_precision,
            amount_precision = config.amount_precision,
            "market opened"
        );
        self.markets.insert(
            market,
            Market {
                config,
                handle: handle.clone(),
                task,
            },
        );
        Ok(handle)
    }

    fn spawn(&self, config: &MarketConfig, settlement: S) -> (BookHandle, JoinHandle<Book<S>>) {
        let mut book = Book::new(config.market_id(), config.precision(), settlement);
        if let Some(sender) = &self.book_events {
            book = book.with_events(sender.clone());
        }
        spawn_book(book, ActorOptions::from(&self.config))
    }

    pub fn handle(&self, market: &MarketId) -> Result<&BookHandle, EngineError> {
        self.markets
            .get(market)
            .map(|m| &m.handle)
            .ok_or_else(|| EngineError::UnknownMarket {
                market: market.clone(),
            })
    }

    /// Route an intent to its market, waiting for mailbox space
    pub async fn submit(
        &self,
        market: &MarketId,
        order: Order,
        action: OrderAction,
    ) -> Result<(), EngineError> {
        self.handle(market)?.submit(order, action).await
    }

    /// Route an intent without waiting
    pub fn try_submit(
        &self,
        market: &MarketId,
        order: Order,
        action: OrderAction,
    ) -> Result<(), EngineError> {
        self.handle(market)?.try_submit(order, action)
    }

    pub fn snapshot(&self, market: &MarketId) -> Result<Arc<BookSnapshot>, EngineError> {
        Ok(self.handle(market)?.snapshot())
    }

    /// Open markets in identifier order
    pub fn markets(&self) -> Vec<MarketId> {
        self.markets.keys().cloned().collect()
    }

    /// Markets whose actor has stopped
    pub fn crashed(&self) -> Vec<MarketId> {
        self.markets
            .iter()
            .filter(|(_, m)| m.task.is_finished() || m.handle.is_closed())
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Replay durable pending actions into a market
    ///
    /// Actions are applied in `created_at` order; ties keep their given
    /// order. Returns once all of them have been applied.
    pub async fn restore(
        &self,
        market: &MarketId,
        mut pending: Vec<PendingAction>,
    ) -> Result<usize, EngineError> {
        let handle = self.handle(market)?;
        pending.sort_by_key(|p| p.created_at);
        let count = pending.len();
        for action in pending {
            handle.submit(action.order, action.action).await?;
        }
        handle.flush().await?;
        info!(%market, count, "market restored");
        Ok(count)
    }

    /// Replace a market's actor with a fresh one rebuilt from `pending`
    ///
    /// A still-running actor is aborted first.
    pub async fn restart_market(
        &mut self,
        market: &MarketId,
        settlement: S,
        pending: Vec<PendingAction>,
    ) -> Result<BookHandle, EngineError> {
        let old = self
            .markets
            .remove(market)
            .ok_or_else(|| EngineError::UnknownMarket {
                market: market.clone(),
            })?;
        old.task.abort();
        if let Err(err) = old.task.await {
            if err.is_panic() {
                error!(%market, "market actor had panicked");
            }
        }

        let (handle, task) = self.spawn(&old.config, settlement);
        self.markets.insert(
            market.clone(),
            Market {
                config: old.config,
                handle: handle.clone(),
                task,
            },
        );
        self.restore(market, pending).await?;
        warn!(%market, "market restarted");
        Ok(handle)
    }

    /// Stop every actor after it drains its mailbox
    ///
    /// Returns the final books of the markets that stopped cleanly. Handle
    /// clones held outside the registry keep their actor alive, so drop
    /// them first.
    pub async fn shutdown(self) -> Vec<Book<S>> {
        let mut books = Vec::new();
        for (market, Market { handle, task, .. }) in self.markets {
            drop(handle);
            match task.await {
                Ok(book) => books.push(book),
                Err(err) => error!(%market, %err, "market actor failed"),
            }
        }
        books
    }
}
