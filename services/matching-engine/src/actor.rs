//! Per-market actor
//!
//! Each market runs as one tokio task that owns its [`Book`] and drains a
//! bounded mailbox strictly in arrival order. Handles are cheap to clone and
//! are the only way to reach the book. After every intent that changed the
//! book the task publishes a fresh [`BookSnapshot`] on a watch channel, so
//! readers never queue behind the mailbox.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use types::errors::EngineError;
use types::ids::MarketId;
use types::order::{Order, OrderAction};

use crate::config::EngineConfig;
use crate::engine::Book;
use crate::settlement::Settlement;
use crate::snapshot::BookSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorOptions {
    pub mailbox_capacity: usize,
    /// Levels per side in published snapshots (0 = all)
    pub snapshot_depth: usize,
}

impl Default for ActorOptions {
    fn default() -> Self {
        let config = EngineConfig::default();
        Self::from(&config)
    }
}

impl From<&EngineConfig> for ActorOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            mailbox_capacity: config.mailbox_capacity,
            snapshot_depth: config.snapshot_depth,
        }
    }
}

enum Intent {
    Order { order: Order, action: OrderAction },
    /// Completes once every earlier intent has been applied
    Barrier(oneshot::Sender<()>),
}

/// Submission side of a running book
#[derive(Debug, Clone)]
pub struct BookHandle {
    market: MarketId,
    capacity: usize,
    mailbox: mpsc::Sender<Intent>,
    snapshot: watch::Receiver<Arc<BookSnapshot>>,
}

impl std::fmt::Debug for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::Order { order, action } => write!(f, "{} {}", action, order.id),
            Intent::Barrier(_) => write!(f, "barrier"),
        }
    }
}

impl BookHandle {
    pub fn market(&self) -> &MarketId {
        &self.market
    }

    /// Enqueue an intent, waiting for mailbox space
    ///
    /// # Panics
    /// Panics if the order breaks the price/type contract
    pub async fn submit(&self, order: Order, action: OrderAction) -> Result<(), EngineError> {
        order.validate();
        self.mailbox
            .send(Intent::Order { order, action })
            .await
            .map_err(|_| self.closed())
    }

    /// Enqueue an intent without waiting
    ///
    /// Fails with [`EngineError::MailboxFull`] when the mailbox is at
    /// capacity. The intent is not queued and must be resubmitted.
    ///
    /// # Panics
    /// Panics if the order breaks the price/type contract
    pub fn try_submit(&self, order: Order, action: OrderAction) -> Result<(), EngineError> {
        order.validate();
        match self.mailbox.try_send(Intent::Order { order, action }) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(intent)) => {
                warn!(market = %self.market, ?intent, capacity = self.capacity, "mailbox full");
                Err(EngineError::MailboxFull {
                    market: self.market.clone(),
                    capacity: self.capacity,
                })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(self.closed()),
        }
    }

    /// Wait until every intent submitted before this call has been applied
    pub async fn flush(&self) -> Result<(), EngineError> {
        let (done, applied) = oneshot::channel();
        self.mailbox
            .send(Intent::Barrier(done))
            .await
            .map_err(|_| self.closed())?;
        applied.await.map_err(|_| self.closed())
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> Arc<BookSnapshot> {
        self.snapshot.borrow().clone()
    }

    /// Resolves when a snapshot newer than the last one seen is published
    pub async fn changed(&mut self) -> Result<Arc<BookSnapshot>, EngineError> {
        self.snapshot.changed().await.map_err(|_| self.closed())?;
        Ok(self.snapshot.borrow_and_update().clone())
    }

    /// Whether the actor has stopped, normally or by panic
    pub fn is_closed(&self) -> bool {
        self.mailbox.is_closed()
    }

    fn closed(&self) -> EngineError {
        EngineError::MailboxClosed {
            market: self.market.clone(),
        }
    }
}

/// Start the actor for `book`
///
/// The task runs until every handle is dropped and returns the book. A
/// panic while applying an intent ends only this task; the handle then
/// reports [`EngineError::MailboxClosed`].
pub fn spawn_book<S: Settlement>(
    book: Book<S>,
    options: ActorOptions,
) -> (BookHandle, JoinHandle<Book<S>>) {
    let market = book.market().clone();
    let (mailbox, inbox) = mpsc::channel(options.mailbox_capacity);
    let (publisher, snapshot) = watch::channel(Arc::new(book.snapshot(options.snapshot_depth)));
    let task = tokio::spawn(run(book, inbox, publisher, options.snapshot_depth));
    let handle = BookHandle {
        market,
        capacity: options.mailbox_capacity,
        mailbox,
        snapshot,
    };
    (handle, task)
}

async fn run<S: Settlement>(
    mut book: Book<S>,
    mut inbox: mpsc::Receiver<Intent>,
    publisher: watch::Sender<Arc<BookSnapshot>>,
    depth: usize,
) -> Book<S> {
    info!(market = %book.market(), "book actor started");
    let mut applied: u64 = 0;
    let mut published = book.sequence();
    while let Some(intent) = inbox.recv().await {
        match intent {
            Intent::Order { order, action } => {
                debug!(market = %book.market(), %action, order_id = %order.id, "applying intent");
                book.apply(order, action);
                applied += 1;
                // Every page change emits a book event, so an unchanged
                // sequence means an unchanged book
                if book.sequence() != published {
                    published = book.sequence();
                    publisher.send_replace(Arc::new(book.snapshot(depth)));
                }
            }
            Intent::Barrier(done) => {
                let _ = done.send(());
            }
        }
    }
    info!(market = %book.market(), applied, "book actor stopped");
    book
}
