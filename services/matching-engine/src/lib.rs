//! Matching Engine Service
//!
//! Per-market price-time priority matching for a decentralized exchange.
//! Asks are denominated in the base asset, bids in the quote funds they
//! spend.
//!
//! **Layout:**
//! - `book`: price levels and the per-side page index
//! - `matching`: crossing checks and fill computation
//! - `engine`: the [`Book`] create/cancel state machine
//! - `actor`: one task and bounded mailbox per market
//! - `exchange`: registry routing intents to markets
//!
//! **Key Invariants:**
//! - Price-time priority strictly enforced
//! - One intent applied at a time per market
//! - Create and cancel intents are idempotent per order
//! - Level aggregates equal the sum of their orders' remaining quantity

pub mod actor;
pub mod book;
pub mod config;
pub mod engine;
pub mod events;
pub mod exchange;
pub mod matching;
pub mod settlement;
pub mod snapshot;

pub use actor::{spawn_book, ActorOptions, BookHandle};
pub use config::{ConfigError, EngineConfig, MarketConfig};
pub use engine::Book;
pub use events::{BookEvent, BookEventKind, OrderCancelledEvent, SettlementEvent};
pub use exchange::{Exchange, PendingAction};
pub use settlement::{ChannelSettlement, Settlement};
pub use snapshot::{BookSnapshot, LevelSnapshot};
