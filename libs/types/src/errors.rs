//! Error types for the matching engine
//!
//! Only recoverable conditions live here. Broken invariants (invalid
//! price/type combination, duplicate insertion, removing an unknown order)
//! panic instead, because they mean state was corrupted upstream.

use crate::ids::MarketId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Mailbox full for market {market}: capacity {capacity}")]
    MailboxFull { market: MarketId, capacity: usize },

    #[error("Mailbox closed for market {market}")]
    MailboxClosed { market: MarketId },

    #[error("Unknown market: {market}")]
    UnknownMarket { market: MarketId },

    #[error("Market already open: {market}")]
    MarketExists { market: MarketId },

    #[error("Pair not allowed: base {base}, quote {quote}")]
    PairNotAllowed { base: String, quote: String },
}

impl EngineError {
    /// Whether resubmitting the same intent later may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::MailboxFull { .. })
    }
}
