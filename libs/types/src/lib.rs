//! Types library for the order matching engine
//!
//! Shared definitions used by the matching engine and by whatever persists
//! or settles its output.
//!
//! # Modules
//! - `ids`: Unique identifiers (OrderId, TradeId, MarketId)
//! - `numeric`: Fixed-point decimal types (Price, Quantity, Precision)
//! - `order`: Order entity, sides, types and intent actions
//! - `trade`: Trade records handed to settlement
//! - `errors`: Recoverable error taxonomy

pub mod ids;
pub mod numeric;
pub mod order;
pub mod trade;
pub mod errors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::trade::*;
    pub use crate::errors::*;
}
