//! Order book infrastructure module
//!
//! Contains the FIFO price level and the per-side page built on it.

pub mod price_level;
pub mod page;

pub use price_level::PriceLevel;
pub use page::Page;
