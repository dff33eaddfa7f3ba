//! Matching logic module
//!
//! Price crossing checks and per-match fill computation

pub mod crossing;
pub mod executor;

pub use crossing::{can_match, crosses};
pub use executor::{Fill, FillCalculator};
