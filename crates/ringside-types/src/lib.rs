//! # Ringside Types Crate
//!
//! Domain entities shared by the dispatch core, the notification bus and
//! the runtime.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: action kinds, dispatch records and the
//!   error taxonomy are defined here and nowhere else.
//! - **Mode Symmetry**: a `DispatchRecord` has the same shape in live and
//!   simulated mode; only `mock` and the id format differ.

pub mod cost_table;
pub mod entities;
pub mod errors;
pub mod time;

pub use cost_table::ActionCostTable;
pub use entities::*;
pub use errors::*;
pub use time::{ManualTimeSource, SystemTimeSource, TimeSource};
