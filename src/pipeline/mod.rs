//! Pipeline entry points for scanner operations.
//!
//! - `run_scan`: listing → classify → probe → persist
//! - `run_validate`: configuration sanity checks

pub mod scan;
pub mod validate;

pub use scan::{ScanOptions, ScanOutcome, run_scan};
pub use validate::run_validate;
