//! Data processing for blast records.
//!
//! This crate turns filtered records into forms suitable for charting:
//! time-bucketed series, summary scalars and CSV exports, plus a session
//! type that memoizes the series for interactive use.

pub mod aggregate;
pub mod dashboard;
pub mod export;
pub mod summary;
