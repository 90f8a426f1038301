//! File explorer data access library
//!
//! Windowed, lazily paged views over a large remote file corpus, and an
//! interval-based multi-selection model on top of them.
//!
//! - [`view`]: filtered and sorted views that fetch rows a page at a time
//! - [`selection`]: compact per-view selections and click gesture handling
//! - [`source`]: the record source trait views page through
//! - [`interval`]: closed integer intervals used by both

pub mod error;
pub mod interval;
pub mod model;
pub mod query;
pub mod selection;
pub mod source;
pub mod view;

pub use error::Error;
