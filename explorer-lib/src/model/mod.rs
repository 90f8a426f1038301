//! Typed models

mod record;

pub use record::*;
