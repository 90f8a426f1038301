//! View identity types.
//!
//! A view over the corpus is identified by its filters and its optional sort.
//!
//! # Shared Types
//!
//! - [`FileFilter`] - A single `name = value` predicate
//! - [`FileSort`] - Sort column and [`Direction`]
//! - [`ViewIdentity`] - Canonical filters + sort, hashed into a [`ViewKey`]

mod filter;
mod identity;
mod sort;

pub use filter::FileFilter;
pub use identity::ViewIdentity;
pub use identity::ViewKey;
pub use sort::Direction;
pub use sort::FileSort;
