//! Resolved runtime configuration.

pub(crate) mod helpers;
mod views;

pub use views::{DocumentGrouping, MalformedKeyPolicy, ViewConfig};
