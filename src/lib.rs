//! Derived views for a legal-practice dashboard.
//!
//! Records live in in-memory [`db::EntityStore`]s. Screens are computed by
//! filtering and grouping store snapshots ([`view`]) and new records enter
//! through validated form sessions ([`form`]). The [`legal`] module wires these
//! together for documents, billing, calendar, clients, matters and case tasks.

pub mod config;
pub mod db;
pub mod error;
pub mod form;
pub mod legal;
pub mod settings;
pub mod view;
