//! Practice-management views built on the generic store, view and form layers.

pub mod billing;
pub mod calendar;
pub mod clients;
pub mod dashboard;
pub mod documents;
pub mod matters;
pub mod payments;
pub mod retainers;
pub mod tasks;
