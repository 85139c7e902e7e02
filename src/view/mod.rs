//! Derived views over entity stores: filter, group, bind.

mod binding;
mod filter;
mod group;

pub use binding::{ViewBinding, ViewOutput};
pub use filter::{ALL_CATEGORIES, FilterSpec, distinct_categories, filter, matches};
pub use group::{
    Aggregate, GroupChildren, GroupKey, GroupKeySpec, GroupLevel, GroupNode, GroupTree, KeyOrder,
    group,
};
