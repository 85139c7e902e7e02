//! Hierarchical grouping with bubbling aggregates.
//!
//! A [`GroupKeySpec`] is an ordered list of levels. Each level extracts a key
//! from a record and names the order its groups are listed in. Grouping
//! partitions the records level by level; leaves carry the records themselves,
//! ordered newest first with ties broken by id, so the resulting tree does not
//! depend on input order.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::{MalformedKeyPolicy, ViewConfig};
use crate::db::Record;
use crate::error::GroupingError;

/// A group key: the display label plus a numeric rank used by ordered levels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub label: String,
    pub rank: i64,
}

impl GroupKey {
    pub fn new(label: impl Into<String>, rank: i64) -> Self {
        Self {
            label: label.into(),
            rank,
        }
    }

    /// A key ordered by its label alone.
    pub fn text(label: impl Into<String>) -> Self {
        Self::new(label, 0)
    }
}

/// Sort order of the groups within one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrder {
    NumericAscending,
    NumericDescending,
    ChronologicalAscending,
    ChronologicalDescending,
    AlphabeticAscending,
    AlphabeticDescending,
}

impl KeyOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NumericAscending => "numeric-ascending",
            Self::NumericDescending => "numeric-descending",
            Self::ChronologicalAscending => "chronological-ascending",
            Self::ChronologicalDescending => "chronological-descending",
            Self::AlphabeticAscending => "alphabetic-ascending",
            Self::AlphabeticDescending => "alphabetic-descending",
        }
    }

    /// Total order over keys; ties fall back to the label.
    pub fn compare(&self, a: &GroupKey, b: &GroupKey) -> Ordering {
        let primary = match self {
            Self::NumericAscending | Self::ChronologicalAscending => a.rank.cmp(&b.rank),
            Self::NumericDescending | Self::ChronologicalDescending => b.rank.cmp(&a.rank),
            Self::AlphabeticAscending => a.label.to_lowercase().cmp(&b.label.to_lowercase()),
            Self::AlphabeticDescending => b.label.to_lowercase().cmp(&a.label.to_lowercase()),
        };
        primary.then_with(|| a.label.cmp(&b.label))
    }
}

impl FromStr for KeyOrder {
    type Err = GroupingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "numeric-ascending" => Ok(Self::NumericAscending),
            "numeric-descending" | "descending-numeric" => Ok(Self::NumericDescending),
            "chronological-ascending" => Ok(Self::ChronologicalAscending),
            "chronological-descending" => Ok(Self::ChronologicalDescending),
            "alphabetic-ascending" | "ascending-alphabetic" => Ok(Self::AlphabeticAscending),
            "alphabetic-descending" => Ok(Self::AlphabeticDescending),
            other => Err(GroupingError::UnknownOrder(other.to_string())),
        }
    }
}

type Extractor<R> = Arc<dyn Fn(&R) -> Option<GroupKey> + Send + Sync>;

/// One level of a hierarchical partition.
pub struct GroupLevel<R> {
    name: String,
    order: KeyOrder,
    extract: Extractor<R>,
}

impl<R> Clone for GroupLevel<R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            order: self.order,
            extract: Arc::clone(&self.extract),
        }
    }
}

impl<R> fmt::Debug for GroupLevel<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupLevel")
            .field("name", &self.name)
            .field("order", &self.order)
            .finish_non_exhaustive()
    }
}

impl<R> GroupLevel<R> {
    pub fn new<F>(name: impl Into<String>, order: KeyOrder, extract: F) -> Self
    where
        F: Fn(&R) -> Option<GroupKey> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            order,
            extract: Arc::new(extract),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn order(&self) -> KeyOrder {
        self.order
    }

    fn key_for(&self, record: &R) -> Option<GroupKey> {
        (self.extract)(record).filter(|key| !key.label.trim().is_empty())
    }
}

impl<R: Record> GroupLevel<R> {
    /// Calendar year of the record timestamp, newest first.
    pub fn year() -> Self {
        Self::new("year", KeyOrder::NumericDescending, |r: &R| {
            let year = r.timestamp().year();
            Some(GroupKey::new(year.to_string(), i64::from(year)))
        })
    }

    /// Month name of the record timestamp, latest month first.
    pub fn month() -> Self {
        Self::new("month", KeyOrder::ChronologicalDescending, |r: &R| {
            let ts = r.timestamp();
            Some(GroupKey::new(
                ts.format("%B").to_string(),
                i64::from(ts.month()),
            ))
        })
    }

    /// Calendar day of the record timestamp, earliest first.
    pub fn day() -> Self {
        Self::new("day", KeyOrder::ChronologicalAscending, |r: &R| {
            let date = r.timestamp().date();
            Some(GroupKey::new(
                date.format("%Y-%m-%d").to_string(),
                i64::from(date.num_days_from_ce()),
            ))
        })
    }

    /// Record category, alphabetically.
    pub fn category() -> Self {
        Self::new("category", KeyOrder::AlphabeticAscending, |r: &R| {
            Some(GroupKey::text(r.category()))
        })
    }

    /// A text field, alphabetically. Records without the field have no key.
    pub fn field(name: impl Into<String>, field: R::Field) -> Self {
        Self::new(name, KeyOrder::AlphabeticAscending, move |r: &R| {
            r.text(field).map(GroupKey::text)
        })
    }
}

/// Ordered grouping levels plus aggregation and malformed-key handling.
pub struct GroupKeySpec<R: Record> {
    levels: Vec<GroupLevel<R>>,
    sum_field: Option<R::Field>,
    malformed_keys: MalformedKeyPolicy,
    uncategorized_label: String,
}

impl<R: Record> Clone for GroupKeySpec<R> {
    fn clone(&self) -> Self {
        Self {
            levels: self.levels.clone(),
            sum_field: self.sum_field,
            malformed_keys: self.malformed_keys,
            uncategorized_label: self.uncategorized_label.clone(),
        }
    }
}

impl<R: Record> fmt::Debug for GroupKeySpec<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupKeySpec")
            .field("levels", &self.levels)
            .field("sum_field", &self.sum_field)
            .field("malformed_keys", &self.malformed_keys)
            .finish()
    }
}

impl<R: Record> Default for GroupKeySpec<R> {
    fn default() -> Self {
        let config = ViewConfig::default();
        Self {
            levels: Vec::new(),
            sum_field: None,
            malformed_keys: config.malformed_keys,
            uncategorized_label: config.uncategorized_label,
        }
    }
}

impl<R: Record> GroupKeySpec<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a spec with the malformed-key policy from configuration.
    pub fn from_config(config: &ViewConfig) -> Self {
        Self::new().malformed_keys(config.malformed_keys, config.uncategorized_label.clone())
    }

    pub fn level(mut self, level: GroupLevel<R>) -> Self {
        self.levels.push(level);
        self
    }

    /// Sum this money field across leaves into every aggregate.
    pub fn sum(mut self, field: R::Field) -> Self {
        self.sum_field = Some(field);
        self
    }

    pub fn malformed_keys(mut self, policy: MalformedKeyPolicy, label: impl Into<String>) -> Self {
        self.malformed_keys = policy;
        self.uncategorized_label = label.into();
        self
    }

    pub fn levels(&self) -> &[GroupLevel<R>] {
        &self.levels
    }
}

/// Per-node aggregate: leaf count and, when requested, a money sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Aggregate {
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sum: Option<Decimal>,
}

impl Aggregate {
    fn absorb(&mut self, other: &Aggregate) {
        self.count += other.count;
        if let Some(sum) = other.sum {
            self.sum = Some(self.sum.unwrap_or(Decimal::ZERO) + sum);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupChildren<R> {
    Groups(Vec<GroupNode<R>>),
    Records(Vec<R>),
}

impl<R> GroupChildren<R> {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Groups(groups) => groups.is_empty(),
            Self::Records(records) => records.is_empty(),
        }
    }

    pub fn groups(&self) -> &[GroupNode<R>] {
        match self {
            Self::Groups(groups) => groups,
            Self::Records(_) => &[],
        }
    }

    pub fn records(&self) -> &[R] {
        match self {
            Self::Groups(_) => &[],
            Self::Records(records) => records,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupNode<R> {
    pub level: String,
    pub key: String,
    /// True for the bucket holding records whose key could not be extracted.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub uncategorized: bool,
    pub aggregate: Aggregate,
    pub children: GroupChildren<R>,
}

impl<R> GroupNode<R> {
    pub fn child(&self, key: &str) -> Option<&GroupNode<R>> {
        self.children.groups().iter().find(|g| g.key == key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTree<R> {
    pub aggregate: Aggregate,
    pub children: GroupChildren<R>,
}

impl<R> GroupTree<R> {
    /// Follow a path of keys from the top level down.
    pub fn find(&self, path: &[&str]) -> Option<&GroupNode<R>> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.groups().iter().find(|g| g.key == *first)?;
        for key in rest {
            node = node.child(key)?;
        }
        Some(node)
    }

    /// Keys of the top-level groups, in order.
    pub fn top_keys(&self) -> Vec<&str> {
        self.children
            .groups()
            .iter()
            .map(|g| g.key.as_str())
            .collect()
    }

    /// Sum of counts over the nodes that hold records directly.
    pub fn leaf_count(&self) -> usize {
        fn walk<R>(children: &GroupChildren<R>) -> usize {
            match children {
                GroupChildren::Records(records) => records.len(),
                GroupChildren::Groups(groups) => groups
                    .iter()
                    .map(|g| match &g.children {
                        GroupChildren::Records(_) => g.aggregate.count,
                        nested => walk(nested),
                    })
                    .sum(),
            }
        }
        walk(&self.children)
    }
}

/// Partition `records` according to `spec`.
pub fn group<'a, R, I>(records: I, spec: &GroupKeySpec<R>) -> Result<GroupTree<R>, GroupingError>
where
    R: Record,
    I: IntoIterator<Item = &'a R>,
{
    let records: Vec<&R> = records.into_iter().collect();
    let (children, aggregate) = build_level(&records, &spec.levels, spec)?;
    Ok(GroupTree {
        aggregate,
        children,
    })
}

struct Bucket<'a, R> {
    key: Option<GroupKey>,
    records: Vec<&'a R>,
}

fn build_level<R: Record>(
    records: &[&R],
    levels: &[GroupLevel<R>],
    spec: &GroupKeySpec<R>,
) -> Result<(GroupChildren<R>, Aggregate), GroupingError> {
    let Some((level, rest)) = levels.split_first() else {
        return Ok(leaves(records, spec));
    };

    let mut buckets: Vec<Bucket<'_, R>> = Vec::new();
    let mut index: HashMap<Option<GroupKey>, usize> = HashMap::new();

    for &record in records {
        let key = match level.key_for(record) {
            Some(key) => Some(key),
            None => match spec.malformed_keys {
                MalformedKeyPolicy::Fail => {
                    return Err(GroupingError::MalformedGroupKey {
                        level: level.name.clone(),
                        record_id: record.id().to_string(),
                    });
                }
                MalformedKeyPolicy::Uncategorized => {
                    tracing::warn!(
                        level = %level.name,
                        entity = R::ENTITY,
                        record_id = record.id(),
                        "Group key missing; placing record in uncategorized bucket"
                    );
                    None
                }
            },
        };
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            buckets.push(Bucket {
                key,
                records: Vec::new(),
            });
            buckets.len() - 1
        });
        buckets[slot].records.push(record);
    }

    buckets.sort_by(|a, b| match (&a.key, &b.key) {
        (Some(ka), Some(kb)) => level.order.compare(ka, kb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    let mut aggregate = empty_aggregate(spec);
    let mut nodes = Vec::with_capacity(buckets.len());
    for bucket in buckets {
        let (children, node_aggregate) = build_level(&bucket.records, rest, spec)?;
        aggregate.absorb(&node_aggregate);
        let uncategorized = bucket.key.is_none();
        nodes.push(GroupNode {
            level: level.name.clone(),
            key: bucket
                .key
                .map_or_else(|| spec.uncategorized_label.clone(), |k| k.label),
            uncategorized,
            aggregate: node_aggregate,
            children,
        });
    }

    Ok((GroupChildren::Groups(nodes), aggregate))
}

fn empty_aggregate<R: Record>(spec: &GroupKeySpec<R>) -> Aggregate {
    Aggregate {
        count: 0,
        sum: spec.sum_field.map(|_| Decimal::ZERO),
    }
}

fn leaves<R: Record>(records: &[&R], spec: &GroupKeySpec<R>) -> (GroupChildren<R>, Aggregate) {
    let mut sorted: Vec<&R> = records.to_vec();
    sorted.sort_by(|a, b| {
        b.timestamp()
            .cmp(&a.timestamp())
            .then_with(|| a.id().cmp(b.id()))
    });

    let sum = spec.sum_field.map(|field| {
        sorted
            .iter()
            .filter_map(|r| r.amount(field))
            .fold(Decimal::ZERO, |acc, v| acc + v)
    });
    let aggregate = Aggregate {
        count: sorted.len(),
        sum,
    };
    (
        GroupChildren::Records(sorted.into_iter().cloned().collect()),
        aggregate,
    )
}
