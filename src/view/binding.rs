//! Memoized view bindings: filter then group, recomputed only on change.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

use crate::db::{EntityStore, Record};
use crate::error::GroupingError;
use crate::view::filter::{FilterSpec, filter};
use crate::view::group::{GroupKeySpec, GroupTree, group};

/// Published result of a view: the grouped tree plus filter counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewOutput<R> {
    pub filtered_count: usize,
    pub total_count: usize,
    pub tree: GroupTree<R>,
    /// Increments on every successful recomputation.
    pub revision: u64,
}

/// Binds one entity store to a filter and grouping spec.
///
/// The binding remembers the snapshot pointer and the filter it last computed
/// from. Calling [`ViewBinding::sync`] with an unchanged store, or
/// [`ViewBinding::set_filter`] with an equal filter, does no work and keeps
/// the published output pointer stable. A grouping failure is returned and
/// the previous output stays published.
pub struct ViewBinding<R: Record> {
    filter: FilterSpec<R::Field>,
    grouping: GroupKeySpec<R>,
    source: Arc<[R]>,
    output: Arc<ViewOutput<R>>,
    sender: watch::Sender<Arc<ViewOutput<R>>>,
    recomputations: u64,
}

impl<R: Record> ViewBinding<R> {
    pub fn new(
        store: &EntityStore<R>,
        filter: FilterSpec<R::Field>,
        grouping: GroupKeySpec<R>,
    ) -> Result<Self, GroupingError> {
        let source = store.snapshot();
        let output = Arc::new(compute(&source, &filter, &grouping, 1)?);
        let (sender, _) = watch::channel(Arc::clone(&output));
        tracing::debug!(
            entity = R::ENTITY,
            total = output.total_count,
            filtered = output.filtered_count,
            "View bound"
        );
        Ok(Self {
            filter,
            grouping,
            source,
            output,
            sender,
            recomputations: 1,
        })
    }

    /// Latest published output.
    pub fn output(&self) -> Arc<ViewOutput<R>> {
        Arc::clone(&self.output)
    }

    /// Receiver notified whenever a new output is published.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ViewOutput<R>>> {
        self.sender.subscribe()
    }

    pub fn filter(&self) -> &FilterSpec<R::Field> {
        &self.filter
    }

    /// How many times the pipeline actually ran.
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }

    /// Pick up the store's current snapshot. Returns whether the view changed.
    pub fn sync(&mut self, store: &EntityStore<R>) -> Result<bool, GroupingError> {
        let snapshot = store.snapshot();
        if Arc::ptr_eq(&snapshot, &self.source) {
            return Ok(false);
        }
        let output = self.run(&snapshot, &self.filter, &self.grouping)?;
        self.source = snapshot;
        self.publish(output);
        Ok(true)
    }

    /// Replace the filter. An equal filter is a no-op.
    pub fn set_filter(&mut self, filter: FilterSpec<R::Field>) -> Result<bool, GroupingError> {
        if filter == self.filter {
            return Ok(false);
        }
        let output = self.run(&self.source, &filter, &self.grouping)?;
        self.filter = filter;
        self.publish(output);
        Ok(true)
    }

    /// Replace the grouping. Grouping specs hold closures and are always
    /// treated as changed.
    pub fn set_grouping(&mut self, grouping: GroupKeySpec<R>) -> Result<(), GroupingError> {
        let output = self.run(&self.source, &self.filter, &grouping)?;
        self.grouping = grouping;
        self.publish(output);
        Ok(())
    }

    fn run(
        &self,
        source: &[R],
        filter: &FilterSpec<R::Field>,
        grouping: &GroupKeySpec<R>,
    ) -> Result<ViewOutput<R>, GroupingError> {
        compute(source, filter, grouping, self.output.revision + 1).inspect_err(|e| {
            tracing::warn!(
                entity = R::ENTITY,
                error = %e,
                "View recomputation failed; keeping previous output"
            );
        })
    }

    fn publish(&mut self, output: ViewOutput<R>) {
        self.recomputations += 1;
        self.output = Arc::new(output);
        self.sender.send_replace(Arc::clone(&self.output));
        tracing::debug!(
            entity = R::ENTITY,
            revision = self.output.revision,
            filtered = self.output.filtered_count,
            "View recomputed"
        );
    }
}

fn compute<R: Record>(
    source: &[R],
    filter_spec: &FilterSpec<R::Field>,
    grouping: &GroupKeySpec<R>,
    revision: u64,
) -> Result<ViewOutput<R>, GroupingError> {
    let filtered = filter(source, filter_spec);
    let filtered_count = filtered.len();
    let tree = group(filtered, grouping)?;
    Ok(ViewOutput {
        filtered_count,
        total_count: source.len(),
        tree,
        revision,
    })
}
