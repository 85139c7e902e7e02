use std::collections::HashSet;
use std::sync::Arc;

use crate::db::Record;
use crate::error::StoreError;

/// In-memory authoritative collection for one entity type.
///
/// Mutations never touch the current snapshot: they build a new one and swap
/// it in, so holders of an older `Arc` keep a consistent view and consumers
/// can detect changes with [`Arc::ptr_eq`]. A rejected mutation leaves the
/// snapshot pointer untouched.
#[derive(Debug, Clone)]
pub struct EntityStore<R: Record> {
    snapshot: Arc<[R]>,
}

impl<R: Record> Default for EntityStore<R> {
    fn default() -> Self {
        Self {
            snapshot: Arc::from(Vec::new()),
        }
    }
}

impl<R: Record> EntityStore<R> {
    /// Build a store from initial records, rejecting duplicate ids.
    pub fn new(records: Vec<R>) -> Result<Self, StoreError> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.id()) {
                return Err(StoreError::DuplicateId {
                    entity: R::ENTITY,
                    id: record.id().to_string(),
                });
            }
        }
        tracing::debug!(entity = R::ENTITY, count = records.len(), "Entity store initialized");
        Ok(Self {
            snapshot: Arc::from(records),
        })
    }

    /// Build a store from a seed source (sample data today, a fetch later).
    pub fn seeded<F>(seed: F) -> Result<Self, StoreError>
    where
        F: FnOnce() -> Vec<R>,
    {
        Self::new(seed())
    }

    pub fn snapshot(&self) -> Arc<[R]> {
        Arc::clone(&self.snapshot)
    }

    pub fn records(&self) -> &[R] {
        &self.snapshot
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.snapshot.iter().find(|r| r.id() == id)
    }

    fn position(&self, id: &str) -> Result<usize, StoreError> {
        self.snapshot
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| StoreError::NotFound {
                entity: R::ENTITY,
                id: id.to_string(),
            })
    }

    fn swap(&mut self, records: Vec<R>) -> Arc<[R]> {
        self.snapshot = Arc::from(records);
        Arc::clone(&self.snapshot)
    }

    /// Append a record. Fails with `DuplicateId` when the id is taken.
    pub fn insert(&mut self, record: R) -> Result<Arc<[R]>, StoreError> {
        if self.get(record.id()).is_some() {
            return Err(StoreError::DuplicateId {
                entity: R::ENTITY,
                id: record.id().to_string(),
            });
        }
        tracing::debug!(entity = R::ENTITY, id = record.id(), "Inserting record");
        let mut next = Vec::with_capacity(self.snapshot.len() + 1);
        next.extend(self.snapshot.iter().cloned());
        next.push(record);
        Ok(self.swap(next))
    }

    /// Replace the record with the same id, keeping its position.
    pub fn update(&mut self, record: R) -> Result<Arc<[R]>, StoreError> {
        let index = self.position(record.id())?;
        tracing::debug!(entity = R::ENTITY, id = record.id(), "Replacing record");
        let mut next = self.snapshot.to_vec();
        next[index] = record;
        Ok(self.swap(next))
    }

    /// Replace a record with a value derived from its current state.
    pub fn update_with<F>(&mut self, id: &str, apply: F) -> Result<Arc<[R]>, StoreError>
    where
        F: FnOnce(&R) -> R,
    {
        let index = self.position(id)?;
        let replacement = apply(&self.snapshot[index]);
        if replacement.id() != id {
            return Err(StoreError::IdChanged {
                entity: R::ENTITY,
                id: id.to_string(),
                new_id: replacement.id().to_string(),
            });
        }
        let mut next = self.snapshot.to_vec();
        next[index] = replacement;
        Ok(self.swap(next))
    }

    /// Delete a record. A missing id is reported, never silently accepted.
    pub fn remove(&mut self, id: &str) -> Result<Arc<[R]>, StoreError> {
        let index = self.position(id)?;
        tracing::debug!(entity = R::ENTITY, id, "Removing record");
        let mut next = self.snapshot.to_vec();
        next.remove(index);
        Ok(self.swap(next))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use crate::db::{EntityStore, MatterRecord, MatterStatus, Priority};
    use crate::error::StoreError;

    fn matter(id: &str, title: &str) -> MatterRecord {
        MatterRecord {
            id: id.to_string(),
            title: title.to_string(),
            client: "Mary Smith".to_string(),
            practice_area: "Family Law".to_string(),
            opened_on: NaiveDate::from_ymd_opt(2023, 8, 10).expect("valid date"),
            status: MatterStatus::Active,
            priority: Priority::High,
            description: None,
        }
    }

    fn store() -> EntityStore<MatterRecord> {
        EntityStore::new(vec![
            matter("CS-1", "Smith vs. Johnson"),
            matter("CS-2", "Brown Estate"),
        ])
        .expect("unique ids")
    }

    #[test]
    fn new_rejects_duplicate_seed_ids() {
        let err = EntityStore::new(vec![matter("CS-1", "a"), matter("CS-1", "b")])
            .expect_err("duplicate seed");
        assert_eq!(
            err,
            StoreError::DuplicateId {
                entity: "matter",
                id: "CS-1".to_string()
            }
        );
    }

    #[test]
    fn insert_swaps_in_a_new_snapshot() {
        let mut store = store();
        let before = store.snapshot();

        let after = store.insert(matter("CS-3", "Williams")).expect("insert");
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before.len(), 2, "old snapshot is untouched");
        assert_eq!(after.len(), 3);
        assert_eq!(after[2].id, "CS-3");
    }

    #[test]
    fn insert_duplicate_keeps_snapshot_reference() {
        let mut store = store();
        let before = store.snapshot();

        let err = store
            .insert(matter("CS-1", "Duplicate"))
            .expect_err("duplicate id");
        assert!(matches!(err, StoreError::DuplicateId { .. }));
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn update_replaces_in_place_and_reports_missing_ids() {
        let mut store = store();
        let mut changed = matter("CS-2", "Brown Estate");
        changed.status = MatterStatus::Closed;

        let after = store.update(changed).expect("update");
        assert_eq!(after[1].status, MatterStatus::Closed);

        let before = store.snapshot();
        let err = store
            .update(matter("CS-9", "Ghost"))
            .expect_err("missing id");
        assert_eq!(
            err,
            StoreError::NotFound {
                entity: "matter",
                id: "CS-9".to_string()
            }
        );
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn update_with_refuses_id_changes() {
        let mut store = store();
        let before = store.snapshot();
        let err = store
            .update_with("CS-1", |m| matter("CS-7", &m.title))
            .expect_err("id change");
        assert!(matches!(err, StoreError::IdChanged { .. }));
        assert!(Arc::ptr_eq(&before, &store.snapshot()));

        store
            .update_with("CS-1", |m| MatterRecord {
                status: MatterStatus::OnHold,
                ..m.clone()
            })
            .expect("status change");
        assert_eq!(
            store.get("CS-1").map(|m| m.status),
            Some(MatterStatus::OnHold)
        );
    }

    #[test]
    fn remove_missing_id_is_an_error_not_a_noop() {
        let mut store = store();
        store.remove("CS-1").expect("first removal");
        assert_eq!(store.len(), 1);

        let before = store.snapshot();
        let err = store.remove("CS-1").expect_err("already gone");
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert!(Arc::ptr_eq(&before, &store.snapshot()));
    }
}
