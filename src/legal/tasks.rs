//! Tasks attached to a case.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::db::{EntityStore, TaskField, TaskRecord, TaskStatus};
use crate::error::StoreError;
use crate::view::FilterSpec;

pub fn task_filter(search: &str, status: Option<&str>) -> FilterSpec<TaskField> {
    FilterSpec::new(vec![TaskField::Title, TaskField::Description, TaskField::AssignedTo])
        .with_search(search)
        .with_category(status)
}

/// A case's tasks, soonest due first.
pub fn tasks_for_case<'a>(tasks: &'a [TaskRecord], case_id: &str) -> Vec<&'a TaskRecord> {
    let mut found: Vec<&TaskRecord> = tasks.iter().filter(|t| t.case_id == case_id).collect();
    found.sort_by(|a, b| a.due_date.cmp(&b.due_date).then_with(|| a.id.cmp(&b.id)));
    found
}

pub fn open_task_count(tasks: &[TaskRecord], case_id: &str) -> usize {
    tasks
        .iter()
        .filter(|t| t.case_id == case_id && t.status != TaskStatus::Completed)
        .count()
}

pub fn overdue_tasks(tasks: &[TaskRecord], today: NaiveDate) -> Vec<&TaskRecord> {
    tasks.iter().filter(|t| t.is_overdue(today)).collect()
}

/// Replace an edited task. The case and creation date are kept.
pub fn update_task(
    store: &mut EntityStore<TaskRecord>,
    task: TaskRecord,
) -> Result<Arc<[TaskRecord]>, StoreError> {
    let id = task.id.clone();
    let snapshot = store.update_with(&id, |current| TaskRecord {
        case_id: current.case_id.clone(),
        created_on: current.created_on,
        ..task
    })?;
    tracing::info!(task = %id, "Task updated");
    Ok(snapshot)
}

pub fn delete_task(
    store: &mut EntityStore<TaskRecord>,
    id: &str,
) -> Result<Arc<[TaskRecord]>, StoreError> {
    let snapshot = store.remove(id)?;
    tracing::info!(task = id, "Task deleted");
    Ok(snapshot)
}

pub fn set_task_status(
    store: &mut EntityStore<TaskRecord>,
    id: &str,
    status: TaskStatus,
) -> Result<Arc<[TaskRecord]>, StoreError> {
    let snapshot = store.update_with(id, |task| TaskRecord {
        status,
        ..task.clone()
    })?;
    tracing::info!(task = id, status = status.as_str(), "Task status changed");
    Ok(snapshot)
}

/// Checkbox toggle: checked completes the task, unchecked reopens it as To Do.
pub fn toggle_completed(
    store: &mut EntityStore<TaskRecord>,
    id: &str,
    checked: bool,
) -> Result<Arc<[TaskRecord]>, StoreError> {
    let status = if checked {
        TaskStatus::Completed
    } else {
        TaskStatus::ToDo
    };
    set_task_status(store, id, status)
}
