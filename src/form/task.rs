//! Add-task form for one case.

use chrono::NaiveDate;

use crate::db::{Priority, TaskRecord, TaskStatus};
use crate::error::{FormError, ValidationErrors};
use crate::form::{FieldValue, FormSchema, FormValues, Rule, short_id};

fn labels<T: Copy>(all: &[T], label: fn(T) -> &'static str) -> Vec<String> {
    all.iter().map(|v| label(*v).to_string()).collect()
}

/// Tasks created through this form belong to `case_id` and are stamped
/// with `today`.
pub fn task_schema(case_id: &str, today: NaiveDate) -> Result<FormSchema<TaskRecord>, FormError> {
    let case_id = case_id.to_string();
    FormSchema::builder("task")
        .field("title", FieldValue::Empty)
        .field("description", FieldValue::Empty)
        .field("due_date", FieldValue::Empty)
        .field("assigned_to", FieldValue::Empty)
        .field("priority", FieldValue::text(Priority::Medium.as_str()))
        .field("status", FieldValue::text(TaskStatus::ToDo.as_str()))
        .rule("title", Rule::required("Title is required"))
        .rule("due_date", Rule::required("Due date is required"))
        .rule("assigned_to", Rule::required("Assignee is required"))
        .rule("priority", Rule::required("Priority is required"))
        .rule(
            "priority",
            Rule::one_of(labels(&Priority::ALL, Priority::as_str), "Unknown priority"),
        )
        .rule("status", Rule::required("Status is required"))
        .rule(
            "status",
            Rule::one_of(labels(&TaskStatus::ALL, TaskStatus::as_str), "Unknown status"),
        )
        .build(move |values| build_task(values, &case_id, today))
}

fn build_task(
    values: &FormValues,
    case_id: &str,
    today: NaiveDate,
) -> Result<TaskRecord, ValidationErrors> {
    let text = |name: &str| values.get(name).as_text().unwrap_or_default().to_string();
    let due_date = values
        .get("due_date")
        .as_date()
        .ok_or_else(|| ValidationErrors::single("due_date", "Due date must be YYYY-MM-DD"))?;
    let priority = values
        .get("priority")
        .as_text()
        .and_then(Priority::from_label)
        .ok_or_else(|| ValidationErrors::single("priority", "Unknown priority"))?;
    let status = values
        .get("status")
        .as_text()
        .and_then(TaskStatus::from_label)
        .ok_or_else(|| ValidationErrors::single("status", "Unknown status"))?;

    Ok(TaskRecord {
        id: format!("TASK-{}", short_id()),
        case_id: case_id.to_string(),
        title: text("title"),
        description: values.get("description").as_text().map(str::to_string),
        due_date,
        assigned_to: text("assigned_to"),
        priority,
        status,
        created_on: today,
    })
}
