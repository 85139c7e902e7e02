//! New-matter form, optionally started from a matter template.
//!
//! Choosing a template fills in the matter type; clearing it empties the
//! type again. The type stays writable so a templated matter can still be
//! filed under another practice area.

use chrono::{Days, NaiveDate};

use crate::db::{MatterRecord, MatterStatus, Priority, TaskRecord, TaskStatus};
use crate::error::{FormError, ValidationErrors};
use crate::form::{FieldValue, FormSchema, FormValues, Rule, short_id};

pub const PRACTICE_AREAS: [&str; 7] = [
    "Family Law",
    "Personal Injury",
    "Corporate",
    "Real Estate",
    "Criminal Defense",
    "Probate",
    "Litigation",
];

/// Assignee for tasks created from a template.
pub const UNASSIGNED: &str = "Unassigned";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatterTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub practice_area: &'static str,
    pub description: &'static str,
    pub default_tasks: &'static [&'static str],
}

pub const MATTER_TEMPLATES: [MatterTemplate; 4] = [
    MatterTemplate {
        id: "template-1",
        name: "Family Law Divorce",
        practice_area: "Family Law",
        description: "Standard divorce proceedings template with custody considerations",
        default_tasks: &[
            "Initial client consultation",
            "File petition",
            "Serve papers",
            "Discovery phase",
        ],
    },
    MatterTemplate {
        id: "template-2",
        name: "Personal Injury Claim",
        practice_area: "Personal Injury",
        description: "Personal injury case template with medical records and settlement tracking",
        default_tasks: &[
            "Gather medical records",
            "Calculate damages",
            "File insurance claim",
            "Negotiate settlement",
        ],
    },
    MatterTemplate {
        id: "template-3",
        name: "Estate Planning",
        practice_area: "Probate",
        description: "Comprehensive estate planning template with will and trust documents",
        default_tasks: &[
            "Asset inventory",
            "Draft will",
            "Create trust documents",
            "Execute documents",
        ],
    },
    MatterTemplate {
        id: "template-4",
        name: "Business Formation",
        practice_area: "Corporate",
        description: "Business entity formation template with compliance requirements",
        default_tasks: &[
            "Choose entity type",
            "File formation documents",
            "Create operating agreement",
            "Obtain EIN",
        ],
    },
];

pub fn matter_template(id: &str) -> Option<&'static MatterTemplate> {
    MATTER_TEMPLATES.iter().find(|t| t.id == id)
}

impl MatterTemplate {
    /// One open task per default, due a week apart from the opening date.
    pub fn tasks_for(&self, matter: &MatterRecord) -> Vec<TaskRecord> {
        self.default_tasks
            .iter()
            .zip(1u64..)
            .map(|(title, week)| TaskRecord {
                id: format!("TASK-{}", short_id()),
                case_id: matter.id.clone(),
                title: title.to_string(),
                description: None,
                due_date: matter
                    .opened_on
                    .checked_add_days(Days::new(7 * week))
                    .unwrap_or(matter.opened_on),
                assigned_to: UNASSIGNED.to_string(),
                priority: matter.priority,
                status: TaskStatus::ToDo,
                created_on: matter.opened_on,
            })
            .collect()
    }
}

/// Matters created through this form open as Active on `today`.
pub fn matter_schema(today: NaiveDate) -> Result<FormSchema<MatterRecord>, FormError> {
    let areas = PRACTICE_AREAS.iter().map(|a| a.to_string()).collect();
    let priorities = Priority::ALL.iter().map(|p| p.as_str().to_string()).collect();
    let templates = MATTER_TEMPLATES.iter().map(|t| t.id.to_string()).collect();

    FormSchema::builder("matter")
        .field("title", FieldValue::Empty)
        .field("client", FieldValue::Empty)
        .field("type", FieldValue::Empty)
        .field("description", FieldValue::Empty)
        .field("priority", FieldValue::text(Priority::Medium.as_str()))
        .field("template", FieldValue::Empty)
        .rule("title", Rule::required("Matter title is required"))
        .rule("client", Rule::required("Client is required"))
        .rule("type", Rule::required("Matter type is required"))
        .rule("type", Rule::one_of(areas, "Unknown matter type"))
        .rule("priority", Rule::required("Priority is required"))
        .rule("priority", Rule::one_of(priorities, "Unknown priority"))
        .rule("template", Rule::one_of(templates, "Unknown template"))
        .dependent("type", &["template"], |values, _| {
            match values.get("template").as_text().and_then(matter_template) {
                Some(template) => FieldValue::text(template.practice_area),
                None => FieldValue::Empty,
            }
        })
        .editable("type")
        .build(move |values| build_matter(values, today))
}

fn build_matter(values: &FormValues, today: NaiveDate) -> Result<MatterRecord, ValidationErrors> {
    let text = |name: &str| values.get(name).as_text().unwrap_or_default().to_string();
    let priority = values
        .get("priority")
        .as_text()
        .and_then(Priority::from_label)
        .ok_or_else(|| ValidationErrors::single("priority", "Unknown priority"))?;

    Ok(MatterRecord {
        id: format!("CS-{}", short_id()),
        title: text("title"),
        client: text("client"),
        practice_area: text("type"),
        opened_on: today,
        status: MatterStatus::Active,
        priority,
        description: values.get("description").as_text().map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::{matter_schema, matter_template};
    use crate::db::{MatterRecord, MatterStatus, Priority, TaskStatus};
    use crate::form::{FieldValue, FormSession};

    fn day(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, m, d).expect("valid date")
    }

    fn session() -> FormSession<MatterRecord> {
        FormSession::new(Arc::new(matter_schema(day(12, 4)).expect("schema")))
    }

    #[test]
    fn template_fills_and_clears_the_type() {
        let mut session = session();
        session.update("template", "template-3").expect("template");
        assert_eq!(session.state().value("type"), &FieldValue::text("Probate"));

        session.update("type", "Litigation").expect("type stays writable");
        assert_eq!(session.state().value("type"), &FieldValue::text("Litigation"));

        session.update("template", FieldValue::Empty).expect("scratch");
        assert_eq!(session.state().value("type"), &FieldValue::Empty);
        assert_eq!(session.state().error("type"), Some("Matter type is required"));
    }

    #[test]
    fn type_must_be_a_practice_area() {
        let mut session = session();
        session.update("type", "Maritime").expect("type");
        assert_eq!(session.state().error("type"), Some("Unknown matter type"));
        session.update("template", "template-9").expect("template");
        assert_eq!(session.state().error("template"), Some("Unknown template"));
    }

    #[test]
    fn submit_opens_an_active_matter_today() {
        let mut session = session();
        session.update("title", "Garcia Partnership").expect("title");
        session.update("client", "Ana Garcia").expect("client");
        session.update("template", "template-4").expect("template");

        let matter = session.submit().expect("valid matter");
        assert!(matter.id.starts_with("CS-"));
        assert_eq!(matter.practice_area, "Corporate");
        assert_eq!(matter.status, MatterStatus::Active);
        assert_eq!(matter.priority, Priority::Medium);
        assert_eq!(matter.opened_on, day(12, 4));
        assert_eq!(matter.description, None);
    }

    #[test]
    fn template_tasks_are_due_weekly() {
        let mut session = session();
        session.update("title", "Taylor Divorce").expect("title");
        session.update("client", "Emily Taylor").expect("client");
        session.update("template", "template-1").expect("template");
        let matter = session.submit().expect("valid matter");

        let tasks = matter_template("template-1").expect("template").tasks_for(&matter);
        let due: Vec<(&str, NaiveDate)> =
            tasks.iter().map(|t| (t.title.as_str(), t.due_date)).collect();
        assert_eq!(
            due,
            vec![
                ("Initial client consultation", day(12, 11)),
                ("File petition", day(12, 18)),
                ("Serve papers", day(12, 25)),
                ("Discovery phase", NaiveDate::from_ymd_opt(2024, 1, 1).expect("date")),
            ]
        );
        assert!(tasks.iter().all(|t| t.case_id == matter.id));
        assert!(tasks.iter().all(|t| t.status == TaskStatus::ToDo));
        assert!(tasks.iter().all(|t| t.assigned_to == "Unassigned"));
    }
}
