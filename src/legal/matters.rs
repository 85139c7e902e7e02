use std::sync::Arc;

use serde::Serialize;

use crate::config::ViewConfig;
use crate::db::{ClientRecord, EntityStore, MatterField, MatterRecord, MatterStatus, PracticeStores};
use crate::error::{StoreError, SubmitError};
use crate::form::matter::matter_template;
use crate::form::{FormSession, SelectOption};
use crate::view::{FilterSpec, GroupKeySpec, GroupLevel};

pub fn matter_filter(search: &str, status: Option<&str>) -> FilterSpec<MatterField> {
    FilterSpec::new(vec![
        MatterField::Title,
        MatterField::Client,
        MatterField::PracticeArea,
    ])
    .with_search(search)
    .with_category(status)
}

/// Matters by practice area, newest first within each.
pub fn practice_area_grouping(config: &ViewConfig) -> GroupKeySpec<MatterRecord> {
    GroupKeySpec::from_config(config).level(GroupLevel::field(
        "practice_area",
        MatterField::PracticeArea,
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: &'static str,
    pub count: usize,
}

/// Count per status, every status listed even when zero.
pub fn status_counts(matters: &[MatterRecord]) -> Vec<StatusCount> {
    MatterStatus::ALL
        .iter()
        .map(|status| StatusCount {
            status: status.as_str(),
            count: matters.iter().filter(|m| m.status == *status).count(),
        })
        .collect()
}

pub fn matters_for_client<'a>(
    matters: &'a [MatterRecord],
    client_name: &str,
) -> Vec<&'a MatterRecord> {
    matters
        .iter()
        .filter(|m| m.client.eq_ignore_ascii_case(client_name.trim()))
        .collect()
}

pub fn set_status(
    store: &mut EntityStore<MatterRecord>,
    id: &str,
    status: MatterStatus,
) -> Result<Arc<[MatterRecord]>, StoreError> {
    let snapshot = store.update_with(id, |matter| MatterRecord {
        status,
        ..matter.clone()
    })?;
    tracing::info!(matter = id, status = status.as_str(), "Matter status changed");
    Ok(snapshot)
}

/// Submit a new-matter form. A matter started from a template also gets the
/// template's default tasks.
pub fn open_matter(
    stores: &mut PracticeStores,
    session: &mut FormSession<MatterRecord>,
) -> Result<Arc<[MatterRecord]>, SubmitError> {
    let template = session
        .state()
        .value("template")
        .as_text()
        .and_then(matter_template);
    let snapshot = session.submit_into(&mut stores.matters)?;
    if let (Some(template), Some(matter)) = (template, snapshot.last()) {
        for task in template.tasks_for(matter) {
            stores.tasks.insert(task)?;
        }
        tracing::info!(
            matter = %matter.id,
            template = template.id,
            tasks = template.default_tasks.len(),
            "Matter opened from template"
        );
    }
    Ok(snapshot)
}

/// Case choices for forms, linked to the client record with the same name.
pub fn case_options(matters: &[MatterRecord], clients: &[ClientRecord]) -> Vec<SelectOption> {
    matters
        .iter()
        .filter(|m| m.status != MatterStatus::Closed)
        .map(|m| {
            let parent = clients
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(&m.client))
                .map(|c| c.id.clone());
            SelectOption::new(m.id.clone(), m.title.clone()).with_parent(parent)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use std::sync::Arc;

    use chrono::NaiveDate;

    use super::{
        case_options, matter_filter, matters_for_client, open_matter, practice_area_grouping,
        set_status, status_counts,
    };
    use crate::config::ViewConfig;
    use crate::db::{EntityStore, MatterStatus, PracticeStores, seed};
    use crate::error::StoreError;
    use crate::form::FormSession;
    use crate::form::matter::matter_schema;
    use crate::legal::tasks::tasks_for_case;
    use crate::view::{filter, group};

    #[test]
    fn status_counts_cover_every_status() {
        let counts: Vec<(&str, usize)> = status_counts(&seed::matters())
            .into_iter()
            .map(|c| (c.status, c.count))
            .collect();
        assert_eq!(
            counts,
            vec![("Active", 7), ("Pending", 1), ("On Hold", 1), ("Closed", 1)]
        );
        assert!(status_counts(&[]).iter().all(|c| c.count == 0));
    }

    #[test]
    fn filter_by_status_and_search() {
        let matters = seed::matters();
        let on_hold = filter(&matters, &matter_filter("", Some("On Hold")));
        assert_eq!(on_hold.len(), 1);
        assert_eq!(on_hold[0].id, "CS-2023-008");

        let corporate = filter(&matters, &matter_filter("corporate", None));
        assert_eq!(corporate.len(), 2);
    }

    #[test]
    fn grouping_by_practice_area() {
        let matters = seed::matters();
        let tree =
            group(&matters, &practice_area_grouping(&ViewConfig::default())).expect("grouping");
        assert_eq!(tree.top_keys().first(), Some(&"Corporate"));
        assert_eq!(tree.find(&["Probate"]).map(|n| n.aggregate.count), Some(2));
    }

    #[test]
    fn client_lookup_and_status_change() {
        let matters = seed::matters();
        assert_eq!(matters_for_client(&matters, "mary smith").len(), 1);

        let mut store = EntityStore::new(matters).expect("seed");
        set_status(&mut store, "CS-2023-006", MatterStatus::Active).expect("activate");
        assert_eq!(store.get("CS-2023-006").map(|m| m.status), Some(MatterStatus::Active));
        assert!(matches!(
            set_status(&mut store, "CS-404", MatterStatus::Closed),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn case_options_link_known_clients() {
        let options = case_options(&seed::matters(), &seed::clients());
        assert_eq!(options.len(), 9, "closed matters are not offered");
        let smith = options.iter().find(|o| o.value == "CS-2023-001").expect("smith");
        assert_eq!(smith.parent.as_deref(), Some("CL-2023-001"));
        let lee = options.iter().find(|o| o.value == "CS-2023-009").expect("lee");
        assert_eq!(lee.parent, None);
    }

    #[test]
    fn opening_from_a_template_adds_its_tasks() {
        let mut stores = PracticeStores::seeded().expect("seed");
        let today = NaiveDate::from_ymd_opt(2023, 12, 4).expect("date");
        let mut session = FormSession::new(Arc::new(matter_schema(today).expect("schema")));
        session.update("title", "Davis Settlement").expect("title");
        session.update("client", "Sarah Davis").expect("client");
        session.update("template", "template-2").expect("template");

        let snapshot = open_matter(&mut stores, &mut session).expect("opened");
        let matter = snapshot.last().expect("new matter");
        assert_eq!(matter.practice_area, "Personal Injury");
        assert_eq!(stores.matters.len(), 11);

        let titles: Vec<&str> = tasks_for_case(stores.tasks.records(), &matter.id)
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(
            titles,
            vec![
                "Gather medical records",
                "Calculate damages",
                "File insurance claim",
                "Negotiate settlement",
            ]
        );
    }

    #[test]
    fn opening_from_scratch_adds_no_tasks() {
        let mut stores = PracticeStores::seeded().expect("seed");
        let today = NaiveDate::from_ymd_opt(2023, 12, 4).expect("date");
        let mut session = FormSession::new(Arc::new(matter_schema(today).expect("schema")));
        session.update("title", "Lee Lease Review").expect("title");
        session.update("client", "David Lee").expect("client");
        session.update("type", "Real Estate").expect("type");

        open_matter(&mut stores, &mut session).expect("opened");
        assert_eq!(stores.tasks.len(), 3);
    }
}
