use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::ViewConfig;
use crate::db::{AppointmentRecord, ClientStatus, MatterRecord, MatterStatus, PracticeStores};
use crate::legal::billing::summarize;
use crate::legal::calendar::upcoming;
use crate::legal::clients::follow_ups_due;
use crate::legal::matters::{StatusCount, status_counts};

const RECENT_MATTERS: usize = 5;

/// Headline numbers for the landing page.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardStats {
    pub active_matters: usize,
    pub documents: usize,
    pub active_clients: usize,
    pub upcoming_events: usize,
    pub outstanding_billing: Decimal,
    pub follow_ups_due: usize,
    pub matter_status: Vec<StatusCount>,
    pub recent_matters: Vec<MatterRecord>,
    pub upcoming: Vec<AppointmentRecord>,
}

pub fn dashboard(
    stores: &PracticeStores,
    now: NaiveDateTime,
    config: &ViewConfig,
) -> DashboardStats {
    let matters = stores.matters.records();
    let events: Vec<AppointmentRecord> =
        upcoming(stores.appointments.records(), now, config.upcoming_days)
            .into_iter()
            .cloned()
            .collect();

    let mut recent: Vec<&MatterRecord> = matters.iter().collect();
    recent.sort_by(|a, b| b.opened_on.cmp(&a.opened_on).then_with(|| a.id.cmp(&b.id)));
    recent.truncate(RECENT_MATTERS);

    DashboardStats {
        active_matters: matters
            .iter()
            .filter(|m| m.status == MatterStatus::Active)
            .count(),
        documents: stores.documents.len(),
        active_clients: stores
            .clients
            .records()
            .iter()
            .filter(|c| c.status == ClientStatus::Active)
            .count(),
        upcoming_events: events.len(),
        outstanding_billing: summarize(stores.invoices.records()).outstanding,
        follow_ups_due: follow_ups_due(stores.interactions.records(), now.date()).len(),
        matter_status: status_counts(matters),
        recent_matters: recent.into_iter().cloned().collect(),
        upcoming: events,
    }
}
