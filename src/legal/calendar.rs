use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::config::ViewConfig;
use crate::db::{AppointmentField, AppointmentRecord};
use crate::view::{FilterSpec, GroupKeySpec, GroupLevel};

pub fn appointment_filter(search: &str, kind: Option<&str>) -> FilterSpec<AppointmentField> {
    FilterSpec::new(vec![
        AppointmentField::Title,
        AppointmentField::Location,
        AppointmentField::Client,
        AppointmentField::Notes,
    ])
    .with_search(search)
    .with_category(kind)
}

fn by_start(a: &&AppointmentRecord, b: &&AppointmentRecord) -> std::cmp::Ordering {
    a.starts_at.cmp(&b.starts_at).then_with(|| a.id.cmp(&b.id))
}

/// Appointments on `day`, earliest first.
pub fn appointments_on(
    appointments: &[AppointmentRecord],
    day: NaiveDate,
) -> Vec<&AppointmentRecord> {
    let mut out: Vec<&AppointmentRecord> = appointments
        .iter()
        .filter(|a| a.starts_at.date() == day)
        .collect();
    out.sort_by(by_start);
    out
}

pub fn previous_day(day: NaiveDate) -> NaiveDate {
    day.pred_opt().unwrap_or(day)
}

pub fn next_day(day: NaiveDate) -> NaiveDate {
    day.succ_opt().unwrap_or(day)
}

/// Appointments starting in `[from, from + days)`, earliest first.
pub fn upcoming(
    appointments: &[AppointmentRecord],
    from: NaiveDateTime,
    days: i64,
) -> Vec<&AppointmentRecord> {
    let until = from + Duration::days(days);
    let mut out: Vec<&AppointmentRecord> = appointments
        .iter()
        .filter(|a| a.starts_at >= from && a.starts_at < until)
        .collect();
    out.sort_by(by_start);
    out
}

/// Appointments per calendar day, earliest day first.
pub fn agenda_grouping(config: &ViewConfig) -> GroupKeySpec<AppointmentRecord> {
    GroupKeySpec::from_config(config).level(GroupLevel::day())
}
