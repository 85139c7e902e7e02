//! New-appointment form.

use chrono::{NaiveDate, NaiveTime};

use crate::db::{AppointmentRecord, AppointmentType, non_blank, parse_duration_label};
use crate::error::{FormError, ValidationErrors};
use crate::form::{FieldValue, FormSchema, FormValues, Rule};

const TIME_FORMAT: &str = "%H:%M";

pub const APPOINTMENT_TYPES: [AppointmentType; 5] = [
    AppointmentType::Meeting,
    AppointmentType::Court,
    AppointmentType::Task,
    AppointmentType::Deposition,
    AppointmentType::Call,
];

fn is_clock_time(value: &FieldValue) -> bool {
    value
        .as_text()
        .is_some_and(|t| NaiveTime::parse_from_str(t, TIME_FORMAT).is_ok())
}

fn is_duration(value: &FieldValue) -> bool {
    value.as_text().and_then(parse_duration_label).is_some()
}

/// Form for scheduling on `date` (the day selected in the calendar).
pub fn appointment_schema(date: NaiveDate) -> Result<FormSchema<AppointmentRecord>, FormError> {
    let types = APPOINTMENT_TYPES
        .iter()
        .map(|t| t.as_str().to_string())
        .collect();

    FormSchema::builder("appointment")
        .field("title", FieldValue::Empty)
        .field("date", FieldValue::Date(date))
        .field("start_time", FieldValue::text("09:00"))
        .field("duration", FieldValue::text("1 hour"))
        .field("type", FieldValue::Empty)
        .field("location", FieldValue::Empty)
        .field("client", FieldValue::Empty)
        .field("notes", FieldValue::Empty)
        .rule("title", Rule::min_length(3, "Title must be at least 3 characters"))
        .rule("date", Rule::required("Appointment date is required"))
        .rule("start_time", Rule::required("Start time is required"))
        .rule(
            "start_time",
            Rule::predicate(is_clock_time, "Start time must be HH:MM"),
        )
        .rule("duration", Rule::required("Duration is required"))
        .rule(
            "duration",
            Rule::predicate(is_duration, "Duration must look like \"30 minutes\" or \"1.5 hours\""),
        )
        .rule("type", Rule::required("Appointment type is required"))
        .rule("type", Rule::one_of(types, "Unknown appointment type"))
        .rule("location", Rule::required("Location is required"))
        .build(build_appointment)
}

fn build_appointment(values: &FormValues) -> Result<AppointmentRecord, ValidationErrors> {
    let date = values
        .get("date")
        .as_date()
        .ok_or_else(|| ValidationErrors::single("date", "Appointment date is required"))?;
    let time = values
        .get("start_time")
        .as_text()
        .and_then(|t| NaiveTime::parse_from_str(t, TIME_FORMAT).ok())
        .ok_or_else(|| ValidationErrors::single("start_time", "Start time must be HH:MM"))?;
    let duration_minutes = values
        .get("duration")
        .as_text()
        .and_then(parse_duration_label)
        .ok_or_else(|| ValidationErrors::single("duration", "Duration is required"))?;
    let kind = values
        .get("type")
        .as_text()
        .and_then(AppointmentType::from_label)
        .ok_or_else(|| ValidationErrors::single("type", "Unknown appointment type"))?;
    let text = |name: &str| values.get(name).as_text().unwrap_or_default().to_string();

    Ok(AppointmentRecord {
        id: uuid::Uuid::new_v4().to_string(),
        title: text("title"),
        starts_at: date.and_time(time),
        kind,
        location: text("location"),
        duration_minutes,
        client: non_blank(Some(text("client"))),
        notes: non_blank(Some(text("notes"))),
    })
}
