//! Log-an-interaction form. The case choice is scoped to the selected client.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::db::{InteractionRecord, InteractionType};
use crate::error::{FormError, ValidationErrors};
use crate::form::{
    FieldValue, FormSchema, FormValues, Rule, SelectOption, case_belongs_to, find_option,
    option_values, short_id,
};

pub const INTERACTION_TYPES: [InteractionType; 5] = [
    InteractionType::PhoneCall,
    InteractionType::Email,
    InteractionType::Meeting,
    InteractionType::VideoCall,
    InteractionType::TextMessage,
];

fn is_clock_time(value: &FieldValue) -> bool {
    value
        .as_text()
        .is_some_and(|t| NaiveTime::parse_from_str(t, "%H:%M").is_ok())
}

pub fn interaction_schema(
    clients: Vec<SelectOption>,
    cases: Vec<SelectOption>,
    today: NaiveDate,
) -> Result<FormSchema<InteractionRecord>, FormError> {
    let client_values = option_values(&clients);
    let case_values = option_values(&cases);
    let types = INTERACTION_TYPES
        .iter()
        .map(|t| t.as_str().to_string())
        .collect();
    let cases = Arc::new(cases);
    let scoped_cases = Arc::clone(&cases);

    FormSchema::builder("interaction")
        .field("client_id", FieldValue::Empty)
        .field("case_id", FieldValue::Empty)
        .field("type", FieldValue::Empty)
        .field("date", FieldValue::Date(today))
        .field("time", FieldValue::text("09:00"))
        .field("duration", FieldValue::Empty)
        .field("summary", FieldValue::Empty)
        .field("follow_up_required", FieldValue::Flag(false))
        .field("follow_up_date", FieldValue::Empty)
        .rule("client_id", Rule::required("Client is required"))
        .rule("client_id", Rule::one_of(client_values, "Unknown client"))
        .rule("case_id", Rule::one_of(case_values, "Unknown case"))
        .rule("type", Rule::required("Interaction type is required"))
        .rule("type", Rule::one_of(types, "Unknown interaction type"))
        .rule("date", Rule::required("Date is required"))
        .rule("time", Rule::predicate(is_clock_time, "Time must be HH:MM"))
        .rule(
            "duration",
            Rule::min_number(Decimal::ONE, "Duration must be at least 1 minute"),
        )
        .rule("summary", Rule::required("Summary is required"))
        .rule(
            "follow_up_date",
            Rule::required_if("follow_up_required", "Follow-up date is required"),
        )
        .rule(
            "follow_up_date",
            Rule::not_before("date", "Follow-up date must be on or after the interaction date"),
        )
        .dependent("case_id", &["client_id"], move |values, _| {
            let current = values.get("case_id");
            match (current.as_text(), values.get("client_id").as_text()) {
                (Some(case), Some(client)) if case_belongs_to(&scoped_cases, case, client) => {
                    current.clone()
                }
                _ => FieldValue::Empty,
            }
        })
        .editable("case_id")
        .build(move |values| build_interaction(values, &clients, &cases))
}

fn build_interaction(
    values: &FormValues,
    clients: &[SelectOption],
    cases: &[SelectOption],
) -> Result<InteractionRecord, ValidationErrors> {
    let client_id = values.get("client_id").as_text().unwrap_or_default();
    let client = find_option(clients, client_id)
        .ok_or_else(|| ValidationErrors::single("client_id", "Unknown client"))?;
    let case = match values.get("case_id").as_text() {
        Some(case_id) if !case_belongs_to(cases, case_id, client_id) => {
            return Err(ValidationErrors::single(
                "case_id",
                "Case does not belong to the selected client",
            ));
        }
        Some(case_id) => find_option(cases, case_id),
        None => None,
    };
    let kind = values
        .get("type")
        .as_text()
        .and_then(InteractionType::from_label)
        .ok_or_else(|| ValidationErrors::single("type", "Unknown interaction type"))?;
    let date = values
        .get("date")
        .as_date()
        .ok_or_else(|| ValidationErrors::single("date", "Date is required"))?;
    let time = values
        .get("time")
        .as_text()
        .and_then(|t| NaiveTime::parse_from_str(t, "%H:%M").ok())
        .unwrap_or(NaiveTime::MIN);
    let follow_up_required = values.get("follow_up_required").as_flag();

    Ok(InteractionRecord {
        id: format!("INT-{}", short_id()),
        client_id: client.value.clone(),
        client_name: client.label.clone(),
        case_id: case.map(|c| c.value.clone()),
        case_name: case.map(|c| c.label.clone()),
        kind,
        occurred_at: date.and_time(time),
        duration_minutes: values.get("duration").as_number().and_then(|d| d.to_u32()),
        summary: values
            .get("summary")
            .as_text()
            .unwrap_or_default()
            .to_string(),
        follow_up_required,
        follow_up_date: if follow_up_required {
            values.get("follow_up_date").as_date()
        } else {
            None
        },
    })
}
