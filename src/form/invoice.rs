//! New-invoice form: line items, computed totals and a pluggable tax policy.

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::ViewConfig;
use crate::db::{InvoiceLineItem, InvoiceRecord, InvoiceStatus, non_blank};
use crate::error::{FormError, ValidationErrors};
use crate::form::{
    FieldValue, FormSchema, FormValues, Rule, SelectOption, case_belongs_to, find_option,
    option_values, short_id,
};
use crate::legal::billing::{NoTax, TaxPolicy};

pub const ITEMS: &str = "items";

/// Choices and defaults the invoice form is built from.
#[derive(Debug, Clone)]
pub struct InvoiceFormContext {
    pub clients: Vec<SelectOption>,
    pub cases: Vec<SelectOption>,
    pub issue_date: NaiveDate,
    pub due_days: i64,
    pub id_prefix: String,
    pub tax: Arc<dyn TaxPolicy>,
}

impl InvoiceFormContext {
    pub fn new(
        clients: Vec<SelectOption>,
        cases: Vec<SelectOption>,
        issue_date: NaiveDate,
        config: &ViewConfig,
    ) -> Self {
        Self {
            clients,
            cases,
            issue_date,
            due_days: config.invoice_due_days,
            id_prefix: config.invoice_prefix.clone(),
            tax: Arc::new(NoTax),
        }
    }

    pub fn with_tax(mut self, tax: Arc<dyn TaxPolicy>) -> Self {
        self.tax = tax;
        self
    }
}

fn row_number(values: &FormValues, row: Option<usize>, field: &str) -> Option<Decimal> {
    let row = row?;
    values.get(&format!("{ITEMS}.{row}.{field}")).as_number()
}

fn number_or_zero(values: &FormValues, field: &str) -> Decimal {
    values.get(field).as_number().unwrap_or(Decimal::ZERO)
}

pub fn invoice_schema(context: InvoiceFormContext) -> Result<FormSchema<InvoiceRecord>, FormError> {
    let InvoiceFormContext {
        clients,
        cases,
        issue_date,
        due_days,
        id_prefix,
        tax,
    } = context;
    let due_date = issue_date + Duration::days(due_days);
    let client_values = option_values(&clients);
    let case_values = option_values(&cases);

    FormSchema::builder("invoice")
        .field("client_id", FieldValue::Empty)
        .field("case_id", FieldValue::Empty)
        .field("issue_date", FieldValue::Date(issue_date))
        .field("due_date", FieldValue::Date(due_date))
        .field("items.*.description", FieldValue::Empty)
        .field("items.*.quantity", FieldValue::Number(Decimal::ONE))
        .field("items.*.rate", FieldValue::Number(Decimal::ZERO))
        .field("items.*.amount", FieldValue::Number(Decimal::ZERO))
        .field("subtotal", FieldValue::Number(Decimal::ZERO))
        .field("tax", FieldValue::Number(Decimal::ZERO))
        .field("total", FieldValue::Number(Decimal::ZERO))
        .field("notes", FieldValue::Empty)
        .rows(ITEMS, 1)
        .rule("client_id", Rule::required("Client is required"))
        .rule("client_id", Rule::one_of(client_values, "Unknown client"))
        .rule("case_id", Rule::required("Case is required"))
        .rule("case_id", Rule::one_of(case_values, "Unknown case"))
        .rule("issue_date", Rule::required("Issue date is required"))
        .rule("due_date", Rule::required("Due date is required"))
        .rule(
            "due_date",
            Rule::not_before("issue_date", "Due date must be on or after the issue date"),
        )
        .rule(ITEMS, Rule::min_items(ITEMS, 1, "At least one invoice item is required"))
        .rule("items.*.description", Rule::required("Description is required"))
        .rule("items.*.quantity", Rule::required("Quantity is required"))
        .rule(
            "items.*.quantity",
            Rule::min_number(dec!(0.01), "Quantity must be greater than 0"),
        )
        .rule("items.*.rate", Rule::required("Rate is required"))
        .rule(
            "items.*.rate",
            Rule::min_number(dec!(0.01), "Rate must be greater than 0"),
        )
        .rule(
            "items.*.amount",
            Rule::min_number(dec!(0.01), "Amount must be greater than 0"),
        )
        .dependent(
            "items.*.amount",
            &["items.*.quantity", "items.*.rate"],
            |values, row| {
                match (
                    row_number(values, row, "quantity"),
                    row_number(values, row, "rate"),
                ) {
                    (Some(quantity), Some(rate)) => FieldValue::Number(quantity * rate),
                    _ => FieldValue::Number(Decimal::ZERO),
                }
            },
        )
        .dependent("subtotal", &["items.*.amount"], |values, _| {
            FieldValue::Number(values.sum_rows(ITEMS, "amount"))
        })
        .dependent("tax", &["subtotal"], move |values, _| {
            FieldValue::Number(tax.tax(number_or_zero(values, "subtotal")))
        })
        .dependent("total", &["subtotal", "tax"], |values, _| {
            FieldValue::Number(number_or_zero(values, "subtotal") + number_or_zero(values, "tax"))
        })
        .build(move |values| build_invoice(values, &clients, &cases, &id_prefix))
}

fn build_invoice(
    values: &FormValues,
    clients: &[SelectOption],
    cases: &[SelectOption],
    id_prefix: &str,
) -> Result<InvoiceRecord, ValidationErrors> {
    let client_id = values.get("client_id").as_text().unwrap_or_default();
    let client = find_option(clients, client_id)
        .ok_or_else(|| ValidationErrors::single("client_id", "Unknown client"))?;
    let case_id = values.get("case_id").as_text().unwrap_or_default();
    let case = find_option(cases, case_id)
        .ok_or_else(|| ValidationErrors::single("case_id", "Unknown case"))?;
    if !case_belongs_to(cases, case_id, client_id) {
        return Err(ValidationErrors::single(
            "case_id",
            "Case does not belong to the selected client",
        ));
    }
    let issue_date = values
        .get("issue_date")
        .as_date()
        .ok_or_else(|| ValidationErrors::single("issue_date", "Issue date is required"))?;
    let due_date = values
        .get("due_date")
        .as_date()
        .ok_or_else(|| ValidationErrors::single("due_date", "Due date is required"))?;

    let line_items = values
        .indices(ITEMS)
        .into_iter()
        .map(|row| {
            let field = |name: &str| values.get(&format!("{ITEMS}.{row}.{name}"));
            InvoiceLineItem {
                description: field("description")
                    .as_text()
                    .unwrap_or_default()
                    .to_string(),
                quantity: field("quantity").as_number().unwrap_or_default(),
                rate: field("rate").as_number().unwrap_or_default(),
                amount: field("amount").as_number().unwrap_or_default(),
            }
        })
        .collect();

    Ok(InvoiceRecord {
        id: format!("{id_prefix}-{}", short_id()),
        client_id: Some(client.value.clone()),
        client: client.label.clone(),
        case_id: Some(case.value.clone()),
        case_name: case.label.clone(),
        issue_date,
        due_date,
        line_items,
        subtotal: number_or_zero(values, "subtotal"),
        tax: number_or_zero(values, "tax"),
        total: number_or_zero(values, "total"),
        status: InvoiceStatus::Draft,
        notes: non_blank(values.get("notes").as_text().map(str::to_string)),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::{InvoiceFormContext, invoice_schema};
    use crate::config::ViewConfig;
    use crate::db::{EntityStore, InvoiceStatus, seed};
    use crate::error::{FormError, SubmitError};
    use crate::form::{FieldValue, FormSession, FormStatus, SelectOption};
    use crate::legal::billing::FlatRateTax;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn context() -> InvoiceFormContext {
        InvoiceFormContext::new(
            vec![
                SelectOption::new("CL-2023-001", "Mary Smith"),
                SelectOption::new("CL-2023-002", "James Brown Jr."),
            ],
            vec![
                SelectOption::new("CS-2023-001", "Smith vs. Johnson")
                    .with_parent(Some("CL-2023-001".to_string())),
                SelectOption::new("CS-2023-002", "Brown Estate")
                    .with_parent(Some("CL-2023-002".to_string())),
            ],
            day(2023, 11, 20),
            &ViewConfig::default(),
        )
    }

    fn session() -> FormSession<crate::db::InvoiceRecord> {
        FormSession::new(Arc::new(invoice_schema(context()).expect("schema")))
    }

    fn fill_valid(session: &mut FormSession<crate::db::InvoiceRecord>) {
        session.update("client_id", "CL-2023-001").expect("client");
        session.update("case_id", "CS-2023-001").expect("case");
        session
            .update("items.0.description", "Custody hearing preparation")
            .expect("description");
        session.update("items.0.quantity", dec!(2)).expect("quantity");
        session.update("items.0.rate", dec!(50)).expect("rate");
    }

    #[test]
    fn due_date_defaults_to_configured_offset() {
        let session = session();
        assert_eq!(
            session.state().value("due_date"),
            &FieldValue::Date(day(2023, 12, 20))
        );
        assert_eq!(session.state().values.indices("items").len(), 1);
    }

    #[test]
    fn amounts_and_totals_follow_line_items() {
        let mut session = session();
        fill_valid(&mut session);
        let state = session.state();
        assert_eq!(state.value("items.0.amount"), &FieldValue::Number(dec!(100)));
        assert_eq!(state.value("subtotal"), &FieldValue::Number(dec!(100)));
        assert_eq!(state.value("total"), &FieldValue::Number(dec!(100)));

        session.append_row("items").expect("append");
        session.update("items.1.description", "Filing fee").expect("description");
        session.update("items.1.rate", dec!(25.50)).expect("rate");
        assert_eq!(
            session.state().value("subtotal"),
            &FieldValue::Number(dec!(125.50))
        );

        session.remove_row("items", 0).expect("remove");
        assert_eq!(
            session.state().value("subtotal"),
            &FieldValue::Number(dec!(25.50))
        );
        assert_eq!(
            session.state().value("items.0.description"),
            &FieldValue::text("Filing fee")
        );
    }

    #[test]
    fn computed_amounts_cannot_be_overwritten() {
        let mut session = session();
        fill_valid(&mut session);
        for field in ["items.0.amount", "subtotal", "tax", "total"] {
            assert_eq!(
                session.update(field, dec!(999)),
                Err(FormError::ComputedField(field.to_string()))
            );
        }

        let invoice = session.submit().expect("valid invoice");
        assert_eq!(invoice.line_items[0].amount, dec!(100));
        assert_eq!(invoice.total, dec!(100));
    }

    #[test]
    fn fractional_quantities_keep_exact_amounts() {
        let mut session = session();
        session.update("items.0.quantity", dec!(2.5)).expect("quantity");
        session.update("items.0.rate", dec!(33.333)).expect("rate");
        let state = session.state();
        assert_eq!(state.value("items.0.amount"), &FieldValue::Number(dec!(83.3325)));
        assert_eq!(state.value("subtotal"), &FieldValue::Number(dec!(83.3325)));
        assert_eq!(state.value("total"), &FieldValue::Number(dec!(83.3325)));
    }

    #[test]
    fn tax_policy_feeds_total() {
        let schema = invoice_schema(context().with_tax(Arc::new(FlatRateTax { rate: dec!(0.1) })))
            .expect("schema");
        let state = schema.initial_state();
        let state = schema
            .update(&state, "items.0.rate", dec!(50).into())
            .expect("rate");
        assert_eq!(state.value("tax"), &FieldValue::Number(dec!(5.0)));
        assert_eq!(state.value("total"), &FieldValue::Number(dec!(55.0)));
    }

    #[test]
    fn due_date_cannot_precede_issue_date() {
        let mut session = session();
        session
            .update("due_date", day(2023, 11, 1))
            .expect("due date");
        assert_eq!(
            session.state().error("due_date"),
            Some("Due date must be on or after the issue date")
        );

        session
            .update("issue_date", day(2023, 10, 1))
            .expect("issue date");
        assert_eq!(session.state().error("due_date"), None);
    }

    #[test]
    fn invalid_submit_leaves_store_untouched() {
        let mut store = EntityStore::new(seed::invoices()).expect("seed");
        let before = store.snapshot();
        let mut session = session();
        session.update("client_id", "CL-2023-001").expect("client");

        let err = session.submit_into(&mut store).expect_err("incomplete form");
        let SubmitError::Form(FormError::Invalid(errors)) = err else {
            panic!("expected validation errors");
        };
        assert_eq!(errors.get("case_id"), Some("Case is required"));
        assert_eq!(errors.get("items.0.rate"), Some("Rate must be greater than 0"));
        assert!(std::sync::Arc::ptr_eq(&before, &store.snapshot()));
        assert_eq!(session.state().status, FormStatus::DirtyInvalid);
    }

    #[test]
    fn valid_submit_inserts_exactly_once() {
        let mut store = EntityStore::new(seed::invoices()).expect("seed");
        let mut session = session();
        fill_valid(&mut session);
        assert_eq!(session.state().status, FormStatus::DirtyValid);

        let snapshot = session.submit_into(&mut store).expect("valid invoice");
        assert_eq!(snapshot.len(), 7);
        let created = &snapshot[6];
        assert!(created.id.starts_with("INV-"));
        assert_eq!(created.client, "Mary Smith");
        assert_eq!(created.case_name, "Smith vs. Johnson");
        assert_eq!(created.total, dec!(100));
        assert_eq!(created.status, InvoiceStatus::Draft);
        assert_eq!(created.line_items.len(), 1);

        assert_eq!(
            session.submit_into(&mut store),
            Err(SubmitError::Form(FormError::AlreadySubmitted))
        );
        assert_eq!(store.len(), 7);
    }

    #[test]
    fn case_must_belong_to_client() {
        let schema = invoice_schema(context()).expect("schema");
        let mut state = schema.initial_state();
        for (field, value) in [
            ("client_id", FieldValue::text("CL-2023-002")),
            ("case_id", FieldValue::text("CS-2023-001")),
            ("items.0.description", FieldValue::text("Review")),
            ("items.0.rate", FieldValue::Number(dec!(10))),
        ] {
            state = schema.update(&state, field, value).expect("update");
        }
        let errors = schema.submit(&state).expect_err("mismatched case");
        assert_eq!(
            errors.get("case_id"),
            Some("Case does not belong to the selected client")
        );
    }
}
