use std::sync::Arc;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use casecraft::config::ViewConfig;
use casecraft::db::{InvoiceStatus, PaymentMethod, PaymentRecord, PaymentStatus, PracticeStores};
use casecraft::error::SubmitError;
use casecraft::form::invoice::{InvoiceFormContext, invoice_schema};
use casecraft::form::interaction::interaction_schema;
use casecraft::form::matter::matter_schema;
use casecraft::form::task::task_schema;
use casecraft::form::{FieldValue, FormSession};
use casecraft::legal::billing::{self, invoice_filter, invoice_grouping};
use casecraft::legal::clients::{
    client_options, client_overview, interaction_filter, interaction_grouping,
};
use casecraft::legal::matters::{case_options, open_matter};
use casecraft::legal::{payments, retainers, tasks};
use casecraft::view::ViewBinding;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn november_sum(binding: &ViewBinding<casecraft::db::InvoiceRecord>) -> (usize, Decimal) {
    let output = binding.output();
    let node = output
        .tree
        .find(&["2023", "November"])
        .expect("november bucket");
    (node.aggregate.count, node.aggregate.sum.unwrap_or(Decimal::ZERO))
}

#[test]
fn submitted_invoice_appears_in_grouped_view() {
    let config = ViewConfig::default();
    let mut stores = PracticeStores::seeded().expect("seed");
    let mut view = ViewBinding::new(
        &stores.invoices,
        invoice_filter("", None),
        invoice_grouping(&config),
    )
    .expect("bind");
    let mut updates = view.subscribe();
    let (count_before, sum_before) = november_sum(&view);

    let context = InvoiceFormContext::new(
        client_options(stores.clients.records()),
        case_options(stores.matters.records(), stores.clients.records()),
        day(2023, 11, 20),
        &config,
    );
    let mut session = FormSession::new(Arc::new(invoice_schema(context).expect("schema")));
    session.update("client_id", "CL-2023-001").expect("client");
    session.update("case_id", "CS-2023-001").expect("case");
    session
        .update("items.0.description", "Mediation session")
        .expect("description");
    session.update("items.0.quantity", dec!(2)).expect("quantity");
    session.update("items.0.rate", dec!(50)).expect("rate");

    let total_before = stores.invoices.len();
    session.submit_into(&mut stores.invoices).expect("submit");
    assert_eq!(stores.invoices.len(), total_before + 1);

    assert!(view.sync(&stores.invoices).expect("regroup"));
    assert!(updates.has_changed().expect("sender alive"));
    let (count_after, sum_after) = november_sum(&view);
    assert_eq!(count_after, count_before + 1);
    assert_eq!(sum_after - sum_before, dec!(100));

    assert!(!view.sync(&stores.invoices).expect("no-op"));
}

#[test]
fn second_submit_is_rejected() {
    let config = ViewConfig::default();
    let mut stores = PracticeStores::seeded().expect("seed");
    let context = InvoiceFormContext::new(
        client_options(stores.clients.records()),
        case_options(stores.matters.records(), stores.clients.records()),
        day(2023, 11, 20),
        &config,
    );
    let mut session = FormSession::new(Arc::new(invoice_schema(context).expect("schema")));
    session.update("client_id", "CL-2023-002").expect("client");
    session.update("case_id", "CS-2023-002").expect("case");
    session
        .update("items.0.description", "Estate inventory")
        .expect("description");
    session.update("items.0.rate", dec!(300)).expect("rate");

    session.submit_into(&mut stores.invoices).expect("first submit");
    let snapshot = stores.invoices.snapshot();
    let second = session.submit_into(&mut stores.invoices);
    assert!(matches!(second, Err(SubmitError::Form(_))));
    assert!(Arc::ptr_eq(&snapshot, &stores.invoices.snapshot()));
}

#[test]
fn billing_workflow_updates_summary() {
    let mut stores = PracticeStores::seeded().expect("seed");
    let before = billing::summarize(stores.invoices.records());

    billing::mark_paid(&mut stores.invoices, "INV-2023-003").expect("pay");
    let after = billing::summarize(stores.invoices.records());

    assert_eq!(after.outstanding, before.outstanding - dec!(7800.00));
    assert_eq!(after.collected, before.collected + dec!(7800.00));
    assert_eq!(
        stores.invoices.get("INV-2023-003").map(|i| i.status),
        Some(InvoiceStatus::Paid)
    );
}

#[test]
fn logged_interaction_shows_in_history_and_overview() {
    let config = ViewConfig::default();
    let mut stores = PracticeStores::seeded().expect("seed");
    let mut view = ViewBinding::new(
        &stores.interactions,
        interaction_filter("arbitration", None),
        interaction_grouping(&config),
    )
    .expect("bind");
    assert_eq!(view.output().filtered_count, 0);

    let schema = interaction_schema(
        client_options(stores.clients.records()),
        case_options(stores.matters.records(), stores.clients.records()),
        day(2023, 8, 21),
    )
    .expect("schema");
    let mut session = FormSession::new(Arc::new(schema));
    session.update("client_id", "CL-2023-003").expect("client");
    session.update("type", "Video Call").expect("type");
    session.update("duration", dec!(30)).expect("duration");
    session
        .update("summary", "Walked through arbitration options")
        .expect("summary");
    assert_eq!(session.state().value("case_id"), &FieldValue::Empty);

    let before = client_overview(&stores, "CL-2023-003")
        .expect("client")
        .interactions
        .len();
    session.submit_into(&mut stores.interactions).expect("submit");

    assert!(view.sync(&stores.interactions).expect("regroup"));
    let output = view.output();
    assert_eq!(output.filtered_count, 1);
    assert!(output.tree.find(&["2023", "August"]).is_some());

    let overview = client_overview(&stores, "CL-2023-003").expect("client");
    assert_eq!(overview.interactions.len(), before + 1);
    assert_eq!(overview.interactions[0].occurred_at.date(), day(2023, 8, 21));
}

#[test]
fn processed_payment_settles_its_invoice() {
    let mut stores = PracticeStores::seeded().expect("seed");
    let before = billing::summarize(stores.invoices.records());

    payments::record_payment(
        &mut stores.payments,
        PaymentRecord {
            id: "PMT-2023-007".to_string(),
            client: "Robert Miller".to_string(),
            invoice_id: Some("INV-2023-005".to_string()),
            received_on: day(2023, 12, 1),
            amount: dec!(6500.00),
            method: PaymentMethod::WireTransfer,
            status: PaymentStatus::Pending,
            note: None,
        },
    )
    .expect("record");
    let settled = payments::settle_invoices(&mut stores.invoices, stores.payments.records())
        .expect("settle");
    assert_eq!(settled, vec!["INV-2023-001"], "pending payments settle nothing");

    payments::mark_processed(&mut stores.payments, "PMT-2023-007").expect("process");
    let settled = payments::settle_invoices(&mut stores.invoices, stores.payments.records())
        .expect("settle");
    assert_eq!(settled, vec!["INV-2023-005"]);

    let after = billing::summarize(stores.invoices.records());
    assert_eq!(after.collected, before.collected + dec!(10000.00));
}

#[test]
fn retainer_draw_shows_in_replenishment_list() {
    let mut stores = PracticeStores::seeded().expect("seed");
    assert_eq!(retainers::needs_replenishment(stores.retainers.records()).len(), 2);

    retainers::bill_from_retainer(
        &mut stores.retainers,
        "RA-2023-006",
        dec!(3000),
        day(2023, 12, 1),
    )
    .expect("draw");
    let low: Vec<&str> = retainers::needs_replenishment(stores.retainers.records())
        .iter()
        .map(|r| r.id.as_str())
        .collect();
    assert_eq!(low, vec!["RA-2023-002", "RA-2023-004", "RA-2023-006"]);
}

#[test]
fn new_matter_collects_template_and_added_tasks() {
    let mut stores = PracticeStores::seeded().expect("seed");
    let today = day(2023, 12, 4);
    let mut matter = FormSession::new(Arc::new(matter_schema(today).expect("schema")));
    matter.update("title", "Wilson Holdings").expect("title");
    matter.update("client", "Michael Wilson").expect("client");
    matter.update("template", "template-4").expect("template");
    matter.update("priority", "High").expect("priority");
    let snapshot = open_matter(&mut stores, &mut matter).expect("open");
    let case_id = snapshot.last().expect("matter").id.clone();

    let mut task = FormSession::new(Arc::new(task_schema(&case_id, today).expect("schema")));
    task.update("title", "Register trade name").expect("title");
    task.update("due_date", day(2023, 12, 6)).expect("due");
    task.update("assigned_to", "John Doe").expect("assignee");
    task.submit_into(&mut stores.tasks).expect("task");

    let case_tasks = tasks::tasks_for_case(stores.tasks.records(), &case_id);
    assert_eq!(case_tasks.len(), 5);
    assert_eq!(case_tasks[0].title, "Register trade name");
    assert_eq!(tasks::open_task_count(stores.tasks.records(), &case_id), 5);
    assert!(tasks::overdue_tasks(stores.tasks.records(), day(2023, 12, 12))
        .iter()
        .any(|t| t.case_id == case_id && t.title == "Choose entity type"));
}
