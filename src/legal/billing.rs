use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::ViewConfig;
use crate::db::{EntityStore, InvoiceField, InvoiceRecord, InvoiceStatus};
use crate::error::{BillingError, StoreError};
use crate::view::{FilterSpec, GroupKeySpec, GroupLevel};

/// Computes tax owed on an invoice subtotal.
pub trait TaxPolicy: fmt::Debug + Send + Sync {
    fn tax(&self, subtotal: Decimal) -> Decimal;
}

/// Legal services are untaxed unless a policy says otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTax;

impl TaxPolicy for NoTax {
    fn tax(&self, _subtotal: Decimal) -> Decimal {
        Decimal::ZERO
    }
}

/// A flat percentage, given as a fraction (`0.08` for 8%).
#[derive(Debug, Clone, Copy)]
pub struct FlatRateTax {
    pub rate: Decimal,
}

impl TaxPolicy for FlatRateTax {
    fn tax(&self, subtotal: Decimal) -> Decimal {
        (subtotal * self.rate).round_dp(2)
    }
}

pub fn invoice_filter(search: &str, status: Option<&str>) -> FilterSpec<InvoiceField> {
    FilterSpec::new(vec![InvoiceField::Client, InvoiceField::Case, InvoiceField::Notes])
        .with_search(search)
        .with_category(status)
}

/// Invoices by issue year and month, with totals summed at every level.
pub fn invoice_grouping(config: &ViewConfig) -> GroupKeySpec<InvoiceRecord> {
    GroupKeySpec::from_config(config)
        .level(GroupLevel::year())
        .level(GroupLevel::month())
        .sum(InvoiceField::Total)
}

fn transition(
    store: &mut EntityStore<InvoiceRecord>,
    id: &str,
    to: InvoiceStatus,
    allowed_from: &[InvoiceStatus],
) -> Result<Arc<[InvoiceRecord]>, BillingError> {
    let current = store
        .get(id)
        .map(|invoice| invoice.status)
        .ok_or_else(|| StoreError::NotFound {
            entity: "invoice",
            id: id.to_string(),
        })?;
    if !allowed_from.contains(&current) {
        return Err(BillingError::InvalidTransition {
            entity: "invoice",
            id: id.to_string(),
            from: current.as_str(),
            to: to.as_str(),
        });
    }
    let snapshot = store.update_with(id, |invoice| InvoiceRecord {
        status: to,
        ..invoice.clone()
    })?;
    tracing::info!(
        invoice = id,
        from = current.as_str(),
        to = to.as_str(),
        "Invoice status changed"
    );
    Ok(snapshot)
}

/// Draft -> Pending.
pub fn send_invoice(
    store: &mut EntityStore<InvoiceRecord>,
    id: &str,
) -> Result<Arc<[InvoiceRecord]>, BillingError> {
    transition(store, id, InvoiceStatus::Pending, &[InvoiceStatus::Draft])
}

/// Pending or Overdue -> Paid.
pub fn mark_paid(
    store: &mut EntityStore<InvoiceRecord>,
    id: &str,
) -> Result<Arc<[InvoiceRecord]>, BillingError> {
    transition(
        store,
        id,
        InvoiceStatus::Paid,
        &[InvoiceStatus::Pending, InvoiceStatus::Overdue],
    )
}

/// Move every pending invoice due before `as_of` to Overdue. Returns the ids
/// that changed; the store is left alone when none did.
pub fn mark_overdue(
    store: &mut EntityStore<InvoiceRecord>,
    as_of: NaiveDate,
) -> Result<Vec<String>, BillingError> {
    let due: Vec<String> = store
        .records()
        .iter()
        .filter(|invoice| invoice.status == InvoiceStatus::Pending && invoice.due_date < as_of)
        .map(|invoice| invoice.id.clone())
        .collect();
    for id in &due {
        transition(store, id, InvoiceStatus::Overdue, &[InvoiceStatus::Pending])?;
    }
    Ok(due)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusTotal {
    pub status: &'static str,
    pub count: usize,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillingSummary {
    /// Pending plus overdue.
    pub outstanding: Decimal,
    pub overdue: Decimal,
    pub collected: Decimal,
    pub drafts: Decimal,
    pub by_status: Vec<StatusTotal>,
}

const STATUS_ORDER: [InvoiceStatus; 4] = [
    InvoiceStatus::Draft,
    InvoiceStatus::Pending,
    InvoiceStatus::Overdue,
    InvoiceStatus::Paid,
];

pub fn summarize(invoices: &[InvoiceRecord]) -> BillingSummary {
    let total_for = |pred: &dyn Fn(InvoiceStatus) -> bool| {
        invoices
            .iter()
            .filter(|invoice| pred(invoice.status))
            .fold(Decimal::ZERO, |acc, invoice| acc + invoice.total)
    };
    let by_status = STATUS_ORDER
        .iter()
        .map(|status| StatusTotal {
            status: status.as_str(),
            count: invoices.iter().filter(|i| i.status == *status).count(),
            total: total_for(&|s: InvoiceStatus| s == *status),
        })
        .collect();
    BillingSummary {
        outstanding: total_for(&|s: InvoiceStatus| s.is_outstanding()),
        overdue: total_for(&|s: InvoiceStatus| s == InvoiceStatus::Overdue),
        collected: total_for(&|s: InvoiceStatus| s == InvoiceStatus::Paid),
        drafts: total_for(&|s: InvoiceStatus| s == InvoiceStatus::Draft),
        by_status,
    }
}

/// Most recently issued invoices first.
pub fn recent_invoices(invoices: &[InvoiceRecord], limit: usize) -> Vec<&InvoiceRecord> {
    let mut recent: Vec<&InvoiceRecord> = invoices.iter().collect();
    recent.sort_by(|a, b| b.issue_date.cmp(&a.issue_date).then_with(|| a.id.cmp(&b.id)));
    recent.truncate(limit);
    recent
}
