//! Payments received against invoices, and retainer deposits.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::ViewConfig;
use crate::db::{EntityStore, InvoiceRecord, PaymentField, PaymentRecord, PaymentStatus};
use crate::error::{BillingError, StoreError};
use crate::legal::billing::mark_paid;
use crate::view::{FilterSpec, GroupKeySpec, GroupLevel};

pub fn payment_filter(search: &str, status: Option<&str>) -> FilterSpec<PaymentField> {
    FilterSpec::new(vec![
        PaymentField::Client,
        PaymentField::Invoice,
        PaymentField::Method,
        PaymentField::Note,
    ])
    .with_search(search)
    .with_category(status)
}

/// Payments by year and month received, with amounts summed at every level.
pub fn payment_grouping(config: &ViewConfig) -> GroupKeySpec<PaymentRecord> {
    GroupKeySpec::from_config(config)
        .level(GroupLevel::year())
        .level(GroupLevel::month())
        .sum(PaymentField::Amount)
}

/// Record a received payment. The amount must be positive.
pub fn record_payment(
    store: &mut EntityStore<PaymentRecord>,
    payment: PaymentRecord,
) -> Result<Arc<[PaymentRecord]>, BillingError> {
    if payment.amount <= Decimal::ZERO {
        return Err(BillingError::NonPositiveAmount(payment.amount));
    }
    let id = payment.id.clone();
    let snapshot = store.insert(payment)?;
    tracing::info!(payment = %id, "Payment recorded");
    Ok(snapshot)
}

/// Pending -> Processed.
pub fn mark_processed(
    store: &mut EntityStore<PaymentRecord>,
    id: &str,
) -> Result<Arc<[PaymentRecord]>, BillingError> {
    let current = store
        .get(id)
        .map(|payment| payment.status)
        .ok_or_else(|| StoreError::NotFound {
            entity: "payment",
            id: id.to_string(),
        })?;
    if current != PaymentStatus::Pending {
        return Err(BillingError::InvalidTransition {
            entity: "payment",
            id: id.to_string(),
            from: current.as_str(),
            to: PaymentStatus::Processed.as_str(),
        });
    }
    let snapshot = store.update_with(id, |payment| PaymentRecord {
        status: PaymentStatus::Processed,
        ..payment.clone()
    })?;
    tracing::info!(payment = id, "Payment processed");
    Ok(snapshot)
}

pub fn payments_for_invoice<'a>(
    payments: &'a [PaymentRecord],
    invoice_id: &str,
) -> Vec<&'a PaymentRecord> {
    payments
        .iter()
        .filter(|p| p.invoice_id.as_deref() == Some(invoice_id))
        .collect()
}

/// Processed amount received against one invoice.
pub fn amount_received(payments: &[PaymentRecord], invoice_id: &str) -> Decimal {
    payments_for_invoice(payments, invoice_id)
        .into_iter()
        .filter(|p| p.status == PaymentStatus::Processed)
        .fold(Decimal::ZERO, |acc, p| acc + p.amount)
}

/// Mark every outstanding invoice whose processed payments cover its total as
/// paid. Returns the ids that changed.
pub fn settle_invoices(
    invoices: &mut EntityStore<InvoiceRecord>,
    payments: &[PaymentRecord],
) -> Result<Vec<String>, BillingError> {
    let covered: Vec<String> = invoices
        .records()
        .iter()
        .filter(|invoice| {
            invoice.status.is_outstanding()
                && amount_received(payments, &invoice.id) >= invoice.total
        })
        .map(|invoice| invoice.id.clone())
        .collect();
    for id in &covered {
        mark_paid(invoices, id)?;
    }
    Ok(covered)
}

/// Most recently received first.
pub fn recent_payments(payments: &[PaymentRecord], limit: usize) -> Vec<&PaymentRecord> {
    let mut recent: Vec<&PaymentRecord> = payments.iter().collect();
    recent.sort_by(|a, b| b.received_on.cmp(&a.received_on).then_with(|| a.id.cmp(&b.id)));
    recent.truncate(limit);
    recent
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentSummary {
    pub processed: Decimal,
    pub pending: Decimal,
    /// Payments not tied to an invoice.
    pub retainer_deposits: Decimal,
}

fn total_where(payments: &[PaymentRecord], keep: impl Fn(&PaymentRecord) -> bool) -> Decimal {
    payments
        .iter()
        .filter(|p| keep(p))
        .fold(Decimal::ZERO, |acc, p| acc + p.amount)
}

pub fn summarize_payments(payments: &[PaymentRecord]) -> PaymentSummary {
    PaymentSummary {
        processed: total_where(payments, |p| p.status == PaymentStatus::Processed),
        pending: total_where(payments, |p| p.status == PaymentStatus::Pending),
        retainer_deposits: total_where(payments, |p| p.invoice_id.is_none()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::{
        mark_processed, payment_filter, payment_grouping, payments_for_invoice, recent_payments,
        record_payment, settle_invoices, summarize_payments,
    };
    use crate::config::{MalformedKeyPolicy, ViewConfig};
    use crate::db::{EntityStore, InvoiceStatus, PaymentMethod, PaymentRecord, PaymentStatus, seed};
    use crate::error::BillingError;
    use crate::view::{filter, group};

    fn store() -> EntityStore<PaymentRecord> {
        EntityStore::new(seed::payments()).expect("seed payments")
    }

    #[test]
    fn search_and_status_filter() {
        let payments = seed::payments();
        let pending = filter(&payments, &payment_filter("", Some("Pending")));
        assert_eq!(pending.len(), 2);
        let retainer = filter(&payments, &payment_filter("retainer", None));
        let ids: Vec<&str> = retainer.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["PMT-2023-003", "PMT-2023-005"]);
        assert_eq!(filter(&payments, &payment_filter("wire", None)).len(), 1);
    }

    #[test]
    fn monthly_grouping_sums_amounts() {
        let config = ViewConfig {
            malformed_keys: MalformedKeyPolicy::Fail,
            ..ViewConfig::default()
        };
        let tree = group(&seed::payments(), &payment_grouping(&config)).expect("grouping");
        let november = tree.find(&["2023", "November"]).expect("november");
        assert_eq!(november.aggregate.count, 6);
        assert_eq!(november.aggregate.sum, Some(dec!(25700.00)));
    }

    #[test]
    fn pending_payments_can_be_processed_once() {
        let mut store = store();
        mark_processed(&mut store, "PMT-2023-005").expect("pending");
        assert_eq!(
            store.get("PMT-2023-005").map(|p| p.status),
            Some(PaymentStatus::Processed)
        );
        assert_eq!(
            mark_processed(&mut store, "PMT-2023-005"),
            Err(BillingError::InvalidTransition {
                entity: "payment",
                id: "PMT-2023-005".to_string(),
                from: "Processed",
                to: "Processed",
            })
        );
    }

    #[test]
    fn zero_payments_are_rejected() {
        let mut store = store();
        let before = store.snapshot();
        let payment = PaymentRecord {
            id: "PMT-2023-007".to_string(),
            client: "Mary Smith".to_string(),
            invoice_id: None,
            received_on: NaiveDate::from_ymd_opt(2023, 12, 1).expect("date"),
            amount: dec!(0),
            method: PaymentMethod::Check,
            status: PaymentStatus::Pending,
            note: None,
        };
        assert_eq!(
            record_payment(&mut store, payment.clone()),
            Err(BillingError::NonPositiveAmount(dec!(0)))
        );
        assert!(std::sync::Arc::ptr_eq(&before, &store.snapshot()));

        record_payment(&mut store, PaymentRecord { amount: dec!(150), ..payment })
            .expect("positive payment");
        assert_eq!(store.len(), 7);
    }

    #[test]
    fn covered_invoices_are_settled() {
        let payments = seed::payments();
        assert_eq!(payments_for_invoice(&payments, "INV-2023-001").len(), 1);

        let mut invoices = EntityStore::new(seed::invoices()).expect("seed invoices");
        let settled = settle_invoices(&mut invoices, &payments).expect("settle");
        assert_eq!(settled, vec!["INV-2023-001"]);
        assert_eq!(
            invoices.get("INV-2023-001").map(|i| i.status),
            Some(InvoiceStatus::Paid)
        );
        assert!(settle_invoices(&mut invoices, &payments).expect("settle").is_empty());
    }

    #[test]
    fn summary_and_recent_list() {
        let payments = seed::payments();
        let summary = summarize_payments(&payments);
        assert_eq!(summary.processed, dec!(19900.00));
        assert_eq!(summary.pending, dec!(5800.00));
        assert_eq!(summary.retainer_deposits, dec!(14000.00));

        let ids: Vec<&str> = recent_payments(&payments, 2)
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["PMT-2023-006", "PMT-2023-005"]);
    }
}
