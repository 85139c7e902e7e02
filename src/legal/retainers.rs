//! Retainer and trust balances. Every balance change recomputes the status.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::db::{EntityStore, RetainerField, RetainerRecord, RetainerStatus};
use crate::error::{BillingError, StoreError};
use crate::view::FilterSpec;

pub fn retainer_filter(search: &str, status: Option<&str>) -> FilterSpec<RetainerField> {
    FilterSpec::new(vec![RetainerField::Client, RetainerField::Kind])
        .with_search(search)
        .with_category(status)
}

fn current_balance(
    store: &EntityStore<RetainerRecord>,
    id: &str,
    amount: Decimal,
) -> Result<Decimal, BillingError> {
    if amount <= Decimal::ZERO {
        return Err(BillingError::NonPositiveAmount(amount));
    }
    store
        .get(id)
        .map(|retainer| retainer.balance)
        .ok_or_else(|| {
            StoreError::NotFound {
                entity: "retainer",
                id: id.to_string(),
            }
            .into()
        })
}

/// Deposit more client funds.
pub fn add_funds(
    store: &mut EntityStore<RetainerRecord>,
    id: &str,
    amount: Decimal,
    on: NaiveDate,
) -> Result<Arc<[RetainerRecord]>, BillingError> {
    let balance = current_balance(store, id, amount)? + amount;
    let snapshot = store.update_with(id, |retainer| retainer.with_balance(balance, on))?;
    tracing::info!(retainer = id, %amount, %balance, "Retainer funds added");
    Ok(snapshot)
}

/// Draw billed work from the balance. Overdrawing is refused.
pub fn bill_from_retainer(
    store: &mut EntityStore<RetainerRecord>,
    id: &str,
    amount: Decimal,
    on: NaiveDate,
) -> Result<Arc<[RetainerRecord]>, BillingError> {
    let available = current_balance(store, id, amount)?;
    if amount > available {
        return Err(BillingError::InsufficientBalance {
            id: id.to_string(),
            balance: available,
            requested: amount,
        });
    }
    let balance = available - amount;
    let snapshot = store.update_with(id, |retainer| retainer.with_balance(balance, on))?;
    tracing::info!(retainer = id, %amount, %balance, "Billed from retainer");
    Ok(snapshot)
}

/// Retainers that are low or depleted.
pub fn needs_replenishment(retainers: &[RetainerRecord]) -> Vec<&RetainerRecord> {
    retainers
        .iter()
        .filter(|r| r.status != RetainerStatus::Active)
        .collect()
}

pub fn total_held(retainers: &[RetainerRecord]) -> Decimal {
    retainers.iter().fold(Decimal::ZERO, |acc, r| acc + r.balance)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::{add_funds, bill_from_retainer, needs_replenishment, retainer_filter, total_held};
    use crate::db::{EntityStore, RetainerRecord, RetainerStatus, seed};
    use crate::error::{BillingError, StoreError};
    use crate::view::filter;

    fn store() -> EntityStore<RetainerRecord> {
        EntityStore::new(seed::retainers()).expect("seed retainers")
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 12, d).expect("date")
    }

    #[test]
    fn filters_by_kind_and_status() {
        let retainers = seed::retainers();
        assert_eq!(filter(&retainers, &retainer_filter("evergreen", None)).len(), 2);
        let low = filter(&retainers, &retainer_filter("", Some("Low Balance")));
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, "RA-2023-002");
    }

    #[test]
    fn billing_lowers_balance_and_status() {
        let mut store = store();
        bill_from_retainer(&mut store, "RA-2023-001", dec!(1500), day(1)).expect("draw");
        let retainer = store.get("RA-2023-001").expect("retainer");
        assert_eq!(retainer.balance, dec!(850.00));
        assert_eq!(retainer.status, RetainerStatus::LowBalance);
        assert_eq!(retainer.last_activity, day(1));

        bill_from_retainer(&mut store, "RA-2023-001", dec!(850), day(2)).expect("draw");
        assert_eq!(
            store.get("RA-2023-001").map(|r| r.status),
            Some(RetainerStatus::Depleted)
        );
    }

    #[test]
    fn overdraws_leave_the_store_untouched() {
        let mut store = store();
        let before = store.snapshot();
        assert_eq!(
            bill_from_retainer(&mut store, "RA-2023-002", dec!(1000), day(1)),
            Err(BillingError::InsufficientBalance {
                id: "RA-2023-002".to_string(),
                balance: dec!(750.00),
                requested: dec!(1000),
            })
        );
        assert_eq!(
            bill_from_retainer(&mut store, "RA-2023-002", dec!(-5), day(1)),
            Err(BillingError::NonPositiveAmount(dec!(-5)))
        );
        assert!(std::sync::Arc::ptr_eq(&before, &store.snapshot()));
    }

    #[test]
    fn deposits_restore_a_depleted_retainer() {
        let mut store = store();
        add_funds(&mut store, "RA-2023-004", dec!(2000), day(3)).expect("deposit");
        let retainer = store.get("RA-2023-004").expect("retainer");
        assert_eq!(retainer.balance, dec!(2000.00));
        assert_eq!(retainer.status, RetainerStatus::Active);

        assert_eq!(
            add_funds(&mut store, "RA-404", dec!(10), day(3)),
            Err(BillingError::Store(StoreError::NotFound {
                entity: "retainer",
                id: "RA-404".to_string(),
            }))
        );
    }

    #[test]
    fn replenishment_list_and_total() {
        let retainers = seed::retainers();
        let ids: Vec<&str> = needs_replenishment(&retainers)
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["RA-2023-002", "RA-2023-004"]);
        assert_eq!(total_held(&retainers), dec!(21850.00));
    }
}
