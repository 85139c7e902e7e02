use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::ViewConfig;
use crate::db::{
    ClientField, ClientRecord, InteractionField, InteractionRecord, InvoiceRecord, MatterRecord,
    PracticeStores,
};
use crate::form::SelectOption;
use crate::legal::matters::matters_for_client;
use crate::view::{FilterSpec, GroupKeySpec, GroupLevel};

pub fn client_filter(search: &str, status: Option<&str>) -> FilterSpec<ClientField> {
    FilterSpec::new(vec![
        ClientField::Name,
        ClientField::Email,
        ClientField::Phone,
        ClientField::Company,
    ])
    .with_search(search)
    .with_category(status)
}

pub fn interaction_filter(search: &str, kind: Option<&str>) -> FilterSpec<InteractionField> {
    FilterSpec::new(vec![
        InteractionField::ClientName,
        InteractionField::CaseName,
        InteractionField::Summary,
    ])
    .with_search(search)
    .with_category(kind)
}

/// Interaction history by year and month, most recent first.
pub fn interaction_grouping(config: &ViewConfig) -> GroupKeySpec<InteractionRecord> {
    GroupKeySpec::from_config(config)
        .level(GroupLevel::year())
        .level(GroupLevel::month())
}

fn newest_first(records: &mut [&InteractionRecord]) {
    records.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at).then_with(|| a.id.cmp(&b.id)));
}

pub fn interactions_for_client<'a>(
    interactions: &'a [InteractionRecord],
    client_id: &str,
) -> Vec<&'a InteractionRecord> {
    let mut out: Vec<&InteractionRecord> = interactions
        .iter()
        .filter(|i| i.client_id == client_id)
        .collect();
    newest_first(&mut out);
    out
}

/// Requested follow-ups due on or before `as_of`, earliest due first.
pub fn follow_ups_due(
    interactions: &[InteractionRecord],
    as_of: NaiveDate,
) -> Vec<&InteractionRecord> {
    let mut out: Vec<&InteractionRecord> = interactions
        .iter()
        .filter(|i| i.follow_up_required && i.follow_up_date.is_some_and(|d| d <= as_of))
        .collect();
    out.sort_by(|a, b| a.follow_up_date.cmp(&b.follow_up_date).then_with(|| a.id.cmp(&b.id)));
    out
}

pub fn client_options(clients: &[ClientRecord]) -> Vec<SelectOption> {
    clients
        .iter()
        .map(|c| SelectOption::new(c.id.clone(), c.name.clone()))
        .collect()
}

/// Everything the client detail page shows.
#[derive(Debug, Clone, Serialize)]
pub struct ClientOverview {
    pub client: ClientRecord,
    pub matters: Vec<MatterRecord>,
    pub invoices: Vec<InvoiceRecord>,
    pub interactions: Vec<InteractionRecord>,
    pub outstanding: Decimal,
}

pub fn client_overview(stores: &PracticeStores, client_id: &str) -> Option<ClientOverview> {
    let client = stores.clients.get(client_id)?.clone();
    let matters = matters_for_client(stores.matters.records(), &client.name)
        .into_iter()
        .cloned()
        .collect();
    let invoices: Vec<InvoiceRecord> = stores
        .invoices
        .records()
        .iter()
        .filter(|i| match &i.client_id {
            Some(id) => id == client_id,
            None => i.client.eq_ignore_ascii_case(&client.name),
        })
        .cloned()
        .collect();
    let outstanding = invoices
        .iter()
        .filter(|i| i.status.is_outstanding())
        .fold(Decimal::ZERO, |acc, i| acc + i.total);
    let interactions = interactions_for_client(stores.interactions.records(), client_id)
        .into_iter()
        .cloned()
        .collect();
    Some(ClientOverview {
        client,
        matters,
        invoices,
        interactions,
        outstanding,
    })
}
