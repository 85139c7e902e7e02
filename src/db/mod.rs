//! Practice records and the in-memory entity store.
//!
//! Every entity type implements [`Record`], which is all the filter and
//! grouping engines need to know about it: a stable id, the categorical
//! filter dimension, the timestamp used for ordering, and typed access to
//! searchable text and money fields.
//!
//! Payments, retainers and case tasks follow the same shape as the screens
//! that list them.

mod memory;
pub mod seed;

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

pub use memory::EntityStore;

use crate::error::StoreError;

/// A domain entity flowing through the filter/group pipeline.
pub trait Record: Clone + fmt::Debug + Send + Sync + 'static {
    /// Addressable fields for search and aggregation.
    type Field: Copy + Eq + fmt::Debug + Send + Sync + 'static;

    /// Entity name used in store errors and logs.
    const ENTITY: &'static str;

    fn id(&self) -> &str;

    /// Value matched by a category filter.
    fn category(&self) -> &str;

    fn timestamp(&self) -> NaiveDateTime;

    fn text(&self, field: Self::Field) -> Option<&str>;

    fn amount(&self, _field: Self::Field) -> Option<Decimal> {
        None
    }
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Normalize an optional free-text value: blank becomes `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

// --- Documents ---

/// Broad document kind, used for icon selection by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Doc,
    Image,
    Spreadsheet,
    Other,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Doc => "doc",
            Self::Image => "image",
            Self::Spreadsheet => "spreadsheet",
            Self::Other => "other",
        }
    }

    /// Infer the kind from a file extension or file-type label.
    pub fn from_file_type(file_type: &str) -> Self {
        match file_type.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "doc" | "docx" | "txt" | "rtf" => Self::Doc,
            "jpg" | "jpeg" | "png" | "gif" | "tiff" => Self::Image,
            "xls" | "xlsx" | "csv" => Self::Spreadsheet,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentField {
    Title,
    CaseName,
    ClientName,
    Category,
    FileType,
    UploadedBy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: String,
    pub title: String,
    pub case_id: String,
    pub case_name: String,
    pub kind: DocumentKind,
    /// Practice area, e.g. "Family Law".
    pub category: String,
    pub uploaded_on: NaiveDate,
    pub size: String,
    /// Upper-case file type label, e.g. "PDF".
    pub file_type: String,
    pub uploaded_by: String,
}

impl DocumentRecord {
    /// Client name derived from the case name: the part before " vs.".
    pub fn client_name(&self) -> &str {
        client_from_case_name(&self.case_name)
    }
}

/// "Smith vs. Johnson" -> "Smith"; names without " vs." are returned whole.
pub fn client_from_case_name(case_name: &str) -> &str {
    match case_name.split_once(" vs.") {
        Some((client, _)) => client.trim(),
        None => case_name.trim(),
    }
}

impl Record for DocumentRecord {
    type Field = DocumentField;
    const ENTITY: &'static str = "document";

    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> &str {
        &self.file_type
    }

    fn timestamp(&self) -> NaiveDateTime {
        start_of_day(self.uploaded_on)
    }

    fn text(&self, field: DocumentField) -> Option<&str> {
        match field {
            DocumentField::Title => Some(&self.title),
            DocumentField::CaseName => Some(&self.case_name),
            DocumentField::ClientName => Some(self.client_name()),
            DocumentField::Category => Some(&self.category),
            DocumentField::FileType => Some(&self.file_type),
            DocumentField::UploadedBy => Some(&self.uploaded_by),
        }
    }
}

// --- Invoices ---

/// Invoice lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Draft,
    Pending,
    Paid,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Pending => "Pending",
            Self::Paid => "Paid",
            Self::Overdue => "Overdue",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "Draft" => Some(Self::Draft),
            "Pending" => Some(Self::Pending),
            "Paid" => Some(Self::Paid),
            "Overdue" => Some(Self::Overdue),
            _ => None,
        }
    }

    /// Pending and overdue invoices still carry a balance.
    pub fn is_outstanding(self) -> bool {
        matches!(self, Self::Pending | Self::Overdue)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLineItem {
    pub description: String,
    pub quantity: Decimal,
    pub rate: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceField {
    Client,
    Case,
    Notes,
    Subtotal,
    Tax,
    Total,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    pub id: String,
    pub client_id: Option<String>,
    pub client: String,
    pub case_id: Option<String>,
    pub case_name: String,
    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub line_items: Vec<InvoiceLineItem>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub status: InvoiceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Record for InvoiceRecord {
    type Field = InvoiceField;
    const ENTITY: &'static str = "invoice";

    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> &str {
        self.status.as_str()
    }

    fn timestamp(&self) -> NaiveDateTime {
        start_of_day(self.issue_date)
    }

    fn text(&self, field: InvoiceField) -> Option<&str> {
        match field {
            InvoiceField::Client => Some(&self.client),
            InvoiceField::Case => Some(&self.case_name),
            InvoiceField::Notes => self.notes.as_deref(),
            InvoiceField::Subtotal | InvoiceField::Tax | InvoiceField::Total => None,
        }
    }

    fn amount(&self, field: InvoiceField) -> Option<Decimal> {
        match field {
            InvoiceField::Subtotal => Some(self.subtotal),
            InvoiceField::Tax => Some(self.tax),
            InvoiceField::Total => Some(self.total),
            InvoiceField::Client | InvoiceField::Case | InvoiceField::Notes => None,
        }
    }
}

// --- Appointments ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentType {
    Meeting,
    Court,
    Task,
    Deposition,
    Call,
}

impl AppointmentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Meeting => "Meeting",
            Self::Court => "Court",
            Self::Task => "Task",
            Self::Deposition => "Deposition",
            Self::Call => "Call",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "Meeting" => Some(Self::Meeting),
            "Court" => Some(Self::Court),
            "Task" => Some(Self::Task),
            "Deposition" => Some(Self::Deposition),
            "Call" => Some(Self::Call),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentField {
    Title,
    Location,
    Client,
    Notes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentRecord {
    pub id: String,
    pub title: String,
    pub starts_at: NaiveDateTime,
    pub kind: AppointmentType,
    pub location: String,
    pub duration_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl AppointmentRecord {
    pub fn duration_label(&self) -> String {
        duration_label(self.duration_minutes)
    }
}

/// Render minutes the way the calendar shows them: "30 minutes", "1.5 hours".
pub fn duration_label(minutes: u32) -> String {
    if minutes < 60 {
        return format!("{minutes} minutes");
    }
    let hours = Decimal::from(minutes) / Decimal::from(60);
    let hours = hours.round_dp(2).normalize();
    if hours == Decimal::ONE {
        "1 hour".to_string()
    } else {
        format!("{hours} hours")
    }
}

/// Parse "30 minutes", "1 hour", "1.5 hours" back into minutes.
pub fn parse_duration_label(raw: &str) -> Option<u32> {
    let mut parts = raw.split_whitespace();
    let value: Decimal = parts.next()?.parse().ok()?;
    let unit = parts.next()?.to_ascii_lowercase();
    if parts.next().is_some() || value <= Decimal::ZERO {
        return None;
    }
    let minutes = match unit.as_str() {
        "minute" | "minutes" | "min" | "mins" => value,
        "hour" | "hours" | "hr" | "hrs" => value * Decimal::from(60),
        _ => return None,
    };
    if minutes.fract() != Decimal::ZERO {
        return None;
    }
    minutes.to_u32()
}

impl Record for AppointmentRecord {
    type Field = AppointmentField;
    const ENTITY: &'static str = "appointment";

    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> &str {
        self.kind.as_str()
    }

    fn timestamp(&self) -> NaiveDateTime {
        self.starts_at
    }

    fn text(&self, field: AppointmentField) -> Option<&str> {
        match field {
            AppointmentField::Title => Some(&self.title),
            AppointmentField::Location => Some(&self.location),
            AppointmentField::Client => self.client.as_deref(),
            AppointmentField::Notes => self.notes.as_deref(),
        }
    }
}

// --- Client interactions ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InteractionType {
    PhoneCall,
    Email,
    Meeting,
    VideoCall,
    TextMessage,
}

impl InteractionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PhoneCall => "Phone Call",
            Self::Email => "Email",
            Self::Meeting => "Meeting",
            Self::VideoCall => "Video Call",
            Self::TextMessage => "Text Message",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "Phone Call" => Some(Self::PhoneCall),
            "Email" => Some(Self::Email),
            "Meeting" => Some(Self::Meeting),
            "Video Call" => Some(Self::VideoCall),
            "Text Message" => Some(Self::TextMessage),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionField {
    ClientName,
    CaseName,
    Summary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub id: String,
    pub client_id: String,
    pub client_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub case_name: Option<String>,
    pub kind: InteractionType,
    pub occurred_at: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    pub summary: String,
    pub follow_up_required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_up_date: Option<NaiveDate>,
}

impl Record for InteractionRecord {
    type Field = InteractionField;
    const ENTITY: &'static str = "interaction";

    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> &str {
        self.kind.as_str()
    }

    fn timestamp(&self) -> NaiveDateTime {
        self.occurred_at
    }

    fn text(&self, field: InteractionField) -> Option<&str> {
        match field {
            InteractionField::ClientName => Some(&self.client_name),
            InteractionField::CaseName => self.case_name.as_deref(),
            InteractionField::Summary => Some(&self.summary),
        }
    }
}

// --- Matters ---

/// Matter lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatterStatus {
    Active,
    Pending,
    OnHold,
    Closed,
}

impl MatterStatus {
    pub const ALL: [Self; 4] = [Self::Active, Self::Pending, Self::OnHold, Self::Closed];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Pending => "Pending",
            Self::OnHold => "On Hold",
            Self::Closed => "Closed",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "Active" => Some(Self::Active),
            "Pending" => Some(Self::Pending),
            "On Hold" => Some(Self::OnHold),
            "Closed" => Some(Self::Closed),
            _ => None,
        }
    }
}

/// Priority of a matter or a case task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "High" => Some(Self::High),
            "Medium" => Some(Self::Medium),
            "Low" => Some(Self::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatterField {
    Title,
    Client,
    PracticeArea,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatterRecord {
    pub id: String,
    pub title: String,
    pub client: String,
    pub practice_area: String,
    pub opened_on: NaiveDate,
    pub status: MatterStatus,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Record for MatterRecord {
    type Field = MatterField;
    const ENTITY: &'static str = "matter";

    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> &str {
        self.status.as_str()
    }

    fn timestamp(&self) -> NaiveDateTime {
        start_of_day(self.opened_on)
    }

    fn text(&self, field: MatterField) -> Option<&str> {
        match field {
            MatterField::Title => Some(&self.title),
            MatterField::Client => Some(&self.client),
            MatterField::PracticeArea => Some(&self.practice_area),
        }
    }
}

// --- Clients ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClientStatus {
    Active,
    Inactive,
}

impl ClientStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientField {
    Name,
    Email,
    Phone,
    Company,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub client_since: NaiveDate,
    pub status: ClientStatus,
}

impl Record for ClientRecord {
    type Field = ClientField;
    const ENTITY: &'static str = "client";

    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> &str {
        self.status.as_str()
    }

    fn timestamp(&self) -> NaiveDateTime {
        start_of_day(self.client_since)
    }

    fn text(&self, field: ClientField) -> Option<&str> {
        match field {
            ClientField::Name => Some(&self.name),
            ClientField::Email => self.email.as_deref(),
            ClientField::Phone => self.phone.as_deref(),
            ClientField::Company => self.company.as_deref(),
        }
    }
}

// --- Payments ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    CreditCard,
    Check,
    WireTransfer,
    Ach,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreditCard => "Credit Card",
            Self::Check => "Check",
            Self::WireTransfer => "Wire Transfer",
            Self::Ach => "ACH",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "Credit Card" => Some(Self::CreditCard),
            "Check" => Some(Self::Check),
            "Wire Transfer" => Some(Self::WireTransfer),
            "ACH" => Some(Self::Ach),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Processed,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Processed => "Processed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentField {
    Client,
    Invoice,
    Method,
    Note,
    Amount,
}

/// Money received from a client. Payments without an invoice are retainer
/// deposits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: String,
    pub client: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<String>,
    pub received_on: NaiveDate,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Record for PaymentRecord {
    type Field = PaymentField;
    const ENTITY: &'static str = "payment";

    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> &str {
        self.status.as_str()
    }

    fn timestamp(&self) -> NaiveDateTime {
        start_of_day(self.received_on)
    }

    fn text(&self, field: PaymentField) -> Option<&str> {
        match field {
            PaymentField::Client => Some(&self.client),
            PaymentField::Invoice => self.invoice_id.as_deref(),
            PaymentField::Method => Some(self.method.as_str()),
            PaymentField::Note => self.note.as_deref(),
            PaymentField::Amount => None,
        }
    }

    fn amount(&self, field: PaymentField) -> Option<Decimal> {
        match field {
            PaymentField::Amount => Some(self.amount),
            _ => None,
        }
    }
}

// --- Retainers ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RetainerKind {
    TrustAccount,
    EvergreenRetainer,
}

impl RetainerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TrustAccount => "Trust Account",
            Self::EvergreenRetainer => "Evergreen Retainer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RetainerStatus {
    Active,
    LowBalance,
    Depleted,
}

/// Share of the initial deposit at or below which a retainer runs low.
pub const LOW_BALANCE_SHARE: Decimal = dec!(0.25);

impl RetainerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::LowBalance => "Low Balance",
            Self::Depleted => "Depleted",
        }
    }

    pub fn for_balance(initial: Decimal, balance: Decimal) -> Self {
        if balance <= Decimal::ZERO {
            Self::Depleted
        } else if balance <= initial * LOW_BALANCE_SHARE {
            Self::LowBalance
        } else {
            Self::Active
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetainerField {
    Client,
    Kind,
    Balance,
}

/// Client funds held in advance. `status` always reflects the balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetainerRecord {
    pub id: String,
    pub client: String,
    pub kind: RetainerKind,
    pub initial_amount: Decimal,
    pub balance: Decimal,
    pub last_activity: NaiveDate,
    pub status: RetainerStatus,
}

impl RetainerRecord {
    /// Same retainer with a new balance, status and activity date.
    pub fn with_balance(&self, balance: Decimal, on: NaiveDate) -> Self {
        Self {
            balance,
            last_activity: on,
            status: RetainerStatus::for_balance(self.initial_amount, balance),
            ..self.clone()
        }
    }
}

impl Record for RetainerRecord {
    type Field = RetainerField;
    const ENTITY: &'static str = "retainer";

    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> &str {
        self.status.as_str()
    }

    fn timestamp(&self) -> NaiveDateTime {
        start_of_day(self.last_activity)
    }

    fn text(&self, field: RetainerField) -> Option<&str> {
        match field {
            RetainerField::Client => Some(&self.client),
            RetainerField::Kind => Some(self.kind.as_str()),
            RetainerField::Balance => None,
        }
    }

    fn amount(&self, field: RetainerField) -> Option<Decimal> {
        match field {
            RetainerField::Balance => Some(self.balance),
            _ => None,
        }
    }
}

// --- Case tasks ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    ToDo,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub const ALL: [Self; 3] = [Self::ToDo, Self::InProgress, Self::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ToDo => "To Do",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "To Do" => Some(Self::ToDo),
            "In Progress" => Some(Self::InProgress),
            "Completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskField {
    Title,
    Description,
    AssignedTo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: String,
    pub case_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub assigned_to: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub created_on: NaiveDate,
}

impl TaskRecord {
    /// Past due and not yet completed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != TaskStatus::Completed && self.due_date < today
    }
}

impl Record for TaskRecord {
    type Field = TaskField;
    const ENTITY: &'static str = "task";

    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> &str {
        self.status.as_str()
    }

    fn timestamp(&self) -> NaiveDateTime {
        start_of_day(self.due_date)
    }

    fn text(&self, field: TaskField) -> Option<&str> {
        match field {
            TaskField::Title => Some(&self.title),
            TaskField::Description => self.description.as_deref(),
            TaskField::AssignedTo => Some(&self.assigned_to),
        }
    }
}

// --- Stores ---

/// One store per entity type, as the dashboard pages share them.
#[derive(Debug, Clone, Default)]
pub struct PracticeStores {
    pub documents: EntityStore<DocumentRecord>,
    pub invoices: EntityStore<InvoiceRecord>,
    pub appointments: EntityStore<AppointmentRecord>,
    pub interactions: EntityStore<InteractionRecord>,
    pub matters: EntityStore<MatterRecord>,
    pub clients: EntityStore<ClientRecord>,
    pub payments: EntityStore<PaymentRecord>,
    pub retainers: EntityStore<RetainerRecord>,
    pub tasks: EntityStore<TaskRecord>,
}

impl PracticeStores {
    /// Stores filled with the bundled sample practice.
    pub fn seeded() -> Result<Self, StoreError> {
        Ok(Self {
            documents: EntityStore::seeded(seed::documents)?,
            invoices: EntityStore::seeded(seed::invoices)?,
            appointments: EntityStore::seeded(seed::appointments)?,
            interactions: EntityStore::seeded(seed::interactions)?,
            matters: EntityStore::seeded(seed::matters)?,
            clients: EntityStore::seeded(seed::clients)?,
            payments: EntityStore::seeded(seed::payments)?,
            retainers: EntityStore::seeded(seed::retainers)?,
            tasks: EntityStore::seeded(seed::tasks)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::{
        DocumentKind, InteractionType, InvoiceStatus, MatterStatus, PaymentMethod, Priority,
        RetainerStatus, TaskStatus, client_from_case_name, duration_label, non_blank,
        parse_duration_label,
    };

    #[test]
    fn client_name_is_case_name_before_versus() {
        assert_eq!(client_from_case_name("Smith vs. Johnson"), "Smith");
        assert_eq!(client_from_case_name("Miller vs. ABC Corp"), "Miller");
        assert_eq!(client_from_case_name("Brown Estate"), "Brown Estate");
    }

    #[test]
    fn duration_labels_round_trip_through_minutes() {
        assert_eq!(duration_label(30), "30 minutes");
        assert_eq!(duration_label(60), "1 hour");
        assert_eq!(duration_label(90), "1.5 hours");
        assert_eq!(duration_label(180), "3 hours");

        assert_eq!(parse_duration_label("30 minutes"), Some(30));
        assert_eq!(parse_duration_label("1 hour"), Some(60));
        assert_eq!(parse_duration_label("1.5 hours"), Some(90));
        assert_eq!(parse_duration_label("soon"), None);
        assert_eq!(parse_duration_label("0 hours"), None);
        assert_eq!(parse_duration_label("2 fortnights"), None);
    }

    #[test]
    fn labels_parse_back_to_variants() {
        for status in MatterStatus::ALL {
            assert_eq!(MatterStatus::from_label(status.as_str()), Some(status));
        }
        assert_eq!(
            InvoiceStatus::from_label("Overdue"),
            Some(InvoiceStatus::Overdue)
        );
        assert_eq!(
            InteractionType::from_label("Video Call"),
            Some(InteractionType::VideoCall)
        );
        assert_eq!(InvoiceStatus::from_label("overdue"), None);
        for status in TaskStatus::ALL {
            assert_eq!(TaskStatus::from_label(status.as_str()), Some(status));
        }
        for priority in Priority::ALL {
            assert_eq!(Priority::from_label(priority.as_str()), Some(priority));
        }
        assert_eq!(PaymentMethod::from_label("ACH"), Some(PaymentMethod::Ach));
    }

    #[test]
    fn retainer_status_follows_balance() {
        assert_eq!(RetainerStatus::for_balance(dec!(5000), dec!(2350)), RetainerStatus::Active);
        assert_eq!(
            RetainerStatus::for_balance(dec!(3000), dec!(750)),
            RetainerStatus::LowBalance
        );
        assert_eq!(
            RetainerStatus::for_balance(dec!(2500), dec!(0)),
            RetainerStatus::Depleted
        );
    }

    #[test]
    fn document_kind_follows_file_type() {
        assert_eq!(DocumentKind::from_file_type("PDF"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_file_type(".docx"), DocumentKind::Doc);
        assert_eq!(DocumentKind::from_file_type("XLSX"), DocumentKind::Spreadsheet);
        assert_eq!(DocumentKind::from_file_type("JPG"), DocumentKind::Image);
        assert_eq!(DocumentKind::from_file_type("zip"), DocumentKind::Other);
    }

    #[test]
    fn non_blank_trims_and_drops_empty() {
        assert_eq!(non_blank(Some("  note ".to_string())).as_deref(), Some("note"));
        assert_eq!(non_blank(Some("   ".to_string())), None);
        assert_eq!(non_blank(None), None);
    }
}
