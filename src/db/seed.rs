//! Sample practice data used to seed entity stores.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal_macros::dec;

use crate::db::{
    AppointmentRecord, AppointmentType, ClientRecord, ClientStatus, DocumentKind, DocumentRecord,
    InteractionRecord, InteractionType, InvoiceRecord, InvoiceStatus, MatterRecord, MatterStatus,
    PaymentMethod, PaymentRecord, PaymentStatus, Priority, RetainerKind, RetainerRecord,
    RetainerStatus, TaskRecord, TaskStatus,
};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(d) => d,
        None => panic!("invalid seed date"),
    }
}

fn at(day: NaiveDate, hour: u32, minute: u32) -> NaiveDateTime {
    match NaiveTime::from_hms_opt(hour, minute, 0) {
        Some(time) => day.and_time(time),
        None => panic!("invalid seed time"),
    }
}

#[allow(clippy::too_many_arguments)]
fn document(
    id: &str,
    title: &str,
    case: (&str, &str),
    category: &str,
    uploaded_on: NaiveDate,
    size: &str,
    file_type: &str,
    uploaded_by: &str,
) -> DocumentRecord {
    DocumentRecord {
        id: id.to_string(),
        title: title.to_string(),
        case_id: case.0.to_string(),
        case_name: case.1.to_string(),
        kind: DocumentKind::from_file_type(file_type),
        category: category.to_string(),
        uploaded_on,
        size: size.to_string(),
        file_type: file_type.to_string(),
        uploaded_by: uploaded_by.to_string(),
    }
}

pub fn documents() -> Vec<DocumentRecord> {
    vec![
        document(
            "DOC-2023-001",
            "Smith vs. Johnson - Divorce Petition",
            ("CS-2023-001", "Smith vs. Johnson"),
            "Family Law",
            date(2023, 8, 5),
            "2.4 MB",
            "PDF",
            "John Doe",
        ),
        document(
            "DOC-2023-002",
            "Brown Estate - Will and Testament",
            ("CS-2023-002", "Brown Estate"),
            "Probate",
            date(2023, 7, 20),
            "1.8 MB",
            "PDF",
            "Sarah Parker",
        ),
        document(
            "DOC-2023-003",
            "Williams Contract - Original Agreement",
            ("CS-2023-003", "Williams Contract Dispute"),
            "Corporate",
            date(2023, 8, 1),
            "3.2 MB",
            "DOCX",
            "John Doe",
        ),
        document(
            "DOC-2023-004",
            "Davis Medical Records",
            ("CS-2023-004", "Davis Injury Claim"),
            "Personal Injury",
            date(2023, 7, 12),
            "5.7 MB",
            "JPG",
            "Michael Chen",
        ),
        document(
            "DOC-2023-005",
            "Miller vs. ABC Corp - Initial Complaint",
            ("CS-2023-005", "Miller vs. ABC Corp"),
            "Litigation",
            date(2023, 7, 29),
            "2.1 MB",
            "PDF",
            "Sarah Parker",
        ),
        document(
            "DOC-2023-006",
            "Wilson Divorce - Financial Disclosure",
            ("CS-2023-006", "Wilson Divorce"),
            "Family Law",
            date(2023, 6, 10),
            "4.3 MB",
            "XLSX",
            "John Doe",
        ),
        document(
            "DOC-2023-007",
            "Taylor Property - Deed and Title",
            ("CS-2023-007", "Taylor Property Dispute"),
            "Real Estate",
            date(2023, 7, 25),
            "1.5 MB",
            "PDF",
            "Michael Chen",
        ),
        document(
            "DOC-2023-008",
            "Harris Will Contest - Prior Will",
            ("CS-2023-008", "Harris Will Contest"),
            "Probate",
            date(2023, 6, 28),
            "1.9 MB",
            "PDF",
            "Sarah Parker",
        ),
    ]
}

fn invoice(
    id: &str,
    client: &str,
    case_name: &str,
    issue_date: NaiveDate,
    due_date: NaiveDate,
    total: rust_decimal::Decimal,
    status: InvoiceStatus,
) -> InvoiceRecord {
    InvoiceRecord {
        id: id.to_string(),
        client_id: None,
        client: client.to_string(),
        case_id: None,
        case_name: case_name.to_string(),
        issue_date,
        due_date,
        line_items: Vec::new(),
        subtotal: total,
        tax: dec!(0),
        total,
        status,
        notes: None,
    }
}

pub fn invoices() -> Vec<InvoiceRecord> {
    vec![
        invoice(
            "INV-2023-001",
            "Mary Smith",
            "Smith vs. Johnson",
            date(2023, 10, 15),
            date(2023, 11, 15),
            dec!(3500.00),
            InvoiceStatus::Overdue,
        ),
        invoice(
            "INV-2023-002",
            "James Brown Jr.",
            "Brown Estate",
            date(2023, 10, 20),
            date(2023, 11, 20),
            dec!(2200.00),
            InvoiceStatus::Paid,
        ),
        invoice(
            "INV-2023-003",
            "Williams Corporation",
            "Williams Contract Dispute",
            date(2023, 10, 25),
            date(2023, 11, 25),
            dec!(7800.00),
            InvoiceStatus::Pending,
        ),
        invoice(
            "INV-2023-004",
            "Sarah Davis",
            "Davis Injury Claim",
            date(2023, 11, 1),
            date(2023, 12, 1),
            dec!(4200.00),
            InvoiceStatus::Paid,
        ),
        invoice(
            "INV-2023-005",
            "Robert Miller",
            "Miller vs. ABC Corp",
            date(2023, 11, 5),
            date(2023, 12, 5),
            dec!(6500.00),
            InvoiceStatus::Pending,
        ),
        invoice(
            "INV-2023-006",
            "Michael Wilson",
            "Wilson Divorce",
            date(2023, 11, 10),
            date(2023, 12, 10),
            dec!(3800.00),
            InvoiceStatus::Draft,
        ),
    ]
}

fn appointment(
    id: &str,
    title: &str,
    starts_at: NaiveDateTime,
    kind: AppointmentType,
    location: &str,
    duration_minutes: u32,
) -> AppointmentRecord {
    AppointmentRecord {
        id: id.to_string(),
        title: title.to_string(),
        starts_at,
        kind,
        location: location.to_string(),
        duration_minutes,
        client: None,
        notes: None,
    }
}

pub fn appointments() -> Vec<AppointmentRecord> {
    vec![
        appointment(
            "1",
            "Client Meeting - Brown Estate",
            at(date(2023, 8, 15), 14, 0),
            AppointmentType::Meeting,
            "Office - Room 203",
            60,
        ),
        appointment(
            "2",
            "Court Hearing - Smith vs. Johnson",
            at(date(2023, 8, 16), 9, 30),
            AppointmentType::Court,
            "County Courthouse - Room 301",
            120,
        ),
        appointment(
            "3",
            "Document Review - Miller Case",
            at(date(2023, 8, 17), 11, 0),
            AppointmentType::Task,
            "Virtual",
            90,
        ),
        appointment(
            "4",
            "Deposition - Davis Injury Claim",
            at(date(2023, 8, 18), 13, 30),
            AppointmentType::Deposition,
            "Office - Room 105",
            180,
        ),
        appointment(
            "5",
            "Team Meeting",
            at(date(2023, 8, 18), 9, 0),
            AppointmentType::Meeting,
            "Conference Room",
            60,
        ),
        appointment(
            "6",
            "Client Call - Wilson",
            at(date(2023, 8, 18), 11, 0),
            AppointmentType::Call,
            "Phone",
            30,
        ),
    ]
}

fn matter(
    id: &str,
    title: &str,
    client: &str,
    practice_area: &str,
    opened_on: NaiveDate,
    status: MatterStatus,
    priority: Priority,
) -> MatterRecord {
    MatterRecord {
        id: id.to_string(),
        title: title.to_string(),
        client: client.to_string(),
        practice_area: practice_area.to_string(),
        opened_on,
        status,
        priority,
        description: None,
    }
}

pub fn matters() -> Vec<MatterRecord> {
    use MatterStatus::{Active, Closed, OnHold, Pending};
    use Priority::{High, Low, Medium};

    vec![
        matter(
            "CS-2023-001",
            "Smith vs. Johnson",
            "Mary Smith",
            "Family Law",
            date(2023, 8, 10),
            Active,
            High,
        ),
        matter(
            "CS-2023-002",
            "Brown Estate",
            "James Brown Jr.",
            "Probate",
            date(2023, 7, 22),
            Active,
            Medium,
        ),
        matter(
            "CS-2023-003",
            "Williams Contract Dispute",
            "Williams Corporation",
            "Corporate",
            date(2023, 8, 5),
            Active,
            Medium,
        ),
        matter(
            "CS-2023-004",
            "Davis Injury Claim",
            "Sarah Davis",
            "Personal Injury",
            date(2023, 7, 15),
            Active,
            Low,
        ),
        matter(
            "CS-2023-005",
            "Miller vs. ABC Corp",
            "Robert Miller",
            "Litigation",
            date(2023, 8, 1),
            Active,
            High,
        ),
        matter(
            "CS-2023-006",
            "Wilson Divorce",
            "Michael Wilson",
            "Family Law",
            date(2023, 6, 12),
            Pending,
            Medium,
        ),
        matter(
            "CS-2023-007",
            "Taylor Property Dispute",
            "Emily Taylor",
            "Real Estate",
            date(2023, 7, 28),
            Active,
            Medium,
        ),
        matter(
            "CS-2023-008",
            "Harris Will Contest",
            "Thomas Harris",
            "Probate",
            date(2023, 6, 30),
            OnHold,
            Low,
        ),
        matter(
            "CS-2023-009",
            "Lee vs. State",
            "Jennifer Lee",
            "Criminal Defense",
            date(2023, 8, 7),
            Active,
            High,
        ),
        matter(
            "CS-2023-010",
            "Clark Business Formation",
            "Clark Enterprises",
            "Corporate",
            date(2023, 7, 3),
            Closed,
            Low,
        ),
    ]
}

fn client(
    id: &str,
    name: &str,
    email: &str,
    phone: &str,
    company: Option<&str>,
    client_since: NaiveDate,
    status: ClientStatus,
) -> ClientRecord {
    ClientRecord {
        id: id.to_string(),
        name: name.to_string(),
        email: Some(email.to_string()),
        phone: Some(phone.to_string()),
        company: company.map(str::to_string),
        client_since,
        status,
    }
}

pub fn clients() -> Vec<ClientRecord> {
    vec![
        client(
            "CL-2023-001",
            "Mary Smith",
            "mary.smith@example.com",
            "(555) 123-4567",
            None,
            date(2023, 8, 10),
            ClientStatus::Active,
        ),
        client(
            "CL-2023-002",
            "James Brown Jr.",
            "james.brown@example.com",
            "(555) 234-5678",
            None,
            date(2023, 7, 22),
            ClientStatus::Active,
        ),
        client(
            "CL-2023-003",
            "Williams Corporation",
            "legal@williamscorp.example.com",
            "(555) 345-6789",
            Some("Williams Corporation"),
            date(2023, 8, 5),
            ClientStatus::Active,
        ),
        client(
            "CL-2023-004",
            "Sarah Davis",
            "sarah.davis@example.com",
            "(555) 456-7890",
            None,
            date(2023, 7, 15),
            ClientStatus::Active,
        ),
        client(
            "CL-2023-005",
            "Robert Miller",
            "robert.miller@example.com",
            "(555) 567-8901",
            None,
            date(2023, 8, 1),
            ClientStatus::Inactive,
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn interaction(
    id: &str,
    client: (&str, &str),
    case: Option<(&str, &str)>,
    kind: InteractionType,
    occurred_at: NaiveDateTime,
    duration_minutes: Option<u32>,
    summary: &str,
    follow_up_date: Option<NaiveDate>,
) -> InteractionRecord {
    InteractionRecord {
        id: id.to_string(),
        client_id: client.0.to_string(),
        client_name: client.1.to_string(),
        case_id: case.map(|c| c.0.to_string()),
        case_name: case.map(|c| c.1.to_string()),
        kind,
        occurred_at,
        duration_minutes,
        summary: summary.to_string(),
        follow_up_required: follow_up_date.is_some(),
        follow_up_date,
    }
}

pub fn interactions() -> Vec<InteractionRecord> {
    vec![
        interaction(
            "INT-2023-001",
            ("CL-2023-001", "Mary Smith"),
            Some(("CS-2023-001", "Smith vs. Johnson")),
            InteractionType::PhoneCall,
            at(date(2023, 8, 14), 10, 30),
            Some(25),
            "Discussed custody schedule and upcoming hearing preparation.",
            Some(date(2023, 8, 21)),
        ),
        interaction(
            "INT-2023-002",
            ("CL-2023-002", "James Brown Jr."),
            Some(("CS-2023-002", "Brown Estate")),
            InteractionType::Meeting,
            at(date(2023, 8, 11), 14, 0),
            Some(60),
            "Reviewed asset inventory for the estate and probate timeline.",
            None,
        ),
        interaction(
            "INT-2023-003",
            ("CL-2023-003", "Williams Corporation"),
            Some(("CS-2023-003", "Williams Contract Dispute")),
            InteractionType::Email,
            at(date(2023, 8, 9), 9, 15),
            None,
            "Sent summary of breach claims and requested original correspondence.",
            Some(date(2023, 8, 16)),
        ),
        interaction(
            "INT-2023-004",
            ("CL-2023-004", "Sarah Davis"),
            Some(("CS-2023-004", "Davis Injury Claim")),
            InteractionType::VideoCall,
            at(date(2023, 8, 8), 16, 0),
            Some(40),
            "Walked through medical records release and deposition logistics.",
            None,
        ),
        interaction(
            "INT-2023-005",
            ("CL-2023-001", "Mary Smith"),
            None,
            InteractionType::TextMessage,
            at(date(2023, 7, 30), 18, 45),
            None,
            "Confirmed receipt of financial disclosure checklist.",
            None,
        ),
        interaction(
            "INT-2023-006",
            ("CL-2023-005", "Robert Miller"),
            Some(("CS-2023-005", "Miller vs. ABC Corp")),
            InteractionType::PhoneCall,
            at(date(2023, 7, 28), 11, 0),
            Some(15),
            "Explained initial complaint filing and service timeline.",
            Some(date(2023, 8, 4)),
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn payment(
    id: &str,
    client: &str,
    invoice_id: Option<&str>,
    received_on: NaiveDate,
    amount: rust_decimal::Decimal,
    method: PaymentMethod,
    status: PaymentStatus,
    note: Option<&str>,
) -> PaymentRecord {
    PaymentRecord {
        id: id.to_string(),
        client: client.to_string(),
        invoice_id: invoice_id.map(str::to_string),
        received_on,
        amount,
        method,
        status,
        note: note.map(str::to_string),
    }
}

pub fn payments() -> Vec<PaymentRecord> {
    use PaymentMethod::{Ach, Check, CreditCard, WireTransfer};
    use PaymentStatus::{Pending, Processed};

    vec![
        payment(
            "PMT-2023-001",
            "Mary Smith",
            Some("INV-2023-001"),
            date(2023, 11, 10),
            dec!(3500.00),
            CreditCard,
            Processed,
            None,
        ),
        payment(
            "PMT-2023-002",
            "James Brown Jr.",
            Some("INV-2023-002"),
            date(2023, 11, 15),
            dec!(2200.00),
            Check,
            Processed,
            None,
        ),
        payment(
            "PMT-2023-003",
            "Williams Corporation",
            None,
            date(2023, 11, 1),
            dec!(10000.00),
            WireTransfer,
            Processed,
            Some("Retainer payment"),
        ),
        payment(
            "PMT-2023-004",
            "Sarah Davis",
            Some("INV-2023-004"),
            date(2023, 11, 20),
            dec!(4200.00),
            Ach,
            Processed,
            None,
        ),
        payment(
            "PMT-2023-005",
            "Michael Wilson",
            None,
            date(2023, 11, 22),
            dec!(4000.00),
            CreditCard,
            Pending,
            Some("Retainer payment"),
        ),
        payment(
            "PMT-2023-006",
            "Emily Taylor",
            Some("INV-2023-008"),
            date(2023, 11, 25),
            dec!(1800.00),
            Check,
            Pending,
            None,
        ),
    ]
}

fn retainer(
    id: &str,
    client: &str,
    kind: RetainerKind,
    initial_amount: rust_decimal::Decimal,
    balance: rust_decimal::Decimal,
    last_activity: NaiveDate,
) -> RetainerRecord {
    RetainerRecord {
        id: id.to_string(),
        client: client.to_string(),
        kind,
        initial_amount,
        balance,
        last_activity,
        status: RetainerStatus::for_balance(initial_amount, balance),
    }
}

pub fn retainers() -> Vec<RetainerRecord> {
    use RetainerKind::{EvergreenRetainer, TrustAccount};

    vec![
        retainer(
            "RA-2023-001",
            "Mary Smith",
            TrustAccount,
            dec!(5000.00),
            dec!(2350.00),
            date(2023, 10, 25),
        ),
        retainer(
            "RA-2023-002",
            "James Brown Jr.",
            TrustAccount,
            dec!(3000.00),
            dec!(750.00),
            date(2023, 11, 5),
        ),
        retainer(
            "RA-2023-003",
            "Williams Corporation",
            EvergreenRetainer,
            dec!(10000.00),
            dec!(8750.00),
            date(2023, 11, 1),
        ),
        retainer(
            "RA-2023-004",
            "Sarah Davis",
            TrustAccount,
            dec!(2500.00),
            dec!(0.00),
            date(2023, 10, 15),
        ),
        retainer(
            "RA-2023-005",
            "Robert Miller",
            EvergreenRetainer,
            dec!(7500.00),
            dec!(6200.00),
            date(2023, 11, 10),
        ),
        retainer(
            "RA-2023-006",
            "Michael Wilson",
            TrustAccount,
            dec!(4000.00),
            dec!(3800.00),
            date(2023, 11, 12),
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn task(
    id: &str,
    case_id: &str,
    title: &str,
    description: &str,
    due_date: NaiveDate,
    assigned_to: &str,
    priority: Priority,
    status: TaskStatus,
    created_on: NaiveDate,
) -> TaskRecord {
    TaskRecord {
        id: id.to_string(),
        case_id: case_id.to_string(),
        title: title.to_string(),
        description: Some(description.to_string()),
        due_date,
        assigned_to: assigned_to.to_string(),
        priority,
        status,
        created_on,
    }
}

pub fn tasks() -> Vec<TaskRecord> {
    vec![
        task(
            "TASK-1",
            "CS-2023-001",
            "Prepare Discovery Documents",
            "Draft and compile discovery requests for opposing counsel",
            date(2023, 11, 1),
            "John Doe",
            Priority::High,
            TaskStatus::InProgress,
            date(2023, 10, 1),
        ),
        task(
            "TASK-2",
            "CS-2023-001",
            "Schedule Client Meeting",
            "Discuss case strategy and upcoming court date",
            date(2023, 10, 25),
            "Sarah Parker",
            Priority::Medium,
            TaskStatus::ToDo,
            date(2023, 10, 5),
        ),
        task(
            "TASK-3",
            "CS-2023-001",
            "File Motion to Compel",
            "Prepare and file motion to compel document production",
            date(2023, 10, 15),
            "John Doe",
            Priority::High,
            TaskStatus::Completed,
            date(2023, 10, 3),
        ),
    ]
}
