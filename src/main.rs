use std::path::PathBuf;

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use casecraft::config::ViewConfig;
use casecraft::db::PracticeStores;
use casecraft::legal::{
    billing, calendar, clients, dashboard, documents, matters, payments, retainers, tasks,
};
use casecraft::settings::{DEFAULT_SETTINGS_FILE, Settings};
use casecraft::view::{GroupKeySpec, ViewBinding};

const RECENT_INVOICES: usize = 5;
const RECENT_PAYMENTS: usize = 5;

#[derive(Parser)]
#[command(name = "casecraft", version, about = "Practice views over the sample firm data")]
struct Cli {
    /// Settings file (TOML). Missing files fall back to defaults.
    #[arg(long, env = "CASECRAFT_SETTINGS", default_value = DEFAULT_SETTINGS_FILE)]
    settings: PathBuf,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, env = "CASECRAFT_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Documents grouped by year, month and case
    Documents {
        #[arg(long, default_value = "")]
        search: String,
        /// File type, e.g. PDF. "All" disables the filter.
        #[arg(long)]
        file_type: Option<String>,
    },
    /// Invoices grouped by issue month, with a billing summary
    Invoices {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        status: Option<String>,
        /// Mark pending invoices due before this day as overdue first
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Appointments for a day, plus the upcoming agenda
    Calendar {
        /// Day to show (YYYY-MM-DD)
        #[arg(long, default_value = "2023-08-18")]
        date: NaiveDate,
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long = "type")]
        kind: Option<String>,
    },
    /// Client interactions grouped by month
    Interactions {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long = "type")]
        kind: Option<String>,
        /// Limit to one client id
        #[arg(long)]
        client: Option<String>,
    },
    /// Matters grouped by practice area, with status counts
    Matters {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        status: Option<String>,
    },
    /// Payments grouped by month received, with totals
    Payments {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        status: Option<String>,
        /// Mark invoices covered by processed payments as paid first
        #[arg(long)]
        settle: bool,
    },
    /// Retainer balances and the ones that need topping up
    Retainers {
        #[arg(long, default_value = "")]
        search: String,
        #[arg(long)]
        status: Option<String>,
    },
    /// Tasks for one case, soonest due first
    Tasks {
        #[arg(long, default_value = "CS-2023-001")]
        case: String,
        /// Day used to flag overdue tasks (YYYY-MM-DD)
        #[arg(long, default_value = "2023-10-26")]
        today: NaiveDate,
    },
    /// Headline statistics
    Dashboard {
        /// Reference time (YYYY-MM-DDTHH:MM:SS)
        #[arg(long, default_value = "2023-08-15T08:00:00")]
        now: NaiveDateTime,
    },
}

fn init_tracing(log_json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct Page<T, E> {
    view: T,
    #[serde(flatten)]
    extra: E,
}

fn bind<R: casecraft::db::Record + Serialize>(
    store: &casecraft::db::EntityStore<R>,
    filter: casecraft::view::FilterSpec<R::Field>,
    grouping: GroupKeySpec<R>,
) -> anyhow::Result<std::sync::Arc<casecraft::view::ViewOutput<R>>> {
    let view = ViewBinding::new(store, filter, grouping).context("grouping failed")?;
    Ok(view.output())
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let settings = Settings::load_or_default(&cli.settings)?;
    let config = ViewConfig::resolve(&settings)?;
    let mut stores = PracticeStores::seeded()?;
    tracing::debug!(settings = %cli.settings.display(), "Configuration resolved");

    match cli.command {
        Command::Documents { search, file_type } => {
            let output = documents::document_view(
                &stores.documents,
                &config,
                &search,
                file_type.as_deref(),
            )
            .context("grouping failed")?
            .output();
            #[derive(Serialize)]
            struct Extra {
                file_types: Vec<String>,
            }
            print_json(&Page {
                view: &*output,
                extra: Extra {
                    file_types: documents::file_types(stores.documents.records()),
                },
            })
        }
        Command::Invoices {
            search,
            status,
            as_of,
        } => {
            if let Some(as_of) = as_of {
                let changed = billing::mark_overdue(&mut stores.invoices, as_of)?;
                tracing::info!(count = changed.len(), %as_of, "Marked invoices overdue");
            }
            let output = bind(
                &stores.invoices,
                billing::invoice_filter(&search, status.as_deref()),
                billing::invoice_grouping(&config),
            )?;
            #[derive(Serialize)]
            struct Extra<'a> {
                summary: billing::BillingSummary,
                recent: Vec<&'a casecraft::db::InvoiceRecord>,
            }
            print_json(&Page {
                view: &*output,
                extra: Extra {
                    summary: billing::summarize(stores.invoices.records()),
                    recent: billing::recent_invoices(stores.invoices.records(), RECENT_INVOICES),
                },
            })
        }
        Command::Calendar { date, search, kind } => {
            let agenda = bind(
                &stores.appointments,
                calendar::appointment_filter(&search, kind.as_deref()),
                calendar::agenda_grouping(&config),
            )?;
            let appointments = stores.appointments.records();
            let start = date.and_time(NaiveTime::MIN);
            #[derive(Serialize)]
            struct Day<'a> {
                date: NaiveDate,
                previous: NaiveDate,
                next: NaiveDate,
                appointments: Vec<&'a casecraft::db::AppointmentRecord>,
                upcoming: Vec<&'a casecraft::db::AppointmentRecord>,
                agenda: &'a casecraft::view::ViewOutput<casecraft::db::AppointmentRecord>,
            }
            print_json(&Day {
                date,
                previous: calendar::previous_day(date),
                next: calendar::next_day(date),
                appointments: calendar::appointments_on(appointments, date),
                upcoming: calendar::upcoming(appointments, start, config.upcoming_days),
                agenda: &agenda,
            })
        }
        Command::Interactions {
            search,
            kind,
            client,
        } => {
            if let Some(client_id) = client {
                let overview = clients::client_overview(&stores, &client_id)
                    .with_context(|| format!("unknown client '{client_id}'"))?;
                return print_json(&overview);
            }
            let output = bind(
                &stores.interactions,
                clients::interaction_filter(&search, kind.as_deref()),
                clients::interaction_grouping(&config),
            )?;
            print_json(&*output)
        }
        Command::Matters { search, status } => {
            let output = bind(
                &stores.matters,
                matters::matter_filter(&search, status.as_deref()),
                matters::practice_area_grouping(&config),
            )?;
            #[derive(Serialize)]
            struct Extra {
                status_counts: Vec<matters::StatusCount>,
            }
            print_json(&Page {
                view: &*output,
                extra: Extra {
                    status_counts: matters::status_counts(stores.matters.records()),
                },
            })
        }
        Command::Payments {
            search,
            status,
            settle,
        } => {
            if settle {
                let settled =
                    payments::settle_invoices(&mut stores.invoices, stores.payments.records())?;
                tracing::info!(count = settled.len(), "Settled invoices");
            }
            let output = bind(
                &stores.payments,
                payments::payment_filter(&search, status.as_deref()),
                payments::payment_grouping(&config),
            )?;
            #[derive(Serialize)]
            struct Extra<'a> {
                summary: payments::PaymentSummary,
                recent: Vec<&'a casecraft::db::PaymentRecord>,
            }
            print_json(&Page {
                view: &*output,
                extra: Extra {
                    summary: payments::summarize_payments(stores.payments.records()),
                    recent: payments::recent_payments(stores.payments.records(), RECENT_PAYMENTS),
                },
            })
        }
        Command::Retainers { search, status } => {
            let all = stores.retainers.records();
            #[derive(Serialize)]
            struct Balances<'a> {
                retainers: Vec<&'a casecraft::db::RetainerRecord>,
                needs_replenishment: Vec<&'a casecraft::db::RetainerRecord>,
                total_held: rust_decimal::Decimal,
            }
            print_json(&Balances {
                retainers: casecraft::view::filter(
                    all,
                    &retainers::retainer_filter(&search, status.as_deref()),
                ),
                needs_replenishment: retainers::needs_replenishment(all),
                total_held: retainers::total_held(all),
            })
        }
        Command::Tasks { case, today } => {
            let all = stores.tasks.records();
            #[derive(Serialize)]
            struct CaseTasks<'a> {
                case: &'a str,
                open: usize,
                tasks: Vec<&'a casecraft::db::TaskRecord>,
                overdue: Vec<&'a casecraft::db::TaskRecord>,
            }
            print_json(&CaseTasks {
                case: &case,
                open: tasks::open_task_count(all, &case),
                tasks: tasks::tasks_for_case(all, &case),
                overdue: tasks::overdue_tasks(all, today)
                    .into_iter()
                    .filter(|t| t.case_id == case)
                    .collect(),
            })
        }
        Command::Dashboard { now } => print_json(&dashboard::dashboard(&stores, now, &config)),
    }
}
