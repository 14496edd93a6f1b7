//! # Ponto
//!
//! Daily attendance automation. An external scheduler (cron or a
//! one-shot timer armed by `arm`) invokes `ponto run` repeatedly; each
//! invocation performs at most one clock action, guarded by the
//! business-day calendar, the persisted execution state, and the
//! configured time windows.
//!
//! Usage:
//!   ponto run                  # one orchestrator invocation
//!   ponto status               # where today stands
//!   ponto plan                 # show (or draw) today's time plan
//!   ponto check [DATE]         # business-day verdict
//!   ponto holiday add|remove|list
//!   ponto arm                  # register today's one-shot exit trigger

mod exec;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ponto_agent::{Collaborators, DailyOrchestrator, WebhookNotifier};
use ponto_core::clock;
use ponto_core::types::TaskKind;
use ponto_core::PontoConfig;

use exec::{CommandExecutor, CommandObserver, CommandSync, SystemdRunScheduler};

#[derive(Parser)]
#[command(name = "ponto", version, about = "🕐 Ponto: daily attendance automation")]
struct Cli {
    /// Path to config.toml (default: ~/.ponto/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// One orchestrator invocation: decide and perform at most one action
    Run {
        /// Advisory hint ("entry", "exit", "sync"); never overrides
        /// state and time windows
        #[arg(long)]
        hint: Option<String>,
    },
    /// Report where today stands
    Status,
    /// Show today's time plan, drawing it first if needed
    Plan,
    /// Business-day verdict for a date (default: today)
    Check { date: Option<NaiveDate> },
    /// Manage manual holidays
    Holiday {
        #[command(subcommand)]
        action: HolidayAction,
    },
    /// Compute today's exit deadline and register the one-shot trigger
    Arm,
}

#[derive(Subcommand)]
enum HolidayAction {
    /// Add a manual holiday
    Add { date: NaiveDate, name: String },
    /// Remove a manual holiday
    Remove { date: NaiveDate },
    /// List a year's holidays (default: current year)
    List { year: Option<i32> },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config = match &cli.config {
        Some(path) => PontoConfig::load_from(path)?,
        None => PontoConfig::load()?,
    };

    let data_dir = PathBuf::from(shellexpand::tilde(&config.storage.data_dir).to_string());
    std::fs::create_dir_all(&data_dir)?;
    tracing::debug!("Data dir: {}", data_dir.display());

    let notifier = config
        .notify
        .webhook_url
        .as_deref()
        .map(|url| Arc::new(WebhookNotifier::new(url)) as Arc<dyn ponto_core::traits::Notifier>);

    let collaborators = Collaborators {
        executor: Arc::new(CommandExecutor::new(&config.external)),
        observer: Arc::new(CommandObserver::new(&config.external)),
        sync: Arc::new(CommandSync::new(&config.external)),
        os_scheduler: Arc::new(SystemdRunScheduler::new(std::env::current_exe()?)),
        notifier,
    };

    let mut orchestrator = DailyOrchestrator::open(config, &data_dir, collaborators)?;
    let today = Local::now().date_naive();

    match cli.command {
        Command::Run { hint } => {
            let hint = hint.as_deref().and_then(TaskKind::parse);
            let now = Local::now().time();
            let report = orchestrator.run(today, now, hint).await?;
            println!("{report}");
        }
        Command::Status => {
            let (verdict, day_state, state, schedule) = orchestrator.status(today);
            println!("📅 {today}: {verdict}");
            println!("state: {day_state}");
            match schedule {
                Some(s) => println!("plan:  {s}"),
                None => println!("plan:  not drawn yet"),
            }
            if state.is_empty() {
                println!("no actions recorded");
            } else {
                for (task, record) in &state.records {
                    println!(
                        "  {task}: {} at {} {}",
                        record.status.as_str(),
                        record.timestamp.with_timezone(&Local).format("%H:%M:%S"),
                        record.details
                    );
                }
            }
        }
        Command::Plan => {
            let schedule = orchestrator.plan(today)?;
            println!("{schedule}");
        }
        Command::Check { date } => {
            let date = date.unwrap_or(today);
            let verdict = orchestrator.calendar().is_business_day(date);
            println!("{date}: {verdict}");
        }
        Command::Holiday { action } => match action {
            HolidayAction::Add { date, name } => {
                if orchestrator.calendar_mut().add_manual_holiday(date, &name)? {
                    println!("✅ Holiday added: {date} ({name})");
                } else {
                    println!("Holiday {date} already exists");
                }
            }
            HolidayAction::Remove { date } => {
                if orchestrator.calendar_mut().remove_manual_holiday(date)? {
                    println!("✅ Holiday removed: {date}");
                } else {
                    println!("No manual holiday on {date}");
                }
            }
            HolidayAction::List { year } => {
                let year = year.unwrap_or_else(|| today.year());
                match orchestrator.calendar().year(year) {
                    Some(set) => {
                        for (label, entries) in [
                            ("national", &set.national),
                            ("state", &set.state),
                            ("manual", &set.manual),
                        ] {
                            if entries.is_empty() {
                                continue;
                            }
                            println!("{label}:");
                            for h in entries {
                                println!("  {} {}", h.date, h.name);
                            }
                        }
                    }
                    None => println!("No holidays registered for {year}"),
                }
            }
        },
        Command::Arm => {
            let armed = orchestrator.arm_exit_trigger(today).await?;
            println!(
                "⏰ Trigger '{}' armed for {}{}{}",
                armed.task,
                clock::fmt_hm(armed.at),
                if armed.clamped { " (clamped to ceiling)" } else { "" },
                if armed.elevated { "" } else { " (user mode)" },
            );
        }
    }

    Ok(())
}
