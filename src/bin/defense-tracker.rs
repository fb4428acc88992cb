use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use defense_tracker::models::CustomDate;
use defense_tracker::render;
use defense_tracker::{DefenseTracker, Result, TrackerError};

#[derive(Parser)]
#[command(name = "defense-tracker", about = "European defense equity performance table")]
struct Cli {
    /// Store directory (defaults to the platform cache directory)
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Never touch the network; show persisted data only
    #[arg(long, global = true)]
    offline: bool,

    /// HTTP timeout in seconds
    #[arg(long, global = true, default_value_t = 15)]
    timeout: u64,

    /// Pause between chart requests in milliseconds
    #[arg(long, global = true, default_value_t = 1000)]
    delay_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch every symbol and print the performance table
    Table,
    /// Print the last persisted table without fetching
    Cached,
    /// Manage custom-date columns
    Dates {
        #[command(subcommand)]
        action: DatesAction,
    },
    /// Change since DATE (DD/MM/YYYY) for one ticker or all of them
    Custom {
        date: String,
        #[arg(long)]
        ticker: Option<String>,
    },
    /// Manual-entry sheet
    Manual {
        #[command(subcommand)]
        action: ManualAction,
    },
    /// Delete every persisted file
    Clear,
}

#[derive(Subcommand)]
enum DatesAction {
    Add { date: String },
    Remove { date: String },
    List,
}

#[derive(Subcommand)]
enum ManualAction {
    /// Set a cell, e.g. `manual set RHM.DE 1W +3.5`
    Set {
        ticker: String,
        column: String,
        value: String,
    },
    /// Clear the whole sheet
    Clear,
    Show,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut builder = DefenseTracker::builder()
        .offline(cli.offline)
        .timeout(Duration::from_secs(cli.timeout))
        .request_delay(Duration::from_millis(cli.delay_ms));
    if let Some(dir) = cli.cache_dir {
        builder = builder.cache_dir(dir);
    }
    let tracker = builder.build()?;
    let mut session = tracker.load_session()?;

    match cli.command {
        Command::Table => {
            tracker.refresh(&mut session)?;
            print!("{}", tracker.render(&session));
        }
        Command::Cached => {
            print!("{}", tracker.render(&session));
        }
        Command::Dates { action } => {
            match action {
                DatesAction::Add { date } => {
                    let date: CustomDate = date.parse()?;
                    if !tracker.add_custom_date(&mut session, date)? {
                        println!("{} is already tracked", date);
                    }
                }
                DatesAction::Remove { date } => {
                    let date: CustomDate = date.parse()?;
                    if !session.remove_custom_date(&date) {
                        println!("{} is not tracked", date);
                    }
                }
                DatesAction::List => {}
            }
            for date in session.custom_dates() {
                println!("{}", date);
            }
            tracker.save_session(&session)?;
        }
        Command::Custom { date, ticker } => {
            let date: CustomDate = date.parse()?;
            let symbols: Vec<_> = tracker
                .symbols()
                .iter()
                .filter(|s| ticker.as_deref().map_or(true, |t| s.ticker == t))
                .cloned()
                .collect();
            if symbols.is_empty() {
                return Err(TrackerError::NotFound(format!(
                    "unknown ticker: {}",
                    ticker.unwrap_or_default()
                )));
            }
            for (symbol, change) in tracker.custom_changes(&symbols, &date)? {
                let cell = match change {
                    Ok(change) => render::format_change(Some(change)),
                    Err(e) => {
                        error!(ticker = %symbol.ticker, "{}", e);
                        render::ERROR_MARKER.to_string()
                    }
                };
                println!("{:<20} {:<10} {:>10}", symbol.label, symbol.ticker, cell);
            }
        }
        Command::Manual { action } => {
            let mut sheet = tracker.manual_sheet()?;
            match action {
                ManualAction::Set {
                    ticker,
                    column,
                    value,
                } => {
                    tracker.set_manual_cell(&session, &mut sheet, &ticker, &column, &value)?;
                    tracker.save_manual_sheet(&sheet)?;
                }
                ManualAction::Clear => {
                    sheet.clear();
                    tracker.save_manual_sheet(&sheet)?;
                }
                ManualAction::Show => {}
            }
            let columns = tracker.columns(&session);
            print!(
                "{}",
                render::render_manual(&sheet, tracker.symbols(), &columns)
            );
        }
        Command::Clear => {
            tracker.clear_cache()?;
        }
    }
    Ok(())
}
