use clap::Parser;
use diary_core::db;
use diary_core::error::CoreError;
use diary_core::repository::SqliteRepository;
use diary_core::service::ScheduleService;
use owo_colors::{OwoColorize, Style};
use tracing::{warn, Level};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod parser;
mod util;
mod views;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::WARN.to_string()))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = config::Config::new().unwrap_or_else(|e| {
        warn!("ignoring invalid configuration: {}", e);
        config::Config::default()
    });

    let db_pool = match db::establish_connection(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    };
    let service = ScheduleService::new(SqliteRepository::new(db_pool), config.schedule);

    let result = match cli.command {
        cli::Commands::Calendar(command) => commands::calendar::calendar_command(service.repository(), command).await,
        cli::Commands::Add(command) => commands::add::add_schedule(&service, command, &config).await,
        cli::Commands::List(command) => commands::list::list_occurrences(&service, command, &config).await,
        cli::Commands::Edit(command) => commands::edit::edit_schedule(&service, command).await,
        cli::Commands::Delete(command) => commands::delete::delete_schedule(&service, command).await,
    };

    if let Err(e) = result {
        handle_error(e);
        std::process::exit(1);
    }
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    match err.downcast_ref::<CoreError>() {
        Some(CoreError::NotARecurringSchedule(id)) => {
            eprintln!(
                "{} Schedule {} does not repeat; use {}",
                "Error:".style(error_style),
                id.yellow(),
                "--scope all".yellow()
            );
        }
        Some(CoreError::InvalidOccurrence { schedule_id, date }) => {
            eprintln!(
                "{} {} is not an occurrence of {}",
                "Error:".style(error_style),
                date.yellow(),
                schedule_id.yellow()
            );
            eprintln!("Use 'diary list --day <date>' to see the occurrences on a day.");
        }
        Some(CoreError::ConcurrentModification(id)) => {
            eprintln!(
                "{} Schedule {} changed while it was being edited; try again.",
                "Error:".style(error_style),
                id.yellow()
            );
        }
        Some(CoreError::Database(source)) => {
            eprintln!("{} Database error: {}", "Error:".style(error_style), source);
        }
        _ => eprintln!("{} {}", "Error:".style(error_style), err),
    }
}
