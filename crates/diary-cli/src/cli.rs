use clap::{ArgGroup, Parser, Subcommand};
use diary_core::models::{Color, EditScope, Frequency};

/// A personal calendar and diary with recurring schedules
#[derive(Parser, Debug)]
#[command(author, version, long_about = None)]
pub struct Cli {
    /// Print debug logs to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Manage calendars
    Calendar(CalendarCommand),
    /// Add a schedule, optionally repeating
    Add(AddCommand),
    /// List occurrences for a day, month or year
    List(ListCommand),
    /// Edit a schedule or some of its occurrences
    Edit(EditCommand),
    /// Delete a schedule or some of its occurrences
    Delete(DeleteCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct CalendarCommand {
    #[command(subcommand)]
    pub action: CalendarAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CalendarAction {
    /// Create a calendar
    Add {
        /// Name of the calendar
        name: String,
    },
    /// List calendars
    List,
    /// Delete a calendar and every schedule in it
    Delete {
        /// Name or ID of the calendar
        calendar: String,
    },
}

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    /// Title of the schedule
    pub title: String,
    /// Start, e.g. '2024-03-01 09:00'
    #[arg(short, long)]
    pub start: String,
    /// End, as a full date-time or a time on the start day ('09:15')
    #[arg(short, long)]
    pub end: Option<String>,
    /// Notes
    #[arg(short, long)]
    pub content: Option<String>,
    #[arg(short, long)]
    pub location: Option<String>,
    #[arg(long)]
    pub color: Option<Color>,
    /// Repeat frequency (daily, weekly, monthly, yearly)
    #[arg(short, long, requires = "until")]
    pub repeat: Option<Frequency>,
    /// Last date the schedule repeats on, e.g. '2024-12-31'
    #[arg(short, long, requires = "repeat")]
    pub until: Option<String>,
    /// Calendar name or ID (defaults to the configured calendar)
    #[arg(long)]
    pub calendar: Option<String>,
}

#[derive(Parser, Debug, Clone)]
#[command(group(ArgGroup::new("period").required(true).args(["day", "month", "year"])))]
pub struct ListCommand {
    /// A single day, e.g. '2024-03-15' or 'today'
    #[arg(long)]
    pub day: Option<String>,
    /// A month, e.g. '2024-03'
    #[arg(long)]
    pub month: Option<String>,
    /// A year, e.g. '2024'
    #[arg(long)]
    pub year: Option<i32>,
    /// Calendar name or ID (defaults to the configured calendar)
    #[arg(long)]
    pub calendar: Option<String>,
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct EditCommand {
    /// The ID of the schedule (shown by 'list --day')
    pub id: String,

    /// Which occurrences to change (this|after|all)
    #[arg(long, default_value = "all")]
    pub scope: EditScope,
    /// Date of the occurrence the scope starts from
    #[arg(long)]
    pub on: Option<String>,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub content: Option<String>,
    #[arg(long, conflicts_with = "content")]
    pub content_clear: bool,

    #[arg(long)]
    pub start: Option<String>,
    #[arg(long)]
    pub end: Option<String>,

    #[arg(long)]
    pub location: Option<String>,
    #[arg(long, conflicts_with = "location")]
    pub location_clear: bool,

    #[arg(long)]
    pub color: Option<Color>,

    /// New repeat frequency
    #[arg(long, requires = "until")]
    pub repeat: Option<Frequency>,
    /// New last repeat date
    #[arg(long, requires = "repeat")]
    pub until: Option<String>,
    /// Stop repeating
    #[arg(long, conflicts_with_all = ["repeat", "until"])]
    pub repeat_clear: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteCommand {
    /// The ID of the schedule (shown by 'list --day')
    pub id: String,
    /// Which occurrences to delete (this|after|all)
    #[arg(long, default_value = "all")]
    pub scope: EditScope,
    /// Date of the occurrence the scope starts from
    #[arg(long)]
    pub on: Option<String>,
}
