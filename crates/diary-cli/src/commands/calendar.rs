use anyhow::Result;
use diary_core::repository::Repository;
use owo_colors::{OwoColorize, Style};

use crate::cli::{CalendarAction, CalendarCommand};
use crate::util::find_calendar;
use crate::views::table::display_calendars;

pub async fn calendar_command(repo: &impl Repository, command: CalendarCommand) -> Result<()> {
    let success_style = Style::new().green().bold();
    match command.action {
        CalendarAction::Add { name } => {
            let calendar = repo.add_calendar(name).await?;
            println!("{} Created calendar: {}", "✓".style(success_style), calendar.name.bold());
            println!("  {} {}", "→".blue(), calendar.id.to_string().yellow());
        }
        CalendarAction::List => {
            let calendars = repo.find_calendars().await?;
            display_calendars(&calendars);
        }
        CalendarAction::Delete { calendar } => {
            let calendar = find_calendar(repo, &calendar).await?;
            repo.delete_calendar(calendar.id).await?;
            println!("{} Deleted calendar: {}", "✓".style(success_style), calendar.name.bold());
        }
    }
    Ok(())
}
