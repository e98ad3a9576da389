use anyhow::Result;
use chrono::Datelike;
use diary_core::models::Period;
use diary_core::repository::Repository;
use diary_core::service::ScheduleService;

use crate::cli::ListCommand;
use crate::config::Config;
use crate::parser::{parse_date, parse_month};
use crate::util::resolve_calendar;
use crate::views::table::display_occurrences;

fn period_of(command: &ListCommand) -> Result<Period> {
    if let Some(day) = &command.day {
        let date = parse_date(day)?;
        return Ok(Period::Day {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        });
    }
    if let Some(month) = &command.month {
        let (year, month) = parse_month(month)?;
        return Ok(Period::Month { year, month });
    }
    match command.year {
        Some(year) => Ok(Period::Year { year }),
        None => Err(anyhow::anyhow!("One of --day, --month or --year is required")),
    }
}

pub async fn list_occurrences<R: Repository>(service: &ScheduleService<R>, command: ListCommand, config: &Config) -> Result<()> {
    let period = period_of(&command)?;
    let calendar = resolve_calendar(service.repository(), command.calendar.as_deref(), config).await?;
    let occurrences = service.get_occurrences(calendar.id, period).await?;

    if command.json {
        println!("{}", serde_json::to_string_pretty(&occurrences)?);
    } else {
        display_occurrences(&occurrences, period.granularity());
    }
    Ok(())
}
