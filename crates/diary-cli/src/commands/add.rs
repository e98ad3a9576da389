use anyhow::Result;
use chrono::Duration;
use diary_core::models::{NewScheduleData, RepeatSpec};
use diary_core::repository::Repository;
use diary_core::service::ScheduleService;
use owo_colors::{OwoColorize, Style};

use crate::cli::AddCommand;
use crate::config::Config;
use crate::parser::{parse_date, parse_datetime, parse_datetime_on};
use crate::util::resolve_calendar;

pub async fn add_schedule<R: Repository>(service: &ScheduleService<R>, command: AddCommand, config: &Config) -> Result<()> {
    let calendar = resolve_calendar(service.repository(), command.calendar.as_deref(), config).await?;

    let start_at = parse_datetime(&command.start)?;
    let end_at = match &command.end {
        Some(end) => parse_datetime_on(end, start_at.date())?,
        None => start_at + Duration::hours(1),
    };
    let repeat = match (command.repeat, &command.until) {
        (Some(frequency), Some(until)) => Some(RepeatSpec {
            frequency,
            end_date: parse_date(until)?,
        }),
        _ => None,
    };

    let id = service
        .create_schedule(NewScheduleData {
            calendar_id: calendar.id,
            title: command.title.clone(),
            content: command.content,
            start_at,
            end_at,
            location: command.location,
            color: command.color,
            repeat,
        })
        .await?;

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();
    match repeat {
        Some(spec) => println!(
            "{} Created {} schedule: {}",
            "✓".style(success_style),
            spec.frequency,
            command.title.bright_white().bold()
        ),
        None => println!("{} Created schedule: {}", "✓".style(success_style), command.title.bright_white().bold()),
    }
    println!("  {} ID: {}", "→".style(info_style), id.to_string().yellow());
    println!("  {} Calendar: {}", "→".style(info_style), calendar.name);
    Ok(())
}
