use anyhow::{anyhow, Result};
use diary_core::models::{EditScope, RepeatSpec, ScheduleChanges};
use diary_core::repository::Repository;
use diary_core::service::ScheduleService;
use owo_colors::{OwoColorize, Style};

use crate::cli::EditCommand;
use crate::parser::{parse_date, parse_datetime, parse_datetime_on};
use crate::util::parse_schedule_id;

pub async fn edit_schedule<R: Repository>(service: &ScheduleService<R>, command: EditCommand) -> Result<()> {
    let id = parse_schedule_id(&command.id)?;
    let on = command.on.as_deref().map(parse_date).transpose()?;

    let start_at = command.start.as_deref().map(parse_datetime).transpose()?;
    let end_at = match command.end.as_deref() {
        None => None,
        Some(end) => {
            let day = start_at
                .map(|start| start.date())
                .or(on)
                .ok_or_else(|| anyhow!("--end needs a full date-time unless --start or --on is given"))?;
            Some(parse_datetime_on(end, day)?)
        }
    };

    let repeat = if command.repeat_clear {
        Some(None)
    } else {
        match (command.repeat, command.until.as_deref()) {
            (Some(frequency), Some(until)) => Some(Some(RepeatSpec {
                frequency,
                end_date: parse_date(until)?,
            })),
            _ => None,
        }
    };

    let changes = ScheduleChanges {
        title: command.title,
        content: if command.content_clear { Some(None) } else { command.content.map(Some) },
        start_at,
        end_at,
        location: if command.location_clear { Some(None) } else { command.location.map(Some) },
        color: command.color,
        repeat,
    };

    service.update_schedule(id, command.scope, on, changes).await?;

    let what = match command.scope {
        EditScope::OnlyThis => "occurrence",
        EditScope::ThisAndAfter => "occurrence and the ones after it",
        EditScope::All => "schedule",
    };
    println!("{} Updated {}", "✓".style(Style::new().green().bold()), what);
    Ok(())
}
