use anyhow::Result;
use diary_core::models::EditScope;
use diary_core::repository::Repository;
use diary_core::service::ScheduleService;
use owo_colors::{OwoColorize, Style};

use crate::cli::DeleteCommand;
use crate::parser::parse_date;
use crate::util::parse_schedule_id;

pub async fn delete_schedule<R: Repository>(service: &ScheduleService<R>, command: DeleteCommand) -> Result<()> {
    let id = parse_schedule_id(&command.id)?;
    let on = command.on.as_deref().map(parse_date).transpose()?;

    service.delete_schedule(id, command.scope, on).await?;

    let what = match (command.scope, on) {
        (EditScope::OnlyThis, Some(day)) => format!("occurrence on {}", day),
        (EditScope::ThisAndAfter, Some(day)) => format!("occurrences from {}", day),
        _ => "schedule".to_string(),
    };
    println!("{} Deleted {}", "✓".style(Style::new().green().bold()), what);
    Ok(())
}
