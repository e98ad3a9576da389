use anyhow::{anyhow, Result};
use diary_core::models::Calendar;
use diary_core::repository::Repository;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;

/// Finds a calendar by ID or name. With no argument, falls back to the
/// configured default calendar and creates it if it does not exist yet.
pub async fn resolve_calendar(repo: &impl Repository, calendar: Option<&str>, config: &Config) -> Result<Calendar> {
    if let Some(arg) = calendar {
        return find_calendar(repo, arg).await;
    }

    if let Some(existing) = repo.find_calendar_by_name(&config.default_calendar).await? {
        return Ok(existing);
    }
    let created = repo.add_calendar(config.default_calendar.clone()).await?;
    info!(name = %created.name, "created default calendar");
    Ok(created)
}

pub async fn find_calendar(repo: &impl Repository, arg: &str) -> Result<Calendar> {
    if let Ok(id) = Uuid::parse_str(arg) {
        if let Some(calendar) = repo.find_calendar_by_id(id).await? {
            return Ok(calendar);
        }
    }
    repo.find_calendar_by_name(arg)
        .await?
        .ok_or_else(|| anyhow!("Calendar '{}' not found", arg))
}

pub fn parse_schedule_id(arg: &str) -> Result<Uuid> {
    Uuid::parse_str(arg.trim()).map_err(|_| anyhow!("'{}' is not a schedule ID; use 'diary list --day' to see IDs", arg))
}
