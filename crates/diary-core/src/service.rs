//! Public schedule operations bound to a [`Repository`].

use chrono::NaiveDate;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{
    EditScope, NewScheduleData, Occurrence, OccurrenceDto, Period, ScheduleChanges, ScheduleConfig, Series,
};
use crate::repository::Repository;
use crate::scoping::{self, MutationPlan, MAX_CONTENT_CHARS, MAX_TITLE_CHARS};
use crate::window;

pub struct ScheduleService<R> {
    repo: R,
    config: ScheduleConfig,
}

impl<R: Repository> ScheduleService<R> {
    pub fn new(repo: R, config: ScheduleConfig) -> Self {
        Self { repo, config }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    /// Occurrences of every schedule in `calendar_id` starting inside `period`,
    /// ordered by start.
    #[instrument(skip(self))]
    pub async fn get_occurrences(&self, calendar_id: Uuid, period: Period) -> Result<Vec<OccurrenceDto>, CoreError> {
        let (from, to) = window::resolve_period(period)?;
        let occurrences = self.occurrences_between(calendar_id, from, to).await?;
        Ok(window::to_dtos(occurrences, period.granularity()))
    }

    /// Like [`Self::get_occurrences`] over an arbitrary inclusive date range,
    /// without the presentation mapping.
    pub async fn occurrences_between(&self, calendar_id: Uuid, from: NaiveDate, to: NaiveDate) -> Result<Vec<Occurrence>, CoreError> {
        self.check_window(calendar_id, from, to).await?;
        let singletons = self.repo.find_singletons_in_range(calendar_id, from, to).await?;
        let bases = self.repo.find_recurring_bases(calendar_id, from, to).await?;
        window::merge_occurrences(&singletons, &bases, from, to, self.config.max_expansion_iterations)
    }

    /// Whether anything in `calendar_id` starts between `from` and `to`.
    /// Expansion stops at the first occurrence found.
    pub async fn has_occurrences(&self, calendar_id: Uuid, from: NaiveDate, to: NaiveDate) -> Result<bool, CoreError> {
        self.check_window(calendar_id, from, to).await?;
        if !self.repo.find_singletons_in_range(calendar_id, from, to).await?.is_empty() {
            return Ok(true);
        }
        for series in self.repo.find_recurring_bases(calendar_id, from, to).await? {
            if window::occurs_within(&series, from, to)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn check_window(&self, calendar_id: Uuid, from: NaiveDate, to: NaiveDate) -> Result<(), CoreError> {
        if from > to {
            return Err(CoreError::InvalidRange { start: from, end: to });
        }
        self.repo
            .find_calendar_by_id(calendar_id)
            .await?
            .ok_or(CoreError::CalendarNotFound(calendar_id))?;
        Ok(())
    }

    /// Creates a base schedule (plus rule) and returns its identity.
    #[instrument(skip(self, data), fields(title = %data.title))]
    pub async fn create_schedule(&self, data: NewScheduleData) -> Result<Uuid, CoreError> {
        let plan = scoping::plan_create(data)?;
        self.repo.apply_plan(&plan).await?;
        info!(schedule_id = %plan.series_id, "created schedule");
        Ok(plan.series_id)
    }

    #[instrument(skip(self, changes))]
    pub async fn update_schedule(
        &self,
        id: Uuid,
        scope: EditScope,
        target_date: Option<NaiveDate>,
        changes: ScheduleChanges,
    ) -> Result<(), CoreError> {
        validate_changes(&changes)?;
        let plan = self
            .mutate(id, |series| scoping::plan_edit(series, scope, target_date, &changes))
            .await?;
        info!(ops = plan.ops.len(), "updated schedule");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_schedule(&self, id: Uuid, scope: EditScope, target_date: Option<NaiveDate>) -> Result<(), CoreError> {
        let plan = self
            .mutate(id, |series| scoping::plan_delete(series, scope, target_date))
            .await?;
        info!(ops = plan.ops.len(), "deleted schedule");
        Ok(())
    }

    /// Read, plan, apply. Re-reads and re-plans after a version conflict
    /// until the retry budget is spent.
    async fn mutate<F>(&self, id: Uuid, plan: F) -> Result<MutationPlan, CoreError>
    where
        F: Fn(&Series) -> Result<MutationPlan, CoreError>,
    {
        let mut retries = 0;
        loop {
            let series = self.repo.find_series(id).await?.ok_or(CoreError::ScheduleNotFound(id))?;
            let planned = plan(&series)?;
            match self.repo.apply_plan(&planned).await {
                Ok(()) => return Ok(planned),
                Err(err) if err.is_retryable() && retries < self.config.max_mutation_retries => {
                    retries += 1;
                    warn!(schedule_id = %id, retries, "version conflict, re-planning mutation");
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Shape checks on edited fields that need no stored state.
fn validate_changes(changes: &ScheduleChanges) -> Result<(), CoreError> {
    if let Some(title) = &changes.title {
        if title.trim().is_empty() || title.chars().count() > MAX_TITLE_CHARS {
            return Err(CoreError::InvalidInput(format!(
                "title must be between 1 and {} characters",
                MAX_TITLE_CHARS
            )));
        }
    }
    if let Some(Some(content)) = &changes.content {
        if content.chars().count() > MAX_CONTENT_CHARS {
            return Err(CoreError::InvalidInput(format!(
                "content must be at most {} characters",
                MAX_CONTENT_CHARS
            )));
        }
    }
    if let (Some(start), Some(end)) = (changes.start_at, changes.end_at) {
        if end < start {
            return Err(CoreError::InvalidInput(format!("end {} is before start {}", end, start)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_validate_changes() {
        assert!(validate_changes(&ScheduleChanges::default()).is_ok());

        let blank = ScheduleChanges {
            title: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(matches!(validate_changes(&blank), Err(CoreError::InvalidInput(_))));

        let long_content = ScheduleChanges {
            content: Some(Some("x".repeat(MAX_CONTENT_CHARS + 1))),
            ..Default::default()
        };
        assert!(validate_changes(&long_content).is_err());

        let cleared = ScheduleChanges {
            content: Some(None),
            ..Default::default()
        };
        assert!(validate_changes(&cleared).is_ok());

        let backwards = ScheduleChanges {
            start_at: Some(at("2024-03-01 10:00")),
            end_at: Some(at("2024-03-01 09:00")),
            ..Default::default()
        };
        assert!(validate_changes(&backwards).is_err());
    }
}
