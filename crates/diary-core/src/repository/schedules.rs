use crate::error::CoreError;
use crate::models::{Frequency, RepeatRule, Schedule, Series};
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{FromRow, Sqlite, Transaction};
use uuid::Uuid;

/// Schedule columns plus the (optional) rule columns of a LEFT JOIN.
const SERIES_SELECT: &str = r#"SELECT s.*,
    r.id AS rule_id,
    r.frequency AS rule_frequency,
    r.end_date AS rule_end_date,
    r.anchor_day AS rule_anchor_day,
    r.version AS rule_version,
    r.created_at AS rule_created_at,
    r.updated_at AS rule_updated_at
FROM schedules s
LEFT JOIN repeat_rules r ON r.schedule_id = s.id"#;

#[derive(Debug, FromRow)]
pub(crate) struct SeriesRow {
    #[sqlx(flatten)]
    schedule: Schedule,
    rule_id: Option<Uuid>,
    rule_frequency: Option<Frequency>,
    rule_end_date: Option<NaiveDate>,
    rule_anchor_day: Option<u32>,
    rule_version: Option<i64>,
    rule_created_at: Option<NaiveDateTime>,
    rule_updated_at: Option<NaiveDateTime>,
}

impl From<SeriesRow> for Series {
    fn from(row: SeriesRow) -> Self {
        let rule = match (
            row.rule_id,
            row.rule_frequency,
            row.rule_end_date,
            row.rule_anchor_day,
            row.rule_version,
            row.rule_created_at,
            row.rule_updated_at,
        ) {
            (Some(id), Some(frequency), Some(end_date), Some(anchor_day), Some(version), Some(created_at), Some(updated_at)) => {
                Some(RepeatRule {
                    id,
                    schedule_id: row.schedule.id,
                    frequency,
                    end_date,
                    anchor_day,
                    version,
                    created_at,
                    updated_at,
                })
            }
            _ => None,
        };
        Series {
            schedule: row.schedule,
            rule,
        }
    }
}

#[async_trait]
impl super::ScheduleRepository for SqliteRepository {
    async fn find_schedule_by_id(&self, id: Uuid) -> Result<Option<Schedule>, CoreError> {
        let schedule = sqlx::query_as("SELECT * FROM schedules WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(schedule)
    }

    async fn find_singletons_in_range(&self, calendar_id: Uuid, from: NaiveDate, to: NaiveDate) -> Result<Vec<Schedule>, CoreError> {
        let schedules = sqlx::query_as(
            r#"SELECT s.* FROM schedules s
            WHERE s.calendar_id = $1
              AND date(s.start_at) BETWEEN $2 AND $3
              AND NOT EXISTS (SELECT 1 FROM repeat_rules r WHERE r.schedule_id = s.id)
            ORDER BY s.start_at, s.id
            "#,
        )
        .bind(calendar_id)
        .bind(from)
        .bind(to)
        .fetch_all(self.pool())
        .await?;
        Ok(schedules)
    }

    async fn find_recurring_bases(&self, calendar_id: Uuid, from: NaiveDate, to: NaiveDate) -> Result<Vec<Series>, CoreError> {
        let rows: Vec<SeriesRow> = sqlx::query_as(&format!(
            r#"{SERIES_SELECT}
            WHERE s.calendar_id = $1
              AND r.id IS NOT NULL
              AND date(s.start_at) <= $2
              AND r.end_date >= $3
            ORDER BY s.start_at, s.id
            "#
        ))
        .bind(calendar_id)
        .bind(to)
        .bind(from)
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(Series::from).collect())
    }

    async fn find_series(&self, id: Uuid) -> Result<Option<Series>, CoreError> {
        let row: Option<SeriesRow> = sqlx::query_as(&format!("{SERIES_SELECT} WHERE s.id = $1"))
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(Series::from))
    }

    async fn insert_schedule(&self, schedule: &Schedule) -> Result<(), CoreError> {
        let mut tx = self.pool().begin().await?;
        Self::insert_schedule_in_transaction(&mut tx, schedule).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn delete_schedule(&self, id: Uuid) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ScheduleNotFound(id));
        }
        Ok(())
    }
}

impl SqliteRepository {
    pub(crate) async fn insert_schedule_in_transaction<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        schedule: &Schedule,
    ) -> Result<(), CoreError> {
        let calendar: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM calendars WHERE id = $1")
            .bind(schedule.calendar_id)
            .fetch_optional(&mut **tx)
            .await?;
        if calendar.is_none() {
            return Err(CoreError::CalendarNotFound(schedule.calendar_id));
        }

        sqlx::query(
            r#"INSERT INTO schedules (id, calendar_id, title, content, start_at, end_at, location, color, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(schedule.id)
        .bind(schedule.calendar_id)
        .bind(&schedule.title)
        .bind(&schedule.content)
        .bind(schedule.start_at)
        .bind(schedule.end_at)
        .bind(&schedule.location)
        .bind(schedule.color)
        .bind(schedule.version)
        .bind(schedule.created_at)
        .bind(schedule.updated_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Writes every mutable column of `schedule` if the stored row is still
    /// at `expected_version`. Returns whether a row was written.
    pub(crate) async fn update_schedule_in_transaction<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        schedule: &Schedule,
        expected_version: i64,
    ) -> Result<bool, CoreError> {
        let result = sqlx::query(
            r#"UPDATE schedules
            SET title = $1, content = $2, start_at = $3, end_at = $4, location = $5, color = $6,
                updated_at = $7, version = version + 1
            WHERE id = $8 AND version = $9
            "#,
        )
        .bind(&schedule.title)
        .bind(&schedule.content)
        .bind(schedule.start_at)
        .bind(schedule.end_at)
        .bind(&schedule.location)
        .bind(schedule.color)
        .bind(schedule.updated_at)
        .bind(schedule.id)
        .bind(expected_version)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Bumps the version without changing any field, so a plan that copied
    /// this row fails if the row moved on.
    pub(crate) async fn touch_schedule_in_transaction<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        id: Uuid,
        expected_version: i64,
    ) -> Result<bool, CoreError> {
        let result = sqlx::query("UPDATE schedules SET version = version + 1 WHERE id = $1 AND version = $2")
            .bind(id)
            .bind(expected_version)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    pub(crate) async fn delete_schedule_in_transaction<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        id: Uuid,
        expected_version: i64,
    ) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM schedules WHERE id = $1 AND version = $2")
            .bind(id)
            .bind(expected_version)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
