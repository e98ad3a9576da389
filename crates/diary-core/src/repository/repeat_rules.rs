use crate::error::CoreError;
use crate::models::RepeatRule;
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Sqlite, Transaction};
use uuid::Uuid;

#[async_trait]
impl super::RepeatRuleRepository for SqliteRepository {
    async fn find_rule_by_schedule(&self, schedule_id: Uuid) -> Result<Option<RepeatRule>, CoreError> {
        let rule = sqlx::query_as("SELECT * FROM repeat_rules WHERE schedule_id = $1")
            .bind(schedule_id)
            .fetch_optional(self.pool())
            .await?;
        Ok(rule)
    }

    async fn find_rules_active_from(&self, date: NaiveDate) -> Result<Vec<RepeatRule>, CoreError> {
        let rules = sqlx::query_as("SELECT * FROM repeat_rules WHERE end_date >= $1 ORDER BY end_date, id")
            .bind(date)
            .fetch_all(self.pool())
            .await?;
        Ok(rules)
    }

    async fn save_rule(&self, rule: &RepeatRule) -> Result<(), CoreError> {
        let mut tx = self.pool().begin().await?;

        let schedule: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM schedules WHERE id = $1")
            .bind(rule.schedule_id)
            .fetch_optional(&mut *tx)
            .await?;
        if schedule.is_none() {
            return Err(CoreError::ScheduleNotFound(rule.schedule_id));
        }

        sqlx::query("DELETE FROM repeat_rules WHERE schedule_id = $1 AND id != $2")
            .bind(rule.schedule_id)
            .bind(rule.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"INSERT INTO repeat_rules (id, schedule_id, frequency, end_date, anchor_day, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                frequency = excluded.frequency,
                end_date = excluded.end_date,
                anchor_day = excluded.anchor_day,
                updated_at = excluded.updated_at,
                version = repeat_rules.version + 1
            "#,
        )
        .bind(rule.id)
        .bind(rule.schedule_id)
        .bind(rule.frequency)
        .bind(rule.end_date)
        .bind(rule.anchor_day)
        .bind(rule.version)
        .bind(rule.created_at)
        .bind(rule.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn delete_rule(&self, id: Uuid) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM repeat_rules WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::InvalidInput(format!("repeat rule {} not found", id)));
        }
        Ok(())
    }
}

impl SqliteRepository {
    pub(crate) async fn insert_rule_in_transaction<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        rule: &RepeatRule,
    ) -> Result<(), CoreError> {
        sqlx::query(
            r#"INSERT INTO repeat_rules (id, schedule_id, frequency, end_date, anchor_day, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(rule.id)
        .bind(rule.schedule_id)
        .bind(rule.frequency)
        .bind(rule.end_date)
        .bind(rule.anchor_day)
        .bind(rule.version)
        .bind(rule.created_at)
        .bind(rule.updated_at)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    pub(crate) async fn update_rule_in_transaction<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        rule: &RepeatRule,
        expected_version: i64,
    ) -> Result<bool, CoreError> {
        let result = sqlx::query(
            r#"UPDATE repeat_rules
            SET frequency = $1, end_date = $2, anchor_day = $3, updated_at = $4, version = version + 1
            WHERE id = $5 AND version = $6
            "#,
        )
        .bind(rule.frequency)
        .bind(rule.end_date)
        .bind(rule.anchor_day)
        .bind(rule.updated_at)
        .bind(rule.id)
        .bind(expected_version)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub(crate) async fn delete_rule_in_transaction<'a>(
        tx: &mut Transaction<'a, Sqlite>,
        id: Uuid,
        expected_version: i64,
    ) -> Result<bool, CoreError> {
        let result = sqlx::query("DELETE FROM repeat_rules WHERE id = $1 AND version = $2")
            .bind(id)
            .bind(expected_version)
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
