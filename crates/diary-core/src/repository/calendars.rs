use crate::error::CoreError;
use crate::models::Calendar;
use crate::repository::SqliteRepository;
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

#[async_trait]
impl super::CalendarRepository for SqliteRepository {
    async fn add_calendar(&self, name: String) -> Result<Calendar, CoreError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::InvalidInput("calendar name cannot be empty".to_string()));
        }

        let calendar = Calendar {
            id: Uuid::now_v7(),
            name,
            created_at: Utc::now().naive_utc(),
        };
        sqlx::query("INSERT INTO calendars (id, name, created_at) VALUES ($1, $2, $3)")
            .bind(calendar.id)
            .bind(&calendar.name)
            .bind(calendar.created_at)
            .execute(self.pool())
            .await?;

        Ok(calendar)
    }

    async fn find_calendar_by_id(&self, id: Uuid) -> Result<Option<Calendar>, CoreError> {
        let calendar = sqlx::query_as("SELECT * FROM calendars WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(calendar)
    }

    async fn find_calendar_by_name(&self, name: &str) -> Result<Option<Calendar>, CoreError> {
        let calendar = sqlx::query_as("SELECT * FROM calendars WHERE name = $1 ORDER BY created_at LIMIT 1")
            .bind(name)
            .fetch_optional(self.pool())
            .await?;
        Ok(calendar)
    }

    async fn find_calendars(&self) -> Result<Vec<Calendar>, CoreError> {
        let calendars = sqlx::query_as("SELECT id, name, created_at FROM calendars ORDER BY created_at, id")
            .fetch_all(self.pool())
            .await?;
        Ok(calendars)
    }

    async fn delete_calendar(&self, id: Uuid) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM calendars WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::CalendarNotFound(id));
        }
        Ok(())
    }
}
