use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Invalid range: window starts at {start} but ends at {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Invalid repeat rule: {0}")]
    InvalidRepeatRule(String),

    #[error("Calendar not found: {0}")]
    CalendarNotFound(Uuid),

    #[error("Schedule not found: {0}")]
    ScheduleNotFound(Uuid),

    #[error("Schedule {0} does not repeat; only scope 'all' applies to it")]
    NotARecurringSchedule(Uuid),

    #[error("{date} is not an occurrence of schedule {schedule_id}")]
    InvalidOccurrence { schedule_id: Uuid, date: NaiveDate },

    #[error("Recurrence expansion exceeded {0} iterations")]
    RecurrenceOverflow(usize),

    #[error("Schedule {0} was modified concurrently")]
    ConcurrentModification(Uuid),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl CoreError {
    /// Conflicts that a fresh read-plan-apply cycle may resolve.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::ConcurrentModification(_))
    }
}
