use crate::db::DbPool;
use crate::error::CoreError;
use crate::models::{Calendar, RepeatRule, Schedule, Series};
use crate::scoping::MutationPlan;
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

pub mod calendars;
pub mod mutations;
pub mod repeat_rules;
pub mod schedules;

/// Domain-specific trait for calendar operations
#[async_trait]
pub trait CalendarRepository {
    async fn add_calendar(&self, name: String) -> Result<Calendar, CoreError>;
    async fn find_calendar_by_id(&self, id: Uuid) -> Result<Option<Calendar>, CoreError>;
    async fn find_calendar_by_name(&self, name: &str) -> Result<Option<Calendar>, CoreError>;
    async fn find_calendars(&self) -> Result<Vec<Calendar>, CoreError>;
    /// Deletes the calendar together with every schedule it owns
    async fn delete_calendar(&self, id: Uuid) -> Result<(), CoreError>;
}

/// Domain-specific trait for base schedule rows
#[async_trait]
pub trait ScheduleRepository {
    async fn find_schedule_by_id(&self, id: Uuid) -> Result<Option<Schedule>, CoreError>;
    /// Schedules without a rule whose start date lies in `from..=to`
    async fn find_singletons_in_range(&self, calendar_id: Uuid, from: NaiveDate, to: NaiveDate) -> Result<Vec<Schedule>, CoreError>;
    /// Recurring bases anchored on or before `to` whose rule is still active on `from`
    async fn find_recurring_bases(&self, calendar_id: Uuid, from: NaiveDate, to: NaiveDate) -> Result<Vec<Series>, CoreError>;
    /// A schedule together with its rule
    async fn find_series(&self, id: Uuid) -> Result<Option<Series>, CoreError>;
    async fn insert_schedule(&self, schedule: &Schedule) -> Result<(), CoreError>;
    async fn delete_schedule(&self, id: Uuid) -> Result<(), CoreError>;
}

/// Domain-specific trait for repeat rule rows
#[async_trait]
pub trait RepeatRuleRepository {
    async fn find_rule_by_schedule(&self, schedule_id: Uuid) -> Result<Option<RepeatRule>, CoreError>;
    /// Rules whose end date is on or after `date`
    async fn find_rules_active_from(&self, date: NaiveDate) -> Result<Vec<RepeatRule>, CoreError>;
    /// Inserts the rule, or replaces the one its schedule already owns
    async fn save_rule(&self, rule: &RepeatRule) -> Result<(), CoreError>;
    async fn delete_rule(&self, id: Uuid) -> Result<(), CoreError>;
}

/// Applies scoped mutation plans atomically
#[async_trait]
pub trait MutationRepository {
    /// Runs every op of `plan` in one transaction. Fails with
    /// `ConcurrentModification` and writes nothing if any versioned row has
    /// changed since the plan was computed.
    async fn apply_plan(&self, plan: &MutationPlan) -> Result<(), CoreError>;
}

/// Main repository trait that composes all domain traits
pub trait Repository: CalendarRepository + ScheduleRepository + RepeatRuleRepository + MutationRepository + Send + Sync {}

/// SQLite implementation of the repository pattern
pub struct SqliteRepository {
    pool: DbPool,
}

impl SqliteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub(crate) fn pool(&self) -> &DbPool {
        &self.pool
    }
}

impl Repository for SqliteRepository {}
