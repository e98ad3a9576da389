use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Calendar {
    pub id: Uuid,
    pub name: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Orange,
    Yellow,
    Green,
    #[default]
    Blue,
    Navy,
    Purple,
    Gray,
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Color::Red => "red",
            Color::Orange => "orange",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Navy => "navy",
            Color::Purple => "purple",
            Color::Gray => "gray",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid color: {0}")]
pub struct ParseColorError(String);

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "red" => Ok(Color::Red),
            "orange" => Ok(Color::Orange),
            "yellow" => Ok(Color::Yellow),
            "green" => Ok(Color::Green),
            "blue" => Ok(Color::Blue),
            "navy" => Ok(Color::Navy),
            "purple" => Ok(Color::Purple),
            "gray" | "grey" => Ok(Color::Gray),
            _ => Err(ParseColorError(s.to_string())),
        }
    }
}

/// How often a series repeats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Frequency::Daily => write!(f, "daily"),
            Frequency::Weekly => write!(f, "weekly"),
            Frequency::Monthly => write!(f, "monthly"),
            Frequency::Yearly => write!(f, "yearly"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid repeat frequency: {0}")]
pub struct ParseFrequencyError(String);

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "day" => Ok(Frequency::Daily),
            "weekly" | "week" => Ok(Frequency::Weekly),
            "monthly" | "month" => Ok(Frequency::Monthly),
            "yearly" | "year" | "annually" => Ok(Frequency::Yearly),
            _ => Err(ParseFrequencyError(s.to_string())),
        }
    }
}

/// A base schedule. Holds the canonical field values of a series and its anchor.
/// A schedule without a [`RepeatRule`] is a singleton event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Schedule {
    pub id: Uuid,
    pub calendar_id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    pub location: Option<String>,
    pub color: Color,
    /// Optimistic concurrency token, bumped on every write
    pub version: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Schedule {
    pub fn start_date(&self) -> NaiveDate {
        self.start_at.date()
    }

    pub fn duration(&self) -> Duration {
        self.end_at - self.start_at
    }
}

impl Default for Schedule {
    fn default() -> Self {
        let now = Utc::now().naive_utc();
        Self {
            id: Uuid::now_v7(),
            calendar_id: Uuid::nil(),
            title: String::new(),
            content: None,
            start_at: now,
            end_at: now,
            location: None,
            color: Color::default(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Recurrence attached 1:1 to a [`Schedule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct RepeatRule {
    pub id: Uuid,
    /// Owning schedule (unique constraint)
    pub schedule_id: Uuid,
    pub frequency: Frequency,
    /// Last date an occurrence may fall on, inclusive
    pub end_date: NaiveDate,
    /// Preferred day-of-month for monthly/yearly stepping. Equals the anchor's
    /// day unless the series was split off a clamped progression.
    pub anchor_day: u32,
    pub version: i64,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A schedule together with its rule, as read at the start of a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    pub schedule: Schedule,
    pub rule: Option<RepeatRule>,
}

impl Series {
    pub fn is_recurring(&self) -> bool {
        self.rule.is_some()
    }
}

/// Recurrence requested by a caller: frequency plus inclusive end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatSpec {
    pub frequency: Frequency,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct NewScheduleData {
    pub calendar_id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    pub location: Option<String>,
    pub color: Option<Color>,
    /// When present, a RepeatRule is attached to the new schedule
    pub repeat: Option<RepeatSpec>,
}

/// Field changes for an edit. `None` leaves a field untouched; for the
/// nullable fields `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct ScheduleChanges {
    pub title: Option<String>,
    pub content: Option<Option<String>>,
    pub start_at: Option<NaiveDateTime>,
    pub end_at: Option<NaiveDateTime>,
    pub location: Option<Option<String>>,
    pub color: Option<Color>,
    /// `Some(Some(_))` sets or replaces the recurrence, `Some(None)` removes it
    pub repeat: Option<Option<RepeatSpec>>,
}

impl ScheduleChanges {
    /// Copy of `schedule` carrying the changed fields. Identity and
    /// bookkeeping columns are left to the caller.
    pub fn apply_to(&self, schedule: &Schedule) -> Schedule {
        let mut updated = schedule.clone();
        if let Some(title) = &self.title {
            updated.title = title.clone();
        }
        if let Some(content) = &self.content {
            updated.content = content.clone();
        }
        if let Some(location) = &self.location {
            updated.location = location.clone();
        }
        if let Some(color) = self.color {
            updated.color = color;
        }
        match (self.start_at, self.end_at) {
            (Some(start), Some(end)) => {
                updated.start_at = start;
                updated.end_at = end;
            }
            (Some(start), None) => {
                let duration = schedule.duration();
                updated.start_at = start;
                updated.end_at = start + duration;
            }
            (None, Some(end)) => updated.end_at = end,
            (None, None) => {}
        }
        updated
    }

    pub fn touches_recurrence(&self) -> bool {
        self.repeat.is_some()
    }
}

/// Scope for edits and deletes on recurring schedules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditScope {
    /// Affect only the selected occurrence
    OnlyThis,
    /// Affect the selected occurrence and every later one
    ThisAndAfter,
    /// Affect the entire series
    All,
}

impl std::fmt::Display for EditScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditScope::OnlyThis => write!(f, "this"),
            EditScope::ThisAndAfter => write!(f, "after"),
            EditScope::All => write!(f, "all"),
        }
    }
}

impl FromStr for EditScope {
    type Err = ParseEditScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "this" | "only_this" | "occurrence" => Ok(EditScope::OnlyThis),
            "after" | "this_and_after" | "future" => Ok(EditScope::ThisAndAfter),
            "all" | "series" | "entire" => Ok(EditScope::All),
            _ => Err(ParseEditScopeError(s.to_string())),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid edit scope: {0}")]
pub struct ParseEditScopeError(String);

// ============================================================================
// Query Models
// ============================================================================

/// Size of a query window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Month,
    Year,
}

/// Raw, unvalidated bounds of a query window. Validation happens in
/// [`crate::window::resolve_period`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Day { year: i32, month: u32, day: u32 },
    Month { year: i32, month: u32 },
    Year { year: i32 },
}

impl Period {
    pub fn granularity(&self) -> Granularity {
        match self {
            Period::Day { .. } => Granularity::Day,
            Period::Month { .. } => Granularity::Month,
            Period::Year { .. } => Granularity::Year,
        }
    }
}

/// A derived, never persisted instance of a schedule on one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// Identity of the base schedule this instance was produced from
    pub schedule_id: Uuid,
    pub calendar_id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    pub location: Option<String>,
    pub color: Color,
    pub is_repeat_instance: bool,
}

impl Occurrence {
    pub fn from_schedule(schedule: &Schedule, start_at: NaiveDateTime, end_at: NaiveDateTime, is_repeat_instance: bool) -> Self {
        Self {
            schedule_id: schedule.id,
            calendar_id: schedule.calendar_id,
            title: schedule.title.clone(),
            content: schedule.content.clone(),
            start_at,
            end_at,
            location: schedule.location.clone(),
            color: schedule.color,
            is_repeat_instance,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.start_at.date()
    }
}

/// Occurrence as handed to the presentation layer. Day queries carry the
/// detail fields; month and year queries leave them out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OccurrenceDto {
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub color: Color,
    pub is_repeat_instance: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl OccurrenceDto {
    pub fn from_occurrence(occurrence: Occurrence, granularity: Granularity) -> Self {
        let detailed = granularity == Granularity::Day;
        Self {
            title: occurrence.title,
            start: occurrence.start_at,
            end: occurrence.end_at,
            color: occurrence.color,
            is_repeat_instance: occurrence.is_repeat_instance,
            id: detailed.then_some(occurrence.schedule_id),
            content: if detailed { occurrence.content } else { None },
            location: if detailed { occurrence.location } else { None },
        }
    }
}

/// Tunables for the schedule service - core version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Ceiling on expansion steps for a single series and window
    pub max_expansion_iterations: usize,
    /// How many times a mutation is re-planned after a version conflict
    pub max_mutation_retries: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            max_expansion_iterations: crate::recurrence::DEFAULT_MAX_ITERATIONS,
            max_mutation_retries: 3,
        }
    }
}
