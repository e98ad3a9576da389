use chrono::{Datelike, Days, Duration, NaiveDate, NaiveDateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{Frequency, RepeatRule, RepeatSpec, Schedule};

/// Ceiling on expansion steps taken for one series and one window.
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Number of days in `month` of `year`.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        // December of the last representable year
        .unwrap_or(31)
}

/// Builds `year-month-day`, pulling `day` back to the month's last day when the
/// month is shorter.
pub fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day.min(days_in_month(year, month)))
}

/// The arithmetic progression of occurrence dates of one series.
///
/// Occurrence `k` is always computed from the anchor, never from occurrence
/// `k - 1`, so month and year stepping cannot drift: a series anchored on
/// Jan 31 with `anchor_day` 31 yields Feb 29 (or 28), Mar 31, Apr 30, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progression {
    pub anchor: NaiveDate,
    pub frequency: Frequency,
    pub anchor_day: u32,
    /// Inclusive upper bound
    pub end_date: NaiveDate,
}

impl Progression {
    pub fn new(anchor: NaiveDate, frequency: Frequency, end_date: NaiveDate) -> Self {
        Self {
            anchor,
            frequency,
            anchor_day: anchor.day(),
            end_date,
        }
    }

    pub fn for_rule(schedule: &Schedule, rule: &RepeatRule) -> Self {
        Self {
            anchor: schedule.start_date(),
            frequency: rule.frequency,
            anchor_day: rule.anchor_day,
            end_date: rule.end_date,
        }
    }

    /// Date of occurrence `k` (zero based) ignoring the end date. `None` once
    /// the date leaves chrono's range.
    pub fn nth(&self, k: u64) -> Option<NaiveDate> {
        if k == 0 {
            return Some(self.anchor);
        }
        match self.frequency {
            Frequency::Daily => self.anchor.checked_add_days(Days::new(k)),
            Frequency::Weekly => self.anchor.checked_add_days(Days::new(k.checked_mul(7)?)),
            Frequency::Monthly => {
                let months = i64::from(self.anchor.year()) * 12 + i64::from(self.anchor.month0()) + i64::try_from(k).ok()?;
                let year = i32::try_from(months.div_euclid(12)).ok()?;
                let month = u32::try_from(months.rem_euclid(12)).ok()? + 1;
                clamped_date(year, month, self.anchor_day)
            }
            Frequency::Yearly => {
                let year = i32::try_from(i64::from(self.anchor.year()) + i64::try_from(k).ok()?).ok()?;
                clamped_date(year, self.anchor.month(), self.anchor_day)
            }
        }
    }

    /// Index to start scanning from when looking for `date`: every occurrence
    /// before it is strictly earlier than `date`.
    pub fn lower_bound(&self, date: NaiveDate) -> u64 {
        if date <= self.anchor {
            return 0;
        }
        let bound = match self.frequency {
            Frequency::Daily => (date - self.anchor).num_days(),
            Frequency::Weekly => (date - self.anchor).num_days() / 7,
            Frequency::Monthly => {
                i64::from(date.year() - self.anchor.year()) * 12 + i64::from(date.month()) - i64::from(self.anchor.month())
            }
            Frequency::Yearly => i64::from(date.year() - self.anchor.year()),
        };
        u64::try_from(bound).unwrap_or(0)
    }

    /// Index of `date` in the progression if it is an occurrence within the end date.
    pub fn index_of(&self, date: NaiveDate) -> Option<u64> {
        if date < self.anchor || date > self.end_date {
            return None;
        }
        let k = self.lower_bound(date);
        (self.nth(k) == Some(date)).then_some(k)
    }

    /// Date of occurrence `k` if it is within the end date.
    pub fn occurrence(&self, k: u64) -> Option<NaiveDate> {
        self.nth(k).filter(|date| *date <= self.end_date)
    }
}

impl RepeatRule {
    /// Builds the rule for `schedule`, rejecting end dates before the anchor date.
    pub fn new(schedule: &Schedule, spec: RepeatSpec) -> Result<Self, CoreError> {
        Self::with_anchor_day(schedule, spec, schedule.start_at.day())
    }

    /// Like [`RepeatRule::new`] but keeps the preferred day-of-month of the
    /// progression this rule continues.
    pub fn with_anchor_day(schedule: &Schedule, spec: RepeatSpec, anchor_day: u32) -> Result<Self, CoreError> {
        validate_repeat_spec(schedule.start_date(), &spec)?;
        if !(1..=31).contains(&anchor_day) {
            return Err(CoreError::InvalidRepeatRule(format!("anchor day {} is not a day of month", anchor_day)));
        }
        let now = Utc::now().naive_utc();
        Ok(Self {
            id: Uuid::now_v7(),
            schedule_id: schedule.id,
            frequency: spec.frequency,
            end_date: spec.end_date,
            anchor_day,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn spec(&self) -> RepeatSpec {
        RepeatSpec {
            frequency: self.frequency,
            end_date: self.end_date,
        }
    }
}

/// End date must not precede the start date (date component only).
pub fn validate_repeat_spec(start_date: NaiveDate, spec: &RepeatSpec) -> Result<(), CoreError> {
    if spec.end_date < start_date {
        return Err(CoreError::InvalidRepeatRule(format!(
            "end date {} is before start date {}",
            spec.end_date, start_date
        )));
    }
    Ok(())
}

/// Lazily yields `(start, end)` spans of a series that start inside a window.
///
/// The sequence is finite and restartable (clone it before consuming). It
/// yields `Err(RecurrenceOverflow)` once and then stops if the number of steps
/// exceeds the iteration limit.
#[derive(Debug, Clone)]
pub struct OccurrenceExpander {
    progression: Progression,
    start_time: chrono::NaiveTime,
    duration: Duration,
    window_start: NaiveDate,
    /// min(window end, rule end)
    limit: NaiveDate,
    index: u64,
    steps: usize,
    max_iterations: usize,
    done: bool,
}

impl OccurrenceExpander {
    pub fn new(
        base_start: NaiveDateTime,
        base_end: NaiveDateTime,
        frequency: Frequency,
        rule_end_date: NaiveDate,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Result<Self, CoreError> {
        let progression = Progression::new(base_start.date(), frequency, rule_end_date);
        Self::from_progression(progression, base_start, base_end, window_start, window_end)
    }

    pub fn for_rule(schedule: &Schedule, rule: &RepeatRule, window_start: NaiveDate, window_end: NaiveDate) -> Result<Self, CoreError> {
        Self::from_progression(
            Progression::for_rule(schedule, rule),
            schedule.start_at,
            schedule.end_at,
            window_start,
            window_end,
        )
    }

    fn from_progression(
        progression: Progression,
        base_start: NaiveDateTime,
        base_end: NaiveDateTime,
        window_start: NaiveDate,
        window_end: NaiveDate,
    ) -> Result<Self, CoreError> {
        if window_start > window_end {
            return Err(CoreError::InvalidRange {
                start: window_start,
                end: window_end,
            });
        }
        Ok(Self {
            progression,
            start_time: base_start.time(),
            duration: base_end - base_start,
            window_start,
            limit: window_end.min(progression.end_date),
            index: progression.lower_bound(window_start),
            steps: 0,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            done: false,
        })
    }

    pub fn with_iteration_limit(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Collects every span, failing on the first error.
    pub fn collect_spans(self) -> Result<Vec<(NaiveDateTime, NaiveDateTime)>, CoreError> {
        self.collect()
    }
}

impl Iterator for OccurrenceExpander {
    type Item = Result<(NaiveDateTime, NaiveDateTime), CoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.steps += 1;
            if self.steps > self.max_iterations {
                self.done = true;
                return Some(Err(CoreError::RecurrenceOverflow(self.max_iterations)));
            }

            let Some(date) = self.progression.nth(self.index) else {
                self.done = true;
                break;
            };
            if date > self.limit {
                self.done = true;
                break;
            }
            self.index += 1;

            if date >= self.window_start {
                let start = date.and_time(self.start_time);
                return Some(Ok((start, start + self.duration)));
            }
        }
        None
    }
}

/// Expands a series over a window in one call.
pub fn expand(
    base_start: NaiveDateTime,
    base_end: NaiveDateTime,
    frequency: Frequency,
    rule_end_date: NaiveDate,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Result<Vec<(NaiveDateTime, NaiveDateTime)>, CoreError> {
    let spans = OccurrenceExpander::new(base_start, base_end, frequency, rule_end_date, window_start, window_end)?.collect_spans()?;
    debug!(
        %frequency,
        %window_start,
        %window_end,
        count = spans.len(),
        "expanded series"
    );
    Ok(spans)
}
