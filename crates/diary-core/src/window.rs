//! Window queries: period validation and the merge of singletons with
//! expanded repeat instances.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::CoreError;
use crate::models::{Granularity, Occurrence, OccurrenceDto, Period, Schedule, Series};
use crate::recurrence::{days_in_month, OccurrenceExpander};

pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

/// Validates a period and returns its inclusive `(first, last)` dates.
pub fn resolve_period(period: Period) -> Result<(NaiveDate, NaiveDate), CoreError> {
    match period {
        Period::Day { year, month, day } => {
            check_year(year)?;
            check_month(month)?;
            let last = days_in_month(year, month);
            if !(1..=last).contains(&day) {
                return Err(CoreError::InvalidPeriod(format!(
                    "day {} is not valid for {:04}-{:02} (1..={})",
                    day, year, month, last
                )));
            }
            let date = ymd(year, month, day)?;
            Ok((date, date))
        }
        Period::Month { year, month } => {
            check_year(year)?;
            check_month(month)?;
            Ok((ymd(year, month, 1)?, ymd(year, month, days_in_month(year, month))?))
        }
        Period::Year { year } => {
            check_year(year)?;
            Ok((ymd(year, 1, 1)?, ymd(year, 12, 31)?))
        }
    }
}

fn check_year(year: i32) -> Result<(), CoreError> {
    if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
        return Err(CoreError::InvalidPeriod(format!(
            "year {} is outside {}..={}",
            year, MIN_YEAR, MAX_YEAR
        )));
    }
    Ok(())
}

fn check_month(month: u32) -> Result<(), CoreError> {
    if !(1..=12).contains(&month) {
        return Err(CoreError::InvalidPeriod(format!("month {} is outside 1..=12", month)));
    }
    Ok(())
}

fn ymd(year: i32, month: u32, day: u32) -> Result<NaiveDate, CoreError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| CoreError::InvalidPeriod(format!("{:04}-{:02}-{:02} is not a date", year, month, day)))
}

/// Merges singletons and the expansion of every recurring base into one
/// sequence ordered by start, then base identity, then input order.
///
/// Singletons whose start date falls outside the window are dropped, so
/// callers may over-fetch.
pub fn merge_occurrences(
    singletons: &[Schedule],
    bases: &[Series],
    window_start: NaiveDate,
    window_end: NaiveDate,
    max_iterations: usize,
) -> Result<Vec<Occurrence>, CoreError> {
    if window_start > window_end {
        return Err(CoreError::InvalidRange {
            start: window_start,
            end: window_end,
        });
    }

    let mut occurrences: Vec<Occurrence> = singletons
        .iter()
        .filter(|s| (window_start..=window_end).contains(&s.start_date()))
        .map(|s| Occurrence::from_schedule(s, s.start_at, s.end_at, false))
        .collect();

    for series in bases {
        let Some(rule) = &series.rule else {
            continue;
        };
        let expander = OccurrenceExpander::for_rule(&series.schedule, rule, window_start, window_end)?
            .with_iteration_limit(max_iterations);
        for span in expander {
            let (start, end) = span?;
            occurrences.push(Occurrence::from_schedule(&series.schedule, start, end, true));
        }
    }

    occurrences.sort_by(|a, b| a.start_at.cmp(&b.start_at).then_with(|| a.schedule_id.cmp(&b.schedule_id)));
    debug!(
        %window_start,
        %window_end,
        singletons = singletons.len(),
        bases = bases.len(),
        count = occurrences.len(),
        "merged window"
    );
    Ok(occurrences)
}

/// Whether any occurrence of `series` starts inside the window. Stops at the
/// first hit.
pub fn occurs_within(series: &Series, window_start: NaiveDate, window_end: NaiveDate) -> Result<bool, CoreError> {
    match &series.rule {
        None => Ok((window_start..=window_end).contains(&series.schedule.start_date())),
        Some(rule) => match OccurrenceExpander::for_rule(&series.schedule, rule, window_start, window_end)?.next() {
            Some(span) => span.map(|_| true),
            None => Ok(false),
        },
    }
}

pub fn to_dtos(occurrences: Vec<Occurrence>, granularity: Granularity) -> Vec<OccurrenceDto> {
    occurrences
        .into_iter()
        .map(|occurrence| OccurrenceDto::from_occurrence(occurrence, granularity))
        .collect()
}
