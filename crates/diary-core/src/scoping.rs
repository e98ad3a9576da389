//! Scoped mutation planning.
//!
//! Every create, edit and delete is turned into a [`MutationPlan`]: an ordered
//! list of row writes against the base schedule and its repeat rule. Planning
//! is pure; the repository applies a plan inside one transaction.
//!
//! A scoped edit at occurrence `k` of a series cuts it into three segments:
//! occurrences before `k`, occurrence `k` itself, and occurrences after `k`.
//! The original rows keep the "before" segment (its rule end date is pulled
//! back to the day before `k`); the other segments become new rows. When the
//! "before" segment is empty the original rows are reused instead.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Utc};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{EditScope, NewScheduleData, RepeatRule, RepeatSpec, Schedule, ScheduleChanges, Series};
use crate::recurrence::{validate_repeat_spec, Progression};

pub const MAX_TITLE_CHARS: usize = 50;
pub const MAX_CONTENT_CHARS: usize = 3000;

/// A single row write. Updates and deletes carry the version the plan was
/// computed against; the repository rejects the plan if the row moved on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOp {
    InsertSchedule(Schedule),
    UpdateSchedule { schedule: Schedule, expected_version: i64 },
    DeleteSchedule { id: Uuid, expected_version: i64 },
    /// Bumps the version of a row whose fields the plan copies without
    /// otherwise writing it.
    TouchSchedule { id: Uuid, expected_version: i64 },
    InsertRule(RepeatRule),
    UpdateRule { rule: RepeatRule, expected_version: i64 },
    DeleteRule { id: Uuid, expected_version: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationPlan {
    /// The base schedule the plan was computed for
    pub series_id: Uuid,
    pub ops: Vec<StorageOp>,
}

impl MutationPlan {
    fn new(series_id: Uuid) -> Self {
        Self {
            series_id,
            ops: Vec::new(),
        }
    }

    fn push(&mut self, op: StorageOp) {
        self.ops.push(op);
    }

    /// Schedules this plan creates, in insertion order.
    pub fn inserted_schedules(&self) -> impl Iterator<Item = &Schedule> {
        self.ops.iter().filter_map(|op| match op {
            StorageOp::InsertSchedule(schedule) => Some(schedule),
            _ => None,
        })
    }
}

/// Title, content and time bounds checks shared by every write path.
pub fn validate_fields(schedule: &Schedule) -> Result<(), CoreError> {
    let title_chars = schedule.title.trim().chars().count();
    if title_chars == 0 || schedule.title.chars().count() > MAX_TITLE_CHARS {
        return Err(CoreError::InvalidInput(format!(
            "title must be between 1 and {} characters",
            MAX_TITLE_CHARS
        )));
    }
    if let Some(content) = &schedule.content {
        if content.chars().count() > MAX_CONTENT_CHARS {
            return Err(CoreError::InvalidInput(format!(
                "content must be at most {} characters",
                MAX_CONTENT_CHARS
            )));
        }
    }
    if schedule.end_at < schedule.start_at {
        return Err(CoreError::InvalidInput(format!(
            "end {} is before start {}",
            schedule.end_at, schedule.start_at
        )));
    }
    Ok(())
}

/// Plans a new base schedule and, if requested, its repeat rule. Never
/// creates per-occurrence rows.
pub fn plan_create(data: NewScheduleData) -> Result<MutationPlan, CoreError> {
    let now = Utc::now().naive_utc();
    let schedule = Schedule {
        id: Uuid::now_v7(),
        calendar_id: data.calendar_id,
        title: data.title,
        content: data.content,
        start_at: data.start_at,
        end_at: data.end_at,
        location: data.location,
        color: data.color.unwrap_or_default(),
        version: 0,
        created_at: now,
        updated_at: now,
    };
    validate_fields(&schedule)?;

    let rule = data.repeat.map(|spec| RepeatRule::new(&schedule, spec)).transpose()?;

    let mut plan = MutationPlan::new(schedule.id);
    plan.push(StorageOp::InsertSchedule(schedule));
    if let Some(rule) = rule {
        plan.push(StorageOp::InsertRule(rule));
    }
    Ok(plan)
}

/// Plans an edit of `series` under `scope`. `target` is the date of the
/// occurrence the caller acted on; it is required for every scope but
/// [`EditScope::All`].
pub fn plan_edit(
    series: &Series,
    scope: EditScope,
    target: Option<NaiveDate>,
    changes: &ScheduleChanges,
) -> Result<MutationPlan, CoreError> {
    let Some(rule) = &series.rule else {
        return match scope {
            EditScope::All => plan_edit_singleton(&series.schedule, changes),
            _ => Err(CoreError::NotARecurringSchedule(series.schedule.id)),
        };
    };

    match scope {
        EditScope::All => plan_edit_all(&series.schedule, rule, changes),
        EditScope::OnlyThis => {
            if changes.touches_recurrence() {
                return Err(CoreError::InvalidInput(
                    "cannot change recurrence of a single occurrence; use scope 'after' or 'all'".to_string(),
                ));
            }
            let cut = Cut::locate(&series.schedule, rule, target)?;
            plan_edit_only_this(&series.schedule, rule, &cut, changes)
        }
        EditScope::ThisAndAfter => {
            let cut = Cut::locate(&series.schedule, rule, target)?;
            plan_edit_this_and_after(&series.schedule, rule, &cut, changes)
        }
    }
}

/// Plans a delete of `series` under `scope`.
pub fn plan_delete(series: &Series, scope: EditScope, target: Option<NaiveDate>) -> Result<MutationPlan, CoreError> {
    let schedule = &series.schedule;
    let mut plan = MutationPlan::new(schedule.id);

    let Some(rule) = &series.rule else {
        if scope != EditScope::All {
            return Err(CoreError::NotARecurringSchedule(schedule.id));
        }
        plan.push(delete_schedule(schedule));
        return Ok(plan);
    };

    match scope {
        EditScope::All => {
            plan.push(delete_rule(rule));
            plan.push(delete_schedule(schedule));
        }
        EditScope::OnlyThis => {
            let cut = Cut::locate(schedule, rule, target)?;
            match (cut.is_first(), cut.next) {
                (true, Some(next)) => {
                    // Base moves forward to the second occurrence; the rule is
                    // rewritten unchanged so a concurrent writer is detected.
                    plan.push(update_schedule(schedule, moved_to(schedule, next)));
                    plan.push(update_rule(rule, rule.clone()));
                }
                (true, None) => {
                    plan.push(delete_rule(rule));
                    plan.push(delete_schedule(schedule));
                }
                (false, next) => {
                    plan.push(update_rule(rule, clamped_before(rule, cut.date)?));
                    if let Some(next) = next {
                        plan.push(touch_schedule(schedule));
                        push_remainder(&mut plan, schedule, rule, next)?;
                    }
                }
            }
        }
        EditScope::ThisAndAfter => {
            let cut = Cut::locate(schedule, rule, target)?;
            if cut.is_first() {
                plan.push(delete_rule(rule));
                plan.push(delete_schedule(schedule));
            } else {
                plan.push(update_rule(rule, clamped_before(rule, cut.date)?));
            }
        }
    }
    Ok(plan)
}

/// Position of the target occurrence inside its series.
#[derive(Debug, Clone, Copy)]
struct Cut {
    index: u64,
    date: NaiveDate,
    /// Occurrence following the target, if the series continues
    next: Option<NaiveDate>,
}

impl Cut {
    fn locate(schedule: &Schedule, rule: &RepeatRule, target: Option<NaiveDate>) -> Result<Self, CoreError> {
        let date = target.ok_or_else(|| {
            CoreError::InvalidInput("an occurrence date is required for scopes other than 'all'".to_string())
        })?;
        let progression = Progression::for_rule(schedule, rule);
        let index = progression.index_of(date).ok_or(CoreError::InvalidOccurrence {
            schedule_id: schedule.id,
            date,
        })?;
        Ok(Self {
            index,
            date,
            next: progression.occurrence(index + 1),
        })
    }

    fn is_first(&self) -> bool {
        self.index == 0
    }
}

fn plan_edit_singleton(schedule: &Schedule, changes: &ScheduleChanges) -> Result<MutationPlan, CoreError> {
    let edited = changes.apply_to(schedule);
    validate_fields(&edited)?;

    let mut plan = MutationPlan::new(schedule.id);
    plan.push(update_schedule(schedule, edited.clone()));
    if let Some(Some(spec)) = changes.repeat {
        plan.push(StorageOp::InsertRule(RepeatRule::new(&edited, spec)?));
    }
    Ok(plan)
}

fn plan_edit_all(schedule: &Schedule, rule: &RepeatRule, changes: &ScheduleChanges) -> Result<MutationPlan, CoreError> {
    // Field changes apply in place. Times are taken as times of day: the
    // anchor date of the series never moves.
    let mut edited = changes.apply_to(schedule);
    let start_time = changes.start_at.map_or(schedule.start_at.time(), |start| start.time());
    let duration = match (changes.start_at, changes.end_at) {
        (Some(start), Some(end)) => end - start,
        (None, Some(end)) => wrap_to_day(end.time() - start_time),
        (Some(_), None) | (None, None) => schedule.duration(),
    };
    edited.start_at = schedule.start_date().and_time(start_time);
    edited.end_at = edited.start_at + duration;
    validate_fields(&edited)?;

    let mut plan = MutationPlan::new(schedule.id);
    plan.push(update_schedule(schedule, edited.clone()));
    match changes.repeat {
        Some(Some(spec)) => {
            validate_repeat_spec(edited.start_date(), &spec)?;
            let anchor_day = if spec.frequency == rule.frequency { rule.anchor_day } else { edited.start_at.day() };
            let mut replaced = rule.clone();
            replaced.frequency = spec.frequency;
            replaced.end_date = spec.end_date;
            replaced.anchor_day = anchor_day;
            plan.push(update_rule(rule, replaced));
        }
        Some(None) => plan.push(delete_rule(rule)),
        None => {}
    }
    Ok(plan)
}

fn plan_edit_only_this(
    schedule: &Schedule,
    rule: &RepeatRule,
    cut: &Cut,
    changes: &ScheduleChanges,
) -> Result<MutationPlan, CoreError> {
    let edited = changes.apply_to(&moved_to(schedule, cut.date));
    validate_fields(&edited)?;

    let mut plan = MutationPlan::new(schedule.id);
    if cut.is_first() {
        // The base itself becomes the edited singleton.
        plan.push(delete_rule(rule));
        plan.push(update_schedule(schedule, edited));
    } else {
        plan.push(touch_schedule(schedule));
        plan.push(update_rule(rule, clamped_before(rule, cut.date)?));
        plan.push(StorageOp::InsertSchedule(fresh(&edited)));
    }
    if let Some(next) = cut.next {
        push_remainder(&mut plan, schedule, rule, next)?;
    }
    Ok(plan)
}

fn plan_edit_this_and_after(
    schedule: &Schedule,
    rule: &RepeatRule,
    cut: &Cut,
    changes: &ScheduleChanges,
) -> Result<MutationPlan, CoreError> {
    let edited = changes.apply_to(&moved_to(schedule, cut.date));
    validate_fields(&edited)?;

    let spec = match changes.repeat {
        None => Some(rule.spec()),
        Some(spec) => spec,
    };
    // Continue the original progression unless the edit re-anchors it.
    let anchor_day = match spec {
        Some(spec) if spec.frequency == rule.frequency && edited.start_date() == cut.date => rule.anchor_day,
        _ => edited.start_at.day(),
    };

    let mut plan = MutationPlan::new(schedule.id);
    if cut.is_first() {
        plan.push(update_schedule(schedule, edited.clone()));
        match spec {
            Some(spec) => {
                let mut replaced = RepeatRule::with_anchor_day(&edited, spec, anchor_day)?;
                replaced.id = rule.id;
                replaced.created_at = rule.created_at;
                replaced.version = rule.version;
                plan.push(update_rule(rule, replaced));
            }
            None => plan.push(delete_rule(rule)),
        }
    } else {
        plan.push(touch_schedule(schedule));
        plan.push(update_rule(rule, clamped_before(rule, cut.date)?));
        let created = fresh(&edited);
        let created_rule = spec
            .map(|spec| RepeatRule::with_anchor_day(&created, spec, anchor_day))
            .transpose()?;
        plan.push(StorageOp::InsertSchedule(created));
        if let Some(created_rule) = created_rule {
            plan.push(StorageOp::InsertRule(created_rule));
        }
    }
    Ok(plan)
}

/// New schedule + rule carrying the original fields from `next` onwards.
fn push_remainder(plan: &mut MutationPlan, schedule: &Schedule, rule: &RepeatRule, next: NaiveDate) -> Result<(), CoreError> {
    let remainder = fresh(&moved_to(schedule, next));
    let remainder_rule = RepeatRule::with_anchor_day(&remainder, rule.spec(), rule.anchor_day)?;
    plan.push(StorageOp::InsertSchedule(remainder));
    plan.push(StorageOp::InsertRule(remainder_rule));
    Ok(())
}

/// `schedule` shifted to `date`, keeping time of day and duration.
fn moved_to(schedule: &Schedule, date: NaiveDate) -> Schedule {
    let start_at: NaiveDateTime = date.and_time(schedule.start_at.time());
    Schedule {
        start_at,
        end_at: start_at + schedule.duration(),
        ..schedule.clone()
    }
}

/// Copy of `schedule` under a new identity.
fn fresh(schedule: &Schedule) -> Schedule {
    let now = Utc::now().naive_utc();
    Schedule {
        id: Uuid::now_v7(),
        version: 0,
        created_at: now,
        updated_at: now,
        ..schedule.clone()
    }
}

fn clamped_before(rule: &RepeatRule, date: NaiveDate) -> Result<RepeatRule, CoreError> {
    let end_date = date
        .pred_opt()
        .ok_or_else(|| CoreError::InvalidRepeatRule(format!("no day precedes {}", date)))?;
    Ok(RepeatRule {
        end_date,
        ..rule.clone()
    })
}

fn wrap_to_day(duration: Duration) -> Duration {
    if duration < Duration::zero() {
        duration + Duration::days(1)
    } else {
        duration
    }
}

fn update_schedule(current: &Schedule, mut updated: Schedule) -> StorageOp {
    updated.id = current.id;
    updated.updated_at = Utc::now().naive_utc();
    StorageOp::UpdateSchedule {
        schedule: updated,
        expected_version: current.version,
    }
}

fn delete_schedule(schedule: &Schedule) -> StorageOp {
    StorageOp::DeleteSchedule {
        id: schedule.id,
        expected_version: schedule.version,
    }
}

fn touch_schedule(schedule: &Schedule) -> StorageOp {
    StorageOp::TouchSchedule {
        id: schedule.id,
        expected_version: schedule.version,
    }
}

fn update_rule(current: &RepeatRule, mut updated: RepeatRule) -> StorageOp {
    updated.id = current.id;
    updated.updated_at = Utc::now().naive_utc();
    StorageOp::UpdateRule {
        rule: updated,
        expected_version: current.version,
    }
}

fn delete_rule(rule: &RepeatRule) -> StorageOp {
    StorageOp::DeleteRule {
        id: rule.id,
        expected_version: rule.version,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Color, Frequency};
    use crate::recurrence::OccurrenceExpander;
    use chrono::NaiveTime;
    use std::collections::BTreeMap;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        date(y, m, d).and_time(NaiveTime::from_hms_opt(h, min, 0).unwrap())
    }

    /// Weekly "Standup", Mar 1 - Mar 29 2024, 09:00-09:15 in room A.
    fn standup() -> Series {
        let plan = plan_create(NewScheduleData {
            calendar_id: Uuid::now_v7(),
            title: "Standup".to_string(),
            start_at: at(2024, 3, 1, 9, 0),
            end_at: at(2024, 3, 1, 9, 15),
            location: Some("A".to_string()),
            color: Some(Color::Green),
            repeat: Some(RepeatSpec {
                frequency: Frequency::Weekly,
                end_date: date(2024, 3, 29),
            }),
            ..Default::default()
        })
        .unwrap();
        let mut store = Store::default();
        store.apply(&plan);
        store.series(plan.series_id)
    }

    fn new_location(location: &str) -> ScheduleChanges {
        ScheduleChanges {
            location: Some(Some(location.to_string())),
            ..Default::default()
        }
    }

    /// Minimal in-memory row store that applies plans the way the repository does.
    #[derive(Default)]
    struct Store {
        schedules: BTreeMap<Uuid, Schedule>,
        rules: BTreeMap<Uuid, RepeatRule>,
    }

    impl Store {
        fn seeded(series: &Series) -> Self {
            let mut store = Store::default();
            store.schedules.insert(series.schedule.id, series.schedule.clone());
            if let Some(rule) = &series.rule {
                store.rules.insert(rule.schedule_id, rule.clone());
            }
            store
        }

        fn apply(&mut self, plan: &MutationPlan) {
            for op in &plan.ops {
                match op {
                    StorageOp::InsertSchedule(s) => {
                        assert!(self.schedules.insert(s.id, s.clone()).is_none());
                    }
                    StorageOp::UpdateSchedule { schedule, expected_version } => {
                        let current = self.schedules.get_mut(&schedule.id).unwrap();
                        assert_eq!(current.version, *expected_version);
                        *current = Schedule {
                            version: expected_version + 1,
                            ..schedule.clone()
                        };
                    }
                    StorageOp::DeleteSchedule { id, .. } => {
                        self.schedules.remove(id).unwrap();
                        self.rules.remove(id);
                    }
                    StorageOp::TouchSchedule { id, expected_version } => {
                        let current = self.schedules.get_mut(id).unwrap();
                        assert_eq!(current.version, *expected_version);
                        current.version += 1;
                    }
                    StorageOp::InsertRule(r) => {
                        assert!(self.schedules.contains_key(&r.schedule_id));
                        assert!(self.rules.insert(r.schedule_id, r.clone()).is_none());
                    }
                    StorageOp::UpdateRule { rule, expected_version } => {
                        let current = self.rules.get_mut(&rule.schedule_id).unwrap();
                        assert_eq!(current.version, *expected_version);
                        *current = RepeatRule {
                            version: expected_version + 1,
                            ..rule.clone()
                        };
                    }
                    StorageOp::DeleteRule { id, .. } => {
                        let owner = self.rules.iter().find(|(_, r)| r.id == *id).map(|(k, _)| *k).unwrap();
                        self.rules.remove(&owner);
                    }
                }
            }
        }

        fn series(&self, id: Uuid) -> Series {
            Series {
                schedule: self.schedules[&id].clone(),
                rule: self.rules.get(&id).cloned(),
            }
        }

        /// (date, location) of every occurrence in March 2024, sorted.
        fn march(&self) -> Vec<(NaiveDate, Option<String>)> {
            let mut rows = Vec::new();
            for schedule in self.schedules.values() {
                match self.rules.get(&schedule.id) {
                    Some(rule) => {
                        for span in OccurrenceExpander::for_rule(schedule, rule, date(2024, 3, 1), date(2024, 3, 31)).unwrap() {
                            rows.push((span.unwrap().0.date(), schedule.location.clone()));
                        }
                    }
                    None => rows.push((schedule.start_date(), schedule.location.clone())),
                }
            }
            rows.sort();
            rows
        }
    }

    fn march_dates() -> Vec<NaiveDate> {
        [1, 8, 15, 22, 29].into_iter().map(|d| date(2024, 3, d)).collect()
    }

    #[test]
    fn test_create_writes_one_base_and_one_rule() {
        let series = standup();
        let rule = series.rule.unwrap();
        assert_eq!(rule.schedule_id, series.schedule.id);
        assert_eq!(rule.anchor_day, 1);
    }

    #[test]
    fn test_create_rejects_rule_ending_before_start() {
        let result = plan_create(NewScheduleData {
            title: "Backwards".to_string(),
            start_at: at(2024, 3, 1, 9, 0),
            end_at: at(2024, 3, 1, 10, 0),
            repeat: Some(RepeatSpec {
                frequency: Frequency::Daily,
                end_date: date(2024, 2, 28),
            }),
            ..Default::default()
        });
        assert!(matches!(result.unwrap_err(), CoreError::InvalidRepeatRule(_)));
    }

    #[test]
    fn test_create_validates_fields() {
        let base = NewScheduleData {
            title: "x".repeat(51),
            start_at: at(2024, 3, 1, 9, 0),
            end_at: at(2024, 3, 1, 10, 0),
            ..Default::default()
        };
        assert!(matches!(plan_create(base.clone()).unwrap_err(), CoreError::InvalidInput(_)));

        let backwards = NewScheduleData {
            title: "ok".to_string(),
            end_at: at(2024, 3, 1, 8, 0),
            ..base
        };
        assert!(matches!(plan_create(backwards).unwrap_err(), CoreError::InvalidInput(_)));
    }

    #[test]
    fn test_only_this_edit_splits_three_ways() {
        let series = standup();
        let plan = plan_edit(&series, EditScope::OnlyThis, Some(date(2024, 3, 15)), &new_location("B")).unwrap();

        // base guard, clamp, singleton, remainder base, remainder rule
        assert_eq!(plan.ops.len(), 5);
        assert_eq!(
            plan.ops[0],
            StorageOp::TouchSchedule {
                id: series.schedule.id,
                expected_version: series.schedule.version,
            }
        );
        match &plan.ops[1] {
            StorageOp::UpdateRule { rule, .. } => assert_eq!(rule.end_date, date(2024, 3, 14)),
            other => panic!("expected rule clamp, got {:?}", other),
        }
        let inserted: Vec<&Schedule> = plan.inserted_schedules().collect();
        assert_eq!(inserted[0].start_at, at(2024, 3, 15, 9, 0));
        assert_eq!(inserted[1].start_at, at(2024, 3, 22, 9, 0));
        assert_eq!(inserted[1].location.as_deref(), Some("A"));

        let mut store = Store::seeded(&series);
        store.apply(&plan);
        let a = Some("A".to_string());
        let b = Some("B".to_string());
        assert_eq!(
            store.march(),
            vec![
                (date(2024, 3, 1), a.clone()),
                (date(2024, 3, 8), a.clone()),
                (date(2024, 3, 15), b),
                (date(2024, 3, 22), a.clone()),
                (date(2024, 3, 29), a),
            ]
        );
    }

    #[test]
    fn test_only_this_mutations_touch_exactly_one_occurrence() {
        let n = march_dates().len();
        for (k, target) in march_dates().into_iter().enumerate() {
            let series = standup();

            let mut edited = Store::seeded(&series);
            edited.apply(&plan_edit(&series, EditScope::OnlyThis, Some(target), &new_location("B")).unwrap());
            let rows = edited.march();
            assert_eq!(rows.len(), n, "edit at index {}", k);
            for (date, location) in rows {
                let expected = if date == target { "B" } else { "A" };
                assert_eq!(location.as_deref(), Some(expected));
            }

            let mut deleted = Store::seeded(&series);
            deleted.apply(&plan_delete(&series, EditScope::OnlyThis, Some(target)).unwrap());
            let dates: Vec<NaiveDate> = deleted.march().into_iter().map(|(d, _)| d).collect();
            let expected: Vec<NaiveDate> = march_dates().into_iter().filter(|d| *d != target).collect();
            assert_eq!(dates, expected, "delete at index {}", k);
        }
    }

    #[test]
    fn test_split_plans_guard_copied_base() {
        let series = standup();
        let guards = |plan: &MutationPlan| {
            plan.ops
                .iter()
                .filter(|op| matches!(op, StorageOp::TouchSchedule { id, .. } if *id == series.schedule.id))
                .count()
        };
        let target = Some(date(2024, 3, 15));
        assert_eq!(guards(&plan_delete(&series, EditScope::OnlyThis, target).unwrap()), 1);
        assert_eq!(guards(&plan_edit(&series, EditScope::OnlyThis, target, &new_location("B")).unwrap()), 1);
        assert_eq!(guards(&plan_edit(&series, EditScope::ThisAndAfter, target, &new_location("B")).unwrap()), 1);
        // Nothing is copied from the base when the tail is dropped
        assert_eq!(guards(&plan_delete(&series, EditScope::ThisAndAfter, target).unwrap()), 0);
        assert_eq!(guards(&plan_delete(&series, EditScope::OnlyThis, Some(date(2024, 3, 29))).unwrap()), 0);
    }

    #[test]
    fn test_only_this_on_base_reuses_base_row() {
        let series = standup();
        let plan = plan_edit(&series, EditScope::OnlyThis, Some(date(2024, 3, 1)), &new_location("B")).unwrap();
        assert!(matches!(plan.ops[0], StorageOp::DeleteRule { .. }));
        match &plan.ops[1] {
            StorageOp::UpdateSchedule { schedule, .. } => {
                assert_eq!(schedule.id, series.schedule.id);
                assert_eq!(schedule.location.as_deref(), Some("B"));
            }
            other => panic!("expected base update, got {:?}", other),
        }
    }

    #[test]
    fn test_only_this_delete_of_base_moves_anchor_forward() {
        let series = standup();
        let plan = plan_delete(&series, EditScope::OnlyThis, Some(date(2024, 3, 1))).unwrap();
        let mut store = Store::seeded(&series);
        store.apply(&plan);
        assert_eq!(store.schedules.len(), 1);
        assert_eq!(store.series(series.schedule.id).schedule.start_at, at(2024, 3, 8, 9, 0));
    }

    #[test]
    fn test_this_and_after_edit_replaces_tail() {
        let series = standup();
        let changes = ScheduleChanges {
            title: Some("Planning".to_string()),
            ..Default::default()
        };
        let plan = plan_edit(&series, EditScope::ThisAndAfter, Some(date(2024, 3, 22)), &changes).unwrap();
        let mut store = Store::seeded(&series);
        store.apply(&plan);

        let mut titles: Vec<(NaiveDate, String)> = Vec::new();
        for schedule in store.schedules.values() {
            let rule = &store.rules[&schedule.id];
            for span in OccurrenceExpander::for_rule(schedule, rule, date(2024, 3, 1), date(2024, 3, 31)).unwrap() {
                titles.push((span.unwrap().0.date(), schedule.title.clone()));
            }
        }
        titles.sort();
        let expected: Vec<(NaiveDate, String)> = march_dates()
            .into_iter()
            .map(|d| (d, if d >= date(2024, 3, 22) { "Planning" } else { "Standup" }.to_string()))
            .collect();
        assert_eq!(titles, expected);
    }

    #[test]
    fn test_this_and_after_edit_accepts_new_end_date() {
        let series = standup();
        let changes = ScheduleChanges {
            repeat: Some(Some(RepeatSpec {
                frequency: Frequency::Weekly,
                end_date: date(2024, 4, 12),
            })),
            ..Default::default()
        };
        let plan = plan_edit(&series, EditScope::ThisAndAfter, Some(date(2024, 3, 15)), &changes).unwrap();
        let created_rule = plan
            .ops
            .iter()
            .find_map(|op| match op {
                StorageOp::InsertRule(rule) => Some(rule),
                _ => None,
            })
            .unwrap();
        assert_eq!(created_rule.end_date, date(2024, 4, 12));
    }

    #[test]
    fn test_this_and_after_delete() {
        let series = standup();
        let mut store = Store::seeded(&series);
        store.apply(&plan_delete(&series, EditScope::ThisAndAfter, Some(date(2024, 3, 15))).unwrap());
        let dates: Vec<NaiveDate> = store.march().into_iter().map(|(d, _)| d).collect();
        assert_eq!(dates, vec![date(2024, 3, 1), date(2024, 3, 8)]);

        let plan = plan_delete(&series, EditScope::ThisAndAfter, Some(date(2024, 3, 1))).unwrap();
        let mut store = Store::seeded(&series);
        store.apply(&plan);
        assert!(store.schedules.is_empty());
    }

    #[test]
    fn test_all_edit_keeps_anchor_date() {
        let series = standup();
        let changes = ScheduleChanges {
            start_at: Some(at(2024, 5, 5, 10, 0)),
            end_at: Some(at(2024, 5, 5, 10, 30)),
            ..Default::default()
        };
        let plan = plan_edit(&series, EditScope::All, None, &changes).unwrap();
        match &plan.ops[0] {
            StorageOp::UpdateSchedule { schedule, .. } => {
                assert_eq!(schedule.start_at, at(2024, 3, 1, 10, 0));
                assert_eq!(schedule.end_at, at(2024, 3, 1, 10, 30));
            }
            other => panic!("expected base update, got {:?}", other),
        }
    }

    #[test]
    fn test_all_edit_replaces_rule_in_place() {
        let series = standup();
        let changes = ScheduleChanges {
            repeat: Some(Some(RepeatSpec {
                frequency: Frequency::Daily,
                end_date: date(2024, 3, 3),
            })),
            ..Default::default()
        };
        let mut store = Store::seeded(&series);
        store.apply(&plan_edit(&series, EditScope::All, None, &changes).unwrap());
        let rule = store.series(series.schedule.id).rule.unwrap();
        assert_eq!(rule.id, series.rule.unwrap().id);
        assert_eq!(store.march().len(), 3);
    }

    #[test]
    fn test_scoped_mutation_on_singleton_is_rejected() {
        let series = Series {
            schedule: standup().schedule,
            rule: None,
        };
        let result = plan_edit(&series, EditScope::OnlyThis, Some(date(2024, 3, 1)), &new_location("B"));
        assert!(matches!(result.unwrap_err(), CoreError::NotARecurringSchedule(_)));
        let result = plan_delete(&series, EditScope::ThisAndAfter, Some(date(2024, 3, 1)));
        assert!(matches!(result.unwrap_err(), CoreError::NotARecurringSchedule(_)));
        assert!(plan_delete(&series, EditScope::All, None).is_ok());
    }

    #[test]
    fn test_target_must_be_an_occurrence() {
        let series = standup();
        let result = plan_edit(&series, EditScope::OnlyThis, Some(date(2024, 3, 16)), &new_location("B"));
        assert!(matches!(result.unwrap_err(), CoreError::InvalidOccurrence { .. }));
        let result = plan_delete(&series, EditScope::OnlyThis, None);
        assert!(matches!(result.unwrap_err(), CoreError::InvalidInput(_)));
    }

    #[test]
    fn test_split_of_clamped_monthly_series_keeps_progression() {
        let plan = plan_create(NewScheduleData {
            title: "Rent".to_string(),
            start_at: at(2024, 1, 31, 8, 0),
            end_at: at(2024, 1, 31, 8, 30),
            repeat: Some(RepeatSpec {
                frequency: Frequency::Monthly,
                end_date: date(2024, 6, 30),
            }),
            ..Default::default()
        })
        .unwrap();
        let mut store = Store::default();
        store.apply(&plan);
        let series = store.series(plan.series_id);

        // Remove Jan 31; the remainder is re-anchored on Feb 29.
        store.apply(&plan_delete(&series, EditScope::OnlyThis, Some(date(2024, 1, 31))).unwrap());
        let series = store.series(plan.series_id);
        let dates: Vec<NaiveDate> = OccurrenceExpander::for_rule(&series.schedule, series.rule.as_ref().unwrap(), date(2024, 1, 1), date(2024, 12, 31))
            .unwrap()
            .map(|span| span.unwrap().0.date())
            .collect();
        assert_eq!(
            dates,
            vec![date(2024, 2, 29), date(2024, 3, 31), date(2024, 4, 30), date(2024, 5, 31), date(2024, 6, 30)]
        );
    }
}
