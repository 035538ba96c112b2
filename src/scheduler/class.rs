//! Per-class timetable construction.
//!
//! # Algorithm
//!
//! 1. Reject the class if its required hours exceed the regular slots.
//! 2. Order subjects by weekly hours (descending), then subject id.
//! 3. For each subject, pick one teacher for the whole week: the first
//!    candidate (id order) whose greedy placement covers every hour, or
//!    failing that the candidate placing the most hours.
//! 4. Greedy placement walks regular slots in scan order and takes the
//!    earliest slot that is free in the class, free for the teacher, and
//!    within the per-subject daily and consecutive caps.
//! 5. Fixed slots come straight from the calendar; the homeroom activity
//!    is bound to the class's homeroom teacher.
//! 6. All (teacher, slot) pairs are committed to the shared tracker at
//!    the end. If any commit fails, the ones already made are released.
//!
//! # Complexity
//! O(s * c * r) where s=subjects, c=candidate teachers, r=regular slots.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::ClassStats;
use crate::availability::AvailabilityTracker;
use crate::config::{CapScope, SchedulingPolicy};
use crate::error::ScheduleError;
use crate::models::{
    AcademicYear, Catalog, ClassGroup, ClassId, FixedKind, PeriodKind, ScheduleEntry, Semester, Slot,
    SlotKind, SubjectId, SubjectRequirement, TeacherId, WeekCalendar, WeeklySchedule,
};

/// Why a subject did not get all of its hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShortfallReason {
    /// Teachers exist but none had a usable free slot.
    NoEligibleTeacher,
    /// The catalog has no teacher for the subject at all.
    CatalogIncomplete,
    /// Some hours placed; free slots or caps ran out.
    Partial,
}

/// Required hours of a subject that could not be placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortfall {
    pub subject_id: SubjectId,
    pub required: u32,
    pub placed: u32,
    pub reason: ShortfallReason,
}

impl Shortfall {
    /// Hours missing.
    pub fn missing(&self) -> u32 {
        self.required.saturating_sub(self.placed)
    }
}

/// A successfully scheduled class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassOutcome {
    /// Draft schedule; the caller decides when it becomes active.
    pub schedule: WeeklySchedule,
    pub shortfalls: Vec<Shortfall>,
    /// The single teacher chosen for each placed subject.
    pub subject_teachers: BTreeMap<SubjectId, TeacherId>,
    pub stats: ClassStats,
}

/// Builds the weekly timetable of one class.
#[derive(Debug, Clone, Copy)]
pub struct ClassScheduler<'a> {
    calendar: &'a WeekCalendar,
    policy: &'a SchedulingPolicy,
}

impl<'a> ClassScheduler<'a> {
    /// Creates a scheduler over a calendar and placement policy.
    pub fn new(calendar: &'a WeekCalendar, policy: &'a SchedulingPolicy) -> Self {
        Self { calendar, policy }
    }

    /// Schedules one class.
    ///
    /// `requirements` must already be filtered to the class's grade. On
    /// success every placed (teacher, slot) pair has been committed to
    /// `tracker`; on failure the tracker is left as it was found.
    pub fn schedule(
        &self,
        class: &ClassGroup,
        requirements: &[SubjectRequirement],
        catalog: &Catalog,
        academic_year: AcademicYear,
        semester: Semester,
        tracker: &mut AvailabilityTracker,
    ) -> Result<ClassOutcome, ScheduleError> {
        let regular: Vec<Slot> = self.calendar.regular_slots().collect();
        let required: u32 = requirements.iter().map(|r| r.weekly_hours).sum();
        let available = regular.len() as u32;
        if required > available {
            return Err(ScheduleError::CapacityExceeded {
                required,
                available,
            });
        }

        let mut order: Vec<&SubjectRequirement> =
            requirements.iter().filter(|r| r.weekly_hours > 0).collect();
        order.sort_by(|a, b| {
            b.weekly_hours
                .cmp(&a.weekly_hours)
                .then_with(|| a.subject_id.cmp(&b.subject_id))
        });

        let mut grid: BTreeMap<Slot, (SubjectId, TeacherId)> = BTreeMap::new();
        let mut subject_teachers = BTreeMap::new();
        let mut shortfalls = Vec::new();

        for req in &order {
            let hours = req.weekly_hours;
            let candidates = catalog.teachers_for_subject(&req.subject_id);
            if candidates.is_empty() {
                warn!(
                    "class {}: no teacher in catalog for subject {}",
                    class.id, req.subject_id
                );
                shortfalls.push(Shortfall {
                    subject_id: req.subject_id.clone(),
                    required: hours,
                    placed: 0,
                    reason: ShortfallReason::CatalogIncomplete,
                });
                continue;
            }

            let mut best: Option<(TeacherId, Vec<Slot>)> = None;
            for teacher in candidates {
                let slots = self.plan_subject(&teacher, hours, &regular, &grid, tracker);
                let full = slots.len() as u32 == hours;
                if best.as_ref().map_or(true, |(_, b)| slots.len() > b.len()) {
                    best = Some((teacher, slots));
                }
                if full {
                    break;
                }
            }

            match best {
                Some((teacher, slots)) if !slots.is_empty() => {
                    let placed = slots.len() as u32;
                    debug!(
                        "class {}: {} -> {} ({placed}/{hours} periods)",
                        class.id, req.subject_id, teacher
                    );
                    for slot in slots {
                        grid.insert(slot, (req.subject_id.clone(), teacher.clone()));
                    }
                    if placed < hours {
                        warn!(
                            "class {}: subject {} short by {} period(s)",
                            class.id,
                            req.subject_id,
                            hours - placed
                        );
                        shortfalls.push(Shortfall {
                            subject_id: req.subject_id.clone(),
                            required: hours,
                            placed,
                            reason: ShortfallReason::Partial,
                        });
                    }
                    subject_teachers.insert(req.subject_id.clone(), teacher);
                }
                _ => {
                    warn!(
                        "class {}: no eligible teacher has a free slot for {}",
                        class.id, req.subject_id
                    );
                    shortfalls.push(Shortfall {
                        subject_id: req.subject_id.clone(),
                        required: hours,
                        placed: 0,
                        reason: ShortfallReason::NoEligibleTeacher,
                    });
                }
            }
        }

        if !order.is_empty() && grid.is_empty() {
            return Err(nothing_placed(&shortfalls));
        }

        // Fixed slots
        let homeroom = catalog.homeroom_teacher_of(&class.id);
        let mut fixed_teachers: BTreeMap<Slot, TeacherId> = BTreeMap::new();
        let mut pending: Vec<(TeacherId, Slot)> = Vec::new();
        for (slot, kind) in self.calendar.fixed_slots() {
            if kind != FixedKind::HomeroomActivity {
                continue;
            }
            let Some(teacher) = &homeroom else {
                debug!("class {}: no homeroom teacher for {slot}", class.id);
                continue;
            };
            match tracker.holder(teacher, &slot) {
                None => {
                    pending.push((teacher.clone(), slot));
                    fixed_teachers.insert(slot, teacher.clone());
                }
                Some(holder) if holder == &class.id => {
                    fixed_teachers.insert(slot, teacher.clone());
                }
                Some(holder) => {
                    warn!(
                        "class {}: homeroom teacher {teacher} is held by class {holder} at {slot}",
                        class.id
                    );
                }
            }
        }
        pending.extend(grid.iter().map(|(slot, (_, teacher))| (teacher.clone(), *slot)));

        commit_all(tracker, &pending, &class.id)?;

        let entries = self
            .calendar
            .slots_for_grid()
            .iter()
            .map(|&slot| {
                let kind = self.calendar.kind_of(&slot);
                match (kind, grid.get(&slot)) {
                    (SlotKind::Regular, Some((subject, teacher))) => ScheduleEntry::lesson(
                        class.id.clone(),
                        slot,
                        subject.clone(),
                        teacher.clone(),
                    ),
                    (SlotKind::Fixed(_), _) => ScheduleEntry {
                        teacher_id: fixed_teachers.get(&slot).cloned(),
                        ..ScheduleEntry::empty(class.id.clone(), slot, PeriodKind::from(kind))
                    },
                    _ => ScheduleEntry::empty(class.id.clone(), slot, PeriodKind::from(kind)),
                }
            })
            .collect();

        let schedule = WeeklySchedule::draft(
            class.id.clone(),
            class.grade_level,
            academic_year,
            semester,
            entries,
        );
        let stats = ClassStats::calculate(&schedule, &shortfalls);

        Ok(ClassOutcome {
            schedule,
            shortfalls,
            subject_teachers,
            stats,
        })
    }

    /// Earliest slots `teacher` could take for a subject, up to `hours`.
    fn plan_subject(
        &self,
        teacher: &TeacherId,
        hours: u32,
        regular: &[Slot],
        grid: &BTreeMap<Slot, (SubjectId, TeacherId)>,
        tracker: &AvailabilityTracker,
    ) -> Vec<Slot> {
        let mut chosen: Vec<Slot> = Vec::new();
        for slot in regular {
            if chosen.len() as u32 == hours {
                break;
            }
            if grid.contains_key(slot) || !tracker.is_free(teacher, slot) {
                continue;
            }
            if self.within_caps(slot, &chosen) {
                chosen.push(*slot);
            }
        }
        chosen
    }

    /// Whether adding `slot` keeps a subject within its caps, given the
    /// slots already chosen for it.
    fn within_caps(&self, slot: &Slot, chosen: &[Slot]) -> bool {
        let periods: BTreeSet<u8> = chosen
            .iter()
            .filter(|s| {
                s.day == slot.day
                    && (self.policy.cap_scope == CapScope::Day || s.session == slot.session)
            })
            .map(|s| s.period)
            .collect();

        if periods.len() >= usize::from(self.policy.max_daily_periods) {
            return false;
        }

        let mut run = 1u32;
        let mut p = slot.period;
        while let Some(prev) = p.checked_sub(1).filter(|q| periods.contains(q)) {
            run += 1;
            p = prev;
        }
        p = slot.period;
        while let Some(next) = p.checked_add(1).filter(|q| periods.contains(q)) {
            run += 1;
            p = next;
        }
        run <= u32::from(self.policy.max_consecutive)
    }
}

fn nothing_placed(shortfalls: &[Shortfall]) -> ScheduleError {
    let subjects: Vec<SubjectId> = shortfalls.iter().map(|s| s.subject_id.clone()).collect();
    if shortfalls
        .iter()
        .all(|s| s.reason == ShortfallReason::CatalogIncomplete)
    {
        ScheduleError::CatalogIncomplete { subjects }
    } else {
        ScheduleError::NoEligibleTeacher { subjects }
    }
}

fn commit_all(
    tracker: &mut AvailabilityTracker,
    pairs: &[(TeacherId, Slot)],
    class: &ClassId,
) -> Result<(), ScheduleError> {
    for (i, (teacher, slot)) in pairs.iter().enumerate() {
        if let Err(e) = tracker.commit(teacher, *slot, class) {
            for (t, s) in &pairs[..i] {
                tracker.release(t, s);
            }
            return Err(e.into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CalendarConfig, Session, Subject, Teacher, Weekday};

    fn year() -> AcademicYear {
        AcademicYear::starting(2024)
    }

    fn sem() -> Semester {
        Semester::new(1).unwrap()
    }

    /// Six days with one morning period each.
    fn one_period_week() -> WeekCalendar {
        WeekCalendar::new(CalendarConfig::plain(Weekday::ALL.to_vec(), 1, 0)).unwrap()
    }

    fn catalog(subjects: Vec<Subject>, teachers: Vec<Teacher>) -> Catalog {
        Catalog::new(subjects, teachers, vec![ClassGroup::new("12A1", 12)]).unwrap()
    }

    fn run(
        cal: &WeekCalendar,
        policy: &SchedulingPolicy,
        catalog: &Catalog,
        class: &str,
        tracker: &mut AvailabilityTracker,
    ) -> Result<ClassOutcome, ScheduleError> {
        let class = catalog.class(&class.into()).unwrap().clone();
        let reqs = catalog.subjects_for_grade(class.grade_level);
        ClassScheduler::new(cal, policy).schedule(&class, &reqs, catalog, year(), sem(), tracker)
    }

    #[test]
    fn test_fills_every_slot() {
        let cal = one_period_week();
        let policy = SchedulingPolicy::default();
        let cat = catalog(
            vec![Subject::new("math", 6).with_grades([12])],
            vec![Teacher::new("T01", "math")],
        );
        let mut tracker = AvailabilityTracker::new();

        let out = run(&cal, &policy, &cat, "12A1", &mut tracker).unwrap();
        assert!(out.shortfalls.is_empty());
        assert_eq!(out.stats.filled_periods, 6);
        assert_eq!(out.stats.unfilled_periods, 0);
        assert_eq!(tracker.commit_count(), 6);
        assert_eq!(out.schedule.teachers_of_subject(&"math".into()).len(), 1);
    }

    #[test]
    fn test_partial_when_teacher_busy() {
        let cal = one_period_week();
        let policy = SchedulingPolicy::default();
        let cat = catalog(
            vec![Subject::new("math", 6).with_grades([12])],
            vec![Teacher::new("T01", "math")],
        );
        let mut tracker = AvailabilityTracker::new();
        let other = ClassId::from("12A2");
        for day in [Weekday::Mon, Weekday::Wed] {
            let slot = cal.slot_at(day, 1).unwrap();
            tracker.commit(&"T01".into(), slot, &other).unwrap();
        }

        let out = run(&cal, &policy, &cat, "12A1", &mut tracker).unwrap();
        assert_eq!(out.shortfalls.len(), 1);
        assert_eq!(out.shortfalls[0].missing(), 2);
        assert_eq!(out.shortfalls[0].reason, ShortfallReason::Partial);
        assert_eq!(out.stats.filled_periods, 4);
        assert_eq!(out.stats.unfilled_periods, 2);
    }

    #[test]
    fn test_capacity_exceeded_commits_nothing() {
        let cal = one_period_week();
        let policy = SchedulingPolicy::default();
        let cat = catalog(
            vec![
                Subject::new("math", 4).with_grades([12]),
                Subject::new("lit", 3).with_grades([12]),
            ],
            vec![Teacher::new("T01", "math"), Teacher::new("T02", "lit")],
        );
        let mut tracker = AvailabilityTracker::new();

        let err = run(&cal, &policy, &cat, "12A1", &mut tracker).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::CapacityExceeded {
                required: 7,
                available: 6
            }
        );
        assert_eq!(tracker.commit_count(), 0);
    }

    #[test]
    fn test_hour_greedy_order_and_scan() {
        // One day, five periods: the 2-hour subject goes first.
        let cal = WeekCalendar::new(CalendarConfig::plain(vec![Weekday::Mon], 5, 0)).unwrap();
        let policy = SchedulingPolicy::default();
        let cat = catalog(
            vec![
                Subject::new("art", 1).with_grades([12]),
                Subject::new("math", 2).with_grades([12]),
                Subject::new("bio", 1).with_grades([12]),
            ],
            vec![
                Teacher::new("T01", "art"),
                Teacher::new("T02", "math"),
                Teacher::new("T03", "bio"),
            ],
        );
        let mut tracker = AvailabilityTracker::new();

        let out = run(&cal, &policy, &cat, "12A1", &mut tracker).unwrap();
        let subjects: Vec<Option<&str>> = out
            .schedule
            .entries
            .iter()
            .map(|e| e.subject_id.as_ref().map(|s| s.as_str()))
            .collect();
        assert_eq!(
            subjects,
            vec![Some("math"), Some("math"), Some("art"), Some("bio"), None]
        );
    }

    #[test]
    fn test_daily_cap() {
        // Two days of four periods; 4 hours must split 2 + 2.
        let cal = WeekCalendar::new(CalendarConfig::plain(vec![Weekday::Mon, Weekday::Tue], 4, 0))
            .unwrap();
        let policy = SchedulingPolicy::default();
        let cat = catalog(
            vec![Subject::new("math", 4).with_grades([12])],
            vec![Teacher::new("T01", "math")],
        );
        let mut tracker = AvailabilityTracker::new();

        let out = run(&cal, &policy, &cat, "12A1", &mut tracker).unwrap();
        let placed: Vec<(Weekday, u8)> = out
            .schedule
            .entries
            .iter()
            .filter(|e| e.is_lesson())
            .map(|e| (e.slot.day, e.slot.period))
            .collect();
        assert_eq!(
            placed,
            vec![(Weekday::Mon, 1), (Weekday::Mon, 2), (Weekday::Tue, 1), (Weekday::Tue, 2)]
        );
    }

    #[test]
    fn test_cap_exhaustion_is_partial() {
        // One day, 5 periods, 3 hours of one subject: only 2 fit.
        let cal = WeekCalendar::new(CalendarConfig::plain(vec![Weekday::Mon], 5, 0)).unwrap();
        let policy = SchedulingPolicy::default();
        let cat = catalog(
            vec![Subject::new("math", 3).with_grades([12])],
            vec![Teacher::new("T01", "math")],
        );
        let mut tracker = AvailabilityTracker::new();

        let out = run(&cal, &policy, &cat, "12A1", &mut tracker).unwrap();
        assert_eq!(out.stats.filled_periods, 2);
        assert_eq!(out.shortfalls[0].missing(), 1);
    }

    #[test]
    fn test_consecutive_cap_with_looser_daily_cap() {
        let cal = WeekCalendar::new(CalendarConfig::plain(vec![Weekday::Mon], 5, 0)).unwrap();
        let policy = SchedulingPolicy {
            max_daily_periods: 3,
            ..SchedulingPolicy::default()
        };
        let cat = catalog(
            vec![Subject::new("math", 3).with_grades([12])],
            vec![Teacher::new("T01", "math")],
        );
        let mut tracker = AvailabilityTracker::new();

        let out = run(&cal, &policy, &cat, "12A1", &mut tracker).unwrap();
        let periods: Vec<u8> = out
            .schedule
            .entries
            .iter()
            .filter(|e| e.is_lesson())
            .map(|e| e.slot.period)
            .collect();
        assert_eq!(periods, vec![1, 2, 4]);
    }

    #[test]
    fn test_session_scope_counts_halves_separately() {
        let cal = WeekCalendar::new(CalendarConfig::plain(vec![Weekday::Mon], 2, 2)).unwrap();
        let day_policy = SchedulingPolicy::default();
        let session_policy = SchedulingPolicy {
            cap_scope: CapScope::Session,
            ..SchedulingPolicy::default()
        };
        let cat = catalog(
            vec![Subject::new("math", 4).with_grades([12])],
            vec![Teacher::new("T01", "math")],
        );

        let out = run(&cal, &day_policy, &cat, "12A1", &mut AvailabilityTracker::new()).unwrap();
        assert_eq!(out.stats.filled_periods, 2);

        // Morning and afternoon each take two; runs do not span the boundary
        let out = run(&cal, &session_policy, &cat, "12A1", &mut AvailabilityTracker::new())
            .unwrap();
        assert_eq!(out.stats.filled_periods, 4);
        let sessions: BTreeSet<Session> = out
            .schedule
            .entries
            .iter()
            .filter(|e| e.is_lesson())
            .map(|e| e.slot.session)
            .collect();
        assert_eq!(sessions.len(), 2);
    }

    #[test]
    fn test_single_teacher_per_subject() {
        // T01 is free only 3 of 6 slots, T02 is free all week: T02 takes all 4.
        let cal = one_period_week();
        let policy = SchedulingPolicy::default();
        let cat = catalog(
            vec![Subject::new("math", 4).with_grades([12])],
            vec![Teacher::new("T01", "math"), Teacher::new("T02", "math")],
        );
        let mut tracker = AvailabilityTracker::new();
        for day in [Weekday::Mon, Weekday::Tue, Weekday::Wed] {
            let slot = cal.slot_at(day, 1).unwrap();
            tracker.commit(&"T01".into(), slot, &"12A2".into()).unwrap();
        }

        let out = run(&cal, &policy, &cat, "12A1", &mut tracker).unwrap();
        assert!(out.shortfalls.is_empty());
        let teachers = out.schedule.teachers_of_subject(&"math".into());
        assert_eq!(teachers.into_iter().collect::<Vec<_>>(), vec![&TeacherId::from("T02")]);
        assert_eq!(out.subject_teachers[&SubjectId::from("math")], TeacherId::from("T02"));
    }

    #[test]
    fn test_best_partial_teacher_chosen() {
        let cal = one_period_week();
        let policy = SchedulingPolicy::default();
        let cat = catalog(
            vec![Subject::new("math", 6).with_grades([12])],
            vec![Teacher::new("T01", "math"), Teacher::new("T02", "math")],
        );
        let mut tracker = AvailabilityTracker::new();
        let other = ClassId::from("12A2");
        for day in [Weekday::Mon, Weekday::Tue, Weekday::Wed] {
            tracker.commit(&"T01".into(), cal.slot_at(day, 1).unwrap(), &other).unwrap();
        }
        tracker.commit(&"T02".into(), cal.slot_at(Weekday::Sat, 1).unwrap(), &other).unwrap();

        let out = run(&cal, &policy, &cat, "12A1", &mut tracker).unwrap();
        assert_eq!(out.subject_teachers[&SubjectId::from("math")], TeacherId::from("T02"));
        assert_eq!(out.shortfalls[0].placed, 5);
    }

    #[test]
    fn test_catalog_incomplete_shortfall() {
        let cal = one_period_week();
        let policy = SchedulingPolicy::default();
        let cat = catalog(
            vec![
                Subject::new("math", 3).with_grades([12]),
                Subject::new("cs", 2).with_grades([12]),
            ],
            vec![Teacher::new("T01", "math")],
        );
        let mut tracker = AvailabilityTracker::new();

        let out = run(&cal, &policy, &cat, "12A1", &mut tracker).unwrap();
        assert_eq!(out.shortfalls.len(), 1);
        assert_eq!(out.shortfalls[0].reason, ShortfallReason::CatalogIncomplete);
        assert_eq!(out.stats.filled_periods, 3);
    }

    #[test]
    fn test_nothing_placed_fails_without_commits() {
        let cal = one_period_week();
        let policy = SchedulingPolicy::default();
        let cat = catalog(
            vec![Subject::new("math", 2).with_grades([12])],
            vec![Teacher::new("T01", "math")],
        );
        let mut tracker = AvailabilityTracker::new();
        for slot in cal.regular_slots() {
            tracker.commit(&"T01".into(), slot, &"12A2".into()).unwrap();
        }
        let before = tracker.commit_count();

        let err = run(&cal, &policy, &cat, "12A1", &mut tracker).unwrap_err();
        assert!(matches!(err, ScheduleError::NoEligibleTeacher { .. }));
        assert_eq!(tracker.commit_count(), before);

        let no_teacher = catalog(vec![Subject::new("cs", 2).with_grades([12])], vec![]);
        let err = run(&cal, &policy, &no_teacher, "12A1", &mut AvailabilityTracker::new())
            .unwrap_err();
        assert!(matches!(err, ScheduleError::CatalogIncomplete { .. }));
    }

    #[test]
    fn test_fixed_slots() {
        let cal = WeekCalendar::new(CalendarConfig::default()).unwrap();
        let policy = SchedulingPolicy::default();
        let cat = Catalog::new(
            vec![Subject::new("math", 4).with_grades([10])],
            vec![Teacher::new("T01", "math").with_homeroom("10A1")],
            vec![ClassGroup::new("10A1", 10), ClassGroup::new("10A2", 10)],
        )
        .unwrap();
        let mut tracker = AvailabilityTracker::new();

        let out = run(&cal, &policy, &cat, "10A1", &mut tracker).unwrap();
        let mon1 = cal.slot_at(Weekday::Mon, 1).unwrap();
        let sat5 = cal.slot_at(Weekday::Sat, 5).unwrap();

        let flag = out.schedule.entry_at(&mon1).unwrap();
        assert_eq!(flag.kind, PeriodKind::Fixed(FixedKind::FlagCeremony));
        assert!(flag.teacher_id.is_none());

        let homeroom = out.schedule.entry_at(&sat5).unwrap();
        assert_eq!(homeroom.kind, PeriodKind::Fixed(FixedKind::HomeroomActivity));
        assert_eq!(homeroom.teacher_id, Some(TeacherId::from("T01")));
        assert!(homeroom.subject_id.is_none());
        assert_eq!(tracker.holder(&"T01".into(), &sat5), Some(&ClassId::from("10A1")));
        // 4 lessons + homeroom activity
        assert_eq!(tracker.commit_count(), 5);
        assert_eq!(out.schedule.entries.len(), 30);
    }

    #[test]
    fn test_reserved_homeroom_slot_is_reused() {
        let cal = WeekCalendar::new(CalendarConfig::default()).unwrap();
        let policy = SchedulingPolicy::default();
        let cat = Catalog::new(
            vec![Subject::new("math", 2).with_grades([10])],
            vec![Teacher::new("T01", "math").with_homeroom("10A1")],
            vec![ClassGroup::new("10A1", 10)],
        )
        .unwrap();
        let sat5 = cal.slot_at(Weekday::Sat, 5).unwrap();
        let mut tracker = AvailabilityTracker::new();
        tracker.commit(&"T01".into(), sat5, &"10A1".into()).unwrap();

        let out = run(&cal, &policy, &cat, "10A1", &mut tracker).unwrap();
        assert_eq!(out.stats.unstaffed_fixed_periods, 0);
        assert_eq!(tracker.commit_count(), 3);
    }

    #[test]
    fn test_homeroom_teacher_held_elsewhere_leaves_unstaffed() {
        let cal = WeekCalendar::new(CalendarConfig::default()).unwrap();
        let policy = SchedulingPolicy::default();
        let cat = Catalog::new(
            vec![Subject::new("math", 2).with_grades([10])],
            vec![Teacher::new("T01", "math").with_homeroom("10A1")],
            vec![ClassGroup::new("10A1", 10)],
        )
        .unwrap();
        let sat5 = cal.slot_at(Weekday::Sat, 5).unwrap();
        let mut tracker = AvailabilityTracker::new();
        tracker.commit(&"T01".into(), sat5, &"11B2".into()).unwrap();

        let out = run(&cal, &policy, &cat, "10A1", &mut tracker).unwrap();
        assert_eq!(out.stats.unstaffed_fixed_periods, 1);
        assert_eq!(tracker.holder(&"T01".into(), &sat5), Some(&ClassId::from("11B2")));
    }

    #[test]
    fn test_commit_failure_rolls_back() {
        let mut tracker = AvailabilityTracker::new();
        let class = ClassId::from("10A1");
        let s = |p| Slot::new(Weekday::Mon, Session::Morning, p);
        tracker.commit(&"T02".into(), s(2), &"10A2".into()).unwrap();

        let pairs = vec![
            (TeacherId::from("T01"), s(1)),
            (TeacherId::from("T02"), s(2)),
        ];
        let err = commit_all(&mut tracker, &pairs, &class).unwrap_err();
        assert!(matches!(err, ScheduleError::DoubleBooking(_)));
        assert!(tracker.is_free(&"T01".into(), &s(1)));
        assert_eq!(tracker.held_count(), 1);
    }

    #[test]
    fn test_deterministic() {
        let cal = WeekCalendar::new(CalendarConfig::default()).unwrap();
        let policy = SchedulingPolicy::default();
        let cat = Catalog::new(
            vec![
                Subject::new("math", 5).with_grades([10]),
                Subject::new("lit", 5).with_grades([10]),
                Subject::new("eng", 3).with_grades([10]),
            ],
            vec![
                Teacher::new("T01", "math"),
                Teacher::new("T02", "lit"),
                Teacher::new("T03", "eng"),
            ],
            vec![ClassGroup::new("10A1", 10)],
        )
        .unwrap();

        let a = run(&cal, &policy, &cat, "10A1", &mut AvailabilityTracker::new()).unwrap();
        let b = run(&cal, &policy, &cat, "10A1", &mut AvailabilityTracker::new()).unwrap();
        assert_eq!(a, b);
    }
}
