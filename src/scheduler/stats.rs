//! Timetable quality statistics.
//!
//! Computes per-class indicators from a generated weekly schedule and the
//! shortfalls recorded while producing it.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Filled periods | Regular slots with a subject placed |
//! | Unfilled periods | Regular slots left empty |
//! | Fixed periods | Reserved slots (ceremony, homeroom activity) |
//! | Unstaffed fixed | Homeroom activities without their teacher |
//! | Shortfall hours | Required hours that could not be placed |
//! | Fill rate | Filled / regular slots |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::Shortfall;
use crate::models::{FixedKind, PeriodKind, SubjectId, WeeklySchedule};

/// Per-class schedule indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassStats {
    pub regular_slots: u32,
    pub filled_periods: u32,
    pub unfilled_periods: u32,
    pub fixed_periods: u32,
    pub unstaffed_fixed_periods: u32,
    pub shortfall_hours: u32,
    /// Fraction of regular slots filled (0.0..1.0).
    pub fill_rate: f64,
    pub hours_by_subject: BTreeMap<SubjectId, u32>,
}

impl ClassStats {
    /// Computes statistics for a schedule.
    pub fn calculate(schedule: &WeeklySchedule, shortfalls: &[Shortfall]) -> Self {
        let mut filled = 0;
        let mut unfilled = 0;
        let mut fixed = 0;
        let mut unstaffed = 0;

        for e in &schedule.entries {
            match e.kind {
                PeriodKind::Regular if e.subject_id.is_some() => filled += 1,
                PeriodKind::Regular => unfilled += 1,
                PeriodKind::Fixed(kind) => {
                    fixed += 1;
                    if kind == FixedKind::HomeroomActivity && e.teacher_id.is_none() {
                        unstaffed += 1;
                    }
                }
                PeriodKind::Unavailable => {}
            }
        }

        let regular_slots = filled + unfilled;
        let fill_rate = if regular_slots == 0 {
            0.0
        } else {
            f64::from(filled) / f64::from(regular_slots)
        };

        Self {
            regular_slots,
            filled_periods: filled,
            unfilled_periods: unfilled,
            fixed_periods: fixed,
            unstaffed_fixed_periods: unstaffed,
            shortfall_hours: shortfalls.iter().map(Shortfall::missing).sum(),
            fill_rate,
            hours_by_subject: schedule.hours_by_subject(),
        }
    }

    /// Whether every required hour was placed.
    pub fn is_complete(&self) -> bool {
        self.shortfall_hours == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AcademicYear, ClassId, ScheduleEntry, Semester, Session, Slot, Weekday};
    use crate::scheduler::ShortfallReason;

    #[test]
    fn test_stats() {
        let c = ClassId::from("10A1");
        let s = |p| Slot::new(Weekday::Mon, Session::Morning, p);
        let schedule = WeeklySchedule::draft(
            c.clone(),
            10,
            AcademicYear::starting(2024),
            Semester::new(1).unwrap(),
            vec![
                ScheduleEntry::empty(c.clone(), s(1), PeriodKind::Fixed(FixedKind::FlagCeremony)),
                ScheduleEntry::lesson(c.clone(), s(2), "math".into(), "T01".into()),
                ScheduleEntry::lesson(c.clone(), s(3), "math".into(), "T01".into()),
                ScheduleEntry::empty(c.clone(), s(4), PeriodKind::Regular),
                ScheduleEntry::empty(c, s(5), PeriodKind::Fixed(FixedKind::HomeroomActivity)),
            ],
        );
        let shortfalls = vec![Shortfall {
            subject_id: "math".into(),
            required: 3,
            placed: 2,
            reason: ShortfallReason::Partial,
        }];

        let stats = ClassStats::calculate(&schedule, &shortfalls);
        assert_eq!(stats.regular_slots, 3);
        assert_eq!(stats.filled_periods, 2);
        assert_eq!(stats.unfilled_periods, 1);
        assert_eq!(stats.fixed_periods, 2);
        assert_eq!(stats.unstaffed_fixed_periods, 1);
        assert_eq!(stats.shortfall_hours, 1);
        assert!((stats.fill_rate - 2.0 / 3.0).abs() < 1e-10);
        assert_eq!(stats.hours_by_subject[&SubjectId::from("math")], 2);
        assert!(!stats.is_complete());
    }
}
