//! Timetabling domain models.
//!
//! Provides the data types describing a school week, the records the
//! engine schedules over, and the timetables it produces.
//!
//! # Domain Mappings
//!
//! | u-timetable | Generic scheduling |
//! |-------------|--------------------|
//! | Slot | Time bucket |
//! | Teacher | Resource (unit capacity) |
//! | ClassGroup | Task |
//! | SubjectRequirement | Activity demand |
//! | WeeklySchedule | Schedule |

mod calendar;
mod catalog;
mod ids;
mod schedule;

pub use calendar::{
    CalendarConfig, FixedKind, FixedSlotConfig, Session, SessionConfig, Slot, SlotKey, SlotKind,
    TimeRange, WeekCalendar, Weekday,
};
pub use catalog::{Catalog, CatalogSource, ClassGroup, Subject, SubjectRequirement, Teacher};
pub use ids::{AcademicYear, ClassId, Semester, SubjectId, TeacherId};
pub use schedule::{EntryView, PeriodKind, ScheduleEntry, ScheduleStatus, WeeklySchedule};
