//! Weekly schedule (solution) model.
//!
//! A weekly schedule holds one entry per (class, slot) for a class in one
//! academic year and semester. Entries are immutable once produced; a
//! schedule is replaced only by regenerating it as a whole.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{
    AcademicYear, Catalog, ClassId, FixedKind, Semester, Slot, SlotKind, Subject, SubjectId,
    Teacher, TeacherId,
};

/// What occupies a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodKind {
    /// Subject lesson (or an unfilled regular slot when subject is `None`).
    Regular,
    /// Reserved activity from the calendar.
    Fixed(FixedKind),
    /// Slot not in use.
    Unavailable,
}

impl From<SlotKind> for PeriodKind {
    fn from(kind: SlotKind) -> Self {
        match kind {
            SlotKind::Regular => PeriodKind::Regular,
            SlotKind::Fixed(f) => PeriodKind::Fixed(f),
            SlotKind::Unavailable => PeriodKind::Unavailable,
        }
    }
}

/// One period of a class's week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub class_id: ClassId,
    pub slot: Slot,
    pub subject_id: Option<SubjectId>,
    pub teacher_id: Option<TeacherId>,
    pub kind: PeriodKind,
}

impl ScheduleEntry {
    /// An empty entry of the given kind.
    pub fn empty(class_id: ClassId, slot: Slot, kind: PeriodKind) -> Self {
        Self {
            class_id,
            slot,
            subject_id: None,
            teacher_id: None,
            kind,
        }
    }

    /// A subject lesson.
    pub fn lesson(class_id: ClassId, slot: Slot, subject: SubjectId, teacher: TeacherId) -> Self {
        Self {
            class_id,
            slot,
            subject_id: Some(subject),
            teacher_id: Some(teacher),
            kind: PeriodKind::Regular,
        }
    }

    /// Whether this is a regular slot with a subject placed in it.
    pub fn is_lesson(&self) -> bool {
        self.kind == PeriodKind::Regular && self.subject_id.is_some()
    }

    /// Whether this is a regular slot left empty.
    pub fn is_unfilled(&self) -> bool {
        self.kind == PeriodKind::Regular && self.subject_id.is_none()
    }
}

/// Lifecycle of a weekly schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleStatus {
    Draft,
    Active,
}

/// A class's weekly timetable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub class_id: ClassId,
    pub grade_level: u8,
    pub academic_year: AcademicYear,
    pub semester: Semester,
    pub status: ScheduleStatus,
    /// Entries in slot scan order.
    pub entries: Vec<ScheduleEntry>,
}

/// An entry with its references expanded to catalog records.
#[derive(Debug, Clone, Copy)]
pub struct EntryView<'a> {
    pub entry: &'a ScheduleEntry,
    pub subject: Option<&'a Subject>,
    pub teacher: Option<&'a Teacher>,
}

impl WeeklySchedule {
    /// Creates a draft schedule.
    pub fn draft(
        class_id: ClassId,
        grade_level: u8,
        academic_year: AcademicYear,
        semester: Semester,
        entries: Vec<ScheduleEntry>,
    ) -> Self {
        Self {
            class_id,
            grade_level,
            academic_year,
            semester,
            status: ScheduleStatus::Draft,
            entries,
        }
    }

    /// Promotes the schedule to active.
    pub fn activate(mut self) -> Self {
        self.status = ScheduleStatus::Active;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == ScheduleStatus::Active
    }

    /// Whether this schedule belongs to (class, year, semester).
    pub fn matches(&self, class: &ClassId, year: &AcademicYear, semester: Semester) -> bool {
        &self.class_id == class && &self.academic_year == year && self.semester == semester
    }

    /// Entry at a slot.
    pub fn entry_at(&self, slot: &Slot) -> Option<&ScheduleEntry> {
        self.entries.iter().find(|e| &e.slot == slot)
    }

    /// Entries taught by a teacher.
    pub fn entries_for_teacher(&self, teacher: &TeacherId) -> Vec<&ScheduleEntry> {
        self.entries
            .iter()
            .filter(|e| e.teacher_id.as_ref() == Some(teacher))
            .collect()
    }

    /// Lessons placed per subject.
    pub fn hours_by_subject(&self) -> BTreeMap<SubjectId, u32> {
        let mut hours = BTreeMap::new();
        for e in self.entries.iter().filter(|e| e.is_lesson()) {
            if let Some(s) = &e.subject_id {
                *hours.entry(s.clone()).or_insert(0) += 1;
            }
        }
        hours
    }

    /// Distinct teachers assigned to a subject in this schedule.
    pub fn teachers_of_subject(&self, subject: &SubjectId) -> BTreeSet<&TeacherId> {
        self.entries
            .iter()
            .filter(|e| e.subject_id.as_ref() == Some(subject))
            .filter_map(|e| e.teacher_id.as_ref())
            .collect()
    }

    /// Expands id references to catalog records.
    ///
    /// References the catalog does not know resolve to `None`.
    pub fn expand<'a>(&'a self, catalog: &'a Catalog) -> Vec<EntryView<'a>> {
        self.entries
            .iter()
            .map(|entry| EntryView {
                entry,
                subject: entry.subject_id.as_ref().and_then(|id| catalog.subject(id)),
                teacher: entry.teacher_id.as_ref().and_then(|id| catalog.teacher(id)),
            })
            .collect()
    }
}
