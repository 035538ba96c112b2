//! Domain catalog: subjects, teachers and classes.
//!
//! The catalog is a read-only snapshot taken once at the start of a batch
//! run. The engine never re-queries the underlying records mid-run, so it
//! always works on a consistent view.
//!
//! # Domain Rules
//! - A teacher teaches exactly one subject (subject affinity).
//! - A teacher may be homeroom teacher of at most one class.
//! - A subject lists the grade levels it is taught in and how many
//!   periods per week it needs.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{ClassId, SubjectId, TeacherId};
use crate::error::CatalogError;
use crate::validation::validate_catalog;

/// A subject taught in one or more grade levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    /// Required periods per week.
    pub weekly_hours: u32,
    /// Grade levels this subject is taught in.
    pub eligible_grades: BTreeSet<u8>,
}

impl Subject {
    /// Creates a subject with no eligible grades yet.
    pub fn new(id: impl Into<SubjectId>, weekly_hours: u32) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            weekly_hours,
            eligible_grades: BTreeSet::new(),
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds eligible grade levels.
    pub fn with_grades(mut self, grades: impl IntoIterator<Item = u8>) -> Self {
        self.eligible_grades.extend(grades);
        self
    }

    /// Whether the subject is taught in `grade`.
    pub fn is_taught_in(&self, grade: u8) -> bool {
        self.eligible_grades.contains(&grade)
    }
}

/// A teacher with a single subject affinity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    pub name: String,
    pub subject_id: SubjectId,
    /// Class this teacher is homeroom teacher of, if any.
    pub homeroom_class_id: Option<ClassId>,
}

impl Teacher {
    /// Creates a teacher of `subject`.
    pub fn new(id: impl Into<TeacherId>, subject: impl Into<SubjectId>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            subject_id: subject.into(),
            homeroom_class_id: None,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Binds the teacher as homeroom teacher of `class`.
    pub fn with_homeroom(mut self, class: impl Into<ClassId>) -> Self {
        self.homeroom_class_id = Some(class.into());
        self
    }
}

/// A class (homeroom group) of students in one grade level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassGroup {
    pub id: ClassId,
    pub name: String,
    pub grade_level: u8,
    pub homeroom_teacher_id: Option<TeacherId>,
}

impl ClassGroup {
    /// Creates a class in `grade_level`.
    pub fn new(id: impl Into<ClassId>, grade_level: u8) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            grade_level,
            homeroom_teacher_id: None,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the homeroom teacher.
    pub fn with_homeroom_teacher(mut self, teacher: impl Into<TeacherId>) -> Self {
        self.homeroom_teacher_id = Some(teacher.into());
        self
    }
}

/// Weekly hour requirement of one subject, as seen by one grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRequirement {
    pub subject_id: SubjectId,
    pub weekly_hours: u32,
    pub eligible_grades: BTreeSet<u8>,
}

impl From<&Subject> for SubjectRequirement {
    fn from(subject: &Subject) -> Self {
        Self {
            subject_id: subject.id.clone(),
            weekly_hours: subject.weekly_hours,
            eligible_grades: subject.eligible_grades.clone(),
        }
    }
}

/// Validated, immutable catalog snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Catalog {
    subjects: BTreeMap<SubjectId, Subject>,
    teachers: BTreeMap<TeacherId, Teacher>,
    classes: BTreeMap<ClassId, ClassGroup>,
}

impl Catalog {
    /// Builds a catalog, reporting every integrity problem found.
    pub fn new(
        subjects: Vec<Subject>,
        teachers: Vec<Teacher>,
        classes: Vec<ClassGroup>,
    ) -> Result<Self, CatalogError> {
        validate_catalog(&subjects, &teachers, &classes).map_err(CatalogError::Invalid)?;

        Ok(Self {
            subjects: subjects.into_iter().map(|s| (s.id.clone(), s)).collect(),
            teachers: teachers.into_iter().map(|t| (t.id.clone(), t)).collect(),
            classes: classes.into_iter().map(|c| (c.id.clone(), c)).collect(),
        })
    }

    /// Requirements of every subject taught in `grade`, in subject id order.
    pub fn subjects_for_grade(&self, grade: u8) -> Vec<SubjectRequirement> {
        self.subjects
            .values()
            .filter(|s| s.is_taught_in(grade))
            .map(SubjectRequirement::from)
            .collect()
    }

    /// Teachers whose affinity is `subject`, in id order.
    pub fn teachers_for_subject(&self, subject: &SubjectId) -> Vec<TeacherId> {
        self.teachers
            .values()
            .filter(|t| &t.subject_id == subject)
            .map(|t| t.id.clone())
            .collect()
    }

    /// Homeroom teacher of a class.
    ///
    /// The class record wins; otherwise a teacher record naming the class.
    pub fn homeroom_teacher_of(&self, class: &ClassId) -> Option<TeacherId> {
        if let Some(id) = self
            .classes
            .get(class)
            .and_then(|c| c.homeroom_teacher_id.clone())
        {
            return Some(id);
        }
        self.teachers
            .values()
            .find(|t| t.homeroom_class_id.as_ref() == Some(class))
            .map(|t| t.id.clone())
    }

    /// Classes in id order, optionally restricted to one grade level.
    pub fn classes(&self, grade: Option<u8>) -> Vec<&ClassGroup> {
        self.classes
            .values()
            .filter(|c| grade.map_or(true, |g| c.grade_level == g))
            .collect()
    }

    pub fn subject(&self, id: &SubjectId) -> Option<&Subject> {
        self.subjects.get(id)
    }

    pub fn teacher(&self, id: &TeacherId) -> Option<&Teacher> {
        self.teachers.get(id)
    }

    pub fn class(&self, id: &ClassId) -> Option<&ClassGroup> {
        self.classes.get(id)
    }

    /// Number of teachers.
    pub fn teacher_count(&self) -> usize {
        self.teachers.len()
    }
}

/// Where a batch run takes its catalog snapshot from.
///
/// Implemented by whatever fronts the school records (database, API).
pub trait CatalogSource {
    /// Loads a fresh snapshot.
    fn load(&self) -> Result<Catalog, CatalogError>;
}

impl CatalogSource for Catalog {
    fn load(&self) -> Result<Catalog, CatalogError> {
        Ok(self.clone())
    }
}
