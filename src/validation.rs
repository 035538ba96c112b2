//! Integrity checks for catalog snapshots.
//!
//! Checks structural integrity of subjects, teachers and classes before
//! any scheduling. Detects:
//! - Duplicate IDs
//! - Teachers bound to unknown subjects or classes
//! - Classes naming unknown homeroom teachers
//! - Homeroom links that are shared or contradict each other
//!
//! All problems are collected; validation does not stop at the first one.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{ClassGroup, ClassId, Subject, Teacher, TeacherId};

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationErrorKind {
    /// Two entities of the same type share an ID.
    DuplicateId,
    /// A teacher's subject affinity names a subject that doesn't exist.
    UnknownSubject,
    /// A reference names a class that doesn't exist.
    UnknownClass,
    /// A reference names a teacher that doesn't exist.
    UnknownTeacher,
    /// One teacher is homeroom teacher of more than one class.
    SharedHomeroom,
    /// Class and teacher records disagree about a homeroom binding.
    HomeroomMismatch,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates a catalog snapshot.
///
/// Checks:
/// 1. No duplicate subject, teacher or class IDs
/// 2. Every teacher's subject exists
/// 3. Every teacher's homeroom class exists
/// 4. Every class's homeroom teacher exists
/// 5. No teacher is homeroom teacher of two classes
/// 6. Class-side and teacher-side homeroom links agree
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_catalog(
    subjects: &[Subject],
    teachers: &[Teacher],
    classes: &[ClassGroup],
) -> ValidationResult {
    let mut errors = Vec::new();

    let mut subject_ids = BTreeSet::new();
    for s in subjects {
        if !subject_ids.insert(&s.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate subject ID: {}", s.id),
            ));
        }
    }

    let mut teacher_ids = BTreeSet::new();
    for t in teachers {
        if !teacher_ids.insert(&t.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate teacher ID: {}", t.id),
            ));
        }
    }

    let mut class_ids = BTreeSet::new();
    for c in classes {
        if !class_ids.insert(&c.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate class ID: {}", c.id),
            ));
        }
    }

    // Teacher references
    let mut homeroom_by_teacher: BTreeMap<&TeacherId, &ClassId> = BTreeMap::new();
    for t in teachers {
        if !subject_ids.contains(&t.subject_id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownSubject,
                format!("Teacher '{}' teaches unknown subject '{}'", t.id, t.subject_id),
            ));
        }
        if let Some(class) = &t.homeroom_class_id {
            if !class_ids.contains(class) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::UnknownClass,
                    format!("Teacher '{}' is homeroom teacher of unknown class '{}'", t.id, class),
                ));
            }
            homeroom_by_teacher.insert(&t.id, class);
        }
    }

    // Class references
    let mut classes_by_homeroom: BTreeMap<&TeacherId, Vec<&ClassId>> = BTreeMap::new();
    for c in classes {
        let Some(teacher) = &c.homeroom_teacher_id else {
            continue;
        };
        if !teacher_ids.contains(teacher) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownTeacher,
                format!("Class '{}' has unknown homeroom teacher '{}'", c.id, teacher),
            ));
        }
        if let Some(bound) = homeroom_by_teacher.get(teacher) {
            if *bound != &c.id {
                errors.push(ValidationError::new(
                    ValidationErrorKind::HomeroomMismatch,
                    format!(
                        "Class '{}' names '{}' as homeroom teacher, but that teacher is bound to class '{}'",
                        c.id, teacher, bound
                    ),
                ));
            }
        }
        classes_by_homeroom.entry(teacher).or_default().push(&c.id);
    }

    // A teacher bound to a class by the teacher record, while that class
    // names a different homeroom teacher.
    let class_by_id: BTreeMap<&ClassId, &ClassGroup> = classes.iter().map(|c| (&c.id, c)).collect();
    for (teacher, class) in &homeroom_by_teacher {
        if let Some(other) = class_by_id
            .get(class)
            .and_then(|c| c.homeroom_teacher_id.as_ref())
        {
            if other != *teacher {
                errors.push(ValidationError::new(
                    ValidationErrorKind::HomeroomMismatch,
                    format!(
                        "Teacher '{}' is bound to class '{}', but the class names '{}'",
                        teacher, class, other
                    ),
                ));
            }
        }
    }

    for (teacher, bound) in &classes_by_homeroom {
        if bound.len() > 1 {
            let names: Vec<&str> = bound.iter().map(|c| c.as_str()).collect();
            errors.push(ValidationError::new(
                ValidationErrorKind::SharedHomeroom,
                format!(
                    "Teacher '{}' is homeroom teacher of several classes: {}",
                    teacher,
                    names.join(", ")
                ),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
