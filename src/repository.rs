//! Schedule persistence boundary.
//!
//! The engine reads and writes weekly schedules only through
//! [`ScheduleRepository`], so any storage backend can sit behind it.
//! [`InMemoryRepository`] keeps everything in process memory and is what
//! tests and local runs use.
//!
//! # Invariant
//! At most one active schedule exists per (class, academic year,
//! semester). `save` enforces it.

use log::warn;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{RepositoryError, RepositoryResult};
use crate::models::{AcademicYear, ClassId, ScheduleEntry, Semester, TeacherId, WeeklySchedule};

/// Storage for weekly schedules.
///
/// Implementations must be `Send + Sync` so a repository can be shared
/// between threads. Retry policy for transient failures belongs to the
/// implementation.
pub trait ScheduleRepository: Send + Sync {
    /// The active schedule of a class, if any.
    fn find_active(
        &self,
        class: &ClassId,
        year: &AcademicYear,
        semester: Semester,
    ) -> RepositoryResult<Option<WeeklySchedule>>;

    /// All schedules (any status) of an academic year and semester.
    fn list(&self, year: &AcademicYear, semester: Semester)
        -> RepositoryResult<Vec<WeeklySchedule>>;

    /// Stores a schedule.
    ///
    /// Fails with [`RepositoryError::Conflict`] when saving an active
    /// schedule for a class that already has one.
    fn save(&self, schedule: WeeklySchedule) -> RepositoryResult<()>;

    /// Deletes every schedule of a class. Returns how many were removed.
    fn delete(
        &self,
        class: &ClassId,
        year: &AcademicYear,
        semester: Semester,
    ) -> RepositoryResult<usize>;

    /// Deletes every schedule of a year and semester, optionally only for
    /// one grade level. Returns how many were removed.
    fn delete_matching(
        &self,
        year: &AcademicYear,
        semester: Semester,
        grade_level: Option<u8>,
    ) -> RepositoryResult<usize>;

    /// Replaces every schedule of the class with `schedule`.
    ///
    /// If the new schedule cannot be stored, the removed ones are put
    /// back and the save error is returned. Backends with transactions
    /// should override this with an atomic swap.
    fn replace(&self, schedule: WeeklySchedule) -> RepositoryResult<()> {
        let previous: Vec<WeeklySchedule> = self
            .list(&schedule.academic_year, schedule.semester)?
            .into_iter()
            .filter(|s| s.class_id == schedule.class_id)
            .collect();
        self.delete(&schedule.class_id, &schedule.academic_year, schedule.semester)?;
        if let Err(e) = self.save(schedule) {
            for old in previous {
                let class = old.class_id.clone();
                if let Err(restore) = self.save(old) {
                    warn!("class {class}: could not restore replaced schedule: {restore}");
                }
            }
            return Err(e);
        }
        Ok(())
    }

    /// A teacher's week across all active schedules, in (slot, class) order.
    fn entries_for_teacher(
        &self,
        teacher: &TeacherId,
        year: &AcademicYear,
        semester: Semester,
    ) -> RepositoryResult<Vec<ScheduleEntry>> {
        let mut entries: Vec<ScheduleEntry> = self
            .list(year, semester)?
            .into_iter()
            .filter(WeeklySchedule::is_active)
            .flat_map(|s| s.entries)
            .filter(|e| e.teacher_id.as_ref() == Some(teacher))
            .collect();
        entries.sort_by(|a, b| a.slot.cmp(&b.slot).then_with(|| a.class_id.cmp(&b.class_id)));
        Ok(entries)
    }
}

/// In-memory repository.
///
/// Cloning shares the underlying storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    schedules: Arc<RwLock<Vec<WeeklySchedule>>>,
}

impl InMemoryRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored schedules.
    pub fn len(&self) -> RepositoryResult<usize> {
        Ok(self.read()?.len())
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> RepositoryResult<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> RepositoryResult<RwLockReadGuard<'_, Vec<WeeklySchedule>>> {
        self.schedules
            .read()
            .map_err(|e| RepositoryError::Storage(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> RepositoryResult<RwLockWriteGuard<'_, Vec<WeeklySchedule>>> {
        self.schedules
            .write()
            .map_err(|e| RepositoryError::Storage(format!("lock poisoned: {e}")))
    }
}

impl ScheduleRepository for InMemoryRepository {
    fn find_active(
        &self,
        class: &ClassId,
        year: &AcademicYear,
        semester: Semester,
    ) -> RepositoryResult<Option<WeeklySchedule>> {
        Ok(self
            .read()?
            .iter()
            .find(|s| s.is_active() && s.matches(class, year, semester))
            .cloned())
    }

    fn list(
        &self,
        year: &AcademicYear,
        semester: Semester,
    ) -> RepositoryResult<Vec<WeeklySchedule>> {
        Ok(self
            .read()?
            .iter()
            .filter(|s| &s.academic_year == year && s.semester == semester)
            .cloned()
            .collect())
    }

    fn save(&self, schedule: WeeklySchedule) -> RepositoryResult<()> {
        let mut schedules = self.write()?;
        if schedule.is_active()
            && schedules.iter().any(|s| {
                s.is_active()
                    && s.matches(&schedule.class_id, &schedule.academic_year, schedule.semester)
            })
        {
            return Err(RepositoryError::Conflict(format!(
                "class {} already has an active schedule for {} semester {}",
                schedule.class_id, schedule.academic_year, schedule.semester
            )));
        }
        schedules.push(schedule);
        Ok(())
    }

    fn delete(
        &self,
        class: &ClassId,
        year: &AcademicYear,
        semester: Semester,
    ) -> RepositoryResult<usize> {
        let mut schedules = self.write()?;
        let before = schedules.len();
        schedules.retain(|s| !s.matches(class, year, semester));
        Ok(before - schedules.len())
    }

    fn replace(&self, schedule: WeeklySchedule) -> RepositoryResult<()> {
        let mut schedules = self.write()?;
        schedules.retain(|s| {
            !s.matches(&schedule.class_id, &schedule.academic_year, schedule.semester)
        });
        schedules.push(schedule);
        Ok(())
    }

    fn delete_matching(
        &self,
        year: &AcademicYear,
        semester: Semester,
        grade_level: Option<u8>,
    ) -> RepositoryResult<usize> {
        let mut schedules = self.write()?;
        let before = schedules.len();
        schedules.retain(|s| {
            let hit = &s.academic_year == year
                && s.semester == semester
                && grade_level.map_or(true, |g| s.grade_level == g);
            !hit
        });
        Ok(before - schedules.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PeriodKind, Session, Slot, Weekday};

    fn year() -> AcademicYear {
        AcademicYear::starting(2024)
    }

    fn sem(n: u8) -> Semester {
        Semester::new(n).unwrap()
    }

    fn schedule(class: &str, grade: u8, semester: u8) -> WeeklySchedule {
        let c = ClassId::from(class);
        WeeklySchedule::draft(
            c.clone(),
            grade,
            year(),
            sem(semester),
            vec![
                ScheduleEntry::lesson(
                    c.clone(),
                    Slot::new(Weekday::Tue, Session::Morning, 1),
                    "math".into(),
                    "T01".into(),
                ),
                ScheduleEntry::empty(c, Slot::new(Weekday::Mon, Session::Morning, 1), PeriodKind::Regular),
            ],
        )
    }

    #[test]
    fn test_save_and_find_active() {
        let repo = InMemoryRepository::new();
        repo.save(schedule("10A1", 10, 1)).unwrap();
        // Drafts are not active
        assert!(repo.find_active(&"10A1".into(), &year(), sem(1)).unwrap().is_none());

        repo.save(schedule("10A1", 10, 1).activate()).unwrap();
        let found = repo.find_active(&"10A1".into(), &year(), sem(1)).unwrap();
        assert!(found.is_some_and(|s| s.is_active()));
        assert!(repo.find_active(&"10A1".into(), &year(), sem(2)).unwrap().is_none());
        assert_eq!(repo.len().unwrap(), 2);
    }

    #[test]
    fn test_second_active_conflicts() {
        let repo = InMemoryRepository::new();
        repo.save(schedule("10A1", 10, 1).activate()).unwrap();
        let err = repo.save(schedule("10A1", 10, 1).activate()).unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
        // Another semester is fine
        repo.save(schedule("10A1", 10, 2).activate()).unwrap();
    }

    #[test]
    fn test_delete() {
        let repo = InMemoryRepository::new();
        repo.save(schedule("10A1", 10, 1).activate()).unwrap();
        repo.save(schedule("10A1", 10, 1)).unwrap();
        repo.save(schedule("10A2", 10, 1).activate()).unwrap();

        assert_eq!(repo.delete(&"10A1".into(), &year(), sem(1)).unwrap(), 2);
        assert_eq!(repo.len().unwrap(), 1);
    }

    #[test]
    fn test_replace_swaps_active_schedule() {
        let repo = InMemoryRepository::new();
        repo.save(schedule("10A1", 10, 1).activate()).unwrap();
        repo.save(schedule("10A1", 10, 1)).unwrap();
        repo.save(schedule("10A2", 10, 1).activate()).unwrap();

        let mut next = schedule("10A1", 10, 1).activate();
        next.entries.pop();
        repo.replace(next.clone()).unwrap();

        assert_eq!(repo.len().unwrap(), 2);
        assert_eq!(
            repo.find_active(&"10A1".into(), &year(), sem(1)).unwrap(),
            Some(next)
        );
    }

    #[test]
    fn test_delete_matching_by_grade() {
        let repo = InMemoryRepository::new();
        repo.save(schedule("10A1", 10, 1).activate()).unwrap();
        repo.save(schedule("11A1", 11, 1).activate()).unwrap();
        repo.save(schedule("11A1", 11, 2).activate()).unwrap();

        assert_eq!(repo.delete_matching(&year(), sem(1), Some(11)).unwrap(), 1);
        assert_eq!(repo.delete_matching(&year(), sem(1), None).unwrap(), 1);
        assert_eq!(repo.list(&year(), sem(2)).unwrap().len(), 1);
        assert!(repo.list(&year(), sem(1)).unwrap().is_empty());
    }

    #[test]
    fn test_entries_for_teacher() {
        let repo = InMemoryRepository::new();
        repo.save(schedule("10A2", 10, 1).activate()).unwrap();
        repo.save(schedule("10A1", 10, 1)).unwrap(); // draft, ignored

        let entries = repo.entries_for_teacher(&"T01".into(), &year(), sem(1)).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].class_id.as_str(), "10A2");
        assert!(repo
            .entries_for_teacher(&"T09".into(), &year(), sem(1))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_clones_share_storage() {
        let repo = InMemoryRepository::new();
        let other = repo.clone();
        other.save(schedule("10A1", 10, 1)).unwrap();
        assert!(!repo.is_empty().unwrap());
    }
}
