//! Batch timetable generation.
//!
//! # Algorithm
//!
//! 1. Load one catalog snapshot.
//! 2. Walk the requested classes in id order. A class that already has an
//!    active schedule is skipped unless the policy says to overwrite.
//! 3. If anything is left to generate, seed a fresh availability tracker
//!    with the occupancy of every active schedule of the same year and
//!    semester, and reserve homeroom-activity slots for the homeroom
//!    teachers of the classes about to be generated.
//! 4. Schedule the classes one at a time against the shared tracker,
//!    persisting each success as active. A class being regenerated frees
//!    its old slots just before its turn.
//!
//! Per-class failures become result records; the batch carries on. A
//! class that fails keeps its stored schedule, and that schedule keeps
//! holding its teachers for the rest of the run.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{ClassOutcome, ClassScheduler, ClassStats, Shortfall};
use crate::availability::AvailabilityTracker;
use crate::config::{EngineConfig, SchedulingPolicy};
use crate::error::{ConfigError, EngineError, RepositoryResult, ScheduleError, TrackerError};
use crate::models::{
    AcademicYear, Catalog, CatalogSource, ClassGroup, ClassId, FixedKind, Semester, TeacherId,
    WeekCalendar, WeeklySchedule,
};
use crate::repository::ScheduleRepository;

/// Parameters of a batch run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub academic_year: AcademicYear,
    pub semester: Semester,
    /// Restrict the run to one grade level.
    pub grade_level: Option<u8>,
}

impl BatchRequest {
    /// Creates a request from typed parameters.
    pub fn new(academic_year: AcademicYear, semester: Semester, grade_level: Option<u8>) -> Self {
        Self {
            academic_year,
            semester,
            grade_level,
        }
    }

    /// Creates a request from raw parameters (`academic_year` as `YYYY-YYYY`).
    pub fn parse(
        academic_year: &str,
        semester: u8,
        grade_level: Option<u8>,
    ) -> Result<Self, EngineError> {
        let academic_year = academic_year
            .parse()
            .map_err(EngineError::InvalidRequest)?;
        let semester = Semester::new(semester).map_err(EngineError::InvalidRequest)?;
        Ok(Self::new(academic_year, semester, grade_level))
    }
}

/// Outcome of one class in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassStatus {
    Created,
    Skipped,
    Failed,
}

/// Classification of a failed class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    CapacityExceeded,
    NoEligibleTeacher,
    CatalogIncomplete,
    /// The schedule was built but could not be stored.
    Persistence,
}

/// Per-class line of a run summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassResult {
    pub class_id: ClassId,
    pub grade_level: u8,
    pub status: ClassStatus,
    pub failure: Option<FailureKind>,
    /// Human-readable explanation for non-created classes.
    pub reason: Option<String>,
    pub shortfalls: Vec<Shortfall>,
    pub stats: Option<ClassStats>,
}

impl ClassResult {
    fn created(class: &ClassGroup, outcome: ClassOutcome) -> Self {
        Self {
            class_id: class.id.clone(),
            grade_level: class.grade_level,
            status: ClassStatus::Created,
            failure: None,
            reason: None,
            shortfalls: outcome.shortfalls,
            stats: Some(outcome.stats),
        }
    }

    fn skipped(class: &ClassGroup) -> Self {
        Self {
            class_id: class.id.clone(),
            grade_level: class.grade_level,
            status: ClassStatus::Skipped,
            failure: None,
            reason: Some("an active schedule already exists".to_string()),
            shortfalls: Vec::new(),
            stats: None,
        }
    }

    fn failed(class: &ClassGroup, kind: FailureKind, reason: String) -> Self {
        Self {
            class_id: class.id.clone(),
            grade_level: class.grade_level,
            status: ClassStatus::Failed,
            failure: Some(kind),
            reason: Some(reason),
            shortfalls: Vec::new(),
            stats: None,
        }
    }
}

/// Aggregate report of a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub academic_year: AcademicYear,
    pub semester: Semester,
    pub grade_level: Option<u8>,
    pub total_classes: usize,
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
    /// One line per class attempted, in class id order.
    pub per_class_results: Vec<ClassResult>,
    /// Periods assigned to each teacher by the classes created in this run.
    pub per_teacher_hours: BTreeMap<TeacherId, u32>,
    /// Commits accepted by the run's availability tracker.
    pub tracker_commits: usize,
}

impl RunSummary {
    fn new(request: &BatchRequest) -> Self {
        Self {
            academic_year: request.academic_year,
            semester: request.semester,
            grade_level: request.grade_level,
            total_classes: 0,
            created: 0,
            skipped: 0,
            failed: 0,
            per_class_results: Vec::new(),
            per_teacher_hours: BTreeMap::new(),
            tracker_commits: 0,
        }
    }

    fn record(&mut self, result: ClassResult) {
        self.total_classes += 1;
        match result.status {
            ClassStatus::Created => self.created += 1,
            ClassStatus::Skipped => self.skipped += 1,
            ClassStatus::Failed => self.failed += 1,
        }
        self.per_class_results.push(result);
    }

    fn add_teacher_hours(&mut self, schedule: &WeeklySchedule) {
        for teacher in schedule.entries.iter().filter_map(|e| e.teacher_id.as_ref()) {
            *self.per_teacher_hours.entry(teacher.clone()).or_insert(0) += 1;
        }
    }

    /// Result line for a class.
    pub fn result_for(&self, class: &ClassId) -> Option<&ClassResult> {
        self.per_class_results.iter().find(|r| &r.class_id == class)
    }

    /// Whether every attempted class ended up with a schedule.
    pub fn all_scheduled(&self) -> bool {
        self.failed == 0
    }
}

/// Drives timetable generation for many classes.
///
/// Classes are scheduled strictly one at a time against a tracker that
/// lives only for the duration of one call.
#[derive(Debug)]
pub struct BatchOrchestrator<S, R> {
    source: S,
    repository: R,
    calendar: WeekCalendar,
    policy: SchedulingPolicy,
}

impl<S: CatalogSource, R: ScheduleRepository> BatchOrchestrator<S, R> {
    /// Creates an orchestrator.
    pub fn new(source: S, repository: R, calendar: WeekCalendar, policy: SchedulingPolicy) -> Self {
        Self {
            source,
            repository,
            calendar,
            policy,
        }
    }

    /// Creates an orchestrator from a loaded configuration.
    pub fn from_config(source: S, repository: R, config: &EngineConfig) -> Result<Self, ConfigError> {
        config.policy.validate()?;
        Ok(Self::new(
            source,
            repository,
            config.week_calendar()?,
            config.policy.clone(),
        ))
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn calendar(&self) -> &WeekCalendar {
        &self.calendar
    }

    pub fn policy(&self) -> &SchedulingPolicy {
        &self.policy
    }

    /// Generates timetables for every class matching the request.
    ///
    /// Fails only if the catalog cannot be loaded, the repository cannot be
    /// queried while planning the run, or a double booking is attempted.
    pub fn initialize(&self, request: &BatchRequest) -> Result<RunSummary, EngineError> {
        let year = request.academic_year;
        let semester = request.semester;
        info!(
            "generating timetables for {year} semester {semester}, grade {}",
            request
                .grade_level
                .map_or_else(|| "all".to_string(), |g| g.to_string())
        );

        debug!(
            "calendar: {} day(s), {} regular slot(s)",
            self.calendar.config().days.len(),
            self.calendar.regular_slot_count()
        );
        let catalog = self.source.load()?;
        debug!("catalog loaded: {} teacher(s)", catalog.teacher_count());
        let mut summary = RunSummary::new(request);

        let mut to_generate: Vec<&ClassGroup> = Vec::new();
        let mut replacing: BTreeMap<ClassId, WeeklySchedule> = BTreeMap::new();
        for class in catalog.classes(request.grade_level) {
            if let Some(existing) = self.repository.find_active(&class.id, &year, semester)? {
                if !self.policy.overwrite {
                    info!("class {}: active schedule exists, skipping", class.id);
                    summary.record(ClassResult::skipped(class));
                    continue;
                }
                debug!("class {}: active schedule will be replaced", class.id);
                replacing.insert(class.id.clone(), existing);
            }
            to_generate.push(class);
        }

        if to_generate.is_empty() {
            info!("nothing to generate ({} skipped)", summary.skipped);
            return Ok(summary);
        }

        let mut tracker = AvailabilityTracker::new();
        self.seed_existing(&mut tracker, request)?;
        self.reserve_homerooms(&mut tracker, &catalog, &to_generate);

        let scheduler = ClassScheduler::new(&self.calendar, &self.policy);
        for class in to_generate {
            let previous = replacing.get(&class.id);
            if let Some(old) = previous {
                release_schedule(&mut tracker, old);
            }
            let requirements = catalog.subjects_for_grade(class.grade_level);
            let result =
                scheduler.schedule(class, &requirements, &catalog, year, semester, &mut tracker);
            match result {
                Ok(outcome) => match self.persist(outcome.schedule.clone()) {
                    Ok(()) => {
                        info!(
                            "class {}: created ({} periods, {} short)",
                            class.id, outcome.stats.filled_periods, outcome.stats.shortfall_hours
                        );
                        summary.add_teacher_hours(&outcome.schedule);
                        summary.record(ClassResult::created(class, outcome));
                    }
                    Err(e) => {
                        warn!("class {}: failed to store schedule: {e}", class.id);
                        roll_back(&mut tracker, &class.id, previous);
                        summary.record(ClassResult::failed(
                            class,
                            FailureKind::Persistence,
                            e.to_string(),
                        ));
                    }
                },
                Err(e) => {
                    let kind = failure_kind(&e)?;
                    warn!("class {}: {e}", class.id);
                    roll_back(&mut tracker, &class.id, previous);
                    summary.record(ClassResult::failed(class, kind, e.to_string()));
                }
            }
        }

        summary.tracker_commits = tracker.commit_count();
        summary
            .per_class_results
            .sort_by(|a, b| a.class_id.cmp(&b.class_id));
        info!(
            "run finished: {} created, {} skipped, {} failed",
            summary.created, summary.skipped, summary.failed
        );
        Ok(summary)
    }

    /// Deletes every schedule matching the request, regardless of status.
    pub fn cleanup(&self, request: &BatchRequest) -> Result<usize, EngineError> {
        let removed = self.repository.delete_matching(
            &request.academic_year,
            request.semester,
            request.grade_level,
        )?;
        info!(
            "removed {removed} schedule(s) for {} semester {}",
            request.academic_year, request.semester
        );
        Ok(removed)
    }

    /// Commits the occupancy of every stored active schedule, including
    /// the ones about to be regenerated.
    fn seed_existing(
        &self,
        tracker: &mut AvailabilityTracker,
        request: &BatchRequest,
    ) -> Result<(), EngineError> {
        let existing = self
            .repository
            .list(&request.academic_year, request.semester)?;
        for schedule in existing.iter().filter(|s| s.is_active()) {
            commit_schedule(tracker, schedule);
        }
        debug!("seeded tracker with {} existing commitment(s)", tracker.held_count());
        Ok(())
    }

    /// Holds homeroom-activity slots for the homeroom teachers of the
    /// classes about to be generated.
    fn reserve_homerooms(
        &self,
        tracker: &mut AvailabilityTracker,
        catalog: &Catalog,
        classes: &[&ClassGroup],
    ) {
        let slots = self.calendar.slots_of_kind(FixedKind::HomeroomActivity);
        for class in classes {
            let Some(teacher) = catalog.homeroom_teacher_of(&class.id) else {
                continue;
            };
            for slot in &slots {
                if tracker.holder(&teacher, slot) == Some(&class.id) {
                    continue;
                }
                if let Err(e) = tracker.commit(&teacher, *slot, &class.id) {
                    warn!("class {}: cannot reserve homeroom activity: {e}", class.id);
                }
            }
        }
    }

    fn persist(&self, schedule: WeeklySchedule) -> RepositoryResult<()> {
        if self.policy.overwrite {
            self.repository.replace(schedule.activate())
        } else {
            self.repository.save(schedule.activate())
        }
    }
}

fn commit_schedule(tracker: &mut AvailabilityTracker, schedule: &WeeklySchedule) {
    for entry in &schedule.entries {
        let Some(teacher) = &entry.teacher_id else {
            continue;
        };
        if let Err(e) = tracker.commit(teacher, entry.slot, &schedule.class_id) {
            warn!("stored schedules overlap: {e}");
        }
    }
}

/// Frees the slots a stored schedule still holds for its own class.
fn release_schedule(tracker: &mut AvailabilityTracker, schedule: &WeeklySchedule) {
    for entry in &schedule.entries {
        let Some(teacher) = &entry.teacher_id else {
            continue;
        };
        if tracker.holder(teacher, &entry.slot) == Some(&schedule.class_id) {
            tracker.release(teacher, &entry.slot);
        }
    }
}

/// Drops a failed class's commits and puts back the stored schedule it
/// keeps, if any.
fn roll_back(tracker: &mut AvailabilityTracker, class: &ClassId, kept: Option<&WeeklySchedule>) {
    tracker.release_class(class);
    if let Some(schedule) = kept {
        commit_schedule(tracker, schedule);
    }
}

/// Classifies a per-class failure. A double booking is not a class
/// failure and is handed back for the caller to escalate.
fn failure_kind(error: &ScheduleError) -> Result<FailureKind, TrackerError> {
    match error {
        ScheduleError::CapacityExceeded { .. } => Ok(FailureKind::CapacityExceeded),
        ScheduleError::NoEligibleTeacher { .. } => Ok(FailureKind::NoEligibleTeacher),
        ScheduleError::CatalogIncomplete { .. } => Ok(FailureKind::CatalogIncomplete),
        ScheduleError::DoubleBooking(e) => Err(e.clone()),
    }
}
