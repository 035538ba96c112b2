//! Timetable generation and statistics.
//!
//! # Algorithm
//!
//! `ClassScheduler` is a greedy, hour-ordered, earliest-slot heuristic for
//! one class. It is not optimal, but it is deterministic and never
//! double-books a teacher. `BatchOrchestrator` runs it class by class
//! against a shared availability tracker and persists the results.
//!
//! # Statistics
//!
//! `ClassStats` reports filled and unfilled periods, fixed periods and
//! shortfall hours for a generated schedule.
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3

mod batch;
mod class;
mod stats;

pub use batch::{
    BatchOrchestrator, BatchRequest, ClassResult, ClassStatus, FailureKind, RunSummary,
};
pub use class::{ClassOutcome, ClassScheduler, Shortfall, ShortfallReason};
pub use stats::ClassStats;
