//! Weekly school timetable generation.
//!
//! Builds one weekly timetable per class from a catalog of subjects,
//! teachers and classes, without ever placing a teacher in two classes at
//! the same time.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `WeekCalendar`, `Slot`, `Catalog`,
//!   `Subject`, `Teacher`, `ClassGroup`, `WeeklySchedule`, `ScheduleEntry`
//! - **`validation`**: Catalog integrity checks (duplicate IDs, dangling
//!   references, homeroom bindings)
//! - **`availability`**: Teacher occupancy ledger for one batch run
//! - **`scheduler`**: Per-class scheduler, batch orchestrator, statistics
//! - **`repository`**: Schedule persistence boundary and in-memory store
//! - **`config`**: TOML configuration of the calendar and placement policy
//! - **`error`**: Error types
//!
//! # Example
//!
//! ```
//! use u_timetable::config::EngineConfig;
//! use u_timetable::models::{Catalog, ClassGroup, Subject, Teacher};
//! use u_timetable::repository::InMemoryRepository;
//! use u_timetable::scheduler::{BatchOrchestrator, BatchRequest};
//!
//! let catalog = Catalog::new(
//!     vec![Subject::new("math", 4).with_grades([10])],
//!     vec![Teacher::new("T01", "math")],
//!     vec![ClassGroup::new("10A1", 10)],
//! )
//! .unwrap();
//! let orchestrator =
//!     BatchOrchestrator::from_config(catalog, InMemoryRepository::new(), &EngineConfig::default())
//!         .unwrap();
//!
//! let request = BatchRequest::parse("2024-2025", 1, None).unwrap();
//! let summary = orchestrator.initialize(&request).unwrap();
//! assert_eq!(summary.created, 1);
//! ```
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Burke & Petrovic (2002), "Recent research directions in automated timetabling"

pub mod availability;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod scheduler;
pub mod validation;
