#![forbid(unsafe_code)]
//! Timetabler : génération d'emplois du temps hebdomadaires par batch (sans BD).
//!
//! - Placement glouton théorie/TP à partir du catalogue et des affectations.
//! - Contrôle des règles dures pour les placements manuels.
//! - Collisions d'enseignants soumises à une décision explicite.
//! - Répartition des TP par étage, tous semestres confondus.
//! - Stockage fichiers (JSON/CSV) en dehors du cœur de planification.

pub mod diagnostics;
pub mod io;
pub mod labs;
pub mod model;
pub mod scheduler;
pub mod storage;
pub mod timetable;

pub use diagnostics::{Diagnostics, IssueKind, UnscheduledEntry};
pub use labs::{book_cell, clear_session, schedule_labs, LabBooking, LabRecord, LabSchedule};
pub use model::{
    canonical_batch, canonical_name, lookup_key, Batch, Category, Course, Day, Faculty,
    FacultyAssignment, Floor, HourPlan, Role, SessionKind, Slot, StudentType,
};
pub use scheduler::{
    CollisionEntry, CollisionResolver, Decision, FixedPolicy, Placement, PlacementRequest,
    SchedError, Scheduler, SchedulerOptions, SemesterSchedule, Violation,
};
pub use storage::{JsonStorage, Storage, Workspace};
pub use timetable::{Session, Timetable};
