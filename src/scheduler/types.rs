use super::collision::CollisionEntry;
use crate::diagnostics::UnscheduledEntry;
use crate::model::{Batch, Day, SessionKind, Slot, StudentType};
use crate::timetable::{Session, Timetable};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Règles chiffrées du planificateur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerOptions {
    /// Créneaux consécutifs maximum pour un enseignant sur une journée.
    pub max_consecutive_classes: u8,
    /// Un cours ayant déjà ce nombre de créneaux de TP dans la journée est plein.
    pub max_lab_periods_per_day: u8,
    /// Heures de théorie d'un même cours par jour et par batch.
    pub max_theory_per_day: u8,
    /// Heures de théorie d'un cours sur un jour où il a déjà du TP.
    pub max_theory_on_lab_day: u8,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            max_consecutive_classes: 5,
            max_lab_periods_per_day: 4,
            max_theory_per_day: 2,
            max_theory_on_lab_day: 1,
        }
    }
}

/// Résultat d'un run complet sur un semestre.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemesterSchedule {
    pub timetable: Timetable,
    pub unscheduled: Vec<UnscheduledEntry>,
}

/// Demande de placement manuel d'une cellule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementRequest {
    pub batch: Batch,
    pub day: Day,
    pub slot: Slot,
    pub course_code: String,
    pub kind: SessionKind,
}

impl PlacementRequest {
    pub fn new<C: Into<String>>(
        batch: Batch,
        day: Day,
        slot: Slot,
        course_code: C,
        kind: SessionKind,
    ) -> Self {
        Self {
            batch,
            day,
            slot,
            course_code: course_code.into(),
            kind,
        }
    }
}

/// Placement manuel validé et écrit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub batch: Batch,
    pub day: Day,
    pub slot: Slot,
    pub session: Session,
    /// Affectations simultanées acceptées explicitement.
    pub accepted_collisions: Vec<CollisionEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    UnknownCourse,
    ForeignBatch,
    WrongSessionKind,
    SlotOccupied,
    NoFaculty,
    LabPeriodsPerDay,
    LabDayTheory,
    ConsecutiveClasses,
    FacultyFreeDay,
    FirstHour,
}

/// Refus local d'un placement manuel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub rule: Rule,
    pub reason: String,
}

impl Violation {
    pub fn new<R: Into<String>>(rule: Rule, reason: R) -> Self {
        Self {
            rule,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("semester {semester} is out of range for {student_type}")]
    InvalidSemester {
        semester: u8,
        student_type: StudentType,
    },
    #[error("duplicate course code in catalog: {0}")]
    DuplicateCourse(String),
    #[error("placement rejected: {0}")]
    Constraint(Violation),
    #[error("faculty collision denied with {} existing assignment(s)", .0.len())]
    CollisionDenied(Vec<CollisionEntry>),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
