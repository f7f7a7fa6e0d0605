use crate::model::{Batch, Course, Day, Faculty, Role, Slot, StudentType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Motif d'un placement manquant ou partiel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IssueKind {
    /// Aucun enseignant affecté pour (cours, batch, semestre, rôle).
    NoFacultyMapped,
    /// (catégorie, crédits) absent de la table des volumes.
    UnsupportedCredits,
    TheoryUnplaced,
    LabUnplaced,
    /// Journée vide pour un batch après la passe de correction.
    BatchFreeDay,
    FacultyWithoutFreeDay,
    /// Étage de TP déjà réservé par un autre (batch, semestre).
    LabFloorTaken,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IssueKind::NoFacultyMapped => "no-faculty",
            IssueKind::UnsupportedCredits => "unsupported-credits",
            IssueKind::TheoryUnplaced => "theory-unplaced",
            IssueKind::LabUnplaced => "lab-unplaced",
            IssueKind::BatchFreeDay => "batch-free-day",
            IssueKind::FacultyWithoutFreeDay => "faculty-no-free-day",
            IssueKind::LabFloorTaken => "lab-floor-taken",
        };
        f.write_str(s)
    }
}

/// Entrée du rapport de non-planification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnscheduledEntry {
    pub kind: IssueKind,
    pub semester: u8,
    pub student_type: StudentType,
    #[serde(default)]
    pub course_code: Option<String>,
    #[serde(default)]
    pub course_name: Option<String>,
    #[serde(default)]
    pub batch: Option<Batch>,
    #[serde(default)]
    pub faculty: Option<Faculty>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub day: Option<Day>,
    #[serde(default)]
    pub slot: Option<Slot>,
    /// Heures hebdomadaires non placées.
    #[serde(default)]
    pub missing_hours: u8,
    pub reason: String,
}

impl UnscheduledEntry {
    pub fn new<R: Into<String>>(
        kind: IssueKind,
        semester: u8,
        student_type: StudentType,
        reason: R,
    ) -> Self {
        Self {
            kind,
            semester,
            student_type,
            course_code: None,
            course_name: None,
            batch: None,
            faculty: None,
            role: None,
            day: None,
            slot: None,
            missing_hours: 0,
            reason: reason.into(),
        }
    }

    pub fn course(mut self, course: &Course) -> Self {
        self.course_code = Some(course.code.clone());
        self.course_name = Some(course.name.clone());
        self
    }

    pub fn course_named<C: Into<String>, N: Into<String>>(mut self, code: C, name: N) -> Self {
        self.course_code = Some(code.into());
        self.course_name = Some(name.into());
        self
    }

    pub fn batch(mut self, batch: Batch) -> Self {
        self.batch = Some(batch);
        self
    }

    pub fn faculty(mut self, faculty: &Faculty) -> Self {
        self.faculty = Some(faculty.clone());
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    pub fn day(mut self, day: Day) -> Self {
        self.day = Some(day);
        self
    }

    pub fn at(mut self, day: Day, slot: Slot) -> Self {
        self.day = Some(day);
        self.slot = Some(slot);
        self
    }

    pub fn missing(mut self, hours: u8) -> Self {
        self.missing_hours = hours;
        self
    }

    /// L'entrée concerne ce (semestre, cycle).
    pub fn is_for(&self, semester: u8, student_type: StudentType) -> bool {
        self.semester == semester && self.student_type == student_type
    }
}

impl fmt::Display for UnscheduledEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] sem {} {}", self.kind, self.semester, self.student_type)?;
        if let Some(batch) = self.batch {
            write!(f, " batch {batch}")?;
        }
        if let Some(code) = &self.course_code {
            write!(f, " {code}")?;
        }
        if let Some(faculty) = &self.faculty {
            write!(f, " ({faculty})")?;
        }
        write!(f, ": {}", self.reason)
    }
}

/// Journal append-only des échecs d'un run.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<UnscheduledEntry>,
}

impl Diagnostics {
    pub fn push(&mut self, entry: UnscheduledEntry) {
        tracing::debug!(kind = %entry.kind, reason = %entry.reason, "unscheduled");
        self.entries.push(entry);
    }

    pub fn extend<I: IntoIterator<Item = UnscheduledEntry>>(&mut self, entries: I) {
        for entry in entries {
            self.push(entry);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UnscheduledEntry> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> Vec<UnscheduledEntry> {
        self.entries
    }
}
