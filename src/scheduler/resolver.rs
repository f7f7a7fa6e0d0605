use crate::model::{Batch, Category, Course, Faculty, FacultyAssignment, Role};
use std::fmt;

/// Échec de résolution : jamais de repli sur un autre batch ou semestre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unassigned {
    NoMatch,
    /// Lab Assistant demandé pour un cours Lab Integrated Theory.
    IneligibleRole,
}

impl fmt::Display for Unassigned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unassigned::NoMatch => f.write_str("No faculty mapped"),
            Unassigned::IneligibleRole => {
                f.write_str("Lab Assistant is not eligible for lab integrated theory courses")
            }
        }
    }
}

/// Recherche dans le tableau d'affectations (ordre du tableau = priorité).
#[derive(Debug, Clone, Copy)]
pub struct FacultyResolver<'a> {
    roster: &'a [FacultyAssignment],
}

impl<'a> FacultyResolver<'a> {
    pub fn new(roster: &'a [FacultyAssignment]) -> Self {
        Self { roster }
    }

    pub fn resolve(
        &self,
        course: &Course,
        batch: Batch,
        semester: u8,
        role: Role,
    ) -> Result<&'a Faculty, Unassigned> {
        if course.category == Category::LabIntegratedTheory && role == Role::LabAssistant {
            return Err(Unassigned::IneligibleRole);
        }
        self.roster
            .iter()
            .find(|a| {
                a.batch == batch
                    && a.semester == semester
                    && a.role == role
                    && a.matches_course(course)
            })
            .map(|a| &a.faculty)
            .ok_or(Unassigned::NoMatch)
    }

    /// Batches qu'un enseignant couvre sur ce semestre, quel que soit le rôle.
    pub fn batches_of(&self, faculty: &Faculty, semester: u8) -> Vec<Batch> {
        let mut out: Vec<Batch> = self
            .roster
            .iter()
            .filter(|a| &a.faculty == faculty && a.semester == semester)
            .map(|a| a.batch)
            .collect();
        out.sort();
        out.dedup();
        out
    }
}
