//! Double affectation d'un enseignant sur un même créneau.
//!
//! Une collision n'est jamais tranchée par le moteur : l'état
//! [`PendingCollision`] ne peut être quitté que par une décision explicite
//! ([`PendingCollision::decide`] ou un [`CollisionResolver`]).

use crate::model::{Batch, Day, Faculty, SessionKind, Slot};
use crate::timetable::{Session, Timetable};
use serde::{Deserialize, Serialize};

/// Affectation existante en conflit avec le candidat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionEntry {
    pub batch: Batch,
    pub course_code: String,
    pub course_name: String,
    pub kind: SessionKind,
}

/// Placement proposé.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub batch: Batch,
    pub day: Day,
    pub slot: Slot,
    pub session: Session,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// Point de décision fourni par l'appelant (invite interactive, politique de test...).
pub trait CollisionResolver {
    fn resolve(&mut self, candidate: &Candidate, existing: &[CollisionEntry]) -> Decision;
}

impl<F> CollisionResolver for F
where
    F: FnMut(&Candidate, &[CollisionEntry]) -> Decision,
{
    fn resolve(&mut self, candidate: &Candidate, existing: &[CollisionEntry]) -> Decision {
        self(candidate, existing)
    }
}

/// Décision constante.
#[derive(Debug, Clone, Copy)]
pub struct FixedPolicy(pub Decision);

impl CollisionResolver for FixedPolicy {
    fn resolve(&mut self, _candidate: &Candidate, _existing: &[CollisionEntry]) -> Decision {
        self.0
    }
}

/// Séances de `faculty` sur (jour, créneau) dans les autres batches.
pub fn detect(
    timetable: &Timetable,
    day: Day,
    slot: Slot,
    faculty: &Faculty,
    exclude_batch: Batch,
) -> Vec<CollisionEntry> {
    timetable
        .faculty_sessions_at(faculty, day, slot)
        .filter(|(batch, _)| *batch != exclude_batch)
        .map(|(batch, s)| CollisionEntry {
            batch,
            course_code: s.course_code.clone(),
            course_name: s.course_name.clone(),
            kind: s.kind,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub enum Negotiation {
    /// Aucun conflit : le candidat peut être écrit.
    Clear(Candidate),
    Pending(PendingCollision),
}

impl Negotiation {
    pub fn open(timetable: &Timetable, candidate: Candidate) -> Self {
        let existing = detect(
            timetable,
            candidate.day,
            candidate.slot,
            &candidate.session.faculty,
            candidate.batch,
        );
        if existing.is_empty() {
            Negotiation::Clear(candidate)
        } else {
            Negotiation::Pending(PendingCollision {
                candidate,
                existing,
            })
        }
    }
}

/// Collision détectée, en attente de décision.
#[derive(Debug, Clone)]
pub struct PendingCollision {
    candidate: Candidate,
    existing: Vec<CollisionEntry>,
}

impl PendingCollision {
    pub fn candidate(&self) -> &Candidate {
        &self.candidate
    }

    pub fn existing(&self) -> &[CollisionEntry] {
        &self.existing
    }

    pub fn decide(self, decision: Decision) -> Resolved {
        Resolved {
            decision,
            candidate: self.candidate,
            existing: self.existing,
        }
    }

    pub fn negotiate(self, resolver: &mut dyn CollisionResolver) -> Resolved {
        let decision = resolver.resolve(&self.candidate, &self.existing);
        self.decide(decision)
    }
}

#[derive(Debug, Clone)]
pub struct Resolved {
    pub decision: Decision,
    pub candidate: Candidate,
    pub existing: Vec<CollisionEntry>,
}
