//! Répartition des séances de TP sur les étages.
//!
//! Le [`LabSchedule`] couvre tous les semestres à la fois : c'est le seul état
//! partagé entre deux runs, et il doit être manipulé séquentiellement
//! (`&mut` ici ; un `Mutex` unique si plusieurs threads y accèdent).

use crate::diagnostics::{IssueKind, UnscheduledEntry};
use crate::model::{Batch, Day, Floor, Slot, StudentType};
use crate::timetable::{Session, Timetable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Clé d'une réservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FloorCell {
    pub floor: Floor,
    pub day: Day,
    pub slot: Slot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabBooking {
    pub batch: Batch,
    pub semester: u8,
    pub course_code: String,
    pub course_name: String,
}

impl LabBooking {
    pub fn new(batch: Batch, semester: u8, session: &Session) -> Self {
        Self {
            batch,
            semester,
            course_code: session.course_code.clone(),
            course_name: session.course_name.clone(),
        }
    }

    fn same_owner(&self, other: &LabBooking) -> bool {
        self.batch == other.batch && self.semester == other.semester
    }
}

/// Forme à plat d'une réservation (sérialisation, export).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabRecord {
    pub floor: Floor,
    pub day: Day,
    pub slot: Slot,
    #[serde(flatten)]
    pub booking: LabBooking,
}

/// Réservations d'étages, tous semestres confondus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<LabRecord>", into = "Vec<LabRecord>")]
pub struct LabSchedule {
    bookings: BTreeMap<FloorCell, LabBooking>,
}

impl From<Vec<LabRecord>> for LabSchedule {
    fn from(records: Vec<LabRecord>) -> Self {
        let bookings = records
            .into_iter()
            .map(|r| {
                (
                    FloorCell {
                        floor: r.floor,
                        day: r.day,
                        slot: r.slot,
                    },
                    r.booking,
                )
            })
            .collect();
        Self { bookings }
    }
}

impl From<LabSchedule> for Vec<LabRecord> {
    fn from(schedule: LabSchedule) -> Self {
        schedule
            .bookings
            .into_iter()
            .map(|(cell, booking)| LabRecord {
                floor: cell.floor,
                day: cell.day,
                slot: cell.slot,
                booking,
            })
            .collect()
    }
}

impl LabSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }

    pub fn records(&self) -> Vec<LabRecord> {
        self.clone().into()
    }

    pub fn get(&self, floor: Floor, day: Day, slot: Slot) -> Option<&LabBooking> {
        self.bookings.get(&FloorCell { floor, day, slot })
    }

    /// Vue « tous semestres ».
    pub fn all(&self) -> impl Iterator<Item = (FloorCell, &LabBooking)> {
        self.bookings.iter().map(|(cell, b)| (*cell, b))
    }

    /// Vue « semestre courant » sur les mêmes réservations.
    pub fn for_semester(
        &self,
        semester: u8,
        student_type: StudentType,
    ) -> impl Iterator<Item = (FloorCell, &LabBooking)> {
        self.all().filter(move |(_, b)| {
            b.semester == semester && b.batch.student_type() == student_type
        })
    }

    /// Réserve une cellule. Une réservation du même (batch, semestre) est
    /// simplement mise à jour ; sinon la réservation en place est renvoyée.
    pub fn book(
        &mut self,
        floor: Floor,
        day: Day,
        slot: Slot,
        booking: LabBooking,
    ) -> Result<(), LabBooking> {
        let cell = FloorCell { floor, day, slot };
        match self.bookings.get(&cell) {
            Some(existing) if !existing.same_owner(&booking) => Err(existing.clone()),
            _ => {
                self.bookings.insert(cell, booking);
                Ok(())
            }
        }
    }

    /// Libère la cellule si elle appartient à (batch, semestre).
    pub fn release(
        &mut self,
        floor: Floor,
        day: Day,
        slot: Slot,
        batch: Batch,
        semester: u8,
    ) -> Option<LabBooking> {
        let cell = FloorCell { floor, day, slot };
        let owned = self
            .bookings
            .get(&cell)
            .is_some_and(|b| b.batch == batch && b.semester == semester);
        if owned {
            self.bookings.remove(&cell)
        } else {
            None
        }
    }

    /// Retire toutes les réservations d'un (semestre, cycle).
    pub fn drop_semester(&mut self, semester: u8, student_type: StudentType) {
        self.bookings
            .retain(|_, b| !(b.semester == semester && b.batch.student_type() == student_type));
    }
}

/// Place chaque créneau de TP de l'emploi du temps sur l'étage de son batch.
///
/// Les réservations précédentes du même semestre sont d'abord retirées, puis
/// chaque cellule de TP est réservée ; un conflit avec un autre
/// (batch, semestre) produit une entrée nommant le bloqueur.
pub fn schedule_labs(timetable: &Timetable, labs: &mut LabSchedule) -> Vec<UnscheduledEntry> {
    let semester = timetable.semester();
    labs.drop_semester(semester, timetable.student_type());

    let unscheduled: Vec<UnscheduledEntry> = timetable
        .cells()
        .filter(|(_, _, _, s)| s.is_lab())
        .filter_map(|(batch, day, slot, session)| {
            book_session(timetable, labs, batch, day, slot, session).err()
        })
        .collect();
    tracing::info!(semester, bookings = labs.len(), collisions = unscheduled.len(), "lab floors allocated");
    unscheduled
}

/// Réserve l'étage d'une cellule de TP déjà écrite (placement manuel).
///
/// Une cellule vide ou de théorie ne réserve rien.
pub fn book_cell(
    timetable: &Timetable,
    labs: &mut LabSchedule,
    batch: Batch,
    day: Day,
    slot: Slot,
) -> Result<(), UnscheduledEntry> {
    match timetable.get(batch, day, slot) {
        Some(session) if session.is_lab() => book_session(timetable, labs, batch, day, slot, session),
        _ => Ok(()),
    }
}

fn book_session(
    timetable: &Timetable,
    labs: &mut LabSchedule,
    batch: Batch,
    day: Day,
    slot: Slot,
    session: &Session,
) -> Result<(), UnscheduledEntry> {
    let semester = timetable.semester();
    let floor = batch.lab_floor();
    labs.book(floor, day, slot, LabBooking::new(batch, semester, session))
        .map_err(|blocker| {
            tracing::warn!(
                %batch, semester, %day, %slot, %floor,
                blocker_batch = %blocker.batch, blocker_semester = blocker.semester,
                "lab floor already booked"
            );
            UnscheduledEntry::new(
                IssueKind::LabFloorTaken,
                semester,
                timetable.student_type(),
                format!(
                    "{floor} is taken on {day} slot {slot} by batch {} semester {} ({})",
                    blocker.batch, blocker.semester, blocker.course_code
                ),
            )
            .course_named(session.course_code.clone(), session.course_name.clone())
            .batch(batch)
            .faculty(&session.faculty)
            .at(day, slot)
            .missing(1)
        })
}

/// Vide une cellule et, s'il s'agit d'un TP, libère l'étage correspondant.
pub fn clear_session(
    timetable: &mut Timetable,
    labs: &mut LabSchedule,
    batch: Batch,
    day: Day,
    slot: Slot,
) -> Option<Session> {
    let session = timetable.take(batch, day, slot)?;
    if session.is_lab() {
        labs.release(batch.lab_floor(), day, slot, batch, timetable.semester());
    }
    Some(session)
}
