use crate::model::{
    Batch, Course, Day, Faculty, SessionKind, Slot, StudentType, DAYS_PER_WEEK, MORNING_SLOTS,
    SLOTS_PER_DAY,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Contenu d'une cellule occupée.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub course_code: String,
    pub course_name: String,
    pub faculty: Faculty,
    pub kind: SessionKind,
}

impl Session {
    pub fn new(course: &Course, faculty: Faculty, kind: SessionKind) -> Self {
        Self {
            course_code: course.code.clone(),
            course_name: course.name.clone(),
            faculty,
            kind,
        }
    }

    pub fn is_lab(&self) -> bool {
        self.kind == SessionKind::Lab
    }
}

type DayRow = [Option<Session>; SLOTS_PER_DAY];

/// Grille 5×8 d'un batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchGrid {
    days: [DayRow; DAYS_PER_WEEK],
}

impl BatchGrid {
    pub fn get(&self, day: Day, slot: Slot) -> Option<&Session> {
        self.days[day.index()][slot.index()].as_ref()
    }

    pub fn day_load(&self, day: Day) -> usize {
        self.days[day.index()].iter().flatten().count()
    }

    pub fn load(&self) -> usize {
        Day::ALL.iter().map(|d| self.day_load(*d)).sum()
    }
}

/// Séances d'un cours sur une journée pour un batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayCount {
    pub theory: usize,
    pub lab: usize,
}

/// Emploi du temps d'un semestre : une grille par batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timetable {
    semester: u8,
    student_type: StudentType,
    grids: BTreeMap<Batch, BatchGrid>,
}

impl Timetable {
    /// Grille vide pour tous les batches du cycle.
    pub fn new(semester: u8, student_type: StudentType) -> Self {
        let grids = student_type
            .batches()
            .iter()
            .map(|b| (*b, BatchGrid::default()))
            .collect();
        Self {
            semester,
            student_type,
            grids,
        }
    }

    pub fn semester(&self) -> u8 {
        self.semester
    }

    pub fn student_type(&self) -> StudentType {
        self.student_type
    }

    pub fn batches(&self) -> impl Iterator<Item = Batch> + '_ {
        self.grids.keys().copied()
    }

    pub fn grid(&self, batch: Batch) -> Option<&BatchGrid> {
        self.grids.get(&batch)
    }

    pub fn get(&self, batch: Batch, day: Day, slot: Slot) -> Option<&Session> {
        self.grids.get(&batch).and_then(|g| g.get(day, slot))
    }

    pub fn is_free(&self, batch: Batch, day: Day, slot: Slot) -> bool {
        self.get(batch, day, slot).is_none()
    }

    /// Écrit une cellule et renvoie l'ancien contenu.
    pub fn set(&mut self, batch: Batch, day: Day, slot: Slot, session: Session) -> Option<Session> {
        self.grids.entry(batch).or_default().days[day.index()][slot.index()].replace(session)
    }

    /// Vide une cellule et renvoie son contenu.
    pub fn take(&mut self, batch: Batch, day: Day, slot: Slot) -> Option<Session> {
        self.grids
            .get_mut(&batch)
            .and_then(|g| g.days[day.index()][slot.index()].take())
    }

    /// Toutes les cellules occupées, ordonnées par batch, jour, créneau.
    pub fn cells(&self) -> impl Iterator<Item = (Batch, Day, Slot, &Session)> + '_ {
        self.grids.iter().flat_map(|(batch, grid)| {
            Day::ALL.into_iter().flat_map(move |day| {
                Slot::ALL
                    .into_iter()
                    .filter_map(move |slot| grid.get(day, slot).map(|s| (*batch, day, slot, s)))
            })
        })
    }

    pub fn batch_load(&self, batch: Batch) -> usize {
        self.grids.get(&batch).map_or(0, BatchGrid::load)
    }

    pub fn batch_day_load(&self, batch: Batch, day: Day) -> usize {
        self.grids.get(&batch).map_or(0, |g| g.day_load(day))
    }

    /// Séances (théorie, TP) du cours `code` ce jour-là pour le batch.
    pub fn course_day_count(&self, batch: Batch, day: Day, code: &str) -> DayCount {
        let mut count = DayCount::default();
        for slot in Slot::ALL {
            match self.get(batch, day, slot) {
                Some(s) if s.course_code == code && s.is_lab() => count.lab += 1,
                Some(s) if s.course_code == code => count.theory += 1,
                _ => {}
            }
        }
        count
    }

    /// Nombre de cellules du cours `code` de type `kind` sur la semaine.
    pub fn course_count(&self, batch: Batch, code: &str, kind: SessionKind) -> usize {
        self.cells()
            .filter(|(b, _, _, s)| *b == batch && s.course_code == code && s.kind == kind)
            .count()
    }

    /// Séances de l'enseignant sur ce créneau, tous batches confondus.
    pub fn faculty_sessions_at<'a>(
        &'a self,
        faculty: &'a Faculty,
        day: Day,
        slot: Slot,
    ) -> impl Iterator<Item = (Batch, &'a Session)> + 'a {
        self.grids.iter().filter_map(move |(batch, grid)| {
            grid.get(day, slot)
                .filter(|s| &s.faculty == faculty)
                .map(|s| (*batch, s))
        })
    }

    pub fn faculty_busy(&self, faculty: &Faculty, day: Day, slot: Slot) -> bool {
        self.faculty_sessions_at(faculty, day, slot).next().is_some()
    }

    /// Occupation de l'enseignant par créneau sur une journée.
    pub fn faculty_day_mask(&self, faculty: &Faculty, day: Day) -> [bool; SLOTS_PER_DAY] {
        let mut mask = [false; SLOTS_PER_DAY];
        for slot in Slot::ALL {
            mask[slot.index()] = self.faculty_busy(faculty, day, slot);
        }
        mask
    }

    /// Jours où l'enseignant a au moins une séance.
    pub fn faculty_busy_days(&self, faculty: &Faculty) -> [bool; DAYS_PER_WEEK] {
        let mut busy = [false; DAYS_PER_WEEK];
        for (_, day, _, session) in self.cells() {
            if &session.faculty == faculty {
                busy[day.index()] = true;
            }
        }
        busy
    }

    pub fn faculties(&self) -> BTreeSet<Faculty> {
        self.cells().map(|(_, _, _, s)| s.faculty.clone()).collect()
    }

    /// Rendu texte d'une grille : un jour par ligne, `*` marque un TP.
    pub fn render(&self, batch: Batch) -> String {
        let mut lines = vec![format!("Batch {batch}")];
        for day in Day::ALL {
            let tokens: Vec<String> = Slot::ALL
                .iter()
                .map(|slot| match self.get(batch, day, *slot) {
                    Some(s) if s.is_lab() => format!("{}*", s.course_code),
                    Some(s) => s.course_code.clone(),
                    None => "-".to_string(),
                })
                .collect();
            let (morning, afternoon) = tokens.split_at(MORNING_SLOTS);
            lines.push(format!(
                "{day}: {} | {}",
                morning.join(" "),
                afternoon.join(" ")
            ));
        }
        lines.join("\n")
    }
}

/// Longueur de la suite de créneaux occupés qui contient `[start, start + len)`
/// une fois ce bloc ajouté au masque.
pub(crate) fn run_through(mask: &[bool; SLOTS_PER_DAY], start: usize, len: usize) -> usize {
    let end = (start + len).min(SLOTS_PER_DAY);
    let before = mask[..start].iter().rev().take_while(|b| **b).count();
    let after = mask[end..].iter().take_while(|b| **b).count();
    before + (end - start) + after
}
