use crate::diagnostics::{IssueKind, UnscheduledEntry};
use crate::labs::{book_cell, schedule_labs, LabSchedule};
use crate::model::{Course, FacultyAssignment, StudentType};
use crate::scheduler::{Placement, SchedulerOptions, SemesterSchedule};
use crate::timetable::Timetable;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Instantané persistant : entrées du planificateur et derniers résultats.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workspace {
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub roster: Vec<FacultyAssignment>,
    #[serde(default)]
    pub options: SchedulerOptions,
    #[serde(default)]
    pub timetables: Vec<Timetable>,
    #[serde(default)]
    pub labs: LabSchedule,
    /// Diagnostics du dernier run de chaque (semestre, cycle), étages compris.
    #[serde(default)]
    pub unscheduled: Vec<UnscheduledEntry>,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl Workspace {
    pub fn timetable(&self, semester: u8, student_type: StudentType) -> Option<&Timetable> {
        self.timetables
            .iter()
            .find(|t| t.semester() == semester && t.student_type() == student_type)
    }

    pub fn timetable_mut(
        &mut self,
        semester: u8,
        student_type: StudentType,
    ) -> Option<&mut Timetable> {
        self.timetables
            .iter_mut()
            .find(|t| t.semester() == semester && t.student_type() == student_type)
    }

    /// Remplace l'emploi du temps du même (semestre, cycle) ou l'ajoute.
    pub fn upsert_timetable(&mut self, timetable: Timetable) {
        match self.timetable_mut(timetable.semester(), timetable.student_type()) {
            Some(slot) => *slot = timetable,
            None => {
                self.timetables.push(timetable);
                self.timetables
                    .sort_by_key(|t| (t.student_type(), t.semester()));
            }
        }
    }

    /// Installe le résultat d'un run : la grille remplace celle du même
    /// (semestre, cycle), les étages de TP sont resynchronisés et les
    /// diagnostics de ce terme sont remplacés. Renvoie les diagnostics du run.
    pub fn apply_schedule(&mut self, schedule: SemesterSchedule) -> Vec<UnscheduledEntry> {
        let SemesterSchedule {
            timetable,
            mut unscheduled,
        } = schedule;
        let (semester, student_type) = (timetable.semester(), timetable.student_type());
        unscheduled.extend(schedule_labs(&timetable, &mut self.labs));

        self.unscheduled.retain(|e| !e.is_for(semester, student_type));
        self.unscheduled.extend(unscheduled.iter().cloned());
        self.upsert_timetable(timetable);
        unscheduled
    }

    /// Relance la répartition des étages d'un terme déjà planifié. Seules ses
    /// entrées `LabFloorTaken` sont remplacées ; `None` sans emploi du temps.
    pub fn reallocate_labs(
        &mut self,
        semester: u8,
        student_type: StudentType,
    ) -> Option<Vec<UnscheduledEntry>> {
        let timetable = self
            .timetables
            .iter()
            .find(|t| t.semester() == semester && t.student_type() == student_type)?;
        let entries = schedule_labs(timetable, &mut self.labs);

        self.unscheduled
            .retain(|e| !(e.kind == IssueKind::LabFloorTaken && e.is_for(semester, student_type)));
        self.unscheduled.extend(entries.iter().cloned());
        Some(entries)
    }

    /// Enregistre une grille modifiée par un placement manuel. Un TP réserve
    /// l'étage de son batch ; si l'étage est pris, rien n'est enregistré et
    /// l'entrée nommant le bloqueur est renvoyée.
    pub fn commit_placement(
        &mut self,
        timetable: Timetable,
        placement: &Placement,
    ) -> Result<(), UnscheduledEntry> {
        book_cell(
            &timetable,
            &mut self.labs,
            placement.batch,
            placement.day,
            placement.slot,
        )?;
        self.upsert_timetable(timetable);
        Ok(())
    }
}

pub trait Storage {
    /// Charge un workspace depuis un support.
    fn load(&self) -> anyhow::Result<Workspace>;
    /// Sauvegarde de manière atomique.
    fn save(&self, workspace: &Workspace) -> anyhow::Result<()>;
}

pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self {
            path: path.as_ref().to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for JsonStorage {
    fn load(&self) -> anyhow::Result<Workspace> {
        let data =
            fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        let workspace: Workspace =
            serde_json::from_slice(&data).with_context(|| "parsing workspace json")?;
        Ok(workspace)
    }

    fn save(&self, workspace: &Workspace) -> anyhow::Result<()> {
        let mut stamped = workspace.clone();
        stamped.saved_at = Some(Utc::now());
        let json = serde_json::to_vec_pretty(&stamped)?;
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        Ok(())
    }
}
