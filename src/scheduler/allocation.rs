use super::resolver::FacultyResolver;
use super::types::{SchedError, SchedulerOptions, SemesterSchedule};
use super::Scheduler;
use crate::diagnostics::{Diagnostics, IssueKind, UnscheduledEntry};
use crate::model::{
    Batch, Course, Day, Faculty, HourPlan, Role, SessionKind, Slot, StudentType, SLOTS_PER_DAY,
};
use crate::timetable::{run_through, Session, Timetable};
use std::cmp::Reverse;

/// Ordre de parcours des jours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DayOrder {
    /// Jours les moins chargés d'abord (tri stable, égalités dans l'ordre de la semaine).
    ByLoad,
    /// Ordre de la semaine ; utilisé pour les blocs redécoupés.
    Fixed,
}

/// Séance déplaçable : une heure de théorie ou un bloc de TP entier.
#[derive(Debug, Clone)]
struct Unit {
    start: Slot,
    len: usize,
    session: Session,
}

struct Run<'t> {
    opts: SchedulerOptions,
    timetable: &'t mut Timetable,
    diagnostics: Diagnostics,
}

pub(super) fn schedule_semester(
    scheduler: &Scheduler,
    semester: u8,
    student_type: StudentType,
) -> Result<SemesterSchedule, SchedError> {
    if !student_type.accepts_semester(semester) {
        return Err(SchedError::InvalidSemester {
            semester,
            student_type,
        });
    }

    let resolver = FacultyResolver::new(&scheduler.roster);
    let courses: Vec<&Course> = scheduler
        .courses
        .iter()
        .filter(|c| c.semester == semester && c.student_type == student_type)
        .collect();
    tracing::info!(semester, %student_type, courses = courses.len(), "scheduling semester");

    let mut timetable = Timetable::new(semester, student_type);
    let mut run = Run::new(scheduler.opts, &mut timetable);
    for course in &courses {
        for batch in student_type.batches() {
            run.place_course(&resolver, course, *batch);
        }
    }
    run.fill_free_days();
    run.report_faculty_free_days();
    let unscheduled = run.finish();

    tracing::info!(semester, %student_type, unscheduled = unscheduled.len(), "semester scheduled");
    Ok(SemesterSchedule {
        timetable,
        unscheduled,
    })
}

pub(super) fn rebalance_free_days(
    opts: SchedulerOptions,
    timetable: &mut Timetable,
) -> Vec<UnscheduledEntry> {
    let mut run = Run::new(opts, timetable);
    run.fill_free_days();
    run.finish()
}

pub(super) fn faculty_free_day_report(timetable: &Timetable) -> Vec<UnscheduledEntry> {
    timetable
        .faculties()
        .into_iter()
        .filter(|f| timetable.faculty_busy_days(f).iter().all(|busy| *busy))
        .map(|f| {
            UnscheduledEntry::new(
                IssueKind::FacultyWithoutFreeDay,
                timetable.semester(),
                timetable.student_type(),
                format!("{f} has classes on every day of the week"),
            )
            .faculty(&f)
        })
        .collect()
}

impl<'t> Run<'t> {
    fn new(opts: SchedulerOptions, timetable: &'t mut Timetable) -> Self {
        Self {
            opts,
            timetable,
            diagnostics: Diagnostics::default(),
        }
    }

    fn finish(self) -> Vec<UnscheduledEntry> {
        self.diagnostics.into_entries()
    }

    fn semester(&self) -> u8 {
        self.timetable.semester()
    }

    fn student_type(&self) -> StudentType {
        self.timetable.student_type()
    }

    fn place_course(&mut self, resolver: &FacultyResolver<'_>, course: &Course, batch: Batch) {
        let Some(plan) = course.hour_plan() else {
            let entry = UnscheduledEntry::new(
                IssueKind::UnsupportedCredits,
                self.semester(),
                self.student_type(),
                format!(
                    "{} course with {} credit(s) has no weekly hour plan",
                    course.category, course.credits
                ),
            )
            .course(course)
            .batch(batch);
            self.diagnostics.push(entry);
            return;
        };

        if plan.theory_hours > 0 {
            if let Some(faculty) =
                self.resolve(resolver, course, batch, SessionKind::Theory, plan.theory_hours)
            {
                self.place_theory(course, batch, &faculty, plan.theory_hours);
            }
        }
        if plan.lab_hours > 0 {
            if let Some(faculty) =
                self.resolve(resolver, course, batch, SessionKind::Lab, plan.lab_hours)
            {
                self.place_labs(course, batch, &faculty, plan);
            }
        }
    }

    fn resolve(
        &mut self,
        resolver: &FacultyResolver<'_>,
        course: &Course,
        batch: Batch,
        kind: SessionKind,
        hours: u8,
    ) -> Option<Faculty> {
        let role = course.category.role_for(kind)?;
        match resolver.resolve(course, batch, self.semester(), role) {
            Ok(faculty) => Some(faculty.clone()),
            Err(why) => {
                let entry = UnscheduledEntry::new(
                    IssueKind::NoFacultyMapped,
                    self.semester(),
                    self.student_type(),
                    why.to_string(),
                )
                .course(course)
                .batch(batch)
                .role(role)
                .missing(hours);
                self.diagnostics.push(entry);
                None
            }
        }
    }

    fn place_theory(&mut self, course: &Course, batch: Batch, faculty: &Faculty, hours: u8) {
        let mut placed = 0u8;
        while placed < hours {
            let Some((day, slot)) = self.find_theory_cell(&course.code, batch, faculty) else {
                break;
            };
            let session = Session::new(course, faculty.clone(), SessionKind::Theory);
            self.timetable.set(batch, day, slot, session);
            placed += 1;
        }

        if placed < hours {
            let missing = hours - placed;
            tracing::warn!(course = %course.code, %batch, missing, "theory hours left unplaced");
            let entry = UnscheduledEntry::new(
                IssueKind::TheoryUnplaced,
                self.semester(),
                self.student_type(),
                format!("{missing} of {hours} theory hour(s) could not be placed"),
            )
            .course(course)
            .batch(batch)
            .faculty(faculty)
            .role(Role::TheoryTeacher)
            .missing(missing);
            self.diagnostics.push(entry);
        }
    }

    fn place_labs(&mut self, course: &Course, batch: Batch, faculty: &Faculty, plan: HourPlan) {
        let total = plan.lab_hours;
        let mut remaining = total;
        let mut size_cap = plan.lab_block.max(1);
        let mut order = DayOrder::ByLoad;

        while remaining > 0 {
            let size = size_cap.min(remaining);
            let len = usize::from(size);
            if let Some((day, start)) = self.find_lab_block(&course.code, batch, faculty, len, order)
            {
                let session = Session::new(course, faculty.clone(), SessionKind::Lab);
                self.write_block(batch, day, start, len, &session);
                remaining -= size;
                continue;
            }
            if plan.consecutive_lab || size <= 1 {
                break;
            }
            size_cap = size.div_ceil(2);
            order = DayOrder::Fixed;
            tracing::debug!(course = %course.code, %batch, size_cap, "splitting lab block");
        }

        if remaining > 0 {
            tracing::warn!(course = %course.code, %batch, remaining, "lab hours left unplaced");
            let reason = if plan.consecutive_lab {
                format!(
                    "no free {}-period lab block outside the lunch break ({remaining} of {total} lab hour(s) unplaced)",
                    plan.lab_block
                )
            } else {
                format!("{remaining} of {total} lab hour(s) could not be placed")
            };
            let entry = UnscheduledEntry::new(
                IssueKind::LabUnplaced,
                self.semester(),
                self.student_type(),
                reason,
            )
            .course(course)
            .batch(batch)
            .faculty(faculty)
            .role(Role::LabIncharge)
            .missing(remaining);
            self.diagnostics.push(entry);
        }
    }

    fn days(&self, batch: Batch, order: DayOrder) -> Vec<Day> {
        let mut days = Day::ALL.to_vec();
        if order == DayOrder::ByLoad {
            days.sort_by_key(|d| self.timetable.batch_day_load(batch, *d));
        }
        days
    }

    fn find_theory_cell(&self, code: &str, batch: Batch, faculty: &Faculty) -> Option<(Day, Slot)> {
        self.days(batch, DayOrder::ByLoad)
            .into_iter()
            .filter(|day| self.theory_fits_day(code, batch, *day))
            .find_map(|day| {
                Slot::ALL
                    .into_iter()
                    .find(|slot| self.block_open(batch, faculty, day, *slot, 1))
                    .map(|slot| (day, slot))
            })
    }

    fn find_lab_block(
        &self,
        code: &str,
        batch: Batch,
        faculty: &Faculty,
        len: usize,
        order: DayOrder,
    ) -> Option<(Day, Slot)> {
        self.days(batch, order)
            .into_iter()
            .filter(|day| self.lab_fits_day(code, batch, *day, len))
            .find_map(|day| {
                Slot::ALL
                    .into_iter()
                    .find(|slot| self.block_open(batch, faculty, day, *slot, len))
                    .map(|slot| (day, slot))
            })
    }

    fn theory_fits_day(&self, code: &str, batch: Batch, day: Day) -> bool {
        let count = self.timetable.course_day_count(batch, day, code);
        count.theory < usize::from(self.opts.max_theory_per_day)
            && (count.lab == 0 || count.theory < usize::from(self.opts.max_theory_on_lab_day))
    }

    /// Un seul bloc de TP par cours et par jour.
    fn lab_fits_day(&self, code: &str, batch: Batch, day: Day, len: usize) -> bool {
        let count = self.timetable.course_day_count(batch, day, code);
        count.lab == 0
            && len <= usize::from(self.opts.max_lab_periods_per_day)
            && count.theory <= usize::from(self.opts.max_theory_on_lab_day)
    }

    /// Cellules libres pour le batch et l'enseignant, sans enjamber le déjeuner
    /// ni dépasser le plafond de cours consécutifs.
    fn block_open(&self, batch: Batch, faculty: &Faculty, day: Day, start: Slot, len: usize) -> bool {
        if !start.block_fits(len) {
            return false;
        }
        let clear = (start.index()..start.index() + len)
            .filter_map(Slot::from_index)
            .all(|slot| {
                self.timetable.is_free(batch, day, slot)
                    && !self.timetable.faculty_busy(faculty, day, slot)
            });
        if !clear {
            return false;
        }
        let mask = self.timetable.faculty_day_mask(faculty, day);
        run_through(&mask, start.index(), len) <= usize::from(self.opts.max_consecutive_classes)
    }

    fn write_block(&mut self, batch: Batch, day: Day, start: Slot, len: usize, session: &Session) {
        for slot in (start.index()..start.index() + len).filter_map(Slot::from_index) {
            self.timetable.set(batch, day, slot, session.clone());
        }
    }

    fn fill_free_days(&mut self) {
        let batches: Vec<Batch> = self.timetable.batches().collect();
        for batch in batches {
            // rien à déplacer : les entrées de placement expliquent déjà la semaine vide
            if self.timetable.batch_load(batch) == 0 {
                continue;
            }
            for day in Day::ALL {
                if self.timetable.batch_day_load(batch, day) > 0 || self.relocate_into(batch, day) {
                    continue;
                }
                let entry = UnscheduledEntry::new(
                    IssueKind::BatchFreeDay,
                    self.semester(),
                    self.student_type(),
                    format!("Batch {batch} has no classes on {day} and no session could be moved there"),
                )
                .batch(batch)
                .day(day);
                self.diagnostics.push(entry);
            }
        }
    }

    fn relocate_into(&mut self, batch: Batch, target: Day) -> bool {
        let mut donors: Vec<Day> = Day::ALL
            .into_iter()
            .filter(|d| *d != target && self.timetable.batch_day_load(batch, *d) > 1)
            .collect();
        donors.sort_by_key(|d| Reverse(self.timetable.batch_day_load(batch, *d)));

        for donor in donors {
            let donor_load = self.timetable.batch_day_load(batch, donor);
            for unit in self.units(batch, donor) {
                if donor_load <= unit.len {
                    continue;
                }
                let code = unit.session.course_code.as_str();
                let fits_day = match unit.session.kind {
                    SessionKind::Theory => self.theory_fits_day(code, batch, target),
                    SessionKind::Lab => self.lab_fits_day(code, batch, target, unit.len),
                };
                if !fits_day {
                    continue;
                }
                let Some(start) = Slot::ALL
                    .into_iter()
                    .find(|slot| self.block_open(batch, &unit.session.faculty, target, *slot, unit.len))
                else {
                    continue;
                };

                for slot in (unit.start.index()..unit.start.index() + unit.len).filter_map(Slot::from_index) {
                    self.timetable.take(batch, donor, slot);
                }
                self.write_block(batch, target, start, unit.len, &unit.session);
                tracing::debug!(%batch, from = %donor, to = %target, course = %code, "session moved to empty day");
                return true;
            }
        }
        false
    }

    fn units(&self, batch: Batch, day: Day) -> Vec<Unit> {
        let mut out = Vec::new();
        let mut index = 0;
        while index < SLOTS_PER_DAY {
            let Some(slot) = Slot::from_index(index) else {
                break;
            };
            let Some(session) = self.timetable.get(batch, day, slot) else {
                index += 1;
                continue;
            };
            let mut len = 1;
            if session.is_lab() {
                while slot.block_fits(len + 1) {
                    let same = Slot::from_index(index + len)
                        .and_then(|next| self.timetable.get(batch, day, next))
                        .is_some_and(|next| next == session);
                    if !same {
                        break;
                    }
                    len += 1;
                }
            }
            out.push(Unit {
                start: slot,
                len,
                session: session.clone(),
            });
            index += len;
        }
        out
    }

    fn report_faculty_free_days(&mut self) {
        let entries = faculty_free_day_report(&*self.timetable);
        self.diagnostics.extend(entries);
    }
}
