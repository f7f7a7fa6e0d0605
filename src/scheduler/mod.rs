mod allocation;
pub mod collision;
mod constraints;
mod resolver;
mod types;

pub use collision::{
    Candidate, CollisionEntry, CollisionResolver, Decision, FixedPolicy, Negotiation,
    PendingCollision, Resolved,
};
pub use resolver::{FacultyResolver, Unassigned};
pub use types::{
    Placement, PlacementRequest, Rule, SchedError, SchedulerOptions, SemesterSchedule, Violation,
};

use crate::diagnostics::UnscheduledEntry;
use crate::model::{lookup_key, Batch, Course, Day, Faculty, FacultyAssignment, Slot, StudentType};
use crate::timetable::{Session, Timetable};
use constraints::Proposal;
use std::collections::HashSet;

/// Scheduler : catalogue de cours + tableau d'affectations, figés pour un run.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    courses: Vec<Course>,
    roster: Vec<FacultyAssignment>,
    opts: SchedulerOptions,
}

impl Scheduler {
    /// Refuse un catalogue contenant deux fois le même code.
    pub fn new(courses: Vec<Course>, roster: Vec<FacultyAssignment>) -> Result<Self, SchedError> {
        let mut seen = HashSet::new();
        for course in &courses {
            if !seen.insert(lookup_key(&course.code)) {
                return Err(SchedError::DuplicateCourse(course.code.clone()));
            }
        }
        Ok(Self {
            courses,
            roster,
            opts: SchedulerOptions::default(),
        })
    }

    pub fn with_options(mut self, opts: SchedulerOptions) -> Self {
        self.opts = opts;
        self
    }

    pub fn options(&self) -> SchedulerOptions {
        self.opts
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn roster(&self) -> &[FacultyAssignment] {
        &self.roster
    }

    pub fn course(&self, code: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.matches_code(code))
    }

    pub fn faculty_resolver(&self) -> FacultyResolver<'_> {
        FacultyResolver::new(&self.roster)
    }

    /// Génère l'emploi du temps complet d'un semestre. Les échecs partiels
    /// sont listés dans `unscheduled`, jamais levés en erreur.
    pub fn schedule_semester(
        &self,
        semester: u8,
        student_type: StudentType,
    ) -> Result<SemesterSchedule, SchedError> {
        allocation::schedule_semester(self, semester, student_type)
    }

    /// Rejoue la correction des journées vides sur un emploi du temps existant.
    pub fn rebalance_free_days(&self, timetable: &mut Timetable) -> Vec<UnscheduledEntry> {
        allocation::rebalance_free_days(self.opts, timetable)
    }

    pub fn faculty_free_day_report(&self, timetable: &Timetable) -> Vec<UnscheduledEntry> {
        allocation::faculty_free_day_report(timetable)
    }

    pub fn validate_placement(
        &self,
        timetable: &Timetable,
        request: &PlacementRequest,
    ) -> Result<(), Violation> {
        self.prepare(timetable, request).map(|_| ())
    }

    pub fn check_faculty_collision(
        &self,
        timetable: &Timetable,
        day: Day,
        slot: Slot,
        faculty: &Faculty,
        exclude_batch: Batch,
    ) -> Vec<CollisionEntry> {
        collision::detect(timetable, day, slot, faculty, exclude_batch)
    }

    /// Placement manuel d'une cellule : validation, négociation éventuelle
    /// d'une collision, puis écriture. Tout refus laisse la grille intacte.
    pub fn place(
        &self,
        timetable: &mut Timetable,
        request: &PlacementRequest,
        arbiter: &mut dyn CollisionResolver,
    ) -> Result<Placement, SchedError> {
        let (course, faculty) = self
            .prepare(timetable, request)
            .map_err(SchedError::Constraint)?;
        let candidate = Candidate {
            batch: request.batch,
            day: request.day,
            slot: request.slot,
            session: Session::new(course, faculty, request.kind),
        };

        let (candidate, accepted_collisions) = match Negotiation::open(timetable, candidate) {
            Negotiation::Clear(candidate) => (candidate, Vec::new()),
            Negotiation::Pending(pending) => {
                tracing::info!(
                    faculty = %pending.candidate().session.faculty,
                    day = %request.day,
                    slot = %request.slot,
                    existing = pending.existing().len(),
                    "faculty collision awaiting decision"
                );
                let resolved = pending.negotiate(arbiter);
                match resolved.decision {
                    Decision::Allow => (resolved.candidate, resolved.existing),
                    Decision::Deny => return Err(SchedError::CollisionDenied(resolved.existing)),
                }
            }
        };

        timetable.set(
            candidate.batch,
            candidate.day,
            candidate.slot,
            candidate.session.clone(),
        );
        Ok(Placement {
            batch: candidate.batch,
            day: candidate.day,
            slot: candidate.slot,
            session: candidate.session,
            accepted_collisions,
        })
    }

    fn prepare(
        &self,
        timetable: &Timetable,
        request: &PlacementRequest,
    ) -> Result<(&Course, Faculty), Violation> {
        let semester = timetable.semester();
        let course = self
            .course(&request.course_code)
            .filter(|c| c.semester == semester && c.student_type == timetable.student_type())
            .ok_or_else(|| {
                Violation::new(
                    Rule::UnknownCourse,
                    format!(
                        "course {} is not offered in semester {semester} ({})",
                        request.course_code,
                        timetable.student_type()
                    ),
                )
            })?;
        if !timetable.student_type().batches().contains(&request.batch) {
            return Err(Violation::new(
                Rule::ForeignBatch,
                format!(
                    "batch {} is not a {} batch",
                    request.batch,
                    timetable.student_type()
                ),
            ));
        }
        let role = course.category.role_for(request.kind).ok_or_else(|| {
            Violation::new(
                Rule::WrongSessionKind,
                format!(
                    "{} course {} has no {} sessions",
                    course.category, course.code, request.kind
                ),
            )
        })?;
        if !timetable.is_free(request.batch, request.day, request.slot) {
            return Err(Violation::new(Rule::SlotOccupied, "Slot already occupied"));
        }

        let resolver = self.faculty_resolver();
        let faculty = resolver
            .resolve(course, request.batch, semester, role)
            .map_err(|why| Violation::new(Rule::NoFaculty, why.to_string()))?
            .clone();
        let teaches = resolver.batches_of(&faculty, semester);
        let proposal = Proposal {
            course,
            request,
            faculty: &faculty,
            teaches: &teaches,
        };
        constraints::check(timetable, self.opts, &proposal)?;
        Ok((course, faculty))
    }
}
