#![forbid(unsafe_code)]
use timetabler::scheduler::Rule;
use timetabler::{
    Batch, Category, Course, Day, Faculty, FacultyAssignment, PlacementRequest, Role, Scheduler,
    Session, SessionKind, Slot, StudentType, Timetable,
};

fn slot(n: u8) -> Slot {
    Slot::from_number(n).unwrap()
}

fn course(code: &str, category: Category, credits: u8) -> Course {
    Course::new(code, format!("{code} course"), 3, StudentType::Ug, category, credits)
}

fn fixture() -> (Scheduler, Vec<Course>) {
    let courses = vec![
        course("T1", Category::Theory, 4),
        course("Y", Category::Theory, 5),
        course("L1", Category::Lab, 4),
        course("M1", Category::LabIntegratedTheory, 5),
    ];
    let roster = vec![
        FacultyAssignment::new("Dr. A", "T1", Batch::N, 3, Role::TheoryTeacher),
        FacultyAssignment::new("Dr. A", "Y", Batch::P, 3, Role::TheoryTeacher),
        FacultyAssignment::new("Dr. L", "L1", Batch::N, 3, Role::LabIncharge),
        FacultyAssignment::new("Dr. M", "M1", Batch::N, 3, Role::TheoryTeacher),
        FacultyAssignment::new("Dr. M", "M1", Batch::N, 3, Role::LabIncharge),
    ];
    (Scheduler::new(courses.clone(), roster).unwrap(), courses)
}

fn put(
    tt: &mut Timetable,
    batch: Batch,
    day: Day,
    slot: Slot,
    course: &Course,
    who: &str,
    kind: SessionKind,
) {
    tt.set(batch, day, slot, Session::new(course, Faculty::new(who), kind));
}

fn rule_of(sched: &Scheduler, tt: &Timetable, req: PlacementRequest) -> Rule {
    sched.validate_placement(tt, &req).unwrap_err().rule
}

#[test]
fn valid_first_hour_placement() {
    let (sched, _) = fixture();
    let tt = Timetable::new(3, StudentType::Ug);
    let req = PlacementRequest::new(Batch::N, Day::Monday, Slot::FIRST, "t1", SessionKind::Theory);
    assert!(sched.validate_placement(&tt, &req).is_ok());
}

#[test]
fn occupied_cell_is_rejected() {
    let (sched, courses) = fixture();
    let mut tt = Timetable::new(3, StudentType::Ug);
    put(&mut tt, Batch::N, Day::Monday, Slot::FIRST, &courses[0], "Dr. A", SessionKind::Theory);
    let req = PlacementRequest::new(Batch::N, Day::Monday, Slot::FIRST, "T1", SessionKind::Theory);
    let violation = sched.validate_placement(&tt, &req).unwrap_err();
    assert_eq!(violation.rule, Rule::SlotOccupied);
    assert_eq!(violation.to_string(), "Slot already occupied");
}

#[test]
fn unmapped_batch_has_no_faculty() {
    let (sched, _) = fixture();
    let tt = Timetable::new(3, StudentType::Ug);
    let req = PlacementRequest::new(Batch::Q, Day::Monday, Slot::FIRST, "T1", SessionKind::Theory);
    let violation = sched.validate_placement(&tt, &req).unwrap_err();
    assert_eq!(violation.rule, Rule::NoFaculty);
    assert_eq!(violation.reason, "No faculty mapped");
}

#[test]
fn request_shape_is_checked_first() {
    let (sched, _) = fixture();
    let tt = Timetable::new(3, StudentType::Ug);
    let monday = |batch, code: &str, kind| PlacementRequest::new(batch, Day::Monday, Slot::FIRST, code, kind);

    assert_eq!(
        rule_of(&sched, &tt, monday(Batch::N, "NOPE", SessionKind::Theory)),
        Rule::UnknownCourse
    );
    assert_eq!(
        rule_of(&sched, &tt, monday(Batch::N, "T1", SessionKind::Lab)),
        Rule::WrongSessionKind
    );
    assert_eq!(
        rule_of(&sched, &tt, monday(Batch::Pg, "T1", SessionKind::Theory)),
        Rule::ForeignBatch
    );
    let other_semester = Timetable::new(5, StudentType::Ug);
    assert_eq!(
        rule_of(&sched, &other_semester, monday(Batch::N, "T1", SessionKind::Theory)),
        Rule::UnknownCourse
    );
}

#[test]
fn faculty_must_keep_a_reachable_first_hour() {
    let (sched, courses) = fixture();
    let mut tt = Timetable::new(3, StudentType::Ug);
    // Dr. A couvre N et P : tous leurs premiers créneaux sont pris
    for day in Day::ALL {
        put(&mut tt, Batch::N, day, Slot::FIRST, &courses[1], "Dr. B", SessionKind::Theory);
        put(&mut tt, Batch::P, day, Slot::FIRST, &courses[1], "Dr. B", SessionKind::Theory);
    }
    let req = PlacementRequest::new(Batch::N, Day::Monday, slot(2), "T1", SessionKind::Theory);
    assert_eq!(rule_of(&sched, &tt, req), Rule::FirstHour);

    // un premier créneau libre ailleurs suffit
    tt.take(Batch::N, Day::Friday, Slot::FIRST);
    let req = PlacementRequest::new(Batch::N, Day::Monday, slot(2), "T1", SessionKind::Theory);
    assert!(sched.validate_placement(&tt, &req).is_ok());
}

#[test]
fn sixth_consecutive_class_is_rejected_across_lunch() {
    let (sched, courses) = fixture();
    let mut tt = Timetable::new(3, StudentType::Ug);
    for n in 1..=5 {
        put(&mut tt, Batch::P, Day::Monday, slot(n), &courses[1], "Dr. A", SessionKind::Theory);
    }
    let req = PlacementRequest::new(Batch::N, Day::Monday, slot(6), "T1", SessionKind::Theory);
    let violation = sched.validate_placement(&tt, &req).unwrap_err();
    assert_eq!(violation.rule, Rule::ConsecutiveClasses);
    assert!(violation.reason.contains("6 consecutive"));

    let req = PlacementRequest::new(Batch::N, Day::Monday, slot(7), "T1", SessionKind::Theory);
    assert!(sched.validate_placement(&tt, &req).is_ok());
}

#[test]
fn lab_periods_per_day_are_capped() {
    let (sched, courses) = fixture();
    let mut tt = Timetable::new(3, StudentType::Ug);
    for n in 1..=4 {
        put(&mut tt, Batch::N, Day::Monday, slot(n), &courses[2], "Dr. L", SessionKind::Lab);
    }
    let req = PlacementRequest::new(Batch::N, Day::Monday, slot(5), "L1", SessionKind::Lab);
    assert_eq!(rule_of(&sched, &tt, req), Rule::LabPeriodsPerDay);
}

#[test]
fn last_free_day_is_protected() {
    let (sched, courses) = fixture();
    let mut tt = Timetable::new(3, StudentType::Ug);
    for day in [Day::Monday, Day::Tuesday, Day::Wednesday, Day::Thursday] {
        put(&mut tt, Batch::P, day, Slot::FIRST, &courses[1], "Dr. A", SessionKind::Theory);
    }
    let req = PlacementRequest::new(Batch::N, Day::Friday, Slot::FIRST, "T1", SessionKind::Theory);
    assert_eq!(rule_of(&sched, &tt, req), Rule::FacultyFreeDay);

    // un jour déjà travaillé reste possible
    let req = PlacementRequest::new(Batch::N, Day::Tuesday, slot(2), "T1", SessionKind::Theory);
    assert!(sched.validate_placement(&tt, &req).is_ok());
}

#[test]
fn lab_day_allows_a_single_theory_hour() {
    let (sched, courses) = fixture();
    let m1 = &courses[3];
    let mut tt = Timetable::new(3, StudentType::Ug);
    for n in 5..=8 {
        put(&mut tt, Batch::N, Day::Monday, slot(n), m1, "Dr. M", SessionKind::Lab);
    }
    put(&mut tt, Batch::N, Day::Monday, Slot::FIRST, m1, "Dr. M", SessionKind::Theory);

    let req = PlacementRequest::new(Batch::N, Day::Monday, slot(2), "M1", SessionKind::Theory);
    let violation = sched.validate_placement(&tt, &req).unwrap_err();
    assert_eq!(violation.rule, Rule::LabDayTheory);

    // sans la séance de théorie, une heure reste permise
    tt.take(Batch::N, Day::Monday, Slot::FIRST);
    let req = PlacementRequest::new(Batch::N, Day::Monday, slot(2), "M1", SessionKind::Theory);
    assert!(sched.validate_placement(&tt, &req).is_ok());
}

#[test]
fn lab_cannot_join_a_day_with_two_theory_hours() {
    let (sched, courses) = fixture();
    let m1 = &courses[3];
    let mut tt = Timetable::new(3, StudentType::Ug);
    put(&mut tt, Batch::N, Day::Monday, Slot::FIRST, m1, "Dr. M", SessionKind::Theory);
    put(&mut tt, Batch::N, Day::Monday, slot(2), m1, "Dr. M", SessionKind::Theory);

    let req = PlacementRequest::new(Batch::N, Day::Monday, slot(5), "M1", SessionKind::Lab);
    assert_eq!(rule_of(&sched, &tt, req), Rule::LabDayTheory);
}

#[test]
fn first_hour_ignores_batches_outside_the_timetable() {
    let t1 = course("T1", Category::Theory, 3);
    let pg = Course::new("PG1", "Research Methods", 3, StudentType::Pg, Category::Theory, 3);
    let roster = vec![
        FacultyAssignment::new("Dr. A", "T1", Batch::N, 3, Role::TheoryTeacher),
        FacultyAssignment::new("Dr. A", "PG1", Batch::Pg, 3, Role::TheoryTeacher),
    ];
    let sched = Scheduler::new(vec![t1.clone(), pg], roster).unwrap();
    let mut tt = Timetable::new(3, StudentType::Ug);
    for day in Day::ALL {
        put(&mut tt, Batch::N, day, Slot::FIRST, &t1, "Dr. B", SessionKind::Theory);
    }

    // la grille PG n'existe pas ici : elle n'offre aucun premier créneau
    let req = PlacementRequest::new(Batch::N, Day::Monday, slot(2), "T1", SessionKind::Theory);
    assert_eq!(rule_of(&sched, &tt, req), Rule::FirstHour);
}
