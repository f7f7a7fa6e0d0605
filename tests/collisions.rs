#![forbid(unsafe_code)]
use timetabler::scheduler::{Candidate, Negotiation};
use timetabler::{
    Batch, Category, CollisionEntry, Course, Day, Decision, Faculty, FacultyAssignment,
    FixedPolicy, PlacementRequest, Role, SchedError, Scheduler, Session, SessionKind, Slot,
    StudentType, Timetable,
};

fn setup() -> (Scheduler, Course, Timetable) {
    let course = Course::new("T1", "Algorithms", 3, StudentType::Ug, Category::Theory, 3);
    let roster = vec![
        FacultyAssignment::new("Dr. A", "T1", Batch::N, 3, Role::TheoryTeacher),
        FacultyAssignment::new("Dr. A", "T1", Batch::P, 3, Role::TheoryTeacher),
    ];
    let sched = Scheduler::new(vec![course.clone()], roster).unwrap();
    let mut tt = Timetable::new(3, StudentType::Ug);
    tt.set(
        Batch::N,
        Day::Monday,
        Slot::FIRST,
        Session::new(&course, Faculty::new("Dr. A"), SessionKind::Theory),
    );
    (sched, course, tt)
}

fn request_p() -> PlacementRequest {
    PlacementRequest::new(Batch::P, Day::Monday, Slot::FIRST, "T1", SessionKind::Theory)
}

#[test]
fn denied_collision_leaves_timetable_untouched() {
    let (sched, _, mut tt) = setup();
    let before = tt.clone();

    let err = sched
        .place(&mut tt, &request_p(), &mut FixedPolicy(Decision::Deny))
        .unwrap_err();
    match err {
        SchedError::CollisionDenied(existing) => {
            assert_eq!(existing.len(), 1);
            assert_eq!(existing[0].batch, Batch::N);
            assert_eq!(existing[0].course_code, "T1");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(tt, before);
}

#[test]
fn allowed_collision_is_committed_with_its_context() {
    let (sched, _, mut tt) = setup();
    let mut seen = Vec::new();
    let mut ask = |candidate: &Candidate, existing: &[CollisionEntry]| {
        seen.push((candidate.batch, existing.len()));
        Decision::Allow
    };

    let placement = sched.place(&mut tt, &request_p(), &mut ask).unwrap();
    assert_eq!(placement.accepted_collisions.len(), 1);
    assert_eq!(placement.session.faculty, Faculty::new("Dr. A"));
    assert_eq!(seen, vec![(Batch::P, 1)]);
    assert_eq!(
        tt.faculty_sessions_at(&Faculty::new("Dr. A"), Day::Monday, Slot::FIRST)
            .count(),
        2
    );
}

#[test]
fn no_collision_means_no_question() {
    let (sched, _, mut tt) = setup();
    let req = PlacementRequest::new(Batch::P, Day::Monday, Slot::from_number(2).unwrap(), "T1", SessionKind::Theory);
    let mut never = |_: &Candidate, _: &[CollisionEntry]| -> Decision {
        panic!("resolver must not be consulted")
    };
    let placement = sched.place(&mut tt, &req, &mut never).unwrap();
    assert!(placement.accepted_collisions.is_empty());
    assert!(!tt.is_free(Batch::P, Day::Monday, Slot::from_number(2).unwrap()));
}

#[test]
fn constraint_failure_never_reaches_the_resolver() {
    let (sched, _, mut tt) = setup();
    let req = PlacementRequest::new(Batch::N, Day::Monday, Slot::FIRST, "T1", SessionKind::Theory);
    let err = sched
        .place(&mut tt, &req, &mut FixedPolicy(Decision::Allow))
        .unwrap_err();
    assert!(matches!(err, SchedError::Constraint(v) if v.reason == "Slot already occupied"));
}

#[test]
fn collision_check_excludes_the_target_batch() {
    let (sched, _, tt) = setup();
    let dr_a = Faculty::new("Dr. A");
    let hits = sched.check_faculty_collision(&tt, Day::Monday, Slot::FIRST, &dr_a, Batch::P);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].kind, SessionKind::Theory);
    assert!(sched
        .check_faculty_collision(&tt, Day::Monday, Slot::FIRST, &dr_a, Batch::N)
        .is_empty());
    assert!(sched
        .check_faculty_collision(&tt, Day::Tuesday, Slot::FIRST, &dr_a, Batch::P)
        .is_empty());
}

#[test]
fn pending_collision_requires_an_explicit_decision() {
    let (_, course, tt) = setup();
    let candidate = Candidate {
        batch: Batch::Q,
        day: Day::Monday,
        slot: Slot::FIRST,
        session: Session::new(&course, Faculty::new("Dr. A"), SessionKind::Theory),
    };
    let Negotiation::Pending(pending) = Negotiation::open(&tt, candidate) else {
        panic!("collision expected");
    };
    assert_eq!(pending.existing().len(), 1);
    assert_eq!(pending.candidate().batch, Batch::Q);
    let resolved = pending.decide(Decision::Deny);
    assert_eq!(resolved.decision, Decision::Deny);
    assert_eq!(resolved.existing[0].batch, Batch::N);
}
