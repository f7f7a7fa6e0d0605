#![forbid(unsafe_code)]
use timetabler::{
    clear_session, schedule_labs, Batch, Category, Course, Day, Faculty, Floor, IssueKind,
    LabSchedule, Session, SessionKind, Slot, StudentType, Timetable,
};

fn lab_timetable(semester: u8, student_type: StudentType, cells: &[(Batch, Day, u8)]) -> Timetable {
    let course = Course::new(
        format!("L{semester}"),
        "Lab",
        semester,
        student_type,
        Category::Lab,
        2,
    );
    let mut tt = Timetable::new(semester, student_type);
    for (batch, day, number) in cells {
        tt.set(
            *batch,
            *day,
            Slot::from_number(*number).unwrap(),
            Session::new(&course, Faculty::new("Dr. L"), SessionKind::Lab),
        );
    }
    tt
}

#[test]
fn batches_use_their_own_floor() {
    let tt = lab_timetable(
        3,
        StudentType::Ug,
        &[
            (Batch::N, Day::Monday, 1),
            (Batch::P, Day::Monday, 1),
            (Batch::Q, Day::Monday, 1),
        ],
    );
    let mut labs = LabSchedule::new();
    assert!(schedule_labs(&tt, &mut labs).is_empty());
    assert_eq!(labs.len(), 3);
    for (floor, batch) in [
        (Floor::Ground, Batch::N),
        (Floor::First, Batch::P),
        (Floor::Second, Batch::Q),
    ] {
        let booking = labs.get(floor, Day::Monday, Slot::FIRST).unwrap();
        assert_eq!(booking.batch, batch);
        assert_eq!(booking.semester, 3);
    }
}

#[test]
fn other_semester_blocks_the_floor() {
    let sem3 = lab_timetable(3, StudentType::Ug, &[(Batch::N, Day::Monday, 1), (Batch::N, Day::Monday, 2)]);
    let sem5 = lab_timetable(5, StudentType::Ug, &[(Batch::N, Day::Monday, 1)]);
    let mut labs = LabSchedule::new();
    assert!(schedule_labs(&sem3, &mut labs).is_empty());

    let entries = schedule_labs(&sem5, &mut labs);
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.kind, IssueKind::LabFloorTaken);
    assert_eq!(entry.semester, 5);
    assert_eq!(entry.batch, Some(Batch::N));
    assert_eq!(entry.slot, Some(Slot::FIRST));
    assert!(entry.reason.contains("batch N semester 3"), "{}", entry.reason);

    // la réservation existante est intacte
    let booking = labs.get(Floor::Ground, Day::Monday, Slot::FIRST).unwrap();
    assert_eq!(booking.semester, 3);
    assert_eq!(labs.for_semester(5, StudentType::Ug).count(), 0);
}

#[test]
fn rerunning_a_semester_replaces_its_bookings() {
    let first = lab_timetable(3, StudentType::Ug, &[(Batch::N, Day::Monday, 1)]);
    let moved = lab_timetable(3, StudentType::Ug, &[(Batch::N, Day::Tuesday, 5)]);
    let mut labs = LabSchedule::new();

    assert!(schedule_labs(&first, &mut labs).is_empty());
    assert!(schedule_labs(&first, &mut labs).is_empty());
    assert_eq!(labs.len(), 1);

    assert!(schedule_labs(&moved, &mut labs).is_empty());
    assert_eq!(labs.len(), 1);
    assert!(labs.get(Floor::Ground, Day::Monday, Slot::FIRST).is_none());
    assert!(labs
        .get(Floor::Ground, Day::Tuesday, Slot::from_number(5).unwrap())
        .is_some());
}

#[test]
fn postgraduates_share_the_second_floor() {
    let ug = lab_timetable(3, StudentType::Ug, &[(Batch::Q, Day::Friday, 8)]);
    let pg = lab_timetable(1, StudentType::Pg, &[(Batch::Pg, Day::Friday, 8), (Batch::Pg, Day::Friday, 7)]);
    let mut labs = LabSchedule::new();
    assert!(schedule_labs(&ug, &mut labs).is_empty());

    let entries = schedule_labs(&pg, &mut labs);
    assert_eq!(entries.len(), 1);
    assert!(entries[0].reason.starts_with("second floor is taken on Fri slot 8 by batch Q semester 3"));
    assert_eq!(labs.for_semester(1, StudentType::Pg).count(), 1);
    assert_eq!(labs.all().count(), 2);
}

#[test]
fn clearing_a_lab_cell_releases_the_floor() {
    let mut tt = lab_timetable(3, StudentType::Ug, &[(Batch::P, Day::Wednesday, 3)]);
    let mut labs = LabSchedule::new();
    schedule_labs(&tt, &mut labs);
    let slot = Slot::from_number(3).unwrap();
    assert!(labs.get(Floor::First, Day::Wednesday, slot).is_some());

    let cleared = clear_session(&mut tt, &mut labs, Batch::P, Day::Wednesday, slot).unwrap();
    assert_eq!(cleared.course_code, "L3");
    assert!(tt.is_free(Batch::P, Day::Wednesday, slot));
    assert!(labs.is_empty());
    assert!(clear_session(&mut tt, &mut labs, Batch::P, Day::Wednesday, slot).is_none());
}

#[test]
fn lab_schedule_survives_json() {
    let tt = lab_timetable(3, StudentType::Ug, &[(Batch::N, Day::Monday, 1), (Batch::Q, Day::Thursday, 6)]);
    let mut labs = LabSchedule::new();
    schedule_labs(&tt, &mut labs);

    let json = serde_json::to_string(&labs).unwrap();
    assert!(json.starts_with('['));
    let back: LabSchedule = serde_json::from_str(&json).unwrap();
    assert_eq!(back, labs);
}
