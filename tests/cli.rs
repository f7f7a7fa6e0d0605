#![forbid(unsafe_code)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use timetabler::{JsonStorage, Storage};

fn cli(workspace: &Path) -> Command {
    let mut cmd = Command::cargo_bin("timetabler-cli").unwrap();
    cmd.arg("--workspace").arg(workspace);
    cmd
}

const C1_COURSES: &str =
    "code,name,semester,student_type,category,credits\nC1,Data Structures,3,UG,Theory,3\n";
const C1_ROSTER: &str =
    "faculty,course_code,course_name,batch,semester,role\nDr. A,C1,,Batch N,3,Theory Teacher\n";

fn seeded(dir: &Path) -> std::path::PathBuf {
    seeded_with(dir, C1_COURSES, C1_ROSTER)
}

fn seeded_with(dir: &Path, courses_csv: &str, roster_csv: &str) -> std::path::PathBuf {
    let ws = dir.join("ws.json");
    let courses = dir.join("courses.csv");
    let roster = dir.join("roster.csv");
    fs::write(&courses, courses_csv).unwrap();
    fs::write(&roster, roster_csv).unwrap();

    cli(&ws)
        .args(["import-courses", "--csv"])
        .arg(&courses)
        .assert()
        .success()
        .stdout(predicate::str::contains("course(s) imported"));
    cli(&ws)
        .args(["import-roster", "--csv"])
        .arg(&roster)
        .assert()
        .success();
    ws
}

fn floors_match_cells(ws: &Path) -> (usize, usize) {
    let workspace = JsonStorage::open(ws).unwrap().load().unwrap();
    let cells = workspace
        .timetables
        .iter()
        .map(|tt| tt.cells().filter(|(_, _, _, s)| s.is_lab()).count())
        .sum();
    (workspace.labs.len(), cells)
}

#[test]
fn schedule_reports_missing_faculty() {
    let dir = tempdir().unwrap();
    let ws = seeded(dir.path());

    cli(&ws)
        .args(["schedule", "--semester", "3"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Semester 3 (UG): 3 session(s) placed"))
        .stderr(predicate::str::contains("No faculty mapped"));

    cli(&ws)
        .args(["show", "--semester", "3", "--batch", "Batch N"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Mon: C1 - - -"));

    cli(&ws)
        .arg("report")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("batch-free-day"));
}

#[test]
fn check_validates_without_writing() {
    let dir = tempdir().unwrap();
    let ws = seeded(dir.path());
    cli(&ws).args(["schedule", "--semester", "3"]).assert().code(2);

    cli(&ws)
        .args([
            "check", "--semester", "3", "--batch", "N", "--day", "Mon", "--slot", "1", "--course",
            "C1",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Slot already occupied"));

    cli(&ws)
        .args([
            "check", "--semester", "3", "--batch", "N", "--day", "Thu", "--slot", "1", "--course",
            "C1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("OK: placement is valid"));
}

#[test]
fn out_of_range_semester_fails() {
    let dir = tempdir().unwrap();
    let ws = seeded(dir.path());
    cli(&ws)
        .args(["schedule", "--semester", "5", "--student-type", "PG"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

const LAB_COURSES: &str =
    "code,name,semester,student_type,category,credits\nL1,Networks Lab,3,UG,Lab,4\n";
const LAB_ROSTER: &str =
    "faculty,course_code,course_name,batch,semester,role\nDr. L,L1,,N,3,Lab Incharge\n";

#[test]
fn rescheduling_keeps_floors_in_step() {
    let dir = tempdir().unwrap();
    let ws = seeded_with(dir.path(), LAB_COURSES, LAB_ROSTER);
    cli(&ws).args(["schedule", "--semester", "3"]).assert().code(2);
    assert_eq!(floors_match_cells(&ws), (4, 4));

    // roster vidé hors CLI, puis nouveau run : les étages suivent
    let storage = JsonStorage::open(&ws).unwrap();
    let mut workspace = storage.load().unwrap();
    workspace.roster.clear();
    storage.save(&workspace).unwrap();

    cli(&ws).args(["schedule", "--semester", "3"]).assert().code(2);
    assert_eq!(floors_match_cells(&ws), (0, 0));
}

#[test]
fn manual_lab_placement_books_the_floor() {
    let dir = tempdir().unwrap();
    let ws = seeded_with(dir.path(), LAB_COURSES, LAB_ROSTER);
    cli(&ws)
        .args([
            "place", "--semester", "3", "--batch", "N", "--day", "Mon", "--slot", "1",
            "--course", "L1", "--kind", "lab", "--on-collision", "deny",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Placed L1"));
    assert_eq!(floors_match_cells(&ws), (1, 1));
}

#[test]
fn labs_rerun_keeps_schedule_report() {
    let dir = tempdir().unwrap();
    let ws = seeded(dir.path());
    cli(&ws).args(["schedule", "--semester", "3"]).assert().code(2);

    cli(&ws)
        .args(["labs", "--semester", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 lab period(s) booked"));
    cli(&ws)
        .arg("report")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("No faculty mapped"));
}
