use crate::diagnostics::UnscheduledEntry;
use crate::labs::LabSchedule;
use crate::model::{canonical_name, Batch, Category, Course, Faculty, FacultyAssignment, Role, StudentType};
use crate::timetable::Timetable;
use anyhow::{bail, Context};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::path::Path;

/// Import du catalogue : header `code,name,semester,student_type,category,credits`
pub fn import_courses_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Course>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for (line, rec) in rdr.records().enumerate() {
        let rec = rec?;
        let row = line + 2;
        let code = field(&rec, 0, "code", row)?;
        let name = field(&rec, 1, "name", row)?;
        if code.is_empty() || name.is_empty() {
            bail!("invalid course row {row} (empty code or name)");
        }
        let semester: u8 = field(&rec, 2, "semester", row)?
            .parse()
            .with_context(|| format!("invalid semester on row {row}"))?;
        let student_type = field(&rec, 3, "student_type", row)?
            .parse::<StudentType>()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("row {row}"))?;
        let category = field(&rec, 4, "category", row)?
            .parse::<Category>()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("row {row}"))?;
        let credits: u8 = field(&rec, 5, "credits", row)?
            .parse()
            .with_context(|| format!("invalid credits on row {row}"))?;
        out.push(Course::new(code, name, semester, student_type, category, credits));
    }
    Ok(out)
}

/// Import des affectations : header `faculty,course_code,course_name,batch,semester,role`
///
/// Le code ou le nom du cours peut être vide, pas les deux.
pub fn import_assignments_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<FacultyAssignment>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for (line, rec) in rdr.records().enumerate() {
        let rec = rec?;
        let row = line + 2;
        let faculty = field(&rec, 0, "faculty", row)?;
        if faculty.is_empty() {
            bail!("invalid roster row {row} (empty faculty)");
        }
        let course_code = optional(rec.get(1));
        let course_name = optional(rec.get(2));
        if course_code.is_none() && course_name.is_none() {
            bail!("roster row {row} names neither a course code nor a course name");
        }
        let batch = field(&rec, 3, "batch", row)?
            .parse::<Batch>()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("row {row}"))?;
        let semester: u8 = field(&rec, 4, "semester", row)?
            .parse()
            .with_context(|| format!("invalid semester on row {row}"))?;
        let role = field(&rec, 5, "role", row)?
            .parse::<Role>()
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("row {row}"))?;
        out.push(FacultyAssignment {
            faculty: Faculty::new(faculty),
            course_code,
            course_name,
            batch,
            semester,
            role,
        });
    }
    Ok(out)
}

fn field<'r>(rec: &'r StringRecord, index: usize, name: &str, row: usize) -> anyhow::Result<&'r str> {
    rec.get(index)
        .map(str::trim)
        .with_context(|| format!("missing {name} on row {row}"))
}

fn optional(raw: Option<&str>) -> Option<String> {
    raw.map(canonical_name).filter(|s| !s.is_empty())
}

/// Export CSV : header `semester,student_type,batch,day,slot,start,end,course_code,course_name,faculty,kind`
pub fn export_timetable_csv<P: AsRef<Path>>(path: P, timetable: &Timetable) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record([
        "semester",
        "student_type",
        "batch",
        "day",
        "slot",
        "start",
        "end",
        "course_code",
        "course_name",
        "faculty",
        "kind",
    ])?;
    for (batch, day, slot, session) in timetable.cells() {
        let (start, end) = slot.interval();
        w.write_record([
            timetable.semester().to_string(),
            timetable.student_type().to_string(),
            batch.to_string(),
            day.to_string(),
            slot.to_string(),
            start.format("%H:%M").to_string(),
            end.format("%H:%M").to_string(),
            session.course_code.clone(),
            session.course_name.clone(),
            session.faculty.to_string(),
            session.kind.to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Export CSV des diagnostics : header `kind,semester,student_type,batch,course_code,faculty,day,slot,missing_hours,reason`
pub fn export_unscheduled_csv<P: AsRef<Path>>(
    path: P,
    entries: &[UnscheduledEntry],
) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record([
        "kind",
        "semester",
        "student_type",
        "batch",
        "course_code",
        "faculty",
        "day",
        "slot",
        "missing_hours",
        "reason",
    ])?;
    for e in entries {
        w.write_record([
            e.kind.to_string(),
            e.semester.to_string(),
            e.student_type.to_string(),
            e.batch.map(|b| b.to_string()).unwrap_or_default(),
            e.course_code.clone().unwrap_or_default(),
            e.faculty.as_ref().map(|f| f.to_string()).unwrap_or_default(),
            e.day.map(|d| d.to_string()).unwrap_or_default(),
            e.slot.map(|s| s.to_string()).unwrap_or_default(),
            e.missing_hours.to_string(),
            e.reason.clone(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// Export CSV des réservations d'étages : header `floor,day,slot,batch,semester,course_code,course_name`
pub fn export_labs_csv<P: AsRef<Path>>(path: P, labs: &LabSchedule) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record([
        "floor",
        "day",
        "slot",
        "batch",
        "semester",
        "course_code",
        "course_name",
    ])?;
    for r in labs.records() {
        w.write_record([
            r.floor.to_string(),
            r.day.to_string(),
            r.slot.to_string(),
            r.booking.batch.to_string(),
            r.booking.semester.to_string(),
            r.booking.course_code,
            r.booking.course_name,
        ])?;
    }
    w.flush()?;
    Ok(())
}
