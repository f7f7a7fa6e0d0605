use super::types::{PlacementRequest, Rule, SchedulerOptions, Violation};
use crate::model::{Batch, Course, Day, Faculty, SessionKind, Slot};
use crate::timetable::{run_through, Timetable};

/// Placement manuel déjà résolu (cours et enseignant connus).
pub(super) struct Proposal<'a> {
    pub course: &'a Course,
    pub request: &'a PlacementRequest,
    pub faculty: &'a Faculty,
    /// Batches couverts par l'enseignant sur ce semestre.
    pub teaches: &'a [Batch],
}

/// Règles dures, dans l'ordre de priorité du message renvoyé.
pub(super) fn check(
    timetable: &Timetable,
    opts: SchedulerOptions,
    proposal: &Proposal<'_>,
) -> Result<(), Violation> {
    first_hour(timetable, proposal)?;
    consecutive_classes(timetable, opts, proposal)?;
    lab_periods_per_day(timetable, opts, proposal)?;
    faculty_free_day(timetable, proposal)?;
    lab_day_theory(timetable, opts, proposal)?;
    Ok(())
}

fn first_hour(timetable: &Timetable, p: &Proposal<'_>) -> Result<(), Violation> {
    if p.request.slot == Slot::FIRST {
        return Ok(());
    }
    let has_first = Day::ALL
        .iter()
        .any(|d| timetable.faculty_busy(p.faculty, *d, Slot::FIRST));
    if has_first {
        return Ok(());
    }
    // seuls les batches présents dans cette grille comptent
    let reachable = Day::ALL.iter().any(|d| {
        !timetable.faculty_busy(p.faculty, *d, Slot::FIRST)
            && p
                .teaches
                .iter()
                .chain(std::iter::once(&p.request.batch))
                .filter(|b| timetable.grid(**b).is_some())
                .any(|b| timetable.is_free(*b, *d, Slot::FIRST))
    });
    if reachable {
        Ok(())
    } else {
        Err(Violation::new(
            Rule::FirstHour,
            format!(
                "{} has no first-hour class and no first slot is left to give one",
                p.faculty
            ),
        ))
    }
}

fn consecutive_classes(
    timetable: &Timetable,
    opts: SchedulerOptions,
    p: &Proposal<'_>,
) -> Result<(), Violation> {
    let mask = timetable.faculty_day_mask(p.faculty, p.request.day);
    let run = run_through(&mask, p.request.slot.index(), 1);
    if run > usize::from(opts.max_consecutive_classes) {
        return Err(Violation::new(
            Rule::ConsecutiveClasses,
            format!(
                "{} would teach {run} consecutive classes on {} (max {})",
                p.faculty, p.request.day, opts.max_consecutive_classes
            ),
        ));
    }
    Ok(())
}

fn lab_periods_per_day(
    timetable: &Timetable,
    opts: SchedulerOptions,
    p: &Proposal<'_>,
) -> Result<(), Violation> {
    if p.request.kind != SessionKind::Lab {
        return Ok(());
    }
    let count = timetable.course_day_count(p.request.batch, p.request.day, &p.course.code);
    if count.lab >= usize::from(opts.max_lab_periods_per_day) {
        return Err(Violation::new(
            Rule::LabPeriodsPerDay,
            format!(
                "{} already has {} lab periods on {} for batch {}",
                p.course.code, count.lab, p.request.day, p.request.batch
            ),
        ));
    }
    Ok(())
}

fn faculty_free_day(timetable: &Timetable, p: &Proposal<'_>) -> Result<(), Violation> {
    let busy = timetable.faculty_busy_days(p.faculty);
    let free_days = busy.iter().filter(|b| !**b).count();
    if !busy[p.request.day.index()] && free_days <= 1 {
        return Err(Violation::new(
            Rule::FacultyFreeDay,
            format!(
                "{} would lose the last free day of the week ({})",
                p.faculty, p.request.day
            ),
        ));
    }
    Ok(())
}

fn lab_day_theory(
    timetable: &Timetable,
    opts: SchedulerOptions,
    p: &Proposal<'_>,
) -> Result<(), Violation> {
    let count = timetable.course_day_count(p.request.batch, p.request.day, &p.course.code);
    let cap = usize::from(opts.max_theory_on_lab_day);
    let too_many = match p.request.kind {
        SessionKind::Theory => count.lab > 0 && count.theory >= cap,
        SessionKind::Lab => count.lab == 0 && count.theory > cap,
    };
    if too_many {
        return Err(Violation::new(
            Rule::LabDayTheory,
            format!(
                "{} is a lab day for {}: only {cap} theory session allowed",
                p.request.day, p.course.code
            ),
        ));
    }
    Ok(())
}
