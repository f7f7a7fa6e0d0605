#![forbid(unsafe_code)]
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{BufRead, Write};
use timetabler::{
    io,
    labs::clear_session,
    model::{Batch, Day, SessionKind, Slot, StudentType},
    scheduler::{
        Candidate, CollisionEntry, CollisionResolver, Decision, FixedPolicy, PlacementRequest,
        SchedError, Scheduler, SchedulerOptions,
    },
    storage::{JsonStorage, Storage, Workspace},
    timetable::Timetable,
    UnscheduledEntry,
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de génération d'emplois du temps (sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON du workspace
    #[arg(long, global = true, default_value = "timetable.json")]
    workspace: String,

    /// Options du planificateur (JSON), prioritaires sur celles du workspace
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

/// Semestre ciblé
#[derive(clap::Args, Debug, Clone)]
struct Term {
    #[arg(long)]
    semester: u8,
    #[arg(long, default_value = "UG", value_parser = parse_arg::<StudentType>)]
    student_type: StudentType,
}

/// Cellule ciblée
#[derive(clap::Args, Debug, Clone)]
struct Cell {
    #[arg(long, value_parser = parse_arg::<Batch>)]
    batch: Batch,
    #[arg(long, value_parser = parse_arg::<Day>)]
    day: Day,
    /// 1..8
    #[arg(long, value_parser = parse_arg::<Slot>)]
    slot: Slot,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OnCollision {
    Ask,
    Allow,
    Deny,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Importer le catalogue de cours depuis un CSV
    ImportCourses {
        #[arg(long)]
        csv: String,
    },

    /// Importer les affectations enseignants depuis un CSV
    ImportRoster {
        #[arg(long)]
        csv: String,
    },

    /// Générer l'emploi du temps d'un semestre (étages de TP compris)
    Schedule {
        #[command(flatten)]
        term: Term,
        #[arg(long)]
        out_csv: Option<String>,
    },

    /// Répartir les TP d'un semestre sur les étages
    Labs {
        #[command(flatten)]
        term: Term,
        #[arg(long)]
        out_csv: Option<String>,
    },

    /// Vérifier un placement manuel sans l'écrire
    Check {
        #[command(flatten)]
        term: Term,
        #[command(flatten)]
        cell: Cell,
        #[arg(long)]
        course: String,
        #[arg(long, default_value = "theory", value_parser = parse_arg::<SessionKind>)]
        kind: SessionKind,
    },

    /// Placer manuellement une séance
    Place {
        #[command(flatten)]
        term: Term,
        #[command(flatten)]
        cell: Cell,
        #[arg(long)]
        course: String,
        #[arg(long, default_value = "theory", value_parser = parse_arg::<SessionKind>)]
        kind: SessionKind,
        #[arg(long, value_enum, default_value_t = OnCollision::Ask)]
        on_collision: OnCollision,
    },

    /// Vider une cellule (et l'étage de TP associé)
    Clear {
        #[command(flatten)]
        term: Term,
        #[command(flatten)]
        cell: Cell,
    },

    /// Afficher les grilles d'un semestre
    Show {
        #[command(flatten)]
        term: Term,
        #[arg(long, value_parser = parse_arg::<Batch>)]
        batch: Option<Batch>,
    },

    /// Lister (et exporter) les diagnostics du dernier run
    Report {
        #[arg(long)]
        out_csv: Option<String>,
    },
}

fn parse_arg<T>(raw: &str) -> Result<T, String>
where
    T: std::str::FromStr<Err = String>,
{
    raw.parse()
}

/// Demande la décision sur l'entrée standard.
struct Prompt;

impl CollisionResolver for Prompt {
    fn resolve(&mut self, candidate: &Candidate, existing: &[CollisionEntry]) -> Decision {
        eprintln!(
            "{} already teaches at {} slot {}:",
            candidate.session.faculty, candidate.day, candidate.slot
        );
        for e in existing {
            eprintln!("  batch {}: {} {} ({})", e.batch, e.course_code, e.course_name, e.kind);
        }
        eprint!("Allow batch {} as well? [y/N] ", candidate.batch);
        let _ = std::io::stderr().flush();
        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return Decision::Deny;
        }
        match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Decision::Allow,
            _ => Decision::Deny,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .try_init();
    }

    let storage = JsonStorage::open(&cli.workspace)?;
    let mut workspace = if storage.path().exists() {
        storage.load()?
    } else {
        Workspace::default()
    };
    if let Some(path) = &cli.config {
        let raw = std::fs::read(path).with_context(|| format!("reading {path}"))?;
        workspace.options = serde_json::from_slice::<SchedulerOptions>(&raw)
            .with_context(|| format!("parsing options {path}"))?;
    }

    let code = match cli.cmd {
        Commands::ImportCourses { csv } => {
            let courses = io::import_courses_csv(csv)?;
            println!("{} course(s) imported", courses.len());
            workspace.courses.extend(courses);
            scheduler(&workspace)?;
            storage.save(&workspace)?;
            0
        }
        Commands::ImportRoster { csv } => {
            let roster = io::import_assignments_csv(csv)?;
            println!("{} assignment(s) imported", roster.len());
            workspace.roster.extend(roster);
            storage.save(&workspace)?;
            0
        }
        Commands::Schedule { term, out_csv } => {
            let result = scheduler(&workspace)?.schedule_semester(term.semester, term.student_type)?;
            if let Some(path) = out_csv {
                io::export_timetable_csv(path, &result.timetable)?;
            }
            println!(
                "Semester {} ({}): {} session(s) placed",
                term.semester,
                term.student_type,
                result.timetable.cells().count()
            );
            let unscheduled = workspace.apply_schedule(result);
            storage.save(&workspace)?;
            print_unscheduled(&unscheduled)
        }
        Commands::Labs { term, out_csv } => {
            let Some(unscheduled) = workspace.reallocate_labs(term.semester, term.student_type)
            else {
                bail!(
                    "no timetable for semester {} ({}); run `schedule` first",
                    term.semester,
                    term.student_type
                );
            };
            if let Some(path) = out_csv {
                io::export_labs_csv(path, &workspace.labs)?;
            }
            let booked = workspace
                .labs
                .for_semester(term.semester, term.student_type)
                .count();
            println!("{booked} lab period(s) booked");
            storage.save(&workspace)?;
            print_unscheduled(&unscheduled)
        }
        Commands::Check {
            term,
            cell,
            course,
            kind,
        } => {
            let sched = scheduler(&workspace)?;
            let timetable = current(&workspace, &term);
            let request = PlacementRequest::new(cell.batch, cell.day, cell.slot, course, kind);
            match sched.validate_placement(&timetable, &request) {
                Ok(()) => {
                    println!("OK: placement is valid");
                    0
                }
                Err(violation) => {
                    eprintln!("Rejected: {violation}");
                    2
                }
            }
        }
        Commands::Place {
            term,
            cell,
            course,
            kind,
            on_collision,
        } => {
            let sched = scheduler(&workspace)?;
            let mut timetable = current(&workspace, &term);
            let request = PlacementRequest::new(cell.batch, cell.day, cell.slot, course, kind);
            let mut prompt = Prompt;
            let mut fixed_allow = FixedPolicy(Decision::Allow);
            let mut fixed_deny = FixedPolicy(Decision::Deny);
            let arbiter: &mut dyn CollisionResolver = match on_collision {
                OnCollision::Ask => &mut prompt,
                OnCollision::Allow => &mut fixed_allow,
                OnCollision::Deny => &mut fixed_deny,
            };
            match sched.place(&mut timetable, &request, arbiter) {
                Ok(placement) => match workspace.commit_placement(timetable, &placement) {
                    Ok(()) => {
                        println!(
                            "Placed {} for batch {} on {} slot {} ({})",
                            placement.session.course_code,
                            placement.batch,
                            placement.day,
                            placement.slot,
                            placement.session.faculty
                        );
                        storage.save(&workspace)?;
                        0
                    }
                    Err(entry) => {
                        eprintln!("Rejected: {}", entry.reason);
                        2
                    }
                },
                Err(err @ (SchedError::Constraint(_) | SchedError::CollisionDenied(_))) => {
                    eprintln!("{err}");
                    2
                }
                Err(err) => return Err(err.into()),
            }
        }
        Commands::Clear { term, cell } => {
            let Workspace {
                timetables, labs, ..
            } = &mut workspace;
            let Some(timetable) = timetables
                .iter_mut()
                .find(|t| t.semester() == term.semester && t.student_type() == term.student_type)
            else {
                bail!("no timetable for semester {} ({})", term.semester, term.student_type);
            };
            match clear_session(timetable, labs, cell.batch, cell.day, cell.slot) {
                Some(session) => println!("Cleared {} ({})", session.course_code, session.faculty),
                None => println!("Cell already empty"),
            }
            storage.save(&workspace)?;
            0
        }
        Commands::Show { term, batch } => {
            let timetable = current(&workspace, &term);
            let batches: Vec<Batch> = match batch {
                Some(b) => vec![b],
                None => timetable.batches().collect(),
            };
            for b in batches {
                println!("{}\n", timetable.render(b));
            }
            0
        }
        Commands::Report { out_csv } => {
            if let Some(path) = out_csv {
                io::export_unscheduled_csv(path, &workspace.unscheduled)?;
            }
            print_unscheduled(&workspace.unscheduled)
        }
    };

    std::process::exit(code);
}

fn scheduler(workspace: &Workspace) -> Result<Scheduler> {
    Ok(Scheduler::new(workspace.courses.clone(), workspace.roster.clone())?
        .with_options(workspace.options))
}

fn current(workspace: &Workspace, term: &Term) -> Timetable {
    workspace
        .timetable(term.semester, term.student_type)
        .cloned()
        .unwrap_or_else(|| Timetable::new(term.semester, term.student_type))
}

/// Code 2 = WARNING/INCOMPLETE
fn print_unscheduled(entries: &[UnscheduledEntry]) -> i32 {
    if entries.is_empty() {
        println!("OK: fully scheduled");
        return 0;
    }
    eprintln!("Found {} unscheduled item(s)", entries.len());
    for e in entries {
        eprintln!("  {e}");
    }
    2
}
