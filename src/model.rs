use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Nombre de jours ouvrés dans la grille hebdomadaire.
pub const DAYS_PER_WEEK: usize = 5;
/// Nombre de créneaux par jour.
pub const SLOTS_PER_DAY: usize = 8;
/// Nombre de créneaux avant la pause déjeuner (entre le créneau 4 et le créneau 5).
pub const MORNING_SLOTS: usize = 4;

/// Normalise un nom saisi : espaces de bord supprimés, espaces internes fusionnés.
pub fn canonical_name(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clé de comparaison insensible à la casse, utilisée à chaque recherche.
pub fn lookup_key(raw: &str) -> String {
    canonical_name(raw).to_lowercase()
}

/// Reconnaît un batch quelle que soit son écriture ("Batch N", "batch-n", " N ").
pub fn canonical_batch(raw: &str) -> Option<Batch> {
    let key = lookup_key(raw);
    let rest = key.strip_prefix("batch").unwrap_or(&key);
    let rest = rest.trim_start_matches(|c: char| c == '-' || c == ':' || c.is_whitespace());
    match rest {
        "n" => Some(Batch::N),
        "p" => Some(Batch::P),
        "q" => Some(Batch::Q),
        "pg" => Some(Batch::Pg),
        _ => None,
    }
}

fn compact_key(raw: &str) -> String {
    lookup_key(raw)
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Cycle d'études.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StudentType {
    #[serde(rename = "UG")]
    Ug,
    #[serde(rename = "PG")]
    Pg,
}

impl StudentType {
    /// Batches ouverts pour ce cycle, dans l'ordre de planification.
    pub fn batches(self) -> &'static [Batch] {
        match self {
            StudentType::Ug => &[Batch::N, Batch::P, Batch::Q],
            StudentType::Pg => &[Batch::Pg],
        }
    }

    pub fn max_semester(self) -> u8 {
        match self {
            StudentType::Ug => 8,
            StudentType::Pg => 4,
        }
    }

    pub fn accepts_semester(self, semester: u8) -> bool {
        (1..=self.max_semester()).contains(&semester)
    }
}

impl fmt::Display for StudentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudentType::Ug => f.write_str("UG"),
            StudentType::Pg => f.write_str("PG"),
        }
    }
}

impl FromStr for StudentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match compact_key(s).as_str() {
            "ug" | "undergraduate" => Ok(StudentType::Ug),
            "pg" | "postgraduate" => Ok(StudentType::Pg),
            _ => Err(format!("unknown student type: {s}")),
        }
    }
}

/// Étage physique hébergeant des salles de TP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Floor {
    Ground,
    First,
    Second,
}

impl fmt::Display for Floor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Floor::Ground => f.write_str("ground floor"),
            Floor::First => f.write_str("first floor"),
            Floor::Second => f.write_str("second floor"),
        }
    }
}

/// Groupe d'étudiants planifié indépendamment.
///
/// La (dé)sérialisation passe par [`canonical_batch`], de sorte que toute
/// donnée chargée est déjà normalisée.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Batch {
    N,
    P,
    Q,
    Pg,
}

impl Batch {
    /// Étage de TP attitré (table statique).
    pub fn lab_floor(self) -> Floor {
        match self {
            Batch::N => Floor::Ground,
            Batch::P => Floor::First,
            Batch::Q | Batch::Pg => Floor::Second,
        }
    }

    pub fn student_type(self) -> StudentType {
        match self {
            Batch::Pg => StudentType::Pg,
            _ => StudentType::Ug,
        }
    }
}

impl fmt::Display for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Batch::N => f.write_str("N"),
            Batch::P => f.write_str("P"),
            Batch::Q => f.write_str("Q"),
            Batch::Pg => f.write_str("PG"),
        }
    }
}

impl FromStr for Batch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        canonical_batch(s).ok_or_else(|| format!("unknown batch: {s}"))
    }
}

impl TryFrom<String> for Batch {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Batch> for String {
    fn from(batch: Batch) -> Self {
        batch.to_string()
    }
}

/// Jour ouvré, dans l'ordre fixe de la semaine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Day {
    pub const ALL: [Day; DAYS_PER_WEEK] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Day::Monday => "Mon",
            Day::Tuesday => "Tue",
            Day::Wednesday => "Wed",
            Day::Thursday => "Thu",
            Day::Friday => "Fri",
        };
        f.write_str(s)
    }
}

impl FromStr for Day {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match lookup_key(s).as_str() {
            "mon" | "monday" | "1" => Ok(Day::Monday),
            "tue" | "tuesday" | "2" => Ok(Day::Tuesday),
            "wed" | "wednesday" | "3" => Ok(Day::Wednesday),
            "thu" | "thursday" | "4" => Ok(Day::Thursday),
            "fri" | "friday" | "5" => Ok(Day::Friday),
            _ => Err(format!("unknown day: {s}")),
        }
    }
}

impl From<Day> for chrono::Weekday {
    fn from(day: Day) -> Self {
        match day {
            Day::Monday => chrono::Weekday::Mon,
            Day::Tuesday => chrono::Weekday::Tue,
            Day::Wednesday => chrono::Weekday::Wed,
            Day::Thursday => chrono::Weekday::Thu,
            Day::Friday => chrono::Weekday::Fri,
        }
    }
}

/// Créneau horaire (index interne 0..8, affiché 1..8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Slot(u8);

const SLOT_TIMES: [((u32, u32), (u32, u32)); SLOTS_PER_DAY] = [
    ((8, 30), (9, 20)),
    ((9, 20), (10, 10)),
    ((10, 25), (11, 15)),
    ((11, 15), (12, 5)),
    ((13, 0), (13, 50)),
    ((13, 50), (14, 40)),
    ((14, 55), (15, 45)),
    ((15, 45), (16, 35)),
];

impl Slot {
    pub const FIRST: Slot = Slot(0);
    pub const ALL: [Slot; SLOTS_PER_DAY] = [
        Slot(0),
        Slot(1),
        Slot(2),
        Slot(3),
        Slot(4),
        Slot(5),
        Slot(6),
        Slot(7),
    ];

    /// Index 0-based.
    pub fn from_index(index: usize) -> Option<Slot> {
        (index < SLOTS_PER_DAY).then_some(Slot(index as u8))
    }

    /// Numéro affiché (1-based).
    pub fn from_number(number: u8) -> Option<Slot> {
        number
            .checked_sub(1)
            .and_then(|i| Slot::from_index(usize::from(i)))
    }

    pub fn index(self) -> usize {
        usize::from(self.0)
    }

    pub fn number(self) -> u8 {
        self.0 + 1
    }

    pub fn is_morning(self) -> bool {
        self.index() < MORNING_SLOTS
    }

    /// Le bloc `[self, self + len)` tient dans la grille sans enjamber le déjeuner.
    pub fn block_fits(self, len: usize) -> bool {
        if len == 0 {
            return false;
        }
        let last = self.index() + len - 1;
        last < SLOTS_PER_DAY && (self.index() < MORNING_SLOTS) == (last < MORNING_SLOTS)
    }

    /// Bornes horaires du créneau.
    pub fn interval(self) -> (NaiveTime, NaiveTime) {
        let ((sh, sm), (eh, em)) = SLOT_TIMES[self.index()];
        (
            NaiveTime::from_hms_opt(sh, sm, 0).unwrap_or(NaiveTime::MIN),
            NaiveTime::from_hms_opt(eh, em, 0).unwrap_or(NaiveTime::MIN),
        )
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

impl TryFrom<u8> for Slot {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Slot::from_number(value).ok_or_else(|| format!("slot must be within 1..={SLOTS_PER_DAY}"))
    }
}

impl From<Slot> for u8 {
    fn from(slot: Slot) -> Self {
        slot.number()
    }
}

impl FromStr for Slot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u8 = s.trim().parse().map_err(|_| format!("invalid slot: {s}"))?;
        Slot::try_from(n)
    }
}

/// Catégorie d'un cours, figée à sa création.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Theory,
    Lab,
    LabIntegratedTheory,
}

impl Category {
    /// Volume hebdomadaire requis en fonction des crédits ; `None` si la
    /// combinaison n'est pas planifiable.
    pub fn hour_plan(self, credits: u8) -> Option<HourPlan> {
        let plan = |theory_hours, lab_hours, lab_block, consecutive_lab| HourPlan {
            theory_hours,
            lab_hours,
            lab_block,
            consecutive_lab,
        };
        match (self, credits) {
            (_, 0) => None,
            (Category::Theory, n) => Some(plan(n, 0, 0, false)),
            (Category::Lab, n) => Some(plan(0, n, n, true)),
            (Category::LabIntegratedTheory, 2) => Some(plan(0, 3, 3, true)),
            (Category::LabIntegratedTheory, 3) => Some(plan(2, 2, 2, false)),
            (Category::LabIntegratedTheory, 4) => Some(plan(3, 2, 2, false)),
            (Category::LabIntegratedTheory, 5 | 6) => Some(plan(3, 4, 4, false)),
            (Category::LabIntegratedTheory, _) => None,
        }
    }

    /// Rôle attendu pour une séance donnée ; `None` si la séance n'existe pas
    /// pour cette catégorie.
    pub fn role_for(self, kind: SessionKind) -> Option<Role> {
        match (self, kind) {
            (Category::Theory | Category::LabIntegratedTheory, SessionKind::Theory) => {
                Some(Role::TheoryTeacher)
            }
            (Category::Lab | Category::LabIntegratedTheory, SessionKind::Lab) => {
                Some(Role::LabIncharge)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Theory => f.write_str("Theory"),
            Category::Lab => f.write_str("Lab"),
            Category::LabIntegratedTheory => f.write_str("Lab Integrated Theory"),
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match compact_key(s).as_str() {
            "theory" => Ok(Category::Theory),
            "lab" | "practical" => Ok(Category::Lab),
            "labintegratedtheory" | "lit" => Ok(Category::LabIntegratedTheory),
            _ => Err(format!("unknown category: {s}")),
        }
    }
}

/// Volume hebdomadaire dérivé de (catégorie, crédits).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourPlan {
    pub theory_hours: u8,
    pub lab_hours: u8,
    pub lab_block: u8,
    /// Les heures de TP forment un seul bloc indivisible.
    pub consecutive_lab: bool,
}

/// Cours du catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub code: String,
    pub name: String,
    pub semester: u8,
    pub student_type: StudentType,
    pub category: Category,
    pub credits: u8,
}

impl Course {
    pub fn new<C: Into<String>, N: Into<String>>(
        code: C,
        name: N,
        semester: u8,
        student_type: StudentType,
        category: Category,
        credits: u8,
    ) -> Self {
        Self {
            code: canonical_name(&code.into()),
            name: canonical_name(&name.into()),
            semester,
            student_type,
            category,
            credits,
        }
    }

    pub fn hour_plan(&self) -> Option<HourPlan> {
        self.category.hour_plan(self.credits)
    }

    pub fn matches_code(&self, code: &str) -> bool {
        lookup_key(&self.code) == lookup_key(code)
    }
}

/// Rôle d'un enseignant sur un couple (cours, batch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    TheoryTeacher,
    LabIncharge,
    LabAssistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::TheoryTeacher => f.write_str("Theory Teacher"),
            Role::LabIncharge => f.write_str("Lab Incharge"),
            Role::LabAssistant => f.write_str("Lab Assistant"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match compact_key(s).as_str() {
            "theoryteacher" | "theory" => Ok(Role::TheoryTeacher),
            "labincharge" | "incharge" => Ok(Role::LabIncharge),
            "labassistant" | "assistant" => Ok(Role::LabAssistant),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// Nature d'une séance placée dans la grille.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionKind {
    Theory,
    Lab,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionKind::Theory => f.write_str("theory"),
            SessionKind::Lab => f.write_str("lab"),
        }
    }
}

impl FromStr for SessionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match lookup_key(s).as_str() {
            "theory" | "t" => Ok(SessionKind::Theory),
            "lab" | "l" => Ok(SessionKind::Lab),
            _ => Err(format!("unknown session kind: {s}")),
        }
    }
}

/// Nom d'enseignant normalisé.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Faculty(String);

impl Faculty {
    pub fn new<S: AsRef<str>>(name: S) -> Self {
        Self(canonical_name(name.as_ref()))
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Faculty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Faculty {
    fn from(name: String) -> Self {
        Faculty::new(name)
    }
}

impl From<Faculty> for String {
    fn from(faculty: Faculty) -> Self {
        faculty.0
    }
}

/// Ligne du tableau d'affectation des enseignants (lecture seule pendant un run).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyAssignment {
    pub faculty: Faculty,
    #[serde(default)]
    pub course_code: Option<String>,
    #[serde(default)]
    pub course_name: Option<String>,
    pub batch: Batch,
    pub semester: u8,
    pub role: Role,
}

impl FacultyAssignment {
    pub fn new<F: AsRef<str>, C: Into<String>>(
        faculty: F,
        course_code: C,
        batch: Batch,
        semester: u8,
        role: Role,
    ) -> Self {
        Self {
            faculty: Faculty::new(faculty),
            course_code: Some(canonical_name(&course_code.into())),
            course_name: None,
            batch,
            semester,
            role,
        }
    }

    /// Compare sur le code s'il est renseigné, sinon sur le nom du cours.
    pub fn matches_course(&self, course: &Course) -> bool {
        match (self.course_code.as_deref(), self.course_name.as_deref()) {
            (Some(code), _) if !code.trim().is_empty() => course.matches_code(code),
            (_, Some(name)) if !name.trim().is_empty() => lookup_key(name) == lookup_key(&course.name),
            _ => false,
        }
    }
}
