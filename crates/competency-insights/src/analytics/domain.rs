use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Highest point value a single graded criterion can contribute.
pub const MAX_POINTS: u32 = 3;

/// Letter grade assigned to a criterion, in descending order of mastery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
}

impl Grade {
    pub const fn ordered() -> [Self; 4] {
        [Self::A, Self::B, Self::C, Self::D]
    }

    /// Parses a stored cell. Anything other than the four letters is ungraded.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "D" => Some(Self::D),
            _ => None,
        }
    }

    pub const fn points(self) -> u32 {
        match self {
            Self::A => 3,
            Self::B => 2,
            Self::C => 1,
            Self::D => 0,
        }
    }

    /// A and B count as clearing a skill gate.
    pub const fn is_passing(self) -> bool {
        matches!(self, Self::A | Self::B)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identifier of a competency inside a subject taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct CompetencyId(String);

impl CompetencyId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CompetencyId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for CompetencyId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for CompetencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a criterion within a competency.
///
/// Imports store criterion keys either as integers or as their string form,
/// sometimes padded. Keys are normalised on construction so `1`, `"1"`,
/// `" 1 "` and `"01"` all address the same criterion.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "RawCriterionId")]
pub struct CriterionId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCriterionId {
    Number(u64),
    Text(String),
}

impl From<RawCriterionId> for CriterionId {
    fn from(raw: RawCriterionId) -> Self {
        match raw {
            RawCriterionId::Number(number) => Self(number.to_string()),
            RawCriterionId::Text(text) => Self::new(text),
        }
    }
}

impl CriterionId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let trimmed = raw.as_ref().trim();
        match trimmed.parse::<u64>() {
            Ok(number) => Self(number.to_string()),
            Err(_) => Self(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CriterionId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for CriterionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<u32> for CriterionId {
    fn from(value: u32) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for CriterionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sparse competency → criterion → grade mapping for one student.
///
/// Only valid letters are retained; empty strings, nulls, numbers and unknown
/// letters are ungraded and simply absent from the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawResults")]
pub struct Results(BTreeMap<CompetencyId, BTreeMap<CriterionId, Grade>>);

type RawResults = BTreeMap<String, BTreeMap<String, RawCell>>;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCell {
    Text(String),
    Other(IgnoredAny),
}

impl From<RawResults> for Results {
    fn from(raw: RawResults) -> Self {
        let mut results = Results::default();
        for (competency, criteria) in raw {
            for (criterion, cell) in criteria {
                if let RawCell::Text(text) = cell {
                    results.record(competency.as_str(), criterion.as_str(), &text);
                }
            }
        }
        results
    }
}

impl Results {
    /// Stores a raw cell, ignoring anything that is not a grade.
    pub fn record(
        &mut self,
        competency: impl Into<CompetencyId>,
        criterion: impl Into<CriterionId>,
        raw: &str,
    ) {
        if let Some(grade) = Grade::parse(raw) {
            self.insert(competency, criterion, grade);
        }
    }

    pub fn insert(
        &mut self,
        competency: impl Into<CompetencyId>,
        criterion: impl Into<CriterionId>,
        grade: Grade,
    ) {
        self.0
            .entry(competency.into())
            .or_default()
            .insert(criterion.into(), grade);
    }

    pub fn get(&self, competency: &CompetencyId, criterion: &CriterionId) -> Option<Grade> {
        self.0
            .get(competency)
            .and_then(|criteria| criteria.get(criterion))
            .copied()
    }

    pub fn competencies(&self) -> impl Iterator<Item = &CompetencyId> {
        self.0.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(BTreeMap::is_empty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub full_name: String,
    #[serde(default)]
    pub results: Results,
}

impl Student {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            results: Results::default(),
        }
    }

    pub fn with_grade(
        mut self,
        competency: impl Into<CompetencyId>,
        criterion: impl Into<CriterionId>,
        grade: Grade,
    ) -> Self {
        self.results.insert(competency, criterion, grade);
        self
    }
}

/// One class sitting for one subject, as handed over by the import pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub school: String,
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(default)]
    pub level: String,
    pub subject: String,
    #[serde(default)]
    pub students: Vec<Student>,
}

impl ClassRecord {
    /// Whether the record was graded at `level`; a blank level matches any.
    pub fn is_level(&self, level: &str) -> bool {
        let own = self.level.trim();
        own.is_empty() || own == level.trim()
    }
}
