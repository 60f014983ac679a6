use super::domain::{ClassRecord, Student};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Aggregation level requested by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "level", rename_all = "snake_case")]
pub enum Scope {
    #[default]
    District,
    School {
        school: String,
    },
    Class {
        school: String,
        #[serde(rename = "class")]
        class_name: String,
    },
}

impl Scope {
    /// Builds the narrowest scope the optional filters allow.
    pub fn from_filters(school: Option<String>, class_name: Option<String>) -> Self {
        match (school, class_name) {
            (Some(school), Some(class_name)) => Self::Class { school, class_name },
            (Some(school), None) => Self::School { school },
            _ => Self::District,
        }
    }

    pub fn matches(&self, record: &ClassRecord) -> bool {
        match self {
            Self::District => true,
            Self::School { school } => record.school.trim() == school.trim(),
            Self::Class { school, class_name } => {
                record.school.trim() == school.trim()
                    && record.class_name.trim() == class_name.trim()
            }
        }
    }

    pub const fn level_label(&self) -> &'static str {
        match self {
            Self::District => "District",
            Self::School { .. } => "School",
            Self::Class { .. } => "Class",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::District => f.write_str("district"),
            Self::School { school } => write!(f, "school {school}"),
            Self::Class { school, class_name } => write!(f, "class {class_name} ({school})"),
        }
    }
}

/// A student together with the class record it was graded in.
#[derive(Debug, Clone, Copy)]
pub struct Enrolled<'a> {
    pub record: &'a ClassRecord,
    pub student: &'a Student,
}

/// Borrowed view over the students selected by a scope and subject.
#[derive(Debug, Clone, Default)]
pub struct Population<'a> {
    members: Vec<Enrolled<'a>>,
    classes: usize,
}

impl<'a> Population<'a> {
    /// Selects students from records matching `scope` and, when given, `subject`.
    pub fn select(records: &'a [ClassRecord], scope: &Scope, subject: Option<&str>) -> Self {
        Self::select_at_level(records, scope, subject, None)
    }

    /// Like [`Population::select`], also keeping only records of the given
    /// year level. A record with a blank level belongs to every level.
    pub fn select_at_level(
        records: &'a [ClassRecord],
        scope: &Scope,
        subject: Option<&str>,
        level: Option<&str>,
    ) -> Self {
        let mut members = Vec::new();
        let mut classes = 0;

        for record in records
            .iter()
            .filter(|record| scope.matches(record))
            .filter(|record| subject.map_or(true, |wanted| record.subject.trim() == wanted.trim()))
            .filter(|record| level.map_or(true, |wanted| record.is_level(wanted)))
        {
            classes += 1;
            members.extend(record.students.iter().map(|student| Enrolled { record, student }));
        }

        Self { members, classes }
    }

    /// Population made of a single student, for per-student profiles.
    pub fn single(record: &'a ClassRecord, student: &'a Student) -> Self {
        Self {
            members: vec![Enrolled { record, student }],
            classes: 1,
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Enrolled<'a>> {
        self.members.iter()
    }

    pub fn students(&self) -> impl Iterator<Item = &'a Student> + '_ {
        self.members.iter().map(|member| member.student)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn class_count(&self) -> usize {
        self.classes
    }
}

impl<'p, 'a> IntoIterator for &'p Population<'a> {
    type Item = &'p Enrolled<'a>;
    type IntoIter = std::slice::Iter<'p, Enrolled<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}
