//! Shared builders for unit tests.

use super::domain::{ClassRecord, CompetencyId, CriterionId, Grade, Student};
use super::taxonomy::{
    CompetencyDefinition, CriterionDefinition, CriterionSet, SubjectTaxonomy,
};

pub(crate) fn reading_taxonomy() -> SubjectTaxonomy {
    SubjectTaxonomy {
        subject: "arabic".to_string(),
        level: "3".to_string(),
        competencies: vec![CompetencyDefinition {
            id: CompetencyId::new("reading"),
            label: "Reading".to_string(),
            criteria: vec![CriterionDefinition {
                id: CriterionId::from(1u32),
                label: "Decoding".to_string(),
            }],
        }],
    }
}

pub(crate) fn arithmetic_taxonomy() -> SubjectTaxonomy {
    SubjectTaxonomy {
        subject: "math".to_string(),
        level: "4".to_string(),
        competencies: vec![
            CompetencyDefinition {
                id: CompetencyId::new("computation"),
                label: "Computation".to_string(),
                criteria: vec![
                    CriterionDefinition {
                        id: CriterionId::from(1u32),
                        label: "Addition".to_string(),
                    },
                    CriterionDefinition {
                        id: CriterionId::from(2u32),
                        label: "Multiplication".to_string(),
                    },
                ],
            },
            CompetencyDefinition {
                id: CompetencyId::new("reasoning"),
                label: "Reasoning".to_string(),
                criteria: vec![CriterionDefinition {
                    id: CriterionId::from(1u32),
                    label: "Word problems".to_string(),
                }],
            },
        ],
    }
}

/// The single `reading:1` criterion.
pub(crate) fn single_criterion() -> CriterionSet {
    reading_taxonomy().all_criteria()
}

pub(crate) fn class_record(school: &str, class_name: &str, subject: &str) -> ClassRecord {
    ClassRecord {
        school: school.to_string(),
        class_name: class_name.to_string(),
        level: "3".to_string(),
        subject: subject.to_string(),
        students: Vec::new(),
    }
}

/// One class where student `n` holds the `n`-th grade on `reading:1`.
pub(crate) fn class_with_grades(grades: &[Grade]) -> ClassRecord {
    let mut record = class_record("S1", "C1", "arabic");
    record.students = grades
        .iter()
        .enumerate()
        .map(|(index, grade)| {
            Student::new(format!("Student {}", index + 1)).with_grade("reading", 1u32, *grade)
        })
        .collect();
    record
}
