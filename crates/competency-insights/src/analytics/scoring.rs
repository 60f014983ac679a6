use super::domain::{CompetencyId, Student, MAX_POINTS};
use super::resolver::graded;
use super::scope::Population;
use super::taxonomy::{CriterionSet, SchemaError, SubjectTaxonomy};
use serde::Serialize;
use std::ops::Add;

/// Percentage helper used everywhere a ratio is reported. A zero denominator
/// is a degenerate population, reported as 0 rather than an error.
pub fn safe_pct(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator * 100.0
    }
}

/// Weighted points over the graded criteria of a set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScoreTally {
    pub points: u32,
    pub max_points: u32,
}

impl ScoreTally {
    pub fn mastery_pct(&self) -> f64 {
        safe_pct(f64::from(self.points), f64::from(self.max_points))
    }

    /// Number of graded criterion instances behind the tally.
    pub fn graded(&self) -> u32 {
        self.max_points / MAX_POINTS
    }

    pub fn is_empty(&self) -> bool {
        self.max_points == 0
    }
}

impl Add for ScoreTally {
    type Output = ScoreTally;

    fn add(self, rhs: Self) -> Self::Output {
        ScoreTally {
            points: self.points + rhs.points,
            max_points: self.max_points + rhs.max_points,
        }
    }
}

pub fn score_student(student: &Student, criteria: &CriterionSet) -> ScoreTally {
    graded(student, criteria).fold(ScoreTally::default(), |tally, grade| ScoreTally {
        points: tally.points + grade.points(),
        max_points: tally.max_points + MAX_POINTS,
    })
}

/// Same reduction as [`score_student`], summed over every member.
pub fn score(population: &Population<'_>, criteria: &CriterionSet) -> ScoreTally {
    population
        .students()
        .map(|student| score_student(student, criteria))
        .fold(ScoreTally::default(), Add::add)
}

/// Bucket describing how far a mastery percentage has progressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryLevel {
    Beginning,
    Developing,
    Proficient,
    Advanced,
}

impl MasteryLevel {
    pub fn from_pct(pct: f64) -> Self {
        if pct >= 75.0 {
            Self::Advanced
        } else if pct >= 50.0 {
            Self::Proficient
        } else if pct >= 25.0 {
            Self::Developing
        } else {
            Self::Beginning
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Beginning => "Beginning",
            Self::Developing => "Developing",
            Self::Proficient => "Proficient",
            Self::Advanced => "Advanced",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompetencyMastery {
    pub competency: CompetencyId,
    pub label: String,
    pub tally: ScoreTally,
    pub mastery_pct: f64,
    pub level: MasteryLevel,
}

/// Mastery of every competency of the taxonomy, in declaration order.
pub fn competency_breakdown(
    population: &Population<'_>,
    taxonomy: &SubjectTaxonomy,
) -> Result<Vec<CompetencyMastery>, SchemaError> {
    taxonomy
        .competencies
        .iter()
        .map(|definition| {
            let criteria = taxonomy.competency_criteria(&definition.id)?;
            let tally = score(population, &criteria);
            let mastery_pct = tally.mastery_pct();
            Ok(CompetencyMastery {
                competency: definition.id.clone(),
                label: definition.label.clone(),
                tally,
                mastery_pct,
                level: MasteryLevel::from_pct(mastery_pct),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::domain::{ClassRecord, Grade};
    use crate::analytics::fixtures::{arithmetic_taxonomy, class_with_grades, single_criterion};
    use crate::analytics::scope::Scope;

    #[test]
    fn scores_three_student_scenario() {
        let records = vec![class_with_grades(&[Grade::A, Grade::B, Grade::D])];
        let population = Population::select(&records, &Scope::District, None);
        let tally = score(&population, &single_criterion());

        assert_eq!(tally.points, 5);
        assert_eq!(tally.max_points, 9);
        assert!((tally.mastery_pct() - 55.555).abs() < 0.01);
    }

    #[test]
    fn all_a_is_full_mastery_and_all_d_is_zero() {
        let criteria = single_criterion();

        let records = vec![class_with_grades(&[Grade::A, Grade::A])];
        let population = Population::select(&records, &Scope::District, None);
        assert_eq!(score(&population, &criteria).mastery_pct(), 100.0);

        let records = vec![class_with_grades(&[Grade::D, Grade::D, Grade::D])];
        let population = Population::select(&records, &Scope::District, None);
        assert_eq!(score(&population, &criteria).mastery_pct(), 0.0);
    }

    #[test]
    fn ungraded_criteria_are_excluded_from_denominator() {
        let taxonomy = arithmetic_taxonomy();
        let student = Student::new("Mona").with_grade("computation", 1u32, Grade::B);

        let tally = score_student(&student, &taxonomy.all_criteria());
        assert_eq!(tally, ScoreTally { points: 2, max_points: 3 });
        assert_eq!(tally.graded(), 1);
    }

    #[test]
    fn empty_population_scores_zero() {
        let records: Vec<ClassRecord> = Vec::new();
        let population = Population::select(&records, &Scope::District, None);
        let tally = score(&population, &single_criterion());

        assert!(tally.is_empty());
        assert_eq!(tally.mastery_pct(), 0.0);
    }

    #[test]
    fn scoring_is_idempotent() {
        let records = vec![class_with_grades(&[Grade::C, Grade::B])];
        let population = Population::select(&records, &Scope::District, None);
        let criteria = single_criterion();
        assert_eq!(score(&population, &criteria), score(&population, &criteria));
    }

    #[test]
    fn mastery_levels_follow_quarter_bands() {
        assert_eq!(MasteryLevel::from_pct(100.0), MasteryLevel::Advanced);
        assert_eq!(MasteryLevel::from_pct(75.0), MasteryLevel::Advanced);
        assert_eq!(MasteryLevel::from_pct(55.6), MasteryLevel::Proficient);
        assert_eq!(MasteryLevel::from_pct(25.0), MasteryLevel::Developing);
        assert_eq!(MasteryLevel::from_pct(0.0), MasteryLevel::Beginning);
    }

    #[test]
    fn breakdown_follows_taxonomy_order() {
        let taxonomy = arithmetic_taxonomy();
        let mut record = class_with_grades(&[]);
        record.students.push(
            Student::new("Sami")
                .with_grade("computation", 1u32, Grade::A)
                .with_grade("computation", 2u32, Grade::C)
                .with_grade("reasoning", 1u32, Grade::D),
        );
        let records = vec![record];
        let population = Population::select(&records, &Scope::District, None);

        let breakdown = competency_breakdown(&population, &taxonomy).expect("taxonomy is valid");
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].competency.as_str(), "computation");
        assert!((breakdown[0].mastery_pct - 66.666).abs() < 0.01);
        assert_eq!(breakdown[1].mastery_pct, 0.0);
        assert_eq!(breakdown[1].level, MasteryLevel::Beginning);
    }
}
