use super::domain::Grade;
use super::resolver::graded;
use super::scope::Population;
use super::scoring::safe_pct;
use super::taxonomy::CriterionSet;
use serde::Serialize;

/// Raw letter frequencies over every graded criterion instance.
///
/// `total` is the true sum of the four buckets and may be zero; shares go
/// through [`safe_pct`] instead of padding the denominator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GradeDistribution {
    #[serde(rename = "A")]
    pub a: usize,
    #[serde(rename = "B")]
    pub b: usize,
    #[serde(rename = "C")]
    pub c: usize,
    #[serde(rename = "D")]
    pub d: usize,
    pub total: usize,
}

impl GradeDistribution {
    pub fn record(&mut self, grade: Grade) {
        match grade {
            Grade::A => self.a += 1,
            Grade::B => self.b += 1,
            Grade::C => self.c += 1,
            Grade::D => self.d += 1,
        }
        self.total += 1;
    }

    pub fn count(&self, grade: Grade) -> usize {
        match grade {
            Grade::A => self.a,
            Grade::B => self.b,
            Grade::C => self.c,
            Grade::D => self.d,
        }
    }

    pub fn share(&self, grade: Grade) -> f64 {
        safe_pct(self.count(grade) as f64, self.total as f64)
    }

    /// Share of A and B grades.
    pub fn passing_share(&self) -> f64 {
        safe_pct((self.a + self.b) as f64, self.total as f64)
    }
}

pub fn distribute(population: &Population<'_>, criteria: &CriterionSet) -> GradeDistribution {
    let mut distribution = GradeDistribution::default();
    for student in population.students() {
        for grade in graded(student, criteria) {
            distribution.record(grade);
        }
    }
    distribution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::domain::ClassRecord;
    use crate::analytics::fixtures::{class_with_grades, single_criterion};
    use crate::analytics::scope::Scope;

    #[test]
    fn counts_three_student_scenario() {
        let records = vec![class_with_grades(&[Grade::A, Grade::B, Grade::D])];
        let population = Population::select(&records, &Scope::District, None);
        let distribution = distribute(&population, &single_criterion());

        assert_eq!(
            distribution,
            GradeDistribution {
                a: 1,
                b: 1,
                c: 0,
                d: 1,
                total: 3
            }
        );
        assert_eq!(
            Grade::ordered()
                .into_iter()
                .map(|grade| distribution.count(grade))
                .sum::<usize>(),
            distribution.total
        );
        assert!((distribution.passing_share() - 66.666).abs() < 0.01);
    }

    #[test]
    fn empty_distribution_has_zero_shares() {
        let records: Vec<ClassRecord> = Vec::new();
        let population = Population::select(&records, &Scope::District, None);
        let distribution = distribute(&population, &single_criterion());

        assert_eq!(distribution.total, 0);
        assert_eq!(distribution.share(Grade::A), 0.0);
    }

    #[test]
    fn serialises_with_letter_keys() {
        let mut distribution = GradeDistribution::default();
        distribution.record(Grade::C);
        let json = serde_json::to_value(distribution).expect("serialises");
        assert_eq!(
            json,
            serde_json::json!({ "A": 0, "B": 0, "C": 1, "D": 0, "total": 1 })
        );
    }
}
