use super::scope::Population;
use super::scoring::score;
use super::taxonomy::CriterionSet;
use serde::Serialize;

/// Named criterion grouping plotted as one radar spoke. Domains of a profile
/// are expected to be disjoint; overlap is not checked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarDomain {
    pub label: String,
    pub criteria: CriterionSet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarPoint {
    pub label: String,
    pub percentage: f64,
}

pub fn radar_profile(population: &Population<'_>, domains: &[RadarDomain]) -> Vec<RadarPoint> {
    domains
        .iter()
        .map(|domain| RadarPoint {
            label: domain.label.clone(),
            percentage: score(population, &domain.criteria).mastery_pct(),
        })
        .collect()
}

/// Strongest and weakest spokes, first occurrence winning ties.
pub fn extremes(points: &[RadarPoint]) -> Option<(&RadarPoint, &RadarPoint)> {
    let first = points.first()?;
    let mut strongest = first;
    let mut weakest = first;
    for point in &points[1..] {
        if point.percentage > strongest.percentage {
            strongest = point;
        }
        if point.percentage < weakest.percentage {
            weakest = point;
        }
    }
    Some((strongest, weakest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::domain::{Grade, Student};
    use crate::analytics::fixtures::{arithmetic_taxonomy, class_record};
    use crate::analytics::scope::Scope;
    use crate::analytics::taxonomy::CriterionSelector;

    #[test]
    fn profile_preserves_domain_order() {
        let taxonomy = arithmetic_taxonomy();
        let domains = vec![
            RadarDomain {
                label: "Reasoning".to_string(),
                criteria: taxonomy
                    .select(&[CriterionSelector::competency("reasoning")])
                    .expect("valid"),
            },
            RadarDomain {
                label: "Computation".to_string(),
                criteria: taxonomy
                    .select(&[CriterionSelector::competency("computation")])
                    .expect("valid"),
            },
        ];

        let mut record = class_record("S1", "4A", "math");
        record.students = vec![
            Student::new("Ali")
                .with_grade("computation", 1u32, Grade::A)
                .with_grade("computation", 2u32, Grade::A)
                .with_grade("reasoning", 1u32, Grade::C),
            Student::new("Mona").with_grade("reasoning", 1u32, Grade::B),
        ];
        let records = vec![record];
        let population = Population::select(&records, &Scope::District, None);

        let profile = radar_profile(&population, &domains);
        assert_eq!(profile.len(), 2);
        assert_eq!(profile[0].label, "Reasoning");
        assert_eq!(profile[0].percentage, 50.0);
        assert_eq!(profile[1].percentage, 100.0);

        let (strongest, weakest) = extremes(&profile).expect("non-empty profile");
        assert_eq!(strongest.label, "Computation");
        assert_eq!(weakest.label, "Reasoning");
        assert!(extremes(&[]).is_none());
    }
}
