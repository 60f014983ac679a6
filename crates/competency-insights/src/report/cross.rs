use super::views::CrossSubjectReport;
use crate::analytics::dispersion::mean;
use crate::analytics::domain::ClassRecord;
use crate::analytics::linker::{correlation, link};
use crate::analytics::profile::SubjectProfile;
use crate::analytics::quadrant::QuadrantMatrix;
use crate::analytics::scope::{Population, Scope};
use crate::narrative::{IndicatorBundle, NarrativeService};
use tracing::debug;

impl CrossSubjectReport {
    /// Links students of `first` to the same students in `second` and
    /// compares their mastery across the two subjects.
    pub fn build(
        records: &[ClassRecord],
        scope: &Scope,
        first: &SubjectProfile,
        second: &SubjectProfile,
        narratives: &NarrativeService,
        include_pairs: bool,
    ) -> Self {
        let first_population =
            Population::select_at_level(records, scope, Some(first.subject()), Some(first.level()));
        let second_population = Population::select_at_level(
            records,
            scope,
            Some(second.subject()),
            Some(second.level()),
        );

        let pairs = link(
            &first_population,
            first.all_criteria(),
            &second_population,
            second.all_criteria(),
        );
        let linked = pairs.len();
        let unmatched = first_population.len() - linked;
        let coefficient = correlation(&pairs);

        let xs: Vec<f64> = pairs.iter().map(|pair| pair.x_pct).collect();
        let ys: Vec<f64> = pairs.iter().map(|pair| pair.y_pct).collect();
        let first_mean_pct = mean(&xs);
        let second_mean_pct = mean(&ys);

        let quadrant = QuadrantMatrix::from_points(
            first.subject(),
            second.subject(),
            pairs.iter().map(|pair| pair.to_point()).collect(),
        );

        let narrative = narratives.describe_pair(
            first.subject(),
            second.subject(),
            scope,
            IndicatorBundle::CrossSubject {
                first_label: first.subject().to_string(),
                second_label: second.subject().to_string(),
                linked,
                correlation: coefficient,
                first_mean_pct,
                second_mean_pct,
            },
        );

        debug!(
            first = first.subject(),
            second = second.subject(),
            %scope,
            linked,
            unmatched,
            "cross-subject report assembled"
        );

        Self {
            first_subject: first.subject().to_string(),
            second_subject: second.subject().to_string(),
            scope: scope.clone(),
            scope_label: scope.to_string(),
            linked,
            unmatched,
            correlation: coefficient,
            first_mean_pct,
            second_mean_pct,
            quadrant,
            narrative,
            pairs: include_pairs.then_some(pairs),
        }
    }
}
