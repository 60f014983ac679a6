use super::views::{AxisGapView, InsightsReport, MasteryView};
use crate::analytics::dispersion::{student_mastery, DispersionSummary};
use crate::analytics::distribution::distribute;
use crate::analytics::domain::ClassRecord;
use crate::analytics::funnel::funnel;
use crate::analytics::profile::SubjectProfile;
use crate::analytics::quadrant::quadrant_matrix;
use crate::analytics::radar::radar_profile;
use crate::analytics::scope::{Population, Scope};
use crate::analytics::scoring::{competency_breakdown, score};
use crate::analytics::taxonomy::{SchemaError, SubjectTaxonomy};
use crate::narrative::{IndicatorBundle, NarrativeService};
use std::collections::BTreeSet;
use tracing::{debug, warn};

impl InsightsReport {
    /// Computes every indicator the profile declares for the students of
    /// `profile`'s subject and year level inside `scope`.
    pub fn build(
        records: &[ClassRecord],
        profile: &SubjectProfile,
        scope: &Scope,
        narratives: &NarrativeService,
    ) -> Result<Self, SchemaError> {
        let subject = profile.subject();
        let population =
            Population::select_at_level(records, scope, Some(subject), Some(profile.level()));
        let unknown_competencies = unknown_competencies(&population, profile.taxonomy());
        for competency in &unknown_competencies {
            warn!(%subject, %competency, "records reference a competency outside the taxonomy; ignored");
        }

        let criteria = profile.all_criteria();
        let overall = MasteryView::from_tally(score(&population, criteria));
        let distribution = distribute(&population, criteria);
        let dispersion = DispersionSummary::from_values(&student_mastery(&population, criteria));
        let competencies = competency_breakdown(&population, profile.taxonomy())?;

        let (axis_gap, quadrant) = match profile.axes() {
            Some(axes) => {
                let x_pct = score(&population, &axes.x.criteria).mastery_pct();
                let y_pct = score(&population, &axes.y.criteria).mastery_pct();
                let gap = AxisGapView {
                    x_label: axes.x.label.clone(),
                    x_pct,
                    y_label: axes.y.label.clone(),
                    y_pct,
                    gap: x_pct - y_pct,
                };
                (Some(gap), Some(quadrant_matrix(&population, &axes.x, &axes.y)))
            }
            None => (None, None),
        };

        let funnel_steps = funnel(&population, profile.funnel());
        let radar = radar_profile(&population, profile.radar());

        let mut bundles = vec![IndicatorBundle::Mastery {
            mastery_pct: overall.mastery_pct,
            homogeneity: dispersion.std_dev,
        }];
        if let Some(gap) = &axis_gap {
            bundles.push(IndicatorBundle::AxisGap {
                x_label: gap.x_label.clone(),
                x_pct: gap.x_pct,
                y_label: gap.y_label.clone(),
                y_pct: gap.y_pct,
            });
        }
        if let Some(matrix) = &quadrant {
            bundles.push(IndicatorBundle::quadrant(matrix));
        }
        if !funnel_steps.is_empty() {
            bundles.push(IndicatorBundle::funnel(&funnel_steps));
        }
        if !radar.is_empty() {
            bundles.push(IndicatorBundle::radar(&radar));
        }

        let entries = bundles
            .into_iter()
            .map(|bundle| narratives.describe(subject, scope, bundle))
            .collect();

        debug!(
            %subject,
            %scope,
            students = population.len(),
            classes = population.class_count(),
            mastery_pct = overall.mastery_pct,
            "insights report assembled"
        );

        Ok(Self {
            subject: subject.to_string(),
            level: profile.level().to_string(),
            scope: scope.clone(),
            scope_label: scope.to_string(),
            students: population.len(),
            classes: population.class_count(),
            overall,
            distribution,
            dispersion,
            competencies,
            axis_gap,
            quadrant,
            funnel: funnel_steps,
            radar,
            narratives: entries,
            unknown_competencies,
        })
    }
}

fn unknown_competencies(population: &Population<'_>, taxonomy: &SubjectTaxonomy) -> Vec<String> {
    population
        .students()
        .flat_map(|student| student.results.competencies())
        .filter(|competency| !taxonomy.contains(competency))
        .map(ToString::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
