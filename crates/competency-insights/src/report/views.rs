use crate::analytics::dispersion::DispersionSummary;
use crate::analytics::distribution::GradeDistribution;
use crate::analytics::funnel::FunnelStep;
use crate::analytics::linker::{LinkedScore, StudentKey};
use crate::analytics::quadrant::QuadrantMatrix;
use crate::analytics::radar::RadarPoint;
use crate::analytics::scope::Scope;
use crate::analytics::scoring::{CompetencyMastery, MasteryLevel, ScoreTally};
use crate::narrative::NarrativeEntry;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct MasteryView {
    pub points: u32,
    pub max_points: u32,
    pub mastery_pct: f64,
    pub level: MasteryLevel,
    pub level_label: &'static str,
}

impl MasteryView {
    pub fn from_tally(tally: ScoreTally) -> Self {
        let mastery_pct = tally.mastery_pct();
        let level = MasteryLevel::from_pct(mastery_pct);
        Self {
            points: tally.points,
            max_points: tally.max_points,
            mastery_pct,
            level,
            level_label: level.label(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AxisGapView {
    pub x_label: String,
    pub x_pct: f64,
    pub y_label: String,
    pub y_pct: f64,
    /// `x_pct - y_pct`; negative when the y axis is stronger.
    pub gap: f64,
}

/// Every indicator of one subject over one scope.
#[derive(Debug, Clone, Serialize)]
pub struct InsightsReport {
    pub subject: String,
    pub level: String,
    pub scope: Scope,
    pub scope_label: String,
    pub students: usize,
    pub classes: usize,
    pub overall: MasteryView,
    pub distribution: GradeDistribution,
    pub dispersion: DispersionSummary,
    pub competencies: Vec<CompetencyMastery>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axis_gap: Option<AxisGapView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quadrant: Option<QuadrantMatrix>,
    pub funnel: Vec<FunnelStep>,
    pub radar: Vec<RadarPoint>,
    pub narratives: Vec<NarrativeEntry>,
    /// Competency ids found in the records but absent from the taxonomy.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unknown_competencies: Vec<String>,
}

/// Pairing of two subjects for the same students.
#[derive(Debug, Clone, Serialize)]
pub struct CrossSubjectReport {
    pub first_subject: String,
    pub second_subject: String,
    pub scope: Scope,
    pub scope_label: String,
    pub linked: usize,
    /// Students of the first subject without a counterpart in the second.
    pub unmatched: usize,
    pub correlation: f64,
    pub first_mean_pct: f64,
    pub second_mean_pct: f64,
    pub quadrant: QuadrantMatrix,
    pub narrative: NarrativeEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pairs: Option<Vec<LinkedScore<StudentKey>>>,
}
