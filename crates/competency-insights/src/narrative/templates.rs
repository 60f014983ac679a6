use crate::analytics::dispersion::HomogeneityBand;
use crate::analytics::funnel::FunnelStep;
use crate::analytics::quadrant::{Quadrant, QuadrantMatrix};
use crate::analytics::radar::{extremes, RadarPoint};
use crate::analytics::scoring::MasteryLevel;
use serde::{Deserialize, Serialize};

/// Gap between two axes above which the imbalance is called wide.
pub const WIDE_GAP: f64 = 15.0;
/// Gap between two axes above which the imbalance is called moderate.
pub const MODERATE_GAP: f64 = 8.0;

/// Dashboard context a narrative is written for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeContext {
    Mastery,
    AxisGap,
    Quadrant,
    Funnel,
    Radar,
    CrossSubject,
}

impl NarrativeContext {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Mastery => "Mastery",
            Self::AxisGap => "Axis gap",
            Self::Quadrant => "Quadrant matrix",
            Self::Funnel => "Skill funnel",
            Self::Radar => "Radar profile",
            Self::CrossSubject => "Cross-subject",
        }
    }
}

/// Three-part diagnostic text shown next to an indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub reading: String,
    pub diagnosis: String,
    pub recommendation: String,
}

impl Narrative {
    fn new(
        reading: impl Into<String>,
        diagnosis: impl Into<String>,
        recommendation: impl Into<String>,
    ) -> Self {
        Self {
            reading: reading.into(),
            diagnosis: diagnosis.into(),
            recommendation: recommendation.into(),
        }
    }
}

/// Numbers a narrative is generated from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorBundle {
    Mastery {
        mastery_pct: f64,
        homogeneity: f64,
    },
    AxisGap {
        x_label: String,
        x_pct: f64,
        y_label: String,
        y_pct: f64,
    },
    Quadrant {
        x_label: String,
        y_label: String,
        total: usize,
        high_high_pct: f64,
        high_low_pct: f64,
        low_high_pct: f64,
        low_low_pct: f64,
    },
    Funnel {
        steps: Vec<FunnelStep>,
    },
    Radar {
        points: Vec<RadarPoint>,
    },
    CrossSubject {
        first_label: String,
        second_label: String,
        linked: usize,
        correlation: f64,
        first_mean_pct: f64,
        second_mean_pct: f64,
    },
}

impl IndicatorBundle {
    pub fn quadrant(matrix: &QuadrantMatrix) -> Self {
        Self::Quadrant {
            x_label: matrix.x_label.clone(),
            y_label: matrix.y_label.clone(),
            total: matrix.total,
            high_high_pct: matrix.share(Quadrant::HighHigh),
            high_low_pct: matrix.share(Quadrant::HighLow),
            low_high_pct: matrix.share(Quadrant::LowHigh),
            low_low_pct: matrix.share(Quadrant::LowLow),
        }
    }

    pub fn funnel(steps: &[FunnelStep]) -> Self {
        Self::Funnel {
            steps: steps.to_vec(),
        }
    }

    pub fn radar(points: &[RadarPoint]) -> Self {
        Self::Radar {
            points: points.to_vec(),
        }
    }

    pub const fn context(&self) -> NarrativeContext {
        match self {
            Self::Mastery { .. } => NarrativeContext::Mastery,
            Self::AxisGap { .. } => NarrativeContext::AxisGap,
            Self::Quadrant { .. } => NarrativeContext::Quadrant,
            Self::Funnel { .. } => NarrativeContext::Funnel,
            Self::Radar { .. } => NarrativeContext::Radar,
            Self::CrossSubject { .. } => NarrativeContext::CrossSubject,
        }
    }
}

/// Produces the narrative for `bundle`. A manual override, when present,
/// replaces the generated text as a whole.
pub fn narrate(bundle: &IndicatorBundle, manual: Option<&Narrative>) -> Narrative {
    if let Some(manual) = manual {
        return manual.clone();
    }

    match bundle {
        IndicatorBundle::Mastery {
            mastery_pct,
            homogeneity,
        } => mastery(*mastery_pct, *homogeneity),
        IndicatorBundle::AxisGap {
            x_label,
            x_pct,
            y_label,
            y_pct,
        } => axis_gap(x_label, *x_pct, y_label, *y_pct),
        IndicatorBundle::Quadrant {
            x_label,
            y_label,
            total,
            high_high_pct,
            high_low_pct,
            low_high_pct,
            low_low_pct,
        } => quadrant(
            x_label,
            y_label,
            *total,
            [*high_high_pct, *high_low_pct, *low_high_pct, *low_low_pct],
        ),
        IndicatorBundle::Funnel { steps } => funnel(steps),
        IndicatorBundle::Radar { points } => radar(points),
        IndicatorBundle::CrossSubject {
            first_label,
            second_label,
            linked,
            correlation,
            first_mean_pct,
            second_mean_pct,
        } => cross_subject(
            first_label,
            second_label,
            *linked,
            *correlation,
            *first_mean_pct,
            *second_mean_pct,
        ),
    }
}

fn num(value: f64) -> String {
    format!("{value:.1}")
}

fn no_data(reading: String) -> Narrative {
    Narrative::new(
        reading,
        "No assessment data is available for this view.",
        "Collect assessments before drawing conclusions.",
    )
}

fn mastery(mastery_pct: f64, homogeneity: f64) -> Narrative {
    let level = MasteryLevel::from_pct(mastery_pct);
    let band = HomogeneityBand::from_std_dev(homogeneity);

    let reading = format!(
        "Overall mastery stands at {}% ({}), with a spread of {} points between students ({}).",
        num(mastery_pct),
        level.label().to_lowercase(),
        num(homogeneity),
        band.label().to_lowercase(),
    );

    let level_diagnosis = match level {
        MasteryLevel::Advanced => "Most assessed criteria are secured.",
        MasteryLevel::Proficient => "Core expectations are met but several criteria remain fragile.",
        MasteryLevel::Developing => "Mastery is partial and many criteria are still emerging.",
        MasteryLevel::Beginning => "Most criteria are not yet acquired.",
    };
    let band_diagnosis = match band {
        HomogeneityBand::Homogeneous => "The group progresses at a similar pace.",
        HomogeneityBand::Normal => "Levels vary within a usual range.",
        HomogeneityBand::Fragmented => "Levels diverge sharply between students.",
    };

    let recommendation = match (level, band) {
        (_, HomogeneityBand::Fragmented) => {
            "Organise differentiated groups and target remediation at the students furthest behind."
        }
        (MasteryLevel::Advanced | MasteryLevel::Proficient, _) => {
            "Consolidate through enrichment tasks and keep monitoring fragile criteria."
        }
        (MasteryLevel::Developing, _) => {
            "Plan structured practice on emerging criteria before introducing new content."
        }
        (MasteryLevel::Beginning, _) => {
            "Return to foundational skills with guided whole-class remediation."
        }
    };

    Narrative::new(
        reading,
        format!("{level_diagnosis} {band_diagnosis}"),
        recommendation,
    )
}

fn axis_gap(x_label: &str, x_pct: f64, y_label: &str, y_pct: f64) -> Narrative {
    let gap = (x_pct - y_pct).abs();
    let (stronger, weaker) = if x_pct >= y_pct {
        (x_label, y_label)
    } else {
        (y_label, x_label)
    };

    let reading = format!(
        "{x_label} reaches {}% against {}% for {y_label}, a gap of {} points.",
        num(x_pct),
        num(y_pct),
        num(gap),
    );

    if gap > WIDE_GAP {
        Narrative::new(
            reading,
            format!("A wide imbalance: {stronger} clearly outpaces {weaker}."),
            format!("Rebalance teaching time toward {weaker}."),
        )
    } else if gap > MODERATE_GAP {
        Narrative::new(
            reading,
            format!("A moderate imbalance in favour of {stronger}."),
            format!("Reinforce {weaker} through regular targeted activities."),
        )
    } else {
        Narrative::new(
            reading,
            "Both dimensions progress evenly.",
            "Keep the current balance and connect both dimensions in integrated tasks.",
        )
    }
}

fn quadrant(x_label: &str, y_label: &str, total: usize, shares: [f64; 4]) -> Narrative {
    if total == 0 {
        return no_data(format!(
            "No students were placed on {x_label} and {y_label}."
        ));
    }

    let [high_high, high_low, low_high, low_low] = shares;
    let reading = format!(
        "Of {total} students, {}% are high on both {x_label} and {y_label}; {}% are high on {x_label} only; {}% are high on {y_label} only; {}% are low on both.",
        num(high_high),
        num(high_low),
        num(low_high),
        num(low_low),
    );

    let mut dominant = Quadrant::HighHigh;
    let mut dominant_share = high_high;
    for (quadrant, share) in Quadrant::ordered().into_iter().zip(shares).skip(1) {
        if share > dominant_share {
            dominant = quadrant;
            dominant_share = share;
        }
    }

    let (diagnosis, recommendation) = match dominant {
        Quadrant::HighHigh => (
            "Most students master both dimensions.".to_string(),
            "Extend learning with complex tasks that combine both dimensions.".to_string(),
        ),
        Quadrant::HighLow => (
            format!("Most students are stronger in {x_label} than in {y_label}."),
            format!("Prioritise {y_label} in the coming sequences."),
        ),
        Quadrant::LowHigh => (
            format!("Most students are stronger in {y_label} than in {x_label}."),
            format!("Prioritise {x_label} in the coming sequences."),
        ),
        Quadrant::LowLow => (
            "Most students struggle on both dimensions.".to_string(),
            "Set up intensive remediation on the fundamentals of both dimensions.".to_string(),
        ),
    };

    Narrative::new(reading, diagnosis, recommendation)
}

fn funnel(steps: &[FunnelStep]) -> Narrative {
    let (Some(first), Some(last)) = (steps.first(), steps.last()) else {
        return no_data("No skill gates are defined for this subject.".to_string());
    };

    let stages = steps
        .iter()
        .map(|step| format!("{} {}%", step.label, num(step.percentage)))
        .collect::<Vec<_>>()
        .join(", ");
    let reading = format!(
        "Pass rates by gate: {stages}. {}% clear '{}' and {}% clear '{}'.",
        num(first.percentage),
        first.label,
        num(last.percentage),
        last.label,
    );

    let mut largest_drop: Option<(f64, &FunnelStep, &FunnelStep)> = None;
    for pair in steps.windows(2) {
        let drop = pair[0].percentage - pair[1].percentage;
        if drop > 0.0 && largest_drop.map_or(true, |(best, _, _)| drop > best) {
            largest_drop = Some((drop, &pair[0], &pair[1]));
        }
    }

    match largest_drop {
        Some((drop, previous, next)) => Narrative::new(
            reading,
            format!(
                "The largest loss occurs between '{}' and '{}' ({} points).",
                previous.label,
                next.label,
                num(drop)
            ),
            format!("Focus remediation on the skill behind '{}'.", next.label),
        ),
        None => Narrative::new(
            reading,
            "No gate loses students relative to the previous one.",
            "Maintain the progression and raise expectations at the final gate.",
        ),
    }
}

fn radar(points: &[RadarPoint]) -> Narrative {
    let Some((strongest, weakest)) = extremes(points) else {
        return no_data("No radar domains are defined for this subject.".to_string());
    };

    let reading = format!(
        "Strongest domain: {} ({}%). Weakest domain: {} ({}%).",
        strongest.label,
        num(strongest.percentage),
        weakest.label,
        num(weakest.percentage),
    );

    if strongest.percentage - weakest.percentage > WIDE_GAP {
        Narrative::new(
            reading,
            "Performance is uneven across domains.",
            format!("Devote additional practice to {}.", weakest.label),
        )
    } else {
        Narrative::new(
            reading,
            "Performance is consistent across domains.",
            "Maintain balanced coverage of all domains.",
        )
    }
}

fn cross_subject(
    first: &str,
    second: &str,
    linked: usize,
    correlation: f64,
    first_mean: f64,
    second_mean: f64,
) -> Narrative {
    if linked == 0 {
        return no_data(format!(
            "No student could be matched across {first} and {second}."
        ));
    }

    let reading = format!(
        "{linked} students were matched. Mean mastery is {}% in {first} and {}% in {second}, with a correlation of {}.",
        num(first_mean),
        num(second_mean),
        num(correlation),
    );

    let (diagnosis, recommendation) = if correlation >= 0.5 {
        (
            "Results in both subjects move together strongly.",
            "Shared transversal skills are likely at play; coordinate remediation across both subjects.",
        )
    } else if correlation >= 0.2 {
        (
            "Results in both subjects are moderately linked.",
            "Share observations between teachers and align assessment calendars.",
        )
    } else if correlation > -0.2 {
        (
            "Results in both subjects are largely independent.",
            "Address the difficulties of each subject separately.",
        )
    } else {
        (
            "Results in both subjects move in opposite directions.",
            "Check whether time spent on one subject crowds out the other.",
        )
    };

    Narrative::new(reading, diagnosis, recommendation)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gap(x: f64, y: f64) -> IndicatorBundle {
        IndicatorBundle::AxisGap {
            x_label: "Decoding".to_string(),
            x_pct: x,
            y_label: "Comprehension".to_string(),
            y_pct: y,
        }
    }

    #[test]
    fn axis_gap_branches_on_thresholds() {
        let wide = narrate(&gap(80.0, 60.0), None);
        assert!(wide.diagnosis.starts_with("A wide imbalance"));
        assert!(wide.recommendation.contains("Comprehension"));
        assert!(wide.reading.contains("80.0%"));
        assert!(wide.reading.contains("20.0 points"));

        let moderate = narrate(&gap(50.0, 60.0), None);
        assert!(moderate.diagnosis.contains("moderate"));
        assert!(moderate.recommendation.contains("Decoding"));

        let balanced = narrate(&gap(70.0, 62.0), None);
        assert_eq!(balanced.diagnosis, "Both dimensions progress evenly.");
    }

    #[test]
    fn override_replaces_generated_text() {
        let manual = Narrative {
            reading: "Inspector note".to_string(),
            diagnosis: "Seen in class".to_string(),
            recommendation: "Visit again".to_string(),
        };

        let bundle = IndicatorBundle::Mastery {
            mastery_pct: 55.56,
            homogeneity: 12.0,
        };
        assert_eq!(narrate(&bundle, Some(&manual)), manual);

        let generated = narrate(&bundle, None);
        assert!(generated.reading.contains("55.6%"));
        assert!(generated.reading.contains("proficient"));
    }

    #[test]
    fn mastery_recommends_differentiation_when_fragmented() {
        let narrative = narrate(
            &IndicatorBundle::Mastery {
                mastery_pct: 80.0,
                homogeneity: 30.0,
            },
            None,
        );
        assert!(narrative.diagnosis.contains("diverge"));
        assert!(narrative.recommendation.starts_with("Organise differentiated groups"));
    }

    #[test]
    fn funnel_points_at_largest_drop() {
        let step = |label: &str, percentage: f64| FunnelStep {
            label: label.to_string(),
            count: 0,
            percentage,
            retention_from_previous: None,
        };
        let narrative = narrate(
            &IndicatorBundle::funnel(&[
                step("Decodes", 90.0),
                step("Reads fluently", 80.0),
                step("Understands", 40.0),
                step("Writes", 45.0),
            ]),
            None,
        );

        assert!(narrative.diagnosis.contains("'Reads fluently' and 'Understands'"));
        assert!(narrative.diagnosis.contains("40.0 points"));

        let empty = narrate(&IndicatorBundle::funnel(&[]), None);
        assert!(empty.diagnosis.starts_with("No assessment data"));
    }

    #[test]
    fn quadrant_names_dominant_cell() {
        let narrative = narrate(
            &IndicatorBundle::Quadrant {
                x_label: "Computation".to_string(),
                y_label: "Reasoning".to_string(),
                total: 4,
                high_high_pct: 25.0,
                high_low_pct: 50.0,
                low_high_pct: 0.0,
                low_low_pct: 25.0,
            },
            None,
        );
        assert_eq!(
            narrative.diagnosis,
            "Most students are stronger in Computation than in Reasoning."
        );
    }

    #[test]
    fn radar_and_cross_subject_use_extremes_and_correlation() {
        let radar_text = narrate(
            &IndicatorBundle::radar(&[
                RadarPoint {
                    label: "Oral".to_string(),
                    percentage: 70.0,
                },
                RadarPoint {
                    label: "Writing".to_string(),
                    percentage: 40.0,
                },
            ]),
            None,
        );
        assert!(radar_text.recommendation.contains("Writing"));

        let cross = narrate(
            &IndicatorBundle::CrossSubject {
                first_label: "arabic".to_string(),
                second_label: "math".to_string(),
                linked: 12,
                correlation: 0.72,
                first_mean_pct: 61.0,
                second_mean_pct: 58.25,
            },
            None,
        );
        assert!(cross.reading.starts_with("12 students were matched"));
        assert!(cross.reading.contains("0.7"));
        assert!(cross.diagnosis.contains("strongly"));
    }
}
