use super::scope::Population;
use super::scoring::score_student;
use super::taxonomy::CriterionSet;
use serde::Serialize;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Homogeneity index: population standard deviation (divides by N).
pub fn homogeneity(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let mean = mean(values);
    let variance = values
        .iter()
        .map(|value| {
            let delta = value - mean;
            delta * delta
        })
        .sum::<f64>()
        / values.len() as f64;

    variance.sqrt()
}

/// Per-student mastery percentages for students graded on at least one
/// criterion of the set.
pub fn student_mastery(population: &Population<'_>, criteria: &CriterionSet) -> Vec<f64> {
    population
        .students()
        .map(|student| score_student(student, criteria))
        .filter(|tally| !tally.is_empty())
        .map(|tally| tally.mastery_pct())
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HomogeneityBand {
    /// Below 15 points: one instructional pace fits the class.
    Homogeneous,
    Normal,
    /// Above 25 points: differentiated instruction is needed.
    Fragmented,
}

impl HomogeneityBand {
    pub fn from_std_dev(std_dev: f64) -> Self {
        if std_dev < 15.0 {
            Self::Homogeneous
        } else if std_dev <= 25.0 {
            Self::Normal
        } else {
            Self::Fragmented
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Homogeneous => "Homogeneous",
            Self::Normal => "Normal spread",
            Self::Fragmented => "Fragmented",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DispersionSummary {
    pub students: usize,
    pub mean_pct: f64,
    pub std_dev: f64,
    pub band: HomogeneityBand,
}

impl DispersionSummary {
    pub fn from_values(values: &[f64]) -> Self {
        let std_dev = homogeneity(values);
        Self {
            students: values.len(),
            mean_pct: mean(values),
            std_dev,
            band: HomogeneityBand::from_std_dev(std_dev),
        }
    }
}
