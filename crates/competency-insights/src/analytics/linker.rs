use super::dispersion::mean;
use super::quadrant::StudentPoint;
use super::scope::{Enrolled, Population};
use super::scoring::score_student;
use super::taxonomy::CriterionSet;
use serde::Serialize;
use std::collections::HashMap;

/// Natural identity of a student across independently loaded populations.
///
/// Each component is trimmed; comparison stays case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StudentKey {
    pub school: String,
    pub class_name: String,
    pub full_name: String,
}

impl StudentKey {
    pub fn new(school: &str, class_name: &str, full_name: &str) -> Self {
        Self {
            school: school.trim().to_string(),
            class_name: class_name.trim().to_string(),
            full_name: full_name.trim().to_string(),
        }
    }

    pub fn of(member: &Enrolled<'_>) -> Self {
        Self::new(
            &member.record.school,
            &member.record.class_name,
            &member.student.full_name,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkedScore<K> {
    pub key: K,
    pub x_pct: f64,
    pub y_pct: f64,
}

impl LinkedScore<StudentKey> {
    pub fn to_point(&self) -> StudentPoint {
        StudentPoint {
            full_name: self.key.full_name.clone(),
            school: self.key.school.clone(),
            class_name: self.key.class_name.clone(),
            x_pct: self.x_pct,
            y_pct: self.y_pct,
        }
    }
}

/// Pairs students of `a` with their counterpart in `b` using [`StudentKey`].
pub fn link(
    a: &Population<'_>,
    a_criteria: &CriterionSet,
    b: &Population<'_>,
    b_criteria: &CriterionSet,
) -> Vec<LinkedScore<StudentKey>> {
    link_by(a, a_criteria, b, b_criteria, StudentKey::of)
}

/// Pairs students by an arbitrary key. Students of `a` without a match in `b`
/// are dropped; when `b` holds duplicate keys the last one wins.
pub fn link_by<K, F>(
    a: &Population<'_>,
    a_criteria: &CriterionSet,
    b: &Population<'_>,
    b_criteria: &CriterionSet,
    key_fn: F,
) -> Vec<LinkedScore<K>>
where
    K: Eq + std::hash::Hash,
    F: Fn(&Enrolled<'_>) -> K,
{
    let lookup: HashMap<K, &Enrolled<'_>> = b.iter().map(|member| (key_fn(member), member)).collect();

    a.iter()
        .filter_map(|member| {
            let key = key_fn(member);
            let counterpart = lookup.get(&key)?;
            Some(LinkedScore {
                x_pct: score_student(member.student, a_criteria).mastery_pct(),
                y_pct: score_student(counterpart.student, b_criteria).mastery_pct(),
                key,
            })
        })
        .collect()
}

/// Pearson correlation of the paired percentages; 0 when undefined.
pub fn correlation<K>(pairs: &[LinkedScore<K>]) -> f64 {
    if pairs.len() < 2 {
        return 0.0;
    }

    let xs: Vec<f64> = pairs.iter().map(|pair| pair.x_pct).collect();
    let ys: Vec<f64> = pairs.iter().map(|pair| pair.y_pct).collect();
    let (x_mean, y_mean) = (mean(&xs), mean(&ys));

    let mut covariance = 0.0;
    let mut x_variance = 0.0;
    let mut y_variance = 0.0;
    for (x, y) in xs.iter().zip(&ys) {
        let dx = x - x_mean;
        let dy = y - y_mean;
        covariance += dx * dy;
        x_variance += dx * dx;
        y_variance += dy * dy;
    }

    let denominator = (x_variance * y_variance).sqrt();
    if denominator == 0.0 {
        0.0
    } else {
        covariance / denominator
    }
}
