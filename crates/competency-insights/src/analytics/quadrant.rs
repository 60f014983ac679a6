use super::dispersion::mean;
use super::scope::Population;
use super::scoring::{safe_pct, score_student};
use super::taxonomy::CriterionSet;
use serde::Serialize;

/// Absolute mastery threshold splitting each axis. Scores at the threshold are high.
pub const QUADRANT_THRESHOLD: f64 = 50.0;

/// Position on the two-axis matrix; the first word refers to the x axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    HighHigh,
    HighLow,
    LowHigh,
    LowLow,
}

impl Quadrant {
    pub const fn ordered() -> [Self; 4] {
        [Self::HighHigh, Self::HighLow, Self::LowHigh, Self::LowLow]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::HighHigh => "High / High",
            Self::HighLow => "High / Low",
            Self::LowHigh => "Low / High",
            Self::LowLow => "Low / Low",
        }
    }
}

pub fn classify(x_pct: f64, y_pct: f64) -> Quadrant {
    match (x_pct >= QUADRANT_THRESHOLD, y_pct >= QUADRANT_THRESHOLD) {
        (true, true) => Quadrant::HighHigh,
        (true, false) => Quadrant::HighLow,
        (false, true) => Quadrant::LowHigh,
        (false, false) => Quadrant::LowLow,
    }
}

/// A named criterion subset used as one axis of the matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub label: String,
    pub criteria: CriterionSet,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentPoint {
    pub full_name: String,
    pub school: String,
    pub class_name: String,
    pub x_pct: f64,
    pub y_pct: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuadrantCell {
    pub quadrant: Quadrant,
    pub label: &'static str,
    pub count: usize,
    pub share: f64,
    pub students: Vec<StudentPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuadrantMatrix {
    pub x_label: String,
    pub y_label: String,
    pub total: usize,
    pub x_mean_pct: f64,
    pub y_mean_pct: f64,
    pub cells: Vec<QuadrantCell>,
}

impl QuadrantMatrix {
    pub fn from_points(
        x_label: impl Into<String>,
        y_label: impl Into<String>,
        points: Vec<StudentPoint>,
    ) -> Self {
        let total = points.len();
        let xs: Vec<f64> = points.iter().map(|point| point.x_pct).collect();
        let ys: Vec<f64> = points.iter().map(|point| point.y_pct).collect();

        let mut cells: Vec<QuadrantCell> = Quadrant::ordered()
            .into_iter()
            .map(|quadrant| QuadrantCell {
                quadrant,
                label: quadrant.label(),
                count: 0,
                share: 0.0,
                students: Vec::new(),
            })
            .collect();

        for point in points {
            let quadrant = classify(point.x_pct, point.y_pct);
            if let Some(cell) = cells.iter_mut().find(|cell| cell.quadrant == quadrant) {
                cell.count += 1;
                cell.students.push(point);
            }
        }

        for cell in &mut cells {
            cell.share = safe_pct(cell.count as f64, total as f64);
        }

        Self {
            x_label: x_label.into(),
            y_label: y_label.into(),
            total,
            x_mean_pct: mean(&xs),
            y_mean_pct: mean(&ys),
            cells,
        }
    }

    pub fn cell(&self, quadrant: Quadrant) -> Option<&QuadrantCell> {
        self.cells.iter().find(|cell| cell.quadrant == quadrant)
    }

    pub fn count(&self, quadrant: Quadrant) -> usize {
        self.cell(quadrant).map_or(0, |cell| cell.count)
    }

    pub fn share(&self, quadrant: Quadrant) -> f64 {
        self.cell(quadrant).map_or(0.0, |cell| cell.share)
    }
}

/// Classifies every student of the population on the two axes.
///
/// A student with nothing graded on an axis sits at 0% on it, a valid low score.
pub fn quadrant_matrix(population: &Population<'_>, x: &Axis, y: &Axis) -> QuadrantMatrix {
    let points = population
        .iter()
        .map(|member| StudentPoint {
            full_name: member.student.full_name.clone(),
            school: member.record.school.clone(),
            class_name: member.record.class_name.clone(),
            x_pct: score_student(member.student, &x.criteria).mastery_pct(),
            y_pct: score_student(member.student, &y.criteria).mastery_pct(),
        })
        .collect();

    QuadrantMatrix::from_points(x.label.clone(), y.label.clone(), points)
}
