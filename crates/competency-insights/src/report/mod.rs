mod cross;
mod summary;
pub mod views;

pub use views::{AxisGapView, CrossSubjectReport, InsightsReport, MasteryView};
