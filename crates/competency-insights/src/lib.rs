//! Competency analytics for pedagogical inspection dashboards.
//!
//! Class records holding per-criterion letter grades are reduced into mastery
//! rates, grade distributions, homogeneity, quadrant matrices, skill funnels,
//! radar profiles and cross-subject pairings, each paired with a template
//! narrative that an inspector may override.

pub mod analytics;
pub mod config;
pub mod error;
pub mod import;
pub mod narrative;
pub mod report;
pub mod telemetry;
