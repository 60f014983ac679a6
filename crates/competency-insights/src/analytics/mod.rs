//! Grade reduction engine: resolution, scoring and the derived indicators.

pub mod catalog;
pub mod dispersion;
pub mod distribution;
pub mod domain;
pub mod funnel;
pub mod linker;
pub mod profile;
pub mod quadrant;
pub mod radar;
pub mod resolver;
pub mod scope;
pub mod scoring;
pub mod taxonomy;

#[cfg(test)]
pub(crate) mod fixtures;

pub use catalog::ProfileCatalog;
pub use domain::{ClassRecord, CompetencyId, CriterionId, Grade, Results, Student, MAX_POINTS};
pub use profile::{ProfileDefinition, SubjectProfile};
pub use scope::{Enrolled, Population, Scope};
pub use scoring::{safe_pct, MasteryLevel, ScoreTally};
pub use taxonomy::{CriterionRef, CriterionSelector, CriterionSet, SchemaError, SubjectTaxonomy};
