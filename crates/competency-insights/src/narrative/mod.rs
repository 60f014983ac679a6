//! Template narratives for dashboard indicators and the manual override seam.

mod overrides;
mod templates;

pub use overrides::{
    InMemoryOverrideStore, NarrativeEntry, NarrativeService, NarrativeSource, OverrideKey,
    OverrideRecord, OverrideStore, OverrideStoreError,
};
pub use templates::{
    narrate, IndicatorBundle, Narrative, NarrativeContext, MODERATE_GAP, WIDE_GAP,
};
