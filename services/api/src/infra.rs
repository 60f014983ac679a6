use competency_insights::analytics::domain::ClassRecord;
use competency_insights::analytics::ProfileCatalog;
use competency_insights::config::DataConfig;
use competency_insights::error::AppError;
use competency_insights::import::{ProfileImporter, RecordImporter};
use competency_insights::narrative::{InMemoryOverrideStore, NarrativeService};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) insights: InsightsState,
}

/// Read-mostly data shared by every request.
#[derive(Clone)]
pub(crate) struct InsightsState {
    pub(crate) catalog: Arc<ProfileCatalog>,
    pub(crate) records: Arc<Vec<ClassRecord>>,
    pub(crate) overrides: Arc<InMemoryOverrideStore>,
}

impl InsightsState {
    pub(crate) fn new(catalog: ProfileCatalog, records: Vec<ClassRecord>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            records: Arc::new(records),
            overrides: Arc::new(InMemoryOverrideStore::default()),
        }
    }

    pub(crate) fn narratives(&self) -> NarrativeService {
        NarrativeService::new(self.overrides.clone())
    }
}

/// Built-in profiles, overlaid with any JSON profiles from the configured directory.
pub(crate) fn load_catalog(profiles_dir: Option<&Path>) -> Result<ProfileCatalog, AppError> {
    let mut catalog = ProfileCatalog::standard()?;
    if let Some(dir) = profiles_dir {
        for profile in ProfileImporter::from_dir(dir)? {
            catalog.register(profile);
        }
    }
    Ok(catalog)
}

pub(crate) fn load_records(path: Option<&Path>) -> Result<Vec<ClassRecord>, AppError> {
    match path {
        Some(path) => Ok(RecordImporter::from_path(path)?),
        None => Ok(Vec::new()),
    }
}

pub(crate) fn load_insights(data: &DataConfig) -> Result<InsightsState, AppError> {
    let catalog = load_catalog(data.profiles_dir.as_deref())?;
    let records = load_records(data.records_path.as_deref())?;
    info!(
        profiles = catalog.len(),
        classes = records.len(),
        "insights data loaded"
    );
    Ok(InsightsState::new(catalog, records))
}

pub(crate) fn sample_records() -> Result<Vec<ClassRecord>, AppError> {
    let data = include_bytes!("../../../crates/competency-insights/data/sample_grades.csv");
    Ok(RecordImporter::from_reader(
        &data[..],
        competency_insights::import::RecordFormat::Csv,
    )?)
}

#[cfg(test)]
pub(crate) fn test_state(records: Vec<ClassRecord>) -> AppState {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let catalog = ProfileCatalog::standard().expect("built-in profiles are valid");
    AppState {
        readiness: Arc::new(AtomicBool::new(true)),
        metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        insights: InsightsState::new(catalog, records),
    }
}
