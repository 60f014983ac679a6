use super::templates::{narrate, IndicatorBundle, Narrative, NarrativeContext};
use crate::analytics::scope::Scope;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Identifies the dashboard view a manual narrative belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OverrideKey {
    pub subject: String,
    /// Second subject of a cross-subject view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paired_subject: Option<String>,
    #[serde(default)]
    pub scope: Scope,
    pub context: NarrativeContext,
}

impl OverrideKey {
    pub fn new(subject: impl Into<String>, scope: Scope, context: NarrativeContext) -> Self {
        let subject: String = subject.into();
        Self {
            subject: subject.trim().to_string(),
            paired_subject: None,
            scope,
            context,
        }
    }

    /// Key of the narrative comparing `first` against `second`.
    pub fn cross_subject(
        first: impl Into<String>,
        second: impl Into<String>,
        scope: Scope,
    ) -> Self {
        Self::new(first, scope, NarrativeContext::CrossSubject).paired_with(second)
    }

    pub fn paired_with(mut self, second: impl Into<String>) -> Self {
        let second: String = second.into();
        self.paired_subject = Some(second.trim().to_string()).filter(|value| !value.is_empty());
        self
    }

    /// Trims both subjects and drops a blank paired subject, as keys built
    /// through [`OverrideKey::new`] are.
    pub fn normalized(self) -> Self {
        let Self {
            subject,
            paired_subject,
            scope,
            context,
        } = self;
        let key = Self::new(subject, scope, context);
        match paired_subject {
            Some(second) => key.paired_with(second),
            None => key,
        }
    }
}

/// Narrative text edited by an inspector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideRecord {
    pub key: OverrideKey,
    pub narrative: Narrative,
    pub updated_at: DateTime<Utc>,
}

/// Storage for manual narratives. Reports only read from it; writes come
/// from the editing surface.
pub trait OverrideStore: Send + Sync {
    fn get(&self, key: &OverrideKey) -> Result<Option<OverrideRecord>, OverrideStoreError>;
    fn put(&self, key: OverrideKey, narrative: Narrative)
        -> Result<OverrideRecord, OverrideStoreError>;
    fn remove(&self, key: &OverrideKey) -> Result<Option<OverrideRecord>, OverrideStoreError>;
    fn list(&self, subject: Option<&str>) -> Result<Vec<OverrideRecord>, OverrideStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum OverrideStoreError {
    #[error("override store unavailable: {0}")]
    Unavailable(String),
}

/// Process-local store, suitable for a single service instance and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryOverrideStore {
    records: Arc<Mutex<BTreeMap<OverrideKey, OverrideRecord>>>,
}

impl InMemoryOverrideStore {
    fn guard(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, BTreeMap<OverrideKey, OverrideRecord>>, OverrideStoreError>
    {
        self.records
            .lock()
            .map_err(|_| OverrideStoreError::Unavailable("override mutex poisoned".to_string()))
    }
}

impl OverrideStore for InMemoryOverrideStore {
    fn get(&self, key: &OverrideKey) -> Result<Option<OverrideRecord>, OverrideStoreError> {
        Ok(self.guard()?.get(key).cloned())
    }

    fn put(
        &self,
        key: OverrideKey,
        narrative: Narrative,
    ) -> Result<OverrideRecord, OverrideStoreError> {
        let record = OverrideRecord {
            key: key.clone(),
            narrative,
            updated_at: Utc::now(),
        };
        self.guard()?.insert(key, record.clone());
        Ok(record)
    }

    fn remove(&self, key: &OverrideKey) -> Result<Option<OverrideRecord>, OverrideStoreError> {
        Ok(self.guard()?.remove(key))
    }

    fn list(&self, subject: Option<&str>) -> Result<Vec<OverrideRecord>, OverrideStoreError> {
        let subject = subject.map(str::trim);
        Ok(self
            .guard()?
            .values()
            .filter(|record| {
                subject.map_or(true, |subject| {
                    record.key.subject == subject
                        || record.key.paired_subject.as_deref() == Some(subject)
                })
            })
            .cloned()
            .collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeSource {
    Generated,
    Override,
}

#[derive(Debug, Clone, Serialize)]
pub struct NarrativeEntry {
    pub context: NarrativeContext,
    pub context_label: &'static str,
    pub source: NarrativeSource,
    pub bundle: IndicatorBundle,
    #[serde(flatten)]
    pub narrative: Narrative,
}

/// Resolves narratives for report views, preferring stored overrides.
#[derive(Clone, Default)]
pub struct NarrativeService {
    store: Option<Arc<dyn OverrideStore>>,
}

impl NarrativeService {
    pub fn new(store: Arc<dyn OverrideStore>) -> Self {
        Self { store: Some(store) }
    }

    /// Generated text only, no override lookup.
    pub fn generated() -> Self {
        Self::default()
    }

    pub fn describe(&self, subject: &str, scope: &Scope, bundle: IndicatorBundle) -> NarrativeEntry {
        let key = OverrideKey::new(subject, scope.clone(), bundle.context());
        self.describe_key(&key, bundle)
    }

    /// Narrative of a view comparing two subjects, keyed on both of them.
    pub fn describe_pair(
        &self,
        first: &str,
        second: &str,
        scope: &Scope,
        bundle: IndicatorBundle,
    ) -> NarrativeEntry {
        let key = OverrideKey::new(first, scope.clone(), bundle.context()).paired_with(second);
        self.describe_key(&key, bundle)
    }

    fn describe_key(&self, key: &OverrideKey, bundle: IndicatorBundle) -> NarrativeEntry {
        let context = key.context;
        let manual = self.lookup(key);
        let source = if manual.is_some() {
            NarrativeSource::Override
        } else {
            NarrativeSource::Generated
        };

        NarrativeEntry {
            context,
            context_label: context.label(),
            source,
            narrative: narrate(&bundle, manual.as_ref()),
            bundle,
        }
    }

    fn lookup(&self, key: &OverrideKey) -> Option<Narrative> {
        let store = self.store.as_ref()?;
        match store.get(key) {
            Ok(record) => record.map(|record| record.narrative),
            Err(err) => {
                warn!(error = %err, subject = %key.subject, paired = ?key.paired_subject, context = ?key.context, "override lookup failed, using generated narrative");
                None
            }
        }
    }
}

impl std::fmt::Debug for NarrativeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrativeService")
            .field("overrides", &self.store.is_some())
            .finish()
    }
}
