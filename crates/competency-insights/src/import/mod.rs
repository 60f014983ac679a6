mod normalizer;
mod parser;

use crate::analytics::domain::ClassRecord;
use crate::analytics::profile::{ProfileDefinition, SubjectProfile};
use crate::analytics::taxonomy::SchemaError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug)]
pub enum ImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    Schema(SchemaError),
    UnsupportedFormat(PathBuf),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::Io(err) => write!(f, "failed to read import file: {}", err),
            ImportError::Csv(err) => write!(f, "invalid grade CSV data: {}", err),
            ImportError::Json(err) => write!(f, "invalid JSON data: {}", err),
            ImportError::Schema(err) => write!(f, "invalid subject profile: {}", err),
            ImportError::UnsupportedFormat(path) => write!(
                f,
                "unsupported file format for '{}', expected .csv or .json",
                path.display()
            ),
        }
    }
}

impl std::error::Error for ImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ImportError::Io(err) => Some(err),
            ImportError::Csv(err) => Some(err),
            ImportError::Json(err) => Some(err),
            ImportError::Schema(err) => Some(err),
            ImportError::UnsupportedFormat(_) => None,
        }
    }
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<SchemaError> for ImportError {
    fn from(err: SchemaError) -> Self {
        Self::Schema(err)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Csv,
    Json,
}

impl RecordFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Loads class records exported by the grading tool.
pub struct RecordImporter;

impl RecordImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<ClassRecord>, ImportError> {
        let path = path.as_ref();
        let format = RecordFormat::from_path(path)
            .ok_or_else(|| ImportError::UnsupportedFormat(path.to_path_buf()))?;
        let file = std::fs::File::open(path)?;
        let records = Self::from_reader(file, format)?;

        info!(path = %path.display(), classes = records.len(), "class records imported");
        Ok(records)
    }

    pub fn from_reader<R: Read>(
        reader: R,
        format: RecordFormat,
    ) -> Result<Vec<ClassRecord>, ImportError> {
        match format {
            RecordFormat::Csv => Ok(parser::parse_csv(reader)?),
            RecordFormat::Json => Ok(parser::parse_json(reader)?),
        }
    }
}

/// Loads subject profile definitions stored as JSON files.
pub struct ProfileImporter;

impl ProfileImporter {
    pub fn from_reader<R: Read>(reader: R) -> Result<SubjectProfile, ImportError> {
        let definition: ProfileDefinition = serde_json::from_reader(reader)?;
        Ok(SubjectProfile::from_definition(definition)?)
    }

    /// Every `*.json` file of `dir`, in file name order.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<SubjectProfile>, ImportError> {
        let mut paths = std::fs::read_dir(dir.as_ref())?
            .map(|entry| entry.map(|entry| entry.path()))
            .collect::<Result<Vec<_>, _>>()?;
        paths.retain(|path| RecordFormat::from_path(path) == Some(RecordFormat::Json));
        paths.sort();

        paths
            .iter()
            .map(|path| -> Result<SubjectProfile, ImportError> {
                let profile = Self::from_reader(std::fs::File::open(path)?)?;
                info!(path = %path.display(), subject = profile.subject(), "subject profile loaded");
                Ok(profile)
            })
            .collect()
    }
}
