use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::types::Facet;

#[derive(Debug, Error)]
pub enum TaggerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Processing error: {0}")]
    Processing(String),
}

/// Failure to pull facts out of a single data file.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("unable to read '{path}': {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid file name format \"{0}\"")]
    InvalidFileName(String),
    #[error("malformed header in '{path}' at line {line}: {message}")]
    Malformed {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

#[derive(Debug, Error)]
#[error("unable to checksum '{path}': {source}")]
pub struct ChecksumError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VocabularyError {
    #[error("vocabulary service unavailable: {0}")]
    Unavailable(String),
    #[error("vocabulary service timed out after {0}s")]
    Timeout(u64),
    #[error("no concept scheme configured for facet '{0}'")]
    UnknownScheme(Facet),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Extraction,
    Checksum,
    VocabularyUnavailable,
    InvalidValue,
    FacetConflict,
    /// Conflict on a facet that is not part of the DRS.
    OptionalFacetConflict,
    MissingFacet,
    UnresolvedFacet,
    EmptyDataset,
    NoFacts,
    EmptyLongName,
    /// The dataset's worker stopped before producing a result.
    DatasetFailed,
    Registry,
}

impl ErrorKind {
    /// Kinds that only degrade a record rather than lose data.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            ErrorKind::Checksum
                | ErrorKind::InvalidValue
                | ErrorKind::OptionalFacetConflict
                | ErrorKind::EmptyLongName
        )
    }
}

/// One line of the run's error log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEntry {
    pub dataset: PathBuf,
    pub file: Option<PathBuf>,
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorEntry {
    pub fn new(
        dataset: impl Into<PathBuf>,
        file: Option<&Path>,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            dataset: dataset.into(),
            file: file.map(Path::to_path_buf),
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = if self.kind.is_warning() {
            "WARNING"
        } else {
            "ERROR"
        };
        write!(f, "{} in {}", level, self.dataset.display())?;
        if let Some(file) = &self.file {
            write!(f, " ({})", file.display())?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Append-only collection of the problems seen while processing.
#[derive(Debug, Default, Clone)]
pub struct ErrorLog {
    entries: Vec<ErrorEntry>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: ErrorEntry) {
        tracing::debug!("{}", entry);
        self.entries.push(entry);
    }

    pub fn add(
        &mut self,
        dataset: &Path,
        file: Option<&Path>,
        kind: ErrorKind,
        message: impl Into<String>,
    ) {
        self.push(ErrorEntry::new(dataset, file, kind, message));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[ErrorEntry] {
        &self.entries
    }

    pub fn count_kind(&self, kind: ErrorKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    pub fn merge(&mut self, other: ErrorLog) {
        self.entries.extend(other.entries);
    }

    pub fn into_entries(self) -> Vec<ErrorEntry> {
        self.entries
    }
}

/// How a completed run ended; drives the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Clean,
    CompletedWithErrors { errors: usize },
}

impl RunOutcome {
    pub fn from_log(log: &ErrorLog) -> Self {
        if log.is_empty() {
            RunOutcome::Clean
        } else {
            RunOutcome::CompletedWithErrors { errors: log.len() }
        }
    }
}
