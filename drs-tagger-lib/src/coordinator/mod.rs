mod registry;

pub use registry::DrsRegistry;

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::checksum::{ChecksumProvider, Sha256Checksum};
use crate::config::TaggerConfig;
use crate::error::{ErrorKind, ErrorLog, RunOutcome, TaggerError};
use crate::mapper::FacetMapper;
use crate::tagger::{DatasetOutcome, DatasetTagger, TaggerSettings};
use crate::types::{MappingRecord, TagRecord};
use crate::utils::is_dataset_line;

/// Read a dataset list: one path per line, `#` comments and blank lines skipped,
/// duplicates removed, sorted.
pub fn load_dataset_list(path: &Path) -> Result<Vec<PathBuf>, TaggerError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        TaggerError::InvalidConfig(format!(
            "Unable to read dataset list {}: {}",
            path.display(),
            e
        ))
    })?;
    let datasets: BTreeSet<PathBuf> = text
        .lines()
        .filter(|line| is_dataset_line(line))
        .map(|line| PathBuf::from(line.trim()))
        .collect();
    tracing::info!("Read {} datasets from {}", datasets.len(), path.display());
    Ok(datasets.into_iter().collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Init,
    Processing { current: usize, total: usize },
    Finalizing,
    Done,
}

/// Everything a run produced, in dataset order.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    pub datasets: usize,
    pub records: Vec<MappingRecord>,
    pub tags: Vec<TagRecord>,
    pub errors: ErrorLog,
    /// Merged registry, written back when a registry path is configured.
    pub registry: DrsRegistry,
    pub cancelled: bool,
}

impl RunReport {
    pub fn outcome(&self) -> RunOutcome {
        RunOutcome::from_log(&self.errors)
    }
}

/// Drives a run over a list of datasets on a bounded pool of blocking workers.
///
/// Owns the run-scoped vocabulary cache (through the tagger's resolver).
pub struct RunCoordinator {
    tagger: Arc<DatasetTagger>,
    workers: usize,
    registry_path: Option<PathBuf>,
    cancel: Arc<AtomicBool>,
    state: RunState,
}

impl RunCoordinator {
    pub fn new(tagger: DatasetTagger, workers: usize, registry_path: Option<PathBuf>) -> Self {
        Self {
            tagger: Arc::new(tagger),
            workers: workers.max(1),
            registry_path,
            cancel: Arc::new(AtomicBool::new(false)),
            state: RunState::Init,
        }
    }

    /// Wire up a run from a validated configuration.
    pub fn from_config(config: &TaggerConfig) -> Result<Self, TaggerError> {
        let resolver = Arc::new(config.build_resolver()?);
        let schema = Arc::new(config.drs.clone());
        let pins = if config.use_overrides {
            config.pins.clone()
        } else {
            Vec::new()
        };
        let mapper = FacetMapper::new(resolver, Arc::clone(&schema), pins);
        let checksums: Option<Arc<dyn ChecksumProvider>> = if config.checksums {
            Some(Arc::new(Sha256Checksum))
        } else {
            tracing::info!("Checksums disabled");
            None
        };
        let tagger = DatasetTagger::new(
            config.build_extractor(),
            checksums,
            mapper,
            schema,
            TaggerSettings {
                file_extension: config.file_extension.clone(),
                file_limit: config.file_count,
            },
        );
        Ok(Self::new(tagger, config.workers, config.registry_path()))
    }

    /// Setting the flag stops new datasets from being scheduled.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, state: RunState) {
        tracing::debug!("Run state {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    pub async fn run(&mut self, datasets: Vec<PathBuf>) -> Result<RunReport, TaggerError> {
        let run_id = Uuid::new_v4();
        let started = Utc::now();
        tracing::info!(
            "Starting run {} over {} datasets with {} workers",
            run_id,
            datasets.len(),
            self.workers
        );

        let mut registry = match &self.registry_path {
            Some(path) => DrsRegistry::load(path)?,
            None => DrsRegistry::default(),
        };

        let total = datasets.len();
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut handles = Vec::with_capacity(total);
        let mut cancelled = false;
        for (index, dataset) in datasets.into_iter().enumerate() {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| TaggerError::Processing(format!("Worker pool closed: {}", e)))?;
            if self.cancel.load(Ordering::SeqCst) {
                tracing::warn!("Run cancelled, {} datasets not started", total - index);
                cancelled = true;
                break;
            }
            self.transition(RunState::Processing {
                current: index + 1,
                total,
            });
            tracing::info!("Dataset {} of {}: {}", index + 1, total, dataset.display());

            let tagger = Arc::clone(&self.tagger);
            let worker_dataset = dataset.clone();
            let handle = tokio::task::spawn_blocking(move || {
                let _permit = permit;
                tagger.tag(&worker_dataset)
            });
            handles.push((dataset, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (dataset, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    tracing::error!("Worker for {} failed: {}", dataset.display(), e);
                    let mut errors = ErrorLog::new();
                    errors.add(
                        &dataset,
                        None,
                        ErrorKind::DatasetFailed,
                        format!("processing stopped unexpectedly: {}", e),
                    );
                    outcomes.push(DatasetOutcome {
                        dataset,
                        record: None,
                        tags: Vec::new(),
                        errors,
                    });
                }
            }
        }

        self.transition(RunState::Finalizing);
        let mut report = RunReport {
            run_id,
            started,
            finished: started,
            datasets: outcomes.len(),
            records: Vec::new(),
            tags: Vec::new(),
            errors: ErrorLog::new(),
            registry: DrsRegistry::default(),
            cancelled,
        };
        for outcome in outcomes {
            aggregate(&mut report, &mut registry, outcome);
        }
        if let Some(path) = &self.registry_path {
            // Logged, not fatal: the report already carries the identifiers.
            if let Err(e) = registry.save(path) {
                tracing::error!("Unable to save DRS registry {}: {}", path.display(), e);
                report.errors.add(
                    path,
                    None,
                    ErrorKind::Registry,
                    format!("unable to save DRS registry: {}", e),
                );
            }
        }
        report.registry = registry;
        report.finished = Utc::now();
        self.transition(RunState::Done);

        tracing::info!(
            "Run {} finished in {:.1}s: {} datasets, {} DRS identifiers, {} tags, {} errors",
            run_id,
            (report.finished - report.started).num_milliseconds() as f64 / 1000.0,
            report.datasets,
            report.records.iter().filter(|r| r.drs.is_some()).count(),
            report.tags.len(),
            report.errors.len()
        );
        Ok(report)
    }
}

/// Fold one dataset into the run; realizations are assigned here, in dataset order.
fn aggregate(report: &mut RunReport, registry: &mut DrsRegistry, outcome: DatasetOutcome) {
    let DatasetOutcome {
        dataset,
        record,
        tags,
        errors,
    } = outcome;

    if let Some(mut record) = record {
        if let Some(drs) = record.drs.take() {
            let realization = registry.assign(&dataset, &drs);
            record.drs = Some(drs.with_realization(realization));
        }
        report.records.push(record);
    }
    report.tags.extend(tags);
    report.errors.merge(errors);
}
