mod files;

pub use files::select_files;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::checksum::ChecksumProvider;
use crate::error::{ErrorKind, ErrorLog, ExtractionError};
use crate::extract::FactExtractor;
use crate::mapper::{FacetMapper, FacetOutcome, MappedFacets};
use crate::types::{
    Checksum, DrsIdentifier, DrsSchema, FactSet, FileEntry, MappingRecord, TagRecord,
};
use crate::utils::drs_component;

/// A data file whose facts have been read. Facts cannot change afterwards.
#[derive(Debug, Clone)]
pub struct DataFile {
    path: PathBuf,
    facts: FactSet,
    checksum: Checksum,
}

impl DataFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn facts(&self) -> &FactSet {
        &self.facts
    }

    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }
}

/// Result of reading one file of a dataset.
#[derive(Debug)]
pub enum FileOutcome {
    Extracted(DataFile),
    Failed {
        path: PathBuf,
        error: ExtractionError,
    },
}

/// Everything one dataset contributes to the run.
#[derive(Debug, Clone)]
pub struct DatasetOutcome {
    pub dataset: PathBuf,
    /// `None` when no file of the dataset could be read.
    pub record: Option<MappingRecord>,
    pub tags: Vec<TagRecord>,
    pub errors: ErrorLog,
}

#[derive(Debug, Clone)]
pub struct TaggerSettings {
    pub file_extension: String,
    /// Maximum number of files per dataset; 0 means all.
    pub file_limit: usize,
}

impl Default for TaggerSettings {
    fn default() -> Self {
        Self {
            file_extension: "nc".to_string(),
            file_limit: 0,
        }
    }
}

pub struct DatasetTagger {
    extractor: Arc<dyn FactExtractor>,
    /// `None` when checksums are switched off.
    checksums: Option<Arc<dyn ChecksumProvider>>,
    mapper: FacetMapper,
    schema: Arc<DrsSchema>,
    settings: TaggerSettings,
}

impl DatasetTagger {
    pub fn new(
        extractor: Arc<dyn FactExtractor>,
        checksums: Option<Arc<dyn ChecksumProvider>>,
        mapper: FacetMapper,
        schema: Arc<DrsSchema>,
        settings: TaggerSettings,
    ) -> Self {
        Self {
            extractor,
            checksums,
            mapper,
            schema,
            settings,
        }
    }

    pub fn tag(&self, dataset: &Path) -> DatasetOutcome {
        let mut report = DatasetOutcome {
            dataset: dataset.to_path_buf(),
            record: None,
            tags: Vec::new(),
            errors: ErrorLog::new(),
        };

        let files = match select_files(
            dataset,
            &self.settings.file_extension,
            self.settings.file_limit,
        ) {
            Ok(files) => files,
            Err(e) => {
                report.errors.add(
                    dataset,
                    None,
                    ErrorKind::EmptyDataset,
                    format!("unable to list files: {}", e),
                );
                return report;
            }
        };
        tracing::info!("Processing {} files from {}", files.len(), dataset.display());

        if files.is_empty() {
            report.errors.add(
                dataset,
                None,
                ErrorKind::EmptyDataset,
                format!("no .{} files found", self.settings.file_extension),
            );
            return report;
        }

        let outcomes: Vec<FileOutcome> = files
            .into_iter()
            .map(|path| self.read_file(dataset, path, &mut report.errors))
            .collect();
        let data_files: Vec<DataFile> = outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                FileOutcome::Extracted(file) => Some(file),
                FileOutcome::Failed { .. } => None,
            })
            .collect();

        if data_files.is_empty() {
            report.errors.add(
                dataset,
                None,
                ErrorKind::NoFacts,
                "no file could be read, no DRS entry created",
            );
            return report;
        }

        let mut facts = FactSet::new();
        for file in &data_files {
            facts.union(file.facts());
        }
        let mapped = self.mapper.map_dataset(&facts);
        for issue in &mapped.issues {
            report
                .errors
                .add(dataset, None, issue.kind, issue.message.clone());
        }

        let drs = self.build_drs(dataset, &mapped, &mut report.errors);
        match &drs {
            Some(drs) => tracing::info!("DRS = {}", drs),
            None => tracing::warn!("No DRS created for {}", dataset.display()),
        }

        report.tags = mapped
            .tag_uris
            .iter()
            .map(|uri| TagRecord {
                dataset: dataset.to_path_buf(),
                uri: uri.clone(),
            })
            .collect();

        report.record = Some(MappingRecord {
            dataset: dataset.to_path_buf(),
            drs,
            files: data_files
                .into_iter()
                .map(|file| FileEntry {
                    file: file.path,
                    checksum: file.checksum,
                })
                .collect(),
        });
        report
    }

    fn read_file(&self, dataset: &Path, path: PathBuf, errors: &mut ErrorLog) -> FileOutcome {
        let facts = match self.extractor.inspect(&path) {
            Ok(extraction) => {
                for warning in extraction.warnings {
                    errors.add(dataset, Some(&path), ErrorKind::EmptyLongName, warning);
                }
                extraction.facts
            }
            Err(error) => {
                errors.add(
                    dataset,
                    Some(&path),
                    ErrorKind::Extraction,
                    format!("extracting attributes: {}", error),
                );
                return FileOutcome::Failed { path, error };
            }
        };

        let checksum = match &self.checksums {
            Some(provider) => match provider.checksum(&path) {
                Ok(digest) => Checksum::Sha256(digest),
                Err(e) => {
                    errors.add(dataset, Some(&path), ErrorKind::Checksum, e.to_string());
                    Checksum::Absent
                }
            },
            None => Checksum::Absent,
        };

        FileOutcome::Extracted(DataFile {
            path,
            facts,
            checksum,
        })
    }

    fn build_drs(
        &self,
        dataset: &Path,
        mapped: &MappedFacets,
        errors: &mut ErrorLog,
    ) -> Option<DrsIdentifier> {
        let mut components = Vec::with_capacity(self.schema.facets.len());
        let mut complete = true;
        for facet in &self.schema.facets {
            match mapped.outcome(*facet) {
                FacetOutcome::Settled(term) => components.push(drs_component(*facet, &term.label)),
                FacetOutcome::Missing => {
                    complete = false;
                    errors.add(
                        dataset,
                        None,
                        ErrorKind::MissingFacet,
                        format!("value not found for {}", facet),
                    );
                }
                FacetOutcome::Unresolved(raw) => {
                    complete = false;
                    errors.add(
                        dataset,
                        None,
                        ErrorKind::UnresolvedFacet,
                        format!("no valid value for {} among {:?}", facet, raw),
                    );
                }
                // Already reported by the mapper with its candidates.
                FacetOutcome::Conflict(_) => complete = false,
            }
        }

        complete.then(|| DrsIdentifier::new(self.schema.prefix.clone(), components))
    }
}
