use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::TaggerError;
use crate::types::DrsIdentifier;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct RegistryRow {
    dataset: PathBuf,
    drs: String,
}

/// Previously issued DRS identifiers, one (dataset, DRS) row each.
///
/// A dataset keeps the realization it was registered with; a dataset new to a
/// DRS base gets the lowest realization not yet taken for that base.
#[derive(Debug, Clone, Default)]
pub struct DrsRegistry {
    rows: Vec<RegistryRow>,
}

/// Split `esacci.a.b.r3` into (`esacci.a.b`, 3).
fn split_realization(drs: &str) -> Option<(&str, u32)> {
    let (base, suffix) = drs.rsplit_once('.')?;
    let realization = suffix.strip_prefix('r')?.parse().ok()?;
    Some((base, realization))
}

impl DrsRegistry {
    /// Load the registry; a file that does not exist yet is an empty registry.
    pub fn load(path: &Path) -> Result<Self, TaggerError> {
        if !path.exists() {
            tracing::info!("No DRS registry at {}, starting empty", path.display());
            return Ok(Self::default());
        }
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_path(path)
            .map_err(|e| {
                TaggerError::InvalidConfig(format!(
                    "Unable to read DRS registry {}: {}",
                    path.display(),
                    e
                ))
            })?;

        let mut rows = Vec::new();
        for row in reader.deserialize::<RegistryRow>() {
            let row = row.map_err(|e| {
                TaggerError::InvalidConfig(format!(
                    "Malformed DRS registry {}: {}",
                    path.display(),
                    e
                ))
            })?;
            if split_realization(&row.drs).is_none() {
                return Err(TaggerError::InvalidConfig(format!(
                    "DRS registry entry without realization: {}",
                    row.drs
                )));
            }
            rows.push(row);
        }
        tracing::info!("Loaded {} DRS registry entries", rows.len());
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The realization `dataset` has for the base of `drs`, registering a new one if needed.
    pub fn assign(&mut self, dataset: &Path, drs: &DrsIdentifier) -> u32 {
        let base = drs.base();
        let mut taken = BTreeSet::new();
        for row in &self.rows {
            let Some((row_base, realization)) = split_realization(&row.drs) else {
                continue;
            };
            if row_base != base {
                continue;
            }
            if row.dataset == dataset {
                return realization;
            }
            taken.insert(realization);
        }

        let realization = (1..)
            .find(|n| !taken.contains(n))
            .unwrap_or(1);
        self.rows.push(RegistryRow {
            dataset: dataset.to_path_buf(),
            drs: format!("{}.r{}", base, realization),
        });
        realization
    }

    pub fn save(&self, path: &Path) -> Result<(), TaggerError> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(path)?;
        for row in &self.rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        tracing::info!("Saved {} DRS registry entries to {}", self.rows.len(), path.display());
        Ok(())
    }
}
