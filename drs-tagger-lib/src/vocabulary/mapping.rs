use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Term, TermSource};
use crate::error::TaggerError;
use crate::types::Facet;

/// A locally configured correction: raw `value` of `facet` means `uri`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverrideMapping {
    pub facet: Facet,
    pub value: String,
    pub uri: String,
    /// DRS component for the term. Defaults to the last path segment of `uri`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Forces a facet in conflict to the given term when it is one of the candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pin {
    pub facet: Facet,
    pub uri: String,
}

/// Raw `value` of `facet` is looked up in the vocabulary as `label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelAlias {
    pub facet: Facet,
    pub value: String,
    pub label: String,
}

impl LabelAlias {
    pub fn new(facet: Facet, value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            facet,
            value: value.into(),
            label: label.into(),
        }
    }
}

/// Spellings found in CCI data files that differ from the vocabulary labels.
const KNOWN_ALIASES: &[(Facet, &str, &str)] = &[
    (Facet::Frequency, "daily", "day"),
    (Facet::Institution, "DTU Space - Div. of Geodynamics", "DTU Space"),
    (Facet::Institution, "DTU Space - Div. of Geodynamics and NERSC", "DTU Space"),
    (Facet::Institution, "DTU Space - Microwaves and Remote Sensing", "DTU Space"),
    (
        Facet::Institution,
        "Deutsches Zentrum fuer Luft- und Raumfahrt (DLR)",
        "Deutsches Zentrum fuer Luft- und Raumfahrt",
    ),
    (Facet::Institution, "ESACCI", "ESACCI_SST"),
    (
        Facet::Institution,
        "Plymouth Marine Laboratory Remote Sensing Group",
        "Plymouth Marine Laboratory",
    ),
    (
        Facet::Institution,
        "Royal Netherlands Meteorological Institute (KNMI)",
        "Royal Netherlands Meteorological Institute",
    ),
    (
        Facet::Institution,
        "SRON Netherlands Institute for Space Research",
        "Netherlands Institute for Space Research",
    ),
    (Facet::Institution, "University of Leicester (UoL)", "University of Leicester"),
    (Facet::ProcessingLevel, "level-3", "l3"),
    (Facet::Platform, "ERS2", "ERS-2"),
    (Facet::Platform, "ENV", "ENVISAT"),
    (Facet::Platform, "EOS-AURA", "AURA"),
    (Facet::Platform, "MetOpA", "Metop-A"),
    (Facet::Platform, "Nimbus 7", "Nimbus-7"),
    (Facet::Platform, "orbview-2/seastar", "orbview-2"),
    (Facet::Platform, "SCISAT", "SCISAT-1"),
    (Facet::Sensor, "AMSR-E", "AMSRE"),
    (Facet::Sensor, "ATSR2", "ATSR-2"),
    (Facet::Sensor, "AVHRR GAC", "AVHRR"),
    (Facet::Sensor, "AVHRR_GAC", "AVHRR"),
    (Facet::Sensor, "AVHRR_HRPT", "AVHRR"),
    (Facet::Sensor, "AVHRR_LAC", "AVHRR"),
    (Facet::Sensor, "AVHRR_MERGED", "AVHRR"),
    (Facet::Sensor, "GFO", "GFO-RA"),
    (Facet::Sensor, "MERIS_FRS", "MERIS"),
    (Facet::Sensor, "MERIS_RR", "MERIS"),
    (Facet::Sensor, "MODIS_MERGED", "MODIS"),
    (Facet::Sensor, "RA2", "RA-2"),
    (Facet::Sensor, "SMR_544.6GHz", "SMR"),
];

/// The aliases applied when a configuration does not list its own.
pub fn known_aliases() -> Vec<LabelAlias> {
    KNOWN_ALIASES
        .iter()
        .map(|(facet, value, label)| LabelAlias::new(*facet, *value, *label))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    entries: Vec<OverrideMapping>,
    index: HashMap<(Facet, String), usize>,
    aliases: HashMap<(Facet, String), String>,
}

impl OverrideTable {
    pub fn new(mappings: Vec<OverrideMapping>) -> Result<Self, TaggerError> {
        let mut table = Self::default();
        for mapping in mappings {
            table.insert(mapping)?;
        }
        Ok(table)
    }

    fn insert(&mut self, mapping: OverrideMapping) -> Result<(), TaggerError> {
        let parsed = url::Url::parse(&mapping.uri).map_err(|e| {
            TaggerError::InvalidConfig(format!(
                "Override for {} \"{}\" has an invalid uri '{}': {}",
                mapping.facet, mapping.value, mapping.uri, e
            ))
        })?;
        let key = (mapping.facet, mapping.value.clone());
        if let Some(existing) = self.index.get(&key).map(|i| &self.entries[*i]) {
            if existing.uri != mapping.uri {
                return Err(TaggerError::InvalidConfig(format!(
                    "Conflicting overrides for {} \"{}\":\n\
                     - {}\n\
                     - {}",
                    mapping.facet, mapping.value, existing.uri, mapping.uri
                )));
            }
            return Ok(());
        }

        let mut mapping = mapping;
        if mapping.label.is_none() {
            mapping.label = Some(label_from_url(&parsed));
        }
        self.index.insert(key, self.entries.len());
        self.entries.push(mapping);
        Ok(())
    }

    pub fn with_aliases(mut self, aliases: &[LabelAlias]) -> Result<Self, TaggerError> {
        for alias in aliases {
            if alias.label.trim().is_empty() {
                return Err(TaggerError::InvalidConfig(format!(
                    "Alias for {} \"{}\" has an empty label",
                    alias.facet, alias.value
                )));
            }
            let key = (alias.facet, alias.value.clone());
            match self.aliases.get(&key) {
                Some(existing) if *existing != alias.label => {
                    return Err(TaggerError::InvalidConfig(format!(
                        "Conflicting aliases for {} \"{}\": \"{}\" and \"{}\"",
                        alias.facet, alias.value, existing, alias.label
                    )));
                }
                Some(_) => {}
                None => {
                    self.aliases.insert(key, alias.label.clone());
                }
            }
        }
        Ok(self)
    }

    /// The vocabulary label a raw value is known under, if it differs.
    pub fn alias(&self, facet: Facet, value: &str) -> Option<&str> {
        self.aliases
            .get(&(facet, value.to_string()))
            .map(String::as_str)
    }

    /// Exact-match lookup of a raw value.
    pub fn get(&self, facet: Facet, value: &str) -> Option<Term> {
        let mapping = &self.entries[*self.index.get(&(facet, value.to_string()))?];
        Some(Term {
            uri: mapping.uri.clone(),
            label: mapping.label.clone().unwrap_or_default(),
            source: TermSource::Override,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &OverrideMapping> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn label_from_url(url: &url::Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(|s| urlencoding::decode(s).map(|d| d.into_owned()).unwrap_or_else(|_| s.to_string()))
        .or_else(|| url.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping(facet: Facet, value: &str, uri: &str) -> OverrideMapping {
        OverrideMapping {
            facet,
            value: value.into(),
            uri: uri.into(),
            label: None,
        }
    }

    #[test]
    fn test_exact_match_and_default_label() {
        let table = OverrideTable::new(vec![mapping(
            Facet::Project,
            "cci",
            "http://vocab/project/cci",
        )])
        .unwrap();

        let term = table.get(Facet::Project, "cci").unwrap();
        assert_eq!(term.uri, "http://vocab/project/cci");
        assert_eq!(term.label, "cci");
        assert_eq!(term.source, TermSource::Override);

        assert!(table.get(Facet::Project, "CCI").is_none());
        assert!(table.get(Facet::Sensor, "cci").is_none());
    }

    #[test]
    fn test_rejects_bad_and_conflicting_entries() {
        assert!(OverrideTable::new(vec![mapping(Facet::Sensor, "RA2", "not a url")]).is_err());

        let result = OverrideTable::new(vec![
            mapping(Facet::Sensor, "RA2", "http://vocab/sensor/ra-2"),
            mapping(Facet::Sensor, "RA2", "http://vocab/sensor/ra"),
        ]);
        assert!(result.is_err());

        let table = OverrideTable::new(vec![
            mapping(Facet::Sensor, "RA2", "http://vocab/sensor/ra-2"),
            mapping(Facet::Sensor, "RA2", "http://vocab/sensor/ra-2"),
        ])
        .unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_aliases() {
        let table = OverrideTable::default().with_aliases(&known_aliases()).unwrap();
        assert_eq!(table.alias(Facet::Sensor, "MERIS_RR"), Some("MERIS"));
        assert_eq!(table.alias(Facet::Frequency, "daily"), Some("day"));
        assert_eq!(table.alias(Facet::Sensor, "daily"), None);
        assert!(table.is_empty());

        let result = OverrideTable::default().with_aliases(&[
            LabelAlias::new(Facet::Sensor, "RA2", "RA-2"),
            LabelAlias::new(Facet::Sensor, "RA2", "RA"),
        ]);
        assert!(result.is_err());
        assert!(OverrideTable::default()
            .with_aliases(&[LabelAlias::new(Facet::Sensor, "RA2", " ")])
            .is_err());
    }
}
