mod drs;
mod records;

pub use drs::{DrsIdentifier, DrsSchema};
pub use records::{Checksum, FileEntry, MappingRecord, TagRecord, NO_CHECKSUM};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TaggerError;

/// The classification dimensions a dataset can be tagged with.
///
/// Variant order is the order settled facets are kept in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    #[serde(alias = "ecv")]
    Project,
    Frequency,
    ProcessingLevel,
    DataType,
    Sensor,
    Platform,
    ProductString,
    ProductVersion,
    Institution,
    PlatformProgramme,
    PlatformGroup,
}

impl Facet {
    pub const ALL: [Facet; 11] = [
        Facet::Project,
        Facet::Frequency,
        Facet::ProcessingLevel,
        Facet::DataType,
        Facet::Sensor,
        Facet::Platform,
        Facet::ProductString,
        Facet::ProductVersion,
        Facet::Institution,
        Facet::PlatformProgramme,
        Facet::PlatformGroup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Facet::Project => "project",
            Facet::Frequency => "frequency",
            Facet::ProcessingLevel => "processing_level",
            Facet::DataType => "data_type",
            Facet::Sensor => "sensor",
            Facet::Platform => "platform",
            Facet::ProductString => "product_string",
            Facet::ProductVersion => "product_version",
            Facet::Institution => "institution",
            Facet::PlatformProgramme => "platform_programme",
            Facet::PlatformGroup => "platform_group",
        }
    }

    /// Facets backed by a controlled vocabulary. Anything else is used verbatim.
    pub fn is_controlled(&self) -> bool {
        !matches!(self, Facet::ProductVersion)
    }

    /// Whether the DRS component for this facet comes from the concept's
    /// alternative label (short code) rather than its preferred label.
    pub fn prefers_alt_label(&self) -> bool {
        matches!(
            self,
            Facet::Project | Facet::ProcessingLevel | Facet::DataType
        )
    }
}

impl fmt::Display for Facet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Facet {
    type Err = TaggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        if normalized == "ecv" {
            return Ok(Facet::Project);
        }
        Facet::ALL
            .iter()
            .find(|facet| facet.as_str() == normalized)
            .copied()
            .ok_or_else(|| TaggerError::InvalidConfig(format!("Unknown facet: {}", s)))
    }
}

/// A raw metadata statement as produced by a file-format reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

impl Triple {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

/// Raw facet values found in one file (or the union over a dataset).
///
/// Facets and their values keep the order they were first seen in and are
/// never duplicated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactSet {
    values: Vec<(Facet, Vec<String>)>,
}

impl FactSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, facet: Facet, value: impl Into<String>) {
        let value = value.into();
        let index = match self.values.iter().position(|(f, _)| *f == facet) {
            Some(index) => index,
            None => {
                self.values.push((facet, Vec::new()));
                self.values.len() - 1
            }
        };
        let values = &mut self.values[index].1;
        if !values.contains(&value) {
            values.push(value);
        }
    }

    pub fn with(mut self, facet: Facet, value: impl Into<String>) -> Self {
        self.insert(facet, value);
        self
    }

    pub fn get(&self, facet: Facet) -> &[String] {
        self.values
            .iter()
            .find(|(f, _)| *f == facet)
            .map(|(_, values)| values.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(|(_, values)| values.is_empty())
    }

    pub fn facets(&self) -> impl Iterator<Item = Facet> + '_ {
        self.values.iter().map(|(facet, _)| *facet)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Facet, &str)> + '_ {
        self.values
            .iter()
            .flat_map(|(facet, values)| values.iter().map(move |v| (*facet, v.as_str())))
    }

    pub fn union(&mut self, other: &FactSet) {
        for (facet, value) in other.iter() {
            self.insert(facet, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facet_parsing() {
        assert_eq!("ecv".parse::<Facet>().unwrap(), Facet::Project);
        assert_eq!("Processing-Level".parse::<Facet>().unwrap(), Facet::ProcessingLevel);
        assert!("colour".parse::<Facet>().is_err());

        let facet: Facet = serde_json::from_str("\"ecv\"").unwrap();
        assert_eq!(facet, Facet::Project);
        assert_eq!(serde_json::to_string(&Facet::DataType).unwrap(), "\"data_type\"");
    }

    #[test]
    fn test_fact_set_keeps_first_seen_order() {
        let mut facts = FactSet::new()
            .with(Facet::Sensor, "MERIS")
            .with(Facet::Sensor, "AATSR")
            .with(Facet::Sensor, "MERIS");
        facts.union(
            &FactSet::new()
                .with(Facet::Project, "CCI")
                .with(Facet::Sensor, "MODIS"),
        );

        assert_eq!(facts.get(Facet::Sensor), ["MERIS", "AATSR", "MODIS"]);
        assert_eq!(
            facts.facets().collect::<Vec<_>>(),
            vec![Facet::Sensor, Facet::Project]
        );
        let pairs: Vec<_> = facts.iter().collect();
        assert_eq!(
            pairs,
            vec![
                (Facet::Sensor, "MERIS"),
                (Facet::Sensor, "AATSR"),
                (Facet::Sensor, "MODIS"),
                (Facet::Project, "CCI")
            ]
        );
        assert!(FactSet::new().is_empty());
    }
}
