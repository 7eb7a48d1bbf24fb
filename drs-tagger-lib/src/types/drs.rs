use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::Facet;
use crate::error::TaggerError;

/// Facet layout of a DRS identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DrsSchema {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_facets")]
    pub facets: Vec<Facet>,
    /// Facets allowed to carry several terms, with the label used in their place.
    #[serde(default, rename = "multiValued")]
    pub multi_valued: BTreeMap<Facet, String>,
}

fn default_prefix() -> String {
    "esacci".to_string()
}

fn default_facets() -> Vec<Facet> {
    vec![
        Facet::Project,
        Facet::Frequency,
        Facet::ProcessingLevel,
        Facet::DataType,
        Facet::Sensor,
        Facet::Platform,
        Facet::ProductString,
        Facet::ProductVersion,
    ]
}

impl Default for DrsSchema {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            facets: default_facets(),
            multi_valued: BTreeMap::new(),
        }
    }
}

impl DrsSchema {
    pub fn validate(&self) -> Result<(), TaggerError> {
        if self.prefix.is_empty() || self.prefix.contains('.') {
            return Err(TaggerError::InvalidConfig(format!(
                "DRS prefix must be non-empty and contain no '.': {:?}",
                self.prefix
            )));
        }
        if self.facets.is_empty() {
            return Err(TaggerError::InvalidConfig(
                "DRS schema must list at least one facet".into(),
            ));
        }
        let mut seen = Vec::new();
        for facet in &self.facets {
            if seen.contains(facet) {
                return Err(TaggerError::InvalidConfig(format!(
                    "Facet '{}' appears twice in the DRS schema",
                    facet
                )));
            }
            seen.push(*facet);
        }
        Ok(())
    }

    pub fn requires(&self, facet: Facet) -> bool {
        self.facets.contains(&facet)
    }

    pub fn multi_label(&self, facet: Facet) -> Option<&str> {
        self.multi_valued.get(&facet).map(String::as_str)
    }
}

/// A built DRS identifier: `prefix.term1.term2...[.rN]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DrsIdentifier {
    prefix: String,
    terms: Vec<String>,
    realization: Option<u32>,
}

impl DrsIdentifier {
    pub fn new(prefix: impl Into<String>, terms: Vec<String>) -> Self {
        Self {
            prefix: prefix.into(),
            terms,
            realization: None,
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn realization(&self) -> Option<u32> {
        self.realization
    }

    pub fn with_realization(mut self, realization: u32) -> Self {
        self.realization = Some(realization);
        self
    }

    /// The identifier without its realization suffix.
    pub fn base(&self) -> String {
        std::iter::once(self.prefix.as_str())
            .chain(self.terms.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for DrsIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base())?;
        if let Some(realization) = self.realization {
            write!(f, ".r{}", realization)?;
        }
        Ok(())
    }
}

impl Serialize for DrsIdentifier {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
