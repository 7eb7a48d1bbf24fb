use regex::{Captures, Regex};
use std::path::Path;

use crate::error::ExtractionError;
use crate::types::{Facet, FactSet};

/// Parses the two ESA CCI file naming conventions:
///
/// ```text
/// <date>[<time>]-ESACCI-<level>_<project>-<data type>-<product>[-...]-fv<version>.nc
/// ESACCI-<project>-<level>-<data type>-<product>[-...]-<date>[<time>]-fv<version>.nc
/// ```
#[derive(Debug, Clone)]
pub struct FileNameParser {
    date_first: Regex,
    project_first: Regex,
}

impl Default for FileNameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FileNameParser {
    pub fn new() -> Self {
        Self {
            date_first: Regex::new(
                r"^[^-]+-ESACCI-(?P<level>[^-_]+)_(?P<project>[^-]+)-(?P<data_type>[^-]+)-(?P<product>[^-]+)(?:-.*)?$",
            )
            .expect("valid file name pattern"),
            project_first: Regex::new(
                r"^ESACCI-(?P<project>[^-]+)-(?P<level>[^-]+)-(?P<data_type>[^-]+)-(?P<product>[^-]+)-.+$",
            )
            .expect("valid file name pattern"),
        }
    }

    pub fn parse(&self, path: &Path) -> Result<FactSet, ExtractionError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = name.rsplit_once('.').map(|(s, _)| s).unwrap_or(&name);

        let captures = self
            .date_first
            .captures(stem)
            .or_else(|| self.project_first.captures(stem))
            .ok_or_else(|| ExtractionError::InvalidFileName(name.clone()))?;

        Ok(facts_from(&captures))
    }
}

fn facts_from(captures: &Captures<'_>) -> FactSet {
    [
        (Facet::ProcessingLevel, "level"),
        (Facet::Project, "project"),
        (Facet::DataType, "data_type"),
        (Facet::ProductString, "product"),
    ]
    .into_iter()
    .fold(FactSet::new(), |facts, (facet, group)| {
        facts.with(facet, &captures[group])
    })
}
