mod attributes;
mod cdl;
mod file_name;

pub use attributes::AttributeSplitter;
pub use cdl::{CdlHeaderReader, HeaderSource};
pub use file_name::FileNameParser;

use std::path::Path;

use crate::error::ExtractionError;
use crate::types::{Facet, FactSet, Triple};

/// Subject used for file-level (global) attributes.
pub const GLOBAL_SUBJECT: &str = "global";

/// A file-format reader: file -> (subject, predicate, object) statements.
pub trait TripleSource: Send + Sync {
    fn read_triples(&self, path: &Path) -> Result<Vec<Triple>, ExtractionError>;
}

/// Facts of one file plus the problems worth reporting that did not stop
/// the extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub facts: FactSet,
    pub warnings: Vec<String>,
}

/// Produces the typed facts of a single data file. Must not modify the file.
pub trait FactExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<FactSet, ExtractionError>;

    fn inspect(&self, path: &Path) -> Result<Extraction, ExtractionError> {
        Ok(Extraction {
            facts: self.extract(path)?,
            warnings: Vec::new(),
        })
    }
}

/// Facts from the CCI file name plus the global attributes of the file header.
pub struct EsacciExtractor<S> {
    names: FileNameParser,
    attributes: S,
    splitter: AttributeSplitter,
}

impl<S: TripleSource> EsacciExtractor<S> {
    pub fn new(attributes: S, corrections: bool) -> Self {
        Self {
            names: FileNameParser::new(),
            attributes,
            splitter: AttributeSplitter::new(corrections),
        }
    }
}

/// The global attributes that carry facet values.
fn attribute_facet(name: &str) -> Option<Facet> {
    match name.to_lowercase().as_str() {
        "frequency" => Some(Facet::Frequency),
        "institution" => Some(Facet::Institution),
        "platform" => Some(Facet::Platform),
        "sensor" => Some(Facet::Sensor),
        "product_version" => Some(Facet::ProductVersion),
        _ => None,
    }
}

impl<S: TripleSource> FactExtractor for EsacciExtractor<S> {
    fn extract(&self, path: &Path) -> Result<FactSet, ExtractionError> {
        self.inspect(path).map(|extraction| extraction.facts)
    }

    fn inspect(&self, path: &Path) -> Result<Extraction, ExtractionError> {
        let mut facts = self.names.parse(path)?;
        let mut warnings = Vec::new();

        for triple in self.attributes.read_triples(path)? {
            if triple.subject != GLOBAL_SUBJECT {
                if triple.predicate.eq_ignore_ascii_case("long_name")
                    && triple.object.is_empty()
                {
                    warnings.push(format!(
                        "long_name value has zero length for variable {}",
                        triple.subject
                    ));
                }
                continue;
            }
            let Some(facet) = attribute_facet(&triple.predicate) else {
                continue;
            };
            if facet.is_controlled() {
                for value in self.splitter.split(facet, &triple.object) {
                    facts.insert(facet, value);
                }
            } else {
                let value = triple.object.trim();
                if !value.is_empty() {
                    facts.insert(facet, value);
                }
            }
        }

        tracing::debug!("Extracted {:?} from {}", facts, path.display());
        Ok(Extraction { facts, warnings })
    }
}
