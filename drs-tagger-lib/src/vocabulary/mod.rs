mod mapping;
mod resolver;
mod sparql;
mod store;

pub use mapping::{known_aliases, LabelAlias, OverrideMapping, OverrideTable, Pin};
pub(crate) use resolver::list_mappings;
pub use resolver::VocabularyResolver;
pub use sparql::SparqlVocabulary;
pub use store::SkosFileVocabulary;

use serde::{Deserialize, Serialize};

use crate::error::VocabularyError;
use crate::types::Facet;

/// A SKOS concept as answered by the vocabulary service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub uri: String,
    #[serde(rename = "prefLabel")]
    pub pref_label: String,
    #[serde(default, rename = "altLabel", skip_serializing_if = "Option::is_none")]
    pub alt_label: Option<String>,
}

impl Concept {
    pub fn new(uri: impl Into<String>, pref_label: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            pref_label: pref_label.into(),
            alt_label: None,
        }
    }

    pub fn with_alt_label(mut self, alt_label: impl Into<String>) -> Self {
        self.alt_label = Some(alt_label.into());
        self
    }

    pub fn into_term(self, facet: Facet, source: TermSource) -> Term {
        let label = match self.alt_label {
            Some(alt) if facet.prefers_alt_label() && !alt.is_empty() => alt,
            _ => self.pref_label,
        };
        Term {
            uri: self.uri,
            label,
            source,
        }
    }
}

/// The controlled-vocabulary service the tagger resolves facet values against.
///
/// Implementations are blocking; callers run them off the async executor.
pub trait VocabularyService: Send + Sync {
    /// Concepts in the facet's scheme whose preferred or alternative label
    /// matches `label`, ignoring case.
    fn lookup(&self, facet: Facet, label: &str) -> Result<Vec<Concept>, VocabularyError>;

    /// The concept one level up the hierarchy from `uri`, if any.
    fn broader(&self, uri: &str) -> Result<Option<Concept>, VocabularyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermSource {
    Override,
    Service,
}

/// A canonical vocabulary term plus the label used for its DRS component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    pub uri: String,
    pub label: String,
    pub source: TermSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Canonical(Term),
    Unmapped,
    /// More than one concept matched, or the service could not answer.
    Ambiguous(Ambiguity),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ambiguity {
    Candidates(Vec<String>),
    Unavailable(VocabularyError),
}

impl Resolution {
    pub fn term(&self) -> Option<&Term> {
        match self {
            Resolution::Canonical(term) => Some(term),
            _ => None,
        }
    }
}
