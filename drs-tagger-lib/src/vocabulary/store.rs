use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use super::{Concept, VocabularyService};
use crate::error::{TaggerError, VocabularyError};
use crate::types::Facet;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemeExport {
    schemes: BTreeMap<Facet, Vec<ExportedConcept>>,
}

#[derive(Debug, Deserialize)]
struct ExportedConcept {
    #[serde(flatten)]
    concept: Concept,
    #[serde(default)]
    broader: Option<String>,
}

/// Vocabulary answered from a JSON export of the concept schemes.
///
/// ```json
/// { "schemes": { "platform": [
///     { "uri": "...", "prefLabel": "Envisat", "altLabel": "ENV", "broader": "..." }
/// ] } }
/// ```
#[derive(Debug, Default)]
pub struct SkosFileVocabulary {
    labels: HashMap<(Facet, String), Vec<String>>,
    concepts: HashMap<String, Concept>,
    broader: HashMap<String, String>,
}

impl SkosFileVocabulary {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TaggerError> {
        let path = path.as_ref();
        tracing::info!("Loading vocabulary export from {}", path.display());
        let file = std::fs::File::open(path)?;
        let export: SchemeExport = serde_json::from_reader(std::io::BufReader::new(file))?;
        let vocabulary = Self::from_export(export);
        tracing::info!("Loaded {} concepts", vocabulary.concepts.len());
        Ok(vocabulary)
    }

    pub fn from_json(json: &str) -> Result<Self, TaggerError> {
        Ok(Self::from_export(serde_json::from_str(json)?))
    }

    fn from_export(export: SchemeExport) -> Self {
        let mut vocabulary = Self::default();
        for (facet, concepts) in export.schemes {
            for exported in concepts {
                if let Some(broader) = exported.broader {
                    vocabulary
                        .broader
                        .insert(exported.concept.uri.clone(), broader);
                }
                vocabulary.add(facet, exported.concept);
            }
        }
        vocabulary
    }

    pub fn add(&mut self, facet: Facet, concept: Concept) {
        let labels = std::iter::once(&concept.pref_label).chain(concept.alt_label.as_ref());
        for label in labels {
            let uris = self
                .labels
                .entry((facet, label.to_lowercase()))
                .or_default();
            if !uris.contains(&concept.uri) {
                uris.push(concept.uri.clone());
            }
        }
        self.concepts.insert(concept.uri.clone(), concept);
    }

    pub fn with_concept(mut self, facet: Facet, concept: Concept) -> Self {
        self.add(facet, concept);
        self
    }

    pub fn with_broader(mut self, uri: impl Into<String>, broader: impl Into<String>) -> Self {
        self.broader.insert(uri.into(), broader.into());
        self
    }
}

impl VocabularyService for SkosFileVocabulary {
    fn lookup(&self, facet: Facet, label: &str) -> Result<Vec<Concept>, VocabularyError> {
        let uris = match self.labels.get(&(facet, label.trim().to_lowercase())) {
            Some(uris) => uris,
            None => return Ok(Vec::new()),
        };
        Ok(uris
            .iter()
            .filter_map(|uri| self.concepts.get(uri).cloned())
            .collect())
    }

    fn broader(&self, uri: &str) -> Result<Option<Concept>, VocabularyError> {
        Ok(self
            .broader
            .get(uri)
            .and_then(|parent| self.concepts.get(parent))
            .cloned())
    }
}
