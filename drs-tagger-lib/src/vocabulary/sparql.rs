use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use tokio::runtime::Handle;

use super::{Concept, VocabularyService};
use crate::error::{TaggerError, VocabularyError};
use crate::types::Facet;

const SKOS_PREFIX: &str = "PREFIX skos: <http://www.w3.org/2004/02/skos/core#>";

#[derive(Debug, Deserialize)]
struct SparqlResults {
    results: SparqlBindings,
}

#[derive(Debug, Deserialize)]
struct SparqlBindings {
    bindings: Vec<Binding>,
}

#[derive(Debug, Deserialize)]
struct Binding {
    concept: BoundValue,
    pref: BoundValue,
    #[serde(default)]
    alt: Option<BoundValue>,
}

#[derive(Debug, Deserialize)]
struct BoundValue {
    value: String,
}

/// Vocabulary answered by a SPARQL endpoint over SKOS concept schemes.
///
/// Lookups block on the runtime handle captured at construction, so they must
/// be made from a blocking thread (`spawn_blocking`), never from async code.
pub struct SparqlVocabulary {
    client: Client,
    endpoint: String,
    schemes: BTreeMap<Facet, String>,
    timeout: Duration,
    handle: Handle,
}

impl SparqlVocabulary {
    pub fn new(
        endpoint: impl Into<String>,
        schemes: BTreeMap<Facet, String>,
        timeout: Duration,
    ) -> Result<Self, TaggerError> {
        let handle = Handle::try_current().map_err(|e| {
            TaggerError::InvalidConfig(format!("SPARQL vocabulary needs a tokio runtime: {}", e))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/sparql-results+json"),
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                TaggerError::InvalidConfig(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            schemes,
            timeout,
            handle,
        })
    }

    fn request_error(&self, error: reqwest::Error) -> VocabularyError {
        if error.is_timeout() {
            VocabularyError::Timeout(self.timeout.as_secs())
        } else {
            VocabularyError::Unavailable(error.to_string())
        }
    }

    fn run(&self, query: String) -> Result<Vec<Concept>, VocabularyError> {
        let url = format!("{}?query={}", self.endpoint, urlencoding::encode(&query));
        let request = async {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| self.request_error(e))?;
            response
                .json::<SparqlResults>()
                .await
                .map_err(|e| VocabularyError::Unavailable(format!("bad SPARQL response: {}", e)))
        };

        let results = self
            .handle
            .block_on(async { tokio::time::timeout(self.timeout, request).await })
            .map_err(|_| VocabularyError::Timeout(self.timeout.as_secs()))??;
        Ok(parse_bindings(results))
    }
}

fn parse_bindings(results: SparqlResults) -> Vec<Concept> {
    let mut concepts: Vec<Concept> = Vec::new();
    for binding in results.results.bindings {
        let alt = binding.alt.map(|a| a.value);
        match concepts.iter_mut().find(|c| c.uri == binding.concept.value) {
            Some(existing) => {
                if existing.alt_label.is_none() {
                    existing.alt_label = alt;
                }
            }
            None => concepts.push(Concept {
                uri: binding.concept.value,
                pref_label: binding.pref.value,
                alt_label: alt,
            }),
        }
    }
    concepts
}

fn escape_literal(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn label_query(scheme: &str, label: &str) -> String {
    let label = escape_literal(&label.trim().to_lowercase());
    format!(
        "{} SELECT DISTINCT ?concept ?pref ?alt WHERE {{ \
         ?concept skos:inScheme <{}> ; skos:prefLabel ?pref . \
         OPTIONAL {{ ?concept skos:altLabel ?alt }} \
         FILTER (LCASE(STR(?pref)) = \"{}\" || LCASE(STR(?alt)) = \"{}\") }}",
        SKOS_PREFIX, scheme, label, label
    )
}

fn broader_query(uri: &str) -> String {
    format!(
        "{} SELECT ?concept ?pref ?alt WHERE {{ \
         ?concept skos:narrower <{}> ; skos:prefLabel ?pref . \
         OPTIONAL {{ ?concept skos:altLabel ?alt }} }}",
        SKOS_PREFIX, uri
    )
}

impl VocabularyService for SparqlVocabulary {
    fn lookup(&self, facet: Facet, label: &str) -> Result<Vec<Concept>, VocabularyError> {
        let scheme = self
            .schemes
            .get(&facet)
            .ok_or(VocabularyError::UnknownScheme(facet))?;
        self.run(label_query(scheme, label))
    }

    fn broader(&self, uri: &str) -> Result<Option<Concept>, VocabularyError> {
        Ok(self.run(broader_query(uri))?.into_iter().next())
    }
}
