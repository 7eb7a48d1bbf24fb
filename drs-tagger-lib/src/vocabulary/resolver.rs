use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Ambiguity, Concept, OverrideTable, Resolution, TermSource, VocabularyService};
use crate::error::VocabularyError;
use crate::types::Facet;

/// Run-scoped front for the vocabulary service.
///
/// Local overrides are consulted first and never reach the service. Every
/// answer, including failures, is cached for the lifetime of the resolver so a
/// raw value resolves the same way for the whole run.
pub struct VocabularyResolver {
    service: Arc<dyn VocabularyService>,
    overrides: OverrideTable,
    use_overrides: bool,
    cache: Mutex<HashMap<(Facet, String), Resolution>>,
    broader_cache: Mutex<HashMap<String, Result<Option<Concept>, VocabularyError>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic while holding the lock cannot leave a half-written entry behind.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl VocabularyResolver {
    pub fn new(
        service: Arc<dyn VocabularyService>,
        overrides: OverrideTable,
        use_overrides: bool,
    ) -> Self {
        Self {
            service,
            overrides,
            use_overrides,
            cache: Mutex::new(HashMap::new()),
            broader_cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn uses_overrides(&self) -> bool {
        self.use_overrides
    }

    pub fn resolve(&self, facet: Facet, raw: &str) -> Resolution {
        let mut raw = raw;
        if self.use_overrides {
            if let Some(term) = self.overrides.get(facet, raw) {
                return Resolution::Canonical(term);
            }
            if let Some(label) = self.overrides.alias(facet, raw) {
                tracing::debug!("{} \"{}\" is looked up as \"{}\"", facet, raw, label);
                raw = label;
            }
        }

        let key = (facet, raw.to_string());
        if let Some(hit) = lock(&self.cache).get(&key) {
            return hit.clone();
        }

        // Lookups are pure, so two workers racing on the same key compute the
        // same answer and the second insert is a no-op.
        let resolution = self.query(facet, raw);
        lock(&self.cache)
            .entry(key)
            .or_insert(resolution)
            .clone()
    }

    fn query(&self, facet: Facet, raw: &str) -> Resolution {
        tracing::debug!("Looking up {} \"{}\" in the vocabulary service", facet, raw);
        match self.service.lookup(facet, raw) {
            Ok(concepts) => {
                let mut unique: Vec<Concept> = Vec::new();
                for concept in concepts {
                    if !unique.iter().any(|c| c.uri == concept.uri) {
                        unique.push(concept);
                    }
                }
                match unique.len() {
                    0 => Resolution::Unmapped,
                    1 => {
                        let concept = unique.remove(0);
                        Resolution::Canonical(concept.into_term(facet, TermSource::Service))
                    }
                    _ => Resolution::Ambiguous(Ambiguity::Candidates(
                        unique.into_iter().map(|c| c.uri).collect(),
                    )),
                }
            }
            Err(e) => {
                tracing::warn!("Vocabulary lookup for {} \"{}\" failed: {}", facet, raw, e);
                Resolution::Ambiguous(Ambiguity::Unavailable(e))
            }
        }
    }

    /// Broader concepts of `uri`, nearest first, up to `depth` levels.
    pub fn broader_chain(
        &self,
        uri: &str,
        depth: usize,
    ) -> Result<Vec<Concept>, VocabularyError> {
        let mut chain = Vec::new();
        let mut current = uri.to_string();
        for _ in 0..depth {
            match self.broader(&current)? {
                Some(concept) => {
                    current = concept.uri.clone();
                    chain.push(concept);
                }
                None => break,
            }
        }
        Ok(chain)
    }

    fn broader(&self, uri: &str) -> Result<Option<Concept>, VocabularyError> {
        if let Some(hit) = lock(&self.broader_cache).get(uri) {
            return hit.clone();
        }
        let answer = self.service.broader(uri);
        lock(&self.broader_cache)
            .entry(uri.to_string())
            .or_insert(answer)
            .clone()
    }

    /// The configured overrides as (facet, raw value, uri). Never touches the service.
    pub fn list_mappings(&self) -> Vec<(Facet, String, String)> {
        list_mappings(&self.overrides)
    }
}

pub(crate) fn list_mappings(overrides: &OverrideTable) -> Vec<(Facet, String, String)> {
    overrides
        .iter()
        .map(|m| (m.facet, m.value.clone(), m.uri.clone()))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::vocabulary::{known_aliases, OverrideMapping, Term};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory service that counts how often it is asked.
    #[derive(Default)]
    pub(crate) struct CountingService {
        pub concepts: HashMap<(Facet, String), Vec<Concept>>,
        pub broader: HashMap<String, Concept>,
        pub unavailable: bool,
        pub calls: AtomicUsize,
    }

    impl CountingService {
        pub(crate) fn with(mut self, facet: Facet, label: &str, concept: Concept) -> Self {
            self.concepts
                .entry((facet, label.to_lowercase()))
                .or_default()
                .push(concept);
            self
        }
    }

    impl VocabularyService for CountingService {
        fn lookup(&self, facet: Facet, label: &str) -> Result<Vec<Concept>, VocabularyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.unavailable {
                return Err(VocabularyError::Timeout(30));
            }
            Ok(self
                .concepts
                .get(&(facet, label.to_lowercase()))
                .cloned()
                .unwrap_or_default())
        }

        fn broader(&self, uri: &str) -> Result<Option<Concept>, VocabularyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.broader.get(uri).cloned())
        }
    }

    fn overrides() -> OverrideTable {
        OverrideTable::new(vec![OverrideMapping {
            facet: Facet::Project,
            value: "CCI".into(),
            uri: "http://vocab/project/override".into(),
            label: Some("OVR".into()),
        }])
        .unwrap()
    }

    #[test]
    fn test_override_wins_without_calling_service() {
        let service = Arc::new(CountingService::default().with(
            Facet::Project,
            "CCI",
            Concept::new("http://vocab/project/service", "CCI"),
        ));
        let resolver = VocabularyResolver::new(service.clone(), overrides(), true);

        let resolution = resolver.resolve(Facet::Project, "CCI");
        assert_eq!(
            resolution,
            Resolution::Canonical(Term {
                uri: "http://vocab/project/override".into(),
                label: "OVR".into(),
                source: TermSource::Override,
            })
        );
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);

        let resolver = VocabularyResolver::new(service.clone(), overrides(), false);
        let term = resolver.resolve(Facet::Project, "CCI");
        assert_eq!(term.term().unwrap().uri, "http://vocab/project/service");
    }

    #[test]
    fn test_results_are_cached() {
        let service = Arc::new(CountingService::default().with(
            Facet::DataType,
            "chla",
            Concept::new("http://vocab/dataType/chla", "chlorophyll-a").with_alt_label("CHLA"),
        ));
        let resolver = VocabularyResolver::new(service.clone(), OverrideTable::default(), true);

        let first = resolver.resolve(Facet::DataType, "CHLA");
        let second = resolver.resolve(Facet::DataType, "CHLA");
        assert_eq!(first, second);
        assert_eq!(first.term().unwrap().label, "CHLA");
        assert_eq!(resolver.resolve(Facet::DataType, "nope"), Resolution::Unmapped);
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unavailable_and_multiple_matches_are_ambiguous() {
        let service = Arc::new(CountingService {
            unavailable: true,
            ..CountingService::default()
        });
        let resolver = VocabularyResolver::new(service, OverrideTable::default(), true);
        assert!(matches!(
            resolver.resolve(Facet::Sensor, "MERIS"),
            Resolution::Ambiguous(Ambiguity::Unavailable(VocabularyError::Timeout(30)))
        ));

        let service = Arc::new(
            CountingService::default()
                .with(Facet::Sensor, "ra", Concept::new("http://vocab/sensor/1", "RA"))
                .with(Facet::Sensor, "ra", Concept::new("http://vocab/sensor/2", "RA")),
        );
        let resolver = VocabularyResolver::new(service, OverrideTable::default(), true);
        assert_eq!(
            resolver.resolve(Facet::Sensor, "RA"),
            Resolution::Ambiguous(Ambiguity::Candidates(vec![
                "http://vocab/sensor/1".into(),
                "http://vocab/sensor/2".into()
            ]))
        );
    }

    #[test]
    fn test_broader_chain_and_listing() {
        let mut service = CountingService::default();
        service.broader.insert(
            "http://vocab/platform/envisat".into(),
            Concept::new("http://vocab/prog/esa", "ESA"),
        );
        service.broader.insert(
            "http://vocab/prog/esa".into(),
            Concept::new("http://vocab/group/sat", "Satellites"),
        );
        let service = Arc::new(service);
        let resolver = VocabularyResolver::new(service.clone(), overrides(), true);

        let chain = resolver
            .broader_chain("http://vocab/platform/envisat", 2)
            .unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain[1].uri, "http://vocab/group/sat");
        resolver
            .broader_chain("http://vocab/platform/envisat", 2)
            .unwrap();
        assert_eq!(service.calls.load(Ordering::SeqCst), 2);

        assert_eq!(
            resolver.list_mappings(),
            vec![(
                Facet::Project,
                "CCI".to_string(),
                "http://vocab/project/override".to_string()
            )]
        );
    }

    #[test]
    fn test_alias_is_looked_up_under_vocabulary_label() {
        let service = Arc::new(CountingService::default().with(
            Facet::Sensor,
            "MERIS",
            Concept::new("http://vocab/sensor/meris", "MERIS"),
        ));
        let table = OverrideTable::default().with_aliases(&known_aliases()).unwrap();
        let resolver = VocabularyResolver::new(service.clone(), table.clone(), true);

        let term = resolver.resolve(Facet::Sensor, "MERIS_RR");
        assert_eq!(term.term().unwrap().uri, "http://vocab/sensor/meris");
        assert_eq!(term.term().unwrap().source, TermSource::Service);
        resolver.resolve(Facet::Sensor, "MERIS_FRS");
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);

        let resolver = VocabularyResolver::new(service, table, false);
        assert_eq!(resolver.resolve(Facet::Sensor, "MERIS_RR"), Resolution::Unmapped);
    }
}
