use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::TaggerError;
use crate::extract::{CdlHeaderReader, EsacciExtractor, FactExtractor, HeaderSource};
use crate::types::{DrsSchema, Facet};
use crate::vocabulary::{
    known_aliases, LabelAlias, OverrideMapping, OverrideTable, Pin, SkosFileVocabulary,
    SparqlVocabulary, VocabularyResolver, VocabularyService,
};

/// Where vocabulary lookups are answered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VocabularySource {
    /// JSON export of the concept schemes.
    File(PathBuf),
    Sparql(SparqlSettings),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SparqlSettings {
    pub endpoint: String,
    /// Concept scheme URL per facet.
    pub schemes: BTreeMap<Facet, String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_file_extension() -> String {
    "nc".to_string()
}

fn default_workers() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaggerConfig {
    pub vocabulary: VocabularySource,
    #[serde(default)]
    pub drs: DrsSchema,
    #[serde(default)]
    pub overrides: Vec<OverrideMapping>,
    /// Raw values looked up under another vocabulary label. Replaces the
    /// known CCI spellings when given.
    #[serde(default = "known_aliases")]
    pub aliases: Vec<LabelAlias>,
    /// Apply local overrides, pins and attribute corrections.
    #[serde(default = "default_true")]
    pub use_overrides: bool,
    #[serde(default)]
    pub pins: Vec<Pin>,
    /// CSV of previously issued DRS identifiers, read and written back.
    #[serde(default)]
    pub registry: Option<PathBuf>,
    #[serde(default = "default_file_extension")]
    pub file_extension: String,
    /// Files read per dataset; 0 means all.
    #[serde(default)]
    pub file_count: usize,
    #[serde(default = "default_true")]
    pub checksums: bool,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub header: HeaderSource,
    /// Directory relative paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl TaggerConfig {
    /// A configuration with every optional section at its default.
    pub fn new(vocabulary: VocabularySource) -> Self {
        Self {
            vocabulary,
            drs: DrsSchema::default(),
            overrides: Vec::new(),
            aliases: known_aliases(),
            use_overrides: true,
            pins: Vec::new(),
            registry: None,
            file_extension: default_file_extension(),
            file_count: 0,
            checksums: true,
            workers: default_workers(),
            header: HeaderSource::default(),
            base_dir: PathBuf::new(),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TaggerError> {
        let path = path.as_ref();
        tracing::info!("Loading configuration from {}", path.display());
        let file = std::fs::File::open(path).map_err(|e| {
            TaggerError::InvalidConfig(format!("Unable to open {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_reader(BufReader::new(file))?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        tracing::info!("Successfully loaded configuration: {}", path.display());
        Ok(config)
    }

    /// Parse JSON, allowing `//` and `/* */` comments.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TaggerError> {
        let stripped = json_comments::StripComments::new(reader);
        serde_json::from_reader(stripped)
            .map_err(|e| TaggerError::InvalidConfig(format!("Unable to parse configuration: {}", e)))
    }

    pub fn validate(&mut self) -> Result<(), TaggerError> {
        tracing::info!("Validating configuration...");
        self.drs.validate()?;

        if self.workers == 0 {
            return Err(TaggerError::InvalidConfig(
                "workers must be at least 1".into(),
            ));
        }

        let extension = self.file_extension.trim().trim_start_matches('.');
        if extension.is_empty() {
            return Err(TaggerError::InvalidConfig(
                "fileExtension must not be empty".into(),
            ));
        }
        self.file_extension = extension.to_string();

        if let VocabularySource::Sparql(sparql) = &self.vocabulary {
            parse_url("vocabulary endpoint", &sparql.endpoint)?;
            for (facet, scheme) in &sparql.schemes {
                parse_url(&format!("{} scheme", facet), scheme)?;
            }
            if sparql.timeout_secs == 0 {
                return Err(TaggerError::InvalidConfig(
                    "timeoutSecs must be at least 1".into(),
                ));
            }
        }

        for pin in &self.pins {
            parse_url(&format!("{} pin", pin.facet), &pin.uri)?;
        }
        // Builds the table once to surface bad or contradictory overrides early.
        self.override_table()?;

        tracing::info!("Configuration validation successful");
        Ok(())
    }

    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        self.base_dir.join(path)
    }

    pub fn registry_path(&self) -> Option<PathBuf> {
        self.registry.as_deref().map(|p| self.resolve_path(p))
    }

    pub fn override_table(&self) -> Result<OverrideTable, TaggerError> {
        OverrideTable::new(self.overrides.clone())?.with_aliases(&self.aliases)
    }

    /// The vocabulary service. A SPARQL service must be built inside a tokio runtime.
    pub fn build_service(&self) -> Result<Arc<dyn VocabularyService>, TaggerError> {
        Ok(match &self.vocabulary {
            VocabularySource::File(path) => {
                Arc::new(SkosFileVocabulary::from_file(self.resolve_path(path))?)
            }
            VocabularySource::Sparql(sparql) => {
                tracing::info!("Using SPARQL vocabulary at {}", sparql.endpoint);
                Arc::new(SparqlVocabulary::new(
                    sparql.endpoint.clone(),
                    sparql.schemes.clone(),
                    Duration::from_secs(sparql.timeout_secs),
                )?)
            }
        })
    }

    pub fn build_resolver(&self) -> Result<VocabularyResolver, TaggerError> {
        Ok(VocabularyResolver::new(
            self.build_service()?,
            self.override_table()?,
            self.use_overrides,
        ))
    }

    pub fn build_extractor(&self) -> Arc<dyn FactExtractor> {
        let header = match &self.header {
            HeaderSource::Ncdump(program) if program.components().count() > 1 => {
                HeaderSource::Ncdump(self.resolve_path(program))
            }
            other => other.clone(),
        };
        Arc::new(EsacciExtractor::new(
            CdlHeaderReader::new(header),
            self.use_overrides,
        ))
    }
}

fn parse_url(what: &str, value: &str) -> Result<url::Url, TaggerError> {
    url::Url::parse(value)
        .map_err(|e| TaggerError::InvalidConfig(format!("Invalid {} URL '{}': {}", what, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        // answered from a local export
        "vocabulary": { "file": "vocab/cci.json" },
        "drs": { "facets": ["ecv", "frequency", "product_version"] },
        "overrides": [
            { "facet": "project", "value": "cci", "uri": "http://vocab/project/cci" }
        ],
        /* keep all files */
        "fileExtension": ".NC",
        "workers": 4,
        "header": { "ncdump": "ncdump" }
    }"#;

    #[test]
    fn test_parse_with_comments_and_defaults() {
        let mut config = TaggerConfig::from_reader(CONFIG.as_bytes()).unwrap();
        config.validate().unwrap();

        assert_eq!(config.vocabulary, VocabularySource::File("vocab/cci.json".into()));
        assert_eq!(config.drs.facets[0], Facet::Project);
        assert_eq!(config.drs.prefix, "esacci");
        assert_eq!(config.file_extension, "NC");
        assert_eq!(config.workers, 4);
        assert!(config.use_overrides);
        assert!(config.checksums);
        assert_eq!(config.file_count, 0);
        assert_eq!(config.header, HeaderSource::Ncdump("ncdump".into()));
        assert_eq!(config.override_table().unwrap().len(), 1);
        assert_eq!(config.aliases, known_aliases());
        assert_eq!(
            config.override_table().unwrap().alias(Facet::Platform, "ENV"),
            Some("ENVISAT")
        );
    }

    #[test]
    fn test_explicit_aliases_replace_known_ones() {
        let mut config = TaggerConfig::from_reader(
            r#"{ "vocabulary": { "file": "v.json" },
                 "aliases": [{ "facet": "sensor", "value": "MERIS_4RP", "label": "MERIS" }] }"#
                .as_bytes(),
        )
        .unwrap();
        config.validate().unwrap();
        let table = config.override_table().unwrap();
        assert_eq!(table.alias(Facet::Sensor, "MERIS_4RP"), Some("MERIS"));
        assert_eq!(table.alias(Facet::Sensor, "MERIS_RR"), None);

        config.aliases.push(LabelAlias::new(Facet::Sensor, "MERIS_4RP", "AATSR"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_relative_paths_follow_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tagger.json");
        std::fs::write(
            &path,
            r#"{ "vocabulary": { "file": "vocab.json" }, "registry": "drs_registry.csv" }"#,
        )
        .unwrap();

        let config = TaggerConfig::from_file(&path).unwrap();
        assert_eq!(config.registry_path(), Some(dir.path().join("drs_registry.csv")));
        assert_eq!(
            config.resolve_path(Path::new("vocab.json")),
            dir.path().join("vocab.json")
        );
    }

    #[test]
    fn test_sparql_section() {
        let mut config = TaggerConfig::from_reader(
            r#"{ "vocabulary": { "sparql": {
                "endpoint": "http://vocab.ceda.ac.uk/sparql",
                "schemes": { "platform": "http://vocab.ceda.ac.uk/scheme/cci/platform" }
            } } }"#
                .as_bytes(),
        )
        .unwrap();
        config.validate().unwrap();
        match config.vocabulary {
            VocabularySource::Sparql(sparql) => {
                assert_eq!(sparql.timeout_secs, 30);
                assert_eq!(sparql.schemes.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invalid_configurations() {
        let unknown = TaggerConfig::from_reader(
            r#"{ "vocabulary": { "file": "v.json" }, "colour": "blue" }"#.as_bytes(),
        );
        assert!(matches!(unknown, Err(TaggerError::InvalidConfig(_))));

        let mut config = TaggerConfig::new(VocabularySource::File("v.json".into()));
        config.workers = 0;
        assert!(config.validate().is_err());

        let mut config = TaggerConfig::new(VocabularySource::File("v.json".into()));
        config.pins.push(Pin {
            facet: Facet::Sensor,
            uri: "not a url".into(),
        });
        assert!(config.validate().is_err());

        let mut config = TaggerConfig::new(VocabularySource::Sparql(SparqlSettings {
            endpoint: "http://vocab/sparql".into(),
            schemes: BTreeMap::new(),
            timeout_secs: 0,
        }));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            TaggerConfig::from_file(dir.path().join("absent.json")),
            Err(TaggerError::InvalidConfig(_))
        ));
    }
}
