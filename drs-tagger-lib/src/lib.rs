//! CCI Dataset DRS Tagger Library
//!
//! This library derives Data Reference Syntax identifiers and vocabulary tags
//! for directories of climate data files, based on the facets found in their
//! file names and global attributes.

mod checksum;
mod config;
mod coordinator;
mod error;
mod extract;
mod mapper;
mod output;
mod tagger;
mod types;
mod utils;
mod vocabulary;

pub use checksum::{ChecksumProvider, Sha256Checksum};
pub use config::{SparqlSettings, TaggerConfig, VocabularySource};
pub use coordinator::{load_dataset_list, DrsRegistry, RunCoordinator, RunReport, RunState};
pub use error::{
    ChecksumError, ErrorEntry, ErrorKind, ErrorLog, ExtractionError, RunOutcome, TaggerError,
    VocabularyError,
};
pub use extract::{
    AttributeSplitter, CdlHeaderReader, EsacciExtractor, Extraction, FactExtractor,
    FileNameParser, HeaderSource, TripleSource,
};
pub use mapper::{FacetMapper, FacetOutcome, FacetState, MappedFacets};
pub use output::{write_override_rows, OutputWriter};
pub use tagger::{
    select_files, DataFile, DatasetOutcome, DatasetTagger, FileOutcome, TaggerSettings,
};
pub use types::{
    Checksum, DrsIdentifier, DrsSchema, Facet, FactSet, FileEntry, MappingRecord, TagRecord,
    Triple, NO_CHECKSUM,
};
pub use vocabulary::{
    known_aliases, Concept, LabelAlias, OverrideMapping, OverrideTable, Pin, Resolution,
    SkosFileVocabulary, SparqlVocabulary, Term, VocabularyResolver, VocabularyService,
};

/// The configured overrides as (facet, raw value, URL) rows.
///
/// Reads nothing but the configuration: no vocabulary service, no datasets.
pub fn override_rows(config: &TaggerConfig) -> Result<Vec<(Facet, String, String)>, TaggerError> {
    Ok(vocabulary::list_mappings(&config.override_table()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Once;
    use tracing::info;

    static INIT: Once = Once::new();

    /// Initialize logging exactly once for all tests
    fn init_logging() {
        INIT.call_once(|| {
            tracing_subscriber::fmt()
                .with_test_writer()
                .with_max_level(tracing::Level::DEBUG)
                .init();
        });
    }

    const VOCABULARY: &str = r#"{ "schemes": {
        "project": [{ "uri": "http://vocab/project/oc", "prefLabel": "Ocean Colour", "altLabel": "OC" }],
        "processing_level": [{ "uri": "http://vocab/level/l3s", "prefLabel": "Level 3 Super-collated", "altLabel": "L3S" }],
        "data_type": [{ "uri": "http://vocab/type/chlor_a", "prefLabel": "Chlorophyll-a", "altLabel": "CHLOR_A" }],
        "product_string": [{ "uri": "http://vocab/product/merged", "prefLabel": "MERGED" }],
        "frequency": [{ "uri": "http://vocab/freq/month", "prefLabel": "month" }],
        "sensor": [
            { "uri": "http://vocab/sensor/meris", "prefLabel": "MERIS" },
            { "uri": "http://vocab/sensor/modis", "prefLabel": "MODIS" }
        ],
        "platform": [{ "uri": "http://vocab/platform/envisat", "prefLabel": "Envisat", "broader": "http://vocab/prog/esa" }],
        "platform_programme": [{ "uri": "http://vocab/prog/esa", "prefLabel": "ESA" }]
    } }"#;

    const HEADER: &str = r#"netcdf ESACCI-OC-L3S-CHLOR_A-MERGED-1M_MONTHLY_4km_GEO_PML_OCx-200201-fv4.0 {
dimensions:
	lat = 4320 ;
variables:
	float chlor_a(lat) ;
		chlor_a:units = "milligram m-3" ;

// global attributes:
		:frequency = "month" ;
		:sensor = "MERIS,MODIS" ;
		:platform = "Envisat" ;
		:product_version = "4.0" ;
}
"#;

    #[tokio::test]
    async fn test_end_to_end_run() {
        init_logging();
        info!("Testing a run over one dataset");

        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("vocab.json"), VOCABULARY).unwrap();
        let dataset = dir.path().join("ocean_colour");
        std::fs::create_dir(&dataset).unwrap();
        std::fs::write(
            dataset.join("ESACCI-OC-L3S-CHLOR_A-MERGED-1M_MONTHLY_4km_GEO_PML_OCx-200201-fv4.0.cdl"),
            HEADER,
        )
        .unwrap();

        let mut config = TaggerConfig::new(VocabularySource::File("vocab.json".into()));
        config.base_dir = dir.path().to_path_buf();
        config.file_extension = "cdl".into();
        config.drs.multi_valued.insert(Facet::Sensor, "multi-sensor".into());
        config.validate().unwrap();

        let mut coordinator = RunCoordinator::from_config(&config).unwrap();
        let report = coordinator.run(vec![dataset.clone()]).await.unwrap();
        assert!(report.errors.is_empty(), "{:?}", report.errors);
        assert_eq!(report.outcome(), RunOutcome::Clean);

        let record = &report.records[0];
        assert_eq!(
            record.drs.as_ref().unwrap().to_string(),
            "esacci.OC.mon.L3S.CHLOR_A.multi-sensor.Envisat.MERGED.4-0.r1"
        );
        assert_eq!(record.files[0].checksum.digest().map(str::len), Some(64));
        assert!(report
            .tags
            .iter()
            .any(|t| t.uri == "http://vocab/prog/esa"));

        let out = dir.path().join("out");
        OutputWriter::new(&out).write_report(&report).unwrap();
        assert!(out.join("drs.json").exists());
        assert_eq!(std::fs::read_to_string(out.join("errors.txt")).unwrap(), "");
    }

    #[test]
    fn test_override_rows_from_config() {
        init_logging();
        let config = TaggerConfig::from_reader(
            r#"{
                "vocabulary": { "file": "does-not-exist.json" },
                "overrides": [
                    { "facet": "sensor", "value": "AVHRR-3", "uri": "http://vocab/sensor/avhrr3" },
                    { "facet": "platform", "value": "NOAA 19", "uri": "http://vocab/platform/noaa19" }
                ]
            }"#
            .as_bytes(),
        )
        .unwrap();
        let rows = override_rows(&config).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].0, Facet::Platform);
    }
}
