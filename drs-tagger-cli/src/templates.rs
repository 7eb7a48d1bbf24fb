pub enum Template {
    Basic,
    Full,
}

pub const BASIC_CONFIG: &str = r#"{
  // Where facet values are looked up: a JSON export of the concept schemes
  // (relative paths are resolved against this file's directory)
  "vocabulary": {
    "file": "vocabulary.json"
  },

  // Local corrections for attribute values the vocabulary does not know
  "overrides": [
    {
      "facet": "sensor",
      // The value exactly as it appears in the data files
      "value": "AVHRR-3",
      // The vocabulary term it stands for
      "uri": "http://vocab.ceda.ac.uk/collection/cci/sensor/sensor_avhrr-3"
    }
  ]

  // Known CCI spellings such as "MERIS_RR" or "daily" are looked up under
  // their vocabulary labels; see the full template to change them.
}"#;

pub const FULL_CONFIG: &str = r#"{
  // Vocabulary source - either a local export:
  //   "vocabulary": { "file": "vocabulary.json" }
  // or a SPARQL endpoint with one concept scheme per facet
  "vocabulary": {
    "sparql": {
      "endpoint": "http://vocab.ceda.ac.uk/sparql",
      "schemes": {
        "project": "http://vocab.ceda.ac.uk/scheme/cci/cci_project",
        "frequency": "http://vocab.ceda.ac.uk/scheme/cci/time_frequency",
        "processing_level": "http://vocab.ceda.ac.uk/scheme/cci/processing_level",
        "data_type": "http://vocab.ceda.ac.uk/scheme/cci/data_type",
        "sensor": "http://vocab.ceda.ac.uk/scheme/cci/sensor",
        "platform": "http://vocab.ceda.ac.uk/scheme/cci/platform",
        "product_string": "http://vocab.ceda.ac.uk/scheme/cci/product",
        "institution": "http://vocab.ceda.ac.uk/scheme/cci/institution"
      },
      // Seconds before a lookup is given up on
      "timeoutSecs": 30
    }
  },

  // DRS identifier layout
  "drs": {
    "prefix": "esacci",
    // Components in order; every listed facet must resolve to one term
    "facets": [
      "project",
      "frequency",
      "processing_level",
      "data_type",
      "sensor",
      "platform",
      "product_string",
      "product_version"
    ],
    // Facets that may carry several terms, and the component used instead
    "multiValued": {
      "sensor": "multi-sensor",
      "platform": "multi-platform"
    }
  },

  // Local corrections, consulted before the vocabulary
  "overrides": [
    {
      "facet": "sensor",
      "value": "AVHRR-3",
      "uri": "http://vocab.ceda.ac.uk/collection/cci/sensor/sensor_avhrr-3",
      // Component used in the DRS (optional, defaults to the last URL segment)
      "label": "AVHRR-3"
    },
    {
      "facet": "platform",
      "value": "NOAA 19",
      "uri": "http://vocab.ceda.ac.uk/collection/cci/platform/plat_noaa-19"
    }
  ],
  // Spellings in the data files that the vocabulary knows under another label.
  // Listing aliases here replaces the built-in list, which is the one below.
  "aliases": [
    { "facet": "frequency", "value": "daily", "label": "day" },
    { "facet": "institution", "value": "DTU Space - Div. of Geodynamics", "label": "DTU Space" },
    { "facet": "institution", "value": "DTU Space - Div. of Geodynamics and NERSC", "label": "DTU Space" },
    { "facet": "institution", "value": "DTU Space - Microwaves and Remote Sensing", "label": "DTU Space" },
    { "facet": "institution", "value": "Deutsches Zentrum fuer Luft- und Raumfahrt (DLR)", "label": "Deutsches Zentrum fuer Luft- und Raumfahrt" },
    { "facet": "institution", "value": "ESACCI", "label": "ESACCI_SST" },
    { "facet": "institution", "value": "Plymouth Marine Laboratory Remote Sensing Group", "label": "Plymouth Marine Laboratory" },
    { "facet": "institution", "value": "Royal Netherlands Meteorological Institute (KNMI)", "label": "Royal Netherlands Meteorological Institute" },
    { "facet": "institution", "value": "SRON Netherlands Institute for Space Research", "label": "Netherlands Institute for Space Research" },
    { "facet": "institution", "value": "University of Leicester (UoL)", "label": "University of Leicester" },
    { "facet": "processing_level", "value": "level-3", "label": "l3" },
    { "facet": "platform", "value": "ERS2", "label": "ERS-2" },
    { "facet": "platform", "value": "ENV", "label": "ENVISAT" },
    { "facet": "platform", "value": "EOS-AURA", "label": "AURA" },
    { "facet": "platform", "value": "MetOpA", "label": "Metop-A" },
    { "facet": "platform", "value": "Nimbus 7", "label": "Nimbus-7" },
    { "facet": "platform", "value": "orbview-2/seastar", "label": "orbview-2" },
    { "facet": "platform", "value": "SCISAT", "label": "SCISAT-1" },
    { "facet": "sensor", "value": "AMSR-E", "label": "AMSRE" },
    { "facet": "sensor", "value": "ATSR2", "label": "ATSR-2" },
    { "facet": "sensor", "value": "AVHRR GAC", "label": "AVHRR" },
    { "facet": "sensor", "value": "AVHRR_GAC", "label": "AVHRR" },
    { "facet": "sensor", "value": "AVHRR_HRPT", "label": "AVHRR" },
    { "facet": "sensor", "value": "AVHRR_LAC", "label": "AVHRR" },
    { "facet": "sensor", "value": "AVHRR_MERGED", "label": "AVHRR" },
    { "facet": "sensor", "value": "GFO", "label": "GFO-RA" },
    { "facet": "sensor", "value": "MERIS_FRS", "label": "MERIS" },
    { "facet": "sensor", "value": "MERIS_RR", "label": "MERIS" },
    { "facet": "sensor", "value": "MODIS_MERGED", "label": "MODIS" },
    { "facet": "sensor", "value": "RA2", "label": "RA-2" },
    { "facet": "sensor", "value": "SMR_544.6GHz", "label": "SMR" }
  ],
  // Set to false to ignore overrides, aliases, pins and attribute corrections
  "useOverrides": true,

  // Settle a conflicting facet on one of its candidate terms
  "pins": [
    {
      "facet": "project",
      "uri": "http://vocab.ceda.ac.uk/collection/cci/cci_project/proj_cloud"
    }
  ],

  // Issued DRS identifiers; realizations (.rN) are kept stable across runs
  "registry": "drs_registry.csv",

  // Data files considered in each dataset
  "fileExtension": "nc",
  // Files read per dataset (0 = all)
  "fileCount": 0,
  // SHA-256 of every data file
  "checksums": true,
  // Datasets processed in parallel
  "workers": 4,

  // File headers come from "<file>.cdl" sidecars ("sidecar") or from ncdump
  "header": {
    "ncdump": "ncdump"
  }
}"#;
