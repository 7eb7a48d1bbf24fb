use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::coordinator::RunReport;
use crate::error::{ErrorEntry, TaggerError};
use crate::types::{Facet, MappingRecord, TagRecord};

pub const DRS_FILE: &str = "drs.json";
pub const TAGS_FILE: &str = "tags.csv";
pub const MAPPINGS_FILE: &str = "mappings.csv";
pub const ERRORS_FILE: &str = "errors.txt";

/// Writes the artifacts of a finished run into one directory.
pub struct OutputWriter {
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn write_report(&self, report: &RunReport) -> Result<Vec<PathBuf>, TaggerError> {
        std::fs::create_dir_all(&self.dir)?;
        tracing::info!("Writing results to {}", self.dir.display());

        let written = vec![
            self.write_drs(&report.records)?,
            self.write_tags(&report.tags)?,
            self.write_mappings(&report.records)?,
            self.write_errors(report.errors.entries())?,
        ];
        for path in &written {
            tracing::debug!("Wrote {}", path.display());
        }
        Ok(written)
    }

    pub fn write_drs(&self, records: &[MappingRecord]) -> Result<PathBuf, TaggerError> {
        let path = self.dir.join(DRS_FILE);
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, records)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(path)
    }

    pub fn write_tags(&self, tags: &[TagRecord]) -> Result<PathBuf, TaggerError> {
        let path = self.dir.join(TAGS_FILE);
        let mut writer = csv_writer(&path)?;
        for tag in tags {
            writer.serialize(tag)?;
        }
        writer.flush()?;
        Ok(path)
    }

    /// One row per dataset with a record: (dataset, DRS), the DRS blank when none was built.
    pub fn write_mappings(&self, records: &[MappingRecord]) -> Result<PathBuf, TaggerError> {
        let path = self.dir.join(MAPPINGS_FILE);
        let mut writer = csv_writer(&path)?;
        for record in records {
            writer.serialize((
                &record.dataset,
                record.drs.as_ref().map(|drs| drs.to_string()),
            ))?;
        }
        writer.flush()?;
        Ok(path)
    }

    pub fn write_errors(&self, errors: &[ErrorEntry]) -> Result<PathBuf, TaggerError> {
        let path = self.dir.join(ERRORS_FILE);
        let mut writer = BufWriter::new(File::create(&path)?);
        for entry in errors {
            writeln!(writer, "{}", entry)?;
        }
        writer.flush()?;
        Ok(path)
    }
}

fn csv_writer(path: &Path) -> Result<csv::Writer<File>, TaggerError> {
    Ok(csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?)
}

/// Write override rows as (facet, raw value, URL) CSV.
pub fn write_override_rows<W: Write>(
    writer: W,
    rows: &[(Facet, String, String)],
) -> Result<(), TaggerError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    for (facet, value, uri) in rows {
        writer.write_record([facet.as_str(), value.as_str(), uri.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}
