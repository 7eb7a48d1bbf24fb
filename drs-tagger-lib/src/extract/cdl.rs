use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;

use super::{TripleSource, GLOBAL_SUBJECT};
use crate::error::ExtractionError;
use crate::types::Triple;

/// Where the CDL text header of a data file comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeaderSource {
    /// `<file>.cdl` next to the data file, or the file itself when it is `.cdl`.
    #[default]
    Sidecar,
    /// Run `<ncdump> -h <file>`.
    Ncdump(PathBuf),
}

/// Reads attributes from a netCDF header in CDL text form (`ncdump -h` output).
///
/// Every `var:attr = value ;` line becomes `(var, attr, value)`; global
/// attributes use the subject [`GLOBAL_SUBJECT`].
#[derive(Debug, Clone)]
pub struct CdlHeaderReader {
    source: HeaderSource,
}

impl CdlHeaderReader {
    pub fn new(source: HeaderSource) -> Self {
        Self { source }
    }

    fn header_text(&self, path: &Path) -> Result<String, ExtractionError> {
        match &self.source {
            HeaderSource::Sidecar => {
                let header_path = if path.extension().is_some_and(|e| e == "cdl") {
                    path.to_path_buf()
                } else {
                    let mut name = path.as_os_str().to_os_string();
                    name.push(".cdl");
                    PathBuf::from(name)
                };
                std::fs::read_to_string(&header_path).map_err(|source| {
                    ExtractionError::Unreadable {
                        path: header_path,
                        source,
                    }
                })
            }
            HeaderSource::Ncdump(program) => {
                let output = Command::new(program)
                    .arg("-h")
                    .arg(path)
                    .output()
                    .map_err(|source| ExtractionError::Unreadable {
                        path: path.to_path_buf(),
                        source,
                    })?;
                if !output.status.success() {
                    return Err(ExtractionError::Malformed {
                        path: path.to_path_buf(),
                        line: 0,
                        message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                    });
                }
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
        }
    }
}

impl TripleSource for CdlHeaderReader {
    fn read_triples(&self, path: &Path) -> Result<Vec<Triple>, ExtractionError> {
        let text = self.header_text(path)?;
        parse_cdl(path, &text)
    }
}

pub(crate) fn parse_cdl(path: &Path, text: &str) -> Result<Vec<Triple>, ExtractionError> {
    let malformed = |line: usize, message: &str| ExtractionError::Malformed {
        path: path.to_path_buf(),
        line,
        message: message.to_string(),
    };

    let mut lines = text.lines().enumerate();
    let first = lines
        .by_ref()
        .map(|(_, l)| l.trim())
        .find(|l| !l.is_empty())
        .unwrap_or_default();
    if !first.starts_with("netcdf ") {
        return Err(malformed(1, "not a CDL header"));
    }

    let mut triples = Vec::new();
    let mut pending: Option<(usize, String)> = None;
    for (index, line) in lines {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        let (start, statement) = match pending.take() {
            Some((start, mut acc)) => {
                acc.push(' ');
                acc.push_str(line);
                (start, acc)
            }
            None => {
                if !is_attribute_line(line) {
                    continue;
                }
                (index + 1, line.to_string())
            }
        };
        if !statement.ends_with(';') {
            pending = Some((start, statement));
            continue;
        }

        let (name, value) = statement
            .split_once('=')
            .ok_or_else(|| malformed(start, "attribute without '='"))?;
        let (subject, predicate) = name
            .trim()
            .split_once(':')
            .ok_or_else(|| malformed(start, "attribute without ':'"))?;
        let subject = if subject.is_empty() {
            GLOBAL_SUBJECT
        } else {
            subject
        };
        let value = value.trim().trim_end_matches(';').trim();
        triples.push(Triple::new(subject, predicate.trim(), attribute_value(value)));
    }

    if let Some((start, _)) = pending {
        return Err(malformed(start, "unterminated attribute"));
    }
    Ok(triples)
}

fn is_attribute_line(line: &str) -> bool {
    match line.split_once('=') {
        Some((name, _)) => {
            let name = name.trim();
            name.contains(':') && !name.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Joins the quoted pieces of a string attribute; other values are kept as written.
fn attribute_value(raw: &str) -> String {
    if !raw.starts_with('"') {
        return raw.to_string();
    }
    let mut value = String::new();
    let mut in_string = false;
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match (c, in_string) {
            ('"', _) => in_string = !in_string,
            ('\\', true) => match chars.next() {
                Some('n') => value.push('\n'),
                Some('t') => value.push('\t'),
                Some(other) => value.push(other),
                None => {}
            },
            (c, true) => value.push(c),
            _ => {}
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{EsacciExtractor, FactExtractor};

    const HEADER: &str = r#"netcdf ESACCI-OC-L3S-CHLOR_A-MERGED-1D_DAILY_4km_GEO_PML_OC4v6-20020101-fv2.0 {
dimensions:
	lat = 4320 ;
	time = UNLIMITED ; // (1 currently)
variables:
	float chlor_a(time, lat) ;
		chlor_a:long_name = "Chlorophyll-a concentration" ;
		chlor_a:_FillValue = 9.96921e+36f ;

// global attributes:
		:institution = "Plymouth Marine Laboratory" ;
		:platform = "Orbview-2,Aqua,Envisat" ;
		:history = "created\n",
			"merged" ;
		:product_version = "2.0" ;
}
"#;

    #[test]
    fn test_parse_header() {
        let triples = parse_cdl(Path::new("x.nc"), HEADER).unwrap();
        assert_eq!(
            triples[0],
            Triple::new("chlor_a", "long_name", "Chlorophyll-a concentration")
        );
        assert_eq!(triples[1].object, "9.96921e+36f");
        assert!(triples.contains(&Triple::new(
            GLOBAL_SUBJECT,
            "platform",
            "Orbview-2,Aqua,Envisat"
        )));
        assert!(triples.contains(&Triple::new(GLOBAL_SUBJECT, "history", "created\nmerged")));
        assert_eq!(triples.len(), 6);
    }

    #[test]
    fn test_rejects_non_cdl() {
        let err = parse_cdl(Path::new("x.nc"), "\u{89}HDF\r\n").unwrap_err();
        assert!(matches!(err, ExtractionError::Malformed { line: 1, .. }));

        let err = parse_cdl(Path::new("x.nc"), "netcdf x {\n :title = \"open").unwrap_err();
        assert!(matches!(err, ExtractionError::Malformed { line: 2, .. }));
    }

    #[test]
    fn test_reads_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("a.nc");
        std::fs::write(&data, b"binary").unwrap();
        std::fs::write(dir.path().join("a.nc.cdl"), HEADER).unwrap();

        let reader = CdlHeaderReader::new(HeaderSource::Sidecar);
        assert_eq!(reader.read_triples(&data).unwrap().len(), 6);

        let missing = dir.path().join("b.nc");
        assert!(matches!(
            reader.read_triples(&missing),
            Err(ExtractionError::Unreadable { .. })
        ));
    }

    #[test]
    fn test_sidecar_with_empty_long_name() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("ESACCI-OC-L3S-CHLOR_A-MERGED-1D_DAILY_4km-20020101-fv2.0.nc");
        std::fs::write(&data, b"binary").unwrap();
        let mut sidecar = data.as_os_str().to_os_string();
        sidecar.push(".cdl");
        std::fs::write(
            sidecar,
            "netcdf x {\nvariables:\n\tfloat chlor_a(lat) ;\n\t\tchlor_a:long_name = \"\" ;\n}\n",
        )
        .unwrap();

        let extractor = EsacciExtractor::new(CdlHeaderReader::new(HeaderSource::Sidecar), true);
        let extraction = extractor.inspect(&data).unwrap();
        assert_eq!(extraction.warnings.len(), 1);
        assert!(extraction.warnings[0].contains("chlor_a"));
    }
}
