use serde::{Serialize, Serializer};
use std::path::PathBuf;

use super::DrsIdentifier;

/// Written in place of a digest when no checksum was computed.
pub const NO_CHECKSUM: &str = "no-checksum";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checksum {
    Sha256(String),
    Absent,
}

impl Checksum {
    pub fn digest(&self) -> Option<&str> {
        match self {
            Checksum::Sha256(digest) => Some(digest),
            Checksum::Absent => None,
        }
    }
}

impl Serialize for Checksum {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.digest().unwrap_or(NO_CHECKSUM))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub file: PathBuf,
    #[serde(rename = "sha256")]
    pub checksum: Checksum,
}

/// A dataset, its DRS identifier (if one could be built) and its files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingRecord {
    pub dataset: PathBuf,
    pub drs: Option<DrsIdentifier>,
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TagRecord {
    pub dataset: PathBuf,
    pub uri: String,
}
