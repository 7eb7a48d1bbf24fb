use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::ChecksumError;

const BLOCK_SIZE: usize = 10 * 1024;

pub trait ChecksumProvider: Send + Sync {
    /// Hex digest of the file's bytes.
    fn checksum(&self, path: &Path) -> Result<String, ChecksumError>;
}

/// SHA-256, read in fixed-size blocks so large files are never held in memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Checksum;

impl ChecksumProvider for Sha256Checksum {
    fn checksum(&self, path: &Path) -> Result<String, ChecksumError> {
        let wrap = |source| ChecksumError {
            path: path.to_path_buf(),
            source,
        };
        let mut file = File::open(path).map_err(wrap)?;
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; BLOCK_SIZE];
        loop {
            let read = file.read(&mut buffer).map_err(wrap)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }
        Ok(format!("{:x}", hasher.finalize()))
    }
}
