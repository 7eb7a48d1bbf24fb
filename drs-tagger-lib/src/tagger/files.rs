use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::TaggerError;

/// Data files under `dataset` with the given extension, in path order.
///
/// A `limit` of 0 selects every file.
pub fn select_files(
    dataset: &Path,
    extension: &str,
    limit: usize,
) -> Result<Vec<PathBuf>, TaggerError> {
    if !dataset.is_dir() {
        return Err(TaggerError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a directory", dataset.display()),
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dataset).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {}: {}", dataset.display(), e);
                continue;
            }
        };
        if entry.file_type().is_file()
            && entry
                .path()
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case(extension))
        {
            files.push(entry.into_path());
        }
    }

    files.sort();
    if limit > 0 {
        files.truncate(limit);
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_and_limited() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("v2")).unwrap();
        for name in ["b.nc", "a.nc", "v2/a.nc", "notes.txt", "c.NC"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let all = select_files(dir.path(), "nc", 0).unwrap();
        let names: Vec<_> = all
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.nc", "b.nc", "c.NC", "v2/a.nc"]);

        assert_eq!(select_files(dir.path(), "nc", 2).unwrap(), all[..2].to_vec());
    }

    #[test]
    fn test_missing_dataset() {
        let dir = tempfile::tempdir().unwrap();
        assert!(select_files(&dir.path().join("nope"), "nc", 0).is_err());
    }
}
