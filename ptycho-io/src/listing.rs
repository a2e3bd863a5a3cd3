//! Frame file discovery.

use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Lists the entries of `directory`, optionally keeping only regular files
/// whose extension (with its leading dot, compared case-sensitively) equals
/// `extension`.
///
/// Paths are returned joined with `directory`, in the order the directory
/// listing yields them. The order is not sorted; it decides which scan
/// position each frame lands on.
///
/// # Errors
/// Returns [`Error::NotFound`] if `directory` does not exist or is not a
/// directory, or an I/O error if an entry cannot be read.
pub fn list_files<P: AsRef<Path>>(
    directory: P,
    extension: Option<&str>,
) -> Result<Vec<PathBuf>> {
    let directory = directory.as_ref();
    if !directory.is_dir() {
        return Err(Error::NotFound(directory.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        match extension {
            None => files.push(path),
            Some(wanted) => {
                if path.is_file() && has_extension(&path, wanted) {
                    files.push(path);
                }
            }
        }
    }
    Ok(files)
}

fn has_extension(path: &Path, wanted: &str) -> bool {
    let Some(suffix) = wanted.strip_prefix('.') else {
        return false;
    };
    path.extension().and_then(|ext| ext.to_str()) == Some(suffix)
}
