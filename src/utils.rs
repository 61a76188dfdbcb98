//! Utility functions

use crate::error::{PreprocessError, PreprocessIoError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// A regex that matches a line that starts with an import statement: optional leading
/// whitespace, `import` in any case, then a single space.
///
/// A byte order mark counts as leading whitespace, so the first line of a BOM-prefixed file is
/// still recognized. This is a textual check, commented out imports (`// import ...`) don't
/// match.
pub static RE_IMPORT_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[\s\x{FEFF}]*import ").unwrap());

/// Extension of solidity source files
pub const SOLIDITY_EXTENSION: &str = "sol";

/// Returns true if the line is an import statement
pub fn is_import_line(line: &str) -> bool {
    RE_IMPORT_LINE.is_match(line)
}

/// Returns a list of absolute paths to all the solidity files under the root, sorted by path
///
/// Fails if the root directory can't be walked.
///
/// # Example
///
/// ```no_run
/// use ethers_preprocess::utils;
/// let sources = utils::source_files("./contracts").unwrap();
/// ```
pub fn source_files(root: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    walk_source_files(root.as_ref(), None)
}

/// Same as [`source_files`] but does not descend into `excluded`, e.g. an output dir nested
/// inside the sources dir
pub fn source_files_excluding(
    root: impl AsRef<Path>,
    excluded: impl AsRef<Path>,
) -> Result<Vec<PathBuf>> {
    walk_source_files(root.as_ref(), Some(excluded.as_ref()))
}

fn walk_source_files(root: &Path, excluded: Option<&Path>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| excluded.map_or(true, |excluded| entry.path() != excluded));
    for entry in walker {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(root).to_path_buf();
            match err.into_io_error() {
                Some(io) => PreprocessError::io(io, path),
                None => PreprocessError::msg(format!(
                    "filesystem loop detected at \"{}\"",
                    path.display()
                )),
            }
        })?;
        if entry.file_type().is_file() &&
            entry.path().extension().map(|ext| ext == SOLIDITY_EXTENSION).unwrap_or_default()
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Canonicalize the path, platform-agnostic
///
/// On windows this will ensure the path only consists of non-UNC parts
pub fn canonicalize(path: impl AsRef<Path>) -> std::result::Result<PathBuf, PreprocessIoError> {
    let path = path.as_ref();
    dunce::canonicalize(path).map_err(|err| PreprocessIoError::new(err, path))
}

/// Creates the parent directory of the `file` and all its ancestors if it does not exist
pub fn create_parent_dir_all(file: impl AsRef<Path>) -> Result<()> {
    let file = file.as_ref();
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent).map_err(|err| PreprocessError::io(err, parent))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{create_dir_all, File};

    #[test]
    fn can_find_solidity_sources() {
        let tmp_dir = tempfile::tempdir().unwrap();

        let file_a = tmp_dir.path().join("a.sol");
        let file_b = tmp_dir.path().join("b.sol");
        let nested = tmp_dir.path().join("nested");
        let file_c = nested.join("c.sol");
        let nested_deep = nested.join("deep");
        let file_d = nested_deep.join("d.sol");
        let not_sol = nested.join("README.md");
        File::create(&file_a).unwrap();
        File::create(&file_b).unwrap();
        create_dir_all(nested_deep).unwrap();
        File::create(&file_c).unwrap();
        File::create(&file_d).unwrap();
        File::create(not_sol).unwrap();

        let files = source_files(tmp_dir.path()).unwrap();
        assert_eq!(files, vec![file_a, file_b, file_c, file_d]);
    }

    #[test]
    fn skips_excluded_dir() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let file_a = tmp_dir.path().join("A.sol");
        let cache = tmp_dir.path().join("cache").join("hardhat");
        create_dir_all(&cache).unwrap();
        File::create(&file_a).unwrap();
        File::create(cache.join("A.sol")).unwrap();

        assert_eq!(source_files(tmp_dir.path()).unwrap().len(), 2);
        assert_eq!(source_files_excluding(tmp_dir.path(), &cache).unwrap(), vec![file_a]);
    }

    #[test]
    fn missing_source_dir_is_io_error() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let missing = tmp_dir.path().join("contracts");
        let err = source_files(&missing).unwrap_err();
        match err {
            PreprocessError::Io(err) => assert_eq!(err.path(), missing),
            err => panic!("unexpected error {err:?}"),
        }
    }

    #[test]
    fn can_match_import_lines() {
        assert!(is_import_line("import \"foo/bar/Token.sol\";"));
        assert!(is_import_line("    import {A} from \"a.sol\";"));
        assert!(is_import_line("\tIMPORT \"foo/bar\";"));
        assert!(is_import_line("Import 'x.sol';"));
        assert!(is_import_line("\u{FEFF}import \"foo/bar\";"));

        assert!(!is_import_line("// import foo/bar"));
        assert!(!is_import_line("import\t\"foo/bar\";"));
        assert!(!is_import_line("imports \"foo/bar\";"));
        assert!(!is_import_line("pragma solidity ^0.8.19;"));
        assert!(!is_import_line(""));
    }
}
