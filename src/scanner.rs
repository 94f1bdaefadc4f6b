use crate::error::{AnalysisError, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions of files that may hold annotated handlers.
pub const SCRIPT_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts"];

/// Source loader for handler folders.
///
/// The `FileScanner` lists the script files placed directly inside a folder. Subdirectories
/// are not descended into and hidden entries (those starting with `.`) are skipped.
///
/// # Example
///
/// ```no_run
/// use swagger_from_flow::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./controllers"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} handler files", result.source_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

/// Result of a folder scan.
pub struct ScanResult {
    /// Script files found directly inside the root, sorted by name
    pub source_files: Vec<PathBuf>,
    /// Warning messages for entries that could not be inspected
    pub warnings: Vec<String>,
}

impl FileScanner {
    /// Creates a new `FileScanner` for the specified folder.
    ///
    /// # Arguments
    ///
    /// * `root_path` - The folder to list
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Lists the script files directly inside the root folder.
    ///
    /// Entries that cannot be inspected are logged and added to the result as warnings,
    /// but listing continues.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Io`] if the root itself cannot be read or is not a folder.
    pub fn scan(&self) -> Result<ScanResult> {
        let metadata = fs::metadata(&self.root_path).map_err(|error| AnalysisError::Io {
            path: self.root_path.clone(),
            error,
        })?;
        if !metadata.is_dir() {
            return Err(AnalysisError::Io {
                path: self.root_path.clone(),
                error: std::io::Error::other("not a directory"),
            });
        }

        let mut source_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !e.file_name().to_string_lossy().starts_with('.'))
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if entry.file_type().is_file() && is_script(path) {
                        source_files.push(path.to_path_buf());
                    } else {
                        debug!("Skipping {}", path.display());
                    }
                }
                Err(e) => {
                    if e.depth() == 0 {
                        let path = e.path().unwrap_or(self.root_path.as_path()).to_path_buf();
                        return Err(AnalysisError::Io {
                            path,
                            error: e.into(),
                        });
                    }
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        Ok(ScanResult {
            source_files,
            warnings,
        })
    }
}

/// Whether `path` carries one of the [`SCRIPT_EXTENSIONS`].
pub fn is_script(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext))
}

/// Reads a single source file into text.
pub fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|error| AnalysisError::Io {
        path: path.to_path_buf(),
        error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn file_names(result: &ScanResult) -> Vec<String> {
        result
            .source_files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_scan_lists_script_files_sorted() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("users.js"), "// users").unwrap();
        fs::write(root.join("auth.ts"), "// auth").unwrap();
        fs::write(root.join("readme.md"), "# README").unwrap();

        let scanner = FileScanner::new(root.to_path_buf());
        let result = scanner.scan().unwrap();

        assert_eq!(file_names(&result), vec!["auth.ts", "users.js"]);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_scan_empty_directory() {
        let temp_dir = TempDir::new().unwrap();

        let scanner = FileScanner::new(temp_dir.path().to_path_buf());
        let result = scanner.scan().unwrap();

        assert!(result.source_files.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_scan_does_not_recurse() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join("nested")).unwrap();
        fs::write(root.join("nested/deep.js"), "// deep").unwrap();
        fs::write(root.join("top.js"), "// top").unwrap();

        let scanner = FileScanner::new(root.to_path_buf());
        let result = scanner.scan().unwrap();

        assert_eq!(file_names(&result), vec!["top.js"]);
    }

    #[test]
    fn test_scan_skips_hidden_entries() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join(".eslintrc.js"), "module.exports = {}").unwrap();
        fs::write(root.join("main.js"), "// main").unwrap();

        let scanner = FileScanner::new(root.to_path_buf());
        let result = scanner.scan().unwrap();

        assert_eq!(file_names(&result), vec!["main.js"]);
    }

    #[test]
    fn test_scan_missing_root_is_error() {
        let scanner = FileScanner::new(PathBuf::from("/nonexistent/controllers"));

        assert!(matches!(scanner.scan(), Err(AnalysisError::Io { .. })));
    }

    #[test]
    fn test_scan_file_root_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("single.js");
        fs::write(&file, "// single").unwrap();

        let scanner = FileScanner::new(file);

        assert!(matches!(scanner.scan(), Err(AnalysisError::Io { .. })));
    }

    #[test]
    fn test_read_source() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.js");
        fs::write(&file, "type A = { a: string };").unwrap();

        assert_eq!(read_source(&file).unwrap(), "type A = { a: string };");
        assert!(read_source(&temp_dir.path().join("missing.js")).is_err());
    }
}
