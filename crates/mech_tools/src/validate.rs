//! Rules file validation.

use std::path::{Path, PathBuf};

use mech_core::rules::RulesConfig;

use crate::{Result, ToolError};

/// Outcome of validating one rules file.
#[derive(Debug)]
pub struct FileReport {
    /// File checked.
    pub path: PathBuf,
    /// Error message, if the file is invalid.
    pub error: Option<String>,
}

impl FileReport {
    /// Whether the file parsed and validated.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Load and validate a single rules file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated.
pub fn validate_rules_file(path: &Path) -> Result<RulesConfig> {
    Ok(RulesConfig::load(path)?)
}

/// Validate a rules file, or every `.ron` file in a directory.
///
/// Files are checked in name order and every file is reported, valid or
/// not.
///
/// # Errors
///
/// Returns an error only if the directory cannot be listed.
pub fn validate_path(path: &Path) -> Result<Vec<FileReport>> {
    let files = if path.is_dir() {
        let entries = std::fs::read_dir(path).map_err(|source| ToolError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut files: Vec<PathBuf> = entries
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "ron"))
            .collect();
        files.sort();
        files
    } else {
        vec![path.to_path_buf()]
    };

    Ok(files
        .into_iter()
        .map(|file| {
            let error = validate_rules_file(&file).err().map(|e| e.to_string());
            if let Some(message) = &error {
                tracing::warn!(path = %file.display(), "{message}");
            } else {
                tracing::debug!(path = %file.display(), "Rules file valid");
            }
            FileReport { path: file, error }
        })
        .collect())
}
