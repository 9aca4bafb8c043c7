//! Reads plan configuration files.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and
//! deserialization helpers. [`load_plan_config`] reads a single file;
//! [`load_plan_dir`] finds `plan.{ron,toml,json}` in a directory.

use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::PlanConfig;

/// Base name of the plan file looked up by [`load_plan_dir`].
pub const PLAN_FILE: &str = "plan";

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur while loading a plan configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    /// A required file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, ConfigLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(ConfigLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a file with the given base name (without extension).
///
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_config_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, ConfigLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(existing) = found.take() {
                return Err(ConfigLoadError::ConflictingFormats {
                    a: existing,
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    let parse_error = |detail: String| ConfigLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    };

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(e.to_string())),
    }
}

/// Load a plan configuration from a single file.
pub fn load_plan_config(path: &Path) -> Result<PlanConfig, ConfigLoadError> {
    let config: PlanConfig = deserialize_file(path)?;
    debug!(
        file = %path.display(),
        objectives = config.objectives.len(),
        items = config.items.len(),
        recipes = config.recipes.len(),
        "loaded plan config"
    );
    Ok(config)
}

/// Load `plan.{ron,toml,json}` from a directory.
pub fn load_plan_dir(dir: &Path) -> Result<PlanConfig, ConfigLoadError> {
    let path = find_config_file(dir, PLAN_FILE)?.ok_or_else(|| {
        ConfigLoadError::MissingRequired {
            file: PLAN_FILE.to_string(),
            dir: dir.to_path_buf(),
        }
    })?;
    load_plan_config(&path)
}

// ===========================================================================
// Tests
// ===========================================================================
