//! Thin I/O wrapper around the [`format`](crate::format) collaborator.
//!
//! Reading is split in two so the resolve pipeline can stay free of I/O:
//! [`read`] fetches the text, [`parse`] turns `(path, text)` into a mapping.
//! [`load`] does both. [`store`] serializes and writes, creating parent
//! directories as needed.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::ConfigError;
use crate::format::Format;

pub fn format_for(path: &Path) -> Result<Format, ConfigError> {
    Format::from_path(path).ok_or_else(|| ConfigError::UnsupportedFormat {
        path: path.to_path_buf(),
    })
}

pub fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Parse file contents, picking the format from the path's extension.
pub fn parse(path: &Path, content: &str) -> Result<Map<String, Value>, ConfigError> {
    format_for(path)?
        .parse(content)
        .map_err(|e| ConfigError::FileFormat {
            path: path.to_path_buf(),
            source: e,
        })
}

pub fn load(path: &Path) -> Result<Map<String, Value>, ConfigError> {
    // Check the extension before touching the disk.
    format_for(path)?;
    let content = read(path)?;
    let map = parse(path, &content)?;
    debug!(
        event = "structfig.file.loaded",
        path = %path.display(),
        keys = map.len()
    );
    Ok(map)
}

pub fn store(path: &Path, value: &Value) -> Result<(), ConfigError> {
    let format = format_for(path)?;
    let text = format.serialize(value).map_err(|e| ConfigError::FileFormat {
        path: path.to_path_buf(),
        source: e,
    })?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    if path.exists() {
        warn!(
            event = "structfig.file.overwriting",
            path = %path.display()
        );
    }

    std::fs::write(path, text).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}
