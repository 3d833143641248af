//! Layering pipeline: overlay every source onto a config, then check required
//! fields once.
//!
//! Operates on pre-loaded data (`ResolveInput`) with no I/O, making the full
//! pipeline testable with synthetic inputs. Steps:
//!
//! 1. Parse and overlay config files (later overrides earlier)
//! 2. Overlay dotted overrides on top (highest priority)
//! 3. Run the required-field pass over the whole tree
//!
//! The config is only updated if every step succeeds.

use std::path::PathBuf;

use serde_json::Value;

use crate::config::Config;
use crate::error::ConfigError;
use crate::file;
use crate::overrides;

/// All pre-loaded data needed to resolve a config. No I/O happens here.
#[derive(Debug, Default)]
pub struct ResolveInput {
    /// File contents in precedence order: first = lowest priority, last = highest.
    /// The path selects the format and labels parse errors.
    pub files: Vec<(PathBuf, String)>,
    /// Overrides as `(dotted_key, value)` pairs.
    pub overrides: Vec<(String, Value)>,
}

/// Layer `input` onto `config`: compiled defaults (or whatever the config
/// already holds) < files < overrides.
pub fn resolve(config: &mut Config, input: ResolveInput) -> Result<(), ConfigError> {
    let mut next = config.clone();

    for (path, content) in &input.files {
        let map = file::parse(path, content)?;
        next.overlay_map(&map)?;
    }

    if !input.overrides.is_empty() {
        let map = overrides::overrides_to_map(&input.overrides);
        next.overlay_map(&map)?;
    }

    next.validate()?;
    *config = next;
    Ok(())
}
