//! Runtime configuration and file loading for requests.

use crate::request::CraftingRequest;
use item_catalog::BatchPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Deployment settings for the calculator front ends.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CraftConfig {
    pub batch: BatchPolicy,
    /// Item catalog JSON used for autofill.
    pub catalog: Option<PathBuf>,
}

impl CraftConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, LoadError> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

/// Read a request from a `.json` file, or YAML for any other extension.
pub fn load_request<P: AsRef<Path>>(path: P) -> Result<CraftingRequest, LoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    if is_json(path) {
        Ok(serde_json::from_str(&text)?)
    } else {
        Ok(serde_yaml::from_str(&text)?)
    }
}
