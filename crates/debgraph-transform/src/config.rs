//! Pipeline configuration.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Well-known source names, one per logical entity kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceNames {
    /// LDAP `debianGroup` dump
    pub groups: String,
    /// LDAP `debianDeveloper` dump
    pub developers: String,
    /// LDAP `debianServer` dump
    pub servers: String,
    /// dpkg `available` listing
    pub packages: String,
    /// DM permission ledger
    pub dm_permissions: String,
}

impl Default for SourceNames {
    fn default() -> Self {
        Self {
            groups: "groups".to_string(),
            developers: "developers".to_string(),
            servers: "servers".to_string(),
            packages: "packages".to_string(),
            dm_permissions: "dm".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub sources: SourceNames,
    /// An account whose first `accountStatus` value contains any of these
    /// substrings is left out of the graph.
    pub excluded_statuses: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sources: SourceNames::default(),
            excluded_statuses: vec![
                "inactive".to_string(),
                "retiring".to_string(),
                "memorial".to_string(),
            ],
        }
    }
}

impl PipelineConfig {
    /// Read a JSON config; missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }
}
