use serde::{Deserialize, Serialize};

use crate::model::record::FieldMap;
use crate::model::tree::OutputKeys;

/// Configuration from nbtree.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fields: FieldMap,
    #[serde(default)]
    pub output: OutputKeys,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub source: SourceConfig,
}

/// What to do with a record whose parent isn't in the same batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OrphanPolicy {
    /// Fail the whole build, naming the missing parent
    #[default]
    Reject,
    /// Place the record among the roots, at its scan position
    Promote,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default)]
    pub orphans: OrphanPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Collection endpoint used when no --source is given
    #[serde(default)]
    pub url: Option<String>,
    /// HTTP timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            url: None,
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    5000
}
