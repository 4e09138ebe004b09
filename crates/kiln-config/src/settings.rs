//! Global configuration settings shared across profiles.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalSettings {
    #[serde(default)]
    pub log_level: Option<String>,

    /// Worker threads for the transform stage (defaults to one per core)
    #[serde(default)]
    pub parallel_jobs: Option<usize>,
}
