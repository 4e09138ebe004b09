use serde::{Deserialize, Serialize};

use super::helpers::*;

/// Output layout and filename templates.
///
/// Templates understand `[name]`, `[hash]`, `[hash:N]` and `[ext]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputOptions {
    #[serde(default = "default_filename")]
    pub filename: String,

    #[serde(default = "default_css_filename")]
    pub css_filename: String,

    /// Prefix of every URL injected into the document
    #[serde(default = "default_public_path")]
    pub public_path: String,

    #[serde(default = "default_images")]
    pub images: String,

    #[serde(default = "default_fonts")]
    pub fonts: String,

    /// Files with no dedicated transform
    #[serde(default = "default_assets")]
    pub assets: String,

    /// Destination of the static role inside the output
    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    #[serde(default = "default_html_filename")]
    pub html_filename: String,

    /// Length of a bare `[hash]`
    #[serde(default = "default_hash_length")]
    pub hash_length: usize,

    #[serde(default)]
    pub manifest: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            filename: default_filename(),
            css_filename: default_css_filename(),
            public_path: default_public_path(),
            images: default_images(),
            fonts: default_fonts(),
            assets: default_assets(),
            static_dir: default_static_dir(),
            html_filename: default_html_filename(),
            hash_length: default_hash_length(),
            manifest: false,
        }
    }
}
