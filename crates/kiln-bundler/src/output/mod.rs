//! Writing a build to disk: cleaning, staging, static copy and the manifest.

mod copy;
mod manifest;
mod writer;

pub use copy::copy_static;
pub use manifest::{MANIFEST_FILE, Manifest, ManifestChunk};
pub use writer::{StagingArea, clean_dir, normalize_dir, validate_output_path};
