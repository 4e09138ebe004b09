use std::path::PathBuf;

// Helper defaults
pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_entry() -> PathBuf {
    PathBuf::from("src/main.js")
}

pub(crate) fn default_template() -> PathBuf {
    PathBuf::from("public/index.html")
}

pub(crate) fn default_title() -> String {
    "kiln app".to_string()
}

pub(crate) fn default_lang() -> String {
    "en".to_string()
}

pub(crate) fn default_min_chunks() -> usize {
    1
}

pub(crate) fn default_filename() -> String {
    "[name].bundle.js".to_string()
}

pub(crate) fn default_css_filename() -> String {
    "[name].bundle.css".to_string()
}

pub(crate) fn default_public_path() -> String {
    "/".to_string()
}

pub(crate) fn default_images() -> String {
    "img/[name].[hash:6][ext]".to_string()
}

pub(crate) fn default_fonts() -> String {
    "fonts/[name].[hash:6][ext]".to_string()
}

pub(crate) fn default_assets() -> String {
    "assets/[name].[hash:6][ext]".to_string()
}

pub(crate) fn default_static_dir() -> String {
    "static".to_string()
}

pub(crate) fn default_html_filename() -> String {
    "index.html".to_string()
}

pub(crate) fn default_hash_length() -> usize {
    8
}

pub(crate) fn default_symbol_id() -> String {
    "icon-[name]".to_string()
}
