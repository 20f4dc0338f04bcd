use std::env;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

pub const DEFAULT_SEARCH_URL: &str = "http://localhost:9200";
pub const DEFAULT_INDEX: &str = "hm_antibodies";
pub const DEFAULT_ASSETS_URL: &str = "https://assets.hubmapconsortium.org";
pub const DEFAULT_TIMEOUT: u64 = 30;
pub const DEFAULT_PAGE_SIZE: u64 = 20;

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ConfigFile {
    pub search_url: Option<String>,
    pub index: Option<String>,
    pub assets_url: Option<String>,
    pub timeout: Option<u64>,
    pub page_size: Option<u64>,
    pub proxy: Option<String>,
    #[serde(alias = "cookies")]
    pub preferences: Option<String>,
    pub output: Option<String>,
    pub output_format: Option<String>,
    pub export_dir: Option<String>,
    pub export_asset_urls: Option<bool>,
    pub no_color: Option<bool>,
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("USERPROFILE").map(PathBuf::from))
        .or_else(|| {
            let drive = env::var_os("HOMEDRIVE")?;
            let path = env::var_os("HOMEPATH")?;
            Some(PathBuf::from(drive).join(path))
        })
}

fn app_dir() -> Option<PathBuf> {
    Some(home_dir()?.join(".avrsearch"))
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(app_dir()?.join("config.yml"))
}

/// Where column choices are kept unless `preferences` says otherwise.
pub fn default_preferences_path() -> Option<PathBuf> {
    Some(app_dir()?.join("columns.yml"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

pub fn expand_tilde_string(path: &str) -> String {
    expand_tilde(path).to_string_lossy().to_string()
}

pub fn load_config(path: &PathBuf, allow_missing: bool) -> Result<ConfigFile, String> {
    match std::fs::read_to_string(path) {
        Ok(contents) if contents.trim().is_empty() => Ok(ConfigFile::default()),
        Ok(contents) => serde_yaml::from_str::<ConfigFile>(&contents)
            .map_err(|e| format!("failed to parse config '{}': {e}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
            Ok(ConfigFile::default())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(format!("config file not found '{}'", path.display()))
        }
        Err(e) => Err(format!("failed to read config '{}': {e}", path.display())),
    }
}

fn default_config_yaml() -> String {
    format!(
        r#"# avrsearch config
#
# Location (default):
#   ~/.avrsearch/config.yml
#
# Command-line flags override these values.

# Search backend
search_url: {DEFAULT_SEARCH_URL}
index: {DEFAULT_INDEX}
timeout: {DEFAULT_TIMEOUT}
page_size: {DEFAULT_PAGE_SIZE}
# proxy: http://127.0.0.1:8080

# Validation report files are linked as <assets_url>/<uuid>/<filename>
assets_url: {DEFAULT_ASSETS_URL}

# Column choices (defaults to ~/.avrsearch/columns.yml)
# preferences: ~/.avrsearch/columns.yml

# Output (optional)
# output: ./results.html
# output_format: html

# CSV export: directory that receives avr.csv
# export_dir: ./exports
# Write full report URLs instead of bare filenames
export_asset_urls: false

# Output styling
no_color: false
"#
    )
}

pub fn ensure_default_config_file(path: &PathBuf) -> Result<(), String> {
    if path.exists() {
        return Ok(());
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    let contents = default_config_yaml();
    std::fs::write(path, contents)
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(())
}
