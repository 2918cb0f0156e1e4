//! Settings file handling.
//!
//! Settings live in a JSON file (default `~/.config/wikigap/config.json`).
//! Every field is optional; whatever is missing falls back to its default,
//! and command line flags override both.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use wikigap_scanner::article::{DEFAULT_SCHEME, DEFAULT_SITE_SUFFIX};
use wikigap_scanner::error::Result;
use wikigap_scanner::links::DEFAULT_EXCLUDED_NAMESPACES;
use wikigap_scanner::source::DEFAULT_USER_AGENT;
use wikigap_scanner::{LinkExtractor, SiteFamily};

pub const DEFAULT_CONFIG_DIR: &str = "~/.config/wikigap/";
pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Scheme every article URL must start with
    pub scheme: String,
    /// Host suffix shared by all language editions
    pub site_suffix: String,
    pub user_agent: String,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// Concurrent fetches
    pub workers: usize,
    /// Overall time budget of a graph build (0 = unlimited)
    pub deadline_secs: u64,
    /// `/wiki/<Namespace>` prefixes that are never followed
    pub excluded_namespaces: Vec<String>,
    /// Used when `analyze` is run without `--reference`
    pub reference_language: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            site_suffix: DEFAULT_SITE_SUFFIX.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 10,
            workers: 10,
            deadline_secs: 0,
            excluded_namespaces: DEFAULT_EXCLUDED_NAMESPACES
                .iter()
                .map(|ns| ns.to_string())
                .collect(),
            reference_language: "en".to_string(),
        }
    }
}

impl Settings {
    /// `~/.config/wikigap/config.json`, tilde expanded.
    pub fn default_path() -> PathBuf {
        let dir = shellexpand::tilde(DEFAULT_CONFIG_DIR);
        Path::new(dir.as_ref()).join(CONFIG_FILE_NAME)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Like [`Settings::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn site_family(&self) -> SiteFamily {
        SiteFamily::new(self.scheme.clone(), self.site_suffix.clone())
    }

    pub fn link_extractor(&self) -> LinkExtractor {
        LinkExtractor::with_excluded_namespaces(self.site_family(), &self.excluded_namespaces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"workers": 3, "reference_language": "de"}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.workers, 3);
        assert_eq!(settings.reference_language, "de");
        assert_eq!(settings.site_suffix, ".wikipedia.org");
        assert_eq!(settings.timeout_secs, 10);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_or_default(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let settings = Settings {
            site_suffix: ".example-encyclopedia.org".to_string(),
            ..Settings::default()
        };

        settings.save(&path).unwrap();
        assert_eq!(Settings::load(&path).unwrap(), settings);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(Settings::load_or_default(&path).is_err());
    }

    #[test]
    fn test_extractor_uses_configured_namespaces() {
        let settings = Settings {
            excluded_namespaces: vec!["Datei".to_string()],
            ..Settings::default()
        };
        let extractor = settings.link_extractor();
        assert!(!extractor.is_article_target("/wiki/Datei:Bild.png"));
        assert!(extractor.is_article_target("/wiki/Category:Things"));
    }
}
