//! Layered configuration for verifile scans.
//!
//! Values are merged in increasing priority:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. A configuration file (TOML, YAML or JSON, picked by extension)
//! 3. Environment variables prefixed with `VERIFILE_`, using `__` to reach
//!    nested keys (`VERIFILE_STEPS__SIZE__ENABLED=false`)

pub mod error;
mod verbosity;

pub use crate::verbosity::Verbosity;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "VERIFILE_";
/// File name looked up in the platform configuration directory.
pub const DEFAULT_FILE_NAME: &str = "config.toml";

/// Per-step toggle, keyed by step name in [`Config::steps`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StepConfig {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}
impl Default for StepConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn enabled_by_default() -> bool {
    true
}

/// Settings shared by every step of a scan.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Rendering level for scan output.
    pub output: Verbosity,
    /// Run steps flagged as format-specific validators.
    pub format_specific: bool,
    /// Directory, file or archive to scan.
    pub target: Option<PathBuf>,
    /// Descend into symlinked directories (cycles are detected).
    pub follow_symlinks: bool,
    /// Where archive targets are extracted; the system temp dir when unset.
    pub temp_dir: Option<PathBuf>,
    /// Enable/disable toggles for individual steps.
    pub steps: BTreeMap<String, StepConfig>,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            output: Verbosity::default(),
            format_specific: false,
            target: None,
            follow_symlinks: true,
            temp_dir: None,
            steps: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, a file and the environment.
    ///
    /// When `path` is `None` the platform default location
    /// ([`default_path`]) is used if a file exists there. An explicit path
    /// that does not exist is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => default_path().filter(|p| p.is_file()),
        };
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = &file {
            tracing::debug!(path = %file.display(), "Loading configuration file");
            figment = merge_file(figment, file)?;
        }
        Self::from_figment(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Extract a configuration from an already-assembled [`Figment`].
    pub fn from_figment(figment: Figment) -> Result<Self> {
        figment.extract().map_err(|e| exn::Exn::from(ErrorKind::Invalid(e.to_string())))
    }

    /// The configured toggle for a step, if the step is mentioned at all.
    pub fn step_enabled(&self, name: &str) -> Option<bool> {
        self.steps.get(name).map(|step| step.enabled)
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}

/// Platform configuration file location (`~/.config/verifile/config.toml`
/// on Linux).
pub fn default_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "verifile").map(|dirs| dirs.config_dir().join(DEFAULT_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.output, Verbosity::Brief);
        assert!(!config.format_specific);
        assert!(config.follow_symlinks);
        assert!(config.target.is_none());
        assert!(config.temp_dir.is_none());
        assert!(config.steps.is_empty());
    }

    #[test]
    fn test_from_figment_merges_over_defaults() {
        let figment = Figment::from(Serialized::defaults(Config::default())).merge(Toml::string(
            r#"
            output = "verbose"
            target = "/srv/upload"

            [steps.size]
            enabled = false

            [steps.signature]
            "#,
        ));
        let config = Config::from_figment(figment).unwrap();
        assert_eq!(config.output, Verbosity::Verbose);
        assert_eq!(config.target, Some(PathBuf::from("/srv/upload")));
        assert!(config.follow_symlinks);
        assert_eq!(config.step_enabled("size"), Some(false));
        assert_eq!(config.step_enabled("signature"), Some(true));
        assert_eq!(config.step_enabled("extension"), None);
    }

    #[test]
    fn test_invalid_value() {
        let figment = Figment::from(Serialized::defaults(Config::default())).merge(Toml::string(r#"output = "loud""#));
        let err = Config::from_figment(figment).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Invalid(_)));
    }

    #[rstest]
    #[case("verifile.toml", "format_specific = true\n")]
    #[case("verifile.yaml", "format_specific: true\n")]
    #[case("verifile.yml", "format_specific: true\n")]
    #[case("verifile.json", "{\"format_specific\": true}")]
    fn test_load_file_formats(#[case] name: &str, #[case] contents: &str) {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join(name);
        fs::write(&path, contents).unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert!(config.format_specific);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("missing.toml");
        let err = Config::load(Some(&path)).unwrap_err();
        assert_eq!(*err, ErrorKind::NotFound(path));
    }

    #[test]
    fn test_load_unsupported_extension() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("verifile.ini");
        fs::write(&path, "output=brief").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(&*err, ErrorKind::UnsupportedFormat(_)));
    }
}
