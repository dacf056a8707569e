//! Configuration loading and the source factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use sealexam_core::library::LibraryLoader;
use sealexam_core::model::Mode;
use sealexam_core::traits::Source;

use crate::file::FileSource;
use crate::http::HttpSource;

/// File name searched for in the current directory.
pub const CONFIG_FILE: &str = "sealexam.toml";

/// Overrides `data_dir` when set.
pub const DATA_DIR_ENV: &str = "SEALEXAM_DATA_DIR";

/// One configured question bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankEntry {
    /// Bank tag, used with `--banks`.
    pub name: String,
    /// File path (relative to `data_dir`) or HTTP(S) URL.
    pub location: String,
}

/// Top-level sealexam configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SealexamConfig {
    /// Directory that relative bank and blueprint locations resolve against.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Blueprint location. An empty string disables the blueprint.
    #[serde(default = "default_blueprint")]
    pub blueprint: String,
    /// Session length when `--length` is not given.
    #[serde(default = "default_length")]
    pub default_length: usize,
    #[serde(default)]
    pub mode: Mode,
    /// Whether sampling follows the blueprint by default.
    #[serde(default = "default_true")]
    pub use_blueprint: bool,
    #[serde(default = "default_banks")]
    pub banks: Vec<BankEntry>,
    /// Directory of the config file; `data_dir` is relative to it.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_banks() -> Vec<BankEntry> {
    ["core", "dwv", "hydronic", "safety", "tools", "math"]
        .iter()
        .map(|name| BankEntry {
            name: name.to_string(),
            location: format!("questions-{name}.json"),
        })
        .collect()
}

fn default_blueprint() -> String {
    "blueprint-plumber-ip-2023-stbc.json".to_string()
}

fn default_length() -> usize {
    15
}

fn default_true() -> bool {
    true
}

impl Default for SealexamConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            blueprint: default_blueprint(),
            default_length: default_length(),
            mode: Mode::default(),
            use_blueprint: true,
            banks: default_banks(),
            base_dir: PathBuf::from("."),
        }
    }
}

/// Where a document lives once configuration is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Path(PathBuf),
    Url(String),
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Path(p) => write!(f, "{}", p.display()),
            Location::Url(u) => f.write_str(u),
        }
    }
}

impl SealexamConfig {
    /// Absolute-or-cwd-relative data directory.
    pub fn data_path(&self) -> PathBuf {
        self.base_dir.join(&self.data_dir)
    }

    /// Expand `${VAR}` references and resolve a relative path against the
    /// data directory. URLs pass through.
    pub fn resolve_location(&self, location: &str) -> Location {
        let expanded = resolve_env_vars(location);
        if expanded.starts_with("http://") || expanded.starts_with("https://") {
            return Location::Url(expanded);
        }
        let path = PathBuf::from(expanded);
        if path.is_absolute() {
            Location::Path(path)
        } else {
            Location::Path(self.data_path().join(path))
        }
    }

    pub fn bank_names(&self) -> Vec<String> {
        self.banks.iter().map(|b| b.name.clone()).collect()
    }

    /// Resolved blueprint location, or `None` when disabled.
    pub fn blueprint_location(&self) -> Option<Location> {
        if self.blueprint.trim().is_empty() {
            None
        } else {
            Some(self.resolve_location(&self.blueprint))
        }
    }

    /// Build a loader for every configured bank and the blueprint.
    pub fn loader(&self) -> Result<LibraryLoader> {
        let mut loader = LibraryLoader::new();
        for bank in &self.banks {
            let location = self.resolve_location(&bank.location);
            let source = create_source(&location)
                .with_context(|| format!("bank {}: cannot use {location}", bank.name))?;
            loader = loader.with_bank(bank.name.clone(), source);
        }
        if let Some(location) = self.blueprint_location() {
            let source = create_source(&location)
                .with_context(|| format!("blueprint: cannot use {location}"))?;
            loader = loader.with_blueprint(source);
        }
        Ok(loader)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize config")
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
/// Unset variables expand to the empty string. Expanded values are not
/// scanned again.
pub fn resolve_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        let Some(len) = rest[start + 2..].find('}') else {
            break;
        };
        let var_name = &rest[start + 2..start + 2 + len];
        result.push_str(&rest[..start]);
        result.push_str(&std::env::var(var_name).unwrap_or_default());
        rest = &rest[start + 3 + len..];
    }
    result.push_str(rest);
    result
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order without a path:
/// 1. `sealexam.toml` in the current directory
/// 2. `~/.config/sealexam/config.toml`
///
/// Falls back to built-in defaults. `SEALEXAM_DATA_DIR` overrides `data_dir`.
pub fn load_config_from(path: Option<&Path>) -> Result<SealexamConfig> {
    let data_dir_override = std::env::var(DATA_DIR_ENV).ok().filter(|v| !v.is_empty());
    load_with_override(path, data_dir_override)
}

fn load_with_override(path: Option<&Path>, data_dir: Option<String>) -> Result<SealexamConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let mut config = toml::from_str::<SealexamConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            config.base_dir = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            tracing::debug!("loaded config from {}", path.display());
            config
        }
        None => SealexamConfig::default(),
    };

    if let Some(dir) = data_dir {
        config.data_dir = PathBuf::from(resolve_env_vars(&dir));
    }

    anyhow::ensure!(config.default_length > 0, "default_length must be at least 1");

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("sealexam"))
}

/// Create a source for a resolved location.
pub fn create_source(location: &Location) -> Result<Arc<dyn Source>> {
    match location {
        Location::Path(path) => Ok(Arc::new(FileSource::new(path))),
        Location::Url(url) => Ok(Arc::new(HttpSource::new(url)?)),
    }
}
