use crate::error::{RateError, Result};
use crate::types::{Category, Sides};
use crate::vendors;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Required/excluded substrings that recognise a table by its rendered text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSignature {
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub excluded: Vec<String>,
}

impl TableSignature {
    pub fn new(required: &[&str], excluded: &[&str]) -> Self {
        Self {
            required: required.iter().map(|s| s.to_string()).collect(),
            excluded: excluded.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.required.iter().all(|t| text.contains(t.as_str()))
            && !self.excluded.iter().any(|t| text.contains(t.as_str()))
    }
}

/// How header rows are recognised on the reliable path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderSkipStrategy {
    /// Row 0 is the header.
    ByPosition,
    /// Rows whose label is blank or carries a banner token are headers.
    ByContentFilter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryProfile {
    pub category: Category,
    pub sides: Sides,
    pub signature: TableSignature,
    /// Check applied to the positional fallback table; defaults to `signature`.
    #[serde(default)]
    pub fallback_signature: Option<TableSignature>,
    /// Banner tokens that mark a header or noise row on the content-filter path.
    #[serde(default)]
    pub header_tokens: Vec<String>,
}

impl CategoryProfile {
    pub fn fallback_signature(&self) -> &TableSignature {
        self.fallback_signature.as_ref().unwrap_or(&self.signature)
    }
}

/// Maps a raw row label onto a canonical detail name when every token is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRule {
    pub tokens: Vec<String>,
    /// May contain `{purity}`; such a rule only applies when a purity was found.
    pub output: String,
    /// Restricts the rule to one category; `None` applies everywhere.
    #[serde(default)]
    pub category: Option<Category>,
}

impl LabelRule {
    pub fn new(tokens: &[&str], output: &str, category: Option<Category>) -> Self {
        Self {
            tokens: tokens.iter().map(|s| s.to_string()).collect(),
            output: output.to_string(),
            category,
        }
    }
}

/// Static per-vendor configuration driving classification and extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorProfile {
    pub vendor_id: String,
    pub display_name: String,
    pub url: String,
    pub header_skip: HeaderSkipStrategy,
    /// Most specific first; matching still prefers the longest literal.
    #[serde(default)]
    pub purity_tokens: Vec<String>,
    /// Category that falls back to the first table when no signature matches.
    #[serde(default)]
    pub primary_category: Option<Category>,
    pub categories: Vec<CategoryProfile>,
    #[serde(default)]
    pub label_rules: Vec<LabelRule>,
}

impl VendorProfile {
    pub fn category(&self, category: Category) -> Option<&CategoryProfile> {
        self.categories.iter().find(|c| c.category == category)
    }

    pub fn validate(&self) -> Result<()> {
        if self.vendor_id.trim().is_empty() {
            return Err(RateError::Config("vendor_id must not be empty".into()));
        }
        if self.categories.is_empty() {
            return Err(RateError::Config(format!(
                "vendor '{}' defines no categories",
                self.vendor_id
            )));
        }
        for (i, c) in self.categories.iter().enumerate() {
            if self.categories[..i].iter().any(|p| p.category == c.category) {
                return Err(RateError::Config(format!(
                    "vendor '{}' defines category {} twice",
                    self.vendor_id, c.category
                )));
            }
        }
        if let Some(primary) = self.primary_category {
            if self.category(primary).is_none() {
                return Err(RateError::Config(format!(
                    "vendor '{}' names primary category {} but does not define it",
                    self.vendor_id, primary
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_ready_timeout_secs")]
    pub ready_timeout_secs: u64,
    /// Extra wait after the page reports ready, for late table scripts.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl FetchConfig {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.ready_timeout_secs)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            ready_timeout_secs: default_ready_timeout_secs(),
            settle_ms: default_settle_ms(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self { interval_secs: default_interval_secs() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { dir: default_log_dir() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_vendor")]
    pub default_vendor: String,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub vendors: Vec<VendorProfile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_vendor: default_vendor(),
            database: DatabaseConfig::default(),
            fetch: FetchConfig::default(),
            schedule: ScheduleConfig::default(),
            logging: LoggingConfig::default(),
            vendors: Vec::new(),
        }
    }
}

impl Config {
    /// Loads `config.toml` from the working directory, or defaults when it is missing.
    pub fn load() -> Result<Self> {
        let path = Path::new("config.toml");
        if path.exists() {
            Self::load_from(path)
        } else {
            let mut config = Self::default();
            config.apply_env();
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            RateError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let mut config = Self::from_toml(&content)?;
        config.apply_env();
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        for profile in &config.vendors {
            profile.validate()?;
        }
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("GOLD_RATES_DB_PATH") {
            if !path.trim().is_empty() {
                self.database.path = PathBuf::from(path);
            }
        }
    }

    /// Built-in profiles with configured ones layered on top by `vendor_id`.
    pub fn vendor_profiles(&self) -> Vec<VendorProfile> {
        let mut profiles = vendors::builtin_profiles();
        for configured in &self.vendors {
            match profiles.iter_mut().find(|p| p.vendor_id == configured.vendor_id) {
                Some(existing) => *existing = configured.clone(),
                None => profiles.push(configured.clone()),
            }
        }
        profiles
    }

    pub fn vendor(&self, vendor_id: &str) -> Result<VendorProfile> {
        self.vendor_profiles()
            .into_iter()
            .find(|p| p.vendor_id == vendor_id)
            .ok_or_else(|| RateError::UnknownVendor(vendor_id.to_string()))
    }
}

fn default_vendor() -> String {
    crate::constants::TTT_BULLION.to_string()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/gold_rates.db")
}

fn default_ready_timeout_secs() -> u64 {
    crate::constants::DEFAULT_READY_TIMEOUT_SECS
}

fn default_settle_ms() -> u64 {
    crate::constants::DEFAULT_SETTLE_MS
}

fn default_user_agent() -> String {
    format!("gold_rates/{}", env!("CARGO_PKG_VERSION"))
}

fn default_interval_secs() -> u64 {
    3600
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}
