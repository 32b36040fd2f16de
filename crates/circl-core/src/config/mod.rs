use crate::error::{CirclError, Result};
use config::{Config, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CirclConfig {
    #[serde(default)]
    pub user: UserConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub insights: InsightsConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserConfig {
    /// Owner of every row this installation reads or writes. Written by `circl init`.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Custom path for the SQLite database. Defaults to `~/.config/circl/circl.db`.
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub env_var: Option<String>,
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: usize,
    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_llm_max_retries")]
    pub max_retries: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: default_llm_provider(),
            model: default_llm_model(),
            api_key: None,
            base_url: None,
            env_var: None,
            max_tokens: default_llm_max_tokens(),
            temperature: default_llm_temperature(),
            timeout_secs: default_llm_timeout_secs(),
            max_retries: default_llm_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Row count above which the importer warns. Not enforced.
    #[serde(default = "default_max_rows_hint")]
    pub max_rows_hint: usize,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_rows_hint: default_max_rows_hint(),
            delimiter: default_delimiter(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsConfig {
    #[serde(default = "default_cache_hours")]
    pub cache_hours: i64,
    #[serde(default = "default_min_recommendations")]
    pub min_recommendations: usize,
    #[serde(default = "default_max_context_contacts")]
    pub max_context_contacts: usize,
    #[serde(default = "default_recent_activity_days")]
    pub recent_activity_days: i64,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            cache_hours: default_cache_hours(),
            min_recommendations: default_min_recommendations(),
            max_context_contacts: default_max_context_contacts(),
            recent_activity_days: default_recent_activity_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: default_min_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub enabled: bool,
    /// HTTP endpoint of the email-sending function.
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_email_from")]
    pub from: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: None,
            api_key: None,
            from: default_email_from(),
        }
    }
}

/// Upper bounds for the insight windows: a year of caching, ten years of
/// "recent" activity.
pub const MAX_CACHE_HOURS: i64 = 24 * 365;
pub const MAX_RECENT_ACTIVITY_DAYS: i64 = 3650;

/// Valid LLM provider names.
pub const VALID_LLM_PROVIDERS: &[&str] = &["proxy", "ollama", "openai", "anthropic"];

// -- Defaults --

fn default_true() -> bool {
    true
}
fn default_llm_provider() -> String {
    "proxy".to_string()
}
fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_llm_max_tokens() -> usize {
    1000
}
fn default_llm_temperature() -> f32 {
    0.7
}
fn default_llm_timeout_secs() -> u64 {
    30
}
fn default_llm_max_retries() -> usize {
    2
}
fn default_max_rows_hint() -> usize {
    5000
}
fn default_delimiter() -> char {
    ','
}
fn default_cache_hours() -> i64 {
    24
}
fn default_min_recommendations() -> usize {
    3
}
fn default_max_context_contacts() -> usize {
    10
}
fn default_recent_activity_days() -> i64 {
    7
}
fn default_min_interval_ms() -> u64 {
    500
}
fn default_email_from() -> String {
    "Circl <hello@circl.app>".to_string()
}

impl CirclConfig {
    /// Load configuration with three-layer TOML merge:
    /// 1. ~/.config/circl/config.toml (global)
    /// 2. .circl/config.toml (project)
    /// 3. .circl/config.local.toml (local, gitignored)
    pub fn load(project_dir: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                builder = builder.add_source(File::from(global_path).required(false));
            }
        }

        if let Some(dir) = project_dir {
            let project_config = dir.join(".circl").join("config.toml");
            if project_config.exists() {
                builder = builder.add_source(File::from(project_config).required(false));
            }

            let local_config = dir.join(".circl").join("config.local.toml");
            if local_config.exists() {
                builder = builder.add_source(File::from(local_config).required(false));
            }
        }

        let config = builder
            .build()
            .map_err(|e| CirclError::Config(e.to_string()))?;

        let mut cfg: Self = config
            .try_deserialize()
            .map_err(|e| CirclError::Config(e.to_string()))?;

        cfg.validate();
        Ok(cfg)
    }

    /// Load with defaults only (no files).
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Validate config values, clamping out-of-range values and logging warnings.
    /// Lenient: fixes values rather than rejecting the config.
    pub fn validate(&mut self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.llm.enabled && !VALID_LLM_PROVIDERS.contains(&self.llm.provider.as_str()) {
            warnings.push(format!(
                "unknown LLM provider '{}', valid: {}",
                self.llm.provider,
                VALID_LLM_PROVIDERS.join(", ")
            ));
        }

        if self.llm.max_tokens == 0 {
            warnings.push("llm.max_tokens = 0, setting to 256".to_string());
            self.llm.max_tokens = 256;
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            warnings.push(format!(
                "llm.temperature = {} out of range [0.0, 2.0], clamping",
                self.llm.temperature
            ));
            self.llm.temperature = self.llm.temperature.clamp(0.0, 2.0);
        }

        if self.llm.timeout_secs == 0 {
            warnings.push("llm.timeout_secs = 0, setting to 1".to_string());
            self.llm.timeout_secs = 1;
        }

        if self.insights.cache_hours <= 0 {
            warnings.push(format!(
                "insights.cache_hours = {}, setting to 1",
                self.insights.cache_hours
            ));
            self.insights.cache_hours = 1;
        } else if self.insights.cache_hours > MAX_CACHE_HOURS {
            warnings.push(format!(
                "insights.cache_hours = {}, capping at {MAX_CACHE_HOURS}",
                self.insights.cache_hours
            ));
            self.insights.cache_hours = MAX_CACHE_HOURS;
        }

        if self.insights.recent_activity_days <= 0 {
            warnings.push(format!(
                "insights.recent_activity_days = {}, setting to 1",
                self.insights.recent_activity_days
            ));
            self.insights.recent_activity_days = 1;
        } else if self.insights.recent_activity_days > MAX_RECENT_ACTIVITY_DAYS {
            warnings.push(format!(
                "insights.recent_activity_days = {}, capping at {MAX_RECENT_ACTIVITY_DAYS}",
                self.insights.recent_activity_days
            ));
            self.insights.recent_activity_days = MAX_RECENT_ACTIVITY_DAYS;
        }

        if self.insights.max_context_contacts == 0 {
            warnings.push("insights.max_context_contacts = 0, setting to 1".to_string());
            self.insights.max_context_contacts = 1;
        }

        if self.import.max_rows_hint == 0 {
            warnings.push("import.max_rows_hint = 0, setting to 5000".to_string());
            self.import.max_rows_hint = default_max_rows_hint();
        }

        if !self.import.delimiter.is_ascii() {
            warnings.push(format!(
                "import.delimiter '{}' is not ASCII, using ','",
                self.import.delimiter
            ));
            self.import.delimiter = ',';
        }

        if let Some(ref id) = self.user.id {
            if Uuid::parse_str(id).is_err() {
                warnings.push(format!("user.id '{id}' is not a valid UUID"));
            }
        }

        if self.email.enabled && self.email.endpoint.is_none() {
            warnings.push(
                "email.enabled = true but email.endpoint is unset; emails will be skipped"
                    .to_string(),
            );
        }

        for w in &warnings {
            tracing::warn!("config: {}", w);
        }

        warnings
    }

    /// The configured owner id. Missing or malformed ids are a config error
    /// that tells the user how to fix it.
    pub fn user_id(&self) -> Result<Uuid> {
        let raw = self.user.id.as_deref().ok_or_else(|| {
            CirclError::Config("no user id configured (run `circl init`)".to_string())
        })?;
        Uuid::parse_str(raw)
            .map_err(|e| CirclError::Config(format!("user.id '{raw}' is not a valid UUID: {e}")))
    }

    /// Resolved SQLite path: `[storage] path` or `~/.config/circl/circl.db`.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.storage.path {
            Some(p) => Ok(PathBuf::from(p)),
            None => data_dir().map(|d| d.join("circl.db")),
        }
    }
}

/// `~/.config/circl`
pub fn data_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|p| p.join("circl"))
        .ok_or_else(|| CirclError::Config("cannot determine config directory".to_string()))
}

pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("circl").join("config.toml"))
}

/// Write a fresh config with a newly minted user id to `path`.
///
/// Refuses to overwrite an existing file so `circl init` is safe to re-run.
pub fn write_initial_config(path: &Path, email: Option<&str>) -> Result<CirclConfig> {
    if path.exists() {
        return Err(CirclError::Config(format!(
            "config already exists at {}",
            path.display()
        )));
    }
    let cfg = CirclConfig {
        user: UserConfig {
            id: Some(Uuid::now_v7().to_string()),
            email: email.map(str::to_string),
        },
        ..Default::default()
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| CirclError::Config(format!("failed to create config dir: {e}")))?;
    }
    let toml_str = toml::to_string_pretty(&cfg)
        .map_err(|e| CirclError::Config(format!("failed to serialize config: {e}")))?;
    std::fs::write(path, toml_str)
        .map_err(|e| CirclError::Config(format!("failed to write config: {e}")))?;
    Ok(cfg)
}
