//! Configuration management for larkpub.
//!
//! Parses `larkpub.toml` with serde and discovers the file in the current
//! directory or any parent. [`CliSettings`] lets command-line flags override
//! values after loading.
//!
//! ## Environment Variable Expansion
//!
//! Secrets should not live in the file. These fields accept `${VAR}` and
//! `${VAR:-default}`:
//!
//! - `server.host`
//! - `lark.base_url`
//! - `lark.app_id`
//! - `lark.app_secret`
//! - `targets[].document_id`

mod expand;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "larkpub.toml";

/// Default Lark Open API base URL.
pub const DEFAULT_BASE_URL: &str = "https://open.larksuite.com/open-apis";

/// Largest page the docx children listing accepts.
pub const MAX_PAGE_SIZE: u32 = 500;

/// CLI settings that override configuration file values.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override the Lark Open API base URL.
    pub base_url: Option<String>,
    /// Override the retry budget for docx calls.
    pub max_retries: Option<u32>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP trigger configuration.
    pub server: ServerConfig,
    /// Lark application credentials (required for any upstream call).
    pub lark: Option<LarkConfig>,
    /// Retry policy for docx and drive calls.
    pub retry: RetryConfig,
    /// Document clearing limits.
    pub clear: ClearConfig,
    /// Report narrative and date settings.
    pub report: ReportConfig,
    /// Image source configuration (paths are relative strings from TOML).
    renderer: RendererConfigRaw,
    /// Documents to publish into.
    pub targets: Vec<TargetConfig>,

    /// Resolved image source configuration (set after loading).
    #[serde(skip)]
    pub renderer_resolved: RendererConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// HTTP trigger configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 18891,
        }
    }
}

/// Lark application credentials and endpoint.
#[derive(Debug, Deserialize)]
pub struct LarkConfig {
    /// Open API base URL, without trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Application ID.
    pub app_id: String,
    /// Application secret.
    pub app_secret: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl LarkConfig {
    /// Validate that all required fields are properly set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any field is empty or has invalid format.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.base_url, "lark.base_url")?;
        require_http_url(&self.base_url, "lark.base_url")?;
        require_non_empty(&self.app_id, "lark.app_id")?;
        require_non_empty(&self.app_secret, "lark.app_secret")?;
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "lark.timeout_secs must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    /// Request timeout as a [`Duration`].
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Retry policy settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Base delay in milliseconds; attempt `k` waits `base * 2^k`.
    pub backoff_base_ms: u64,
    /// Optional ceiling for a single delay in milliseconds.
    pub max_backoff_ms: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_base_ms: 500,
            max_backoff_ms: None,
        }
    }
}

impl RetryConfig {
    /// Base backoff delay.
    #[must_use]
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    /// Delay ceiling, if configured.
    #[must_use]
    pub fn max_backoff(&self) -> Option<Duration> {
        self.max_backoff_ms.map(Duration::from_millis)
    }
}

/// Document clearing limits.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ClearConfig {
    /// Children fetched per listing (1..=500).
    pub page_size: u32,
    /// Maximum delete rounds before giving up on an ever-refilling document.
    pub max_rounds: u32,
}

impl Default for ClearConfig {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            max_rounds: 100,
        }
    }
}

/// Report narrative settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// UTC offset used to compute "yesterday", as `+HH:MM` or `-HH:MM`.
    pub utc_offset: String,
    /// File name sent with the uploaded image.
    pub image_name: String,
    /// Styled runs of the narrative text block; `{date}` is substituted.
    pub runs: Vec<RunConfig>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            utc_offset: "+08:00".to_owned(),
            image_name: "screenshot_in_memory.png".to_owned(),
            runs: default_runs(),
        }
    }
}

impl ReportConfig {
    /// Parse `utc_offset` into seconds east of UTC.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the offset is malformed or out of range.
    pub fn utc_offset_seconds(&self) -> Result<i32, ConfigError> {
        parse_utc_offset(&self.utc_offset).ok_or_else(|| {
            ConfigError::Validation(format!(
                "report.utc_offset must look like +08:00, got {:?}",
                self.utc_offset
            ))
        })
    }
}

/// One styled run of the narrative text.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunConfig {
    /// Run text; `{date}` is replaced by the report date.
    pub text: String,
    /// Bold run.
    pub bold: bool,
    /// Italic run.
    pub italic: bool,
    /// Underlined run.
    pub underline: bool,
    /// Struck-through run.
    pub strikethrough: bool,
    /// Lark font color index (1-7).
    pub text_color: Option<u8>,
}

impl RunConfig {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_owned(),
            ..Self::default()
        }
    }
}

fn default_runs() -> Vec<RunConfig> {
    vec![
        RunConfig::plain("本文对"),
        RunConfig {
            text_color: Some(3),
            underline: true,
            ..RunConfig::plain("DeCard")
        },
        RunConfig::plain(
            "产品用户进行基础客户画像和行为分析（初步），为客户运营提供方案，\
             以提升客户体验以及推动产品使用和销售的重要策略。\
             卡产品包含：MV3789 - Master新币卡，UV3701 - 银联新币卡，数据截止 ",
        ),
        RunConfig {
            underline: true,
            ..RunConfig::plain("{date}")
        },
        RunConfig::plain("。"),
    ]
}

/// Report template selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    /// Global report.
    Global,
    /// Regional (Singapore) report.
    #[serde(alias = "sg")]
    Regional,
}

impl Region {
    /// Config spelling of the region.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Regional => "regional",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "global" => Ok(Self::Global),
            "regional" | "sg" => Ok(Self::Regional),
            other => Err(ConfigError::Validation(format!(
                "unknown region {other:?} (expected global, regional or sg)"
            ))),
        }
    }
}

/// One document to publish into.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TargetConfig {
    /// Docx document ID (also the root block ID).
    pub document_id: String,
    /// Report template to render for this document.
    pub region: Region,
}

/// How report images are produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Screenshot an HTML report with a headless browser.
    #[default]
    Browser,
    /// Read pre-rendered PNG files.
    File,
}

/// Raw image source configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RendererConfigRaw {
    kind: RendererKind,
    browser: String,
    window_width: u32,
    window_height: u32,
    sources: BTreeMap<Region, String>,
}

impl Default for RendererConfigRaw {
    fn default() -> Self {
        let resolved = RendererConfig::default();
        Self {
            kind: resolved.kind,
            browser: resolved.browser,
            window_width: resolved.window_width,
            window_height: resolved.window_height,
            sources: BTreeMap::new(),
        }
    }
}

/// Resolved image source configuration with absolute paths.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Source kind.
    pub kind: RendererKind,
    /// Browser executable for [`RendererKind::Browser`].
    pub browser: String,
    /// Screenshot viewport width in pixels.
    pub window_width: u32,
    /// Screenshot viewport height in pixels.
    pub window_height: u32,
    /// Per-region HTML report (browser) or PNG file (file).
    pub sources: BTreeMap<Region, PathBuf>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            kind: RendererKind::Browser,
            browser: "chromium".to_owned(),
            window_width: 1400,
            window_height: 9000,
            sources: BTreeMap::new(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`lark.app_secret`").
        field: String,
        /// Error message (e.g., "${`LARK_APP_SECRET`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Parse `+HH:MM` / `-HH:MM` (or `Z`) into seconds east of UTC.
fn parse_utc_offset(value: &str) -> Option<i32> {
    if value.eq_ignore_ascii_case("z") {
        return Some(0);
    }
    let (sign, rest) = match value.as_bytes().first()? {
        b'+' => (1, &value[1..]),
        b'-' => (-1, &value[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    Some(sign * (hours * 3600 + minutes * 60))
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `larkpub.toml` in current directory and parents.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the loaded values are invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(base_url) = &settings.base_url
            && let Some(lark) = self.lark.as_mut()
        {
            lark.base_url = base_url.trim_end_matches('/').to_owned();
        }
        if let Some(max_retries) = settings.max_retries {
            self.retry.max_retries = max_retries;
        }
    }

    /// Get validated Lark configuration.
    ///
    /// Use this instead of accessing the `lark` field directly when the
    /// command talks to the Open API.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if the section is missing or invalid.
    pub fn require_lark(&self) -> Result<&LarkConfig, ConfigError> {
        let lark = self
            .lark
            .as_ref()
            .ok_or_else(|| ConfigError::Validation("[lark] section required in config".into()))?;
        lark.validate()?;
        Ok(lark)
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// The `[lark]` section is only checked when present; commands that need
    /// it call [`Config::require_lark`].
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        if let Some(lark) = &self.lark {
            lark.validate()?;
        }
        self.validate_retry()?;
        self.validate_clear()?;
        self.validate_report()?;
        self.validate_targets()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;
        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_retry(&self) -> Result<(), ConfigError> {
        if let Some(max) = self.retry.max_backoff_ms
            && max < self.retry.backoff_base_ms
        {
            return Err(ConfigError::Validation(
                "retry.max_backoff_ms cannot be smaller than retry.backoff_base_ms".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_clear(&self) -> Result<(), ConfigError> {
        if self.clear.page_size == 0 || self.clear.page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::Validation(format!(
                "clear.page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        if self.clear.max_rounds == 0 {
            return Err(ConfigError::Validation(
                "clear.max_rounds must be greater than 0".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_report(&self) -> Result<(), ConfigError> {
        self.report.utc_offset_seconds()?;
        require_non_empty(&self.report.image_name, "report.image_name")?;
        if self.report.runs.iter().all(|run| run.text.is_empty()) {
            return Err(ConfigError::Validation(
                "report.runs must contain some text".to_owned(),
            ));
        }
        Ok(())
    }

    fn validate_targets(&self) -> Result<(), ConfigError> {
        for (i, target) in self.targets.iter().enumerate() {
            require_non_empty(&target.document_id, &format!("targets[{i}].document_id"))?;
            if self.targets[..i]
                .iter()
                .any(|t| t.document_id == target.document_id)
            {
                return Err(ConfigError::Validation(format!(
                    "targets[{i}].document_id {} is listed twice",
                    target.document_id
                )));
            }
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        expand::expand_in_place(&mut self.server.host, "server.host")?;

        if let Some(ref mut lark) = self.lark {
            expand::expand_in_place(&mut lark.base_url, "lark.base_url")?;
            expand::expand_in_place(&mut lark.app_id, "lark.app_id")?;
            expand::expand_in_place(&mut lark.app_secret, "lark.app_secret")?;
            lark.base_url = lark.base_url.trim_end_matches('/').to_owned();
        }

        for (i, target) in self.targets.iter_mut().enumerate() {
            expand::expand_in_place(
                &mut target.document_id,
                &format!("targets[{i}].document_id"),
            )?;
        }

        Ok(())
    }

    /// Resolve relative source paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let raw = &self.renderer;
        self.renderer_resolved = RendererConfig {
            kind: raw.kind,
            browser: raw.browser.clone(),
            window_width: raw.window_width,
            window_height: raw.window_height,
            sources: raw
                .sources
                .iter()
                .map(|(region, path)| (*region, config_dir.join(path)))
                .collect(),
        };
    }
}
