// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use fatoora_app::{Language, PageSize, View};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const CONFIG_VERSION: i64 = 1;
const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
const DEFAULT_API_TIMEOUT: &str = "10s";
const DEFAULT_LOG_LEVEL: &str = "info";
const DASHBOARD_VIEW: &str = "dashboard";

/// On-disk settings. Every section is optional and unknown keys are
/// rejected so typos surface instead of silently falling back.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub ui: UiSection,
    #[serde(default)]
    pub log: LogSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiSection {
    pub base_url: String,
    pub timeout: String,
    pub send_path: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageSection {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UiSection {
    pub start_view: String,
    pub page_size: usize,
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSection {
    pub level: String,
    pub path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: ApiSection::default(),
            storage: StorageSection::default(),
            ui: UiSection::default(),
            log: LogSection::default(),
        }
    }
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_owned(),
            timeout: DEFAULT_API_TIMEOUT.to_owned(),
            send_path: fatoora_api::DEFAULT_SEND_PATH.to_owned(),
        }
    }
}

impl Default for UiSection {
    fn default() -> Self {
        Self {
            start_view: DASHBOARD_VIEW.to_owned(),
            page_size: PageSize::default().rows(),
            language: Language::default().code().to_owned(),
        }
    }
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_owned(),
            path: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("FATOORA_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }
        let root = dirs::config_dir().ok_or_else(|| {
            anyhow!("no config directory here; set FATOORA_CONFIG_PATH to the config file")
        })?;
        let dir = root.join(fatoora_db::APP_NAME);
        fs::create_dir_all(&dir)
            .with_context(|| format!("create config directory {}", dir.display()))?;
        Ok(dir.join("config.toml"))
    }

    /// Reads `path`, or returns defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("config {}", path.display()))
    }

    fn parse(raw: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(raw).context("parse TOML")?;
        match table.get("version").and_then(toml::Value::as_integer) {
            Some(CONFIG_VERSION) => {}
            Some(other) => bail!(
                "unsupported config version {other}; set version = 1 (see --print-example-config)"
            ),
            None => bail!(
                "missing `version = 1`; settings go under [api], [storage], [ui], and [log]"
            ),
        }
        let config: Self = toml::Value::Table(table)
            .try_into()
            .context("decode settings")?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if let Some(db_path) = &self.storage.db_path {
            fatoora_db::validate_db_path(db_path)?;
        }
        if self.api_timeout()?.is_zero() {
            bail!("api.timeout must be positive, got {:?}", self.api.timeout);
        }
        if !self.api.send_path.starts_with('/') {
            bail!(
                "api.send_path must start with '/', got {:?}",
                self.api.send_path
            );
        }
        self.start_view()?;
        self.page_size()?;
        self.language()?;
        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        self.storage
            .db_path
            .as_ref()
            .map_or_else(fatoora_db::default_db_path, |path| Ok(PathBuf::from(path)))
    }

    pub fn api_base_url(&self) -> &str {
        self.api.base_url.trim_end_matches('/')
    }

    pub fn api_timeout(&self) -> Result<Duration> {
        parse_duration(&self.api.timeout).context("api.timeout")
    }

    pub fn api_send_path(&self) -> &str {
        &self.api.send_path
    }

    pub fn start_view(&self) -> Result<View> {
        let raw = self.ui.start_view.as_str();
        if raw == DASHBOARD_VIEW {
            return Ok(View::Dashboard);
        }
        View::from_path(raw).ok_or_else(|| {
            anyhow!(
                "ui.start_view {raw:?} must be dashboard, create-invoice, or recurring-invoice"
            )
        })
    }

    pub fn page_size(&self) -> Result<PageSize> {
        PageSize::from_rows(self.ui.page_size).ok_or_else(|| {
            anyhow!(
                "ui.page_size must be 10, 20, or 50, got {}",
                self.ui.page_size
            )
        })
    }

    pub fn language(&self) -> Result<Language> {
        Language::parse(&self.ui.language).ok_or_else(|| {
            anyhow!(
                "ui.language must be \"en\" or \"ar\", got {:?}",
                self.ui.language
            )
        })
    }

    /// `FATOORA_LOG` overrides `[log].level` for a single run.
    pub fn log_level(&self) -> String {
        match env::var("FATOORA_LOG") {
            Ok(level) if !level.trim().is_empty() => level,
            _ => self.log.level.clone(),
        }
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.log.path {
            return Ok(PathBuf::from(path));
        }
        let root = dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .ok_or_else(|| anyhow!("no state directory on this platform; set [log].path"))?;
        Ok(root.join(fatoora_db::APP_NAME).join("fatoora.log"))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            r#"# fatoora config
# Place this file at: {path}

version = 1

[api]
base_url = "{base_url}"
timeout = "{timeout}"
send_path = "{send_path}"

[storage]
# Optional. Default is the platform data dir (for example ~/.local/share/fatoora/drafts.db)
# db_path = "/absolute/path/to/drafts.db"

[ui]
# dashboard, create-invoice, or recurring-invoice
start_view = "dashboard"
page_size = 10
language = "en"

[log]
level = "{level}"
# path = "/absolute/path/to/fatoora.log"
"#,
            path = path.display(),
            base_url = DEFAULT_API_BASE_URL,
            timeout = DEFAULT_API_TIMEOUT,
            send_path = fatoora_api::DEFAULT_SEND_PATH,
            level = DEFAULT_LOG_LEVEL,
        )
    }
}

/// Accepts `<N>ms`, `<N>s` or `<N>m`.
fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    let split = raw
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let value: u64 = digits
        .parse()
        .with_context(|| format!("invalid duration {raw:?}; expected a number like 500ms or 10s"))?;
    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value.saturating_mul(60))),
        other => bail!("invalid duration unit {other:?} in {raw:?}; use ms, s, or m"),
    }
}
