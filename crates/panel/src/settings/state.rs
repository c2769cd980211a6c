use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu, ensure};

pub const DEFAULT_REPLY_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_PLACEHOLDER_DELAY_MS: u64 = 500;
pub const DEFAULT_PLACEHOLDER_TITLE: &str = "Generating...";
pub const DEFAULT_PLACEHOLDER_BODY: &str = "Loading...";
pub const DEFAULT_LOG_FILTER: &str = "info";
pub const SETTINGS_DIRECTORY_NAME: &str = "pdlc";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const SETTINGS_ENV_PREFIX: &str = "PDLC_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelSettings {
    #[serde(default = "default_reply_timeout_ms")]
    pub reply_timeout_ms: u64,
    #[serde(default = "default_placeholder_delay_ms")]
    pub placeholder_delay_ms: u64,
    #[serde(default = "default_placeholder_title")]
    pub placeholder_title: String,
    #[serde(default = "default_placeholder_body")]
    pub placeholder_body: String,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for PanelSettings {
    fn default() -> Self {
        Self {
            reply_timeout_ms: default_reply_timeout_ms(),
            placeholder_delay_ms: default_placeholder_delay_ms(),
            placeholder_title: default_placeholder_title(),
            placeholder_body: default_placeholder_body(),
            log_filter: default_log_filter(),
        }
    }
}

impl PanelSettings {
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }

    pub fn placeholder_delay(&self) -> Duration {
        Duration::from_millis(self.placeholder_delay_ms)
    }

    pub fn normalized(mut self) -> Self {
        // A zero timeout would fail every reply before it could start.
        if self.reply_timeout_ms == 0 {
            self.reply_timeout_ms = default_reply_timeout_ms();
        }
        self.placeholder_title = non_blank_or(self.placeholder_title, default_placeholder_title);
        self.placeholder_body = non_blank_or(self.placeholder_body, default_placeholder_body);
        self.log_filter = non_blank_or(self.log_filter, default_log_filter);
        self
    }

    /// Layers defaults, the JSON file at `path` (when present) and `PDLC_*`
    /// environment variables.
    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(PanelSettings::default()))
            .merge(Json::file(path))
            .merge(Env::prefixed(SETTINGS_ENV_PREFIX))
    }
}

pub struct SettingsStore {
    settings: PanelSettings,
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".pdlc"))
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join(SETTINGS_FILE_NAME)
    }

    /// Loads settings, falling back to defaults when the file is unreadable.
    pub fn new(config_path: PathBuf) -> Self {
        let settings = Self::load_lenient(&config_path);
        Self {
            settings,
            config_path,
        }
    }

    pub fn load() -> Self {
        Self::new(Self::default_config_path())
    }

    /// Loads settings from a file the caller named explicitly; a missing or
    /// malformed file is an error instead of a silent fallback.
    pub fn open(config_path: PathBuf) -> SettingsResult<Self> {
        ensure!(
            config_path.exists(),
            MissingFileSnafu {
                stage: "open-settings",
                path: config_path.clone(),
            }
        );

        let settings = PanelSettings::figment(&config_path)
            .extract::<PanelSettings>()
            .context(ExtractSnafu {
                stage: "extract-settings",
                path: config_path.clone(),
            })?
            .normalized();

        tracing::info!("loaded settings from {:?}", config_path);
        Ok(Self {
            settings,
            config_path,
        })
    }

    pub fn settings(&self) -> &PanelSettings {
        &self.settings
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn into_settings(self) -> PanelSettings {
        self.settings
    }

    fn load_lenient(path: &Path) -> PanelSettings {
        if !path.exists() {
            tracing::info!("settings file not found at {:?}, using defaults", path);
        }

        match PanelSettings::figment(path).extract::<PanelSettings>() {
            Ok(settings) => settings.normalized(),
            Err(error) => {
                tracing::warn!(
                    "failed to parse settings from {:?}: {}. using defaults",
                    path,
                    error
                );
                PanelSettings::default()
            }
        }
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("settings file {path:?} does not exist on `{stage}`"))]
    MissingFile { stage: &'static str, path: PathBuf },
    #[snafu(display("failed to read settings from {path:?} on `{stage}`: {source}"))]
    Extract {
        stage: &'static str,
        path: PathBuf,
        source: figment::Error,
    },
}

pub type SettingsResult<T> = Result<T, SettingsError>;

fn non_blank_or(value: String, fallback: fn() -> String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback()
    } else {
        trimmed.to_string()
    }
}

fn default_reply_timeout_ms() -> u64 {
    DEFAULT_REPLY_TIMEOUT_MS
}

fn default_placeholder_delay_ms() -> u64 {
    DEFAULT_PLACEHOLDER_DELAY_MS
}

fn default_placeholder_title() -> String {
    DEFAULT_PLACEHOLDER_TITLE.to_string()
}

fn default_placeholder_body() -> String {
    DEFAULT_PLACEHOLDER_BODY.to_string()
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_placeholder_panel() {
        let settings = PanelSettings::default();

        assert_eq!(settings.placeholder_title, "Generating...");
        assert_eq!(settings.placeholder_body, "Loading...");
        assert_eq!(settings.placeholder_delay(), Duration::from_millis(500));
        assert_eq!(settings.reply_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn partial_json_is_layered_over_defaults() {
        let settings = Figment::from(Serialized::defaults(PanelSettings::default()))
            .merge(Json::string(r#"{"reply_timeout_ms": 1200, "placeholder_title": "Thinking"}"#))
            .extract::<PanelSettings>()
            .unwrap()
            .normalized();

        assert_eq!(settings.reply_timeout_ms, 1200);
        assert_eq!(settings.placeholder_title, "Thinking");
        assert_eq!(settings.placeholder_body, DEFAULT_PLACEHOLDER_BODY);
    }

    #[test]
    fn normalization_restores_unusable_values() {
        let settings = PanelSettings {
            reply_timeout_ms: 0,
            placeholder_delay_ms: 0,
            placeholder_title: "  ".to_string(),
            placeholder_body: String::new(),
            log_filter: " debug ".to_string(),
        }
        .normalized();

        assert_eq!(settings.reply_timeout_ms, DEFAULT_REPLY_TIMEOUT_MS);
        assert_eq!(settings.placeholder_delay_ms, 0);
        assert_eq!(settings.placeholder_title, DEFAULT_PLACEHOLDER_TITLE);
        assert_eq!(settings.placeholder_body, DEFAULT_PLACEHOLDER_BODY);
        assert_eq!(settings.log_filter, "debug");
    }

    #[test]
    fn missing_default_file_falls_back_to_defaults() {
        let path = PathBuf::from("/nonexistent/pdlc/settings.json");
        let store = SettingsStore::new(path.clone());
        assert_eq!(store.settings().placeholder_title, DEFAULT_PLACEHOLDER_TITLE);
        assert_eq!(store.config_path(), path.as_path());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let error = SettingsStore::open(PathBuf::from("/nonexistent/pdlc/settings.json"))
            .err()
            .unwrap();
        assert!(matches!(error, SettingsError::MissingFile { .. }));
    }
}
