use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reader_core::DEFAULT_TOP_K;
use reader_engine::{
    normalize_api_base, ClientSettings, EngineSettings, LlmSettingsUpdate, ViewerSettings,
    DEFAULT_API_BASE,
};
use reader_logging::reader_info;
use serde::{Deserialize, Serialize};

pub(crate) const CONFIG_FILENAME: &str = "config.ron";
const APP_DIR: &str = "reader";

/// Hostname or URL of the backend; bare hostnames are served over https.
pub(crate) const ENV_API_URL: &str = "READER_API_URL";
/// Full backend base URL, used when `READER_API_URL` is unset.
pub(crate) const ENV_API_BASE: &str = "READER_API_BASE";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmOverrides {
    pub chat_base_url: Option<String>,
    pub chat_model: Option<String>,
    pub chat_api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub api_base: String,
    pub top_k: u32,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_file_bytes: u64,
    pub highlight_settle_ms: u64,
    pub highlight_deadline_ms: u64,
    pub suggestions: Vec<String>,
    /// Pushed to the backend's `/settings` on start-up when set.
    pub llm: Option<LlmOverrides>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        let viewer = ViewerSettings::default();
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            top_k: DEFAULT_TOP_K,
            connect_timeout_secs: client.connect_timeout.as_secs(),
            request_timeout_secs: client.request_timeout.as_secs(),
            max_file_bytes: client.max_file_bytes,
            highlight_settle_ms: viewer.settle_delay.as_millis() as u64,
            highlight_deadline_ms: viewer.highlight_deadline.as_millis() as u64,
            suggestions: Vec::new(),
            llm: None,
        }
    }
}

impl ReaderConfig {
    /// Load `config.ron` from `dir`; a missing file yields the defaults.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILENAME);
        let content = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        let config = ron::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;
        reader_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(host) = non_empty(ENV_API_URL) {
            self.api_base = normalize_api_base(&host);
        } else if let Some(base) = non_empty(ENV_API_BASE) {
            self.api_base = base.trim().trim_end_matches('/').to_string();
        }
        self
    }

    pub fn engine_settings(&self) -> EngineSettings {
        let viewer = ViewerSettings::default();
        EngineSettings {
            client: ClientSettings {
                base_url: self.api_base.clone(),
                connect_timeout: Duration::from_secs(self.connect_timeout_secs),
                request_timeout: Duration::from_secs(self.request_timeout_secs),
                max_file_bytes: self.max_file_bytes,
            },
            viewer: ViewerSettings {
                settle_delay: Duration::from_millis(self.highlight_settle_ms),
                highlight_deadline: Duration::from_millis(self.highlight_deadline_ms),
                ..viewer
            },
        }
    }

    /// The settings update to push on start-up, if any field is set.
    pub fn llm_update(&self) -> Option<LlmSettingsUpdate> {
        let llm = self.llm.as_ref()?;
        let update = LlmSettingsUpdate {
            chat_base_url: llm.chat_base_url.clone(),
            chat_model: llm.chat_model.clone(),
            chat_api_key: llm.chat_api_key.clone(),
        };
        (!update.is_empty()).then_some(update)
    }
}

/// Per-user directory holding `config.ron` and `ui_state.ron`.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}
