use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ValetConfig {
    pub assistant: AssistantConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub storage: StorageConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AssistantConfig {
    /// Display name used in the REPL banner and reply panels.
    pub name: String,
    /// Reference timezone for all timestamps and time context (IANA name).
    pub timezone: String,
    pub log_level: String,
    /// Upper bound on tool-call rounds within a single conversation turn.
    pub max_tool_rounds: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Environment variable holding the API key. Checked at startup.
    pub api_key_env: String,
    /// Environment variable holding the web research API key. Optional —
    /// the web_research tool reports itself unconfigured when absent.
    pub research_api_key_env: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    pub dimensions: usize,
    pub api_key_env: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    /// Root data directory; the memory and task indexes live in
    /// subdirectories beneath it.
    pub data_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Default number of results for search operations.
    pub default_limit: usize,
    /// Candidate short-list size when resolving delete/update targets.
    pub candidate_k: usize,
    /// Results pulled from each store when assembling turn context.
    pub context_results: usize,
    /// Token budget for the retrieval query derived from conversation history.
    pub query_token_budget: usize,
}

impl Default for ValetConfig {
    fn default() -> Self {
        Self {
            assistant: AssistantConfig::default(),
            llm: LlmConfig::default(),
            embedding: EmbeddingConfig::default(),
            storage: StorageConfig::default(),
            retrieval: RetrievalConfig::default(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: "Valet".into(),
            timezone: "America/Montreal".into(),
            log_level: "info".into(),
            max_tool_rounds: 8,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o-mini".into(),
            temperature: 0.8,
            max_tokens: 1024,
            api_key_env: "OPENAI_API_KEY".into(),
            research_api_key_env: "TAVILY_API_KEY".into(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            model: "text-embedding-3-small".into(),
            dimensions: 1536,
            api_key_env: "OPENAI_API_KEY".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = default_valet_dir().to_string_lossy().into_owned();
        Self { data_dir }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_limit: 5,
            candidate_k: 5,
            context_results: 5,
            query_token_budget: 500,
        }
    }
}

/// Returns `~/.valet/`
pub fn default_valet_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".valet")
}

/// Returns the default config file path: `~/.valet/config.toml`
pub fn default_config_path() -> PathBuf {
    default_valet_dir().join("config.toml")
}

impl ValetConfig {
    /// Load config from the TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            ValetConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (VALET_DATA_DIR, VALET_TIMEZONE,
    /// VALET_LOG_LEVEL, VALET_MODEL, VALET_BASE_URL).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("VALET_DATA_DIR") {
            self.storage.data_dir = val;
        }
        if let Ok(val) = std::env::var("VALET_TIMEZONE") {
            self.assistant.timezone = val;
        }
        if let Ok(val) = std::env::var("VALET_LOG_LEVEL") {
            self.assistant.log_level = val;
        }
        if let Ok(val) = std::env::var("VALET_MODEL") {
            self.llm.model = val;
        }
        if let Ok(val) = std::env::var("VALET_BASE_URL") {
            self.llm.base_url = val.clone();
            self.embedding.base_url = val;
        }
    }

    /// Resolve the root data directory, expanding `~` if needed.
    pub fn resolved_data_dir(&self) -> PathBuf {
        expand_tilde(&self.storage.data_dir)
    }

    /// Directory holding the memory index.
    pub fn memories_dir(&self) -> PathBuf {
        self.resolved_data_dir().join("memories")
    }

    /// Directory holding the task index.
    pub fn tasks_dir(&self) -> PathBuf {
        self.resolved_data_dir().join("tasks")
    }

    /// Read the required LLM API key from the environment.
    ///
    /// A missing key is a startup error, not a mid-conversation one.
    pub fn require_api_key(&self) -> Result<String> {
        match std::env::var(&self.llm.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => bail!(
                "{} is not set — export your API key before starting",
                self.llm.api_key_env
            ),
        }
    }

    /// Read the optional web research API key from the environment.
    pub fn research_api_key(&self) -> Option<String> {
        std::env::var(&self.llm.research_api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
