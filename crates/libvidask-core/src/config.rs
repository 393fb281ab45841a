use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::VidaskError;

/// Environment variable naming an optional TOML config file
pub const CONFIG_PATH_ENV: &str = "VIDASK_CONFIG";
/// Port override
pub const PORT_ENV: &str = "PORT";
/// Comma-separated list of allowed CORS origins
pub const CORS_ORIGIN_ENV: &str = "CORS_ORIGIN";
pub const ENGINE_PROGRAM_ENV: &str = "VIDASK_ENGINE_PROGRAM";
pub const ENGINE_TIMEOUT_ENV: &str = "VIDASK_ENGINE_TIMEOUT_MS";
/// Default name of the variable holding the engine credential
pub const DEFAULT_CREDENTIAL_ENV: &str = "GOOGLE_API_KEY";

/// API credential handed to the engine. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Empty or whitespace-only values count as missing
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// HTTP surface settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Origins allowed to call the API from a browser; empty disables CORS headers
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// How the external engine process is launched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Executable to spawn (e.g. the engine virtualenv's python)
    pub program: PathBuf,
    /// Arguments placed before the request arguments (e.g. the script path)
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    /// Name of the environment variable the credential is passed through
    pub credential_env: String,
    pub timeout_ms: u64,
    /// Ceiling per captured stream; excess output is discarded
    pub max_output_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("python3"),
            args: vec!["rag_section.py".to_string()],
            working_dir: None,
            credential_env: DEFAULT_CREDENTIAL_ENV.to_string(),
            timeout_ms: 120_000,
            max_output_bytes: 4 * 1024 * 1024,
        }
    }
}

impl EngineConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Cache invalidation policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvalidationConfig {
    /// Extra attempts after the first failure (0 = exactly one attempt)
    pub retries: u32,
    pub retry_delay_ms: u64,
    /// Bound on waiting for in-flight clears at shutdown
    pub drain_timeout_ms: u64,
}

impl Default for InvalidationConfig {
    fn default() -> Self {
        Self {
            retries: 0,
            retry_delay_ms: 500,
            drain_timeout_ms: 2_000,
        }
    }
}

/// Process-wide configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub engine: EngineConfig,
    pub invalidation: InvalidationConfig,
    /// Resolved from the environment only
    #[serde(skip)]
    pub credential: Option<Credential>,
}

impl Config {
    /// Load from an optional TOML file, then overlay the process environment
    pub fn load(path: Option<&Path>) -> Result<Self, VidaskError> {
        let env_path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => load_config_file(&path)?,
            None => Config::default(),
        };
        config.apply_env_with(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Overlay values from an environment lookup
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup(PORT_ENV).and_then(|p| p.trim().parse().ok()) {
            self.server.port = port;
        }
        if let Some(origins) = lookup(CORS_ORIGIN_ENV) {
            self.server.cors_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        if let Some(program) = lookup(ENGINE_PROGRAM_ENV).filter(|p| !p.trim().is_empty()) {
            self.engine.program = PathBuf::from(program);
        }
        if let Some(timeout) = lookup(ENGINE_TIMEOUT_ENV).and_then(|t| t.trim().parse().ok()) {
            self.engine.timeout_ms = timeout;
        }
        self.credential = lookup(&self.engine.credential_env).and_then(Credential::new);
    }

    /// The credential, or the configuration error every caller sees without one
    pub fn require_credential(&self) -> Result<&Credential, VidaskError> {
        self.credential
            .as_ref()
            .ok_or_else(|| missing_credential(&self.engine.credential_env))
    }
}

/// Error reported for every engine request while no credential is set
pub fn missing_credential(credential_env: &str) -> VidaskError {
    VidaskError::Configuration(format!(
        "RAG API key is not configured on the server ({} is not set)",
        credential_env
    ))
}

/// Load configuration from a TOML file
pub fn load_config_file(path: &Path) -> Result<Config, VidaskError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    Ok(config)
}
