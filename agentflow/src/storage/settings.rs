//! Settings file management

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog;
use crate::errors::FlowError;
use crate::filesys::file::File;
use crate::gateway::memory::DEFAULT_EXECUTION_CAPACITY;
use crate::logs::LogLevel;

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub log_level: LogLevel,

    /// Remote workflow backend
    #[serde(default)]
    pub backend: BackendSettings,

    /// Local API server
    #[serde(default)]
    pub server: ServerSettings,

    /// Skills advertised by the local server
    #[serde(default = "default_skills")]
    pub skills: Vec<String>,
}

fn default_skills() -> Vec<String> {
    catalog::known_skills()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            backend: BackendSettings::default(),
            server: ServerSettings::default(),
            skills: default_skills(),
        }
    }
}

/// Backend API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL for the backend API
    #[serde(default = "default_backend_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_backend_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout() -> u64 {
    60
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: default_backend_url(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Local HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Finished execution records kept in memory
    #[serde(default = "default_max_executions")]
    pub max_executions: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_executions() -> usize {
    DEFAULT_EXECUTION_CAPACITY
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_executions: default_max_executions(),
        }
    }
}

/// Load settings from `file`, falling back to defaults when it does not exist
pub async fn load_settings(file: &File) -> Result<Settings, FlowError> {
    if !file.exists().await {
        info!("No settings at {}, using defaults", file.path().display());
        return Ok(Settings::default());
    }
    file.read_json().await
}
