use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::api::Agent;
use crate::core::builtin_agents::default_roster;
use crate::core::config::io::ConfigError;
use crate::utils::url::{normalize_base_url, validate_base_url};

/// Used when neither the command line, the environment nor the config file
/// names a service.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8788/api";

pub const DEFAULT_GREETING: &str = "Ciao! UI online ✅ Tell me what you want to build next.";

/// Environment override for `base_url`.
pub const BASE_URL_ENV: &str = "CREWDESK_BASE_URL";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Service root, e.g. `https://desk.example.com/api`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Pre-fills the login form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_email: Option<String>,
    /// Shown when the active agent has no messages yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
    /// Replaces the built-in default roster.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agents: Vec<Agent>,
}

/// Keys accepted by `config set` / `config unset`.
pub const CONFIG_KEYS: &[&str] = &["base-url", "login-email", "greeting", "log-file"];

pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl Config {
    /// Precedence: explicit flag, then `CREWDESK_BASE_URL`, then the file,
    /// then [`DEFAULT_BASE_URL`].
    pub fn resolve_base_url(&self, flag: Option<&str>, env: Option<&str>) -> String {
        [flag, env, self.base_url.as_deref()]
            .into_iter()
            .flatten()
            .map(normalize_base_url)
            .find(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn greeting(&self) -> String {
        self.greeting
            .as_deref()
            .map(str::trim)
            .filter(|greeting| !greeting.is_empty())
            .unwrap_or(DEFAULT_GREETING)
            .to_string()
    }

    pub fn default_roster(&self) -> Vec<Agent> {
        default_roster(&self.agents)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: "value must not be empty".to_string(),
            });
        }
        match key {
            "base-url" => {
                let url = validate_base_url(value).map_err(|message| {
                    ConfigError::InvalidValue {
                        key: key.to_string(),
                        message,
                    }
                })?;
                self.base_url = Some(url);
            }
            "login-email" => self.login_email = Some(value.to_string()),
            "greeting" => self.greeting = Some(value.to_string()),
            "log-file" => self.log_file = Some(value.to_string()),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    pub fn unset(&mut self, key: &str) -> Result<(), ConfigError> {
        match key {
            "base-url" => self.base_url = None,
            "login-email" => self.login_email = None,
            "greeting" => self.greeting = None,
            "log-file" => self.log_file = None,
            "agents" => self.agents.clear(),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}
