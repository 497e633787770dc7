use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

/// Environment variable checked first at runtime (and baked in at build time)
pub const PRIMARY_KEY_VAR: &str = "GROQ_AGENT_API_KEY";
/// Legacy name still honoured after the primary one
pub const SECONDARY_KEY_VAR: &str = "GROQ_API_KEY";

/// Optional on-disk settings. Read only; the session key is never written back.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("groq-agent").join("config.json"))
    }
}

/// Where the startup key came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    BuildTime,
    PrimaryEnv,
    SecondaryEnv,
    ConfigFile,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::BuildTime => "build",
            KeySource::PrimaryEnv => "env",
            KeySource::SecondaryEnv => "env (legacy)",
            KeySource::ConfigFile => "config",
        }
    }
}

/// Every place a key may come from, in priority order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySources {
    pub build_time_key: Option<String>,
    pub global_key_primary: Option<String>,
    pub global_key_secondary: Option<String>,
    pub config_key: Option<String>,
}

impl KeySources {
    /// Probe the process. Unset, non-UTF-8 and unreadable sources all count as absent.
    pub fn from_environment(config: &Config) -> Self {
        Self {
            build_time_key: option_env!("GROQ_AGENT_API_KEY").map(str::to_string),
            global_key_primary: std::env::var(PRIMARY_KEY_VAR).ok(),
            global_key_secondary: std::env::var(SECONDARY_KEY_VAR).ok(),
            config_key: config.api_key.clone(),
        }
    }

    pub fn resolve(&self) -> Option<(KeySource, String)> {
        [
            (KeySource::BuildTime, &self.build_time_key),
            (KeySource::PrimaryEnv, &self.global_key_primary),
            (KeySource::SecondaryEnv, &self.global_key_secondary),
            (KeySource::ConfigFile, &self.config_key),
        ]
        .into_iter()
        .find_map(|(source, key)| match key.as_deref() {
            Some(k) if !k.is_empty() => Some((source, k.to_string())),
            _ => None,
        })
    }

    pub fn resolve_api_key(&self) -> String {
        self.resolve().map(|(_, key)| key).unwrap_or_default()
    }
}
