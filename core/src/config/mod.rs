// Copyright (c) 2025 ByteDance Ltd. and/or its affiliates
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use yaml_rust::{Yaml, YamlLoader};

use crate::relay::RelaySettings;

pub const DEFAULT_MODEL: &str = "gpt-5";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CORS_ORIGIN: &str = "*";
pub const DEFAULT_API_BASE: &str = "http://localhost:8787";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful mobile assistant.";

pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_MODEL: &str = "OPENAI_MODEL";
pub const ENV_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_CORS_ORIGIN: &str = "CORS_ORIGIN";
pub const ENV_HEARTBEAT_SECS: &str = "RELAY_HEARTBEAT_SECS";
pub const ENV_MAX_STREAM_SECS: &str = "RELAY_MAX_STREAM_SECS";
pub const ENV_IDLE_TIMEOUT_SECS: &str = "RELAY_IDLE_TIMEOUT_SECS";
pub const ENV_API_BASE: &str = "POCKETCHAT_API_BASE";

/// Upper bound for any configured duration: one day
pub const MAX_DURATION_SECS: u64 = 86_400;

/// Config errors
#[derive(Debug, Clone, Serialize, Deserialize, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to load file: {0}")]
    LoadFileError(String),

    #[error("Missing required setting: {0}")]
    MissingValue(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Process-wide relay configuration, read once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub cors_origin: String,
    pub heartbeat_interval: Duration,
    pub max_stream_duration: Duration,
    pub idle_timeout: Duration,
}

/// Settings for the terminal client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub system_prompt: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Partially specified relay settings from one source
#[derive(Debug, Clone, Default)]
struct RelayOverrides {
    api_key: Option<String>,
    model: Option<String>,
    base_url: Option<String>,
    cors_origin: Option<String>,
    heartbeat_secs: Option<u64>,
    max_stream_secs: Option<u64>,
    idle_timeout_secs: Option<u64>,
}

impl RelayConfig {
    pub fn new(api_key: String) -> Self {
        let settings = RelaySettings::default();
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            heartbeat_interval: settings.heartbeat_interval,
            max_stream_duration: settings.max_duration,
            idle_timeout: settings.idle_timeout,
        }
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    pub fn with_cors_origin(mut self, cors_origin: String) -> Self {
        self.cors_origin = cors_origin;
        self
    }

    /// Load from the process environment only
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None, |key| std::env::var(key).ok())
    }

    /// Load from an optional YAML file, then apply environment overrides
    pub fn from_yaml_and_env(path: Option<&Path>) -> Result<Self, ConfigError> {
        let source = match path {
            Some(path) => Some(read_file(path)?),
            None => None,
        };
        Self::load(source.as_deref(), |key| std::env::var(key).ok())
    }

    /// Resolve settings from defaults, an optional YAML document and a
    /// variable lookup, in increasing order of precedence.
    pub fn load<F>(yaml: Option<&str>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_file = match yaml {
            Some(source) => RelayOverrides::from_yaml_str(source)?,
            None => RelayOverrides::default(),
        };
        let from_env = RelayOverrides::from_lookup(&lookup)?;

        let api_key = from_env
            .api_key
            .clone()
            .or_else(|| from_file.api_key.clone())
            .ok_or_else(|| ConfigError::MissingValue(ENV_API_KEY.to_string()))?;

        let mut config = RelayConfig::new(api_key);
        config.apply(from_file);
        config.apply(from_env);
        Ok(config)
    }

    /// Timing settings for the relay pump
    pub fn relay_settings(&self) -> RelaySettings {
        RelaySettings {
            heartbeat_interval: self.heartbeat_interval,
            max_duration: self.max_stream_duration,
            idle_timeout: self.idle_timeout,
        }
    }

    fn apply(&mut self, overrides: RelayOverrides) {
        if let Some(model) = overrides.model {
            self.model = model;
        }
        if let Some(base_url) = overrides.base_url {
            self.base_url = base_url;
        }
        if let Some(cors_origin) = overrides.cors_origin {
            self.cors_origin = cors_origin;
        }
        if let Some(secs) = overrides.heartbeat_secs {
            self.heartbeat_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = overrides.max_stream_secs {
            self.max_stream_duration = Duration::from_secs(secs);
        }
        if let Some(secs) = overrides.idle_timeout_secs {
            self.idle_timeout = Duration::from_secs(secs);
        }
    }
}

impl RelayOverrides {
    fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        let doc = load_yaml(source)?;
        let upstream = &doc["upstream"];
        let server = &doc["server"];

        Ok(Self {
            api_key: get_str_value_or_none_from_yaml(upstream, "api_key"),
            model: get_str_value_or_none_from_yaml(upstream, "model"),
            base_url: get_str_value_or_none_from_yaml(upstream, "base_url"),
            cors_origin: get_str_value_or_none_from_yaml(server, "cors_origin"),
            heartbeat_secs: get_secs_value_or_none_from_yaml(server, "heartbeat_secs")?,
            max_stream_secs: get_secs_value_or_none_from_yaml(server, "max_stream_secs")?,
            idle_timeout_secs: get_secs_value_or_none_from_yaml(server, "idle_timeout_secs")?,
        })
    }

    fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let get_secs = |key: &str| -> Result<Option<u64>, ConfigError> {
            get(key).map(|value| parse_secs(key, &value)).transpose()
        };

        Ok(Self {
            api_key: get(ENV_API_KEY),
            model: get(ENV_MODEL),
            base_url: get(ENV_BASE_URL),
            cors_origin: get(ENV_CORS_ORIGIN),
            heartbeat_secs: get_secs(ENV_HEARTBEAT_SECS)?,
            max_stream_secs: get_secs(ENV_MAX_STREAM_SECS)?,
            idle_timeout_secs: get_secs(ENV_IDLE_TIMEOUT_SECS)?,
        })
    }
}

impl ClientConfig {
    /// Resolve client settings from an optional YAML document and a variable
    /// lookup; the lookup wins.
    pub fn load<F>(yaml: Option<&str>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ClientConfig::default();

        if let Some(source) = yaml {
            let doc = load_yaml(source)?;
            let client = &doc["client"];
            if let Some(base_url) = get_str_value_or_none_from_yaml(client, "base_url") {
                config.base_url = base_url;
            }
            if let Some(prompt) = get_str_value_or_none_from_yaml(client, "system_prompt") {
                config.system_prompt = prompt;
            }
        }

        if let Some(base_url) = lookup(ENV_API_BASE).filter(|v| !v.is_empty()) {
            config.base_url = base_url;
        }
        Ok(config)
    }

    pub fn from_yaml_and_env(path: Option<&Path>) -> Result<Self, ConfigError> {
        let source = match path {
            Some(path) if path.exists() => Some(read_file(path)?),
            _ => None,
        };
        Self::load(source.as_deref(), |key| std::env::var(key).ok())
    }
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path)
        .map_err(|_| ConfigError::LoadFileError(path.display().to_string()))
}

fn load_yaml(source: &str) -> Result<Yaml, ConfigError> {
    let mut docs = YamlLoader::load_from_str(source)
        .map_err(|e| ConfigError::LoadFileError(e.to_string()))?;
    if docs.is_empty() {
        return Ok(Yaml::Null);
    }
    Ok(docs.swap_remove(0))
}

fn get_str_value_or_none_from_yaml(item: &Yaml, key: &str) -> Option<String> {
    item[key]
        .as_str()
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
}

fn get_secs_value_or_none_from_yaml(item: &Yaml, key: &str) -> Result<Option<u64>, ConfigError> {
    match &item[key] {
        Yaml::BadValue | Yaml::Null => Ok(None),
        Yaml::Integer(value) if (1..=MAX_DURATION_SECS as i64).contains(value) => {
            Ok(Some(*value as u64))
        }
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: format!("{:?}", other),
        }),
    }
}

fn parse_secs(key: &str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(secs) if (1..=MAX_DURATION_SECS).contains(&secs) => Ok(secs),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
