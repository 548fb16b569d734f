//! Provider configuration and factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use recque_core::traits::QuestionProvider;

use crate::mock::MockProvider;
use crate::ollama::OllamaProvider;
use crate::openai::OpenAiProvider;

/// Configuration for a single question provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    OpenAI {
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        model: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
        /// Send each generated question back for a review pass.
        #[serde(default)]
        verify: bool,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        #[serde(default)]
        model: Option<String>,
    },
    /// Deterministic offline provider, useful for trying the CLI without
    /// an API key.
    Mock {},
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                model,
                org_id,
                verify,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("model", model)
                .field("org_id", org_id)
                .field("verify", verify)
                .finish(),
            ProviderConfig::Ollama { base_url, model } => f
                .debug_struct("Ollama")
                .field("base_url", base_url)
                .field("model", model)
                .finish(),
            ProviderConfig::Mock {} => f.debug_struct("Mock").finish(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

/// Top-level recque configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecqueConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Default provider to use.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Directory where session snapshots are stored.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("./recque-sessions")
}

impl Default for RecqueConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            data_dir: default_data_dir(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

/// Resolve env vars in a provider config.
fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            model,
            org_id,
            verify,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            model: model.clone(),
            org_id: org_id.as_ref().map(|o| resolve_env_vars(o)),
            verify: *verify,
        },
        ProviderConfig::Ollama { base_url, model } => ProviderConfig::Ollama {
            base_url: resolve_env_vars(base_url),
            model: model.clone(),
        },
        ProviderConfig::Mock {} => ProviderConfig::Mock {},
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `recque.toml` in the current directory
/// 2. `~/.config/recque/config.toml`
///
/// Environment variable override: `RECQUE_OPENAI_KEY`.
pub fn load_config() -> Result<RecqueConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<RecqueConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("recque.toml");
        if local.exists() {
            Some(local)
        } else if let Some(home) = dirs_path() {
            let global = home.join("config.toml");
            if global.exists() {
                Some(global)
            } else {
                None
            }
        } else {
            None
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<RecqueConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => RecqueConfig::default(),
    };

    // Apply env var overrides
    if let Ok(key) = std::env::var("RECQUE_OPENAI_KEY") {
        config
            .providers
            .entry("openai".into())
            .or_insert(ProviderConfig::OpenAI {
                api_key: String::new(),
                base_url: None,
                model: None,
                org_id: None,
                verify: false,
            });
        if let Some(ProviderConfig::OpenAI { api_key, .. }) = config.providers.get_mut("openai") {
            *api_key = key;
        }
    }

    // Resolve env vars in all provider configs
    let resolved: HashMap<String, ProviderConfig> = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();
    config.providers = resolved;

    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("recque"))
}

/// Create a provider instance from its configuration.
pub fn create_provider(config: &ProviderConfig) -> Result<Box<dyn QuestionProvider>> {
    match config {
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            model,
            org_id,
            verify,
        } => Ok(Box::new(
            OpenAiProvider::new(api_key, base_url.clone(), model.clone())
                .with_org_id(org_id.clone())
                .with_verification(*verify),
        )),
        ProviderConfig::Ollama { base_url, model } => {
            Ok(Box::new(OllamaProvider::new(base_url, model.clone())))
        }
        ProviderConfig::Mock {} => Ok(Box::new(MockProvider::new())),
    }
}
