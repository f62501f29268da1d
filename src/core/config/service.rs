use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Map, Value};

use super::paths::AppPaths;
use super::types::ResponderConfig;
use super::validation::validate_config;
use crate::core::errors::RagError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 9] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "private_key",
    "access_key",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 3] = ["max_tokens", "token_count", "tokens"];

const API_KEY_ENV_VARS: [&str; 2] = ["RAG_RESPONDER_API_KEY", "MISTRAL_API_KEY"];
const TOP_K_ENV_VAR: &str = "RAG_RESPONDER_TOP_K";

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
    override_path: Option<PathBuf>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self {
            paths,
            override_path: None,
        }
    }

    /// Use an explicit config file instead of the discovered one.
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.override_path = Some(path);
        self
    }

    pub fn config_path(&self) -> PathBuf {
        if let Some(path) = &self.override_path {
            return path.clone();
        }

        if let Ok(path) = env::var("RAG_RESPONDER_CONFIG") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.secrets_path.clone()
    }

    /// Merged public config and secrets, before environment overrides.
    pub fn load_raw(&self) -> Result<Value, RagError> {
        let public_config = load_yaml_file(&self.config_path())?;
        let secrets_config = load_yaml_file(&self.secrets_path())?;
        Ok(deep_merge(&public_config, &secrets_config))
    }

    pub fn load_config(&self) -> Result<ResponderConfig, RagError> {
        self.load_config_with_env(|key| env::var(key).ok())
    }

    /// Same as [`load_config`](Self::load_config) with an injectable environment.
    pub fn load_config_with_env<F>(&self, lookup: F) -> Result<ResponderConfig, RagError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut merged = self.load_raw()?;
        apply_env_overrides(&mut merged, lookup)?;
        validate_config(&merged)?;

        let config: ResponderConfig =
            serde_json::from_value(merged).map_err(RagError::config)?;
        Ok(config)
    }

    pub fn redact_sensitive_values(&self, value: &Value) -> Value {
        redact_sensitive_values(value)
    }
}

fn load_yaml_file(path: &Path) -> Result<Value, RagError> {
    if !path.exists() {
        return Ok(Value::Object(Map::new()));
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| RagError::Config(format!("{}: {}", path.display(), e)))?;
    let value = serde_yaml::from_str::<Value>(&contents)
        .map_err(|e| RagError::Config(format!("{}: {}", path.display(), e)))?;

    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Map::new())),
        _ => Err(RagError::Config(format!(
            "{}: top level must be a mapping",
            path.display()
        ))),
    }
}

fn apply_env_overrides<F>(config: &mut Value, lookup: F) -> Result<(), RagError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| lookup(*name))
        .find(|value| !value.trim().is_empty())
    {
        *config = deep_merge(config, &json!({ "completion": { "api_key": key } }));
    }

    if let Some(raw) = lookup(TOP_K_ENV_VAR) {
        let top_k: u64 = raw.trim().parse().map_err(|_| {
            RagError::Config(format!("{} must be a positive integer, got '{}'", TOP_K_ENV_VAR, raw))
        })?;
        *config = deep_merge(config, &json!({ "retrieval": { "top_k": top_k } }));
    }

    Ok(())
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}
