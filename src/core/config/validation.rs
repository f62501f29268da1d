use serde_json::{Map, Value};

use super::defaults::MAX_TOP_K;
use crate::core::errors::RagError;
use crate::rag::embedding::SUPPORTED_MODELS;

pub fn validate_config(config: &Value) -> Result<(), RagError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    if let Some(corpus) = expect_optional_object(root, "corpus")? {
        validate_non_empty_string_field(corpus, "corpus.index_path", "index_path")?;
        validate_non_empty_string_field(corpus, "corpus.documents_path", "documents_path")?;
    }

    if let Some(embedding) = expect_optional_object(root, "embedding")? {
        validate_non_empty_string_field(embedding, "embedding.model", "model")?;
        validate_optional_string_field(embedding, "embedding.cache_dir", "cache_dir")?;
        if let Some(model) = embedding.get("model").and_then(|v| v.as_str()) {
            if !SUPPORTED_MODELS.contains(&model) {
                return Err(RagError::Config(format!(
                    "Invalid config at 'embedding.model': unsupported model '{}' (expected one of: {})",
                    model,
                    SUPPORTED_MODELS.join(", ")
                )));
            }
        }
    }

    if let Some(retrieval) = expect_optional_object(root, "retrieval")? {
        validate_u64_field(retrieval, "retrieval.top_k", "top_k", 1, MAX_TOP_K as u64)?;
    }

    if let Some(completion) = expect_optional_object(root, "completion")? {
        validate_non_empty_string_field(completion, "completion.base_url", "base_url")?;
        validate_non_empty_string_field(completion, "completion.model", "model")?;
        validate_optional_string_field(completion, "completion.api_key", "api_key")?;
        validate_u64_field(completion, "completion.timeout_secs", "timeout_secs", 1, 600)?;
        validate_u64_field(completion, "completion.max_tokens", "max_tokens", 1, 1_000_000)?;
        validate_f64_field(completion, "completion.temperature", "temperature", 0.0, 2.0)?;
    }

    if let Some(policy) = expect_optional_object(root, "responder")? {
        validate_non_empty_string_field(policy, "responder.system_prompt", "system_prompt")?;
        validate_non_empty_string_field(
            policy,
            "responder.fallback_message",
            "fallback_message",
        )?;
        validate_u64_field(policy, "responder.max_retries", "max_retries", 0, 5)?;
    }

    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, RagError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(Value::Null) | None => Ok(None),
        Some(_) => Err(config_type_error(key, "object")),
    }
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), RagError> {
    let Some(value) = present(section, key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(RagError::Config(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_f64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: f64,
    max: f64,
) -> Result<(), RagError> {
    let Some(value) = present(section, key) else {
        return Ok(());
    };
    let Some(number) = value.as_f64() else {
        return Err(config_type_error(path, "number"));
    };
    if !(min..=max).contains(&number) {
        return Err(RagError::Config(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_non_empty_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), RagError> {
    let Some(value) = present(section, key) else {
        return Ok(());
    };
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(RagError::Config(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), RagError> {
    let Some(value) = present(section, key) else {
        return Ok(());
    };
    if value.as_str().is_none() {
        return Err(config_type_error(path, "string"));
    }
    Ok(())
}

/// Explicit YAML nulls count as "not set".
fn present<'a>(section: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    section.get(key).filter(|value| !value.is_null())
}

fn config_type_error(path: &str, expected: &str) -> RagError {
    RagError::Config(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}
