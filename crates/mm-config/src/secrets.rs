//! Secrets resolution: config stores env-var NAMES, never values.
//!
//! At startup, [`resolve_secrets`] reads the named variables once and
//! returns a [`ResolvedSecrets`] whose `Debug` impl redacts every field —
//! callers pass it into constructors rather than scattering `std::env::var`
//! calls through the codebase.

use serde_json::Value;

pub struct ResolvedSecrets {
    /// Exchange API key, required to place/cancel orders.
    pub exchange_api_key: Option<String>,
    pub exchange_api_secret: Option<String>,
    /// LLM provider API key, required by `mm-reflector`.
    pub llm_api_key: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("exchange_api_key", &self.exchange_api_key.as_ref().map(|_| "<REDACTED>"))
            .field("exchange_api_secret", &self.exchange_api_secret.as_ref().map(|_| "<REDACTED>"))
            .field("llm_api_key", &self.llm_api_key.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Resolve exchange and LLM secrets from the environment, using env-var
/// names read from `config_json` (falling back to well-known defaults).
/// Never required at load time — the executor surfaces a clear error only
/// once it actually needs to place an order or call the LLM without one.
pub fn resolve_secrets(config_json: &Value) -> ResolvedSecrets {
    let exchange_key_var =
        read_str_at(config_json, "/secrets/exchangeApiKeyEnv").unwrap_or_else(|| "MM_EXCHANGE_API_KEY".to_string());
    let exchange_secret_var = read_str_at(config_json, "/secrets/exchangeApiSecretEnv")
        .unwrap_or_else(|| "MM_EXCHANGE_API_SECRET".to_string());
    let llm_key_var =
        read_str_at(config_json, "/secrets/llmApiKeyEnv").unwrap_or_else(|| "MM_LLM_API_KEY".to_string());

    ResolvedSecrets {
        exchange_api_key: resolve_env(&exchange_key_var),
        exchange_api_secret: resolve_env(&exchange_secret_var),
        llm_api_key: resolve_env(&llm_key_var),
    }
}
