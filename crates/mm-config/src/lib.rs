//! Layered config loading, canonical hashing, typed validation, and secrets
//! resolution. §6, §7.

pub mod layered;
pub mod runtime;
pub mod secrets;

pub use layered::{load_layered_yaml, LoadedConfig};
pub use runtime::RuntimeConfig;
pub use secrets::{resolve_secrets, ResolvedSecrets};

use anyhow::{Context, Result};
use std::path::Path;

/// Load the layered config files, hash them, and deserialize + validate the
/// typed [`RuntimeConfig`] in one step — the path every binary entrypoint
/// (`mm-cli`) should use.
pub fn load_runtime_config(paths: &[impl AsRef<Path>]) -> Result<(RuntimeConfig, LoadedConfig)> {
    let loaded = load_layered_yaml(paths)?;
    let runtime: RuntimeConfig =
        serde_json::from_value(loaded.config_json.clone()).context("config does not match RuntimeConfig schema")?;
    runtime.validate()?;
    Ok((runtime, loaded))
}
