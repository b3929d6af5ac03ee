//! Layered YAML config loading: merge files in order, canonicalize, hash.
//!
//! Mirrors the teacher's `load_layered_yaml` — later files deep-merge over
//! earlier ones, and the canonical (sorted-key) JSON is hashed so an
//! operator can pin a params row or run to the exact config that produced
//! it (§6 — this hash is what `mm-db` stores alongside `strategy_params`).

use anyhow::{Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config_json: Value,
    pub canonical_json: String,
    pub config_hash: String,
}

pub fn load_layered_yaml(paths: &[impl AsRef<Path>]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Default::default());

    for p in paths {
        let p = p.as_ref();
        let s = fs::read_to_string(p).with_context(|| format!("read config: {p:?}"))?;
        let yaml_val: serde_yaml::Value = serde_yaml::from_str(&s).with_context(|| format!("parse yaml: {p:?}"))?;
        let json_val = serde_json::to_value(yaml_val).context("yaml->json conversion")?;
        deep_merge(&mut merged, json_val);
    }

    let canonical = canonicalize_json(&merged);
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let hash = hex::encode(hasher.finalize());

    Ok(LoadedConfig {
        config_json: serde_json::from_str(&canonical).context("canonical json parse")?,
        canonical_json: canonical,
        config_hash: hash,
    })
}

fn deep_merge(dst: &mut Value, src: Value) {
    match (dst, src) {
        (Value::Object(dst_map), Value::Object(src_map)) => {
            for (k, v) in src_map {
                match dst_map.get_mut(&k) {
                    Some(existing) => deep_merge(existing, v),
                    None => {
                        dst_map.insert(k, v);
                    }
                }
            }
        }
        (dst_slot, src_val) => {
            *dst_slot = src_val;
        }
    }
}

fn canonicalize_json(v: &Value) -> String {
    serde_json::to_string(&sort_keys(v)).expect("json serialization never fails on owned Value")
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut new = serde_json::Map::new();
            for k in keys {
                new.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}
