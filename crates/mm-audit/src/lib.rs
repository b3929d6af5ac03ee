//! Append-only, optionally hash-chained audit log (JSON Lines).
//!
//! Used for `param_rollout` (§4.7) and `strategy_state` snapshot trails
//! (§4.8), and by `mm-reflector` for the reasoning-log integrity hash
//! (§6). Every event is one line of canonical (sorted-key) JSON; a hash
//! chain, when enabled, lets an operator run `verify_hash_chain` over the
//! file and detect any tampering or gap.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: Uuid,
    pub ts_utc: DateTime<Utc>,
    pub topic: String,
    pub event_type: String,
    pub payload: Value,
    pub hash_prev: Option<String>,
    pub hash_self: Option<String>,
}

/// Append-only audit writer. Writes JSON Lines (one event per line).
/// Optional hash chain: each event carries `hash_prev`/`hash_self`.
pub struct AuditWriter {
    path: PathBuf,
    hash_chain: bool,
    last_hash: Option<String>,
    seq: u64,
}

impl AuditWriter {
    /// Creates the audit writer and ensures parent dirs exist.
    pub fn new(path: impl AsRef<Path>, hash_chain: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create_dir_all {parent:?}"))?;
        }
        Ok(Self {
            path,
            hash_chain,
            last_hash: None,
            seq: 0,
        })
    }

    /// Restore chain state after a restart: pass the last line's `hash_self`
    /// (or `None` for a fresh/empty log) and the count of events already
    /// written.
    pub fn resume(&mut self, last_hash: Option<String>, seq: u64) {
        self.last_hash = last_hash;
        self.seq = seq;
    }

    pub fn last_hash(&self) -> Option<String> {
        self.last_hash.clone()
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Append one event and return the written record.
    pub fn append(&mut self, topic: &str, event_type: &str, payload: Value) -> Result<AuditEvent> {
        let event_id = derive_event_id(self.last_hash.as_deref(), &payload, self.seq);
        self.seq += 1;

        let mut ev = AuditEvent {
            event_id,
            ts_utc: Utc::now(),
            topic: topic.to_string(),
            event_type: event_type.to_string(),
            payload,
            hash_prev: None,
            hash_self: None,
        };

        if self.hash_chain {
            ev.hash_prev = self.last_hash.clone();
            let self_hash = compute_event_hash(&ev)?;
            ev.hash_self = Some(self_hash.clone());
            self.last_hash = Some(self_hash);
        }

        let line = canonical_json_line(&ev)?;
        append_line(&self.path, &line)?;
        Ok(ev)
    }
}

/// Derive a deterministic event id from chain state, payload, and sequence
/// number — no RNG, so replaying the same inputs always yields the same id.
fn derive_event_id(last_hash: Option<&str>, payload: &Value, seq: u64) -> Uuid {
    let mut hasher = Sha256::new();
    hasher.update(last_hash.unwrap_or("").as_bytes());
    hasher.update(seq.to_le_bytes());
    hasher.update(canonicalize_json(payload).as_bytes());
    let digest = hasher.finalize();
    Uuid::new_v5(&Uuid::NAMESPACE_OID, &digest)
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open audit log {path:?}"))?;
    f.write_all(line.as_bytes()).context("write audit line")?;
    f.write_all(b"\n").context("write newline")?;
    Ok(())
}

fn canonical_json_line<T: Serialize>(v: &T) -> Result<String> {
    let raw = serde_json::to_value(v).context("serialize audit event")?;
    Ok(canonicalize_json(&raw))
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

/// Hash computed over the canonical JSON of the event with `hash_self`
/// absent (so the hash never refers to itself).
pub fn compute_event_hash(ev: &AuditEvent) -> Result<String> {
    let mut clone = ev.clone();
    clone.hash_self = None;
    let canonical = canonical_json_line(&clone)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    Valid { lines: usize },
    Broken { line: usize, reason: String },
}

pub fn verify_hash_chain(path: impl AsRef<Path>) -> Result<VerifyResult> {
    let content = fs::read_to_string(path.as_ref()).with_context(|| format!("read audit log {:?}", path.as_ref()))?;
    verify_hash_chain_str(&content)
}

pub fn verify_hash_chain_str(content: &str) -> Result<VerifyResult> {
    let mut prev_hash: Option<String> = None;
    let mut line_count = 0usize;

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let ev: AuditEvent =
            serde_json::from_str(trimmed).with_context(|| format!("parse audit event at line {}", i + 1))?;
        line_count += 1;

        if ev.hash_prev != prev_hash {
            return Ok(VerifyResult::Broken {
                line: i + 1,
                reason: format!("hash_prev mismatch: expected {prev_hash:?}, got {:?}", ev.hash_prev),
            });
        }
        if let Some(ref claimed) = ev.hash_self {
            let recomputed = compute_event_hash(&ev)?;
            if *claimed != recomputed {
                return Ok(VerifyResult::Broken {
                    line: i + 1,
                    reason: format!("hash_self mismatch: claimed {claimed}, recomputed {recomputed}"),
                });
            }
        }
        prev_hash = ev.hash_self.clone();
    }

    Ok(VerifyResult::Valid { lines: line_count })
}

/// Hash a pretty-printed JSON document the same way `mm-reflector` hashes
/// its reasoning log: canonicalized (sorted keys) before hashing, so the
/// stored `sha256` is stable across re-serialization (§6, §8 — "reading the
/// written file, stripping `integrity`, and re-hashing yields the stored
/// `sha256`").
pub fn sha256_of_json(v: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonicalize_json(v).as_bytes());
    hex::encode(hasher.finalize())
}
