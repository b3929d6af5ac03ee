//! Validation of the raw LLM JSON output against the new-format schema
//! (§6). Old array-shaped `changes` or string-array `rollbackConditions`
//! are rejected here, before anything reaches `ParamGate` — no downstream
//! component ever branches on `typeof` (§9).

use std::collections::BTreeMap;

use mm_types::{RollbackSpec, PARAM_NAMES};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    NotAnObject,
    ChangesNotObject,
    ChangesWrongArity(usize),
    UnknownParamName(String),
    ChangesValueNotNumeric(String),
    RollbackNotObject,
    RollbackEmpty,
    RollbackValueNotNumeric(&'static str),
    ReasoningTraceEmpty,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "top-level output is not a JSON object"),
            Self::ChangesNotObject => write!(f, "changes is not an object (old array-shaped format is rejected)"),
            Self::ChangesWrongArity(n) => write!(f, "changes has {n} keys, expected 1-2"),
            Self::UnknownParamName(name) => write!(f, "changes key '{name}' is not one of the ten allowed parameter names"),
            Self::ChangesValueNotNumeric(name) => write!(f, "changes value for '{name}' is not a finite string-or-number"),
            Self::RollbackNotObject => write!(f, "rollbackConditions is not an object (old string-array format is rejected)"),
            Self::RollbackEmpty => write!(f, "rollbackConditions has no recognized numeric threshold set"),
            Self::RollbackValueNotNumeric(name) => write!(f, "rollbackConditions.{name} is not a finite number"),
            Self::ReasoningTraceEmpty => write!(f, "reasoningTrace is missing, not an array, or empty"),
        }
    }
}

impl std::error::Error for SchemaError {}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedLlmOutput {
    pub changes: BTreeMap<String, f64>,
    pub rollback: RollbackSpec,
    pub reasoning_trace: Vec<String>,
}

fn as_finite_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

/// Parse and validate one LLM response body against the §6 output schema.
pub fn validate_llm_output(raw: &Value) -> Result<ValidatedLlmOutput, SchemaError> {
    let obj = raw.as_object().ok_or(SchemaError::NotAnObject)?;

    let changes_val = obj.get("changes").ok_or(SchemaError::ChangesNotObject)?;
    let changes_obj = changes_val.as_object().ok_or(SchemaError::ChangesNotObject)?;
    if !(1..=2).contains(&changes_obj.len()) {
        return Err(SchemaError::ChangesWrongArity(changes_obj.len()));
    }
    let mut changes = BTreeMap::new();
    for (k, v) in changes_obj {
        if !PARAM_NAMES.contains(&k.as_str()) {
            return Err(SchemaError::UnknownParamName(k.clone()));
        }
        let f = as_finite_f64(v).ok_or_else(|| SchemaError::ChangesValueNotNumeric(k.clone()))?;
        changes.insert(k.clone(), f);
    }

    let rollback_val = obj.get("rollbackConditions").ok_or(SchemaError::RollbackNotObject)?;
    let rollback_obj = rollback_val.as_object().ok_or(SchemaError::RollbackNotObject)?;

    let markout_10s_p50_below_bps = match rollback_obj.get("markout10sP50BelowBps") {
        Some(v) => Some(as_finite_f64(v).ok_or(SchemaError::RollbackValueNotNumeric("markout10sP50BelowBps"))?),
        None => None,
    };
    let pause_count_above = match rollback_obj.get("pauseCountAbove") {
        Some(v) => Some(as_finite_f64(v).ok_or(SchemaError::RollbackValueNotNumeric("pauseCountAbove"))?),
        None => None,
    };
    let max_duration_ms = match rollback_obj.get("maxDurationMs") {
        Some(v) => Some(as_finite_f64(v).ok_or(SchemaError::RollbackValueNotNumeric("maxDurationMs"))? as i64),
        None => None,
    };

    let rollback = RollbackSpec {
        markout_10s_p50_below_bps,
        pause_count_above,
        max_duration_ms,
    };
    if !rollback.has_any_threshold() {
        return Err(SchemaError::RollbackEmpty);
    }

    let reasoning_trace: Vec<String> = obj
        .get("reasoningTrace")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    if reasoning_trace.is_empty() {
        return Err(SchemaError::ReasoningTraceEmpty);
    }

    Ok(ValidatedLlmOutput {
        changes,
        rollback,
        reasoning_trace,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_well_formed_output() {
        let raw = json!({
            "changes": {"baseHalfSpreadBps": 12.0},
            "rollbackConditions": {"pauseCountAbove": 5},
            "reasoningTrace": ["spreads too tight given recent vol"],
        });
        let out = validate_llm_output(&raw).unwrap();
        assert_eq!(out.changes.get("baseHalfSpreadBps"), Some(&12.0));
        assert_eq!(out.rollback.pause_count_above, Some(5.0));
    }

    #[test]
    fn rejects_old_array_shaped_changes() {
        let raw = json!({
            "changes": [{"param": "baseHalfSpreadBps", "value": 12.0}],
            "rollbackConditions": {"pauseCountAbove": 5},
            "reasoningTrace": ["x"],
        });
        assert_eq!(validate_llm_output(&raw), Err(SchemaError::ChangesNotObject));
    }

    #[test]
    fn rejects_old_string_array_rollback() {
        let raw = json!({
            "changes": {"baseHalfSpreadBps": 12.0},
            "rollbackConditions": ["pauseCountAbove>5"],
            "reasoningTrace": ["x"],
        });
        assert_eq!(validate_llm_output(&raw), Err(SchemaError::RollbackNotObject));
    }

    #[test]
    fn rejects_unknown_param_name() {
        let raw = json!({
            "changes": {"notAParam": 1.0},
            "rollbackConditions": {"pauseCountAbove": 5},
            "reasoningTrace": ["x"],
        });
        assert_eq!(validate_llm_output(&raw), Err(SchemaError::UnknownParamName("notAParam".into())));
    }

    #[test]
    fn rejects_empty_rollback() {
        let raw = json!({
            "changes": {"baseHalfSpreadBps": 12.0},
            "rollbackConditions": {},
            "reasoningTrace": ["x"],
        });
        assert_eq!(validate_llm_output(&raw), Err(SchemaError::RollbackEmpty));
    }

    #[test]
    fn rejects_wrong_arity_changes() {
        let raw = json!({
            "changes": {"baseHalfSpreadBps": 12.0, "volSpreadGain": 1.0, "toxSpreadGain": 1.0},
            "rollbackConditions": {"pauseCountAbove": 5},
            "reasoningTrace": ["x"],
        });
        assert_eq!(validate_llm_output(&raw), Err(SchemaError::ChangesWrongArity(3)));
    }
}
