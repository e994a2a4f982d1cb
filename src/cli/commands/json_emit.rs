//! JSON emit functions for CLI output

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::ExecutionResult;

/// One effective configuration value with its source.
#[derive(Debug, Serialize)]
pub struct ConfigValue<'a> {
    pub value: &'a str,
    pub source: &'a str,
}

/// Emit an execution result (stdout, stderr, exit code, timestamps) as JSON.
pub fn emit_result_json(result: &ExecutionResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("Failed to emit result JSON")
}

/// Emit the effective configuration as a `key -> {value, source}` object.
pub fn emit_config_json(effective: &BTreeMap<String, (String, String)>) -> Result<String> {
    let values: BTreeMap<&str, ConfigValue<'_>> = effective
        .iter()
        .map(|(key, (value, source))| (key.as_str(), ConfigValue { value, source }))
        .collect();
    serde_json::to_string_pretty(&values).context("Failed to emit config JSON")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_json_carries_all_fields() {
        let result = ExecutionResult::new("out", "err", 3, false);
        let json: serde_json::Value = serde_json::from_str(&emit_result_json(&result).unwrap()).unwrap();
        assert_eq!(json["stdout"], "out");
        assert_eq!(json["stderr"], "err");
        assert_eq!(json["exit_code"], 3);
        assert_eq!(json["timed_out"], false);
        assert!(json["started_at"].is_string());
    }

    #[test]
    fn test_config_json_shape() {
        let mut effective = BTreeMap::new();
        effective.insert(
            "timeout_ms".to_string(),
            ("5000".to_string(), "env".to_string()),
        );
        let json: serde_json::Value =
            serde_json::from_str(&emit_config_json(&effective).unwrap()).unwrap();
        assert_eq!(json["timeout_ms"]["value"], "5000");
        assert_eq!(json["timeout_ms"]["source"], "env");
    }
}
