//! Evaluate formulas against JSON input

use super::{CliError, json_to_value, value_to_json};
use crate::{FormulaEngine, Value};

/// Options for the eval command
#[derive(Debug, Clone, Default)]
pub struct EvalOptions {
    /// The formula to evaluate
    pub formula: String,
    /// JSON object holding the referenced fields
    pub vars: Option<String>,
}

/// Evaluate a formula, returning its result as JSON.
///
/// Without variables every reference resolves to `undefined`.
pub fn execute_eval(options: &EvalOptions) -> Result<serde_json::Value, CliError> {
    let variables = match &options.vars {
        Some(json) if !json.trim().is_empty() => json_to_value(serde_json::from_str(json)?),
        _ => Value::Undefined,
    };

    let result = FormulaEngine::new().exec(&options.formula, &variables)?;
    Ok(value_to_json(result))
}
