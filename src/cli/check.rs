//! Type-check formulas against declared field types

use super::{CliError, json_to_types};
use crate::{CheckEngine, EngineOptions, TypeMap, ValueType};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The formula to check
    pub formula: String,
    /// JSON object mapping reference paths to type names
    pub types: Option<String>,
    /// Skip unscannable characters and ignore trailing tokens
    pub lenient: bool,
}

/// Check a formula, returning the type tag it would produce.
pub fn execute_check(options: &CheckOptions) -> Result<ValueType, CliError> {
    let types = match &options.types {
        Some(json) => json_to_types(json)?,
        None => TypeMap::new(),
    };

    let engine = CheckEngine::new().with_options(EngineOptions::default().strict(!options.lenient));
    Ok(engine.exec(&options.formula, &types)?)
}
