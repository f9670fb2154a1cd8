//! CLI support for formula-lang
//!
//! The `formula` binary is a thin wrapper over these functions; they are
//! public so other tools can embed the same commands.

mod check;
mod convert;
mod eval;
mod functions;

pub use check::{CheckOptions, execute_check};
pub use convert::{json_to_types, json_to_value, value_to_json};
pub use eval::{EvalOptions, execute_eval};
pub use functions::list_functions;

use std::io;

use thiserror::Error;

use crate::FormulaError;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    /// The formula failed to tokenize, parse, evaluate or check
    #[error(transparent)]
    Formula(#[from] FormulaError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    /// Text written to stderr: the JSON payload for formula failures.
    pub fn report(&self) -> String {
        match self {
            CliError::Formula(e) => e.to_json(),
            other => other.to_string(),
        }
    }
}
