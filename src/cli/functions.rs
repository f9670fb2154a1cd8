//! Listing of the built-in function library

use std::fmt::Write;

use crate::functions::builtins;

/// One line per built-in function: name, accepted argument count and
/// result type, in name order.
pub fn list_functions() -> String {
    let mut functions = builtins();
    functions.sort_by_key(|b| b.name);

    let width = functions.iter().map(|b| b.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for function in &functions {
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "{:width$}  {:8}  {}",
            function.name,
            function.signature.arity(),
            function.signature.returns,
        );
    }
    out
}
