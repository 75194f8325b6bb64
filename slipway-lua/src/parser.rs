//! Pipeline definition parser
//!
//! Evaluates a `pipeline.lua` definition in the sandbox and flattens the
//! returned table into raw parameters for the resolver. No validation of
//! keys or values happens here beyond "is it a scalar".

use anyhow::{Context, Result};
use mlua::{Table, Value};
use slipway_core::domain::RawParameters;
use std::path::Path;

use crate::sandbox::create_sandbox;

/// Parse raw pipeline parameters from Lua source code
///
/// # Errors
/// Returns an error if:
/// - The Lua source is invalid or does not return a table
/// - A key is not a string
/// - A value is not a string, number or boolean
///
/// # Example
/// ```no_run
/// use slipway_lua::parser::parse_definition;
///
/// let params = parse_definition(r#"
///     return slipway.define {
///         appName = "orders",
///         appType = "springboot",
///         exposePort = 8081,
///     }
/// "#)?;
/// assert_eq!(params["exposePort"], serde_json::json!(8081));
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn parse_definition(source: &str) -> Result<RawParameters> {
    let lua = create_sandbox().context("Failed to create definition sandbox")?;

    let definition: Table = lua
        .load(source)
        .set_name("pipeline")
        .eval()
        .context("Failed to evaluate pipeline definition")?;

    let mut params = RawParameters::new();

    for pair in definition.pairs::<Value, Value>() {
        let (key, value) = pair.context("Failed to read definition entry")?;

        let key = match key {
            Value::String(s) => s.to_str()?.to_string(),
            other => {
                return Err(anyhow::anyhow!(
                    "Definition keys must be strings, got a {}",
                    other.type_name()
                ));
            }
        };

        let value = lua_value_to_json(&value)
            .with_context(|| format!("Parameter '{}' has an unsupported value", key))?;

        params.insert(key, value);
    }

    Ok(params)
}

/// Read and parse a definition file
pub fn load_definition(path: &Path) -> Result<RawParameters> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read definition file: {}", path.display()))?;

    parse_definition(&source)
        .with_context(|| format!("Invalid pipeline definition: {}", path.display()))
}

/// Convert a scalar Lua value to JSON
///
/// Integral floats (e.g. `8080.0`) are narrowed to integers so ports written
/// either way resolve the same.
fn lua_value_to_json(val: &Value) -> Result<serde_json::Value> {
    match val {
        Value::String(s) => Ok(serde_json::Value::String(s.to_str()?.to_string())),
        Value::Integer(i) => Ok(serde_json::Value::Number((*i).into())),
        Value::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
            Ok(serde_json::Value::Number((*n as i64).into()))
        }
        Value::Number(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .ok_or_else(|| anyhow::anyhow!("Invalid number value")),
        Value::Boolean(b) => Ok(serde_json::Value::Bool(*b)),
        other => Err(anyhow::anyhow!(
            "expected a string, number or boolean, got a {}",
            other.type_name()
        )),
    }
}
