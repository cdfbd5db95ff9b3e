//! Document parsing for both on-disk encodings.
//!
//! JSONC text goes through `json5` and, failing that, one lenient recovery
//! pass. Module text is read back by extracting the object literal passed to
//! the definition's factory function and parsing it as JSON5; no toolchain is
//! spawned.

use super::lenient::{MAX_DEPTH, recover_json};
use super::validate::validate;
use crate::definition::ConfigDefinition;
use crate::{ConfigError, Encoding};
use log::{debug, warn};
use regex::Regex;
use serde_json::{Number, Value};
use std::fs;
use std::path::Path;

/// Candidate document produced by the parser.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Parsed {
    /// The text parsed as written.
    Clean(Value),
    /// The text only parsed after lenient recovery.
    Recovered(Value),
}

impl Parsed {
    pub(crate) fn value(&self) -> &Value {
        match self {
            Parsed::Clean(value) | Parsed::Recovered(value) => value,
        }
    }

    pub(crate) fn into_value(self) -> Value {
        match self {
            Parsed::Clean(value) | Parsed::Recovered(value) => value,
        }
    }

    pub(crate) fn is_recovered(&self) -> bool {
        matches!(self, Parsed::Recovered(_))
    }
}

/// Read and parse a config file; a missing file yields `Ok(None)`.
pub(crate) fn read_document(
    path: &Path,
    encoding: Encoding,
    definition: &ConfigDefinition,
) -> Result<Option<Parsed>, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(ConfigError::Io(err)),
    };
    Ok(parse_document(&text, encoding, definition))
}

/// Parse config text in the given encoding.
///
/// Returns `None` for absent, empty, or unrecoverable documents.
pub(crate) fn parse_document(
    text: &str,
    encoding: Encoding,
    definition: &ConfigDefinition,
) -> Option<Parsed> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == "{}" {
        debug!("config text is empty (encoding={encoding})");
        return None;
    }
    if nesting_exceeds(trimmed, MAX_DEPTH) {
        warn!("config text nests deeper than {MAX_DEPTH} levels (encoding={encoding})");
        return None;
    }

    let parsed = match encoding {
        Encoding::Jsonc => parse_jsonc(trimmed)?,
        Encoding::Module => Parsed::Clean(parse_module(trimmed, &definition.module.factory)?),
    };

    let parsed = match parsed {
        Parsed::Clean(value) => Parsed::Clean(finish_value(value, definition)?),
        Parsed::Recovered(value) => Parsed::Recovered(finish_value(value, definition)?),
    };

    if encoding == Encoding::Module {
        if let Err(errors) = validate(parsed.value(), &definition.schema) {
            warn!(
                "module config failed validation (errors={})",
                errors.len()
            );
            return None;
        }
    }
    Some(parsed)
}

/// Strictly parse JSON5/JSONC text for auxiliary files, without recovery.
pub(crate) fn parse_json5(text: &str) -> Result<Value, ConfigError> {
    if nesting_exceeds(text, MAX_DEPTH) {
        return Err(ConfigError::Invalid(format!(
            "text nests deeper than {MAX_DEPTH} levels"
        )));
    }
    let value: Value = json5::from_str(text)?;
    Ok(normalize_numbers(value))
}

fn parse_jsonc(text: &str) -> Option<Parsed> {
    match json5::from_str::<Value>(text) {
        Ok(value) if value.is_object() => return Some(Parsed::Clean(value)),
        Ok(_) => debug!("config text is not an object; attempting recovery"),
        Err(err) => debug!("config text failed to parse; attempting recovery (err={err})"),
    }
    match recover_json(text) {
        Some(value) if value.is_object() => Some(Parsed::Recovered(value)),
        _ => {
            warn!("config text could not be recovered");
            None
        }
    }
}

fn parse_module(text: &str, factory: &str) -> Option<Value> {
    let Some(literal) = extract_literal(text, factory) else {
        warn!("module config has no default export literal (factory={factory})");
        return None;
    };
    match json5::from_str::<Value>(literal) {
        Ok(value) if value.is_object() => Some(value),
        Ok(_) => None,
        Err(err) => {
            warn!("module config literal failed to parse (err={err})");
            None
        }
    }
}

/// Normalize numbers and drop top-level keys the schema does not declare.
fn finish_value(value: Value, definition: &ConfigDefinition) -> Option<Value> {
    let Value::Object(mut map) = normalize_numbers(value) else {
        return None;
    };
    let dropped = definition.retain_known_keys(&mut map);
    if !dropped.is_empty() {
        debug!("dropping unknown config keys (keys={})", dropped.join(", "));
    }
    Some(Value::Object(map))
}

/// Collapse integral floats (`80.0`) into integers.
fn normalize_numbers(value: Value) -> Value {
    match value {
        Value::Number(number) if number.is_f64() => {
            let Some(float) = number.as_f64() else {
                return Value::Number(number);
            };
            if float.fract() == 0.0 && float.abs() < i64::MAX as f64 {
                Value::Number(Number::from(float as i64))
            } else {
                Value::Number(number)
            }
        }
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_numbers).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, normalize_numbers(value)))
                .collect(),
        ),
        other => other,
    }
}

/// Locate the object literal of `export default factory({...})` or
/// `export default {...}` and return it with its braces.
pub(crate) fn extract_literal<'a>(text: &'a str, factory: &str) -> Option<&'a str> {
    let pattern = format!(
        r"export\s+default\s+(?:{}\s*\(\s*)?\{{",
        regex::escape(factory)
    );
    let export = Regex::new(&pattern).ok()?;
    let found = export.find(text)?;
    let open = found.end() - 1;
    let close = matching_brace(text, open)?;
    Some(&text[open..=close])
}

/// Index of the `}` closing the `{` at `open`, skipping strings and comments.
fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut idx = open;
    while idx < bytes.len() {
        match bytes[idx] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {
                if let Some(end) = skip_inert(bytes, idx) {
                    idx = end;
                }
            }
        }
        idx += 1;
    }
    None
}

/// Whether brackets outside strings and comments nest deeper than `max`.
fn nesting_exceeds(text: &str, max: usize) -> bool {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut idx = 0;
    while idx < bytes.len() {
        match bytes[idx] {
            b'{' | b'[' => {
                depth += 1;
                if depth > max {
                    return true;
                }
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {
                if let Some(end) = skip_inert(bytes, idx) {
                    idx = end;
                }
            }
        }
        idx += 1;
    }
    false
}

/// If a string or comment starts at `idx`, the index of its last byte.
fn skip_inert(bytes: &[u8], mut idx: usize) -> Option<usize> {
    match bytes[idx] {
        quote @ (b'"' | b'\'' | b'`') => {
            idx += 1;
            while idx < bytes.len() && bytes[idx] != quote {
                if bytes[idx] == b'\\' {
                    idx += 1;
                }
                idx += 1;
            }
            Some(idx)
        }
        b'/' if bytes.get(idx + 1) == Some(&b'/') => {
            while idx < bytes.len() && bytes[idx] != b'\n' {
                idx += 1;
            }
            Some(idx)
        }
        b'/' if bytes.get(idx + 1) == Some(&b'*') => {
            idx += 2;
            while idx + 1 < bytes.len() && !(bytes[idx] == b'*' && bytes[idx + 1] == b'/') {
                idx += 1;
            }
            Some(idx + 1)
        }
        _ => None,
    }
}
