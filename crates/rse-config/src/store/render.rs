//! Serialization of config documents into their on-disk text.

use crate::definition::{ConfigDefinition, SectionComment};
use crate::{ConfigError, Encoding, ImportTarget};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][0-9A-Za-z_$]*$").expect("regex"));

const INDENT: &str = "  ";

/// Render a document in `encoding`, including section comments.
pub(crate) fn render_document(
    document: &Value,
    encoding: Encoding,
    definition: &ConfigDefinition,
    import: &ImportTarget,
) -> Result<String, ConfigError> {
    match encoding {
        Encoding::Jsonc => {
            let pretty = serde_json::to_string_pretty(document)?;
            let commented = inject_section_comments(&pretty, &definition.section_comments);
            Ok(format!("{commented}\n"))
        }
        Encoding::Module => {
            let literal = object_literal(document, 0);
            let commented = inject_section_comments(&literal, &definition.section_comments);
            let factory = &definition.module.factory;
            let target = definition.module.import_for(import);
            Ok(format!(
                "import {{ {factory} }} from \"{target}\";\n\nexport default {factory}({commented});\n"
            ))
        }
    }
}

/// Render a value as object-literal source text.
///
/// Keys that are valid identifiers are written bare; strings use JSON escaping.
pub(crate) fn object_literal(value: &Value, level: usize) -> String {
    let indent = INDENT.repeat(level);
    let indent_next = INDENT.repeat(level + 1);
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => quote(text),
        Value::Array(items) if items.is_empty() => "[]".to_string(),
        Value::Array(items) => {
            let lines: Vec<String> = items
                .iter()
                .map(|item| format!("{indent_next}{}", object_literal(item, level + 1)))
                .collect();
            format!("[\n{}\n{indent}]", lines.join(",\n"))
        }
        Value::Object(map) if map.is_empty() => "{}".to_string(),
        Value::Object(map) => {
            let lines: Vec<String> = map
                .iter()
                .map(|(key, item)| {
                    let key = if IDENTIFIER.is_match(key) {
                        key.clone()
                    } else {
                        quote(key)
                    };
                    format!("{indent_next}{key}: {}", object_literal(item, level + 1))
                })
                .collect();
            format!("{{\n{}\n{indent}}}", lines.join(",\n"))
        }
    }
}

fn quote(text: &str) -> String {
    Value::String(text.to_string()).to_string()
}

/// Insert comment blocks above top-level keys.
///
/// A blank line separates each block from the previous entry, except directly
/// after the opening brace.
fn inject_section_comments(text: &str, sections: &[SectionComment]) -> String {
    let mut out: Vec<String> = Vec::new();
    for line in text.lines() {
        if let Some(section) = sections
            .iter()
            .find(|section| is_top_level_key(line, &section.key))
        {
            let after_open = out
                .last()
                .is_none_or(|previous| previous.trim_end().ends_with('{'));
            if !after_open {
                out.push(String::new());
            }
            for comment in &section.lines {
                if comment.is_empty() {
                    out.push(format!("{INDENT}//"));
                } else {
                    out.push(format!("{INDENT}// {comment}"));
                }
            }
        }
        out.push(line.to_string());
    }
    out.join("\n")
}

fn is_top_level_key(line: &str, key: &str) -> bool {
    let Some(rest) = line.strip_prefix(INDENT) else {
        return false;
    };
    if rest.starts_with(char::is_whitespace) {
        return false;
    }
    [format!("\"{key}\":"), format!("'{key}':"), format!("{key}:")]
        .iter()
        .any(|prefix| rest.starts_with(prefix.as_str()))
}
