//! Best-effort recovery for malformed JSON-like config text.
//!
//! Accepts what hand edits and interrupted writes tend to leave behind:
//! comments, single quotes, unquoted keys, missing or trailing commas,
//! Python-style literals, and structures truncated at end of input (open
//! strings, objects, and arrays are closed implicitly).

use serde_json::{Map, Number, Value};

/// Deepest object/array nesting accepted from config text.
pub(crate) const MAX_DEPTH: usize = 128;

/// Recover a JSON value from damaged text; `None` when nothing usable remains.
pub(crate) fn recover_json(raw: &str) -> Option<Value> {
    let mut parser = Lenient::new(raw);
    let value = parser.value()?;
    if parser.too_deep {
        return None;
    }
    parser.skip_trivia();
    Some(value)
}

struct Lenient {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
    too_deep: bool,
}

impl Lenient {
    fn new(raw: &str) -> Self {
        Self {
            chars: raw.chars().collect(),
            pos: 0,
            depth: 0,
            too_deep: false,
        }
    }

    /// Enter a container; past the cap the rest of the input is abandoned.
    fn descend(&mut self) -> bool {
        if self.depth >= MAX_DEPTH {
            self.too_deep = true;
            self.pos = self.chars.len();
            return false;
        }
        self.depth += 1;
        true
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    /// Skip whitespace and comments.
    fn skip_trivia(&mut self) {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(ch), _) if ch.is_whitespace() || ch == '\u{feff}' => self.pos += 1,
                (Some('/'), Some('/')) | (Some('#'), _) => {
                    while let Some(ch) = self.bump() {
                        if ch == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    self.pos += 2;
                    while self.peek().is_some() {
                        if self.peek() == Some('*') && self.peek_at(1) == Some('/') {
                            self.pos += 2;
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => return,
            }
        }
    }

    /// Skip trivia plus stray separators between entries.
    fn skip_separators(&mut self) {
        loop {
            self.skip_trivia();
            match self.peek() {
                Some(',') | Some(';') => self.pos += 1,
                _ => return,
            }
        }
    }

    fn value(&mut self) -> Option<Value> {
        self.skip_trivia();
        match self.peek()? {
            open @ ('{' | '[') => {
                if !self.descend() {
                    return None;
                }
                self.pos += 1;
                let value = if open == '{' {
                    self.object()
                } else {
                    self.array()
                };
                self.depth -= 1;
                Some(value)
            }
            quote @ ('"' | '\'' | '`') => {
                self.pos += 1;
                Some(Value::String(self.string(quote)))
            }
            ch if ch == '-' || ch == '+' || ch == '.' || ch.is_ascii_digit() => self.number(),
            ch if is_word_char(ch) => self.word(),
            _ => None,
        }
    }

    fn object(&mut self) -> Value {
        let mut map = Map::new();
        loop {
            self.skip_separators();
            let Some(ch) = self.peek() else {
                break;
            };
            if ch == '}' {
                self.pos += 1;
                break;
            }
            if ch == ']' {
                // Mismatched closer; treat it as the end of this object.
                self.pos += 1;
                break;
            }
            let Some(key) = self.key() else {
                // Unusable token; skip it so the loop always advances.
                self.pos += 1;
                continue;
            };
            self.skip_trivia();
            match self.peek() {
                Some(':') | Some('=') => self.pos += 1,
                None => break,
                _ => {}
            }
            match self.value() {
                Some(value) => {
                    map.insert(key, value);
                }
                None => {
                    // Dangling `key:` at a truncation point or before a closer.
                    if self.peek().is_none() {
                        break;
                    }
                }
            }
        }
        Value::Object(map)
    }

    fn key(&mut self) -> Option<String> {
        match self.peek()? {
            quote @ ('"' | '\'' | '`') => {
                self.pos += 1;
                Some(self.string(quote))
            }
            ch if is_word_char(ch) => {
                let start = self.pos;
                while self.peek().is_some_and(is_word_char) {
                    self.pos += 1;
                }
                Some(self.chars[start..self.pos].iter().collect())
            }
            _ => None,
        }
    }

    fn array(&mut self) -> Value {
        let mut items = Vec::new();
        loop {
            self.skip_separators();
            let Some(ch) = self.peek() else {
                break;
            };
            if ch == ']' || ch == '}' {
                self.pos += 1;
                break;
            }
            match self.value() {
                Some(value) => items.push(value),
                None => {
                    if self.peek().is_none() {
                        break;
                    }
                    self.pos += 1;
                }
            }
        }
        Value::Array(items)
    }

    fn string(&mut self, quote: char) -> String {
        let mut out = String::new();
        while let Some(ch) = self.bump() {
            if ch == quote {
                return out;
            }
            if ch != '\\' {
                out.push(ch);
                continue;
            }
            let Some(escaped) = self.bump() else {
                break;
            };
            match escaped {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                'b' => out.push('\u{8}'),
                'f' => out.push('\u{c}'),
                'u' => {
                    let digits: String = (0..4).filter_map(|_| self.bump()).collect();
                    match u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32) {
                        Some(decoded) => out.push(decoded),
                        None => out.push_str(&digits),
                    }
                }
                other => out.push(other),
            }
        }
        // Unterminated string at end of input.
        out
    }

    fn number(&mut self) -> Option<Value> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|ch| ch.is_ascii_digit() || matches!(ch, '-' | '+' | '.' | 'e' | 'E'))
        {
            self.pos += 1;
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        let text = text.trim_start_matches('+');
        if let Ok(int) = text.parse::<i64>() {
            return Some(Value::Number(int.into()));
        }
        if let Ok(uint) = text.parse::<u64>() {
            return Some(Value::Number(uint.into()));
        }
        let float = text.trim_end_matches(['e', 'E', '-', '+', '.']).parse::<f64>().ok()?;
        Number::from_f64(float).map(Value::Number)
    }

    fn word(&mut self) -> Option<Value> {
        let start = self.pos;
        while self.peek().is_some_and(is_word_char) {
            self.pos += 1;
        }
        let word: String = self.chars[start..self.pos].iter().collect();
        let value = match word.as_str() {
            "true" | "True" => Value::Bool(true),
            "false" | "False" => Value::Bool(false),
            "null" | "None" | "undefined" => Value::Null,
            _ => Value::String(word),
        };
        Some(value)
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '$' | '-' | '@' | '/' | '.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn repairs_trailing_and_missing_commas() {
        let raw = r#"{
            "projectName": "demo",
            "features": { "i18n": true, }
            "version": "1.0.0",
        }"#;
        assert_eq!(
            recover_json(raw),
            Some(json!({
                "projectName": "demo",
                "features": { "i18n": true },
                "version": "1.0.0"
            }))
        );
    }

    #[test]
    fn accepts_unquoted_keys_single_quotes_and_comments() {
        let raw = "{\n  // comment\n  name: 'demo', /* block */ tags: ['a', \"b\"],\n  flag: True\n}";
        assert_eq!(
            recover_json(raw),
            Some(json!({ "name": "demo", "tags": ["a", "b"], "flag": true }))
        );
    }

    #[test]
    fn closes_truncated_structures() {
        let raw = r#"{ "projectName": "demo", "features": { "api": true, "themes": ["dark", "li"#;
        assert_eq!(
            recover_json(raw),
            Some(json!({
                "projectName": "demo",
                "features": { "api": true, "themes": ["dark", "li"] }
            }))
        );
    }

    #[test]
    fn drops_dangling_key_at_truncation() {
        let raw = r#"{ "a": 1, "b": "#;
        assert_eq!(recover_json(raw), Some(json!({ "a": 1 })));
    }

    #[test]
    fn parses_numbers() {
        assert_eq!(
            recover_json("{ w: 80, r: 0.5, n: -3 }"),
            Some(json!({ "w": 80, "r": 0.5, "n": -3 }))
        );
    }

    #[test]
    fn rejects_nesting_past_cap() {
        let within = format!("{{ \"a\": {}{} }}", "[".repeat(MAX_DEPTH - 1), "]".repeat(MAX_DEPTH - 1));
        assert!(recover_json(&within).is_some());

        let hostile = format!("{{ \"a\": {}", "[".repeat(50_000));
        assert_eq!(recover_json(&hostile), None);
    }

    #[test]
    fn empty_input_yields_none() {
        assert_eq!(recover_json("   // nothing here\n"), None);
    }
}
