//! JSON recovery from free-form model output
//!
//! The model is instructed to return bare JSON, but responses arrive
//! wrapped in code fences or prose often enough that recovery is an
//! ordered chain of fallible parsers, short-circuiting on the first
//! success. A response no stage can parse yields nothing; a partial or
//! guessed object is never returned.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static FENCED_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```(?:json)?\n?(.*?)```").unwrap());

/// Recover a JSON value from `text`.
///
/// Order: fenced code-block content, the full trimmed response, the
/// outermost bracket-pair substring, then the same substring through a
/// permissive pass tolerating single quotes and trailing commas.
pub fn recover_json(text: &str) -> Option<Value> {
    if let Some(caps) = FENCED_BLOCK.captures(text) {
        if let Some(fenced) = caps.get(1) {
            if let Ok(value) = serde_json::from_str(fenced.as_str().trim()) {
                return Some(value);
            }
        }
    }

    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    let candidate = outermost_bracket_span(trimmed)?;
    if let Ok(value) = serde_json::from_str(candidate) {
        return Some(value);
    }

    serde_json::from_str(&relax(candidate)).ok()
}

/// Substring from the earliest `{`/`[` to the latest `}`/`]`, if any.
fn outermost_bracket_span(text: &str) -> Option<&str> {
    let start = [text.find('{'), text.find('[')]
        .into_iter()
        .flatten()
        .min()?;
    let end = [text.rfind('}'), text.rfind(']')]
        .into_iter()
        .flatten()
        .max()?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Permissive rewrite: single-quoted strings become double-quoted and
/// trailing commas are dropped, without touching the inside of existing
/// double-quoted strings.
fn relax(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_double = false;
    let mut in_single = false;
    let mut escaped = false;

    for (index, c) in text.char_indices() {
        if in_double {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_double = false;
            }
            continue;
        }

        if in_single {
            if escaped {
                escaped = false;
                if c == '\'' {
                    out.push('\'');
                } else {
                    out.push('\\');
                    out.push(c);
                }
                continue;
            }
            match c {
                '\\' => escaped = true,
                '\'' => {
                    out.push('"');
                    in_single = false;
                }
                '"' => out.push_str("\\\""),
                _ => out.push(c),
            }
            continue;
        }

        match c {
            '"' => {
                in_double = true;
                out.push('"');
            }
            '\'' => {
                in_single = true;
                out.push('"');
            }
            ',' => {
                let rest = text[index + c.len_utf8()..].trim_start();
                if !(rest.starts_with('}') || rest.starts_with(']')) {
                    out.push(',');
                }
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recovers_a_fenced_block() {
        let text = "```json\n{\"item_id\": [\"1\"]}\n```";
        assert_eq!(recover_json(text).unwrap(), json!({"item_id": ["1"]}));
    }

    #[test]
    fn recovers_a_fence_without_language_tag() {
        let text = "```\n{\"item_id\": [\"1\", \"2\"]}\n```";
        assert_eq!(
            recover_json(text).unwrap(),
            json!({"item_id": ["1", "2"]})
        );
    }

    #[test]
    fn recovers_a_bare_response() {
        let text = "  {\"item_id\": [\"1\"]}  ";
        assert_eq!(recover_json(text).unwrap(), json!({"item_id": ["1"]}));
    }

    #[test]
    fn recovers_json_wrapped_in_prose_via_bracket_scan() {
        let text = "Sure! {\"item_id\": [\"1\"]} Thanks";
        assert_eq!(recover_json(text).unwrap(), json!({"item_id": ["1"]}));
    }

    #[test]
    fn a_response_without_brackets_yields_nothing() {
        assert!(recover_json("there is no JSON here").is_none());
        assert!(recover_json("").is_none());
    }

    #[test]
    fn a_response_with_unparseable_brackets_yields_nothing() {
        assert!(recover_json("set {a: } to [").is_none());
    }

    #[test]
    fn permissive_pass_handles_single_quotes_and_trailing_commas() {
        let text = "{'item_id': ['1', '2'],}";
        assert_eq!(
            recover_json(text).unwrap(),
            json!({"item_id": ["1", "2"]})
        );
    }

    #[test]
    fn permissive_pass_leaves_double_quoted_content_alone() {
        let text = "{'note': \"it's fine, really\",}";
        assert_eq!(
            recover_json(text).unwrap(),
            json!({"note": "it's fine, really"})
        );
    }

    #[test]
    fn permissive_pass_unescapes_quotes_inside_single_quoted_strings() {
        let text = r"{'note': 'it\'s ok'}";
        assert_eq!(recover_json(text).unwrap(), json!({"note": "it's ok"}));
    }

    #[test]
    fn prose_around_a_fenced_block_does_not_break_recovery() {
        let text = "Here you go:\n```json\n{\"item_id\": [\"9\"]}\n```\nAnything else?";
        assert_eq!(recover_json(text).unwrap(), json!({"item_id": ["9"]}));
    }
}
