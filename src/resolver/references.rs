//! Attribute reference tokens.
//!
//! A string attribute may point at another resource with a `{{ref.<id>}}`
//! token. Tokens are collected as dependency edges during resolution and
//! rewritten to the plain target id when the plan is emitted. Anything else
//! between braces is left untouched.

use serde_json::Value;

use crate::model::Attributes;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const PREFIX: &str = "ref.";

/// Collects every id referenced by tokens in the attribute map.
///
/// Ids are returned in the order they appear (keys in order, values depth-first).
#[must_use]
pub fn collect_attribute_references(attributes: &Attributes) -> Vec<String> {
    let mut ids = Vec::new();
    for value in attributes.values() {
        collect_from_value(value, &mut ids);
    }
    ids
}

fn collect_from_value(value: &Value, ids: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            scan_tokens(s, |id| ids.push(id.to_string()));
        }
        Value::Array(items) => {
            for item in items {
                collect_from_value(item, ids);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                collect_from_value(item, ids);
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Returns a copy of `value` with every reference token replaced by its id.
#[must_use]
pub fn rewrite_references(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(rewrite_string(s)),
        Value::Array(items) => Value::Array(items.iter().map(rewrite_references).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), rewrite_references(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn rewrite_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some((start, end)) = next_token(rest) {
        result.push_str(&rest[..start]);
        result.push_str(token_id(inner(rest, start, end)).unwrap_or(&rest[start..end]));
        rest = &rest[end..];
    }

    result.push_str(rest);
    result
}

fn scan_tokens<'a>(s: &'a str, mut on_id: impl FnMut(&'a str)) {
    let mut rest = s;

    while let Some((start, end)) = next_token(rest) {
        if let Some(id) = token_id(inner(rest, start, end)) {
            on_id(id);
        }
        rest = &rest[end..];
    }
}

/// Locates the next `{{ ... }}` span: the first `}}`, paired with the last
/// `{{` before it. Returns the byte range from the opening braces to just
/// past the closing ones.
///
/// Anchoring on the last `{{` means stray braces around a token, as in
/// `{{{ref.vpc}}}`, stay outside it.
fn next_token(s: &str) -> Option<(usize, usize)> {
    let mut from = 0;
    loop {
        let close = from + s[from..].find(CLOSE)?;
        if let Some(open) = s[from..close].rfind(OPEN) {
            return Some((from + open, close + CLOSE.len()));
        }
        from = close + CLOSE.len();
    }
}

fn inner(s: &str, start: usize, end: usize) -> &str {
    &s[start + OPEN.len()..end - CLOSE.len()]
}

/// Extracts the id from the inside of a `{{ ... }}` token, if it is a reference.
fn token_id(inner: &str) -> Option<&str> {
    inner
        .trim()
        .strip_prefix(PREFIX)
        .map(str::trim)
        .filter(|id| !id.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collect_nested_tokens() {
        let mut attributes = Attributes::new();
        attributes.insert("task_role".to_string(), json!("{{ref.task-role}}"));
        attributes.insert(
            "policies".to_string(),
            json!([{ "role": "{{ ref.exec-role }}" }, "plain"]),
        );

        let ids = collect_attribute_references(&attributes);
        assert_eq!(ids, vec!["exec-role", "task-role"]);
    }

    #[test]
    fn test_non_reference_tokens_ignored() {
        let mut attributes = Attributes::new();
        attributes.insert("region".to_string(), json!("{{params.region}} and {{ref.}}"));
        assert!(collect_attribute_references(&attributes).is_empty());
    }

    #[test]
    fn test_rewrite_replaces_only_references() {
        let value = json!({
            "role": "arn:{{ref.task-role}}",
            "region": "{{params.region}}",
            "unclosed": "{{ref.oops"
        });

        let rewritten = rewrite_references(&value);
        assert_eq!(rewritten["role"], json!("arn:task-role"));
        assert_eq!(rewritten["region"], json!("{{params.region}}"));
        assert_eq!(rewritten["unclosed"], json!("{{ref.oops"));
    }

    #[test]
    fn test_extra_braces_around_token() {
        let mut attributes = Attributes::new();
        attributes.insert("name".to_string(), json!("{{{ref.vpc}}}"));
        attributes.insert("label".to_string(), json!("}}{{ref.subnet}}"));

        assert_eq!(collect_attribute_references(&attributes), vec!["subnet", "vpc"]);
        assert_eq!(rewrite_references(&json!("{{{ref.vpc}}}")), json!("{vpc}"));
        assert_eq!(rewrite_references(&json!("}}{{ref.subnet}}")), json!("}}subnet"));
    }

    #[test]
    fn test_rewrite_multiple_tokens_in_one_string() {
        let value = json!("{{ref.a}}-{{ref.b}}");
        assert_eq!(rewrite_references(&value), json!("a-b"));
    }
}
