//! Pipe constructors and the plain functions behind them.
//!
//! Each constructor returns a callable [`Value`]. The logic lives in a plain
//! function next to it (`ternary`, `format_regexp`, ...) so it can be used and
//! tested without a template environment.

use std::collections::BTreeMap;

use minijinja::value::{Rest, Value, ValueKind};
use minijinja::{Error, ErrorKind, HtmlEscape};
use regex::Regex;

use crate::number::format_number;
use crate::value::{is_empty, is_nil};

#[derive(Debug, thiserror::Error)]
pub enum PipeError {
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("invalid number of arguments for dict")]
    OddArguments,
    #[error("dict keys must be strings, got {0}")]
    NonStringKey(String),
    #[error("cannot encode value as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<PipeError> for Error {
    fn from(err: PipeError) -> Self {
        Error::new(ErrorKind::InvalidOperation, err.to_string())
    }
}

/// `uuid()` returns a random (v4) UUID string.
pub fn uuid() -> Value {
    Value::from_function(|| uuid::Uuid::new_v4().to_string())
}

/// `iif(cond, yes, no)` picks `yes` when `cond` is truthy.
pub fn iif() -> Value {
    Value::from_function(|cond: Value, yes: Value, no: Value| ternary(&cond, yes, no))
}

pub fn ternary(cond: &Value, yes: Value, no: Value) -> Value {
    if cond.is_true() {
        yes
    } else {
        no
    }
}

/// `numberFmt(layout, args...)`, see [`format_number`].
pub fn number_fmt() -> Value {
    Value::from_function(|layout: String, args: Rest<Value>| format_number(&layout, &args))
}

/// `regexpFmt(data, pattern, repl)` rewrites every match of `pattern`.
pub fn regexp_fmt() -> Value {
    Value::from_function(
        |data: String, pattern: String, repl: String| -> Result<String, Error> {
            Ok(format_regexp(&data, &pattern, &repl)?)
        },
    )
}

/// Replaces all matches of `pattern` in `data`; `$1`, `${name}` expand groups.
pub fn format_regexp(data: &str, pattern: &str, repl: &str) -> Result<String, PipeError> {
    let rx = Regex::new(pattern)?;
    Ok(rx.replace_all(data, repl).into_owned())
}

/// `toJson(data)` encodes a value as a JSON string.
pub fn to_json() -> Value {
    Value::from_function(|data: Value| -> Result<String, Error> { Ok(encode_json(&data)?) })
}

pub fn encode_json(value: &Value) -> Result<String, PipeError> {
    Ok(serde_json::to_string(value)?)
}

/// `dict(k1, v1, k2, v2, ...)` builds a map from key/value pairs.
pub fn dict() -> Value {
    Value::from_function(|pairs: Rest<Value>| -> Result<Value, Error> { Ok(build_dict(&pairs)?) })
}

pub fn build_dict(pairs: &[Value]) -> Result<Value, PipeError> {
    if pairs.len() % 2 != 0 {
        return Err(PipeError::OddArguments);
    }
    let mut map = BTreeMap::new();
    for pair in pairs.chunks(2) {
        let key = pair[0]
            .as_str()
            .ok_or_else(|| PipeError::NonStringKey(pair[0].to_string()))?;
        map.insert(key.to_string(), pair[1].clone());
    }
    Ok(Value::from(map))
}

/// `isSet(map, field)` checks whether `field` is a key of `map`.
pub fn is_set() -> Value {
    Value::from_function(|data: Value, field: String| has_field(&data, &field))
}

pub fn has_field(data: &Value, field: &str) -> bool {
    data.kind() == ValueKind::Map
        && data
            .get_item(&Value::from(field))
            .map(|value| !value.is_undefined())
            .unwrap_or(false)
}

/// `alter(val, alt)` falls back to `alt` when `val` is none or undefined.
pub fn alter() -> Value {
    Value::from_function(|value: Value, alt: Value| if is_nil(&value) { alt } else { value })
}

/// `deepAlter(val, alt)` falls back to `alt` when `val` is empty.
///
/// See [`is_empty`] for what counts as empty.
pub fn deep_alter() -> Value {
    Value::from_function(|value: Value, alt: Value| if is_empty(&value) { alt } else { value })
}

/// `br(text)` escapes `text` and turns newlines into `<br/>`.
pub fn br() -> Value {
    Value::from_function(|text: String| line_breaks(&text))
}

pub fn line_breaks(text: &str) -> Value {
    let escaped = HtmlEscape(text).to_string();
    Value::from_safe_string(escaped.replace('\n', "<br/>"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::Environment;
    use serde_json::json;

    fn render(name: &'static str, pipe: Value, template: &str) -> Result<String, Error> {
        let mut env = Environment::new();
        env.add_global(name, pipe);
        env.render_str(
            template,
            json!({
                "meta": { "title": "Home", "draft": null },
                "tags": [],
                "count": 0,
                "comment": "a < b\nsecond line",
            }),
        )
    }

    #[test]
    fn test_uuid_is_random_v4() {
        let a = render("uuid", uuid(), "{{ uuid() }}").unwrap();
        let b = render("uuid", uuid(), "{{ uuid() }}").unwrap();
        assert_eq!(a.len(), 36);
        assert_eq!(a.chars().nth(14), Some('4'));
        assert_ne!(a, b);
    }

    #[test]
    fn test_iif() {
        assert_eq!(render("iif", iif(), r#"{{ iif(true, "yes", "no") }}"#).unwrap(), "yes");
        assert_eq!(render("iif", iif(), r#"{{ iif(count, "yes", "no") }}"#).unwrap(), "no");
    }

    #[test]
    fn test_number_fmt() {
        let out = render("numberFmt", number_fmt(), r#"{{ numberFmt("%d views", 1500) }}"#);
        assert_eq!(out.unwrap(), "1,500 views");
    }

    #[test]
    fn test_format_regexp_groups() {
        let out = format_regexp("09121234567", r"^(\d{4})(\d{3})(\d{4})$", "($1) $2-$3").unwrap();
        assert_eq!(out, "(0912) 123-4567");
    }

    #[test]
    fn test_format_regexp_invalid_pattern() {
        let err = format_regexp("x", "(", "y").unwrap_err();
        assert!(matches!(err, PipeError::Pattern(_)));
    }

    #[test]
    fn test_regexp_fmt_in_template() {
        let out = render(
            "regexpFmt",
            regexp_fmt(),
            r##"{{ regexpFmt("a1b22c333", "[0-9]+", "#") }}"##,
        );
        assert_eq!(out.unwrap(), "a#b#c#");

        let err = render("regexpFmt", regexp_fmt(), r#"{{ regexpFmt("x", "(", "y") }}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_to_json() {
        let out = render("toJson", to_json(), "{{ toJson(meta) }}").unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, json!({ "title": "Home", "draft": null }));
    }

    #[test]
    fn test_dict() {
        let out = render("dict", dict(), r#"{{ dict("a", 1, "b", "two").b }}"#).unwrap();
        assert_eq!(out, "two");
    }

    #[test]
    fn test_dict_argument_errors() {
        assert!(matches!(
            build_dict(&[Value::from("a")]),
            Err(PipeError::OddArguments)
        ));
        assert!(matches!(
            build_dict(&[Value::from(1), Value::from(2)]),
            Err(PipeError::NonStringKey(_))
        ));
        assert!(render("dict", dict(), r#"{{ dict("a") }}"#).is_err());
    }

    #[test]
    fn test_is_set() {
        let tpl = r#"{% if isSet(meta, "title") %}t{% endif %}{% if isSet(meta, "draft") %}d{% endif %}{% if isSet(meta, "x") %}x{% endif %}"#;
        assert_eq!(render("isSet", is_set(), tpl).unwrap(), "td");
        assert!(!has_field(&Value::from("title"), "title"));
    }

    #[test]
    fn test_alter() {
        let tpl = r#"{{ alter(meta.draft, "none") }}|{{ alter(missing, "gone") }}|{{ alter(count, 9) }}"#;
        assert_eq!(render("alter", alter(), tpl).unwrap(), "none|gone|0");
    }

    #[test]
    fn test_deep_alter() {
        let tpl = r#"{{ deepAlter(tags, "no tags") }}|{{ deepAlter(count, 9) }}|{{ deepAlter("", "blank") }}|{{ deepAlter(meta.title, "x") }}"#;
        assert_eq!(
            render("deepAlter", deep_alter(), tpl).unwrap(),
            "no tags|9|blank|Home"
        );
    }

    #[test]
    fn test_br_escapes_then_breaks() {
        let out = render("br", br(), "{{ br(comment) }}").unwrap();
        assert_eq!(out, "a &lt; b<br/>second line");
        assert!(line_breaks("x").is_safe());
    }
}
