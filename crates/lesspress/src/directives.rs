use crate::types::Options;
use regex::Regex;
use rustc_hash::FxHashSet;
use serde_json::{Number, Value};
use std::sync::OnceLock;

/// Keys recognized in a directive line. Anything else is ignored.
pub const SUPPORTED_DIRECTIVES: &[&str] = &[
    "main",
    "out",
    "outExt",
    "sourceMap",
    "sourceMapFileInline",
    "compress",
    "relativeUrls",
    "ieCompat",
    "autoprefixer",
    "javascriptEnabled",
    "math",
];

/// Keys whose repeated occurrences accumulate into a sequence
const MULTI_VALUED: &[&str] = &["main"];

fn directive_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^\s*//\s*(.+)").unwrap())
}

fn literal_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^(true|false|undefined|null|[0-9]+)$").unwrap())
}

/// A directive value after coercion
#[derive(Debug, Clone, PartialEq)]
enum Primitive {
    Undefined,
    Value(Value),
}

impl Primitive {
    fn into_value(self) -> Value {
        match self {
            Primitive::Undefined => Value::Null,
            Primitive::Value(v) => v,
        }
    }
}

/// Apply the directive line of `text` on top of `defaults`.
///
/// Only the first physical line is considered, and only when it is a `//`
/// comment. `defaults` is never modified; when there is no directive line
/// the result equals `defaults`.
///
/// ```
/// use lesspress::{directives, Options};
///
/// let options = directives::parse("// out: ../css/, sourceMap: true", &Options::new());
/// assert_eq!(options.get("out").and_then(|v| v.as_str()), Some("../css/"));
/// ```
pub fn parse(text: &str, defaults: &Options) -> Options {
    let first_line = text.lines().next().unwrap_or("");
    let Some(captures) = directive_regex().captures(first_line) else {
        return defaults.clone();
    };

    let mut options = defaults.clone();
    let mut seen: FxHashSet<&str> = FxHashSet::default();

    for item in captures[1].split(',') {
        let Some((key, raw_value)) = split_option(item) else {
            continue;
        };
        let Some(key) = SUPPORTED_DIRECTIVES.iter().copied().find(|k| *k == key) else {
            continue;
        };
        if raw_value.is_empty() {
            continue;
        }

        let value = parse_primitive(raw_value);

        if seen.contains(key) && MULTI_VALUED.contains(&key) {
            let value = value.into_value();
            match options.values.get_mut(key) {
                Some(Value::Array(existing)) => existing.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => options.set(key, Value::Array(vec![Value::Null, value])),
            }
        } else {
            match value {
                Primitive::Undefined => {
                    options.remove(key);
                }
                Primitive::Value(v) => options.set(key, v),
            }
            seen.insert(key);
        }
    }

    options
}

/// Split `key: value` on the first colon, trimming both halves
fn split_option(item: &str) -> Option<(&str, &str)> {
    let (key, value) = item.split_once(':')?;
    Some((key.trim(), value.trim()))
}

/// Coerce a raw directive value.
///
/// Only a closed set of literals is recognized; quoted strings are
/// unescaped, everything else stays a plain string.
fn parse_primitive(raw: &str) -> Primitive {
    if literal_regex().is_match(raw) {
        return match raw {
            "true" => Primitive::Value(Value::Bool(true)),
            "false" => Primitive::Value(Value::Bool(false)),
            "null" => Primitive::Value(Value::Null),
            "undefined" => Primitive::Undefined,
            digits => Primitive::Value(parse_integer(digits)),
        };
    }

    if is_enclosed_in_quotes(raw) {
        return match unquote(raw) {
            Some(s) => Primitive::Value(Value::String(s)),
            None => Primitive::Value(Value::String(raw.to_string())),
        };
    }

    Primitive::Value(Value::String(raw.to_string()))
}

fn parse_integer(digits: &str) -> Value {
    if let Ok(n) = digits.parse::<u64>() {
        return Value::Number(n.into());
    }
    digits
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(digits.to_string()))
}

fn is_enclosed_in_quotes(value: &str) -> bool {
    value.len() > 1
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
}

/// Unescape a quoted string literal.
/// Returns `None` when the literal is malformed, e.g. an unescaped quote of
/// the enclosing kind inside it or a backslash escaping the closing quote.
fn unquote(literal: &str) -> Option<String> {
    let quote = literal.chars().next()?;
    let inner = &literal[1..literal.len() - 1];

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                let escaped = chars.next()?;
                out.push(match escaped {
                    'n' => '\n',
                    't' => '\t',
                    'r' => '\r',
                    'b' => '\u{8}',
                    'f' => '\u{c}',
                    'v' => '\u{b}',
                    '0' => '\0',
                    other => other,
                });
            }
            c if c == quote => return None,
            c => out.push(c),
        }
    }

    Some(out)
}
