//! Printf-style number formatting with thousands grouping.

use std::fmt::Write;

use minijinja::value::{Value, ValueKind};

enum Number {
    Int(i64),
    Float(f64),
}

fn number_of(value: &Value) -> Option<Number> {
    if value.kind() != ValueKind::Number {
        return None;
    }
    if let Some(int) = value.as_i64() {
        return Some(Number::Int(int));
    }
    f64::try_from(value.clone()).ok().map(Number::Float)
}

/// Formats `args` into `layout`, grouping the integer part of every number.
///
/// Supported verbs: `%d` (integer), `%f` / `%.Nf` (fixed point, six digits
/// by default), `%v` / `%s` (natural form, `%.Nv` fixes the precision) and
/// `%%`. Non-numeric arguments are written as-is. A verb without a matching
/// argument renders as `%!d(MISSING)`.
///
/// ```rust
/// use minijinja::Value;
/// use trellis_pipes::format_number;
///
/// let out = format_number("%d of %.2f", &[Value::from(12500), Value::from(99999.5)]);
/// assert_eq!(out, "12,500 of 99,999.50");
/// ```
pub fn format_number(layout: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(layout.len());
    let mut args = args.iter();
    let mut chars = layout.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        // Precision as written, echoed back when no verb follows.
        let mut written = String::new();
        let mut precision = None;
        if chars.peek() == Some(&'.') {
            chars.next();
            written.push('.');
            while let Some(d) = chars.peek().copied().filter(char::is_ascii_digit) {
                written.push(d);
                chars.next();
            }
            precision = Some(written[1..].parse().unwrap_or(0));
        }

        match chars.next() {
            Some('%') => out.push('%'),
            Some(verb @ ('d' | 'f' | 'v' | 's')) => match args.next() {
                Some(arg) => out.push_str(&format_arg(arg, verb, precision)),
                None => {
                    let _ = write!(out, "%!{}(MISSING)", verb);
                }
            },
            Some(other) => {
                out.push('%');
                out.push_str(&written);
                out.push(other);
            }
            None => {
                out.push('%');
                out.push_str(&written);
            }
        }
    }

    out
}

fn format_arg(arg: &Value, verb: char, precision: Option<usize>) -> String {
    let Some(number) = number_of(arg) else {
        return arg.to_string();
    };
    let plain = match (verb, number) {
        ('d', Number::Int(int)) => int.to_string(),
        ('d', Number::Float(float)) => format!("{:.0}", float.trunc()),
        ('f', Number::Int(int)) => format!("{:.*}", precision.unwrap_or(6), int as f64),
        ('f', Number::Float(float)) => format!("{:.*}", precision.unwrap_or(6), float),
        (_, Number::Int(int)) => match precision {
            Some(p) => format!("{:.*}", p, int as f64),
            None => int.to_string(),
        },
        (_, Number::Float(float)) => match precision {
            Some(p) => format!("{:.*}", p, float),
            None => float.to_string(),
        },
    };
    group_thousands(&plain)
}

/// Inserts `,` between every group of three digits in the integer part.
///
/// ```rust
/// assert_eq!(trellis_pipes::group_thousands("-1234567.891"), "-1,234,567.891");
/// ```
pub fn group_thousands(number: &str) -> String {
    let (sign, rest) = match number.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", number),
    };
    let (int, frac) = match rest.find('.') {
        Some(dot) => rest.split_at(dot),
        None => (rest, ""),
    };

    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}{}", sign, grouped, frac)
}
