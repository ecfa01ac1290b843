//! Emptiness predicates for template values.
//!
//! Template payloads are dynamically typed, so each [`ValueKind`] gets an
//! explicit rule for what counts as "empty".

use minijinja::value::{Value, ValueKind};

/// Returns true for `none` and undefined values.
pub fn is_nil(value: &Value) -> bool {
    value.is_undefined() || value.is_none()
}

/// Returns true when a value holds nothing worth rendering.
///
/// | Kind | Empty when |
/// |------|------------|
/// | undefined, none | always |
/// | string, bytes | length is zero |
/// | sequence, map | no items |
/// | number | equal to zero |
/// | bool | never |
pub fn is_empty(value: &Value) -> bool {
    match value.kind() {
        ValueKind::Undefined | ValueKind::None => true,
        ValueKind::String | ValueKind::Bytes | ValueKind::Seq | ValueKind::Map => {
            value.len() == Some(0)
        }
        ValueKind::Number => is_zero(value),
        _ => false,
    }
}

fn is_zero(value: &Value) -> bool {
    if let Some(int) = value.as_i64() {
        return int == 0;
    }
    f64::try_from(value.clone())
        .map(|float| float == 0.0)
        .unwrap_or(false)
}
