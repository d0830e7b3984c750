//! value canonicalization
//!
//! Comparing resolved values against an allow list needs a common shape:
//! - numbers collapse to one canonical decimal rendering (`2`, not `2.0`)
//! - strings that look like numbers count as numbers, but only when the
//!   allow list is numeric (`zones = ["1"]` vs `zones = [1]`); otherwise
//!   `"1"` stays a string so it cannot accidentally equal `1`
//! - arrays become ordered duplicate-free sets, so `[3, 2, 1]` and
//!   `[1, 2, 3]` compare equal
//!
//! [CanonicalValue] carries a total order over all shapes so sets of mixed
//! members are well defined.
use crate::value::Value;
use std::cmp::Ordering;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalValue {
    Null,
    Boolean(bool),
    /// canonical decimal rendering
    Number(String),
    String(String),
    Set(BTreeSet<CanonicalValue>),
}

/// Whether strings should be read as numbers when possible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericHint {
    Numeric,
    Verbatim,
}

impl NumericHint {
    /// Numeric when any allowed value (or collection member) is a number
    pub fn for_allowed(allowed: &[Value]) -> Self {
        fn has_number(value: &Value) -> bool {
            match value {
                Value::Integer(_) | Value::Decimal(_) => true,
                Value::Array(items) => items.iter().any(has_number),
                _ => false,
            }
        }

        if allowed.iter().any(has_number) {
            NumericHint::Numeric
        } else {
            NumericHint::Verbatim
        }
    }
}

pub fn canonicalize(value: &Value, numeric: NumericHint) -> CanonicalValue {
    match value {
        Value::Null => CanonicalValue::Null,
        Value::Boolean(value) => CanonicalValue::Boolean(*value),
        Value::Integer(value) => CanonicalValue::Number(value.to_string()),
        Value::Decimal(value) => CanonicalValue::Number(decimal_repr(*value)),
        Value::String(text) => match numeric {
            NumericHint::Numeric => match numeric_repr(text) {
                Some(repr) => CanonicalValue::Number(repr),
                None => CanonicalValue::String(text.clone()),
            },
            NumericHint::Verbatim => CanonicalValue::String(text.clone()),
        },
        Value::Array(items) => CanonicalValue::Set(
            items
                .iter()
                .map(|item| canonicalize(item, numeric))
                .collect(),
        ),
        // objects never appear in allow lists; the rendering keeps them comparable
        Value::Object(_) => CanonicalValue::String(value.to_string()),
    }
}

fn decimal_repr(value: f64) -> String {
    format!("{value}")
}

fn numeric_repr(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Some(int.to_string());
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|float| float.is_finite())
        .map(decimal_repr)
}

impl CanonicalValue {
    fn rank(&self) -> u8 {
        match self {
            CanonicalValue::Null => 0,
            CanonicalValue::Boolean(_) => 1,
            CanonicalValue::Number(_) => 2,
            CanonicalValue::String(_) => 3,
            CanonicalValue::Set(_) => 4,
        }
    }
}

impl Ord for CanonicalValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use CanonicalValue::*;

        match (self, other) {
            (Null, Null) => Ordering::Equal,
            (Boolean(a), Boolean(b)) => a.cmp(b),
            // canonical reprs are unique per numeric value, so this stays
            // consistent with Eq
            (Number(a), Number(b)) => numeric_order(a, b),
            (String(a), String(b)) => a.cmp(b),
            (Set(a), Set(b)) => a.iter().cmp(b.iter()),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for CanonicalValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn numeric_order(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(a_num), Ok(b_num)) => a_num.total_cmp(&b_num).then_with(|| a.cmp(b)),
        _ => a.cmp(b),
    }
}

impl std::fmt::Display for CanonicalValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CanonicalValue::Null => f.write_str("null"),
            CanonicalValue::Boolean(value) => write!(f, "{value}"),
            CanonicalValue::Number(repr) => f.write_str(repr),
            CanonicalValue::String(text) => f.write_str(text),
            CanonicalValue::Set(members) => {
                f.write_str("[")?;
                for (index, member) in members.iter().enumerate() {
                    if index > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{member}")?;
                }
                f.write_str("]")
            }
        }
    }
}
