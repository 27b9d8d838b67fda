//! Typed option values and their extraction into native Rust types.

use chrono::NaiveDate;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Why a raw string could not be turned into a [`Value`].
///
/// Never returned to callers of the parser: the option model folds every
/// variant into a single illegal-value error.
#[derive(Debug, Error)]
pub enum CoerceError {
    #[error("invalid integer: {0}")]
    Int(#[from] std::num::ParseIntError),

    #[error("invalid number: {0}")]
    Float(#[from] std::num::ParseFloatError),

    #[error("invalid date: {0}")]
    Date(#[from] chrono::ParseError),

    #[error("'{0}' is not a number in this locale")]
    Number(String),

    #[error("'{0}' is out of range")]
    OutOfRange(String),

    #[error("{0}")]
    Custom(String),
}

/// A coerced option value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Produced by options that carry no value at all (help).
    Unit,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Str(String),
    Date(NaiveDate),
}

impl Value {
    /// Short name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Long(_) => "long",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Str(_) => "string",
            Value::Date(_) => "date",
        }
    }

    /// Extract a native value, `None` if the variant does not match.
    pub fn get<T: FromValue>(&self) -> Option<T> {
        T::from_value(self)
    }
}

/// Values of different variants are unordered.
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Unit, Value::Unit) => Some(Ordering::Equal),
            (Value::Bool(a), Value::Bool(b)) => a.partial_cmp(b),
            (Value::Int(a), Value::Int(b)) => a.partial_cmp(b),
            (Value::Long(a), Value::Long(b)) => a.partial_cmp(b),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
            (Value::Str(a), Value::Str(b)) => a.partial_cmp(b),
            (Value::Date(a), Value::Date(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Long(l) => write!(f, "{}", l),
            // Debug keeps the trailing ".0" on whole numbers
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Double(x) => write!(f, "{:?}", x),
            Value::Str(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// Conversion out of a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

macro_rules! value_conversions {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Option<Self> {
                    match value {
                        Value::$variant(v) => Some(v.clone()),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

value_conversions! {
    bool => Bool,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    String => Str,
    NaiveDate => Date,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}
