//! Predicates over coerced option values.

use crate::config::SetupError;
use crate::value::{FromValue, Value};
use std::cmp::Ordering;
use std::fmt;

/// A check a coerced value must pass. The display text shows up in usage.
pub trait Validator: fmt::Display + fmt::Debug + Send + Sync {
    /// `None` stands for an absent value and never validates.
    fn validate(&self, value: Option<&Value>) -> bool;
}

/// Accepts values in `[min, max]`; either bound may be open.
#[derive(Debug, Clone)]
pub struct IntervalValidator<T> {
    min: Option<T>,
    max: Option<T>,
}

impl<T: PartialOrd + fmt::Display> IntervalValidator<T> {
    pub fn new(min: Option<T>, max: Option<T>) -> Result<Self, SetupError> {
        if let (Some(lo), Some(hi)) = (&min, &max) {
            if !matches!(lo.partial_cmp(hi), Some(Ordering::Less | Ordering::Equal)) {
                return Err(SetupError::InvalidInterval {
                    min: lo.to_string(),
                    max: hi.to_string(),
                });
            }
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> Option<&T> {
        self.min.as_ref()
    }

    pub fn max(&self) -> Option<&T> {
        self.max.as_ref()
    }

    pub fn contains(&self, value: Option<&T>) -> bool {
        let Some(value) = value else {
            return false;
        };
        let above_min = self
            .min
            .as_ref()
            .map_or(true, |min| matches!(value.partial_cmp(min), Some(Ordering::Greater | Ordering::Equal)));
        let below_max = self
            .max
            .as_ref()
            .map_or(true, |max| matches!(value.partial_cmp(max), Some(Ordering::Less | Ordering::Equal)));
        above_min && below_max
    }
}

impl<T> Validator for IntervalValidator<T>
where
    T: FromValue + PartialOrd + fmt::Display + fmt::Debug + Send + Sync,
{
    fn validate(&self, value: Option<&Value>) -> bool {
        let value = value.and_then(T::from_value);
        self.contains(value.as_ref())
    }
}

/// `interval [0, 100]`, `interval ]..., 100]`, `interval [0, ...[`
impl<T: fmt::Display> fmt::Display for IntervalValidator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("interval ")?;
        match &self.min {
            Some(min) => write!(f, "[{}", min)?,
            None => f.write_str("]...")?,
        }
        f.write_str(", ")?;
        match &self.max {
            Some(max) => write!(f, "{}]", max),
            None => f.write_str("...["),
        }
    }
}

/// Accepts only members of a fixed set.
#[derive(Debug, Clone)]
pub struct ValueSetValidator<T> {
    values: Vec<T>,
}

impl<T: PartialOrd> ValueSetValidator<T> {
    /// Duplicates are dropped; members are kept in sorted order.
    pub fn new(values: impl IntoIterator<Item = T>) -> Self {
        let mut values: Vec<T> = values.into_iter().collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
        values.dedup_by(|a, b| a == b);
        Self { values }
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn contains(&self, value: Option<&T>) -> bool {
        value.is_some_and(|value| self.values.iter().any(|v| v == value))
    }
}

impl<T> Validator for ValueSetValidator<T>
where
    T: FromValue + PartialOrd + fmt::Display + fmt::Debug + Send + Sync,
{
    fn validate(&self, value: Option<&Value>) -> bool {
        let value = value.and_then(T::from_value);
        self.contains(value.as_ref())
    }
}

impl<T: fmt::Display> fmt::Display for ValueSetValidator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<String> = self.values.iter().map(ToString::to_string).collect();
        write!(f, "allowed values [{}]", values.join(", "))
    }
}
