//! Primitive value kinds and the tagged [`Value`] that carries them.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::error::{ExhibitError, ExhibitResult};

/// The closed set of primitive kinds a field, vector, or value can have.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Boolean,
    Integer,
    Long,
    Float,
    Double,
    Decimal,
    String,
    Date,
    Timestamp,
}

impl FieldType {
    pub const ALL: [FieldType; 9] = [
        FieldType::Boolean,
        FieldType::Integer,
        FieldType::Long,
        FieldType::Float,
        FieldType::Double,
        FieldType::Decimal,
        FieldType::String,
        FieldType::Date,
        FieldType::Timestamp,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FieldType::Boolean => "boolean",
            FieldType::Integer => "integer",
            FieldType::Long => "long",
            FieldType::Float => "float",
            FieldType::Double => "double",
            FieldType::Decimal => "decimal",
            FieldType::String => "string",
            FieldType::Date => "date",
            FieldType::Timestamp => "timestamp",
        }
    }

    /// Whether `value` may be stored in a slot declared with this type.
    ///
    /// `Null` is admissible for every type; otherwise the value's tag must match exactly.
    pub fn admits(self, value: &Value) -> bool {
        match value.field_type() {
            None => true,
            Some(ft) => ft == self,
        }
    }

    /// The value used to fill a slot of this type when no data is available.
    pub fn default_value(self) -> Value {
        match self {
            FieldType::Boolean => Value::Boolean(false),
            FieldType::Integer => Value::Integer(0),
            FieldType::Long => Value::Long(0),
            FieldType::Float => Value::Float(OrderedFloat(0.0)),
            FieldType::Double => Value::Double(OrderedFloat(0.0)),
            FieldType::Decimal => Value::Decimal(Decimal::ZERO),
            FieldType::String => Value::String(Arc::from("")),
            FieldType::Date => Value::Date(NaiveDate::default()),
            FieldType::Timestamp => Value::Timestamp(NaiveDateTime::default()),
        }
    }

    /// Convert `value` into this type.
    ///
    /// Numbers convert between each other. Fractions truncate toward zero when narrowing to an
    /// integer kind; a number outside the `Integer` range fails instead of wrapping, and floats
    /// beyond the `Long` range saturate. Strings are parsed, booleans accept numbers (`!= 0`) and any string other than
    /// `"false"`, dates and timestamps accept epoch milliseconds. `Null` stays `Null`.
    pub fn cast(self, value: Value) -> ExhibitResult<Value> {
        if value.is_null() || self.admits(&value) {
            return Ok(value);
        }
        let fail = |value: &Value| ExhibitError::InvalidCast {
            value: value.to_string(),
            target: self,
        };
        let cast = match (self, &value) {
            (FieldType::String, v) => Some(Value::String(Arc::from(v.to_string()))),
            (FieldType::Boolean, Value::String(s)) => {
                Some(Value::Boolean(!s.trim().eq_ignore_ascii_case("false")))
            }
            (FieldType::Boolean, v) => v.as_f64().map(|n| Value::Boolean(n != 0.0)),
            (FieldType::Integer, Value::String(s)) => s.trim().parse().ok().map(Value::Integer),
            (FieldType::Integer, v) => v
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .map(Value::Integer),
            (FieldType::Long, Value::String(s)) => s.trim().parse().ok().map(Value::Long),
            (FieldType::Long, v) => v.as_i64().map(Value::Long),
            (FieldType::Float, Value::String(s)) => s
                .trim()
                .parse::<f32>()
                .ok()
                .map(|n| Value::Float(OrderedFloat(n))),
            (FieldType::Float, v) => v.as_f64().map(|n| Value::Float(OrderedFloat(n as f32))),
            (FieldType::Double, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .map(|n| Value::Double(OrderedFloat(n))),
            (FieldType::Double, v) => v.as_f64().map(|n| Value::Double(OrderedFloat(n))),
            (FieldType::Decimal, Value::String(s)) => s.parse().ok().map(Value::Decimal),
            (FieldType::Decimal, Value::Integer(n)) => Some(Value::Decimal(Decimal::from(*n))),
            (FieldType::Decimal, Value::Long(n)) => Some(Value::Decimal(Decimal::from(*n))),
            (FieldType::Decimal, v) => v
                .as_f64()
                .and_then(|n| n.to_string().parse().ok())
                .map(Value::Decimal),
            (FieldType::Date, Value::String(s)) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .ok()
                .map(Value::Date),
            (FieldType::Date, Value::Timestamp(ts)) => Some(Value::Date(ts.date())),
            (FieldType::Date, v) => v
                .as_epoch_millis()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map(|dt| Value::Date(dt.date_naive())),
            (FieldType::Timestamp, Value::String(s)) => parse_timestamp(s).map(Value::Timestamp),
            (FieldType::Timestamp, Value::Date(d)) => {
                Some(Value::Timestamp(d.and_time(NaiveTime::MIN)))
            }
            (FieldType::Timestamp, v) => v
                .as_epoch_millis()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map(|dt| Value::Timestamp(dt.naive_utc())),
        };
        cast.ok_or_else(|| fail(&value))
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FieldType {
    type Err = ExhibitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "bool" => return Ok(FieldType::Boolean),
            "int" => return Ok(FieldType::Integer),
            _ => {}
        }
        FieldType::ALL
            .into_iter()
            .find(|ft| ft.name() == lower)
            .ok_or_else(|| ExhibitError::UnsupportedFieldType(s.to_string()))
    }
}

/// A single scalar value, tagged with its kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
    Decimal(Decimal),
    String(Arc<str>),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl Value {
    /// The kind of this value, or `None` for `Null`.
    pub fn field_type(&self) -> Option<FieldType> {
        Some(match self {
            Value::Null => return None,
            Value::Boolean(_) => FieldType::Boolean,
            Value::Integer(_) => FieldType::Integer,
            Value::Long(_) => FieldType::Long,
            Value::Float(_) => FieldType::Float,
            Value::Double(_) => FieldType::Double,
            Value::Decimal(_) => FieldType::Decimal,
            Value::String(_) => FieldType::String,
            Value::Date(_) => FieldType::Date,
            Value::Timestamp(_) => FieldType::Timestamp,
        })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of integer, floating point, and decimal values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(f64::from(*n)),
            Value::Long(n) => Some(*n as f64),
            Value::Float(n) => Some(f64::from(n.0)),
            Value::Double(n) => Some(n.0),
            Value::Decimal(d) => Some(d.to_f64()),
            _ => None,
        }
    }

    /// Integral view of numeric values; fractional parts are truncated.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(i64::from(*n)),
            Value::Long(n) => Some(*n),
            Value::Float(n) => Some(n.0 as i64),
            Value::Double(n) => Some(n.0 as i64),
            Value::Decimal(d) => Some(d.to_f64() as i64),
            _ => None,
        }
    }

    fn as_epoch_millis(&self) -> Option<i64> {
        match self {
            Value::Integer(_) | Value::Long(_) => self.as_i64(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Long(n) => write!(f, "{n}"),
            Value::Float(n) => write!(f, "{}", n.0),
            Value::Double(n) => write!(f, "{}", n.0),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::String(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(OrderedFloat(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(OrderedFloat(value))
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(Arc::from(value))
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Timestamp(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid decimal literal: {0}")]
pub struct ParseDecimalError(String);

/// Fixed-point decimal number: `unscaled * 10^-scale`.
///
/// Values are kept normalized (no trailing fractional zeros), so `1.50` and `1.5` compare equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Decimal {
    unscaled: i128,
    scale: u32,
}

impl Decimal {
    pub const ZERO: Decimal = Decimal {
        unscaled: 0,
        scale: 0,
    };

    pub fn new(unscaled: i128, scale: u32) -> Self {
        let mut d = Decimal { unscaled, scale };
        while d.scale > 0 && d.unscaled % 10 == 0 {
            d.unscaled /= 10;
            d.scale -= 1;
        }
        d
    }

    pub fn unscaled(&self) -> i128 {
        self.unscaled
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn to_f64(&self) -> f64 {
        self.unscaled as f64 / 10f64.powi(self.scale as i32)
    }
}

impl Ord for Decimal {
    /// Numeric order. Both sides are rescaled to the larger scale; if that overflows `i128`
    /// the comparison falls back to `f64`.
    fn cmp(&self, other: &Self) -> Ordering {
        let scale = self.scale.max(other.scale);
        let rescale = |d: &Decimal| {
            10i128
                .checked_pow(scale - d.scale)
                .and_then(|factor| d.unscaled.checked_mul(factor))
        };
        match (rescale(self), rescale(other)) {
            (Some(lhs), Some(rhs)) => lhs.cmp(&rhs),
            _ => self.to_f64().total_cmp(&other.to_f64()),
        }
    }
}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<i32> for Decimal {
    fn from(value: i32) -> Self {
        Decimal::new(i128::from(value), 0)
    }
}

impl From<i64> for Decimal {
    fn from(value: i64) -> Self {
        Decimal::new(i128::from(value), 0)
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseDecimalError(s.to_string());
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(err());
        }

        let mut unscaled: i128 = 0;
        for ch in int_part.chars().chain(frac_part.chars()) {
            let digit = ch.to_digit(10).ok_or_else(err)?;
            unscaled = unscaled
                .checked_mul(10)
                .and_then(|n| n.checked_add(i128::from(digit)))
                .ok_or_else(err)?;
        }
        if negative {
            unscaled = -unscaled;
        }
        let scale = u32::try_from(frac_part.len()).map_err(|_| err())?;
        Ok(Decimal::new(unscaled, scale))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.unscaled < 0 { "-" } else { "" };
        let digits = self.unscaled.unsigned_abs().to_string();
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{sign}{digits}");
        }
        let padded = format!("{digits:0>width$}", width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{sign}{int_part}.{frac_part}")
    }
}
