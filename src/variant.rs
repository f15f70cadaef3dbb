//! Canonical value representation exchanged with information-model objects
//!
//! `DataVariant` is the internal tagged union every capability reads, writes
//! and calls with, independent of the wire encoding. The arithmetic helpers
//! at the bottom back historical interpolation and operate on the value's
//! native width, saturating instead of wrapping.

use chrono::{DateTime, TimeZone, Utc};

use crate::{Error, Result};

/// Kind tag of a [`DataVariant`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Boolean,
    UInteger,
    Integer,
    Double,
    Text,
    Bytes,
    Timestamp,
}

impl DataKind {
    /// All supported kinds, in declaration order
    pub const ALL: [Self; 7] = [
        Self::Boolean,
        Self::UInteger,
        Self::Integer,
        Self::Double,
        Self::Text,
        Self::Bytes,
        Self::Timestamp,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::UInteger => "uinteger",
            Self::Integer => "integer",
            Self::Double => "double",
            Self::Text => "text",
            Self::Bytes => "bytes",
            Self::Timestamp => "timestamp",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "boolean" => Some(Self::Boolean),
            "uinteger" => Some(Self::UInteger),
            "integer" => Some(Self::Integer),
            "double" => Some(Self::Double),
            "text" => Some(Self::Text),
            "bytes" => Some(Self::Bytes),
            "timestamp" => Some(Self::Timestamp),
            _ => None,
        }
    }

    /// Whether values of this kind take part in interpolation arithmetic
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::UInteger | Self::Integer | Self::Double)
    }
}

impl std::fmt::Display for DataKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Internal tagged-union value carrying one primitive kind
#[derive(Debug, Clone, PartialEq)]
pub enum DataVariant {
    Boolean(bool),
    UInteger(u64),
    Integer(i64),
    Double(f64),
    Text(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
}

impl DataVariant {
    /// Kind tag of the contained value
    #[must_use]
    pub const fn kind(&self) -> DataKind {
        match self {
            Self::Boolean(_) => DataKind::Boolean,
            Self::UInteger(_) => DataKind::UInteger,
            Self::Integer(_) => DataKind::Integer,
            Self::Double(_) => DataKind::Double,
            Self::Text(_) => DataKind::Text,
            Self::Bytes(_) => DataKind::Bytes,
            Self::Timestamp(_) => DataKind::Timestamp,
        }
    }

    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        self.kind().is_numeric()
    }

    /// Fixed stand-in value for a kind
    ///
    /// Used as the initial value of write-only variable nodes (the runtime
    /// requires a present value) and as the reply to a read on a write-only
    /// capability. Never reflects actual device state.
    #[must_use]
    pub fn placeholder(kind: DataKind) -> Self {
        match kind {
            DataKind::Boolean => Self::Boolean(false),
            DataKind::UInteger => Self::UInteger(0),
            DataKind::Integer => Self::Integer(0),
            DataKind::Double => Self::Double(0.0),
            DataKind::Text => Self::Text(String::new()),
            DataKind::Bytes => Self::Bytes(Vec::new()),
            DataKind::Timestamp => Self::Timestamp(Utc.timestamp_opt(0, 0).unwrap()),
        }
    }
}

impl std::fmt::Display for DataVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{v}"),
            Self::UInteger(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
            Self::Bytes(v) => f.write_str(&hex::encode(v)),
            Self::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
        }
    }
}

fn non_numeric(op: &str, kind: DataKind) -> Error {
    Error::NotInterpolatable(format!("cannot {op} {kind} values"))
}

/// Same-kind subtraction, saturating at the kind's bounds
pub fn sub(lhs: &DataVariant, rhs: &DataVariant) -> Result<DataVariant> {
    if lhs.kind() != rhs.kind() {
        return Err(Error::NotInterpolatable(format!(
            "cannot subtract {} from {}",
            rhs.kind(),
            lhs.kind()
        )));
    }
    match (lhs, rhs) {
        (DataVariant::UInteger(a), DataVariant::UInteger(b)) => {
            Ok(DataVariant::UInteger(a.saturating_sub(*b)))
        }
        (DataVariant::Integer(a), DataVariant::Integer(b)) => {
            Ok(DataVariant::Integer(a.saturating_sub(*b)))
        }
        (DataVariant::Double(a), DataVariant::Double(b)) => Ok(DataVariant::Double(a - b)),
        _ => Err(non_numeric("subtract", lhs.kind())),
    }
}

/// Same-kind addition, saturating at the kind's bounds
pub fn add(lhs: &DataVariant, rhs: &DataVariant) -> Result<DataVariant> {
    if lhs.kind() != rhs.kind() {
        return Err(Error::NotInterpolatable(format!(
            "cannot add {} to {}",
            rhs.kind(),
            lhs.kind()
        )));
    }
    match (lhs, rhs) {
        (DataVariant::UInteger(a), DataVariant::UInteger(b)) => {
            Ok(DataVariant::UInteger(a.saturating_add(*b)))
        }
        (DataVariant::Integer(a), DataVariant::Integer(b)) => {
            Ok(DataVariant::Integer(a.saturating_add(*b)))
        }
        (DataVariant::Double(a), DataVariant::Double(b)) => Ok(DataVariant::Double(a + b)),
        _ => Err(non_numeric("add", lhs.kind())),
    }
}

/// Scalar multiplication on the value's native width, saturating
pub fn mul_scalar(lhs: &DataVariant, rhs: i64) -> Result<DataVariant> {
    match lhs {
        DataVariant::UInteger(a) => {
            let value = if rhs < 0 {
                0
            } else {
                a.saturating_mul(rhs as u64)
            };
            Ok(DataVariant::UInteger(value))
        }
        DataVariant::Integer(a) => Ok(DataVariant::Integer(a.saturating_mul(rhs))),
        DataVariant::Double(a) => Ok(DataVariant::Double(a * rhs as f64)),
        _ => Err(non_numeric("multiply", lhs.kind())),
    }
}

/// Scalar division on the value's native width
///
/// Division by zero is rejected outright; the signed overflow case
/// (`i64::MIN / -1`) saturates at the maximum.
pub fn div_scalar(lhs: &DataVariant, rhs: i64) -> Result<DataVariant> {
    if rhs == 0 {
        return Err(Error::InvalidArgument("division by zero".into()));
    }
    match lhs {
        DataVariant::UInteger(a) => {
            let value = if rhs < 0 { 0 } else { a / rhs as u64 };
            Ok(DataVariant::UInteger(value))
        }
        DataVariant::Integer(a) => {
            Ok(DataVariant::Integer(a.checked_div(rhs).unwrap_or(i64::MAX)))
        }
        DataVariant::Double(a) => Ok(DataVariant::Double(a / rhs as f64)),
        _ => Err(non_numeric("divide", lhs.kind())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_str() {
        for kind in DataKind::ALL {
            assert_eq!(DataKind::from_str(kind.as_str()), Some(kind));
        }
        assert_eq!(DataKind::from_str("float"), None);
    }

    #[test]
    fn placeholder_matches_kind() {
        for kind in DataKind::ALL {
            assert_eq!(DataVariant::placeholder(kind).kind(), kind);
        }
    }

    #[test]
    fn numeric_kinds() {
        assert!(DataVariant::Integer(1).is_numeric());
        assert!(DataVariant::UInteger(1).is_numeric());
        assert!(DataVariant::Double(1.0).is_numeric());
        assert!(!DataVariant::Boolean(true).is_numeric());
        assert!(!DataVariant::Text("x".into()).is_numeric());
    }

    #[test]
    fn add_saturates_on_overflow() {
        let max = DataVariant::Integer(i64::MAX);
        let one = DataVariant::Integer(1);
        assert_eq!(add(&max, &one).unwrap(), DataVariant::Integer(i64::MAX));

        let umax = DataVariant::UInteger(u64::MAX);
        let uone = DataVariant::UInteger(1);
        assert_eq!(add(&umax, &uone).unwrap(), DataVariant::UInteger(u64::MAX));
    }

    #[test]
    fn sub_saturates_on_underflow() {
        let min = DataVariant::Integer(i64::MIN);
        let one = DataVariant::Integer(1);
        assert_eq!(sub(&min, &one).unwrap(), DataVariant::Integer(i64::MIN));

        let uzero = DataVariant::UInteger(0);
        let uone = DataVariant::UInteger(1);
        assert_eq!(sub(&uzero, &uone).unwrap(), DataVariant::UInteger(0));
    }

    #[test]
    fn mul_saturates_on_overflow() {
        let big = DataVariant::Integer(i64::MAX / 2 + 1);
        assert_eq!(mul_scalar(&big, 2).unwrap(), DataVariant::Integer(i64::MAX));
    }

    #[test]
    fn div_by_zero_is_rejected() {
        let v = DataVariant::Integer(10);
        assert!(matches!(
            div_scalar(&v, 0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn div_min_by_negative_one_saturates() {
        let v = DataVariant::Integer(i64::MIN);
        assert_eq!(div_scalar(&v, -1).unwrap(), DataVariant::Integer(i64::MAX));
    }

    #[test]
    fn boolean_arithmetic_is_rejected() {
        let t = DataVariant::Boolean(true);
        assert!(matches!(add(&t, &t), Err(Error::NotInterpolatable(_))));
        assert!(matches!(sub(&t, &t), Err(Error::NotInterpolatable(_))));
        assert!(matches!(
            mul_scalar(&t, 2),
            Err(Error::NotInterpolatable(_))
        ));
        assert!(matches!(
            div_scalar(&t, 2),
            Err(Error::NotInterpolatable(_))
        ));
    }

    #[test]
    fn mixed_kind_arithmetic_is_rejected() {
        let a = DataVariant::Integer(1);
        let b = DataVariant::Double(1.0);
        assert!(add(&a, &b).is_err());
        assert!(sub(&a, &b).is_err());
    }
}
