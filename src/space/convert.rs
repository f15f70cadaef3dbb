//! The single bidirectional wire ↔ internal type mapping
//!
//! Every conversion between the protocol's scalar type system and
//! [`DataVariant`] goes through here; nothing else in the crate is allowed
//! to know how the two type systems line up.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::variant::{DataKind, DataVariant};
use crate::{Error, Result};

/// Scalar type tag of the wire type system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    Boolean,
    UInt64,
    Int64,
    Double,
    String,
    ByteString,
    DateTime,
    /// Carried by the protocol but not representable in the information
    /// model; conversion to [`DataKind`] fails
    Guid,
}

impl TypeDescriptor {
    /// Numeric wire id of the type
    #[must_use]
    pub const fn type_id(self) -> u32 {
        match self {
            Self::Boolean => 1,
            Self::UInt64 => 9,
            Self::Int64 => 8,
            Self::Double => 11,
            Self::String => 12,
            Self::ByteString => 15,
            Self::DateTime => 13,
            Self::Guid => 14,
        }
    }

    /// Wire type for an information-model kind; total over [`DataKind`]
    #[must_use]
    pub const fn from_kind(kind: DataKind) -> Self {
        match kind {
            DataKind::Boolean => Self::Boolean,
            DataKind::UInteger => Self::UInt64,
            DataKind::Integer => Self::Int64,
            DataKind::Double => Self::Double,
            DataKind::Text => Self::String,
            DataKind::Bytes => Self::ByteString,
            DataKind::Timestamp => Self::DateTime,
        }
    }

    /// Information-model kind for a wire type, if one exists
    #[must_use]
    pub const fn kind(self) -> Option<DataKind> {
        match self {
            Self::Boolean => Some(DataKind::Boolean),
            Self::UInt64 => Some(DataKind::UInteger),
            Self::Int64 => Some(DataKind::Integer),
            Self::Double => Some(DataKind::Double),
            Self::String => Some(DataKind::Text),
            Self::ByteString => Some(DataKind::Bytes),
            Self::DateTime => Some(DataKind::Timestamp),
            Self::Guid => None,
        }
    }
}

/// Scalar value of the wire type system
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    Boolean(bool),
    UInt64(u64),
    Int64(i64),
    Double(f64),
    String(String),
    ByteString(Vec<u8>),
    DateTime(DateTime<Utc>),
    Guid(Uuid),
}

impl WireValue {
    #[must_use]
    pub const fn type_descriptor(&self) -> TypeDescriptor {
        match self {
            Self::Boolean(_) => TypeDescriptor::Boolean,
            Self::UInt64(_) => TypeDescriptor::UInt64,
            Self::Int64(_) => TypeDescriptor::Int64,
            Self::Double(_) => TypeDescriptor::Double,
            Self::String(_) => TypeDescriptor::String,
            Self::ByteString(_) => TypeDescriptor::ByteString,
            Self::DateTime(_) => TypeDescriptor::DateTime,
            Self::Guid(_) => TypeDescriptor::Guid,
        }
    }
}

impl From<DataVariant> for WireValue {
    fn from(value: DataVariant) -> Self {
        match value {
            DataVariant::Boolean(v) => Self::Boolean(v),
            DataVariant::UInteger(v) => Self::UInt64(v),
            DataVariant::Integer(v) => Self::Int64(v),
            DataVariant::Double(v) => Self::Double(v),
            DataVariant::Text(v) => Self::String(v),
            DataVariant::Bytes(v) => Self::ByteString(v),
            DataVariant::Timestamp(v) => Self::DateTime(v),
        }
    }
}

impl TryFrom<WireValue> for DataVariant {
    type Error = Error;

    fn try_from(value: WireValue) -> Result<Self> {
        match value {
            WireValue::Boolean(v) => Ok(Self::Boolean(v)),
            WireValue::UInt64(v) => Ok(Self::UInteger(v)),
            WireValue::Int64(v) => Ok(Self::Integer(v)),
            WireValue::Double(v) => Ok(Self::Double(v)),
            WireValue::String(v) => Ok(Self::Text(v)),
            WireValue::ByteString(v) => Ok(Self::Bytes(v)),
            WireValue::DateTime(v) => Ok(Self::Timestamp(v)),
            WireValue::Guid(v) => Err(Error::InvalidArgument(format!(
                "guid values are not representable in the information model: {v}"
            ))),
        }
    }
}
