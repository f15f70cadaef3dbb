//! Error types for the Fieldgate gateway

use thiserror::Error;

use crate::space::NodeIdentifier;
use crate::variant::DataKind;

/// Result type alias for Fieldgate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Fieldgate gateway
#[derive(Debug, Error)]
pub enum Error {
    /// A capability is already registered under this node identifier
    #[error("node {0} is already registered")]
    AlreadyRegistered(NodeIdentifier),

    /// No capability registered under this node identifier
    #[error("node {0} is not registered")]
    NotFound(NodeIdentifier),

    /// Declared and actual value kinds differ
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: DataKind,
        actual: DataKind,
    },

    /// More call arguments than the callable declares
    #[error("too many arguments: at most {expected} accepted, {actual} provided")]
    TooManyArguments { expected: usize, actual: usize },

    /// A call argument is unsupported or of the wrong kind
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A mandatory call argument was not provided
    #[error("missing mandatory argument: {0}")]
    MissingArgument(String),

    /// Read dispatched to a capability that cannot be read
    #[error("node {0} is not readable")]
    NotReadable(NodeIdentifier),

    /// Write dispatched to a capability that cannot be written
    #[error("node {0} is not writable")]
    NotWritable(NodeIdentifier),

    /// Call dispatched to a capability that cannot be called
    #[error("node {0} is not callable")]
    NotCallable(NodeIdentifier),

    /// The historizer cannot reach its storage backend
    #[error("history backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Database pool error
    #[error("database error: {0}")]
    Database(String),

    /// `SQLite` error
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// No historical data for the requested node or range
    #[error("no historical data for node {0}")]
    NoData(NodeIdentifier),

    /// No bounding record exists for a requested timestamp
    #[error("no bounding record around {0}")]
    NoBound(chrono::DateTime<chrono::Utc>),

    /// Values of this kind cannot be interpolated
    #[error("not interpolatable: {0}")]
    NotInterpolatable(String),

    /// A continuation token could not be decoded
    #[error("corrupted continuation token")]
    BadContinuation,

    /// Some elements of a device tree failed to build
    #[error("{failed} device element(s) failed to build")]
    Partial { failed: usize },

    /// Any other unexpected failure
    #[error("internal error: {0}")]
    Internal(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parsing error
    #[error("json error: {0}")]
    Serialization(#[from] serde_json::Error),
}
