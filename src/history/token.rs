//! Stateless continuation tokens for paginated history reads
//!
//! A token is nothing but the last returned sequence index, carried on the
//! wire as its decimal text. No server-side cursor state exists, so
//! releasing a continuation is always trivially satisfiable.

use crate::{Error, Result};

/// Opaque cursor resuming a paginated raw history read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuationToken {
    last_sequence: i64,
}

impl ContinuationToken {
    #[must_use]
    pub const fn new(last_sequence: i64) -> Self {
        Self { last_sequence }
    }

    /// Sequence index of the last record the client has already received
    #[must_use]
    pub const fn last_sequence(self) -> i64 {
        self.last_sequence
    }

    /// Wire form: decimal text as raw bytes
    #[must_use]
    pub fn to_bytes(self) -> Vec<u8> {
        self.last_sequence.to_string().into_bytes()
    }

    /// Decode the wire form
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadContinuation`] if the bytes are not the decimal
    /// text of a sequence index
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        std::str::from_utf8(bytes)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Self::new)
            .ok_or(Error::BadContinuation)
    }
}
