//! Per-value quality encoding for historical reads
//!
//! A two-bit data-location code plus three independent informational flag
//! bits, OR-composed into one word and decoded by masking. Callers embed
//! the word into their status codes.

/// Where a returned historical value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum DataLocation {
    /// Stored value returned verbatim
    Raw = 0b00,
    /// Value computed from stored data
    Calculated = 0b01,
    /// Value interpolated between two stored neighbors
    Interpolated = 0b10,
}

/// OR-composable quality word attached to each historical value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityBits(u32);

impl QualityBits {
    const LOCATION_MASK: u32 = 0b11;
    const PARTIAL: u32 = 1 << 2;
    const EXTRA_DATA: u32 = 1 << 3;
    const MULTIPLE_VALUES: u32 = 1 << 4;

    #[must_use]
    pub const fn new(location: DataLocation) -> Self {
        Self(location as u32)
    }

    /// Value was calculated over an incomplete interval
    #[must_use]
    pub const fn with_partial(self) -> Self {
        Self(self.0 | Self::PARTIAL)
    }

    /// A raw value at the same timestamp supersedes this one
    #[must_use]
    pub const fn with_extra_data(self) -> Self {
        Self(self.0 | Self::EXTRA_DATA)
    }

    /// Multiple stored values matched the request
    #[must_use]
    pub const fn with_multiple_values(self) -> Self {
        Self(self.0 | Self::MULTIPLE_VALUES)
    }

    #[must_use]
    pub const fn location(self) -> DataLocation {
        match self.0 & Self::LOCATION_MASK {
            0b01 => DataLocation::Calculated,
            0b10 => DataLocation::Interpolated,
            _ => DataLocation::Raw,
        }
    }

    #[must_use]
    pub const fn is_partial(self) -> bool {
        self.0 & Self::PARTIAL != 0
    }

    #[must_use]
    pub const fn has_extra_data(self) -> bool {
        self.0 & Self::EXTRA_DATA != 0
    }

    #[must_use]
    pub const fn has_multiple_values(self) -> bool {
        self.0 & Self::MULTIPLE_VALUES != 0
    }

    /// Raw word for embedding into a wire status code
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for QualityBits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let location = match self.location() {
            DataLocation::Raw => "raw",
            DataLocation::Calculated => "calculated",
            DataLocation::Interpolated => "interpolated",
        };
        write!(f, "{location}")?;
        if self.is_partial() {
            write!(f, "+partial")?;
        }
        if self.has_extra_data() {
            write!(f, "+extra")?;
        }
        if self.has_multiple_values() {
            write!(f, "+multiple")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_survives_flag_composition() {
        let quality = QualityBits::new(DataLocation::Interpolated)
            .with_partial()
            .with_multiple_values();
        assert_eq!(quality.location(), DataLocation::Interpolated);
        assert!(quality.is_partial());
        assert!(!quality.has_extra_data());
        assert!(quality.has_multiple_values());
    }

    #[test]
    fn flags_are_independent() {
        let raw = QualityBits::new(DataLocation::Raw);
        assert!(!raw.is_partial());
        assert!(!raw.has_extra_data());
        assert!(!raw.has_multiple_values());
        assert_eq!(raw.bits(), 0);

        let flagged = raw.with_extra_data();
        assert_eq!(flagged.bits(), 0b1000);
        assert_eq!(flagged.location(), DataLocation::Raw);
    }

    #[test]
    fn bits_compose_by_or() {
        let q = QualityBits::new(DataLocation::Calculated)
            .with_partial()
            .with_extra_data()
            .with_multiple_values();
        assert_eq!(q.bits(), 0b11101);
    }
}
