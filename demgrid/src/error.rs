//! Error types for the demgrid library.
//!
//! Variants group into three families: I/O failures ([`DemError::Io`]),
//! format errors (malformed names, signatures, sizes, or structurally
//! required header fields), and decode errors (a compressed stream that did
//! not terminate the way its container declared).

use thiserror::Error;

/// Errors that can occur when loading elevation grids.
#[derive(Error, Debug)]
pub enum DemError {
    /// IO error when reading files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Filename does not follow the `[NS]dd[EW]ddd` SRTM convention.
    #[error("invalid SRTM tile name: {name:?} (expected [NS]dd[EW]ddd)")]
    InvalidTileName { name: String },

    /// Payload size matches neither SRTM1 nor SRTM3.
    #[error("invalid SRTM payload size: {size} bytes (expected 25934402 for SRTM1 or 2884802 for SRTM3)")]
    InvalidPayloadSize { size: usize },

    /// The buffer does not start with a ZIP local file header.
    #[error("not a ZIP local file header (bad signature)")]
    BadZipSignature,

    /// The archive ends before the declared entry payload does.
    #[error("archive truncated: need {needed} bytes, have {have}")]
    TruncatedArchive { needed: usize, have: usize },

    /// Raw DEFLATE stream failed or produced a size other than declared.
    #[error("inflate failed: {reason}")]
    Inflate { reason: String },

    /// bzip2 stream did not end in a valid terminal state.
    #[error("bzip2 decode failed: {reason}")]
    Bzip2 { reason: String },

    /// A structurally required DEM header token is missing or malformed.
    #[error("DEM header field {field:?} missing or malformed")]
    MissingHeaderField { field: &'static str },

    /// A DEM elevation profile could not be parsed.
    #[error("DEM profile malformed: {reason}")]
    MalformedProfile { reason: String },
}

/// Result type alias using [`DemError`].
pub type Result<T> = std::result::Result<T, DemError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DemError::InvalidPayloadSize { size: 1000 };
        assert!(err.to_string().contains("1000"));

        let err = DemError::InvalidTileName {
            name: "X41E056".to_string(),
        };
        assert!(err.to_string().contains("X41E056"));

        let err = DemError::MissingHeaderField { field: "zone" };
        assert!(err.to_string().contains("zone"));
    }
}
