//! Crate-wide error type.

use std::io;

use thiserror::Error;

use crate::audio::codec::SampleFormat;
use crate::audio::constants::{RATE_MAX, RATE_MIN};

/// Errors surfaced by stream setup, negotiation and transfer.
#[derive(Debug, Error)]
pub enum RateError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("unsupported format {0}: rate conversion works on linear PCM only")]
    NonLinearFormat(SampleFormat),

    #[error("rate {0} Hz outside the supported {min}-{max} Hz range", min = RATE_MIN, max = RATE_MAX)]
    RateOutOfRange(u32),

    #[error("missing required configuration field: {0}")]
    MissingField(&'static str),

    #[error("unknown sample format name: {0:?}")]
    UnknownFormat(String),

    #[error("constraints cannot be satisfied (empty set)")]
    EmptyConstraint,

    #[error("stream is not configured")]
    NotConfigured,

    #[error("transfer direction does not match the stream direction")]
    DirectionMismatch,

    #[error("failed to allocate conversion state for {0} channels")]
    StateAlloc(usize),

    #[error("config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Result alias used across the crate.
pub type RateResult<T> = Result<T, RateError>;

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn io_error_wraps() {
        let err: RateError = io::Error::new(io::ErrorKind::BrokenPipe, "slave gone").into();
        assert!(matches!(err, RateError::Io(_)));
    }

    #[test]
    fn non_linear_display_names_format() {
        let err = RateError::NonLinearFormat(SampleFormat::FloatLe);
        assert!(err.to_string().contains("f32le"));
    }

    #[test]
    fn rate_out_of_range_display() {
        let err = RateError::RateOutOfRange(1_000_000);
        assert!(err.to_string().contains("1000000"));
        assert!(err.to_string().contains("192000"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RateError>();
    }
}
