//! Streaming sample-rate conversion for PCM audio.
//!
//! A [`RateStream`] sits between a client that produces or consumes frames
//! at one rate and a slave transport running at another, converting with a
//! stateful fixed-point resampler so a stream can be fed in arbitrary
//! chunks.

pub mod audio;
pub mod common;
pub mod config;

pub use audio::memory::MemoryTransport;
pub use audio::negotiate::Constraints;
pub use audio::pump::StreamPump;
pub use audio::stream::{RateStream, StreamDirection, StreamParams};
pub use common::errors::{RateError, RateResult};
