//! Central constants for the rate-conversion pipeline.
//!
//! All magic numbers in `src/audio/**` live here so they can be tuned in one
//! place and remain consistent across modules.

// ── Fixed-point pitch ────────────────────────────────────────────────────────

/// Scale factor of the 16.16 fixed-point pitch ratio.
///
/// A pitch of exactly `PITCH_SCALE` means slave and client run at the same
/// rate; above it the stream is upsampled, below it downsampled.
pub const PITCH_SCALE: u32 = 1 << 16;

// ── Client rate limits ───────────────────────────────────────────────────────

/// Lowest client sample rate accepted during negotiation (Hz).
pub const RATE_MIN: u32 = 4_000;

/// Highest client sample rate accepted during negotiation (Hz).
pub const RATE_MAX: u32 = 192_000;

// ── Worker pump ──────────────────────────────────────────────────────────────

/// Idle sleep while the slave side cannot accept more frames (milliseconds).
pub const PUMP_IDLE_MS: u64 = 5;

/// Bound on queued chunks per stream pump before senders start blocking.
pub const PUMP_QUEUE_CHUNKS: usize = 32;
