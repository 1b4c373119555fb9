//! Fixed-point streaming rate conversion — two directions:
//!
//! | Method | Direction | Algorithm |
//! |---|---|---|
//! | [`Method::Expand`] | upsampling | linear interpolation |
//! | [`Method::Shrink`] | downsampling / 1:1 | box-filter average |
//!
//! The converter is chunk-agnostic: feeding a stream sample by sample or in
//! arbitrary slices produces bit-identical output, because every carry value
//! lives in the per-channel [`ChannelState`].

pub mod expand;
pub mod shrink;

use tracing::trace;

use crate::audio::area::ChannelArea;
use crate::audio::codec::{SampleReader, SampleWriter};
use crate::audio::constants::PITCH_SCALE;
use crate::common::errors::{RateError, RateResult};

/// Fixed-point ratio `dst_rate / src_rate` at scale [`PITCH_SCALE`], rounded
/// to nearest.
pub fn pitch(src_rate: u32, dst_rate: u32) -> u32 {
    ((u64::from(dst_rate) * u64::from(PITCH_SCALE) + u64::from(src_rate) / 2)
        / u64::from(src_rate)) as u32
}

/// `frames * mul / div`, truncating toward zero.
pub fn muldiv_down(frames: usize, mul: u32, div: u32) -> usize {
    ((frames as u128 * u128::from(mul)) / u128::from(div)) as usize
}

/// `frames * mul / div`, rounding to nearest.
pub fn muldiv_near(frames: usize, mul: u32, div: u32) -> usize {
    ((frames as u128 * u128::from(mul) + u128::from(div) / 2) / u128::from(div)) as usize
}

/// Per-channel carry state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelState {
    /// Most recent input sample fetched on this channel.
    pub last_sample: i16,
    /// Unnormalized weighted sum of input consumed since the last emitted
    /// output (Shrink only).
    pub sum: i32,
    /// Fixed-point position of this channel's stream clock.
    pub pos: u32,
}

/// Conversion algorithm, picked once from the pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Expand,
    Shrink,
}

/// Borrowed source side of one conversion call.
pub struct SrcWindow<'a> {
    pub buf: &'a [u8],
    pub areas: &'a [ChannelArea],
    pub offset: usize,
    pub frames: usize,
}

/// Borrowed destination side of one conversion call.
pub struct DstWindow<'a> {
    pub buf: &'a mut [u8],
    pub areas: &'a [ChannelArea],
    pub offset: usize,
    pub frames: usize,
}

/// Streaming fixed-point rate converter between two PCM buffers.
pub struct RateConverter {
    pitch: u32,
    method: Method,
    states: Vec<ChannelState>,
}

impl RateConverter {
    /// Build a converter for `channels` channels of `src_rate` → `dst_rate`
    /// audio. The state comes up prepared, as after [`RateConverter::reset`].
    pub fn new(src_rate: u32, dst_rate: u32, channels: usize) -> RateResult<Self> {
        let pitch = pitch(src_rate, dst_rate);
        let method = if pitch > PITCH_SCALE {
            Method::Expand
        } else {
            Method::Shrink
        };
        let mut states = Vec::new();
        states
            .try_reserve_exact(channels)
            .map_err(|_| RateError::StateAlloc(channels))?;
        states.resize(channels, ChannelState::default());

        let mut converter = Self {
            pitch,
            method,
            states,
        };
        converter.reset();
        trace!("rate converter: {src_rate} Hz -> {dst_rate} Hz, pitch {pitch} ({method:?})");
        Ok(converter)
    }

    pub fn pitch(&self) -> u32 {
        self.pitch
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn channels(&self) -> usize {
        self.states.len()
    }

    /// `true` when the pitch works out to exactly 1:1.
    pub fn is_passthrough(&self) -> bool {
        self.pitch == PITCH_SCALE
    }

    /// Rewind all carry state to the start-of-stream position.
    pub fn reset(&mut self) {
        let pos = match self.method {
            // one whole step past the fetch threshold, forcing a fetch on entry
            Method::Expand => self.pitch + PITCH_SCALE,
            Method::Shrink => 0,
        };
        for state in &mut self.states {
            *state = ChannelState {
                last_sample: 0,
                sum: 0,
                pos,
            };
        }
    }

    /// Convert as much of `src` into `dst` as the two windows allow and
    /// return the frame counts `(consumed, produced)`.
    ///
    /// Either window being empty means no work: `(0, 0)` with the carry
    /// state untouched. Partial progress in every other case — the caller
    /// loops, re-deriving the windows from committed positions.
    pub fn convert(
        &mut self,
        src: &SrcWindow<'_>,
        dst: &mut DstWindow<'_>,
        reader: &SampleReader,
        writer: &SampleWriter,
    ) -> (usize, usize) {
        if src.frames == 0 || dst.frames == 0 {
            return (0, 0);
        }
        match self.method {
            Method::Expand => expand::expand(src, dst, reader, writer, self.pitch, &mut self.states),
            Method::Shrink => shrink::shrink(src, dst, reader, writer, self.pitch, &mut self.states),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::codec::SampleFormat;

    fn s16le(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn pitch_rounds_to_nearest() {
        assert_eq!(pitch(48_000, 48_000), PITCH_SCALE);
        assert_eq!(pitch(24_000, 48_000), 2 * PITCH_SCALE);
        // 44100 -> 48000 is 1.08843..., i.e. 71331.70 at scale 65536
        assert_eq!(pitch(44_100, 48_000), 71_332);
        // 48000 -> 44100 is 0.91875, i.e. 60211.2 at scale 65536
        assert_eq!(pitch(48_000, 44_100), 60_211);
    }

    #[test]
    fn method_follows_pitch() {
        assert_eq!(
            RateConverter::new(44_100, 48_000, 2).unwrap().method(),
            Method::Expand
        );
        assert_eq!(
            RateConverter::new(48_000, 44_100, 2).unwrap().method(),
            Method::Shrink
        );
        // equal rates run through Shrink as exact passthrough
        let same = RateConverter::new(48_000, 48_000, 2).unwrap();
        assert_eq!(same.method(), Method::Shrink);
        assert!(same.is_passthrough());
    }

    #[test]
    fn reset_seeds_phase_per_method() {
        let mut up = RateConverter::new(24_000, 48_000, 2).unwrap();
        up.states[0].pos = 7;
        up.states[0].last_sample = 99;
        up.reset();
        for state in &up.states {
            assert_eq!(state.pos, up.pitch + PITCH_SCALE);
            assert_eq!(state.last_sample, 0);
            assert_eq!(state.sum, 0);
        }

        let down = RateConverter::new(48_000, 24_000, 1).unwrap();
        assert_eq!(down.states[0].pos, 0);
    }

    #[test]
    fn empty_windows_do_no_work() {
        let mut conv = RateConverter::new(44_100, 48_000, 1).unwrap();
        let reader = SampleReader::new(SampleFormat::S16Le).unwrap();
        let writer = SampleWriter::new(SampleFormat::S16Le).unwrap();
        let areas = ChannelArea::interleaved(1, 2);
        let src_buf = s16le(&[1, 2, 3]);
        let mut dst_buf = vec![0u8; 8];
        let before = conv.states.clone();

        let src = SrcWindow {
            buf: &src_buf,
            areas: &areas,
            offset: 0,
            frames: 0,
        };
        let mut dst = DstWindow {
            buf: &mut dst_buf,
            areas: &areas,
            offset: 0,
            frames: 4,
        };
        assert_eq!(conv.convert(&src, &mut dst, &reader, &writer), (0, 0));

        let src = SrcWindow {
            buf: &src_buf,
            areas: &areas,
            offset: 0,
            frames: 3,
        };
        let mut dst = DstWindow {
            buf: &mut dst_buf,
            areas: &areas,
            offset: 0,
            frames: 0,
        };
        assert_eq!(conv.convert(&src, &mut dst, &reader, &writer), (0, 0));
        assert_eq!(conv.states, before);
    }

    #[test]
    fn random_windows_never_overrun() {
        use rand::{Rng, SeedableRng};

        let reader = SampleReader::new(SampleFormat::S16Le).unwrap();
        let writer = SampleWriter::new(SampleFormat::S16Le).unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(0x7a7e);

        for _ in 0..300 {
            let src_rate = rng.gen_range(4_000..=192_000);
            let dst_rate = rng.gen_range(4_000..=192_000);
            let channels = rng.gen_range(1..=4usize);
            let src_frames = rng.gen_range(0..48usize);
            let dst_frames = rng.gen_range(0..48usize);

            let mut conv = RateConverter::new(src_rate, dst_rate, channels).unwrap();
            let areas = ChannelArea::interleaved(channels, 2);
            // exact-size buffers: any overrun would index out of bounds
            let src_samples: Vec<i16> =
                (0..src_frames * channels).map(|_| rng.r#gen()).collect();
            let src_buf = s16le(&src_samples);
            let mut dst_buf = vec![0u8; dst_frames * channels * 2];

            let src = SrcWindow {
                buf: &src_buf,
                areas: &areas,
                offset: 0,
                frames: src_frames,
            };
            let mut dst = DstWindow {
                buf: &mut dst_buf,
                areas: &areas,
                offset: 0,
                frames: dst_frames,
            };
            let (consumed, produced) = conv.convert(&src, &mut dst, &reader, &writer);
            assert!(consumed <= src_frames);
            assert!(produced <= dst_frames);
            if src_frames > 0 && dst_frames > 0 {
                assert!(consumed > 0 || produced > 0);
            }
        }
    }

    #[test]
    fn muldiv_down_truncates_toward_zero() {
        assert_eq!(muldiv_down(1000, 44_100, 48_000), 918); // 918.75
        assert_eq!(muldiv_down(0, 44_100, 48_000), 0);
        assert_eq!(muldiv_down(7, PITCH_SCALE, PITCH_SCALE), 7);
    }

    #[test]
    fn muldiv_near_rounds() {
        assert_eq!(muldiv_near(1000, 44_100, 48_000), 919); // 918.75
        assert_eq!(muldiv_near(1000, 48_000, 44_100), 1088); // 1088.43
    }
}
