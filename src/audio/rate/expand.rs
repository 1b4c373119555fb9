//! Upsampling by streaming linear interpolation.
//!
//! Output-clock driven: every produced frame advances the channel phase by
//! one whole [`PITCH_SCALE`] step, and crossing the `pitch` threshold fetches
//! the next input sample. Between fetches the most recently fetched sample
//! is held, so consumption never outpaces the rate ratio.

use crate::audio::codec::{SampleReader, SampleWriter};
use crate::audio::constants::PITCH_SCALE;

use super::{ChannelState, DstWindow, SrcWindow};

/// Interpolate `src` up into `dst` until the output window is full or the
/// input runs dry. Returns `(consumed, produced)`; both sides may stop
/// short, and the carry in `states` makes the next call resume seamlessly.
pub fn expand(
    src: &SrcWindow<'_>,
    dst: &mut DstWindow<'_>,
    reader: &SampleReader,
    writer: &SampleWriter,
    pitch: u32,
    states: &mut [ChannelState],
) -> (usize, usize) {
    // the phase budget one input sample buys
    let threshold = pitch;
    let mut consumed = 0;
    let mut produced = 0;

    for (channel, state) in states.iter_mut().enumerate() {
        let src_area = &src.areas[channel];
        let dst_area = &dst.areas[channel];
        let mut old_sample = state.last_sample;
        let mut pos = state.pos;
        consumed = 0;
        produced = 0;

        while produced < dst.frames {
            let sample;
            if pos >= threshold {
                if consumed == src.frames {
                    break;
                }
                pos -= threshold;
                let new_sample = reader.read(src.buf, src_area.addr(src.offset + consumed));
                consumed += 1;
                sample = interpolate(old_sample, new_sample, pos);
                old_sample = new_sample;
            } else {
                sample = old_sample;
            }
            writer.write(dst.buf, dst_area.addr(dst.offset + produced), sample);
            produced += 1;
            pos += PITCH_SCALE;
        }

        state.last_sample = old_sample;
        state.pos = pos;
    }

    (consumed, produced)
}

/// Weighted mix of the two input samples straddling the output position.
/// `pos` is the fractional distance past `old`, at most one whole step.
#[inline]
fn interpolate(old: i16, new: i16, pos: u32) -> i16 {
    let scale = PITCH_SCALE as i32;
    let pos = pos as i32;
    ((i32::from(old) * (scale - pos) + i32::from(new) * pos) / scale) as i16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::area::ChannelArea;
    use crate::audio::codec::SampleFormat;

    fn s16le(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    fn samples(buf: &[u8]) -> Vec<i16> {
        buf.chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect()
    }

    fn codecs() -> (SampleReader, SampleWriter) {
        (
            SampleReader::new(SampleFormat::S16Le).unwrap(),
            SampleWriter::new(SampleFormat::S16Le).unwrap(),
        )
    }

    fn fresh_state(pitch: u32) -> ChannelState {
        ChannelState {
            last_sample: 0,
            sum: 0,
            pos: pitch + PITCH_SCALE,
        }
    }

    #[test]
    fn doubling_ratio_walks_half_steps() {
        let pitch = 2 * PITCH_SCALE;
        let (reader, writer) = codecs();
        let areas = ChannelArea::interleaved(1, 2);
        let src_buf = s16le(&[10, 20, 30, 40]);
        let mut dst_buf = vec![0u8; 4 * 2];
        let mut states = [fresh_state(pitch)];

        let src = SrcWindow {
            buf: &src_buf,
            areas: &areas,
            offset: 0,
            frames: 4,
        };
        let mut dst = DstWindow {
            buf: &mut dst_buf,
            areas: &areas,
            offset: 0,
            frames: 4,
        };
        let (consumed, produced) = expand(&src, &mut dst, &reader, &writer, pitch, &mut states);

        assert_eq!((consumed, produced), (3, 4));
        assert_eq!(samples(&dst_buf), vec![10, 10, 20, 20]);
        assert_eq!(states[0].last_sample, 30);
    }

    #[test]
    fn stereo_channels_advance_independently() {
        let pitch = 2 * PITCH_SCALE;
        let (reader, writer) = codecs();
        let areas = ChannelArea::interleaved(2, 2);
        // interleaved L/R: L ramps up, R mirrors negative
        let src_buf = s16le(&[10, -10, 20, -20, 30, -30, 40, -40]);
        let mut dst_buf = vec![0u8; 4 * 2 * 2];
        let mut states = [fresh_state(pitch), fresh_state(pitch)];

        let src = SrcWindow {
            buf: &src_buf,
            areas: &areas,
            offset: 0,
            frames: 4,
        };
        let mut dst = DstWindow {
            buf: &mut dst_buf,
            areas: &areas,
            offset: 0,
            frames: 4,
        };
        let (consumed, produced) = expand(&src, &mut dst, &reader, &writer, pitch, &mut states);

        assert_eq!((consumed, produced), (3, 4));
        assert_eq!(samples(&dst_buf), vec![10, -10, 10, -10, 20, -20, 20, -20]);
    }

    #[test]
    fn holds_last_fetched_sample_between_fetches() {
        let pitch = 2 * PITCH_SCALE;
        let (reader, writer) = codecs();
        let areas = ChannelArea::interleaved(1, 2);
        let src_buf = s16le(&[77]);
        let mut dst_buf = vec![0u8; 2];
        // mid-stream: phase short of the threshold, a sample already held
        let mut states = [ChannelState {
            last_sample: 42,
            sum: 0,
            pos: PITCH_SCALE / 2,
        }];

        let src = SrcWindow {
            buf: &src_buf,
            areas: &areas,
            offset: 0,
            frames: 1,
        };
        let mut dst = DstWindow {
            buf: &mut dst_buf,
            areas: &areas,
            offset: 0,
            frames: 1,
        };
        let (consumed, produced) = expand(&src, &mut dst, &reader, &writer, pitch, &mut states);

        assert_eq!((consumed, produced), (0, 1));
        assert_eq!(samples(&dst_buf), vec![42]);
        assert_eq!(states[0].pos, PITCH_SCALE / 2 + PITCH_SCALE);
    }

    #[test]
    fn stops_when_input_runs_dry() {
        let pitch = 2 * PITCH_SCALE;
        let (reader, writer) = codecs();
        let areas = ChannelArea::interleaved(1, 2);
        let src_buf = s16le(&[50]);
        let mut dst_buf = vec![0u8; 8 * 2];
        let mut states = [fresh_state(pitch)];

        let src = SrcWindow {
            buf: &src_buf,
            areas: &areas,
            offset: 0,
            frames: 1,
        };
        let mut dst = DstWindow {
            buf: &mut dst_buf,
            areas: &areas,
            offset: 0,
            frames: 8,
        };
        let (consumed, produced) = expand(&src, &mut dst, &reader, &writer, pitch, &mut states);

        assert_eq!((consumed, produced), (1, 1));
        assert_eq!(samples(&dst_buf)[0], 50);
        // untouched frames stay zeroed
        assert!(samples(&dst_buf)[1..].iter().all(|&s| s == 0));
        assert!(states[0].pos <= pitch + PITCH_SCALE);
    }

    #[test]
    fn chunk_slicing_is_invisible() {
        let pitch = crate::audio::rate::pitch(44_100, 48_000);
        let input: Vec<i16> = vec![100, -200, 300, -400, 500, -600, 700, -800];
        let (reader, writer) = codecs();
        let areas = ChannelArea::interleaved(1, 2);
        let src_buf = s16le(&input);

        // one shot, output window far larger than needed
        let mut oneshot_buf = vec![0u8; 64 * 2];
        let mut oneshot_state = [fresh_state(pitch)];
        let src = SrcWindow {
            buf: &src_buf,
            areas: &areas,
            offset: 0,
            frames: input.len(),
        };
        let mut dst = DstWindow {
            buf: &mut oneshot_buf,
            areas: &areas,
            offset: 0,
            frames: 64,
        };
        let (_, oneshot_produced) =
            expand(&src, &mut dst, &reader, &writer, pitch, &mut oneshot_state);

        // same stream through 3-frame output windows
        let mut chunked_buf = vec![0u8; 64 * 2];
        let mut chunked_state = [fresh_state(pitch)];
        let mut src_done = 0;
        let mut dst_done = 0;
        loop {
            let src = SrcWindow {
                buf: &src_buf,
                areas: &areas,
                offset: src_done,
                frames: input.len() - src_done,
            };
            let mut dst = DstWindow {
                buf: &mut chunked_buf,
                areas: &areas,
                offset: dst_done,
                frames: 3,
            };
            let (consumed, produced) =
                expand(&src, &mut dst, &reader, &writer, pitch, &mut chunked_state);
            src_done += consumed;
            dst_done += produced;
            if produced == 0 && consumed == 0 {
                break;
            }
        }

        assert_eq!(dst_done, oneshot_produced);
        assert_eq!(
            samples(&chunked_buf[..dst_done * 2]),
            samples(&oneshot_buf[..oneshot_produced * 2])
        );
        assert_eq!(chunked_state, oneshot_state);
    }
}
