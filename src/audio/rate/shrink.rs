//! Downsampling by streaming box-filter averaging.
//!
//! Input-clock driven: every consumed sample adds `pitch` worth of weight to
//! the channel accumulator, and crossing a whole [`PITCH_SCALE`] boundary
//! emits the normalized average. A boundary-straddling sample is split
//! exactly, so no input weight is ever dropped or counted twice. At a pitch
//! of exactly [`PITCH_SCALE`] every sample lands on a boundary alone and the
//! filter degenerates to passthrough.

use crate::audio::codec::{SampleReader, SampleWriter};
use crate::audio::constants::PITCH_SCALE;

use super::{ChannelState, DstWindow, SrcWindow};

/// Average `src` down into `dst` until the input window is drained or the
/// output window is full. Returns `(consumed, produced)`; the carry in
/// `states` makes the next call resume seamlessly.
pub fn shrink(
    src: &SrcWindow<'_>,
    dst: &mut DstWindow<'_>,
    reader: &SampleReader,
    writer: &SampleWriter,
    pitch: u32,
    states: &mut [ChannelState],
) -> (usize, usize) {
    let mut consumed = 0;
    let mut produced = 0;

    for (channel, state) in states.iter_mut().enumerate() {
        let src_area = &src.areas[channel];
        let dst_area = &dst.areas[channel];
        let mut sum = state.sum;
        let mut pos = state.pos;
        consumed = 0;
        produced = 0;

        while consumed < src.frames {
            let sample = i32::from(reader.read(src.buf, src_area.addr(src.offset + consumed)));
            consumed += 1;
            pos += pitch;
            if pos >= PITCH_SCALE {
                pos -= PITCH_SCALE;
                // split the straddling sample: the part before the boundary
                // closes this output, the part after seeds the next
                sum += sample * (pitch - pos) as i32;
                let value = (sum / PITCH_SCALE as i32) as i16;
                writer.write(dst.buf, dst_area.addr(dst.offset + produced), value);
                produced += 1;
                sum = sample * pos as i32;
                if produced == dst.frames {
                    break;
                }
            } else {
                sum += sample * pitch as i32;
            }
        }

        state.sum = sum;
        state.pos = pos;
    }

    (consumed, produced)
}
