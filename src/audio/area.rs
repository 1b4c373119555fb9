//! Channel addressing into multi-channel PCM byte buffers.
//!
//! A [`ChannelArea`] pins down where one channel's samples live inside a
//! shared buffer (start offset plus per-frame stride), so the converter can
//! walk interleaved and planar layouts with the same code.

/// Location of one channel's samples within a byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelArea {
    /// Byte offset of the channel's sample in frame 0.
    pub first: usize,
    /// Bytes between consecutive frames of this channel.
    pub step: usize,
}

impl ChannelArea {
    /// Byte offset of this channel's sample in `frame`.
    #[inline]
    pub fn addr(&self, frame: usize) -> usize {
        self.first + frame * self.step
    }

    /// Areas for the standard interleaved layout: every frame stores all
    /// channels back to back, `sample_bytes` wide each.
    pub fn interleaved(channels: usize, sample_bytes: usize) -> Vec<ChannelArea> {
        (0..channels)
            .map(|ch| ChannelArea {
                first: ch * sample_bytes,
                step: channels * sample_bytes,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_stereo_s16() {
        let areas = ChannelArea::interleaved(2, 2);
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0], ChannelArea { first: 0, step: 4 });
        assert_eq!(areas[1], ChannelArea { first: 2, step: 4 });
    }

    #[test]
    fn addr_walks_frames() {
        let area = ChannelArea { first: 2, step: 4 };
        assert_eq!(area.addr(0), 2);
        assert_eq!(area.addr(1), 6);
        assert_eq!(area.addr(10), 42);
    }

    #[test]
    fn interleaved_mono_is_contiguous() {
        let areas = ChannelArea::interleaved(1, 2);
        assert_eq!(areas[0], ChannelArea { first: 0, step: 2 });
    }
}
