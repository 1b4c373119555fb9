//! In-memory slave transport over a bounded frame ring.
//!
//! Stands in for a real device or pipe on the slave side: playback streams
//! convert into the ring and something else drains it, capture streams
//! convert out of frames somebody fed in. The [`Transport`] window always
//! covers one contiguous run, so a wrapped ring simply reports two smaller
//! bursts back to back.

use crate::audio::area::ChannelArea;
use crate::audio::codec::{FormatSet, SampleFormat};
use crate::audio::interval::Interval;
use crate::audio::negotiate::Constraints;
use crate::audio::stream::StreamDirection;
use crate::audio::transfer::{Transport, TransportWindow};
use crate::common::errors::RateResult;

pub struct MemoryTransport {
    buf: Vec<u8>,
    areas: Vec<ChannelArea>,
    direction: StreamDirection,
    format: SampleFormat,
    channels: usize,
    frame_bytes: usize,
    /// Ring capacity in frames.
    capacity: usize,
    /// Read position in frames.
    head: usize,
    /// Frames currently held.
    filled: usize,
}

impl MemoryTransport {
    pub fn new(
        direction: StreamDirection,
        format: SampleFormat,
        channels: usize,
        capacity: usize,
    ) -> Self {
        let capacity = capacity.max(1);
        let frame_bytes = format.width() * channels;
        Self {
            buf: vec![0; capacity * frame_bytes],
            areas: ChannelArea::interleaved(channels, format.width()),
            direction,
            format,
            channels,
            frame_bytes,
            capacity,
            head: 0,
            filled: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Frames currently sitting in the ring.
    pub fn available(&self) -> usize {
        self.filled
    }

    pub fn free(&self) -> usize {
        self.capacity - self.filled
    }

    fn write_head(&self) -> usize {
        (self.head + self.filled) % self.capacity
    }

    /// Push whole frames into the ring, as a capture device would. Returns
    /// the frames actually taken (bounded by free space).
    pub fn feed(&mut self, data: &[u8]) -> usize {
        let frames = (data.len() / self.frame_bytes).min(self.free());
        let write_head = self.write_head();
        let first = frames.min(self.capacity - write_head);
        let at = write_head * self.frame_bytes;
        self.buf[at..at + first * self.frame_bytes]
            .copy_from_slice(&data[..first * self.frame_bytes]);
        let rest = frames - first;
        if rest > 0 {
            self.buf[..rest * self.frame_bytes]
                .copy_from_slice(&data[first * self.frame_bytes..frames * self.frame_bytes]);
        }
        self.filled += frames;
        frames
    }

    /// Pop whole frames out of the ring, as a playback device would. Returns
    /// the frames actually delivered (bounded by fill level).
    pub fn drain(&mut self, out: &mut [u8]) -> usize {
        let frames = (out.len() / self.frame_bytes).min(self.filled);
        let first = frames.min(self.capacity - self.head);
        let at = self.head * self.frame_bytes;
        out[..first * self.frame_bytes].copy_from_slice(&self.buf[at..at + first * self.frame_bytes]);
        let rest = frames - first;
        if rest > 0 {
            out[first * self.frame_bytes..frames * self.frame_bytes]
                .copy_from_slice(&self.buf[..rest * self.frame_bytes]);
        }
        self.head = (self.head + frames) % self.capacity;
        self.filled -= frames;
        frames
    }
}

impl Transport for MemoryTransport {
    fn burst(&self) -> usize {
        match self.direction {
            // playback converts into free space at the write head
            StreamDirection::Playback => self.free().min(self.capacity - self.write_head()),
            // capture converts out of filled space at the read head
            StreamDirection::Capture => self.filled.min(self.capacity - self.head),
        }
    }

    fn window(&mut self) -> TransportWindow<'_> {
        let offset = match self.direction {
            StreamDirection::Playback => self.write_head(),
            StreamDirection::Capture => self.head,
        };
        TransportWindow {
            buf: &mut self.buf,
            areas: &self.areas,
            offset,
        }
    }

    fn commit(&mut self, frames: usize) -> RateResult<()> {
        debug_assert!(frames <= self.burst());
        match self.direction {
            StreamDirection::Playback => self.filled += frames,
            StreamDirection::Capture => {
                self.head = (self.head + frames) % self.capacity;
                self.filled -= frames;
            }
        }
        Ok(())
    }

    fn refine(&self, slave: &mut Constraints) -> RateResult<bool> {
        let mut changed = slave.formats.refine(&FormatSet::just(self.format))?;
        changed |= slave
            .channels
            .refine(&Interval::exact(self.channels as u32))?;
        changed |= slave
            .buffer_frames
            .refine(&Interval::range(1, self.capacity as u32))?;
        Ok(changed)
    }
}
