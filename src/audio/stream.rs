//! The stream facade: one client-facing PCM stream glued to a fixed-rate
//! slave transport.
//!
//! Lifecycle: `open` validates the target side and takes ownership of the
//! transport; `negotiate` runs one constraint-resolution pass; `configure`
//! fixes the client parameters and allocates conversion state; `prepare`
//! rewinds that state; `write_frames` / `read_frames` move audio; `release`
//! drops the configuration again. Everything runs on the caller's thread —
//! serialization across threads is [`StreamPump`](crate::audio::pump)'s job.

use std::fmt;

use tracing::{debug, info};

use crate::audio::area::ChannelArea;
use crate::audio::codec::{SampleFormat, SampleReader, SampleWriter};
use crate::audio::constants::{PITCH_SCALE, RATE_MAX, RATE_MIN};
use crate::audio::negotiate::{Constraints, Negotiator};
use crate::audio::rate::{muldiv_down, muldiv_near, DstWindow, RateConverter, SrcWindow};
use crate::audio::transfer::{transfer_capture, transfer_playback, Transport};
use crate::common::errors::{RateError, RateResult};

/// Which way audio flows through the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamDirection {
    /// Client frames in, slave frames out.
    Playback,
    /// Slave frames in, client frames out.
    Capture,
}

/// The client-side parameters a stream is configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParams {
    pub format: SampleFormat,
    pub rate: u32,
    pub channels: usize,
}

/// Client-domain wakeup/silence thresholds, in frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwParams {
    pub avail_min: usize,
    pub xfer_align: usize,
    pub silence_threshold: usize,
    pub silence_size: usize,
}

/// Everything that only exists while the stream is configured.
struct Setup {
    client: StreamParams,
    converter: RateConverter,
    reader: SampleReader,
    writer: SampleWriter,
    client_areas: Vec<ChannelArea>,
}

/// A rate-converting PCM stream in front of a slave [`Transport`].
pub struct RateStream<T> {
    name: Option<String>,
    direction: StreamDirection,
    target_rate: u32,
    target_format: Option<SampleFormat>,
    transport: T,
    setup: Option<Setup>,
}

impl<T: Transport> RateStream<T> {
    /// Validate the slave-side targets and wrap `transport`. No conversion
    /// state is allocated yet.
    pub fn open(
        name: Option<String>,
        direction: StreamDirection,
        target_rate: u32,
        target_format: Option<SampleFormat>,
        transport: T,
    ) -> RateResult<Self> {
        if let Some(format) = target_format {
            if !format.is_linear() {
                return Err(RateError::NonLinearFormat(format));
            }
        }
        if !(RATE_MIN..=RATE_MAX).contains(&target_rate) {
            return Err(RateError::RateOutOfRange(target_rate));
        }
        info!(
            "opened {} rate stream targeting {target_rate} Hz",
            match direction {
                StreamDirection::Playback => "playback",
                StreamDirection::Capture => "capture",
            }
        );
        Ok(Self {
            name,
            direction,
            target_rate,
            target_format,
            transport,
            setup: None,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn direction(&self) -> StreamDirection {
        self.direction
    }

    pub fn target_rate(&self) -> u32 {
        self.target_rate
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn is_configured(&self) -> bool {
        self.setup.is_some()
    }

    /// The configured client-side parameters, if any.
    pub fn client_params(&self) -> Option<StreamParams> {
        self.setup.as_ref().map(|setup| setup.client)
    }

    /// Run one constraint-resolution pass: clamp the client request, derive
    /// the slave side, let the transport narrow it, fold the result back.
    /// Returns the refined slave constraints.
    pub fn negotiate(&self, request: &mut Constraints) -> RateResult<Constraints> {
        let negotiator = Negotiator::new(self.target_rate, self.target_format);
        negotiator.prepare_client(request)?;
        let mut slave = negotiator.prepare_slave();
        negotiator.refine_slave(request, &mut slave)?;
        self.transport.refine(&mut slave)?;
        negotiator.refine_client(&slave, request)?;
        debug!("negotiated client {request:?} against slave {slave:?}");
        Ok(slave)
    }

    /// Fix the client parameters and allocate per-channel conversion state.
    /// The slave format follows the client's unless a target format pins it.
    pub fn configure(&mut self, params: StreamParams) -> RateResult<()> {
        if !params.format.is_linear() {
            return Err(RateError::NonLinearFormat(params.format));
        }
        if !(RATE_MIN..=RATE_MAX).contains(&params.rate) {
            return Err(RateError::RateOutOfRange(params.rate));
        }
        if params.channels == 0 {
            return Err(RateError::EmptyConstraint);
        }

        let slave_format = self.target_format.unwrap_or(params.format);
        let (src_format, dst_format, src_rate, dst_rate) = match self.direction {
            StreamDirection::Playback => {
                (params.format, slave_format, params.rate, self.target_rate)
            }
            StreamDirection::Capture => {
                (slave_format, params.format, self.target_rate, params.rate)
            }
        };
        let reader = SampleReader::new(src_format)?;
        let writer = SampleWriter::new(dst_format)?;
        let converter = RateConverter::new(src_rate, dst_rate, params.channels)?;
        let client_areas = ChannelArea::interleaved(params.channels, params.format.width());

        self.setup = Some(Setup {
            client: params,
            converter,
            reader,
            writer,
            client_areas,
        });
        debug!(
            "configured {} Hz {} x{} against {slave_format} at {} Hz",
            params.rate, params.format, params.channels, self.target_rate
        );
        Ok(())
    }

    /// Rewind the conversion state to the start-of-stream position.
    pub fn prepare(&mut self) -> RateResult<()> {
        let setup = self.setup.as_mut().ok_or(RateError::NotConfigured)?;
        setup.converter.reset();
        Ok(())
    }

    /// Drop the configuration and its per-channel state. The stream can be
    /// configured again afterwards.
    pub fn release(&mut self) {
        self.setup = None;
    }

    /// Convert `frames` client frames starting at `offset` into the slave
    /// transport. Returns the client frames actually taken; zero means the
    /// slave side has no room right now.
    pub fn write_frames(&mut self, buf: &[u8], offset: usize, frames: usize) -> RateResult<usize> {
        if self.direction != StreamDirection::Playback {
            return Err(RateError::DirectionMismatch);
        }
        let setup = self.setup.as_mut().ok_or(RateError::NotConfigured)?;
        let src = SrcWindow {
            buf,
            areas: &setup.client_areas,
            offset,
            frames,
        };
        transfer_playback(
            &mut self.transport,
            &mut setup.converter,
            &setup.reader,
            &setup.writer,
            &src,
            None,
        )
    }

    /// Convert slave frames into `frames` client frames starting at
    /// `offset`. Returns the client frames actually delivered; zero means
    /// the slave side has nothing right now.
    pub fn read_frames(
        &mut self,
        buf: &mut [u8],
        offset: usize,
        frames: usize,
    ) -> RateResult<usize> {
        if self.direction != StreamDirection::Capture {
            return Err(RateError::DirectionMismatch);
        }
        let setup = self.setup.as_mut().ok_or(RateError::NotConfigured)?;
        let mut dst = DstWindow {
            buf,
            areas: &setup.client_areas,
            offset,
            frames,
        };
        transfer_capture(
            &mut self.transport,
            &mut setup.converter,
            &setup.reader,
            &setup.writer,
            &mut dst,
            None,
        )
    }

    /// How many slave frames `frames` client frames correspond to,
    /// truncating toward zero.
    pub fn to_slave_frames(&self, frames: usize) -> RateResult<usize> {
        let setup = self.setup.as_ref().ok_or(RateError::NotConfigured)?;
        let pitch = setup.converter.pitch();
        Ok(match self.direction {
            StreamDirection::Playback => muldiv_down(frames, pitch, PITCH_SCALE),
            StreamDirection::Capture => muldiv_down(frames, PITCH_SCALE, pitch),
        })
    }

    /// How many client frames `frames` slave frames correspond to,
    /// truncating toward zero.
    pub fn to_client_frames(&self, frames: usize) -> RateResult<usize> {
        let setup = self.setup.as_ref().ok_or(RateError::NotConfigured)?;
        let pitch = setup.converter.pitch();
        Ok(match self.direction {
            StreamDirection::Playback => muldiv_down(frames, PITCH_SCALE, pitch),
            StreamDirection::Capture => muldiv_down(frames, pitch, PITCH_SCALE),
        })
    }

    /// Scale client-domain software parameters to the slave domain,
    /// rounding to the nearest frame.
    pub fn scale_sw_params(&self, params: &SwParams) -> RateResult<SwParams> {
        let setup = self.setup.as_ref().ok_or(RateError::NotConfigured)?;
        let client_rate = setup.client.rate;
        let scale = |frames| muldiv_near(frames, self.target_rate, client_rate);
        Ok(SwParams {
            avail_min: scale(params.avail_min),
            xfer_align: scale(params.xfer_align),
            silence_threshold: scale(params.silence_threshold),
            silence_size: scale(params.silence_size),
        })
    }
}

impl<T> fmt::Display for RateStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "{name}: ")?;
        }
        write!(f, "rate conversion to {} Hz", self.target_rate)?;
        if let Some(format) = self.target_format {
            write!(f, " (sformat {format})")?;
        }
        match &self.setup {
            Some(setup) => write!(
                f,
                ", client {} Hz {} x{}",
                setup.client.rate, setup.client.format, setup.client.channels
            ),
            None => write!(f, ", unconfigured"),
        }
    }
}
