//! Chunked transfer loop between a client buffer and a slave transport.
//!
//! The slave side hands out bounded contiguous windows; the driver repeatedly
//! converts one window's worth, commits the advance, and goes back for more
//! until either side runs out. The engine itself never blocks — a transport
//! reporting a zero burst ends the call with whatever was transferred so far.

use tracing::{trace, warn};

use crate::audio::area::ChannelArea;
use crate::audio::codec::{SampleReader, SampleWriter};
use crate::audio::negotiate::Constraints;
use crate::audio::rate::{DstWindow, RateConverter, SrcWindow};
use crate::common::errors::RateResult;

/// Borrowed view of the transport's live buffer region.
pub struct TransportWindow<'a> {
    pub buf: &'a mut [u8],
    pub areas: &'a [ChannelArea],
    /// Frame offset of the current position inside `buf`.
    pub offset: usize,
}

/// The slave side of a rate-converted stream.
///
/// Implementations own position accounting and any blocking or backpressure
/// policy; the transfer loop only ever asks three things of them.
pub trait Transport {
    /// Largest contiguous run of frames usable right now. Zero means "no
    /// progress currently possible", not an error.
    fn burst(&self) -> usize;

    /// Borrow the buffer region starting at the current position. Valid for
    /// at least [`Transport::burst`] frames.
    fn window(&mut self) -> TransportWindow<'_>;

    /// Advance the position by `frames` frames just converted.
    fn commit(&mut self, frames: usize) -> RateResult<()>;

    /// Fold transport-specific limits into the slave-side constraints during
    /// negotiation.
    fn refine(&self, _slave: &mut Constraints) -> RateResult<bool> {
        Ok(false)
    }
}

/// Convert client frames into the transport. Returns total client frames
/// consumed; a transport error after partial progress keeps the progress,
/// an immediate one propagates.
pub fn transfer_playback(
    transport: &mut dyn Transport,
    converter: &mut RateConverter,
    reader: &SampleReader,
    writer: &SampleWriter,
    client: &SrcWindow<'_>,
    slave_limit: Option<usize>,
) -> RateResult<usize> {
    let slave_limit = slave_limit.unwrap_or(usize::MAX);
    let mut client_done = 0;
    let mut slave_done = 0;
    let mut failure = None;

    while client_done < client.frames && slave_done < slave_limit {
        let avail = transport.burst();
        if avail == 0 {
            break;
        }
        let chunk = avail.min(slave_limit - slave_done);

        let src = SrcWindow {
            buf: client.buf,
            areas: client.areas,
            offset: client.offset + client_done,
            frames: client.frames - client_done,
        };
        let (consumed, produced) = {
            let window = transport.window();
            let mut dst = DstWindow {
                buf: window.buf,
                areas: window.areas,
                offset: window.offset,
                frames: chunk,
            };
            converter.convert(&src, &mut dst, reader, writer)
        };
        assert!(
            consumed > 0 || produced > 0,
            "rate conversion stalled with space on both sides"
        );
        trace!("playback chunk: {consumed} client frames -> {produced} slave frames");

        if let Err(err) = transport.commit(produced) {
            failure = Some(err);
            break;
        }
        client_done += consumed;
        slave_done += produced;
    }

    match failure {
        Some(err) if client_done == 0 => Err(err),
        Some(err) => {
            warn!("transport failed after {client_done} frames: {err}");
            Ok(client_done)
        }
        None => Ok(client_done),
    }
}

/// Convert frames out of the transport into the client buffer. Returns total
/// client frames produced, with the same partial-progress error policy as
/// [`transfer_playback`].
pub fn transfer_capture(
    transport: &mut dyn Transport,
    converter: &mut RateConverter,
    reader: &SampleReader,
    writer: &SampleWriter,
    client: &mut DstWindow<'_>,
    slave_limit: Option<usize>,
) -> RateResult<usize> {
    let slave_limit = slave_limit.unwrap_or(usize::MAX);
    let mut client_done = 0;
    let mut slave_done = 0;
    let mut failure = None;

    while client_done < client.frames && slave_done < slave_limit {
        let avail = transport.burst();
        if avail == 0 {
            break;
        }
        let chunk = avail.min(slave_limit - slave_done);

        let (consumed, produced) = {
            let window = transport.window();
            let src = SrcWindow {
                buf: window.buf,
                areas: window.areas,
                offset: window.offset,
                frames: chunk,
            };
            let mut dst = DstWindow {
                buf: &mut *client.buf,
                areas: client.areas,
                offset: client.offset + client_done,
                frames: client.frames - client_done,
            };
            converter.convert(&src, &mut dst, reader, writer)
        };
        assert!(
            consumed > 0 || produced > 0,
            "rate conversion stalled with space on both sides"
        );
        trace!("capture chunk: {consumed} slave frames -> {produced} client frames");

        // the slave position moves by what was consumed from it, and it moves
        // before the client counts the frames as delivered
        if let Err(err) = transport.commit(consumed) {
            failure = Some(err);
            break;
        }
        slave_done += consumed;
        client_done += produced;
    }

    match failure {
        Some(err) if client_done == 0 => Err(err),
        Some(err) => {
            warn!("transport failed after {client_done} frames: {err}");
            Ok(client_done)
        }
        None => Ok(client_done),
    }
}
