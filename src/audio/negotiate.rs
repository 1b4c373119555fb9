//! Constraint bridging between the client and slave rate domains.
//!
//! Each side of the conversion carries a [`Constraints`] set. One
//! parameter-resolution pass walks four steps, each pure and idempotent for
//! fixed inputs:
//!
//! | Step             | Direction      | Effect                                |
//! |------------------|----------------|---------------------------------------|
//! | `prepare_client` | client         | linear formats only, clamp the rate   |
//! | `prepare_slave`  | slave          | fresh set pinned to the slave rate    |
//! | `refine_slave`   | client → slave | scale size ranges by the rate ratio   |
//! | `refine_client`  | slave → client | fold the slave's settled answer back  |
//!
//! Size scaling is deliberately asymmetric. Deriving the slave's range from
//! the client's request treats the request as continuous (`unfloor` before
//! scaling) so achievable sizes are not discarded early; folding the slave's
//! answer back applies `floor` after scaling, so the client can never end up
//! believing in more capacity than the slave actually delivers.

use tracing::debug;

use crate::audio::codec::{FormatSet, SampleFormat};
use crate::audio::constants::{RATE_MAX, RATE_MIN};
use crate::audio::interval::Interval;
use crate::common::errors::RateResult;

/// One rate domain's negotiable parameters.
///
/// Only the fields the rate converter itself constrains are modeled; sizes
/// are in frames of the respective domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Constraints {
    pub formats: FormatSet,
    pub rate: Interval,
    pub channels: Interval,
    pub buffer_frames: Interval,
    pub period_frames: Interval,
}

impl Constraints {
    /// A fully unconstrained set.
    pub fn any() -> Self {
        Self {
            formats: FormatSet::all(),
            rate: Interval::any(),
            channels: Interval::any(),
            buffer_frames: Interval::any(),
            period_frames: Interval::any(),
        }
    }
}

/// Bridges client-side constraints to the fixed-rate slave side and back.
#[derive(Debug, Clone, Copy)]
pub struct Negotiator {
    slave_rate: u32,
    slave_format: Option<SampleFormat>,
}

impl Negotiator {
    pub fn new(slave_rate: u32, slave_format: Option<SampleFormat>) -> Self {
        Self {
            slave_rate,
            slave_format,
        }
    }

    /// Restrict the client side to what the converter can feed on: linear
    /// formats at a sane rate. Reports whether anything tightened.
    pub fn prepare_client(&self, client: &mut Constraints) -> RateResult<bool> {
        let mut changed = client.formats.refine(&FormatSet::linear())?;
        changed |= client.rate.refine(&Interval::range(RATE_MIN, RATE_MAX))?;
        Ok(changed)
    }

    /// The initial slave-side constraint set: everything open except the
    /// pinned slave rate, and the intermediate format when one is configured.
    pub fn prepare_slave(&self) -> Constraints {
        let mut slave = Constraints::any();
        slave.rate = Interval::exact(self.slave_rate);
        if let Some(format) = self.slave_format {
            slave.formats = FormatSet::just(format);
        }
        slave
    }

    /// Narrow the slave constraints from the client's request: buffer and
    /// period ranges scale by `slave_rate / client_rate`, channels carry
    /// across unchanged, and the format follows the client only when no
    /// intermediate format is pinned.
    pub fn refine_slave(&self, client: &Constraints, slave: &mut Constraints) -> RateResult<bool> {
        let srate = Interval::exact(self.slave_rate);
        let mut changed = false;

        let mut buffer = client.buffer_frames;
        buffer.unfloor();
        changed |= slave
            .buffer_frames
            .refine(&buffer.muldiv(&srate, &client.rate))?;

        let mut period = client.period_frames;
        period.unfloor();
        changed |= slave
            .period_frames
            .refine(&period.muldiv(&srate, &client.rate))?;

        changed |= slave.channels.refine(&client.channels)?;
        if self.slave_format.is_none() {
            changed |= slave.formats.refine(&client.formats)?;
        }

        debug!(
            "slave constraints refined: buffer {:?}, period {:?}",
            slave.buffer_frames, slave.period_frames
        );
        Ok(changed)
    }

    /// Fold the slave's (typically settled) constraints back into the client
    /// side. Scaled sizes are floored, never rounded up.
    pub fn refine_client(&self, slave: &Constraints, client: &mut Constraints) -> RateResult<bool> {
        let srate = Interval::exact(self.slave_rate);
        let mut changed = false;

        let mut buffer = slave.buffer_frames.muldiv(&client.rate, &srate);
        buffer.floor();
        changed |= client.buffer_frames.refine(&buffer)?;

        let mut period = slave.period_frames.muldiv(&client.rate, &srate);
        period.floor();
        changed |= client.period_frames.refine(&period)?;

        changed |= client.channels.refine(&slave.channels)?;
        if self.slave_format.is_none() {
            changed |= client.formats.refine(&slave.formats)?;
        }

        debug!(
            "client constraints refined: buffer {:?}, period {:?}",
            client.buffer_frames, client.period_frames
        );
        Ok(changed)
    }
}
