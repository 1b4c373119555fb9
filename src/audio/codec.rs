//! Sample formats and the wire ↔ engine sample codec.
//!
//! The converter always resamples in a signed 16-bit intermediate domain.
//! This module names the wire formats a stream side can carry, the bitmask
//! used while negotiating the client format, and the [`SampleReader`] /
//! [`SampleWriter`] pair that moves single samples between a wire buffer and
//! the i16 engine domain.

use std::fmt;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use crate::common::errors::{RateError, RateResult};

/// Wire sample format of one stream side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    S8,
    U8,
    S16Le,
    S16Be,
    U16Le,
    U16Be,
    S32Le,
    S32Be,
    U32Le,
    U32Be,
    /// IEEE float — carried through negotiation only to be rejected.
    FloatLe,
    FloatBe,
    /// Companded telephony format, not linear.
    MuLaw,
    ALaw,
}

impl SampleFormat {
    pub const ALL: [SampleFormat; 14] = [
        Self::S8,
        Self::U8,
        Self::S16Le,
        Self::S16Be,
        Self::U16Le,
        Self::U16Be,
        Self::S32Le,
        Self::S32Be,
        Self::U32Le,
        Self::U32Be,
        Self::FloatLe,
        Self::FloatBe,
        Self::MuLaw,
        Self::ALaw,
    ];

    /// Bytes one sample occupies on the wire.
    pub fn width(self) -> usize {
        match self {
            Self::S8 | Self::U8 | Self::MuLaw | Self::ALaw => 1,
            Self::S16Le | Self::S16Be | Self::U16Le | Self::U16Be => 2,
            Self::S32Le | Self::S32Be | Self::U32Le | Self::U32Be => 4,
            Self::FloatLe | Self::FloatBe => 4,
        }
    }

    /// Whether this is integer ("linear") PCM, the only family the
    /// converter can interpolate.
    pub fn is_linear(self) -> bool {
        !matches!(self, Self::FloatLe | Self::FloatBe | Self::MuLaw | Self::ALaw)
    }

    /// Canonical lowercase name, e.g. `"s16le"`.
    pub fn name(self) -> &'static str {
        match self {
            Self::S8 => "s8",
            Self::U8 => "u8",
            Self::S16Le => "s16le",
            Self::S16Be => "s16be",
            Self::U16Le => "u16le",
            Self::U16Be => "u16be",
            Self::S32Le => "s32le",
            Self::S32Be => "s32be",
            Self::U32Le => "u32le",
            Self::U32Be => "u32be",
            Self::FloatLe => "f32le",
            Self::FloatBe => "f32be",
            Self::MuLaw => "mulaw",
            Self::ALaw => "alaw",
        }
    }

    /// Parse a canonical name, case-insensitively.
    pub fn from_name(name: &str) -> Option<SampleFormat> {
        let lower = name.to_ascii_lowercase();
        Self::ALL.into_iter().find(|f| f.name() == lower)
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Format set ───────────────────────────────────────────────────────────────

/// Bitmask over [`SampleFormat`], carried through format negotiation.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct FormatSet(u16);

impl FormatSet {
    const fn bit(format: SampleFormat) -> u16 {
        1 << (format as u16)
    }

    /// Every known format.
    pub fn all() -> Self {
        let mut mask = 0;
        for f in SampleFormat::ALL {
            mask |= Self::bit(f);
        }
        Self(mask)
    }

    /// The linear PCM formats only.
    pub fn linear() -> Self {
        let mut mask = 0;
        for f in SampleFormat::ALL {
            if f.is_linear() {
                mask |= Self::bit(f);
            }
        }
        Self(mask)
    }

    /// A set holding exactly `format`.
    pub fn just(format: SampleFormat) -> Self {
        Self(Self::bit(format))
    }

    pub fn contains(&self, format: SampleFormat) -> bool {
        self.0 & Self::bit(format) != 0
    }

    /// The single member, if the set has narrowed down to one.
    pub fn value(&self) -> Option<SampleFormat> {
        if self.0.count_ones() != 1 {
            return None;
        }
        self.iter().next()
    }

    pub fn iter(&self) -> impl Iterator<Item = SampleFormat> + '_ {
        SampleFormat::ALL.into_iter().filter(|f| self.contains(*f))
    }

    /// Intersect with `other`. Returns whether the set changed, or an error
    /// if nothing is left.
    pub fn refine(&mut self, other: &FormatSet) -> RateResult<bool> {
        let before = self.0;
        self.0 &= other.0;
        if self.0 == 0 {
            return Err(RateError::EmptyConstraint);
        }
        Ok(self.0 != before)
    }
}

impl fmt::Debug for FormatSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(SampleFormat::name)).finish()
    }
}

// ── Wire codec ───────────────────────────────────────────────────────────────

/// Decodes wire samples of one fixed linear format into engine i16 samples.
///
/// Wider formats keep their top 16 bits, narrower ones are shifted up, and
/// unsigned formats have their sign bit flipped — so full scale maps to full
/// scale in every case.
#[derive(Debug, Clone, Copy)]
pub struct SampleReader {
    format: SampleFormat,
}

impl SampleReader {
    pub fn new(format: SampleFormat) -> RateResult<Self> {
        if !format.is_linear() {
            return Err(RateError::NonLinearFormat(format));
        }
        Ok(Self { format })
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// Read the sample starting at byte `at` of `buf`.
    #[inline]
    pub fn read(&self, buf: &[u8], at: usize) -> i16 {
        match self.format {
            SampleFormat::S8 => (buf[at] as i8 as i16) << 8,
            SampleFormat::U8 => (((buf[at] ^ 0x80) as i8) as i16) << 8,
            SampleFormat::S16Le => LittleEndian::read_i16(&buf[at..]),
            SampleFormat::S16Be => BigEndian::read_i16(&buf[at..]),
            SampleFormat::U16Le => (LittleEndian::read_u16(&buf[at..]) ^ 0x8000) as i16,
            SampleFormat::U16Be => (BigEndian::read_u16(&buf[at..]) ^ 0x8000) as i16,
            SampleFormat::S32Le => (LittleEndian::read_i32(&buf[at..]) >> 16) as i16,
            SampleFormat::S32Be => (BigEndian::read_i32(&buf[at..]) >> 16) as i16,
            SampleFormat::U32Le => {
                (((LittleEndian::read_u32(&buf[at..]) ^ 0x8000_0000) as i32) >> 16) as i16
            }
            SampleFormat::U32Be => {
                (((BigEndian::read_u32(&buf[at..]) ^ 0x8000_0000) as i32) >> 16) as i16
            }
            // new() admits linear formats only
            _ => unreachable!(),
        }
    }
}

/// Encodes engine i16 samples into wire samples of one fixed linear format.
#[derive(Debug, Clone, Copy)]
pub struct SampleWriter {
    format: SampleFormat,
}

impl SampleWriter {
    pub fn new(format: SampleFormat) -> RateResult<Self> {
        if !format.is_linear() {
            return Err(RateError::NonLinearFormat(format));
        }
        Ok(Self { format })
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    /// Write `value` as a wire sample starting at byte `at` of `buf`.
    #[inline]
    pub fn write(&self, buf: &mut [u8], at: usize, value: i16) {
        match self.format {
            SampleFormat::S8 => buf[at] = (value >> 8) as u8,
            SampleFormat::U8 => buf[at] = ((value >> 8) as u8) ^ 0x80,
            SampleFormat::S16Le => LittleEndian::write_i16(&mut buf[at..], value),
            SampleFormat::S16Be => BigEndian::write_i16(&mut buf[at..], value),
            SampleFormat::U16Le => {
                LittleEndian::write_u16(&mut buf[at..], (value as u16) ^ 0x8000)
            }
            SampleFormat::U16Be => BigEndian::write_u16(&mut buf[at..], (value as u16) ^ 0x8000),
            SampleFormat::S32Le => LittleEndian::write_i32(&mut buf[at..], (value as i32) << 16),
            SampleFormat::S32Be => BigEndian::write_i32(&mut buf[at..], (value as i32) << 16),
            SampleFormat::U32Le => LittleEndian::write_u32(
                &mut buf[at..],
                (((value as i32) << 16) as u32) ^ 0x8000_0000,
            ),
            SampleFormat::U32Be => BigEndian::write_u32(
                &mut buf[at..],
                (((value as i32) << 16) as u32) ^ 0x8000_0000,
            ),
            // new() admits linear formats only
            _ => unreachable!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s16le_byte_order() {
        let writer = SampleWriter::new(SampleFormat::S16Le).unwrap();
        let mut buf = [0u8; 2];
        writer.write(&mut buf, 0, 0x1234);
        assert_eq!(buf, [0x34, 0x12]);

        let reader = SampleReader::new(SampleFormat::S16Le).unwrap();
        assert_eq!(reader.read(&buf, 0), 0x1234);
    }

    #[test]
    fn u8_bias_maps_midpoint_to_zero() {
        let reader = SampleReader::new(SampleFormat::U8).unwrap();
        assert_eq!(reader.read(&[0x80], 0), 0);
        assert_eq!(reader.read(&[0x00], 0), i16::MIN);

        let writer = SampleWriter::new(SampleFormat::U8).unwrap();
        let mut buf = [0u8; 1];
        writer.write(&mut buf, 0, 0);
        assert_eq!(buf[0], 0x80);
    }

    #[test]
    fn s32_keeps_high_sixteen_bits() {
        let reader = SampleReader::new(SampleFormat::S32Le).unwrap();
        let mut buf = [0u8; 4];
        LittleEndian::write_i32(&mut buf, 0x1234_5678);
        assert_eq!(reader.read(&buf, 0), 0x1234);
    }

    #[test]
    fn u32_roundtrips_negative_values() {
        let writer = SampleWriter::new(SampleFormat::U32Be).unwrap();
        let reader = SampleReader::new(SampleFormat::U32Be).unwrap();
        let mut buf = [0u8; 4];
        writer.write(&mut buf, 0, -20_000);
        assert_eq!(reader.read(&buf, 0), -20_000);
    }

    #[test]
    fn reader_rejects_non_linear() {
        assert!(matches!(
            SampleReader::new(SampleFormat::FloatLe),
            Err(RateError::NonLinearFormat(SampleFormat::FloatLe))
        ));
        assert!(matches!(
            SampleWriter::new(SampleFormat::MuLaw),
            Err(RateError::NonLinearFormat(SampleFormat::MuLaw))
        ));
    }

    #[test]
    fn names_parse_back() {
        for f in [SampleFormat::S16Le, SampleFormat::U32Be, SampleFormat::ALaw] {
            assert_eq!(SampleFormat::from_name(f.name()), Some(f));
        }
        assert_eq!(SampleFormat::from_name("S16LE"), Some(SampleFormat::S16Le));
        assert_eq!(SampleFormat::from_name("dsd64"), None);
    }

    #[test]
    fn linear_set_excludes_float_and_companded() {
        let linear = FormatSet::linear();
        assert!(linear.contains(SampleFormat::S16Le));
        assert!(linear.contains(SampleFormat::U32Be));
        assert!(!linear.contains(SampleFormat::FloatLe));
        assert!(!linear.contains(SampleFormat::ALaw));
    }

    #[test]
    fn refine_narrows_and_reports_change() {
        let mut set = FormatSet::all();
        let changed = set.refine(&FormatSet::linear()).unwrap();
        assert!(changed);
        let changed = set.refine(&FormatSet::linear()).unwrap();
        assert!(!changed);
        assert_eq!(set, FormatSet::linear());
    }

    #[test]
    fn refine_to_empty_is_an_error() {
        let mut set = FormatSet::just(SampleFormat::S16Le);
        let err = set.refine(&FormatSet::just(SampleFormat::S32Be));
        assert!(matches!(err, Err(RateError::EmptyConstraint)));
    }

    #[test]
    fn single_member_value() {
        assert_eq!(
            FormatSet::just(SampleFormat::U16Be).value(),
            Some(SampleFormat::U16Be)
        );
        assert_eq!(FormatSet::linear().value(), None);
    }
}
