//! Numeric ranges used during buffer-size negotiation.
//!
//! An [`Interval`] tracks a `[min, max]` range with per-end open flags — the
//! shape constraint values keep while the two rate domains haggle over
//! buffer and period sizes. Scaling with [`Interval::muldiv`] records lost
//! remainders in the open flags so a derived range never claims exactness it
//! does not have.

use crate::common::errors::{RateError, RateResult};

/// Inclusive-by-default numeric range with optionally open endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub min: u32,
    pub max: u32,
    pub open_min: bool,
    pub open_max: bool,
}

impl Interval {
    /// The unconstrained range. `u32::MAX` stands in for "unbounded".
    pub const fn any() -> Self {
        Self {
            min: 0,
            max: u32::MAX,
            open_min: false,
            open_max: false,
        }
    }

    /// A range admitting exactly one value.
    pub const fn exact(value: u32) -> Self {
        Self {
            min: value,
            max: value,
            open_min: false,
            open_max: false,
        }
    }

    /// A closed range.
    pub const fn range(min: u32, max: u32) -> Self {
        Self {
            min,
            max,
            open_min: false,
            open_max: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max || (self.min == self.max && (self.open_min || self.open_max))
    }

    /// The single admissible value, if the range has collapsed to one.
    pub fn value(&self) -> Option<u32> {
        (self.min == self.max && !self.open_min && !self.open_max).then_some(self.min)
    }

    /// Intersect with `other`, tightening both ends. Reports whether this
    /// interval changed; an empty result is an error.
    pub fn refine(&mut self, other: &Interval) -> RateResult<bool> {
        let mut changed = false;
        if self.min < other.min {
            self.min = other.min;
            self.open_min = other.open_min;
            changed = true;
        } else if self.min == other.min && !self.open_min && other.open_min {
            self.open_min = true;
            changed = true;
        }
        if self.max > other.max {
            self.max = other.max;
            self.open_max = other.open_max;
            changed = true;
        } else if self.max == other.max && !self.open_max && other.open_max {
            self.open_max = true;
            changed = true;
        }
        if self.is_empty() {
            return Err(RateError::EmptyConstraint);
        }
        Ok(changed)
    }

    /// Scale by `mul / div`, all three treated as ranges: the result spans
    /// every value `a * b / c` with `a` from `self`, `b` from `mul` and `c`
    /// from `div`. A lost remainder opens the corresponding end.
    pub fn muldiv(&self, mul: &Interval, div: &Interval) -> Interval {
        let (min, min_rem) = muldiv32(self.min, mul.min, div.max);
        let open_min = min_rem || self.open_min || mul.open_min || div.open_max;
        let (max, max_rem) = muldiv32(self.max, mul.max, div.min);
        let (max, open_max) = if max_rem {
            (max.saturating_add(1), true)
        } else {
            (max, self.open_max || mul.open_max || div.open_min)
        };
        Interval {
            min,
            max,
            open_min,
            open_max,
        }
    }

    /// Widen a floored (integer) range to the continuous range that floors
    /// back onto it: `[min, max]` becomes `[min, max + 1)`.
    pub fn unfloor(&mut self) {
        if self.max == u32::MAX || self.open_max {
            return;
        }
        self.max += 1;
        self.open_max = true;
    }

    /// Collapse to the integer range of floors: open ends snap to the
    /// nearest admissible integer.
    pub fn floor(&mut self) {
        self.open_min = false;
        if self.open_max && self.max > 0 {
            self.max -= 1;
        }
        self.open_max = false;
    }
}

/// `a * b / c` through 64-bit, reporting whether a remainder was dropped.
/// Division by zero and overflow both saturate to `u32::MAX` ("unbounded")
/// with no remainder.
fn muldiv32(a: u32, b: u32, c: u32) -> (u32, bool) {
    if c == 0 {
        return (u32::MAX, false);
    }
    let n = u64::from(a) * u64::from(b);
    let q = n / u64::from(c);
    if q >= u64::from(u32::MAX) {
        return (u32::MAX, false);
    }
    (q as u32, n % u64::from(c) != 0)
}
