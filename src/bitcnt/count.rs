use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Number of set and clear bits in some span of bytes.
///
/// `ones + zeroes` is always the number of bits that produced the count.
/// Merging (`+`) is the only way to combine counts; it is associative and
/// commutative, so partial counts can be folded in any order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Count {
    pub ones: u64,
    pub zeroes: u64,
}

impl Count {
    /// Count for `bytes` bytes of which `ones` bits are set.
    #[inline]
    pub const fn from_ones(ones: u64, bytes: u64) -> Count {
        Count {
            ones,
            zeroes: bytes * 8 - ones,
        }
    }

    #[inline]
    pub const fn merge(self, other: Count) -> Count {
        Count {
            ones: self.ones + other.ones,
            zeroes: self.zeroes + other.zeroes,
        }
    }

    /// Total number of bits counted.
    #[inline]
    pub const fn bits(&self) -> u64 {
        self.ones + self.zeroes
    }

    /// Total number of bytes counted.
    #[inline]
    pub const fn bytes(&self) -> u64 {
        self.bits() / 8
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.bits() == 0
    }

    /// Share of set bits in `[0, 1]`; 0.0 for an empty count.
    pub fn fraction_ones(&self) -> f64 {
        fraction(self.ones, self.bits())
    }

    /// Share of clear bits in `[0, 1]`; 0.0 for an empty count.
    pub fn fraction_zeroes(&self) -> f64 {
        fraction(self.zeroes, self.bits())
    }
}

#[inline]
fn fraction(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

impl Add for Count {
    type Output = Count;

    #[inline]
    fn add(self, rhs: Count) -> Count {
        self.merge(rhs)
    }
}

impl AddAssign for Count {
    #[inline]
    fn add_assign(&mut self, rhs: Count) {
        *self = self.merge(rhs);
    }
}

impl Sum for Count {
    fn sum<I: Iterator<Item = Count>>(iter: I) -> Count {
        iter.fold(Count::default(), Count::merge)
    }
}

impl<'a> Sum<&'a Count> for Count {
    fn sum<I: Iterator<Item = &'a Count>>(iter: I) -> Count {
        iter.copied().sum()
    }
}
