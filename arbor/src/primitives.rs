//! Arbitraries for primitive values: constants, integers, doubles, chars.

use std::fmt;

use num_traits::PrimInt;

use crate::arbitrary::{Arbitrary, GenContext, ValueStream};
use crate::rng::Rand;
use crate::size::biased_integer_slice;
use crate::transform::MappedArbitrary;
use crate::value::{IntegerContext, ShrinkContext, Value};

/// The point of `[min, max]` closest to zero; every bounded shrink descends
/// toward it
pub(crate) fn shrink_target<T: PrimInt>(min: T, max: T) -> T {
    let zero = T::zero();
    if min <= zero && zero <= max {
        zero
    } else if min > zero {
        min
    } else {
        max
    }
}

/// Binary descent from `target` toward `value`, biggest jump first.
///
/// Yields `target` (unless `skip_target`), then midpoints that approach
/// `value` without ever reaching it. Finite: the remaining gap halves at
/// every step.
pub(crate) fn shrink_integer_toward<T: PrimInt>(value: T, target: T, skip_target: bool) -> Vec<T> {
    if value == target {
        return Vec::new();
    }
    let mut out = Vec::new();
    if !skip_target {
        out.push(target);
    }
    let two = T::one() + T::one();
    let mut prev = target;
    loop {
        let step = (value - prev) / two;
        if step == T::zero() {
            break;
        }
        let next = prev + step;
        if next == value {
            break;
        }
        out.push(next);
        prev = next;
    }
    out
}

/// An arbitrary that always produces the same value
#[derive(Debug, Clone)]
pub struct ConstantArbitrary<T> {
    value: T,
}

impl<T: Clone + PartialEq + 'static> Arbitrary for ConstantArbitrary<T> {
    type Item = T;

    fn generate(&self, _rng: &mut Rand, _ctx: &mut GenContext) -> Value<T> {
        Value::new(self.value.clone(), ShrinkContext::None)
    }

    fn shrink(&self, _value: &T, _ctx: &ShrinkContext) -> ValueStream<T> {
        // A constant value cannot be shrunk
        Box::new(std::iter::empty())
    }

    fn can_generate_without_context(&self, value: &T) -> bool {
        *value == self.value
    }
}

/// Create an arbitrary that always produces the same value
pub fn constant<T: Clone + PartialEq + 'static>(value: T) -> ConstantArbitrary<T> {
    ConstantArbitrary { value }
}

/// Arbitrary for integers in an inclusive range
#[derive(Debug, Clone, Copy)]
pub struct IntegerArbitrary<T> {
    min: T,
    max: T,
}

impl<T: PrimInt + fmt::Display> IntegerArbitrary<T> {
    /// Create an arbitrary for integers in `[min, max]`
    pub fn new(min: T, max: T) -> Self {
        assert!(
            min <= max,
            "invalid integer range: min {} exceeds max {}",
            min,
            max
        );
        Self { min, max }
    }

    /// Create an arbitrary covering the whole type
    pub fn full_range() -> Self {
        Self::new(T::min_value(), T::max_value())
    }
}

macro_rules! impl_integer_arbitrary {
    ($($t:ty),* $(,)?) => {
        $(
            impl Arbitrary for IntegerArbitrary<$t> {
                type Item = $t;

                fn generate(&self, rng: &mut Rand, ctx: &mut GenContext) -> Value<$t> {
                    let (mut lo, mut hi) = (self.min as i128, self.max as i128);
                    if let Some(factor) = ctx.bias() {
                        let factor = factor.max(1).min(i64::MAX as u64) as i64;
                        if rng.next_int(1, factor) == 1 {
                            (lo, hi) = biased_integer_slice(rng, lo, hi);
                        }
                    }
                    let drawn = rng.next_big_int(lo, hi) as $t;
                    Value::new(drawn, ShrinkContext::Integer(IntegerContext::default()))
                }

                fn shrink(&self, value: &$t, ctx: &ShrinkContext) -> ValueStream<$t> {
                    let skip_target =
                        matches!(ctx, ShrinkContext::Integer(c) if c.shrunk_once);
                    let target = shrink_target(self.min, self.max);
                    let candidates = shrink_integer_toward(*value, target, skip_target);
                    Box::new(candidates.into_iter().map(|v| {
                        Value::new(
                            v,
                            ShrinkContext::Integer(IntegerContext { shrunk_once: true }),
                        )
                    }))
                }

                fn can_generate_without_context(&self, value: &$t) -> bool {
                    self.min <= *value && *value <= self.max
                }
            }
        )*
    };
}

impl_integer_arbitrary!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize);

/// Create an arbitrary for integers in `[min, max]`
pub fn integer<T: PrimInt + fmt::Display>(min: T, max: T) -> IntegerArbitrary<T> {
    IntegerArbitrary::new(min, max)
}

/// Create an arbitrary for wide integers in `[min, max]`
pub fn big_integer(min: i128, max: i128) -> IntegerArbitrary<i128> {
    IntegerArbitrary::new(min, max)
}

/// Create the boolean arbitrary, mapped from an underlying `[0, 1]` integer
pub fn boolean() -> MappedArbitrary<i64, bool> {
    integer(0i64, 1).map(|n| *n != 0, |b| Ok(i64::from(*b)))
}

/// Arbitrary for finite doubles in an inclusive range
#[derive(Debug, Clone, Copy)]
pub struct DoubleArbitrary {
    min: f64,
    max: f64,
}

impl DoubleArbitrary {
    /// Create an arbitrary for finite doubles in `[min, max]`
    pub fn new(min: f64, max: f64) -> Self {
        assert!(
            min.is_finite() && max.is_finite(),
            "invalid double range: bounds must be finite (got {} and {})",
            min,
            max
        );
        assert!(
            min <= max,
            "invalid double range: min {} exceeds max {}",
            min,
            max
        );
        assert!(
            (max - min).is_finite(),
            "invalid double range: the span from {} to {} overflows",
            min,
            max
        );
        Self { min, max }
    }

    fn in_range(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

impl Arbitrary for DoubleArbitrary {
    type Item = f64;

    fn generate(&self, rng: &mut Rand, ctx: &mut GenContext) -> Value<f64> {
        if let Some(factor) = ctx.bias() {
            let factor = factor.max(1).min(i64::MAX as u64) as i64;
            if rng.next_int(1, factor) == 1 {
                let mut edges = vec![self.min, self.max];
                if self.in_range(0.0) {
                    edges.push(0.0);
                }
                let index = rng.next_int(0, edges.len() as i64 - 1) as usize;
                return Value::new(edges[index], ShrinkContext::None);
            }
        }
        let drawn = (self.min + rng.next_double() * (self.max - self.min)).min(self.max);
        Value::new(drawn, ShrinkContext::None)
    }

    fn shrink(&self, value: &f64, _ctx: &ShrinkContext) -> ValueStream<f64> {
        let value = *value;
        let mut candidates = Vec::new();

        if value != 0.0 && self.in_range(0.0) {
            candidates.push(0.0);
        }

        let truncated = value.trunc();
        if truncated != value && self.in_range(truncated) {
            candidates.push(truncated);
        }

        let half = value / 2.0;
        if half != value && self.in_range(half) && !candidates.contains(&half) {
            candidates.push(half);
        }

        Box::new(
            candidates
                .into_iter()
                .map(|v| Value::new(v, ShrinkContext::None)),
        )
    }

    fn can_generate_without_context(&self, value: &f64) -> bool {
        value.is_finite() && self.in_range(*value)
    }
}

/// Create an arbitrary for finite doubles in `[min, max]`
pub fn double(min: f64, max: f64) -> DoubleArbitrary {
    DoubleArbitrary::new(min, max)
}

/// Arbitrary for characters drawn from a set of inclusive ranges
#[derive(Debug, Clone)]
pub struct CharArbitrary {
    ranges: Vec<(char, char)>,
}

impl CharArbitrary {
    /// Create a character arbitrary from inclusive code point ranges
    pub fn new(ranges: Vec<(char, char)>) -> Self {
        assert!(
            !ranges.is_empty(),
            "character arbitrary needs at least one range"
        );
        for (start, end) in &ranges {
            assert!(
                start <= end,
                "invalid character range: '{}' exceeds '{}'",
                start,
                end
            );
            assert!(
                (*start as u32) >= 0xE000 || (*end as u32) < 0xD800,
                "character range '{}'..'{}' spans the surrogate gap",
                start,
                end
            );
        }
        Self { ranges }
    }

    fn containing_range(&self, c: char) -> Option<(char, char)> {
        self.ranges
            .iter()
            .copied()
            .find(|(start, end)| (*start..=*end).contains(&c))
    }
}

impl Arbitrary for CharArbitrary {
    type Item = char;

    fn generate(&self, rng: &mut Rand, ctx: &mut GenContext) -> Value<char> {
        let index = rng.next_int(0, self.ranges.len() as i64 - 1) as usize;
        let (start, end) = self.ranges[index];

        let (mut lo, mut hi) = (start as i128, end as i128);
        if let Some(factor) = ctx.bias() {
            let factor = factor.max(1).min(i64::MAX as u64) as i64;
            if rng.next_int(1, factor) == 1 {
                (lo, hi) = biased_integer_slice(rng, lo, hi);
            }
        }
        let code = rng.next_big_int(lo, hi) as u32;
        let drawn = char::from_u32(code).unwrap_or(start);
        Value::new(
            drawn,
            ShrinkContext::Integer(IntegerContext::default()),
        )
    }

    fn shrink(&self, value: &char, ctx: &ShrinkContext) -> ValueStream<char> {
        let Some((start, _)) = self.containing_range(*value) else {
            return Box::new(std::iter::empty());
        };
        let skip_target = matches!(ctx, ShrinkContext::Integer(c) if c.shrunk_once);
        let lowest = self
            .ranges
            .iter()
            .map(|(s, _)| *s)
            .min()
            .unwrap_or(start);

        let mut out: Vec<char> = Vec::new();
        // Jump to the globally smallest character before descending within
        // the containing range
        if !skip_target && lowest < start {
            out.push(lowest);
        }
        for code in shrink_integer_toward(*value as i64, start as i64, skip_target) {
            if let Some(c) = char::from_u32(code as u32) {
                out.push(c);
            }
        }

        Box::new(out.into_iter().map(|c| {
            Value::new(
                c,
                ShrinkContext::Integer(IntegerContext { shrunk_once: true }),
            )
        }))
    }

    fn can_generate_without_context(&self, value: &char) -> bool {
        self.containing_range(*value).is_some()
    }
}

/// Printable ASCII characters
pub fn ascii_char() -> CharArbitrary {
    CharArbitrary::new(vec![(' ', '~')])
}

/// ASCII digits and letters
pub fn alphanumeric_char() -> CharArbitrary {
    CharArbitrary::new(vec![('0', '9'), ('A', 'Z'), ('a', 'z')])
}
