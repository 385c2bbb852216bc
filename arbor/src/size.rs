//! Size resolution and bias policy for generation ranges.

use crate::rng::Rand;

/// Hard upper bound on any configured length
pub const MAX_LENGTH_BOUND: usize = 0x7fff_ffff;

/// Default size applied when a constraint leaves it unspecified
pub const DEFAULT_SIZE: Size = Size::Small;

/// How large generated collections should lean, smallest to largest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Size {
    XSmall,
    Small,
    Medium,
    Large,
    XLarge,
}

impl Size {
    fn ordinal(self) -> i16 {
        match self {
            Size::XSmall => 0,
            Size::Small => 1,
            Size::Medium => 2,
            Size::Large => 3,
            Size::XLarge => 4,
        }
    }

    fn from_ordinal(ordinal: i16) -> Size {
        match ordinal.clamp(0, 4) {
            0 => Size::XSmall,
            1 => Size::Small,
            2 => Size::Medium,
            3 => Size::Large,
            _ => Size::XLarge,
        }
    }

    /// Generated-length span above `min_length` for this size
    fn span(self) -> usize {
        match self {
            Size::XSmall => 1,
            Size::Small => 10,
            Size::Medium => 100,
            Size::Large => 1_000,
            Size::XLarge => 10_000,
        }
    }
}

/// A size constraint as written by the user: absolute, relative to the crate
/// default, or the full configured range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeSpec {
    /// A fixed size
    Absolute(Size),
    /// An offset from the crate default size, clamped to the size scale
    Relative(i8),
    /// Use the whole `[min_length, max_length]` range for generation
    Max,
}

impl Default for SizeSpec {
    fn default() -> Self {
        SizeSpec::Relative(0)
    }
}

impl SizeSpec {
    fn resolve(self) -> Option<Size> {
        match self {
            SizeSpec::Absolute(size) => Some(size),
            SizeSpec::Relative(offset) => Some(Size::from_ordinal(
                DEFAULT_SIZE.ordinal() + i16::from(offset),
            )),
            SizeSpec::Max => None,
        }
    }
}

/// Concrete length policy resolved once at arbitrary construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthRange {
    /// Smallest accepted length
    pub min_length: usize,
    /// Largest length generation will draw
    pub max_generated_length: usize,
    /// Largest accepted length (shrinking and external counterexamples)
    pub max_length: usize,
}

/// Resolve user length constraints into a concrete [`LengthRange`].
///
/// Panics on invalid configuration; these are construction errors and are
/// never deferred to generation time.
pub fn resolve_lengths(min_length: usize, max_length: usize, size: SizeSpec) -> LengthRange {
    assert!(
        min_length <= max_length,
        "invalid length range: min_length {} exceeds max_length {}",
        min_length,
        max_length
    );
    assert!(
        max_length <= MAX_LENGTH_BOUND,
        "invalid length range: max_length {} exceeds the supported bound {}",
        max_length,
        MAX_LENGTH_BOUND
    );

    let max_generated_length = match size.resolve() {
        None => max_length,
        Some(size) => max_length.min(min_length.saturating_add(size.span())),
    };

    LengthRange {
        min_length,
        max_generated_length,
        max_length,
    }
}

/// Outcome of one bias decision for a sequence generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiasMode {
    /// Draw from the default size-derived ranges
    Unbiased,
    /// Keep the default length range but bias the items
    Items { factor: u64 },
    /// Steer the length toward its boundaries and bias the items too
    LengthAndItems { factor: u64 },
}

impl BiasMode {
    /// The factor items should be generated with under this mode
    pub fn item_factor(self) -> Option<u64> {
        match self {
            BiasMode::Unbiased => None,
            BiasMode::Items { factor } | BiasMode::LengthAndItems { factor } => Some(factor),
        }
    }

    /// Whether the length itself is steered toward its boundaries
    pub fn biases_length(self) -> bool {
        matches!(self, BiasMode::LengthAndItems { .. })
    }
}

/// Decide the bias mode for one sequence generation.
///
/// A single uniform draw in `[1, f^2]` selects: `1` biases both length and
/// items (probability `1/f^2`), values up to `f` bias items only (overall
/// probability `1/f`), anything else leaves the draw unbiased.
pub fn pick_bias_mode(rng: &mut Rand, bias: Option<u64>) -> BiasMode {
    let Some(factor) = bias else {
        return BiasMode::Unbiased;
    };
    let factor = factor.max(1);
    let squared = factor.saturating_mul(factor);
    let draw = rng.next_int(1, squared.min(i64::MAX as u64) as i64) as u64;
    if draw == 1 {
        BiasMode::LengthAndItems { factor }
    } else if draw <= factor {
        BiasMode::Items { factor }
    } else {
        BiasMode::Unbiased
    }
}

/// Pick a boundary slice of `[min, max]` for a biased integer draw.
///
/// Slices are logarithmic in the range span and hug the boundaries (and
/// zero, when the range spans it), so biased draws surface edge cases
/// without ever leaving the configured domain.
pub(crate) fn biased_integer_slice(rng: &mut Rand, min: i128, max: i128) -> (i128, i128) {
    debug_assert!(min <= max);
    if min == max {
        return (min, max);
    }

    let span = (max as u128).wrapping_sub(min as u128);
    let slice = i128::from(128 - span.leading_zeros());

    let mut slices: Vec<(i128, i128)> = vec![
        (min, min.saturating_add(slice).min(max)),
        (max.saturating_sub(slice).max(min), max),
    ];
    if min <= 0 && 0 <= max {
        slices.push(((-slice).max(min), slice.min(max)));
    }

    let index = rng.next_int(0, slices.len() as i64 - 1) as usize;
    slices[index]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::create_seeded_rng;

    #[test]
    fn test_resolved_lengths_are_ordered() {
        for (min, max, spec) in [
            (0, 50, SizeSpec::default()),
            (3, 3, SizeSpec::default()),
            (0, MAX_LENGTH_BOUND, SizeSpec::Absolute(Size::XLarge)),
            (10, 20, SizeSpec::Max),
            (5, 1_000_000, SizeSpec::Relative(2)),
        ] {
            let range = resolve_lengths(min, max, spec);
            assert!(range.min_length <= range.max_generated_length);
            assert!(range.max_generated_length <= range.max_length);
            assert!(range.max_length <= MAX_LENGTH_BOUND);
        }
    }

    #[test]
    fn test_size_spans_grow() {
        assert_eq!(
            resolve_lengths(0, MAX_LENGTH_BOUND, SizeSpec::Absolute(Size::XSmall))
                .max_generated_length,
            1
        );
        assert_eq!(
            resolve_lengths(0, MAX_LENGTH_BOUND, SizeSpec::Absolute(Size::Medium))
                .max_generated_length,
            100
        );
        assert_eq!(
            resolve_lengths(7, MAX_LENGTH_BOUND, SizeSpec::Absolute(Size::Small))
                .max_generated_length,
            17
        );
    }

    #[test]
    fn test_relative_size_clamps_at_scale_ends() {
        // Default is Small; an offset of -3 cannot go below XSmall
        let low = resolve_lengths(0, MAX_LENGTH_BOUND, SizeSpec::Relative(-3));
        assert_eq!(low.max_generated_length, 1);
        let high = resolve_lengths(0, MAX_LENGTH_BOUND, SizeSpec::Relative(9));
        assert_eq!(high.max_generated_length, 10_000);
    }

    #[test]
    fn test_max_spec_uses_full_range() {
        let range = resolve_lengths(2, 40, SizeSpec::Max);
        assert_eq!(range.max_generated_length, 40);
    }

    #[test]
    #[should_panic(expected = "min_length 9 exceeds max_length 3")]
    fn test_inverted_lengths_panic() {
        resolve_lengths(9, 3, SizeSpec::default());
    }

    #[test]
    fn test_bias_mode_unbiased_without_factor() {
        let mut rng = create_seeded_rng(1);
        assert_eq!(pick_bias_mode(&mut rng, None), BiasMode::Unbiased);
    }

    #[test]
    fn test_bias_mode_factor_one_always_biases() {
        let mut rng = create_seeded_rng(1);
        for _ in 0..20 {
            assert_eq!(
                pick_bias_mode(&mut rng, Some(1)),
                BiasMode::LengthAndItems { factor: 1 }
            );
        }
    }

    #[test]
    fn test_bias_mode_reaches_every_outcome() {
        let mut rng = create_seeded_rng(11);
        let mut saw_unbiased = false;
        let mut saw_items = false;
        let mut saw_both = false;
        for _ in 0..2000 {
            match pick_bias_mode(&mut rng, Some(3)) {
                BiasMode::Unbiased => saw_unbiased = true,
                BiasMode::Items { .. } => saw_items = true,
                BiasMode::LengthAndItems { .. } => saw_both = true,
            }
        }
        assert!(saw_unbiased && saw_items && saw_both);
    }

    #[test]
    fn test_biased_slice_stays_in_range() {
        let mut rng = create_seeded_rng(17);
        for _ in 0..500 {
            let (lo, hi) = biased_integer_slice(&mut rng, -1_000_000, 1_000_000);
            assert!(lo <= hi);
            assert!(lo >= -1_000_000 && hi <= 1_000_000);
        }
        // Degenerate and extreme ranges must not overflow
        assert_eq!(biased_integer_slice(&mut rng, 5, 5), (5, 5));
        let (lo, hi) = biased_integer_slice(&mut rng, i128::MIN, i128::MAX);
        assert!(lo <= hi);
    }
}
