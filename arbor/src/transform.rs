//! Derived arbitraries: mapping, filtering, chaining, bias masking.

use std::rc::Rc;

use crate::arbitrary::{ArbRc, Arbitrary, GenContext, ValueStream};
use crate::error::UnmapError;
use crate::rng::Rand;
use crate::value::{ChainContext, ShrinkContext, Value};

/// Retry budget for filtered generation before giving up
const FILTER_RETRY_CAP: usize = 1000;

/// An arbitrary whose values are transformed through a bidirectional mapping
pub struct MappedArbitrary<T: Clone + 'static, U: Clone + 'static> {
    base: ArbRc<T>,
    mapper: Rc<dyn Fn(&T) -> U>,
    unmapper: Rc<dyn Fn(&U) -> Result<T, UnmapError>>,
}

impl<T: Clone + 'static, U: Clone + 'static> MappedArbitrary<T, U> {
    pub(crate) fn new(
        base: ArbRc<T>,
        mapper: Rc<dyn Fn(&T) -> U>,
        unmapper: Rc<dyn Fn(&U) -> Result<T, UnmapError>>,
    ) -> Self {
        Self {
            base,
            mapper,
            unmapper,
        }
    }

    fn wrap(&self, source: Value<T>) -> Value<U> {
        let mapped = (self.mapper)(source.as_inner());
        let cloneable = source.has_to_be_cloned();
        Value::new(
            mapped,
            ShrinkContext::Mapped(Box::new(source.context().clone())),
        )
        .with_cloneable(cloneable)
    }
}

impl<T: Clone + 'static, U: Clone + 'static> Arbitrary for MappedArbitrary<T, U> {
    type Item = U;

    fn generate(&self, rng: &mut Rand, ctx: &mut GenContext) -> Value<U> {
        let source = self.base.generate(rng, ctx);
        self.wrap(source)
    }

    fn shrink(&self, value: &U, ctx: &ShrinkContext) -> ValueStream<U> {
        let inner_ctx = match ctx {
            ShrinkContext::Mapped(inner) => (**inner).clone(),
            _ => ShrinkContext::None,
        };
        // Recover the source-domain representation; a value outside the
        // mapper's image cannot be shrunk here
        let source = match (self.unmapper)(value) {
            Ok(source) => source,
            Err(_) => return Box::new(std::iter::empty()),
        };

        let mapper = self.mapper.clone();
        Box::new(self.base.shrink(&source, &inner_ctx).map(move |candidate| {
            let mapped = (mapper)(candidate.as_inner());
            let cloneable = candidate.has_to_be_cloned();
            Value::new(
                mapped,
                ShrinkContext::Mapped(Box::new(candidate.context().clone())),
            )
            .with_cloneable(cloneable)
        }))
    }

    fn can_generate_without_context(&self, value: &U) -> bool {
        match (self.unmapper)(value) {
            Ok(source) => self.base.can_generate_without_context(&source),
            Err(_) => false,
        }
    }
}

/// An arbitrary restricted to values matching a predicate
pub struct FilteredArbitrary<T: Clone + 'static> {
    base: ArbRc<T>,
    predicate: Rc<dyn Fn(&T) -> bool>,
}

impl<T: Clone + 'static> FilteredArbitrary<T> {
    pub(crate) fn new(base: ArbRc<T>, predicate: Rc<dyn Fn(&T) -> bool>) -> Self {
        Self { base, predicate }
    }
}

impl<T: Clone + 'static> Arbitrary for FilteredArbitrary<T> {
    type Item = T;

    fn generate(&self, rng: &mut Rand, ctx: &mut GenContext) -> Value<T> {
        for _ in 0..FILTER_RETRY_CAP {
            let candidate = self.base.generate(rng, ctx);
            if (self.predicate)(candidate.as_inner()) {
                let cloneable = candidate.has_to_be_cloned();
                return Value::new(
                    candidate.value(),
                    ShrinkContext::Filtered(Box::new(candidate.context().clone())),
                )
                .with_cloneable(cloneable);
            }
        }
        panic!(
            "filtered arbitrary failed to produce a matching value after {} attempts; \
             the predicate rejects too much of the underlying domain",
            FILTER_RETRY_CAP
        );
    }

    fn shrink(&self, value: &T, ctx: &ShrinkContext) -> ValueStream<T> {
        let inner_ctx = match ctx {
            ShrinkContext::Filtered(inner) => (**inner).clone(),
            _ => ShrinkContext::None,
        };
        let predicate = self.predicate.clone();
        Box::new(
            self.base
                .shrink(value, &inner_ctx)
                .filter(move |candidate| (predicate)(candidate.as_inner()))
                .map(|candidate| {
                    let cloneable = candidate.has_to_be_cloned();
                    Value::new(
                        candidate.value(),
                        ShrinkContext::Filtered(Box::new(candidate.context().clone())),
                    )
                    .with_cloneable(cloneable)
                }),
        )
    }

    fn can_generate_without_context(&self, value: &T) -> bool {
        (self.predicate)(value) && self.base.can_generate_without_context(value)
    }
}

/// An arbitrary whose second stage depends on a generated source value
pub struct ChainedArbitrary<T: Clone + 'static, U: Clone + 'static> {
    base: ArbRc<T>,
    continuation: Rc<dyn Fn(&T) -> ArbRc<U>>,
}

impl<T: Clone + 'static, U: Clone + 'static> ChainedArbitrary<T, U> {
    pub(crate) fn new(base: ArbRc<T>, continuation: Rc<dyn Fn(&T) -> ArbRc<U>>) -> Self {
        Self { base, continuation }
    }

    fn wrap(
        source: Value<T>,
        child: Value<U>,
        rng_snapshot: Rand,
        bias: Option<u64>,
        depth: usize,
    ) -> Value<U> {
        let cloneable = source.has_to_be_cloned() || child.has_to_be_cloned();
        Value::new(
            child.value(),
            ShrinkContext::Chained(ChainContext {
                source: Rc::new(source),
                rng: rng_snapshot,
                bias,
                depth,
                inner: Box::new(child.context().clone()),
            }),
        )
        .with_cloneable(cloneable)
    }
}

impl<T: Clone + 'static, U: Clone + 'static> Arbitrary for ChainedArbitrary<T, U> {
    type Item = U;

    fn generate(&self, rng: &mut Rand, ctx: &mut GenContext) -> Value<U> {
        let source = self.base.generate(rng, ctx);
        let child_arb = (self.continuation)(source.as_inner());
        // Snapshot the stream before the dependent draw so shrinking can
        // re-derive child values for shrunk sources
        let rng_snapshot = rng.clone();
        let child = child_arb.generate(rng, ctx);
        Self::wrap(source, child, rng_snapshot, ctx.bias(), ctx.depth())
    }

    fn shrink(&self, value: &U, ctx: &ShrinkContext) -> ValueStream<U> {
        let ShrinkContext::Chained(chain) = ctx else {
            return Box::new(std::iter::empty());
        };
        let Some(source) = chain.source.downcast_ref::<Value<T>>() else {
            return Box::new(std::iter::empty());
        };
        let source = source.clone();
        let bias = chain.bias;
        let depth = chain.depth;

        // Axis 1: shrink the source and replay the dependent draw against
        // the snapshotted stream
        let continuation = self.continuation.clone();
        let rng_snapshot = chain.rng.clone();
        let rechained = self
            .base
            .shrink(source.as_inner(), source.context())
            .map(move |shrunk_source| {
                let child_arb = (continuation)(shrunk_source.as_inner());
                let mut rng = rng_snapshot.clone();
                let mut gen_ctx = GenContext::with_depth(bias, depth);
                let child = child_arb.generate(&mut rng, &mut gen_ctx);
                Self::wrap(shrunk_source, child, rng_snapshot.clone(), bias, depth)
            });

        // Axis 2: keep the source, narrow the dependent value
        let child_arb = (self.continuation)(source.as_inner());
        let rng_snapshot = chain.rng.clone();
        let same_source = child_arb
            .shrink(value, &chain.inner)
            .map(move |child| {
                Self::wrap(
                    source.clone(),
                    child,
                    rng_snapshot.clone(),
                    bias,
                    depth,
                )
            });

        Box::new(rechained.chain(same_source))
    }

    fn can_generate_without_context(&self, _value: &U) -> bool {
        // The continuation cannot be inverted, so chained values cannot be
        // re-derived from the value alone
        false
    }
}

/// An arbitrary that masks bias for its whole subtree
pub struct NoBiasArbitrary<T: Clone + 'static> {
    base: ArbRc<T>,
}

impl<T: Clone + 'static> NoBiasArbitrary<T> {
    pub(crate) fn new(base: ArbRc<T>) -> Self {
        Self { base }
    }
}

impl<T: Clone + 'static> Arbitrary for NoBiasArbitrary<T> {
    type Item = T;

    fn generate(&self, rng: &mut Rand, ctx: &mut GenContext) -> Value<T> {
        let saved = ctx.replace_bias(None);
        let value = self.base.generate(rng, ctx);
        ctx.replace_bias(saved);
        value
    }

    fn shrink(&self, value: &T, ctx: &ShrinkContext) -> ValueStream<T> {
        self.base.shrink(value, ctx)
    }

    fn can_generate_without_context(&self, value: &T) -> bool {
        self.base.can_generate_without_context(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitrary::Arbitrary;
    use crate::primitives::integer;
    use crate::rng::create_seeded_rng;

    #[test]
    fn test_map_round_trips_through_shrink() {
        let arb = integer(0i64, 64).map(|n| n * 2, |d| {
            if d % 2 == 0 && (0..=128).contains(d) {
                Ok(d / 2)
            } else {
                Err(UnmapError::new(format!("{} is not an even doubling", d)))
            }
        });

        let mut rng = create_seeded_rng(4);
        let mut ctx = GenContext::unbiased();
        for _ in 0..100 {
            let value = arb.generate(&mut rng, &mut ctx);
            assert_eq!(value.as_inner() % 2, 0);
            assert!(arb.can_generate_without_context(value.as_inner()));
        }

        // Shrinking an even value works through the inverse, odd values are
        // refused outright
        let candidates: Vec<i64> = arb
            .shrink(&16, &ShrinkContext::None)
            .map(|v| v.into_inner())
            .collect();
        assert!(candidates.contains(&0));
        assert!(candidates.iter().all(|c| c % 2 == 0 && *c != 16));
        assert_eq!(arb.shrink(&15, &ShrinkContext::None).count(), 0);
        assert!(!arb.can_generate_without_context(&15));
    }

    #[test]
    fn test_filter_only_produces_matching_values() {
        let arb = integer(0i64, 100).filter(|n| n % 3 == 0);
        let mut rng = create_seeded_rng(8);
        let mut ctx = GenContext::unbiased();

        for _ in 0..100 {
            let value = arb.generate(&mut rng, &mut ctx);
            assert_eq!(value.as_inner() % 3, 0);
        }
    }

    #[test]
    fn test_filter_skips_non_matching_shrink_candidates() {
        let arb = integer(0i64, 100).filter(|n| n % 2 == 1);
        let candidates: Vec<i64> = arb
            .shrink(&99, &ShrinkContext::None)
            .map(|v| v.into_inner())
            .collect();
        assert!(!candidates.is_empty());
        assert!(candidates.iter().all(|c| c % 2 == 1 && *c != 99));
    }

    #[test]
    fn test_filter_can_generate_conjoins_predicate() {
        let arb = integer(0i64, 100).filter(|n| *n >= 10);
        assert!(arb.can_generate_without_context(&10));
        assert!(!arb.can_generate_without_context(&9));
        assert!(!arb.can_generate_without_context(&101));
    }

    #[test]
    #[should_panic(expected = "rejects too much")]
    fn test_filter_gives_up_on_impossible_predicate() {
        let arb = integer(0i64, 100).filter(|_| false);
        let mut rng = create_seeded_rng(1);
        let mut ctx = GenContext::unbiased();
        arb.generate(&mut rng, &mut ctx);
    }

    #[test]
    fn test_chain_generates_dependent_values() {
        // Draw a length, then a value bounded by it
        let arb = integer(1i64, 10).chain(|n| integer(0i64, *n).shared());
        let mut rng = create_seeded_rng(6);
        let mut ctx = GenContext::unbiased();

        for _ in 0..100 {
            let value = arb.generate(&mut rng, &mut ctx);
            assert!((0..=10).contains(value.as_inner()));
        }
    }

    #[test]
    fn test_chain_shrink_narrows_source_and_child() {
        let arb = integer(1i64, 10).chain(|n| integer(0i64, *n).shared());
        let mut rng = create_seeded_rng(6);
        let mut ctx = GenContext::unbiased();

        for _ in 0..50 {
            let value = arb.generate(&mut rng, &mut ctx);
            for candidate in arb.shrink(value.as_inner(), value.context()).take(50) {
                assert!((0..=10).contains(candidate.as_inner()));
            }
        }
    }

    #[test]
    fn test_no_bias_masks_the_subtree() {
        // With factor 1 the biased path always fires and integer(0, 1000)
        // then only draws boundary slices; no_bias must restore the full
        // uniform draw
        let biased = integer(0i64, 1000);
        let unbiased = integer(0i64, 1000).no_bias();

        let mut rng = create_seeded_rng(30);
        let mut ctx = GenContext::new(Some(1));
        let mut saw_midrange = false;
        for _ in 0..300 {
            let value = unbiased.generate(&mut rng, &mut ctx).into_inner();
            assert_eq!(ctx.bias(), Some(1));
            if (100..=900).contains(&value) {
                saw_midrange = true;
            }
        }
        assert!(saw_midrange);

        // Sanity: the biased counterpart sticks to the boundary slices
        let mut rng = create_seeded_rng(30);
        for _ in 0..300 {
            let value = biased.generate(&mut rng, &mut ctx).into_inner();
            assert!(!(100..=900).contains(&value));
        }
    }
}
