//! Weighted choice among arbitraries, with depth-aware bias, and `option`.

use crate::arbitrary::{ArbRc, Arbitrary, GenContext, ValueStream};
use crate::rng::Rand;
use crate::value::{ShrinkContext, UnionContext, Value};

/// One weighted branch of a [`FrequencyArbitrary`]
pub struct WeightedArbitrary<T: Clone + 'static> {
    /// Non-negative selection weight
    pub weight: u64,
    /// The branch arbitrary
    pub arbitrary: ArbRc<T>,
}

/// Create a weighted branch
pub fn weighted<T: Clone + 'static>(
    weight: u64,
    arbitrary: impl Arbitrary<Item = T> + 'static,
) -> WeightedArbitrary<T> {
    WeightedArbitrary {
        weight,
        arbitrary: arbitrary.shared(),
    }
}

/// Depth handling for recursive choices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrequencyConstraints {
    /// Depth at which only the first branch is ever chosen
    pub max_depth: Option<usize>,
    /// Softness of the depth bias: the first branch is forced with
    /// probability `depth / (depth + depth_bias)`; `None` disables it
    pub depth_bias: Option<u64>,
}

/// Weighted discrete choice among branches.
///
/// Selection maps one uniform draw in `[0, total_weight)` through the
/// cumulative weights, so a given stream position always selects the same
/// branch. The first branch doubles as the terminal case for recursive
/// definitions: depth constraints steer toward it and eventually force it.
pub struct FrequencyArbitrary<T: Clone + 'static> {
    branches: Vec<WeightedArbitrary<T>>,
    total_weight: u64,
    constraints: FrequencyConstraints,
}

impl<T: Clone + 'static> FrequencyArbitrary<T> {
    /// Create a weighted choice over `branches`
    pub fn new(branches: Vec<WeightedArbitrary<T>>, constraints: FrequencyConstraints) -> Self {
        assert!(
            !branches.is_empty(),
            "weighted choice needs at least one branch"
        );
        let total_weight: u64 = branches.iter().map(|branch| branch.weight).sum();
        assert!(
            total_weight > 0,
            "weighted choice needs a positive total weight (all {} branch weights are zero)",
            branches.len()
        );
        Self {
            branches,
            total_weight,
            constraints,
        }
    }

    fn pick_index(&self, rng: &mut Rand, ctx: &GenContext) -> usize {
        if let Some(max_depth) = self.constraints.max_depth {
            if ctx.depth() >= max_depth {
                return 0;
            }
        }
        if let Some(depth_bias) = self.constraints.depth_bias {
            let depth = ctx.depth();
            if depth > 0 {
                let force = depth as f64 / (depth as f64 + depth_bias as f64);
                if rng.next_double() < force {
                    return 0;
                }
            }
        }

        let drawn = rng.next_int(0, self.total_weight as i64 - 1) as u64;
        let mut cumulative = 0;
        for (index, branch) in self.branches.iter().enumerate() {
            cumulative += branch.weight;
            if drawn < cumulative {
                return index;
            }
        }
        self.branches.len() - 1
    }
}

impl<T: Clone + 'static> Arbitrary for FrequencyArbitrary<T> {
    type Item = T;

    fn generate(&self, rng: &mut Rand, ctx: &mut GenContext) -> Value<T> {
        let index = self.pick_index(rng, ctx);
        ctx.enter();
        let value = self.branches[index].arbitrary.generate(rng, ctx);
        ctx.exit();

        let cloneable = value.has_to_be_cloned();
        Value::new(
            value.value(),
            ShrinkContext::Union(UnionContext {
                selected: index,
                inner: Box::new(value.context().clone()),
            }),
        )
        .with_cloneable(cloneable)
    }

    fn shrink(&self, value: &T, ctx: &ShrinkContext) -> ValueStream<T> {
        let (selected, inner) = match ctx {
            ShrinkContext::Union(u) if u.selected < self.branches.len() => {
                (u.selected, (*u.inner).clone())
            }
            _ => {
                // No usable context: shrink within the first branch that
                // accepts the value
                match self
                    .branches
                    .iter()
                    .position(|b| b.arbitrary.can_generate_without_context(value))
                {
                    Some(index) => (index, ShrinkContext::None),
                    None => return Box::new(std::iter::empty()),
                }
            }
        };

        let branch = self.branches[selected].arbitrary.clone();
        Box::new(branch.shrink(value, &inner).map(move |candidate| {
            let cloneable = candidate.has_to_be_cloned();
            Value::new(
                candidate.value(),
                ShrinkContext::Union(UnionContext {
                    selected,
                    inner: Box::new(candidate.context().clone()),
                }),
            )
            .with_cloneable(cloneable)
        }))
    }

    fn can_generate_without_context(&self, value: &T) -> bool {
        self.branches
            .iter()
            .any(|branch| branch.arbitrary.can_generate_without_context(value))
    }
}

/// Weighted choice with default depth handling
pub fn frequency<T: Clone + 'static>(
    branches: Vec<WeightedArbitrary<T>>,
) -> FrequencyArbitrary<T> {
    FrequencyArbitrary::new(branches, FrequencyConstraints::default())
}

/// Weighted choice with explicit depth handling
pub fn frequency_with_constraints<T: Clone + 'static>(
    branches: Vec<WeightedArbitrary<T>>,
    constraints: FrequencyConstraints,
) -> FrequencyArbitrary<T> {
    FrequencyArbitrary::new(branches, constraints)
}

/// Uniform choice among equally likely branches
pub fn one_of<T: Clone + 'static>(arbitraries: Vec<ArbRc<T>>) -> FrequencyArbitrary<T> {
    one_of_with_constraints(arbitraries, FrequencyConstraints::default())
}

/// Uniform choice with explicit depth handling
pub fn one_of_with_constraints<T: Clone + 'static>(
    arbitraries: Vec<ArbRc<T>>,
    constraints: FrequencyConstraints,
) -> FrequencyArbitrary<T> {
    FrequencyArbitrary::new(
        arbitraries
            .into_iter()
            .map(|arbitrary| WeightedArbitrary {
                weight: 1,
                arbitrary,
            })
            .collect(),
        constraints,
    )
}

const OPTION_SOME_WEIGHT: u64 = 5;

/// Arbitrary for optional values.
///
/// `None` has weight 1 against `freq` for the wrapped arbitrary. Shrinking
/// tries `None` first: absence is the maximally shrunk state of an optional
/// slot.
pub struct OptionArbitrary<T: Clone + 'static> {
    inner: ArbRc<T>,
    some_weight: u64,
}

impl<T: Clone + 'static> OptionArbitrary<T> {
    /// Create an option arbitrary with the given `Some` weight
    pub fn new(inner: impl Arbitrary<Item = T> + 'static, some_weight: u64) -> Self {
        assert!(some_weight > 0, "option needs a positive `Some` weight");
        Self {
            inner: inner.shared(),
            some_weight,
        }
    }

    fn none_value(&self) -> Value<Option<T>> {
        Value::new(
            None,
            ShrinkContext::Union(UnionContext {
                selected: 0,
                inner: Box::new(ShrinkContext::None),
            }),
        )
    }
}

impl<T: Clone + 'static> Arbitrary for OptionArbitrary<T> {
    type Item = Option<T>;

    fn generate(&self, rng: &mut Rand, ctx: &mut GenContext) -> Value<Option<T>> {
        if rng.next_int(0, self.some_weight as i64) == 0 {
            return self.none_value();
        }
        ctx.enter();
        let value = self.inner.generate(rng, ctx);
        ctx.exit();

        let cloneable = value.has_to_be_cloned();
        Value::new(
            Some(value.value()),
            ShrinkContext::Union(UnionContext {
                selected: 1,
                inner: Box::new(value.context().clone()),
            }),
        )
        .with_cloneable(cloneable)
    }

    fn shrink(&self, value: &Option<T>, ctx: &ShrinkContext) -> ValueStream<Option<T>> {
        let Some(present) = value else {
            return Box::new(std::iter::empty());
        };
        let inner_ctx = match ctx {
            ShrinkContext::Union(u) if u.selected == 1 => (*u.inner).clone(),
            _ => ShrinkContext::None,
        };

        let nil = self.none_value();
        let narrowed = self.inner.shrink(present, &inner_ctx).map(|candidate| {
            let cloneable = candidate.has_to_be_cloned();
            Value::new(
                Some(candidate.value()),
                ShrinkContext::Union(UnionContext {
                    selected: 1,
                    inner: Box::new(candidate.context().clone()),
                }),
            )
            .with_cloneable(cloneable)
        });
        Box::new(std::iter::once(nil).chain(narrowed))
    }

    fn can_generate_without_context(&self, value: &Option<T>) -> bool {
        match value {
            None => true,
            Some(present) => self.inner.can_generate_without_context(present),
        }
    }
}

/// Create an option arbitrary with the default `Some` weight
pub fn option<T: Clone + 'static>(inner: impl Arbitrary<Item = T> + 'static) -> OptionArbitrary<T> {
    OptionArbitrary::new(inner, OPTION_SOME_WEIGHT)
}

/// Create an option arbitrary with an explicit `Some` weight
pub fn option_with_weight<T: Clone + 'static>(
    inner: impl Arbitrary<Item = T> + 'static,
    some_weight: u64,
) -> OptionArbitrary<T> {
    OptionArbitrary::new(inner, some_weight)
}
