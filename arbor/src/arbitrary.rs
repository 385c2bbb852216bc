//! The core arbitrary capability: generation, shrinking, and composition.

use std::rc::Rc;

use crate::error::UnmapError;
use crate::rng::Rand;
use crate::transform::{ChainedArbitrary, FilteredArbitrary, MappedArbitrary, NoBiasArbitrary};
use crate::value::{ShrinkContext, Value};

/// A finite, lazily produced sequence of shrink candidates.
///
/// Streams are consumed once but always safely re-enumerable by calling
/// `shrink` again; they never contain the value being shrunk.
pub type ValueStream<T> = Box<dyn Iterator<Item = Value<T>>>;

/// A shared, type-erased arbitrary, the currency of composition
pub type ArbRc<T> = Rc<dyn Arbitrary<Item = T>>;

/// Per-generation state threaded through the whole `generate` call tree.
///
/// Created fresh for every top-level generation, so no bias or depth state
/// can leak between runs. Recursion points increment the depth on entry and
/// decrement it on exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenContext {
    bias: Option<u64>,
    depth: usize,
}

impl GenContext {
    /// Create a context with the given bias factor (`None` disables bias)
    pub fn new(bias: Option<u64>) -> Self {
        Self { bias, depth: 0 }
    }

    /// Create an unbiased context
    pub fn unbiased() -> Self {
        Self::new(None)
    }

    pub(crate) fn with_depth(bias: Option<u64>, depth: usize) -> Self {
        Self { bias, depth }
    }

    /// The bias factor in effect, if any
    pub fn bias(&self) -> Option<u64> {
        self.bias
    }

    /// Current recursion depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn replace_bias(&mut self, bias: Option<u64>) -> Option<u64> {
        std::mem::replace(&mut self.bias, bias)
    }

    pub(crate) fn enter(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn exit(&mut self) {
        self.depth -= 1;
    }
}

/// A composable description of a value domain plus its generation and
/// shrinking algorithms.
///
/// Arbitraries are stateless definition objects: all randomness flows
/// through the explicit [`Rand`] argument, and generation is a pure function
/// of the random stream state and the generation context. Two calls against
/// clones of the same stream yield identical values.
pub trait Arbitrary {
    /// The type of values this arbitrary describes
    type Item: Clone + 'static;

    /// Generate one value, consuming randomness from `rng`.
    ///
    /// Must terminate; internal retries (filters, uniqueness) are bounded by
    /// construction and degrade rather than loop.
    fn generate(&self, rng: &mut Rand, ctx: &mut GenContext) -> Value<Self::Item>;

    /// Enumerate shrink candidates for `value`, biggest jump first.
    ///
    /// `ctx` is the context carried by the value being shrunk; passing
    /// [`ShrinkContext::None`] is always allowed and falls back to
    /// structural shrinking. The stream never yields `value` itself.
    fn shrink(&self, value: &Self::Item, ctx: &ShrinkContext) -> ValueStream<Self::Item>;

    /// Whether `value` could have been produced by this arbitrary.
    ///
    /// Accepts everything `generate` and `shrink` can emit; used to vet
    /// externally supplied counterexamples before context-free shrinking.
    fn can_generate_without_context(&self, value: &Self::Item) -> bool;

    /// Transform generated values through `mapper`, with `unmapper` as its
    /// exact inverse on the image.
    ///
    /// The inverse is what keeps shrink-without-context working: a raw
    /// counterexample is unmapped back into the source domain, or refused
    /// with an [`UnmapError`] when it could not have been produced.
    fn map<U, F, G>(self, mapper: F, unmapper: G) -> MappedArbitrary<Self::Item, U>
    where
        Self: Sized + 'static,
        U: Clone + 'static,
        F: Fn(&Self::Item) -> U + 'static,
        G: Fn(&U) -> Result<Self::Item, UnmapError> + 'static,
    {
        MappedArbitrary::new(Rc::new(self), Rc::new(mapper), Rc::new(unmapper))
    }

    /// Keep only values matching `predicate`, resampling on rejection up to
    /// a fixed retry budget
    fn filter<F>(self, predicate: F) -> FilteredArbitrary<Self::Item>
    where
        Self: Sized + 'static,
        F: Fn(&Self::Item) -> bool + 'static,
    {
        FilteredArbitrary::new(Rc::new(self), Rc::new(predicate))
    }

    /// Generate a value, then generate from the arbitrary it selects
    fn chain<U, F>(self, f: F) -> ChainedArbitrary<Self::Item, U>
    where
        Self: Sized + 'static,
        U: Clone + 'static,
        F: Fn(&Self::Item) -> ArbRc<U> + 'static,
    {
        ChainedArbitrary::new(Rc::new(self), Rc::new(f))
    }

    /// Mask bias for this subtree; generation draws from the full configured
    /// domain regardless of the run's bias factor
    fn no_bias(self) -> NoBiasArbitrary<Self::Item>
    where
        Self: Sized + 'static,
    {
        NoBiasArbitrary::new(Rc::new(self))
    }

    /// Erase the concrete type behind a shared handle for heterogeneous
    /// composition (choice branches, tuple fields, recursive slots)
    fn shared(self) -> ArbRc<Self::Item>
    where
        Self: Sized + 'static,
    {
        Rc::new(self)
    }
}

impl<A: Arbitrary + ?Sized> Arbitrary for Rc<A> {
    type Item = A::Item;

    fn generate(&self, rng: &mut Rand, ctx: &mut GenContext) -> Value<Self::Item> {
        (**self).generate(rng, ctx)
    }

    fn shrink(&self, value: &Self::Item, ctx: &ShrinkContext) -> ValueStream<Self::Item> {
        (**self).shrink(value, ctx)
    }

    fn can_generate_without_context(&self, value: &Self::Item) -> bool {
        (**self).can_generate_without_context(value)
    }
}
