//! Generated-value carrier and the shrink context model.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::rng::Rand;

/// A generated value together with its shrink context and cloning metadata.
///
/// Immutable once created. The context lets the owning arbitrary resume
/// shrinking without replaying generation; it is always safe to discard, in
/// which case shrinking falls back to inferring state from the value alone.
#[derive(Debug, Clone)]
pub struct Value<T> {
    inner: T,
    context: ShrinkContext,
    has_to_be_cloned: bool,
}

impl<T: Clone> Value<T> {
    /// Create a value with its shrink context
    pub fn new(inner: T, context: ShrinkContext) -> Self {
        Self {
            inner,
            context,
            has_to_be_cloned: false,
        }
    }

    /// Set whether reads must be handed out as independent copies
    pub fn with_cloneable(mut self, has_to_be_cloned: bool) -> Self {
        self.has_to_be_cloned = has_to_be_cloned;
        self
    }

    /// Read the payload as an independent copy.
    ///
    /// Two reads never share mutable substructure, so a predicate mutating
    /// one read cannot corrupt the shrink history or a later read.
    pub fn value(&self) -> T {
        self.inner.clone()
    }

    /// Borrow the payload without copying
    pub fn as_inner(&self) -> &T {
        &self.inner
    }

    /// Consume the carrier, yielding the payload
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// The shrink context carried alongside the payload
    pub fn context(&self) -> &ShrinkContext {
        &self.context
    }

    /// Whether every read handed to a predicate must be a fresh copy
    pub fn has_to_be_cloned(&self) -> bool {
        self.has_to_be_cloned
    }
}

/// Per-composite shrink state, one variant per arbitrary shape.
///
/// Each composite pattern-matches only its own variant and treats any other
/// shape as [`ShrinkContext::None`], so stale or foreign contexts degrade to
/// the slower structural shrink path instead of failing.
#[derive(Debug, Clone, Default)]
pub enum ShrinkContext {
    /// No context available; shrink must infer state from the value itself
    #[default]
    None,
    /// Bounded-integer binary descent state
    Integer(IntegerContext),
    /// Sequence shrink state
    Array(ArrayContext),
    /// Per-field contexts of a product value
    Tuple(TupleContext),
    /// Field contexts and presence flags of a record value
    Record(RecordContext),
    /// Selected branch of a weighted-choice value
    Union(UnionContext),
    /// Context of the value underneath a bidirectional transform
    Mapped(Box<ShrinkContext>),
    /// Context of the value underneath a predicate filter
    Filtered(Box<ShrinkContext>),
    /// Source snapshot and child context of a dependent generation
    Chained(ChainContext),
}

/// Shrink state for bounded integers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegerContext {
    /// Whether a shrink was already accepted on this lineage; when set, the
    /// descent target itself is not proposed again
    pub shrunk_once: bool,
}

/// Shrink state for sequences
#[derive(Debug, Clone)]
pub struct ArrayContext {
    /// Whether a length shrink was already accepted on this lineage
    pub shrunk_once: bool,
    /// Carried state of the length descent
    pub length_context: Box<ShrinkContext>,
    /// One context per retained item, index-aligned with the value
    pub item_contexts: Vec<ShrinkContext>,
    /// Item-narrowing watermark: indices below it are never revisited in
    /// this shrink sub-tree
    pub start_index: usize,
}

/// Per-field shrink state of a tuple
#[derive(Debug, Clone)]
pub struct TupleContext {
    pub fields: Vec<ShrinkContext>,
}

/// Per-field shrink state of a record, with key presence flags
#[derive(Debug, Clone)]
pub struct RecordContext {
    /// One context per declared field, in declaration order
    pub fields: Vec<ShrinkContext>,
    /// Whether the field at each position is present in the value
    pub present: Vec<bool>,
}

/// Shrink state for weighted choice
#[derive(Debug, Clone)]
pub struct UnionContext {
    /// Index of the branch that produced the value
    pub selected: usize,
    /// Context of the value within that branch
    pub inner: Box<ShrinkContext>,
}

/// Shrink state for dependent (chained) generation.
///
/// Carries a type-erased snapshot of the source value and the random stream
/// position right before the dependent draw, so shrinking the source can
/// deterministically re-derive a child value without replaying the run.
#[derive(Clone)]
pub struct ChainContext {
    /// The source `Value<T>`, erased because the context union is untyped
    pub source: Rc<dyn Any>,
    /// Random stream snapshot taken just before the dependent draw
    pub rng: Rand,
    /// Bias factor in effect at the dependent draw
    pub bias: Option<u64>,
    /// Generation depth in effect at the dependent draw
    pub depth: usize,
    /// Context of the dependent value
    pub inner: Box<ShrinkContext>,
}

impl fmt::Debug for ChainContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainContext")
            .field("bias", &self.bias)
            .field("depth", &self.depth)
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}
