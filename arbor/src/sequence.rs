//! Sequence arbitraries: arrays, unique arrays, and collection wrappers.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use crate::arbitrary::{ArbRc, Arbitrary, GenContext, ValueStream};
use crate::mapping::{
    btree_map_to_entries, btree_set_to_items, entries_to_btree_map, items_to_btree_set,
};
use crate::primitives::shrink_integer_toward;
use crate::rng::Rand;
use crate::size::{LengthRange, SizeSpec, pick_bias_mode, resolve_lengths};
use crate::transform::MappedArbitrary;
use crate::value::{ArrayContext, IntegerContext, ShrinkContext, Value};

/// Length and size constraints for sequence arbitraries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayConstraints {
    /// Smallest accepted length
    pub min_length: usize,
    /// Largest accepted length
    pub max_length: usize,
    /// How far above `min_length` generation should reach
    pub size: SizeSpec,
}

impl Default for ArrayConstraints {
    fn default() -> Self {
        Self {
            min_length: 0,
            max_length: crate::size::MAX_LENGTH_BOUND,
            size: SizeSpec::default(),
        }
    }
}

impl ArrayConstraints {
    /// Constrain the length to `[min_length, max_length]`
    pub fn length(min_length: usize, max_length: usize) -> Self {
        Self {
            min_length,
            max_length,
            ..Self::default()
        }
    }

    /// Fix the length exactly
    pub fn exactly(length: usize) -> Self {
        Self {
            min_length: length,
            max_length: length,
            size: SizeSpec::Max,
        }
    }

    /// Override the size policy
    pub fn with_size(mut self, size: SizeSpec) -> Self {
        self.size = size;
        self
    }
}

/// Arbitrary for vectors of independently generated items.
///
/// Shrinking applies two ordered axes: the length descends first (keeping
/// the tail, so item narrowing already done near the end survives a cut),
/// then items are narrowed one at a time left to right from the watermark
/// carried in the context. A context-free fallback drops the first element.
pub struct ArrayArbitrary<T: Clone + 'static> {
    item: ArbRc<T>,
    lengths: LengthRange,
}

impl<T: Clone + 'static> ArrayArbitrary<T> {
    /// Create an array arbitrary over `item` with the given constraints
    pub fn new(item: impl Arbitrary<Item = T> + 'static, constraints: ArrayConstraints) -> Self {
        Self {
            item: item.shared(),
            lengths: resolve_lengths(
                constraints.min_length,
                constraints.max_length,
                constraints.size,
            ),
        }
    }

    pub(crate) fn item(&self) -> &ArbRc<T> {
        &self.item
    }

    pub(crate) fn lengths(&self) -> LengthRange {
        self.lengths
    }

    pub(crate) fn draw_length(&self, rng: &mut Rand, biased: bool) -> usize {
        let lr = self.lengths;
        if lr.min_length == lr.max_generated_length {
            return lr.min_length;
        }
        if biased {
            let (lo, hi) = crate::size::biased_integer_slice(
                rng,
                lr.min_length as i128,
                lr.max_generated_length as i128,
            );
            rng.next_big_int(lo, hi) as usize
        } else {
            rng.next_int(lr.min_length as i64, lr.max_generated_length as i64) as usize
        }
    }
}

impl<T: Clone + 'static> Arbitrary for ArrayArbitrary<T> {
    type Item = Vec<T>;

    fn generate(&self, rng: &mut Rand, ctx: &mut GenContext) -> Value<Vec<T>> {
        let mode = pick_bias_mode(rng, ctx.bias());
        let length = self.draw_length(rng, mode.biases_length());

        let saved = ctx.replace_bias(mode.item_factor());
        let mut items = Vec::with_capacity(length);
        let mut item_contexts = Vec::with_capacity(length);
        let mut cloneable = false;
        for _ in 0..length {
            let item = self.item.generate(rng, ctx);
            cloneable |= item.has_to_be_cloned();
            item_contexts.push(item.context().clone());
            items.push(item.into_inner());
        }
        ctx.replace_bias(saved);

        Value::new(
            items,
            ShrinkContext::Array(ArrayContext {
                shrunk_once: false,
                length_context: Box::new(ShrinkContext::None),
                item_contexts,
                start_index: 0,
            }),
        )
        .with_cloneable(cloneable)
    }

    fn shrink(&self, value: &Vec<T>, ctx: &ShrinkContext) -> ValueStream<Vec<T>> {
        let len = value.len();
        let lr = self.lengths;

        let array_ctx = match ctx {
            ShrinkContext::Array(c) => Some(c.clone()),
            _ => None,
        };
        let has_context = array_ctx.is_some();
        let (shrunk_once, length_ctx, item_contexts, start_index) = match array_ctx {
            Some(c) => {
                let item_contexts = if c.item_contexts.len() == len {
                    c.item_contexts
                } else {
                    vec![ShrinkContext::None; len]
                };
                (
                    c.shrunk_once,
                    c.length_context,
                    item_contexts,
                    c.start_index.min(len),
                )
            }
            None => (
                false,
                Box::new(ShrinkContext::None),
                vec![ShrinkContext::None; len],
                0,
            ),
        };

        // Axis 1: shrink the length, keeping the tail of the current array
        // so already-narrowed items survive the cut
        let length_candidates: Vec<usize> = if len > lr.min_length {
            shrink_integer_toward(len as i64, lr.min_length as i64, shrunk_once)
                .into_iter()
                .map(|l| l as usize)
                .collect()
        } else {
            Vec::new()
        };
        let items_for_lengths = value.clone();
        let contexts_for_lengths = item_contexts.clone();
        let length_axis = length_candidates.into_iter().map(move |new_len| {
            let dropped = items_for_lengths.len() - new_len;
            let items = items_for_lengths[dropped..].to_vec();
            let contexts = contexts_for_lengths[dropped..].to_vec();
            Value::new(
                items,
                ShrinkContext::Array(ArrayContext {
                    shrunk_once: true,
                    length_context: Box::new(ShrinkContext::Integer(IntegerContext {
                        shrunk_once: true,
                    })),
                    item_contexts: contexts,
                    start_index: start_index.saturating_sub(dropped),
                }),
            )
        });

        // Axis 2: narrow one item at a time, indices below the watermark are
        // already stable and never revisited
        let item_arb = self.item.clone();
        let items_for_items = value.clone();
        let contexts_for_items = item_contexts;
        let length_ctx_for_items = length_ctx;
        let item_axis = (start_index..len).flat_map(move |index| {
            let stream = item_arb.shrink(&items_for_items[index], &contexts_for_items[index]);
            let items = items_for_items.clone();
            let contexts = contexts_for_items.clone();
            let length_ctx = length_ctx_for_items.clone();
            stream.map(move |candidate| {
                let mut shrunk_items = items.clone();
                shrunk_items[index] = candidate.value();
                let mut shrunk_contexts = contexts.clone();
                shrunk_contexts[index] = candidate.context().clone();
                let cloneable = candidate.has_to_be_cloned();
                Value::new(
                    shrunk_items,
                    ShrinkContext::Array(ArrayContext {
                        shrunk_once,
                        length_context: length_ctx.clone(),
                        item_contexts: shrunk_contexts,
                        start_index: index,
                    }),
                )
                .with_cloneable(cloneable)
            })
        });

        // Axis 3: with no structural context (an externally supplied
        // counterexample), try dropping the first element outright
        let drop_first: ValueStream<Vec<T>> = if !has_context && len > lr.min_length + 1 {
            let rest = value[1..].to_vec();
            Box::new(std::iter::once(Value::new(rest, ShrinkContext::None)))
        } else {
            Box::new(std::iter::empty())
        };

        Box::new(length_axis.chain(item_axis).chain(drop_first))
    }

    fn can_generate_without_context(&self, value: &Vec<T>) -> bool {
        let lr = self.lengths;
        value.len() >= lr.min_length
            && value.len() <= lr.max_length
            && value
                .iter()
                .all(|item| self.item.can_generate_without_context(item))
    }
}

/// Create an array arbitrary over `item` with the given constraints
pub fn array<T: Clone + 'static>(
    item: impl Arbitrary<Item = T> + 'static,
    constraints: ArrayConstraints,
) -> ArrayArbitrary<T> {
    ArrayArbitrary::new(item, constraints)
}

/// Key equality with JavaScript-style float handling.
///
/// `same_value` follows `Object.is` (every NaN equals every NaN, positive
/// and negative zero differ); `same_value_zero` is the collection-key
/// variant where the zeros also compare equal. For non-float types both
/// collapse to `==`, which the provided defaults implement.
pub trait KeyEq: PartialEq {
    fn same_value(&self, other: &Self) -> bool {
        self == other
    }

    fn same_value_zero(&self, other: &Self) -> bool {
        self == other
    }
}

macro_rules! impl_key_eq {
    ($($t:ty),* $(,)?) => {
        $(impl KeyEq for $t {})*
    };
}

impl_key_eq!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, bool, char, String, ()
);

impl KeyEq for f64 {
    fn same_value(&self, other: &Self) -> bool {
        (self.is_nan() && other.is_nan()) || self.to_bits() == other.to_bits()
    }

    fn same_value_zero(&self, other: &Self) -> bool {
        (self.is_nan() && other.is_nan()) || self == other
    }
}

impl KeyEq for f32 {
    fn same_value(&self, other: &Self) -> bool {
        (self.is_nan() && other.is_nan()) || self.to_bits() == other.to_bits()
    }

    fn same_value_zero(&self, other: &Self) -> bool {
        (self.is_nan() && other.is_nan()) || self == other
    }
}

impl<A: KeyEq, B: KeyEq> KeyEq for (A, B) {
    fn same_value(&self, other: &Self) -> bool {
        self.0.same_value(&other.0) && self.1.same_value(&other.1)
    }

    fn same_value_zero(&self, other: &Self) -> bool {
        self.0.same_value_zero(&other.0) && self.1.same_value_zero(&other.1)
    }
}

/// The equivalence a unique array enforces between projected keys
pub enum Uniqueness<K> {
    /// Plain `==`
    StrictEqual,
    /// `Object.is` semantics: NaN equals NaN, the zeros differ
    SameValue,
    /// Collection-key semantics: NaN equals NaN, the zeros are equal
    SameValueZero,
    /// A fully custom comparator
    Custom(Rc<dyn Fn(&K, &K) -> bool>),
}

impl<K> Clone for Uniqueness<K> {
    fn clone(&self) -> Self {
        match self {
            Uniqueness::StrictEqual => Uniqueness::StrictEqual,
            Uniqueness::SameValue => Uniqueness::SameValue,
            Uniqueness::SameValueZero => Uniqueness::SameValueZero,
            Uniqueness::Custom(cmp) => Uniqueness::Custom(cmp.clone()),
        }
    }
}

impl<K> fmt::Debug for Uniqueness<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Uniqueness::StrictEqual => write!(f, "StrictEqual"),
            Uniqueness::SameValue => write!(f, "SameValue"),
            Uniqueness::SameValueZero => write!(f, "SameValueZero"),
            Uniqueness::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

impl<K: KeyEq> Uniqueness<K> {
    /// Whether `a` and `b` collide under this equivalence
    pub fn matches(&self, a: &K, b: &K) -> bool {
        match self {
            Uniqueness::StrictEqual => a == b,
            Uniqueness::SameValue => a.same_value(b),
            Uniqueness::SameValueZero => a.same_value_zero(b),
            Uniqueness::Custom(cmp) => cmp(a, b),
        }
    }
}

/// Arbitrary for vectors whose items are pairwise distinct under a
/// configurable equivalence on projected keys.
///
/// Generation resamples on collision with a bounded budget and accepts a
/// shorter-than-requested result rather than failing. Shrink candidates from
/// the generic array shrink are re-filtered, because slicing and item
/// narrowing can reintroduce duplicates.
pub struct UniqueArrayArbitrary<T: Clone + 'static, K: KeyEq + 'static> {
    array: ArrayArbitrary<T>,
    selector: Rc<dyn Fn(&T) -> K>,
    uniqueness: Uniqueness<K>,
}

impl<T: Clone + 'static, K: KeyEq + 'static> UniqueArrayArbitrary<T, K> {
    /// Indices that survive first-occurrence deduplication of `items`
    fn kept_indices(&self, items: &[T]) -> Vec<usize> {
        let mut kept = Vec::with_capacity(items.len());
        let mut keys: Vec<K> = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let key = (self.selector)(item);
            if !keys.iter().any(|seen| self.uniqueness.matches(seen, &key)) {
                keys.push(key);
                kept.push(index);
            }
        }
        kept
    }
}

impl<T: Clone + 'static, K: KeyEq + 'static> Arbitrary for UniqueArrayArbitrary<T, K> {
    type Item = Vec<T>;

    fn generate(&self, rng: &mut Rand, ctx: &mut GenContext) -> Value<Vec<T>> {
        let mode = pick_bias_mode(rng, ctx.bias());
        let target = self.array.draw_length(rng, mode.biases_length());
        // Budget of consecutive collisions before accepting a shorter result
        let rejection_cap = self.array.lengths().max_generated_length.max(1);

        let saved = ctx.replace_bias(mode.item_factor());
        let mut items = Vec::with_capacity(target);
        let mut item_contexts = Vec::with_capacity(target);
        let mut keys: Vec<K> = Vec::with_capacity(target);
        let mut cloneable = false;
        let mut rejections = 0;
        while items.len() < target {
            let candidate = self.array.item().generate(rng, ctx);
            let key = (self.selector)(candidate.as_inner());
            if keys.iter().any(|seen| self.uniqueness.matches(seen, &key)) {
                rejections += 1;
                if rejections >= rejection_cap {
                    break;
                }
            } else {
                rejections = 0;
                keys.push(key);
                cloneable |= candidate.has_to_be_cloned();
                item_contexts.push(candidate.context().clone());
                items.push(candidate.into_inner());
            }
        }
        ctx.replace_bias(saved);

        Value::new(
            items,
            ShrinkContext::Array(ArrayContext {
                shrunk_once: false,
                length_context: Box::new(ShrinkContext::None),
                item_contexts,
                start_index: 0,
            }),
        )
        .with_cloneable(cloneable)
    }

    fn shrink(&self, value: &Vec<T>, ctx: &ShrinkContext) -> ValueStream<Vec<T>> {
        let selector = self.selector.clone();
        let uniqueness = self.uniqueness.clone();
        let min_length = self.array.lengths().min_length;

        Box::new(
            self.array
                .shrink(value, ctx)
                .filter_map(move |candidate| {
                    let items = candidate.as_inner();
                    let mut kept = Vec::with_capacity(items.len());
                    let mut keys: Vec<K> = Vec::with_capacity(items.len());
                    for (index, item) in items.iter().enumerate() {
                        let key = (selector)(item);
                        if !keys.iter().any(|seen| uniqueness.matches(seen, &key)) {
                            keys.push(key);
                            kept.push(index);
                        }
                    }

                    if kept.len() == items.len() {
                        // Already unique; pass the candidate through untouched
                        return Some(candidate);
                    }
                    if kept.len() < min_length {
                        return None;
                    }

                    // Drop the duplicates and realign the carried context
                    let deduped: Vec<T> = kept.iter().map(|&i| items[i].clone()).collect();
                    let context = match candidate.context() {
                        ShrinkContext::Array(c) if c.item_contexts.len() == items.len() => {
                            ShrinkContext::Array(ArrayContext {
                                shrunk_once: c.shrunk_once,
                                length_context: c.length_context.clone(),
                                item_contexts: kept
                                    .iter()
                                    .map(|&i| c.item_contexts[i].clone())
                                    .collect(),
                                start_index: kept.iter().filter(|&&i| i < c.start_index).count(),
                            })
                        }
                        _ => ShrinkContext::None,
                    };
                    let cloneable = candidate.has_to_be_cloned();
                    Some(Value::new(deduped, context).with_cloneable(cloneable))
                }),
        )
    }

    fn can_generate_without_context(&self, value: &Vec<T>) -> bool {
        // Uniqueness holds exactly when deduplication is a fixpoint
        self.array.can_generate_without_context(value)
            && self.kept_indices(value).len() == value.len()
    }
}

/// Create a unique array over `item`, comparing whole items with `==`
pub fn unique_array<T: Clone + KeyEq + 'static>(
    item: impl Arbitrary<Item = T> + 'static,
    constraints: ArrayConstraints,
) -> UniqueArrayArbitrary<T, T> {
    unique_array_by(item, constraints, |item: &T| item.clone(), Uniqueness::StrictEqual)
}

/// Create a unique array with a custom key projection and equivalence
pub fn unique_array_by<T, K, S>(
    item: impl Arbitrary<Item = T> + 'static,
    constraints: ArrayConstraints,
    selector: S,
    uniqueness: Uniqueness<K>,
) -> UniqueArrayArbitrary<T, K>
where
    T: Clone + 'static,
    K: KeyEq + 'static,
    S: Fn(&T) -> K + 'static,
{
    UniqueArrayArbitrary {
        array: ArrayArbitrary::new(item, constraints),
        selector: Rc::new(selector),
        uniqueness,
    }
}

/// Create an ordered-set arbitrary on top of a unique array
pub fn btree_set<T: Clone + Ord + KeyEq + 'static>(
    item: impl Arbitrary<Item = T> + 'static,
    constraints: ArrayConstraints,
) -> MappedArbitrary<Vec<T>, BTreeSet<T>> {
    unique_array(item, constraints).map(items_to_btree_set, btree_set_to_items)
}

/// Create an ordered-map arbitrary with key-unique entries
pub fn btree_map<K, V>(
    key: impl Arbitrary<Item = K> + 'static,
    value: impl Arbitrary<Item = V> + 'static,
    constraints: ArrayConstraints,
) -> MappedArbitrary<Vec<(K, V)>, BTreeMap<K, V>>
where
    K: Clone + Ord + KeyEq + 'static,
    V: Clone + 'static,
{
    let entries = (key.shared(), value.shared());
    unique_array_by(
        entries,
        constraints,
        |(key, _): &(K, V)| key.clone(),
        Uniqueness::StrictEqual,
    )
    .map(entries_to_btree_map, btree_map_to_entries)
}
