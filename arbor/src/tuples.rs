//! Product composition: tuples of independent arbitraries and records.

use std::collections::BTreeMap;

use crate::arbitrary::{ArbRc, Arbitrary, GenContext, ValueStream};
use crate::rng::Rand;
use crate::value::{RecordContext, ShrinkContext, TupleContext, Value};

// Tuples of shared arbitraries are themselves arbitraries. Generation draws
// the fields in declared order (the random stream must advance identically
// on every run); shrinking narrows exactly one field at a time while the
// others stay fixed, field streams concatenated in declaration order.
macro_rules! impl_tuple_arbitrary {
    ($len:expr => $($T:ident : $idx:tt),+) => {
        impl<$($T: Clone + 'static),+> Arbitrary for ($(ArbRc<$T>,)+) {
            type Item = ($($T,)+);

            fn generate(&self, rng: &mut Rand, ctx: &mut GenContext) -> Value<Self::Item> {
                let drawn = ($(self.$idx.generate(rng, ctx),)+);
                let cloneable = false $(|| drawn.$idx.has_to_be_cloned())+;
                let fields = vec![$(drawn.$idx.context().clone()),+];
                let item = ($(drawn.$idx.value(),)+);
                Value::new(item, ShrinkContext::Tuple(TupleContext { fields }))
                    .with_cloneable(cloneable)
            }

            fn shrink(
                &self,
                value: &Self::Item,
                ctx: &ShrinkContext,
            ) -> ValueStream<Self::Item> {
                let fields: Vec<ShrinkContext> = match ctx {
                    ShrinkContext::Tuple(t) if t.fields.len() == $len => t.fields.clone(),
                    _ => vec![ShrinkContext::None; $len],
                };
                let mut streams: Vec<ValueStream<Self::Item>> = Vec::new();
                $(
                    {
                        let full = value.clone();
                        let field_ctxs = fields.clone();
                        let stream = self
                            .$idx
                            .shrink(&value.$idx, &fields[$idx])
                            .map(move |candidate| {
                                let mut item = full.clone();
                                item.$idx = candidate.value();
                                let mut ctxs = field_ctxs.clone();
                                ctxs[$idx] = candidate.context().clone();
                                let cloneable = candidate.has_to_be_cloned();
                                Value::new(
                                    item,
                                    ShrinkContext::Tuple(TupleContext { fields: ctxs }),
                                )
                                .with_cloneable(cloneable)
                            });
                        streams.push(Box::new(stream));
                    }
                )+
                Box::new(streams.into_iter().flatten())
            }

            fn can_generate_without_context(&self, value: &Self::Item) -> bool {
                true $(&& self.$idx.can_generate_without_context(&value.$idx))+
            }
        }
    };
}

impl_tuple_arbitrary!(2 => A:0, B:1);
impl_tuple_arbitrary!(3 => A:0, B:1, C:2);
impl_tuple_arbitrary!(4 => A:0, B:1, C:2, D:3);
impl_tuple_arbitrary!(5 => A:0, B:1, C:2, D:3, E:4);
impl_tuple_arbitrary!(6 => A:0, B:1, C:2, D:3, E:4, F:5);

/// Constraints controlling which record keys are required
#[derive(Debug, Clone, Default)]
pub struct RecordConstraints {
    /// Make every key optional
    pub with_deleted_keys: bool,
    /// Make exactly the listed keys required, all others optional
    pub required_keys: Option<Vec<String>>,
}

struct RecordField<V: Clone + 'static> {
    name: String,
    arbitrary: ArbRc<V>,
    required: bool,
}

/// Arbitrary for string-keyed records with required and optional keys.
///
/// Optional keys are first-class shrink targets: for each present optional
/// key the removal candidate comes before any narrowing of its value, so
/// records shrink toward deleting what they can.
pub struct RecordArbitrary<V: Clone + 'static> {
    fields: Vec<RecordField<V>>,
    presence_weight: u64,
}

const RECORD_PRESENCE_WEIGHT: u64 = 5;

impl<V: Clone + 'static> RecordArbitrary<V> {
    /// Create a record arbitrary from named fields, in declaration order
    pub fn new(fields: Vec<(&str, ArbRc<V>)>, constraints: RecordConstraints) -> Self {
        assert!(
            !(constraints.with_deleted_keys && constraints.required_keys.is_some()),
            "conflicting record constraints: `required_keys` cannot be combined with \
             `with_deleted_keys`"
        );
        if let Some(required) = &constraints.required_keys {
            for name in required {
                assert!(
                    fields.iter().any(|(field, _)| field == name),
                    "required key '{}' is not a declared record field",
                    name
                );
            }
        }
        let mut seen: Vec<&str> = Vec::with_capacity(fields.len());
        for (name, _) in &fields {
            assert!(!seen.contains(name), "duplicate record field '{}'", name);
            seen.push(name);
        }

        let fields = fields
            .into_iter()
            .map(|(name, arbitrary)| {
                let required = match &constraints.required_keys {
                    Some(required) => required.iter().any(|r| r == name),
                    None => !constraints.with_deleted_keys,
                };
                RecordField {
                    name: name.to_string(),
                    arbitrary,
                    required,
                }
            })
            .collect();

        Self {
            fields,
            presence_weight: RECORD_PRESENCE_WEIGHT,
        }
    }
}

impl<V: Clone + 'static> Arbitrary for RecordArbitrary<V> {
    type Item = BTreeMap<String, V>;

    fn generate(&self, rng: &mut Rand, ctx: &mut GenContext) -> Value<Self::Item> {
        let mut map = BTreeMap::new();
        let mut field_contexts = Vec::with_capacity(self.fields.len());
        let mut present = Vec::with_capacity(self.fields.len());
        let mut cloneable = false;

        for field in &self.fields {
            let is_present =
                field.required || rng.next_int(0, self.presence_weight as i64) != 0;
            if is_present {
                let value = field.arbitrary.generate(rng, ctx);
                cloneable |= value.has_to_be_cloned();
                field_contexts.push(value.context().clone());
                present.push(true);
                map.insert(field.name.clone(), value.into_inner());
            } else {
                field_contexts.push(ShrinkContext::None);
                present.push(false);
            }
        }

        Value::new(
            map,
            ShrinkContext::Record(RecordContext {
                fields: field_contexts,
                present,
            }),
        )
        .with_cloneable(cloneable)
    }

    fn shrink(&self, value: &Self::Item, ctx: &ShrinkContext) -> ValueStream<Self::Item> {
        let count = self.fields.len();
        let (field_contexts, present) = match ctx {
            ShrinkContext::Record(r) if r.fields.len() == count && r.present.len() == count => {
                (r.fields.clone(), r.present.clone())
            }
            _ => (
                vec![ShrinkContext::None; count],
                self.fields
                    .iter()
                    .map(|field| value.contains_key(&field.name))
                    .collect(),
            ),
        };

        let mut streams: Vec<ValueStream<Self::Item>> = Vec::new();
        for (index, field) in self.fields.iter().enumerate() {
            if !present[index] {
                continue;
            }
            let Some(current) = value.get(&field.name) else {
                continue;
            };

            // Removing an optional key is the biggest jump for this field
            if !field.required {
                let mut removed = value.clone();
                removed.remove(&field.name);
                let mut ctxs = field_contexts.clone();
                ctxs[index] = ShrinkContext::None;
                let mut flags = present.clone();
                flags[index] = false;
                streams.push(Box::new(std::iter::once(Value::new(
                    removed,
                    ShrinkContext::Record(RecordContext {
                        fields: ctxs,
                        present: flags,
                    }),
                ))));
            }

            let name = field.name.clone();
            let full = value.clone();
            let ctxs = field_contexts.clone();
            let flags = present.clone();
            let stream = field
                .arbitrary
                .shrink(current, &field_contexts[index])
                .map(move |candidate| {
                    let mut map = full.clone();
                    map.insert(name.clone(), candidate.value());
                    let mut field_ctxs = ctxs.clone();
                    field_ctxs[index] = candidate.context().clone();
                    let cloneable = candidate.has_to_be_cloned();
                    Value::new(
                        map,
                        ShrinkContext::Record(RecordContext {
                            fields: field_ctxs,
                            present: flags.clone(),
                        }),
                    )
                    .with_cloneable(cloneable)
                });
            streams.push(Box::new(stream));
        }

        Box::new(streams.into_iter().flatten())
    }

    fn can_generate_without_context(&self, value: &Self::Item) -> bool {
        for field in &self.fields {
            match value.get(&field.name) {
                Some(present) => {
                    if !field.arbitrary.can_generate_without_context(present) {
                        return false;
                    }
                }
                None => {
                    if field.required {
                        return false;
                    }
                }
            }
        }
        // Unknown keys cannot have been generated
        value
            .keys()
            .all(|key| self.fields.iter().any(|field| field.name == *key))
    }
}

/// Create a record arbitrary from named fields
pub fn record<V: Clone + 'static>(
    fields: Vec<(&str, ArbRc<V>)>,
    constraints: RecordConstraints,
) -> RecordArbitrary<V> {
    RecordArbitrary::new(fields, constraints)
}
