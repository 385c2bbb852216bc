//! Recursive and mutually recursive arbitraries through lazy binding.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::arbitrary::{ArbRc, Arbitrary, GenContext, ValueStream};
use crate::rng::Rand;
use crate::value::{ShrinkContext, Value};

type Slots<T> = Rc<RefCell<Vec<Slot<T>>>>;

struct Slot<T: Clone + 'static> {
    name: String,
    arbitrary: Option<ArbRc<T>>,
}

/// Arena of named arbitrary slots, bound in a second pass.
///
/// The builder closure requests placeholders with [`LetrecArena::tie`];
/// every slot must be bound by the returned definitions before the first
/// `generate` or `shrink` call, and an unbound placeholder is a fatal
/// construction error, never a silent default.
pub struct LetrecArena<T: Clone + 'static> {
    slots: Slots<T>,
}

impl<T: Clone + 'static> LetrecArena<T> {
    fn new() -> Self {
        Self {
            slots: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// A placeholder arbitrary resolving to the definition bound to `name`
    pub fn tie(&self, name: &str) -> ArbRc<T> {
        let mut slots = self.slots.borrow_mut();
        let index = match slots.iter().position(|slot| slot.name == name) {
            Some(index) => index,
            None => {
                slots.push(Slot {
                    name: name.to_string(),
                    arbitrary: None,
                });
                slots.len() - 1
            }
        };
        Rc::new(LetrecRef {
            slots: self.slots.clone(),
            index,
        })
    }
}

struct LetrecRef<T: Clone + 'static> {
    slots: Slots<T>,
    index: usize,
}

impl<T: Clone + 'static> LetrecRef<T> {
    fn resolve(&self) -> ArbRc<T> {
        let slots = self.slots.borrow();
        let slot = &slots[self.index];
        match &slot.arbitrary {
            Some(arbitrary) => arbitrary.clone(),
            None => panic!(
                "recursive arbitrary '{}' was used before it was bound",
                slot.name
            ),
        }
    }
}

impl<T: Clone + 'static> Arbitrary for LetrecRef<T> {
    type Item = T;

    fn generate(&self, rng: &mut Rand, ctx: &mut GenContext) -> Value<T> {
        self.resolve().generate(rng, ctx)
    }

    fn shrink(&self, value: &T, ctx: &ShrinkContext) -> ValueStream<T> {
        self.resolve().shrink(value, ctx)
    }

    fn can_generate_without_context(&self, value: &T) -> bool {
        self.resolve().can_generate_without_context(value)
    }
}

/// Build a set of mutually recursive arbitraries.
///
/// The closure receives the arena, requests forward references with
/// `tie(name)`, and returns the named definitions. Each tied name must
/// appear among the definitions exactly once.
pub fn letrec<T, F>(define: F) -> BTreeMap<String, ArbRc<T>>
where
    T: Clone + 'static,
    F: FnOnce(&LetrecArena<T>) -> Vec<(&'static str, ArbRc<T>)>,
{
    let arena = LetrecArena::new();
    let definitions = define(&arena);

    let mut result = BTreeMap::new();
    {
        let mut slots = arena.slots.borrow_mut();
        for (name, arbitrary) in definitions {
            if let Some(slot) = slots.iter_mut().find(|slot| slot.name == name) {
                slot.arbitrary = Some(arbitrary.clone());
            }
            result.insert(name.to_string(), arbitrary);
        }
        for slot in slots.iter() {
            assert!(
                slot.arbitrary.is_some(),
                "recursive arbitrary '{}' was tied but never bound",
                slot.name
            );
        }
    }
    result
}
