#![allow(clippy::result_large_err)]

//! # Arbor - Composable Arbitraries with Context-Aware Shrinking
//!
//! Arbor is a property-based testing engine built around composable value
//! domains ("arbitraries"): declarative descriptions that generate
//! pseudo-random values, and, when a predicate fails, deterministically
//! search for a minimal counterexample by shrinking.
//!
//! ## Quick Start
//!
//! ```rust
//! use arbor::{ArrayConstraints, PropertyError, array, check, integer};
//!
//! let result = check(
//!     array(integer(0i64, 100), ArrayConstraints::length(0, 10)),
//!     |items: Vec<i64>| {
//!         if items.iter().all(|n| *n <= 100) {
//!             Ok(())
//!         } else {
//!             Err(PropertyError::property_failed("out of range"))
//!         }
//!     },
//! );
//! assert!(result.is_ok());
//! ```
//!
//! Every failure is reported with the seed and shrink path needed to replay
//! the exact minimal counterexample.

// Public modules
pub mod arbitrary;
pub mod choice;
pub mod config;
pub mod error;
pub mod letrec;
pub mod mapping;
pub mod primitives;
pub mod property;
pub mod rng;
pub mod runner;
pub mod sequence;
pub mod size;
pub mod strings;
pub mod transform;
pub mod tuples;
pub mod value;

// Re-export the main public API
pub use arbitrary::{ArbRc, Arbitrary, GenContext, ValueStream};
pub use choice::{
    FrequencyArbitrary, FrequencyConstraints, OptionArbitrary, WeightedArbitrary, frequency,
    frequency_with_constraints, one_of, one_of_with_constraints, option, option_with_weight,
    weighted,
};
pub use config::{BiasSchedule, ConfigError, TestConfig};
pub use error::{PropertyError, PropertyResult, TestFailure, TestSuccess, UnmapError};
pub use letrec::{LetrecArena, letrec};
pub use primitives::{
    CharArbitrary, ConstantArbitrary, DoubleArbitrary, IntegerArbitrary, alphanumeric_char,
    ascii_char, big_integer, boolean, constant, double, integer,
};
pub use property::{AsyncProperty, Property, PropertyHarness, RunOutcome, pre};
pub use rng::{CloneableRng, DefaultRngProvider, Rand, RngProvider, create_rng, create_seeded_rng};
pub use runner::{check, check_async, check_async_with_config, check_with_config, replay};
pub use sequence::{
    ArrayArbitrary, ArrayConstraints, KeyEq, UniqueArrayArbitrary, Uniqueness, array, btree_map,
    btree_set, unique_array, unique_array_by,
};
pub use size::{LengthRange, MAX_LENGTH_BOUND, Size, SizeSpec};
pub use strings::{alphanumeric_string, ascii_string, base64_string, string_of};
pub use transform::{ChainedArbitrary, FilteredArbitrary, MappedArbitrary, NoBiasArbitrary};
pub use tuples::{RecordArbitrary, RecordConstraints, record};
pub use value::{ShrinkContext, Value};
