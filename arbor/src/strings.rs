//! String arbitraries built on character arrays through the mapping layer.

use crate::arbitrary::Arbitrary;
use crate::mapping::{chars_to_string, chunks_to_string, string_to_chars, string_to_chunks};
use crate::primitives::{CharArbitrary, alphanumeric_char, ascii_char};
use crate::sequence::{ArrayConstraints, array};
use crate::transform::MappedArbitrary;

/// Create a string arbitrary over the given characters; length constraints
/// count characters
pub fn string_of(
    chars: CharArbitrary,
    constraints: ArrayConstraints,
) -> MappedArbitrary<Vec<char>, String> {
    array(chars, constraints).map(chars_to_string, string_to_chars)
}

/// Printable ASCII strings
pub fn ascii_string(constraints: ArrayConstraints) -> MappedArbitrary<Vec<char>, String> {
    string_of(ascii_char(), constraints)
}

/// ASCII alphanumeric strings
pub fn alphanumeric_string(constraints: ArrayConstraints) -> MappedArbitrary<Vec<char>, String> {
    string_of(alphanumeric_char(), constraints)
}

/// The base64 alphabet, without the padding character
fn base64_char() -> CharArbitrary {
    CharArbitrary::new(vec![('A', 'Z'), ('a', 'z'), ('0', '9'), ('+', '+'), ('/', '/')])
}

/// Strings of whole base64 blocks.
///
/// Values are built from four-character blocks, so every generated and every
/// shrunk string has a length divisible by four: a length cut removes whole
/// blocks and an item shrink rewrites one block in place. The length
/// constraints are in output characters and must themselves be multiples of
/// four.
pub fn base64_string(constraints: ArrayConstraints) -> MappedArbitrary<Vec<String>, String> {
    assert!(
        constraints.min_length % 4 == 0 && constraints.max_length % 4 == 0,
        "invalid base64 length range: {} to {} (both bounds must be multiples of 4)",
        constraints.min_length,
        constraints.max_length
    );

    let block = string_of(base64_char(), ArrayConstraints::exactly(4));
    let blocks = ArrayConstraints {
        min_length: constraints.min_length / 4,
        max_length: constraints.max_length / 4,
        size: constraints.size,
    };
    array(block, blocks).map(chunks_to_string, |s: &String| string_to_chunks(s, 4))
}
