//! Bidirectional transforms used by mapped arbitraries.
//!
//! Every pair here satisfies `unmap(map(x)) == x` on the map's image; the
//! partial unmappers refuse values outside the image with an [`UnmapError`]
//! so shrink-without-context can recover an internal representation or bail
//! out cleanly.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::UnmapError;

/// Join characters into a string
pub fn chars_to_string(chars: &Vec<char>) -> String {
    chars.iter().collect()
}

/// Split a string into its characters; total inverse of [`chars_to_string`]
pub fn string_to_chars(s: &String) -> Result<Vec<char>, UnmapError> {
    Ok(s.chars().collect())
}

/// Concatenate fixed-width chunks into a string
pub fn chunks_to_string(chunks: &Vec<String>) -> String {
    chunks.concat()
}

/// Split a string into chunks of `width` characters.
///
/// Refuses strings whose character count is not a multiple of `width`; such
/// strings cannot have come from a chunked builder.
pub fn string_to_chunks(s: &str, width: usize) -> Result<Vec<String>, UnmapError> {
    let chars: Vec<char> = s.chars().collect();
    if width == 0 || chars.len() % width != 0 {
        return Err(UnmapError::new(format!(
            "length {} is not a multiple of {}",
            chars.len(),
            width
        )));
    }
    Ok(chars.chunks(width).map(|chunk| chunk.iter().collect()).collect())
}

/// Collect key-value entries into an ordered map
pub fn entries_to_btree_map<K: Ord + Clone, V: Clone>(entries: &Vec<(K, V)>) -> BTreeMap<K, V> {
    entries.iter().cloned().collect()
}

/// Read an ordered map back into its canonical (sorted) entry list
pub fn btree_map_to_entries<K: Ord + Clone, V: Clone>(
    map: &BTreeMap<K, V>,
) -> Result<Vec<(K, V)>, UnmapError> {
    Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}

/// Collect items into an ordered set
pub fn items_to_btree_set<T: Ord + Clone>(items: &Vec<T>) -> BTreeSet<T> {
    items.iter().cloned().collect()
}

/// Read an ordered set back into its canonical (sorted) item list
pub fn btree_set_to_items<T: Ord + Clone>(set: &BTreeSet<T>) -> Result<Vec<T>, UnmapError> {
    Ok(set.iter().cloned().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_chars_round_trip() {
        for s in ["", "abc", "héllo wörld", "多字节"] {
            let s = s.to_string();
            let chars = string_to_chars(&s).unwrap();
            assert_eq!(chars_to_string(&chars), s);
        }
    }

    #[test]
    fn test_chunks_round_trip() {
        let chunks = vec!["abcd".to_string(), "wxyz".to_string()];
        let joined = chunks_to_string(&chunks);
        assert_eq!(joined, "abcdwxyz");
        assert_eq!(string_to_chunks(&joined, 4).unwrap(), chunks);
    }

    #[test]
    fn test_chunks_refuse_ragged_lengths() {
        assert!(string_to_chunks("abcde", 4).is_err());
        assert!(string_to_chunks("abcd", 0).is_err());
        assert_eq!(string_to_chunks("", 4).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_chunks_count_characters_not_bytes() {
        // Four characters, more than four bytes
        assert!(string_to_chunks("déjà", 4).is_ok());
    }

    #[test]
    fn test_map_entries_round_trip() {
        let entries = vec![(1, "a"), (3, "b"), (2, "c")];
        let map = entries_to_btree_map(&entries);
        let back = btree_map_to_entries(&map).unwrap();
        assert_eq!(back, vec![(1, "a"), (2, "c"), (3, "b")]);
    }

    #[test]
    fn test_set_items_round_trip() {
        let items = vec![4, 1, 3];
        let set = items_to_btree_set(&items);
        assert_eq!(btree_set_to_items(&set).unwrap(), vec![1, 3, 4]);
    }
}
