//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random log inputs that maintain the
//! log's invariants.

use proptest::prelude::*;

/// Strategy for valid offsets (offsets start at 1).
pub fn offset_strategy() -> impl Strategy<Value = u64> {
    prop_oneof![1u64..=1_000, 1u64.., Just(u64::MAX)]
}

/// Strategy for payloads (arbitrary bytes, including empty).
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..1024)
}

/// Strategy for valid log prefixes, optionally nested.
pub fn prefix_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::string::string_regex("[a-z][a-z0-9_-]{0,15}").expect("Invalid regex"),
        1..4,
    )
    .prop_map(|segments| segments.join("/"))
}

/// Strategy for a set of committed offsets, possibly with gaps.
pub fn offset_set_strategy() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::btree_set(1u64..200, 1..40).prop_map(|set| set.into_iter().collect())
}
