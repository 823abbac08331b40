//! Proptest generators for property-based testing.

use proptest::prelude::*;

use rackslot_core::{Grid, Location, RawEntry};

/// A shelf number on the default grid.
pub fn shelf_number() -> impl Strategy<Value = u8> {
    1u8..=Grid::DEFAULT.shelves
}

/// A level rank on the default grid.
pub fn level_rank() -> impl Strategy<Value = u8> {
    1u8..=Grid::DEFAULT.levels
}

/// A location on the default grid.
pub fn location() -> impl Strategy<Value = Location> {
    (shelf_number(), level_rank()).prop_map(|(shelf, level)| Location::at(shelf, level))
}

/// Two distinct locations on the default grid.
pub fn location_pair() -> impl Strategy<Value = (Location, Location)> {
    (location(), location()).prop_filter("source and target must differ", |(a, b)| a != b)
}

/// Operator text for a shelf and optional level, in any accepted spelling:
/// either case, an optional `-`, `_` or space separator, and padding.
pub fn location_text() -> impl Strategy<Value = (String, u8, Option<u8>)> {
    (
        shelf_number(),
        proptest::option::of(0u8..=9),
        any::<bool>(),
        prop_oneof![Just(""), Just("-"), Just("_"), Just(" ")],
        prop_oneof![Just(""), Just(" "), Just("  ")],
    )
        .prop_map(|(shelf, level, upper, sep, pad)| {
            let (c, l) = if upper { ('C', 'L') } else { ('c', 'l') };
            let text = match level {
                Some(level) => format!("{pad}{c}{shelf}{sep}{l}{level}{pad}"),
                None => format!("{pad}{c}{shelf}{pad}"),
            };
            (text, shelf, level)
        })
}

/// An item key made of characters that survive sanitizing.
pub fn item_key() -> impl Strategy<Value = String> {
    "[A-Z]{1,3}-[0-9]{1,4}".prop_map(String::from)
}

/// A valid record with the given key.
pub fn valid_raw(key: String) -> impl Strategy<Value = RawEntry> {
    (1i64..=1_000, proptest::option::of(0i64..=1_700_000_000_000)).prop_map(
        move |(quantity, created_at)| RawEntry {
            doc_id: key.clone(),
            item_key: Some(key.clone()),
            quantity: Some(quantity),
            item_type: Some("steg".into()),
            created_at,
            ..Default::default()
        },
    )
}

/// A record a careless writer might leave behind.
pub fn corrupt_raw(key: String) -> impl Strategy<Value = RawEntry> {
    prop_oneof![Just(None), (-50i64..=0).prop_map(Some)].prop_map(move |quantity| RawEntry {
        doc_id: key.clone(),
        item_key: Some(key.clone()),
        quantity,
        ..Default::default()
    })
}

/// The records of one slot: unique keys, mostly valid, some corrupt.
pub fn slot_records(max: usize) -> impl Strategy<Value = Vec<RawEntry>> {
    proptest::collection::btree_set(item_key(), 1..=max)
        .prop_flat_map(|keys| {
            keys.into_iter()
                .map(|key| {
                    prop_oneof![
                        4 => valid_raw(key.clone()),
                        1 => corrupt_raw(key),
                    ]
                })
                .collect::<Vec<_>>()
        })
}

/// The records of one slot, all valid.
pub fn valid_slot_records(max: usize) -> impl Strategy<Value = Vec<RawEntry>> {
    proptest::collection::btree_set(item_key(), 0..=max).prop_flat_map(|keys| {
        keys.into_iter()
            .map(valid_raw)
            .collect::<Vec<_>>()
    })
}

/// Sum of the valid quantities in a set of records.
pub fn valid_quantity(records: &[RawEntry]) -> u64 {
    records
        .iter()
        .filter_map(|r| r.quantity)
        .filter(|&q| q > 0)
        .map(|q| q as u64)
        .sum()
}
