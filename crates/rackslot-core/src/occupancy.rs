//! Occupancy index: an immutable snapshot of what sits where.
//!
//! The index is built from a feed of persisted records and handed to the
//! resolver as an explicit parameter. Nothing mutates a built index; a
//! newer view of the store is a new index.

use std::collections::BTreeMap;

use crate::entry::{InventoryEntry, RawEntry};
use crate::location::{Level, Location, Shelf};
use crate::validation::{classify_entry, EntryRecord};

/// Summary of one slot, as shown next to a scanned location.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotStats {
    /// Distinct item types.
    pub types: usize,
    /// Summed quantity over all types.
    pub quantity: u64,
}

/// Map from location to the entries currently stored there.
///
/// Locations with no entries are absent from the map; [`entries_at`]
/// returns an empty slice for them.
///
/// [`entries_at`]: OccupancyIndex::entries_at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OccupancyIndex {
    slots: BTreeMap<Location, Vec<InventoryEntry>>,
    /// Corrupt records seen while building. Kept for diagnostics only.
    skipped: usize,
}

impl OccupancyIndex {
    /// An index with no stock anywhere.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw feed records. Corrupt records are skipped and counted.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a (Location, RawEntry)>) -> Self {
        let mut index = Self::new();
        for (location, raw) in records {
            match classify_entry(raw) {
                EntryRecord::Valid(entry) => index.push(*location, entry),
                EntryRecord::Corrupt(_) => index.skipped += 1,
            }
        }
        index
    }

    fn push(&mut self, location: Location, entry: InventoryEntry) {
        self.slots.entry(location).or_default().push(entry);
    }

    /// Entries at a location, in feed order.
    pub fn entries_at(&self, location: &Location) -> &[InventoryEntry] {
        self.slots.get(location).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_occupied(&self, location: &Location) -> bool {
        !self.entries_at(location).is_empty()
    }

    pub fn stats_at(&self, location: &Location) -> SlotStats {
        let entries = self.entries_at(location);
        SlotStats {
            types: entries.len(),
            quantity: entries.iter().map(|e| e.quantity).sum(),
        }
    }

    /// Occupied levels of a shelf, bottom first.
    pub fn occupied_levels(&self, shelf: Shelf) -> Vec<Level> {
        self.slots
            .iter()
            .filter(|(location, entries)| location.shelf == shelf && !entries.is_empty())
            .map(|(location, _)| location.level)
            .collect()
    }

    /// All occupied locations, in shelf/level order.
    pub fn locations(&self) -> impl Iterator<Item = &Location> {
        self.slots.keys()
    }

    /// Number of occupied locations.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn total_quantity(&self) -> u64 {
        self.slots.values().flatten().map(|e| e.quantity).sum()
    }

    /// How many corrupt records were left out of this snapshot.
    pub fn skipped_records(&self) -> usize {
        self.skipped
    }
}

impl FromIterator<(Location, InventoryEntry)> for OccupancyIndex {
    fn from_iter<I: IntoIterator<Item = (Location, InventoryEntry)>>(iter: I) -> Self {
        let mut index = Self::new();
        for (location, entry) in iter {
            index.push(location, entry);
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemKey;

    fn entry(key: &str, quantity: u64) -> InventoryEntry {
        InventoryEntry::new(ItemKey::new(key).unwrap(), quantity)
    }

    #[test]
    fn test_empty_location_yields_empty_slice() {
        let index = OccupancyIndex::new();
        assert!(index.entries_at(&Location::at(1, 1)).is_empty());
        assert!(!index.is_occupied(&Location::at(1, 1)));
        assert_eq!(index.stats_at(&Location::at(1, 1)), SlotStats::default());
    }

    #[test]
    fn test_stats_and_levels() {
        let index: OccupancyIndex = vec![
            (Location::at(3, 4), entry("A", 3)),
            (Location::at(3, 4), entry("B", 1)),
            (Location::at(3, 1), entry("C", 9)),
            (Location::at(4, 2), entry("D", 2)),
        ]
        .into_iter()
        .collect();

        assert_eq!(index.stats_at(&Location::at(3, 4)), SlotStats { types: 2, quantity: 4 });
        assert_eq!(index.occupied_levels(Shelf::new(3)), vec![Level::new(1), Level::new(4)]);
        assert_eq!(index.len(), 3);
        assert_eq!(index.total_quantity(), 15);
    }

    #[test]
    fn test_from_records_skips_corrupt() {
        let good = RawEntry::from_entry(&entry("A", 2));
        let bad = RawEntry {
            doc_id: "B".into(),
            item_key: Some("B".into()),
            quantity: Some(0),
            ..Default::default()
        };
        let records = vec![(Location::at(1, 1), good), (Location::at(1, 2), bad)];

        let index = OccupancyIndex::from_records(&records);
        assert!(index.is_occupied(&Location::at(1, 1)));
        assert!(!index.is_occupied(&Location::at(1, 2)));
        assert_eq!(index.skipped_records(), 1);
    }
}
