//! Property tests: parsing accepts every spelling, relocation conserves stock.

use proptest::prelude::*;

use rackslot::store::MemoryStore;
use rackslot::{parse_location, Location, WarehouseConfig};
use rackslot_testkit::generators::{
    location, location_pair, location_text, slot_records, valid_quantity, valid_slot_records,
};
use rackslot_testkit::TestFixture;

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("runtime")
        .block_on(future)
}

proptest! {
    #[test]
    fn any_spelling_parses((text, shelf, level) in location_text()) {
        let parsed = parse_location(&text).unwrap();
        prop_assert_eq!(parsed.shelf.number(), shelf);
        prop_assert_eq!(parsed.level.map(|l| l.get()), level);
    }

    #[test]
    fn canonical_forms_round_trip(loc in location()) {
        let parsed = parse_location(&loc.to_string()).unwrap();
        prop_assert_eq!(parsed.location(), Some(loc));
        prop_assert_eq!(Location::from_slot_id(&loc.slot_id()).unwrap(), loc);
    }

    // Target records are all valid: a corrupt record there could share a
    // key with a moved entry and absorb part of its quantity.
    #[test]
    fn relocation_conserves_quantity(
        (source, target) in location_pair(),
        source_records in slot_records(12),
        target_records in valid_slot_records(4),
        max_batch in 3usize..=20,
    ) {
        let expected_target = valid_quantity(&source_records) + valid_quantity(&target_records);
        let store = MemoryStore::new().with_max_batch_size(max_batch);
        for raw in source_records.iter().cloned() {
            store.put_raw(source, raw).unwrap();
        }
        for raw in target_records.iter().cloned() {
            store.put_raw(target, raw).unwrap();
        }
        let fx = TestFixture::with_store(store, WarehouseConfig::default());

        let (report, index) = block_on(async {
            let report = fx.warehouse.relocate(source, target).await.unwrap();
            (report, fx.snapshot().await.unwrap())
        });

        prop_assert_eq!(report.moved_types, source_records.len());
        prop_assert_eq!(report.moved_quantity, valid_quantity(&source_records));
        prop_assert!(index.entries_at(&source).is_empty());
        prop_assert_eq!(index.stats_at(&target).quantity, expected_target);
    }
}
