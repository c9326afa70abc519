//! Fuzz target: EventLog range query robustness
//!
//! Appends random records and queries random ranges. The query must never
//! panic and must only ever return records inside the requested range.
//!
//! Run: cargo +nightly fuzz run fuzz_event_query

#![no_main]
use arbitrary::Arbitrary;
use auction_core::events::{AuctionEvent, EventLog};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct FuzzQueryInput {
    heights: Vec<(u16, u8)>,
    from_height: u64,
    to_height: u64,
    name_idx: u8,
}

const NAMES: [&str; 4] = ["AuctionCreated", "BidAccepted", "AuctionSettled", "NoSuchEvent"];

fuzz_target!(|input: FuzzQueryInput| {
    let mut log = EventLog::new();
    for (height, price) in input.heights.iter().take(256) {
        log.append(
            *height as u64,
            1_700_000_000_000 + *height as u64,
            vec![AuctionEvent::BidAccepted {
                id: "fuzz".to_string(),
                bidder: "acc_fuzz".to_string(),
                price: *price as u128,
            }],
        );
    }

    let name = NAMES[input.name_idx as usize % NAMES.len()];
    let hits = log.query(name, input.from_height, input.to_height);
    for record in hits {
        assert!(record.height >= input.from_height);
        if input.to_height > 0 {
            assert!(record.height <= input.to_height);
        }
        assert_eq!(record.event.event_name(), name);
    }
});
