//! Fuzz target: AuctionLedger action robustness
//!
//! Feeds structurally-valid-but-random action sequences to the ledger.
//! Verifies the ledger never panics and always returns Ok/Err gracefully,
//! and that accepted bids keep the strict monotonicity invariant.
//!
//! Run: cargo +nightly fuzz run fuzz_auction_actions

#![no_main]
use arbitrary::Arbitrary;
use auction_core::{AuctionLedger, CallContext, Deposit, NATIVE_TOKEN_ID};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum FuzzAction {
    Create {
        caller_idx: u8,
        reserve_price: u128,
        end_offset_ms: u32,
        name_len: u8,
        num_tokens: u128,
        attach_amount: u128,
        attach_native: bool,
    },
    Bid {
        caller_idx: u8,
        auction_idx: u8,
        offered_price: u128,
        attach_amount: u128,
        attach_native: bool,
    },
    Settle {
        caller_idx: u8,
        auction_idx: u8,
        with_deposit: bool,
    },
    AdvanceTime {
        delta_ms: u32,
    },
    Query {
        auction_idx: u8,
    },
}

#[derive(Arbitrary, Debug)]
struct FuzzInput {
    actions: Vec<FuzzAction>,
}

const TEST_TOKEN: &str = "tti_0a1b2c3d4e5f6a7b8c9d0e1f";

fn caller(idx: u8) -> String {
    format!("acc_fuzz{}", idx % 8)
}

fuzz_target!(|input: FuzzInput| {
    let mut ledger = AuctionLedger::new();
    let mut now_ms: u64 = 1_700_000_000_000;
    let mut ids: Vec<String> = Vec::new();
    let mut last_accepted: std::collections::BTreeMap<String, u128> = Default::default();

    // Bound the run (prevent OOM from huge action vectors)
    for action in input.actions.iter().take(64) {
        match action {
            FuzzAction::Create {
                caller_idx,
                reserve_price,
                end_offset_ms,
                name_len,
                num_tokens,
                attach_amount,
                attach_native,
            } => {
                let name = "n".repeat(*name_len as usize % 100);
                let token = if *attach_native { NATIVE_TOKEN_ID } else { TEST_TOKEN };
                let ctx = CallContext {
                    caller: caller(*caller_idx),
                    now_ms,
                    deposit: Some(Deposit {
                        token_id: token.to_string(),
                        amount: *attach_amount,
                    }),
                };
                // Must NEVER panic — only Ok() or Err()
                if let Ok((id, _)) = ledger.create_auction(
                    &ctx,
                    *reserve_price,
                    now_ms.saturating_add(*end_offset_ms as u64),
                    &name,
                    TEST_TOKEN,
                    *num_tokens,
                ) {
                    ids.push(id);
                }
            }
            FuzzAction::Bid {
                caller_idx,
                auction_idx,
                offered_price,
                attach_amount,
                attach_native,
            } => {
                let id = match ids.get(*auction_idx as usize % ids.len().max(1)) {
                    Some(id) => id.clone(),
                    None => "missing".to_string(),
                };
                let token = if *attach_native { NATIVE_TOKEN_ID } else { TEST_TOKEN };
                let ctx = CallContext {
                    caller: caller(*caller_idx),
                    now_ms,
                    deposit: Some(Deposit {
                        token_id: token.to_string(),
                        amount: *attach_amount,
                    }),
                };
                if ledger.bid(&ctx, &id, *offered_price).is_ok() {
                    // Accepted bids must strictly increase per auction.
                    if let Some(prev) = last_accepted.get(&id) {
                        assert!(offered_price > prev, "bid monotonicity violated");
                    }
                    last_accepted.insert(id, *offered_price);
                }
            }
            FuzzAction::Settle {
                caller_idx,
                auction_idx,
                with_deposit,
            } => {
                let id = match ids.get(*auction_idx as usize % ids.len().max(1)) {
                    Some(id) => id.clone(),
                    None => "missing".to_string(),
                };
                let ctx = CallContext {
                    caller: caller(*caller_idx),
                    now_ms,
                    deposit: with_deposit.then(|| Deposit {
                        token_id: NATIVE_TOKEN_ID.to_string(),
                        amount: 1,
                    }),
                };
                let _ = ledger.settle(&ctx, &id);
            }
            FuzzAction::AdvanceTime { delta_ms } => {
                now_ms = now_ms.saturating_add(*delta_ms as u64);
            }
            FuzzAction::Query { auction_idx } => {
                if let Some(id) = ids.get(*auction_idx as usize % ids.len().max(1)) {
                    if let Ok(auction) = ledger.get_auction(id) {
                        let _ = auction.abi_row();
                    }
                }
            }
        }
    }
});
