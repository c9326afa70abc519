// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// PROPERTY-BASED TESTS — auction-core
//
// These tests verify invariants that MUST hold for ALL possible inputs.
// proptest generates thousands of random inputs per property.
//
// ZERO production code changes — this is a #[cfg(test)] integration test.
// Run: cargo test --release -p auction-core --test prop_auction
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use auction_core::{
    AuctionError, AuctionLedger, AuctionStatus, CallContext, Deposit, Transfer, NATIVE_TOKEN_ID,
};
use proptest::prelude::*;

const TEST_TOKEN: &str = "tti_0a1b2c3d4e5f6a7b8c9d0e1f";
const DAY_MS: u64 = 86_400_000;
const T0: u64 = 1_700_000_000_000;

fn ctx(caller: &str, now_ms: u64, deposit: Option<(&str, u128)>) -> CallContext {
    CallContext {
        caller: caller.to_string(),
        now_ms,
        deposit: deposit.map(|(token_id, amount)| Deposit {
            token_id: token_id.to_string(),
            amount,
        }),
    }
}

fn open_auction(ledger: &mut AuctionLedger, seller: &str, reserve: u128, amount: u128) -> String {
    let (id, _) = ledger
        .create_auction(
            &ctx(seller, T0, Some((TEST_TOKEN, amount))),
            reserve,
            T0 + DAY_MS,
            "prop_auction",
            TEST_TOKEN,
            amount,
        )
        .expect("creation preconditions hold by construction");
    id
}

// ─────────────────────────────────────────────────────────────────
// ID UNIQUENESS
// ─────────────────────────────────────────────────────────────────

proptest! {
    /// PROPERTY: every create returns a distinct id, across sellers and
    /// regardless of chain time collisions.
    #[test]
    fn prop_ids_unique(
        sellers in proptest::collection::vec("acc_[a-z]{4,12}", 1..40),
    ) {
        let mut ledger = AuctionLedger::new();
        let mut seen = std::collections::BTreeSet::new();
        for seller in &sellers {
            let id = open_auction(&mut ledger, seller, 1, 1);
            prop_assert!(seen.insert(id), "auction id reused");
        }
        prop_assert_eq!(ledger.auction_count(), sellers.len());
    }
}

// ─────────────────────────────────────────────────────────────────
// BID MONOTONICITY
// ─────────────────────────────────────────────────────────────────

proptest! {
    /// PROPERTY: the sequence of ACCEPTED bid prices is strictly
    /// increasing and never below the reserve, for any offered sequence.
    #[test]
    fn prop_accepted_bids_strictly_increase(
        reserve in 1u128..=1_000_000,
        offers in proptest::collection::vec(0u128..=2_000_000, 0..60),
    ) {
        let mut ledger = AuctionLedger::new();
        let id = open_auction(&mut ledger, "acc_seller", reserve, 100);

        let mut accepted = Vec::new();
        for (i, offer) in offers.iter().enumerate() {
            let bidder = format!("acc_bidder{}", i % 5);
            let result = ledger.bid(
                &ctx(&bidder, T0 + 1 + i as u64, Some((NATIVE_TOKEN_ID, *offer))),
                &id,
                *offer,
            );
            if result.is_ok() {
                accepted.push(*offer);
            }
        }

        for pair in accepted.windows(2) {
            prop_assert!(pair[1] > pair[0], "accepted prices must strictly increase");
        }
        for price in &accepted {
            prop_assert!(*price >= reserve, "accepted price below reserve");
        }
        // The ledger's view agrees with the last accepted offer.
        let expected = accepted.last().copied().unwrap_or(0);
        prop_assert_eq!(ledger.get_auction(&id).unwrap().highest_price(), expected);
    }
}

// ─────────────────────────────────────────────────────────────────
// ESCROW CONSERVATION
// ─────────────────────────────────────────────────────────────────

proptest! {
    /// PROPERTY: across any bid sequence plus settlement, value in equals
    /// value out for both the auctioned token and the native currency.
    /// The contract's net holdings return to zero once settled.
    #[test]
    fn prop_escrow_conserved_through_settlement(
        reserve in 1u128..=100_000,
        amount in 1u128..=1_000_000_000,
        offers in proptest::collection::vec(1u128..=200_000, 0..30),
    ) {
        let mut ledger = AuctionLedger::new();
        let id = open_auction(&mut ledger, "acc_seller", reserve, amount);

        // Token side: `amount` entered at creation.
        let mut native_in: u128 = 0;
        let mut native_out: u128 = 0;
        let mut token_out: u128 = 0;

        for (i, offer) in offers.iter().enumerate() {
            let bidder = format!("acc_bidder{}", i % 3);
            let attach = offer + (i as u128 % 7); // sometimes overfund
            let result = ledger.bid(
                &ctx(&bidder, T0 + 1 + i as u64, Some((NATIVE_TOKEN_ID, attach))),
                &id,
                *offer,
            );
            if let Ok(receipt) = result {
                native_in += attach;
                for t in &receipt.transfers {
                    prop_assert_eq!(t.token_id.as_str(), NATIVE_TOKEN_ID);
                    native_out += t.amount;
                }
            }
        }

        let receipt = ledger
            .settle(&ctx("acc_anyone", T0 + DAY_MS, None), &id)
            .unwrap();
        for Transfer { token_id, amount: moved, .. } in &receipt.transfers {
            if token_id == TEST_TOKEN {
                token_out += moved;
            } else {
                native_out += moved;
            }
        }

        prop_assert_eq!(token_out, amount, "escrowed tokens not fully released");
        prop_assert_eq!(native_in, native_out, "native funds created or destroyed");
    }

    /// PROPERTY: settling with no bids returns exactly the escrow to the
    /// seller; settling with bids pays the winner and the seller exactly.
    #[test]
    fn prop_settlement_transfers_exact(
        reserve in 1u128..=100_000,
        amount in 1u128..=1_000_000_000,
        winning in prop::option::of(100_000u128..=200_000),
    ) {
        let mut ledger = AuctionLedger::new();
        let id = open_auction(&mut ledger, "acc_seller", reserve, amount);

        if let Some(price) = winning {
            ledger
                .bid(&ctx("acc_winner", T0 + 1, Some((NATIVE_TOKEN_ID, price))), &id, price)
                .unwrap();
        }

        let receipt = ledger
            .settle(&ctx("acc_anyone", T0 + DAY_MS, None), &id)
            .unwrap();

        match winning {
            None => {
                prop_assert_eq!(receipt.transfers.len(), 1);
                prop_assert_eq!(&receipt.transfers[0], &Transfer {
                    to: "acc_seller".to_string(),
                    token_id: TEST_TOKEN.to_string(),
                    amount,
                });
            }
            Some(price) => {
                prop_assert_eq!(receipt.transfers.len(), 2);
                prop_assert_eq!(&receipt.transfers[0], &Transfer {
                    to: "acc_winner".to_string(),
                    token_id: TEST_TOKEN.to_string(),
                    amount,
                });
                prop_assert_eq!(&receipt.transfers[1], &Transfer {
                    to: "acc_seller".to_string(),
                    token_id: NATIVE_TOKEN_ID.to_string(),
                    amount: price,
                });
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// TERMINAL STATE
// ─────────────────────────────────────────────────────────────────

proptest! {
    /// PROPERTY: the second settle always fails with InvalidState and
    /// leaves the auction byte-for-byte unchanged.
    #[test]
    fn prop_settle_idempotent_failure(
        reserve in 1u128..=100_000,
        later in 0u64..=DAY_MS,
        with_bid in any::<bool>(),
    ) {
        let mut ledger = AuctionLedger::new();
        let id = open_auction(&mut ledger, "acc_seller", reserve, 42);
        if with_bid {
            ledger
                .bid(&ctx("acc_bidder", T0 + 1, Some((NATIVE_TOKEN_ID, reserve))), &id, reserve)
                .unwrap();
        }
        ledger.settle(&ctx("acc_anyone", T0 + DAY_MS, None), &id).unwrap();

        let snapshot = ledger.get_auction(&id).unwrap().clone();
        let err = ledger
            .settle(&ctx("acc_other", T0 + DAY_MS + later, None), &id)
            .unwrap_err();
        prop_assert!(matches!(err, AuctionError::InvalidState(_)));
        prop_assert_eq!(ledger.get_auction(&id).unwrap(), &snapshot);
        prop_assert_eq!(snapshot.status, AuctionStatus::Settled);
    }

    /// PROPERTY: rejected creations never mutate the arena.
    #[test]
    fn prop_rejected_create_no_state_change(
        reserve in prop::option::of(1u128..=100_000),
        amount in prop::option::of(1u128..=100_000),
    ) {
        // None means "send the invalid zero value" for that field.
        let mut ledger = AuctionLedger::new();
        let reserve = reserve.unwrap_or(0);
        let amount = amount.unwrap_or(0);
        prop_assume!(reserve == 0 || amount == 0);

        let result = ledger.create_auction(
            &ctx("acc_seller", T0, Some((TEST_TOKEN, amount))),
            reserve,
            T0 + DAY_MS,
            "prop_auction",
            TEST_TOKEN,
            amount,
        );
        prop_assert!(matches!(result, Err(AuctionError::InvalidParameter(_))));
        prop_assert_eq!(ledger.auction_count(), 0);
    }
}
