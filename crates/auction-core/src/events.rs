// SPDX-License-Identifier: AGPL-3.0-only
//! # Auction event log
//!
//! One structured record per committed state transition, appended by the
//! chain runtime at the block height the action landed in. Consumers
//! (wallets, explorers, the test harness) read the log through the
//! `(eventName, fromHeight, toHeight)` range query; there is no
//! single-snapshot read path. Failed actions append nothing.

use serde::{Deserialize, Serialize};

use crate::u128_str;

/// Standard event types emitted by the auction contract.
/// Nodes index these for wallet and explorer query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AuctionEvent {
    /// Emitted once per created auction, carrying the full fixed state.
    AuctionCreated {
        id: String,
        token_id: String,
        seller: String,
        name: String,
        #[serde(with = "u128_str")]
        reserve_price: u128,
        end_time_ms: u64,
        #[serde(with = "u128_str")]
        num_tokens: u128,
    },
    /// Emitted for every bid that became the new highest.
    BidAccepted {
        id: String,
        bidder: String,
        #[serde(with = "u128_str")]
        price: u128,
    },
    /// Emitted exactly once per auction. `winner` is absent and `price`
    /// zero when the auction closed without a valid bid.
    AuctionSettled {
        id: String,
        winner: Option<String>,
        #[serde(with = "u128_str")]
        price: u128,
    },
}

impl AuctionEvent {
    /// Name used by the range query, matching the serde tag.
    pub fn event_name(&self) -> &'static str {
        match self {
            AuctionEvent::AuctionCreated { .. } => "AuctionCreated",
            AuctionEvent::BidAccepted { .. } => "BidAccepted",
            AuctionEvent::AuctionSettled { .. } => "AuctionSettled",
        }
    }

    /// Auction id the event belongs to.
    pub fn auction_id(&self) -> &str {
        match self {
            AuctionEvent::AuctionCreated { id, .. } => id,
            AuctionEvent::BidAccepted { id, .. } => id,
            AuctionEvent::AuctionSettled { id, .. } => id,
        }
    }
}

/// An event as stored: the emitting action's block height and timestamp
/// plus the event body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventRecord {
    pub height: u64,
    pub timestamp_ms: u64,
    pub event: AuctionEvent,
}

/// Append-only event store. Heights are non-decreasing because appends
/// follow the chain's serialized commit order; the log itself never
/// sorts or rewrites.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    records: Vec<EventRecord>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Append all events of one committed action at its block height.
    pub fn append(&mut self, height: u64, timestamp_ms: u64, events: Vec<AuctionEvent>) {
        for event in events {
            self.records.push(EventRecord {
                height,
                timestamp_ms,
                event,
            });
        }
    }

    /// Records named `event_name` with `from_height <= height <= to_height`.
    /// A `to_height` of 0 means no upper bound: historic clients pass 0
    /// for both ends to scan the whole log.
    pub fn query(&self, event_name: &str, from_height: u64, to_height: u64) -> Vec<&EventRecord> {
        self.records
            .iter()
            .filter(|r| {
                r.event.event_name() == event_name
                    && r.height >= from_height
                    && (to_height == 0 || r.height <= to_height)
            })
            .collect()
    }
}
