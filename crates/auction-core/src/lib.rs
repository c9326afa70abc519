// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// TOKEN AUCTION - CORE LEDGER
//
// Auction settlement state machine: createAuction, bid, settle, getAuction.
// Auctions live in an arena keyed by a minted identifier and move through a
// single forward transition Open -> Settled. The ledger never moves value
// itself: every action returns transfer instructions that the chain runtime
// MUST apply atomically with the state commit.
// All financial arithmetic uses u128 atomic units (no floating-point).
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Event log: append-only records with height-range query
pub mod events;

use crate::events::AuctionEvent;

/// Token id of the native currency. Bids attach value in this token;
/// the auctioned token is always a distinct, registry-issued token type.
pub const NATIVE_TOKEN_ID: &str = "tti_5649544520544f4b454e6e40";

/// Maximum auction name length in bytes
pub const MAX_AUCTION_NAME_LEN: usize = 64;

// ─────────────────────────────────────────────────────────────────
// u128 ↔ String serialization (JSON doesn't support 128-bit integers)
// ─────────────────────────────────────────────────────────────────

pub(crate) mod u128_str {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(val: &u128, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&val.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u128, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<u128>().map_err(serde::de::Error::custom)
    }
}

// ─────────────────────────────────────────────────────────────────
// CALL CONTEXT (ambient transaction state, passed explicitly)
// ─────────────────────────────────────────────────────────────────

/// Value attached to a call by the chain runtime. The runtime holds the
/// amount in the contract account while the action executes; a rejected
/// action leaves it with the caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Deposit {
    pub token_id: String,
    #[serde(with = "u128_str")]
    pub amount: u128,
}

/// Per-call transaction context supplied by the chain runtime.
///
/// `caller` is the verified sender address (the node checks the block
/// signature before dispatch). `now_ms` is the block timestamp in epoch
/// milliseconds. All validators MUST use the SAME timestamp for the same
/// call so that deadline comparisons are deterministic across the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallContext {
    pub caller: String,
    pub now_ms: u64,
    #[serde(default)]
    pub deposit: Option<Deposit>,
}

/// Transfer instruction produced by an action. The ledger's own state is
/// already updated when these are returned; the chain runtime MUST move
/// the amounts out of the contract account in the same commit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transfer {
    pub to: String,
    pub token_id: String,
    #[serde(with = "u128_str")]
    pub amount: u128,
}

/// Result of a successful state-changing action: the records to append to
/// the event log and the value movements to apply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionReceipt {
    pub events: Vec<AuctionEvent>,
    pub transfers: Vec<Transfer>,
}

// ─────────────────────────────────────────────────────────────────
// AUCTION STATE
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AuctionStatus {
    Open,
    /// Terminal. Settled auctions are kept for audit queries and are
    /// never removed or reopened.
    Settled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Bid {
    pub bidder: String,
    #[serde(with = "u128_str")]
    pub price: u128,
}

/// One auction. Every field except `status` and `highest_bid` is fixed at
/// creation time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Auction {
    pub id: String,
    pub seller: String,
    pub name: String,
    /// Minimum acceptable unit price, always > 0
    #[serde(with = "u128_str")]
    pub reserve_price: u128,
    /// Bidding deadline, epoch milliseconds
    pub end_time_ms: u64,
    /// Quantity of `token_id` escrowed at creation
    #[serde(with = "u128_str")]
    pub num_tokens: u128,
    pub token_id: String,
    pub status: AuctionStatus,
    pub highest_bid: Option<Bid>,
}

impl Auction {
    /// Current highest bid price, or 0 when no bid has been accepted.
    pub fn highest_price(&self) -> u128 {
        self.highest_bid.as_ref().map(|b| b.price).unwrap_or(0)
    }

    /// Projection in the public query ABI order:
    /// name, seller, reserve price, end time, token quantity, token id,
    /// current highest price ("0" when no bid). All numbers are decimal
    /// strings so the row survives JSON transport unchanged.
    pub fn abi_row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.seller.clone(),
            self.reserve_price.to_string(),
            self.end_time_ms.to_string(),
            self.num_tokens.to_string(),
            self.token_id.clone(),
            self.highest_price().to_string(),
        ]
    }
}

// ─────────────────────────────────────────────────────────────────
// ERRORS
// ─────────────────────────────────────────────────────────────────

/// Every precondition violation aborts the whole action: no state change,
/// no event, and the attached value stays with the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuctionError {
    /// Non-positive price/amount, past deadline, bad name or token id
    InvalidParameter(String),
    /// Unknown auction id
    NotFound(String),
    /// Action on a Settled auction, or settle before the deadline
    InvalidState(String),
    /// Bid price below reserve or not above the current highest
    InsufficientBid(String),
    /// Attached value doesn't match what the action declares
    EscrowMismatch(String),
}

impl std::fmt::Display for AuctionError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            AuctionError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            AuctionError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AuctionError::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            AuctionError::InsufficientBid(msg) => write!(f, "Insufficient bid: {}", msg),
            AuctionError::EscrowMismatch(msg) => write!(f, "Escrow mismatch: {}", msg),
        }
    }
}

impl std::error::Error for AuctionError {}

// ─────────────────────────────────────────────────────────────────
// AUCTION LEDGER
// ─────────────────────────────────────────────────────────────────

/// Arena of all auctions ever created, keyed by minted id.
///
/// The ledger executes inside the chain's serialized transaction model:
/// one action at a time, each all-or-nothing. No interior locking is
/// needed because no action suspends mid-way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionLedger {
    /// MAINNET: BTreeMap guarantees deterministic iteration and
    /// serialization across all validators.
    auctions: BTreeMap<String, Auction>,
    /// Per-seller creation counter, feeds the id mint. Never decremented,
    /// so a (seller, nonce) pair is used at most once.
    nonce: BTreeMap<String, u64>,
    /// Token id bids must attach. Fixed at construction.
    native_token_id: String,
}

impl Default for AuctionLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl AuctionLedger {
    pub fn new() -> Self {
        Self::with_native_token(NATIVE_TOKEN_ID)
    }

    /// Ledger bound to a non-default native currency (test networks).
    pub fn with_native_token(native_token_id: &str) -> Self {
        Self {
            auctions: BTreeMap::new(),
            nonce: BTreeMap::new(),
            native_token_id: native_token_id.to_string(),
        }
    }

    pub fn native_token_id(&self) -> &str {
        &self.native_token_id
    }

    pub fn auction_count(&self) -> usize {
        self.auctions.len()
    }

    pub fn auctions(&self) -> impl Iterator<Item = &Auction> {
        self.auctions.values()
    }

    /// Deterministic auction id via blake3(seller || nonce || chain time).
    /// Format: 32 hex chars. The per-seller nonce makes the hash input
    /// unique for every creation, so ids are never reused.
    fn mint_auction_id(&mut self, seller: &str, now_ms: u64) -> String {
        let nonce = self.nonce.entry(seller.to_string()).or_insert(0);
        let seq = *nonce;
        *nonce = nonce.saturating_add(1);

        let id_input = format!("{}:{}:{}", seller, seq, now_ms);
        let id_hash = blake3::hash(id_input.as_bytes());
        hex::encode(&id_hash.as_bytes()[0..16])
    }

    /// Open a new auction. The caller becomes the seller and must attach
    /// exactly `num_tokens` of `token_id` as escrow; the escrowed tokens
    /// are owned by the contract until settlement.
    ///
    /// Returns the minted id and a receipt with the creation record.
    pub fn create_auction(
        &mut self,
        ctx: &CallContext,
        reserve_price: u128,
        end_time_ms: u64,
        name: &str,
        token_id: &str,
        num_tokens: u128,
    ) -> Result<(String, ActionReceipt), AuctionError> {
        if reserve_price == 0 {
            return Err(AuctionError::InvalidParameter(
                "reserve price must be > 0".to_string(),
            ));
        }
        if end_time_ms <= ctx.now_ms {
            return Err(AuctionError::InvalidParameter(format!(
                "end time {} is not after chain time {}",
                end_time_ms, ctx.now_ms
            )));
        }
        if num_tokens == 0 {
            return Err(AuctionError::InvalidParameter(
                "escrowed amount must be > 0".to_string(),
            ));
        }
        if name.is_empty() || name.len() > MAX_AUCTION_NAME_LEN {
            return Err(AuctionError::InvalidParameter(format!(
                "name must be 1-{} bytes",
                MAX_AUCTION_NAME_LEN
            )));
        }
        if token_id.is_empty() {
            return Err(AuctionError::InvalidParameter(
                "token id is empty".to_string(),
            ));
        }
        // The attached value must be exactly the declared escrow.
        match &ctx.deposit {
            Some(d) if d.token_id == token_id && d.amount == num_tokens => {}
            Some(d) => {
                return Err(AuctionError::EscrowMismatch(format!(
                    "attached {} of {} but declared {} of {}",
                    d.amount, d.token_id, num_tokens, token_id
                )));
            }
            None => {
                return Err(AuctionError::EscrowMismatch(
                    "no value attached, expected the token escrow".to_string(),
                ));
            }
        }

        let id = self.mint_auction_id(&ctx.caller, ctx.now_ms);

        let auction = Auction {
            id: id.clone(),
            seller: ctx.caller.clone(),
            name: name.to_string(),
            reserve_price,
            end_time_ms,
            num_tokens,
            token_id: token_id.to_string(),
            status: AuctionStatus::Open,
            highest_bid: None,
        };
        self.auctions.insert(id.clone(), auction);

        let receipt = ActionReceipt {
            events: vec![AuctionEvent::AuctionCreated {
                id: id.clone(),
                token_id: token_id.to_string(),
                seller: ctx.caller.clone(),
                name: name.to_string(),
                reserve_price,
                end_time_ms,
                num_tokens,
            }],
            transfers: Vec::new(),
        };
        Ok((id, receipt))
    }

    /// Place a bid. The offered price must clear the reserve and strictly
    /// beat the current highest bid (equal prices are rejected, so there
    /// is never a tie to break). The previous leader is refunded in full
    /// in the same receipt; anything attached above the offered price goes
    /// straight back to the bidder, so the contract never holds more than
    /// the leading price.
    pub fn bid(
        &mut self,
        ctx: &CallContext,
        id: &str,
        offered_price: u128,
    ) -> Result<ActionReceipt, AuctionError> {
        let native = self.native_token_id.clone();
        let auction = self
            .auctions
            .get_mut(id)
            .ok_or_else(|| AuctionError::NotFound(format!("unknown auction id {}", id)))?;

        if auction.status != AuctionStatus::Open {
            return Err(AuctionError::InvalidState(format!(
                "auction {} is settled",
                id
            )));
        }
        if ctx.now_ms >= auction.end_time_ms {
            return Err(AuctionError::InvalidState(format!(
                "bidding closed at {} (chain time {})",
                auction.end_time_ms, ctx.now_ms
            )));
        }
        if offered_price < auction.reserve_price {
            return Err(AuctionError::InsufficientBid(format!(
                "price {} is below reserve {}",
                offered_price, auction.reserve_price
            )));
        }
        if let Some(prev) = &auction.highest_bid {
            if offered_price <= prev.price {
                return Err(AuctionError::InsufficientBid(format!(
                    "price {} does not beat current highest {}",
                    offered_price, prev.price
                )));
            }
        }
        let deposit = match &ctx.deposit {
            Some(d) => d,
            None => {
                return Err(AuctionError::EscrowMismatch(
                    "no funds attached to bid".to_string(),
                ));
            }
        };
        if deposit.token_id != native {
            return Err(AuctionError::EscrowMismatch(format!(
                "bid must attach the native currency, got {}",
                deposit.token_id
            )));
        }
        if deposit.amount < offered_price {
            return Err(AuctionError::EscrowMismatch(format!(
                "attached {} is less than offered price {}",
                deposit.amount, offered_price
            )));
        }

        // All preconditions hold. Refund the outgoing leader before the
        // new bid is recorded, and return any surplus immediately.
        let mut transfers = Vec::new();
        if let Some(prev) = &auction.highest_bid {
            transfers.push(Transfer {
                to: prev.bidder.clone(),
                token_id: native.clone(),
                amount: prev.price,
            });
        }
        let surplus = deposit.amount - offered_price;
        if surplus > 0 {
            transfers.push(Transfer {
                to: ctx.caller.clone(),
                token_id: native,
                amount: surplus,
            });
        }

        auction.highest_bid = Some(Bid {
            bidder: ctx.caller.clone(),
            price: offered_price,
        });

        Ok(ActionReceipt {
            events: vec![AuctionEvent::BidAccepted {
                id: id.to_string(),
                bidder: ctx.caller.clone(),
                price: offered_price,
            }],
            transfers,
        })
    }

    /// Settle an auction whose deadline has passed. Callable by anyone:
    /// permissionless settlement means the seller cannot stall the payout.
    ///
    /// With a bid: the escrowed tokens go to the winner and the winning
    /// price goes to the seller, in one receipt. Without: the tokens go
    /// back to the seller. Either way the auction becomes Settled and no
    /// further state change is ever accepted for it.
    pub fn settle(&mut self, ctx: &CallContext, id: &str) -> Result<ActionReceipt, AuctionError> {
        // Settlement consumes no value; reject attachments outright so a
        // failed call never has a refund path to get wrong.
        if let Some(d) = &ctx.deposit {
            return Err(AuctionError::EscrowMismatch(format!(
                "settle does not accept attached value ({} of {})",
                d.amount, d.token_id
            )));
        }
        let native = self.native_token_id.clone();
        let auction = self
            .auctions
            .get_mut(id)
            .ok_or_else(|| AuctionError::NotFound(format!("unknown auction id {}", id)))?;

        if auction.status == AuctionStatus::Settled {
            return Err(AuctionError::InvalidState(format!(
                "auction {} already settled",
                id
            )));
        }
        if ctx.now_ms < auction.end_time_ms {
            return Err(AuctionError::InvalidState(format!(
                "deadline {} not reached (chain time {})",
                auction.end_time_ms, ctx.now_ms
            )));
        }

        let (winner, price, transfers) = match &auction.highest_bid {
            Some(bid) => (
                Some(bid.bidder.clone()),
                bid.price,
                vec![
                    Transfer {
                        to: bid.bidder.clone(),
                        token_id: auction.token_id.clone(),
                        amount: auction.num_tokens,
                    },
                    Transfer {
                        to: auction.seller.clone(),
                        token_id: native,
                        amount: bid.price,
                    },
                ],
            ),
            None => (
                None,
                0,
                vec![Transfer {
                    to: auction.seller.clone(),
                    token_id: auction.token_id.clone(),
                    amount: auction.num_tokens,
                }],
            ),
        };

        auction.status = AuctionStatus::Settled;

        Ok(ActionReceipt {
            events: vec![AuctionEvent::AuctionSettled {
                id: id.to_string(),
                winner,
                price,
            }],
            transfers,
        })
    }

    /// Read-only query. Emits no event and never changes state.
    pub fn get_auction(&self, id: &str) -> Result<&Auction, AuctionError> {
        self.auctions
            .get(id)
            .ok_or_else(|| AuctionError::NotFound(format!("unknown auction id {}", id)))
    }
}

// ─────────────────────────────────────────────────────────────────
// TESTS
// ─────────────────────────────────────────────────────────────────
