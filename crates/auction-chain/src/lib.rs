// SPDX-License-Identifier: AGPL-3.0-only
//! # In-process chain simulation
//!
//! Supplies the three collaborators the auction ledger is written against,
//! without a node: the execution environment (verified caller, block
//! timestamp, attached value, atomic transfer application), the token
//! registry (issue, validate and locate test tokens), and the event-log
//! plumbing that appends each committed action's records at its block
//! height.
//!
//! ## Transaction discipline
//!
//! Each `call_*` dispatch is all-or-nothing. The ledger validates before
//! it mutates, so a rejected action returns before any balance moves: the
//! caller's attached value never leaves their account. On success the
//! deposit moves into the contract account, the receipt's transfers are
//! paid out of it, and the events land in the log, all in one commit.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use auction_core::events::{EventLog, EventRecord};
use auction_core::{Auction, AuctionLedger, CallContext, Deposit};

// Genesis settings for a simulated chain instance
pub mod config;

use config::ChainConfig;

// ─────────────────────────────────────────────────────────────
// u128 ↔ String serialization (JSON doesn't support 128-bit integers)
// ─────────────────────────────────────────────────────────────

mod u128_str {
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

// ─────────────────────────────────────────────────────────────
// TOKEN REGISTRY
// ─────────────────────────────────────────────────────────────

/// Registered token. Mirrors what the chain's built-in token issuance
/// records: display metadata, supply bounds and the issuance flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenInfo {
    /// Token id, `tti_` + 24 hex chars
    pub token_id: String,
    pub token_name: String,
    /// Ticker symbol (max 8 chars)
    pub token_symbol: String,
    /// Decimal places (0-18)
    pub decimals: u8,
    #[serde(with = "u128_str")]
    pub total_supply: u128,
    /// Supply cap; must cover `total_supply` for re-issuable tokens
    #[serde(with = "u128_str")]
    pub max_supply: u128,
    pub is_re_issuable: bool,
    pub is_owner_burn_only: bool,
    /// Token creator / issuer
    pub owner: String,
}

/// Issuance request, one per new token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenIssue {
    pub token_name: String,
    pub token_symbol: String,
    pub decimals: u8,
    #[serde(with = "u128_str")]
    pub total_supply: u128,
    #[serde(with = "u128_str")]
    pub max_supply: u128,
    pub is_re_issuable: bool,
    pub is_owner_burn_only: bool,
}

impl TokenIssue {
    /// Validate issuance fields before a token id is minted.
    pub fn validate(&self) -> Result<(), String> {
        if self.token_name.is_empty() || self.token_name.len() > 64 {
            return Err("Token name must be 1-64 characters".to_string());
        }
        if self.token_symbol.is_empty() || self.token_symbol.len() > 8 {
            return Err("Token symbol must be 1-8 characters".to_string());
        }
        if self.decimals > 18 {
            return Err("Token decimals must be 0-18".to_string());
        }
        if self.total_supply == 0 {
            return Err("Token total supply must be > 0".to_string());
        }
        if self.is_re_issuable && self.max_supply == 0 {
            return Err("Re-issuable token must declare a max supply".to_string());
        }
        if self.max_supply > 0 && self.total_supply > self.max_supply {
            return Err("Token total supply exceeds max supply".to_string());
        }
        Ok(())
    }
}

/// Authority over token identifiers and metadata. The ledger never talks
/// to it; the execution environment validates token ids against it and
/// the test harness uses it to issue and locate test tokens.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenRegistry {
    /// MAINNET: BTreeMap for deterministic serialization
    tokens: BTreeMap<String, TokenInfo>,
    /// Per-owner issuance counter, feeds the token id mint
    nonce: BTreeMap<String, u64>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deterministic token id via blake3(owner || nonce).
    /// Format: "tti_" + 24 hex chars, the chain's token id shape.
    fn mint_token_id(&mut self, owner: &str) -> String {
        let nonce = self.nonce.entry(owner.to_string()).or_insert(0);
        let seq = *nonce;
        *nonce = nonce.saturating_add(1);

        let id_input = format!("{}:{}", owner, seq);
        let id_hash = blake3::hash(id_input.as_bytes());
        format!("tti_{}", hex::encode(&id_hash.as_bytes()[0..12]))
    }

    /// Insert a fully-formed token record (genesis registration of the
    /// native currency). Rejects empty and duplicate ids.
    pub fn register(&mut self, info: TokenInfo) -> Result<(), String> {
        if info.token_id.is_empty() {
            return Err("Token Error: token id is empty".to_string());
        }
        if self.tokens.contains_key(&info.token_id) {
            return Err(format!(
                "Token Error: token id {} already registered",
                info.token_id
            ));
        }
        self.tokens.insert(info.token_id.clone(), info);
        Ok(())
    }

    /// Issue a new token owned by `owner`. Returns the minted token id.
    pub fn issue_token(&mut self, owner: &str, issue: &TokenIssue) -> Result<String, String> {
        issue.validate()?;
        if owner.is_empty() {
            return Err("Token Error: owner address is empty".to_string());
        }
        let token_id = self.mint_token_id(owner);
        self.register(TokenInfo {
            token_id: token_id.clone(),
            token_name: issue.token_name.clone(),
            token_symbol: issue.token_symbol.clone(),
            decimals: issue.decimals,
            total_supply: issue.total_supply,
            max_supply: issue.max_supply,
            is_re_issuable: issue.is_re_issuable,
            is_owner_burn_only: issue.is_owner_burn_only,
            owner: owner.to_string(),
        })?;
        Ok(token_id)
    }

    pub fn token_info(&self, token_id: &str) -> Option<&TokenInfo> {
        self.tokens.get(token_id)
    }

    pub fn is_known(&self, token_id: &str) -> bool {
        self.tokens.contains_key(token_id)
    }

    /// Page through all registered tokens in id order.
    pub fn token_info_list(&self, offset: usize, limit: usize) -> Vec<&TokenInfo> {
        self.tokens.values().skip(offset).take(limit).collect()
    }

    /// First token owned by `owner` that is not the native currency.
    /// The harness uses this to locate its re-issuable test token.
    pub fn find_owner_token(&self, owner: &str, native_token_id: &str) -> Option<&TokenInfo> {
        self.tokens
            .values()
            .find(|t| t.token_id != native_token_id && t.owner == owner)
    }
}

// ─────────────────────────────────────────────────────────────
// CHAIN SIMULATION
// ─────────────────────────────────────────────────────────────

/// One in-process chain: balances, registry, the auction contract and its
/// event log, a block-height counter and a controllable clock.
///
/// Chain time only moves through `advance_time`, so deadline behavior is
/// fully deterministic in tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSim {
    contract_address: String,
    native_token_id: String,
    /// (token id, account) -> balance
    balances: BTreeMap<(String, String), u128>,
    registry: TokenRegistry,
    ledger: AuctionLedger,
    event_log: EventLog,
    height: u64,
    now_ms: u64,
    /// Execution log lines, for debugging test runs
    logs: Vec<String>,
}

impl ChainSim {
    /// Boot a chain from genesis: register the native currency, fund the
    /// genesis accounts and deploy the auction contract.
    pub fn new(config: &ChainConfig) -> Result<Self, String> {
        config.validate()?;

        let mut registry = TokenRegistry::new();
        let genesis_supply: u128 = config
            .genesis_accounts
            .iter()
            .fold(0u128, |acc, a| acc.saturating_add(a.balance));
        registry.register(TokenInfo {
            token_id: config.native_token_id.clone(),
            token_name: "Native Coin".to_string(),
            token_symbol: "COIN".to_string(),
            decimals: 18,
            total_supply: genesis_supply,
            max_supply: genesis_supply,
            is_re_issuable: false,
            is_owner_burn_only: false,
            owner: String::new(),
        })?;

        let mut balances = BTreeMap::new();
        for account in &config.genesis_accounts {
            balances.insert(
                (config.native_token_id.clone(), account.address.clone()),
                account.balance,
            );
        }

        // Deterministic contract address via blake3(chain genesis input),
        // same mint shape as token ids.
        let addr_input = format!("token-auction:{}", config.genesis_time_ms);
        let addr_hash = blake3::hash(addr_input.as_bytes());
        let contract_address = format!("ctr_{}", hex::encode(&addr_hash.as_bytes()[0..16]));

        Ok(Self {
            contract_address,
            native_token_id: config.native_token_id.clone(),
            balances,
            registry,
            ledger: AuctionLedger::with_native_token(&config.native_token_id),
            event_log: EventLog::new(),
            height: 0,
            now_ms: config.genesis_time_ms,
            logs: Vec::new(),
        })
    }

    pub fn contract_address(&self) -> &str {
        &self.contract_address
    }

    pub fn native_token_id(&self) -> &str {
        &self.native_token_id
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    /// Move chain time forward. Time never goes backwards.
    pub fn advance_time(&mut self, delta_ms: u64) {
        self.now_ms = self.now_ms.saturating_add(delta_ms);
    }

    pub fn balance_of(&self, token_id: &str, account: &str) -> u128 {
        self.balances
            .get(&(token_id.to_string(), account.to_string()))
            .copied()
            .unwrap_or(0)
    }

    fn credit(&mut self, token_id: &str, account: &str, amount: u128) {
        let bal = self
            .balances
            .entry((token_id.to_string(), account.to_string()))
            .or_insert(0);
        // checked_add prevents u128 overflow
        *bal = bal.checked_add(amount).unwrap_or(u128::MAX);
    }

    fn debit(&mut self, token_id: &str, account: &str, amount: u128) -> Result<(), String> {
        let bal = self
            .balances
            .entry((token_id.to_string(), account.to_string()))
            .or_insert(0);
        if *bal < amount {
            return Err(format!(
                "Insufficient Funds: {} has {} of {}, needs {}",
                account, bal, token_id, amount
            ));
        }
        *bal -= amount;
        Ok(())
    }

    // ── Harness operations ──

    /// Plain value transfer between accounts (harness funding).
    pub fn send(&mut self, from: &str, to: &str, token_id: &str, amount: u128) -> Result<(), String> {
        if !self.registry.is_known(token_id) {
            return Err(format!("Token Error: unknown token id {}", token_id));
        }
        self.debit(token_id, from, amount)?;
        self.credit(token_id, to, amount);
        self.height += 1;
        self.logs
            .push(format!("send: {} -> {} {} {}", from, to, amount, token_id));
        Ok(())
    }

    /// Issue a new token and credit its full supply to the owner.
    pub fn issue_token(&mut self, owner: &str, issue: &TokenIssue) -> Result<String, String> {
        let token_id = self.registry.issue_token(owner, issue)?;
        self.credit(&token_id, owner, issue.total_supply);
        self.height += 1;
        self.logs.push(format!(
            "issueToken: {} supply {} owner {}",
            token_id, issue.total_supply, owner
        ));
        Ok(token_id)
    }

    pub fn token_info(&self, token_id: &str) -> Option<TokenInfo> {
        self.registry.token_info(token_id).cloned()
    }

    pub fn token_info_list(&self, offset: usize, limit: usize) -> Vec<TokenInfo> {
        self.registry
            .token_info_list(offset, limit)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn find_owner_token(&self, owner: &str) -> Option<TokenInfo> {
        self.registry
            .find_owner_token(owner, &self.native_token_id)
            .cloned()
    }

    // ── Contract call dispatch ──

    /// createAuction with `amount` of `token_id` attached as escrow.
    pub fn call_create_auction(
        &mut self,
        caller: &str,
        reserve_price: u128,
        end_time_ms: u64,
        name: &str,
        token_id: &str,
        amount: u128,
    ) -> Result<String, String> {
        if !self.registry.is_known(token_id) {
            return Err(format!("Token Error: unknown token id {}", token_id));
        }
        if self.balance_of(token_id, caller) < amount {
            return Err(format!(
                "Insufficient Funds: {} cannot attach {} of {}",
                caller, amount, token_id
            ));
        }
        let ctx = CallContext {
            caller: caller.to_string(),
            now_ms: self.now_ms,
            deposit: Some(Deposit {
                token_id: token_id.to_string(),
                amount,
            }),
        };
        // A rejected action returns here, before any balance moves.
        let (id, receipt) = self
            .ledger
            .create_auction(&ctx, reserve_price, end_time_ms, name, token_id, amount)
            .map_err(|e| e.to_string())?;

        let contract = self.contract_address.clone();
        self.debit(token_id, caller, amount)?;
        self.credit(token_id, &contract, amount);
        self.commit(receipt)?;
        self.logs
            .push(format!("createAuction: id={} seller={}", id, caller));
        Ok(id)
    }

    /// bid with `attached` native currency backing `offered_price`.
    pub fn call_bid(
        &mut self,
        caller: &str,
        auction_id: &str,
        offered_price: u128,
        attached: u128,
    ) -> Result<(), String> {
        let native = self.native_token_id.clone();
        if self.balance_of(&native, caller) < attached {
            return Err(format!(
                "Insufficient Funds: {} cannot attach {} of {}",
                caller, attached, native
            ));
        }
        let ctx = CallContext {
            caller: caller.to_string(),
            now_ms: self.now_ms,
            deposit: Some(Deposit {
                token_id: native.clone(),
                amount: attached,
            }),
        };
        let receipt = self
            .ledger
            .bid(&ctx, auction_id, offered_price)
            .map_err(|e| e.to_string())?;

        let contract = self.contract_address.clone();
        self.debit(&native, caller, attached)?;
        self.credit(&native, &contract, attached);
        self.commit(receipt)?;
        self.logs.push(format!(
            "bid: auction={} bidder={} price={}",
            auction_id, caller, offered_price
        ));
        Ok(())
    }

    /// settle, callable by anyone once the deadline has passed.
    pub fn call_settle(&mut self, caller: &str, auction_id: &str) -> Result<(), String> {
        let ctx = CallContext {
            caller: caller.to_string(),
            now_ms: self.now_ms,
            deposit: None,
        };
        let receipt = self
            .ledger
            .settle(&ctx, auction_id)
            .map_err(|e| e.to_string())?;
        self.commit(receipt)?;
        self.logs
            .push(format!("settle: auction={} by={}", auction_id, caller));
        Ok(())
    }

    // ── Queries (free, no block produced) ──

    pub fn get_auction(&self, auction_id: &str) -> Result<Auction, String> {
        self.ledger
            .get_auction(auction_id)
            .cloned()
            .map_err(|e| e.to_string())
    }

    /// The contract's query row: name, seller, reserve price, end time,
    /// token quantity, token id, current highest price (or "0").
    pub fn query_auction(&self, auction_id: &str) -> Result<Vec<String>, String> {
        Ok(self.get_auction(auction_id)?.abi_row())
    }

    /// Past events by name and height range; `to_height` 0 = unbounded.
    pub fn events(&self, event_name: &str, from_height: u64, to_height: u64) -> Vec<EventRecord> {
        self.event_log
            .query(event_name, from_height, to_height)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Apply a committed action: next block height, transfers out of the
    /// contract account, events into the log. A transfer the contract
    /// cannot cover means the escrow accounting is broken, and the error
    /// says so rather than leaving a half-applied block.
    fn commit(&mut self, receipt: auction_core::ActionReceipt) -> Result<(), String> {
        self.height += 1;
        let contract = self.contract_address.clone();
        for t in &receipt.transfers {
            self.debit(&t.token_id, &contract, t.amount).map_err(|_| {
                format!(
                    "Escrow Error: contract cannot cover transfer of {} {}",
                    t.amount, t.token_id
                )
            })?;
            self.credit(&t.token_id, &t.to, t.amount);
        }
        for event in &receipt.events {
            self.logs.push(format!(
                "event {}: {}",
                event.event_name(),
                serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string())
            ));
        }
        self.event_log.append(self.height, self.now_ms, receipt.events);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────
// TESTS
// ─────────────────────────────────────────────────────────────
