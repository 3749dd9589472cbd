//! Wallet view-state records carried by the relay
//!
//! The engine sends heights, balances and transactions as bare JSON arrays;
//! these types give them names on the Rust side and keep the array form on
//! the wire.

use serde::{Deserialize, Serialize};

/// Snapshot of the three heights reported by the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u64; 3]", into = "[u64; 3]")]
pub struct SyncStatus {
    pub wallet_height: u64,
    pub local_height: u64,
    pub network_height: u64,
}

impl SyncStatus {
    pub fn new(wallet_height: u64, local_height: u64, network_height: u64) -> Self {
        Self {
            wallet_height,
            local_height,
            network_height,
        }
    }
}

impl From<[u64; 3]> for SyncStatus {
    fn from([wallet_height, local_height, network_height]: [u64; 3]) -> Self {
        Self::new(wallet_height, local_height, network_height)
    }
}

impl From<SyncStatus> for [u64; 3] {
    fn from(status: SyncStatus) -> Self {
        [
            status.wallet_height,
            status.local_height,
            status.network_height,
        ]
    }
}

/// Unlocked and locked balance in atomic units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[i64; 2]", into = "[i64; 2]")]
pub struct Balance {
    pub unlocked: i64,
    pub locked: i64,
}

impl Balance {
    pub fn new(unlocked: i64, locked: i64) -> Self {
        Self { unlocked, locked }
    }
}

impl From<[i64; 2]> for Balance {
    fn from([unlocked, locked]: [i64; 2]) -> Self {
        Self::new(unlocked, locked)
    }
}

impl From<Balance> for [i64; 2] {
    fn from(balance: Balance) -> Self {
        [balance.unlocked, balance.locked]
    }
}

/// One row of the transaction list, `[timestamp, hash, amount]` on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u64, String, i64)", into = "(u64, String, i64)")]
pub struct Transaction {
    /// Block timestamp in epoch seconds, 0 while unconfirmed
    pub timestamp: u64,
    pub hash: String,
    /// Signed amount in atomic units, negative for outgoing
    pub amount: i64,
}

impl Transaction {
    pub fn new(timestamp: u64, hash: impl Into<String>, amount: i64) -> Self {
        Self {
            timestamp,
            hash: hash.into(),
            amount,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.timestamp != 0
    }

    pub fn is_outgoing(&self) -> bool {
        self.amount < 0
    }
}

impl From<(u64, String, i64)> for Transaction {
    fn from((timestamp, hash, amount): (u64, String, i64)) -> Self {
        Self {
            timestamp,
            hash,
            amount,
        }
    }
}

impl From<Transaction> for (u64, String, i64) {
    fn from(tx: Transaction) -> Self {
        (tx.timestamp, tx.hash, tx.amount)
    }
}
