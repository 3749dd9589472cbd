//! UI-side cache of the latest wallet view-state
//!
//! Updated from relayed engine messages and read by the UI on its poll.
//! Readers get zeroed defaults until the first update arrives.

use crate::sync::compute_sync_percentage;
use crate::types::{Balance, SyncStatus, Transaction};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::collections::VecDeque;

/// Log lines kept before the oldest are discarded
pub const LOG_LINE_CAPACITY: usize = 500;

/// Emitted after every mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SyncStatusUpdated,
    BalanceUpdated,
    TransactionsUpdated,
    NodeFeeUpdated,
    PrimaryAddressUpdated,
    LogLineAppended,
    FiatPriceUpdated,
}

#[derive(Debug, Default)]
pub struct SessionStateCache {
    sync_status: SyncStatus,
    balance: Balance,
    transactions: Vec<Transaction>,
    node_fee: i64,
    primary_address: String,
    log_lines: VecDeque<String>,
    fiat_price: Option<f64>,
    observers: Vec<Sender<SessionEvent>>,
}

impl SessionStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get notified about every change from now on
    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        let (tx, rx) = unbounded();
        self.observers.push(tx);
        rx
    }

    pub fn set_sync_status(&mut self, status: SyncStatus) {
        self.sync_status = status;
        self.emit(SessionEvent::SyncStatusUpdated);
    }

    pub fn set_balance(&mut self, balance: Balance) {
        self.balance = balance;
        self.emit(SessionEvent::BalanceUpdated);
    }

    pub fn set_transactions(&mut self, transactions: Vec<Transaction>) {
        self.transactions = transactions;
        self.emit(SessionEvent::TransactionsUpdated);
    }

    pub fn set_node_fee(&mut self, fee: i64) {
        self.node_fee = fee;
        self.emit(SessionEvent::NodeFeeUpdated);
    }

    pub fn set_primary_address(&mut self, address: impl Into<String>) {
        self.primary_address = address.into();
        self.emit(SessionEvent::PrimaryAddressUpdated);
    }

    pub fn append_log_line(&mut self, line: impl Into<String>) {
        if self.log_lines.len() == LOG_LINE_CAPACITY {
            self.log_lines.pop_front();
        }
        self.log_lines.push_back(line.into());
        self.emit(SessionEvent::LogLineAppended);
    }

    pub fn set_fiat_price(&mut self, price: f64) {
        self.fiat_price = Some(price);
        self.emit(SessionEvent::FiatPriceUpdated);
    }

    pub fn sync_status(&self) -> SyncStatus {
        self.sync_status
    }

    pub fn wallet_height(&self) -> u64 {
        self.sync_status.wallet_height
    }

    pub fn local_height(&self) -> u64 {
        self.sync_status.local_height
    }

    pub fn network_height(&self) -> u64 {
        self.sync_status.network_height
    }

    /// Display percentage for the current heights
    pub fn sync_percentage(&self) -> f64 {
        let SyncStatus {
            wallet_height,
            local_height,
            network_height,
        } = self.sync_status;
        compute_sync_percentage(wallet_height, local_height, network_height)
    }

    pub fn balance(&self) -> Balance {
        self.balance
    }

    pub fn unlocked_balance(&self) -> i64 {
        self.balance.unlocked
    }

    pub fn locked_balance(&self) -> i64 {
        self.balance.locked
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn node_fee(&self) -> i64 {
        self.node_fee
    }

    pub fn primary_address(&self) -> &str {
        &self.primary_address
    }

    /// Oldest first
    pub fn log_lines(&self) -> impl Iterator<Item = &str> {
        self.log_lines.iter().map(String::as_str)
    }

    pub fn log_line_count(&self) -> usize {
        self.log_lines.len()
    }

    /// Last known fiat price, kept across failed refreshes
    pub fn fiat_price(&self) -> Option<f64> {
        self.fiat_price
    }

    /// Unlocked plus locked balance in fiat, once a price is known
    pub fn fiat_balance(&self) -> Option<f64> {
        let total = self.balance.unlocked + self.balance.locked;
        self.fiat_price
            .map(|price| crate::amount::atomic_to_human(total) * price)
    }

    fn emit(&mut self, event: SessionEvent) {
        self.observers.retain(|observer| observer.send(event).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_before_any_update() {
        let cache = SessionStateCache::new();
        assert_eq!(cache.sync_status(), SyncStatus::new(0, 0, 0));
        assert_eq!(cache.unlocked_balance(), 0);
        assert_eq!(cache.locked_balance(), 0);
        assert!(cache.transactions().is_empty());
        assert_eq!(cache.node_fee(), 0);
        assert_eq!(cache.primary_address(), "");
        assert_eq!(cache.log_line_count(), 0);
        assert_eq!(cache.fiat_price(), None);
        assert_eq!(cache.sync_percentage(), 0.0);
    }

    #[test]
    fn test_setters_replace_and_notify() {
        let mut cache = SessionStateCache::new();
        let events = cache.subscribe();

        cache.set_sync_status(SyncStatus::new(100, 100, 101));
        cache.set_balance(Balance::new(1500, 250));
        cache.set_transactions(vec![Transaction::new(1_600_000_000, "aa", 1500)]);
        cache.set_node_fee(50);
        cache.set_primary_address("TRTLv1");

        assert_eq!(cache.sync_percentage(), 100.0);
        assert_eq!(cache.unlocked_balance(), 1500);
        assert_eq!(cache.locked_balance(), 250);
        assert_eq!(cache.transactions().len(), 1);
        assert_eq!(cache.node_fee(), 50);
        assert_eq!(cache.primary_address(), "TRTLv1");

        assert_eq!(
            events.try_iter().collect::<Vec<_>>(),
            vec![
                SessionEvent::SyncStatusUpdated,
                SessionEvent::BalanceUpdated,
                SessionEvent::TransactionsUpdated,
                SessionEvent::NodeFeeUpdated,
                SessionEvent::PrimaryAddressUpdated,
            ]
        );
    }

    #[test]
    fn test_log_is_bounded_and_drops_oldest() {
        let mut cache = SessionStateCache::new();
        for i in 0..LOG_LINE_CAPACITY + 25 {
            cache.append_log_line(format!("line {i}"));
        }
        assert_eq!(cache.log_line_count(), LOG_LINE_CAPACITY);
        assert_eq!(cache.log_lines().next(), Some("line 25"));
        assert_eq!(
            cache.log_lines().last().map(str::to_string),
            Some(format!("line {}", LOG_LINE_CAPACITY + 24))
        );
    }

    #[test]
    fn test_dropped_subscriber_is_forgotten() {
        let mut cache = SessionStateCache::new();
        let events = cache.subscribe();
        drop(events);
        cache.set_node_fee(1);
        assert!(cache.observers.is_empty());
    }

    #[test]
    fn test_fiat_balance_needs_a_price() {
        let mut cache = SessionStateCache::new();
        cache.set_balance(Balance::new(10_000, 0));
        assert_eq!(cache.fiat_balance(), None);
        cache.set_fiat_price(0.5);
        assert_eq!(cache.fiat_balance(), Some(50.0));
    }
}
