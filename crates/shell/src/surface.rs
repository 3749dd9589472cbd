//! Log-only UI surface

use proton_wallet_core::amount::{atomic_to_human_pretty, convert_timestamp};
use proton_wallet_core::config::ConfigRecord;
use proton_wallet_core::session::SessionStateCache;
use proton_wallet_core::types::Transaction;
use proton_wallet_core::ui::{UiNotice, UiSurface};
use tracing::info;

/// Rows logged from the top of the transaction list
const RECENT_TRANSACTIONS: usize = 5;

/// Logs wallet status whenever it changes
#[derive(Debug, Default)]
pub struct LogSurface {
    last_status: Option<String>,
    last_transactions: Vec<Transaction>,
}

impl LogSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

/// One-line summary of what a wallet window would show
pub fn status_line(session: &SessionStateCache, config: &ConfigRecord) -> String {
    let fiat = config
        .get("selectedFiat")
        .and_then(|v| v.as_str())
        .unwrap_or("usd");
    let mut line = format!(
        "sync {:.2}% ({}/{}) | balance {} (locked {}) | {} transactions",
        session.sync_percentage(),
        session.wallet_height(),
        session.network_height(),
        atomic_to_human_pretty(session.unlocked_balance()),
        atomic_to_human_pretty(session.locked_balance()),
        session.transactions().len(),
    );
    if let Some(value) = session.fiat_balance() {
        line.push_str(&format!(" | {:.2} {}", value, fiat.to_uppercase()));
    }
    line
}

/// Transaction row as the wallet list shows it: date, hash, signed amount
pub fn transaction_row(tx: &Transaction) -> String {
    let when = if tx.is_confirmed() {
        convert_timestamp(tx.timestamp)
    } else {
        "Unconfirmed".to_string()
    };
    format!("{} | {} | {}", when, tx.hash, atomic_to_human_pretty(tx.amount))
}

impl UiSurface for LogSurface {
    fn refresh(&mut self, session: &SessionStateCache, config: &ConfigRecord) {
        let status = status_line(session, config);
        if self.last_status.as_deref() != Some(status.as_str()) {
            info!("{}", status);
            self.last_status = Some(status);
        }

        let transactions = session.transactions();
        let recent = &transactions[..transactions.len().min(RECENT_TRANSACTIONS)];
        if self.last_transactions.as_slice() != recent {
            for tx in recent {
                info!("  {}", transaction_row(tx));
            }
            self.last_transactions = recent.to_vec();
        }
    }

    fn notify(&mut self, notice: UiNotice) {
        match notice {
            UiNotice::ConfigChanged => info!("Settings updated"),
            UiNotice::WalletSaved(true) => info!("Wallet saved"),
            UiNotice::WalletSaved(false) => info!("Wallet could not be saved"),
            UiNotice::WalletActive(active) => info!("Wallet open: {}", active),
            UiNotice::TransactionSent { hash } => {
                info!("Transaction sent: {}", hash.as_deref().unwrap_or("(no hash)"))
            }
            UiNotice::TransactionFailed { message } => info!("Transaction failed: {}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proton_wallet_core::types::{Balance, SyncStatus};

    #[test]
    fn test_unconfirmed_row_skips_the_date() {
        let tx = Transaction::new(0, "abc123", -150);
        assert_eq!(transaction_row(&tx), "Unconfirmed | abc123 | -1.50");
    }

    #[test]
    fn test_confirmed_row_shows_the_date() {
        let tx = Transaction::new(1_600_000_000, "def456", 1_234_500);
        let row = transaction_row(&tx);
        assert!(row.starts_with(&convert_timestamp(1_600_000_000)));
        assert!(row.ends_with("| def456 | 12,345.00"));
        assert!(!row.contains("Unconfirmed"));
    }

    #[test]
    fn test_refresh_remembers_recent_transactions() {
        let mut session = SessionStateCache::new();
        let rows: Vec<Transaction> = (0..8)
            .map(|i| {
                let timestamp = if i == 0 { 0 } else { 1_600_000_000 + i };
                Transaction::new(timestamp, format!("tx{i}"), 100)
            })
            .collect();
        session.set_transactions(rows.clone());

        let mut surface = LogSurface::new();
        surface.refresh(&session, &ConfigRecord::new());
        assert_eq!(surface.last_transactions, rows[..RECENT_TRANSACTIONS].to_vec());
    }

    #[test]
    fn test_status_line_uses_formatted_amounts() {
        let mut session = SessionStateCache::new();
        session.set_sync_status(SyncStatus::new(1000, 1000, 1010));
        session.set_balance(Balance::new(123_456_789, 500));

        let line = status_line(&session, &ConfigRecord::new());
        assert_eq!(
            line,
            "sync 99.01% (1000/1010) | balance 1,234,567.89 (locked 5.00) | 0 transactions"
        );
    }

    #[test]
    fn test_status_line_adds_fiat_value() {
        let mut session = SessionStateCache::new();
        session.set_balance(Balance::new(10_000, 0));
        session.set_fiat_price(0.5);
        let mut config = ConfigRecord::new();
        config.insert("selectedFiat".into(), "eur".into());

        assert!(status_line(&session, &config).ends_with("| 50.00 EUR"));
    }
}
