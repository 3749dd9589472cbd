//! Fiat price feed
//!
//! Fetches the coin's price in the selected fiat currency off the UI thread.
//! Failures are logged and swallowed; the last good price stays in the cache.

use crate::session::SessionStateCache;
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::Deserialize;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// How often the price is fetched again
pub const PRICE_REFRESH_INTERVAL: Duration = Duration::from_secs(10 * 60);

const COINGECKO_MARKETS_URL: &str = "https://api.coingecko.com/api/v3/coins/markets";
const COIN_ID: &str = "turtlecoin";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum PriceError {
    #[error("price request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("no {0} price in response")]
    Missing(String),
}

/// Where prices come from
pub trait PriceSource: Send + Sync {
    fn fetch_price(&self, fiat: &str) -> Result<f64, PriceError>;
}

#[derive(Debug, Deserialize)]
struct MarketEntry {
    current_price: Option<f64>,
}

/// CoinGecko market data endpoint
pub struct CoinGeckoSource {
    client: reqwest::blocking::Client,
    url: String,
}

impl CoinGeckoSource {
    pub fn new() -> Result<Self, PriceError> {
        Self::with_url(COINGECKO_MARKETS_URL)
    }

    pub fn with_url(url: &str) -> Result<Self, PriceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

impl PriceSource for CoinGeckoSource {
    fn fetch_price(&self, fiat: &str) -> Result<f64, PriceError> {
        let entries: Vec<MarketEntry> = self
            .client
            .get(&self.url)
            .query(&[
                ("vs_currency", fiat),
                ("ids", COIN_ID),
                ("order", "market_cap_desc"),
                ("per_page", "100"),
                ("page", "1"),
                ("sparkline", "false"),
                ("price_change_percentage", "7d"),
            ])
            .send()?
            .error_for_status()?
            .json()?;

        entries
            .first()
            .and_then(|entry| entry.current_price)
            .ok_or_else(|| PriceError::Missing(fiat.to_string()))
    }
}

/// Result of one fetch, delivered back to the UI loop
#[derive(Debug)]
pub struct PriceUpdate {
    pub fiat: String,
    pub result: Result<f64, PriceError>,
}

/// Runs fetches on worker threads and applies their results to the cache
pub struct FiatPriceFeed {
    source: Arc<dyn PriceSource>,
    updates_tx: Sender<PriceUpdate>,
    updates: Receiver<PriceUpdate>,
    in_flight: bool,
    fiat: Option<String>,
}

impl FiatPriceFeed {
    pub fn new(source: Arc<dyn PriceSource>) -> Self {
        let (updates_tx, updates) = unbounded();
        Self {
            source,
            updates_tx,
            updates,
            in_flight: false,
            fiat: None,
        }
    }

    /// Completed fetches arrive here
    pub fn updates(&self) -> Receiver<PriceUpdate> {
        self.updates.clone()
    }

    /// Currency of the last request
    pub fn fiat(&self) -> Option<&str> {
        self.fiat.as_deref()
    }

    /// Start a fetch unless one is already running
    pub fn request(&mut self, fiat: &str) {
        self.fiat = Some(fiat.to_string());
        if self.in_flight {
            debug!("Price fetch already running");
            return;
        }

        let source = Arc::clone(&self.source);
        let updates = self.updates_tx.clone();
        let fiat = fiat.to_string();
        let spawned = thread::Builder::new()
            .name("price-fetch".into())
            .spawn(move || {
                let result = source.fetch_price(&fiat);
                let _ = updates.send(PriceUpdate { fiat, result });
            });
        match spawned {
            Ok(_) => self.in_flight = true,
            Err(e) => warn!("Failed to start price fetch: {}", e),
        }
    }

    /// Store a successful price; keep the previous one on failure
    pub fn apply(&mut self, update: PriceUpdate, session: &mut SessionStateCache) {
        self.in_flight = false;
        if self.fiat.as_deref() != Some(update.fiat.as_str()) {
            debug!("Discarding {} price, currency changed", update.fiat);
            if let Some(fiat) = self.fiat.clone() {
                self.request(&fiat);
            }
            return;
        }
        match update.result {
            Ok(price) => {
                debug!("Price updated: {} {}", price, update.fiat);
                session.set_fiat_price(price);
            }
            Err(e) => warn!("Failed to fetch {} price: {}", update.fiat, e),
        }
    }
}
