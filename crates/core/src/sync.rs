//! Sync progress estimation
//!
//! Turns the engine's (wallet, local, network) heights into the percentage shown
//! in the status bar. The correction steps run in a fixed order; the
//! one-block-behind rule must see the corrected heights and must win over the
//! near-100 clamp.

/// Highest percentage shown while the wallet is not actually caught up
const NEAR_COMPLETE_CAP: f64 = 99.99;

/// How far the wallet height may run ahead of a stale network height before
/// the network height stops being corrected
const NETWORK_LAG_WINDOW: u64 = 10;

/// Compute the display percentage in `[0, 100]`, rounded up to the hundredth
pub fn compute_sync_percentage(wallet_height: u64, _local_height: u64, network_height: u64) -> f64 {
    let mut network_height = network_height;

    // network height is polled on an interval, wallet height moves while syncing
    if wallet_height > network_height
        && network_height != 0
        && network_height + NETWORK_LAG_WINDOW > wallet_height
    {
        network_height = wallet_height;
    }

    // synced in the past, network height not known yet
    if network_height == 0 && wallet_height != 0 {
        network_height = wallet_height;
    }

    let fraction = if network_height == 0 {
        0.0
    } else {
        wallet_height as f64 / network_height as f64
    };
    let mut percentage = 100.0 * fraction;

    if percentage > NEAR_COMPLETE_CAP && percentage < 100.0 {
        percentage = NEAR_COMPLETE_CAP;
    }

    if network_height.checked_sub(wallet_height) == Some(1) {
        percentage = 100.0;
    }

    round_up_to_hundredth(percentage).min(100.0)
}

fn round_up_to_hundredth(value: f64) -> f64 {
    (value * 100.0).ceil() / 100.0
}
