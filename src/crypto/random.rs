//! Access to the operating system CSPRNG.
//!
//! Every salt, nonce, and private scalar in keyseal is drawn through
//! `fill_random`, so an unavailable entropy source surfaces as one
//! typed error instead of a panic.

use rand::rngs::{OsRng, StdRng};
use rand::{SeedableRng, TryRngCore};

use crate::errors::{KeySealError, Result};

/// Fill `buf` with bytes from the OS random source.
///
/// `OsRng` holds no state, so concurrent callers on different threads
/// never share or repeat output.
pub fn fill_random(buf: &mut [u8]) -> Result<()> {
    OsRng.try_fill_bytes(buf).map_err(|e| {
        tracing::error!(error = %e, "OS random source failed");
        KeySealError::EntropyUnavailable(e.to_string())
    })
}

/// A CSPRNG freshly seeded from the OS source, for range sampling.
pub fn os_seeded_rng() -> Result<StdRng> {
    StdRng::try_from_os_rng().map_err(|e| {
        tracing::error!(error = %e, "OS random source failed");
        KeySealError::EntropyUnavailable(e.to_string())
    })
}

/// Return `N` fresh random bytes.
pub fn random_array<const N: usize>() -> Result<[u8; N]> {
    let mut out = [0u8; N];
    fill_random(&mut out)?;
    Ok(out)
}
