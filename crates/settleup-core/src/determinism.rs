//! Transfer-root fingerprint for determinism checks.
//!
//! Two settlement computations over the same input must produce the exact
//! same transfer sequence. The `transfer_root` is a SHA-256 over the ordered
//! transfers so results can be compared (and logged) without shipping the
//! full list around.

use settleup_types::Transfer;
use sha2::{Digest, Sha256};

/// Compute the transfer root over an ordered list of transfers.
///
/// Order matters: the same transfers in a different order hash differently.
#[must_use]
pub fn compute_transfer_root(transfers: &[Transfer]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(b"settleup:transfer_root:v1:");
    hasher.update((transfers.len() as u64).to_le_bytes());

    for transfer in transfers {
        // Length-prefix ids so ("ab","c") and ("a","bc") cannot collide.
        for id in [transfer.from.as_str(), transfer.to.as_str()] {
            hasher.update((id.len() as u64).to_le_bytes());
            hasher.update(id.as_bytes());
        }
        hasher.update(transfer.amount.normalize().to_string().as_bytes());
        hasher.update(b";");
    }

    let result = hasher.finalize();
    let mut root = [0u8; 32];
    root.copy_from_slice(&result);
    root
}

/// Hex form of [`compute_transfer_root`], as carried in reports and logs.
#[must_use]
pub fn transfer_root_hex(transfers: &[Transfer]) -> String {
    hex::encode(compute_transfer_root(transfers))
}

/// Recompute the root and compare with `expected_root`.
#[must_use]
pub fn verify_transfer_root(transfers: &[Transfer], expected_root: &[u8; 32]) -> bool {
    compute_transfer_root(transfers) == *expected_root
}
