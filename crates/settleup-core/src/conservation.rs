//! Conservation check run after every match.
//!
//! Invariant enforced before anything reaches the ledger:
//! ```text
//! ∀ participant: balance + Σ(paid) - Σ(received) ≈ 0
//! ```
//!
//! Applying the transfers to the balances they were computed from must leave
//! every participant at (dust-level) zero. If it does not, the matcher is
//! broken and the run must not be persisted.

use rust_decimal::Decimal;
use settleup_types::{NetBalances, Result, SettleupError, Transfer, is_dust};

/// Verify that `transfers` zero out `balances` and are individually well formed.
///
/// # Errors
/// Returns [`SettleupError::ConservationViolation`] describing the first
/// participant left with a non-dust balance, or the first malformed transfer.
pub fn verify_transfers(
    balances: &NetBalances,
    transfers: &[Transfer],
    epsilon: Decimal,
) -> Result<()> {
    let mut remaining = balances.clone();
    for transfer in transfers {
        if transfer.from == transfer.to {
            return Err(SettleupError::ConservationViolation {
                reason: format!("self-transfer for {}", transfer.from),
            });
        }
        if transfer.amount <= Decimal::ZERO {
            return Err(SettleupError::ConservationViolation {
                reason: format!("non-positive transfer {transfer}"),
            });
        }
        *remaining
            .entry(transfer.from.clone())
            .or_insert(Decimal::ZERO) += transfer.amount;
        *remaining
            .entry(transfer.to.clone())
            .or_insert(Decimal::ZERO) -= transfer.amount;
    }

    if let Some((participant, left)) = remaining
        .iter()
        .find(|(_, amount)| !is_dust(**amount, epsilon))
    {
        return Err(SettleupError::ConservationViolation {
            reason: format!("participant {participant} left with balance {left}"),
        });
    }
    Ok(())
}

/// Total amount paid across all transfers.
#[must_use]
pub fn total_transferred(transfers: &[Transfer]) -> Decimal {
    transfers.iter().map(|t| t.amount).sum()
}
