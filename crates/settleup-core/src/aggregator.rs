//! Balance aggregation.
//!
//! Reduces a flat list of signed obligation entries into one net balance per
//! participant, then enforces the zero-sum invariant:
//!
//! ```text
//! Σ balances ≈ 0   (|Σ| < epsilon)
//! ```
//!
//! Obligations always arrive in matched pairs, so a non-zero sum means a bug
//! or corrupt input upstream. The run aborts before anything is written.

use rust_decimal::Decimal;
use settleup_types::{NetBalances, Obligation, Result, SettleupError, balance_sum, is_dust};

/// Aggregate obligations into net balances with dust removed.
///
/// # Errors
/// Returns [`SettleupError::UnbalancedObligations`] if the balances (before
/// or after dust removal) do not sum to zero within `epsilon`.
pub fn aggregate(obligations: &[Obligation], epsilon: Decimal) -> Result<NetBalances> {
    let mut balances = NetBalances::new();
    for obligation in obligations {
        *balances
            .entry(obligation.participant.clone())
            .or_insert(Decimal::ZERO) += obligation.amount;
    }

    check_zero_sum(&balances, epsilon)?;

    let before = balances.len();
    balances.retain(|_, amount| !is_dust(*amount, epsilon));

    // Dropping many same-signed dust balances can push the total out of
    // tolerance even when the raw sum was fine.
    check_zero_sum(&balances, epsilon)?;

    tracing::debug!(
        entries = obligations.len(),
        participants = before,
        nonzero = balances.len(),
        "Balances aggregated"
    );
    Ok(balances)
}

fn check_zero_sum(balances: &NetBalances, epsilon: Decimal) -> Result<()> {
    let sum = balance_sum(balances);
    if is_dust(sum, epsilon) {
        Ok(())
    } else {
        Err(SettleupError::UnbalancedObligations {
            sum,
            tolerance: epsilon,
        })
    }
}
