//! Net balance types.
//!
//! A net balance is the signed sum of every obligation entry attributed to a
//! participant in one settlement run: positive means the participant is owed
//! money, negative means they owe.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::ParticipantId;

/// Net balance per participant, ordered by id so iteration is deterministic.
pub type NetBalances = BTreeMap<ParticipantId, Decimal>;

/// Whether `amount` is below the dust threshold and must be treated as zero.
#[must_use]
pub fn is_dust(amount: Decimal, epsilon: Decimal) -> bool {
    amount.abs() < epsilon
}

/// Sum of all balances. Zero (within epsilon) for any consistent input.
#[must_use]
pub fn balance_sum(balances: &NetBalances) -> Decimal {
    balances.values().copied().sum()
}
