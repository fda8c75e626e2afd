//! Obligation entries: the signed per-participant amounts a settlement run
//! aggregates.
//!
//! Each underlying expense split yields one positive entry for the payer and
//! one negative entry for the debtor, so every pair sums to exactly zero.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ParticipantId, ParticipantRef, Result};

/// A raw obligation entry as supplied by a caller (e.g. a freshly entered
/// expense that has not been persisted yet).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObligationEntry {
    /// Who the amount is attributed to, in whatever shape the caller had it.
    pub participant: ParticipantRef,
    /// Positive: the participant is owed. Negative: the participant owes.
    pub amount: Decimal,
}

impl ObligationEntry {
    pub fn new(participant: impl Into<ParticipantRef>, amount: Decimal) -> Self {
        Self {
            participant: participant.into(),
            amount,
        }
    }

    /// Resolve the participant reference into a canonical [`Obligation`].
    ///
    /// # Errors
    /// Returns `InvalidParticipant` if the reference cannot be normalized.
    pub fn normalize(&self) -> Result<Obligation> {
        Ok(Obligation {
            participant: self.participant.normalize()?,
            amount: self.amount,
        })
    }

    /// The two entries describing "`debtor` owes `creditor` `amount`".
    pub fn pair(
        debtor: impl Into<ParticipantRef>,
        creditor: impl Into<ParticipantRef>,
        amount: Decimal,
    ) -> [Self; 2] {
        [Self::new(creditor, amount), Self::new(debtor, -amount)]
    }
}

/// An obligation entry whose participant has been normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obligation {
    pub participant: ParticipantId,
    pub amount: Decimal,
}

impl Obligation {
    #[must_use]
    pub fn new(participant: ParticipantId, amount: Decimal) -> Self {
        Self {
            participant,
            amount,
        }
    }
}

/// Normalize a batch of raw entries, rejecting the whole batch on the first
/// unresolvable participant. Dropping an entry would break the zero-sum
/// invariant, so there is no partial success.
pub fn normalize_all(entries: &[ObligationEntry]) -> Result<Vec<Obligation>> {
    entries.iter().map(ObligationEntry::normalize).collect()
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
pub mod fixtures {
    use rand::Rng;
    use rust_decimal::Decimal;

    use super::ObligationEntry;

    /// Generate `expenses` random expense splits across `participants`
    /// participants named `P00`, `P01`, … Amounts are whole cents, so every
    /// generated set sums to exactly zero.
    pub fn random_obligations<R: Rng>(
        rng: &mut R,
        participants: usize,
        expenses: usize,
    ) -> Vec<ObligationEntry> {
        assert!(participants >= 2, "need at least two participants");
        let mut entries = Vec::with_capacity(expenses * 2);
        for _ in 0..expenses {
            let payer = rng.gen_range(0..participants);
            let mut debtor = rng.gen_range(0..participants - 1);
            if debtor >= payer {
                debtor += 1;
            }
            let cents: i64 = rng.gen_range(1..100_000);
            let amount = Decimal::new(cents, 2);
            entries.extend(ObligationEntry::pair(
                format!("P{debtor:02}").as_str(),
                format!("P{payer:02}").as_str(),
                amount,
            ));
        }
        entries
    }
}
