//! Durable ledger records and the snapshot a settlement run reads.
//!
//! A ledger record is one outstanding (unsettled) or paid (settled) transfer
//! inside a group. Unsettled rows are a recomputable cache of "who currently
//! owes whom"; every settlement run supersedes all of them for its group.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    GroupId, LedgerRecordId, LedgerVersion, Obligation, ParticipantId, Result, SettleupError,
    Transfer,
};

/// One row of a group's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub id: LedgerRecordId,
    pub group_id: GroupId,
    /// The participant who owes (pays).
    pub debtor_id: ParticipantId,
    /// The participant who is owed (receives).
    pub creditor_id: ParticipantId,
    /// Always strictly positive.
    pub amount: Decimal,
    pub settled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LedgerRecord {
    /// Create a new unsettled record, enforcing `amount > 0` and
    /// `debtor != creditor`.
    pub fn unsettled(
        group_id: GroupId,
        debtor_id: ParticipantId,
        creditor_id: ParticipantId,
        amount: Decimal,
    ) -> Result<Self> {
        if amount <= Decimal::ZERO {
            return Err(SettleupError::InvalidAmount {
                amount,
                reason: "ledger record amount must be positive".into(),
            });
        }
        if debtor_id == creditor_id {
            return Err(SettleupError::SelfTransfer(debtor_id.to_string()));
        }
        let now = Utc::now();
        Ok(Self {
            id: LedgerRecordId::new(),
            group_id,
            debtor_id,
            creditor_id,
            amount,
            settled: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Persistable row for a computed transfer (debtor = `from`).
    pub fn from_transfer(group_id: GroupId, transfer: &Transfer) -> Result<Self> {
        Self::unsettled(
            group_id,
            transfer.from.clone(),
            transfer.to.clone(),
            transfer.amount,
        )
    }

    /// The two signed obligation entries this row contributes to a run:
    /// the creditor is owed `amount`, the debtor owes it.
    #[must_use]
    pub fn obligations(&self) -> [Obligation; 2] {
        [
            Obligation::new(self.creditor_id.clone(), self.amount),
            Obligation::new(self.debtor_id.clone(), -self.amount),
        ]
    }

    /// Whether `participant` is on either side of this row.
    #[must_use]
    pub fn involves(&self, participant: &ParticipantId) -> bool {
        &self.debtor_id == participant || &self.creditor_id == participant
    }
}

/// The unsettled rows of a group, together with the version they were read at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsettledSnapshot {
    pub version: LedgerVersion,
    pub records: Vec<LedgerRecord>,
}

impl UnsettledSnapshot {
    /// Flatten every row into signed obligation entries.
    #[must_use]
    pub fn obligations(&self) -> Vec<Obligation> {
        self.records
            .iter()
            .flat_map(LedgerRecord::obligations)
            .collect()
    }
}
