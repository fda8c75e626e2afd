//! The `settle` input document.
//!
//! ```json
//! {
//!   "group_id": "flat-42",
//!   "ledger": [{ "debtor": "bob", "creditor": "alice", "amount": "12.50" }],
//!   "obligations": [{ "participant": { "_id": "64f1…" }, "amount": "-3" }]
//! }
//! ```
//!
//! `ledger` rows are seeded into the store as existing unsettled records;
//! `obligations` are passed to the run as ad-hoc entries.

use rust_decimal::Decimal;
use serde::Deserialize;
use settleup_ledger::MemoryLedgerStore;
use settleup_types::{GroupId, ObligationEntry, ParticipantRef, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct SettleInput {
    pub group_id: GroupId,
    #[serde(default)]
    pub ledger: Vec<LedgerEntry>,
    #[serde(default)]
    pub obligations: Vec<ObligationEntry>,
}

/// "`debtor` owes `creditor` `amount`", as an existing outstanding row.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerEntry {
    pub debtor: ParticipantRef,
    pub creditor: ParticipantRef,
    pub amount: Decimal,
}

impl SettleInput {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write every `ledger` row into `store`. Returns the number of rows seeded.
    pub async fn seed(&self, store: &MemoryLedgerStore) -> Result<usize> {
        for row in &self.ledger {
            store
                .record_obligation(
                    &self.group_id,
                    row.debtor.normalize()?,
                    row.creditor.normalize()?,
                    row.amount,
                )
                .await?;
        }
        Ok(self.ledger.len())
    }
}
