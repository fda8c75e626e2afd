//! Settlement applier.
//!
//! Turns a computed transfer list into the group's new unsettled ledger:
//! 1. Build one unsettled row per transfer (debtor = `from`, creditor = `to`)
//! 2. Replace every unsettled row of the group in one compare-and-swap
//!    against the version the rows were read at
//!
//! Nothing is written if building a row fails. A store error is passed
//! through untouched; success is only reported once the replace committed.

use settleup_types::{GroupId, LedgerRecord, LedgerVersion, Result, Transfer, UnsettledSnapshot};

use crate::LedgerStore;

/// Outcome of applying a transfer list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedSettlement {
    /// Group version after the apply (unchanged when nothing was written).
    pub version: LedgerVersion,
    /// Rows now outstanding for the group.
    pub records: Vec<LedgerRecord>,
    /// Whether the store was written to.
    pub written: bool,
}

/// Persist `transfers` as the new unsettled ledger of `group`.
///
/// An empty ledger that stays empty is left alone: no write, no version bump.
///
/// # Errors
/// - `InvalidAmount` / `SelfTransfer` if a transfer cannot become a row
/// - `VersionConflict` if the group changed since `snapshot` was read
/// - `Store` if the backend failed
pub async fn apply_transfers<S>(
    store: &S,
    group: &GroupId,
    snapshot: &UnsettledSnapshot,
    transfers: &[Transfer],
) -> Result<AppliedSettlement>
where
    S: LedgerStore + ?Sized,
{
    if snapshot.records.is_empty() && transfers.is_empty() {
        return Ok(AppliedSettlement {
            version: snapshot.version,
            records: Vec::new(),
            written: false,
        });
    }

    let records = transfers
        .iter()
        .map(|t| LedgerRecord::from_transfer(group.clone(), t))
        .collect::<Result<Vec<_>>>()?;

    let version = store
        .replace_unsettled(group, snapshot.version, records.clone())
        .await?;

    tracing::debug!(
        group = %group,
        replaced = snapshot.records.len(),
        inserted = records.len(),
        version = %version,
        "Unsettled ledger replaced"
    );

    Ok(AppliedSettlement {
        version,
        records,
        written: true,
    })
}
