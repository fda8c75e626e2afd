//! The ledger store boundary.
//!
//! The engine does not own persistence. It talks to whatever durable table
//! holds a group's obligation rows through [`LedgerStore`]. Implementations
//! must make [`LedgerStore::replace_unsettled`] a single atomic step: readers
//! see either the old unsettled rows or the new ones, never a mix, and a
//! failed replace leaves the old rows in place.

use async_trait::async_trait;
use settleup_types::{
    GroupId, LedgerRecord, LedgerRecordId, LedgerVersion, ParticipantId, Result,
    UnsettledSnapshot,
};

/// Durable storage for group ledgers.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// All unsettled rows of `group` plus the version they were read at.
    /// An unknown group is an empty ledger at the default version.
    async fn fetch_unsettled(&self, group: &GroupId) -> Result<UnsettledSnapshot>;

    /// Atomically drop every unsettled row of `group` and insert `records`.
    ///
    /// Compare-and-swap: only succeeds if the group is still at `expected`.
    /// Settled rows are kept. Returns the new version.
    ///
    /// # Errors
    /// `VersionConflict` if another writer got there first; `Store` for any
    /// backend failure. In both cases nothing was written.
    async fn replace_unsettled(
        &self,
        group: &GroupId,
        expected: LedgerVersion,
        records: Vec<LedgerRecord>,
    ) -> Result<LedgerVersion>;

    /// Flag a single row as paid. Bumps the owning group's version.
    ///
    /// # Errors
    /// `RecordNotFound` for an unknown id, `AlreadySettled` if it was
    /// already flagged.
    async fn mark_settled(&self, id: LedgerRecordId) -> Result<LedgerRecord>;

    /// Every row (settled or not) of `group` where `participant` is the
    /// debtor or the creditor, newest first.
    async fn records_for_participant(
        &self,
        group: &GroupId,
        participant: &ParticipantId,
    ) -> Result<Vec<LedgerRecord>>;
}
