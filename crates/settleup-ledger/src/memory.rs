//! In-memory [`LedgerStore`].
//!
//! Holds every group ledger behind one `RwLock`; a replace takes the write
//! lock, checks the version, and swaps the unsettled rows in a single
//! critical section, which is what makes it atomic for readers.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use settleup_types::{
    GroupId, LedgerRecord, LedgerRecordId, LedgerVersion, ParticipantId, Result, SettleupError,
    UnsettledSnapshot,
};
use tokio::sync::RwLock;

use crate::LedgerStore;

#[derive(Debug, Default)]
struct GroupLedger {
    version: LedgerVersion,
    /// Insertion order doubles as creation order.
    records: Vec<LedgerRecord>,
}

/// Reference ledger store for tests, demos and the CLI.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    groups: RwLock<HashMap<GroupId, GroupLedger>>,
}

impl MemoryLedgerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record "`debtor` owes `creditor` `amount`" as a new unsettled row.
    ///
    /// This is what the expense-entry side does when an expense split is
    /// saved; it bumps the group version like any other ledger mutation.
    pub async fn record_obligation(
        &self,
        group: &GroupId,
        debtor: ParticipantId,
        creditor: ParticipantId,
        amount: Decimal,
    ) -> Result<LedgerRecord> {
        let record = LedgerRecord::unsettled(group.clone(), debtor, creditor, amount)?;
        let mut groups = self.groups.write().await;
        let ledger = groups.entry(group.clone()).or_default();
        ledger.records.push(record.clone());
        ledger.version = ledger.version.next();
        Ok(record)
    }

    /// Every row of `group`, settled or not, in creation order.
    pub async fn all_records(&self, group: &GroupId) -> Vec<LedgerRecord> {
        self.groups
            .read()
            .await
            .get(group)
            .map(|ledger| ledger.records.clone())
            .unwrap_or_default()
    }

    /// Current version of `group`.
    pub async fn version(&self, group: &GroupId) -> LedgerVersion {
        self.groups
            .read()
            .await
            .get(group)
            .map(|ledger| ledger.version)
            .unwrap_or_default()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn fetch_unsettled(&self, group: &GroupId) -> Result<UnsettledSnapshot> {
        let groups = self.groups.read().await;
        let Some(ledger) = groups.get(group) else {
            return Ok(UnsettledSnapshot::default());
        };
        Ok(UnsettledSnapshot {
            version: ledger.version,
            records: ledger
                .records
                .iter()
                .filter(|r| !r.settled)
                .cloned()
                .collect(),
        })
    }

    async fn replace_unsettled(
        &self,
        group: &GroupId,
        expected: LedgerVersion,
        records: Vec<LedgerRecord>,
    ) -> Result<LedgerVersion> {
        if let Some(bad) = records.iter().find(|r| &r.group_id != group || r.settled) {
            return Err(SettleupError::Store(format!(
                "replacement row {} must be an unsettled row of {group}",
                bad.id
            )));
        }

        let mut groups = self.groups.write().await;
        let ledger = groups.entry(group.clone()).or_default();
        if ledger.version != expected {
            return Err(SettleupError::VersionConflict {
                group: group.clone(),
                expected,
                actual: ledger.version,
            });
        }

        ledger.records.retain(|r| r.settled);
        ledger.records.extend(records);
        ledger.version = ledger.version.next();
        Ok(ledger.version)
    }

    async fn mark_settled(&self, id: LedgerRecordId) -> Result<LedgerRecord> {
        let mut groups = self.groups.write().await;
        for ledger in groups.values_mut() {
            let Some(record) = ledger.records.iter_mut().find(|r| r.id == id) else {
                continue;
            };
            if record.settled {
                return Err(SettleupError::AlreadySettled(id));
            }
            record.settled = true;
            record.updated_at = Utc::now();
            let updated = record.clone();
            ledger.version = ledger.version.next();
            return Ok(updated);
        }
        Err(SettleupError::RecordNotFound(id))
    }

    async fn records_for_participant(
        &self,
        group: &GroupId,
        participant: &ParticipantId,
    ) -> Result<Vec<LedgerRecord>> {
        let groups = self.groups.read().await;
        let mut records: Vec<LedgerRecord> = groups
            .get(group)
            .map(|ledger| {
                ledger
                    .records
                    .iter()
                    .filter(|r| r.involves(participant))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::named(s)
    }

    fn group() -> GroupId {
        GroupId::new("flat-42")
    }

    #[tokio::test]
    async fn unknown_group_is_empty() {
        let store = MemoryLedgerStore::new();
        let snap = store.fetch_unsettled(&group()).await.unwrap();
        assert!(snap.records.is_empty());
        assert_eq!(snap.version, LedgerVersion(0));
    }

    #[tokio::test]
    async fn record_obligation_bumps_version() {
        let store = MemoryLedgerStore::new();
        store
            .record_obligation(&group(), pid("B"), pid("A"), Decimal::new(10, 0))
            .await
            .unwrap();
        let snap = store.fetch_unsettled(&group()).await.unwrap();
        assert_eq!(snap.version, LedgerVersion(1));
        assert_eq!(snap.records.len(), 1);
    }

    #[tokio::test]
    async fn replace_swaps_unsettled_keeps_settled() {
        let store = MemoryLedgerStore::new();
        let paid = store
            .record_obligation(&group(), pid("B"), pid("A"), Decimal::new(5, 0))
            .await
            .unwrap();
        store
            .record_obligation(&group(), pid("C"), pid("A"), Decimal::new(7, 0))
            .await
            .unwrap();
        store.mark_settled(paid.id).await.unwrap();

        let snap = store.fetch_unsettled(&group()).await.unwrap();
        assert_eq!(snap.records.len(), 1);

        let fresh =
            LedgerRecord::unsettled(group(), pid("C"), pid("B"), Decimal::new(3, 0)).unwrap();
        let v = store
            .replace_unsettled(&group(), snap.version, vec![fresh.clone()])
            .await
            .unwrap();
        assert_eq!(v, snap.version.next());

        let all = store.all_records(&group()).await;
        assert_eq!(all.len(), 2);
        assert!(all.iter().any(|r| r.id == paid.id && r.settled));
        assert!(all.iter().any(|r| r.id == fresh.id && !r.settled));
    }

    #[tokio::test]
    async fn stale_version_rejected_without_write() {
        let store = MemoryLedgerStore::new();
        store
            .record_obligation(&group(), pid("B"), pid("A"), Decimal::new(5, 0))
            .await
            .unwrap();
        let err = store
            .replace_unsettled(&group(), LedgerVersion(0), vec![])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SettleupError::VersionConflict { expected: LedgerVersion(0), actual: LedgerVersion(1), .. }
        ));
        assert_eq!(store.all_records(&group()).await.len(), 1);
    }

    #[tokio::test]
    async fn foreign_rows_rejected() {
        let store = MemoryLedgerStore::new();
        let other =
            LedgerRecord::unsettled(GroupId::new("other"), pid("B"), pid("A"), Decimal::ONE)
                .unwrap();
        let err = store
            .replace_unsettled(&group(), LedgerVersion(0), vec![other])
            .await
            .unwrap_err();
        assert!(matches!(err, SettleupError::Store(_)));
        assert_eq!(store.version(&group()).await, LedgerVersion(0));
    }

    #[tokio::test]
    async fn mark_settled_transitions_once() {
        let store = MemoryLedgerStore::new();
        let r = store
            .record_obligation(&group(), pid("B"), pid("A"), Decimal::new(5, 0))
            .await
            .unwrap();
        let updated = store.mark_settled(r.id).await.unwrap();
        assert!(updated.settled);
        assert!(updated.updated_at >= updated.created_at);
        assert_eq!(store.version(&group()).await, LedgerVersion(2));

        let err = store.mark_settled(r.id).await.unwrap_err();
        assert!(matches!(err, SettleupError::AlreadySettled(id) if id == r.id));
        let err = store.mark_settled(LedgerRecordId::new()).await.unwrap_err();
        assert!(matches!(err, SettleupError::RecordNotFound(_)));
    }

    #[tokio::test]
    async fn participant_records_newest_first() {
        let store = MemoryLedgerStore::new();
        let first = store
            .record_obligation(&group(), pid("B"), pid("A"), Decimal::new(5, 0))
            .await
            .unwrap();
        store
            .record_obligation(&group(), pid("C"), pid("D"), Decimal::new(5, 0))
            .await
            .unwrap();
        let second = store
            .record_obligation(&group(), pid("A"), pid("C"), Decimal::new(2, 0))
            .await
            .unwrap();
        store.mark_settled(first.id).await.unwrap();

        let records = store
            .records_for_participant(&group(), &pid("A"))
            .await
            .unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }
}
