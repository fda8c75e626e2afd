//! Settlement engine: the entry points callers use.
//!
//! A settlement run for a group:
//! 1. Normalize the caller's ad-hoc obligation entries
//! 2. Take the group lock (bounded wait)
//! 3. Read the group's unsettled rows and their version
//! 4. Aggregate rows + ad-hoc entries, match, verify
//! 5. Replace the unsettled rows with the computed transfers (CAS on version)
//!
//! Any failure aborts the run; nothing is retried here.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use settleup_core::{SettlementPlan, compute_plan};
use settleup_types::{
    EngineConfig, GroupId, LedgerRecord, LedgerRecordId, LedgerVersion, NetBalances, Obligation,
    ObligationEntry, ParticipantRef, Result, Transfer, UnsettledSnapshot, normalize_all,
};

use crate::applier::apply_transfers;
use crate::group_lock::GroupLocks;
use crate::LedgerStore;

/// What a settlement run (or preview) produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReport {
    pub group_id: GroupId,
    /// Net balance per participant the transfers were computed from.
    pub balances: NetBalances,
    /// Debtor → creditor payments that clear every balance.
    pub transfers: Vec<Transfer>,
    /// Group version after the run (the read version for a preview).
    pub ledger_version: LedgerVersion,
    /// Hex SHA-256 fingerprint of `transfers`.
    pub transfer_root: String,
    /// Whether the transfers were written to the ledger.
    pub persisted: bool,
}

/// Runs settlements against a [`LedgerStore`], one at a time per group.
pub struct SettlementEngine<S: LedgerStore + ?Sized> {
    store: Arc<S>,
    locks: GroupLocks,
    config: EngineConfig,
}

impl<S: LedgerStore + ?Sized> SettlementEngine<S> {
    /// Build an engine over `store`.
    ///
    /// # Errors
    /// `Configuration` if `config` fails validation.
    pub fn new(store: Arc<S>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            locks: GroupLocks::new(),
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Recompute and persist the minimal transfer set for `group`.
    ///
    /// `ad_hoc` entries are merged with the group's unsettled rows; they are
    /// not persisted on their own, only through the transfers they influence.
    ///
    /// # Errors
    /// - `InvalidParticipant` if an ad-hoc entry cannot be normalized
    /// - `LockTimeout` if another run holds the group for too long
    /// - `UnbalancedObligations` / `MatchingFailed` / `ConservationViolation`
    /// - `VersionConflict` if the ledger changed under the run
    /// - `Store` for backend failures
    pub async fn run_settlement(
        &self,
        group: &GroupId,
        ad_hoc: &[ObligationEntry],
    ) -> Result<SettlementReport> {
        let ad_hoc = normalize_all(ad_hoc)?;
        let outcome = self.run_locked(group, ad_hoc).await;
        self.locks.release_if_idle(group);
        outcome
    }

    async fn run_locked(&self, group: &GroupId, ad_hoc: Vec<Obligation>) -> Result<SettlementReport> {
        let _guard = self
            .locks
            .acquire(group, self.config.lock_timeout())
            .await?;

        let snapshot = self.store.fetch_unsettled(group).await?;
        let plan = self.plan(&snapshot, ad_hoc)?;

        let applied = match apply_transfers(&*self.store, group, &snapshot, &plan.transfers).await
        {
            Ok(applied) => applied,
            Err(err) => {
                if err.is_contention() {
                    tracing::warn!(group = %group, error = %err, "Settlement run lost a ledger race");
                } else {
                    tracing::warn!(group = %group, error = %err, "Settlement apply failed");
                }
                return Err(err);
            }
        };

        let report = SettlementReport {
            group_id: group.clone(),
            transfer_root: plan.transfer_root_hex(),
            balances: plan.balances,
            transfers: plan.transfers,
            ledger_version: applied.version,
            persisted: applied.written,
        };
        tracing::info!(
            group = %group,
            transfers = report.transfers.len(),
            replaced = snapshot.records.len(),
            version = %report.ledger_version,
            root = %report.transfer_root,
            persisted = report.persisted,
            "Settlement run complete"
        );
        Ok(report)
    }

    /// Compute what [`run_settlement`](Self::run_settlement) would write,
    /// without taking the group lock or touching the ledger.
    ///
    /// # Errors
    /// Same input and consistency errors as `run_settlement`, plus `Store`
    /// if the read fails.
    pub async fn preview_settlement(
        &self,
        group: &GroupId,
        ad_hoc: &[ObligationEntry],
    ) -> Result<SettlementReport> {
        let ad_hoc = normalize_all(ad_hoc)?;
        let snapshot = self.store.fetch_unsettled(group).await?;
        let plan = self.plan(&snapshot, ad_hoc)?;
        Ok(SettlementReport {
            group_id: group.clone(),
            transfer_root: plan.transfer_root_hex(),
            balances: plan.balances,
            transfers: plan.transfers,
            ledger_version: snapshot.version,
            persisted: false,
        })
    }

    /// Flag one ledger row as paid.
    ///
    /// # Errors
    /// `RecordNotFound` or `AlreadySettled` from the store.
    pub async fn mark_settled(&self, id: LedgerRecordId) -> Result<LedgerRecord> {
        let record = self.store.mark_settled(id).await?;
        tracing::info!(
            group = %record.group_id,
            record = %id,
            debtor = %record.debtor_id,
            creditor = %record.creditor_id,
            amount = %record.amount,
            "Ledger record marked settled"
        );
        Ok(record)
    }

    /// The group's outstanding rows.
    pub async fn unsettled_records(&self, group: &GroupId) -> Result<Vec<LedgerRecord>> {
        Ok(self.store.fetch_unsettled(group).await?.records)
    }

    /// Every row of `group` where `participant` pays or receives, newest first.
    ///
    /// # Errors
    /// `InvalidParticipant` if the reference cannot be normalized.
    pub async fn participant_records(
        &self,
        group: &GroupId,
        participant: &ParticipantRef,
    ) -> Result<Vec<LedgerRecord>> {
        let participant = participant.normalize()?;
        self.store.records_for_participant(group, &participant).await
    }

    fn plan(
        &self,
        snapshot: &UnsettledSnapshot,
        ad_hoc: Vec<Obligation>,
    ) -> Result<SettlementPlan> {
        let mut obligations = snapshot.obligations();
        obligations.extend(ad_hoc);
        compute_plan(&obligations, self.config.balance_epsilon)
    }
}

impl<S: LedgerStore + ?Sized> std::fmt::Debug for SettlementEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementEngine")
            .field("config", &self.config)
            .field("locked_groups", &self.locks.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rust_decimal::Decimal;
    use settleup_types::{ParticipantId, SettleupError};

    use super::*;
    use crate::MemoryLedgerStore;

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::named(s)
    }

    fn d(n: i64) -> Decimal {
        Decimal::new(n, 0)
    }

    fn engine() -> SettlementEngine<MemoryLedgerStore> {
        SettlementEngine::new(Arc::new(MemoryLedgerStore::new()), EngineConfig::default())
            .unwrap()
    }

    fn owes(debtor: &str, creditor: &str, n: i64) -> [ObligationEntry; 2] {
        ObligationEntry::pair(debtor, creditor, d(n))
    }

    #[tokio::test]
    async fn ad_hoc_only_run_persists_transfers() {
        let engine = engine();
        let g = GroupId::new("trip");
        let entries: Vec<_> = owes("B", "A", 60)
            .into_iter()
            .chain(owes("C", "A", 40))
            .collect();

        let report = engine.run_settlement(&g, &entries).await.unwrap();
        assert!(report.persisted);
        assert_eq!(
            report.transfers,
            vec![
                Transfer::new(pid("B"), pid("A"), d(60)).unwrap(),
                Transfer::new(pid("C"), pid("A"), d(40)).unwrap(),
            ]
        );
        assert_eq!(report.ledger_version, LedgerVersion(1));
        assert_eq!(engine.unsettled_records(&g).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn ledger_rows_merge_with_ad_hoc() {
        let engine = engine();
        let g = GroupId::new("flat");
        engine
            .store()
            .record_obligation(&g, pid("B"), pid("A"), d(30))
            .await
            .unwrap();

        // A now owes B 30 on a new expense: everything nets out.
        let report = engine
            .run_settlement(&g, &owes("A", "B", 30))
            .await
            .unwrap();
        assert!(report.transfers.is_empty());
        assert!(report.persisted);
        assert!(engine.unsettled_records(&g).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn preview_leaves_ledger_untouched() {
        let engine = engine();
        let g = GroupId::new("flat");
        engine
            .store()
            .record_obligation(&g, pid("B"), pid("A"), d(30))
            .await
            .unwrap();
        let before = engine.unsettled_records(&g).await.unwrap();

        let preview = engine
            .preview_settlement(&g, &owes("C", "A", 10))
            .await
            .unwrap();
        assert!(!preview.persisted);
        assert_eq!(preview.transfers.len(), 2);
        assert_eq!(preview.ledger_version, LedgerVersion(1));
        assert_eq!(engine.unsettled_records(&g).await.unwrap(), before);

        let run = engine.run_settlement(&g, &owes("C", "A", 10)).await.unwrap();
        assert_eq!(run.transfer_root, preview.transfer_root);
    }

    #[tokio::test]
    async fn unbalanced_ad_hoc_rejected_before_write() {
        let engine = engine();
        let g = GroupId::new("g");
        let entries = vec![ObligationEntry::new("A", d(10))];
        let err = engine.run_settlement(&g, &entries).await.unwrap_err();
        assert!(matches!(err, SettleupError::UnbalancedObligations { .. }));
        assert_eq!(engine.store().version(&g).await, LedgerVersion(0));
    }

    #[tokio::test]
    async fn invalid_participant_rejected() {
        let engine = engine();
        let entries = vec![
            ObligationEntry::new("A", d(10)),
            ObligationEntry::new("", d(-10)),
        ];
        let err = engine
            .run_settlement(&GroupId::new("g"), &entries)
            .await
            .unwrap_err();
        assert!(matches!(err, SettleupError::InvalidParticipant { .. }));
    }

    #[tokio::test]
    async fn held_group_times_out() {
        let config = EngineConfig {
            lock_timeout_ms: 20,
            ..EngineConfig::default()
        };
        let engine = SettlementEngine::new(Arc::new(MemoryLedgerStore::new()), config).unwrap();
        let g = GroupId::new("busy");
        let _held = engine
            .locks
            .acquire(&g, Duration::from_millis(20))
            .await
            .unwrap();

        let err = engine.run_settlement(&g, &[]).await.unwrap_err();
        assert!(matches!(err, SettleupError::LockTimeout { timeout_ms: 20, .. }));
        assert!(err.is_contention());
    }

    #[tokio::test]
    async fn mark_settled_then_rerun_excludes_paid_row() {
        let engine = engine();
        let g = GroupId::new("g");
        let report = engine
            .run_settlement(
                &g,
                &owes("B", "A", 60).into_iter().chain(owes("C", "A", 40)).collect::<Vec<_>>(),
            )
            .await
            .unwrap();
        assert_eq!(report.transfers.len(), 2);

        let rows = engine.unsettled_records(&g).await.unwrap();
        let paid = rows.iter().find(|r| r.debtor_id == pid("B")).unwrap();
        let settled = engine.mark_settled(paid.id).await.unwrap();
        assert!(settled.settled);

        let rerun = engine.run_settlement(&g, &[]).await.unwrap();
        assert_eq!(
            rerun.transfers,
            vec![Transfer::new(pid("C"), pid("A"), d(40)).unwrap()]
        );
        assert_eq!(engine.store().all_records(&g).await.len(), 2);
    }

    #[tokio::test]
    async fn participant_records_accept_any_reference_shape() {
        let engine = engine();
        let g = GroupId::new("g");
        let oid = "64f1a2b3c4d5e6f7a8b9c0d1";
        engine
            .store()
            .record_obligation(&g, pid(oid), pid("A"), d(5))
            .await
            .unwrap();

        let by_record: ParticipantRef =
            serde_json::from_str(&format!(r#"{{"_id":"{oid}"}}"#)).unwrap();
        let by_wrapped = ParticipantRef::Raw(format!("ObjectId(\"{oid}\")"));
        assert_eq!(engine.participant_records(&g, &by_record).await.unwrap().len(), 1);
        assert_eq!(engine.participant_records(&g, &by_wrapped).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn lock_registry_empties_after_runs() {
        let engine = engine();
        for i in 0..100 {
            let g = GroupId::new(format!("g{i}"));
            engine.run_settlement(&g, &owes("B", "A", 1)).await.unwrap();
        }
        let err = engine
            .run_settlement(&GroupId::new("bad"), &[ObligationEntry::new("A", d(1))])
            .await
            .unwrap_err();
        assert!(matches!(err, SettleupError::UnbalancedObligations { .. }));
        assert!(engine.locks.is_empty());
    }

    #[test]
    fn zero_epsilon_config_rejected() {
        let config = EngineConfig {
            balance_epsilon: Decimal::ZERO,
            ..EngineConfig::default()
        };
        let err = SettlementEngine::new(Arc::new(MemoryLedgerStore::new()), config).unwrap_err();
        assert!(matches!(err, SettleupError::Configuration(_)));
    }

    #[tokio::test]
    async fn dyn_store_engine() {
        let store: Arc<dyn LedgerStore> = Arc::new(MemoryLedgerStore::new());
        let engine = SettlementEngine::new(store, EngineConfig::default()).unwrap();
        let report = engine.run_settlement(&GroupId::new("g"), &[]).await.unwrap();
        assert!(!report.persisted);
        assert!(report.transfers.is_empty());
    }
}
