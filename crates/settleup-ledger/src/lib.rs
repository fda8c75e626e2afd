//! # settleup-ledger
//!
//! **Settlement plane**: everything a settlement run does that touches the
//! outside world.
//!
//! ## Architecture
//!
//! [`SettlementEngine`] drives a run for one group:
//! 1. Serializes runs per group ([`GroupLocks`], bounded wait)
//! 2. Reads the unsettled rows and their version from a [`LedgerStore`]
//! 3. Hands rows + ad-hoc entries to `settleup-core` for a verified plan
//! 4. Replaces the unsettled rows with the plan's transfers in one
//!    compare-and-swap ([`apply_transfers`])
//!
//! The engine keeps no ledger state between runs. [`MemoryLedgerStore`] is
//! the in-process store used by tests and the `settleup` CLI.

pub mod applier;
pub mod engine;
pub mod group_lock;
pub mod memory;
pub mod store;

pub use applier::{AppliedSettlement, apply_transfers};
pub use engine::{SettlementEngine, SettlementReport};
pub use group_lock::{GroupGuard, GroupLocks};
pub use memory::MemoryLedgerStore;
pub use store::LedgerStore;
