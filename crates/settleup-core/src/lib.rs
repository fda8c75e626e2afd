//! # settleup-core
//!
//! **Pure deterministic settlement core for SettleUp.**
//!
//! The core takes normalized obligation entries and produces the transfers
//! that clear them. It has:
//!
//! - **Zero side effects**: no ledger reads or writes, no locking
//! - **Deterministic output**: same input -> same transfers, same transfer root
//! - **Exact arithmetic**: `rust_decimal` throughout, one shared dust epsilon
//! - **Self-checking**: every plan is verified to zero its balances
//!
//! ```text
//! obligations ─▶ aggregate ─▶ match_transfers ─▶ verify_transfers ─▶ SettlementPlan
//! ```

pub mod aggregator;
pub mod conservation;
pub mod determinism;
pub mod matcher;
pub mod plan;

pub use aggregator::aggregate;
pub use conservation::{total_transferred, verify_transfers};
pub use determinism::{compute_transfer_root, transfer_root_hex, verify_transfer_root};
pub use matcher::match_transfers;
pub use plan::{SettlementPlan, compute_plan};
