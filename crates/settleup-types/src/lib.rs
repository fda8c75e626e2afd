//! # settleup-types
//!
//! Shared types, errors, and configuration for the **SettleUp** settlement
//! engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`ParticipantId`], [`ParticipantRef`], [`GroupId`], [`LedgerRecordId`], [`LedgerVersion`]
//! - **Obligation model**: [`ObligationEntry`], [`Obligation`]
//! - **Balance model**: [`NetBalances`], [`is_dust`]
//! - **Transfer model**: [`Transfer`]
//! - **Ledger model**: [`LedgerRecord`], [`UnsettledSnapshot`]
//! - **Configuration**: [`EngineConfig`]
//! - **Errors**: [`SettleupError`] with `SU_ERR_` prefix codes
//! - **Constants**: defaults and limits

pub mod balance;
pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod ledger;
pub mod obligation;
pub mod transfer;

// Re-export all primary types at crate root for ergonomic imports:
//   use settleup_types::{ParticipantId, Transfer, LedgerRecord, ...};

pub use balance::*;
pub use config::*;
pub use error::*;
pub use ids::*;
pub use ledger::*;
pub use obligation::*;
pub use transfer::*;

// Constants are accessed via `settleup_types::constants::FOO`
// (not re-exported to avoid name collisions).
