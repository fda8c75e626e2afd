//! Aggregate → match → verify, as one pure step.
//!
//! ```text
//! compute_plan(obligations) -> SettlementPlan
//! ```
//!
//! This is everything a settlement run does short of touching the ledger.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use settleup_types::{NetBalances, Obligation, Result, Transfer};

use crate::{aggregate, compute_transfer_root, match_transfers, verify_transfers};

/// Result of the in-memory part of a settlement run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPlan {
    /// Net balance per participant, dust removed.
    pub balances: NetBalances,
    /// Debtor → creditor transfers, in computation order.
    pub transfers: Vec<Transfer>,
    /// SHA-256 over `transfers`, see [`compute_transfer_root`].
    #[serde(with = "hex_root")]
    pub transfer_root: [u8; 32],
}

impl SettlementPlan {
    /// `true` when nobody owes anybody anything.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.transfers.is_empty()
    }

    /// `transfer_root` as lowercase hex.
    #[must_use]
    pub fn transfer_root_hex(&self) -> String {
        hex::encode(self.transfer_root)
    }
}

/// Compute the settlement plan for a set of normalized obligations.
///
/// # Errors
/// - `UnbalancedObligations` if the obligations do not sum to zero
/// - `MatchingFailed` if the matcher cannot pair the balances
/// - `ConservationViolation` if the transfers do not clear the balances
pub fn compute_plan(obligations: &[Obligation], epsilon: Decimal) -> Result<SettlementPlan> {
    let balances = aggregate(obligations, epsilon)?;
    let transfers = match_transfers(&balances, epsilon)?;
    verify_transfers(&balances, &transfers, epsilon)?;
    let transfer_root = compute_transfer_root(&transfers);
    Ok(SettlementPlan {
        balances,
        transfers,
        transfer_root,
    })
}

mod hex_root {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(root: &[u8; 32], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(root))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u8; 32], D::Error> {
        let text = String::deserialize(d)?;
        let bytes = hex::decode(&text).map_err(D::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| D::Error::custom("transfer root must be 32 bytes"))
    }
}
