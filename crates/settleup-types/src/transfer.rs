//! Settlement transfers produced by the matcher.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ParticipantId, Result, SettleupError};

/// A single debtor-to-creditor payment that clears (part of) two balances.
///
/// Direction convention: `from` is the debtor who pays, `to` is the creditor
/// who receives. Ledger records use the same convention
/// (`debtor_id == from`, `creditor_id == to`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transfer {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: Decimal,
}

impl Transfer {
    /// Build a transfer, enforcing `amount > 0` and `from != to`.
    pub fn new(from: ParticipantId, to: ParticipantId, amount: Decimal) -> Result<Self> {
        if amount <= Decimal::ZERO {
            return Err(SettleupError::InvalidAmount {
                amount,
                reason: "transfer amount must be positive".into(),
            });
        }
        if from == to {
            return Err(SettleupError::SelfTransfer(from.to_string()));
        }
        Ok(Self { from, to, amount })
    }
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}: {}", self.from, self.to, self.amount)
    }
}
