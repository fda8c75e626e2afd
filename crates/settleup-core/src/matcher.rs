//! Greedy settlement matcher.
//!
//! Turns net balances into a short list of debtor → creditor transfers:
//!
//! 1. Split balances into creditors (> 0) and debtors (< 0, as magnitude)
//! 2. Pop the largest creditor and the largest debtor
//! 3. Transfer `min(creditor, debtor)` from the debtor to the creditor
//! 4. Re-queue whichever side still has a non-zero remainder
//! 5. Repeat until one side is exhausted
//!
//! ## Ordering
//!
//! Both sides are binary heaps ordered by remaining amount (largest first),
//! then by participant id (lexically smallest first). No step depends on hash
//! map iteration order, so the same balances always yield the same transfer
//! sequence.
//!
//! ## Known limitation
//!
//! Greedy pairing is not guaranteed to reach the theoretical minimum number of
//! transfers (that is a subset-sum style problem, NP-hard in general). It does
//! guarantee termination within `participants - 1` transfers and zeroes every
//! balance.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rust_decimal::Decimal;
use settleup_types::{NetBalances, ParticipantId, Result, SettleupError, Transfer, is_dust};

/// One side of a pending match: a participant and their remaining amount.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Party {
    remaining: Decimal,
    id: ParticipantId,
}

impl Ord for Party {
    fn cmp(&self, other: &Self) -> Ordering {
        self.remaining
            .cmp(&other.remaining)
            // Reversed so the max-heap yields the lexically smallest id on ties.
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Party {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compute the transfers that clear `balances`.
///
/// Dust balances in the input are ignored.
///
/// # Errors
/// - [`SettleupError::MatchingFailed`] if a participant shows up on both sides
///   with no other counterparty to pair with, or if a non-dust residual remains
///   once one side is exhausted (the input did not sum to zero).
pub fn match_transfers(balances: &NetBalances, epsilon: Decimal) -> Result<Vec<Transfer>> {
    let mut creditors = BinaryHeap::new();
    let mut debtors = BinaryHeap::new();
    for (id, &amount) in balances {
        if is_dust(amount, epsilon) {
            continue;
        }
        let party = Party {
            remaining: amount.abs(),
            id: id.clone(),
        };
        if amount > Decimal::ZERO {
            creditors.push(party);
        } else {
            debtors.push(party);
        }
    }
    settle_heaps(creditors, debtors, epsilon)
}

fn settle_heaps(
    mut creditors: BinaryHeap<Party>,
    mut debtors: BinaryHeap<Party>,
    epsilon: Decimal,
) -> Result<Vec<Transfer>> {
    let mut transfers = Vec::with_capacity((creditors.len() + debtors.len()).saturating_sub(1));

    while let Some(creditor) = creditors.pop() {
        let Some(mut debtor) = debtors.pop() else {
            creditors.push(creditor);
            break;
        };

        // A participant on both sides means duplicate ids slipped past
        // aggregation. Pair the creditor with the next debtor instead and put
        // the skipped entry back untouched.
        if debtor.id == creditor.id {
            tracing::warn!(
                participant = %creditor.id,
                "Self-pairing skipped: participant is both creditor and debtor"
            );
            let Some(next) = debtors.pop() else {
                return Err(SettleupError::MatchingFailed {
                    reason: format!(
                        "participant {} is the only remaining debtor and creditor",
                        creditor.id
                    ),
                });
            };
            debtors.push(debtor);
            debtor = next;
        }

        let amount = creditor.remaining.min(debtor.remaining);
        let transfer = Transfer::new(debtor.id.clone(), creditor.id.clone(), amount)?;
        tracing::debug!(
            from = %transfer.from,
            to = %transfer.to,
            amount = %transfer.amount,
            "Transfer matched"
        );
        transfers.push(transfer);

        requeue(&mut creditors, creditor, amount);
        requeue(&mut debtors, debtor, amount);
    }

    let residual: Decimal = creditors
        .iter()
        .chain(debtors.iter())
        .map(|p| p.remaining)
        .sum();
    if !is_dust(residual, epsilon) {
        return Err(SettleupError::MatchingFailed {
            reason: format!(
                "unmatched residual {residual} across {} participant(s)",
                creditors.len() + debtors.len()
            ),
        });
    }

    Ok(transfers)
}

/// Only an exactly-zero remainder leaves the heap. Sub-epsilon remainders
/// stay and are paired later; dropping them would let them accumulate.
fn requeue(heap: &mut BinaryHeap<Party>, mut party: Party, settled: Decimal) {
    party.remaining -= settled;
    if !party.remaining.is_zero() {
        heap.push(party);
    }
}
