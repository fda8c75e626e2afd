//! Property tests for the settlement core.
//!
//! For arbitrary balanced obligation sets the core must:
//! - conserve value (balances sum to zero, debits == credits)
//! - stay within `participants - 1` transfers
//! - zero every balance when the transfers are applied
//! - never emit a self-transfer
//! - produce the same sequence on every run

use proptest::prelude::*;
use rust_decimal::Decimal;
use settleup_core::{aggregate, compute_plan, compute_transfer_root, match_transfers};
use settleup_types::{
    NetBalances, Obligation, ParticipantId, SettleupError, balance_sum, is_dust,
};

fn eps() -> Decimal {
    Decimal::new(1, 2)
}

/// Expenses as (payer index, debtor index, cents) over `n` participants.
fn expenses() -> impl Strategy<Value = Vec<(usize, usize, i64)>> {
    prop::collection::vec((0usize..8, 0usize..8, 1i64..1_000_000), 0..40)
}

/// Same shape, amounts in thousandths: sub-cent remainders are common.
fn milli_expenses() -> impl Strategy<Value = Vec<(usize, usize, i64)>> {
    prop::collection::vec((0usize..6, 0usize..6, 1i64..20_000), 0..30)
}

fn obligations(expenses: &[(usize, usize, i64)]) -> Vec<Obligation> {
    obligations_at_scale(expenses, 2)
}

fn obligations_at_scale(expenses: &[(usize, usize, i64)], scale: u32) -> Vec<Obligation> {
    expenses
        .iter()
        .filter(|(payer, debtor, _)| payer != debtor)
        .flat_map(|&(payer, debtor, units)| {
            let amount = Decimal::new(units, scale);
            [
                Obligation::new(ParticipantId::named(&format!("user-{payer}")), amount),
                Obligation::new(ParticipantId::named(&format!("user-{debtor}")), -amount),
            ]
        })
        .collect()
}

proptest! {
    #[test]
    fn balances_sum_to_zero(exp in expenses()) {
        let balances = aggregate(&obligations(&exp), eps()).unwrap();
        prop_assert!(is_dust(balance_sum(&balances), eps()));
        prop_assert!(balances.values().all(|b| !is_dust(*b, eps())));
    }

    #[test]
    fn transfers_within_bound(exp in expenses()) {
        let balances = aggregate(&obligations(&exp), eps()).unwrap();
        let transfers = match_transfers(&balances, eps()).unwrap();
        prop_assert!(transfers.len() <= balances.len().saturating_sub(1));
    }

    #[test]
    fn applying_transfers_zeroes_balances(exp in expenses()) {
        let balances = aggregate(&obligations(&exp), eps()).unwrap();
        let transfers = match_transfers(&balances, eps()).unwrap();

        let mut remaining: NetBalances = balances.clone();
        for t in &transfers {
            *remaining.get_mut(&t.from).unwrap() += t.amount;
            *remaining.get_mut(&t.to).unwrap() -= t.amount;
        }
        prop_assert!(remaining.values().all(|b| b.is_zero()));

        let debited: Decimal = balances.values().filter(|b| b.is_sign_negative()).map(|b| -*b).sum();
        let credited: Decimal = balances.values().filter(|b| b.is_sign_positive()).copied().sum();
        let paid: Decimal = transfers.iter().map(|t| t.amount).sum();
        prop_assert_eq!(debited, paid);
        prop_assert_eq!(credited, paid);
    }

    #[test]
    fn no_self_transfers_and_positive_amounts(exp in expenses()) {
        let plan = compute_plan(&obligations(&exp), eps()).unwrap();
        for t in &plan.transfers {
            prop_assert_ne!(&t.from, &t.to);
            prop_assert!(t.amount > Decimal::ZERO);
        }
    }

    #[test]
    fn matcher_is_deterministic(exp in expenses()) {
        let obs = obligations(&exp);
        let mut reversed = obs.clone();
        reversed.reverse();

        let a = compute_plan(&obs, eps()).unwrap();
        let b = compute_plan(&obs, eps()).unwrap();
        let c = compute_plan(&reversed, eps()).unwrap();
        prop_assert_eq!(&a.transfers, &b.transfers);
        // Entry order does not change the balances, so it cannot change the transfers.
        prop_assert_eq!(&a.transfers, &c.transfers);
        prop_assert_eq!(a.transfer_root, compute_transfer_root(&c.transfers));
    }

    #[test]
    fn sub_cent_amounts_settle_exactly(exp in milli_expenses()) {
        let obs = obligations_at_scale(&exp, 3);
        match compute_plan(&obs, eps()) {
            Ok(plan) => {
                prop_assert!(plan.transfers.len() <= plan.balances.len().saturating_sub(1));
                let mut remaining = plan.balances.clone();
                for t in &plan.transfers {
                    *remaining.get_mut(&t.from).unwrap() += t.amount;
                    *remaining.get_mut(&t.to).unwrap() -= t.amount;
                }
                prop_assert!(remaining.values().all(|b| is_dust(*b, eps())));
                // Transfers move value, never create it.
                prop_assert_eq!(balance_sum(&remaining), balance_sum(&plan.balances));
            }
            // Only the aggregator may refuse: several excluded dust balances
            // can add up past epsilon. Matching itself must never fail.
            Err(err) => prop_assert!(
                matches!(err, SettleupError::UnbalancedObligations { .. }),
                "unexpected failure: {}", err
            ),
        }
    }

    #[test]
    fn sub_cent_balances_above_epsilon_always_match(exp in milli_expenses()) {
        let obs = obligations_at_scale(&exp, 3);
        let raw = aggregate(&obs, Decimal::new(1, 6)).unwrap();
        prop_assume!(raw.values().all(|b| !is_dust(*b, eps())));

        let balances = aggregate(&obs, eps()).unwrap();
        let transfers = match_transfers(&balances, eps()).unwrap();
        let paid: Decimal = transfers.iter().map(|t| t.amount).sum();
        let credited: Decimal = balances.values().filter(|b| b.is_sign_positive()).copied().sum();
        prop_assert_eq!(paid, credited);
    }
}
