//! The algorithm that turns net balances into the payments needed to
//! settle a group.

use std::cmp::Reverse;

use log::Level::Debug;
use log::{debug, log_enabled, warn};
use serde::{Deserialize, Serialize};

use crate::{
    amount::Amount,
    balance,
    types::{NetBalances, SettlementTransaction, UserId},
};

/// Balances of a group together with the payments that settle them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub balances: NetBalances,
    pub transactions: Vec<SettlementTransaction>,
}

impl Settlement {
    pub fn from_balances(balances: NetBalances) -> Settlement {
        let transactions = minimize_debts(&balances);
        Settlement {
            balances,
            transactions,
        }
    }
}

/// Get a list of transactions which settle the given balances. The output
/// is sorted by debtors first and creditors second.
///
/// The algorithm works as follows:
/// - users owing more than one cent are debtors, users owed more than one
///   cent are creditors, everybody else is already settled
/// - debtors are sorted by largest debt first, creditors by largest credit
///   first; both sorts are stable and the balances are iterated by user id,
///   so ties always resolve the same way
/// - the current debtor pays the current creditor the smaller of the two
///   outstanding amounts
/// - whoever is left with at most one cent is done, and the next debtor
///   and/or creditor is picked
/// - stop when there are no more debtors or no more creditors
///
/// At most `debtors + creditors - 1` transactions are produced, each of
/// them larger than one cent. The solution is correct but not necessarily
/// optimal: finding the smallest number of transactions is NP-complete, and
/// this approximation is normally good enough.
pub fn minimize_debts(balances: &NetBalances) -> Vec<SettlementTransaction> {
    let mut debtors: Vec<(UserId, Amount)> = balances
        .iter()
        .filter(|&(_, &b)| b < -Amount::TOLERANCE)
        .map(|(&u, &b)| (u, b))
        .collect();
    let mut creditors: Vec<(UserId, Amount)> = balances
        .iter()
        .filter(|&(_, &b)| b > Amount::TOLERANCE)
        .map(|(&u, &b)| (u, b))
        .collect();

    debtors.sort_by_key(|&(_, b)| b);
    creditors.sort_by_key(|&(_, b)| Reverse(b));

    if log_enabled!(Debug) {
        let sum = balance::total(balances);
        if !sum.approx_eq(Amount::ZERO) {
            debug!("Total sum should be 0 (or within one cent). In reality it is {sum}");
            debug!("{:?}", &debtors);
            debug!("{:?}", &creditors);
        }
    }

    // Running state, the input balances are left untouched.
    let mut remaining_debts: Vec<Amount> = debtors.iter().map(|&(_, b)| -b).collect();
    let mut remaining_credits: Vec<Amount> = creditors.iter().map(|&(_, b)| b).collect();

    let mut result = vec![];
    let (mut d, mut c) = (0, 0);

    while d < debtors.len() && c < creditors.len() {
        let amount = remaining_debts[d].min(remaining_credits[c]);
        if amount.is_positive() {
            result.push(SettlementTransaction::new(
                debtors[d].0,
                creditors[c].0,
                amount,
            ));
        }

        remaining_debts[d] -= amount;
        remaining_credits[c] -= amount;

        if remaining_debts[d] <= Amount::TOLERANCE {
            d += 1;
        }
        if remaining_credits[c] <= Amount::TOLERANCE {
            c += 1;
        }
    }

    if c < creditors.len() {
        let leftovers: Vec<_> = creditors[c..]
            .iter()
            .zip(&remaining_credits[c..])
            .map(|(&(u, _), &a)| (u, a))
            .collect();
        warn!("We ran out of debtors but we still have creditors: {leftovers:?}");
    } else if d < debtors.len() {
        let leftovers: Vec<_> = debtors[d..]
            .iter()
            .zip(&remaining_debts[d..])
            .map(|(&(u, _), &a)| (u, a))
            .collect();
        warn!("We ran out of creditors but we still have debtors: {leftovers:?}");
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cents(n: i64) -> Amount {
        Amount::from_cents(n)
    }

    fn balances(entries: &[(UserId, i64)]) -> NetBalances {
        entries.iter().map(|&(u, c)| (u, cents(c))).collect()
    }

    fn tx(from: UserId, to: UserId, amount: i64) -> SettlementTransaction {
        SettlementTransaction::new(from, to, cents(amount))
    }

    #[test]
    fn test_one_creditor_two_debtors() {
        let input = balances(&[(1, -3000), (2, -1000), (3, 4000)]);
        assert_eq!(minimize_debts(&input), vec![tx(1, 3, 3000), tx(2, 3, 1000)]);
    }

    #[test]
    fn test_debt_split_across_creditors() {
        let input = balances(&[(1, -500), (2, -500), (3, 700), (4, 300)]);
        assert_eq!(
            minimize_debts(&input),
            vec![tx(1, 3, 500), tx(2, 3, 200), tx(2, 4, 300)]
        );
    }

    #[test]
    fn test_largest_first() {
        let input = balances(&[(1, -100), (2, -900), (3, 200), (4, 800)]);
        assert_eq!(
            minimize_debts(&input),
            vec![tx(2, 4, 800), tx(2, 3, 100), tx(1, 3, 100)]
        );
    }

    #[test]
    fn test_settled_users_are_ignored() {
        assert!(minimize_debts(&balances(&[(1, -1), (2, 1), (3, 0)])).is_empty());
        assert!(minimize_debts(&NetBalances::new()).is_empty());
    }

    #[test]
    fn test_no_transaction_of_one_cent() {
        // The debtor is left with one cent after paying the only creditor.
        let input = balances(&[(1, -1000), (2, 999), (3, 1)]);
        assert_eq!(minimize_debts(&input), vec![tx(1, 2, 999)]);
    }

    #[test]
    fn test_ties_are_deterministic() {
        let input = balances(&[(4, 500), (2, -500), (3, 500), (1, -500)]);
        let expected = vec![tx(1, 3, 500), tx(2, 4, 500)];
        assert_eq!(minimize_debts(&input), expected);
        assert_eq!(minimize_debts(&input), expected);
    }

    #[test]
    fn test_greedy_is_not_optimal() {
        // Three payments are enough: 2 pays 4 3.00, 1 pays 3 6.00 and 5 2.00.
        // Largest-first matching splits user 4's credit and needs four.
        let input = balances(&[(1, -800), (2, -300), (3, 600), (4, 300), (5, 200)]);
        assert_eq!(
            minimize_debts(&input),
            vec![tx(1, 3, 600), tx(1, 4, 200), tx(2, 4, 100), tx(2, 5, 200)]
        );
    }

    #[test]
    fn test_unbalanced_input() {
        let input = balances(&[(1, -1000), (2, 400)]);
        assert_eq!(minimize_debts(&input), vec![tx(1, 2, 400)]);

        let input = balances(&[(1, -400), (2, 600), (3, 400)]);
        assert_eq!(minimize_debts(&input), vec![tx(1, 2, 400)]);
    }

    #[test]
    fn test_properties_on_generated_balances() {
        // Small linear congruential generator, so the cases are reproducible.
        let mut seed: u64 = 42;
        let mut next = move |bound: i64| {
            seed = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((seed >> 33) % bound as u64) as i64
        };

        for _ in 0..200 {
            let num_users = 2 + next(8);
            let mut input = NetBalances::new();
            let mut sum = 0;
            for user_id in 1..num_users {
                let cents = next(20001) - 10000;
                input.insert(user_id, Amount::from_cents(cents));
                sum += cents;
            }
            input.insert(num_users, Amount::from_cents(-sum));

            let num_debtors = input.values().filter(|&&b| b < -Amount::TOLERANCE).count();
            let num_creditors = input.values().filter(|&&b| b > Amount::TOLERANCE).count();

            let transactions = minimize_debts(&input);

            if num_debtors > 0 && num_creditors > 0 {
                assert!(transactions.len() <= num_debtors + num_creditors - 1);
            } else {
                assert!(transactions.is_empty());
            }

            let mut after = input.clone();
            for t in &transactions {
                assert!(t.amount > Amount::TOLERANCE);
                *after.entry(t.from_user_id).or_default() += t.amount;
                *after.entry(t.to_user_id).or_default() -= t.amount;
            }
            // Nobody pays or receives more than their balance.
            for (user_id, b) in after {
                let before = input[&user_id];
                assert!(
                    b.abs() <= before.abs()
                        && !(b.is_positive() && before.is_negative())
                        && !(b.is_negative() && before.is_positive()),
                    "user {user_id} went from {before} to {b} in {input:?}"
                );
            }
        }
    }

    #[test]
    fn test_settlement_json() -> anyhow::Result<()> {
        let settlement = Settlement::from_balances(balances(&[(1, -3000), (2, 3000)]));
        let json = serde_json::to_value(&settlement)?;
        assert_eq!(
            json,
            serde_json::json!({
                "balances": {"1": -30.0, "2": 30.0},
                "transactions": [{"from_user_id": 1, "to_user_id": 2, "amount": 30.0}]
            })
        );
        Ok(())
    }
}
