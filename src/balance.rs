//! Aggregation of payer and split allocations into net balances.

use std::collections::BTreeMap;

use crate::{
    amount::Amount,
    types::{NetBalances, SavedExpense, UserId},
};

/// Compute the net balance (total paid minus total owed) of every user
/// appearing in at least one of the two allocation lists.
///
/// A positive balance means the user must receive money, a negative one
/// means the user owes money. Users without activity are not in the result.
pub fn compute_balances(payers: &[(UserId, Amount)], splits: &[(UserId, Amount)]) -> NetBalances {
    let mut balances = NetBalances::new();

    for &(user_id, paid) in payers {
        *balances.entry(user_id).or_default() += paid;
    }
    for &(user_id, owed) in splits {
        *balances.entry(user_id).or_default() -= owed;
    }

    balances
}

/// The net effect of a single expense on each user involved in it.
pub fn expense_impacts(expense: &SavedExpense) -> BTreeMap<UserId, Amount> {
    let payers: Vec<_> = expense
        .payers
        .iter()
        .map(|p| (p.user_id, p.paid_amount))
        .collect();
    let splits: Vec<_> = expense
        .splits
        .iter()
        .map(|s| (s.user_id, s.amount_owed))
        .collect();
    compute_balances(&payers, &splits)
}

pub fn total(balances: &NetBalances) -> Amount {
    balances.values().sum()
}
