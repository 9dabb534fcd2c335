//! Assembly of everything a presentation layer needs to render the
//! statement of a group.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    amount::Amount,
    balance::expense_impacts,
    settlement::Settlement,
    types::{
        ExpenseId, Group, NetBalances, PayerAllocation, SavedExpense, SettlementTransaction, User,
        UserId,
    },
};

pub const UNKNOWN_USER: &str = "Unknown";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRow {
    pub expense_id: ExpenseId,
    pub title: String,
    pub date: String,
    pub payer_names: String,
    pub total: Amount,
    /// Paid minus owed on this expense, for every user involved in it.
    pub impacts: BTreeMap<UserId, Amount>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementReport {
    pub group: Group,
    pub generated_at: DateTime<Utc>,
    /// Ordered by user id.
    pub members: Vec<User>,
    /// Oldest expense first.
    pub rows: Vec<ExpenseRow>,
    pub balances: NetBalances,
    pub transactions: Vec<SettlementTransaction>,
}

impl SettlementReport {
    pub fn member_name(&self, user_id: UserId) -> &str {
        self.members
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.name.as_str())
            .unwrap_or(UNKNOWN_USER)
    }
}

/// `expenses` can be in any order, rows are sorted chronologically.
pub fn assemble_report(
    group: Group,
    members: Vec<User>,
    mut expenses: Vec<SavedExpense>,
    settlement: Settlement,
    generated_at: DateTime<Utc>,
) -> SettlementReport {
    expenses.sort_by_key(|e| (e.created_at, e.id));

    let names = member_names(&members);
    let rows = expenses
        .iter()
        .map(|expense| ExpenseRow {
            expense_id: expense.id,
            title: expense.title.clone(),
            date: expense.date(),
            payer_names: all_payer_names(&expense.payers, &names),
            total: expense.amount,
            impacts: expense_impacts(expense),
        })
        .collect();

    SettlementReport {
        group,
        generated_at,
        members,
        rows,
        balances: settlement.balances,
        transactions: settlement.transactions,
    }
}

pub fn member_names(members: &[User]) -> HashMap<UserId, &str> {
    members.iter().map(|u| (u.id, u.name.as_str())).collect()
}

/// A short description of who paid: the first payer, followed by how many
/// other people contributed.
pub fn payer_display_name(payers: &[PayerAllocation], names: &HashMap<UserId, &str>) -> String {
    match payers {
        [] => UNKNOWN_USER.to_string(),
        [payer] => name_of(payer.user_id, names).to_string(),
        [payer, others @ ..] => {
            format!("{} +{} others", name_of(payer.user_id, names), others.len())
        }
    }
}

fn all_payer_names(payers: &[PayerAllocation], names: &HashMap<UserId, &str>) -> String {
    if payers.is_empty() {
        return UNKNOWN_USER.to_string();
    }
    payers
        .iter()
        .map(|p| name_of(p.user_id, names))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn name_of<'a>(user_id: UserId, names: &HashMap<UserId, &'a str>) -> &'a str {
    names.get(&user_id).copied().unwrap_or(UNKNOWN_USER)
}
