use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{amount::Amount, error::InputError};

pub type UserId = i64;
pub type GroupId = i64;
pub type ExpenseId = i64;

/// Net balance of every user with some activity in a group, keyed (and
/// therefore iterated) by user id.
pub type NetBalances = BTreeMap<UserId, Amount>;

pub const DEFAULT_CATEGORY: &str = "General";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Option<String>,
    /// Ghost users have no login credentials: they were added to a group by name only.
    pub is_ghost: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayerAllocation {
    pub user_id: UserId,
    pub paid_amount: Amount,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitAllocation {
    pub user_id: UserId,
    #[serde(alias = "amount")]
    pub amount_owed: Amount,
}

/// An expense as submitted for creation or replacement.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExpense {
    pub title: String,
    pub description: Option<String>,
    pub amount: Amount,
    pub category: String,
    pub payers: Vec<PayerAllocation>,
    pub splits: Vec<SplitAllocation>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedExpense {
    pub id: ExpenseId,
    pub group_id: GroupId,
    pub title: String,
    pub description: Option<String>,
    pub amount: Amount,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub payers: Vec<PayerAllocation>,
    pub splits: Vec<SplitAllocation>,
}

/// `from_user_id` should pay `amount` to `to_user_id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementTransaction {
    pub from_user_id: UserId,
    pub to_user_id: UserId,
    pub amount: Amount,
}

impl PayerAllocation {
    pub fn new(user_id: UserId, paid_amount: Amount) -> PayerAllocation {
        PayerAllocation {
            user_id,
            paid_amount,
        }
    }
}

impl SplitAllocation {
    pub fn new(user_id: UserId, amount_owed: Amount) -> SplitAllocation {
        SplitAllocation {
            user_id,
            amount_owed,
        }
    }
}

impl NewExpense {
    /// An empty category falls back to [`DEFAULT_CATEGORY`].
    pub fn new(
        title: &str,
        description: Option<String>,
        amount: Amount,
        category: &str,
        payers: Vec<PayerAllocation>,
        splits: Vec<SplitAllocation>,
    ) -> NewExpense {
        let category = if category.trim().is_empty() {
            DEFAULT_CATEGORY.to_string()
        } else {
            category.trim().to_string()
        };
        NewExpense {
            title: title.to_string(),
            description,
            amount,
            category,
            payers,
            splits,
        }
    }

    pub fn total_paid(&self) -> Result<Amount, InputError> {
        Amount::checked_sum(self.payers.iter().map(|p| p.paid_amount))
            .ok_or_else(|| InputError::amount_out_of_range("payments"))
    }

    pub fn total_owed(&self) -> Result<Amount, InputError> {
        Amount::checked_sum(self.splits.iter().map(|s| s.amount_owed))
            .ok_or_else(|| InputError::amount_out_of_range("splits"))
    }
}

impl SavedExpense {
    pub fn date(&self) -> String {
        self.created_at.format("%Y-%m-%d").to_string()
    }
}

impl SettlementTransaction {
    pub fn new(from_user_id: UserId, to_user_id: UserId, amount: Amount) -> SettlementTransaction {
        SettlementTransaction {
            from_user_id,
            to_user_id,
            amount,
        }
    }
}
