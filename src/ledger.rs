//! Entry points of the ledger.
//!
//! Every function receives the storage handle created at startup and
//! performs a single unit of work against it. Nothing is cached: balances
//! and settlements are always recomputed from the stored expenses.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    balance::compute_balances,
    database::Database,
    error::{Entity, InputError, LedgerError, LedgerResult},
    report::{assemble_report, member_names, payer_display_name, SettlementReport},
    settlement::Settlement,
    types::{ExpenseId, Group, GroupId, NetBalances, NewExpense, SavedExpense, User, UserId},
    validator::{splits_match_amount, validate_expense},
};

/// An expense as shown in the list of a group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseSummary {
    #[serde(flatten)]
    pub expense: SavedExpense,
    pub payer_name: String,
}

pub async fn register_user<D: Database>(
    name: &str,
    email: Option<&str>,
    database: &Arc<Mutex<D>>,
) -> LedgerResult<UserId> {
    let user_id = database.lock().await.add_user(name.trim(), email, false)?;
    info!("Registered user {user_id}");
    Ok(user_id)
}

pub async fn create_group<D: Database>(
    name: &str,
    created_by: UserId,
    database: &Arc<Mutex<D>>,
) -> LedgerResult<GroupId> {
    let mut database = database.lock().await;

    if database.get_user(created_by)?.is_none() {
        return Err(LedgerError::not_found(Entity::User, created_by));
    }

    let group_id = database.create_group(name.trim(), created_by)?;
    info!("User {created_by} created group {group_id}");
    Ok(group_id)
}

pub async fn delete_group<D: Database>(
    group_id: GroupId,
    database: &Arc<Mutex<D>>,
) -> LedgerResult<()> {
    if database.lock().await.delete_group(group_id)? {
        info!("Deleted group {group_id}");
        Ok(())
    } else {
        Err(LedgerError::not_found(Entity::Group, group_id))
    }
}

/// Add the user registered with `email` to the group.
///
/// If nobody is registered with that email, a ghost user called `name` is
/// created first.
pub async fn add_member<D: Database>(
    group_id: GroupId,
    email: &str,
    name: Option<&str>,
    database: &Arc<Mutex<D>>,
) -> LedgerResult<User> {
    let mut database = database.lock().await;
    let email = email.trim();

    if database.get_group(group_id)?.is_none() {
        return Err(LedgerError::not_found(Entity::Group, group_id));
    }

    let user = match database.find_user_by_email(email)? {
        Some(user) => user,
        None => {
            let name = name
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| InputError::ghost_name_not_provided(email.to_string()))?;
            let user_id = database.add_user(name, Some(email), true)?;
            debug!("Created ghost user {user_id}");
            database
                .get_user(user_id)?
                .ok_or_else(|| LedgerError::not_found(Entity::User, user_id))?
        }
    };

    if !database.add_group_member(group_id, user.id)? {
        return Err(InputError::already_member(group_id, user.id).into());
    }

    info!("Added user {} to group {group_id}", user.id);
    Ok(user)
}

pub async fn list_members<D: Database>(
    group_id: GroupId,
    database: &Arc<Mutex<D>>,
) -> LedgerResult<Vec<User>> {
    let database = database.lock().await;
    if database.get_group(group_id)?.is_none() {
        return Err(LedgerError::not_found(Entity::Group, group_id));
    }
    Ok(database.get_group_members(group_id)?)
}

pub async fn list_user_groups<D: Database>(
    user_id: UserId,
    database: &Arc<Mutex<D>>,
) -> LedgerResult<Vec<Group>> {
    let database = database.lock().await;
    if database.get_user(user_id)?.is_none() {
        return Err(LedgerError::not_found(Entity::User, user_id));
    }
    Ok(database.get_user_groups(user_id)?)
}

/// Validate and save a new expense. Either the expense is saved together
/// with all its payers and splits, or nothing is.
pub async fn create_expense<D: Database>(
    group_id: GroupId,
    expense: &NewExpense,
    database: &Arc<Mutex<D>>,
) -> LedgerResult<ExpenseId> {
    validate_expense(expense)?;

    let mut database = database.lock().await;

    if database.get_group(group_id)?.is_none() {
        return Err(LedgerError::not_found(Entity::Group, group_id));
    }

    let expense_id = database.write_expense(group_id, expense, Utc::now())?;
    info!("Saved expense {expense_id} in group {group_id}");
    Ok(expense_id)
}

/// Overwrite an expense, discarding all its previous payers and splits.
///
/// The splits are not checked against the amount here, so that updates
/// accepted in the past keep being accepted.
pub async fn update_expense<D: Database>(
    expense_id: ExpenseId,
    expense: &NewExpense,
    database: &Arc<Mutex<D>>,
) -> LedgerResult<()> {
    if !splits_match_amount(expense)? {
        warn!(
            "Splits of expense {expense_id} add up to {} but the amount is {}",
            expense.total_owed()?,
            expense.amount
        );
    }
    let total_paid = expense.total_paid()?;
    if !total_paid.approx_eq(expense.amount) {
        warn!(
            "Payers of expense {expense_id} paid {total_paid} but the amount is {}",
            expense.amount
        );
    }

    if database
        .lock()
        .await
        .replace_expense(expense_id, expense)?
    {
        info!("Replaced expense {expense_id}");
        Ok(())
    } else {
        Err(LedgerError::not_found(Entity::Expense, expense_id))
    }
}

pub async fn delete_expense<D: Database>(
    expense_id: ExpenseId,
    database: &Arc<Mutex<D>>,
) -> LedgerResult<()> {
    if database.lock().await.delete_expense(expense_id)? {
        info!("Deleted expense {expense_id}");
        Ok(())
    } else {
        Err(LedgerError::not_found(Entity::Expense, expense_id))
    }
}

pub async fn get_expense<D: Database>(
    expense_id: ExpenseId,
    database: &Arc<Mutex<D>>,
) -> LedgerResult<SavedExpense> {
    database
        .lock()
        .await
        .get_expense(expense_id)?
        .ok_or_else(|| LedgerError::not_found(Entity::Expense, expense_id))
}

/// Expenses of a group, newest first, each with a short description of
/// who paid for it.
pub async fn list_group_expenses<D: Database>(
    group_id: GroupId,
    database: &Arc<Mutex<D>>,
) -> LedgerResult<Vec<ExpenseSummary>> {
    let (members, expenses) = {
        let database = database.lock().await;
        if database.get_group(group_id)?.is_none() {
            return Err(LedgerError::not_found(Entity::Group, group_id));
        }
        (
            database.get_group_members(group_id)?,
            database.get_group_expenses(group_id)?,
        )
    };

    let names = member_names(&members);
    let summaries = expenses
        .into_iter()
        .map(|expense| ExpenseSummary {
            payer_name: payer_display_name(&expense.payers, &names),
            expense,
        })
        .collect();

    Ok(summaries)
}

/// Net balance of every user with some activity in the group.
pub async fn compute_group_balances<D: Database>(
    group_id: GroupId,
    database: &Arc<Mutex<D>>,
) -> LedgerResult<NetBalances> {
    // Both lists are read under the same lock so that they describe the
    // same set of expenses.
    let (payers, splits) = {
        let database = database.lock().await;
        if database.get_group(group_id)?.is_none() {
            return Err(LedgerError::not_found(Entity::Group, group_id));
        }
        (
            database.list_payer_allocations(group_id)?,
            database.list_split_allocations(group_id)?,
        )
    };

    debug!(
        "Computing balances of group {group_id} from {} payers and {} splits",
        payers.len(),
        splits.len()
    );

    Ok(compute_balances(&payers, &splits))
}

/// Balances of the group together with the payments that settle them.
pub async fn settle_group<D: Database>(
    group_id: GroupId,
    database: &Arc<Mutex<D>>,
) -> LedgerResult<Settlement> {
    let balances = compute_group_balances(group_id, database).await?;
    Ok(Settlement::from_balances(balances))
}

pub async fn build_report<D: Database>(
    group_id: GroupId,
    database: &Arc<Mutex<D>>,
) -> LedgerResult<SettlementReport> {
    let (group, members, expenses, payers, splits) = {
        let database = database.lock().await;
        let group = database
            .get_group(group_id)?
            .ok_or_else(|| LedgerError::not_found(Entity::Group, group_id))?;
        (
            group,
            database.get_group_members(group_id)?,
            database.get_group_expenses(group_id)?,
            database.list_payer_allocations(group_id)?,
            database.list_split_allocations(group_id)?,
        )
    };

    let settlement = Settlement::from_balances(compute_balances(&payers, &splits));

    Ok(assemble_report(
        group,
        members,
        expenses,
        settlement,
        Utc::now(),
    ))
}
