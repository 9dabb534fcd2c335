//! Persistent representation of users, groups and expenses.

use chrono::{DateTime, Utc};

use crate::{
    amount::Amount,
    error::DatabaseError,
    types::{ExpenseId, Group, GroupId, NewExpense, SavedExpense, User, UserId},
};

pub type DatabaseResult<T> = Result<T, DatabaseError>;

pub mod sqlite;

/// This trait abstracts over the type of database.
///
/// The ledger only relies on the guarantees listed here: every method that
/// writes more than one row does so atomically, so readers never observe an
/// expense with only part of its allocations.
pub trait Database {
    /// Add a user and return its ID.
    fn add_user(
        &mut self,
        name: &str,
        email: Option<&str>,
        is_ghost: bool,
    ) -> DatabaseResult<UserId>;

    fn get_user(&self, user_id: UserId) -> DatabaseResult<Option<User>>;

    fn find_user_by_email(&self, email: &str) -> DatabaseResult<Option<User>>;

    /// Create a group and register its creator as the first member.
    fn create_group(&mut self, name: &str, created_by: UserId) -> DatabaseResult<GroupId>;

    fn get_group(&self, group_id: GroupId) -> DatabaseResult<Option<Group>>;

    /// Get the list of groups the given user is a member of.
    fn get_user_groups(&self, user_id: UserId) -> DatabaseResult<Vec<Group>>;

    /// Delete a group together with its memberships and expenses.
    ///
    /// Returns false if the group did not exist.
    fn delete_group(&mut self, group_id: GroupId) -> DatabaseResult<bool>;

    /// Returns false if the user is already a member.
    fn add_group_member(&mut self, group_id: GroupId, user_id: UserId) -> DatabaseResult<bool>;

    /// Get the members of a group, ordered by user ID.
    fn get_group_members(&self, group_id: GroupId) -> DatabaseResult<Vec<User>>;

    fn is_group_member(&self, group_id: GroupId, user_id: UserId) -> DatabaseResult<bool>;

    /// Save an expense with its payers and splits as a single unit.
    fn write_expense(
        &mut self,
        group_id: GroupId,
        expense: &NewExpense,
        created_at: DateTime<Utc>,
    ) -> DatabaseResult<ExpenseId>;

    /// Overwrite the fields of an expense and replace all its payers and splits.
    ///
    /// Returns false (and changes nothing) if the expense does not exist.
    fn replace_expense(
        &mut self,
        expense_id: ExpenseId,
        expense: &NewExpense,
    ) -> DatabaseResult<bool>;

    /// Delete an expense together with its payers and splits.
    ///
    /// Returns false if the expense did not exist.
    fn delete_expense(&mut self, expense_id: ExpenseId) -> DatabaseResult<bool>;

    fn get_expense(&self, expense_id: ExpenseId) -> DatabaseResult<Option<SavedExpense>>;

    /// Get all expenses of a group, newest first.
    fn get_group_expenses(&self, group_id: GroupId) -> DatabaseResult<Vec<SavedExpense>>;

    /// One entry per payer row of every expense in the group.
    fn list_payer_allocations(&self, group_id: GroupId) -> DatabaseResult<Vec<(UserId, Amount)>>;

    /// One entry per split row of every expense in the group.
    fn list_split_allocations(&self, group_id: GroupId) -> DatabaseResult<Vec<(UserId, Amount)>>;
}
