//! The implementation of a data storage using Sqlite.

use std::{collections::HashMap, path::Path};

use chrono::{DateTime, Utc};
use log::debug;
use rusqlite::{
    named_params, params,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
    Connection, OptionalExtension, Row, ToSql, Transaction,
};
use tokio::task::block_in_place;

use crate::{
    amount::Amount,
    error::DatabaseError,
    types::{
        ExpenseId, Group, GroupId, NewExpense, PayerAllocation, SavedExpense, SplitAllocation,
        User, UserId,
    },
};

use super::{Database, DatabaseResult};

mod schema;

pub struct SqliteDatabase {
    connection: Connection,
}

impl SqliteDatabase {
    pub fn open<P: AsRef<Path>>(path: P) -> DatabaseResult<SqliteDatabase> {
        block_in_place(move || {
            let connection = Connection::open(path)
                .map_err(|e| DatabaseError::new("cannot open database", e.into()))?;
            SqliteDatabase::init(connection)
        })
    }

    pub fn open_in_memory() -> DatabaseResult<SqliteDatabase> {
        block_in_place(|| {
            let connection = Connection::open_in_memory()
                .map_err(|e| DatabaseError::new("cannot open in-memory database", e.into()))?;
            SqliteDatabase::init(connection)
        })
    }

    fn init(connection: Connection) -> DatabaseResult<SqliteDatabase> {
        schema::create_all_tables(&connection)
            .map_err(|e| DatabaseError::new("cannot create tables", e))?;
        Ok(SqliteDatabase { connection })
    }

    pub fn close(self) -> DatabaseResult<()> {
        block_in_place(|| {
            self.connection
                .close()
                .map_err(|(_, e)| DatabaseError::new("cannot close database", e.into()))
        })
    }
}

impl Database for SqliteDatabase {
    fn add_user(
        &mut self,
        name: &str,
        email: Option<&str>,
        is_ghost: bool,
    ) -> DatabaseResult<UserId> {
        let fn_impl = || -> anyhow::Result<UserId> {
            let mut insert_user_stmt = self.connection.prepare_cached(
                "INSERT INTO user (name, email, is_ghost, created_at) VALUES (?1, ?2, ?3, ?4)
                 RETURNING id",
            )?;

            let user_id = insert_user_stmt
                .query_row(params![name, email, is_ghost, Utc::now()], |row| row.get(0))?;

            Ok(user_id)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot add user", e)))
    }

    fn get_user(&self, user_id: UserId) -> DatabaseResult<Option<User>> {
        let fn_impl = || -> anyhow::Result<Option<User>> {
            let user = self
                .connection
                .query_row(
                    "SELECT id, name, email, is_ghost, created_at FROM user WHERE id = ?1",
                    params![user_id],
                    user_from_row,
                )
                .optional()?;
            Ok(user)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot get user", e)))
    }

    fn find_user_by_email(&self, email: &str) -> DatabaseResult<Option<User>> {
        let fn_impl = || -> anyhow::Result<Option<User>> {
            let user = self
                .connection
                .query_row(
                    "SELECT id, name, email, is_ghost, created_at FROM user WHERE email = ?1",
                    params![email],
                    user_from_row,
                )
                .optional()?;
            Ok(user)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot find user by email", e)))
    }

    fn create_group(&mut self, name: &str, created_by: UserId) -> DatabaseResult<GroupId> {
        let mut fn_impl = || -> anyhow::Result<GroupId> {
            let tx = self.connection.transaction()?;
            let now = Utc::now();

            let group_id: GroupId = tx.query_row(
                "INSERT INTO expense_group (name, created_by, created_at) VALUES (?1, ?2, ?3)
                 RETURNING id",
                params![name, created_by, now],
                |row| row.get(0),
            )?;

            tx.execute(
                "INSERT INTO group_member (group_id, user_id, joined_at) VALUES (?1, ?2, ?3)",
                params![group_id, created_by, now],
            )?;

            tx.commit()?;

            Ok(group_id)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot create group", e)))
    }

    fn get_group(&self, group_id: GroupId) -> DatabaseResult<Option<Group>> {
        let fn_impl = || -> anyhow::Result<Option<Group>> {
            let group = self
                .connection
                .query_row(
                    "SELECT id, name, created_by, created_at FROM expense_group WHERE id = ?1",
                    params![group_id],
                    group_from_row,
                )
                .optional()?;
            Ok(group)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot get group", e)))
    }

    fn get_user_groups(&self, user_id: UserId) -> DatabaseResult<Vec<Group>> {
        let fn_impl = || -> anyhow::Result<Vec<Group>> {
            let mut stmt = self.connection.prepare_cached(
                "SELECT g.id, g.name, g.created_by, g.created_at FROM expense_group g
                 INNER JOIN group_member gm ON g.id = gm.group_id
                 WHERE gm.user_id = :user_id
                 ORDER BY g.id",
            )?;

            let group_iter = stmt.query_map(named_params! {":user_id": user_id}, group_from_row)?;

            let groups = group_iter.collect::<Result<_, _>>()?;
            Ok(groups)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot get user groups", e)))
    }

    fn delete_group(&mut self, group_id: GroupId) -> DatabaseResult<bool> {
        debug!("Deleting group. Group ID: {group_id}");
        let mut fn_impl = || -> anyhow::Result<bool> {
            let tx = self.connection.transaction()?;

            tx.execute(
                "DELETE FROM expense_payer
                 WHERE expense_id IN (SELECT id FROM expense WHERE group_id = ?1)",
                params![group_id],
            )?;
            tx.execute(
                "DELETE FROM expense_split
                 WHERE expense_id IN (SELECT id FROM expense WHERE group_id = ?1)",
                params![group_id],
            )?;
            tx.execute("DELETE FROM expense WHERE group_id = ?1", params![group_id])?;
            tx.execute(
                "DELETE FROM group_member WHERE group_id = ?1",
                params![group_id],
            )?;
            let num_deleted_rows =
                tx.execute("DELETE FROM expense_group WHERE id = ?1", params![group_id])?;

            if num_deleted_rows == 0 {
                // Dropping the transaction rolls it back.
                return Ok(false);
            }

            tx.commit()?;

            Ok(true)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot delete group", e)))
    }

    fn add_group_member(&mut self, group_id: GroupId, user_id: UserId) -> DatabaseResult<bool> {
        let fn_impl = || -> anyhow::Result<bool> {
            let num_inserted_rows = self.connection.execute(
                "INSERT OR IGNORE INTO group_member (group_id, user_id, joined_at)
                 VALUES (?1, ?2, ?3)",
                params![group_id, user_id, Utc::now()],
            )?;

            Ok(num_inserted_rows > 0)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot add group member", e)))
    }

    fn get_group_members(&self, group_id: GroupId) -> DatabaseResult<Vec<User>> {
        let fn_impl = || -> anyhow::Result<Vec<User>> {
            let mut stmt = self.connection.prepare_cached(
                "SELECT u.id, u.name, u.email, u.is_ghost, u.created_at FROM user u
                 INNER JOIN group_member gm ON u.id = gm.user_id
                 WHERE gm.group_id = :group_id
                 ORDER BY u.id",
            )?;

            let member_iter = stmt.query_map(named_params! {":group_id": group_id}, user_from_row)?;

            let members = member_iter.collect::<Result<_, _>>()?;
            Ok(members)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot get group members", e)))
    }

    fn is_group_member(&self, group_id: GroupId, user_id: UserId) -> DatabaseResult<bool> {
        let fn_impl = || -> anyhow::Result<bool> {
            let is_member = self.connection.query_row(
                "SELECT EXISTS(SELECT 1 FROM group_member WHERE group_id = ?1 AND user_id = ?2)",
                params![group_id, user_id],
                |row| row.get(0),
            )?;
            Ok(is_member)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot check group membership", e)))
    }

    fn write_expense(
        &mut self,
        group_id: GroupId,
        expense: &NewExpense,
        created_at: DateTime<Utc>,
    ) -> DatabaseResult<ExpenseId> {
        let mut fn_impl = || -> anyhow::Result<ExpenseId> {
            let tx = self.connection.transaction()?;

            let expense_id: ExpenseId = {
                let mut insert_expense_stmt = tx.prepare_cached(
                    "INSERT INTO expense
                        (group_id, title, description, amount, category, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING id",
                )?;

                insert_expense_stmt.query_row(
                    params![
                        group_id,
                        expense.title,
                        expense.description,
                        expense.amount,
                        expense.category,
                        created_at
                    ],
                    |row| row.get(0),
                )?
            };

            debug!("expense_id is {expense_id}");

            insert_allocations(&tx, expense_id, expense)?;

            tx.commit()?;

            Ok(expense_id)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot save expense", e)))
    }

    fn replace_expense(
        &mut self,
        expense_id: ExpenseId,
        expense: &NewExpense,
    ) -> DatabaseResult<bool> {
        let mut fn_impl = || -> anyhow::Result<bool> {
            let tx = self.connection.transaction()?;

            let num_updated_rows = tx.execute(
                "UPDATE expense SET title = ?1, description = ?2, amount = ?3, category = ?4
                 WHERE id = ?5",
                params![
                    expense.title,
                    expense.description,
                    expense.amount,
                    expense.category,
                    expense_id
                ],
            )?;

            if num_updated_rows == 0 {
                return Ok(false);
            }

            tx.execute(
                "DELETE FROM expense_payer WHERE expense_id = ?1",
                params![expense_id],
            )?;
            tx.execute(
                "DELETE FROM expense_split WHERE expense_id = ?1",
                params![expense_id],
            )?;

            insert_allocations(&tx, expense_id, expense)?;

            tx.commit()?;

            Ok(true)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot replace expense", e)))
    }

    fn delete_expense(&mut self, expense_id: ExpenseId) -> DatabaseResult<bool> {
        debug!("Deleting expense. Expense ID: {expense_id}");
        let mut fn_impl = || -> anyhow::Result<bool> {
            let tx = self.connection.transaction()?;

            tx.execute(
                "DELETE FROM expense_payer WHERE expense_id = ?1",
                params![expense_id],
            )?;
            tx.execute(
                "DELETE FROM expense_split WHERE expense_id = ?1",
                params![expense_id],
            )?;
            let num_deleted_rows =
                tx.execute("DELETE FROM expense WHERE id = ?1", params![expense_id])?;

            if num_deleted_rows == 0 {
                return Ok(false);
            }

            tx.commit()?;

            Ok(true)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot delete expense", e)))
    }

    fn get_expense(&self, expense_id: ExpenseId) -> DatabaseResult<Option<SavedExpense>> {
        let fn_impl = || -> anyhow::Result<Option<SavedExpense>> {
            let expense = self
                .connection
                .query_row(
                    "SELECT id, group_id, title, description, amount, category, created_at
                     FROM expense WHERE id = ?1",
                    params![expense_id],
                    expense_from_row,
                )
                .optional()?;

            let mut expense = match expense {
                Some(e) => e,
                None => return Ok(None),
            };

            let mut payer_stmt = self.connection.prepare_cached(
                "SELECT user_id, paid_amount FROM expense_payer WHERE expense_id = ?1 ORDER BY id",
            )?;
            expense.payers = payer_stmt
                .query_map(params![expense_id], |row| {
                    Ok(PayerAllocation::new(row.get(0)?, row.get(1)?))
                })?
                .collect::<Result<_, _>>()?;

            let mut split_stmt = self.connection.prepare_cached(
                "SELECT user_id, amount_owed FROM expense_split WHERE expense_id = ?1 ORDER BY id",
            )?;
            expense.splits = split_stmt
                .query_map(params![expense_id], |row| {
                    Ok(SplitAllocation::new(row.get(0)?, row.get(1)?))
                })?
                .collect::<Result<_, _>>()?;

            Ok(Some(expense))
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot get expense", e)))
    }

    fn get_group_expenses(&self, group_id: GroupId) -> DatabaseResult<Vec<SavedExpense>> {
        let fn_impl = || -> anyhow::Result<Vec<SavedExpense>> {
            let mut expense_stmt = self.connection.prepare_cached(
                "SELECT id, group_id, title, description, amount, category, created_at
                 FROM expense WHERE group_id = :group_id
                 ORDER BY created_at DESC, id DESC",
            )?;
            let mut expenses: Vec<SavedExpense> = expense_stmt
                .query_map(named_params! {":group_id": group_id}, expense_from_row)?
                .collect::<Result<_, _>>()?;

            let mut payers: HashMap<ExpenseId, Vec<PayerAllocation>> = HashMap::new();
            let mut payer_stmt = self.connection.prepare_cached(
                "SELECT ep.expense_id, ep.user_id, ep.paid_amount FROM expense_payer ep
                 INNER JOIN expense e ON ep.expense_id = e.id
                 WHERE e.group_id = :group_id
                 ORDER BY ep.id",
            )?;
            let payer_iter = payer_stmt.query_map(named_params! {":group_id": group_id}, |row| {
                Ok((
                    row.get::<_, ExpenseId>(0)?,
                    PayerAllocation::new(row.get(1)?, row.get(2)?),
                ))
            })?;
            for payer in payer_iter {
                let (expense_id, payer) = payer?;
                payers.entry(expense_id).or_default().push(payer);
            }

            let mut splits: HashMap<ExpenseId, Vec<SplitAllocation>> = HashMap::new();
            let mut split_stmt = self.connection.prepare_cached(
                "SELECT es.expense_id, es.user_id, es.amount_owed FROM expense_split es
                 INNER JOIN expense e ON es.expense_id = e.id
                 WHERE e.group_id = :group_id
                 ORDER BY es.id",
            )?;
            let split_iter = split_stmt.query_map(named_params! {":group_id": group_id}, |row| {
                Ok((
                    row.get::<_, ExpenseId>(0)?,
                    SplitAllocation::new(row.get(1)?, row.get(2)?),
                ))
            })?;
            for split in split_iter {
                let (expense_id, split) = split?;
                splits.entry(expense_id).or_default().push(split);
            }

            for expense in &mut expenses {
                expense.payers = payers.remove(&expense.id).unwrap_or_default();
                expense.splits = splits.remove(&expense.id).unwrap_or_default();
            }

            Ok(expenses)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot get group expenses", e)))
    }

    fn list_payer_allocations(&self, group_id: GroupId) -> DatabaseResult<Vec<(UserId, Amount)>> {
        let fn_impl = || -> anyhow::Result<Vec<(UserId, Amount)>> {
            let mut stmt = self.connection.prepare_cached(
                "SELECT ep.user_id, ep.paid_amount FROM expense_payer ep
                 INNER JOIN expense e ON ep.expense_id = e.id
                 WHERE e.group_id = :group_id
                 ORDER BY ep.id",
            )?;

            let allocation_iter = stmt.query_map(named_params! {":group_id": group_id}, |row| {
                Ok((row.get::<_, UserId>(0)?, row.get::<_, Amount>(1)?))
            })?;

            let allocations = allocation_iter.collect::<Result<_, _>>()?;
            Ok(allocations)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot list payer allocations", e)))
    }

    fn list_split_allocations(&self, group_id: GroupId) -> DatabaseResult<Vec<(UserId, Amount)>> {
        let fn_impl = || -> anyhow::Result<Vec<(UserId, Amount)>> {
            let mut stmt = self.connection.prepare_cached(
                "SELECT es.user_id, es.amount_owed FROM expense_split es
                 INNER JOIN expense e ON es.expense_id = e.id
                 WHERE e.group_id = :group_id
                 ORDER BY es.id",
            )?;

            let allocation_iter = stmt.query_map(named_params! {":group_id": group_id}, |row| {
                Ok((row.get::<_, UserId>(0)?, row.get::<_, Amount>(1)?))
            })?;

            let allocations = allocation_iter.collect::<Result<_, _>>()?;
            Ok(allocations)
        };

        block_in_place(|| fn_impl().map_err(|e| map_error("cannot list split allocations", e)))
    }
}

impl ToSql for Amount {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.cents()))
    }
}

impl FromSql for Amount {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Amount::from_cents)
    }
}

fn insert_allocations(
    tx: &Transaction,
    expense_id: ExpenseId,
    expense: &NewExpense,
) -> anyhow::Result<()> {
    let mut insert_payer_stmt = tx.prepare_cached(
        "INSERT INTO expense_payer (expense_id, user_id, paid_amount) VALUES (?1, ?2, ?3)",
    )?;
    for payer in &expense.payers {
        insert_payer_stmt.execute(params![expense_id, payer.user_id, payer.paid_amount])?;
    }

    let mut insert_split_stmt = tx.prepare_cached(
        "INSERT INTO expense_split (expense_id, user_id, amount_owed) VALUES (?1, ?2, ?3)",
    )?;
    for split in &expense.splits {
        insert_split_stmt.execute(params![expense_id, split.user_id, split.amount_owed])?;
    }

    Ok(())
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        is_ghost: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn group_from_row(row: &Row) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get(0)?,
        name: row.get(1)?,
        created_by: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Payers and splits are loaded separately.
fn expense_from_row(row: &Row) -> rusqlite::Result<SavedExpense> {
    Ok(SavedExpense {
        id: row.get(0)?,
        group_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        amount: row.get(4)?,
        category: row.get(5)?,
        created_at: row.get(6)?,
        payers: vec![],
        splits: vec![],
    })
}

fn map_error<T: AsRef<str>>(message: T, e: anyhow::Error) -> DatabaseError {
    match e.downcast::<DatabaseError>() {
        Ok(e) => e,
        Err(e) => DatabaseError::new(message, e),
    }
}
