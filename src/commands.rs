//! Run a command given on the command line and produce its output.

use std::sync::Arc;

use log::debug;
use serde::Serialize;
use serde_json::json;
use tokio::sync::Mutex;

use crate::{
    config::Command,
    database::Database,
    formatter::{
        format_balances, format_expense, format_groups, format_list_expenses, format_members,
        format_report, format_settlement,
    },
    ledger,
    validator::validate_members_of_group,
};

pub async fn execute<D: Database>(
    command: Command,
    json: bool,
    database: &Arc<Mutex<D>>,
) -> anyhow::Result<String> {
    debug!("Executing {command:?}");

    let output = match command {
        Command::AddUser { name, email } => {
            let user_id = ledger::register_user(&name, email.as_deref(), database).await?;
            render(&json!({ "id": user_id }), json, |_| {
                format!("Registered user {user_id}")
            })?
        }
        Command::CreateGroup { name, created_by } => {
            let group_id = ledger::create_group(&name, created_by, database).await?;
            render(&json!({ "id": group_id }), json, |_| {
                format!("Created group {group_id}")
            })?
        }
        Command::DeleteGroup { group_id } => {
            ledger::delete_group(group_id, database).await?;
            render(&json!({ "id": group_id }), json, |_| {
                format!("Deleted group {group_id}")
            })?
        }
        Command::AddMember {
            group_id,
            email,
            name,
        } => {
            let user = ledger::add_member(group_id, &email, name.as_deref(), database).await?;
            render(&user, json, |u| {
                format!("Added {} ({}) to group {group_id}", u.name, u.id)
            })?
        }
        Command::Members { group_id } => {
            let members = ledger::list_members(group_id, database).await?;
            render(&members, json, |m| format_members(m))?
        }
        Command::Groups { user_id } => {
            let groups = ledger::list_user_groups(user_id, database).await?;
            render(&groups, json, |g| format_groups(g))?
        }
        Command::AddExpense { group_id, expense } => {
            let expense = expense.to_new_expense();
            validate_members_of_group(&expense, group_id, database).await?;
            let expense_id = ledger::create_expense(group_id, &expense, database).await?;
            render(&json!({ "id": expense_id }), json, |_| {
                format!("Saved expense {expense_id}")
            })?
        }
        Command::UpdateExpense {
            expense_id,
            expense,
        } => {
            let group_id = ledger::get_expense(expense_id, database).await?.group_id;
            let expense = expense.to_new_expense();
            validate_members_of_group(&expense, group_id, database).await?;
            ledger::update_expense(expense_id, &expense, database).await?;
            render(&json!({ "id": expense_id }), json, |_| {
                format!("Updated expense {expense_id}")
            })?
        }
        Command::DeleteExpense { expense_id } => {
            ledger::delete_expense(expense_id, database).await?;
            render(&json!({ "id": expense_id }), json, |_| {
                format!("Deleted expense {expense_id}")
            })?
        }
        Command::ShowExpense { expense_id } => {
            let expense = ledger::get_expense(expense_id, database).await?;
            let members = ledger::list_members(expense.group_id, database).await?;
            render(&expense, json, |e| format_expense(e, &members))?
        }
        Command::Expenses { group_id } => {
            let expenses = ledger::list_group_expenses(group_id, database).await?;
            render(&expenses, json, |e| format_list_expenses(e))?
        }
        Command::Balances { group_id } => {
            let balances = ledger::compute_group_balances(group_id, database).await?;
            let members = ledger::list_members(group_id, database).await?;
            render(&balances, json, |b| format_balances(b, &members))?
        }
        Command::Settle { group_id } => {
            let settlement = ledger::settle_group(group_id, database).await?;
            let members = ledger::list_members(group_id, database).await?;
            render(&settlement, json, |s| format_settlement(s, &members))?
        }
        Command::Report { group_id } => {
            let report = ledger::build_report(group_id, database).await?;
            render(&report, json, format_report)?
        }
    };

    Ok(output)
}

fn render<T, F>(value: &T, json: bool, format_text: F) -> anyhow::Result<String>
where
    T: Serialize + ?Sized,
    F: FnOnce(&T) -> String,
{
    if json {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(format_text(value))
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use crate::{config::Cli, database::sqlite::SqliteDatabase};

    use super::*;

    async fn run<D: Database>(args: &[&str], database: &Arc<Mutex<D>>) -> anyhow::Result<String> {
        let cli = Cli::try_parse_from(std::iter::once("splitledger").chain(args.iter().copied()))?;
        execute(cli.command, cli.json, database).await
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_full_session() -> anyhow::Result<()> {
        let database = Arc::new(Mutex::new(SqliteDatabase::open_in_memory()?));

        assert_eq!(
            run(&["add-user", "alice", "--email", "alice@example.com"], &database).await?,
            "Registered user 1"
        );
        run(&["add-user", "bob", "--email", "bob@example.com"], &database).await?;
        assert_eq!(
            run(&["create-group", "trip", "--created-by", "1"], &database).await?,
            "Created group 1"
        );
        run(&["add-member", "1", "bob@example.com"], &database).await?;
        assert_eq!(
            run(&["add-member", "1", "carol@example.com", "--name", "carol"], &database).await?,
            "Added carol (3) to group 1"
        );

        #[rustfmt::skip]
        let args = [
            "add-expense", "1", "--title", "Dinner", "--amount", "30", "--payer", "1:30",
            "--split", "1:10", "--split", "2:10", "--split", "3:10",
        ];
        assert_eq!(run(&args, &database).await?, "Saved expense 1");

        assert_eq!(
            run(&["settle", "1"], &database).await?,
            concat!(
                "Balances:\n",
                "alice       20.00\n",
                "bob        -10.00\n",
                "carol      -10.00\n",
                "\n",
                "Payments:\n",
                "bob   pays 10.00 to alice\n",
                "carol pays 10.00 to alice\n",
            )
        );

        let settlement: serde_json::Value =
            serde_json::from_str(&run(&["settle", "1", "--json"], &database).await?)?;
        assert_eq!(settlement["balances"]["1"], 20.0);
        assert_eq!(settlement["transactions"][0]["from_user_id"], 2);
        assert_eq!(settlement["transactions"][0]["amount"], 10.0);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_writes_are_checked() -> anyhow::Result<()> {
        let database = Arc::new(Mutex::new(SqliteDatabase::open_in_memory()?));
        run(&["add-user", "alice"], &database).await?;
        run(&["add-user", "stranger"], &database).await?;
        run(&["create-group", "trip", "--created-by", "1"], &database).await?;

        // The stranger is not a member of the group.
        #[rustfmt::skip]
        let args = [
            "add-expense", "1", "--title", "Dinner", "--amount", "30", "--payer", "1:30",
            "--split", "2:30",
        ];
        assert!(run(&args, &database).await.is_err());

        // Splits do not add up to the amount.
        #[rustfmt::skip]
        let args = [
            "add-expense", "1", "--title", "Dinner", "--amount", "30", "--payer", "1:30",
            "--split", "1:29",
        ];
        let error = run(&args, &database).await.unwrap_err();
        assert_eq!(
            error.to_string(),
            "invalid request: split amounts add up to 29.00 but the expense amount is 30.00"
        );

        assert_eq!(run(&["expenses", "1"], &database).await?, "Nothing to show!");
        assert!(run(&["delete-expense", "1"], &database).await.is_err());
        Ok(())
    }
}
