//! Command line options.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    amount::Amount,
    parser::{parse_amount_str, parse_payer, parse_split},
    types::{ExpenseId, GroupId, NewExpense, PayerAllocation, SplitAllocation, UserId},
};

#[derive(Debug, Parser)]
#[command(name = "splitledger")]
#[command(about = "Track shared expenses of a group and settle them with few payments")]
pub struct Cli {
    /// Path of the SQLite database file
    #[arg(long, env = "SPLITLEDGER_DB", default_value = "splitledger.db", global = true)]
    pub database: PathBuf,

    #[arg(long, global = true, help = "Print JSON instead of plain text")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register a user
    AddUser {
        name: String,
        #[arg(long)]
        email: Option<String>,
    },
    CreateGroup {
        name: String,
        /// ID of the user creating the group, who becomes its first member
        #[arg(long)]
        created_by: UserId,
    },
    /// Delete a group with all its expenses
    DeleteGroup { group_id: GroupId },
    /// Add a member by email, creating a ghost user if nobody has that email
    AddMember {
        group_id: GroupId,
        email: String,
        /// Name of the ghost user
        #[arg(long)]
        name: Option<String>,
    },
    Members { group_id: GroupId },
    /// List the groups of a user
    Groups { user_id: UserId },
    AddExpense {
        group_id: GroupId,
        #[command(flatten)]
        expense: ExpenseArgs,
    },
    /// Replace an expense, including all its payers and splits
    UpdateExpense {
        expense_id: ExpenseId,
        #[command(flatten)]
        expense: ExpenseArgs,
    },
    DeleteExpense { expense_id: ExpenseId },
    ShowExpense { expense_id: ExpenseId },
    /// List the expenses of a group, newest first
    Expenses { group_id: GroupId },
    Balances { group_id: GroupId },
    /// Show the payments that settle a group
    Settle { group_id: GroupId },
    /// Full statement of a group
    Report { group_id: GroupId },
}

#[derive(Debug, Args)]
pub struct ExpenseArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long, value_parser = parse_amount_str)]
    pub amount: Amount,

    #[arg(long, default_value = "")]
    pub category: String,

    /// Who paid and how much, as <user_id>:<amount>. Repeat for several payers.
    #[arg(long = "payer", value_parser = parse_payer, required = true)]
    pub payers: Vec<PayerAllocation>,

    /// Who owes and how much, as <user_id>:<amount>. Repeat for several users.
    #[arg(long = "split", value_parser = parse_split, required = true)]
    pub splits: Vec<SplitAllocation>,
}

impl ExpenseArgs {
    pub fn to_new_expense(&self) -> NewExpense {
        NewExpense::new(
            &self.title,
            self.description.clone(),
            self.amount,
            &self.category,
            self.payers.clone(),
            self.splits.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_add_expense() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "splitledger",
            "--database",
            "test.db",
            "add-expense",
            "4",
            "--title",
            "Dinner",
            "--amount",
            "30",
            "--payer",
            "1:30",
            "--split",
            "1:15",
            "--split",
            "2:15,00",
        ])?;

        assert_eq!(cli.database, PathBuf::from("test.db"));
        assert!(!cli.json);
        match cli.command {
            Command::AddExpense { group_id, expense } => {
                assert_eq!(group_id, 4);
                let expense = expense.to_new_expense();
                assert_eq!(expense.amount, Amount::from_cents(3000));
                assert_eq!(expense.category, "General");
                assert_eq!(
                    expense.payers,
                    vec![PayerAllocation::new(1, Amount::from_cents(3000))]
                );
                assert_eq!(
                    expense.splits,
                    vec![
                        SplitAllocation::new(1, Amount::from_cents(1500)),
                        SplitAllocation::new(2, Amount::from_cents(1500)),
                    ]
                );
            }
            c => panic!("unexpected command {c:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_reject_malformed_input() {
        assert!(Cli::try_parse_from(["splitledger", "balances", "--json", "x"]).is_err());
        assert!(Cli::try_parse_from([
            "splitledger",
            "add-expense",
            "1",
            "--title",
            "Dinner",
            "--amount",
            "thirty",
            "--payer",
            "1:30",
            "--split",
            "1:30",
        ])
        .is_err());
        assert!(Cli::try_parse_from([
            "splitledger",
            "add-expense",
            "1",
            "--title",
            "Dinner",
            "--amount",
            "30",
            "--payer",
            "alice:30",
            "--split",
            "1:30",
        ])
        .is_err());
    }

    #[test]
    fn test_json_flag_is_global() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(["splitledger", "settle", "3", "--json"])?;
        assert!(cli.json);
        assert!(matches!(cli.command, Command::Settle { group_id: 3 }));
        Ok(())
    }
}
