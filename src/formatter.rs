//! Produce the strings that are printed on the terminal.

use crate::{
    ledger::ExpenseSummary,
    report::{member_names, name_of, SettlementReport},
    settlement::Settlement,
    types::{Group, NetBalances, SavedExpense, SettlementTransaction, User},
};

const NOTHING_TO_SHOW: &str = "Nothing to show!";

pub fn format_list_expenses(expenses: &[ExpenseSummary]) -> String {
    if expenses.is_empty() {
        NOTHING_TO_SHOW.to_string()
    } else {
        expenses
            .iter()
            .map(format_expense_summary)
            .fold(String::new(), |a, b| a + &b + "\n")
    }
}

fn format_expense_summary(summary: &ExpenseSummary) -> String {
    let expense = &summary.expense;
    format!(
        "{}: {} {} [{}] paid by {} on {}",
        expense.id,
        expense.title,
        expense.amount,
        expense.category,
        summary.payer_name,
        expense.date()
    )
}

/// Full detail of a single expense.
pub fn format_expense(expense: &SavedExpense, members: &[User]) -> String {
    let names = member_names(members);
    let mut result = format!(
        "{}: {} {} [{}] on {}\n",
        expense.id,
        expense.title,
        expense.amount,
        expense.category,
        expense.date()
    );
    if let Some(description) = &expense.description {
        result += &format!("{description}\n");
    }
    for payer in &expense.payers {
        let name = name_of(payer.user_id, &names);
        result += &format!("  paid by {}: {}\n", name, payer.paid_amount);
    }
    for split in &expense.splits {
        let name = name_of(split.user_id, &names);
        result += &format!("  owed by {}: {}\n", name, split.amount_owed);
    }
    result
}

pub fn format_balances(balances: &NetBalances, members: &[User]) -> String {
    if balances.is_empty() {
        return NOTHING_TO_SHOW.to_string();
    }
    let names = member_names(members);
    let target_length = balances
        .keys()
        .map(|&u| name_of(u, &names).chars().count())
        .max()
        .unwrap_or(0);
    balances
        .iter()
        .map(|(&user_id, amount)| {
            format!(
                "{:<width$}  {:>10}",
                name_of(user_id, &names),
                amount.to_string(),
                width = target_length
            )
        })
        .fold(String::new(), |a, b| a + &b + "\n")
}

pub fn format_transactions(transactions: &[SettlementTransaction], members: &[User]) -> String {
    if transactions.is_empty() {
        return "All clean!".to_string();
    }
    let names = member_names(members);
    // Debtors are padded so that the amounts are always aligned.
    let target_length = transactions
        .iter()
        .map(|t| name_of(t.from_user_id, &names).chars().count())
        .max()
        .unwrap_or(0);
    transactions
        .iter()
        .map(|t| {
            format!(
                "{:<width$} pays {} to {}",
                name_of(t.from_user_id, &names),
                t.amount,
                name_of(t.to_user_id, &names),
                width = target_length
            )
        })
        .fold(String::new(), |a, b| a + &b + "\n")
}

pub fn format_settlement(settlement: &Settlement, members: &[User]) -> String {
    format!(
        "Balances:\n{}\nPayments:\n{}",
        format_balances(&settlement.balances, members),
        format_transactions(&settlement.transactions, members)
    )
}

pub fn format_members(members: &[User]) -> String {
    let elements: Vec<_> = members
        .iter()
        .map(|u| {
            let ghost = if u.is_ghost { " (ghost)" } else { "" };
            match &u.email {
                Some(email) => format!("{}: {} <{}>{}", u.id, u.name, email, ghost),
                None => format!("{}: {}{}", u.id, u.name, ghost),
            }
        })
        .collect();
    format_simple_list(&elements)
}

pub fn format_groups(groups: &[Group]) -> String {
    let elements: Vec<_> = groups
        .iter()
        .map(|g| format!("{}: {}", g.id, g.name))
        .collect();
    format_simple_list(&elements)
}

pub fn format_report(report: &SettlementReport) -> String {
    let mut result = format!(
        "Statement of group {} ({}), generated on {}\n\n",
        report.group.name,
        report.group.id,
        report.generated_at.format("%Y-%m-%d %H:%M")
    );

    result += "Expenses:\n";
    if report.rows.is_empty() {
        result += NOTHING_TO_SHOW;
        result += "\n";
    }
    for row in &report.rows {
        result += &format!(
            "{} {} {} paid by {}\n",
            row.date, row.title, row.total, row.payer_names
        );
        for (&user_id, impact) in &row.impacts {
            result += &format!("  {}: {}\n", report.member_name(user_id), impact);
        }
    }

    result += "\nBalances:\n";
    result += &format_balances(&report.balances, &report.members);
    result += "\nPayments:\n";
    result += &format_transactions(&report.transactions, &report.members);
    result
}

pub fn format_simple_list<T: AsRef<str>>(elements: &[T]) -> String {
    if elements.is_empty() {
        NOTHING_TO_SHOW.to_string()
    } else {
        elements
            .iter()
            .map(|g| format!("- {}", g.as_ref()))
            .fold(String::new(), |a, b| a + &b + "\n")
    }
}
