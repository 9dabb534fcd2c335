use crate::{error::InputError, types::NewExpense};

/// The split amounts of an expense must add up to its total, up to one cent.
///
/// Fails when the splits are too large to be added up.
pub fn splits_match_amount(expense: &NewExpense) -> Result<bool, InputError> {
    Ok(expense.total_owed()?.approx_eq(expense.amount))
}

/// Sanity checks run before a new expense is saved.
pub fn validate_expense(expense: &NewExpense) -> Result<(), InputError> {
    expense.total_paid()?;
    let total_owed = expense.total_owed()?;
    if total_owed.approx_eq(expense.amount) {
        Ok(())
    } else {
        Err(InputError::split_sum_mismatch(expense.amount, total_owed))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        amount::Amount,
        parser::parse_split,
        types::{PayerAllocation, SplitAllocation},
    };

    use super::*;

    fn make_expense(amount: i64, splits: &[i64]) -> NewExpense {
        NewExpense::new(
            "Dinner",
            None,
            Amount::from_cents(amount),
            "",
            vec![PayerAllocation::new(1, Amount::from_cents(amount))],
            splits
                .iter()
                .enumerate()
                .map(|(i, &s)| SplitAllocation::new(i as i64 + 1, Amount::from_cents(s)))
                .collect(),
        )
    }

    #[test]
    fn test_splits_must_add_up() {
        assert!(validate_expense(&make_expense(3000, &[1000, 1000, 1000])).is_ok());
        assert!(validate_expense(&make_expense(10000, &[3333, 3333, 3333])).is_ok());
        assert!(validate_expense(&make_expense(10000, &[3333, 3333, 3335])).is_ok());

        assert!(matches!(
            validate_expense(&make_expense(3000, &[1000, 1000, 990])),
            Err(InputError::SplitSumMismatch { .. })
        ));
        assert!(validate_expense(&make_expense(3000, &[])).is_err());
        assert!(validate_expense(&make_expense(3000, &[1000, 1000, 1000, 1])).is_ok());
        assert!(validate_expense(&make_expense(3000, &[1000, 1000, 1000, 2])).is_err());
    }

    #[test]
    fn test_huge_splits_are_rejected() -> anyhow::Result<()> {
        let mut expense = make_expense(3000, &[]);
        expense.splits = vec![
            parse_split("1:50000000000000000")?,
            parse_split("2:50000000000000000")?,
        ];

        assert!(matches!(
            validate_expense(&expense),
            Err(InputError::AmountOutOfRange(_))
        ));
        assert!(splits_match_amount(&expense).is_err());
        Ok(())
    }

    #[test]
    fn test_huge_payments_are_rejected() {
        let mut expense = make_expense(3000, &[3000]);
        expense.payers = vec![
            PayerAllocation::new(1, Amount::from_cents(i64::MAX)),
            PayerAllocation::new(2, Amount::from_cents(i64::MAX)),
        ];

        assert!(matches!(
            validate_expense(&expense),
            Err(InputError::AmountOutOfRange("payments"))
        ));
    }
}
