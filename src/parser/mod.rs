//! Parse user input coming from the command line.

mod amount;

pub use amount::parse_amount;

use nom::{
    character::complete::{char, digit1, multispace0},
    combinator::{all_consuming, map_res},
    sequence::{preceded, separated_pair, terminated},
    IResult,
};

use crate::{
    amount::Amount,
    error::InputError,
    types::{PayerAllocation, SplitAllocation, UserId},
};

/// Parse an allocation written as `<user_id>:<amount>`, e.g. `3:12.50`.
pub fn parse_allocation(s: &str) -> IResult<&str, (UserId, Amount)> {
    separated_pair(
        preceded(multispace0, map_res(digit1, str::parse::<UserId>)),
        char(':'),
        parse_amount,
    )(s)
}

pub fn parse_amount_str(s: &str) -> Result<Amount, InputError> {
    all_consuming(terminated(parse_amount, multispace0))(s)
        .map(|(_, amount)| amount)
        .map_err(|_| InputError::invalid_amount(s.to_string()))
}

pub fn parse_payer(s: &str) -> Result<PayerAllocation, InputError> {
    let (user_id, paid_amount) = parse_allocation_str(s)?;
    Ok(PayerAllocation::new(user_id, paid_amount))
}

pub fn parse_split(s: &str) -> Result<SplitAllocation, InputError> {
    let (user_id, amount_owed) = parse_allocation_str(s)?;
    Ok(SplitAllocation::new(user_id, amount_owed))
}

fn parse_allocation_str(s: &str) -> Result<(UserId, Amount), InputError> {
    all_consuming(terminated(parse_allocation, multispace0))(s)
        .map(|(_, allocation)| allocation)
        .map_err(|_| InputError::invalid_allocation(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_allocation() {
        assert_eq!(
            parse_allocation("3:12.50"),
            Ok(("", (3, Amount::from_cents(1250))))
        );
        assert_eq!(
            parse_allocation(" 12:7 tail"),
            Ok((" tail", (12, Amount::from_cents(700))))
        );
        assert!(parse_allocation("a:12").is_err());
        assert!(parse_allocation("3-12").is_err());
    }

    #[test]
    fn test_parse_amount_str() -> anyhow::Result<()> {
        assert_eq!(parse_amount_str(" 30 ")?, Amount::from_cents(3000));
        assert!(matches!(
            parse_amount_str("30 euros"),
            Err(InputError::InvalidAmount(_))
        ));
        Ok(())
    }

    #[test]
    fn test_parse_payer_and_split() -> anyhow::Result<()> {
        let payer = parse_payer("1:40")?;
        assert_eq!(payer.user_id, 1);
        assert_eq!(payer.paid_amount, Amount::from_cents(4000));

        let split = parse_split("2:13.33")?;
        assert_eq!(split.user_id, 2);
        assert_eq!(split.amount_owed, Amount::from_cents(1333));

        assert!(matches!(
            parse_split("2:"),
            Err(InputError::InvalidAllocation(_))
        ));
        Ok(())
    }
}
