//! Parse a decimal amount into cents.

use std::cmp::Ordering;

use nom::{
    character::complete::multispace0, combinator::map_res, sequence::preceded, AsChar, IResult,
    InputTakeAtPosition,
};

use crate::{amount::Amount, error::InputError};

/// Accepts `12`, `12.3`, `12,30`, `+12` and `-12.30`.
///
/// More than two fractional digits are rounded half away from zero.
pub fn parse_amount(s: &str) -> IResult<&str, Amount> {
    preceded(multispace0, map_res(number, to_amount))(s)
}

fn number(s: &str) -> IResult<&str, &str> {
    s.split_at_position1_complete(
        |item| !item.is_dec_digit() && item != ',' && item != '.' && item != '-' && item != '+',
        nom::error::ErrorKind::Float,
    )
}

fn to_amount(x: &str) -> Result<Amount, InputError> {
    let invalid = || InputError::invalid_amount(x.to_string());

    let (is_negative, digits) = match x.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, x.strip_prefix('+').unwrap_or(x)),
    };

    let components: Vec<_> = digits.split(&[',', '.'][..]).collect();
    if components.len() > 2
        || components
            .iter()
            .any(|c| !c.chars().all(|ch| ch.is_ascii_digit()))
        || components.iter().all(|c| c.is_empty())
    {
        return Err(invalid());
    }

    let integer_part: i64 = if components[0].is_empty() {
        0
    } else {
        components[0].parse().map_err(|_| invalid())?
    };

    let fractional_part = components.get(1).copied().unwrap_or("");
    let cents = match fractional_part.len().cmp(&2) {
        Ordering::Less => format!("{:0<2}", fractional_part).parse::<i64>(),
        Ordering::Equal => fractional_part.parse::<i64>(),
        Ordering::Greater => {
            let rounding = i64::from(fractional_part.as_bytes()[2] >= b'5');
            fractional_part[0..2].parse::<i64>().map(|c| c + rounding)
        }
    }
    .map_err(|_| invalid())?;

    let total = integer_part
        .checked_mul(100)
        .and_then(|v| v.checked_add(cents))
        .ok_or_else(invalid)?;

    Ok(Amount::from_cents(if is_negative { -total } else { total }))
}
