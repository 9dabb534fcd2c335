//! Functions that check the validity of user input.
//!
//! These functions are called after the parsing phase and execute
//! checks that are not easily done by the parser.

mod database;
mod expense;

pub use database::validate_members_of_group;
pub use expense::{splits_match_amount, validate_expense};
