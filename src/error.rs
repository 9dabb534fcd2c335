use std::fmt;

use thiserror::Error;

use crate::{
    amount::Amount,
    types::{GroupId, UserId},
};

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Every failure surfaced by the ledger entry points.
///
/// The caller is responsible for mapping these to user-visible responses.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid request: {0}")]
    Validation(#[from] InputError),

    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: i64 },

    #[error(transparent)]
    Storage(#[from] DatabaseError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entity {
    User,
    Group,
    Expense,
}

#[derive(Error, Debug)]
pub enum InputError {
    #[error("split amounts add up to {splits} but the expense amount is {amount}")]
    SplitSumMismatch { amount: Amount, splits: Amount },

    #[error("invalid amount `{0}`: expected a decimal number such as 12.50")]
    InvalidAmount(String),

    #[error("the {0} of the expense are too large to add up")]
    AmountOutOfRange(&'static str),

    #[error("invalid allocation `{0}`: expected <user_id>:<amount>, for example 3:12.50")]
    InvalidAllocation(String),

    #[error("no user is registered with email `{0}`: provide a name to add them as a ghost user")]
    GhostNameNotProvided(String),

    #[error("user {user_id} is already a member of group {group_id}")]
    AlreadyMember { group_id: GroupId, user_id: UserId },

    #[error("user {user_id} is not a member of group {group_id}")]
    NotAMember { group_id: GroupId, user_id: UserId },
}

/// A failure of the underlying store. Writes are transactional, so when this
/// is returned nothing was persisted.
#[derive(Error)]
#[error("{message}: {cause}")]
pub struct DatabaseError {
    message: String,
    cause: anyhow::Error,
}

impl LedgerError {
    pub fn not_found(entity: Entity, id: i64) -> Self {
        LedgerError::NotFound { entity, id }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LedgerError::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, LedgerError::Validation(_))
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Entity::User => "user",
            Entity::Group => "group",
            Entity::Expense => "expense",
        };
        write!(f, "{name}")
    }
}

impl InputError {
    pub fn split_sum_mismatch(amount: Amount, splits: Amount) -> Self {
        InputError::SplitSumMismatch { amount, splits }
    }

    pub fn invalid_amount(amount: String) -> Self {
        InputError::InvalidAmount(amount)
    }

    pub fn amount_out_of_range(what: &'static str) -> Self {
        InputError::AmountOutOfRange(what)
    }

    pub fn invalid_allocation(allocation: String) -> Self {
        InputError::InvalidAllocation(allocation)
    }

    pub fn ghost_name_not_provided(email: String) -> Self {
        InputError::GhostNameNotProvided(email)
    }

    pub fn already_member(group_id: GroupId, user_id: UserId) -> Self {
        InputError::AlreadyMember { group_id, user_id }
    }

    pub fn not_a_member(group_id: GroupId, user_id: UserId) -> Self {
        InputError::NotAMember { group_id, user_id }
    }
}

impl DatabaseError {
    pub fn new<T: AsRef<str>>(message: T, cause: anyhow::Error) -> Self {
        DatabaseError {
            message: message.as_ref().to_string(),
            cause,
        }
    }
}

impl fmt::Debug for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {:?}", self.message, self.cause)
    }
}
