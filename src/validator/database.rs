//! Checks that need to query the database.
//!
//! These checks are necessary in order to return nice error messages: the
//! ledger itself accepts allocations for any registered user.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{
    database::Database,
    error::{Entity, InputError, LedgerError, LedgerResult},
    types::{GroupId, NewExpense},
};

/// Check that the group exists and that every payer and every split
/// belongs to one of its members.
pub async fn validate_members_of_group<D: Database>(
    expense: &NewExpense,
    group_id: GroupId,
    database: &Arc<Mutex<D>>,
) -> LedgerResult<()> {
    let database = database.lock().await;

    if database.get_group(group_id)?.is_none() {
        return Err(LedgerError::not_found(Entity::Group, group_id));
    }

    let user_ids: BTreeSet<_> = expense
        .payers
        .iter()
        .map(|p| p.user_id)
        .chain(expense.splits.iter().map(|s| s.user_id))
        .collect();

    for user_id in user_ids {
        if !database.is_group_member(group_id, user_id)? {
            return Err(InputError::not_a_member(group_id, user_id).into());
        }
    }

    Ok(())
}
