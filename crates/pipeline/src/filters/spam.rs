//! Rule for accounts on the known-spam list.

use crate::context::FilterContext;
use crate::traits::{FilterAction, FilterResult, Rule};
use entities::User;
use std::sync::Arc;

/// Applies `action` to users in the context's spam list.
pub struct SpamRule {
    context: Arc<FilterContext>,
    action: FilterAction,
}

impl SpamRule {
    pub fn new(context: Arc<FilterContext>, action: FilterAction) -> Self {
        Self { context, action }
    }
}

impl Rule for SpamRule {
    fn name(&self) -> &str {
        "spam"
    }

    fn user_condition(&self, user: &User) -> Option<FilterResult> {
        Some(if self.context.snapshot().is_spam(&user.id) {
            self.action.into()
        } else {
            FilterResult::Next
        })
    }
}
