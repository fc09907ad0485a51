//! Rule that always shows accounts the viewer trusts.
//!
//! Meant to be first in the list so it overrides every later rule.

use crate::context::FilterContext;
use crate::traits::{FilterResult, Rule};
use entities::User;
use std::sync::Arc;

/// Shows followed accounts and, with a context, allow-listed ones.
#[derive(Default)]
pub struct TrustedRule {
    context: Option<Arc<FilterContext>>,
}

impl TrustedRule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also trust the ids in the context's allow-list.
    pub fn with_context(context: Arc<FilterContext>) -> Self {
        Self {
            context: Some(context),
        }
    }
}

impl Rule for TrustedRule {
    fn name(&self) -> &str {
        "trusted"
    }

    fn user_condition(&self, user: &User) -> Option<FilterResult> {
        let allow_listed = self
            .context
            .as_ref()
            .is_some_and(|context| context.snapshot().is_trusted(&user.id));

        Some(if user.following || allow_listed {
            FilterResult::Show
        } else {
            FilterResult::Next
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Snapshot;
    use std::time::Duration;

    #[test]
    fn test_following_is_shown() {
        let mut user = User::new("1", "friend");
        user.following = true;
        assert_eq!(
            TrustedRule::new().user_condition(&user),
            Some(FilterResult::Show)
        );
    }

    #[test]
    fn test_allow_list() {
        let snapshot = Snapshot {
            trusted: ["2".to_string()].into(),
            ..Default::default()
        };
        let rule = TrustedRule::with_context(Arc::new(FilterContext::with_snapshot(
            snapshot,
            Duration::from_secs(60),
        )));

        assert_eq!(
            rule.user_condition(&User::new("2", "b")),
            Some(FilterResult::Show)
        );
        assert_eq!(
            rule.user_condition(&User::new("3", "c")),
            Some(FilterResult::Next)
        );
    }
}
