//! Rule for accounts on subscribed moderation lists.
//!
//! Each list carries its own action; the snapshot stores the resolved action
//! per account.

use crate::context::FilterContext;
use crate::traits::{FilterResult, Rule};
use entities::User;
use std::sync::Arc;

pub struct ModlistRule {
    context: Arc<FilterContext>,
}

impl ModlistRule {
    pub fn new(context: Arc<FilterContext>) -> Self {
        Self { context }
    }
}

impl Rule for ModlistRule {
    fn name(&self) -> &str {
        "modlist"
    }

    fn user_condition(&self, user: &User) -> Option<FilterResult> {
        let action = self.context.snapshot().modlist_action(&user.id);
        Some(action.map_or(FilterResult::Next, FilterResult::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Snapshot;
    use crate::traits::FilterAction;
    use std::collections::HashMap;
    use std::time::Duration;

    #[test]
    fn test_list_action_applied() {
        let snapshot = Snapshot {
            modlist: HashMap::from([
                ("1".to_string(), FilterAction::Hide),
                ("2".to_string(), FilterAction::Block),
            ]),
            ..Default::default()
        };
        let rule = ModlistRule::new(Arc::new(FilterContext::with_snapshot(
            snapshot,
            Duration::from_secs(60),
        )));

        assert_eq!(
            rule.user_condition(&User::new("1", "a")),
            Some(FilterResult::Hide)
        );
        assert_eq!(
            rule.user_condition(&User::new("2", "b")),
            Some(FilterResult::Block)
        );
        assert_eq!(
            rule.user_condition(&User::new("3", "c")),
            Some(FilterResult::Next)
        );
    }
}
