//! Rule for accounts the viewer already blocks.
//!
//! Hides them instead of blocking again, so no block request is ever
//! repeated for the same account.

use crate::traits::{FilterResult, Rule};
use entities::User;

pub struct AlreadyBlockedRule;

impl Rule for AlreadyBlockedRule {
    fn name(&self) -> &str {
        "already_blocked"
    }

    fn user_condition(&self, user: &User) -> Option<FilterResult> {
        Some(if user.blocking {
            FilterResult::Hide
        } else {
            FilterResult::Next
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::test_support::tweet;

    #[test]
    fn test_blocked_user_hidden() {
        let mut user = User::new("1", "a");
        assert_eq!(
            AlreadyBlockedRule.user_condition(&user),
            Some(FilterResult::Next)
        );

        user.blocking = true;
        assert_eq!(
            AlreadyBlockedRule.user_condition(&user),
            Some(FilterResult::Hide)
        );
    }

    #[test]
    fn test_no_tweet_predicate() {
        let t = tweet("10", "hello", User::new("1", "a"));
        assert_eq!(AlreadyBlockedRule.tweet_condition(&t), None);
    }
}
