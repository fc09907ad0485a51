//! Rule for paid-verification accounts with a small audience.
//!
//! Reply sections are where these accounts cluster; a follower threshold
//! separates them from established accounts that also pay.

use crate::traits::{FilterAction, FilterResult, Rule};
use entities::User;

pub struct BlueVerifiedRule {
    max_followers: u64,
    action: FilterAction,
}

impl BlueVerifiedRule {
    /// Matches blue-verified users with fewer than `max_followers` followers.
    pub fn new(max_followers: u64, action: FilterAction) -> Self {
        Self {
            max_followers,
            action,
        }
    }
}

impl Rule for BlueVerifiedRule {
    fn name(&self) -> &str {
        "blue_verified"
    }

    fn user_condition(&self, user: &User) -> Option<FilterResult> {
        let matched = user.is_blue_verified == Some(true)
            && !user.following
            && user.followers_count.unwrap_or(0) < self.max_followers;

        Some(if matched {
            self.action.into()
        } else {
            FilterResult::Next
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(verified: Option<bool>, followers: Option<u64>) -> User {
        let mut user = User::new("1", "a");
        user.is_blue_verified = verified;
        user.followers_count = followers;
        user
    }

    #[test]
    fn test_threshold() {
        let rule = BlueVerifiedRule::new(1000, FilterAction::Hide);

        assert_eq!(
            rule.user_condition(&user(Some(true), Some(10))),
            Some(FilterResult::Hide)
        );
        assert_eq!(
            rule.user_condition(&user(Some(true), Some(5000))),
            Some(FilterResult::Next)
        );
        // Unknown follower count counts as zero
        assert_eq!(
            rule.user_condition(&user(Some(true), None)),
            Some(FilterResult::Hide)
        );
    }

    #[test]
    fn test_unverified_or_followed() {
        let rule = BlueVerifiedRule::new(1000, FilterAction::Hide);
        assert_eq!(
            rule.user_condition(&user(None, Some(1))),
            Some(FilterResult::Next)
        );

        let mut followed = user(Some(true), Some(1));
        followed.following = true;
        assert_eq!(rule.user_condition(&followed), Some(FilterResult::Next));
    }
}
