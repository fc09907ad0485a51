//! Rule for tweets outside the viewer's languages.

use crate::traits::{FilterAction, FilterResult, Rule};
use entities::Tweet;
use std::collections::HashSet;

/// Language code the network assigns when it cannot tell.
const UNDETERMINED: &str = "und";

/// Applies `action` to tweets whose language is not allowed.
///
/// Tweets with an undetermined language are left alone. Users have no
/// language, so this rule never decides on them.
pub struct LanguageRule {
    allowed: HashSet<String>,
    action: FilterAction,
}

impl LanguageRule {
    pub fn new<I, S>(allowed: I, action: FilterAction) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed: allowed
                .into_iter()
                .map(|lang| lang.as_ref().to_lowercase())
                .collect(),
            action,
        }
    }
}

impl Rule for LanguageRule {
    fn name(&self) -> &str {
        "language"
    }

    fn tweet_condition(&self, tweet: &Tweet) -> Option<FilterResult> {
        let lang = tweet.lang.to_lowercase();
        let allowed = lang == UNDETERMINED || self.allowed.contains(&lang);

        Some(if allowed {
            FilterResult::Next
        } else {
            self.action.into()
        })
    }
}
