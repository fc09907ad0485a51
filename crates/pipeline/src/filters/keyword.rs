//! Case-insensitive keyword matching on tweet text and user profiles.

use crate::traits::{FilterAction, FilterResult, Rule};
use entities::{Tweet, User};

/// Applies `action` when any keyword appears.
///
/// Tweets are matched on their text and their author's profile, users on
/// display name and bio.
pub struct KeywordRule {
    name: String,
    keywords: Vec<String>,
    action: FilterAction,
}

impl KeywordRule {
    /// Empty keywords are dropped.
    pub fn new<I, S>(keywords: I, action: FilterAction) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();

        Self {
            name: "keyword".to_string(),
            keywords,
            action,
        }
    }

    /// Report decisions under `name` instead of `keyword`.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn matches(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }

    fn profile_matches(&self, user: &User) -> bool {
        self.matches(&user.name) || user.description.as_deref().is_some_and(|d| self.matches(d))
    }

    fn result(&self, matched: bool) -> FilterResult {
        if matched {
            self.action.into()
        } else {
            FilterResult::Next
        }
    }
}

impl Rule for KeywordRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn tweet_condition(&self, tweet: &Tweet) -> Option<FilterResult> {
        Some(self.result(self.matches(&tweet.text) || self.profile_matches(&tweet.author)))
    }

    fn user_condition(&self, user: &User) -> Option<FilterResult> {
        Some(self.result(self.profile_matches(user)))
    }
}
