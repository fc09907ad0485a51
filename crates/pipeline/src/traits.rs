//! Core types of the moderation pipeline.
//!
//! A rule is a named pair of optional predicates, one for tweets and one for
//! users. Rules never act on their own: the pipeline turns the first decisive
//! result into a [`Decision`] and hands Hide/Block to the [`ActionHandler`].

use entities::{FilterData, Tweet, User};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one rule for one datum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterResult {
    Show,
    Hide,
    Block,
    /// Defer to the next rule
    Next,
}

impl FilterResult {
    /// The side effect this result asks for, if any.
    pub fn action(self) -> Option<FilterAction> {
        match self {
            FilterResult::Hide => Some(FilterAction::Hide),
            FilterResult::Block => Some(FilterAction::Block),
            FilterResult::Show | FilterResult::Next => None,
        }
    }
}

/// The decisive results that carry a side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterAction {
    Hide,
    Block,
}

impl FilterAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterAction::Hide => "hide",
            FilterAction::Block => "block",
        }
    }
}

impl fmt::Display for FilterAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<FilterAction> for FilterResult {
    fn from(action: FilterAction) -> Self {
        match action {
            FilterAction::Hide => FilterResult::Hide,
            FilterAction::Block => FilterResult::Block,
        }
    }
}

/// A named moderation rule.
///
/// Returning `None` from a condition means the rule has no predicate of that
/// kind. For tweets the pipeline falls back from the tweet predicate to the
/// user predicate applied to the author.
///
/// ## Design Note
/// - `Send + Sync` so one pipeline can be shared across tasks
/// - Conditions are pure; side effects belong in the [`ActionHandler`]
pub trait Rule: Send + Sync {
    /// Returns the name of this rule (reported as the decision reason)
    fn name(&self) -> &str;

    fn tweet_condition(&self, _tweet: &Tweet) -> Option<FilterResult> {
        None
    }

    fn user_condition(&self, _user: &User) -> Option<FilterResult> {
        None
    }
}

type TweetPredicate = Box<dyn Fn(&Tweet) -> FilterResult + Send + Sync>;
type UserPredicate = Box<dyn Fn(&User) -> FilterResult + Send + Sync>;

/// A rule assembled from closures.
///
/// ```ignore
/// let rule = FnRule::new("self").user(|u| {
///     if u.following { FilterResult::Show } else { FilterResult::Next }
/// });
/// ```
pub struct FnRule {
    name: String,
    tweet: Option<TweetPredicate>,
    user: Option<UserPredicate>,
}

impl FnRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tweet: None,
            user: None,
        }
    }

    pub fn tweet(mut self, predicate: impl Fn(&Tweet) -> FilterResult + Send + Sync + 'static) -> Self {
        self.tweet = Some(Box::new(predicate));
        self
    }

    pub fn user(mut self, predicate: impl Fn(&User) -> FilterResult + Send + Sync + 'static) -> Self {
        self.user = Some(Box::new(predicate));
        self
    }
}

impl Rule for FnRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn tweet_condition(&self, tweet: &Tweet) -> Option<FilterResult> {
        self.tweet.as_ref().map(|predicate| predicate(tweet))
    }

    fn user_condition(&self, user: &User) -> Option<FilterResult> {
        self.user.as_ref().map(|predicate| predicate(user))
    }
}

/// What the pipeline concluded about one datum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// `true` to show the datum
    pub value: bool,
    /// Name of the deciding rule; `None` when no rule decided
    pub reason: Option<String>,
}

impl Decision {
    /// Default outcome when every rule deferred.
    pub fn default_show() -> Self {
        Self {
            value: true,
            reason: None,
        }
    }

    pub fn show(reason: &str) -> Self {
        Self {
            value: true,
            reason: Some(reason.to_string()),
        }
    }

    pub fn hide(reason: &str) -> Self {
        Self {
            value: false,
            reason: Some(reason.to_string()),
        }
    }
}

/// Receives every decisive Hide/Block, exactly once, at decision time.
///
/// Called synchronously from `decide`, so implementations must be quick and
/// must not fail; anything slow is queued elsewhere.
pub trait ActionHandler: Send + Sync {
    fn on_action(&self, data: &FilterData, action: FilterAction, rule: &str);
}

impl<F> ActionHandler for F
where
    F: Fn(&FilterData, FilterAction, &str) + Send + Sync,
{
    fn on_action(&self, data: &FilterData, action: FilterAction, rule: &str) {
        self(data, action, rule)
    }
}
