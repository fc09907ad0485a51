//! The FilterPipeline evaluates rules in order for each datum.
//!
//! Precedence is list order only: the first rule to return anything other
//! than `Next` decides, and later rules are never evaluated.

use crate::traits::{ActionHandler, Decision, FilterResult, Rule};
use entities::{FilterData, parse_entities};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// Ordered list of rules plus an optional action handler.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_rule(TrustedRule::new())
///     .add_rule(SpamRule::new(context.clone(), FilterAction::Block))
///     .on_action(dispatcher.clone());
///
/// let decision = pipeline.decide(&FilterData::User(user));
/// ```
pub struct FilterPipeline {
    rules: Vec<Box<dyn Rule>>,
    on_action: Option<Arc<dyn ActionHandler>>,
}

impl FilterPipeline {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            on_action: None,
        }
    }

    /// Append a rule; it takes precedence over rules added after it.
    pub fn add_rule(mut self, rule: impl Rule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn add_boxed(mut self, rule: Box<dyn Rule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn on_action(self, handler: impl ActionHandler + 'static) -> Self {
        self.on_action_shared(Arc::new(handler))
    }

    pub fn on_action_shared(mut self, handler: Arc<dyn ActionHandler>) -> Self {
        self.on_action = Some(handler);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Decide whether `data` should be shown.
    ///
    /// ## Algorithm
    /// For each rule in order:
    /// 1. Tweets use the tweet predicate, or else the user predicate on the author
    /// 2. Users use the user predicate
    /// 3. A missing predicate counts as `Next`
    /// 4. `Show` returns visible; `Hide`/`Block` notify the handler once and
    ///    return hidden; `Next` moves on
    ///
    /// With no decisive rule the datum is shown without a reason.
    pub fn decide(&self, data: &FilterData) -> Decision {
        for rule in &self.rules {
            let result = evaluate(rule.as_ref(), data);
            if result == FilterResult::Next {
                continue;
            }

            debug!(
                "Rule {} decided {:?} for {} {}",
                rule.name(),
                result,
                data.kind(),
                data.id()
            );

            return match result.action() {
                None => Decision::show(rule.name()),
                Some(action) => {
                    if let Some(handler) = &self.on_action {
                        handler.on_action(data, action, rule.name());
                    }
                    Decision::hide(rule.name())
                }
            };
        }

        Decision::default_show()
    }

    /// Recover every entity in a raw payload and decide each one.
    pub fn decide_payload(&self, payload: &Value) -> Vec<(FilterData, Decision)> {
        let entities = parse_entities(payload);
        debug!("Deciding {} entities from payload", entities.len());

        entities
            .into_iter()
            .map(|data| {
                let decision = self.decide(&data);
                (data, decision)
            })
            .collect()
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn evaluate(rule: &dyn Rule, data: &FilterData) -> FilterResult {
    let result = match data {
        FilterData::Tweet(tweet) => rule
            .tweet_condition(tweet)
            .or_else(|| rule.user_condition(&tweet.author)),
        FilterData::User(user) => rule.user_condition(user),
    };
    result.unwrap_or(FilterResult::Next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{FilterAction, FnRule};
    use entities::{Tweet, User};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn tweet(id: &str, text: &str, author: User) -> Tweet {
        Tweet {
            id: id.to_string(),
            text: text.to_string(),
            lang: "en".to_string(),
            media: Vec::new(),
            created_at: String::new(),
            conversation_id: id.to_string(),
            in_reply_to_id: None,
            quoted_status_id: None,
            author,
        }
    }

    #[test]
    fn test_empty_pipeline_shows() {
        let pipeline = FilterPipeline::new();
        let decision = pipeline.decide(&User::new("1", "a").into());
        assert_eq!(decision, Decision::default_show());
    }

    #[test]
    fn test_all_next_shows_without_reason() {
        let pipeline = FilterPipeline::new()
            .add_rule(FnRule::new("a").user(|_| FilterResult::Next))
            .add_rule(FnRule::new("b"));

        let decision = pipeline.decide(&User::new("1", "a").into());
        assert!(decision.value);
        assert_eq!(decision.reason, None);
    }

    #[test]
    fn test_tweet_predicate_preferred_over_author() {
        let pipeline = FilterPipeline::new().add_rule(
            FnRule::new("both")
                .tweet(|_| FilterResult::Next)
                .user(|_| FilterResult::Hide),
        );

        let data = FilterData::Tweet(tweet("10", "hi", User::new("1", "a")));
        // The tweet predicate exists, so the user predicate is not consulted
        assert_eq!(pipeline.decide(&data), Decision::default_show());
    }

    #[test]
    fn test_tweet_falls_back_to_author() {
        let pipeline =
            FilterPipeline::new().add_rule(FnRule::new("author").user(|u| {
                if u.id == "1" {
                    FilterResult::Hide
                } else {
                    FilterResult::Next
                }
            }));

        let data = FilterData::Tweet(tweet("10", "hi", User::new("1", "a")));
        assert_eq!(pipeline.decide(&data), Decision::hide("author"));
    }

    #[test]
    fn test_tweet_only_rule_ignores_users() {
        let pipeline =
            FilterPipeline::new().add_rule(FnRule::new("tweets").tweet(|_| FilterResult::Hide));

        assert_eq!(
            pipeline.decide(&User::new("1", "a").into()),
            Decision::default_show()
        );
    }

    #[test]
    fn test_hide_calls_handler_once_and_stops() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let later = Arc::new(AtomicUsize::new(0));

        let recorded = calls.clone();
        let counter = later.clone();
        let pipeline = FilterPipeline::new()
            .add_rule(FnRule::new("first").user(|_| FilterResult::Next))
            .add_rule(FnRule::new("spam").user(|_| FilterResult::Block))
            .add_rule(FnRule::new("never").user(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                FilterResult::Show
            }))
            .on_action(move |data: &FilterData, action: FilterAction, rule: &str| {
                recorded
                    .lock()
                    .unwrap()
                    .push((data.id().to_string(), action, rule.to_string()));
            });

        let decision = pipeline.decide(&User::new("7", "bot").into());

        assert_eq!(decision, Decision::hide("spam"));
        assert_eq!(
            *calls.lock().unwrap(),
            vec![("7".to_string(), FilterAction::Block, "spam".to_string())]
        );
        assert_eq!(later.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_show_does_not_call_handler() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let pipeline = FilterPipeline::new()
            .add_rule(FnRule::new("ok").user(|_| FilterResult::Show))
            .on_action(move |_: &FilterData, _: FilterAction, _: &str| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        assert_eq!(
            pipeline.decide(&User::new("1", "a").into()),
            Decision::show("ok")
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_rule_names_in_order() {
        let pipeline = FilterPipeline::new()
            .add_rule(FnRule::new("a"))
            .add_boxed(Box::new(FnRule::new("b")));
        assert_eq!(pipeline.rule_names(), vec!["a", "b"]);
        assert_eq!(pipeline.len(), 2);
    }
}
