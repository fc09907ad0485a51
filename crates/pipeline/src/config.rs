//! Rule configuration loaded from JSON.
//!
//! ```json
//! {
//!   "context_max_age_secs": 600,
//!   "rules": [
//!     { "kind": "trusted" },
//!     { "kind": "already_blocked" },
//!     { "kind": "spam", "action": "block" },
//!     { "kind": "keyword", "keywords": ["giveaway"], "action": "hide" }
//!   ]
//! }
//! ```
//!
//! Rules are built in the order listed, which is also their precedence.

use crate::context::FilterContext;
use crate::error::{PipelineError, Result};
use crate::filter_pipeline::FilterPipeline;
use crate::filters::*;
use crate::traits::{FilterAction, Rule};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const DEFAULT_CONTEXT_MAX_AGE_SECS: u64 = 600;

/// One rule and its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleConfig {
    Trusted,
    AlreadyBlocked,
    Spam {
        action: FilterAction,
    },
    Modlist,
    Keyword {
        #[serde(default)]
        name: Option<String>,
        keywords: Vec<String>,
        action: FilterAction,
    },
    BlueVerified {
        max_followers: u64,
        action: FilterAction,
    },
    Language {
        allowed: Vec<String>,
        action: FilterAction,
    },
}

impl RuleConfig {
    fn kind(&self) -> &'static str {
        match self {
            RuleConfig::Trusted => "trusted",
            RuleConfig::AlreadyBlocked => "already_blocked",
            RuleConfig::Spam { .. } => "spam",
            RuleConfig::Modlist => "modlist",
            RuleConfig::Keyword { .. } => "keyword",
            RuleConfig::BlueVerified { .. } => "blue_verified",
            RuleConfig::Language { .. } => "language",
        }
    }

    fn invalid(&self, reason: &str) -> PipelineError {
        PipelineError::InvalidRule {
            rule: self.kind().to_string(),
            reason: reason.to_string(),
        }
    }

    fn build(&self, context: &Arc<FilterContext>) -> Result<Box<dyn Rule>> {
        let rule: Box<dyn Rule> = match self {
            RuleConfig::Trusted => Box::new(TrustedRule::with_context(context.clone())),
            RuleConfig::AlreadyBlocked => Box::new(AlreadyBlockedRule),
            RuleConfig::Spam { action } => Box::new(SpamRule::new(context.clone(), *action)),
            RuleConfig::Modlist => Box::new(ModlistRule::new(context.clone())),
            RuleConfig::Keyword {
                name,
                keywords,
                action,
            } => {
                if keywords.iter().all(|k| k.trim().is_empty()) {
                    return Err(self.invalid("no keywords"));
                }
                let rule = KeywordRule::new(keywords, *action);
                match name {
                    Some(name) => Box::new(rule.with_name(name.clone())),
                    None => Box::new(rule),
                }
            }
            RuleConfig::BlueVerified {
                max_followers,
                action,
            } => Box::new(BlueVerifiedRule::new(*max_followers, *action)),
            RuleConfig::Language { allowed, action } => {
                if allowed.is_empty() {
                    return Err(self.invalid("no allowed languages"));
                }
                Box::new(LanguageRule::new(allowed, *action))
            }
        };
        Ok(rule)
    }
}

/// Ordered rule list plus context settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// How long a filter context snapshot stays current
    #[serde(default = "default_context_max_age_secs")]
    pub context_max_age_secs: u64,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

fn default_context_max_age_secs() -> u64 {
    DEFAULT_CONTEXT_MAX_AGE_SECS
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            context_max_age_secs: DEFAULT_CONTEXT_MAX_AGE_SECS,
            rules: Vec::new(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn context_max_age(&self) -> Duration {
        Duration::from_secs(self.context_max_age_secs)
    }

    /// Empty context whose staleness window comes from this config.
    pub fn new_context(&self) -> Arc<FilterContext> {
        Arc::new(FilterContext::new(self.context_max_age()))
    }

    /// Build the pipeline; context-backed rules share `context`.
    pub fn build(&self, context: &Arc<FilterContext>) -> Result<FilterPipeline> {
        let mut pipeline = FilterPipeline::new();
        for rule in &self.rules {
            pipeline = pipeline.add_boxed(rule.build(context)?);
        }
        debug!("Built pipeline: {:?}", pipeline.rule_names());
        Ok(pipeline)
    }
}
