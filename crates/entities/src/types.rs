//! Core domain types recovered from API payloads.
//!
//! These are the shapes the filter pipeline and the batch jobs consume.
//! The producer's wire format is not modelled here, only the fields
//! the rest of the workspace reads.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Unique identifier of a user (the numeric `rest_id`, kept as text)
pub type UserId = String;

/// Unique identifier of a tweet
pub type TweetId = String;

// =============================================================================
// Entities
// =============================================================================

/// An account as seen in a payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub screen_name: String,
    pub name: String,
    pub description: Option<String>,
    pub profile_image_url: Option<String>,
    /// The viewer already blocks this account
    pub blocking: bool,
    /// The viewer follows this account
    pub following: bool,
    pub is_blue_verified: Option<bool>,
    pub followers_count: Option<u64>,
}

impl User {
    /// Minimal user with only the identifying fields set.
    pub fn new(id: impl Into<UserId>, screen_name: impl Into<String>) -> Self {
        let screen_name = screen_name.into();
        Self {
            id: id.into(),
            name: screen_name.clone(),
            screen_name,
            description: None,
            profile_image_url: None,
            blocking: false,
            following: false,
            is_blue_verified: None,
            followers_count: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Photo,
    Video,
    AnimatedGif,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub kind: MediaKind,
    pub url: String,
}

/// A post, always carrying its author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
    pub id: TweetId,
    pub text: String,
    pub lang: String,
    pub media: Vec<Media>,
    pub created_at: String,
    pub conversation_id: TweetId,
    pub in_reply_to_id: Option<TweetId>,
    pub quoted_status_id: Option<TweetId>,
    pub author: User,
}

// =============================================================================
// Filter input
// =============================================================================

/// The datum a filter rule is evaluated against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterData {
    Tweet(Tweet),
    User(User),
}

impl FilterData {
    /// The user this datum is about: the user itself, or the tweet's author.
    pub fn user(&self) -> &User {
        match self {
            FilterData::Tweet(tweet) => &tweet.author,
            FilterData::User(user) => user,
        }
    }

    /// Id of the datum itself (tweet id for tweets).
    pub fn id(&self) -> &str {
        match self {
            FilterData::Tweet(tweet) => &tweet.id,
            FilterData::User(user) => &user.id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FilterData::Tweet(_) => "tweet",
            FilterData::User(_) => "user",
        }
    }
}

impl From<Tweet> for FilterData {
    fn from(tweet: Tweet) -> Self {
        FilterData::Tweet(tweet)
    }
}

impl From<User> for FilterData {
    fn from(user: User) -> Self {
        FilterData::User(user)
    }
}

/// Milliseconds since the Unix epoch, used as the recency key of records.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
