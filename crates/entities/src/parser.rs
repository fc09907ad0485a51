//! Thin parsers recovering entities from captured API payloads.
//!
//! Payloads are GraphQL-style responses whose nesting changes between
//! endpoints and over time. Instead of following fixed paths, each entity is
//! recognised by its shape:
//! - user:  `{"__typename": "User", "rest_id": .., "legacy": {"screen_name": ..}}`
//! - tweet: `{"__typename": "Tweet", "rest_id": .., "legacy": {"full_text": ..},
//!           "core": {"user_results": {"result": <user>}}}`
//!
//! `__typename` may be missing on older payloads, in which case the
//! remaining fields decide.

use crate::error::{EntityError, Result};
use crate::extract::extract;
use crate::types::*;
use rayon::prelude::*;
use serde_json::Value;
use std::collections::HashSet;

fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}

fn bool_at(value: &Value, pointer: &str) -> Option<bool> {
    value.pointer(pointer).and_then(Value::as_bool)
}

fn typename_is(value: &Value, expected: &str) -> bool {
    match value.get("__typename").and_then(Value::as_str) {
        Some(name) => name == expected,
        None => true,
    }
}

/// Does this node look like a user result object?
pub fn is_user_shape(value: &Value) -> bool {
    value.is_object()
        && typename_is(value, "User")
        && str_at(value, "/rest_id").is_some()
        && (str_at(value, "/legacy/screen_name").is_some()
            || str_at(value, "/core/screen_name").is_some())
}

/// Does this node look like a tweet result object?
pub fn is_tweet_shape(value: &Value) -> bool {
    value.is_object()
        && typename_is(value, "Tweet")
        && str_at(value, "/rest_id").is_some()
        && str_at(value, "/legacy/full_text").is_some()
        && value
            .pointer("/core/user_results/result")
            .is_some_and(is_user_shape)
}

/// Parse a user result object.
pub fn parse_user(value: &Value) -> Result<User> {
    if !is_user_shape(value) {
        return Err(EntityError::ShapeMismatch { entity: "user" });
    }

    let id = str_at(value, "/rest_id").ok_or_else(|| EntityError::MissingField {
        entity: "user",
        field: "rest_id".to_string(),
    })?;
    let screen_name = str_at(value, "/legacy/screen_name")
        .or_else(|| str_at(value, "/core/screen_name"))
        .ok_or_else(|| EntityError::MissingField {
            entity: "user",
            field: "screen_name".to_string(),
        })?;
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        return Err(EntityError::InvalidValue {
            field: "rest_id".to_string(),
            value: id.to_string(),
        });
    }

    let name = str_at(value, "/legacy/name")
        .or_else(|| str_at(value, "/core/name"))
        .unwrap_or(screen_name);

    let description = str_at(value, "/legacy/description")
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    let profile_image_url = str_at(value, "/legacy/profile_image_url_https")
        .or_else(|| str_at(value, "/avatar/image_url"))
        .map(str::to_string);

    Ok(User {
        id: id.to_string(),
        screen_name: screen_name.to_string(),
        name: name.to_string(),
        description,
        profile_image_url,
        blocking: bool_at(value, "/legacy/blocking")
            .or_else(|| bool_at(value, "/relationship_perspectives/blocking"))
            .unwrap_or(false),
        following: bool_at(value, "/legacy/following")
            .or_else(|| bool_at(value, "/relationship_perspectives/following"))
            .unwrap_or(false),
        is_blue_verified: bool_at(value, "/is_blue_verified"),
        followers_count: value
            .pointer("/legacy/followers_count")
            .and_then(Value::as_u64),
    })
}

fn parse_media(value: &Value) -> Vec<Media> {
    let Some(items) = value
        .pointer("/legacy/extended_entities/media")
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let kind = match item.get("type").and_then(Value::as_str)? {
                "photo" => MediaKind::Photo,
                "video" => MediaKind::Video,
                "animated_gif" => MediaKind::AnimatedGif,
                _ => return None,
            };
            let url = item.get("media_url_https").and_then(Value::as_str)?;
            Some(Media {
                kind,
                url: url.to_string(),
            })
        })
        .collect()
}

/// Parse a tweet result object, including its author.
pub fn parse_tweet(value: &Value) -> Result<Tweet> {
    if !is_tweet_shape(value) {
        return Err(EntityError::ShapeMismatch { entity: "tweet" });
    }

    let id = str_at(value, "/rest_id").ok_or_else(|| EntityError::MissingField {
        entity: "tweet",
        field: "rest_id".to_string(),
    })?;
    let author_value = value
        .pointer("/core/user_results/result")
        .ok_or_else(|| EntityError::MissingField {
            entity: "tweet",
            field: "core.user_results.result".to_string(),
        })?;
    let author = parse_user(author_value)?;

    // long posts carry the untruncated text separately
    let text = str_at(value, "/note_tweet/note_tweet_results/result/text")
        .or_else(|| str_at(value, "/legacy/full_text"))
        .unwrap_or_default();

    Ok(Tweet {
        id: id.to_string(),
        text: text.to_string(),
        lang: str_at(value, "/legacy/lang").unwrap_or("und").to_string(),
        media: parse_media(value),
        created_at: str_at(value, "/legacy/created_at")
            .unwrap_or_default()
            .to_string(),
        conversation_id: str_at(value, "/legacy/conversation_id_str")
            .unwrap_or(id)
            .to_string(),
        in_reply_to_id: str_at(value, "/legacy/in_reply_to_status_id_str").map(str::to_string),
        quoted_status_id: str_at(value, "/legacy/quoted_status_id_str").map(str::to_string),
        author,
    })
}

/// Every distinct user found anywhere in the payload, in document order.
pub fn parse_users(payload: &Value) -> Vec<User> {
    let mut seen = HashSet::new();
    extract(payload, is_user_shape)
        .into_iter()
        .filter_map(|m| match parse_user(m.value) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::debug!("Skipping user at {}: {}", m.pointer(), e);
                None
            }
        })
        .filter(|user| seen.insert(user.id.clone()))
        .collect()
}

/// Every distinct tweet found anywhere in the payload, in document order.
pub fn parse_tweets(payload: &Value) -> Vec<Tweet> {
    let mut seen = HashSet::new();
    extract(payload, is_tweet_shape)
        .into_iter()
        .filter_map(|m| match parse_tweet(m.value) {
            Ok(tweet) => Some(tweet),
            Err(e) => {
                tracing::debug!("Skipping tweet at {}: {}", m.pointer(), e);
                None
            }
        })
        .filter(|tweet| seen.insert(tweet.id.clone()))
        .collect()
}

/// Tweets and users of the payload as filter input, in document order.
///
/// A tweet's author is also reported as a user of its own, since the
/// author appears as a nested user shape.
pub fn parse_entities(payload: &Value) -> Vec<FilterData> {
    let mut seen: HashSet<(&'static str, String)> = HashSet::new();
    let mut entities = Vec::new();

    for m in extract(payload, |v| is_tweet_shape(v) || is_user_shape(v)) {
        let parsed = if is_tweet_shape(m.value) {
            parse_tweet(m.value).map(FilterData::Tweet)
        } else {
            parse_user(m.value).map(FilterData::User)
        };
        match parsed {
            Ok(data) => {
                if seen.insert((data.kind(), data.id().to_string())) {
                    entities.push(data);
                }
            }
            Err(e) => tracing::debug!("Skipping entity at {}: {}", m.pointer(), e),
        }
    }

    entities
}

/// Parse many payloads in parallel, keeping input order.
pub fn parse_payloads(payloads: &[Value]) -> Vec<Vec<FilterData>> {
    payloads.par_iter().map(parse_entities).collect()
}
