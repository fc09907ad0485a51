//! Integration tests for entity recovery.
//!
//! These use payloads shaped like real timeline responses, including a
//! quoted post that embeds its own author.

use entities::parser::{is_tweet_shape, is_user_shape};
use entities::{FilterData, extract, parse_entities, parse_tweets, parse_users};
use serde_json::{Value, json};

fn user(id: &str, screen_name: &str) -> Value {
    json!({
        "__typename": "User",
        "rest_id": id,
        "legacy": {"screen_name": screen_name, "name": screen_name}
    })
}

fn tweet(id: &str, text: &str, author: Value) -> Value {
    json!({
        "__typename": "Tweet",
        "rest_id": id,
        "core": {"user_results": {"result": author}},
        "legacy": {"full_text": text, "lang": "en", "conversation_id_str": id}
    })
}

fn quote_payload() -> Value {
    let mut outer = tweet("200", "look at this", user("1", "quoter"));
    outer["quoted_status_result"] = json!({"result": tweet("100", "original", user("2", "original_author"))});
    outer["legacy"]["quoted_status_id_str"] = json!("100");

    json!({
        "data": {
            "threaded_conversation_with_injections_v2": {
                "instructions": [{
                    "type": "TimelineAddEntries",
                    "entries": [
                        {"entryId": "tweet-200", "content": {"itemContent": {"tweet_results": {"result": outer}}}},
                        {"entryId": "cursor-bottom", "content": {"value": "abc", "cursorType": "Bottom"}}
                    ]
                }]
            }
        }
    })
}

#[test]
fn test_quoted_tweet_and_both_authors_recovered() {
    let payload = quote_payload();

    let tweets = parse_tweets(&payload);
    let tweet_ids: Vec<_> = tweets.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(tweet_ids, vec!["200", "100"], "outer tweet first, quoted tweet second");
    assert_eq!(tweets[0].quoted_status_id.as_deref(), Some("100"));
    assert_eq!(tweets[1].author.screen_name, "original_author");

    let users = parse_users(&payload);
    assert_eq!(users.len(), 2);
}

#[test]
fn test_nested_matches_share_ancestry() {
    let payload = quote_payload();
    let matches = extract(&payload, is_tweet_shape);

    assert_eq!(matches.len(), 2);
    let outer = matches[0].pointer();
    let inner = matches[1].pointer();
    assert!(inner.starts_with(&outer), "{} should be inside {}", inner, outer);
    assert_eq!(payload.pointer(&inner), Some(matches[1].value));
}

#[test]
fn test_parse_entities_mixes_tweets_and_users() {
    let payload = quote_payload();
    let entities = parse_entities(&payload);

    let tweets = entities
        .iter()
        .filter(|e| matches!(e, FilterData::Tweet(_)))
        .count();
    let users = entities
        .iter()
        .filter(|e| matches!(e, FilterData::User(_)))
        .count();

    assert_eq!(tweets, 2);
    assert_eq!(users, 2);
}

#[test]
fn test_cursor_objects_can_be_found_by_custom_shape() {
    let payload = quote_payload();
    let cursors = entities::extract_objects(&payload, |v| v.get("cursorType").is_some());

    assert_eq!(cursors.len(), 1);
    assert_eq!(cursors[0]["value"], "abc");
    assert!(!is_user_shape(cursors[0]));
}

#[test]
fn test_user_record_recency_is_wall_clock() {
    let before = entities::now_millis();
    let record = entities::UserRecord::now(entities::User::new("1", "a"));
    let after = entities::now_millis();

    assert!(before > 0);
    assert!((before..=after).contains(&entities::Record::recency(&record)));
}
