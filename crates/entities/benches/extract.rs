//! Benchmarks for shape-based entity recovery
//!
//! Run with: cargo bench --package entities
//!
//! Builds a synthetic timeline response of the size a single API call returns.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use entities::{extract, parser};
use serde_json::{json, Value};

fn timeline_payload(entries: usize) -> Value {
    let entries: Vec<Value> = (0..entries)
        .map(|i| {
            let author = json!({
                "__typename": "User",
                "rest_id": format!("{}", 1000 + i),
                "is_blue_verified": i % 3 == 0,
                "legacy": {
                    "screen_name": format!("user{}", i),
                    "name": format!("User {}", i),
                    "followers_count": i * 10,
                    "blocking": false,
                    "following": i % 5 == 0
                }
            });
            json!({
                "entryId": format!("tweet-{}", i),
                "content": {
                    "itemContent": {
                        "tweet_results": {
                            "result": {
                                "__typename": "Tweet",
                                "rest_id": format!("{}", 5000 + i),
                                "core": {"user_results": {"result": author}},
                                "legacy": {
                                    "full_text": format!("post number {}", i),
                                    "lang": "en",
                                    "conversation_id_str": format!("{}", 5000 + i)
                                }
                            }
                        }
                    }
                }
            })
        })
        .collect();

    json!({"data": {"home": {"timeline": {"instructions": [{"entries": entries}]}}}})
}

fn bench_extract(c: &mut Criterion) {
    let payload = timeline_payload(40);

    c.bench_function("extract_user_shapes", |b| {
        b.iter(|| {
            let matches = extract(black_box(&payload), parser::is_user_shape);
            black_box(matches)
        })
    });

    c.bench_function("parse_entities", |b| {
        b.iter(|| {
            let entities = parser::parse_entities(black_box(&payload));
            black_box(entities)
        })
    });
}

criterion_group!(benches, bench_extract);
criterion_main!(benches);
