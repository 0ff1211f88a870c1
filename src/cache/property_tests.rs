//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache contract over generated keys and values.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::Barrier;

use crate::cache::{Cache, CacheOptions};
use crate::error::{CacheError, LoaderError};
use crate::store::{Connection, MemoryStore};

// == Strategies ==
/// Generates logical keys, separators included
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_:]{0,32}".prop_map(|s| s)
}

/// Generates namespace segments without separators
fn segment_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,12}".prop_map(|s| s)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Record {
    id: i64,
    label: String,
    tags: Vec<String>,
    score: Option<u32>,
}

fn record_strategy() -> impl Strategy<Value = Record> {
    (
        any::<i64>(),
        ".{0,40}",
        prop::collection::vec("[a-z]{1,8}", 0..5),
        any::<Option<u32>>(),
    )
        .prop_map(|(id, label, tags, score)| Record {
            id,
            label,
            tags,
            score,
        })
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: i64 },
    Get { key: String },
    Delete { key: String },
    Pop { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    // A small key space so operations hit the same keys often
    let key = "[a-d]";
    prop_oneof![
        (key, any::<i64>()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key.prop_map(|key| CacheOp::Get { key }),
        key.prop_map(|key| CacheOp::Delete { key }),
        key.prop_map(|key| CacheOp::Pop { key }),
    ]
}

fn memory_cache<T>(name: &str, connection: &Connection, prefix: &str) -> Cache<T>
where
    T: Serialize + serde::de::DeserializeOwned + Send + Sync,
{
    Cache::new(
        name,
        connection.clone(),
        CacheOptions::new().key_prefix(prefix),
    )
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Storing a value and reading it back returns an equal value.
    #[test]
    fn prop_roundtrip(key in key_strategy(), record in record_strategy()) {
        let connection = Connection::from_store(MemoryStore::new());
        let cache: Cache<Record> = memory_cache("records", &connection, "");

        let read = tokio_test::block_on(async {
            cache.set(&key, &record).await.unwrap();
            cache.get(&key).await.unwrap()
        });

        prop_assert_eq!(read, record);
    }

    // Caches with different prefixes never see each other's values.
    #[test]
    fn prop_prefix_isolation(
        prefix_a in segment_strategy(),
        prefix_b in segment_strategy(),
        key in key_strategy(),
        a in any::<i64>(),
        b in any::<i64>()
    ) {
        prop_assume!(prefix_a != prefix_b);

        let connection = Connection::from_store(MemoryStore::new());
        let cache_a: Cache<i64> = memory_cache("shared", &connection, &prefix_a);
        let cache_b: Cache<i64> = memory_cache("shared", &connection, &prefix_b);

        let (read_a, read_b) = tokio_test::block_on(async {
            cache_a.set(&key, &a).await.unwrap();
            cache_b.set(&key, &b).await.unwrap();
            (cache_a.get(&key).await.unwrap(), cache_b.get(&key).await.unwrap())
        });

        prop_assert_eq!(read_a, a);
        prop_assert_eq!(read_b, b);
        prop_assert_ne!(cache_a.physical_key(&key), cache_b.physical_key(&key));
    }

    // The same logical key always maps to one physical key inside the namespace.
    #[test]
    fn prop_physical_key_shape(prefix in segment_strategy(), name in segment_strategy(), key in key_strategy()) {
        let connection = Connection::from_store(MemoryStore::new());
        let cache: Cache<i64> = memory_cache(&name, &connection, &prefix);

        let physical = cache.physical_key(&key);
        prop_assert_eq!(&physical, &format!("{}:{}:{}", prefix, name, key));
        prop_assert_eq!(physical, cache.physical_key(&key));
    }

    // Any sequence of operations matches a plain HashMap model.
    #[test]
    fn prop_matches_model(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let connection = Connection::from_store(MemoryStore::new());
        let cache: Cache<i64> = memory_cache("model", &connection, "");
        let mut model: HashMap<String, i64> = HashMap::new();

        tokio_test::block_on(async {
            for op in ops {
                match op {
                    CacheOp::Set { key, value } => {
                        cache.set(&key, &value).await.unwrap();
                        model.insert(key, value);
                    }
                    CacheOp::Get { key } => {
                        let read = cache.get_opt(&key).await.unwrap();
                        prop_assert_eq!(read, model.get(&key).copied());
                    }
                    CacheOp::Delete { key } => {
                        cache.delete(&key).await.unwrap();
                        model.remove(&key);
                    }
                    CacheOp::Pop { key } => match (cache.pop(&key).await, model.remove(&key)) {
                        (Ok(read), Some(expected)) => prop_assert_eq!(read, expected),
                        (Err(CacheError::KeyNotFound { key: missing }), None) => {
                            prop_assert_eq!(missing, key)
                        }
                        (read, expected) => {
                            prop_assert!(false, "pop gave {:?}, model had {:?}", read, expected)
                        }
                    },
                }
            }
            Ok(())
        })?;
    }
}

// == Property Test for Error Response Format ==
proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    // Every error renders as JSON with a string "error" field.
    #[test]
    fn prop_error_response_format(message in "[a-zA-Z0-9 _-]{1,100}") {
        use axum::body::to_bytes;
        use axum::response::IntoResponse;

        let error_variants = vec![
            CacheError::Closed,
            CacheError::KeyNotFound { key: message.clone() },
            CacheError::InvalidRequest(message.clone()),
            CacheError::InvalidConnectionString(message.clone()),
            CacheError::Loader(message.clone().into()),
        ];

        for error in error_variants {
            let expected = error.to_string();
            let response = error.into_response();

            let content_type = response
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok());
            prop_assert!(
                content_type.map(|ct| ct.contains("application/json")).unwrap_or(false),
                "Response should have JSON content-type"
            );

            let bytes = tokio_test::block_on(to_bytes(response.into_body(), usize::MAX)).unwrap();
            let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

            prop_assert_eq!(json["error"].as_str(), Some(expected.as_str()));
        }
    }
}

// == Concurrency ==

// Misses are not coalesced: each concurrent caller runs the loader.
#[tokio::test]
async fn test_concurrent_misses_each_call_loader() {
    const CALLERS: usize = 8;

    let calls = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(CALLERS));

    let loader_calls = calls.clone();
    let options = CacheOptions::new().loader(move |_key: String| {
        let calls = loader_calls.clone();
        let barrier = barrier.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            // Hold every loader until all callers have missed
            barrier.wait().await;
            Ok::<_, LoaderError>(json!(7))
        }
    });

    let cache: Cache<i64> =
        Cache::new("race", Connection::from_store(MemoryStore::new()), options).unwrap();

    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.get("hot").await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), 7);
    }
    assert_eq!(calls.load(Ordering::SeqCst), CALLERS);
}

#[tokio::test]
async fn test_concurrent_writers_leave_one_complete_value() {
    let cache: Cache<Record> = Cache::new(
        "writers",
        Connection::from_store(MemoryStore::new()),
        CacheOptions::default(),
    )
    .unwrap();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let cache = cache.clone();
            tokio::spawn(async move {
                let record = Record {
                    id: i,
                    label: format!("writer-{}", i),
                    ..Record::default()
                };
                cache.set("slot", &record).await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let record = cache.get("slot").await.unwrap();
    assert_eq!(record.label, format!("writer-{}", record.id));
}
