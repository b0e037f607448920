//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache's expiry, compatibility and eviction rules.

use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::Arc;

use crate::cache::{
    cache_key, decode_key, CacheConfig, CacheEntry, KeyValueStore, ManualClock, MemoryStore,
    Namespace, TtlCache, MAX_ENCODED_QUERY_LEN,
};

// == Test Configuration ==
const TEST_MAX_ENTRIES: usize = 20;

fn test_cache(start_ms: u64, max_entries: usize) -> (TtlCache<MemoryStore>, ManualClock) {
    let clock = ManualClock::new(start_ms);
    let config = CacheConfig {
        max_entries,
        ..CacheConfig::default()
    };
    let cache = TtlCache::with_clock(MemoryStore::new(), config, Arc::new(clock.clone()));
    (cache, clock)
}

// == Strategies ==
fn namespace_strategy() -> impl Strategy<Value = Namespace> {
    prop::sample::select(Namespace::ALL.to_vec())
}

/// Generates keys inside a recognized namespace
fn cache_key_strategy() -> impl Strategy<Value = String> {
    (namespace_strategy(), "[a-zA-Z0-9]{1,32}").prop_map(|(ns, q)| format!("{}_{}", ns, q))
}

/// Generates JSON payloads of a few shapes
fn value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(|n| json!(n)),
        "[a-zA-Z ]{0,40}".prop_map(|s| json!(s)),
        ("[a-zA-Z ]{1,20}", -90i32..90).prop_map(|(name, lat)| json!({"name": name, "lat": lat})),
        prop::collection::vec(any::<bool>(), 0..5).prop_map(|v| json!(v)),
    ]
}

/// Generates queries mixing ASCII, accented and CJK text
fn query_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ,&/%?#éüñ東京駅タワー]{0,30}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Set then get before expiry returns the value; one past the TTL it is
    // gone from both the cache and the store.
    #[test]
    fn prop_ttl_correctness(
        key in cache_key_strategy(),
        value in value_strategy(),
        start in 0u64..1_000_000_000,
        ttl in 1u64..10_000_000,
    ) {
        let (mut cache, clock) = test_cache(start, TEST_MAX_ENTRIES);

        cache.set(&key, &value, Some(ttl)).unwrap();
        prop_assert_eq!(cache.get(&key), Some(value.clone()));

        clock.set(start + ttl);
        prop_assert_eq!(cache.get(&key), Some(value));

        clock.set(start + ttl + 1);
        prop_assert_eq!(cache.get(&key), None);
        prop_assert!(cache.store().get_raw(&key).is_none());
    }

    // Raw JSON written without TTL metadata is returned unmodified forever.
    #[test]
    fn prop_legacy_compatibility(
        key in cache_key_strategy(),
        value in value_strategy(),
        elapsed in any::<u64>(),
    ) {
        let (mut cache, clock) = test_cache(0, TEST_MAX_ENTRIES);
        let raw = serde_json::to_string(&value).unwrap();
        cache.store_mut().set_raw(&key, &raw).unwrap();

        clock.set(elapsed);
        prop_assert_eq!(cache.get(&key), Some(value));
        prop_assert_eq!(cache.cleanup(), 0);
    }

    // Non-JSON text reads as a miss without being removed; cleanup purges it.
    #[test]
    fn prop_corruption_isolation(
        key in cache_key_strategy(),
        garbage in "[a-z]{1,10}\\{[a-z ]{0,10}",
    ) {
        let (mut cache, _) = test_cache(0, TEST_MAX_ENTRIES);
        cache.store_mut().set_raw(&key, &garbage).unwrap();

        prop_assert_eq!(cache.get(&key), None);
        prop_assert!(cache.store().get_raw(&key).is_some());
        prop_assert_eq!(cache.cleanup(), 1);
        prop_assert!(cache.store().get_raw(&key).is_none());
    }

    // A second cleanup with no writes in between removes nothing.
    #[test]
    fn prop_cleanup_idempotent(
        ttls in prop::collection::vec(1u64..1_000, 1..30),
        now in 0u64..2_000,
    ) {
        let (mut cache, clock) = test_cache(0, TEST_MAX_ENTRIES);
        for (i, ttl) in ttls.iter().enumerate() {
            cache.set(&format!("place_{}", i), &i, Some(*ttl)).unwrap();
        }

        clock.set(now);
        let expected = ttls.iter().filter(|ttl| now > **ttl).count();
        prop_assert_eq!(cache.cleanup(), expected);
        prop_assert_eq!(cache.cleanup(), 0);
        prop_assert_eq!(cache.len(), ttls.len() - expected);
    }

    // With max + n entries of distinct timestamps, exactly the n oldest go.
    #[test]
    fn prop_limit_enforcement_boundary(
        timestamps in prop::collection::hash_set(0u64..1_000_000, TEST_MAX_ENTRIES..TEST_MAX_ENTRIES + 30),
    ) {
        let (mut cache, _) = test_cache(0, TEST_MAX_ENTRIES);
        for ts in &timestamps {
            let entry = CacheEntry::new(json!(ts), *ts, u64::MAX);
            let raw = serde_json::to_string(&entry).unwrap();
            cache.store_mut().set_raw(&format!("route_{}", ts), &raw).unwrap();
        }

        let mut sorted: Vec<u64> = timestamps.iter().copied().collect();
        sorted.sort_unstable();
        let excess = sorted.len() - TEST_MAX_ENTRIES;

        prop_assert_eq!(cache.enforce_limit(), excess);
        prop_assert_eq!(cache.len(), TEST_MAX_ENTRIES);

        let kept: HashSet<String> = cache.store().keys().into_iter().collect();
        for (i, ts) in sorted.iter().enumerate() {
            prop_assert_eq!(kept.contains(&format!("route_{}", ts)), i >= excess);
        }

        prop_assert_eq!(cache.enforce_limit(), 0);
    }

    // Keys decode back to their namespace and query.
    #[test]
    fn prop_key_round_trip(namespace in namespace_strategy(), query in query_strategy()) {
        let key = cache_key(namespace, &query);
        prop_assume!(key.len() - namespace.prefix().len() - 1 <= MAX_ENCODED_QUERY_LEN);

        prop_assert_eq!(decode_key(&key), Some((namespace, query)));
    }

    // Stats never change the store.
    #[test]
    fn prop_stats_read_only(
        keys in prop::collection::vec(cache_key_strategy(), 0..20),
        now in 0u64..200,
    ) {
        let (mut cache, clock) = test_cache(0, TEST_MAX_ENTRIES);
        for (i, key) in keys.iter().enumerate() {
            cache.set(key, &i, Some(100)).unwrap();
        }
        let before = cache.store().keys();

        clock.set(now);
        let stats = cache.stats();

        prop_assert_eq!(cache.store().keys(), before.clone());
        prop_assert_eq!(stats.total_entries, before.len());
        let expected_expired = if now > 100 { before.len() } else { 0 };
        prop_assert_eq!(stats.expired_count, expected_expired);
    }
}
