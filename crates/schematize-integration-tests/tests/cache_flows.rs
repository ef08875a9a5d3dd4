//! # Cache Flows
//!
//! Records cached by `schematize-cache` as an observer of schemas declared
//! through `schematize-schema`.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use schematize_cache::{
    CacheConfiguration, CacheSettings, CacheStore, Clock, ConfigError, MemoryStore, RecordCache,
};
use schematize_schema::{FieldDecl, Schema, SchemaBuilder, TypeTag, ValidationMode, Value};
use serde_json::json;

struct Harness {
    line: Arc<Schema>,
    order: Arc<Schema>,
    cache: Arc<RecordCache>,
    store: MemoryStore,
    now: Arc<Mutex<DateTime<Utc>>>,
}

fn harness(settings: &str) -> Harness {
    let now = Arc::new(Mutex::new(Utc::now()));
    let handle = Arc::clone(&now);
    let clock: Clock = Arc::new(move || *handle.lock());
    let store = MemoryStore::with_clock(Arc::clone(&clock));

    let settings = CacheSettings::from_yaml(settings).unwrap();
    let mut config = CacheConfiguration::from_settings(&settings).unwrap();
    config.set_client(Arc::new(store.clone())).set_clock(clock);
    let cache = Arc::new(RecordCache::new(config));

    let line = SchemaBuilder::new("Line")
        .field(FieldDecl::new("sku").of(TypeTag::Text))
        .unwrap()
        .field(FieldDecl::new("qty").of(TypeTag::Integer))
        .unwrap()
        .build();

    let mut order = SchemaBuilder::new("Order");
    order
        .declare_field(FieldDecl::new("id").of(TypeTag::Integer))
        .unwrap();
    order
        .declare_field(FieldDecl::new("lines").of(TypeTag::schema(&line)).list())
        .unwrap();
    order.observer(cache.clone());

    Harness {
        line,
        order: order.build(),
        cache,
        store,
        now,
    }
}

fn order_input(id: i64) -> Value {
    Value::from(json!({"id": id, "lines": [{"sku": "A-1", "qty": "2"}]}))
}

#[test]
fn nested_records_round_trip_through_the_store() {
    let h = harness("stochastic_bust: 1.0\n");
    let built = h.order.construct(&order_input(1)).unwrap();

    let items = h.cache.cached_items(&h.order, None).unwrap();
    assert_eq!(items, [built]);
    assert_eq!(
        items[0].to_json(),
        json!({"id": 1, "lines": [{"sku": "A-1", "qty": 2}]})
    );
    // The nested schema has no observer.
    assert!(h.cache.cached_keys(&h.line).unwrap().is_empty());
}

#[test]
fn custom_namespace_applies_to_every_schema() {
    let h = harness("namespace: shop\n");
    h.order.construct(&order_input(1)).unwrap();
    let keys = h.cache.cached_keys(&h.order).unwrap();
    assert_eq!(keys.len(), 1);
    assert!(keys[0].starts_with("shop:"));
    assert_eq!(h.cache.namespace(&h.line), "shop");
}

#[test]
fn reassignment_replaces_the_cached_entry() {
    let h = harness("stochastic_bust: 1.0\n");
    let mut record = h.order.construct(&order_input(1)).unwrap();
    let before = h.cache.cached_keys(&h.order).unwrap();

    assert!(record.set("id", Value::Integer(2)));
    let after = h.cache.cached_keys(&h.order).unwrap();
    assert_eq!(after.len(), 1);
    assert_ne!(before, after);

    let items = h.cache.cached_items(&h.order, None).unwrap();
    assert_eq!(items[0].get("id"), Some(&Value::Integer(2)));
}

#[test]
fn lenient_records_are_listed_with_their_failures() {
    let h = harness("stochastic_bust: 1.0\n");
    let mut builder = SchemaBuilder::new("Doc");
    builder
        .declare_field(FieldDecl::new("id").of(TypeTag::Integer))
        .unwrap();
    builder
        .declare_field(FieldDecl::new("n").of(TypeTag::Integer).optional())
        .unwrap();
    builder.observer(h.cache.clone());
    let doc = builder.build();

    let strict = doc.construct(&Value::from(json!({"id": 1, "n": 2}))).unwrap();
    let lenient = doc
        .construct_lenient(&Value::from(json!({"id": 2, "n": "bad"})))
        .unwrap();
    assert_eq!(lenient.failed_checks(), ["n"]);

    let mut items = h.cache.cached_items(&doc, None).unwrap();
    items.sort_by_key(|r| r.get("id").and_then(Value::as_i64));
    assert_eq!(items, [strict, lenient]);
    assert!(items[0].failed_checks().is_empty());
    assert_eq!(items[1].failed_checks(), ["n"]);
}

#[test]
fn entries_that_no_longer_restore_are_skipped() {
    let h = harness("stochastic_bust: 1.0\n");
    let kept = h.order.construct(&order_input(1)).unwrap();
    let stale = h.order.construct(&order_input(2)).unwrap();
    let stale_key = h.cache.cache_key(&stale, None);
    h.store
        .write(&stale_key, br#"{"id": "two", "lines": []}"#.to_vec(), None)
        .unwrap();

    assert_eq!(h.cache.cached_items(&h.order, None).unwrap(), [kept]);
    assert_eq!(h.cache.cached_keys(&h.order).unwrap().len(), 2);
}

#[test]
fn custom_key_entries_follow_reassignment() {
    let h = harness("stochastic_bust: 1.0\n");
    let mut record = h
        .order
        .construct_keyed(&order_input(1), ValidationMode::Strict, "launch")
        .unwrap();
    assert_eq!(h.cache.cached_keys(&h.order).unwrap(), ["jss:order:launch"]);

    assert!(record.set("id", Value::Integer(2)));
    assert_eq!(h.cache.cached_keys(&h.order).unwrap(), ["jss:order:launch"]);
    let items = h.cache.cached_items(&h.order, Some("launch")).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].get("id"), Some(&Value::Integer(2)));
    // Only the keeper and the custom entry remain.
    assert_eq!(h.store.len(), 2);
}

#[test]
fn update_on_change_disabled_leaves_the_old_entry() {
    let h = harness("update_on_change: false\nstochastic_bust: 1.0\n");
    let mut record = h.order.construct(&order_input(1)).unwrap();
    let before = h.cache.cached_keys(&h.order).unwrap();
    assert!(record.set("id", Value::Integer(2)));
    assert_eq!(h.cache.cached_keys(&h.order).unwrap(), before);
}

#[test]
fn expired_entries_disappear() {
    let h = harness("ttl_seconds: 60\nstochastic_bust: 1.0\n");
    h.order.construct(&order_input(1)).unwrap();
    *h.now.lock() += chrono::Duration::seconds(61);

    assert!(h.cache.cached_keys(&h.order).unwrap().is_empty());
    assert!(h.cache.cached_items(&h.order, None).unwrap().is_empty());
    assert_eq!(h.cache.clear_unscored_items(&h.order).unwrap(), 1);
}

#[test]
fn clear_cache_removes_keeper_and_payloads() {
    let h = harness("{}");
    h.order.construct(&order_input(1)).unwrap();
    h.order.construct(&order_input(2)).unwrap();
    assert_eq!(h.cache.clear_cache(&h.order).unwrap(), 3);
    assert!(h.store.is_empty());
}

#[test]
fn invalid_settings_are_rejected() {
    let bust = CacheSettings::from_yaml("stochastic_bust: 1.5\n").unwrap();
    assert!(matches!(
        CacheConfiguration::from_settings(&bust),
        Err(ConfigError::StochasticBustOutOfRange(_))
    ));
    let ttl = CacheSettings::from_yaml("ttl_seconds: 0\n").unwrap();
    assert!(CacheConfiguration::from_settings(&ttl).is_err());
    assert!(CacheSettings::from_yaml("unknown: 1\n").is_err());
}

#[test]
fn store_ttl_is_enforced_by_the_store() {
    let now = Arc::new(Mutex::new(Utc::now()));
    let handle = Arc::clone(&now);
    let store = MemoryStore::with_clock(Arc::new(move || *handle.lock()));
    store
        .write("k", b"v".to_vec(), Some(Duration::from_secs(5)))
        .unwrap();
    assert_eq!(store.read("k").unwrap(), Some(b"v".to_vec()));
    *now.lock() += chrono::Duration::seconds(6);
    assert_eq!(store.read("k").unwrap(), None);
}
