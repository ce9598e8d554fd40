//! Store lifecycle, subscriptions, and request serialization

mod common;

use common::*;
use navstate::*;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

#[test]
fn test_listeners_see_every_action_in_order() {
    let store = store_with(index_and_dynamic_page(), "/");
    let seen = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&seen);
    let _subscription = store.subscribe(move |state| {
        let len = root_stack(state).routes().len();
        log.lock().unwrap().push(len);
    });

    store.push("/a").unwrap();
    store.push("/b").unwrap();
    store.back(None);
    store.dismiss_all();

    assert_eq!(*seen.lock().unwrap(), vec![2, 3, 2, 1]);
}

#[test]
fn test_unsubscribe_stops_notifications() {
    let store = store_with(index_and_dynamic_page(), "/");
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = Arc::clone(&calls);
    let subscription = store.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(store.subscriber_count(), 1);

    store.push("/a").unwrap();
    subscription.unsubscribe();
    store.push("/b").unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(store.subscriber_count(), 0);
}

#[test]
fn test_listener_dispatch_is_queued_behind_current_action() {
    let store = store_with(index_and_dynamic_page(), "/");
    let order = Arc::new(Mutex::new(Vec::new()));

    let handle = store.clone();
    let log = Arc::clone(&order);
    let _subscription = store.subscribe(move |state| {
        let active = state.find_active_route().name.clone();
        log.lock().unwrap().push(active.clone());
        if active == "index" {
            return;
        }
        if root_stack(state).routes().len() == 2 {
            // runs after this notification completes
            handle.push("/nested").unwrap();
        }
    });

    store.push("/first").unwrap();

    assert_eq!(*order.lock().unwrap(), vec!["[page]", "[page]"]);
    assert_eq!(root_stack(&store.state()).routes().len(), 3);
    assert_eq!(store.pathname(), "/nested");
}

#[test]
fn test_dispose_ignores_later_requests() {
    let store = store_with(index_and_dynamic_page(), "/");
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let _subscription = store.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    store.dispose();
    assert!(store.is_disposed());
    assert_eq!(store.subscriber_count(), 0);

    store.push("/a").unwrap();
    store.back(None);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(store.pathname(), "/");

    // disposing twice is harmless
    store.dispose();
}

#[test]
fn test_store_keeps_working_after_listener_panic() {
    let store = store_with(index_and_dynamic_page(), "/");
    let armed = Arc::new(AtomicBool::new(true));
    let trigger = Arc::clone(&armed);
    let _subscription = store.subscribe(move |_| {
        if trigger.swap(false, Ordering::SeqCst) {
            panic!("listener failure");
        }
    });

    let result = panic::catch_unwind(AssertUnwindSafe(|| store.push("/a")));
    assert!(result.is_err());
    assert_eq!(root_stack(&store.state()).routes().len(), 2);

    store.push("/b").unwrap();
    assert_eq!(root_stack(&store.state()).routes().len(), 3);
    assert_eq!(store.pathname(), "/b");

    store.back(Some("/a"));
    assert_eq!(store.pathname(), "/a");
}

#[test]
fn test_concurrent_pushes_are_serialized() {
    let store = store_with(index_and_dynamic_page(), "/");
    let notifications = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&notifications);
    let _subscription = store.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let store = store.clone();
            thread::spawn(move || {
                for step in 0..25 {
                    store.push(&format!("/w{}-{}", worker, step)).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let state = store.state();
    assert_eq!(root_stack(&state).routes().len(), 1 + 8 * 25);
    assert_eq!(notifications.load(Ordering::SeqCst), 8 * 25);
    state.validate().unwrap();
}

#[test]
fn test_sequential_keys_are_deterministic() {
    let run = || {
        let store = store_with(nested_app(), "/");
        store.push("/settings/profile").unwrap();
        store.navigate("/feed").unwrap();
        store.replace("/x?y=1").unwrap();
        serde_json::to_value(&*store.state()).unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_restore_round_trips_a_snapshot() {
    let store = store_with(nested_app(), "/");
    store.push("/settings/profile").unwrap();
    store.push("/settings/privacy").unwrap();

    let json = store.state().to_json().unwrap();
    let snapshot: NavigationState = serde_json::from_str(&json).unwrap();

    let restored = Store::restore(
        nested_app(),
        RouterConfig::default(),
        snapshot,
        SequentialKeys::new(),
    )
    .unwrap();

    assert_eq!(restored.href(), "/settings/privacy");
    assert_eq!(*restored.state(), *store.state());

    // keys minted after a restore never collide with restored ones
    restored.push("/settings/security").unwrap();
    restored.state().validate().unwrap();

    restored.back(Some("/settings/privacy"));
    restored.back(Some("/settings/profile"));
    assert_eq!(restored.pathname(), "/settings/profile");
}

#[test]
fn test_restore_refreshes_route_names_and_stale_flag() {
    let mut value = serde_json::to_value(&*store_with(single_page(), "page").state()).unwrap();
    value["stale"] = serde_json::json!(true);
    value["routes"][0]["state"]["routeNames"] = serde_json::json!(["page"]);
    let snapshot: NavigationState = serde_json::from_value(value).unwrap();
    assert!(snapshot.is_stale());

    let restored = Store::restore(single_page(), RouterConfig::default(), snapshot, UuidKeys).unwrap();
    let state = restored.state();
    assert!(!state.is_stale());
    assert_eq!(
        root_stack(&state).route_names(),
        ["page", "_sitemap", "+not-found"]
    );
}

#[test]
fn test_restore_rejects_unknown_routes() {
    let snapshot = store_with(single_page(), "page").state();
    let err = Store::restore(
        NavigatorConfig::stack().screen("other"),
        RouterConfig::default(),
        (*snapshot).clone(),
        UuidKeys,
    )
    .unwrap_err();
    assert!(err.is_invalid_state());
}

#[test]
fn test_restore_rejects_broken_index() {
    let mut value = serde_json::to_value(&*store_with(single_page(), "page").state()).unwrap();
    value["routes"][0]["state"]["index"] = serde_json::json!(4);
    let snapshot: NavigationState = serde_json::from_value(value).unwrap();

    let err = Store::restore(single_page(), RouterConfig::default(), snapshot, UuidKeys).unwrap_err();
    assert!(err.is_invalid_state());
}

#[test]
fn test_invalid_route_table_is_reported() {
    let err = Store::create(
        NavigatorConfig::stack().screen("[...rest]/tail"),
        RouterConfig::default(),
    )
    .unwrap_err();
    assert!(err.is_invalid_route());
}

#[test]
fn test_malformed_initial_url_is_reported() {
    let err = Store::create(
        single_page(),
        RouterConfig::default().with_initial_url("/page%"),
    )
    .unwrap_err();
    assert!(err.is_malformed_path());
}

#[test]
fn test_uuid_keys_by_default() {
    let store = Store::create(single_page(), RouterConfig::default().with_initial_url("page")).unwrap();
    let key = store.active_route().key;
    assert!(key.starts_with("page-"));
    assert_eq!(key.len(), "page-".len() + 36);
}

#[cfg(feature = "cache")]
#[test]
fn test_cache_can_be_disabled() {
    let store = Store::with_key_generator(
        single_page(),
        RouterConfig::default().with_cache_capacity(0),
        SequentialKeys::new(),
    )
    .unwrap();
    store.push("/page").unwrap();
    store.push("/page").unwrap();
    assert_eq!(store.cache_stats(), navstate::cache::CacheStats::default());
}
