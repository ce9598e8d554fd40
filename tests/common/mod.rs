//! Test utilities for navigation tests
//!
//! Provides fixtures, snapshot helpers, and assertion utilities shared by the
//! integration tests.

#![allow(dead_code)]

use navstate::*;
use serde_json::Value;
use std::sync::Once;

static INIT: Once = Once::new();

/// Route logs to the test output. `RUST_LOG=navstate=debug cargo test` shows them.
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Placeholder that replaces every minted key in snapshots.
pub const KEY: &str = "<key>";

/// A store over `root` with deterministic keys.
pub fn store_with(root: NavigatorConfig, initial_url: &str) -> Store {
    init_logging();
    Store::with_key_generator(
        root,
        RouterConfig::default().with_initial_url(initial_url),
        SequentialKeys::new(),
    )
    .expect("route table should compile")
}

/// `{ page }` at the root.
pub fn single_page() -> NavigatorConfig {
    NavigatorConfig::stack().screen("page")
}

/// `{ index, [page] }` at the root.
pub fn index_and_dynamic_page() -> NavigatorConfig {
    NavigatorConfig::stack().screen("index").screen("[page]")
}

/// Root stack with a nested `settings` stack and a `(tabs)` group.
pub fn nested_app() -> NavigatorConfig {
    NavigatorConfig::stack()
        .screen("index")
        .screen("[page]")
        .route(RouteConfig::layout(
            "settings",
            NavigatorConfig::stack()
                .screen("index")
                .screen("profile")
                .screen("[section]"),
        ))
        .route(RouteConfig::layout(
            "(tabs)",
            NavigatorConfig::tabs().screen("feed").screen("inbox"),
        ))
}

/// Serialize a tree with every `key` field replaced by [`KEY`].
pub fn snapshot(state: &NavigationState) -> Value {
    let mut value = serde_json::to_value(state).expect("state serializes");
    mask_keys(&mut value);
    value
}

fn mask_keys(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (name, child) in map.iter_mut() {
                if name == "key" {
                    *child = Value::String(KEY.to_string());
                } else {
                    mask_keys(child);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(mask_keys),
        _ => {}
    }
}

/// The navigator inside the wrapper stack.
pub fn root_stack(state: &NavigationState) -> &NavigationState {
    state.routes()[0]
        .state
        .as_deref()
        .expect("wrapper entry holds the root navigator")
}

/// Leaf params of the root stack's entries, in history order.
pub fn stack_params(state: &NavigationState) -> Vec<Option<RouteParams>> {
    root_stack(state)
        .routes()
        .iter()
        .map(|entry| entry.params.clone())
        .collect()
}

/// Assert that a parameter holds a single expected value.
pub fn assert_param_equals(params: &RouteParams, key: &str, expected: &str) {
    assert_eq!(
        params.get_str(key),
        Some(expected),
        "Parameter '{}' has wrong value in {:?}",
        key,
        params
    );
}

/// Assert that route parameters do NOT contain a key
pub fn assert_param_not_present(params: &RouteParams, key: &str) {
    assert!(
        !params.contains(key),
        "Parameter '{}' should not be present",
        key
    );
}

/// Build params from string pairs.
pub fn params(pairs: &[(&str, &str)]) -> RouteParams {
    RouteParams::from_pairs(pairs.iter().copied())
}
