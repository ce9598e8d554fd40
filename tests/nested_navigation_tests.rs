//! Integration tests for nested navigators
//!
//! Nested stacks, tab groups, and how actions pick the navigator they land on.

mod common;

use common::*;
use navstate::*;

fn settings_stack(state: &NavigationState) -> Option<&NavigationState> {
    let root = root_stack(state);
    let entry = root.active_route();
    (entry.name == "settings").then(|| entry.state.as_deref()).flatten()
}

#[test]
fn test_push_into_nested_stack_reuses_active_layout() {
    let store = store_with(nested_app(), "/settings");

    store.push("/settings/profile").unwrap();
    store.push("/settings/privacy").unwrap();

    let state = store.state();
    assert_eq!(root_stack(&state).routes().len(), 1);

    let settings = settings_stack(&state).unwrap();
    let names: Vec<&str> = settings.routes().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["index", "profile", "[section]"]);
    assert_eq!(settings.index(), 2);
    assert_eq!(store.href(), "/settings/privacy");
}

#[test]
fn test_push_from_outside_adds_layout_entry() {
    let store = store_with(nested_app(), "/");

    store.push("/settings/profile").unwrap();

    let state = store.state();
    let root = root_stack(&state);
    assert_eq!(root.routes().len(), 2);
    assert_eq!(root.index(), 1);

    let settings = settings_stack(&state).unwrap();
    assert_eq!(settings.routes().len(), 1);
    assert_eq!(settings.routes()[0].name, "profile");
    assert_eq!(settings.routes()[0].params, Some(RouteParams::new()));
}

#[test]
fn test_back_unwinds_nested_stack_first() {
    let store = store_with(nested_app(), "/");
    store.push("/settings").unwrap();
    store.push("/settings/profile").unwrap();

    store.back(Some("/settings"));
    let state = store.state();
    assert_eq!(root_stack(&state).routes().len(), 2);
    assert_eq!(settings_stack(&state).unwrap().routes().len(), 1);

    store.back(Some("/"));
    assert_eq!(root_stack(&store.state()).routes().len(), 1);
    assert!(!store.can_go_back());
}

#[test]
fn test_navigate_finds_layout_below_top() {
    let store = store_with(nested_app(), "/");
    store.push("/settings/profile").unwrap();
    store.push("/about").unwrap();

    store.navigate("/settings/privacy").unwrap();

    let state = store.state();
    let root = root_stack(&state);
    // the [page] entry above settings is dropped
    assert_eq!(root.routes().len(), 2);
    let settings = settings_stack(&state).unwrap();
    let names: Vec<&str> = settings.routes().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["profile", "[section]"]);
}

#[test]
fn test_navigate_dynamic_section_updates_in_place() {
    let store = store_with(nested_app(), "/settings/privacy");

    store.navigate("/settings/privacy?highlight=email").unwrap();
    store.navigate("/settings/privacy").unwrap();

    let state = store.state();
    let settings = settings_stack(&state).unwrap();
    assert_eq!(settings.routes().len(), 1);
    let params = settings.routes()[0].params.clone().unwrap();
    assert_param_equals(&params, "section", "privacy");
    assert_param_not_present(&params, "highlight");
}

#[test]
fn test_dismiss_all_works_on_deepest_stack() {
    let store = store_with(nested_app(), "/");
    store.push("/settings").unwrap();
    store.push("/settings/profile").unwrap();
    store.push("/settings/security").unwrap();
    assert!(store.can_dismiss());

    store.dismiss_all();
    let state = store.state();
    assert_eq!(settings_stack(&state).unwrap().routes().len(), 1);
    assert_eq!(root_stack(&state).routes().len(), 2);

    store.dismiss_all();
    assert_eq!(root_stack(&store.state()).routes().len(), 1);
    assert!(!store.can_dismiss());
}

#[test]
fn test_dismiss_count() {
    let store = store_with(nested_app(), "/");
    for page in ["/a", "/b", "/c", "/d"] {
        store.push(page).unwrap();
    }

    store.dismiss(2);
    assert_eq!(store.pathname(), "/b");
    store.dismiss(99);
    assert_eq!(store.pathname(), "/");
}

#[test]
fn test_tabs_materialize_every_tab() {
    let store = store_with(nested_app(), "/inbox");

    let state = store.state();
    let root = root_stack(&state);
    let tabs = root.active_route().state.as_deref().unwrap();
    assert_eq!(tabs.kind(), NavigatorKind::Tabs);
    assert_eq!(tabs.route_names(), ["feed", "inbox"]);
    assert_eq!(tabs.routes().len(), 2);
    assert_eq!(tabs.index(), 1);
    assert_eq!(tabs.routes()[1].path.as_deref(), Some("/inbox"));
    assert_eq!(tabs.routes()[0].params, None);
}

#[test]
fn test_tabs_switch_keeps_keys_and_back_returns_to_first() {
    let store = store_with(nested_app(), "/feed");
    let feed_key = store.active_route().key;

    store.navigate("/inbox?unread=1").unwrap();
    let state = store.state();
    let root = root_stack(&state);
    assert_eq!(root.routes().len(), 1);
    assert_eq!(store.href(), "/inbox?unread=1");
    assert!(store.can_go_back());

    store.back(Some("/feed"));
    assert_eq!(store.active_route().key, feed_key);
    assert!(!store.can_go_back());
}

#[test]
fn test_tabs_replace_mints_new_key() {
    let store = store_with(nested_app(), "/feed");
    let feed_key = store.active_route().key;

    store.replace("/feed?fresh=1").unwrap();
    let active = store.active_route();
    assert_eq!(active.name, "feed");
    assert_ne!(active.key, feed_key);
}

#[test]
fn test_set_params_on_nested_leaf() {
    let store = store_with(nested_app(), "/settings/profile");

    store.set_params(params(&[("mode", "edit")]));

    let active = store.active_route();
    assert_eq!(active.name, "profile");
    assert_param_equals(&active.params.unwrap(), "mode", "edit");
    assert_eq!(store.href(), "/settings/profile?mode=edit");
}

#[test]
fn test_prefetch_nested_target() {
    let store = store_with(nested_app(), "/");

    store.prefetch("/settings/profile").unwrap();
    let state = store.state();
    let root = root_stack(&state);
    assert_eq!(root.routes().len(), 1);
    assert_eq!(root.preloaded_routes().len(), 1);
    let preloaded_key = root.preloaded_routes()[0].key.clone();

    store.push("/settings/profile").unwrap();
    let state = store.state();
    let root = root_stack(&state);
    assert!(root.preloaded_routes().is_empty());
    assert_eq!(root.routes()[1].key, preloaded_key);
    assert_eq!(store.active_route().name, "profile");
}

#[test]
fn test_every_key_is_unique_after_many_actions() {
    let store = store_with(nested_app(), "/");
    for path in [
        "/settings",
        "/settings/profile",
        "/feed",
        "/inbox",
        "/x",
        "/settings/a",
        "/settings/b",
    ] {
        store.push(path).unwrap();
        store.navigate(path).unwrap();
    }
    store.replace("/y").unwrap();

    let state = store.state();
    state.validate().unwrap();
    let keys = state.collect_keys();
    let unique: std::collections::HashSet<_> = keys.iter().collect();
    assert_eq!(keys.len(), unique.len());
}
