//! The action reducer.
//!
//! [`reduce`] is a pure function from the current tree and a
//! [`NavigationAction`] to the next tree. Targeted actions carry a
//! [`RouteMatch`] whose chain is walked alongside the tree: at every level the
//! reducer either descends into the active entry (when it already is the
//! route the chain wants) or applies the action's own rule to that navigator
//! and stops there.
//!
//! | Action | Stack | Tabs |
//! |--------|-------|------|
//! | push | append a new entry | switch to the tab, update its params |
//! | navigate | reuse the topmost entry with the same name and identity, dropping entries above it; otherwise push | same as push |
//! | replace | swap the active entry for a new one | re-create the tab's entry |
//! | prefetch | add to `preloadedRoutes` | no-op |
//! | back | pop the active entry | return to the first tab |
//!
//! A route's identity is the set of values bound by its own dynamic segments.
//! Query parameters never take part in locating an entry.
//!
//! Back and dismiss unwind the deepest navigator that can unwind first.
//! Anything that cannot be applied to the current tree is a no-op, reported
//! as `None`.

use crate::keys::KeyRing;
use crate::resolve::{MatchedRoute, RouteMatch};
use crate::route::RouteTable;
use crate::{debug_log, warn_log, NavigationState, NavigatorKind, RouteEntry, RouteParams};
use std::fmt;
use std::sync::Arc;

/// A navigation request, resolved against the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationAction {
    /// Always add a new history entry.
    Push(RouteMatch),
    /// Reuse a matching entry if there is one, otherwise push.
    Navigate(RouteMatch),
    /// Swap the active entry for a new one.
    Replace(RouteMatch),
    /// Materialize the target without activating it.
    Prefetch(RouteMatch),
    /// Unwind one step of history.
    Back,
    /// Return the deepest stack with history to its first entry.
    DismissAll,
    /// Pop up to `n` entries from the deepest stack with history.
    Dismiss(usize),
    /// Merge params into the active leaf entry.
    SetParams(RouteParams),
}

impl NavigationAction {
    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Push(_) => "push",
            Self::Navigate(_) => "navigate",
            Self::Replace(_) => "replace",
            Self::Prefetch(_) => "prefetch",
            Self::Back => "back",
            Self::DismissAll => "dismissAll",
            Self::Dismiss(_) => "dismiss",
            Self::SetParams(_) => "setParams",
        }
    }

    /// The route match carried by targeted actions.
    pub fn target(&self) -> Option<&RouteMatch> {
        match self {
            Self::Push(target)
            | Self::Navigate(target)
            | Self::Replace(target)
            | Self::Prefetch(target) => Some(target),
            _ => None,
        }
    }
}

impl fmt::Display for NavigationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target() {
            Some(target) => write!(f, "{} '{}'", self.name(), target.name()),
            None => f.write_str(self.name()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Push,
    Navigate,
    Replace,
    Prefetch,
}

/// How a newly built leaf entry is filled in.
struct LeafInit {
    params: Option<RouteParams>,
    path: Option<String>,
}

impl LeafInit {
    fn for_action(target: &RouteMatch) -> Self {
        Self {
            params: Some(target.params().clone()),
            path: None,
        }
    }
}

/// Build the first tree for `target`, reached through the URL `href`.
///
/// The leaf entry records `href` as its path and has no params unless the
/// URL carried some.
pub fn initial_state(
    table: &RouteTable,
    target: &RouteMatch,
    href: &str,
    keys: &mut KeyRing<'_>,
) -> NavigationState {
    let leaf = LeafInit {
        params: Some(target.params().clone()).filter(|params| !params.is_empty()),
        path: Some(href.to_string()),
    };
    build_navigator(table, target.chain(), &leaf, keys)
}

/// Apply `action` to `state`.
///
/// Returns `None` when the action does not change the tree.
///
/// `state` must pass [`NavigationState::validate`]. Trees built by this
/// module and by [`Store::restore`](crate::Store::restore) always do; a tree
/// deserialized by hand with an out-of-range `index` panics here.
pub fn reduce(
    table: &RouteTable,
    state: &NavigationState,
    action: &NavigationAction,
    keys: &mut KeyRing<'_>,
) -> Option<NavigationState> {
    debug_assert!(
        state.validate().is_ok(),
        "reduce needs a tree that passes validation: {:?}",
        state.validate()
    );

    let next = match action {
        NavigationAction::Push(target) => {
            apply_target(table, state, target.chain(), target, Mode::Push, keys)
        }
        NavigationAction::Navigate(target) => {
            apply_target(table, state, target.chain(), target, Mode::Navigate, keys)
        }
        NavigationAction::Replace(target) => {
            apply_target(table, state, target.chain(), target, Mode::Replace, keys)
        }
        NavigationAction::Prefetch(target) => {
            apply_target(table, state, target.chain(), target, Mode::Prefetch, keys)
        }
        NavigationAction::Back => back(state),
        NavigationAction::DismissAll => dismiss(state, usize::MAX),
        NavigationAction::Dismiss(count) => dismiss(state, *count),
        NavigationAction::SetParams(params) => set_params(state, params),
    };

    match &next {
        Some(next) => {
            debug_log!(
                "Applied {} -> active '{}' (can go back: {})",
                action,
                next.find_active_route().name,
                next.can_go_back()
            );
        }
        None => {
            debug_log!("{} left the tree unchanged", action);
        }
    }

    next
}

/// A chain naming a route this navigator does not declare comes from a
/// different table or a drifted tree. That is a logged no-op, not a fault.
fn apply_target(
    table: &RouteTable,
    state: &NavigationState,
    chain: &[MatchedRoute],
    target: &RouteMatch,
    mode: Mode,
    keys: &mut KeyRing<'_>,
) -> Option<NavigationState> {
    let level = chain.first()?;
    if !state.route_names.contains(&level.name) {
        warn_log!(
            "Navigator '{}' does not know route '{}', ignoring {:?}",
            state.key,
            level.name,
            mode
        );
        return None;
    }

    let active = state.active_route();
    if chain.len() > 1 && active.matches(&level.name, &level.params) {
        let entry = descend(table, active, &chain[1..], target, mode, keys)?;
        let mut routes = state.routes.clone();
        routes[state.index] = entry;
        return Some(state.clone_with_routes(routes, state.index));
    }

    match state.kind {
        NavigatorKind::Stack => apply_to_stack(table, state, chain, target, mode, keys),
        NavigatorKind::Tabs => apply_to_tabs(table, state, chain, target, mode, keys),
    }
}

/// Apply the rest of the chain inside a layout entry. Builds the nested
/// navigator when the entry has none yet.
fn descend(
    table: &RouteTable,
    entry: &RouteEntry,
    rest: &[MatchedRoute],
    target: &RouteMatch,
    mode: Mode,
    keys: &mut KeyRing<'_>,
) -> Option<RouteEntry> {
    let child = match entry.state.as_deref() {
        Some(child) => apply_target(table, child, rest, target, mode, keys)?,
        None => build_navigator(table, rest, &LeafInit::for_action(target), keys),
    };
    Some(RouteEntry {
        state: Some(Arc::new(child)),
        ..entry.clone()
    })
}

fn apply_to_stack(
    table: &RouteTable,
    state: &NavigationState,
    chain: &[MatchedRoute],
    target: &RouteMatch,
    mode: Mode,
    keys: &mut KeyRing<'_>,
) -> Option<NavigationState> {
    let level = &chain[0];
    let is_leaf = chain.len() == 1;

    match mode {
        Mode::Push => {
            let mut preloaded = state.preloaded_routes.clone();
            let entry = match preloaded
                .iter()
                .position(|entry| entry.matches(&level.name, &level.params))
            {
                Some(position) => {
                    let entry = preloaded.remove(position);
                    debug_log!("Reusing preloaded '{}' ({})", entry.name, entry.key);
                    if is_leaf {
                        RouteEntry {
                            params: Some(target.params().clone()),
                            ..entry
                        }
                    } else {
                        descend(table, &entry, &chain[1..], target, Mode::Navigate, keys)
                            .unwrap_or(entry)
                    }
                }
                None => build_entry(table, chain, &LeafInit::for_action(target), None, keys),
            };

            let mut routes = state.routes.clone();
            routes.push(entry);
            let index = routes.len() - 1;
            Some(NavigationState {
                preloaded_routes: preloaded,
                ..state.clone_with_routes(routes, index)
            })
        }
        Mode::Navigate => {
            let Some(position) = state.locate_route_by_name_and_params(&level.name, &level.params)
            else {
                return apply_to_stack(table, state, chain, target, Mode::Push, keys);
            };

            let existing = &state.routes[position];
            let entry = if is_leaf {
                RouteEntry {
                    params: Some(target.params().clone()),
                    ..existing.clone()
                }
            } else {
                descend(table, existing, &chain[1..], target, mode, keys)
                    .unwrap_or_else(|| existing.clone())
            };

            let mut routes = state.routes[..position].to_vec();
            routes.push(entry);
            Some(state.clone_with_routes(routes, position))
        }
        Mode::Replace => {
            let entry = build_entry(table, chain, &LeafInit::for_action(target), None, keys);
            let mut routes = state.routes.clone();
            routes[state.index] = entry;
            Some(state.clone_with_routes(routes, state.index))
        }
        Mode::Prefetch => {
            let known = state
                .routes
                .iter()
                .chain(&state.preloaded_routes)
                .any(|entry| entry.matches(&level.name, &level.params));
            if known {
                debug_log!("'{}' is already materialized, nothing to prefetch", level.name);
                return None;
            }

            let entry = build_entry(table, chain, &LeafInit::for_action(target), None, keys);
            let mut preloaded = state.preloaded_routes.clone();
            preloaded.push(entry);
            Some(state.clone_with_preloaded(preloaded))
        }
    }
}

fn apply_to_tabs(
    table: &RouteTable,
    state: &NavigationState,
    chain: &[MatchedRoute],
    target: &RouteMatch,
    mode: Mode,
    keys: &mut KeyRing<'_>,
) -> Option<NavigationState> {
    let level = &chain[0];
    let Some(position) = state.routes.iter().position(|entry| entry.name == level.name) else {
        warn_log!("Tabs '{}' have no tab '{}'", state.key, level.name);
        return None;
    };

    let existing = &state.routes[position];
    let entry = match mode {
        Mode::Prefetch => return None,
        Mode::Replace => build_entry(table, chain, &LeafInit::for_action(target), None, keys),
        Mode::Push | Mode::Navigate if chain.len() == 1 => RouteEntry {
            params: Some(target.params().clone()),
            ..existing.clone()
        },
        Mode::Push | Mode::Navigate => {
            let reusable = existing.matches(&level.name, &level.params);
            if reusable {
                descend(table, existing, &chain[1..], target, mode, keys)
                    .unwrap_or_else(|| existing.clone())
            } else {
                let leaf = LeafInit::for_action(target);
                build_entry(table, chain, &leaf, Some(existing.key.clone()), keys)
            }
        }
    };

    let mut routes = state.routes.clone();
    routes[position] = entry;
    Some(state.clone_with_routes(routes, position))
}

fn back(state: &NavigationState) -> Option<NavigationState> {
    let active = state.active_route();
    if let Some(child) = active.state.as_deref().and_then(back) {
        let mut routes = state.routes.clone();
        routes[state.index] = RouteEntry {
            state: Some(Arc::new(child)),
            ..active.clone()
        };
        return Some(state.clone_with_routes(routes, state.index));
    }

    match state.kind {
        NavigatorKind::Stack if state.index > 0 => {
            let mut routes = state.routes.clone();
            routes.remove(state.index);
            Some(state.clone_with_routes(routes, state.index - 1))
        }
        NavigatorKind::Tabs if state.index > 0 => {
            Some(state.clone_with_routes(state.routes.clone(), 0))
        }
        _ => None,
    }
}

fn dismiss(state: &NavigationState, count: usize) -> Option<NavigationState> {
    if count == 0 {
        return None;
    }

    let active = state.active_route();
    if let Some(child) = active.state.as_deref().and_then(|child| dismiss(child, count)) {
        let mut routes = state.routes.clone();
        routes[state.index] = RouteEntry {
            state: Some(Arc::new(child)),
            ..active.clone()
        };
        return Some(state.clone_with_routes(routes, state.index));
    }

    if state.kind != NavigatorKind::Stack || state.routes.len() < 2 {
        return None;
    }

    let keep = state.routes.len().saturating_sub(count).max(1);
    let routes = state.routes[..keep].to_vec();
    Some(state.clone_with_routes(routes, keep - 1))
}

fn set_params(state: &NavigationState, params: &RouteParams) -> Option<NavigationState> {
    let active = state.active_route();
    let entry = match active.state.as_deref() {
        Some(child) => RouteEntry {
            state: Some(Arc::new(set_params(child, params)?)),
            ..active.clone()
        },
        None => {
            let merged = RouteParams::merge(&active.params.clone().unwrap_or_default(), params);
            RouteEntry {
                params: Some(merged),
                ..active.clone()
            }
        }
    };

    let mut routes = state.routes.clone();
    routes[state.index] = entry;
    Some(state.clone_with_routes(routes, state.index))
}

fn build_navigator(
    table: &RouteTable,
    chain: &[MatchedRoute],
    leaf: &LeafInit,
    keys: &mut KeyRing<'_>,
) -> NavigationState {
    let level = &chain[0];
    let navigator = table.navigator(level.navigator);
    let kind = navigator.kind();
    let key = keys.mint(kind.key_prefix());

    let mut index = 0;
    let routes = match kind {
        NavigatorKind::Stack => vec![build_entry(table, chain, leaf, None, keys)],
        NavigatorKind::Tabs => {
            let mut routes = Vec::with_capacity(navigator.routes().len());
            for (position, route) in navigator.routes().iter().enumerate() {
                if route.name() == level.name {
                    index = position;
                    routes.push(build_entry(table, chain, leaf, None, keys));
                } else {
                    routes.push(RouteEntry::new(keys.mint(route.name()), route.name()));
                }
            }
            routes
        }
    };

    NavigationState {
        kind,
        key,
        index,
        route_names: navigator.route_names(),
        routes,
        stale: false,
        preloaded_routes: Vec::new(),
    }
}

fn build_entry(
    table: &RouteTable,
    chain: &[MatchedRoute],
    leaf: &LeafInit,
    key: Option<String>,
    keys: &mut KeyRing<'_>,
) -> RouteEntry {
    let level = &chain[0];
    let key = key.unwrap_or_else(|| keys.mint(&level.name));

    if chain.len() == 1 {
        return RouteEntry {
            key,
            name: level.name.clone(),
            params: leaf.params.clone(),
            path: leaf.path.clone(),
            state: None,
        };
    }

    RouteEntry {
        key,
        name: level.name.clone(),
        params: Some(level.params.clone()).filter(|params| !params.is_empty()),
        path: None,
        state: Some(Arc::new(build_navigator(table, &chain[1..], leaf, keys))),
    }
}
