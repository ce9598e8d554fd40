//! Navigation state tree.
//!
//! A [`NavigationState`] is one navigator instance: an ordered list of
//! [`RouteEntry`] values plus the index of the active one. An entry that is
//! itself a navigator carries its child state in [`RouteEntry::state`], so the
//! whole application forms a tree. Child states sit behind [`Arc`], so
//! deriving a new tree copies only the path from the root to the changed
//! navigator and shares every other subtree.
//!
//! Trees are plain data. They serialize to the camelCase shape used for
//! snapshots and debugging:
//!
//! ```json
//! {
//!   "type": "stack",
//!   "key": "stack-1",
//!   "index": 0,
//!   "routeNames": ["page", "_sitemap", "+not-found"],
//!   "routes": [{ "key": "page-2", "name": "page", "path": "/page" }],
//!   "stale": false,
//!   "preloadedRoutes": []
//! }
//! ```
//!
//! # Invariants
//!
//! - `routes` is never empty and `index` points into it.
//! - Every key (navigator and entry) is unique in the whole tree.
//! - Every entry name appears in its navigator's `routeNames`.
//!
//! [`NavigationState::validate`] checks all three.

use crate::{NavigationError, RouteParams};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Container semantics of a navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigatorKind {
    /// History stack: push appends, back pops.
    Stack,
    /// Fixed set of tabs, one entry per route; switching changes `index`.
    Tabs,
}

impl NavigatorKind {
    /// Prefix used when minting navigator keys.
    pub fn key_prefix(self) -> &'static str {
        match self {
            Self::Stack => "stack",
            Self::Tabs => "tab",
        }
    }
}

impl fmt::Display for NavigatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Stack => "stack",
            Self::Tabs => "tabs",
        })
    }
}

/// One screen instance within a navigator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    /// Unique key, stable for the lifetime of this screen instance.
    pub key: String,
    /// Route name from the route table.
    pub name: String,
    /// Parameters, or `None` when the entry was never given any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<RouteParams>,
    /// URL the entry was created from, for entries built from a URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Nested navigator state, for layout entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Arc<NavigationState>>,
}

impl RouteEntry {
    /// Create an entry with no params, path, or nested state.
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            params: None,
            path: None,
            state: None,
        }
    }

    /// Set params.
    pub fn with_params(mut self, params: RouteParams) -> Self {
        self.params = Some(params);
        self
    }

    /// Set the originating path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach a nested navigator.
    pub fn with_state(mut self, state: NavigationState) -> Self {
        self.state = Some(Arc::new(state));
        self
    }

    /// `true` when name matches and `identity` is contained in the params.
    ///
    /// An empty identity compares names only.
    pub fn matches(&self, name: &str, identity: &RouteParams) -> bool {
        self.name == name
            && (identity.is_empty()
                || self
                    .params
                    .as_ref()
                    .is_some_and(|params| params.contains_all(identity)))
    }
}

/// One navigator instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    #[serde(rename = "type")]
    pub(crate) kind: NavigatorKind,
    pub(crate) key: String,
    pub(crate) index: usize,
    pub(crate) route_names: Vec<String>,
    pub(crate) routes: Vec<RouteEntry>,
    #[serde(default)]
    pub(crate) stale: bool,
    #[serde(default)]
    pub(crate) preloaded_routes: Vec<RouteEntry>,
}

impl NavigationState {
    /// Create a navigator state, checking the `routes`/`index` invariants.
    pub fn new(
        kind: NavigatorKind,
        key: impl Into<String>,
        route_names: Vec<String>,
        routes: Vec<RouteEntry>,
        index: usize,
    ) -> Result<Self, NavigationError> {
        let state = Self {
            kind,
            key: key.into(),
            index,
            route_names,
            routes,
            stale: false,
            preloaded_routes: Vec::new(),
        };
        state.check_shape()?;
        Ok(state)
    }

    /// Container semantics.
    pub fn kind(&self) -> NavigatorKind {
        self.kind
    }

    /// Navigator key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Active position within [`routes`](Self::routes).
    pub fn index(&self) -> usize {
        self.index
    }

    /// Route names this navigator recognizes.
    pub fn route_names(&self) -> &[String] {
        &self.route_names
    }

    /// Entries in history order.
    pub fn routes(&self) -> &[RouteEntry] {
        &self.routes
    }

    /// Whether the subtree must be refreshed from the route table before use.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Entries materialized ahead of navigation.
    pub fn preloaded_routes(&self) -> &[RouteEntry] {
        &self.preloaded_routes
    }

    /// The entry at [`index`](Self::index).
    pub fn active_route(&self) -> &RouteEntry {
        &self.routes[self.index]
    }

    /// Follow `index` down to the deepest entry without nested state.
    pub fn find_active_route(&self) -> &RouteEntry {
        let mut entry = self.active_route();
        while let Some(child) = entry.state.as_deref() {
            entry = child.active_route();
        }
        entry
    }

    /// Navigators along the active path, from `self` down.
    pub fn active_navigators(&self) -> Vec<&NavigationState> {
        let mut chain = vec![self];
        let mut current = self;
        while let Some(child) = current.active_route().state.as_deref() {
            chain.push(child);
            current = child;
        }
        chain
    }

    /// Copy this navigator with new `routes` and `index`, sharing every
    /// nested subtree.
    pub fn clone_with_routes(&self, routes: Vec<RouteEntry>, index: usize) -> Self {
        debug_assert!(
            index < routes.len(),
            "index {} out of bounds for {} routes",
            index,
            routes.len()
        );
        Self {
            kind: self.kind,
            key: self.key.clone(),
            index,
            route_names: self.route_names.clone(),
            routes,
            stale: self.stale,
            preloaded_routes: self.preloaded_routes.clone(),
        }
    }

    /// Copy this navigator with a different preloaded list.
    pub fn clone_with_preloaded(&self, preloaded: Vec<RouteEntry>) -> Self {
        Self {
            preloaded_routes: preloaded,
            ..self.clone()
        }
    }

    /// Position of the topmost entry named `name` whose params contain
    /// `identity`. Scans from the top of the stack down.
    pub fn locate_route_by_name_and_params(
        &self,
        name: &str,
        identity: &RouteParams,
    ) -> Option<usize> {
        self.routes
            .iter()
            .rposition(|entry| entry.matches(name, identity))
    }

    /// Every key in the tree: navigator keys, route keys, preloaded keys.
    pub fn collect_keys(&self) -> Vec<&str> {
        let mut keys = Vec::new();
        self.collect_keys_into(&mut keys);
        keys
    }

    fn collect_keys_into<'a>(&'a self, keys: &mut Vec<&'a str>) {
        keys.push(&self.key);
        for entry in self.routes.iter().chain(&self.preloaded_routes) {
            keys.push(&entry.key);
            if let Some(child) = entry.state.as_deref() {
                child.collect_keys_into(keys);
            }
        }
    }

    /// `true` when some navigator on the active path has somewhere to go back to.
    pub fn can_go_back(&self) -> bool {
        self.active_navigators().iter().any(|nav| nav.index > 0)
    }

    /// `true` when some stack on the active path has more than one entry.
    pub fn can_dismiss(&self) -> bool {
        self.active_navigators()
            .iter()
            .any(|nav| nav.kind == NavigatorKind::Stack && nav.routes.len() > 1)
    }

    /// Check every tree invariant.
    pub fn validate(&self) -> Result<(), NavigationError> {
        let mut seen = HashSet::new();
        for key in self.collect_keys() {
            if !seen.insert(key) {
                return Err(NavigationError::invalid_state(format!(
                    "duplicate key '{}'",
                    key
                )));
            }
        }
        self.validate_node()
    }

    fn validate_node(&self) -> Result<(), NavigationError> {
        self.check_shape()?;
        for entry in self.routes.iter().chain(&self.preloaded_routes) {
            if !self.route_names.contains(&entry.name) {
                return Err(NavigationError::invalid_state(format!(
                    "route '{}' is not in routeNames of navigator '{}'",
                    entry.name, self.key
                )));
            }
            if let Some(child) = entry.state.as_deref() {
                child.validate_node()?;
            }
        }
        Ok(())
    }

    fn check_shape(&self) -> Result<(), NavigationError> {
        if self.routes.is_empty() {
            return Err(NavigationError::invalid_state(format!(
                "navigator '{}' has no routes",
                self.key
            )));
        }
        if self.index >= self.routes.len() {
            return Err(NavigationError::invalid_state(format!(
                "index {} out of bounds for {} routes in navigator '{}'",
                self.index,
                self.routes.len(),
                self.key
            )));
        }
        Ok(())
    }

    /// Render a pretty JSON snapshot.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
