//! Route table definition and compilation.
//!
//! Applications describe their screens with [`NavigatorConfig`] and
//! [`RouteConfig`] builders, then compile them once into a [`RouteTable`]:
//!
//! ```
//! use navstate::{NavigatorConfig, RouteConfig, RouteTable, RouterConfig};
//!
//! let root = NavigatorConfig::stack()
//!     .screen("index")
//!     .screen("[page]")
//!     .route(RouteConfig::layout(
//!         "settings",
//!         NavigatorConfig::stack().screen("index").screen("profile"),
//!     ));
//!
//! let table = RouteTable::new(root, &RouterConfig::default()).unwrap();
//! assert_eq!(
//!     table.navigator(table.app_navigator()).route_names(),
//!     ["index", "settings", "_sitemap", "[page]", "+not-found"]
//! );
//! ```
//!
//! # Layout
//!
//! Compiled navigators live in a flat arena addressed by [`NavigatorId`].
//! Navigator `0` is a single-entry stack wrapping the application's root
//! navigator, which is always navigator `1` and additionally carries the
//! sitemap and not-found sentinels.

use crate::matching::{RoutePattern, Segment};
use crate::{NavigationError, NavigatorKind, RouterConfig};

/// Index of a compiled navigator inside a [`RouteTable`].
pub type NavigatorId = usize;

/// A route as declared by the application: a screen, or a layout owning a
/// nested navigator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConfig {
    /// Route name, which is also its URL pattern (`settings`, `[id]`, `(tabs)`).
    pub name: String,
    /// Nested navigator for layouts.
    pub navigator: Option<NavigatorConfig>,
}

impl RouteConfig {
    /// A leaf screen.
    pub fn screen(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            navigator: None,
        }
    }

    /// A layout with its own nested navigator.
    pub fn layout(name: impl Into<String>, navigator: NavigatorConfig) -> Self {
        Self {
            name: name.into(),
            navigator: Some(navigator),
        }
    }
}

/// A navigator declaration: its kind and the routes it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigatorConfig {
    /// Container semantics.
    pub kind: NavigatorKind,
    /// Routes in registration order.
    pub routes: Vec<RouteConfig>,
}

impl NavigatorConfig {
    /// An empty stack navigator.
    pub fn stack() -> Self {
        Self {
            kind: NavigatorKind::Stack,
            routes: Vec::new(),
        }
    }

    /// An empty tabs navigator.
    pub fn tabs() -> Self {
        Self {
            kind: NavigatorKind::Tabs,
            routes: Vec::new(),
        }
    }

    /// Add a route.
    pub fn route(mut self, route: RouteConfig) -> Self {
        self.routes.push(route);
        self
    }

    /// Add a leaf screen.
    pub fn screen(self, name: impl Into<String>) -> Self {
        self.route(RouteConfig::screen(name))
    }
}

/// A compiled route.
#[derive(Debug, Clone)]
pub struct CompiledRoute {
    name: String,
    pattern: RoutePattern,
    navigator: Option<NavigatorId>,
    not_found: bool,
}

impl CompiledRoute {
    /// Route name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compiled URL pattern.
    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    /// Nested navigator, for layouts.
    pub fn navigator(&self) -> Option<NavigatorId> {
        self.navigator
    }

    /// `true` for the not-found sentinel.
    pub fn is_not_found(&self) -> bool {
        self.not_found
    }
}

/// A compiled navigator.
#[derive(Debug, Clone)]
pub struct CompiledNavigator {
    kind: NavigatorKind,
    routes: Vec<CompiledRoute>,
}

impl CompiledNavigator {
    /// Container semantics.
    pub fn kind(&self) -> NavigatorKind {
        self.kind
    }

    /// Routes in `routeNames` order.
    pub fn routes(&self) -> &[CompiledRoute] {
        &self.routes
    }

    /// The ordered `routeNames` this navigator recognizes.
    pub fn route_names(&self) -> Vec<String> {
        self.routes.iter().map(|route| route.name.clone()).collect()
    }

    /// Look up a route by name.
    pub fn find(&self, name: &str) -> Option<(usize, &CompiledRoute)> {
        self.routes
            .iter()
            .enumerate()
            .find(|(_, route)| route.name == name)
    }
}

/// The compiled route table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    navigators: Vec<CompiledNavigator>,
    config: RouterConfig,
}

impl RouteTable {
    /// Navigator holding the single wrapper entry.
    pub const ROOT: NavigatorId = 0;

    /// Compile `root` under the given configuration.
    ///
    /// Fails with [`NavigationError::InvalidRoute`] on bad bracket syntax,
    /// duplicate names within a navigator, names that collide with a
    /// sentinel, or layouts without routes.
    pub fn new(root: NavigatorConfig, config: &RouterConfig) -> Result<Self, NavigationError> {
        if root.routes.is_empty() {
            return Err(NavigationError::invalid_route(
                &config.root_name,
                "root navigator has no routes",
            ));
        }

        let mut table = Self {
            navigators: vec![CompiledNavigator {
                kind: NavigatorKind::Stack,
                routes: vec![CompiledRoute {
                    name: config.root_name.clone(),
                    pattern: RoutePattern::default(),
                    navigator: Some(1),
                    not_found: false,
                }],
            }],
            config: config.clone(),
        };

        let mut sentinels = Vec::new();
        if let Some(sitemap) = &config.sitemap_name {
            sentinels.push(CompiledRoute {
                name: sitemap.clone(),
                pattern: RoutePattern::parse(sitemap)?,
                navigator: None,
                not_found: false,
            });
        }
        sentinels.push(CompiledRoute {
            name: config.not_found_name.clone(),
            pattern: not_found_pattern(config),
            navigator: None,
            not_found: true,
        });

        table.compile(root, sentinels)?;

        crate::debug_log!(
            "Compiled route table: {} navigators, root routes [{}]",
            table.navigators.len(),
            table.navigators[1].route_names().join(", ")
        );

        Ok(table)
    }

    fn compile(
        &mut self,
        config: NavigatorConfig,
        sentinels: Vec<CompiledRoute>,
    ) -> Result<NavigatorId, NavigationError> {
        let id = self.navigators.len();
        self.navigators.push(CompiledNavigator {
            kind: config.kind,
            routes: Vec::new(),
        });

        let mut compiled = Vec::with_capacity(config.routes.len());
        for route in config.routes {
            if route.name.trim_matches('/').is_empty() {
                return Err(NavigationError::invalid_route(&route.name, "empty route name"));
            }
            if compiled.iter().any(|c: &CompiledRoute| c.name == route.name)
                || sentinels.iter().any(|s| s.name == route.name)
            {
                return Err(NavigationError::invalid_route(
                    &route.name,
                    "duplicate route name in navigator",
                ));
            }

            let pattern = RoutePattern::parse(&route.name)?;
            let navigator = match route.navigator {
                Some(nested) if nested.routes.is_empty() => {
                    return Err(NavigationError::invalid_route(
                        &route.name,
                        "layout has no routes",
                    ));
                }
                Some(nested) => Some(self.compile(nested, Vec::new())?),
                None => None,
            };

            compiled.push(CompiledRoute {
                name: route.name,
                pattern,
                navigator,
                not_found: false,
            });
        }

        // static routes, sitemap, dynamic routes, not-found
        let (dynamic, mut routes): (Vec<_>, Vec<_>) = compiled
            .into_iter()
            .partition(|route| route.pattern.is_dynamic());
        let (not_found, sitemap): (Vec<_>, Vec<_>) =
            sentinels.into_iter().partition(|route| route.not_found);
        routes.extend(sitemap);
        routes.extend(dynamic);
        routes.extend(not_found);

        self.navigators[id].routes = routes;
        Ok(id)
    }

    /// The application's root navigator.
    pub fn app_navigator(&self) -> NavigatorId {
        1
    }

    /// Get a compiled navigator.
    ///
    /// # Panics
    ///
    /// Panics if `id` did not come from this table.
    pub fn navigator(&self, id: NavigatorId) -> &CompiledNavigator {
        &self.navigators[id]
    }

    /// Get a compiled navigator, if `id` is valid.
    pub fn get(&self, id: NavigatorId) -> Option<&CompiledNavigator> {
        self.navigators.get(id)
    }

    /// Number of compiled navigators, including the wrapper.
    pub fn len(&self) -> usize {
        self.navigators.len()
    }

    /// Always `false`; a table has at least the wrapper and the root navigator.
    pub fn is_empty(&self) -> bool {
        self.navigators.is_empty()
    }

    /// Configuration the table was compiled with.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }
}

fn not_found_pattern(config: &RouterConfig) -> RoutePattern {
    RoutePattern::from_segments(vec![Segment::CatchAll(
        config.not_found_param().to_string(),
    )])
}
