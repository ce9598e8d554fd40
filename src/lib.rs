//! # navstate
//!
//! A navigation state engine: a nested, serializable tree of stack and tab
//! navigators driven by URL-like paths.
//!
//! - **Paths** resolve into decoded segments and query params ([`resolve`]).
//! - **Route tables** map bracket-style route names (`[id]`, `[...rest]`,
//!   `(group)`, `index`) to navigators ([`RouteTable`]).
//! - **Matching** turns a path into the chain of routes it addresses
//!   ([`match_path`]); unmatched paths land on the not-found route.
//! - **Reduction** applies push / navigate / replace / back / dismiss to a
//!   tree and returns a new one ([`reduce`]).
//! - **The store** serializes requests, holds the current tree and notifies
//!   subscribers ([`Store`]).
//!
//! # Quick Start
//!
//! ```
//! use navstate::{NavigatorConfig, RouteConfig, RouterConfig, Store};
//!
//! let routes = NavigatorConfig::stack()
//!     .screen("index")
//!     .screen("[page]")
//!     .route(RouteConfig::layout(
//!         "settings",
//!         NavigatorConfig::stack().screen("index").screen("[section]"),
//!     ));
//!
//! let store = Store::create(routes, RouterConfig::default()).unwrap();
//!
//! store.push("/settings/privacy").unwrap();
//! assert_eq!(store.active_route().name, "[section]");
//!
//! store.navigate("/about?ref=home").unwrap();
//! assert_eq!(store.href(), "/about?ref=home");
//!
//! store.dismiss_all();
//! assert!(!store.can_go_back());
//! assert_eq!(store.pathname(), "/");
//! ```
//!
//! # Feature Flags
//!
//! | Feature   | Default | Description |
//! |-----------|---------|-------------|
//! | `log`     | yes     | Logging through the `log` crate |
//! | `tracing` | no      | Logging through `tracing` (exclusive with `log`) |
//! | `cache`   | yes     | LRU cache of pathname matches |

#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(all(feature = "log", feature = "tracing"))]
compile_error!(
    "Features 'log' and 'tracing' are mutually exclusive. \
     Use `default-features = false, features = [\"tracing\"]` to switch to tracing."
);

#[cfg(feature = "cache")]
pub mod cache;
pub mod config;
pub mod error;
pub mod keys;
pub mod logging;
pub mod matching;
pub mod params;
pub mod path;
pub mod reducer;
pub mod resolve;
pub mod route;
pub mod state;
pub mod store;

pub use config::RouterConfig;
pub use error::NavigationError;
pub use keys::{KeyGenerator, KeyRing, SequentialKeys, UuidKeys};
pub use params::{ParamValue, RouteParams};
pub use path::{resolve, ResolvedPath};
pub use reducer::{initial_state, reduce, NavigationAction};
pub use resolve::{href_for, match_path, match_segments, MatchedRoute, RouteMatch};
pub use route::{NavigatorConfig, RouteConfig, RouteTable};
pub use state::{NavigationState, NavigatorKind, RouteEntry};
pub use store::{Store, Subscription};
