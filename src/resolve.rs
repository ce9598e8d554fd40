//! Route matching via route chains.
//!
//! # Architecture
//!
//! A path is matched against the whole route table at once. The result is a
//! [`RouteMatch`]: the chain of matched routes from the wrapper stack down to
//! the leaf screen, one [`MatchedRoute`] per navigator level. The reducer walks
//! the chain alongside the state tree, so each level knows which navigator it
//! addresses and which entry it wants active there.
//!
//! # Example
//!
//! Given routes:
//! ```text
//! __root             (wrapper stack)
//!   index
//!   settings         (nested stack)
//!     index
//!     [section]
//!   [page]
//! ```
//!
//! For path `/settings/privacy?tab=2` the chain is:
//! ```text
//! [0] __root                      identity={}
//! [1] settings                    identity={}
//! [2] [section]                   identity={section: "privacy"}
//! ```
//! and the leaf params are `{tab: "2", section: "privacy"}`.
//!
//! # Ranking
//!
//! Every branch of the table is tried. Competing candidates are ordered
//! position by position (static before dynamic before catch-all), then by
//! fewer dynamic segments, then by registration order. When nothing matches
//! the chain ends at the not-found route, which binds every segment.

use crate::matching::compare_ranks;
use crate::path::ResolvedPath;
use crate::route::{NavigatorId, RouteTable};
use crate::{trace_log, warn_log, NavigationState, ParamValue, RouteParams};

/// Maximum nesting depth to prevent runaway recursion
const MAX_DEPTH: usize = 16;

/// One level of a [`RouteMatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute {
    /// Navigator the route belongs to.
    pub navigator: NavigatorId,
    /// Route name within that navigator.
    pub name: String,
    /// Dynamic segment values bound by this route's own pattern.
    pub params: RouteParams,
}

/// The full resolved route chain for a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    chain: Vec<MatchedRoute>,
    params: RouteParams,
    not_found: bool,
}

impl RouteMatch {
    /// Every level, from the wrapper stack to the leaf.
    pub fn chain(&self) -> &[MatchedRoute] {
        &self.chain
    }

    /// The leaf route.
    pub fn leaf(&self) -> &MatchedRoute {
        // chains always hold the wrapper plus at least one route
        &self.chain[self.chain.len() - 1]
    }

    /// Leaf route name.
    pub fn name(&self) -> &str {
        &self.leaf().name
    }

    /// Leaf params: query params overlaid with every path param in the chain.
    pub fn params(&self) -> &RouteParams {
        &self.params
    }

    /// `true` when the path fell through to the not-found route.
    pub fn is_not_found(&self) -> bool {
        self.not_found
    }

    /// Number of levels, including the wrapper.
    pub fn depth(&self) -> usize {
        self.chain.len()
    }

    /// Path params bound anywhere in the chain.
    pub fn path_params(&self) -> RouteParams {
        self.chain
            .iter()
            .fold(RouteParams::new(), |acc, level| RouteParams::merge(&acc, &level.params))
    }

    /// Recompute leaf params for a new query string.
    pub fn with_query(mut self, query: &RouteParams) -> Self {
        self.params = RouteParams::merge(query, &self.path_params());
        self
    }

    /// Pretty-print for debugging
    #[cfg(debug_assertions)]
    pub fn debug_string(&self) -> String {
        let mut lines = vec![format!(
            "RouteMatch{}:",
            if self.not_found { " (not found)" } else { "" }
        )];
        for (depth, level) in self.chain.iter().enumerate() {
            let params = level
                .params
                .iter()
                .map(|(k, v)| format!("{}={:?}", k, v))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!(
                "{}[{}] {} {{{}}}",
                "  ".repeat(depth),
                depth,
                level.name,
                params
            ));
        }
        lines.join("\n")
    }
}

struct Candidate {
    chain: Vec<MatchedRoute>,
    ranks: Vec<u8>,
}

/// Match decoded segments against the table. Leaf params hold path params
/// only; see [`match_path`] for query handling.
///
/// Never fails: unmatched segments resolve to the not-found route.
pub fn match_segments(table: &RouteTable, segments: &[String]) -> RouteMatch {
    let root = &table.navigator(RouteTable::ROOT).routes()[0];
    let wrapper = MatchedRoute {
        navigator: RouteTable::ROOT,
        name: root.name().to_string(),
        params: RouteParams::new(),
    };

    let mut candidates = Vec::new();
    collect_candidates(
        table,
        table.app_navigator(),
        segments,
        &mut vec![wrapper.clone()],
        &mut Vec::new(),
        &mut candidates,
    );

    trace_log!(
        "Matched /{} against {} candidate(s)",
        segments.join("/"),
        candidates.len()
    );

    let best = candidates
        .into_iter()
        .min_by(|a, b| compare_ranks(&a.ranks, &b.ranks));

    let (chain, not_found) = match best {
        Some(candidate) => (candidate.chain, false),
        None => {
            let config = table.config();
            let mut params = RouteParams::new();
            params.insert(
                config.not_found_param(),
                ParamValue::Multiple(segments.to_vec()),
            );
            let not_found = MatchedRoute {
                navigator: table.app_navigator(),
                name: config.not_found_name.clone(),
                params,
            };
            (vec![wrapper, not_found], true)
        }
    };

    let mut route_match = RouteMatch {
        chain,
        params: RouteParams::new(),
        not_found,
    };
    route_match.params = route_match.path_params();
    #[cfg(debug_assertions)]
    {
        trace_log!("{}", route_match.debug_string());
    }
    route_match
}

/// Match a resolved path, merging its query into the leaf params.
///
/// ```
/// use navstate::{resolve, match_path, NavigatorConfig, RouteTable, RouterConfig};
///
/// let table = RouteTable::new(
///     NavigatorConfig::stack().screen("index").screen("[page]"),
///     &RouterConfig::default(),
/// ).unwrap();
///
/// let route_match = match_path(&table, &resolve("/hello?page=ignored&x=1").unwrap());
/// assert_eq!(route_match.name(), "[page]");
/// assert_eq!(route_match.params().get_str("page"), Some("hello"));
/// assert_eq!(route_match.params().get_str("x"), Some("1"));
/// ```
pub fn match_path(table: &RouteTable, path: &ResolvedPath) -> RouteMatch {
    match_segments(table, path.segments()).with_query(path.query())
}

fn collect_candidates(
    table: &RouteTable,
    navigator: NavigatorId,
    remaining: &[String],
    chain: &mut Vec<MatchedRoute>,
    ranks: &mut Vec<u8>,
    out: &mut Vec<Candidate>,
) {
    if chain.len() >= MAX_DEPTH {
        warn_log!(
            "Maximum route nesting depth ({}) exceeded while matching",
            MAX_DEPTH
        );
        return;
    }

    for route in table.navigator(navigator).routes() {
        if route.is_not_found() {
            continue;
        }

        let pattern = route.pattern();
        match route.navigator() {
            None => {
                if let Some(params) = pattern.match_exact(remaining) {
                    let mut candidate_chain = chain.clone();
                    candidate_chain.push(MatchedRoute {
                        navigator,
                        name: route.name().to_string(),
                        params,
                    });
                    let mut candidate_ranks = ranks.clone();
                    candidate_ranks.extend(pattern.ranks());
                    trace_log!("  candidate {:?} ranks {:?}", route.name(), candidate_ranks);
                    out.push(Candidate {
                        chain: candidate_chain,
                        ranks: candidate_ranks,
                    });
                }
            }
            Some(child) => {
                if let Some((params, consumed)) = pattern.match_prefix(remaining) {
                    let rank_len = ranks.len();
                    chain.push(MatchedRoute {
                        navigator,
                        name: route.name().to_string(),
                        params,
                    });
                    ranks.extend(pattern.ranks());

                    collect_candidates(table, child, &remaining[consumed..], chain, ranks, out);

                    chain.pop();
                    ranks.truncate(rank_len);
                }
            }
        }
    }
}

/// Rebuild the URL of the active route in `state`.
///
/// The pathname comes from each active route's pattern and params; leaf
/// params not bound by a pattern become the query string. Returns `None`
/// when the tree names a route the table does not know.
///
/// ```
/// use navstate::{href_for, NavigatorConfig, RouterConfig, Store};
///
/// let store = Store::create(
///     NavigatorConfig::stack().screen("index").screen("[page]"),
///     RouterConfig::default(),
/// ).unwrap();
/// store.push("/hello?a=(param)").unwrap();
///
/// assert_eq!(
///     href_for(store.table(), &store.state()).as_deref(),
///     Some("/hello?a=%28param%29")
/// );
/// ```
pub fn href_for(table: &RouteTable, state: &NavigationState) -> Option<String> {
    let mut navigator = RouteTable::ROOT;
    let mut current = state;
    let mut segments = Vec::new();
    let mut bound = Vec::new();

    loop {
        let entry = current.active_route();
        let (_, route) = table.get(navigator)?.find(&entry.name)?;
        let params = entry.params.clone().unwrap_or_default();

        segments.extend(route.pattern().interpolate(&params)?);
        bound.extend(route.pattern().param_names().map(str::to_string));

        match (entry.state.as_deref(), route.navigator()) {
            (Some(child), Some(id)) => {
                current = child;
                navigator = id;
            }
            _ => {
                let query = params
                    .iter()
                    .filter(|(key, _)| !bound.iter().any(|name| name == key))
                    .map(|(key, value)| (key, value.clone()))
                    .collect();
                return Some(ResolvedPath::new(segments, query).to_href());
            }
        }
    }
}
