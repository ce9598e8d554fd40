//! Segment-based route patterns.
//!
//! Route names double as their URL patterns:
//!
//! | Name segment | Meaning |
//! |--------------|---------|
//! | `settings`   | literal segment, must match exactly |
//! | `[id]`       | dynamic segment, binds `id` |
//! | `[...rest]`  | catch-all, binds one or more remaining segments as an array |
//! | `(group)`    | transparent grouping, consumes nothing |
//! | `index`      | (last segment only) the navigator root, consumes nothing |
//!
//! A pattern either matches a path exactly ([`RoutePattern::match_exact`],
//! used for screens) or consumes a prefix of it
//! ([`RoutePattern::match_prefix`], used for layouts that own a nested
//! navigator).

use crate::path::INDEX_SEGMENT;
use crate::{NavigationError, ParamValue, RouteParams};
use std::cmp::Ordering;

/// One compiled pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text.
    Static(String),
    /// `[name]`
    Dynamic(String),
    /// `[...name]`
    CatchAll(String),
}

impl Segment {
    /// Rank used when several patterns match: lower is more specific.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Static(_) => 0,
            Self::Dynamic(_) => 1,
            Self::CatchAll(_) => 2,
        }
    }

    /// Name of the parameter this segment binds, if any.
    pub fn param_name(&self) -> Option<&str> {
        match self {
            Self::Static(_) => None,
            Self::Dynamic(name) | Self::CatchAll(name) => Some(name),
        }
    }
}

/// A compiled route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoutePattern {
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Compile a route name into a pattern.
    ///
    /// # Examples
    ///
    /// ```
    /// use navstate::matching::{RoutePattern, Segment};
    ///
    /// let pattern = RoutePattern::parse("(app)/users/[id]").unwrap();
    /// assert_eq!(
    ///     pattern.segments(),
    ///     [Segment::Static("users".into()), Segment::Dynamic("id".into())]
    /// );
    ///
    /// assert!(RoutePattern::parse("index").unwrap().is_empty());
    /// assert!(RoutePattern::parse("[...rest]/more").is_err());
    /// ```
    pub fn parse(name: &str) -> Result<Self, NavigationError> {
        let raw: Vec<&str> = name.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(raw.len());

        for (position, part) in raw.iter().enumerate() {
            let is_last = position + 1 == raw.len();

            if is_group_segment(part) {
                continue;
            }
            if *part == INDEX_SEGMENT && is_last {
                continue;
            }

            if is_wildcard_segment(part) {
                if !is_last {
                    return Err(NavigationError::invalid_route(
                        name,
                        "catch-all segment must be last",
                    ));
                }
                let param = extract_param_name(part).unwrap_or_default();
                validate_param_name(name, param)?;
                segments.push(Segment::CatchAll(param.to_string()));
            } else if is_param_segment(part) {
                let param = extract_param_name(part).unwrap_or_default();
                validate_param_name(name, param)?;
                segments.push(Segment::Dynamic(param.to_string()));
            } else if part.contains('[') || part.contains(']') {
                return Err(NavigationError::invalid_route(
                    name,
                    format!("unbalanced brackets in segment '{}'", part),
                ));
            } else {
                segments.push(Segment::Static((*part).to_string()));
            }
        }

        let mut seen: Vec<&str> = Vec::new();
        for param in segments.iter().filter_map(Segment::param_name) {
            if seen.contains(&param) {
                return Err(NavigationError::invalid_route(
                    name,
                    format!("parameter '{}' bound twice", param),
                ));
            }
            seen.push(param);
        }

        Ok(Self { segments })
    }

    /// Build a pattern from already compiled segments.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Compiled segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// `true` for patterns that consume no segments (index routes, groups).
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// `true` when any segment is dynamic or catch-all.
    pub fn is_dynamic(&self) -> bool {
        self.segments.iter().any(|s| s.param_name().is_some())
    }

    /// Number of dynamic and catch-all segments.
    pub fn dynamic_count(&self) -> usize {
        self.segments.iter().filter(|s| s.param_name().is_some()).count()
    }

    /// Parameter names bound by this pattern, in order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(Segment::param_name)
    }

    /// Per-segment ranks, used to order competing matches.
    pub fn ranks(&self) -> Vec<u8> {
        self.segments.iter().map(Segment::rank).collect()
    }

    /// Match the beginning of `path`, returning bound params and the number
    /// of segments consumed.
    ///
    /// ```
    /// use navstate::matching::RoutePattern;
    ///
    /// let pattern = RoutePattern::parse("users/[id]").unwrap();
    /// let path = ["users".to_string(), "42".to_string(), "posts".to_string()];
    /// let (params, consumed) = pattern.match_prefix(&path).unwrap();
    /// assert_eq!(params.get_str("id"), Some("42"));
    /// assert_eq!(consumed, 2);
    /// ```
    pub fn match_prefix(&self, path: &[String]) -> Option<(RouteParams, usize)> {
        let mut params = RouteParams::new();
        let mut consumed = 0;

        for segment in &self.segments {
            match segment {
                Segment::Static(literal) => {
                    if path.get(consumed)? != literal {
                        return None;
                    }
                    consumed += 1;
                }
                Segment::Dynamic(name) => {
                    params.insert(name.clone(), path.get(consumed)?.clone());
                    consumed += 1;
                }
                Segment::CatchAll(name) => {
                    let rest = &path[consumed.min(path.len())..];
                    if rest.is_empty() {
                        return None;
                    }
                    params.insert(name.clone(), ParamValue::Multiple(rest.to_vec()));
                    consumed = path.len();
                }
            }
        }

        Some((params, consumed))
    }

    /// Match the whole of `path`.
    pub fn match_exact(&self, path: &[String]) -> Option<RouteParams> {
        match self.match_prefix(path) {
            Some((params, consumed)) if consumed == path.len() => Some(params),
            _ => None,
        }
    }

    /// Rebuild the URL segments for this pattern from `params`.
    ///
    /// Returns `None` if a bound parameter is missing.
    pub fn interpolate(&self, params: &RouteParams) -> Option<Vec<String>> {
        let mut out = Vec::with_capacity(self.segments.len());
        for segment in &self.segments {
            match segment {
                Segment::Static(literal) => out.push(literal.clone()),
                Segment::Dynamic(name) => out.push(params.get(name)?.first()?.to_string()),
                Segment::CatchAll(name) => {
                    out.extend(params.get(name)?.values().map(str::to_string));
                }
            }
        }
        Some(out)
    }
}

/// Compare two candidate rank sequences: position by position (static before
/// dynamic before catch-all), then fewer dynamic segments.
///
/// `Ordering::Less` means `a` is the better match.
pub fn compare_ranks(a: &[u8], b: &[u8]) -> Ordering {
    for (left, right) in a.iter().zip(b.iter()) {
        match left.cmp(right) {
            Ordering::Equal => {}
            unequal => return unequal,
        }
    }
    let dynamic = |ranks: &[u8]| ranks.iter().filter(|rank| **rank > 0).count();
    dynamic(a)
        .cmp(&dynamic(b))
        .then_with(|| b.len().cmp(&a.len()))
}

/// Check if a route name segment is a transparent group like `(tabs)`
pub fn is_group_segment(segment: &str) -> bool {
    segment.len() > 2 && segment.starts_with('(') && segment.ends_with(')')
}

/// Check if a route name segment is a parameter like `[id]`
pub fn is_param_segment(segment: &str) -> bool {
    segment.starts_with('[') && segment.ends_with(']') && !is_wildcard_segment(segment)
}

/// Check if a route name segment is a catch-all like `[...rest]`
pub fn is_wildcard_segment(segment: &str) -> bool {
    segment.starts_with("[...") && segment.ends_with(']')
}

/// Extract parameter name from a route name segment
///
/// # Examples
///
/// ```
/// use navstate::matching::extract_param_name;
///
/// assert_eq!(extract_param_name("[id]"), Some("id"));
/// assert_eq!(extract_param_name("[...rest]"), Some("rest"));
/// assert_eq!(extract_param_name("users"), None);
/// ```
pub fn extract_param_name(segment: &str) -> Option<&str> {
    let inner = segment.strip_prefix('[')?.strip_suffix(']')?;
    Some(inner.strip_prefix("...").unwrap_or(inner))
}

fn validate_param_name(route: &str, param: &str) -> Result<(), NavigationError> {
    if param.is_empty() || param.contains(['[', ']', '/']) {
        return Err(NavigationError::invalid_route(
            route,
            format!("invalid parameter name '{}'", param),
        ));
    }
    Ok(())
}
