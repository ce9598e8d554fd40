//! The navigation store.
//!
//! A [`Store`] owns the compiled [`RouteTable`], the current tree, and the
//! set of subscribers. It is the only place the tree changes:
//!
//! 1. An imperative call (`push`, `back`, ...) parses its path at the call
//!    site, so malformed paths are reported to the caller immediately.
//! 2. The request is queued. Requests are applied one at a time, in arrival
//!    order, by whichever caller finds the queue idle.
//! 3. Applying a request matches its path against the table and reduces the
//!    *current* tree, so a request queued behind another always sees that
//!    other request's result.
//! 4. Every subscriber is called with the new tree after each request,
//!    outside every internal lock. A subscriber may dispatch further
//!    requests; they are queued behind the current one.
//!
//! `Store` is a cheap handle: clones share the same state and can be sent
//! across threads.
//!
//! ```
//! use navstate::{NavigatorConfig, RouterConfig, Store};
//!
//! let store = Store::create(
//!     NavigatorConfig::stack().screen("index").screen("[page]"),
//!     RouterConfig::default(),
//! ).unwrap();
//!
//! store.push("/hello?tab=2").unwrap();
//! assert_eq!(store.href(), "/hello?tab=2");
//! assert!(store.can_go_back());
//!
//! store.back(Some("/"));
//! assert_eq!(store.pathname(), "/");
//! ```

#[cfg(feature = "cache")]
use crate::cache::{CacheStats, MatchCache};
use crate::keys::{KeyGenerator, KeyRing, UuidKeys};
use crate::path::ResolvedPath;
use crate::reducer::{self, NavigationAction};
use crate::resolve::{self, RouteMatch};
use crate::{
    debug_log, error_log, info_log, warn_log, NavigationError, NavigationState, NavigatorConfig,
    RouteEntry, RouteParams, RouteTable, RouterConfig,
};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

type Listener = Arc<dyn Fn(&NavigationState) + Send + Sync>;

#[derive(Debug, Clone, Copy)]
enum TargetKind {
    Push,
    Navigate,
    Replace,
    Prefetch,
}

/// A queued request. Targets are matched when applied, not when queued.
enum Command {
    Target(TargetKind, ResolvedPath),
    Back { expected: Option<String> },
    Action(NavigationAction),
}

struct Core {
    keys: Box<dyn KeyGenerator>,
    #[cfg(feature = "cache")]
    cache: Option<MatchCache>,
}

struct Shared {
    table: RouteTable,
    state: RwLock<Arc<NavigationState>>,
    core: Mutex<Core>,
    queue: Mutex<VecDeque<Command>>,
    draining: AtomicBool,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_listener: AtomicU64,
    disposed: AtomicBool,
}

/// Clears the drain flag on scope exit, including an unwind out of a
/// listener, so later requests are still applied.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            error_log!("Listener panicked; pending requests stay queued");
        }
        self.0.store(false, Ordering::Release);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holder of the current navigation tree.
#[derive(Clone)]
pub struct Store {
    shared: Arc<Shared>,
}

impl Store {
    /// Create a store with random entry keys.
    ///
    /// The initial tree is built from `config.initial_url`.
    pub fn create(root: NavigatorConfig, config: RouterConfig) -> Result<Self, NavigationError> {
        Self::with_key_generator(root, config, UuidKeys)
    }

    /// Create a store that mints keys with `generator`.
    ///
    /// With [`SequentialKeys`](crate::SequentialKeys) every tree is fully
    /// deterministic.
    pub fn with_key_generator(
        root: NavigatorConfig,
        config: RouterConfig,
        generator: impl KeyGenerator + 'static,
    ) -> Result<Self, NavigationError> {
        let table = RouteTable::new(root, &config)?;
        let initial = crate::resolve(&config.initial_url)?;
        let mut core = Core::new(Box::new(generator), &config);

        let target = core.match_path(&table, &initial);
        let href = initial.to_href();
        let state = {
            let mut ring = KeyRing::empty(core.keys.as_mut());
            reducer::initial_state(&table, &target, &href, &mut ring)
        };

        info_log!("Store created at '{}' -> '{}'", href, target.name());
        Ok(Self::from_parts(table, core, state))
    }

    /// Create a store from a previously serialized tree.
    ///
    /// The snapshot must satisfy every tree invariant and name only routes the
    /// table knows. Its `routeNames` are refreshed from the table and it is
    /// marked fresh.
    pub fn restore(
        root: NavigatorConfig,
        config: RouterConfig,
        snapshot: NavigationState,
        generator: impl KeyGenerator + 'static,
    ) -> Result<Self, NavigationError> {
        let table = RouteTable::new(root, &config)?;
        let state = refresh(&table, RouteTable::ROOT, snapshot)?;
        state.validate()?;

        let core = Core::new(Box::new(generator), &config);
        info_log!("Store restored at '{}'", state.find_active_route().name);
        Ok(Self::from_parts(table, core, state))
    }

    fn from_parts(table: RouteTable, core: Core, state: NavigationState) -> Self {
        Self {
            shared: Arc::new(Shared {
                table,
                state: RwLock::new(Arc::new(state)),
                core: Mutex::new(core),
                queue: Mutex::new(VecDeque::new()),
                draining: AtomicBool::new(false),
                listeners: Mutex::new(Vec::new()),
                next_listener: AtomicU64::new(0),
                disposed: AtomicBool::new(false),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    /// Add a new history entry for `path`.
    pub fn push(&self, path: &str) -> Result<(), NavigationError> {
        self.target(TargetKind::Push, path)
    }

    /// Go to `path`, reusing an existing entry for the same route.
    pub fn navigate(&self, path: &str) -> Result<(), NavigationError> {
        self.target(TargetKind::Navigate, path)
    }

    /// Replace the active entry with one for `path`.
    pub fn replace(&self, path: &str) -> Result<(), NavigationError> {
        self.target(TargetKind::Replace, path)
    }

    /// Materialize `path` in `preloadedRoutes` without activating it.
    pub fn prefetch(&self, path: &str) -> Result<(), NavigationError> {
        self.target(TargetKind::Prefetch, path)
    }

    /// Unwind one step of history.
    ///
    /// `expected` is the href the caller believes will be active afterwards.
    /// It is only compared and logged; it never changes what happens.
    pub fn back(&self, expected: Option<&str>) {
        self.enqueue(Command::Back {
            expected: expected.map(str::to_string),
        });
    }

    /// Return the deepest stack with history to its first entry.
    pub fn dismiss_all(&self) {
        self.enqueue(Command::Action(NavigationAction::DismissAll));
    }

    /// Pop up to `count` entries from the deepest stack with history.
    pub fn dismiss(&self, count: usize) {
        self.enqueue(Command::Action(NavigationAction::Dismiss(count)));
    }

    /// Merge `params` into the active route's params.
    pub fn set_params(&self, params: RouteParams) {
        self.enqueue(Command::Action(NavigationAction::SetParams(params)));
    }

    fn target(&self, kind: TargetKind, path: &str) -> Result<(), NavigationError> {
        let resolved = crate::resolve(path)?;
        self.enqueue(Command::Target(kind, resolved));
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The current tree.
    pub fn state(&self) -> Arc<NavigationState> {
        let guard = self
            .shared
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// The active leaf entry.
    pub fn active_route(&self) -> RouteEntry {
        self.state().find_active_route().clone()
    }

    /// `true` when [`back`](Self::back) would change the tree.
    pub fn can_go_back(&self) -> bool {
        self.state().can_go_back()
    }

    /// `true` when [`dismiss`](Self::dismiss) would change the tree.
    pub fn can_dismiss(&self) -> bool {
        self.state().can_dismiss()
    }

    /// Encoded URL of the active route, query included.
    pub fn href(&self) -> String {
        let state = self.state();
        resolve::href_for(&self.shared.table, &state).unwrap_or_else(|| {
            warn_log!("Active route cannot be mapped back to a URL");
            "/".to_string()
        })
    }

    /// Encoded pathname of the active route.
    pub fn pathname(&self) -> String {
        let href = self.href();
        match href.split_once('?') {
            Some((pathname, _)) => pathname.to_string(),
            None => href,
        }
    }

    /// The compiled route table.
    pub fn table(&self) -> &RouteTable {
        &self.shared.table
    }

    /// Match cache statistics.
    #[cfg(feature = "cache")]
    pub fn cache_stats(&self) -> CacheStats {
        lock(&self.shared.core)
            .cache
            .as_ref()
            .map(|cache| *cache.stats())
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Subscriptions & lifecycle
    // ------------------------------------------------------------------

    /// Call `listener` with the new tree after every applied request.
    ///
    /// Listeners run synchronously on the thread that applied the request,
    /// in subscription order.
    pub fn subscribe(&self, listener: impl Fn(&NavigationState) + Send + Sync + 'static) -> Subscription {
        let id = self.shared.next_listener.fetch_add(1, Ordering::Relaxed);
        if self.is_disposed() {
            warn_log!("Subscribing to a disposed store; listener will never run");
        } else {
            lock(&self.shared.listeners).push((id, Arc::new(listener)));
        }
        Subscription {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        lock(&self.shared.listeners).len()
    }

    /// Drop every subscriber, pending request, and cached match. Later
    /// requests are ignored.
    pub fn dispose(&self) {
        if self.shared.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        lock(&self.shared.listeners).clear();
        lock(&self.shared.queue).clear();
        #[cfg(feature = "cache")]
        if let Some(cache) = lock(&self.shared.core).cache.as_mut() {
            cache.clear();
        }
        info_log!("Store disposed");
    }

    /// `true` after [`dispose`](Self::dispose).
    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.load(Ordering::Acquire)
    }

    // ------------------------------------------------------------------
    // Queue
    // ------------------------------------------------------------------

    fn enqueue(&self, command: Command) {
        if self.is_disposed() {
            warn_log!("Ignoring navigation request on a disposed store");
            return;
        }
        lock(&self.shared.queue).push_back(command);
        self.drain();
    }

    fn drain(&self) {
        loop {
            if self
                .shared
                .draining
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_err()
            {
                // the active drainer will pick our request up
                return;
            }

            {
                let _draining = DrainGuard(&self.shared.draining);
                loop {
                    let next = lock(&self.shared.queue).pop_front();
                    match next {
                        Some(command) => self.apply(command),
                        None => break,
                    }
                }
            }

            if lock(&self.shared.queue).is_empty() {
                return;
            }
        }
    }

    fn apply(&self, command: Command) {
        if self.is_disposed() {
            return;
        }

        let table = &self.shared.table;
        let current = self.state();
        let (action, expected) = {
            let mut core = lock(&self.shared.core);
            match command {
                Command::Target(kind, path) => {
                    let target = core.match_path(table, &path);
                    if target.is_not_found() {
                        debug_log!("'{}' did not match any route", path.to_href());
                    }
                    (kind.into_action(target), None)
                }
                Command::Back { expected } => (NavigationAction::Back, expected),
                Command::Action(action) => (action, None),
            }
        };

        let next = {
            let mut core = lock(&self.shared.core);
            let mut ring = KeyRing::new(core.keys.as_mut(), &current);
            reducer::reduce(table, &current, &action, &mut ring)
        };

        let state = match next {
            Some(next) => {
                debug_assert!(
                    next.validate().is_ok(),
                    "reducer broke a tree invariant: {:?}",
                    next.validate()
                );
                let next = Arc::new(next);
                *self
                    .shared
                    .state
                    .write()
                    .unwrap_or_else(PoisonError::into_inner) = Arc::clone(&next);
                info_log!("{} -> '{}'", action, next.find_active_route().name);
                next
            }
            None => {
                info_log!("{} was a no-op", action);
                current
            }
        };

        if let Some(expected) = expected {
            let actual = resolve::href_for(table, &state);
            if actual.as_deref() != Some(expected.as_str()) {
                debug_log!(
                    "back: expected to land on '{}', landed on '{}'",
                    expected,
                    actual.unwrap_or_default()
                );
            }
        }

        let listeners: Vec<Listener> = lock(&self.shared.listeners)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&state);
        }
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("active", &self.active_route().name)
            .field("subscribers", &self.subscriber_count())
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

impl TargetKind {
    fn into_action(self, target: RouteMatch) -> NavigationAction {
        match self {
            Self::Push => NavigationAction::Push(target),
            Self::Navigate => NavigationAction::Navigate(target),
            Self::Replace => NavigationAction::Replace(target),
            Self::Prefetch => NavigationAction::Prefetch(target),
        }
    }
}

impl Core {
    fn new(keys: Box<dyn KeyGenerator>, config: &RouterConfig) -> Self {
        #[cfg(not(feature = "cache"))]
        let _ = config;
        Self {
            keys,
            #[cfg(feature = "cache")]
            cache: MatchCache::with_capacity(config.cache_capacity),
        }
    }

    fn match_path(&mut self, table: &RouteTable, path: &ResolvedPath) -> RouteMatch {
        #[cfg(feature = "cache")]
        if let Some(cache) = self.cache.as_mut() {
            let pathname = path.pathname();
            if let Some(hit) = cache.get(&pathname) {
                return hit.with_query(path.query());
            }
            let segment_match = resolve::match_segments(table, path.segments());
            cache.insert(pathname, segment_match.clone());
            return segment_match.with_query(path.query());
        }

        resolve::match_path(table, path)
    }
}

/// Refresh `routeNames` from the table and clear `stale`, recursively.
fn refresh(
    table: &RouteTable,
    navigator: usize,
    mut state: NavigationState,
) -> Result<NavigationState, NavigationError> {
    let compiled = table.get(navigator).ok_or_else(|| {
        NavigationError::invalid_state(format!("navigator '{}' has no route table", state.key()))
    })?;

    if compiled.kind() != state.kind() {
        return Err(NavigationError::invalid_state(format!(
            "navigator '{}' is a {} but the route table declares a {}",
            state.key(),
            state.kind(),
            compiled.kind()
        )));
    }

    state.route_names = compiled.route_names();
    state.stale = false;

    for entry in state.routes.iter_mut().chain(state.preloaded_routes.iter_mut()) {
        let (_, route) = compiled.find(&entry.name).ok_or_else(|| {
            NavigationError::invalid_state(format!(
                "route '{}' is not in the route table",
                entry.name
            ))
        })?;

        match (entry.state.take(), route.navigator()) {
            (Some(child), Some(id)) => {
                let child = Arc::try_unwrap(child).unwrap_or_else(|shared| (*shared).clone());
                entry.state = Some(Arc::new(refresh(table, id, child)?));
            }
            (Some(_), None) => {
                return Err(NavigationError::invalid_state(format!(
                    "screen '{}' cannot hold a nested navigator",
                    entry.name
                )));
            }
            (None, _) => {}
        }
    }

    Ok(state)
}

/// Handle returned by [`Store::subscribe`].
///
/// Dropping it keeps the listener registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    shared: Weak<Shared>,
}

impl Subscription {
    /// Remove the listener. Safe to call after the store is gone.
    pub fn unsubscribe(self) {
        if let Some(shared) = self.shared.upgrade() {
            lock(&shared.listeners).retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SequentialKeys;
    use std::sync::atomic::AtomicUsize;

    fn store() -> Store {
        Store::with_key_generator(
            NavigatorConfig::stack().screen("index").screen("[page]"),
            RouterConfig::default(),
            SequentialKeys::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_malformed_path_is_not_applied() {
        let store = store();
        let before = store.state();
        let err = store.push("/%zz").unwrap_err();
        assert!(err.is_malformed_path());
        assert!(Arc::ptr_eq(&before, &store.state()));
    }

    #[test]
    fn test_noop_keeps_same_tree_and_notifies() {
        let store = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let _subscription = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let before = store.state();
        store.back(None);
        assert!(Arc::ptr_eq(&before, &store.state()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_subscription_outlives_store() {
        let store = store();
        let subscription = store.subscribe(|_| {});
        drop(store);
        subscription.unsubscribe();
    }

    #[cfg(feature = "cache")]
    #[test]
    fn test_cache_counts_repeat_pathnames() {
        let store = store();
        store.push("/a?x=1").unwrap();
        store.push("/a?x=2").unwrap();
        let stats = store.cache_stats();
        assert_eq!(stats.hits, 1);
        // the initial url is the first miss
        assert_eq!(stats.misses, 2);
    }

    #[test]
    fn test_debug_output() {
        let store = store();
        let debug = format!("{:?}", store);
        assert!(debug.contains("index"));
    }
}
