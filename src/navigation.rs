use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Where the client lands after a 401 outside the auth pages.
pub const SESSION_EXPIRED_PATH: &str = "/login?reason=session-expired";

/// Page routes of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Feet,
    FootDetail(i64),
    Minigame,
    AdminUsers,
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Feet => "/feet".to_string(),
            Route::FootDetail(id) => format!("/feet/{}", id),
            Route::Minigame => "/feet/game".to_string(),
            Route::AdminUsers => "/admin/users".to_string(),
        }
    }

    /// Resolve a path (query string ignored) back to a route.
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split('?').next().unwrap_or_default().trim_end_matches('/');
        match path {
            "/login" => Some(Route::Login),
            "/register" => Some(Route::Register),
            "/feet" => Some(Route::Feet),
            "/feet/game" => Some(Route::Minigame),
            "/admin/users" => Some(Route::AdminUsers),
            other => other
                .strip_prefix("/feet/")
                .and_then(|id| id.parse().ok())
                .map(Route::FootDetail),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// In-process stand-in for the browser location.
#[derive(Clone, Debug)]
pub struct Navigator {
    inner: Arc<Mutex<History>>,
}

#[derive(Debug)]
struct History {
    current: String,
    visited: Vec<String>,
}

impl Navigator {
    pub fn new(initial: impl Into<String>) -> Self {
        let initial = initial.into();
        Self {
            inner: Arc::new(Mutex::new(History {
                current: initial.clone(),
                visited: vec![initial],
            })),
        }
    }

    pub fn at(route: Route) -> Self {
        Self::new(route.path())
    }

    pub fn current(&self) -> String {
        self.lock().current.clone()
    }

    pub fn current_route(&self) -> Option<Route> {
        Route::parse(&self.lock().current)
    }

    /// True on `/login` or `/register`, where 401s must not redirect.
    pub fn on_auth_page(&self) -> bool {
        let history = self.lock();
        history.current.starts_with("/login") || history.current.starts_with("/register")
    }

    pub fn push(&self, to: impl Into<String>) {
        let to = to.into();
        tracing::debug!("navigate -> {}", to);
        let mut history = self.lock();
        history.visited.push(to.clone());
        history.current = to;
    }

    /// Replace the current entry, like `router.replace`.
    pub fn replace(&self, to: impl Into<String>) {
        let to = to.into();
        tracing::debug!("replace -> {}", to);
        let mut history = self.lock();
        if let Some(last) = history.visited.last_mut() {
            *last = to.clone();
        }
        history.current = to;
    }

    pub fn visited(&self) -> Vec<String> {
        self.lock().visited.clone()
    }

    fn lock(&self) -> MutexGuard<'_, History> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
