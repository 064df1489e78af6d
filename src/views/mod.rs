//! Page controllers. Each page owns its own state and refetches from the
//! backend after every confirmed mutation; nothing is cached across pages.

pub mod admin_users;
pub mod feed;
pub mod feet;
pub mod foot_detail;
pub mod login;
pub mod minigame;
pub mod register;

/// Lifecycle of a page's initial load.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PageStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Errored(String),
}

impl PageStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, PageStatus::Loading)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, PageStatus::Ready)
    }
}

/// Request state of a mutation keyed by the record it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation<K> {
    Idle,
    Pending(K),
    Succeeded(K),
    Failed(K, String),
}

impl<K> Default for Mutation<K> {
    fn default() -> Self {
        Mutation::Idle
    }
}

impl<K: PartialEq> Mutation<K> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Mutation::Pending(_))
    }

    /// The control for `key` is disabled while its request is in flight.
    pub fn is_pending_for(&self, key: &K) -> bool {
        matches!(self, Mutation::Pending(k) if k == key)
    }

    /// Button label for `key`: the pending label while in flight.
    pub fn label<'a>(&self, key: &K, idle: &'a str, pending: &'a str) -> &'a str {
        if self.is_pending_for(key) {
            pending
        } else {
            idle
        }
    }
}

/// In-page confirmation panel guarding a destructive action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation<T> {
    pending: Option<T>,
}

impl<T> Default for Confirmation<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T: Clone> Confirmation<T> {
    pub fn request(&mut self, target: T) {
        self.pending = Some(target);
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.pending.is_some()
    }

    /// Close the panel. Refused while `busy`, so an in-flight delete keeps
    /// its panel.
    pub fn cancel(&mut self, busy: bool) -> bool {
        if busy {
            return false;
        }
        self.pending = None;
        true
    }

    /// The confirmed target. The panel stays open until `close`, so a failed
    /// delete can be retried from it.
    pub fn confirmed(&self) -> Option<T> {
        self.pending.clone()
    }

    pub fn close(&mut self) {
        self.pending = None;
    }
}
