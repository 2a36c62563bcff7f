//! User sessions.
//!
//! A session ties a user to the controller tree that holds their dialog
//! state. Sessions are created on first contact and live in memory for the
//! lifetime of the process; nothing evicts them yet, so the registry grows
//! with the number of distinct users seen.

use crate::controller::{ControllerTree, Node};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use switchboard_core::UserId;
use tokio::sync::Mutex;
use tracing::info;

/// Builds the root controller for a user seen for the first time.
pub type RootFactory = dyn Fn(UserId) -> Node + Send + Sync;

/// One user's dialog state.
#[derive(Debug)]
pub struct Session {
    /// The user this session belongs to.
    pub user_id: UserId,
    /// Display name last reported by the transport.
    pub user_name: Option<String>,
    /// The user's controller tree.
    pub tree: ControllerTree,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session last processed an update.
    pub last_seen_at: DateTime<Utc>,
    /// Sequence number of the last update applied to this session.
    pub last_update_id: Option<i64>,
}

impl Session {
    /// Creates a session with the given root controller.
    #[must_use]
    pub fn new(user_id: UserId, root: Node) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            user_name: None,
            tree: ControllerTree::new(root),
            created_at: now,
            last_seen_at: now,
            last_update_id: None,
        }
    }

    /// Returns true if an update with this sequence number was already
    /// applied, or a later one was.
    #[must_use]
    pub fn is_stale(&self, update_id: i64) -> bool {
        self.last_update_id.is_some_and(|last| update_id <= last)
    }

    /// Records that an update was applied.
    pub fn touch(&mut self, update_id: i64, user_name: Option<&str>) {
        self.last_update_id = Some(update_id);
        self.last_seen_at = Utc::now();
        if let Some(name) = user_name {
            self.user_name = Some(name.to_string());
        }
    }
}

/// Process-wide map from user to session.
///
/// Each session sits behind its own async mutex so a turn can hold it
/// across transport calls without blocking other users.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<UserId, Arc<Mutex<Session>>>>,
    root_factory: Box<RootFactory>,
}

impl SessionRegistry {
    /// Creates an empty registry that builds roots with `root_factory`.
    #[must_use]
    pub fn new(root_factory: impl Fn(UserId) -> Node + Send + Sync + 'static) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            root_factory: Box::new(root_factory),
        }
    }

    /// Returns the user's session, creating it on first contact.
    pub fn get_or_create(&self, user_id: UserId) -> Arc<Mutex<Session>> {
        if let Some(session) = self.get(user_id) {
            return session;
        }

        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        let session = sessions.entry(user_id).or_insert_with(|| {
            info!(%user_id, "creating session");
            Arc::new(Mutex::new(Session::new(user_id, (self.root_factory)(user_id))))
        });
        Arc::clone(session)
    }

    /// Returns the user's session if one exists.
    #[must_use]
    pub fn get(&self, user_id: UserId) -> Option<Arc<Mutex<Session>>> {
        self.sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&user_id)
            .map(Arc::clone)
    }

    /// Drops the user's session; the next contact starts from a fresh root.
    pub fn remove(&self, user_id: UserId) -> Option<Arc<Mutex<Session>>> {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&user_id);
        if removed.is_some() {
            info!(%user_id, "removed session");
        }
        removed
    }

    /// Returns true if the user has a session.
    #[must_use]
    pub fn contains(&self, user_id: UserId) -> bool {
        self.sessions
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&user_id)
    }

    /// Returns the number of sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Returns true if no user has been seen yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("sessions", &self.len())
            .finish()
    }
}
