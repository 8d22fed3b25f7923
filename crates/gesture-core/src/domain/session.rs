//! Session context: the user/session pair every sample is stamped with.
//!
//! The context is written only by the UI/navigation flow (user selection,
//! login, logout) and read by every tap from whatever thread the platform
//! delivers callbacks on.
//!
//! # Consistency
//!
//! The user id and the session id are stored together in one immutable
//! [`SessionSnapshot`] behind an `Arc`.  A write builds a new snapshot and
//! swaps the `Arc` under a write lock; a read clones the `Arc` under a read
//! lock.  Neither lock is held for longer than a pointer copy, and a reader
//! can never see the new session id paired with the old user id (or the
//! reverse), because the two fields are never updated independently.
//!
//! The context is an ordinary value.  Callers share it through an
//! `Arc<SessionContext>` handed to each tap at construction, so tests can
//! inject a fresh context per case.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use super::sample::{SessionId, UserId};

/// An immutable view of the user/session pair at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub user_id: Option<UserId>,
    pub session_id: Option<SessionId>,
}

impl SessionSnapshot {
    /// `true` while an authenticated session is open.
    pub fn has_session(&self) -> bool {
        self.session_id.is_some()
    }
}

/// Process-wide (but injectable) identity and session holder.
#[derive(Debug, Default)]
pub struct SessionContext {
    current: RwLock<Arc<SessionSnapshot>>,
}

impl SessionContext {
    /// Creates a context with no user and no session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current pair as one consistent snapshot.
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        Arc::clone(&self.current.read())
    }

    pub fn current_user(&self) -> Option<UserId> {
        self.current.read().user_id.clone()
    }

    pub fn current_session(&self) -> Option<SessionId> {
        self.current.read().session_id.clone()
    }

    /// Selects the active user without touching the session.
    pub fn set_user(&self, user: UserId) {
        debug!(user = %user, "session context: user selected");
        self.replace(|prev| SessionSnapshot {
            user_id: Some(user),
            session_id: prev.session_id.clone(),
        });
    }

    pub fn clear_user(&self) {
        debug!("session context: user cleared");
        self.replace(|prev| SessionSnapshot {
            user_id: None,
            session_id: prev.session_id.clone(),
        });
    }

    /// Opens a new session for the current user and returns its token.
    ///
    /// The token always differs from the one it replaces.
    pub fn start_session(&self) -> SessionId {
        let id = self.update(|prev| {
            let id = fresh_session_id(prev.session_id.as_ref());
            let next = SessionSnapshot {
                user_id: prev.user_id.clone(),
                session_id: Some(id.clone()),
            };
            (next, id)
        });
        info!(session = %id, "session started");
        id
    }

    pub fn end_session(&self) {
        self.replace(|prev| SessionSnapshot {
            user_id: prev.user_id.clone(),
            session_id: None,
        });
        info!("session ended");
    }

    /// Selects `user` and opens a fresh session for them in one write.
    pub fn login(&self, user: UserId) -> SessionId {
        let id = self.update(|prev| {
            let id = fresh_session_id(prev.session_id.as_ref());
            let next = SessionSnapshot {
                user_id: Some(user),
                session_id: Some(id.clone()),
            };
            (next, id)
        });
        info!(session = %id, "login: session started");
        id
    }

    /// Clears both the user and the session.
    pub fn logout(&self) {
        self.replace(|_| SessionSnapshot::default());
        info!("logout: session context cleared");
    }

    /// Installs an externally assigned user/session pair.
    pub fn adopt_session(&self, user: UserId, session: SessionId) {
        info!(user = %user, session = %session, "session adopted");
        self.replace(|_| SessionSnapshot {
            user_id: Some(user),
            session_id: Some(session),
        });
    }

    fn replace(&self, build: impl FnOnce(&SessionSnapshot) -> SessionSnapshot) {
        self.update(|prev| (build(prev), ()));
    }

    /// Builds the next snapshot from the current one under the write lock.
    fn update<R>(&self, build: impl FnOnce(&SessionSnapshot) -> (SessionSnapshot, R)) -> R {
        let mut guard = self.current.write();
        let (next, out) = build(&guard);
        *guard = Arc::new(next);
        out
    }
}

fn fresh_session_id(previous: Option<&SessionId>) -> SessionId {
    loop {
        let id = SessionId::generate();
        if Some(&id) != previous {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_is_empty() {
        let ctx = SessionContext::new();
        assert_eq!(ctx.current_user(), None);
        assert_eq!(ctx.current_session(), None);
        assert!(!ctx.snapshot().has_session());
    }

    #[test]
    fn test_set_user_keeps_session() {
        // Arrange
        let ctx = SessionContext::new();
        let session = ctx.start_session();

        // Act
        ctx.set_user(UserId::from("u1"));

        // Assert
        assert_eq!(ctx.current_user(), Some(UserId::from("u1")));
        assert_eq!(ctx.current_session(), Some(session));
    }

    #[test]
    fn test_start_session_always_produces_new_id() {
        let ctx = SessionContext::new();
        let first = ctx.start_session();
        let second = ctx.start_session();
        assert_ne!(first, second);
        assert_eq!(ctx.current_session(), Some(second));
    }

    #[test]
    fn test_end_session_keeps_user() {
        let ctx = SessionContext::new();
        ctx.login(UserId::from("u1"));
        ctx.end_session();
        assert_eq!(ctx.current_user(), Some(UserId::from("u1")));
        assert_eq!(ctx.current_session(), None);
    }

    #[test]
    fn test_login_sets_pair_and_logout_clears_it() {
        // Arrange
        let ctx = SessionContext::new();

        // Act
        let session = ctx.login(UserId::from("alice"));

        // Assert
        let snap = ctx.snapshot();
        assert_eq!(snap.user_id, Some(UserId::from("alice")));
        assert_eq!(snap.session_id, Some(session));

        ctx.logout();
        assert_eq!(*ctx.snapshot(), SessionSnapshot::default());
    }

    #[test]
    fn test_snapshot_is_not_affected_by_later_writes() {
        // Arrange
        let ctx = SessionContext::new();
        ctx.adopt_session(UserId::from("u1"), SessionId::from("s1"));
        let before = ctx.snapshot();

        // Act
        ctx.adopt_session(UserId::from("u2"), SessionId::from("s2"));

        // Assert – the earlier snapshot still describes the old pair
        assert_eq!(before.user_id, Some(UserId::from("u1")));
        assert_eq!(before.session_id, Some(SessionId::from("s1")));
        assert_eq!(ctx.current_session(), Some(SessionId::from("s2")));
    }

    #[test]
    fn test_clear_user_keeps_session() {
        let ctx = SessionContext::new();
        ctx.adopt_session(UserId::from("u1"), SessionId::from("s1"));
        ctx.clear_user();
        assert_eq!(ctx.current_user(), None);
        assert_eq!(ctx.current_session(), Some(SessionId::from("s1")));
    }
}
