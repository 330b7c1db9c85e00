//! Per-session state that lives in memory for as long as a user stays logged in.
//!
//! Every entry carries the time its auth cookie stops being valid. Expired
//! entries are dropped the next time any session is accessed.

use std::{
    collections::HashMap,
    fmt::Display,
    sync::{Arc, Mutex, MutexGuard},
};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    Error,
    auth::DEFAULT_COOKIE_DURATION,
    workflow::{ConfirmationWorkflow, PaymentDraft, PurchaseDraft},
};

/// Identifies one logged in browser session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// A new random session ID.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for SessionId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// The confirmation workflows owned by one session, one per transaction kind.
#[derive(Debug, Default)]
pub struct TaskSession {
    pub payment: ConfirmationWorkflow<PaymentDraft>,
    pub purchase: ConfirmationWorkflow<PurchaseDraft>,
}

#[derive(Debug)]
struct SessionEntry {
    session: TaskSession,
    expires_at: OffsetDateTime,
}

type SessionMap = HashMap<SessionId, SessionEntry>;

/// All live [TaskSession]s keyed by [SessionId].
///
/// Sessions never see each other's state. The lock is only held while a
/// workflow dispatches an action, never while the database is accessed.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<SessionMap>>,
}

impl SessionStore {
    fn lock(&self) -> Result<MutexGuard<'_, SessionMap>, Error> {
        self.sessions.lock().map_err(|error| {
            tracing::error!("could not acquire session lock: {error}");
            Error::SessionLockError
        })
    }

    /// Run `f` on the session for `session_id`, creating it if it does not exist yet.
    ///
    /// New sessions expire after [DEFAULT_COOKIE_DURATION] unless
    /// [SessionStore::keep_alive] pushes their expiry out.
    ///
    /// # Errors
    ///
    /// Returns [Error::SessionLockError] if the lock has been poisoned.
    pub fn with_session<R>(
        &self,
        session_id: SessionId,
        f: impl FnOnce(&mut TaskSession) -> R,
    ) -> Result<R, Error> {
        let now = OffsetDateTime::now_utc();
        let mut sessions = self.lock()?;
        prune(&mut sessions, now);

        let entry = sessions.entry(session_id).or_insert_with(|| SessionEntry {
            session: TaskSession::default(),
            expires_at: now + DEFAULT_COOKIE_DURATION,
        });

        Ok(f(&mut entry.session))
    }

    /// Keep the session for `session_id` until at least `expires_at`.
    ///
    /// Does nothing if the session has no state yet.
    pub fn keep_alive(&self, session_id: SessionId, expires_at: OffsetDateTime) -> Result<(), Error> {
        if let Some(entry) = self.lock()?.get_mut(&session_id) {
            entry.expires_at = entry.expires_at.max(expires_at);
        }

        Ok(())
    }

    /// Drop every session that expired at or before `now`.
    pub fn prune_expired(&self, now: OffsetDateTime) -> Result<(), Error> {
        prune(&mut *self.lock()?, now);

        Ok(())
    }

    /// Discard the state for `session_id`, e.g. when the user logs out.
    pub fn remove(&self, session_id: SessionId) -> Result<(), Error> {
        self.lock()?.remove(&session_id);

        Ok(())
    }

    /// The number of live sessions.
    pub fn session_count(&self) -> Result<usize, Error> {
        Ok(self.lock()?.len())
    }
}

fn prune(sessions: &mut SessionMap, now: OffsetDateTime) {
    let before = sessions.len();
    sessions.retain(|_, entry| entry.expires_at > now);

    let pruned = before - sessions.len();
    if pruned > 0 {
        tracing::debug!("Dropped {pruned} expired sessions");
    }
}

#[cfg(test)]
mod tests {
    use time::{Duration, OffsetDateTime};

    use crate::auth::DEFAULT_COOKIE_DURATION;

    use super::{SessionId, SessionStore};

    #[test]
    fn sessions_are_independent() {
        let store = SessionStore::default();
        let first = SessionId::new();
        let second = SessionId::new();

        store.with_session(first, |_| ()).unwrap();
        store.with_session(second, |_| ()).unwrap();

        store.remove(first).unwrap();

        assert_eq!(store.session_count(), Ok(1));
        let second_is_pending = store
            .with_session(second, |session| session.payment.is_pending())
            .unwrap();
        assert!(!second_is_pending);
        assert_eq!(store.session_count(), Ok(1));
    }

    #[test]
    fn remove_discards_session() {
        let store = SessionStore::default();
        let session_id = SessionId::new();
        store.with_session(session_id, |_| ()).unwrap();

        store.remove(session_id).unwrap();

        assert_eq!(store.session_count(), Ok(0));
    }

    #[test]
    fn expired_sessions_are_dropped() {
        let store = SessionStore::default();
        let short_lived = SessionId::new();
        let remembered = SessionId::new();
        store.with_session(short_lived, |_| ()).unwrap();
        store.with_session(remembered, |_| ()).unwrap();
        let now = OffsetDateTime::now_utc();
        store
            .keep_alive(remembered, now + Duration::days(7))
            .unwrap();

        store
            .prune_expired(now + DEFAULT_COOKIE_DURATION + Duration::seconds(1))
            .unwrap();

        assert_eq!(store.session_count(), Ok(1));
        store.prune_expired(now + Duration::days(8)).unwrap();
        assert_eq!(store.session_count(), Ok(0));
    }

    #[test]
    fn keep_alive_never_shortens_or_creates_sessions() {
        let store = SessionStore::default();
        let session_id = SessionId::new();

        store
            .keep_alive(session_id, OffsetDateTime::now_utc() + Duration::days(1))
            .unwrap();
        assert_eq!(store.session_count(), Ok(0));

        store.with_session(session_id, |_| ()).unwrap();
        store
            .keep_alive(session_id, OffsetDateTime::UNIX_EPOCH)
            .unwrap();
        store
            .prune_expired(OffsetDateTime::now_utc() + Duration::minutes(1))
            .unwrap();
        assert_eq!(store.session_count(), Ok(1));
    }
}
