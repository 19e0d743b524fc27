//! Short-lived server-side form sessions.
//!
//! Each visitor gets an opaque id when the first page is rendered. Fields are
//! recorded page by page as they are submitted, so later steps can use the
//! server's copy instead of trusting the hidden inputs echoed back by the
//! browser. Sessions expire after a fixed idle time and are dropped once a
//! prediction succeeds.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use house_price::{FormFields, Page};

/// One visitor's accumulated form state.
#[derive(Debug, Clone)]
pub struct FormSession {
    fields: FormFields,
    touched_at: DateTime<Utc>,
}

impl FormSession {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            fields: FormFields::new(),
            touched_at: now,
        }
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }
}

/// In-memory session table with idle expiry and a size cap.
pub struct FormSessionStore {
    sessions: HashMap<String, FormSession>,
    ttl: chrono::Duration,
    max_sessions: usize,
}

impl FormSessionStore {
    pub fn new(ttl: Duration, max_sessions: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(1)),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Open a new empty session and return its id.
    pub fn create(&mut self, now: DateTime<Utc>) -> String {
        self.purge_expired(now);

        if self.sessions.len() >= self.max_sessions {
            self.evict_oldest();
        }

        let id = Uuid::new_v4().to_string();
        self.sessions.insert(id.clone(), FormSession::new(now));
        tracing::debug!("Opened form session {id} ({} active)", self.sessions.len());
        id
    }

    /// Look up a live session, refreshing its idle timer.
    pub fn get(&mut self, id: &str, now: DateTime<Utc>) -> Option<&FormSession> {
        self.purge_expired(now);
        let session = self.sessions.get_mut(id)?;
        session.touched_at = now;
        Some(session)
    }

    /// Store the fields that belong to `page` from a submission.
    ///
    /// Returns `false` when the session does not exist or has expired.
    pub fn record(
        &mut self,
        id: &str,
        page: Page,
        submitted: &FormFields,
        now: DateTime<Utc>,
    ) -> bool {
        self.purge_expired(now);
        let Some(session) = self.sessions.get_mut(id) else {
            return false;
        };

        for field in page.fields() {
            if let Some(value) = submitted.get(field.key) {
                session.fields.insert(field.key.to_string(), value.clone());
            }
        }
        session.touched_at = now;
        true
    }

    /// Drop a session. Returns whether it existed.
    pub fn remove(&mut self, id: &str) -> bool {
        let removed = self.sessions.remove(id).is_some();
        if removed {
            tracing::debug!("Closed form session {id}");
        }
        removed
    }

    /// Remove every session idle for longer than the TTL.
    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let ttl = self.ttl;
        let before = self.sessions.len();
        self.sessions.retain(|_, s| now - s.touched_at <= ttl);
        let purged = before - self.sessions.len();
        if purged > 0 {
            tracing::debug!("Expired {purged} form sessions");
        }
        purged
    }

    /// Number of sessions currently held, including any not yet purged.
    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .sessions
            .iter()
            .min_by_key(|(_, s)| s.touched_at)
            .map(|(id, _)| id.clone());

        if let Some(id) = oldest {
            tracing::warn!("Session table full, evicting {id}");
            self.sessions.remove(&id);
        }
    }
}
