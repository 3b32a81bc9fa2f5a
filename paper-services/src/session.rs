//! In-memory session store with idle eviction

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use paper_core::{MarketContract, Message};

/// Idle time before a session is evicted (30 minutes)
pub const DEFAULT_SESSION_TTL_SECS: i64 = 1800;

/// How often the background sweeper scans for idle sessions
const SWEEP_INTERVAL_SECS: u64 = 60;

/// One conversation's accumulated state
#[derive(Debug)]
pub struct Session {
    /// Transcript in arrival order
    pub messages: Vec<Message>,
    /// Markets from the most recent turn that searched
    pub latest_markets: Vec<MarketContract>,
    last_active: DateTime<Utc>,
}

impl Session {
    fn new() -> Self {
        Session {
            messages: Vec::new(),
            latest_markets: Vec::new(),
            last_active: Utc::now(),
        }
    }

    /// Append a message and refresh the idle clock
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.touch();
    }

    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    fn is_idle(&self, ttl_secs: i64) -> bool {
        let age = Utc::now().signed_duration_since(self.last_active);
        age.num_seconds() >= ttl_secs
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to one session
///
/// The mutex serializes turns: a turn holds the lock from the first append to
/// the final reply, so concurrent posts to the same session queue up instead
/// of interleaving.
#[derive(Debug, Default)]
pub struct SessionSlot {
    session: Mutex<Session>,
}

impl SessionSlot {
    pub async fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().await
    }
}

/// All live sessions, keyed by caller-chosen id
pub struct SessionStore {
    sessions: DashMap<String, Arc<SessionSlot>>,
    ttl_secs: i64,
}

impl SessionStore {
    pub fn new(ttl_secs: i64) -> Self {
        SessionStore {
            sessions: DashMap::new(),
            ttl_secs,
        }
    }

    /// Handle to a session, created fresh on first use
    pub fn get_or_create(&self, session_id: &str) -> Arc<SessionSlot> {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                debug!("Creating session {}", session_id);
                Arc::new(SessionSlot::default())
            })
            .clone()
    }

    /// Look up a session without creating one
    pub fn get(&self, session_id: &str) -> Option<Arc<SessionSlot>> {
        self.sessions
            .get(session_id)
            .map(|slot| Arc::clone(slot.value()))
    }

    /// Append one message, creating the session if needed
    ///
    /// Waits for any turn holding the slot, so the append lands between
    /// turns rather than inside one.
    pub async fn append(&self, session_id: &str, message: Message) {
        let slot = self.get_or_create(session_id);
        let mut session = slot.lock().await;
        session.push(message);
    }

    /// Transcript read-back; unknown ids read as empty
    pub async fn transcript(&self, session_id: &str) -> Vec<Message> {
        match self.get(session_id) {
            Some(slot) => slot.lock().await.messages.clone(),
            None => Vec::new(),
        }
    }

    /// Markets from the session's most recent searching turn
    pub async fn latest_markets(&self, session_id: &str) -> Vec<MarketContract> {
        match self.get(session_id) {
            Some(slot) => slot.lock().await.latest_markets.clone(),
            None => Vec::new(),
        }
    }

    /// Remove a session; repeating the call is a no-op
    pub fn drop_session(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).is_some();
        if removed {
            debug!("Dropped session {}", session_id);
        }
        removed
    }

    /// Put a slot back under its id unless someone re-created it first
    ///
    /// A turn ends with this after the sweeper (or a DELETE) removed the
    /// entry while the turn still held the slot, so the finished transcript
    /// stays reachable.
    pub fn reinstate(&self, session_id: &str, slot: &Arc<SessionSlot>) {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::clone(slot));
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Evict sessions idle past the TTL, returning how many went
    ///
    /// A slot whose lock is held has a turn in flight and is skipped; the
    /// turn refreshes its idle clock on every append.
    pub fn sweep(&self) -> usize {
        let mut evicted = 0;
        self.sessions.retain(|session_id, slot| match slot.session.try_lock() {
            Ok(session) => {
                if session.is_idle(self.ttl_secs) {
                    debug!("Evicting idle session {}", session_id);
                    evicted += 1;
                    false
                } else {
                    true
                }
            }
            Err(_) => true,
        });

        if evicted > 0 {
            info!("Evicted {} idle sessions", evicted);
        }
        evicted
    }

    /// Spawn the background sweeper task
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
            loop {
                ticker.tick().await;
                store.sweep();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_session_starts_empty() {
        let store = SessionStore::new(DEFAULT_SESSION_TTL_SECS);
        let slot = store.get_or_create("s1");
        let session = slot.lock().await;

        assert!(session.messages.is_empty());
        assert!(session.latest_markets.is_empty());
    }

    #[tokio::test]
    async fn same_id_returns_same_slot() {
        let store = SessionStore::new(DEFAULT_SESSION_TTL_SECS);
        let first = store.get_or_create("s1");
        first.lock().await.push(Message::user("hello"));

        let second = store.get_or_create("s1");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.lock().await.messages.len(), 1);
    }

    #[tokio::test]
    async fn append_lands_in_arrival_order() {
        let store = SessionStore::new(DEFAULT_SESSION_TTL_SECS);
        store.append("s1", Message::user("first")).await;
        store.append("s1", Message::assistant("second")).await;

        let transcript = store.transcript("s1").await;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].content(), "first");
        assert_eq!(transcript[1].content(), "second");
    }

    #[tokio::test]
    async fn readbacks_are_empty_for_unknown_ids() {
        let store = SessionStore::new(DEFAULT_SESSION_TTL_SECS);

        assert!(store.transcript("ghost").await.is_empty());
        assert!(store.latest_markets("ghost").await.is_empty());
        assert!(!store.contains("ghost"));
    }

    #[tokio::test]
    async fn dropping_twice_is_harmless() {
        let store = SessionStore::new(DEFAULT_SESSION_TTL_SECS);
        store.get_or_create("s1");

        assert!(store.drop_session("s1"));
        assert!(!store.drop_session("s1"));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn sweep_evicts_idle_sessions() {
        let store = SessionStore::new(0);
        store.get_or_create("s1");
        store.get_or_create("s2");

        assert_eq!(store.sweep(), 2);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn sweep_skips_sessions_with_a_turn_in_flight() {
        let store = SessionStore::new(0);
        let slot = store.get_or_create("busy");
        let guard = slot.lock().await;

        assert_eq!(store.sweep(), 0);
        assert!(store.contains("busy"));

        drop(guard);
        assert_eq!(store.sweep(), 1);
    }

    #[tokio::test]
    async fn reinstate_restores_a_dropped_slot() {
        let store = SessionStore::new(DEFAULT_SESSION_TTL_SECS);
        let slot = store.get_or_create("s1");
        slot.lock().await.push(Message::user("still talking"));

        store.drop_session("s1");
        assert!(!store.contains("s1"));

        store.reinstate("s1", &slot);
        let restored = store.get("s1").unwrap();
        assert!(Arc::ptr_eq(&restored, &slot));
        assert_eq!(restored.lock().await.messages.len(), 1);
    }

    #[tokio::test]
    async fn reinstate_yields_to_a_newer_session() {
        let store = SessionStore::new(DEFAULT_SESSION_TTL_SECS);
        let old = store.get_or_create("s1");
        store.drop_session("s1");

        let replacement = store.get_or_create("s1");
        store.reinstate("s1", &old);

        let current = store.get("s1").unwrap();
        assert!(Arc::ptr_eq(&current, &replacement));
        assert!(!Arc::ptr_eq(&current, &old));
    }
}
