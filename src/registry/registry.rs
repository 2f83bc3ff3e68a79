use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::registry::topic::{IdentityId, Topic};
use crate::session::{SessionHandle, SessionId};

/// Thread-safe index from topic key to interested sessions.
///
/// Shared by every connection's reader loop (subscribe/unsubscribe), every
/// teardown path (remove) and every publisher (interest lookups), so it is
/// built on sharded concurrent maps rather than one global lock: operations
/// on unrelated topic keys do not contend with each other, while writes and
/// reads on the same key are linearizable.
///
/// The identity-scoped index is not a separate structure; a session is
/// entered under [`Topic::MedicineNotification`] for its identity at
/// admission, so identity lookups go through the same interest map as
/// explicit subscriptions.
#[derive(Debug, Default)]
pub struct TopicRegistry {
    /// Topic key -> ids of sessions currently interested.
    interest: DashMap<Topic, HashSet<SessionId>>,
    /// Session id -> topics it is currently entered under. Makes teardown
    /// proportional to the session's own subscriptions instead of a scan of
    /// every topic.
    by_session: DashMap<SessionId, HashSet<Topic>>,
    /// Session id -> live handle, used to resolve interest sets into
    /// enqueue targets.
    sessions: DashMap<SessionId, Arc<SessionHandle>>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a session: registers its handle and enters it under its
    /// identity's implicit notification topic. Called once, after
    /// authentication succeeds.
    pub fn add_session(&self, handle: Arc<SessionHandle>) {
        let identity_topic = Topic::MedicineNotification {
            identity_id: handle.identity.id,
        };
        self.sessions.insert(handle.id, handle.clone());
        self.subscribe(identity_topic, handle.id);
        debug!(session = %handle.id, identity = handle.identity.id, "session admitted");
    }

    /// Idempotently adds `session_id` to the interest set of `topic`.
    ///
    /// No shard guard is ever held across a lookup in another map, here or
    /// in any other operation, so shard locks cannot form a cycle.
    pub fn subscribe(&self, topic: Topic, session_id: SessionId) {
        self.by_session.entry(session_id).or_default().insert(topic);
        self.interest.entry(topic).or_default().insert(session_id);
    }

    /// Idempotently removes `session_id` from the interest set of `topic`.
    /// Empty interest sets are garbage-collected to keep the map bounded by
    /// live interest.
    pub fn unsubscribe(&self, topic: &Topic, session_id: &SessionId) {
        if let Some(mut topics) = self.by_session.get_mut(session_id) {
            topics.remove(topic);
        }
        self.interest
            .remove_if_mut(topic, |_, interested| {
                interested.remove(session_id);
                interested.is_empty()
            });
    }

    /// Snapshot of the sessions currently interested in `topic`.
    ///
    /// Returns owned handles, never a view into the interest set, so the
    /// dispatcher can iterate it while subscriptions keep changing.
    pub fn interested_sessions(&self, topic: &Topic) -> Vec<Arc<SessionHandle>> {
        let ids: Vec<SessionId> = match self.interest.get(topic) {
            Some(interested) => interested.iter().copied().collect(),
            None => return Vec::new(),
        };
        ids.iter()
            .filter_map(|id| self.sessions.get(id).map(|entry| entry.value().clone()))
            .collect()
    }

    /// Every live session belonging to `identity_id`. One identity may have
    /// multiple concurrent sessions.
    pub fn sessions_for_identity(&self, identity_id: IdentityId) -> Vec<Arc<SessionHandle>> {
        self.interested_sessions(&Topic::MedicineNotification { identity_id })
    }

    /// Removes the session from every index it is part of. Called from
    /// session teardown; safe to call for a session that never subscribed to
    /// anything, and safe to call more than once.
    pub fn remove_session(&self, session_id: &SessionId) {
        self.sessions.remove(session_id);
        let Some((_, topics)) = self.by_session.remove(session_id) else {
            return;
        };
        for topic in topics {
            self.interest.remove_if_mut(&topic, |_, interested| {
                interested.remove(session_id);
                interested.is_empty()
            });
        }
        debug!(session = %session_id, "session removed from registry");
    }

    /// Handles of every currently admitted session. Used by engine shutdown
    /// to signal teardown.
    pub fn live_sessions(&self) -> Vec<Arc<SessionHandle>> {
        self.sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Number of topic keys with at least one interested session.
    pub fn topic_count(&self) -> usize {
        self.interest.len()
    }
}
