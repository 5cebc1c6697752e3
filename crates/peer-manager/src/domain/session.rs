//! TSS signing sessions.
//!
//! A ceremony over one IBTP leg is identified by the artifact id, its
//! direction and the per-ceremony tag. Non-participation notices exclude
//! parties from exactly that session; sessions over the same artifact with a
//! different tag are unaffected.

use shared_types::IbtpDirection;
use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};

/// Identity of one signing session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub artifact_id: String,
    pub direction: IbtpDirection,
    pub tag: String,
}

impl SessionKey {
    pub fn new(artifact_id: impl Into<String>, direction: IbtpDirection, tag: impl Into<String>) -> Self {
        Self {
            artifact_id: artifact_id.into(),
            direction,
            tag: tag.into(),
        }
    }
}

#[derive(Debug)]
struct SessionEntry {
    excluded: BTreeSet<String>,
    touched: Instant,
}

/// Exclusions per open session, expired after an idle TTL.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: HashMap<SessionKey, SessionEntry>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            ttl,
        }
    }

    /// Exclude `parties` from the session, opening it if needed.
    pub fn record_exclusions<'a>(
        &mut self,
        key: &SessionKey,
        parties: impl IntoIterator<Item = &'a String>,
        now: Instant,
    ) {
        let entry = self
            .sessions
            .entry(key.clone())
            .or_insert_with(|| SessionEntry {
                excluded: BTreeSet::new(),
                touched: now,
            });
        entry.excluded.extend(parties.into_iter().cloned());
        entry.touched = now;
    }

    /// `requested` minus the parties excluded from the session, order kept.
    #[must_use]
    pub fn active_participants(&self, key: &SessionKey, requested: &[String]) -> Vec<String> {
        match self.sessions.get(key) {
            Some(entry) => requested
                .iter()
                .filter(|party| !entry.excluded.contains(*party))
                .cloned()
                .collect(),
            None => requested.to_vec(),
        }
    }

    #[must_use]
    pub fn excluded(&self, key: &SessionKey) -> Vec<String> {
        self.sessions
            .get(key)
            .map(|entry| entry.excluded.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Close a finished session.
    pub fn close(&mut self, key: &SessionKey) -> bool {
        self.sessions.remove(key).is_some()
    }

    /// Drop sessions idle for longer than the TTL. Returns how many went.
    pub fn prune(&mut self, now: Instant) -> usize {
        let ttl = self.ttl;
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| now.saturating_duration_since(entry.touched) <= ttl);
        before - self.sessions.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IBTP: &str = "1356:chain0:transfer-1356:chain1:transfer-7";

    fn parties(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_unknown_session_keeps_all_participants() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let key = SessionKey::new(IBTP, IbtpDirection::Request, "777");

        let requested = parties(&["1", "2", "3"]);
        assert_eq!(registry.active_participants(&key, &requested), requested);
    }

    #[test]
    fn test_exclusions_filter_requested_in_order() {
        let mut registry = SessionRegistry::new(Duration::from_secs(60));
        let key = SessionKey::new(IBTP, IbtpDirection::Request, "777");

        registry.record_exclusions(&key, &parties(&["2", "3"]), Instant::now());

        let active = registry.active_participants(&key, &parties(&["1", "2", "3", "4"]));
        assert_eq!(active, parties(&["1", "4"]));
        assert_eq!(registry.excluded(&key), parties(&["2", "3"]));
    }

    #[test]
    fn test_sessions_do_not_share_exclusions() {
        let mut registry = SessionRegistry::new(Duration::from_secs(60));
        let excluded = SessionKey::new(IBTP, IbtpDirection::Request, "777");
        let other_tag = SessionKey::new(IBTP, IbtpDirection::Request, "778");
        let other_leg = SessionKey::new(IBTP, IbtpDirection::Response, "777");

        registry.record_exclusions(&excluded, &parties(&["2"]), Instant::now());

        let requested = parties(&["1", "2"]);
        assert_eq!(registry.active_participants(&other_tag, &requested), requested);
        assert_eq!(registry.active_participants(&other_leg, &requested), requested);
    }

    #[test]
    fn test_close_and_prune() {
        let mut registry = SessionRegistry::new(Duration::from_secs(10));
        let start = Instant::now();
        let stale = SessionKey::new(IBTP, IbtpDirection::Request, "1");
        let fresh = SessionKey::new(IBTP, IbtpDirection::Request, "2");
        let closed = SessionKey::new(IBTP, IbtpDirection::Request, "3");

        registry.record_exclusions(&stale, &parties(&["2"]), start);
        registry.record_exclusions(&fresh, &parties(&["2"]), start + Duration::from_secs(8));
        registry.record_exclusions(&closed, &parties(&["2"]), start);
        assert!(registry.close(&closed));
        assert!(!registry.close(&closed));

        assert_eq!(registry.prune(start + Duration::from_secs(15)), 1);
        assert_eq!(registry.len(), 1);
        assert!(!registry.excluded(&fresh).is_empty());
    }
}
