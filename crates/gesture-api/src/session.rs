//! Per-client stabilizer sessions.
//!
//! Every (endpoint, client) pair owns its own [`Stabilizer`] behind an async
//! mutex. Handlers hold that mutex from landmark extraction until the
//! outcome is resolved, so frames from one client are applied in order
//! while different clients proceed in parallel.

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use gesture_models::Endpoint;
use gesture_stabilizer::{Stabilizer, StabilizerConfig};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::metrics;
use crate::middleware::client_ip;

/// Header clients use to pick their own session id.
pub const SESSION_HEADER: &str = "X-Session-ID";

const MAX_SESSION_ID_LEN: usize = 128;

/// Identifies the client a frame belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn anonymous() -> Self {
        Self("anonymous".to_string())
    }

    /// Accepts 1..=128 characters of `[A-Za-z0-9_.-]`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let valid = !raw.is_empty()
            && raw.len() <= MAX_SESSION_ID_LEN
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionKey
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(value) = parts.headers.get(SESSION_HEADER) {
            match value.to_str().ok().and_then(SessionKey::parse) {
                Some(key) => return Ok(key),
                None => debug!("Ignoring malformed {} header", SESSION_HEADER),
            }
        }

        Ok(client_ip(&parts.headers, &parts.extensions)
            .map(|ip| SessionKey(ip.to_string()))
            .unwrap_or_else(SessionKey::anonymous))
    }
}

pub type SharedStabilizer = Arc<Mutex<Stabilizer>>;

struct Entry {
    stabilizer: SharedStabilizer,
    last_seen: Instant,
}

/// Stabilizer sessions with idle expiry and a size cap.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<(Endpoint, SessionKey), Entry>>>,
    configs: Arc<HashMap<Endpoint, StabilizerConfig>>,
    ttl: Duration,
    max_entries: usize,
}

impl SessionStore {
    pub fn new(
        configs: HashMap<Endpoint, StabilizerConfig>,
        ttl: Duration,
        max_entries: usize,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            configs: Arc::new(configs),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Fetch the caller's stabilizer for an endpoint, creating it on first use.
    pub async fn get_or_create(&self, endpoint: Endpoint, key: &SessionKey) -> SharedStabilizer {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();

        if let Some(entry) = sessions.get_mut(&(endpoint, key.clone())) {
            entry.last_seen = now;
            return Arc::clone(&entry.stabilizer);
        }

        if sessions.len() >= self.max_entries {
            let ttl = self.ttl;
            sessions.retain(|_, entry| now.duration_since(entry.last_seen) < ttl);
        }
        if sessions.len() >= self.max_entries {
            let excess = sessions.len() + 1 - self.max_entries;
            let mut by_age: Vec<_> = sessions
                .iter()
                .map(|(k, entry)| (k.clone(), entry.last_seen))
                .collect();
            by_age.sort_by_key(|(_, seen)| *seen);
            for (k, _) in by_age.into_iter().take(excess) {
                sessions.remove(&k);
            }
            warn!("Session store at capacity, evicted {} sessions", excess);
        }

        let config = self
            .configs
            .get(&endpoint)
            .cloned()
            .unwrap_or_else(|| gesture_stabilizer::default_config(endpoint));
        let stabilizer = Arc::new(Mutex::new(Stabilizer::new(
            &config,
            endpoint.labels().iter().copied(),
        )));

        debug!(endpoint = %endpoint, session = %key, "Created session");
        sessions.insert(
            (endpoint, key.clone()),
            Entry {
                stabilizer: Arc::clone(&stabilizer),
                last_seen: now,
            },
        );
        metrics::set_active_sessions(sessions.len());

        stabilizer
    }

    /// Drop every endpoint's state for a client. Returns how many were removed.
    pub async fn remove(&self, key: &SessionKey) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|(_, k), _| k != key);
        metrics::set_active_sessions(sessions.len());
        before - sessions.len()
    }

    /// Drop sessions idle for longer than the TTL.
    pub async fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) < self.ttl);
        metrics::set_active_sessions(sessions.len());
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
