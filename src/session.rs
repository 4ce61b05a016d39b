//! Per-session state and the store that hands it out.
//!
//! A session owns its dataset, classifier state (remote flag + memo) and chat transcript.
//! Each session sits behind its own async mutex so requests against it are serialized;
//! nothing is shared across sessions.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use metrics::{counter, gauge};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::analyze::ClassifierState;
use crate::chat::ChatTurn;
use crate::error::Result;
use crate::ingest::{self, Dataset};

#[derive(Debug, Default)]
pub struct Session {
    pub dataset: Option<Dataset>,
    pub classifier: ClassifierState,
    pub transcript: Vec<ChatTurn>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the dataset with a freshly loaded one. On error the previous dataset stays.
    pub fn load_dataset(&mut self, path: &Path) -> Result<&Dataset> {
        let fresh = ingest::load(path)?;
        let ds: &Dataset = self.dataset.insert(fresh);
        Ok(ds)
    }
}

pub type SharedSession = Arc<AsyncMutex<Session>>;

#[derive(Debug)]
struct Entry {
    session: SharedSession,
    last_seen: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<String, Entry>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> String {
        let id = Uuid::new_v4().to_string();
        let mut g = self.inner.lock().expect("session store mutex poisoned");
        g.insert(
            id.clone(),
            Entry {
                session: Arc::new(AsyncMutex::new(Session::new())),
                last_seen: Instant::now(),
            },
        );
        gauge!("sessions_open").set(g.len() as f64);
        info!(session = %id, open = g.len(), "session created");
        id
    }

    /// Look a session up and mark it as seen.
    pub fn get(&self, id: &str) -> Option<SharedSession> {
        let mut g = self.inner.lock().expect("session store mutex poisoned");
        let entry = g.get_mut(id)?;
        entry.last_seen = Instant::now();
        Some(entry.session.clone())
    }

    /// Drop a session; returns false when the id was unknown.
    pub fn remove(&self, id: &str) -> bool {
        let mut g = self.inner.lock().expect("session store mutex poisoned");
        let removed = g.remove(id).is_some();
        if removed {
            gauge!("sessions_open").set(g.len() as f64);
            info!(session = %id, "session discarded");
        }
        removed
    }

    /// Drop sessions not looked up for at least `max_idle`. Sessions a request is
    /// still holding are kept. Returns how many were dropped.
    pub fn sweep_idle(&self, max_idle: Duration) -> usize {
        let mut g = self.inner.lock().expect("session store mutex poisoned");
        let before = g.len();
        g.retain(|_, e| e.last_seen.elapsed() < max_idle || Arc::strong_count(&e.session) > 1);
        let expired = before - g.len();
        if expired > 0 {
            counter!("sessions_expired_total").increment(expired as u64);
            gauge!("sessions_open").set(g.len() as f64);
            info!(expired, open = g.len(), "idle sessions expired");
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("session store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Background task that sweeps idle sessions every `every`.
pub fn spawn_idle_sweeper(
    store: SessionStore,
    every: Duration,
    max_idle: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            store.sweep_idle(max_idle);
        }
    })
}
