//! Generic owner of many concurrent sessions: capacity limit, duplicate-id
//! rejection, and a background sweep that retires closed or idle sessions.

use std::{
    hash::Hash,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Weak,
    },
    thread,
    time::{Duration, Instant},
};

use parking_lot::RwLock;

use crate::{error::ServiceError, lifecycle::SessionState, table::Table};

/// Idle sessions (never started) are swept after this much inactivity.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// The subset of session behavior the registry needs to sweep it.
pub trait ManagedSession: Send + Sync + 'static {
    fn state(&self) -> SessionState;
    fn last_activity(&self) -> Instant;
    /// Stops the session if it is not already stopped. Must be idempotent.
    fn stop(&self);
}

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub max_sessions: usize,
    pub active_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_sessions: 10_000,
            active_timeout: Duration::from_secs(60),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

pub struct Registry<Id, S>
where
    Id: Eq + Hash + Clone + Send + Sync + 'static,
    S: ManagedSession,
{
    sessions: RwLock<Table<Id, Arc<S>>>,
    config: RegistryConfig,
    running: Arc<AtomicBool>,
}

impl<Id, S> Registry<Id, S>
where
    Id: Eq + Hash + Clone + Send + Sync + 'static,
    S: ManagedSession,
{
    pub fn new(config: RegistryConfig) -> Arc<Self> {
        let this = Arc::new(Self {
            sessions: RwLock::new(Table::default()),
            config,
            running: Arc::new(AtomicBool::new(true)),
        });

        let weak: Weak<Self> = Arc::downgrade(&this);
        let running = this.running.clone();
        thread::spawn(move || {
            let mut stale = Vec::with_capacity(16);
            while running.load(Ordering::Relaxed) {
                if let Some(this) = weak.upgrade() {
                    let now = Instant::now();
                    this.sessions.read().iter().for_each(|(id, session)| {
                        let idle_for = now.saturating_duration_since(session.last_activity());
                        let expired = match session.state() {
                            SessionState::Closed => true,
                            SessionState::Active => idle_for > this.config.active_timeout,
                            SessionState::Idle | SessionState::Closing => idle_for > this.config.idle_timeout,
                        };
                        if expired {
                            stale.push(id.clone());
                        }
                    });

                    if !stale.is_empty() {
                        let mut sessions = this.sessions.write();
                        for id in stale.drain(..) {
                            if let Some(session) = sessions.remove(&id) {
                                session.stop();
                            }
                        }
                    }
                } else {
                    break;
                }
                thread::sleep(Duration::from_secs(1));
            }
        });

        this
    }

    pub fn stop_sweep(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    pub fn create(&self, id: Id, session: Arc<S>) -> Result<(), ServiceError> {
        let mut sessions = self.sessions.write();
        if sessions.contains_key(&id) {
            return Err(ServiceError::DuplicateId);
        }
        if sessions.len() >= self.config.max_sessions {
            return Err(ServiceError::CapacityExceeded);
        }
        sessions.insert(id, session);
        Ok(())
    }

    pub fn get(&self, id: &Id) -> Option<Arc<S>> {
        self.sessions.read().get(id).cloned()
    }

    pub fn remove(&self, id: &Id) -> Option<Arc<S>> {
        let removed = self.sessions.write().remove(id);
        if let Some(session) = &removed {
            session.stop();
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stop_all(&self) {
        let ids: Vec<Id> = self.sessions.read().keys().cloned().collect();
        for id in ids {
            self.remove(&id);
        }
        self.stop_sweep();
    }
}

impl<Id, S> Drop for Registry<Id, S>
where
    Id: Eq + Hash + Clone + Send + Sync + 'static,
    S: ManagedSession,
{
    fn drop(&mut self) {
        self.stop_sweep();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Fake {
        state: Mutex<SessionState>,
        last_activity: Mutex<Instant>,
        stopped: std::sync::atomic::AtomicBool,
    }

    impl Fake {
        fn new(state: SessionState) -> Arc<Self> {
            Arc::new(Self {
                state: Mutex::new(state),
                last_activity: Mutex::new(Instant::now()),
                stopped: std::sync::atomic::AtomicBool::new(false),
            })
        }
    }

    impl ManagedSession for Fake {
        fn state(&self) -> SessionState {
            *self.state.lock().unwrap()
        }

        fn last_activity(&self) -> Instant {
            *self.last_activity.lock().unwrap()
        }

        fn stop(&self) {
            self.stopped.store(true, Ordering::Relaxed);
        }
    }

    #[test]
    fn rejects_duplicate_id() {
        let registry = Registry::new(RegistryConfig::default());
        registry.create("a".to_string(), Fake::new(SessionState::Idle)).unwrap();
        let err = registry
            .create("a".to_string(), Fake::new(SessionState::Idle))
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateId));
        registry.stop_sweep();
    }

    #[test]
    fn rejects_over_capacity() {
        let registry = Registry::new(RegistryConfig { max_sessions: 1, ..Default::default() });
        registry.create("a".to_string(), Fake::new(SessionState::Idle)).unwrap();
        let err = registry
            .create("b".to_string(), Fake::new(SessionState::Idle))
            .unwrap_err();
        assert!(matches!(err, ServiceError::CapacityExceeded));
        registry.stop_sweep();
    }

    #[test]
    fn remove_stops_session() {
        let registry = Registry::new(RegistryConfig::default());
        let fake = Fake::new(SessionState::Active);
        registry.create("a".to_string(), fake.clone()).unwrap();
        registry.remove(&"a".to_string());
        assert!(fake.stopped.load(Ordering::Relaxed));
        registry.stop_sweep();
    }
}
