//! Process-wide view over every session's counters, for introspection.
//!
//! Per-session counting itself lives in [`service::SessionStatistics`]; this
//! module only keeps a table of handles so the process can answer "what is
//! session X doing" without threading a reference through every caller.

use std::{hash::Hash, sync::Arc};

use ahash::AHashMap;
use parking_lot::RwLock;
use service::SessionStatistics;

#[derive(Clone)]
pub struct Statistics<Id: Eq + Hash + Clone + Send + Sync + 'static>(
    Arc<RwLock<AHashMap<Id, Arc<SessionStatistics>>>>,
);

impl<Id: Eq + Hash + Clone + Send + Sync + 'static> Default for Statistics<Id> {
    fn default() -> Self {
        Self(Arc::new(RwLock::new(AHashMap::with_capacity(1024))))
    }
}

impl<Id: Eq + Hash + Clone + Send + Sync + 'static> Statistics<Id> {
    pub fn register(&self, id: Id, stats: Arc<SessionStatistics>) {
        self.0.write().insert(id, stats);
    }

    pub fn unregister(&self, id: &Id) {
        self.0.write().remove(id);
    }

    pub fn get(&self, id: &Id) -> Option<Arc<SessionStatistics>> {
        self.0.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.0.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_get_roundtrip() {
        let statistics = Statistics::<String>::default();
        let session_stats = Arc::new(SessionStatistics::default());
        statistics.register("a".to_string(), session_stats.clone());
        assert!(statistics.get(&"a".to_string()).is_some());
        statistics.unregister(&"a".to_string());
        assert!(statistics.get(&"a".to_string()).is_none());
    }
}
