//! Live connections and their per-connection CPU baselines.
//!
//! Entries are created on connect and dropped as a whole on disconnect, so
//! tracker state never outlives its connection.

use std::collections::HashMap;

use chrono::Utc;
use tracing::{debug, warn};

use crate::collector::traits::QueryExecutor;
use crate::rates::{BusyIdleTracker, CpuDeltaTracker};

/// Opaque identifier of a registered connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything held for one connection.
pub(crate) struct ConnectionState<E> {
    pub executor: E,
    pub cpu: CpuDeltaTracker,
    pub os_cpu: BusyIdleTracker,
}

/// Registry of live connections.
///
/// Each registry is independent; tests can run several side by side.
pub struct SessionRegistry<E: QueryExecutor> {
    connections: HashMap<ConnectionId, ConnectionState<E>>,
    next_seq: u64,
}

impl<E: QueryExecutor> Default for SessionRegistry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: QueryExecutor> SessionRegistry<E> {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Adds a connection with empty CPU baselines and returns its fresh id.
    pub fn register(&mut self, executor: E) -> ConnectionId {
        self.next_seq += 1;
        let id = ConnectionId(format!(
            "conn_{}_{}",
            Utc::now().timestamp_millis(),
            self.next_seq
        ));
        self.connections.insert(
            id.clone(),
            ConnectionState {
                executor,
                cpu: CpuDeltaTracker::new(),
                os_cpu: BusyIdleTracker::new(),
            },
        );
        debug!(connection = %id, "connection registered");
        id
    }

    /// Closes and removes a connection together with its tracker state.
    ///
    /// Returns `false` if the id is unknown. A failing close is logged; the
    /// entry is removed regardless.
    pub fn disconnect(&mut self, id: &ConnectionId) -> bool {
        let Some(mut state) = self.connections.remove(id) else {
            return false;
        };
        if let Err(e) = state.executor.close() {
            warn!(connection = %id, error = %e, "failed to close connection");
        }
        debug!(connection = %id, "connection removed");
        true
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ConnectionId> {
        self.connections.keys()
    }

    pub fn executor(&self, id: &ConnectionId) -> Option<&E> {
        self.connections.get(id).map(|c| &c.executor)
    }

    pub fn cpu_tracker(&self, id: &ConnectionId) -> Option<&CpuDeltaTracker> {
        self.connections.get(id).map(|c| &c.cpu)
    }

    pub fn os_cpu_tracker(&self, id: &ConnectionId) -> Option<&BusyIdleTracker> {
        self.connections.get(id).map(|c| &c.os_cpu)
    }

    pub(crate) fn get_mut(&mut self, id: &ConnectionId) -> Option<&mut ConnectionState<E>> {
        self.connections.get_mut(id)
    }
}
