use dashmap::DashMap;
use std::collections::HashSet;

use super::registry::ConnectionId;

/// Broadcast scope name for a group.
pub fn group_scope(group_id: &str) -> String {
    format!("group_{}", group_id)
}

/// Named sets of connections that receive copies of events sent to the name.
///
/// Purely transport-level: membership says nothing about who actually
/// belongs to the persisted group. Empty scopes are dropped.
#[derive(Debug, Default)]
pub struct ScopeRegistry {
    scopes: DashMap<String, HashSet<ConnectionId>>,
}

impl ScopeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a scope. Returns false if it was already there.
    pub fn join(&self, scope: &str, connection_id: &ConnectionId) -> bool {
        self.scopes
            .entry(scope.to_string())
            .or_default()
            .insert(connection_id.clone())
    }

    /// Remove a connection from a scope. Returns false if it was not there.
    pub fn leave(&self, scope: &str, connection_id: &ConnectionId) -> bool {
        let removed = self
            .scopes
            .get_mut(scope)
            .map(|mut members| members.remove(connection_id))
            .unwrap_or(false);
        self.scopes.remove_if(scope, |_, members| members.is_empty());
        removed
    }

    /// Drop a connection from every scope it joined. Returns how many scopes
    /// it was removed from.
    pub fn leave_all(&self, connection_id: &ConnectionId) -> usize {
        let mut left = 0;
        self.scopes.retain(|_, members| {
            if members.remove(connection_id) {
                left += 1;
            }
            !members.is_empty()
        });
        left
    }

    pub fn members(&self, scope: &str) -> Vec<ConnectionId> {
        self.scopes
            .get(scope)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }
}
