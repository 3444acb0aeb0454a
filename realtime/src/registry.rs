use crate::connection::{Connection, ConnectionId, UserId};
use crate::message::Recipients;
use std::collections::{HashMap, HashSet};

/// Live connections with a secondary index by user.
///
/// Owned by the hub's control loop and never shared, so it needs no locking.
/// Every connection id in `by_user` is a key of `connections` and vice versa.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    connections: HashMap<ConnectionId, Connection>,
    by_user: HashMap<UserId, HashSet<ConnectionId>>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Tracks `connection`. Returns the connection back if its id is already
    /// tracked; the tracked one is left untouched.
    pub(crate) fn insert(&mut self, connection: Connection) -> Result<(), Connection> {
        let id = connection.id();
        if self.connections.contains_key(&id) {
            return Err(connection);
        }

        self.by_user
            .entry(connection.user_id())
            .or_default()
            .insert(id);
        self.connections.insert(id, connection);
        Ok(())
    }

    /// Stops tracking a connection and hands it back to the caller, who
    /// closes its queue by dropping it.
    pub(crate) fn remove(&mut self, id: &ConnectionId) -> Option<Connection> {
        let connection = self.connections.remove(id)?;

        if let Some(ids) = self.by_user.get_mut(&connection.user_id()) {
            ids.remove(id);
            if ids.is_empty() {
                self.by_user.remove(&connection.user_id());
            }
        }

        Some(connection)
    }

    pub(crate) fn get(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub(crate) fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.connections.len()
    }

    pub(crate) fn user_count(&self) -> usize {
        self.by_user.len()
    }

    /// Ids of every tracked connection the recipients cover.
    pub(crate) fn targets(&self, recipients: &Recipients) -> Vec<ConnectionId> {
        match recipients {
            Recipients::Broadcast => self.connections.keys().copied().collect(),
            Recipients::Users(user_ids) => user_ids
                .iter()
                .filter_map(|user_id| self.by_user.get(user_id))
                .flat_map(|ids| ids.iter().copied())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_indexes_connections_by_user() {
        let mut registry = Registry::new();
        let (first, _o1) = Connection::new(1, 4);
        let (second, _o2) = Connection::new(1, 4);
        let (third, _o3) = Connection::new(2, 4);
        let first_id = first.id();

        assert!(registry.insert(first).is_ok());
        assert!(registry.insert(second).is_ok());
        assert!(registry.insert(third).is_ok());

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.user_count(), 2);
        assert!(registry.contains(&first_id));
        assert_eq!(registry.targets(&Recipients::users([1])).len(), 2);
    }

    #[test]
    fn duplicate_id_is_handed_back() {
        let mut registry = Registry::new();
        let id = ConnectionId::new();
        let (tracked, _o1) = Connection::with_id(id, 1, 4);
        let (duplicate, _o2) = Connection::with_id(id, 2, 4);

        assert!(registry.insert(tracked).is_ok());
        let rejected = registry.insert(duplicate).unwrap_err();

        assert_eq!(rejected.user_id(), 2);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(&id).map(Connection::user_id), Some(1));
        assert!(registry.targets(&Recipients::users([2])).is_empty());
    }

    #[test]
    fn removing_the_last_connection_drops_the_user_entry() {
        let mut registry = Registry::new();
        let (connection, _outbound) = Connection::new(9, 4);
        let id = connection.id();
        registry.insert(connection).unwrap();

        assert!(registry.remove(&id).is_some());
        assert!(registry.remove(&id).is_none());
        assert_eq!(registry.len(), 0);
        assert_eq!(registry.user_count(), 0);
    }

    #[test]
    fn targets_cover_listed_users_or_everyone() {
        let mut registry = Registry::new();
        for user_id in [1, 2, 3] {
            let (connection, _outbound) = Connection::new(user_id, 4);
            registry.insert(connection).unwrap();
        }

        let mut listed: Vec<UserId> = registry
            .targets(&Recipients::users([1, 3, 8]))
            .iter()
            .filter_map(|id| registry.get(id).map(Connection::user_id))
            .collect();
        listed.sort_unstable();

        assert_eq!(listed, vec![1, 3]);
        assert_eq!(registry.targets(&Recipients::Broadcast).len(), 3);
        assert!(registry.targets(&Recipients::users(Vec::new())).is_empty());
    }
}
