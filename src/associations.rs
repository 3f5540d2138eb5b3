//! Account to controller association store.

use dashmap::DashMap;

/// Maps account ids to the controller key each account is paired with.
///
/// Thin plumbing around the relay core: the routing layer resolves which
/// controller an authenticated account may address before touching the
/// queues. Associations never expire on their own; they are replaced or
/// removed explicitly.
#[derive(Debug, Default)]
pub struct AssociationStore {
    map: DashMap<String, String>,
}

impl AssociationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `account_id` with `controller_key`, replacing any previous
    /// association for that account.
    pub fn associate(&self, account_id: impl Into<String>, controller_key: impl Into<String>) {
        self.map.insert(account_id.into(), controller_key.into());
    }

    /// The controller key paired with `account_id`, if any.
    pub fn controller_for(&self, account_id: &str) -> Option<String> {
        self.map.get(account_id).map(|v| v.value().clone())
    }

    /// Remove the association for `account_id`; returns whether one existed.
    pub fn dissociate(&self, account_id: &str) -> bool {
        self.map.remove(account_id).is_some()
    }

    /// Number of stored associations.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
