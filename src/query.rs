//! Cached-list invalidation
//!
//! The UI owns the actual cached data. This module only tracks a version per
//! key so a view knows to refetch after a mutation. Nothing here is optimistic:
//! a key is bumped after the backend confirmed the write.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Apartments,
    PendingAgreements,
    Members,
    /// Shared by the admin coupon table, the marketing section and coupon lookup.
    Coupons,
    Announcements,
    Payments(String),
    UserProfile(String),
    AdminSummary,
}

impl QueryKey {
    pub fn name(&self) -> String {
        match self {
            QueryKey::Apartments => "apartments".to_string(),
            QueryKey::PendingAgreements => "agreements:pending".to_string(),
            QueryKey::Members => "members".to_string(),
            QueryKey::Coupons => "coupons".to_string(),
            QueryKey::Announcements => "announcements".to_string(),
            QueryKey::Payments(email) => format!("payments:{}", email),
            QueryKey::UserProfile(email) => format!("user:{}", email),
            QueryKey::AdminSummary => "admin:summary".to_string(),
        }
    }
}

type Listener = Rc<dyn Fn(&QueryKey)>;

#[derive(Default)]
pub struct QueryCache {
    versions: RefCell<HashMap<QueryKey, u64>>,
    listeners: RefCell<Vec<(usize, Listener)>>,
    next_listener: RefCell<usize>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 0 until the key is first invalidated.
    pub fn version(&self, key: &QueryKey) -> u64 {
        self.versions.borrow().get(key).copied().unwrap_or(0)
    }

    pub fn invalidate(&self, key: QueryKey) {
        let version = {
            let mut versions = self.versions.borrow_mut();
            let v = versions.entry(key.clone()).or_insert(0);
            *v += 1;
            *v
        };
        tracing::debug!(key = %key.name(), version, "query invalidated");

        // Listeners may read or invalidate again; no borrow is held here.
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(&key);
        }
    }

    pub fn invalidate_all<I: IntoIterator<Item = QueryKey>>(&self, keys: I) {
        for key in keys {
            self.invalidate(key);
        }
    }

    pub fn subscribe(&self, listener: impl Fn(&QueryKey) + 'static) -> usize {
        let mut next = self.next_listener.borrow_mut();
        let id = *next;
        *next += 1;
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: usize) {
        self.listeners.borrow_mut().retain(|(lid, _)| *lid != id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_invalidate_bumps_version_and_notifies() {
        let cache = QueryCache::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let id = cache.subscribe(move |k| sink.borrow_mut().push(k.clone()));

        assert_eq!(cache.version(&QueryKey::Coupons), 0);
        cache.invalidate(QueryKey::Coupons);
        cache.invalidate(QueryKey::Coupons);
        assert_eq!(cache.version(&QueryKey::Coupons), 2);
        assert_eq!(cache.version(&QueryKey::Members), 0);

        cache.unsubscribe(id);
        cache.invalidate(QueryKey::Members);
        assert_eq!(*seen.borrow(), vec![QueryKey::Coupons, QueryKey::Coupons]);
    }

    #[test]
    fn test_listener_may_reenter_cache() {
        let cache = Rc::new(QueryCache::new());
        let observed = Rc::new(Cell::new(0));
        let (c, o) = (cache.clone(), observed.clone());
        cache.subscribe(move |k| o.set(c.version(k)));

        cache.invalidate(QueryKey::UserProfile("a@b.c".to_string()));
        assert_eq!(observed.get(), 1);
    }
}
