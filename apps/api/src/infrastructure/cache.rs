// In-process TTL caches
// Entries expire after a fixed time-to-live and are invalidated explicitly on writes

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::user::User;

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// Key-value cache whose entries expire `ttl` after insertion
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, Entry<V>>>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Returns a live entry; expired entries read as absent
    pub async fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.inserted_at.elapsed() < self.ttl)
            .map(|entry| entry.value.clone())
    }

    pub async fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.write().await;
        let ttl = self.ttl;
        entries.retain(|_, entry| entry.inserted_at.elapsed() < ttl);
        entries.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    pub async fn remove(&self, key: &K) {
        self.entries.write().await.remove(key);
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

/// Users cached by id and by username
pub struct UserCache {
    by_id: TtlCache<Uuid, User>,
    by_username: TtlCache<String, User>,
}

impl UserCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            by_id: TtlCache::new(ttl),
            by_username: TtlCache::new(ttl),
        }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Option<User> {
        self.by_id.get(&id).await
    }

    pub async fn get_by_username(&self, username: &str) -> Option<User> {
        self.by_username.get(&username.to_string()).await
    }

    pub async fn put(&self, user: &User) {
        self.by_id.insert(user.id, user.clone()).await;
        self.by_username
            .insert(user.username.clone(), user.clone())
            .await;
    }

    /// Drops both entries for `user`
    pub async fn invalidate(&self, user: &User) {
        self.by_id.remove(&user.id).await;
        self.by_username.remove(&user.username).await;
    }

    pub async fn clear(&self) {
        self.by_id.clear().await;
        self.by_username.clear().await;
    }
}
