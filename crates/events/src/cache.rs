//! Memoized audience and subscription lookups.
//!
//! Entries stay valid until [`AudienceCache::reset`]; there is no TTL and no
//! invalidation on writes to the underlying tables. The portal calls
//! `reset` when contest data is re-initialized.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use xsuportal_db::models::contestant::Recipient;
use xsuportal_db::models::push_subscription::PushSubscription;

use crate::audience::AudienceScope;

/// Shared cache for audience queries and per-contestant subscriptions.
///
/// Thread-safe via interior `RwLock`s; designed to be wrapped in `Arc` and
/// shared between request handlers and dispatch workers.
pub struct AudienceCache {
    enabled: bool,
    audiences: RwLock<HashMap<AudienceScope, Arc<[Recipient]>>>,
    subscriptions: RwLock<HashMap<String, Arc<[PushSubscription]>>>,
}

impl AudienceCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::with_enabled(true)
    }

    /// A cache that never stores anything, so every lookup hits the store.
    pub fn disabled() -> Self {
        Self::with_enabled(false)
    }

    pub fn with_enabled(enabled: bool) -> Self {
        Self {
            enabled,
            audiences: RwLock::new(HashMap::new()),
            subscriptions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get_audience(&self, scope: AudienceScope) -> Option<Arc<[Recipient]>> {
        self.audiences.read().await.get(&scope).cloned()
    }

    pub async fn put_audience(&self, scope: AudienceScope, recipients: Arc<[Recipient]>) {
        if self.enabled {
            self.audiences.write().await.insert(scope, recipients);
        }
    }

    pub async fn get_subscriptions(&self, contestant_id: &str) -> Option<Arc<[PushSubscription]>> {
        self.subscriptions.read().await.get(contestant_id).cloned()
    }

    pub async fn put_subscriptions(&self, contestant_id: &str, subs: Arc<[PushSubscription]>) {
        if self.enabled {
            self.subscriptions
                .write()
                .await
                .insert(contestant_id.to_string(), subs);
        }
    }

    /// Drop every cached audience and subscription list.
    ///
    /// Both write locks are held together, so no reader sees one map cleared
    /// and the other not.
    pub async fn reset(&self) {
        let mut audiences = self.audiences.write().await;
        let mut subscriptions = self.subscriptions.write().await;
        audiences.clear();
        subscriptions.clear();
        tracing::debug!("Notifier caches reset");
    }
}

impl Default for AudienceCache {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
