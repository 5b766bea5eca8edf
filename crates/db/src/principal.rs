use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Display metadata for a user or service account. Stores only carry
/// principal ids; callers that render results attach this info through
/// the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalInfo {
    pub id: i64,
    pub uid: String,
    pub display_name: String,
    pub email: String,
}

/// Source of principal info, implemented outside this crate (identity
/// service, fixture data in tests).
#[async_trait::async_trait]
pub trait PrincipalInfoProvider: Send + Sync {
    async fn fetch(&self, id: i64) -> anyhow::Result<Option<PrincipalInfo>>;
}

/// Read-mostly cache in front of a [`PrincipalInfoProvider`].
///
/// Misses are fetched once and memoized; entries are never evicted for
/// the lifetime of the handle. Cloning shares the underlying map.
#[derive(Clone)]
pub struct PrincipalInfoCache {
    provider: Arc<dyn PrincipalInfoProvider>,
    cache: Arc<RwLock<HashMap<i64, PrincipalInfo>>>,
}

impl PrincipalInfoCache {
    pub fn new(provider: Arc<dyn PrincipalInfoProvider>) -> Self {
        Self {
            provider,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn get(&self, id: i64) -> anyhow::Result<Option<PrincipalInfo>> {
        if let Some(info) = self.cache.read().await.get(&id) {
            return Ok(Some(info.clone()));
        }
        let Some(info) = self.provider.fetch(id).await? else {
            return Ok(None);
        };
        self.cache.write().await.insert(id, info.clone());
        Ok(Some(info))
    }

    /// Batch lookup; ids that cannot be resolved are absent from the
    /// returned map.
    pub async fn map(&self, ids: &[i64]) -> anyhow::Result<HashMap<i64, PrincipalInfo>> {
        let mut result = HashMap::with_capacity(ids.len());
        for &id in ids {
            if result.contains_key(&id) {
                continue;
            }
            if let Some(info) = self.get(id).await? {
                result.insert(id, info);
            }
        }
        Ok(result)
    }
}

/// Best-effort single lookup: provider failures are logged and turned
/// into `None` so enrichment never fails a read.
pub(crate) async fn lookup_info(cache: &PrincipalInfoCache, id: i64) -> Option<PrincipalInfo> {
    match cache.get(id).await {
        Ok(info) => info,
        Err(err) => {
            tracing::warn!("failed to load principal info for {id}: {err}");
            None
        }
    }
}

/// Best-effort batch lookup used when mapping row slices.
pub(crate) async fn lookup_map(
    cache: &PrincipalInfoCache,
    ids: &[i64],
) -> HashMap<i64, PrincipalInfo> {
    match cache.map(ids).await {
        Ok(map) => map,
        Err(err) => {
            tracing::warn!("failed to load principal info batch: {err}");
            HashMap::new()
        }
    }
}
