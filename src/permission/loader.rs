//! Permission-loading collaborator.
//!
//! The pipeline only needs "permission strings for subject X". Where they come
//! from (database rows, a directory service) is behind [`PermissionLoader`].
//! The bundled [`StaticPermissionLoader`] serves them from config.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use async_trait::async_trait;

use crate::error::LoadError;
use crate::observability::metrics;

#[async_trait]
pub trait PermissionLoader: Send + Sync {
    /// Raw permission strings granted to `subject`.
    async fn load_permissions(&self, subject: &str) -> Result<Vec<String>, LoadError>;
}

/// Run the loader under a deadline.
///
/// The only potentially slow step in the chain. Dropping the returned future
/// (client went away) cancels the lookup as well.
pub async fn load_with_deadline(
    loader: &dyn PermissionLoader,
    subject: &str,
    deadline: Duration,
) -> Result<Vec<String>, LoadError> {
    let start = Instant::now();
    let result = match tokio::time::timeout(deadline, loader.load_permissions(subject)).await {
        Ok(result) => result,
        Err(_) => Err(LoadError::Timeout(deadline)),
    };
    metrics::record_permission_load(start);
    result
}

/// Config-backed table. Unknown subjects hold no permissions.
#[derive(Debug, Default)]
pub struct StaticPermissionLoader {
    table: ArcSwap<HashMap<String, Vec<String>>>,
}

impl StaticPermissionLoader {
    pub fn new(table: HashMap<String, Vec<String>>) -> Self {
        Self {
            table: ArcSwap::from_pointee(table),
        }
    }

    /// Swap in a reloaded table.
    pub fn replace(&self, table: HashMap<String, Vec<String>>) {
        self.table.store(Arc::new(table));
    }
}

#[async_trait]
impl PermissionLoader for StaticPermissionLoader {
    async fn load_permissions(&self, subject: &str) -> Result<Vec<String>, LoadError> {
        Ok(self.table.load().get(subject).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowLoader;

    #[async_trait]
    impl PermissionLoader for SlowLoader {
        async fn load_permissions(&self, _subject: &str) -> Result<Vec<String>, LoadError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(vec!["never:gets:here".into()])
        }
    }

    #[tokio::test]
    async fn test_static_loader() {
        let loader = StaticPermissionLoader::new(HashMap::from([(
            "42".to_string(),
            vec!["system:user:list".to_string()],
        )]));

        assert_eq!(
            loader.load_permissions("42").await.unwrap(),
            vec!["system:user:list"]
        );
        assert!(loader.load_permissions("unknown").await.unwrap().is_empty());

        loader.replace(HashMap::new());
        assert!(loader.load_permissions("42").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deadline_is_enforced() {
        let err = load_with_deadline(&SlowLoader, "1", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Timeout(d) if d == Duration::from_millis(50)));
    }
}
