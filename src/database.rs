use std::{fmt, sync::Arc};

use async_trait::async_trait;

use crate::{config::Config, types::Result};

/// Document database that exposes named collections.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Name of the database.
    fn name(&self) -> &str;

    /// Names of all collections, in the order the store returns them.
    async fn list_collection_names(&self) -> Result<Vec<String>>;
}

/// Handle to the optional document database. It's acquired once at startup and only read
/// afterwards.
#[derive(Clone)]
pub enum DatabaseHandle {
    /// The database integration isn't compiled in.
    Missing,
    /// The integration is present but there's nothing to connect to.
    Uninitialized,
    /// Acquiring the handle failed.
    Failed(String),
    Ready(Arc<dyn DocumentStore>),
}

impl fmt::Debug for DatabaseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "Missing"),
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Failed(reason) => f.debug_tuple("Failed").field(reason).finish(),
            Self::Ready(store) => f.debug_tuple("Ready").field(&store.name()).finish(),
        }
    }
}

impl DatabaseHandle {
    pub fn ready(store: impl DocumentStore + 'static) -> Self {
        Self::Ready(Arc::new(store))
    }

    /// Acquire the handle described by `config`. Never fails, problems end up in the variant.
    #[cfg(feature = "database")]
    pub async fn acquire(config: &Config) -> Self {
        let Some(url) = &config.database_url else {
            tracing::info!("🗄️ DATABASE_URL is not set, database stays uninitialized");
            return Self::Uninitialized;
        };

        match mongo::MongoStore::connect(url, config.database_name.as_deref()).await {
            Ok(Some(store)) => {
                tracing::info!("🗄️ Using database \"{}\"", store.name());
                Self::ready(store)
            },
            Ok(None) => {
                tracing::warn!("⚠️ No database name configured, database stays uninitialized");
                Self::Uninitialized
            },
            Err(e) => {
                tracing::warn!("⚠️ Failed to acquire database handle: {e}");
                Self::Failed(e.to_string())
            },
        }
    }

    #[cfg(not(feature = "database"))]
    pub async fn acquire(_config: &Config) -> Self {
        tracing::info!("🗄️ Built without database support");
        Self::Missing
    }
}

#[cfg(feature = "database")]
mod mongo {
    use mongodb::{Client, Database};

    use super::*;

    pub struct MongoStore {
        db: Database,
    }

    impl MongoStore {
        /// Builds a client for `uri`. The driver connects lazily, so this only fails on a bad
        /// connection string. Returns `None` when no database name can be determined.
        pub async fn connect(uri: &str, database: Option<&str>) -> Result<Option<Self>> {
            let client = Client::with_uri_str(uri).await?;
            let db = match database {
                Some(name) => Some(client.database(name)),
                None => client.default_database(),
            };
            Ok(db.map(|db| Self { db }))
        }
    }

    #[async_trait]
    impl DocumentStore for MongoStore {
        fn name(&self) -> &str {
            self.db.name()
        }

        async fn list_collection_names(&self) -> Result<Vec<String>> {
            self.db.list_collection_names(None).await.map_err(Into::into)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(database_url: Option<&str>, database_name: Option<&str>) -> Config {
        Config {
            http_port: 8000,
            lookup_url: "http://127.0.0.1:9/".to_owned(),
            database_url: database_url.map(str::to_owned),
            database_name: database_name.map(str::to_owned),
        }
    }

    #[cfg(not(feature = "database"))]
    #[tokio::test]
    async fn missing_without_feature() {
        let handle = DatabaseHandle::acquire(&config(Some("mongodb://localhost"), None)).await;
        assert!(matches!(handle, DatabaseHandle::Missing));
    }

    #[cfg(feature = "database")]
    #[tokio::test]
    async fn uninitialized_without_url() {
        let handle = DatabaseHandle::acquire(&config(None, Some("app"))).await;
        assert!(matches!(handle, DatabaseHandle::Uninitialized));
    }

    #[cfg(feature = "database")]
    #[tokio::test]
    async fn failed_on_bad_connection_string() {
        let handle = DatabaseHandle::acquire(&config(Some("not-a-uri"), Some("app"))).await;
        assert!(matches!(handle, DatabaseHandle::Failed(reason) if !reason.is_empty()));
    }

    #[cfg(feature = "database")]
    #[tokio::test]
    async fn uninitialized_without_database_name() {
        let handle = DatabaseHandle::acquire(&config(Some("mongodb://localhost"), None)).await;
        assert!(matches!(handle, DatabaseHandle::Uninitialized));
    }

    #[cfg(feature = "database")]
    #[tokio::test]
    async fn ready_with_database_name() {
        let handle = DatabaseHandle::acquire(&config(Some("mongodb://localhost"), Some("app"))).await;
        let DatabaseHandle::Ready(store) = handle else { panic!("expected a ready handle") };
        assert_eq!(store.name(), "app");
    }

    #[cfg(feature = "database")]
    #[tokio::test]
    async fn ready_with_default_database_from_url() {
        let handle = DatabaseHandle::acquire(&config(Some("mongodb://localhost/shop"), None)).await;
        let DatabaseHandle::Ready(store) = handle else { panic!("expected a ready handle") };
        assert_eq!(store.name(), "shop");
    }
}
