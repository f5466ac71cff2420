use std::sync::Arc;

use mongodb::Client as MongoClient;

use crate::config::Config;

pub mod catalog;
pub mod error;
pub mod grading;
pub mod progress_service;
pub mod store;

use catalog::{CourseCatalog, MongoCourseCatalog};
use store::{EnrollmentStore, MongoEnrollmentStore};

/// Shared application state. The catalog and the store sit behind traits so
/// tests can run against in-memory implementations with no live MongoDB.
pub struct AppState {
    pub config: Config,
    pub catalog: Arc<dyn CourseCatalog>,
    pub store: Arc<dyn EnrollmentStore>,
}

impl AppState {
    pub fn new(
        config: Config,
        catalog: Arc<dyn CourseCatalog>,
        store: Arc<dyn EnrollmentStore>,
    ) -> Self {
        Self {
            config,
            catalog,
            store,
        }
    }

    /// Production wiring: both trait objects backed by the configured
    /// MongoDB database, with indexes ensured up front.
    pub async fn with_mongo(config: Config, mongo_client: MongoClient) -> anyhow::Result<Self> {
        let db = mongo_client.database(&config.mongo_database);

        let catalog = MongoCourseCatalog::new(db.clone());
        catalog.ensure_indexes().await?;

        let store = MongoEnrollmentStore::new(db);
        store.ensure_indexes().await?;

        tracing::info!("MongoDB collections ready (database: {})", config.mongo_database);

        Ok(Self {
            config,
            catalog: Arc::new(catalog),
            store: Arc::new(store),
        })
    }
}
