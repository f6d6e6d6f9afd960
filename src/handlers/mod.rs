pub mod catalog;
pub mod common;

use crate::{
    db::DbPool,
    media::MediaStore,
    services::{CatalogService, CatalogStore},
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services used by HTTP handlers and the importer
#[derive(Clone)]
pub struct AppServices {
    pub catalog: Arc<CatalogService>,
    pub store: Arc<CatalogStore>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, media: Arc<dyn MediaStore>) -> Self {
        Self {
            catalog: Arc::new(CatalogService::new(db_pool.clone())),
            store: Arc::new(CatalogStore::new(db_pool, media)),
        }
    }
}
