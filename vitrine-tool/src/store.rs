use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;
use vitrine_catalog::{CatalogConfig, CatalogGateway};
use vitrine_fjall::FjallStore;

use crate::error::VitError;

pub struct AppContext {
    pub store: Arc<FjallStore>,
    pub gateway: CatalogGateway<FjallStore>,
    pub catalog: CatalogConfig,
}

impl AppContext {
    pub fn open(store_path: PathBuf, catalog: CatalogConfig) -> Result<Self, VitError> {
        std::fs::create_dir_all(&store_path)?;
        debug!(path = %store_path.display(), collection = %catalog.collection, "opening store");

        let store = Arc::new(FjallStore::open(&store_path)?);
        let gateway = CatalogGateway::from_config(Arc::clone(&store), &catalog);

        Ok(Self {
            store,
            gateway,
            catalog,
        })
    }
}

pub fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vitrine")
        .join("store")
}
