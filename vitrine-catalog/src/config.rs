use serde::{Deserialize, Serialize};

use crate::encoder::ImageConfig;

pub const DEFAULT_COLLECTION: &str = "joias";
pub const DEFAULT_PAGE_SIZE: usize = 8;

/// Catalog settings, as read from the `[catalog]` table of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Store collection holding the items.
    pub collection: String,
    /// Items per page in the projected view.
    pub page_size: usize,
    pub image: ImageConfig,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            collection: DEFAULT_COLLECTION.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            image: ImageConfig::default(),
        }
    }
}
