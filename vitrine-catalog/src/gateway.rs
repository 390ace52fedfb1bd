use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use vitrine_core::{AsyncDocumentStore, Record};

use crate::config::CatalogConfig;
use crate::encoder::ImageEncoder;
use crate::error::CatalogError;
use crate::item::{Item, ItemDraft, ItemId};

/// Write path of the catalog: validation, image encoding and store writes.
///
/// Writes show up in any [`LiveCatalogFeed`](crate::LiveCatalogFeed) on the
/// same collection through the store's own change stream; a returned item
/// says nothing about whether a feed has caught up yet.
pub struct CatalogGateway<S> {
    store: Arc<S>,
    collection: String,
    encoder: ImageEncoder,
}

impl<S> Clone for CatalogGateway<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            collection: self.collection.clone(),
            encoder: self.encoder.clone(),
        }
    }
}

impl<S: AsyncDocumentStore> CatalogGateway<S> {
    pub fn new(store: Arc<S>, collection: impl Into<String>, encoder: ImageEncoder) -> Self {
        Self {
            store,
            collection: collection.into(),
            encoder,
        }
    }

    pub fn from_config(store: Arc<S>, config: &CatalogConfig) -> Self {
        Self::new(store, config.collection.clone(), ImageEncoder::new(config.image))
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Validates the draft, encodes the image and writes a new item.
    #[instrument(skip(self, raw_image, draft), fields(collection = %self.collection))]
    pub async fn create(
        &self,
        raw_image: Option<Vec<u8>>,
        draft: &ItemDraft,
    ) -> Result<Item, CatalogError> {
        let valid = draft.validate_for_create(raw_image.as_deref())?;
        // Presence was checked by the gate.
        let image = self
            .encoder
            .encode_async(raw_image.unwrap_or_default())
            .await?;
        debug!(encoded_len = image.len(), "image encoded");

        let id = self
            .store
            .async_create(&self.collection, valid.to_fields(&image))
            .await
            .map_err(CatalogError::unavailable)?;

        info!(%id, "item created");
        Ok(valid.into_item(id, image))
    }

    /// Replaces an item with the draft's state.
    ///
    /// Without a new image the stored one is kept.
    #[instrument(skip(self, draft, raw_image), fields(collection = %self.collection))]
    pub async fn update(
        &self,
        id: &ItemId,
        draft: &ItemDraft,
        raw_image: Option<Vec<u8>>,
    ) -> Result<Item, CatalogError> {
        let valid = draft.validate_for_update()?;

        let image = match raw_image {
            Some(raw) => self.encoder.encode_async(raw).await?,
            None => self.get(id).await?.image,
        };

        let replaced = self
            .store
            .async_update(&self.collection, id, valid.to_fields(&image))
            .await
            .map_err(CatalogError::unavailable)?;
        if !replaced {
            return Err(CatalogError::NotFound(id.clone()));
        }

        info!(%id, "item updated");
        Ok(valid.into_item(id.clone(), image))
    }

    /// Deletes an item. Deleting an unknown id is an error.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn delete(&self, id: &ItemId) -> Result<(), CatalogError> {
        let removed = self
            .store
            .async_delete(&self.collection, id)
            .await
            .map_err(CatalogError::unavailable)?;
        if !removed {
            return Err(CatalogError::NotFound(id.clone()));
        }
        info!(%id, "item deleted");
        Ok(())
    }

    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn get(&self, id: &ItemId) -> Result<Item, CatalogError> {
        let record = self
            .store
            .async_get(&self.collection, id)
            .await
            .map_err(CatalogError::unavailable)?
            .ok_or_else(|| CatalogError::NotFound(id.clone()))?;

        Item::from_record(record).map_err(|source| CatalogError::Malformed {
            id: id.clone(),
            source,
        })
    }

    /// Reads every well-formed item once. Malformed records are skipped.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn list(&self) -> Result<Vec<Item>, CatalogError> {
        let records = self
            .store
            .async_list(&self.collection)
            .await
            .map_err(CatalogError::unavailable)?;
        Ok(materialize(records))
    }
}

/// Decodes records into items, dropping the ones that do not decode.
pub(crate) fn materialize(records: Vec<Record>) -> Vec<Item> {
    records
        .into_iter()
        .filter_map(|record| {
            let id = record.id.clone();
            match Item::from_record(record) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(%id, error = %e, "skipping stored item");
                    None
                }
            }
        })
        .collect()
}

impl<S> std::fmt::Debug for CatalogGateway<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogGateway")
            .field("collection", &self.collection)
            .field("encoder", &self.encoder)
            .finish_non_exhaustive()
    }
}
