use thiserror::Error;

use crate::encoder::ImageError;
use crate::item::{DocumentError, ItemId};
use crate::validation::ValidationError;

/// Errors surfaced by catalog operations.
///
/// A failed write never leaves a partial record behind: validation and
/// encoding happen before the store is touched.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid item: {0}")]
    Validation(#[from] ValidationError),
    #[error("image could not be encoded: {0}")]
    ImageDecode(#[from] ImageError),
    #[error("item {0} not found")]
    NotFound(ItemId),
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("stored item {id} is malformed: {source}")]
    Malformed {
        id: ItemId,
        #[source]
        source: DocumentError,
    },
}

impl CatalogError {
    pub(crate) fn unavailable(err: impl std::error::Error) -> Self {
        CatalogError::StoreUnavailable(err.to_string())
    }
}
