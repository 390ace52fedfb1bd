//! Jewelry catalog on top of a Vitrine document store.
//!
//! Two paths share the item model:
//! - **Write path**: an [`ItemDraft`] passes the validation gate, its image
//!   goes through the [`ImageEncoder`], and the [`CatalogGateway`] writes the
//!   record.
//! - **Read path**: a [`LiveCatalogFeed`] mirrors the collection from the
//!   store's change stream and a [`CatalogProjector`] derives the filtered,
//!   paginated view.
//!
//! The two only meet through the store: a write shows up in the feed when the
//! store publishes it, not when the gateway call returns.
//!
//! # Example
//!
//! ```
//! use vitrine_catalog::{CatalogProjector, CategoryFilter, ItemDraft};
//!
//! let draft = ItemDraft::new("Anel solitário", "Prata 925", "R$ 129,90")
//!     .with_category("Anéis")
//!     .with_promotion("R$ 159,90", Some("20% OFF"));
//! let valid = draft.validate_for_update().unwrap();
//! assert_eq!(valid.categories().labels(), vec!["aneis", "Promoção"]);
//!
//! let mut projector = CatalogProjector::default();
//! projector.select(CategoryFilter::parse("aneis").unwrap());
//! assert_eq!(projector.view(&[]).total_pages, 0);
//! ```

mod category;
mod config;
mod encoder;
mod error;
mod feed;
mod gateway;
mod item;
mod price;
mod projector;
mod validation;

pub use category::{Category, CategorySet, UnknownCategory};
pub use config::{CatalogConfig, DEFAULT_COLLECTION, DEFAULT_PAGE_SIZE};
pub use encoder::{EncodedImage, ImageConfig, ImageEncoder, ImageError};
pub use error::CatalogError;
pub use feed::LiveCatalogFeed;
pub use gateway::CatalogGateway;
pub use item::{DEFAULT_PROMOTION_TAG, DocumentError, Item, ItemDraft, ItemId, Promotion};
pub use price::Price;
pub use projector::{
    CatalogProjector, CatalogView, CategoryFilter, PageState, categories, search, total_pages,
};
pub use validation::{Field, ValidDraft, ValidationError, Violation};
