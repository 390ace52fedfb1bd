//! Vitrine core: the document-store layer the catalog is built on.
//!
//! Core concepts:
//! - **Record**: a JSON object of fields stored under an opaque [`RecordId`]
//! - **Collection**: a named set of records
//! - **DocumentStore**: create/read/update/delete/list over collections, plus
//!   a subscribe-to-changes primitive
//! - **Subscription**: a handle yielding full collection snapshots, in the
//!   order the store emits them
//!
//! # Example
//!
//! ```
//! use vitrine_core::{DocumentStore, Fields, MemoryStore};
//!
//! let store = MemoryStore::new();
//!
//! let mut fields = Fields::new();
//! fields.insert("name".into(), "Ring".into());
//! let id = store.create_record("joias", fields).unwrap();
//!
//! let record = store.get_record("joias", &id).unwrap().unwrap();
//! assert_eq!(record.fields["name"], "Ring");
//! ```
//!
//! Stores publish the *whole* collection after every mutation. Subscribers
//! never see incremental patches, so a consumer may drop any snapshot but the
//! newest without losing information.

mod async_store;
mod record;
mod store;
mod subscription;

pub use async_store::AsyncDocumentStore;
pub use record::{Fields, Record, RecordId};
pub use store::{DocumentStore, MemoryError, MemoryStore};
pub use subscription::{ChangeEvent, ChangeHub, Subscription};
