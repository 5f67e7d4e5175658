//! Document store access
//!
//! The gateway never talks to a database driver directly. Every store
//! round-trip goes through [`DocumentStore`], which has a MongoDB backend for
//! production and an in-memory backend for development mode and tests.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use bson::{oid::ObjectId, Bson, Document};

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Classification of a store failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// The store could not be reached (network, server selection, pool reset)
    Unavailable,
    /// The store refused the operation (write error, command error, bad document)
    Rejected,
    /// Anything else
    Internal,
}

/// Error returned by a [`DocumentStore`] backend
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct StoreError {
    kind: StoreErrorKind,
    message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Unavailable, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Rejected, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Internal, message)
    }

    pub fn kind(&self) -> StoreErrorKind {
        self.kind
    }

    /// Whether repeating the same request could succeed
    pub fn is_retryable(&self) -> bool {
        self.kind == StoreErrorKind::Unavailable
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Outcome of a partial update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

/// Single-document operations over named collections.
///
/// Each call is one store round-trip. Backends provide single-document
/// atomicity and nothing more.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;

    /// Check that the store is reachable
    async fn ping(&self) -> StoreResult<()>;

    /// All documents of a collection, in natural order
    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>>;

    /// The document whose `_id` equals `id`
    async fn find_by_id(&self, collection: &str, id: ObjectId) -> StoreResult<Option<Document>>;

    /// The first document whose string field `field` equals `value`
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StoreResult<Option<Document>>;

    /// Insert a document, assigning an ObjectId `_id` when absent.
    /// Returns the stored `_id`.
    async fn insert_one(&self, collection: &str, doc: Document) -> StoreResult<Bson>;

    /// Merge `fields` into the document with `_id == id` (`$set` semantics)
    async fn update_by_id(
        &self,
        collection: &str,
        id: ObjectId,
        fields: Document,
    ) -> StoreResult<UpdateOutcome>;

    /// Remove the document with `_id == id`; returns the number removed
    async fn delete_by_id(&self, collection: &str, id: ObjectId) -> StoreResult<u64>;
}
