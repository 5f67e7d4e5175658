//! MongoDB document store
//!
//! Pattern adapted from holo-host/rust/util_libs/db/src/mongodb

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson, Document};
use futures_util::TryStreamExt;
use mongodb::{error::ErrorKind, options::IndexOptions, Client, Collection, IndexModel};
use tracing::info;

use super::{DocumentStore, StoreError, StoreResult, UpdateOutcome};

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        let message = err.to_string();
        match err.kind.as_ref() {
            ErrorKind::ServerSelection { .. }
            | ErrorKind::Io(_)
            | ErrorKind::ConnectionPoolCleared { .. } => StoreError::unavailable(message),
            ErrorKind::Write(_) | ErrorKind::Command(_) | ErrorKind::InvalidArgument { .. } => {
                StoreError::rejected(message)
            }
            _ => StoreError::internal(message),
        }
    }
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db_name: String,
}

impl MongoStore {
    /// Connect and verify the connection with a ping.
    ///
    /// Returns only once the server answered, so callers can gate traffic on it.
    pub async fn connect(uri: &str, db_name: &str) -> StoreResult<Self> {
        info!("Connecting to MongoDB at {}", uri);

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri).await?;

        let store = Self {
            client,
            db_name: db_name.to_string(),
        };
        store.ping().await?;

        info!("Connected to MongoDB database '{}'", db_name);
        Ok(store)
    }

    /// Create a unique ascending index on `field`
    pub async fn ensure_unique_index(&self, collection: &str, field: &str) -> StoreResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { field: 1 })
            .options(
                IndexOptions::builder()
                    .unique(true)
                    .name(format!("{}_unique", field))
                    .build(),
            )
            .build();

        self.collection(collection).create_index(index).await?;
        Ok(())
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.client.database(&self.db_name).collection::<Document>(name)
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    fn backend(&self) -> &'static str {
        "mongodb"
    }

    async fn ping(&self) -> StoreResult<()> {
        self.client
            .database(&self.db_name)
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let cursor = self.collection(collection).find(doc! {}).await?;
        let docs: Vec<Document> = cursor.try_collect().await?;
        Ok(docs)
    }

    async fn find_by_id(&self, collection: &str, id: ObjectId) -> StoreResult<Option<Document>> {
        Ok(self.collection(collection).find_one(doc! { "_id": id }).await?)
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StoreResult<Option<Document>> {
        Ok(self
            .collection(collection)
            .find_one(doc! { field: value })
            .await?)
    }

    async fn insert_one(&self, collection: &str, doc: Document) -> StoreResult<Bson> {
        let result = self.collection(collection).insert_one(doc).await?;
        Ok(result.inserted_id)
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: ObjectId,
        fields: Document,
    ) -> StoreResult<UpdateOutcome> {
        let result = self
            .collection(collection)
            .update_one(doc! { "_id": id }, doc! { "$set": fields })
            .await?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn delete_by_id(&self, collection: &str, id: ObjectId) -> StoreResult<u64> {
        let result = self
            .collection(collection)
            .delete_one(doc! { "_id": id })
            .await?;
        Ok(result.deleted_count)
    }
}
