//! In-memory document store
//!
//! Used when running in development mode without MongoDB, and by tests.
//! Collections are created on first write, like MongoDB does.

use async_trait::async_trait;
use bson::{oid::ObjectId, Bson, Document};
use dashmap::DashMap;

use super::{DocumentStore, StoreError, StoreResult, UpdateOutcome};

/// Collections held in process memory, keyed by name
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: DashMap<String, Vec<Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection
    pub fn len(&self, collection: &str) -> usize {
        self.collections.get(collection).map(|c| c.len()).unwrap_or(0)
    }
}

fn has_id(doc: &Document, id: &ObjectId) -> bool {
    matches!(doc.get("_id"), Some(Bson::ObjectId(oid)) if oid == id)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        Ok(self
            .collections
            .get(collection)
            .map(|c| c.value().clone())
            .unwrap_or_default())
    }

    async fn find_by_id(&self, collection: &str, id: ObjectId) -> StoreResult<Option<Document>> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|c| c.iter().find(|d| has_id(d, &id)).cloned()))
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StoreResult<Option<Document>> {
        Ok(self.collections.get(collection).and_then(|c| {
            c.iter()
                .find(|d| matches!(d.get(field), Some(Bson::String(s)) if s == value))
                .cloned()
        }))
    }

    async fn insert_one(&self, collection: &str, mut doc: Document) -> StoreResult<Bson> {
        let id = match doc.get("_id") {
            Some(id) => id.clone(),
            None => {
                let id = Bson::ObjectId(ObjectId::new());
                doc.insert("_id", id.clone());
                id
            }
        };

        let mut docs = self.collections.entry(collection.to_string()).or_default();
        if docs.iter().any(|d| d.get("_id") == Some(&id)) {
            return Err(StoreError::rejected(format!(
                "E11000 duplicate key error collection: {} dup key: {{ _id: {} }}",
                collection, id
            )));
        }

        // _id goes first, as MongoDB stores it
        let mut stored = Document::new();
        stored.insert("_id", id.clone());
        for (key, value) in doc {
            if key != "_id" {
                stored.insert(key, value);
            }
        }
        docs.push(stored);

        Ok(id)
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: ObjectId,
        fields: Document,
    ) -> StoreResult<UpdateOutcome> {
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(UpdateOutcome::default());
        };
        let Some(target) = docs.iter_mut().find(|d| has_id(d, &id)) else {
            return Ok(UpdateOutcome::default());
        };

        if let Some(new_id) = fields.get("_id") {
            if new_id != &Bson::ObjectId(id) {
                return Err(StoreError::rejected(
                    "Performing an update on the path '_id' would modify the immutable field '_id'",
                ));
            }
        }

        let mut modified = false;
        for (key, value) in fields {
            if target.get(&key) != Some(&value) {
                target.insert(key, value);
                modified = true;
            }
        }

        Ok(UpdateOutcome {
            matched: 1,
            modified: u64::from(modified),
        })
    }

    async fn delete_by_id(&self, collection: &str, id: ObjectId) -> StoreResult<u64> {
        let Some(mut docs) = self.collections.get_mut(collection) else {
            return Ok(0);
        };
        match docs.iter().position(|d| has_id(d, &id)) {
            Some(index) => {
                docs.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
