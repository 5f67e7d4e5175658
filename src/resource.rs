//! Resource resolution
//!
//! Maps the `:resource` and `:id` path segments of `/api/:resource/:id?` to a
//! collection handle and a parsed ObjectId. Resolution is a pure lookup: it
//! never touches the store, so a malformed id is rejected before any
//! round-trip.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bson::{oid::ObjectId, Bson, Document};

use crate::store::{DocumentStore, StoreResult, UpdateOutcome};
use crate::types::GatewayError;

/// A validated collection name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceName(String);

impl ResourceName {
    /// Validate a path segment as a collection name.
    ///
    /// Accepts ASCII letters, digits, `_`, `-` and `.`; rejects empty names,
    /// names starting with `.` or `system.`, and names over 120 bytes.
    pub fn parse(raw: &str) -> Result<Self, GatewayError> {
        let valid = !raw.is_empty()
            && raw.len() <= 120
            && !raw.starts_with('.')
            && !raw.starts_with("system.")
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));

        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(GatewayError::RouteNotFound)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parse an identifier literal into an ObjectId (24 hex characters)
pub fn parse_id(raw: &str) -> Result<ObjectId, GatewayError> {
    ObjectId::parse_str(raw).map_err(|_| GatewayError::InvalidIdentifier(raw.to_string()))
}

/// Naive English singular: the resource name minus its last character.
///
/// `widgets` -> `widget`. Assumes callers use plural resource names; irregular
/// plurals (`people`) need an explicit label.
pub fn singularize(name: &str) -> String {
    let mut chars = name.chars();
    chars.next_back();
    chars.as_str().to_string()
}

/// Which resource names the gateway serves
#[derive(Debug, Clone)]
enum Namespace {
    /// Any valid collection name
    Open,
    /// Only registered names
    Allowlist(HashSet<String>),
}

/// Registration policy and display names for resources
#[derive(Debug, Clone)]
pub struct ResourceRegistry {
    namespace: Namespace,
    labels: HashMap<String, String>,
    reserved: HashSet<String>,
}

impl ResourceRegistry {
    /// Serve every valid collection name
    pub fn open() -> Self {
        Self {
            namespace: Namespace::Open,
            labels: HashMap::new(),
            reserved: HashSet::new(),
        }
    }

    /// Serve only the given collection names
    pub fn allowlist<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            namespace: Namespace::Allowlist(names.into_iter().map(Into::into).collect()),
            labels: HashMap::new(),
            reserved: HashSet::new(),
        }
    }

    /// Override the display name used in messages for a resource
    pub fn with_label(mut self, resource: impl Into<String>, label: impl Into<String>) -> Self {
        self.labels.insert(resource.into(), label.into());
        self
    }

    /// Never serve this collection, whatever the namespace
    pub fn reserve(mut self, resource: impl Into<String>) -> Self {
        self.reserved.insert(resource.into());
        self
    }

    /// Whether a validated name is served
    pub fn is_served(&self, name: &ResourceName) -> bool {
        if self.reserved.contains(name.as_str()) {
            return false;
        }
        match &self.namespace {
            Namespace::Open => true,
            Namespace::Allowlist(names) => names.contains(name.as_str()),
        }
    }

    /// Display name for messages: explicit label, else [`singularize`]
    pub fn label(&self, name: &ResourceName) -> String {
        self.labels
            .get(name.as_str())
            .cloned()
            .unwrap_or_else(|| singularize(name.as_str()))
    }

    /// Registered names, if the namespace is an allowlist
    pub fn registered(&self) -> Option<Vec<&str>> {
        match &self.namespace {
            Namespace::Open => None,
            Namespace::Allowlist(names) => {
                let mut names: Vec<&str> = names.iter().map(String::as_str).collect();
                names.sort_unstable();
                Some(names)
            }
        }
    }
}

/// A store bound to one collection
#[derive(Clone)]
pub struct CollectionHandle {
    store: Arc<dyn DocumentStore>,
    name: ResourceName,
    label: String,
}

impl CollectionHandle {
    pub fn name(&self) -> &ResourceName {
        &self.name
    }

    /// Display name used in response messages
    pub fn label(&self) -> &str {
        &self.label
    }

    pub async fn find_all(&self) -> StoreResult<Vec<Document>> {
        self.store.find_all(self.name.as_str()).await
    }

    pub async fn find_by_id(&self, id: ObjectId) -> StoreResult<Option<Document>> {
        self.store.find_by_id(self.name.as_str(), id).await
    }

    pub async fn insert_one(&self, doc: Document) -> StoreResult<Bson> {
        self.store.insert_one(self.name.as_str(), doc).await
    }

    pub async fn update_by_id(&self, id: ObjectId, fields: Document) -> StoreResult<UpdateOutcome> {
        self.store.update_by_id(self.name.as_str(), id, fields).await
    }

    pub async fn delete_by_id(&self, id: ObjectId) -> StoreResult<u64> {
        self.store.delete_by_id(self.name.as_str(), id).await
    }
}

impl std::fmt::Debug for CollectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionHandle")
            .field("name", &self.name)
            .field("label", &self.label)
            .field("backend", &self.store.backend())
            .finish()
    }
}

/// Resolves path segments against the registry and hands out collection handles
#[derive(Clone)]
pub struct ResourceResolver {
    store: Arc<dyn DocumentStore>,
    registry: ResourceRegistry,
}

impl ResourceResolver {
    pub fn new(store: Arc<dyn DocumentStore>, registry: ResourceRegistry) -> Self {
        Self { store, registry }
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Resolve `resource` and an optional raw id.
    ///
    /// Unknown or invalid names fail with `RouteNotFound`; a present but
    /// malformed id fails with `InvalidIdentifier`.
    pub fn resolve(
        &self,
        resource: &str,
        raw_id: Option<&str>,
    ) -> Result<(CollectionHandle, Option<ObjectId>), GatewayError> {
        let name = ResourceName::parse(resource)?;
        if !self.registry.is_served(&name) {
            return Err(GatewayError::RouteNotFound);
        }

        let id = raw_id.map(parse_id).transpose()?;
        let handle = CollectionHandle {
            store: Arc::clone(&self.store),
            label: self.registry.label(&name),
            name,
        };

        Ok((handle, id))
    }
}
