//! Request dispatcher for `/api/:resource/:id?`
//!
//! | Method | id | Action |
//! |--------|----|--------|
//! | GET    | no | list the collection |
//! | GET    | yes | fetch one document |
//! | POST   | ignored | insert the body |
//! | PUT    | yes | `$set` the body into the document |
//! | DELETE | yes | remove the document |
//!
//! Anything else is an unmatched route. Each request makes at most one store
//! call; store failures become a 500 naming the interrupted operation.

use hyper::{Method, StatusCode};
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::auth::Principal;
use crate::envelope::Envelope;
use crate::resource::ResourceResolver;
use crate::types::{body_to_document, bson_to_json, document_to_json, GatewayError, Operation};

/// One request to the resource API, as seen after routing and the auth gate
#[derive(Debug, Clone, Copy)]
pub struct ApiRequest<'a> {
    pub method: &'a Method,
    pub resource: &'a str,
    pub id: Option<&'a str>,
    pub body: &'a [u8],
    pub principal: Option<&'a Principal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    List,
    Fetch,
    Insert,
    Update,
    Delete,
}

impl Action {
    fn select(method: &Method, has_id: bool) -> Option<Self> {
        match (method, has_id) {
            (&Method::GET, false) => Some(Self::List),
            (&Method::GET, true) => Some(Self::Fetch),
            (&Method::POST, _) => Some(Self::Insert),
            (&Method::PUT, true) => Some(Self::Update),
            (&Method::DELETE, true) => Some(Self::Delete),
            _ => None,
        }
    }

    fn operation(self) -> Operation {
        match self {
            Self::List | Self::Fetch => Operation::Retrieve,
            Self::Insert => Operation::Add,
            Self::Update => Operation::Update,
            Self::Delete => Operation::Delete,
        }
    }
}

/// Maps API requests onto document-store operations
#[derive(Clone)]
pub struct Dispatcher {
    resolver: ResourceResolver,
}

impl Dispatcher {
    pub fn new(resolver: ResourceResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &ResourceResolver {
        &self.resolver
    }

    /// Run one request to completion. Never fails: errors become envelopes.
    pub async fn dispatch(&self, req: ApiRequest<'_>) -> Envelope {
        match self.try_dispatch(req).await {
            Ok(envelope) => envelope,
            Err(err) => {
                match &err {
                    GatewayError::Store { operation, source } => error!(
                        resource = %req.resource,
                        operation = operation.verb(),
                        retryable = source.is_retryable(),
                        kind = ?source.kind(),
                        "Store operation failed: {}",
                        source
                    ),
                    other => debug!(resource = %req.resource, "Request rejected: {}", other),
                }
                err.into()
            }
        }
    }

    async fn try_dispatch(&self, req: ApiRequest<'_>) -> Result<Envelope, GatewayError> {
        let action = Action::select(req.method, req.id.is_some()).ok_or(GatewayError::RouteNotFound)?;

        // POST creates; a trailing id segment plays no part
        let raw_id = if action == Action::Insert { None } else { req.id };
        let (collection, id) = self.resolver.resolve(req.resource, raw_id)?;
        let label = collection.label().to_string();
        let store_err = |e| GatewayError::store(action.operation(), e);

        debug!(
            resource = %collection.name(),
            action = ?action,
            user = req.principal.map(|p| p.username.as_str()).unwrap_or("-"),
            "Dispatching"
        );

        match (action, id) {
            (Action::List, _) => {
                let docs = collection.find_all().await.map_err(store_err)?;
                Ok(Envelope::ok(Value::Array(
                    docs.iter().map(document_to_json).collect(),
                )))
            }

            (Action::Fetch, Some(id)) => match collection.find_by_id(id).await.map_err(store_err)? {
                Some(doc) => Ok(Envelope::ok(document_to_json(&doc))),
                None => Err(GatewayError::NotFound(label)),
            },

            (Action::Insert, _) => {
                let doc = body_to_document(req.body)?;
                let inserted_id = collection.insert_one(doc.clone()).await.map_err(store_err)?;

                let mut data = document_to_json(&doc);
                data["_id"] = bson_to_json(&inserted_id);
                Ok(Envelope::created(json!({
                    "message": format!("{} added", label),
                    "data": data,
                })))
            }

            (Action::Update, Some(id)) => {
                let fields = body_to_document(req.body)?;
                let outcome = collection.update_by_id(id, fields).await.map_err(store_err)?;
                if outcome.matched == 0 {
                    return Err(GatewayError::NotFound(label));
                }
                Ok(Envelope::message(
                    StatusCode::OK,
                    format!("{} updated successfully", label),
                ))
            }

            (Action::Delete, Some(id)) => {
                let deleted = collection.delete_by_id(id).await.map_err(store_err)?;
                if deleted == 0 {
                    return Err(GatewayError::NotFound(label));
                }
                Ok(Envelope::message(
                    StatusCode::OK,
                    format!("{} deleted successfully", label),
                ))
            }

            // Fetch/Update/Delete are only selected with an id present
            (action, None) => {
                warn!(action = ?action, "Action selected without an id");
                Err(GatewayError::RouteNotFound)
            }
        }
    }
}
