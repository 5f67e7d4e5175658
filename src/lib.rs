//! docgate - generic REST gateway over document-store collections
//!
//! Every collection in the configured database is reachable as a resource:
//!
//! - `GET    /api/:resource`      list the collection
//! - `GET    /api/:resource/:id`  fetch one document
//! - `POST   /api/:resource`      insert the request body
//! - `PUT    /api/:resource/:id`  merge the request body into a document
//! - `DELETE /api/:resource/:id`  remove a document
//!
//! Resource routes sit behind a JWT bearer gate; tokens come from
//! `POST /api/login`.

pub mod auth;
pub mod config;
pub mod dispatch;
pub mod envelope;
pub mod resource;
pub mod routes;
pub mod server;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, serve, AppState};
pub use types::GatewayError;
