//! HTTP Module
//!
//! The request router and server over an [`ItemStore`].
//!
//! ## Routes
//! ```text
//! GET    /        list items            200
//! POST   /        create item           201 | 400
//! GET    /{id}    fetch item            200 | 404
//! PUT    /{id}    update item           200 | 404 | 400
//! DELETE /{id}    delete item           204 | 404
//! ```
//!
//! Every route except DELETE honours `?use_protobuf=0|1`, which selects
//! the encoding of both the request body and the response body.

mod error;
mod handlers;
mod middleware;
mod server;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;

use crate::config::Config;
use crate::error::{Result, TodoError};
use crate::store::ItemStore;

pub use error::ApiError;
pub use server::{shutdown_signal, Server};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn ItemStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ItemStore> {
        &self.store
    }

    /// Run a store operation on the blocking pool
    ///
    /// Store calls may fsync, so they stay off the async worker threads.
    pub(crate) async fn run<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&dyn ItemStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .map_err(|e| {
                TodoError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("store task failed: {}", e),
                ))
            })?
    }
}

/// Build the router for the given store
pub fn router(config: &Config, store: Arc<dyn ItemStore>) -> Router {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route(
            "/:id",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(axum::middleware::from_fn(middleware::trace_requests))
        .with_state(AppState::new(store))
}
