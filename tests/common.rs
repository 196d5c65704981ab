use std::{sync::Arc, time::Duration};

use answer_backend::{
    database::{DatabaseHandle, DocumentStore},
    http::{router, Deps},
    lookup::LookupClient,
    types::Result,
};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

/// In-memory stand-in for the document database.
pub struct FakeStore {
    pub collections: Vec<String>,
    pub error: Option<String>,
}

impl FakeStore {
    pub fn with_collections(n: usize) -> Self {
        Self { collections: (0..n).map(|i| format!("collection_{i}")).collect(), error: None }
    }

    pub fn failing(error: &str) -> Self {
        Self { collections: vec![], error: Some(error.to_owned()) }
    }
}

#[async_trait]
impl DocumentStore for FakeStore {
    fn name(&self) -> &str {
        "fake"
    }

    async fn list_collection_names(&self) -> Result<Vec<String>> {
        match &self.error {
            Some(e) => Err(e.clone().into()),
            None => Ok(self.collections.clone()),
        }
    }
}

pub fn app(database: DatabaseHandle, lookup_url: &str) -> Router {
    app_with_timeout(database, lookup_url, Duration::from_secs(8))
}

pub fn app_with_timeout(database: DatabaseHandle, lookup_url: &str, timeout: Duration) -> Router {
    let lookup = LookupClient::with_timeout(lookup_url, timeout).unwrap();
    router(Deps::new(Arc::new(database), Arc::new(lookup)))
}

/// Sends `GET uri` through the router and decodes the JSON body.
pub async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}
