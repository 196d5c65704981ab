use std::{
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    database::DatabaseHandle,
    lookup::{self, LookupClient},
    probe::{self, DiagnosticsReport, EnvPresence},
    types::{AnswerResult, Message},
    utils::truncate,
};

/// Characters of an upstream error echoed back to the caller.
const MAX_LOOKUP_ERROR_CHARS: usize = 200;

/// Dependencies shared by the handlers. Both are read-only.
#[derive(Clone)]
pub struct Deps {
    database: Arc<DatabaseHandle>,
    lookup: Arc<LookupClient>,
}

impl Deps {
    pub fn new(database: Arc<DatabaseHandle>, lookup: Arc<LookupClient>) -> Self {
        Self { database, lookup }
    }
}

/// Errors a handler can answer with. Rendered as `{"detail": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing query parameter 'q'")]
    MissingQuery,
    #[error("Lookup failed: {0}")]
    LookupFailed(String),
}

impl From<lookup::Error> for ApiError {
    fn from(e: lookup::Error) -> Self {
        Self::LookupFailed(truncate(&e.to_string(), MAX_LOOKUP_ERROR_CHARS))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::MissingQuery => StatusCode::BAD_REQUEST,
            Self::LookupFailed(_) => StatusCode::BAD_GATEWAY,
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(greeting::read_root, greeting::hello, diagnostics::test_database, answer::instant_answer),
    components(schemas(Message, DiagnosticsReport, AnswerResult))
)]
pub struct HttpServer {
    port: u16,
    deps: Deps,
}

impl HttpServer {
    pub fn new(port: u16, deps: Deps) -> Self {
        Self { port, deps }
    }

    pub async fn serve(&self, token: CancellationToken) -> crate::types::Result<()> {
        let app = router(self.deps.clone());

        let address = SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port));
        let listener = TcpListener::bind(&address).await?;

        tracing::info!("🚀 Listening on {}", listener.local_addr()?);
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await
            .map_err(Into::into)
    }
}

/// Builds the application: every route, the docs and the permissive CORS policy.
pub fn router(deps: Deps) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", HttpServer::openapi()))
        .merge(greeting::routes())
        .merge(diagnostics::routes().with_state(deps.clone()))
        .merge(answer::routes().with_state(deps))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
}

mod greeting {
    use super::*;

    pub fn routes() -> Router {
        Router::new().route("/", get(read_root)).route("/api/hello", get(hello))
    }

    /// Root greeting.
    #[utoipa::path(get, path = "/", responses((status = 200, description = "Ok", body = Message)))]
    pub async fn read_root() -> Json<Message> {
        Json(Message::new("Hello from FastAPI Backend!"))
    }

    /// API greeting.
    #[utoipa::path(get, path = "/api/hello",
        responses((status = 200, description = "Ok", body = Message)))]
    pub async fn hello() -> Json<Message> {
        Json(Message::new("Hello from the backend API!"))
    }
}

mod diagnostics {
    use super::*;

    pub fn routes() -> Router<Deps> {
        Router::new().route("/test", get(test_database))
    }

    /// Report whether the database is available and reachable. Always succeeds, problems are
    /// described in the report.
    #[utoipa::path(get, path = "/test",
        responses((status = 200, description = "Ok", body = DiagnosticsReport)))]
    pub async fn test_database(State(deps): State<Deps>) -> Json<DiagnosticsReport> {
        let outcome = probe::probe(&deps.database).await;
        Json(DiagnosticsReport::new(outcome, EnvPresence::from_env()))
    }
}

mod answer {
    use super::*;

    pub fn routes() -> Router<Deps> {
        Router::new().route("/api/answer", get(instant_answer))
    }

    /// Value of `q`. The last one wins when the parameter is repeated.
    fn query_param(pairs: Vec<(String, String)>) -> Option<String> {
        pairs.into_iter().rev().find(|(key, _)| key == "q").map(|(_, value)| value)
    }

    /// Fetch a quick answer from the instant-answer service.
    #[utoipa::path(get, path = "/api/answer",
        params(("q" = String, Query, description = "Free-text question")),
        responses(
            (status = 200, description = "Ok", body = AnswerResult),
            (status = 400, description = "Missing query"),
            (status = 502, description = "Lookup failed")))]
    pub async fn instant_answer(
        State(deps): State<Deps>,
        query: Option<Query<Vec<(String, String)>>>,
    ) -> Result<Json<AnswerResult>, ApiError> {
        let q = query
            .and_then(|Query(pairs)| query_param(pairs))
            .filter(|q| !q.trim().is_empty())
            .ok_or(ApiError::MissingQuery)?;

        deps.lookup.answer(&q).await.map(Json).map_err(|e| {
            tracing::warn!("⚠️ Lookup for \"{q}\" failed: {e}");
            e.into()
        })
    }
}
