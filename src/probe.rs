//! Database probe behind `GET /test`.

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    config::{non_empty_var, DATABASE_NAME, DATABASE_URL},
    database::DatabaseHandle,
    utils::truncate,
};

/// Collections listed in a report at most.
pub const MAX_COLLECTIONS: usize = 10;
/// Characters of an error kept in a report.
pub const MAX_ERROR_CHARS: usize = 50;

/// What probing the database found.
#[derive(Debug, PartialEq)]
pub enum ProbeOutcome {
    ModuleNotFound,
    NotInitialized,
    /// Collections could be listed.
    Connected { name: String, collections: Vec<String> },
    /// A handle exists but listing collections failed.
    ConnectedWithError { name: String, reason: String },
    /// Acquiring the handle failed.
    Failed(String),
}

impl ProbeOutcome {
    fn has_handle(&self) -> bool {
        matches!(self, Self::Connected { .. } | Self::ConnectedWithError { .. })
    }
}

/// Probe `handle`. Errors are captured in the outcome, this never fails.
pub async fn probe(handle: &DatabaseHandle) -> ProbeOutcome {
    let store = match handle {
        DatabaseHandle::Missing => return ProbeOutcome::ModuleNotFound,
        DatabaseHandle::Uninitialized => return ProbeOutcome::NotInitialized,
        DatabaseHandle::Failed(reason) => return ProbeOutcome::Failed(reason.clone()),
        DatabaseHandle::Ready(store) => store,
    };

    let name = store.name().to_owned();
    match store.list_collection_names().await {
        Ok(mut collections) => {
            collections.truncate(MAX_COLLECTIONS);
            ProbeOutcome::Connected { name, collections }
        },
        Err(e) => {
            tracing::warn!("⚠️ Listing collections of \"{name}\" failed: {e}");
            ProbeOutcome::ConnectedWithError { name, reason: e.to_string() }
        },
    }
}

/// Whether the database environment variables are set.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvPresence {
    pub database_url: bool,
    pub database_name: bool,
}

impl EnvPresence {
    pub fn from_env() -> Self {
        Self {
            database_url: non_empty_var(DATABASE_URL).is_some(),
            database_name: non_empty_var(DATABASE_NAME).is_some(),
        }
    }
}

/// Diagnostics report served by `GET /test`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DiagnosticsReport {
    pub backend: String,
    pub database: String,
    pub database_url: String,
    pub database_name: String,
    pub connection_status: String,
    pub collections: Vec<String>,
}

impl DiagnosticsReport {
    pub fn new(outcome: ProbeOutcome, env: EnvPresence) -> Self {
        let connection_status = if outcome.has_handle() { "Connected" } else { "Not Connected" };
        let (database, collections) = match outcome {
            ProbeOutcome::ModuleNotFound => {
                ("❌ Database module not found (run enable-database first)".to_owned(), vec![])
            },
            ProbeOutcome::NotInitialized => {
                ("⚠️  Available but not initialized".to_owned(), vec![])
            },
            ProbeOutcome::Connected { collections, .. } => {
                ("✅ Connected & Working".to_owned(), collections)
            },
            ProbeOutcome::ConnectedWithError { reason, .. } => {
                (format!("⚠️  Connected but Error: {}", truncate(&reason, MAX_ERROR_CHARS)), vec![])
            },
            ProbeOutcome::Failed(reason) => {
                (format!("❌ Error: {}", truncate(&reason, MAX_ERROR_CHARS)), vec![])
            },
        };

        Self {
            backend: "✅ Running".to_owned(),
            database,
            database_url: set_or_not(env.database_url),
            database_name: set_or_not(env.database_name),
            connection_status: connection_status.to_owned(),
            collections,
        }
    }
}

fn set_or_not(set: bool) -> String {
    String::from(if set { "✅ Set" } else { "❌ Not Set" })
}
