use answer_backend::database::DatabaseHandle;
use axum::http::StatusCode;

use crate::common::{app, get};

mod common;

const UNUSED_URL: &str = "http://127.0.0.1:9/";

async fn presence() -> (String, String) {
    let (status, body) = get(app(DatabaseHandle::Uninitialized, UNUSED_URL), "/test").await;
    assert_eq!(status, StatusCode::OK);
    let field = |name: &str| body[name].as_str().unwrap().to_owned();
    (field("database_url"), field("database_name"))
}

// Single test so nothing else in this binary touches the environment concurrently.
#[tokio::test]
async fn test_diagnostics_follow_environment() {
    envmnt::set("DATABASE_URL", "mongodb://localhost");
    envmnt::remove("DATABASE_NAME");
    assert_eq!(presence().await, ("✅ Set".to_owned(), "❌ Not Set".to_owned()));

    envmnt::set("DATABASE_NAME", "app");
    assert_eq!(presence().await, ("✅ Set".to_owned(), "✅ Set".to_owned()));

    envmnt::set("DATABASE_URL", "");
    assert_eq!(presence().await, ("❌ Not Set".to_owned(), "✅ Set".to_owned()));

    envmnt::remove("DATABASE_URL");
    envmnt::remove("DATABASE_NAME");
    assert_eq!(presence().await, ("❌ Not Set".to_owned(), "❌ Not Set".to_owned()));
}
