use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

pub const GREETING: &str = "Hello, CRM!";

#[derive(Debug, Serialize, Deserialize)]
pub struct HelloResponse {
    pub hello: String,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/hello", get(hello))
}

async fn hello() -> Json<HelloResponse> {
    Json(HelloResponse {
        hello: GREETING.to_string(),
    })
}
