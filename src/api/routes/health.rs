//! Liveness endpoint for process supervisors.

use axum::{extract::State, response::Json, routing::get, Router};
use serde_json::{json, Value};

use super::meetings::MeetingState;

pub fn router(state: MeetingState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

async fn health(State(state): State<MeetingState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "meeting_count": state.meeting_count(),
    }))
}
