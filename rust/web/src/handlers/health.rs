use serde::Serialize;
use warp::reply::{self, Response};
use warp::Reply;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

/// `GET /health`. Answers without touching the session store.
pub fn health() -> Response {
    reply::json(&HealthBody { status: "ok" }).into_response()
}
