//! JSON mirror of the page flow for scripted clients.

use crate::cookie::BrowserSession;
use crate::errors::IntoErrorResponse;
use crate::session::{SessionError, SessionManager};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::Reply;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StartGameRequest {
    pub names: Vec<String>,
}

/// `GET /api/game`
pub async fn get_game(sessions: Arc<SessionManager>, browser: BrowserSession) -> Response {
    respond(&browser, StatusCode::OK, sessions.view(&browser.id))
}

/// `POST /api/game/players`. Responds 201 with the new match.
pub async fn start_game(
    sessions: Arc<SessionManager>,
    browser: BrowserSession,
    request: StartGameRequest,
) -> Response {
    let result = sessions.start_game(&browser.id, &request.names);
    respond(&browser, StatusCode::CREATED, result)
}

/// `POST /api/game/rounds`. 409 when no match is in progress.
pub async fn play_round(sessions: Arc<SessionManager>, browser: BrowserSession) -> Response {
    respond(&browser, StatusCode::OK, sessions.play_round(&browser.id))
}

/// `POST /api/game/reset`
pub async fn reset(sessions: Arc<SessionManager>, browser: BrowserSession) -> Response {
    respond(&browser, StatusCode::OK, sessions.reset(&browser.id))
}

fn respond<T>(browser: &BrowserSession, status: StatusCode, result: Result<T, SessionError>) -> Response
where
    T: Serialize,
{
    let response = match result {
        Ok(body) => reply::with_status(reply::json(&body), status).into_response(),
        Err(err) => err.into_http_response(),
    };
    browser.attach(response)
}
