//! Browser pages. Every state change answers with a 303 so a refresh never
//! replays the POST.

use crate::cookie::BrowserSession;
use crate::errors::IntoErrorResponse;
use crate::session::{SessionError, SessionManager};
use crate::views;
use pointrush_engine::game::GamePhase;
use pointrush_engine::rules::MAX_PLAYERS;
use std::collections::HashMap;
use std::sync::Arc;
use warp::http::{StatusCode, Uri};
use warp::reply::{self, Response};
use warp::Reply;

const SETUP_PATH: &str = "/";
const GAME_PATH: &str = "/play_game";

/// `GET /`
pub async fn index(browser: BrowserSession) -> Response {
    browser.attach(reply::html(views::setup_page(None, &[])).into_response())
}

/// `POST /` with form fields `player0..player3`.
pub async fn submit_players(
    sessions: Arc<SessionManager>,
    browser: BrowserSession,
    form: HashMap<String, String>,
) -> Response {
    let names = form_names(&form);
    let response = match sessions.start_game(&browser.id, &names) {
        Ok(_) => see_other(GAME_PATH),
        Err(err) if err.is_invalid_input() => {
            let page = views::setup_page(Some(&err.error_message()), &names);
            reply::with_status(reply::html(page), StatusCode::BAD_REQUEST).into_response()
        }
        Err(err) => err.into_http_response(),
    };
    browser.attach(response)
}

/// `GET /play_game`
pub async fn show_game(sessions: Arc<SessionManager>, browser: BrowserSession) -> Response {
    let response = match sessions.view(&browser.id) {
        Ok(view) if view.phase == GamePhase::Setup => see_other(SETUP_PATH),
        Ok(view) => reply::html(views::game_page(&view)).into_response(),
        Err(err) => err.into_http_response(),
    };
    browser.attach(response)
}

/// `POST /play_game`
pub async fn play_round(sessions: Arc<SessionManager>, browser: BrowserSession) -> Response {
    let response = match sessions.play_round(&browser.id) {
        Ok(_) => see_other(GAME_PATH),
        Err(err) if err.is_invalid_state() => redirect_to_current_step(&sessions, &browser, err),
        Err(err) => err.into_http_response(),
    };
    browser.attach(response)
}

/// `POST /reset`
pub async fn reset(sessions: Arc<SessionManager>, browser: BrowserSession) -> Response {
    let response = match sessions.reset(&browser.id) {
        Ok(_) => see_other(SETUP_PATH),
        Err(err) => err.into_http_response(),
    };
    browser.attach(response)
}

/// Slots are read in order so a rejected form can be refilled field by field.
fn form_names(form: &HashMap<String, String>) -> Vec<String> {
    (0..MAX_PLAYERS)
        .map(|slot| {
            form.get(&format!("player{slot}"))
                .cloned()
                .unwrap_or_default()
        })
        .collect()
}

fn redirect_to_current_step(
    sessions: &SessionManager,
    browser: &BrowserSession,
    err: SessionError,
) -> Response {
    tracing::debug!(session_id = %browser.id, error = %err, "redirecting out-of-turn draw");
    match sessions.view(&browser.id) {
        Ok(view) if view.phase == GamePhase::Setup => see_other(SETUP_PATH),
        Ok(_) => see_other(GAME_PATH),
        Err(err) => err.into_http_response(),
    }
}

fn see_other(path: &'static str) -> Response {
    warp::redirect::see_other(Uri::from_static(path)).into_response()
}
