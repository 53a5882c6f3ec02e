use std::time::Instant;
use warp::http::{Method, StatusCode};
use warp::path::FullPath;
use warp::reject::Rejection;
use warp::reply::Response;
use warp::Filter;

/// Request line captured before the inner filter runs.
#[derive(Debug, Clone)]
pub struct RequestStart {
    pub path: String,
    pub method: String,
    started: Instant,
}

impl RequestStart {
    pub fn new(path: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            started: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }
}

/// Logs every request handled by `filter` with its status and duration.
pub fn with_request_logging<F>(
    filter: F,
) -> impl Filter<Extract = (Response,), Error = Rejection> + Clone
where
    F: Filter<Extract = (Response,), Error = Rejection> + Clone + Send + Sync + 'static,
{
    warp::any()
        .and(warp::path::full())
        .and(warp::method())
        .map(|path: FullPath, method: Method| {
            tracing::debug!(path = %path.as_str(), method = %method, "incoming request");
            RequestStart::new(path.as_str(), method.as_str())
        })
        .and(filter)
        .map(|start: RequestStart, response: Response| {
            log_response(
                response.status(),
                &start.path,
                &start.method,
                start.elapsed_ms(),
            );
            response
        })
}

/// Log level follows the status class: 2xx/3xx info, 4xx warn, 5xx error.
pub fn log_response(status: StatusCode, path: &str, method: &str, duration_ms: u128) {
    if status.is_client_error() {
        tracing::warn!(
            status = %status.as_u16(),
            path = %path,
            method = %method,
            duration_ms = duration_ms,
            "client error"
        );
    } else if status.is_server_error() {
        tracing::error!(
            status = %status.as_u16(),
            path = %path,
            method = %method,
            duration_ms = duration_ms,
            "server error"
        );
    } else {
        tracing::info!(
            status = %status.as_u16(),
            path = %path,
            method = %method,
            duration_ms = duration_ms,
            "response sent"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::TestLogSubscriber;
    use tracing::Level;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;
    use warp::Reply;

    #[tokio::test]
    async fn request_logging_records_status_and_path() {
        let subscriber = TestLogSubscriber::new();
        let layer = subscriber.clone().into_layer::<Registry>();
        let registry = Registry::default().with(layer);

        let _guard = tracing::subscriber::set_default(registry);

        let route = warp::path!("play_game")
            .and(warp::get())
            .map(|| warp::reply::html("ok").into_response());

        let logged_route = with_request_logging(route);

        let response = warp::test::request()
            .method("GET")
            .path("/play_game")
            .reply(&logged_route)
            .await;

        assert_eq!(response.status(), StatusCode::OK);

        let incoming = subscriber.find("incoming request").expect("request entry");
        assert_eq!(incoming.level, Level::DEBUG);
        let sent = subscriber.find("response sent").expect("response entry");
        assert_eq!(sent.field("path"), Some("/play_game"));
        assert_eq!(sent.field("status"), Some("200"));
    }

    #[test]
    fn redirects_log_at_info() {
        let entries = TestLogSubscriber::new().capture(|| {
            log_response(StatusCode::SEE_OTHER, "/", "POST", 3);
        });

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, Level::INFO);
        assert_eq!(entries[0].field("status"), Some("303"));
    }

    #[test]
    fn client_errors_log_at_warn() {
        let entries = TestLogSubscriber::new().capture(|| {
            log_response(StatusCode::CONFLICT, "/api/game/rounds", "POST", 1);
        });

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, Level::WARN);
        assert_eq!(entries[0].message, "client error");
        assert_eq!(entries[0].field("path"), Some("/api/game/rounds"));
    }

    #[test]
    fn server_errors_log_at_error() {
        let entries = TestLogSubscriber::new().capture(|| {
            log_response(StatusCode::INTERNAL_SERVER_ERROR, "/api/game", "GET", 2);
        });

        assert_eq!(entries[0].level, Level::ERROR);
        assert_eq!(entries[0].field("status"), Some("500"));
    }
}
