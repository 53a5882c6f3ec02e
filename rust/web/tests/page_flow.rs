use warp::hyper::body::Bytes;
use pointrush_web::{routes, AppContext, SESSION_COOKIE};
use warp::http::header::{LOCATION, SET_COOKIE};
use warp::http::{Response, StatusCode};

fn context() -> AppContext {
    AppContext::new_for_tests()
}

/// `name=value` pair to send back in a `Cookie` header.
fn session_cookie(response: &Response<Bytes>) -> String {
    let raw = response
        .headers()
        .get(SET_COOKIE)
        .expect("set-cookie header")
        .to_str()
        .expect("ascii cookie");
    raw.split(';').next().expect("cookie pair").to_string()
}

fn location(response: &Response<Bytes>) -> &str {
    response
        .headers()
        .get(LOCATION)
        .expect("location header")
        .to_str()
        .expect("ascii location")
}

fn body(response: &Response<Bytes>) -> String {
    String::from_utf8(response.body().to_vec()).expect("utf-8 body")
}

async fn open_session(ctx: &AppContext) -> String {
    let response = warp::test::request()
        .method("GET")
        .path("/")
        .reply(&routes(ctx))
        .await;
    session_cookie(&response)
}

async fn submit(ctx: &AppContext, cookie: &str, form: &str) -> Response<Bytes> {
    warp::test::request()
        .method("POST")
        .path("/")
        .header("cookie", cookie)
        .header("content-type", "application/x-www-form-urlencoded")
        .body(form.to_string())
        .reply(&routes(ctx))
        .await
}

async fn send(ctx: &AppContext, method: &str, path: &str, cookie: &str) -> Response<Bytes> {
    warp::test::request()
        .method(method)
        .path(path)
        .header("cookie", cookie)
        .reply(&routes(ctx))
        .await
}

#[tokio::test]
async fn first_visit_gets_cookie_and_setup_form() {
    let ctx = context();
    let response = warp::test::request()
        .method("GET")
        .path("/")
        .reply(&routes(&ctx))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_cookie(&response).starts_with(&format!("{SESSION_COOKIE}=")));
    let html = body(&response);
    for slot in 0..4 {
        assert!(html.contains(&format!(r#"name="player{slot}""#)));
    }
}

#[tokio::test]
async fn known_cookie_is_not_reissued() {
    let ctx = context();
    let cookie = open_session(&ctx).await;

    let response = send(&ctx, "GET", "/", &cookie).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(SET_COOKIE).is_none());
}

#[tokio::test]
async fn forged_cookie_is_replaced() {
    let ctx = context();
    let forged = format!("{SESSION_COOKIE}=00000000-0000-0000-0000-000000000000.AAAA");

    let response = send(&ctx, "GET", "/", &forged).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_ne!(session_cookie(&response), forged);
}

#[tokio::test]
async fn submitting_names_starts_a_match() {
    let ctx = context();
    let cookie = open_session(&ctx).await;

    let response = submit(&ctx, &cookie, "player0=Ann&player1=&player2=Bo&player3=").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/play_game");

    let page = send(&ctx, "GET", "/play_game", &cookie).await;
    assert_eq!(page.status(), StatusCode::OK);
    let html = body(&page);
    assert!(html.contains("<td>Ann</td><td>0</td>"));
    assert!(html.contains("<td>Bo</td><td>0</td>"));
    assert!(html.contains(r#"action="/play_game""#));
}

#[tokio::test]
async fn blank_names_rerender_form_with_message() {
    let ctx = context();
    let cookie = open_session(&ctx).await;

    let response = submit(&ctx, &cookie, "player0=++&player1=").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body(&response).contains("enter at least one player name"));

    let page = send(&ctx, "GET", "/play_game", &cookie).await;
    assert_eq!(page.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&page), "/");
}

#[tokio::test]
async fn player_names_are_escaped_on_the_page() {
    let ctx = context();
    let cookie = open_session(&ctx).await;

    submit(&ctx, &cookie, "player0=%3Cscript%3Ex%3C%2Fscript%3E").await;
    let html = body(&send(&ctx, "GET", "/play_game", &cookie).await);
    assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
    assert!(!html.contains("<script>"));
}

#[tokio::test]
async fn drawing_without_a_match_redirects_to_setup() {
    let ctx = context();
    let cookie = open_session(&ctx).await;

    let response = send(&ctx, "POST", "/play_game", &cookie).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn match_runs_until_someone_wins() {
    let ctx = context();
    let cookie = open_session(&ctx).await;
    submit(&ctx, &cookie, "player0=Ann&player1=Bo").await;

    let mut finished = false;
    for _ in 0..500 {
        let response = send(&ctx, "POST", "/play_game", &cookie).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/play_game");

        let html = body(&send(&ctx, "GET", "/play_game", &cookie).await);
        if html.contains("wins with") {
            assert!(!html.contains(r#"action="/play_game""#));
            finished = true;
            break;
        }
    }
    assert!(finished, "no winner after 500 rounds");

    let before = body(&send(&ctx, "GET", "/play_game", &cookie).await);
    let again = send(&ctx, "POST", "/play_game", &cookie).await;
    assert_eq!(again.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&again), "/play_game");
    let after = body(&send(&ctx, "GET", "/play_game", &cookie).await);
    assert_eq!(before, after);
}

#[tokio::test]
async fn reset_returns_to_setup() {
    let ctx = context();
    let cookie = open_session(&ctx).await;
    submit(&ctx, &cookie, "player0=Ann").await;
    send(&ctx, "POST", "/play_game", &cookie).await;

    let response = send(&ctx, "POST", "/reset", &cookie).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let page = send(&ctx, "GET", "/play_game", &cookie).await;
    assert_eq!(page.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn browsers_do_not_share_games() {
    let ctx = context();
    let first = open_session(&ctx).await;
    let second = open_session(&ctx).await;
    assert_ne!(first, second);

    submit(&ctx, &first, "player0=Ann").await;

    let mine = send(&ctx, "GET", "/play_game", &first).await;
    assert_eq!(mine.status(), StatusCode::OK);
    let theirs = send(&ctx, "GET", "/play_game", &second).await;
    assert_eq!(theirs.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn stylesheet_and_health_are_served() {
    let ctx = context();

    let css = warp::test::request()
        .path("/static/style.css")
        .reply(&routes(&ctx))
        .await;
    assert_eq!(css.status(), StatusCode::OK);

    let missing = warp::test::request()
        .path("/static/missing.js")
        .reply(&routes(&ctx))
        .await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    assert!(body(&missing).contains(r#""error":"asset_not_found""#));

    let escaping = warp::test::request()
        .path("/static/..%2FCargo.toml")
        .reply(&routes(&ctx))
        .await;
    assert_eq!(escaping.status(), StatusCode::NOT_FOUND);

    let health = warp::test::request().path("/health").reply(&routes(&ctx)).await;
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(body(&health), r#"{"status":"ok"}"#);
}

#[tokio::test]
async fn fresh_session_state_reads_the_same_twice() {
    let ctx = context();
    let cookie = open_session(&ctx).await;

    let first = send(&ctx, "GET", "/api/game", &cookie).await;
    let second = send(&ctx, "GET", "/api/game", &cookie).await;

    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(body(&first), body(&second));
    assert_eq!(ctx.sessions().active_sessions(), 0);
}
