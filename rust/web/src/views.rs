//! Server-rendered HTML pages.

use pointrush_engine::game::GamePhase;
use pointrush_engine::player::Player;
use pointrush_engine::rules::MAX_PLAYERS;

use crate::session::GameView;

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title} - Point Rush</title>
    <link rel="stylesheet" href="/static/style.css">
</head>
<body>
    <main class="container">
        <h1>Point Rush</h1>
{body}
    </main>
</body>
</html>
"#,
        title = escape_html(title),
        body = body
    )
}

/// Player-name form. `names` refills the fields after a rejected submission.
pub fn setup_page(error: Option<&str>, names: &[String]) -> String {
    let mut fields = String::new();
    for slot in 0..MAX_PLAYERS {
        let value = names.get(slot).map(|n| escape_html(n)).unwrap_or_default();
        fields.push_str(&format!(
            r#"            <div class="form-group">
                <label for="player{slot}">Player {number}</label>
                <input type="text" id="player{slot}" name="player{slot}" value="{value}" maxlength="40">
            </div>
"#,
            slot = slot,
            number = slot + 1,
            value = value
        ));
    }

    let error_html = error
        .map(|msg| format!(r#"        <p class="error" role="alert">{}</p>"#, escape_html(msg)))
        .unwrap_or_default();

    let body = format!(
        r#"        <p class="lead">Enter up to {MAX_PLAYERS} players. Take turns drawing cards; first to the target wins.</p>
{error_html}
        <form method="post" action="/" class="setup-form">
{fields}            <button type="submit">Start Game</button>
        </form>"#
    );
    layout("New Game", &body)
}

fn player_rows(view: &GameView) -> String {
    let mut rows = String::new();
    for player in &view.players {
        let is_current = view
            .current_player
            .as_ref()
            .is_some_and(|p| p.same_player(player));
        let is_winner = view.winner.as_ref().is_some_and(|w| w.same_player(player));
        let class = match (is_winner, is_current) {
            (true, _) => r#" class="winner""#,
            (false, true) => r#" class="current""#,
            _ => "",
        };
        rows.push_str(&format!(
            "                <tr{class}><td>{}</td><td>{}</td></tr>\n",
            escape_html(player.name()),
            player.points()
        ));
    }
    rows
}

fn card_panel(view: &GameView) -> String {
    match &view.current_card {
        Some(card) => {
            let name = card
                .name
                .as_deref()
                .map(escape_html)
                .unwrap_or_else(|| "Card".to_string());
            let description = card
                .description
                .as_deref()
                .map(|d| format!("<p>{}</p>", escape_html(d)))
                .unwrap_or_default();
            format!(
                r#"        <section class="card">
            <h2>{name}</h2>
            <p class="points">{points:+} points</p>
            {description}
        </section>"#,
                points = card.points
            )
        }
        None => r#"        <section class="card empty"><p>No card drawn yet.</p></section>"#.to_string(),
    }
}

fn status_line(view: &GameView) -> String {
    match (view.phase, &view.winner, &view.current_player) {
        (GamePhase::Finished, Some(winner), _) => format!(
            r#"<p class="status winner">{} wins with {} points!</p>"#,
            escape_html(winner.name()),
            winner.points()
        ),
        (_, _, Some(current)) => format!(
            r#"<p class="status">{}'s turn. First to {} points wins.</p>"#,
            escape_html(current.name()),
            view.winning_points
        ),
        _ => r#"<p class="status">No match in progress.</p>"#.to_string(),
    }
}

pub fn game_page(view: &GameView) -> String {
    let play_button = if view.phase == GamePhase::InProgress {
        let who = view
            .current_player
            .as_ref()
            .map(Player::name)
            .map(escape_html)
            .unwrap_or_default();
        format!(
            r#"        <form method="post" action="/play_game">
            <button type="submit">Draw a card ({who})</button>
        </form>"#
        )
    } else {
        String::new()
    };

    let body = format!(
        r#"        {status}
{card}
        <table class="scores">
            <thead><tr><th>Player</th><th>Points</th></tr></thead>
            <tbody>
{rows}            </tbody>
        </table>
{play_button}
        <form method="post" action="/reset">
            <button type="submit" class="secondary">New Game</button>
        </form>"#,
        status = status_line(view),
        card = card_panel(view),
        rows = player_rows(view),
    );
    layout("Play", &body)
}
