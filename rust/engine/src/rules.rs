use crate::errors::GameError;
use crate::player::Player;

/// Point total that ends the match.
pub const WINNING_POINTS: i64 = 1000;

/// Number of name slots offered when a match is set up.
pub const MAX_PLAYERS: usize = 4;

/// Cleans up the submitted player names.
///
/// Entries are trimmed and blank ones dropped; the remaining names keep
/// their submission order, which becomes the turn order.
///
/// # Errors
///
/// Returns [`GameError::InvalidInput`] when no usable name remains or when
/// more than [`MAX_PLAYERS`] names are left.
///
/// # Examples
///
/// ```
/// use pointrush_engine::rules::normalize_names;
///
/// let names = normalize_names(["Ann", "", "  Bo "]).unwrap();
/// assert_eq!(names, vec!["Ann".to_string(), "Bo".to_string()]);
///
/// assert!(normalize_names(["", "   "]).is_err());
/// ```
pub fn normalize_names<I, S>(names: I) -> Result<Vec<String>, GameError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let names: Vec<String> = names
        .into_iter()
        .map(|name| name.as_ref().trim().to_string())
        .filter(|name| !name.is_empty())
        .collect();

    if names.is_empty() {
        return Err(GameError::InvalidInput(
            "enter at least one player name".to_string(),
        ));
    }
    if names.len() > MAX_PLAYERS {
        return Err(GameError::InvalidInput(format!(
            "at most {MAX_PLAYERS} players can join, got {}",
            names.len()
        )));
    }
    Ok(names)
}

/// First player in list order whose total has reached `threshold`.
///
/// List order, not score, breaks ties: if two players cross the line on the
/// same turn the one listed earlier (lower id) wins.
pub fn first_to_reach(players: &[Player], threshold: i64) -> Option<&Player> {
    players.iter().find(|p| p.points() >= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_too_many_names() {
        let err = normalize_names(["a", "b", "c", "d", "e"]).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn accepts_exactly_max_players() {
        let names = normalize_names(["a", "b", "c", "d"]).expect("names");
        assert_eq!(names.len(), MAX_PLAYERS);
    }

    #[test]
    fn empty_list_is_invalid() {
        let empty: [&str; 0] = [];
        assert!(normalize_names(empty).unwrap_err().is_invalid_input());
    }

    #[test]
    fn first_to_reach_prefers_list_order_over_score() {
        let players = vec![
            Player::with_points(0, "Ann", 10).expect("player"),
            Player::with_points(1, "Bo", 1000).expect("player"),
            Player::with_points(2, "Cy", 2500).expect("player"),
        ];
        let winner = first_to_reach(&players, WINNING_POINTS).expect("winner");
        assert_eq!(winner.name(), "Bo");
        assert!(first_to_reach(&players[..1], WINNING_POINTS).is_none());
    }
}
