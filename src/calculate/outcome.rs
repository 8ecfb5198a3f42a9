//! Per-game outcome: who advances to the fast line and who wins it.
//!
//! The preliminary rounds send two players forward: the top scorer, plus
//! either the player who won the round tiebreak or the runner-up. The fast
//! line is then decided by an explicit tiebreak podium when one is recorded,
//! otherwise by the highest `round_total + fast_line_score`.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Game, GameId, Player, PlayerId};

/// Advancing players and winners of one game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOutcome {
    /// At most two players, top scorer first
    pub advancing: Vec<PlayerId>,

    /// Usually one player; empty or several on an undeclared tie
    pub winners: BTreeSet<PlayerId>,
}

impl GameOutcome {
    pub fn is_advancing(&self, id: &PlayerId) -> bool {
        self.advancing.contains(id)
    }

    pub fn is_winner(&self, id: &PlayerId) -> bool {
        self.winners.contains(id)
    }
}

/// Compute the outcome of a game.
///
/// Players with equal round totals keep their stored (podium) order, so the
/// lower podium ranks first on a tie.
pub fn calculate_outcome(game: &Game) -> GameOutcome {
    let mut ranked: Vec<&Player> = game.players.iter().collect();
    if ranked.is_empty() {
        return GameOutcome::default();
    }
    ranked.sort_by(|a, b| b.round_total().cmp(&a.round_total()));

    let mut advancing: Vec<PlayerId> = Vec::with_capacity(2);
    if ranked[0].round_total() >= 0 {
        advancing.push(ranked[0].id.clone());
    }

    // A flagged player takes the second slot; if the flag sits on the top
    // scorer nobody else advances.
    match ranked.iter().find(|p| p.won_tiebreaker) {
        Some(p) => {
            if !advancing.contains(&p.id) {
                advancing.push(p.id.clone());
            }
        }
        None => {
            if let Some(runner_up) = ranked.get(1) {
                if runner_up.round_total() >= 0 && !advancing.contains(&runner_up.id) {
                    advancing.push(runner_up.id.clone());
                }
            }
        }
    }

    let advancers: Vec<&Player> = ranked
        .iter()
        .copied()
        .filter(|p| advancing.contains(&p.id))
        .collect();

    let winners = match game.fast_line_tiebreaker_winner_podium {
        Some(podium) => advancers
            .iter()
            .find(|p| p.podium_number == podium)
            .map(|p| p.id.clone())
            .into_iter()
            .collect(),
        None => match advancers.iter().map(|p| p.fast_line_total()).max() {
            Some(best) if best >= 0 => advancers
                .iter()
                .filter(|p| p.fast_line_total() == best)
                .map(|p| p.id.clone())
                .collect(),
            _ => BTreeSet::new(),
        },
    };

    GameOutcome { advancing, winners }
}

/// A player annotated with the outcome of their game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerResult {
    #[serde(flatten)]
    pub player: Player,
    pub round_total: i64,
    pub fast_line_total: i64,
    pub is_advancing: bool,
    pub is_winner: bool,
}

/// A game annotated with its outcome, for read paths.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameResult {
    pub id: GameId,
    pub air_date: NaiveDate,
    pub episode_number: u8,
    pub episode_title: Option<String>,
    pub fast_line_tiebreaker_winner_podium: Option<u8>,
    pub submitted_at: DateTime<Utc>,
    pub players: Vec<PlayerResult>,
    pub outcome: GameOutcome,
}

impl GameResult {
    /// Build the annotated view of a game.
    pub fn from_game(game: &Game) -> Self {
        let outcome = calculate_outcome(game);
        let players = game
            .players
            .iter()
            .map(|p| PlayerResult {
                player: p.clone(),
                round_total: p.round_total(),
                fast_line_total: p.fast_line_total(),
                is_advancing: outcome.is_advancing(&p.id),
                is_winner: outcome.is_winner(&p.id),
            })
            .collect();

        Self {
            id: game.id.clone(),
            air_date: game.air_date,
            episode_number: game.episode_number,
            episode_title: game.episode_title.clone(),
            fast_line_tiebreaker_winner_podium: game.fast_line_tiebreaker_winner_podium,
            submitted_at: game.submitted_at,
            players,
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game() -> Game {
        Game::new(NaiveDate::from_ymd_opt(2024, 3, 11).unwrap(), 1)
    }

    fn scored(name: &str, podium: u8, total: i64) -> Player {
        Player::new(name, podium).with_scores([total, 0, 0, 0])
    }

    fn id_of(game: &Game, podium: u8) -> PlayerId {
        game.player_at(podium).unwrap().id.clone()
    }

    #[test]
    fn test_zero_players() {
        let outcome = calculate_outcome(&game());
        assert!(outcome.advancing.is_empty());
        assert!(outcome.winners.is_empty());
    }

    #[test]
    fn test_single_player_advances_and_wins() {
        let g = game().with_player(scored("Abe", 1, 40));
        let outcome = calculate_outcome(&g);
        assert_eq!(outcome.advancing, vec![id_of(&g, 1)]);
        assert_eq!(outcome.winners.len(), 1);
        assert!(outcome.is_winner(&id_of(&g, 1)));
    }

    #[test]
    fn test_top_two_advance_in_score_order() {
        let g = game()
            .with_player(scored("Abe", 1, 10))
            .with_player(scored("Bo", 2, 70))
            .with_player(scored("Cy", 3, 40))
            .with_player(scored("Di", 4, 20));
        let outcome = calculate_outcome(&g);
        assert_eq!(outcome.advancing, vec![id_of(&g, 2), id_of(&g, 3)]);
    }

    #[test]
    fn test_tiebreak_winner_takes_second_slot() {
        let g = game()
            .with_player(scored("Abe", 1, 90))
            .with_player(scored("Bo", 2, 50))
            .with_player(scored("Cy", 3, 20).with_tiebreaker_won());
        let outcome = calculate_outcome(&g);
        assert_eq!(outcome.advancing, vec![id_of(&g, 1), id_of(&g, 3)]);
        assert!(!outcome.is_advancing(&id_of(&g, 2)));
    }

    #[test]
    fn test_tiebreak_flag_on_leader_advances_only_leader() {
        let g = game()
            .with_player(scored("Abe", 1, 90).with_tiebreaker_won())
            .with_player(scored("Bo", 2, 50))
            .with_player(scored("Cy", 3, 20));
        let outcome = calculate_outcome(&g);
        assert_eq!(outcome.advancing, vec![id_of(&g, 1)]);
    }

    #[test]
    fn test_tied_leader_with_flag_advances_alone() {
        let g = game()
            .with_player(
                Player::new("Abe", 1)
                    .with_scores([25, 25, 25, 25])
                    .with_tiebreaker_won(),
            )
            .with_player(Player::new("Bo", 2).with_scores([25, 25, 25, 25]))
            .with_player(Player::new("Cy", 3).with_scores([25, 25, 25, 25]));

        let outcome = calculate_outcome(&g);
        assert_eq!(outcome.advancing.len(), 1);
        assert!(outcome.is_advancing(&id_of(&g, 1)));
        assert!(!outcome.is_advancing(&id_of(&g, 2)));
    }

    #[test]
    fn test_equal_totals_keep_podium_order() {
        let g = game()
            .with_player(Player::new("Abe", 1).with_scores([10, 20, 30, 40]))
            .with_player(Player::new("Bo", 2).with_scores([10, 20, 30, 40]))
            .with_player(Player::new("Cy", 3).with_scores([10, 20, 30, 40]))
            .with_player(Player::new("Di", 4).with_scores([10, 20, 30, 40]));
        assert!(g.players.iter().all(|p| p.round_total() == 100));

        let outcome = calculate_outcome(&g);
        assert_eq!(outcome.advancing, vec![id_of(&g, 1), id_of(&g, 2)]);
    }

    #[test]
    fn test_equal_totals_tiebreak_flag_decides_second() {
        let g = game()
            .with_player(Player::new("Abe", 1).with_scores([10, 20, 30, 40]))
            .with_player(Player::new("Bo", 2).with_scores([10, 20, 30, 40]))
            .with_player(
                Player::new("Cy", 3)
                    .with_scores([10, 20, 30, 40])
                    .with_tiebreaker_won(),
            )
            .with_player(Player::new("Di", 4).with_scores([10, 20, 30, 40]));

        let outcome = calculate_outcome(&g);
        assert_eq!(outcome.advancing, vec![id_of(&g, 1), id_of(&g, 3)]);
    }

    #[test]
    fn test_higher_fast_line_total_wins() {
        let g = game()
            .with_player(scored("Abe", 1, 80).with_fast_line_score(10))
            .with_player(scored("Bo", 2, 60).with_fast_line_score(50));
        let outcome = calculate_outcome(&g);
        assert_eq!(outcome.winners, BTreeSet::from([id_of(&g, 2)]));
    }

    #[test]
    fn test_fast_line_tie_produces_two_winners() {
        let g = game()
            .with_player(scored("Abe", 1, 80).with_fast_line_score(20))
            .with_player(scored("Bo", 2, 60).with_fast_line_score(40));
        let outcome = calculate_outcome(&g);
        assert_eq!(outcome.winners.len(), 2);
    }

    #[test]
    fn test_explicit_tiebreak_podium_picks_winner() {
        let g = game()
            .with_player(scored("Abe", 1, 80).with_fast_line_score(20))
            .with_player(scored("Bo", 2, 60).with_fast_line_score(40))
            .with_fast_line_tiebreaker_winner(2);
        let outcome = calculate_outcome(&g);
        assert_eq!(outcome.winners, BTreeSet::from([id_of(&g, 2)]));
    }

    #[test]
    fn test_explicit_tiebreak_podium_not_advancing_means_no_winner() {
        let g = game()
            .with_player(scored("Abe", 1, 80))
            .with_player(scored("Bo", 2, 60))
            .with_player(scored("Cy", 3, 10))
            .with_fast_line_tiebreaker_winner(3);
        let outcome = calculate_outcome(&g);
        assert_eq!(outcome.advancing.len(), 2);
        assert!(outcome.winners.is_empty());
    }

    #[test]
    fn test_winners_drawn_only_from_advancers() {
        let g = game()
            .with_player(scored("Abe", 1, 80))
            .with_player(scored("Bo", 2, 60))
            .with_player(scored("Cy", 3, 10).with_fast_line_score(500));
        let outcome = calculate_outcome(&g);
        assert!(!outcome.is_winner(&id_of(&g, 3)));
        assert!(outcome.is_winner(&id_of(&g, 1)));
    }

    #[test]
    fn test_negative_totals_do_not_panic() {
        let g = game()
            .with_player(scored("Abe", 1, -10))
            .with_player(scored("Bo", 2, -30));
        let outcome = calculate_outcome(&g);
        assert!(outcome.advancing.is_empty());
        assert!(outcome.winners.is_empty());
    }

    #[test]
    fn test_comeback_scenario() {
        let g = game()
            .with_player(scored("A", 1, 50).with_fast_line_score(5))
            .with_player(scored("B", 2, 30).with_fast_line_score(40).with_tiebreaker_won());
        let outcome = calculate_outcome(&g);
        assert_eq!(outcome.advancing, vec![id_of(&g, 1), id_of(&g, 2)]);
        assert_eq!(outcome.winners, BTreeSet::from([id_of(&g, 2)]));
    }

    #[test]
    fn test_outcome_is_deterministic() {
        let g = game()
            .with_player(scored("Abe", 1, 50))
            .with_player(scored("Bo", 2, 50))
            .with_player(scored("Cy", 3, 50));
        assert_eq!(calculate_outcome(&g), calculate_outcome(&g));
    }

    #[test]
    fn test_game_result_annotates_players() {
        let g = game()
            .with_title("Pilot")
            .with_player(scored("Abe", 1, 80).with_fast_line_score(10))
            .with_player(scored("Bo", 2, 60).with_fast_line_score(50))
            .with_player(scored("Cy", 3, 10));
        let result = GameResult::from_game(&g);

        assert_eq!(result.episode_title.as_deref(), Some("Pilot"));
        assert_eq!(result.players.len(), 3);
        let bo = &result.players[1];
        assert!(bo.is_advancing);
        assert!(bo.is_winner);
        assert_eq!(bo.round_total, 60);
        assert_eq!(bo.fast_line_total, 110);
        assert!(!result.players[2].is_advancing);
    }

    #[test]
    fn test_game_result_serializes_flat_player_fields() {
        let g = game().with_player(scored("Abe", 1, 80));
        let json = serde_json::to_value(GameResult::from_game(&g)).unwrap();
        let player = &json["players"][0];
        assert_eq!(player["name"], "Abe");
        assert_eq!(player["round_total"], 80);
        assert_eq!(player["is_winner"], true);
    }
}
