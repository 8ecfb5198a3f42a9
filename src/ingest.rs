//! Game submission intake.
//!
//! Parses the scorekeeping client's camelCase payload, validates it into a
//! [`Game`], stores it, and rebuilds the statistics cache. Shared by the HTTP
//! API and the `submit` / `delete-game` CLI commands.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::cache::StatisticsCache;
use crate::models::{Game, GameId, Player, PODIUM_COUNT};
use crate::storage::{GameStore, StorageError};

/// Rejected submissions. Nothing is written for either variant.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Invalid JSON format: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Invalid submission: {0}")]
    Invalid(String),
}

/// Errors from the submit and delete flows.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A game as sent by the scorekeeping client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSubmission {
    #[serde(default)]
    pub episode_title: Option<String>,
    #[serde(default)]
    pub air_date: Option<NaiveDate>,
    #[serde(default)]
    pub episode_number: Option<u8>,
    /// Podium declared the fast line winner
    #[serde(default)]
    pub fast_line_tiebreaker_winner: Option<u8>,
    /// Podium whose player won the round tiebreak
    #[serde(default)]
    pub tiebreaker_winner_id: Option<u8>,
    #[serde(default)]
    pub players: Vec<PlayerSubmission>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub podium: Option<u8>,
    #[serde(default)]
    pub round1_correct: Option<bool>,
    #[serde(default)]
    pub round2_correct: Option<bool>,
    #[serde(default)]
    pub round3_correct: Option<bool>,
    #[serde(default)]
    pub round4_correct: Option<bool>,
    #[serde(default)]
    pub fast_line_correct: Option<u32>,
    #[serde(default)]
    pub fast_line_incorrect: Option<u32>,
    #[serde(default)]
    pub final_round_correct: Option<u32>,
    #[serde(default)]
    pub scores: ScoreSubmission,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    #[serde(default)]
    pub round1_score: Option<i64>,
    #[serde(default)]
    pub round2_score: Option<i64>,
    #[serde(default)]
    pub round3_score: Option<i64>,
    #[serde(default)]
    pub round4_score: Option<i64>,
    #[serde(default)]
    pub fast_line_score: Option<i64>,
    /// Total winnings
    #[serde(default)]
    pub final_total: Option<i64>,
}

/// Largest magnitude accepted for any score.
pub const SCORE_LIMIT: i64 = i32::MAX as i64;

impl ScoreSubmission {
    fn check_range(&self, idx: usize) -> Result<(), SubmissionError> {
        for (field, value) in [
            ("round1Score", self.round1_score),
            ("round2Score", self.round2_score),
            ("round3Score", self.round3_score),
            ("round4Score", self.round4_score),
            ("fastLineScore", self.fast_line_score),
            ("finalTotal", self.final_total),
        ] {
            if let Some(v) = value.filter(|v| !(-SCORE_LIMIT..=SCORE_LIMIT).contains(v)) {
                return Err(SubmissionError::Invalid(format!(
                    "players[{}].scores.{} is out of range: {}",
                    idx, field, v
                )));
            }
        }
        Ok(())
    }
}

/// Parse a raw request body.
pub fn parse_submission(body: &[u8]) -> Result<GameSubmission, SubmissionError> {
    Ok(serde_json::from_slice(body)?)
}

fn valid_podium(podium: u8) -> bool {
    (1..=PODIUM_COUNT as u8).contains(&podium)
}

impl GameSubmission {
    /// Validate and convert into a storable game.
    ///
    /// Air date, episode number, player names and podiums are required;
    /// missing scores default to 0 and missing counts stay unset.
    pub fn into_game(self, submitted_by: Option<String>) -> Result<Game, SubmissionError> {
        let air_date = self
            .air_date
            .ok_or_else(|| SubmissionError::Invalid("airDate is required".to_string()))?;
        let episode_number = self
            .episode_number
            .ok_or_else(|| SubmissionError::Invalid("episodeNumber is required".to_string()))?;
        if !(1..=2).contains(&episode_number) {
            return Err(SubmissionError::Invalid(format!(
                "episodeNumber must be 1 or 2, got {}",
                episode_number
            )));
        }
        if self.players.len() > PODIUM_COUNT {
            return Err(SubmissionError::Invalid(format!(
                "at most {} players allowed, got {}",
                PODIUM_COUNT,
                self.players.len()
            )));
        }
        for (field, podium) in [
            ("fastLineTiebreakerWinner", self.fast_line_tiebreaker_winner),
            ("tiebreakerWinnerId", self.tiebreaker_winner_id),
        ] {
            if let Some(p) = podium.filter(|p| !valid_podium(*p)) {
                return Err(SubmissionError::Invalid(format!(
                    "{} must be a podium 1-4, got {}",
                    field, p
                )));
            }
        }

        let mut game = Game::new(air_date, episode_number);
        if let Some(title) = self.episode_title.filter(|t| !t.trim().is_empty()) {
            game = game.with_title(title.trim());
        }
        if let Some(podium) = self.fast_line_tiebreaker_winner {
            game = game.with_fast_line_tiebreaker_winner(podium);
        }
        if let Some(by) = submitted_by {
            game = game.with_submitted_by(by);
        }

        let mut seen = HashSet::new();
        for (idx, submitted) in self.players.into_iter().enumerate() {
            let player = submitted.into_player(idx, self.tiebreaker_winner_id)?;
            if !seen.insert(player.podium_number) {
                return Err(SubmissionError::Invalid(format!(
                    "podium {} appears more than once",
                    player.podium_number
                )));
            }
            game.add_player(player);
        }

        Ok(game)
    }
}

impl PlayerSubmission {
    fn into_player(
        self,
        idx: usize,
        tiebreaker_podium: Option<u8>,
    ) -> Result<Player, SubmissionError> {
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| SubmissionError::Invalid(format!("players[{}].name is required", idx)))?;
        let podium = self.podium.ok_or_else(|| {
            SubmissionError::Invalid(format!("players[{}].podium is required", idx))
        })?;
        if !valid_podium(podium) {
            return Err(SubmissionError::Invalid(format!(
                "players[{}].podium must be 1-4, got {}",
                idx, podium
            )));
        }

        let scores = &self.scores;
        scores.check_range(idx)?;
        let mut player = Player::new(name, podium)
            .with_correct([
                self.round1_correct,
                self.round2_correct,
                self.round3_correct,
                self.round4_correct,
            ])
            .with_scores([
                scores.round1_score.unwrap_or(0),
                scores.round2_score.unwrap_or(0),
                scores.round3_score.unwrap_or(0),
                scores.round4_score.unwrap_or(0),
            ])
            .with_winnings(scores.final_total.unwrap_or(0));

        player.fast_line_score = scores.fast_line_score;
        player.fast_line_correct_count = self.fast_line_correct;
        player.fast_line_incorrect_count = self.fast_line_incorrect;
        player.final_round_correct_count = self.final_round_correct;
        player.won_tiebreaker = tiebreaker_podium == Some(podium);

        Ok(player)
    }
}

/// Store a game and rebuild statistics.
///
/// The store write is all-or-nothing. A rebuild failure after a successful
/// write is logged and leaves the previous snapshot in place; the next write
/// or a manual rebuild repairs it.
pub fn ingest_game(
    store: &dyn GameStore,
    cache: &StatisticsCache,
    game: Game,
) -> Result<Game, IngestError> {
    store.insert_game(&game)?;
    info!(
        "Accepted game {} ({} episode {})",
        game.id, game.air_date, game.episode_number
    );

    refresh_statistics(store, cache);
    Ok(game)
}

/// Parse, validate and store a raw submission body.
pub fn submit(
    store: &dyn GameStore,
    cache: &StatisticsCache,
    body: &[u8],
    submitted_by: Option<String>,
) -> Result<Game, IngestError> {
    let game = parse_submission(body)
        .and_then(|s| s.into_game(submitted_by))
        .map_err(|e| {
            warn!("Rejected submission: {}", e);
            e
        })?;
    ingest_game(store, cache, game)
}

/// Delete a game with its players and rebuild statistics.
/// Returns false if the game did not exist.
pub fn remove_game(
    store: &dyn GameStore,
    cache: &StatisticsCache,
    id: &GameId,
) -> Result<bool, IngestError> {
    if !store.delete_game(id)? {
        return Ok(false);
    }
    refresh_statistics(store, cache);
    Ok(true)
}

fn refresh_statistics(store: &dyn GameStore, cache: &StatisticsCache) {
    if let Err(e) = cache.rebuild(store) {
        error!("Statistics rebuild failed; snapshot is stale: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{JsonlGameStore, StorageConfig};
    use tempfile::TempDir;

    const FULL_PAYLOAD: &str = r#"{
        "episodeTitle": "Season Finale",
        "airDate": "2024-03-11",
        "episodeNumber": 2,
        "tiebreakerWinnerId": 3,
        "players": [
            {
                "name": "Abe", "podium": 1,
                "round1Correct": true, "round2Correct": false,
                "round3Correct": null, "round4Correct": true,
                "fastLineCorrect": 7, "fastLineIncorrect": 2,
                "finalRoundCorrect": 4,
                "scores": {"round1Score": 100, "round2Score": -50,
                           "round3Score": 0, "round4Score": 200,
                           "fastLineScore": 300, "finalTotal": 25000}
            },
            {
                "name": "Cy", "podium": 3,
                "scores": {"round1Score": 10}
            }
        ]
    }"#;

    fn setup() -> (TempDir, StorageConfig, JsonlGameStore, StatisticsCache) {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig::new(temp_dir.path().to_path_buf());
        let store = JsonlGameStore::new(config.clone());
        let cache = StatisticsCache::new(&config);
        (temp_dir, config, store, cache)
    }

    #[test]
    fn test_full_payload_maps_every_field() {
        let game = parse_submission(FULL_PAYLOAD.as_bytes())
            .unwrap()
            .into_game(Some("scorer".to_string()))
            .unwrap();

        assert_eq!(game.episode_title.as_deref(), Some("Season Finale"));
        assert_eq!(game.episode_number, 2);
        assert_eq!(game.submitted_by.as_deref(), Some("scorer"));
        assert_eq!(game.players.len(), 2);

        let abe = game.player_at(1).unwrap();
        assert_eq!(abe.round_correct, [Some(true), Some(false), None, Some(true)]);
        assert_eq!(abe.round_scores, [100, -50, 0, 200]);
        assert_eq!(abe.fast_line_score, Some(300));
        assert_eq!(abe.fast_line_correct_count, Some(7));
        assert_eq!(abe.fast_line_incorrect_count, Some(2));
        assert_eq!(abe.final_round_correct_count, Some(4));
        assert_eq!(abe.total_winnings, 25000);
        assert!(!abe.won_tiebreaker);

        let cy = game.player_at(3).unwrap();
        assert!(cy.won_tiebreaker);
        assert_eq!(cy.round_scores, [10, 0, 0, 0]);
        assert_eq!(cy.fast_line_score, None);
        assert_eq!(cy.total_winnings, 0);
        assert_eq!(cy.round_correct, [None; 4]);
    }

    #[test]
    fn test_explicit_fast_line_winner() {
        let body = r#"{"airDate":"2024-03-11","episodeNumber":1,"fastLineTiebreakerWinner":2,
            "players":[{"name":"A","podium":1},{"name":"B","podium":2}]}"#;
        let game = parse_submission(body.as_bytes())
            .unwrap()
            .into_game(None)
            .unwrap();
        assert_eq!(game.fast_line_tiebreaker_winner_podium, Some(2));
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_submission(b"{not json").unwrap_err();
        assert!(matches!(err, SubmissionError::Malformed(_)));

        let err = parse_submission(br#"{"airDate":"yesterday"}"#).unwrap_err();
        assert!(matches!(err, SubmissionError::Malformed(_)));
    }

    fn invalid(body: &str) -> String {
        match parse_submission(body.as_bytes()).unwrap().into_game(None) {
            Err(SubmissionError::Invalid(msg)) => msg,
            other => panic!("expected invalid submission, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_identifiers_rejected() {
        assert!(invalid(r#"{"episodeNumber":1}"#).contains("airDate"));
        assert!(invalid(r#"{"airDate":"2024-01-01"}"#).contains("episodeNumber"));
        assert!(invalid(
            r#"{"airDate":"2024-01-01","episodeNumber":1,"players":[{"podium":1}]}"#
        )
        .contains("name"));
        assert!(invalid(
            r#"{"airDate":"2024-01-01","episodeNumber":1,"players":[{"name":"  ","podium":1}]}"#
        )
        .contains("name"));
        assert!(invalid(
            r#"{"airDate":"2024-01-01","episodeNumber":1,"players":[{"name":"A"}]}"#
        )
        .contains("podium"));
    }

    #[test]
    fn test_range_checks() {
        assert!(invalid(r#"{"airDate":"2024-01-01","episodeNumber":3}"#).contains("1 or 2"));
        assert!(invalid(
            r#"{"airDate":"2024-01-01","episodeNumber":1,"players":[{"name":"A","podium":5}]}"#
        )
        .contains("podium"));
        assert!(invalid(
            r#"{"airDate":"2024-01-01","episodeNumber":1,"fastLineTiebreakerWinner":0}"#
        )
        .contains("fastLineTiebreakerWinner"));
    }

    #[test]
    fn test_out_of_range_scores_rejected() {
        let body = format!(
            r#"{{"airDate": "2024-03-11", "episodeNumber": 1,
                "players": [{{"name": "Abe", "podium": 1,
                              "scores": {{"round1Score": {}, "round2Score": 1}}}}]}}"#,
            i64::MAX
        );
        let err = parse_submission(body.as_bytes())
            .unwrap()
            .into_game(None)
            .unwrap_err();
        assert!(matches!(err, SubmissionError::Invalid(ref msg) if msg.contains("round1Score")));

        let body = r#"{"airDate": "2024-03-11", "episodeNumber": 1,
            "players": [{"name": "Abe", "podium": 1,
                         "scores": {"round1Score": 2147483647, "round2Score": 2147483647,
                                    "round3Score": 2147483647, "round4Score": 2147483647,
                                    "fastLineScore": -2147483647}}]}"#;
        let game = parse_submission(body.as_bytes())
            .unwrap()
            .into_game(None)
            .unwrap();
        let stats = crate::calculate::compute_statistics(&[game]).unwrap();
        assert_eq!(stats.totals.games, 1);
    }

    #[test]
    fn test_duplicate_podium_rejected() {
        let msg = invalid(
            r#"{"airDate":"2024-01-01","episodeNumber":1,
                "players":[{"name":"A","podium":2},{"name":"B","podium":2}]}"#,
        );
        assert!(msg.contains("podium 2"));
    }

    #[test]
    fn test_too_many_players_rejected() {
        let players: Vec<String> = (1..=5)
            .map(|p| format!(r#"{{"name":"P{}","podium":{}}}"#, p, p.min(4)))
            .collect();
        let body = format!(
            r#"{{"airDate":"2024-01-01","episodeNumber":1,"players":[{}]}}"#,
            players.join(",")
        );
        assert!(invalid(&body).contains("at most 4"));
    }

    #[test]
    fn test_submit_stores_and_rebuilds() {
        let (_dir, _config, store, cache) = setup();
        let game = submit(&store, &cache, FULL_PAYLOAD.as_bytes(), None).unwrap();

        assert_eq!(store.get_game(&game.id).unwrap(), Some(game.clone()));
        let snapshot = cache.current().unwrap().unwrap();
        assert_eq!(snapshot.through_game, game.id);
        assert_eq!(snapshot.data.totals.players, 2);
    }

    #[test]
    fn test_rejected_submission_writes_nothing() {
        let (_dir, _config, store, cache) = setup();
        let err = submit(&store, &cache, b"{\"airDate\":", None).unwrap_err();

        assert!(matches!(
            err,
            IngestError::Submission(SubmissionError::Malformed(_))
        ));
        assert!(store.list_games().unwrap().is_empty());
        assert!(cache.current().unwrap().is_none());
    }

    #[test]
    fn test_duplicate_submission_conflicts() {
        let (_dir, _config, store, cache) = setup();
        submit(&store, &cache, FULL_PAYLOAD.as_bytes(), None).unwrap();
        let err = submit(&store, &cache, FULL_PAYLOAD.as_bytes(), None).unwrap_err();

        assert!(matches!(err, IngestError::Storage(StorageError::Conflict(_))));
        assert_eq!(store.list_games().unwrap().len(), 1);
    }

    #[test]
    fn test_rebuild_failure_does_not_fail_submission() {
        let (_dir, config, store, cache) = setup();
        // A directory where the snapshot file belongs makes the commit fail
        std::fs::create_dir_all(config.snapshot_path().join("blocker")).unwrap();

        let game = submit(&store, &cache, FULL_PAYLOAD.as_bytes(), None).unwrap();
        assert!(store.get_game(&game.id).unwrap().is_some());
    }

    #[test]
    fn test_remove_game_rebuilds() {
        let (_dir, _config, store, cache) = setup();
        let game = submit(&store, &cache, FULL_PAYLOAD.as_bytes(), None).unwrap();

        assert!(remove_game(&store, &cache, &game.id).unwrap());
        assert!(store.list_games().unwrap().is_empty());
        assert!(cache.current().unwrap().is_none());
        assert!(!remove_game(&store, &cache, &game.id).unwrap());
    }
}
