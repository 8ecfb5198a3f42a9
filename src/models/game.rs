//! Episode and contestant models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityId, GameId, PlayerId};

/// Number of preliminary rounds in an episode.
pub const ROUND_COUNT: usize = 4;

/// Number of podium positions on stage.
pub const PODIUM_COUNT: usize = 4;

/// One taped episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    /// Unique identifier (derived from air date + episode number)
    pub id: GameId,

    /// Date the episode aired
    pub air_date: NaiveDate,

    /// Episode number within the air date (1 or 2)
    pub episode_number: u8,

    /// Optional episode title
    #[serde(default)]
    pub episode_title: Option<String>,

    /// Podium declared the fast line winner when the fast line itself tied
    #[serde(default)]
    pub fast_line_tiebreaker_winner_podium: Option<u8>,

    /// Who submitted the game, if known
    #[serde(default)]
    pub submitted_by: Option<String>,

    /// When the game was stored
    pub submitted_at: DateTime<Utc>,

    /// Contestants, kept in podium order
    #[serde(default)]
    pub players: Vec<Player>,
}

impl Game {
    /// Create a new Game with auto-generated ID.
    pub fn new(air_date: NaiveDate, episode_number: u8) -> Self {
        Self {
            id: Self::generate_id(air_date, episode_number),
            air_date,
            episode_number,
            episode_title: None,
            fast_line_tiebreaker_winner_podium: None,
            submitted_by: None,
            submitted_at: Utc::now(),
            players: Vec::new(),
        }
    }

    /// The ID a game with this air date and episode number receives.
    pub fn generate_id(air_date: NaiveDate, episode_number: u8) -> GameId {
        EntityId::generate(&["game", &air_date.to_string(), &episode_number.to_string()])
    }

    /// Builder method to set the episode title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.episode_title = Some(title.into());
        self
    }

    /// Builder method to set the explicit fast line tiebreak winner.
    pub fn with_fast_line_tiebreaker_winner(mut self, podium: u8) -> Self {
        self.fast_line_tiebreaker_winner_podium = Some(podium);
        self
    }

    /// Builder method to set the submitter.
    pub fn with_submitted_by(mut self, submitted_by: impl Into<String>) -> Self {
        self.submitted_by = Some(submitted_by.into());
        self
    }

    /// Add a player, assigning its ID and keeping podium order.
    pub fn with_player(mut self, player: Player) -> Self {
        self.add_player(player);
        self
    }

    /// Add a player, assigning its ID and keeping podium order.
    pub fn add_player(&mut self, mut player: Player) {
        player.id = Player::generate_id(&self.id, player.podium_number);
        self.players.push(player);
        self.players.sort_by_key(|p| p.podium_number);
    }

    /// Find the player standing at a podium.
    pub fn player_at(&self, podium: u8) -> Option<&Player> {
        self.players.iter().find(|p| p.podium_number == podium)
    }
}

/// One contestant's performance within a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Unique identifier (derived from game ID + podium)
    pub id: PlayerId,

    /// Display name
    pub name: String,

    /// Podium position (1-4)
    pub podium_number: u8,

    /// Per-round correctness; `None` means the round was not played
    #[serde(default)]
    pub round_correct: [Option<bool>; ROUND_COUNT],

    /// Per-round scores
    #[serde(default)]
    pub round_scores: [i64; ROUND_COUNT],

    /// Won the tiebreak for the second advancing spot
    #[serde(default)]
    pub won_tiebreaker: bool,

    /// Correct answers in the fast line
    #[serde(default)]
    pub fast_line_correct_count: Option<u32>,

    /// Incorrect answers in the fast line
    #[serde(default)]
    pub fast_line_incorrect_count: Option<u32>,

    /// Fast line score; `None` when the fast line was not played
    #[serde(default)]
    pub fast_line_score: Option<i64>,

    /// Correct answers in the final round
    #[serde(default)]
    pub final_round_correct_count: Option<u32>,

    /// Total winnings for the episode
    #[serde(default)]
    pub total_winnings: i64,
}

impl Player {
    /// Create a new Player. The ID is assigned when the player joins a game.
    pub fn new(name: impl Into<String>, podium_number: u8) -> Self {
        Self {
            id: EntityId::from(""),
            name: name.into(),
            podium_number,
            round_correct: [None; ROUND_COUNT],
            round_scores: [0; ROUND_COUNT],
            won_tiebreaker: false,
            fast_line_correct_count: None,
            fast_line_incorrect_count: None,
            fast_line_score: None,
            final_round_correct_count: None,
            total_winnings: 0,
        }
    }

    /// The ID a player at this podium of this game receives.
    pub fn generate_id(game_id: &GameId, podium_number: u8) -> PlayerId {
        EntityId::generate(&["player", game_id.as_str(), &podium_number.to_string()])
    }

    /// Builder method to set the four round scores.
    pub fn with_scores(mut self, scores: [i64; ROUND_COUNT]) -> Self {
        self.round_scores = scores;
        self
    }

    /// Builder method to set the four round correctness flags.
    pub fn with_correct(mut self, correct: [Option<bool>; ROUND_COUNT]) -> Self {
        self.round_correct = correct;
        self
    }

    /// Builder method to mark the player as the round tiebreak winner.
    pub fn with_tiebreaker_won(mut self) -> Self {
        self.won_tiebreaker = true;
        self
    }

    /// Builder method to set the fast line score.
    pub fn with_fast_line_score(mut self, score: i64) -> Self {
        self.fast_line_score = Some(score);
        self
    }

    /// Builder method to set fast line correct and incorrect counts.
    pub fn with_fast_line_counts(mut self, correct: u32, incorrect: u32) -> Self {
        self.fast_line_correct_count = Some(correct);
        self.fast_line_incorrect_count = Some(incorrect);
        self
    }

    /// Builder method to set the final round correct count.
    pub fn with_final_round_correct(mut self, count: u32) -> Self {
        self.final_round_correct_count = Some(count);
        self
    }

    /// Builder method to set total winnings.
    pub fn with_winnings(mut self, winnings: i64) -> Self {
        self.total_winnings = winnings;
        self
    }

    /// Sum of the four preliminary round scores, saturating at the `i64` bounds.
    pub fn round_total(&self) -> i64 {
        self.round_scores
            .iter()
            .fold(0i64, |acc, s| acc.saturating_add(*s))
    }

    /// Round total plus the fast line score (0 when not played).
    pub fn fast_line_total(&self) -> i64 {
        self.round_total()
            .saturating_add(self.fast_line_score.unwrap_or(0))
    }

    /// Number of preliminary rounds answered correctly.
    pub fn correct_count(&self) -> usize {
        self.round_correct
            .iter()
            .filter(|r| **r == Some(true))
            .count()
    }
}
