//! Derived statistics models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Game, GameId, Player, PlayerId};

/// Relative standing of a row among its siblings for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Favorable,
    Neutral,
    Unfavorable,
}

impl Rating {
    /// Presentation color used by the statistics page.
    pub fn color(&self) -> &'static str {
        match self {
            Rating::Favorable => "green",
            Rating::Neutral => "yellow",
            Rating::Unfavorable => "red",
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rating::Favorable => write!(f, "favorable"),
            Rating::Neutral => write!(f, "neutral"),
            Rating::Unfavorable => write!(f, "unfavorable"),
        }
    }
}

/// A numeric value with its optional rating among sibling rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub value: f64,
    pub rating: Option<Rating>,
}

impl Metric {
    /// A value that has not been rated.
    pub fn unrated(value: f64) -> Self {
        Self {
            value,
            rating: None,
        }
    }

    pub fn rated(value: f64, rating: Rating) -> Self {
        Self {
            value,
            rating: Some(rating),
        }
    }
}

/// Corpus size at the time of computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusTotals {
    pub games: u32,
    pub players: u32,
    /// Games where exactly two players advanced to the fast line
    pub fast_line_games: u32,
}

/// Correctness rate for the Nth podium to answer in a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnPerformance {
    pub turn: u8,
    pub attempts: u32,
    pub correct: u32,
    pub pct: f64,
}

/// One bucket of a correct-answer histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionBucket {
    pub correct_count: u32,
    pub count: u32,
    pub pct: Metric,
}

/// Advancement rate among players with a given number of correct rounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancementByCorrect {
    pub correct_count: u32,
    pub advanced_count: u32,
    pub total_players: u32,
    pub pct: Metric,
}

/// Preliminary round accuracy for one podium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodiumPerformance {
    pub podium: u8,
    pub total_players: u32,
    /// Percentage correct for rounds 1-4
    pub round_pct: Vec<Metric>,
    /// Average number of correct rounds per player
    pub avg_correct: Metric,
}

/// Advancement and win record for one podium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodiumAdvancement {
    pub podium: u8,
    pub total: u32,
    pub advanced_count: u32,
    pub advanced_pct: Metric,
    pub won_count: u32,
    pub won_pct: Metric,
    /// Average round total
    pub avg_score: Metric,
}

/// Fast line correct/incorrect histograms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FastLineStats {
    pub labels: Vec<u32>,
    pub correct_data: Vec<u32>,
    pub incorrect_data: Vec<u32>,
    pub avg_correct: f64,
    pub avg_incorrect: f64,
}

/// Summary of come-from-behind victories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComebackStats {
    pub count: u32,
    /// Share of two-advancer games won by the trailing player
    pub pct: f64,
    pub avg_diff: f64,
    pub max_diff: i64,
}

/// A single come-from-behind victory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comeback {
    pub player: LeaderboardEntry,
    /// Round total deficit overcome in the fast line
    pub diff: i64,
}

/// Reference to the episode a leaderboard row came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRef {
    pub id: GameId,
    pub air_date: NaiveDate,
    pub episode_number: u8,
}

impl From<&Game> for GameRef {
    fn from(game: &Game) -> Self {
        Self {
            id: game.id.clone(),
            air_date: game.air_date,
            episode_number: game.episode_number,
        }
    }
}

/// A player row as shown on leaderboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player_id: PlayerId,
    pub name: String,
    pub podium_number: u8,
    pub game: GameRef,
    pub round_total: i64,
    pub fast_line_total: i64,
    pub total_winnings: i64,
    pub fast_line_correct_count: Option<u32>,
    pub fast_line_incorrect_count: Option<u32>,
    pub final_round_correct_count: Option<u32>,
}

impl LeaderboardEntry {
    pub fn new(game: &Game, player: &Player) -> Self {
        Self {
            player_id: player.id.clone(),
            name: player.name.clone(),
            podium_number: player.podium_number,
            game: GameRef::from(game),
            round_total: player.round_total(),
            fast_line_total: player.fast_line_total(),
            total_winnings: player.total_winnings,
            fast_line_correct_count: player.fast_line_correct_count,
            fast_line_incorrect_count: player.fast_line_incorrect_count,
            final_round_correct_count: player.final_round_correct_count,
        }
    }
}

/// Top round totals recorded at one podium.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodiumLeaderboard {
    pub podium_number: u8,
    pub players: Vec<LeaderboardEntry>,
}

/// Mean correct answers per game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundAverages {
    /// Rounds 1-4
    pub per_round: Vec<f64>,
    pub total: f64,
}

/// The full computed statistics payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsPayload {
    pub totals: CorpusTotals,
    pub turn_performance: Vec<TurnPerformance>,
    pub preliminary_round_dist: Vec<DistributionBucket>,
    pub player_prelim_dist: Vec<DistributionBucket>,
    pub player_advancement_dist: Vec<AdvancementByCorrect>,
    pub podium_stats: Vec<PodiumPerformance>,
    pub advancement_stats: Vec<PodiumAdvancement>,
    pub fast_line: FastLineStats,
    pub come_from_behind: ComebackStats,
    pub top_comebacks: Vec<Comeback>,
    pub final_round_stats: Vec<DistributionBucket>,
    pub top_fast_line_players: Vec<LeaderboardEntry>,
    pub top_fast_line_scores: Vec<LeaderboardEntry>,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub podium_leaderboards: Vec<PodiumLeaderboard>,
    pub aggregate_stats: RoundAverages,
}

/// The persisted, authoritative statistics cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    /// When this snapshot was computed
    pub updated_at: DateTime<Utc>,

    /// Most recently submitted game included in the computation
    pub through_game: GameId,

    pub data: StatisticsPayload,
}

impl StatisticsSnapshot {
    pub fn new(through_game: GameId, data: StatisticsPayload) -> Self {
        Self {
            updated_at: Utc::now(),
            through_game,
            data,
        }
    }
}
