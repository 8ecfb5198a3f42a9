//! Corpus-wide statistics.
//!
//! Sweeps every stored game once and produces the immutable
//! [`StatisticsPayload`] that the statistics cache persists. Games are
//! processed newest first (air date, then episode number, descending) so
//! that leaderboard ties resolve the same way on every run.

use crate::models::{
    AdvancementByCorrect, Comeback, ComebackStats, CorpusTotals, DistributionBucket,
    FastLineStats, Game, LeaderboardEntry, Metric, Player, PlayerId, PodiumAdvancement,
    PodiumLeaderboard, PodiumPerformance, Rating, RoundAverages, StatisticsPayload,
    TurnPerformance, PODIUM_COUNT, ROUND_COUNT,
};

use super::annotate::{annotate, annotate_by_rank, rated_metrics};
use super::outcome::{calculate_outcome, GameOutcome};
use super::{calculate_mean, calculate_pct, histogram};

/// Answer order per round: `TURN_ORDER[round - 1][podium - 1]` is the turn
/// on which that podium answers.
pub const TURN_ORDER: [[u8; PODIUM_COUNT]; ROUND_COUNT] = [
    [1, 2, 3, 4],
    [4, 1, 2, 3],
    [3, 4, 1, 2],
    [2, 3, 4, 1],
];

/// Highest correct-answer count in a preliminary round histogram.
const PRELIM_MAX_BUCKET: u32 = 4;
/// Highest fast line answer count charted.
const FAST_LINE_MAX_BUCKET: u32 = 12;
/// Highest final round correct count.
const FINAL_ROUND_MAX_BUCKET: u32 = 5;

const TOP_COMEBACKS: usize = 5;
const TOP_FAST_LINE_PLAYERS: usize = 5;
const TOP_FAST_LINE_SCORES: usize = 20;
const TOP_WINNINGS: usize = 20;
const TOP_PER_PODIUM: usize = 10;

/// Turn on which `podium` answers in `round` (both 1-based).
pub fn turn_for(round: usize, podium: u8) -> Option<u8> {
    let row = TURN_ORDER.get(round.checked_sub(1)?)?;
    row.get((podium as usize).checked_sub(1)?).copied()
}

/// Compute every statistic over the corpus. Returns `None` when there are
/// no games.
pub fn compute_statistics(games: &[Game]) -> Option<StatisticsPayload> {
    if games.is_empty() {
        return None;
    }

    let mut ordered: Vec<&Game> = games.iter().collect();
    ordered.sort_by(|a, b| {
        (b.air_date, b.episode_number).cmp(&(a.air_date, a.episode_number))
    });
    let outcomes: Vec<GameOutcome> = ordered.iter().map(|g| calculate_outcome(g)).collect();
    let corpus = Corpus {
        games: ordered,
        outcomes,
    };

    let (come_from_behind, top_comebacks, fast_line_games) = comebacks(&corpus);

    Some(StatisticsPayload {
        totals: CorpusTotals {
            games: corpus.games.len() as u32,
            players: corpus.players().count() as u32,
            fast_line_games,
        },
        turn_performance: turn_performance(&corpus),
        preliminary_round_dist: preliminary_round_dist(&corpus),
        player_prelim_dist: player_prelim_dist(&corpus),
        player_advancement_dist: player_advancement_dist(&corpus),
        podium_stats: podium_stats(&corpus),
        advancement_stats: advancement_stats(&corpus),
        fast_line: fast_line_stats(&corpus),
        come_from_behind,
        top_comebacks,
        final_round_stats: final_round_stats(&corpus),
        top_fast_line_players: top_fast_line_players(&corpus),
        top_fast_line_scores: top_fast_line_scores(&corpus),
        leaderboard: winnings_leaderboard(&corpus),
        podium_leaderboards: podium_leaderboards(&corpus),
        aggregate_stats: round_averages(&corpus),
    })
}

/// Games in processing order with their precomputed outcomes.
struct Corpus<'a> {
    games: Vec<&'a Game>,
    outcomes: Vec<GameOutcome>,
}

impl<'a> Corpus<'a> {
    fn players(&self) -> impl Iterator<Item = (&'a Game, &'a Player)> + '_ {
        self.games
            .iter()
            .flat_map(|&g| g.players.iter().map(move |p| (g, p)))
    }

    fn with_outcomes(&self) -> impl Iterator<Item = (&'a Game, &GameOutcome)> + '_ {
        self.games.iter().copied().zip(self.outcomes.iter())
    }
}

fn podium_index(podium: u8) -> Option<usize> {
    let idx = (podium as usize).checked_sub(1)?;
    (idx < PODIUM_COUNT).then_some(idx)
}

/// Histogram rows; left unrated when the histogram holds no data at all.
fn distribution(counts: &[u32], denominator: u32) -> Vec<DistributionBucket> {
    let pcts: Vec<f64> = counts
        .iter()
        .map(|c| calculate_pct(*c, denominator))
        .collect();
    let metrics = if counts.iter().any(|c| *c > 0) {
        rated_metrics(&pcts)
    } else {
        pcts.iter().map(|p| Metric::unrated(*p)).collect()
    };

    counts
        .iter()
        .zip(metrics)
        .enumerate()
        .map(|(i, (count, pct))| DistributionBucket {
            correct_count: i as u32,
            count: *count,
            pct,
        })
        .collect()
}

fn turn_performance(corpus: &Corpus) -> Vec<TurnPerformance> {
    let mut attempts = [0u32; PODIUM_COUNT];
    let mut correct = [0u32; PODIUM_COUNT];

    for (_, player) in corpus.players() {
        for (round_idx, result) in player.round_correct.iter().enumerate() {
            let (Some(is_correct), Some(turn)) = (result, turn_for(round_idx + 1, player.podium_number))
            else {
                continue;
            };
            let slot = turn as usize - 1;
            attempts[slot] += 1;
            if *is_correct {
                correct[slot] += 1;
            }
        }
    }

    (0..PODIUM_COUNT)
        .map(|i| TurnPerformance {
            turn: i as u8 + 1,
            attempts: attempts[i],
            correct: correct[i],
            pct: calculate_pct(correct[i], attempts[i]),
        })
        .collect()
}

fn preliminary_round_dist(corpus: &Corpus) -> Vec<DistributionBucket> {
    let mut counts = vec![0u32; PRELIM_MAX_BUCKET as usize + 1];
    let mut rounds_played = 0u32;

    for game in &corpus.games {
        for round_idx in 0..ROUND_COUNT {
            let played = game
                .players
                .iter()
                .any(|p| p.round_correct[round_idx].is_some());
            if !played {
                continue;
            }
            let correct = game
                .players
                .iter()
                .filter(|p| p.round_correct[round_idx] == Some(true))
                .count();
            if let Some(slot) = counts.get_mut(correct) {
                *slot += 1;
            }
            rounds_played += 1;
        }
    }

    distribution(&counts, rounds_played)
}

fn player_prelim_dist(corpus: &Corpus) -> Vec<DistributionBucket> {
    let counts = histogram(
        corpus.players().map(|(_, p)| p.correct_count() as u32),
        PRELIM_MAX_BUCKET,
    );
    distribution(&counts, corpus.players().count() as u32)
}

fn player_advancement_dist(corpus: &Corpus) -> Vec<AdvancementByCorrect> {
    let buckets = PRELIM_MAX_BUCKET as usize + 1;
    let mut advanced = vec![0u32; buckets];
    let mut total = vec![0u32; buckets];

    for (game, outcome) in corpus.with_outcomes() {
        for player in &game.players {
            let idx = player.correct_count();
            if idx >= buckets {
                continue;
            }
            total[idx] += 1;
            if outcome.is_advancing(&player.id) {
                advanced[idx] += 1;
            }
        }
    }

    let pcts: Vec<f64> = (0..buckets)
        .map(|i| calculate_pct(advanced[i], total[i]))
        .collect();
    let metrics: Vec<Metric> = if total.iter().any(|t| *t > 0) {
        rated_metrics(&pcts)
    } else {
        pcts.iter().map(|p| Metric::unrated(*p)).collect()
    };

    metrics
        .into_iter()
        .enumerate()
        .map(|(i, pct)| AdvancementByCorrect {
            correct_count: i as u32,
            advanced_count: advanced[i],
            total_players: total[i],
            pct,
        })
        .collect()
}

fn podium_stats(corpus: &Corpus) -> Vec<PodiumPerformance> {
    let mut players = [0u32; PODIUM_COUNT];
    let mut correct = [[0u32; ROUND_COUNT]; PODIUM_COUNT];
    let mut known = [[0u32; ROUND_COUNT]; PODIUM_COUNT];

    for (_, player) in corpus.players() {
        let Some(idx) = podium_index(player.podium_number) else {
            continue;
        };
        players[idx] += 1;
        for (round_idx, result) in player.round_correct.iter().enumerate() {
            if let Some(is_correct) = result {
                known[idx][round_idx] += 1;
                if *is_correct {
                    correct[idx][round_idx] += 1;
                }
            }
        }
    }

    // rounds[r][podium] so each round can be rated across podiums
    let rounds: Vec<Vec<Metric>> = (0..ROUND_COUNT)
        .map(|r| {
            let pcts: Vec<f64> = (0..PODIUM_COUNT)
                .map(|p| calculate_pct(correct[p][r], known[p][r]))
                .collect();
            rated_metrics(&pcts)
        })
        .collect();
    let averages: Vec<f64> = (0..PODIUM_COUNT)
        .map(|p| calculate_mean(correct[p].iter().sum::<u32>() as i64, players[p]))
        .collect();
    let average_metrics = rated_metrics(&averages);

    (0..PODIUM_COUNT)
        .map(|p| PodiumPerformance {
            podium: p as u8 + 1,
            total_players: players[p],
            round_pct: rounds.iter().map(|round| round[p]).collect(),
            avg_correct: average_metrics[p],
        })
        .collect()
}

fn advancement_stats(corpus: &Corpus) -> Vec<PodiumAdvancement> {
    let mut total = [0u32; PODIUM_COUNT];
    let mut advanced = [0u32; PODIUM_COUNT];
    let mut won = [0u32; PODIUM_COUNT];
    let mut score_sum = [0i64; PODIUM_COUNT];

    for (game, outcome) in corpus.with_outcomes() {
        for player in &game.players {
            let Some(idx) = podium_index(player.podium_number) else {
                continue;
            };
            total[idx] += 1;
            score_sum[idx] = score_sum[idx].saturating_add(player.round_total());
            if outcome.is_advancing(&player.id) {
                advanced[idx] += 1;
            }
            if outcome.is_winner(&player.id) {
                won[idx] += 1;
            }
        }
    }

    let advanced_pct: Vec<f64> = (0..PODIUM_COUNT)
        .map(|i| calculate_pct(advanced[i], total[i]))
        .collect();
    let won_pct: Vec<f64> = (0..PODIUM_COUNT)
        .map(|i| calculate_pct(won[i], total[i]))
        .collect();
    let avg_score: Vec<f64> = (0..PODIUM_COUNT)
        .map(|i| calculate_mean(score_sum[i], total[i]))
        .collect();

    // Rank labels require appearances at every podium
    let advanced_ratings: Vec<Option<Rating>> = if total.iter().all(|t| *t > 0) {
        annotate_by_rank(&advanced_pct, 2, 2)
            .into_iter()
            .map(Some)
            .collect()
    } else {
        vec![None; PODIUM_COUNT]
    };
    let won_ratings = annotate(&won_pct);
    let score_ratings = annotate(&avg_score);

    (0..PODIUM_COUNT)
        .map(|i| PodiumAdvancement {
            podium: i as u8 + 1,
            total: total[i],
            advanced_count: advanced[i],
            advanced_pct: Metric {
                value: advanced_pct[i],
                rating: advanced_ratings[i],
            },
            won_count: won[i],
            won_pct: Metric::rated(won_pct[i], won_ratings[i]),
            avg_score: Metric::rated(avg_score[i], score_ratings[i]),
        })
        .collect()
}

fn fast_line_stats(corpus: &Corpus) -> FastLineStats {
    let correct: Vec<u32> = corpus
        .players()
        .filter_map(|(_, p)| p.fast_line_correct_count)
        .collect();
    let incorrect: Vec<u32> = corpus
        .players()
        .filter_map(|(_, p)| p.fast_line_incorrect_count)
        .collect();

    FastLineStats {
        labels: (0..=FAST_LINE_MAX_BUCKET).collect(),
        correct_data: histogram(correct.iter().copied(), FAST_LINE_MAX_BUCKET),
        incorrect_data: histogram(incorrect.iter().copied(), FAST_LINE_MAX_BUCKET),
        avg_correct: calculate_mean(
            correct.iter().map(|c| *c as i64).sum(),
            correct.len() as u32,
        ),
        avg_incorrect: calculate_mean(
            incorrect.iter().map(|c| *c as i64).sum(),
            incorrect.len() as u32,
        ),
    }
}

/// Comeback summary, the largest comebacks, and the number of games with
/// exactly two advancers.
fn comebacks(corpus: &Corpus) -> (ComebackStats, Vec<Comeback>, u32) {
    let mut fast_line_games = 0u32;
    let mut victories: Vec<Comeback> = Vec::new();

    for (game, outcome) in corpus.with_outcomes() {
        let [first, second] = outcome.advancing.as_slice() else {
            continue;
        };
        fast_line_games += 1;

        let find = |id: &PlayerId| game.players.iter().find(|p| &p.id == id);
        let (Some(a), Some(b)) = (find(first), find(second)) else {
            continue;
        };
        if a.round_total() == b.round_total() {
            continue;
        }
        let (leader, trailer) = if a.round_total() > b.round_total() {
            (a, b)
        } else {
            (b, a)
        };
        if outcome.is_winner(&trailer.id) {
            victories.push(Comeback {
                player: LeaderboardEntry::new(game, trailer),
                diff: leader.round_total().saturating_sub(trailer.round_total()),
            });
        }
    }

    let count = victories.len() as u32;
    let stats = ComebackStats {
        count,
        pct: calculate_pct(count, fast_line_games),
        avg_diff: calculate_mean(
            victories.iter().fold(0i64, |acc, v| acc.saturating_add(v.diff)),
            count,
        ),
        max_diff: victories.iter().map(|v| v.diff).max().unwrap_or(0),
    };

    victories.sort_by(|a, b| b.diff.cmp(&a.diff));
    victories.truncate(TOP_COMEBACKS);

    (stats, victories, fast_line_games)
}

fn final_round_stats(corpus: &Corpus) -> Vec<DistributionBucket> {
    let values: Vec<u32> = corpus
        .players()
        .filter_map(|(_, p)| p.final_round_correct_count)
        .collect();
    let counts = histogram(values.iter().copied(), FINAL_ROUND_MAX_BUCKET);
    distribution(&counts, values.len() as u32)
}

fn top_entries<'a, F>(
    mut rows: Vec<(&'a Game, &'a Player)>,
    limit: usize,
    compare: F,
) -> Vec<LeaderboardEntry>
where
    F: FnMut(&(&'a Game, &'a Player), &(&'a Game, &'a Player)) -> std::cmp::Ordering,
{
    rows.sort_by(compare);
    rows.into_iter()
        .take(limit)
        .map(|(g, p)| LeaderboardEntry::new(g, p))
        .collect()
}

fn top_fast_line_players(corpus: &Corpus) -> Vec<LeaderboardEntry> {
    let rows = corpus
        .players()
        .filter(|(_, p)| p.fast_line_correct_count.is_some())
        .collect();
    top_entries(rows, TOP_FAST_LINE_PLAYERS, |(_, a), (_, b)| {
        b.fast_line_correct_count
            .cmp(&a.fast_line_correct_count)
            .then_with(|| {
                let a_miss = a.fast_line_incorrect_count.unwrap_or(u32::MAX);
                let b_miss = b.fast_line_incorrect_count.unwrap_or(u32::MAX);
                a_miss.cmp(&b_miss)
            })
    })
}

fn top_fast_line_scores(corpus: &Corpus) -> Vec<LeaderboardEntry> {
    let rows = corpus
        .players()
        .filter(|(_, p)| p.fast_line_score.is_some())
        .collect();
    top_entries(rows, TOP_FAST_LINE_SCORES, |(_, a), (_, b)| {
        b.fast_line_total().cmp(&a.fast_line_total())
    })
}

fn winnings_leaderboard(corpus: &Corpus) -> Vec<LeaderboardEntry> {
    top_entries(corpus.players().collect(), TOP_WINNINGS, |(_, a), (_, b)| {
        b.total_winnings
            .cmp(&a.total_winnings)
            .then_with(|| b.fast_line_total().cmp(&a.fast_line_total()))
    })
}

fn podium_leaderboards(corpus: &Corpus) -> Vec<PodiumLeaderboard> {
    (1..=PODIUM_COUNT as u8)
        .map(|podium| {
            let rows = corpus
                .players()
                .filter(|(_, p)| p.podium_number == podium)
                .collect();
            PodiumLeaderboard {
                podium_number: podium,
                players: top_entries(rows, TOP_PER_PODIUM, |(_, a), (_, b)| {
                    b.round_total().cmp(&a.round_total())
                }),
            }
        })
        .collect()
}

fn round_averages(corpus: &Corpus) -> RoundAverages {
    let games = corpus.games.len() as u32;
    let mut per_round_correct = [0i64; ROUND_COUNT];
    for (_, player) in corpus.players() {
        for (i, result) in player.round_correct.iter().enumerate() {
            if *result == Some(true) {
                per_round_correct[i] += 1;
            }
        }
    }

    RoundAverages {
        per_round: per_round_correct
            .iter()
            .map(|c| calculate_mean(*c, games))
            .collect(),
        total: calculate_mean(per_round_correct.iter().sum(), games),
    }
}
