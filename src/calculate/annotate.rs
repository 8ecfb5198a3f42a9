//! Relative ratings for sibling statistic rows.

use crate::models::{Metric, Rating};

/// Rate each value against its siblings.
///
/// The maximum is favorable, the minimum unfavorable, everything else
/// neutral. When all values are equal every row is neutral. The output is
/// aligned with the input.
pub fn annotate(values: &[f64]) -> Vec<Rating> {
    let Some(first) = values.first() else {
        return Vec::new();
    };
    let (min, max) = values
        .iter()
        .fold((*first, *first), |(lo, hi), v| (lo.min(*v), hi.max(*v)));

    values
        .iter()
        .map(|v| {
            if min == max {
                Rating::Neutral
            } else if *v == max {
                Rating::Favorable
            } else if *v == min {
                Rating::Unfavorable
            } else {
                Rating::Neutral
            }
        })
        .collect()
}

/// Pair each value with its rating.
pub fn rated_metrics(values: &[f64]) -> Vec<Metric> {
    values
        .iter()
        .zip(annotate(values))
        .map(|(v, r)| Metric::rated(*v, r))
        .collect()
}

/// Rate by rank: the top `favorable` rows are favorable, the bottom
/// `unfavorable` rows unfavorable. Equal values keep input order.
pub fn annotate_by_rank(values: &[f64], favorable: usize, unfavorable: usize) -> Vec<Rating> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|a, b| values[*b].total_cmp(&values[*a]));

    let mut ratings = vec![Rating::Neutral; values.len()];
    for (rank, idx) in order.iter().enumerate() {
        if rank < favorable {
            ratings[*idx] = Rating::Favorable;
        } else if rank >= values.len().saturating_sub(unfavorable) {
            ratings[*idx] = Rating::Unfavorable;
        }
    }
    ratings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotate_empty() {
        assert!(annotate(&[]).is_empty());
    }

    #[test]
    fn test_annotate_all_equal_is_neutral() {
        let ratings = annotate(&[25.0, 25.0, 25.0, 25.0]);
        assert!(ratings.iter().all(|r| *r == Rating::Neutral));
    }

    #[test]
    fn test_annotate_single_row_is_neutral() {
        assert_eq!(annotate(&[3.0]), vec![Rating::Neutral]);
    }

    #[test]
    fn test_annotate_distinct_values() {
        let ratings = annotate(&[10.0, 40.0, 20.0, 5.0]);
        assert_eq!(
            ratings,
            vec![
                Rating::Neutral,
                Rating::Favorable,
                Rating::Neutral,
                Rating::Unfavorable
            ]
        );
    }

    #[test]
    fn test_annotate_ties_share_rating() {
        let ratings = annotate(&[40.0, 40.0, 5.0, 5.0, 20.0]);
        assert_eq!(
            ratings,
            vec![
                Rating::Favorable,
                Rating::Favorable,
                Rating::Unfavorable,
                Rating::Unfavorable,
                Rating::Neutral
            ]
        );
    }

    #[test]
    fn test_fields_are_rated_independently() {
        let rows = [(1.0, 9.0), (2.0, 3.0)];
        let a: Vec<f64> = rows.iter().map(|r| r.0).collect();
        let b: Vec<f64> = rows.iter().map(|r| r.1).collect();

        // The same row can be favorable on one field and unfavorable on another
        assert_eq!(annotate(&a), vec![Rating::Unfavorable, Rating::Favorable]);
        assert_eq!(annotate(&b), vec![Rating::Favorable, Rating::Unfavorable]);
    }

    #[test]
    fn test_rated_metrics_keep_values() {
        let metrics = rated_metrics(&[1.0, 2.0]);
        assert_eq!(metrics[0], Metric::rated(1.0, Rating::Unfavorable));
        assert_eq!(metrics[1], Metric::rated(2.0, Rating::Favorable));
    }

    #[test]
    fn test_annotate_by_rank_top_two_bottom_two() {
        let ratings = annotate_by_rank(&[30.0, 60.0, 10.0, 45.0], 2, 2);
        assert_eq!(
            ratings,
            vec![
                Rating::Unfavorable,
                Rating::Favorable,
                Rating::Unfavorable,
                Rating::Favorable
            ]
        );
    }

    #[test]
    fn test_annotate_by_rank_ties_keep_input_order() {
        let ratings = annotate_by_rank(&[50.0, 50.0, 50.0, 50.0], 2, 2);
        assert_eq!(
            ratings,
            vec![
                Rating::Favorable,
                Rating::Favorable,
                Rating::Unfavorable,
                Rating::Unfavorable
            ]
        );
    }
}
