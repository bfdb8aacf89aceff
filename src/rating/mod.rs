mod repository;

pub use repository::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scores allowed for a review.
pub const SCORES: std::ops::RangeInclusive<i64> = 1..=5;

/// Review of a tutor, one per (tutor, user) pair.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Rating {
    pub id: i64,
    pub tutor_id: i64,
    pub user_id: i64,
    pub username: String,
    pub score: i64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Share of the reviews given one score.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Bucket {
    pub score: i64,
    pub count: i64,
    pub percentage: f64,
}

/// Average and per-score breakdown of a tutor's reviews.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RatingSummary {
    pub average: Option<f64>,
    pub total: i64,
    /// Scores 5 down to 1.
    pub histogram: Vec<Bucket>,
}

impl RatingSummary {
    /// Build a summary from `(score, count)` pairs.
    ///
    /// Scores absent from `counts` get an empty bucket.
    pub fn from_counts(counts: &[(i64, i64)]) -> Self {
        let count_of = |score: i64| {
            counts
                .iter()
                .filter(|(s, _)| *s == score)
                .map(|(_, count)| count)
                .sum::<i64>()
        };

        let total: i64 = SCORES.map(count_of).sum();
        let weighted: i64 = SCORES.map(|score| score * count_of(score)).sum();

        let histogram = SCORES
            .rev()
            .map(|score| {
                let count = count_of(score);
                let percentage = if total == 0 {
                    0.0
                } else {
                    count as f64 * 100.0 / total as f64
                };

                Bucket {
                    score,
                    count,
                    percentage,
                }
            })
            .collect();

        Self {
            average: (total > 0).then(|| weighted as f64 / total as f64),
            total,
            histogram,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_of_five_reviews() {
        let summary = RatingSummary::from_counts(&[(5, 2), (4, 1), (3, 2)]);

        assert_eq!(summary.average, Some(4.0));
        assert_eq!(summary.total, 5);
        let buckets: Vec<_> = summary
            .histogram
            .iter()
            .map(|b| (b.score, b.count, b.percentage))
            .collect();
        assert_eq!(
            buckets,
            vec![(5, 2, 40.0), (4, 1, 20.0), (3, 2, 40.0), (2, 0, 0.0), (1, 0, 0.0)]
        );
    }

    #[test]
    fn test_summary_without_reviews() {
        let summary = RatingSummary::from_counts(&[]);

        assert_eq!(summary.average, None);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.histogram.len(), 5);
        assert!(summary.histogram.iter().all(|b| b.count == 0 && b.percentage == 0.0));
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let samples: [&[(i64, i64)]; 4] = [
            &[(1, 1)],
            &[(5, 1), (4, 1), (3, 1)],
            &[(5, 7), (2, 3), (1, 1)],
            &[(1, 2), (2, 2), (3, 2), (4, 2), (5, 5)],
        ];

        for counts in samples {
            let summary = RatingSummary::from_counts(counts);
            let sum: f64 = summary.histogram.iter().map(|b| b.percentage).sum();
            assert!((sum - 100.0).abs() < 1e-9, "{counts:?} sums to {sum}");
        }
    }
}
