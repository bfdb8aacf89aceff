use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{Result, ServerError};
use crate::rating::{Rating, RatingSummary};

const RATING_SELECT: &str = r#"
    SELECT r.id, r.tutor_id, r.user_id, u.username, r.score, r.comment, r.created_at, r.updated_at
    FROM ratings r
    JOIN users u ON u.id = r.user_id
"#;

/// Outcome of [`RatingRepository::upsert`].
#[derive(Clone, Debug, PartialEq)]
pub struct Upserted {
    pub rating: Rating,
    pub created: bool,
}

#[derive(Clone)]
pub struct RatingRepository {
    pool: SqlitePool,
}

impl RatingRepository {
    /// Create a new [`RatingRepository`].
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or replace the rating `user_id` gave to `tutor_id`.
    ///
    /// A write racing with another one on the same pair is retried once,
    /// then reported as [`ServerError::Conflict`].
    pub async fn upsert(
        &self,
        tutor_id: i64,
        user_id: i64,
        score: i64,
        comment: &str,
    ) -> Result<Upserted> {
        let (id, created) = match self.try_upsert(tutor_id, user_id, score, comment).await {
            Err(err) if is_transient(&err) => {
                tracing::warn!(tutor_id, user_id, error = %err, "rating upsert conflicted, retrying");

                self.try_upsert(tutor_id, user_id, score, comment)
                    .await
                    .map_err(|err| {
                        if is_transient(&err) {
                            ServerError::Conflict("Rating was modified concurrently, try again.".into())
                        } else {
                            err.into()
                        }
                    })?
            },
            result => result?,
        };

        let outcome = if created { "created" } else { "updated" };
        metrics::counter!("ratings_upserted_total", "outcome" => outcome).increment(1);
        tracing::info!(tutor_id, user_id, score, created, "rating saved");

        let rating = self.find_by_id(id).await?.ok_or(ServerError::NotFound("rating"))?;
        Ok(Upserted { rating, created })
    }

    async fn try_upsert(
        &self,
        tutor_id: i64,
        user_id: i64,
        score: i64,
        comment: &str,
    ) -> std::result::Result<(i64, bool), sqlx::Error> {
        let now = Utc::now();

        sqlx::query_as::<_, (i64, bool)>(
            r#"INSERT INTO ratings (tutor_id, user_id, score, comment, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ON CONFLICT (tutor_id, user_id) DO UPDATE SET
                    score = excluded.score,
                    comment = excluded.comment,
                    updated_at = excluded.updated_at
                RETURNING id, created_at = updated_at"#,
        )
        .bind(tutor_id)
        .bind(user_id)
        .bind(score)
        .bind(comment)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
    }

    pub async fn find_by_id(&self, rating_id: i64) -> Result<Option<Rating>> {
        Ok(sqlx::query_as::<_, Rating>(&format!("{RATING_SELECT} WHERE r.id = ?"))
            .bind(rating_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Rating `user_id` gave to `tutor_id`, if any.
    pub async fn find_for(&self, tutor_id: i64, user_id: i64) -> Result<Option<Rating>> {
        Ok(sqlx::query_as::<_, Rating>(&format!(
            "{RATING_SELECT} WHERE r.tutor_id = ? AND r.user_id = ?"
        ))
        .bind(tutor_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    /// Reviews of a tutor, last updated first.
    pub async fn list_for_tutor(&self, tutor_id: i64) -> Result<Vec<Rating>> {
        Ok(sqlx::query_as::<_, Rating>(&format!(
            "{RATING_SELECT} WHERE r.tutor_id = ? ORDER BY r.updated_at DESC, r.id DESC"
        ))
        .bind(tutor_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Reviews written by a user, last updated first.
    pub async fn given_by(&self, user_id: i64) -> Result<Vec<Rating>> {
        Ok(sqlx::query_as::<_, Rating>(&format!(
            "{RATING_SELECT} WHERE r.user_id = ? ORDER BY r.updated_at DESC, r.id DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Average and histogram of a tutor's reviews.
    pub async fn summary(&self, tutor_id: i64) -> Result<RatingSummary> {
        let counts = sqlx::query_as::<_, (i64, i64)>(
            "SELECT score, COUNT(*) FROM ratings WHERE tutor_id = ? GROUP BY score",
        )
        .bind(tutor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(RatingSummary::from_counts(&counts))
    }
}

/// Unique violations and `SQLITE_BUSY` family errors.
fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() || matches!(db.code().as_deref(), Some("5" | "517"))
        },
        _ => false,
    }
}
