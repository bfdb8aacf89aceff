//! Handle tutor profile requests.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{Result, ServerError};
use crate::taxonomy::Taxonomy;
use crate::tutor::search::search_text;
use crate::tutor::{CalendarCredentials, DEFAULT_CATCH_PHRASE, Tutor, TutorDraft};

/// Public tutor columns, `t` being the `tutors` alias.
pub(crate) const TUTOR_COLUMNS: &str = r#"
    t.id,
    t.user_id,
    t.display_name,
    t.hourly_rate,
    t.catch_phrase,
    t.description,
    t.profile_image,
    t.calendar_event_url,
    t.profile_status,
    t.testing_profile,
    (SELECT json_group_array(s.name)
        FROM tutor_subjects ts
        JOIN subjects s ON s.id = ts.subject_id
        WHERE ts.tutor_id = t.id) AS subjects,
    (SELECT json_group_array(v.name)
        FROM tutor_values tv
        JOIN teaching_values v ON v.id = tv.value_id
        WHERE tv.tutor_id = t.id) AS "values"
"#;

#[derive(Clone)]
pub struct TutorRepository {
    pool: SqlitePool,
}

impl TutorRepository {
    /// Create a new [`TutorRepository`].
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Find a tutor using `id` field.
    pub async fn find_by_id(&self, tutor_id: i64) -> Result<Option<Tutor>> {
        let query = format!("SELECT {TUTOR_COLUMNS} FROM tutors t WHERE t.id = ?");

        Ok(sqlx::query_as::<_, Tutor>(&query)
            .bind(tutor_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Insert a new, inactive, tutor profile for `user_id`.
    ///
    /// A user owns at most one profile: a second one is a conflict.
    pub async fn insert(&self, user_id: i64, draft: &TutorDraft) -> Result<Tutor> {
        let mut tx = self.pool.begin().await?;

        let display_name = draft.display_name.as_deref().unwrap_or_default();
        let catch_phrase = draft.catch_phrase.as_deref().unwrap_or(DEFAULT_CATCH_PHRASE);
        let description = draft.description.as_deref().unwrap_or_default();

        let inserted = sqlx::query_as::<_, (i64,)>(
            r#"INSERT INTO tutors
                (user_id, display_name, hourly_rate, catch_phrase, description, profile_image, iban, testing_profile, search_text)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                RETURNING id"#,
        )
        .bind(user_id)
        .bind(display_name)
        .bind(draft.hourly_rate.unwrap_or_default())
        .bind(catch_phrase)
        .bind(description)
        .bind(&draft.profile_image)
        .bind(&draft.iban)
        .bind(draft.testing_profile.unwrap_or(false))
        .bind(search_text(display_name, catch_phrase, description))
        .fetch_one(&mut *tx)
        .await;

        let (tutor_id,) = match inserted {
            Ok(row) => row,
            Err(sqlx::Error::Database(err)) if err.is_unique_violation() => {
                return Err(ServerError::Conflict(
                    "You already have a tutor profile.".into(),
                ));
            },
            Err(err) => return Err(err.into()),
        };

        if let Some(subjects) = &draft.subjects {
            Taxonomy::Subject.replace(&mut tx, tutor_id, subjects).await?;
        }
        if let Some(values) = &draft.values {
            Taxonomy::Value.replace(&mut tx, tutor_id, values).await?;
        }

        tx.commit().await?;
        tracing::info!(tutor_id, user_id, "tutor profile created");

        self.find_by_id(tutor_id)
            .await?
            .ok_or(ServerError::NotFound("tutor"))
    }

    /// Apply the fields present in `draft`.
    pub async fn update(&self, tutor_id: i64, draft: &TutorDraft) -> Result<Tutor> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"UPDATE tutors SET
                display_name = COALESCE(?, display_name),
                hourly_rate = COALESCE(?, hourly_rate),
                catch_phrase = COALESCE(?, catch_phrase),
                description = COALESCE(?, description),
                profile_image = COALESCE(?, profile_image),
                iban = COALESCE(?, iban),
                testing_profile = COALESCE(?, testing_profile)
                WHERE id = ?"#,
        )
        .bind(&draft.display_name)
        .bind(draft.hourly_rate)
        .bind(&draft.catch_phrase)
        .bind(&draft.description)
        .bind(&draft.profile_image)
        .bind(&draft.iban)
        .bind(draft.testing_profile)
        .bind(tutor_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ServerError::NotFound("tutor"));
        }
        reindex(&mut tx, tutor_id).await?;

        if let Some(subjects) = &draft.subjects {
            Taxonomy::Subject.replace(&mut tx, tutor_id, subjects).await?;
        }
        if let Some(values) = &draft.values {
            Taxonomy::Value.replace(&mut tx, tutor_id, values).await?;
        }

        tx.commit().await?;
        tracing::info!(tutor_id, "tutor profile updated");

        self.find_by_id(tutor_id)
            .await?
            .ok_or(ServerError::NotFound("tutor"))
    }

    /// Delete a tutor profile; its owner falls back to the student role.
    pub async fn delete(&self, tutor_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM tutors WHERE id = ?")
            .bind(tutor_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServerError::NotFound("tutor"));
        }

        tracing::info!(tutor_id, "tutor profile deleted");
        Ok(())
    }

    /// Store calendar integration credentials.
    pub async fn connect_calendar(
        &self,
        tutor_id: i64,
        credentials: &CalendarCredentials,
    ) -> Result<()> {
        sqlx::query(
            r#"UPDATE tutors SET
                calendar_event_url = ?,
                calendar_personal_token = ?,
                calendar_access_token = ?,
                calendar_refresh_token = ?,
                calendar_token_expires_at = ?
                WHERE id = ?"#,
        )
        .bind(&credentials.event_url)
        .bind(&credentials.personal_token)
        .bind(&credentials.access_token)
        .bind(&credentials.refresh_token)
        .bind(credentials.expires_at)
        .bind(tutor_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Recompute `profile_status` from the stored calendar credentials.
    ///
    /// Listings running concurrently keep seeing the previous status until
    /// this update commits.
    pub async fn refresh_activation(
        &self,
        tutor_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let credentials = sqlx::query_as::<_, CalendarCredentials>(
            r#"SELECT calendar_event_url, calendar_personal_token, calendar_access_token,
                calendar_refresh_token, calendar_token_expires_at
                FROM tutors WHERE id = ?"#,
        )
        .bind(tutor_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(ServerError::NotFound("tutor"))?;

        let active = credentials.activates(now);
        sqlx::query("UPDATE tutors SET profile_status = ? WHERE id = ?")
            .bind(active)
            .bind(tutor_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        metrics::counter!("tutor_activations_total", "status" => if active { "active" } else { "inactive" })
            .increment(1);
        tracing::debug!(tutor_id, active, "profile activation refreshed");

        Ok(active)
    }
}

/// Rewrite the folded free text searched by listings.
async fn reindex(conn: &mut SqliteConnection, tutor_id: i64) -> Result<()> {
    let (display_name, catch_phrase, description) = sqlx::query_as::<_, (String, String, String)>(
        "SELECT display_name, catch_phrase, description FROM tutors WHERE id = ?",
    )
    .bind(tutor_id)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query("UPDATE tutors SET search_text = ? WHERE id = ?")
        .bind(search_text(&display_name, &catch_phrase, &description))
        .bind(tutor_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
