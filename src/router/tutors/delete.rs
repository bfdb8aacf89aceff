use axum::Extension;
use axum::extract::State;
use axum::http::StatusCode;

use crate::AppState;
use crate::error::Result;
use crate::identity::Viewer;
use crate::router::Path;
use crate::tutor::TutorRepository;

/// Handler of `DELETE /tutors/{tutor_id}`. Owner only.
pub async fn handler(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(tutor_id): Path<i64>,
) -> Result<StatusCode> {
    let tutor = super::owned(&state, &viewer, tutor_id).await?;

    TutorRepository::new(state.db.pool.clone())
        .delete(tutor.id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use sqlx::SqlitePool;

    use crate::*;

    #[sqlx::test(fixtures(
        "../../../fixtures/users.sql",
        "../../../fixtures/tutors.sql",
        "../../../fixtures/ratings.sql"
    ))]
    async fn test_delete_handler(pool: SqlitePool) {
        let app = app(router::state(pool.clone()));

        let response =
            make_request(Some(1), app.clone(), Method::DELETE, "/tutors/2", String::default()).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response =
            make_request(Some(2), app.clone(), Method::DELETE, "/tutors/2", String::default()).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let (ratings,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ratings WHERE tutor_id = 2")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(ratings, 0);

        // Bob is a student again.
        let response = make_request(Some(2), app, Method::GET, "/dashboard", String::default()).await;
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let dashboard: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(dashboard["role"], "student");
    }
}
