use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;

use crate::AppState;
use crate::error::Result;
use crate::identity::Viewer;
use crate::rating::{Rating, RatingRepository, RatingSummary};
use crate::router::Path;
use crate::tutor::Tutor;

/// Tutor page content.
#[derive(Debug, Serialize)]
pub struct Detail {
    pub tutor: Tutor,
    pub ratings: RatingSummary,
    pub reviews: Vec<Rating>,
    /// Review the caller already gave, if any.
    pub viewer_rating: Option<Rating>,
    pub is_owner: bool,
}

/// Handler of `GET /tutors/{tutor_id}`.
pub async fn handler(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(tutor_id): Path<i64>,
) -> Result<Json<Detail>> {
    let tutor = super::visible(&state, &viewer, tutor_id).await?;
    let ratings = RatingRepository::new(state.db.pool.clone());

    let viewer_rating = match viewer.user_id() {
        Some(user_id) => ratings.find_for(tutor.id, user_id).await?,
        None => None,
    };

    Ok(Json(Detail {
        is_owner: viewer.user_id() == Some(tutor.user_id),
        ratings: ratings.summary(tutor.id).await?,
        reviews: ratings.list_for_tutor(tutor.id).await?,
        viewer_rating,
        tutor,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use sqlx::SqlitePool;

    use crate::*;

    async fn detail(app: axum::Router, viewer: Option<i64>, path: &str) -> (StatusCode, Value) {
        let response = make_request(viewer, app, Method::GET, path, String::default()).await;
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();

        (status, serde_json::from_slice(&body).unwrap())
    }

    #[sqlx::test(fixtures(
        "../../../fixtures/users.sql",
        "../../../fixtures/tutors.sql",
        "../../../fixtures/ratings.sql"
    ))]
    async fn test_get_handler(pool: SqlitePool) {
        let app = app(router::state(pool));

        let (status, body) = detail(app.clone(), None, "/tutors/1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tutor"]["display_name"], "Alice Archimedes");
        assert_eq!(body["ratings"]["average"], 4.0);
        assert_eq!(body["ratings"]["histogram"][0]["percentage"], 40.0);
        assert_eq!(body["reviews"].as_array().unwrap().len(), 5);
        assert_eq!(body["viewer_rating"], Value::Null);
        assert_eq!(body["is_owner"], false);
        assert!(body["tutor"].get("iban").is_none());

        let (_, body) = detail(app.clone(), Some(3), "/tutors/1").await;
        assert_eq!(body["viewer_rating"]["score"], 5);

        let (_, body) = detail(app, Some(1), "/tutors/1").await;
        assert_eq!(body["is_owner"], true);
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql", "../../../fixtures/tutors.sql"))]
    async fn test_inactive_profile_is_hidden(pool: SqlitePool) {
        let app = app(router::state(pool));

        let (status, _) = detail(app.clone(), None, "/tutors/3").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = detail(app.clone(), Some(3), "/tutors/3").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Erin still sees her own unlisted profile.
        let (status, body) = detail(app.clone(), Some(5), "/tutors/3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ratings"]["average"], Value::Null);
        assert_eq!(body["ratings"]["total"], 0);

        let (status, _) = detail(app, None, "/tutors/404").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
