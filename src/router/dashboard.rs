//! Role-dispatched landing page of an identified user.

use axum::extract::State;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Serialize;

use crate::error::Result;
use crate::identity::Viewer;
use crate::message::{MessageCounts, MessageRepository};
use crate::rating::{Rating, RatingRepository, RatingSummary};
use crate::tutor::{Tutor, TutorRepository};
use crate::user::{Role, User};
use crate::{AppState, ServerError};

#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Dashboard {
    Tutor {
        tutor: Tutor,
        ratings: RatingSummary,
        messages: MessageCounts,
    },
    Student {
        user: User,
        ratings: Vec<Rating>,
        messages: MessageCounts,
    },
}

/// Handler of `GET /dashboard`.
///
/// Visiting it as a tutor recomputes the profile activation.
pub async fn handler(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<Dashboard>> {
    let account = viewer.require()?;
    let pool = state.db.pool;
    let messages = MessageRepository::new(pool.clone())
        .counts(account.user.id)
        .await?;

    let dashboard = match account.role {
        Role::Tutor { tutor_id } => {
            let tutors = TutorRepository::new(pool.clone());
            tutors.refresh_activation(tutor_id, Utc::now()).await?;

            Dashboard::Tutor {
                tutor: tutors
                    .find_by_id(tutor_id)
                    .await?
                    .ok_or(ServerError::NotFound("tutor"))?,
                ratings: RatingRepository::new(pool).summary(tutor_id).await?,
                messages,
            }
        },
        Role::Student => Dashboard::Student {
            user: account.user.clone(),
            ratings: RatingRepository::new(pool)
                .given_by(account.user.id)
                .await?,
            messages,
        },
    };

    Ok(Json(dashboard))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::Value;
    use sqlx::SqlitePool;

    use crate::*;

    async fn dashboard(app: axum::Router, viewer: Option<i64>) -> (StatusCode, Value) {
        let response = make_request(viewer, app, Method::GET, "/dashboard", String::default()).await;
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();

        (status, serde_json::from_slice(&body).unwrap())
    }

    #[sqlx::test(fixtures(
        "../../fixtures/users.sql",
        "../../fixtures/tutors.sql",
        "../../fixtures/ratings.sql",
        "../../fixtures/messages.sql"
    ))]
    async fn test_dashboard_per_role(pool: SqlitePool) {
        let app = app(router::state(pool));

        let (status, body) = dashboard(app.clone(), Some(1)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["role"], "tutor");
        assert_eq!(body["tutor"]["profile_status"], true);
        assert_eq!(body["ratings"]["total"], 5);
        assert_eq!(body["messages"]["received"], 2);

        let (_, body) = dashboard(app.clone(), Some(3)).await;
        assert_eq!(body["role"], "student");
        assert_eq!(body["user"]["username"], "carol");
        assert!(body["user"].get("email").is_none());
        assert_eq!(body["ratings"].as_array().unwrap().len(), 2);
        assert_eq!(body["messages"]["sent"], 2);

        let (status, _) = dashboard(app, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test(fixtures("../../fixtures/users.sql", "../../fixtures/tutors.sql"))]
    async fn test_dashboard_deactivates_without_calendar(pool: SqlitePool) {
        let app = app(router::state(pool));

        // Bob is listed but never connected a calendar.
        let (_, body) = dashboard(app.clone(), Some(2)).await;
        assert_eq!(body["tutor"]["profile_status"], false);

        let response = make_request(None, app, Method::GET, "/tutors", String::default()).await;
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let page: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(page["total"], 1);
    }
}
