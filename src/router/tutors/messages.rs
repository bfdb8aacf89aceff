use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::identity::Viewer;
use crate::message::{Message, MessageRepository};
use crate::router::{Path, Valid};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(length(max = 5000, message = "Message must be at most 5000 characters long."))]
    pub content: String,
}

/// Handler of `GET /tutors/{tutor_id}/messages`.
pub async fn history(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(tutor_id): Path<i64>,
) -> Result<Json<Vec<Message>>> {
    let account = viewer.require()?;
    let tutor = super::visible(&state, &viewer, tutor_id).await?;

    Ok(Json(
        MessageRepository::new(state.db.pool.clone())
            .history(account.user.id, tutor.user_id)
            .await?,
    ))
}

/// Handler of `POST /tutors/{tutor_id}/messages`.
pub async fn send(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(tutor_id): Path<i64>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Message>)> {
    let account = viewer.require()?;
    let tutor = super::visible(&state, &viewer, tutor_id).await?;

    let message = MessageRepository::new(state.db.pool.clone())
        .send(account.user.id, tutor.user_id, &body.content)
        .await?;

    Ok((StatusCode::CREATED, Json(message)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use sqlx::SqlitePool;

    use crate::*;

    #[sqlx::test(fixtures("../../../fixtures/users.sql", "../../../fixtures/tutors.sql"))]
    async fn test_message_tutor(pool: SqlitePool) {
        let app = app(router::state(pool));

        let body = json!({ "content": "Hello Bob!" }).to_string();
        let response = make_request(Some(3), app.clone(), Method::POST, "/tutors/2/messages", body).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response =
            make_request(Some(3), app.clone(), Method::GET, "/tutors/2/messages", String::default())
                .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let history: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(history[0]["content"], "Hello Bob!");
        assert_eq!(history[0]["sender_name"], "carol");
        assert_eq!(history[0]["recipient_id"], 2);

        let blank = json!({ "content": "   " }).to_string();
        let response = make_request(Some(3), app.clone(), Method::POST, "/tutors/2/messages", blank).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let own = json!({ "content": "Note to self" }).to_string();
        let response = make_request(Some(2), app.clone(), Method::POST, "/tutors/2/messages", own).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response =
            make_request(None, app, Method::GET, "/tutors/2/messages", String::default()).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
