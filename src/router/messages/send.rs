use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::database::Database;
use crate::error::Result;
use crate::identity::Viewer;
use crate::message::{Message, MessageRepository};
use crate::router::Valid;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(email(message = "Email must be formatted."))]
    pub email: String,
    #[validate(length(max = 5000, message = "Message must be at most 5000 characters long."))]
    pub content: String,
}

/// Handler of `POST /messages`, addressing the recipient by e-mail.
pub async fn handler(
    State(db): State<Database>,
    Extension(viewer): Extension<Viewer>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Message>)> {
    let account = viewer.require()?;

    let message = MessageRepository::new(db.pool)
        .send_to_email(account.user.id, &body.email, &body.content)
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

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_send_handler(pool: SqlitePool) {
        let app = app(router::state(pool));

        let body = json!({ "email": "bob@example.com", "content": "  Are you free?  " }).to_string();
        let response = make_request(Some(3), app.clone(), Method::POST, "/messages", body).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let message: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(message["recipient_name"], "bob");
        assert_eq!(message["content"], "  Are you free?  ");

        let unknown = json!({ "email": "nobody@example.com", "content": "Hello" }).to_string();
        let response = make_request(Some(3), app.clone(), Method::POST, "/messages", unknown).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let malformed = json!({ "email": "bob", "content": "Hello" }).to_string();
        let response = make_request(Some(3), app, Method::POST, "/messages", malformed).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
