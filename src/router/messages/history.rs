use axum::extract::State;
use axum::{Extension, Json};

use crate::database::Database;
use crate::error::{Result, ServerError};
use crate::identity::Viewer;
use crate::message::{Message, MessageRepository};
use crate::router::Path;
use crate::user::UserRepository;

/// Handler of `GET /messages/{user_id}`.
pub async fn handler(
    State(db): State<Database>,
    Extension(viewer): Extension<Viewer>,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<Message>>> {
    let account = viewer.require()?;

    UserRepository::new(db.pool.clone())
        .find_by_id(user_id)
        .await?
        .ok_or(ServerError::NotFound("user"))?;

    Ok(Json(
        MessageRepository::new(db.pool)
            .history(account.user.id, user_id)
            .await?,
    ))
}
