use axum::extract::State;
use axum::{Extension, Json};

use crate::database::Database;
use crate::error::Result;
use crate::identity::Viewer;
use crate::message::{Conversation, MessageRepository};

/// Handler of `GET /conversations`.
pub async fn handler(
    State(db): State<Database>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<Vec<Conversation>>> {
    let account = viewer.require()?;

    Ok(Json(
        MessageRepository::new(db.pool)
            .conversations_for(account.user.id)
            .await?,
    ))
}
