use axum::extract::State;
use axum::{Extension, Json};

use crate::database::Database;
use crate::error::Result;
use crate::identity::Viewer;
use crate::message::{Inbox, MessageRepository};

/// Handler of `GET /messages`.
pub async fn handler(
    State(db): State<Database>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<Inbox>> {
    let account = viewer.require()?;

    Ok(Json(
        MessageRepository::new(db.pool)
            .inbox(account.user.id)
            .await?,
    ))
}
