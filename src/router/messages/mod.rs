//! Direct messages between users.
pub mod conversations;
mod history;
mod inbox;
mod send;

use axum::Router;
use axum::routing::get;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        // `GET /messages` lists the inbox, `POST /messages` sends by e-mail.
        .route("/", get(inbox::handler).post(send::handler))
        .route("/{user_id}", get(history::handler))
}
