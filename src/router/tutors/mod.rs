//! Tutor-related HTTP API.
mod calendar;
mod create;
mod delete;
mod get;
mod list;
mod messages;
mod ratings;
mod update;

use axum::Router;
use axum::routing::{get, put};

use crate::identity::Viewer;
use crate::tutor::{Tutor, TutorRepository};
use crate::{AppState, ServerError};

pub fn router() -> Router<AppState> {
    Router::new()
        // `GET /tutors` goes to the search, `POST /tutors` creates a profile.
        .route("/", get(list::handler).post(create::handler))
        .route(
            "/{tutor_id}",
            get(get::handler)
                .patch(update::handler)
                .delete(delete::handler),
        )
        .route("/{tutor_id}/calendar", put(calendar::handler))
        .route(
            "/{tutor_id}/ratings",
            get(ratings::summary).post(ratings::upsert),
        )
        .route(
            "/{tutor_id}/messages",
            get(messages::history).post(messages::send),
        )
}

/// Tutor `tutor_id` when the caller owns it.
async fn owned(state: &AppState, viewer: &Viewer, tutor_id: i64) -> Result<Tutor, ServerError> {
    let account = viewer.require()?;
    let tutor = TutorRepository::new(state.db.pool.clone())
        .find_by_id(tutor_id)
        .await?
        .ok_or(ServerError::NotFound("tutor"))?;

    if tutor.user_id != account.user.id {
        return Err(ServerError::Forbidden("You do not own this tutor profile."));
    }

    Ok(tutor)
}

/// Tutor `tutor_id` when listed, or when the caller owns it.
async fn visible(state: &AppState, viewer: &Viewer, tutor_id: i64) -> Result<Tutor, ServerError> {
    let tutor = TutorRepository::new(state.db.pool.clone())
        .find_by_id(tutor_id)
        .await?
        .ok_or(ServerError::NotFound("tutor"))?;

    if tutor.profile_status || viewer.user_id() == Some(tutor.user_id) {
        Ok(tutor)
    } else {
        Err(ServerError::NotFound("tutor"))
    }
}
