use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::Result;
use crate::identity::Viewer;
use crate::rating::{Rating, RatingRepository, RatingSummary};
use crate::router::{Path, Valid};
use crate::{AppState, ServerError};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(range(min = 1, max = 5, message = "Score must be between 1 and 5."))]
    pub score: i64,
    #[serde(default)]
    #[validate(length(max = 2000, message = "Comment must be at most 2000 characters long."))]
    pub comment: String,
}

/// Handler of `GET /tutors/{tutor_id}/ratings`.
pub async fn summary(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(tutor_id): Path<i64>,
) -> Result<Json<RatingSummary>> {
    let tutor = super::visible(&state, &viewer, tutor_id).await?;

    Ok(Json(
        RatingRepository::new(state.db.pool.clone())
            .summary(tutor.id)
            .await?,
    ))
}

/// Handler of `POST /tutors/{tutor_id}/ratings`.
///
/// Answers `201 Created` for a first rating, `200 OK` when it replaced
/// the previous one.
pub async fn upsert(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(tutor_id): Path<i64>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Rating>)> {
    let account = viewer.require()?;
    let tutor = super::visible(&state, &viewer, tutor_id).await?;

    if !tutor.profile_status {
        return Err(ServerError::NotFound("tutor"));
    }
    if tutor.user_id == account.user.id {
        return Err(ServerError::Forbidden("You cannot rate your own profile."));
    }

    let upserted = RatingRepository::new(state.db.pool.clone())
        .upsert(tutor.id, account.user.id, body.score, body.comment.trim())
        .await?;

    let status = if upserted.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };

    Ok((status, Json(upserted.rating)))
}
