use axum::Extension;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::identity::Viewer;
use crate::router::{Path, Valid};
use crate::tutor::{CalendarCredentials, TutorRepository};

/// Credentials obtained by the front-end from the calendar provider.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(url(message = "Event URL must be an URL."))]
    pub event_url: String,
    #[validate(custom(function = "crate::router::validate_not_blank", message = "Access token cannot be blank."))]
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub personal_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<Body> for CalendarCredentials {
    fn from(body: Body) -> Self {
        CalendarCredentials {
            event_url: Some(body.event_url),
            personal_token: body.personal_token,
            access_token: Some(body.access_token),
            refresh_token: body.refresh_token,
            expires_at: body.expires_at,
        }
    }
}

/// Handler of `PUT /tutors/{tutor_id}/calendar`. Owner only.
///
/// The listing status follows on the next dashboard visit.
pub async fn handler(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(tutor_id): Path<i64>,
    Valid(body): Valid<Body>,
) -> Result<StatusCode> {
    let tutor = super::owned(&state, &viewer, tutor_id).await?;

    TutorRepository::new(state.db.pool.clone())
        .connect_calendar(tutor.id, &body.into())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
