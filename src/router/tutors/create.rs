use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::identity::Viewer;
use crate::router::Valid;
use crate::tutor::{Rate, Tutor, TutorDraft, TutorRepository};

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(
        length(min = 1, max = 100, message = "Display name must be 1 to 100 characters long."),
        custom(function = "crate::router::validate_not_blank", message = "Display name cannot be blank.")
    )]
    pub display_name: String,
    pub hourly_rate: Rate,
    #[validate(length(max = 150, message = "Catch-phrase must be at most 150 characters long."))]
    pub catch_phrase: Option<String>,
    #[validate(
        length(min = 1, max = 2000, message = "Description must be 1 to 2000 characters long."),
        custom(function = "crate::router::validate_not_blank", message = "Description cannot be blank.")
    )]
    pub description: String,
    #[validate(url(message = "Profile image must be an URL."))]
    pub profile_image: Option<String>,
    #[validate(length(min = 15, max = 34, message = "IBAN must be 15 to 34 characters long."))]
    pub iban: Option<String>,
    #[serde(default)]
    pub testing_profile: bool,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub values: Vec<String>,
}

impl From<Body> for TutorDraft {
    fn from(body: Body) -> Self {
        TutorDraft {
            display_name: Some(body.display_name.trim().to_owned()),
            hourly_rate: Some(body.hourly_rate),
            catch_phrase: body.catch_phrase.filter(|phrase| !phrase.trim().is_empty()),
            description: Some(body.description),
            profile_image: body.profile_image,
            iban: body.iban,
            testing_profile: Some(body.testing_profile),
            subjects: Some(body.subjects),
            values: Some(body.values),
        }
    }
}

/// Handler of `POST /tutors`. New profiles start unlisted.
pub async fn handler(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Tutor>)> {
    let account = viewer.require()?;

    let tutor = TutorRepository::new(state.db.pool.clone())
        .insert(account.user.id, &body.into())
        .await?;

    Ok((StatusCode::CREATED, Json(tutor)))
}
