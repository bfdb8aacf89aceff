use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::AppState;
use crate::error::Result;
use crate::identity::Viewer;
use crate::router::{Path, Valid};
use crate::tutor::{Rate, Tutor, TutorDraft, TutorRepository};

/// Partial profile update. Supplied tag lists replace the current ones.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(
        length(min = 1, max = 100, message = "Display name must be 1 to 100 characters long."),
        custom(function = "crate::router::validate_not_blank", message = "Display name cannot be blank.")
    )]
    pub display_name: Option<String>,
    pub hourly_rate: Option<Rate>,
    #[validate(length(max = 150, message = "Catch-phrase must be at most 150 characters long."))]
    pub catch_phrase: Option<String>,
    #[validate(
        length(min = 1, max = 2000, message = "Description must be 1 to 2000 characters long."),
        custom(function = "crate::router::validate_not_blank", message = "Description cannot be blank.")
    )]
    pub description: Option<String>,
    #[validate(url(message = "Profile image must be an URL."))]
    pub profile_image: Option<String>,
    #[validate(length(min = 15, max = 34, message = "IBAN must be 15 to 34 characters long."))]
    pub iban: Option<String>,
    pub testing_profile: Option<bool>,
    pub subjects: Option<Vec<String>>,
    pub values: Option<Vec<String>>,
}

impl From<Body> for TutorDraft {
    fn from(body: Body) -> Self {
        TutorDraft {
            display_name: body.display_name.map(|name| name.trim().to_owned()),
            hourly_rate: body.hourly_rate,
            catch_phrase: body.catch_phrase.filter(|phrase| !phrase.trim().is_empty()),
            description: body.description,
            profile_image: body.profile_image,
            iban: body.iban,
            testing_profile: body.testing_profile,
            subjects: body.subjects,
            values: body.values,
        }
    }
}

/// Handler of `PATCH /tutors/{tutor_id}`. Owner only.
pub async fn handler(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(tutor_id): Path<i64>,
    Valid(body): Valid<Body>,
) -> Result<Json<Tutor>> {
    let tutor = super::owned(&state, &viewer, tutor_id).await?;

    let tutor = TutorRepository::new(state.db.pool.clone())
        .update(tutor.id, &body.into())
        .await?;

    Ok(Json(tutor))
}
