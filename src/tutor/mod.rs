mod activation;
mod rate;
mod repository;
pub mod search;

pub use activation::*;
pub use rate::*;
pub use repository::*;

use serde::{Deserialize, Serialize};

pub const DEFAULT_CATCH_PHRASE: &str = "Tutoring with a smile!";

/// Tutor profile as exposed to the public.
///
/// Payout and calendar secrets are never selected into this type, see
/// [`CalendarCredentials`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tutor {
    pub id: i64,
    pub user_id: i64,
    pub display_name: String,
    pub hourly_rate: Rate,
    pub catch_phrase: String,
    pub description: String,
    pub profile_image: Option<String>,
    pub calendar_event_url: Option<String>,
    pub profile_status: bool,
    pub testing_profile: bool,
    #[sqlx(json)]
    pub subjects: Vec<String>,
    #[sqlx(json)]
    pub values: Vec<String>,
}

/// Tutor with its review aggregates, as shown in listings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TutorListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub tutor: Tutor,
    pub average_rating: Option<f64>,
    pub review_count: i64,
}

/// Editable profile fields.
///
/// `None` leaves the stored value untouched on update.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TutorDraft {
    pub display_name: Option<String>,
    pub hourly_rate: Option<Rate>,
    pub catch_phrase: Option<String>,
    pub description: Option<String>,
    pub profile_image: Option<String>,
    pub iban: Option<String>,
    pub testing_profile: Option<bool>,
    pub subjects: Option<Vec<String>>,
    pub values: Option<Vec<String>>,
}
