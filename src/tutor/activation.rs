//! Profile activation derived from the calendar integration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Calendar integration secrets of a tutor.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CalendarCredentials {
    #[sqlx(rename = "calendar_event_url")]
    pub event_url: Option<String>,
    #[sqlx(rename = "calendar_personal_token")]
    pub personal_token: Option<String>,
    #[sqlx(rename = "calendar_access_token")]
    pub access_token: Option<String>,
    #[sqlx(rename = "calendar_refresh_token")]
    pub refresh_token: Option<String>,
    #[sqlx(rename = "calendar_token_expires_at")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CalendarCredentials {
    /// Whether a profile backed by these credentials may be listed.
    ///
    /// Needs a scheduling link and an access token not known to be expired.
    pub fn activates(&self, now: DateTime<Utc>) -> bool {
        let filled = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.trim().is_empty());

        filled(&self.event_url)
            && filled(&self.access_token)
            && self.expires_at.is_none_or(|expiry| expiry > now)
    }
}
