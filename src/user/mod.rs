mod repository;

pub use repository::*;

use serde::{Deserialize, Serialize};

/// Account mirrored from the identity provider.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip)]
    pub email: String,
}

/// Role of an identified user, resolved once per request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Role {
    Tutor { tutor_id: i64 },
    Student,
}

impl Role {
    /// Role derived from an optional linked tutor profile.
    pub fn from_tutor(tutor_id: Option<i64>) -> Self {
        match tutor_id {
            Some(tutor_id) => Role::Tutor { tutor_id },
            None => Role::Student,
        }
    }
}
