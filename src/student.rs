//! Student profiles.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id: i64,
    pub display_name: String,
    pub profile_image: Option<String>,
}

impl Student {
    /// Find a student using `id` field.
    pub async fn find_by_id(pool: &SqlitePool, student_id: i64) -> Result<Option<Self>> {
        Ok(sqlx::query_as::<_, Student>(
            "SELECT id, display_name, profile_image FROM students WHERE id = ?",
        )
        .bind(student_id)
        .fetch_optional(pool)
        .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(fixtures("../fixtures/users.sql"))]
    async fn test_find_by_id(pool: SqlitePool) {
        let student = Student::find_by_id(&pool, 2).await.unwrap().unwrap();
        assert_eq!(student.display_name, "Dave Dirac");
        assert_eq!(student.profile_image, None);

        assert!(Student::find_by_id(&pool, 404).await.unwrap().is_none());
    }
}
