//! Subjects and teaching values attached to tutors.

use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::Result;
use crate::tutor::search::fold;

const DEFAULT_SUBJECT: &str = "Other";

/// Named tag, either a subject or a teaching value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// Tag families linked many-to-many with tutors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Taxonomy {
    Subject,
    Value,
}

impl Taxonomy {
    pub(crate) fn table(self) -> &'static str {
        match self {
            Taxonomy::Subject => "subjects",
            Taxonomy::Value => "teaching_values",
        }
    }

    pub(crate) fn link(self) -> (&'static str, &'static str) {
        match self {
            Taxonomy::Subject => ("tutor_subjects", "subject_id"),
            Taxonomy::Value => ("tutor_values", "value_id"),
        }
    }

    /// Normalized tag name, `None` when the name must be dropped.
    fn normalize(self, name: &str) -> Option<String> {
        let name = name.trim();
        match (self, name.is_empty()) {
            (_, false) => Some(name.to_owned()),
            (Taxonomy::Subject, true) => Some(DEFAULT_SUBJECT.to_owned()),
            (Taxonomy::Value, true) => None,
        }
    }

    /// List every tag, alphabetically.
    pub async fn list(self, pool: &SqlitePool) -> Result<Vec<Tag>> {
        let query = format!("SELECT id, name FROM {} ORDER BY name, id", self.table());

        Ok(sqlx::query_as::<_, Tag>(&query).fetch_all(pool).await?)
    }

    /// Replace the tags linked to a tutor, creating unknown names.
    pub async fn replace(
        self,
        conn: &mut SqliteConnection,
        tutor_id: i64,
        names: &[String],
    ) -> Result<()> {
        let (link, column) = self.link();

        sqlx::query(&format!("DELETE FROM {link} WHERE tutor_id = ?"))
            .bind(tutor_id)
            .execute(&mut *conn)
            .await?;

        let upsert = format!(
            "INSERT INTO {} (name, folded_name) VALUES (?, ?)
                ON CONFLICT (name) DO UPDATE SET folded_name = excluded.folded_name
                RETURNING id",
            self.table()
        );
        let attach = format!(
            "INSERT INTO {link} (tutor_id, {column}) VALUES (?, ?) ON CONFLICT DO NOTHING"
        );

        for name in names.iter().filter_map(|name| self.normalize(name)) {
            let (tag_id,): (i64,) = sqlx::query_as(&upsert)
                .bind(&name)
                .bind(fold(&name))
                .fetch_one(&mut *conn)
                .await?;

            sqlx::query(&attach)
                .bind(tutor_id)
                .bind(tag_id)
                .execute(&mut *conn)
                .await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_subject_becomes_other() {
        assert_eq!(Taxonomy::Subject.normalize("  "), Some("Other".into()));
        assert_eq!(Taxonomy::Subject.normalize(" Maths "), Some("Maths".into()));
        assert_eq!(Taxonomy::Value.normalize(""), None);
    }

    #[sqlx::test(fixtures("../fixtures/users.sql", "../fixtures/tutors.sql"))]
    async fn test_replace_links_and_reuses_names(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        Taxonomy::Subject
            .replace(&mut conn, 3, &["Physics".into(), "Chemistry".into(), "".into()])
            .await
            .unwrap();
        drop(conn);

        let subjects = Taxonomy::Subject.list(&pool).await.unwrap();
        let names: Vec<_> = subjects.iter().map(|s| s.name.as_str()).collect();
        assert!(names.contains(&"Chemistry"));
        assert!(names.contains(&"Other"));
        // "Physics" already existed and must not be duplicated.
        assert_eq!(names.iter().filter(|n| **n == "Physics").count(), 1);

        let (linked,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM tutor_subjects WHERE tutor_id = 3")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(linked, 3);
    }
}
