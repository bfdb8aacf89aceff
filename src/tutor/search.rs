//! Filtered, sorted and paginated tutor listings.

use std::str::FromStr;

use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::error::{Result, ServerError};
use crate::taxonomy::Taxonomy;
use crate::tutor::{TUTOR_COLUMNS, TutorListing};

/// Tutors per page.
pub const PAGE_SIZE: i64 = 6;

/// Review aggregates joined as `r`.
const RATING_STATS: &str = r#"
    LEFT JOIN (
        SELECT tutor_id, AVG(score) AS average, COUNT(*) AS reviews
        FROM ratings
        GROUP BY tutor_id
    ) r ON r.tutor_id = t.id
"#;

/// Listing order. Ties always break on display name then id.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Sorting {
    #[default]
    Name,
    Cheapest,
    MostExpensive,
    HighestRated,
    MostReviews,
}

impl Sorting {
    fn order_by(self) -> &'static str {
        match self {
            Sorting::Name => "t.display_name, t.id",
            Sorting::Cheapest => "t.hourly_rate ASC, t.display_name, t.id",
            Sorting::MostExpensive => "t.hourly_rate DESC, t.display_name, t.id",
            Sorting::HighestRated => "COALESCE(r.average, 0) DESC, t.display_name, t.id",
            Sorting::MostReviews => "COALESCE(r.reviews, 0) DESC, t.display_name, t.id",
        }
    }
}

impl FromStr for Sorting {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" | "name" => Ok(Sorting::Name),
            "cheapest" => Ok(Sorting::Cheapest),
            "most-expensive" => Ok(Sorting::MostExpensive),
            "highest-rated" => Ok(Sorting::HighestRated),
            "most-reviews" => Ok(Sorting::MostReviews),
            _ => Err(ServerError::invalid(
                "sorting",
                "unknown_sorting",
                "Sorting must be one of name, cheapest, most-expensive, highest-rated or most-reviews.",
            )),
        }
    }
}

/// One page of results.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub total_pages: i64,
    pub total: i64,
}

/// Search criteria, every one optional.
#[derive(Clone, Debug, PartialEq)]
pub struct TutorSearch {
    pub subjects: Vec<String>,
    pub values: Vec<String>,
    pub text: Option<String>,
    pub sorting: Sorting,
    pub page: i64,
}

impl Default for TutorSearch {
    fn default() -> Self {
        Self {
            subjects: Vec::new(),
            values: Vec::new(),
            text: None,
            sorting: Sorting::default(),
            page: 1,
        }
    }
}

impl TutorSearch {
    /// Read criteria from a raw query string, where keys may repeat.
    pub fn from_query(query: &str) -> Result<Self> {
        let mut search = Self::default();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "subject" | "subjects" => push_term(&mut search.subjects, &value),
                "teachingvalue" => push_term(&mut search.values, &value),
                "q" => {
                    let text = value.trim();
                    search.text = (!text.is_empty()).then(|| text.to_owned());
                },
                "sorting" => search.sorting = value.parse()?,
                "page" => search.page = parse_page(&value),
                _ => {},
            }
        }

        Ok(search)
    }

    /// Run the search, clamping the requested page into range.
    pub async fn fetch(&self, pool: &SqlitePool) -> Result<Page<TutorListing>> {
        let (total,): (i64,) = self
            .filtered("SELECT COUNT(*)")
            .build_query_as()
            .fetch_one(pool)
            .await?;

        let total_pages = ((total + PAGE_SIZE - 1) / PAGE_SIZE).max(1);
        let page = self.page.clamp(1, total_pages);

        let mut query = self.filtered(&format!(
            "SELECT {TUTOR_COLUMNS}, r.average AS average_rating, COALESCE(r.reviews, 0) AS review_count"
        ));
        query
            .push(" ORDER BY ")
            .push(self.sorting.order_by())
            .push(" LIMIT ")
            .push_bind(PAGE_SIZE)
            .push(" OFFSET ")
            .push_bind((page - 1) * PAGE_SIZE);

        let items = query
            .build_query_as::<TutorListing>()
            .fetch_all(pool)
            .await?;

        tracing::debug!(total, page, sorting = ?self.sorting, "tutor search");

        Ok(Page {
            items,
            page,
            total_pages,
            total,
        })
    }

    /// `select` followed by the joins and every active criterion.
    fn filtered(&self, select: &str) -> QueryBuilder<'static, Sqlite> {
        let mut query = QueryBuilder::new(select);
        query
            .push(" FROM tutors t")
            .push(RATING_STATS)
            .push(" WHERE t.profile_status = 1");

        if !self.subjects.is_empty() {
            query.push(" AND (");
            push_tag_match(&mut query, Taxonomy::Subject, &self.subjects);
            query.push(")");
        }

        if !self.values.is_empty() {
            query.push(" AND (");
            push_tag_match(&mut query, Taxonomy::Value, &self.values);
            query.push(")");
        }

        if let Some(text) = &self.text {
            query
                .push(" AND (t.search_text LIKE ")
                .push_bind(like_pattern(&fold(text)))
                .push(" ESCAPE '\\' OR ");
            push_tag_match(&mut query, Taxonomy::Subject, std::slice::from_ref(text));
            query.push(" OR ");
            push_tag_match(&mut query, Taxonomy::Value, std::slice::from_ref(text));
            query.push(")");
        }

        query
    }
}

/// `EXISTS` clauses, OR'ed, matching tutors tagged with any of `terms`.
fn push_tag_match(query: &mut QueryBuilder<'static, Sqlite>, taxonomy: Taxonomy, terms: &[String]) {
    let (link, column) = taxonomy.link();

    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            query.push(" OR ");
        }
        query
            .push(format!(
                "EXISTS (SELECT 1 FROM {link} l JOIN {} g ON g.id = l.{column} WHERE l.tutor_id = t.id AND g.folded_name LIKE ",
                taxonomy.table()
            ))
            .push_bind(like_pattern(&fold(term)))
            .push(" ESCAPE '\\')");
    }
}

/// Case folding applied to both the stored search columns and the terms.
///
/// SQLite `LIKE` only folds ASCII, so matching runs on pre-lowercased text.
pub(crate) fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// Folded free text of a tutor, as stored in `tutors.search_text`.
pub(crate) fn search_text(display_name: &str, catch_phrase: &str, description: &str) -> String {
    fold(&[display_name, catch_phrase, description].join("\u{1f}"))
}

/// Substring pattern where `%` and `_` match literally.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn push_term(terms: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if !value.is_empty() && !terms.iter().any(|t| t == value) {
        terms.push(value.to_owned());
    }
}

/// Unparsable pages go to the first page, overflowing ones to the last.
fn parse_page(value: &str) -> i64 {
    let value = value.trim();
    value.parse().unwrap_or_else(|_| {
        if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
            i64::MAX
        } else {
            1
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(page: &Page<TutorListing>) -> Vec<i64> {
        page.items.iter().map(|item| item.tutor.id).collect()
    }

    #[test]
    fn test_from_query() {
        let search = TutorSearch::from_query(
            "subject=Math&subjects=%20&subject=Math&teachingvalue=Patience&q=+&sorting=cheapest&page=abc",
        )
        .unwrap();

        assert_eq!(search.subjects, vec!["Math"]);
        assert_eq!(search.values, vec!["Patience"]);
        assert_eq!(search.text, None);
        assert_eq!(search.sorting, Sorting::Cheapest);
        assert_eq!(search.page, 1);

        assert_eq!(TutorSearch::from_query("page=99999999999999999999").unwrap().page, i64::MAX);
        assert_eq!(TutorSearch::from_query("page=-4").unwrap().page, -4);
        assert_eq!(TutorSearch::from_query("").unwrap(), TutorSearch::default());
    }

    #[test]
    fn test_unknown_sorting() {
        assert!(matches!(
            TutorSearch::from_query("sorting=random"),
            Err(ServerError::Validation(_))
        ));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("math"), "%math%");
        assert_eq!(like_pattern("100%_"), "%100\\%\\_%");
    }

    #[sqlx::test(fixtures("../../fixtures/users.sql", "../../fixtures/tutors.sql"))]
    async fn test_inactive_tutors_are_never_listed(pool: SqlitePool) {
        for query in ["", "subject=math", "q=erin", "teachingvalue=discipline", "sorting=cheapest"] {
            let page = TutorSearch::from_query(query).unwrap().fetch(&pool).await.unwrap();
            assert!(!ids(&page).contains(&3), "inactive tutor listed for {query:?}");
        }

        let page = TutorSearch::default().fetch(&pool).await.unwrap();
        assert_eq!(ids(&page), vec![1, 2]);
        assert_eq!(page.total, 2);
    }

    #[sqlx::test(fixtures("../../fixtures/users.sql", "../../fixtures/tutors.sql"))]
    async fn test_subject_filter_is_idempotent(pool: SqlitePool) {
        let once = TutorSearch::from_query("subject=math").unwrap().fetch(&pool).await.unwrap();
        let twice = TutorSearch::from_query("subject=math&subjects=MATH")
            .unwrap()
            .fetch(&pool)
            .await
            .unwrap();

        assert_eq!(ids(&once), vec![1]);
        assert_eq!(ids(&once), ids(&twice));
    }

    #[sqlx::test(fixtures("../../fixtures/users.sql", "../../fixtures/tutors.sql"))]
    async fn test_filters_combine(pool: SqlitePool) {
        let search = |query: &str| TutorSearch::from_query(query).unwrap();

        let page = search("teachingvalue=patience").fetch(&pool).await.unwrap();
        assert_eq!(ids(&page), vec![1, 2]);

        let page = search("subject=history&subject=physics").fetch(&pool).await.unwrap();
        assert_eq!(ids(&page), vec![1, 2]);

        let page = search("subject=math&teachingvalue=creativity").fetch(&pool).await.unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.page, 1);

        let page = search("subject=%25").fetch(&pool).await.unwrap();
        assert!(page.items.is_empty());
    }

    #[sqlx::test(fixtures("../../fixtures/users.sql", "../../fixtures/tutors.sql"))]
    async fn test_free_text_matches_description(pool: SqlitePool) {
        let page = TutorSearch::from_query("q=math").unwrap().fetch(&pool).await.unwrap();

        // Bob only mentions Mathematics in his description.
        assert_eq!(ids(&page), vec![1, 2]);

        let page = TutorSearch::from_query("q=builder").unwrap().fetch(&pool).await.unwrap();
        assert_eq!(ids(&page), vec![2]);
    }

    #[sqlx::test(fixtures("../../fixtures/users.sql", "../../fixtures/tutors.sql"))]
    async fn test_matching_folds_non_ascii_case(pool: SqlitePool) {
        crate::tutor::TutorRepository::new(pool.clone())
            .update(
                2,
                &crate::tutor::TutorDraft {
                    description: Some("Cours de français et d'éducation civique".into()),
                    values: Some(vec!["Écoute".into()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        for query in ["q=éducation", "q=ÉDUCATION", "q=FRANÇAIS", "teachingvalue=écoute", "teachingvalue=ÉCOUTE"] {
            let page = TutorSearch::from_query(query).unwrap().fetch(&pool).await.unwrap();
            assert_eq!(ids(&page), vec![2], "no match for {query:?}");
        }
    }

    #[sqlx::test(fixtures(
        "../../fixtures/users.sql",
        "../../fixtures/tutors.sql",
        "../../fixtures/ratings.sql"
    ))]
    async fn test_sorting(pool: SqlitePool) {
        async fn sorted(pool: &SqlitePool, key: &str) -> Vec<i64> {
            let page = TutorSearch::from_query(&format!("sorting={key}"))
                .unwrap()
                .fetch(pool)
                .await
                .unwrap();
            ids(&page)
        }

        assert_eq!(sorted(&pool, "name").await, vec![1, 2]);
        assert_eq!(sorted(&pool, "cheapest").await, vec![1, 2]);
        assert_eq!(sorted(&pool, "most-expensive").await, vec![2, 1]);
        assert_eq!(sorted(&pool, "highest-rated").await, vec![2, 1]);
        assert_eq!(sorted(&pool, "most-reviews").await, vec![1, 2]);

        let page = TutorSearch::default().fetch(&pool).await.unwrap();
        assert_eq!(page.items[0].average_rating, Some(4.0));
        assert_eq!(page.items[0].review_count, 5);
    }

    #[sqlx::test(fixtures("../../fixtures/catalog.sql"))]
    async fn test_pagination_clamps(pool: SqlitePool) {
        let page = TutorSearch::from_query("page=3").unwrap().fetch(&pool).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.page, 3);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total, 13);

        let clamped = TutorSearch::from_query("page=99").unwrap().fetch(&pool).await.unwrap();
        assert_eq!(clamped.page, 3);
        assert_eq!(ids(&clamped), ids(&page));

        let first = TutorSearch::from_query("page=0").unwrap().fetch(&pool).await.unwrap();
        assert_eq!(first.page, 1);
        assert_eq!(first.items.len(), PAGE_SIZE as usize);
    }
}
