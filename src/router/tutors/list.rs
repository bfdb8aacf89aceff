use axum::Json;
use axum::extract::{RawQuery, State};

use crate::database::Database;
use crate::error::Result;
use crate::tutor::TutorListing;
use crate::tutor::search::{Page, TutorSearch};

/// Handler of `GET /tutors`.
///
/// Query keys may repeat, e.g. `?subject=math&subject=physics`.
pub async fn handler(
    State(db): State<Database>,
    RawQuery(query): RawQuery,
) -> Result<Json<Page<TutorListing>>> {
    let search = TutorSearch::from_query(query.as_deref().unwrap_or_default())?;

    Ok(Json(search.fetch(&db.pool).await?))
}
