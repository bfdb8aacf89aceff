//! Vocabularies used by the search filters.

use axum::Json;
use axum::extract::State;

use crate::database::Database;
use crate::error::Result;
use crate::taxonomy::{Tag, Taxonomy};

pub async fn subjects(State(db): State<Database>) -> Result<Json<Vec<Tag>>> {
    Ok(Json(Taxonomy::Subject.list(&db.pool).await?))
}

pub async fn values(State(db): State<Database>) -> Result<Json<Vec<Tag>>> {
    Ok(Json(Taxonomy::Value.list(&db.pool).await?))
}
