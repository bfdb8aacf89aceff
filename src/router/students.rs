use axum::Json;
use axum::extract::State;

use crate::database::Database;
use crate::error::{Result, ServerError};
use crate::router::Path;
use crate::student::Student;

/// Handler of `GET /students/{student_id}`.
pub async fn handler(
    State(db): State<Database>,
    Path(student_id): Path<i64>,
) -> Result<Json<Student>> {
    Student::find_by_id(&db.pool, student_id)
        .await?
        .map(Json)
        .ok_or(ServerError::NotFound("student"))
}
