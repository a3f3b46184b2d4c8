//! Exercise API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use super::{success, ApiResult};
use crate::auth::AdminUser;
use crate::errors::AppError;
use crate::models::{DocumentPatch, Exercise, ExercisePart, ExerciseType, NewExercise};
use crate::AppState;

/// Query string accepted by the list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ExerciseFilter {
    #[serde(rename = "type")]
    pub exercise_type: Option<ExerciseType>,
    pub part: Option<ExercisePart>,
}

/// GET /api/exercises - List exercises, optionally filtered by type and part.
pub async fn list_exercises(
    State(state): State<AppState>,
    Query(filter): Query<ExerciseFilter>,
) -> ApiResult<Vec<Exercise>> {
    let exercises = match (filter.exercise_type, filter.part) {
        (None, None) => state.repo.list_exercises().await?,
        (Some(exercise_type), None) => state.repo.list_exercises_by_type(exercise_type).await?,
        (Some(exercise_type), Some(part)) => {
            state
                .repo
                .list_exercises_by_type_and_part(exercise_type, part)
                .await?
        }
        (None, Some(_)) => {
            return Err(AppError::BadRequest(
                "Filtering by part requires a type".to_string(),
            ))
        }
    };

    success(exercises)
}

/// GET /api/exercises/:id - Get a single exercise.
pub async fn get_exercise(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Exercise> {
    match state.repo.get_exercise(&id).await? {
        Some(exercise) => success(exercise),
        None => Err(AppError::NotFound(format!("Exercise {} not found", id))),
    }
}

/// POST /api/exercises - Create a new exercise.
pub async fn create_exercise(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(body): Json<Value>,
) -> ApiResult<Exercise> {
    let exercise: NewExercise =
        serde_json::from_value(body).map_err(|e| AppError::Validation(e.to_string()))?;

    exercise.validate()?;

    tracing::debug!(
        admin = %admin.name,
        "Creating {}/{} exercise",
        exercise.exercise_type(),
        exercise.part()
    );
    let created = state.repo.create_exercise(&exercise).await?;
    success(created)
}

/// PATCH /api/exercises/:id - Merge fields into an exercise.
pub async fn update_exercise(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Exercise> {
    let patch: DocumentPatch =
        serde_json::from_value(body).map_err(|e| AppError::Validation(e.to_string()))?;
    if patch.is_empty() {
        return Err(AppError::Validation("No fields to update".to_string()));
    }

    tracing::debug!(admin = %admin.name, "Updating exercise {}", id);
    let updated = state.repo.update_exercise(&id, &patch).await?;
    success(updated)
}

/// DELETE /api/exercises/:id - Delete an exercise.
pub async fn delete_exercise(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<String>,
) -> ApiResult<bool> {
    tracing::debug!(admin = %admin.name, "Deleting exercise {}", id);
    success(state.repo.delete_exercise(&id).await?)
}
