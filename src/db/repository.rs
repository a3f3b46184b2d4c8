//! Repository for document operations on the exercise, user and settings collections.
//!
//! Filters and merge patches are evaluated by SQLite's JSON functions, so the
//! service never reads a document just to write it back.

use chrono::Utc;
use serde::de::DeserializeOwned;
use sqlx::{Executor, Row, Sqlite, SqlitePool};

use super::Collection;
use crate::errors::AppError;
use crate::models::{
    default_users, DocumentPatch, Exercise, ExercisePart, ExerciseType, NewExercise, NewUser,
    SystemSettings, User,
};

/// Fixed key of the settings singleton.
pub const SETTINGS_ID: &str = "system";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== EXERCISE OPERATIONS ====================

    /// List all exercises in store order.
    pub async fn list_exercises(&self) -> Result<Vec<Exercise>, AppError> {
        let rows =
            sqlx::query("SELECT id, data FROM documents WHERE collection = ? ORDER BY rowid")
                .bind(Collection::Exercises.as_str())
                .fetch_all(&self.pool)
                .await?;

        rows.iter().map(exercise_from_row).collect()
    }

    /// List exercises of one type.
    pub async fn list_exercises_by_type(
        &self,
        exercise_type: ExerciseType,
    ) -> Result<Vec<Exercise>, AppError> {
        let rows = sqlx::query(
            r#"SELECT id, data FROM documents
               WHERE collection = ? AND json_extract(data, '$.type') = ?
               ORDER BY rowid"#,
        )
        .bind(Collection::Exercises.as_str())
        .bind(exercise_type.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(exercise_from_row).collect()
    }

    /// List exercises of one type and part.
    pub async fn list_exercises_by_type_and_part(
        &self,
        exercise_type: ExerciseType,
        part: ExercisePart,
    ) -> Result<Vec<Exercise>, AppError> {
        let rows = sqlx::query(
            r#"SELECT id, data FROM documents
               WHERE collection = ?
                 AND json_extract(data, '$.type') = ?
                 AND json_extract(data, '$.part') = ?
               ORDER BY rowid"#,
        )
        .bind(Collection::Exercises.as_str())
        .bind(exercise_type.as_str())
        .bind(part.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(exercise_from_row).collect()
    }

    /// Get an exercise by ID.
    pub async fn get_exercise(&self, id: &str) -> Result<Option<Exercise>, AppError> {
        let row = sqlx::query("SELECT id, data FROM documents WHERE collection = ? AND id = ?")
            .bind(Collection::Exercises.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(exercise_from_row).transpose()
    }

    /// Store a new exercise under a freshly assigned ID.
    pub async fn create_exercise(&self, exercise: &NewExercise) -> Result<Exercise, AppError> {
        let id = uuid::Uuid::new_v4().to_string();
        let data = serde_json::to_string(exercise)?;

        insert_document(&self.pool, Collection::Exercises, &id, &data).await?;

        tracing::info!(
            exercise_id = %id,
            exercise_type = %exercise.exercise_type(),
            part = %exercise.part(),
            "Exercise created"
        );

        Ok(exercise.clone().with_id(id))
    }

    /// Merge `patch` into the stored exercise.
    ///
    /// Fails with `NotFound` for an unknown ID and with `Validation` when the
    /// merged document no longer matches a single exercise variant or breaks
    /// a content rule; in that case nothing is written.
    pub async fn update_exercise(
        &self,
        id: &str,
        patch: &DocumentPatch,
    ) -> Result<Exercise, AppError> {
        let exercise: NewExercise = self
            .patch_document(Collection::Exercises, id, patch, |exercise: &NewExercise| {
                exercise.validate().map_err(AppError::from)
            })
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Exercise {} not found", id)))?;

        tracing::info!(
            exercise_id = %id,
            fields = ?patch.fields().collect::<Vec<_>>(),
            "Exercise updated"
        );

        Ok(exercise.with_id(id))
    }

    /// Delete an exercise. Deleting a missing document still succeeds.
    pub async fn delete_exercise(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(Collection::Exercises.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            tracing::debug!("Delete of absent exercise {} treated as success", id);
        } else {
            tracing::info!(exercise_id = %id, "Exercise deleted");
        }

        Ok(true)
    }

    // ==================== USER OPERATIONS ====================

    /// Seed the default accounts if the users collection is empty.
    ///
    /// Returns whether anything was written. The emptiness check and the
    /// inserts share one transaction.
    pub async fn initialize_users(&self) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        if count_documents(&mut *tx, Collection::Users).await? > 0 {
            return Ok(false);
        }

        let users = default_users();
        for user in &users {
            let id = uuid::Uuid::new_v4().to_string();
            let data = serde_json::to_string(user)?;
            insert_document(&mut *tx, Collection::Users, &id, &data).await?;
        }

        tx.commit().await?;

        tracing::info!("Seeded {} default users", users.len());
        Ok(true)
    }

    /// All users carrying `code`, in store order.
    pub async fn find_users_by_code(&self, code: &str) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query(
            r#"SELECT id, data FROM documents
               WHERE collection = ? AND json_extract(data, '$.code') = ?
               ORDER BY rowid"#,
        )
        .bind(Collection::Users.as_str())
        .bind(code)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(user_from_row).collect()
    }

    /// The first user carrying `code`, if any.
    pub async fn get_user_by_code(&self, code: &str) -> Result<Option<User>, AppError> {
        let users = self.find_users_by_code(code).await?;

        if users.len() > 1 {
            tracing::warn!(
                matches = users.len(),
                "Several users share one access code; returning the first"
            );
        }

        Ok(users.into_iter().next())
    }

    // ==================== SETTINGS OPERATIONS ====================

    /// Seed the default settings if the settings collection is empty.
    ///
    /// Returns whether anything was written. The fixed key makes a concurrent
    /// second seeder a no-op.
    pub async fn initialize_settings(&self) -> Result<bool, AppError> {
        if count_documents(&self.pool, Collection::Settings).await? > 0 {
            return Ok(false);
        }

        let data = serde_json::to_string(&SystemSettings::default())?;
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"INSERT INTO documents (collection, id, data, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?)
               ON CONFLICT(collection, id) DO NOTHING"#,
        )
        .bind(Collection::Settings.as_str())
        .bind(SETTINGS_ID)
        .bind(&data)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        let seeded = result.rows_affected() > 0;
        if seeded {
            tracing::info!("Seeded default system settings");
        }
        Ok(seeded)
    }

    /// The settings singleton, or `None` when not configured yet.
    pub async fn get_system_settings(&self) -> Result<Option<SystemSettings>, AppError> {
        let row = sqlx::query("SELECT data FROM documents WHERE collection = ? AND id = ?")
            .bind(Collection::Settings.as_str())
            .bind(SETTINGS_ID)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            let data: String = row.get("data");
            serde_json::from_str(&data).map_err(|e| {
                AppError::Internal(format!("Stored settings are malformed: {}", e))
            })
        })
        .transpose()
    }

    /// Merge `patch` into the settings singleton.
    pub async fn update_system_settings(
        &self,
        patch: &DocumentPatch,
    ) -> Result<SystemSettings, AppError> {
        let settings = self
            .patch_document(Collection::Settings, SETTINGS_ID, patch, |_: &SystemSettings| Ok(()))
            .await?
            .ok_or_else(|| AppError::NotFound("System settings are not configured".to_string()))?;

        tracing::info!(
            fields = ?patch.fields().collect::<Vec<_>>(),
            "System settings updated"
        );

        Ok(settings)
    }

    // ==================== DOCUMENT HELPERS ====================

    /// Apply a merge patch in the store and re-read the merged body as `T`.
    ///
    /// Returns `None` when the document does not exist. The transaction is
    /// rolled back if the merged body does not deserialize or `check` fails.
    async fn patch_document<T, F>(
        &self,
        collection: Collection,
        id: &str,
        patch: &DocumentPatch,
        check: F,
    ) -> Result<Option<T>, AppError>
    where
        T: DeserializeOwned,
        F: FnOnce(&T) -> Result<(), AppError>,
    {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now().to_rfc3339();

        let row = sqlx::query(
            r#"UPDATE documents SET data = json_patch(data, ?), updated_at = ?
               WHERE collection = ? AND id = ?
               RETURNING data"#,
        )
        .bind(patch.to_json())
        .bind(&now)
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let data: String = row.get("data");
        let merged = serde_json::from_str(&data).map_err(|e| {
            AppError::Validation(format!(
                "Update rejected, the merged {} document would be invalid: {}",
                collection.as_str(),
                e
            ))
        })?;
        check(&merged)?;

        tx.commit().await?;
        Ok(Some(merged))
    }
}

async fn insert_document<'e, E>(
    executor: E,
    collection: Collection,
    id: &str,
    data: &str,
) -> Result<(), AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO documents (collection, id, data, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(collection.as_str())
    .bind(id)
    .bind(data)
    .bind(&now)
    .bind(&now)
    .execute(executor)
    .await?;

    Ok(())
}

async fn count_documents<'e, E>(executor: E, collection: Collection) -> Result<i64, AppError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?")
        .bind(collection.as_str())
        .fetch_one(executor)
        .await?;
    Ok(count)
}

// Helper functions for row conversion

fn exercise_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Exercise, AppError> {
    let id: String = row.get("id");
    let data: String = row.get("data");
    let body: NewExercise = serde_json::from_str(&data)
        .map_err(|e| AppError::Internal(format!("Stored exercise {} is malformed: {}", id, e)))?;
    Ok(body.with_id(id))
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<User, AppError> {
    let id: String = row.get("id");
    let data: String = row.get("data");
    let body: NewUser = serde_json::from_str(&data)
        .map_err(|e| AppError::Internal(format!("Stored user {} is malformed: {}", id, e)))?;
    Ok(body.with_id(id))
}
