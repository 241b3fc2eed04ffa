//! All cv_uploads and profiles queries live here. Writes are point updates
//! keyed by id; status transitions are conditional on the current status so
//! a terminal row is never overwritten and at most one pipeline can move a
//! row from `pending` to `processing`.

use chrono::{Duration, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::profile::ProfileRow;
use crate::models::upload::{AdminCvUploadRow, CvUploadRow};
use crate::review::feedback::CvFeedback;
use crate::review::status::UploadStatus;

/// Inserts a fresh authenticated upload in `pending` state.
/// `original_text` stays empty until extraction completes.
pub async fn insert_pending_upload(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    file_name: &str,
    file_path: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO cv_uploads (id, user_id, file_name, file_path, original_text, status)
        VALUES ($1, $2, $3, $4, '', $5)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(file_name)
    .bind(file_path)
    .bind(UploadStatus::Pending.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

/// Inserts an anonymous upload directly in `completed` state. The anonymous
/// flow runs extraction and generation before its first write, so the row
/// never exists as `pending`.
pub async fn insert_completed_upload(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    file_name: &str,
    file_path: &str,
    original_text: &str,
    feedback: &CvFeedback,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO cv_uploads (id, user_id, file_name, file_path, original_text, feedback, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(file_name)
    .bind(file_path)
    .bind(original_text)
    .bind(Json(feedback))
    .bind(UploadStatus::Completed.as_str())
    .execute(pool)
    .await?;
    Ok(())
}

/// Compare-and-swap `pending` → `processing`. Returns false when the row is
/// in any other state, which rejects duplicate processing requests.
pub async fn try_mark_processing(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE cv_uploads
        SET status = $2, updated_at = now()
        WHERE id = $1 AND status = $3
        "#,
    )
    .bind(id)
    .bind(UploadStatus::Processing.as_str())
    .bind(UploadStatus::Pending.as_str())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Final success write: feedback and extracted text land together with the
/// `completed` status. Guarded on `processing` so a lease-swept row stays
/// failed. Returns false when the guard rejected the write.
pub async fn mark_completed(
    pool: &PgPool,
    id: Uuid,
    original_text: &str,
    feedback: &CvFeedback,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE cv_uploads
        SET status = $2, original_text = $3, feedback = $4, last_error = NULL, updated_at = now()
        WHERE id = $1 AND status = $5
        "#,
    )
    .bind(id)
    .bind(UploadStatus::Completed.as_str())
    .bind(original_text)
    .bind(Json(feedback))
    .bind(UploadStatus::Processing.as_str())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Failure write: the error description goes to `last_error`; `feedback`
/// stays null so the completed-iff-feedback invariant holds unconditionally.
pub async fn mark_failed(pool: &PgPool, id: Uuid, error: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE cv_uploads
        SET status = $2, last_error = $3, updated_at = now()
        WHERE id = $1 AND status = $4
        "#,
    )
    .bind(id)
    .bind(UploadStatus::Failed.as_str())
    .bind(error)
    .bind(UploadStatus::Processing.as_str())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Reaps rows stuck in `processing` past the lease window (crash between
/// generation and the final write). Returns how many rows were failed.
pub async fn expire_stale_processing(
    pool: &PgPool,
    older_than: Duration,
) -> Result<u64, sqlx::Error> {
    let cutoff = Utc::now() - older_than;
    let result = sqlx::query(
        r#"
        UPDATE cv_uploads
        SET status = $1, last_error = 'processing lease expired', updated_at = now()
        WHERE status = $2 AND updated_at < $3
        "#,
    )
    .bind(UploadStatus::Failed.as_str())
    .bind(UploadStatus::Processing.as_str())
    .bind(cutoff)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub async fn get_upload(pool: &PgPool, id: Uuid) -> Result<Option<CvUploadRow>, sqlx::Error> {
    sqlx::query_as::<_, CvUploadRow>("SELECT * FROM cv_uploads WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_uploads_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<CvUploadRow>, sqlx::Error> {
    sqlx::query_as::<_, CvUploadRow>(
        "SELECT * FROM cv_uploads WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Status column only, for the stats aggregate.
pub async fn list_statuses_for_user(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT status FROM cv_uploads WHERE user_id = $1")
        .bind(user_id)
        .fetch_all(pool)
        .await
}

/// Every upload joined with its owner's profile. Anonymous uploads (and any
/// owner without a profile row) come back with NULL email/full_name.
pub async fn list_all_with_profiles(pool: &PgPool) -> Result<Vec<AdminCvUploadRow>, sqlx::Error> {
    sqlx::query_as::<_, AdminCvUploadRow>(
        r#"
        SELECT u.*, p.email, p.full_name
        FROM cv_uploads u
        LEFT JOIN profiles p ON p.id = u.user_id
        ORDER BY u.created_at DESC
        "#,
    )
    .fetch_all(pool)
    .await
}

pub async fn get_profile(pool: &PgPool, user_id: Uuid) -> Result<Option<ProfileRow>, sqlx::Error> {
    sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}
