//! Axum route handlers for the read path.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::upload::{AdminUpload, CvUploadRow, UploadStats};
use crate::review::status::UploadStatus;
use crate::review::store;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

/// GET /api/uploads/:id
///
/// Single upload with its feedback. Serves the dashboard dialog and the
/// public rating page, so it takes no user_id filter.
pub async fn handle_get_upload(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CvUploadRow>, AppError> {
    let upload = store::get_upload(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Upload {id} not found")))?;
    Ok(Json(upload))
}

/// GET /api/uploads?user_id=
pub async fn handle_list_uploads(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<CvUploadRow>>, AppError> {
    let uploads = store::list_uploads_for_user(&state.db, params.user_id).await?;
    Ok(Json(uploads))
}

/// GET /api/uploads/stats?user_id=
pub async fn handle_upload_stats(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<UploadStats>, AppError> {
    let statuses = store::list_statuses_for_user(&state.db, params.user_id).await?;
    Ok(Json(compute_stats(&statuses)))
}

/// GET /api/admin/uploads?user_id=
///
/// Caller must hold a profile with the admin flag. Uploads from owners
/// without a profile row (the anonymous sentinel) come back with
/// `profiles: null`.
pub async fn handle_admin_list_uploads(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<AdminUpload>>, AppError> {
    let profile = store::get_profile(&state.db, params.user_id)
        .await?
        .ok_or(AppError::Forbidden)?;
    if !profile.is_admin {
        return Err(AppError::Forbidden);
    }

    let rows = store::list_all_with_profiles(&state.db).await?;
    Ok(Json(rows.into_iter().map(AdminUpload::from).collect()))
}

/// Counts rows per status. Unknown status strings count toward `total` only;
/// the CHECK constraint keeps them out of the table in practice.
fn compute_stats(statuses: &[String]) -> UploadStats {
    let mut stats = UploadStats {
        total: statuses.len() as i64,
        ..UploadStats::default()
    };
    for status in statuses {
        match UploadStatus::parse(status) {
            Some(UploadStatus::Pending) => stats.pending += 1,
            Some(UploadStatus::Processing) => stats.processing += 1,
            Some(UploadStatus::Completed) => stats.completed += 1,
            Some(UploadStatus::Failed) => stats.failed += 1,
            None => {}
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statuses(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_stats_empty() {
        assert_eq!(compute_stats(&[]), UploadStats::default());
    }

    #[test]
    fn test_stats_mixed() {
        let stats = compute_stats(&statuses(&[
            "completed",
            "pending",
            "completed",
            "failed",
            "processing",
        ]));
        assert_eq!(
            stats,
            UploadStats {
                total: 5,
                pending: 1,
                processing: 1,
                completed: 2,
                failed: 1,
            }
        );
    }

    #[test]
    fn test_stats_counts_every_row_in_total() {
        let stats = compute_stats(&statuses(&["completed", "bogus"]));
        assert_eq!(stats.total, 2);
        assert_eq!(stats.completed, 1);
    }
}
