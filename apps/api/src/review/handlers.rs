//! Axum route handlers for the write path: intake and processing.

use axum::{
    extract::{Multipart, Query, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::review::feedback::CvFeedback;
use crate::review::pipeline::{process_anonymous, process_upload};
use crate::review::store;
use crate::state::AppState;
use crate::storage;
use crate::uploads::handlers::UserIdQuery;

/// Hard cap on accepted PDFs. Checked before any row or external call.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const PDF_MIME: &str = "application/pdf";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub upload_id: Option<Uuid>,
    pub file_path: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub success: bool,
    pub upload_id: Uuid,
    pub feedback: CvFeedback,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub upload_id: Uuid,
    pub file_path: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnonymousReviewResponse {
    pub success: bool,
    pub upload_id: Uuid,
    pub score: i64,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/uploads?user_id=
///
/// Authenticated intake: validates the multipart `file` field, stores the PDF
/// in the bucket and inserts a `pending` row. Processing is triggered
/// separately via POST /api/review.
pub async fn handle_upload(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let file = read_pdf_field(&mut multipart).await?;

    let upload_id = Uuid::new_v4();
    let file_path = storage::upload_key(&file.file_name);

    storage::put_object(
        &state.s3,
        &state.config.s3_bucket,
        &file_path,
        file.bytes.to_vec(),
    )
    .await?;
    store::insert_pending_upload(&state.db, upload_id, params.user_id, &file.file_name, &file_path)
        .await?;

    Ok(Json(UploadResponse {
        upload_id,
        file_path,
    }))
}

/// POST /api/review
///
/// Runs the full pipeline for a previously stored upload. Side effect: the
/// row's status, feedback and original_text are rewritten.
pub async fn handle_review(
    State(state): State<AppState>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<ReviewResponse>, AppError> {
    let file_path = request.file_path.filter(|p| !p.trim().is_empty());
    let (Some(upload_id), Some(file_path)) = (request.upload_id, file_path) else {
        return Err(AppError::Validation(
            "Missing uploadId or filePath".to_string(),
        ));
    };

    let feedback = process_upload(&state, upload_id, &file_path).await?;

    Ok(Json(ReviewResponse {
        success: true,
        upload_id,
        feedback,
    }))
}

/// POST /api/anonymous-review
///
/// Synchronous review for unauthenticated visitors. The PDF never reaches
/// the bucket; on success a single `completed` row is attributed to the
/// anonymous sentinel owner.
pub async fn handle_anonymous_review(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnonymousReviewResponse>, AppError> {
    let file = read_pdf_field(&mut multipart).await?;

    let (upload_id, feedback) =
        process_anonymous(&state, &file.file_name, file.bytes.to_vec()).await?;

    Ok(Json(AnonymousReviewResponse {
        success: true,
        upload_id,
        score: feedback.overall_score,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Multipart plumbing
// ────────────────────────────────────────────────────────────────────────────

struct UploadedFile {
    file_name: String,
    bytes: Bytes,
}

/// Pulls the `file` field out of a multipart body and runs the synchronous
/// validations (MIME type, size, non-empty) before anything else happens.
async fn read_pdf_field(multipart: &mut Multipart) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        validate_content_type(field.content_type())?;
        let file_name = field.file_name().unwrap_or("cv.pdf").to_string();

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read file: {e}")))?;
        validate_size(bytes.len())?;

        return Ok(UploadedFile { file_name, bytes });
    }

    Err(AppError::Validation("No file provided".to_string()))
}

fn validate_content_type(content_type: Option<&str>) -> Result<(), AppError> {
    if content_type != Some(PDF_MIME) {
        return Err(AppError::Validation(
            "Only PDF files are allowed".to_string(),
        ));
    }
    Ok(())
}

fn validate_size(len: usize) -> Result<(), AppError> {
    if len == 0 {
        return Err(AppError::Validation("File is empty".to_string()));
    }
    if len > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(
            "File is larger than the 10MB limit".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_mime_accepted() {
        assert!(validate_content_type(Some("application/pdf")).is_ok());
    }

    #[test]
    fn test_non_pdf_mime_rejected() {
        for mime in [Some("image/png"), Some("application/msword"), None] {
            assert!(validate_content_type(mime).is_err());
        }
    }

    #[test]
    fn test_size_limits() {
        assert!(validate_size(1).is_ok());
        assert!(validate_size(MAX_UPLOAD_BYTES).is_ok());
        assert!(validate_size(MAX_UPLOAD_BYTES + 1).is_err());
        assert!(validate_size(0).is_err());
    }

    #[test]
    fn test_review_request_uses_camel_case() {
        let request: ReviewRequest = serde_json::from_str(
            r#"{"uploadId": "7f1b8a9e-3c4d-4a2b-9f6e-1d2c3b4a5f60", "filePath": "cvs/1.pdf"}"#,
        )
        .unwrap();
        assert_eq!(request.file_path.as_deref(), Some("cvs/1.pdf"));
        assert!(request.upload_id.is_some());
    }

    #[test]
    fn test_review_request_tolerates_missing_fields() {
        // The handler, not the deserializer, rejects these with a 400
        let request: ReviewRequest = serde_json::from_str("{}").unwrap();
        assert!(request.upload_id.is_none());
        assert!(request.file_path.is_none());
    }

    #[test]
    fn test_review_response_serializes_camel_case() {
        let response = AnonymousReviewResponse {
            success: true,
            upload_id: Uuid::nil(),
            score: 8,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["uploadId"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["score"], 8);
        assert!(json.get("upload_id").is_none());
    }
}
