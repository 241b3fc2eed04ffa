//! The processing pipeline: one linear, fully awaited chain per request —
//! download → extract → generate → persist. No queue, no worker pool; the
//! caller blocks until the pipeline succeeds or fails.

use sqlx::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::models::upload::ANONYMOUS_USER_ID;
use crate::review::extraction::extract_text;
use crate::review::feedback::{parse_feedback, CvFeedback};
use crate::review::prompts::{REVIEW_PROMPT_EN, REVIEW_PROMPT_FR};
use crate::review::status::UploadStatus;
use crate::review::store;
use crate::state::AppState;
use crate::storage;

/// How long a row may sit in `processing` before the sweeper fails it.
const PROCESSING_LEASE_MINUTES: i64 = 10;
const SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

/// Runs the full pipeline for an authenticated upload.
///
/// The `pending` → `processing` transition is a compare-and-swap: a second
/// request for the same id (or a request for a terminal row) gets a conflict
/// without touching storage or the model. Any failure after that transition
/// lands the row in `failed` with the cause in `last_error`.
pub async fn process_upload(
    state: &AppState,
    upload_id: Uuid,
    file_path: &str,
) -> Result<CvFeedback, AppError> {
    let upload = store::get_upload(&state.db, upload_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Upload {upload_id} not found")))?;

    if let Some(current) = UploadStatus::parse(&upload.status) {
        if !current.can_transition_to(UploadStatus::Processing) {
            return Err(AppError::Conflict(if current.is_terminal() {
                format!("Upload {upload_id} is already {current}")
            } else {
                format!("Upload {upload_id} is being processed by another request")
            }));
        }
    }

    // The conditional update is the authoritative guard; the check above only
    // shapes the error message. Losing the race here still yields a conflict.
    if !store::try_mark_processing(&state.db, upload_id).await? {
        return Err(AppError::Conflict(format!(
            "Upload {upload_id} was claimed by a concurrent processing request"
        )));
    }

    info!("Processing upload {upload_id} ({file_path})");

    match run_steps(state, file_path).await {
        Ok((original_text, feedback)) => {
            if !store::mark_completed(&state.db, upload_id, &original_text, &feedback).await? {
                // The lease sweeper got there first; the row is already failed.
                warn!("Upload {upload_id} left 'processing' before results could be saved");
                return Err(AppError::Conflict(format!(
                    "Upload {upload_id} expired before results could be saved"
                )));
            }
            info!(
                "Upload {upload_id} completed with score {}",
                feedback.overall_score
            );
            Ok(feedback)
        }
        Err(e) => {
            if let Err(write_err) = store::mark_failed(&state.db, upload_id, &e.to_string()).await
            {
                // Leaves the row in `processing`; the lease sweeper reaps it.
                error!("Could not record failure for upload {upload_id}: {write_err}");
            }
            Err(e)
        }
    }
}

/// The fallible middle of the pipeline, separated out so the caller can fold
/// every failure into one `failed` write.
async fn run_steps(state: &AppState, file_path: &str) -> Result<(String, CvFeedback), AppError> {
    let bytes = storage::get_object(&state.s3, &state.config.s3_bucket, file_path).await?;
    let original_text = extract_text(bytes).await?;
    let feedback = generate_feedback(&state.llm, &original_text, REVIEW_PROMPT_EN).await?;
    Ok((original_text, feedback))
}

/// Runs the anonymous flow: extraction and generation happen synchronously
/// and a single row is inserted directly as `completed`. Nothing is written
/// on failure, and the PDF itself is never persisted.
pub async fn process_anonymous(
    state: &AppState,
    file_name: &str,
    bytes: Vec<u8>,
) -> Result<(Uuid, CvFeedback), AppError> {
    let original_text = extract_text(bytes).await?;
    let feedback = generate_feedback(&state.llm, &original_text, REVIEW_PROMPT_FR).await?;

    let upload_id = Uuid::new_v4();
    let file_path = format!("anonymous/{upload_id}.pdf");
    store::insert_completed_upload(
        &state.db,
        upload_id,
        ANONYMOUS_USER_ID,
        file_name,
        &file_path,
        &original_text,
        &feedback,
    )
    .await?;

    info!(
        "Anonymous upload {upload_id} completed with score {}",
        feedback.overall_score
    );
    Ok((upload_id, feedback))
}

/// Prompts the model with the extracted CV text and parses the response.
/// All failure modes surface as one generation error.
async fn generate_feedback(
    llm: &LlmClient,
    cv_text: &str,
    template: &str,
) -> Result<CvFeedback, AppError> {
    let prompt = template.replace("{cv_text}", cv_text);
    let raw = llm
        .generate(&prompt)
        .await
        .map_err(|e| AppError::Llm(format!("feedback generation failed: {e}")))?;
    parse_feedback(&raw).map_err(|e| AppError::Llm(format!("feedback generation failed: {e}")))
}

/// Background task spawned at startup: periodically fails uploads whose
/// processing lease has expired, so a crash mid-pipeline cannot strand a row
/// in `processing` forever.
pub async fn run_lease_sweeper(pool: PgPool) {
    let lease = chrono::Duration::minutes(PROCESSING_LEASE_MINUTES);
    let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        match store::expire_stale_processing(&pool, lease).await {
            Ok(0) => {}
            Ok(n) => warn!("Lease sweeper failed {n} upload(s) stuck in processing"),
            Err(e) => error!("Lease sweep failed: {e}"),
        }
    }
}
