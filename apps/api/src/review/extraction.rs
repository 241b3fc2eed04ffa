use crate::errors::AppError;

/// Extracts plain text from PDF bytes. Best-effort and lossy: layout, images
/// and styling are discarded.
///
/// pdf-extract is CPU-bound, so the parse runs on the blocking pool.
pub async fn extract_text(bytes: Vec<u8>) -> Result<String, AppError> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("extraction task panicked: {e}")))?
        .map_err(|e| AppError::Extraction(format!("could not parse PDF: {e}")))?;
    Ok(text)
}
