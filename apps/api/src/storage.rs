use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use tracing::info;

use crate::errors::AppError;

/// Derives the object key for an authenticated upload. Keys are timestamped,
/// matching the dashboard uploader: `cvs/{unix_millis}.{ext}`.
pub fn upload_key(file_name: &str) -> String {
    let ext = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("pdf");
    format!("cvs/{}.{}", chrono::Utc::now().timestamp_millis(), ext)
}

/// Stores a PDF in the uploads bucket.
pub async fn put_object(
    s3: &S3Client,
    bucket: &str,
    key: &str,
    bytes: Vec<u8>,
) -> Result<(), AppError> {
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(bytes))
        .content_type("application/pdf")
        .send()
        .await
        .map_err(|e| AppError::S3(format!("upload of '{key}' failed: {e}")))?;

    info!("Stored s3://{bucket}/{key}");
    Ok(())
}

/// Downloads an object's full body.
pub async fn get_object(s3: &S3Client, bucket: &str, key: &str) -> Result<Vec<u8>, AppError> {
    let object = s3
        .get_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .map_err(|e| AppError::S3(format!("download of '{key}' failed: {e}")))?;

    let data = object
        .body
        .collect()
        .await
        .map_err(|e| AppError::S3(format!("reading body of '{key}' failed: {e}")))?;

    Ok(data.into_bytes().to_vec())
}
