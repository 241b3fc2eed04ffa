use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Owner id recorded for uploads submitted without authentication.
pub const ANONYMOUS_USER_ID: Uuid = Uuid::nil();

/// One row per submitted CV.
///
/// `feedback` is non-null exactly when `status = "completed"`; failure details
/// live in `last_error`, never inside `feedback`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CvUploadRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub file_path: String,
    pub original_text: String,
    pub feedback: Option<Value>,
    pub last_error: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin listing row: upload columns joined with the owner's profile, where
/// one exists. Anonymous uploads have no profile row and join to NULLs.
#[derive(Debug, Clone, FromRow)]
pub struct AdminCvUploadRow {
    #[sqlx(flatten)]
    pub upload: CvUploadRow,
    pub email: Option<String>,
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    pub email: String,
    pub full_name: Option<String>,
}

/// Serialized shape of an admin listing entry. `profiles` is `null` when the
/// owner has no profile (the anonymous sentinel id).
#[derive(Debug, Clone, Serialize)]
pub struct AdminUpload {
    #[serde(flatten)]
    pub upload: CvUploadRow,
    pub profiles: Option<ProfileSummary>,
}

impl From<AdminCvUploadRow> for AdminUpload {
    fn from(row: AdminCvUploadRow) -> Self {
        let profiles = row.email.map(|email| ProfileSummary {
            email,
            full_name: row.full_name,
        });
        AdminUpload {
            upload: row.upload,
            profiles,
        }
    }
}

/// Aggregate status counts for one user's uploads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadStats {
    pub total: i64,
    pub pending: i64,
    pub processing: i64,
    pub completed: i64,
    pub failed: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row(user_id: Uuid) -> CvUploadRow {
        CvUploadRow {
            id: Uuid::new_v4(),
            user_id,
            file_name: "cv.pdf".to_string(),
            file_path: "cvs/1720000000000.pdf".to_string(),
            original_text: String::new(),
            feedback: None,
            last_error: None,
            status: "pending".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_admin_upload_with_profile() {
        let row = AdminCvUploadRow {
            upload: sample_row(Uuid::new_v4()),
            email: Some("jo@example.com".to_string()),
            full_name: Some("Jo Martin".to_string()),
        };
        let admin: AdminUpload = row.into();
        let profiles = admin.profiles.expect("profile expected");
        assert_eq!(profiles.email, "jo@example.com");
        assert_eq!(profiles.full_name.as_deref(), Some("Jo Martin"));
    }

    #[test]
    fn test_admin_upload_anonymous_has_null_profile() {
        let row = AdminCvUploadRow {
            upload: sample_row(ANONYMOUS_USER_ID),
            email: None,
            full_name: None,
        };
        let admin: AdminUpload = row.into();
        assert!(admin.profiles.is_none());
        let json = serde_json::to_value(&admin).unwrap();
        assert!(json.get("profiles").unwrap().is_null());
    }

    #[test]
    fn test_admin_upload_serializes_flattened() {
        let row = AdminCvUploadRow {
            upload: sample_row(Uuid::new_v4()),
            email: None,
            full_name: None,
        };
        let json = serde_json::to_value(AdminUpload::from(row)).unwrap();
        // upload columns are flattened to the top level, not nested
        assert!(json.get("file_name").is_some());
        assert!(json.get("upload").is_none());
    }
}
