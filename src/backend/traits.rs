//! Backend-agnostic collaborator traits used by the onboarding wizard.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BackendError;
use crate::onboarding::model::Gender;

/// Identifier of the signed-in user, as issued by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The profile record written at the end of onboarding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSubmission {
    pub id: UserId,
    pub name: String,
    pub age: Option<u32>,
    pub location: String,
    pub bio: String,
    /// `None` when the user is interested in everyone.
    pub gender: Option<Gender>,
    pub interests: Vec<String>,
    /// Public URLs of the uploaded photos, in slot order.
    pub images: Vec<String>,
}

/// An image picked by the user, ready to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PhotoUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File extension for the stored object: taken from the file name, else
    /// derived from the content type.
    pub fn extension(&self) -> String {
        if let Some((_, ext)) = self.file_name.rsplit_once('.') {
            if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
                return ext.to_ascii_lowercase();
            }
        }
        match self.content_type.as_str() {
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/heic" => "heic",
            _ => "jpg",
        }
        .to_string()
    }

    /// Reject files over `max` bytes.
    pub fn check_size(&self, max: usize) -> Result<(), BackendError> {
        if self.len() > max {
            return Err(BackendError::TooLarge {
                size: self.len(),
                max,
            });
        }
        Ok(())
    }
}

/// Resolves the currently authenticated user.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn current_user(&self) -> Option<UserId>;
}

/// Remote profile table.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Insert or update the profile keyed by `profile.id`.
    async fn upsert_profile(&self, profile: &ProfileSubmission) -> Result<(), BackendError>;
}

/// Remote object storage for profile photos.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Create the storage bucket if it does not exist yet.
    async fn ensure_bucket(&self) -> Result<(), BackendError> {
        Ok(())
    }

    /// Store the image under a fresh object id owned by `owner` and return
    /// its public URL.
    async fn upload_image(
        &self,
        owner: &UserId,
        object_id: Uuid,
        upload: &PhotoUpload,
    ) -> Result<String, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_prefers_file_name() {
        let upload = PhotoUpload::new("beach.PNG", "image/jpeg", vec![1, 2, 3]);
        assert_eq!(upload.extension(), "png");

        let upload = PhotoUpload::new("blob", "image/webp", vec![1]);
        assert_eq!(upload.extension(), "webp");

        let upload = PhotoUpload::new("weird.", "application/octet-stream", vec![1]);
        assert_eq!(upload.extension(), "jpg");
    }

    #[test]
    fn size_ceiling() {
        let upload = PhotoUpload::new("a.jpg", "image/jpeg", vec![0u8; 11]);
        assert!(upload.check_size(11).is_ok());
        assert!(matches!(
            upload.check_size(10),
            Err(BackendError::TooLarge { size: 11, max: 10 })
        ));
    }

    #[test]
    fn submission_serializes_null_gender() {
        let submission = ProfileSubmission {
            id: UserId::new("u1"),
            name: "Sam".to_string(),
            age: Some(29),
            location: "Lisbon".to_string(),
            bio: String::new(),
            gender: None,
            interests: vec!["hiking".to_string()],
            images: vec!["https://img/1".to_string()],
        };
        let json = serde_json::to_value(&submission).unwrap();
        assert_eq!(json["id"], "u1");
        assert!(json["gender"].is_null());
        assert_eq!(json["images"][0], "https://img/1");
    }
}
