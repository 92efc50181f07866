//! Local stand-ins for the hosted backend, used in demos and tests.
//!
//! `DemoImageStore` hands out canned stock photos instead of uploading, so the
//! onboarding flow can be clicked through without storage configured.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::error::BackendError;

use super::traits::{AuthProvider, ImageStore, PhotoUpload, ProfileStore, ProfileSubmission, UserId};

const DEMO_IMAGES: [&str; 6] = [
    "https://images.unsplash.com/photo-1438761681033-6461ffad8d80",
    "https://images.unsplash.com/photo-1494790108377-be9c29b29330",
    "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d",
    "https://images.unsplash.com/photo-1517841905240-472988babdf9",
    "https://images.unsplash.com/photo-1539571696357-5a69c17a67c6",
    "https://images.unsplash.com/photo-1534528741775-53994a69daeb",
];

/// Auth provider with a fixed answer.
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    user: Option<UserId>,
}

impl StaticAuth {
    pub fn signed_in(id: impl Into<String>) -> Self {
        Self {
            user: Some(UserId::new(id)),
        }
    }

    pub fn signed_out() -> Self {
        Self { user: None }
    }
}

#[async_trait]
impl AuthProvider for StaticAuth {
    async fn current_user(&self) -> Option<UserId> {
        self.user.clone()
    }
}

/// Image store that ignores the bytes and cycles through stock photos.
#[derive(Debug, Default)]
pub struct DemoImageStore {
    next: AtomicUsize,
}

impl DemoImageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ImageStore for DemoImageStore {
    async fn upload_image(
        &self,
        owner: &UserId,
        object_id: Uuid,
        upload: &PhotoUpload,
    ) -> Result<String, BackendError> {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % DEMO_IMAGES.len();
        info!(
            owner = %owner,
            object_id = %object_id,
            file = %upload.file_name,
            "Demo upload, using stock photo"
        );
        Ok(DEMO_IMAGES[index].to_string())
    }
}

/// Profile store that keeps submissions in memory.
#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<Vec<ProfileSubmission>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything upserted so far, latest version per id.
    pub async fn profiles(&self) -> Vec<ProfileSubmission> {
        self.profiles.read().await.clone()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn upsert_profile(&self, profile: &ProfileSubmission) -> Result<(), BackendError> {
        let mut profiles = self.profiles.write().await;
        match profiles.iter_mut().find(|p| p.id == profile.id) {
            Some(existing) => *existing = profile.clone(),
            None => profiles.push(profile.clone()),
        }
        info!(user = %profile.id, "Profile saved (in memory)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn demo_images_cycle() {
        let store = DemoImageStore::new();
        let owner = UserId::new("u1");
        let upload = PhotoUpload::new("a.jpg", "image/jpeg", vec![]);

        let mut urls = Vec::new();
        for _ in 0..7 {
            urls.push(
                store
                    .upload_image(&owner, Uuid::new_v4(), &upload)
                    .await
                    .unwrap(),
            );
        }
        assert_eq!(urls[0], DEMO_IMAGES[0]);
        assert_eq!(urls[5], DEMO_IMAGES[5]);
        assert_eq!(urls[6], DEMO_IMAGES[0]);
    }

    #[tokio::test]
    async fn static_auth() {
        assert_eq!(
            StaticAuth::signed_in("abc").current_user().await,
            Some(UserId::new("abc"))
        );
        assert!(StaticAuth::signed_out().current_user().await.is_none());
    }

    #[tokio::test]
    async fn memory_profiles_upsert_by_id() {
        let store = MemoryProfileStore::new();
        let mut profile = ProfileSubmission {
            id: UserId::new("u1"),
            name: "Ada".to_string(),
            age: Some(30),
            location: String::new(),
            bio: String::new(),
            gender: None,
            interests: vec![],
            images: vec![],
        };
        store.upsert_profile(&profile).await.unwrap();
        profile.name = "Ada L.".to_string();
        store.upsert_profile(&profile).await.unwrap();

        let saved = store.profiles().await;
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].name, "Ada L.");
    }
}
