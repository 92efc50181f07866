//! HTTP client for a Supabase-style hosted backend.
//!
//! Implements all three backend ports:
//! - auth: `GET /auth/v1/user` with the user's access token;
//! - profiles: upsert into `POST /rest/v1/profiles`;
//! - storage: lazily created public bucket, objects under
//!   `profile-images/{user}/{uuid}.{ext}`.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use reqwest::RequestBuilder;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::BackendConfig;
use crate::error::BackendError;

use super::MAX_UPLOAD_BYTES;
use super::traits::{AuthProvider, ImageStore, PhotoUpload, ProfileStore, ProfileSubmission, UserId};

/// Folder inside the bucket that holds profile photos.
const PROFILE_IMAGE_PREFIX: &str = "profile-images";

pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    access_token: Option<SecretString>,
    bucket: String,
    bucket_ready: AtomicBool,
    max_upload_bytes: usize,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Bucket {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl RestBackend {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            access_token: config.access_token.clone(),
            bucket: config.bucket.clone(),
            bucket_ready: AtomicBool::new(false),
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }

    /// Cap uploads (and the bucket's size limit, if we create it) at `bytes`.
    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Public URL of a stored object.
    pub fn public_url(&self, object_path: &str) -> String {
        self.url(&format!(
            "/storage/v1/object/public/{}/{}",
            self.bucket, object_path
        ))
    }

    /// Attach the project key and the best available bearer token.
    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self
            .access_token
            .as_ref()
            .unwrap_or(&self.api_key)
            .expose_secret();
        request
            .header("apikey", self.api_key.expose_secret())
            .bearer_auth(bearer)
    }

    async fn send(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, BackendError> {
        let resp = request
            .send()
            .await
            .map_err(|e| BackendError::RequestFailed {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                endpoint: endpoint.to_string(),
                status,
                body,
            });
        }
        Ok(resp)
    }
}

#[async_trait]
impl AuthProvider for RestBackend {
    async fn current_user(&self) -> Option<UserId> {
        let token = self.access_token.as_ref()?;
        let request = self
            .client
            .get(self.url("/auth/v1/user"))
            .header("apikey", self.api_key.expose_secret())
            .bearer_auth(token.expose_secret());

        let resp = match self.send("auth/v1/user", request).await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("Failed to resolve current user: {}", e);
                return None;
            }
        };
        match resp.json::<AuthUser>().await {
            Ok(user) => Some(UserId(user.id)),
            Err(e) => {
                warn!("Unexpected auth response: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl ProfileStore for RestBackend {
    async fn upsert_profile(&self, profile: &ProfileSubmission) -> Result<(), BackendError> {
        let request = self
            .authorized(self.client.post(self.url("/rest/v1/profiles")))
            .header("Prefer", "resolution=merge-duplicates")
            .json(profile);
        self.send("rest/v1/profiles", request).await?;
        info!(user = %profile.id, "Profile upserted");
        Ok(())
    }
}

#[async_trait]
impl ImageStore for RestBackend {
    async fn ensure_bucket(&self) -> Result<(), BackendError> {
        if self.bucket_ready.load(Ordering::Acquire) {
            return Ok(());
        }

        let resp = self
            .send(
                "storage/v1/bucket",
                self.authorized(self.client.get(self.url("/storage/v1/bucket"))),
            )
            .await?;
        let buckets: Vec<Bucket> =
            resp.json()
                .await
                .map_err(|e| BackendError::InvalidResponse {
                    endpoint: "storage/v1/bucket".to_string(),
                    reason: e.to_string(),
                })?;

        let exists = buckets.iter().any(|b| {
            b.name.as_deref() == Some(self.bucket.as_str())
                || b.id.as_deref() == Some(self.bucket.as_str())
        });

        if !exists {
            let body = serde_json::json!({
                "id": self.bucket,
                "name": self.bucket,
                "public": true,
                "file_size_limit": self.max_upload_bytes,
            });
            self.send(
                "storage/v1/bucket",
                self.authorized(self.client.post(self.url("/storage/v1/bucket")))
                    .json(&body),
            )
            .await?;
            info!(bucket = %self.bucket, "Created storage bucket");
        } else {
            debug!(bucket = %self.bucket, "Storage bucket present");
        }

        self.bucket_ready.store(true, Ordering::Release);
        Ok(())
    }

    async fn upload_image(
        &self,
        owner: &UserId,
        object_id: Uuid,
        upload: &PhotoUpload,
    ) -> Result<String, BackendError> {
        upload.check_size(self.max_upload_bytes)?;
        self.ensure_bucket().await?;

        let object_path = format!(
            "{PROFILE_IMAGE_PREFIX}/{owner}/{object_id}.{}",
            upload.extension()
        );
        let request = self
            .authorized(self.client.post(self.url(&format!(
                "/storage/v1/object/{}/{}",
                self.bucket, object_path
            ))))
            .header(reqwest::header::CONTENT_TYPE, upload.content_type.as_str())
            .header(reqwest::header::CACHE_CONTROL, "max-age=3600")
            .header("x-upsert", "false")
            .body(upload.bytes.clone());

        self.send("storage/v1/object", request).await?;
        debug!(path = %object_path, size = upload.len(), "Image uploaded");
        Ok(self.public_url(&object_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use tokio::net::TcpListener;

    #[derive(Clone, Default)]
    struct Recorded {
        calls: Arc<Mutex<Vec<String>>>,
        profiles: Arc<Mutex<Vec<serde_json::Value>>>,
        buckets: Arc<Mutex<Vec<String>>>,
    }

    impl Recorded {
        fn log(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }
    }

    async fn start_mock() -> (String, Recorded) {
        let recorded = Recorded::default();

        let app = Router::new()
            .route(
                "/auth/v1/user",
                get(|headers: HeaderMap| async move {
                    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
                        Some("Bearer user-token") => {
                            (StatusCode::OK, Json(serde_json::json!({"id": "user-42"})))
                        }
                        _ => (
                            StatusCode::UNAUTHORIZED,
                            Json(serde_json::json!({"msg": "invalid token"})),
                        ),
                    }
                }),
            )
            .route(
                "/rest/v1/profiles",
                post(
                    |State(rec): State<Recorded>,
                     headers: HeaderMap,
                     Json(body): Json<serde_json::Value>| async move {
                        rec.log(format!(
                            "upsert prefer={}",
                            headers
                                .get("prefer")
                                .and_then(|v| v.to_str().ok())
                                .unwrap_or("")
                        ));
                        if body["name"] == "fail" {
                            return StatusCode::INTERNAL_SERVER_ERROR;
                        }
                        rec.profiles.lock().unwrap().push(body);
                        StatusCode::CREATED
                    },
                ),
            )
            .route(
                "/storage/v1/bucket",
                get(|State(rec): State<Recorded>| async move {
                    rec.log("list buckets");
                    let names = rec.buckets.lock().unwrap().clone();
                    Json(
                        names
                            .into_iter()
                            .map(|n| serde_json::json!({"id": n, "name": n}))
                            .collect::<Vec<_>>(),
                    )
                })
                .post(
                    |State(rec): State<Recorded>, Json(body): Json<serde_json::Value>| async move {
                        rec.log(format!("create bucket public={}", body["public"]));
                        rec.log(format!("bucket limit={}", body["file_size_limit"]));
                        let name = body["name"].as_str().unwrap_or_default().to_string();
                        rec.buckets.lock().unwrap().push(name);
                        StatusCode::OK
                    },
                ),
            )
            .route(
                "/storage/v1/object/{*path}",
                post(
                    |State(rec): State<Recorded>, Path(path): Path<String>| async move {
                        rec.log(format!("upload {path}"));
                        StatusCode::OK
                    },
                ),
            )
            .with_state(recorded.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://127.0.0.1:{port}"), recorded)
    }

    fn backend(url: &str, token: Option<&str>) -> RestBackend {
        RestBackend::new(&BackendConfig {
            url: url.to_string(),
            api_key: SecretString::from("anon-key"),
            access_token: token.map(SecretString::from),
            bucket: "user-images".to_string(),
        })
    }

    fn submission(name: &str) -> ProfileSubmission {
        ProfileSubmission {
            id: UserId::new("user-42"),
            name: name.to_string(),
            age: Some(31),
            location: "Porto".to_string(),
            bio: "Coffee first".to_string(),
            gender: None,
            interests: vec!["surf".to_string()],
            images: vec![],
        }
    }

    #[tokio::test]
    async fn resolves_user_from_token() {
        let (url, _) = start_mock().await;
        assert_eq!(
            backend(&url, Some("user-token")).current_user().await,
            Some(UserId::new("user-42"))
        );
        assert!(backend(&url, Some("expired")).current_user().await.is_none());
        assert!(backend(&url, None).current_user().await.is_none());
    }

    #[tokio::test]
    async fn upserts_profile() {
        let (url, rec) = start_mock().await;
        let client = backend(&url, Some("user-token"));

        client.upsert_profile(&submission("Rita")).await.unwrap();
        let profiles = rec.profiles.lock().unwrap().clone();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0]["name"], "Rita");
        assert!(profiles[0]["gender"].is_null());
        assert!(
            rec.calls
                .lock()
                .unwrap()
                .contains(&"upsert prefer=resolution=merge-duplicates".to_string())
        );

        let err = client.upsert_profile(&submission("fail")).await.unwrap_err();
        assert!(matches!(err, BackendError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn upload_creates_bucket_once() {
        let (url, rec) = start_mock().await;
        let client = backend(&url, Some("user-token"));
        let owner = UserId::new("user-42");
        let upload = PhotoUpload::new("me.png", "image/png", vec![7u8; 32]);

        let id = Uuid::new_v4();
        let public = client.upload_image(&owner, id, &upload).await.unwrap();
        assert_eq!(
            public,
            format!("{url}/storage/v1/object/public/user-images/profile-images/user-42/{id}.png")
        );
        client
            .upload_image(&owner, Uuid::new_v4(), &upload)
            .await
            .unwrap();

        let calls = rec.calls.lock().unwrap().clone();
        assert_eq!(
            calls.iter().filter(|c| c.as_str() == "list buckets").count(),
            1
        );
        assert_eq!(
            calls
                .iter()
                .filter(|c| c.as_str() == "create bucket public=true")
                .count(),
            1
        );
        assert_eq!(calls.iter().filter(|c| c.starts_with("upload ")).count(), 2);
    }

    #[tokio::test]
    async fn oversize_upload_never_leaves_the_client() {
        let (url, rec) = start_mock().await;
        let client = backend(&url, Some("user-token"));
        let upload = PhotoUpload::new("huge.jpg", "image/jpeg", vec![0u8; MAX_UPLOAD_BYTES + 1]);

        let err = client
            .upload_image(&UserId::new("user-42"), Uuid::new_v4(), &upload)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::TooLarge { .. }));
        assert!(rec.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn configured_upload_limit_applies() {
        let (url, rec) = start_mock().await;
        let client = backend(&url, Some("user-token")).with_max_upload_bytes(1024);
        let owner = UserId::new("user-42");

        let big = PhotoUpload::new("big.jpg", "image/jpeg", vec![0u8; 1025]);
        let err = client
            .upload_image(&owner, Uuid::new_v4(), &big)
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::TooLarge { size: 1025, max: 1024 }));
        assert!(rec.calls.lock().unwrap().is_empty());

        let small = PhotoUpload::new("small.jpg", "image/jpeg", vec![0u8; 1024]);
        client.upload_image(&owner, Uuid::new_v4(), &small).await.unwrap();
        assert!(
            rec.calls
                .lock()
                .unwrap()
                .contains(&"bucket limit=1024".to_string())
        );
    }
}
