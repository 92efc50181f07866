//! OnboardingWizard — drives the four-step profile wizard: step gating,
//! field validation, photo uploads and the final profile submission.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::{AuthProvider, ImageStore, PhotoUpload, ProfileStore};
use crate::config::OnboardingConfig;
use crate::error::BackendError;
use crate::notify::{Notification, NotificationSink};

use super::model::{
    FieldUpdate, FormErrors, OnboardingFormData, PHOTO_SLOTS, validate_age, validate_name,
    validate_photos,
};
use super::state::{OnboardingStep, WizardState};

/// Result of asking the wizard to move forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Validation passed and the wizard moved to `step`.
    Advanced { step: OnboardingStep },
    /// The current step has invalid fields; nothing moved.
    Rejected { errors: FormErrors },
    /// An upload or a submission is still running; nothing moved.
    Busy,
    /// The profile is saved and onboarding is over.
    Completed,
    /// Saving the profile failed; the wizard stays on Preferences.
    SubmissionFailed,
    /// No signed-in user; the wizard stays on Preferences.
    LoginRequired,
}

/// Result of a photo upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum UploadOutcome {
    Stored { slot: usize, url: String },
    Failed,
    /// The profile is being submitted or already saved; nothing was sent.
    Locked,
}

/// Everything the UI needs to render the wizard.
#[derive(Debug, Clone, Serialize)]
pub struct WizardSnapshot {
    pub step: OnboardingStep,
    pub step_index: Option<u8>,
    pub title: &'static str,
    pub description: &'static str,
    pub form: OnboardingFormData,
    pub errors: FormErrors,
    pub is_submitting: bool,
    pub is_uploading: bool,
}

#[derive(Debug, Default)]
struct WizardInner {
    state: WizardState,
    form: OnboardingFormData,
    errors: FormErrors,
}

/// One wizard per onboarding session. Share by `Arc`.
///
/// The lock is never held across a backend call, so the busy flags are
/// visible to concurrent callers while an upload or submission runs.
pub struct OnboardingWizard {
    auth: Arc<dyn AuthProvider>,
    profiles: Arc<dyn ProfileStore>,
    images: Arc<dyn ImageStore>,
    notifier: Arc<dyn NotificationSink>,
    config: OnboardingConfig,
    inner: RwLock<WizardInner>,
}

impl OnboardingWizard {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        profiles: Arc<dyn ProfileStore>,
        images: Arc<dyn ImageStore>,
        notifier: Arc<dyn NotificationSink>,
        config: OnboardingConfig,
    ) -> Self {
        Self {
            auth,
            profiles,
            images,
            notifier,
            config,
            inner: RwLock::new(WizardInner::default()),
        }
    }

    pub async fn snapshot(&self) -> WizardSnapshot {
        let inner = self.inner.read().await;
        let step = inner.state.step;
        WizardSnapshot {
            step,
            step_index: step.index(),
            title: step.title(),
            description: step.description(),
            form: inner.form.clone(),
            errors: inner.errors.clone(),
            is_submitting: inner.state.is_submitting,
            is_uploading: inner.state.is_uploading(),
        }
    }

    /// Largest photo accepted by [`Self::handle_photo_upload`].
    pub fn max_upload_bytes(&self) -> usize {
        self.config.max_upload_bytes
    }

    pub async fn current_step(&self) -> OnboardingStep {
        self.inner.read().await.state.step
    }

    /// Validate the current step and move forward. On the Preferences step
    /// this submits the profile.
    pub async fn next_step(&self) -> StepOutcome {
        let form = {
            let mut inner = self.inner.write().await;

            if inner.state.is_uploading() {
                self.notifier.notify(
                    Notification::info("Please wait while your photos are uploading..."),
                );
                return StepOutcome::Busy;
            }
            if inner.state.is_submitting {
                debug!("Profile submission already in flight");
                return StepOutcome::Busy;
            }

            match inner.state.step {
                OnboardingStep::Preferences => {
                    inner.state.is_submitting = true;
                    inner.form.clone()
                }
                OnboardingStep::Submitted => return StepOutcome::Completed,
                _ => {
                    if !validate_current_step(&mut inner) {
                        return StepOutcome::Rejected {
                            errors: inner.errors.clone(),
                        };
                    }
                    return match inner.state.advance() {
                        Ok(step) => {
                            debug!(step = %step, "Onboarding advanced");
                            StepOutcome::Advanced { step }
                        }
                        Err(e) => {
                            warn!("Failed to advance onboarding step: {}", e);
                            StepOutcome::Rejected {
                                errors: inner.errors.clone(),
                            }
                        }
                    };
                }
            }
        };

        let outcome = self.submit(&form).await;

        let mut inner = self.inner.write().await;
        inner.state.is_submitting = false;
        if outcome == StepOutcome::Completed {
            inner.state.step = OnboardingStep::Submitted;
        }
        outcome
    }

    /// Go back one step. No validation; a no-op on Welcome, while the
    /// profile is being submitted and after submission.
    pub async fn prev_step(&self) -> OnboardingStep {
        let mut inner = self.inner.write().await;
        if inner.state.is_locked() {
            debug!(step = %inner.state.step, "Ignoring back while the profile is locked");
            return inner.state.step;
        }
        match inner.state.retreat() {
            Ok(step) => debug!(step = %step, "Onboarding went back"),
            Err(e) => debug!("{}", e),
        }
        inner.state.step
    }

    /// Apply one field edit. Editing the name or age clears its error.
    /// Ignored once submission has started.
    pub async fn handle_change(&self, update: FieldUpdate) {
        let mut inner = self.inner.write().await;
        if inner.state.is_locked() {
            debug!("Ignoring field edit while the profile is locked");
            return;
        }
        match &update {
            FieldUpdate::Name(_) => inner.errors.name = None,
            FieldUpdate::Age(_) => inner.errors.age = None,
            _ => {}
        }
        inner.form.apply(update);
    }

    /// Upload a photo into `slot`, replacing any photo already there.
    pub async fn handle_photo_upload(&self, slot: usize, upload: PhotoUpload) -> UploadOutcome {
        if slot >= PHOTO_SLOTS {
            warn!(slot, "Photo slot out of range");
            self.notifier.notify(
                Notification::error("Invalid photo slot")
                    .with_message(format!("Pick a slot between 1 and {PHOTO_SLOTS}.")),
            );
            return UploadOutcome::Failed;
        }
        if let Err(e) = upload.check_size(self.config.max_upload_bytes) {
            warn!(slot, error = %e, "Photo rejected");
            self.notifier.notify(
                Notification::error("Photo is too large").with_message(format!(
                    "Photos must be {} or smaller.",
                    format_size(self.config.max_upload_bytes)
                )),
            );
            return UploadOutcome::Failed;
        }

        {
            let mut inner = self.inner.write().await;
            if inner.state.is_locked() {
                debug!(slot, "Ignoring upload while the profile is locked");
                return UploadOutcome::Locked;
            }
            inner.state.uploads_in_flight += 1;
        }

        let result = self.upload(&upload).await;

        let mut inner = self.inner.write().await;
        inner.state.uploads_in_flight = inner.state.uploads_in_flight.saturating_sub(1);
        match result {
            Ok(url) => {
                inner.form.photos.set(slot, url.clone());
                inner.errors.photos = None;
                info!(slot, "Photo stored");
                UploadOutcome::Stored { slot, url }
            }
            Err(e) => {
                drop(inner);
                warn!(slot, error = %e, "Photo upload failed");
                let note = match e {
                    BackendError::Unauthenticated => {
                        Notification::error("You need to be logged in to upload photos")
                    }
                    _ => Notification::error("Failed to upload image. Please try again."),
                };
                self.notifier.notify(note);
                UploadOutcome::Failed
            }
        }
    }

    /// Empty `slot`. The remote object is left in place.
    pub async fn handle_photo_delete(&self, slot: usize) {
        let cleared = {
            let mut inner = self.inner.write().await;
            if inner.state.is_locked() {
                debug!(slot, "Ignoring delete while the profile is locked");
                return;
            }
            inner.form.photos.clear(slot)
        };
        if cleared {
            self.notifier
                .notify(Notification::success("Photo deleted successfully"));
        } else {
            debug!(slot, "Ignoring delete for out-of-range photo slot");
        }
    }

    async fn upload(&self, upload: &PhotoUpload) -> Result<String, BackendError> {
        let owner = self
            .auth
            .current_user()
            .await
            .ok_or(BackendError::Unauthenticated)?;
        self.images
            .upload_image(&owner, Uuid::new_v4(), upload)
            .await
    }

    async fn submit(&self, form: &OnboardingFormData) -> StepOutcome {
        let Some(user) = self.auth.current_user().await else {
            warn!("Profile submission without a signed-in user");
            self.notifier.notify(Notification::error(
                "You need to be logged in to create a profile",
            ));
            return StepOutcome::LoginRequired;
        };

        let submission = form.to_submission(user);
        match self.profiles.upsert_profile(&submission).await {
            Ok(()) => {
                info!(user = %submission.id, photos = submission.images.len(), "Profile created");
                self.notifier
                    .notify(Notification::success("Profile created successfully!"));
                StepOutcome::Completed
            }
            Err(e) => {
                warn!(user = %submission.id, error = %e, "Profile submission failed");
                self.notifier.notify(Notification::error(
                    "Failed to save your profile. Please try again.",
                ));
                StepOutcome::SubmissionFailed
            }
        }
    }
}

/// Re-run the current step's checks, recording the messages. True when the
/// step may be left.
fn validate_current_step(inner: &mut WizardInner) -> bool {
    let form = &inner.form;
    let errors = &mut inner.errors;
    match inner.state.step {
        OnboardingStep::Photos => {
            errors.photos = validate_photos(form);
            errors.photos.is_none()
        }
        OnboardingStep::About => {
            errors.name = validate_name(form);
            errors.age = validate_age(form);
            errors.name.is_none() && errors.age.is_none()
        }
        _ => true,
    }
}

fn format_size(bytes: usize) -> String {
    const MB: usize = 1024 * 1024;
    if bytes >= MB && bytes % MB == 0 {
        format!("{} MB", bytes / MB)
    } else {
        format!("{bytes} bytes")
    }
}
