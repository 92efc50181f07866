//! Onboarding: the four-step wizard that builds a new user's profile.
//!
//! Welcome → Photos → About → Preferences, then the profile is written to the
//! backend and the wizard parks on `Submitted`. Photos go to object storage as
//! they are picked; the form itself is only sent at the end.

pub mod model;
pub mod routes;
pub mod state;
pub mod wizard;

pub use model::{FieldUpdate, FormErrors, Gender, OnboardingFormData, Preferences};
pub use routes::{OnboardingRouteState, onboarding_routes};
pub use state::{OnboardingStep, WizardState};
pub use wizard::{OnboardingWizard, StepOutcome, UploadOutcome, WizardSnapshot};
