//! Ports to the hosted backend (auth, profile records, image storage) and
//! their implementations.

pub mod demo;
pub mod rest;
pub mod traits;

pub use demo::{DemoImageStore, MemoryProfileStore, StaticAuth};
pub use rest::RestBackend;
pub use traits::{AuthProvider, ImageStore, PhotoUpload, ProfileStore, ProfileSubmission, UserId};

/// Upload ceiling for profile photos (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
