//! App-level preferences stored alongside the subscription state.

pub mod routes;
pub mod theme;

pub use routes::{SettingsRouteState, settings_routes};
pub use theme::{THEME_KEY, ThemePreference, ThemeSettings};
