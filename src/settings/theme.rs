//! UI theme preference.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::store::KeyValueStore;

/// Settings key holding the theme.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    Dark,
    Colorful,
}

impl Default for ThemePreference {
    fn default() -> Self {
        Self::Light
    }
}

impl ThemePreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
            Self::Colorful => "colorful",
        }
    }

    /// Parse a stored value. Anything unrecognised is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            "colorful" => Some(Self::Colorful),
            _ => None,
        }
    }
}

impl std::fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The persisted theme, cached in memory.
pub struct ThemeSettings {
    store: Arc<dyn KeyValueStore>,
    current: RwLock<ThemePreference>,
}

impl ThemeSettings {
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let current = match store.get(THEME_KEY).await {
            Ok(Some(raw)) => ThemePreference::parse(&raw).unwrap_or_else(|| {
                debug!(value = %raw, "Unknown stored theme, using light");
                ThemePreference::default()
            }),
            Ok(None) => ThemePreference::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read theme");
                ThemePreference::default()
            }
        };
        Self {
            store,
            current: RwLock::new(current),
        }
    }

    pub async fn theme(&self) -> ThemePreference {
        *self.current.read().await
    }

    /// Switch theme. The in-memory value changes even if the write fails.
    pub async fn set_theme(&self, theme: ThemePreference) {
        let mut current = self.current.write().await;
        *current = theme;
        if let Err(e) = self.store.set(THEME_KEY, theme.as_str()).await {
            warn!(error = %e, theme = %theme, "Failed to persist theme");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn defaults_to_light() {
        let settings = ThemeSettings::load(Arc::new(MemoryStore::new())).await;
        assert_eq!(settings.theme().await, ThemePreference::Light);
    }

    #[tokio::test]
    async fn persists_and_reloads() {
        let store = Arc::new(MemoryStore::new());
        let settings = ThemeSettings::load(store.clone()).await;
        settings.set_theme(ThemePreference::Colorful).await;
        assert_eq!(store.get(THEME_KEY).await.unwrap().as_deref(), Some("colorful"));

        let reloaded = ThemeSettings::load(store).await;
        assert_eq!(reloaded.theme().await, ThemePreference::Colorful);
    }

    #[tokio::test]
    async fn unknown_value_falls_back_to_light() {
        let store = Arc::new(MemoryStore::with_values([(THEME_KEY, "neon")]));
        let settings = ThemeSettings::load(store).await;
        assert_eq!(settings.theme().await, ThemePreference::Light);
    }
}
