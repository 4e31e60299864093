//! Locally persisted application settings.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub push: bool,
    pub email: bool,
    pub daily_reminder: bool,
    pub friend_activity: bool,
    pub achievements: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            push: true,
            email: false,
            daily_reminder: true,
            friend_activity: true,
            achievements: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Friends,
    Private,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PrivacySettings {
    pub profile_visibility: Visibility,
    pub activity_visibility: Visibility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    Light,
    Dark,
    #[default]
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeSettings {
    pub mode: ThemeMode,
    pub primary_color: String,
}

impl Default for ThemeSettings {
    fn default() -> Self {
        Self {
            mode: ThemeMode::System,
            primary_color: "#6366f1".to_string(),
        }
    }
}

/// Everything configurable on the settings screen, stored as one JSON
/// value under the `app_settings` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    pub notifications: NotificationSettings,
    pub privacy: PrivacySettings,
    pub theme: ThemeSettings,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            notifications: NotificationSettings::default(),
            privacy: PrivacySettings::default(),
            theme: ThemeSettings::default(),
            language: default_language(),
        }
    }
}

fn default_language() -> String {
    "en".to_string()
}
