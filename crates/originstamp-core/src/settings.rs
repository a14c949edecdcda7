//! The two user-facing settings: API credential and notification address.

use serde::{Deserialize, Serialize};

/// Credential and notification address.
///
/// Consumers only check presence; a blank value counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub notify_email: Option<String>,
}

impl Settings {
    pub fn new(api_key: Option<String>, notify_email: Option<String>) -> Self {
        Self {
            api_key: non_blank(api_key),
            notify_email: non_blank(notify_email),
        }
    }

    /// The credential, if one is configured.
    pub fn api_key(&self) -> Option<&str> {
        present(&self.api_key)
    }

    /// The notification address, if one is configured.
    pub fn notify_email(&self) -> Option<&str> {
        present(&self.notify_email)
    }

    /// Apply `other` on top of `self`, keeping fields `other` leaves unset.
    pub fn merged_with(mut self, other: Settings) -> Self {
        let has_key = other.api_key().is_some();
        let has_email = other.notify_email().is_some();
        if has_key {
            self.api_key = other.api_key;
        }
        if has_email {
            self.notify_email = other.notify_email;
        }
        self
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
