//! Navigation - requests emitted towards the UI router

use super::Selectable;
use crate::i18n::LocalizableText;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How the target should be presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NavigationType {
    #[default]
    View,
    Dialog,
}

impl fmt::Display for NavigationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationType::View => f.write_str("View"),
            NavigationType::Dialog => f.write_str("Dialog"),
        }
    }
}

/// A navigable element (page, dialog) known to the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationElement {
    #[serde(flatten)]
    pub base: Selectable,
    /// Module path the router loads for this element
    pub import_path: String,
    /// Presentation; `View` when absent
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub navigation_type: Option<NavigationType>,
}

impl NavigationElement {
    pub fn new(key: impl Into<String>, display: LocalizableText, import_path: impl Into<String>) -> Self {
        Self {
            base: Selectable {
                key: key.into(),
                display,
                description: None,
                is_visible: None,
            },
            import_path: import_path.into(),
            navigation_type: None,
        }
    }

    pub fn with_type(mut self, navigation_type: NavigationType) -> Self {
        self.navigation_type = Some(navigation_type);
        self
    }

    pub fn key(&self) -> &str {
        &self.base.key
    }
}

/// A single navigation event, as broadcast and archived
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationRequest {
    pub key: String,
    #[serde(rename = "type")]
    pub navigation_type: NavigationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub timestamp: DateTime<Local>,
}

impl NavigationRequest {
    pub fn new(key: impl Into<String>, navigation_type: NavigationType, url: Option<String>) -> Self {
        Self {
            key: key.into(),
            navigation_type,
            url,
            timestamp: Local::now(),
        }
    }
}
