//! Selectable - items a user can pick from a list or menu

use crate::i18n::LocalizableText;
use serde::{Deserialize, Serialize};

/// Common shape of anything selectable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selectable {
    pub key: String,
    pub display: LocalizableText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizableText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_visible: Option<bool>,
}
