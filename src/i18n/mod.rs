//! i18n - Localizable Content
//!
//! The runtime never renders display strings itself. It emits
//! [`LocalizableText`] records and leaves resolution to a [`Localizer`]
//! supplied by the host.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Well-known key namespaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalizationNamespace {
    System,
    Notifications,
    UiComponents,
}

impl LocalizationNamespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocalizationNamespace::System => "system",
            LocalizationNamespace::Notifications => "notifications",
            LocalizationNamespace::UiComponents => "uicomponents",
        }
    }
}

/// A display string identified by key, with a fallback value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizableText {
    /// Translation key (e.g. `services.restservice.novalidresponse`)
    pub key: String,
    /// Key namespace; serialized as `keyNamespace` on the wire
    #[serde(rename = "keyNamespace", default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Untranslated fallback value
    pub value: String,
    /// Placeholder substitutions applied by the resolver
    #[serde(
        rename = "dynamicValueDictionary",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub dynamic_values: Option<AHashMap<String, String>>,
}

impl LocalizableText {
    /// Create a text in the `system` namespace
    pub fn system(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(LocalizationNamespace::System, key, value)
    }

    pub fn new(
        namespace: LocalizationNamespace,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            namespace: Some(namespace.as_str().to_string()),
            value: value.into(),
            dynamic_values: None,
        }
    }

    /// Attach a placeholder value
    pub fn with_dynamic_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.dynamic_values
            .get_or_insert_with(AHashMap::new)
            .insert(name.into(), value.into());
        self
    }
}

/// Resolution boundary for localizable content
pub trait Localizer: Send + Sync {
    fn localize(&self, text: &LocalizableText) -> String;
}

/// Resolver backed by a key table, falling back to the text's own value
#[derive(Debug, Default, Clone)]
pub struct TableLocalizer {
    table: AHashMap<String, String>,
}

impl TableLocalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a translation for `namespace.key` (or just `key` without namespace)
    pub fn insert(&mut self, qualified_key: impl Into<String>, value: impl Into<String>) {
        self.table.insert(qualified_key.into(), value.into());
    }

    fn qualified_key(text: &LocalizableText) -> String {
        match &text.namespace {
            Some(ns) => format!("{ns}.{}", text.key),
            None => text.key.clone(),
        }
    }
}

impl Localizer for TableLocalizer {
    fn localize(&self, text: &LocalizableText) -> String {
        let mut result = self
            .table
            .get(&Self::qualified_key(text))
            .cloned()
            .unwrap_or_else(|| text.value.clone());

        if let Some(values) = &text.dynamic_values {
            for (name, value) in values {
                result = result.replace(&format!("{{{name}}}"), value);
            }
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_to_value() {
        let localizer = TableLocalizer::new();
        let text = LocalizableText::system("global.nodisplaydefined", "Service?");
        assert_eq!(localizer.localize(&text), "Service?");
    }

    #[test]
    fn test_table_lookup_with_placeholders() {
        let mut localizer = TableLocalizer::new();
        localizer.insert("system.services.count", "{count} services running");
        let text = LocalizableText::system("services.count", "services").with_dynamic_value("count", "3");
        assert_eq!(localizer.localize(&text), "3 services running");
    }

    #[test]
    fn test_lookup_is_scoped_by_namespace() {
        let mut localizer = TableLocalizer::new();
        localizer.insert("uicomponents.views.home", "Start");
        let view = LocalizableText::new(LocalizationNamespace::UiComponents, "views.home", "Home");
        let notice = LocalizableText::new(LocalizationNamespace::Notifications, "views.home", "Home");
        assert_eq!(localizer.localize(&view), "Start");
        assert_eq!(localizer.localize(&notice), "Home");
        assert_eq!(notice.namespace.as_deref(), Some("notifications"));
    }

    #[test]
    fn test_wire_field_names() {
        let text = LocalizableText::system("a.b", "Value");
        let json = serde_json::to_value(&text).expect("serialize");
        assert_eq!(json["keyNamespace"], "system");
        assert!(json.get("dynamicValueDictionary").is_none());
    }
}
