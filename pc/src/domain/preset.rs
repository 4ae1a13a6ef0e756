//! Preset and patch types
//!
//! The serde shape matches the catalog wire format:
//! `{ name, message, category: [..], options?: [{id, text}], randomizeOptions? }`.

use serde::{Deserialize, Serialize};

/// One entry of a preset's structured option list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresetOption {
    pub id: String,
    pub text: String,
}

impl PresetOption {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// A named instruction template sent to the image-transform service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preset {
    /// Unique key within a resolved catalog
    pub name: String,

    /// Category tags (treated as a set)
    #[serde(default)]
    pub category: Vec<String>,

    /// Template text
    pub message: String,

    /// Structured options; empty means the message may carry legacy selection text
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<PresetOption>,

    /// Pick an option at random instead of the manual/first choice
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub randomize_options: bool,

    /// Factory or imported preset. Set by the repository, never serialized.
    #[serde(skip)]
    pub internal: bool,
}

impl Preset {
    /// Create a user-authored preset
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: Vec::new(),
            message: message.into(),
            options: Vec::new(),
            randomize_options: false,
            internal: false,
        }
    }

    /// Add a category tag (duplicates are ignored)
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        let category = category.into();
        if !self.has_category(&category) {
            self.category.push(category);
        }
        self
    }

    /// Set the structured option list
    pub fn with_options(mut self, options: Vec<PresetOption>) -> Self {
        self.options = options;
        self
    }

    /// Pick structured options at random
    pub fn randomized(mut self) -> Self {
        self.randomize_options = true;
        self
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.category.iter().any(|c| c == category)
    }

    /// True when the preset carries a structured option list
    pub fn is_structured(&self) -> bool {
        !self.options.is_empty()
    }

    /// Drop repeated category tags, keeping first occurrence order
    pub(crate) fn dedupe_categories(&mut self) {
        let mut seen = Vec::with_capacity(self.category.len());
        self.category.retain(|c| {
            if seen.contains(c) {
                false
            } else {
                seen.push(c.clone());
                true
            }
        });
    }
}

/// Partial preset stored in a modification record. Present fields win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresetPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<PresetOption>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub randomize_options: Option<bool>,
}

impl PresetPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.message.is_none()
            && self.options.is_none()
            && self.randomize_options.is_none()
    }

    /// Combine two patches; fields set in `later` win
    pub fn merged_with(&self, later: &PresetPatch) -> PresetPatch {
        PresetPatch {
            name: later.name.clone().or_else(|| self.name.clone()),
            category: later.category.clone().or_else(|| self.category.clone()),
            message: later.message.clone().or_else(|| self.message.clone()),
            options: later.options.clone().or_else(|| self.options.clone()),
            randomize_options: later.randomize_options.or(self.randomize_options),
        }
    }

    /// Shallow-merge onto a preset. `internal` is never touched.
    pub fn apply(&self, preset: &mut Preset) {
        if let Some(name) = &self.name {
            preset.name = name.clone();
        }
        if let Some(category) = &self.category {
            preset.category = category.clone();
        }
        if let Some(message) = &self.message {
            preset.message = message.clone();
        }
        if let Some(options) = &self.options {
            preset.options = options.clone();
        }
        if let Some(randomize) = self.randomize_options {
            preset.randomize_options = randomize;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format_roundtrip_fields() {
        let json = r#"{
            "name": "Pets",
            "message": "Turn the subject into a pet.",
            "category": ["Fun"],
            "options": [{"id": "001", "text": "Cat"}],
            "randomizeOptions": true
        }"#;
        let preset: Preset = serde_json::from_str(json).unwrap();
        assert_eq!(preset.name, "Pets");
        assert_eq!(preset.options[0].text, "Cat");
        assert!(preset.randomize_options);
        assert!(!preset.internal);

        let value = serde_json::to_value(&preset).unwrap();
        assert_eq!(value["randomizeOptions"], true);
        assert!(value.get("internal").is_none());
    }

    #[test]
    fn test_optional_fields_default() {
        let preset: Preset = serde_json::from_str(r#"{"name": "Plain", "message": "hi"}"#).unwrap();
        assert!(preset.category.is_empty());
        assert!(preset.options.is_empty());
        assert!(!preset.randomize_options);
    }

    #[test]
    fn test_patch_apply_keeps_unspecified_fields() {
        let mut preset = Preset::new("Noir", "Black and white").with_category("Film");
        preset.internal = true;

        let patch = PresetPatch {
            message: Some("High contrast black and white".to_string()),
            ..Default::default()
        };
        patch.apply(&mut preset);

        assert_eq!(preset.message, "High contrast black and white");
        assert_eq!(preset.category, vec!["Film".to_string()]);
        assert!(preset.internal);
    }

    #[test]
    fn test_patch_from_full_preset_json() {
        let patch: PresetPatch = serde_json::from_str(
            r#"{"name": "Noir", "message": "new", "category": ["A"], "randomizeOptions": false}"#,
        )
        .unwrap();
        assert_eq!(patch.message.as_deref(), Some("new"));
        assert_eq!(patch.randomize_options, Some(false));
        assert!(patch.options.is_none());
    }

    #[test]
    fn test_patch_merged_with() {
        let first = PresetPatch {
            message: Some("one".to_string()),
            category: Some(vec!["A".to_string()]),
            ..Default::default()
        };
        let second = PresetPatch {
            message: Some("two".to_string()),
            ..Default::default()
        };
        let merged = first.merged_with(&second);
        assert_eq!(merged.message.as_deref(), Some("two"));
        assert_eq!(merged.category, Some(vec!["A".to_string()]));
        assert!(PresetPatch::default().is_empty());
        assert!(!merged.is_empty());
    }

    #[test]
    fn test_category_dedupe() {
        let mut preset = Preset::new("x", "y").with_category("A").with_category("A");
        assert_eq!(preset.category.len(), 1);

        preset.category = vec!["B".into(), "A".into(), "B".into()];
        preset.dedupe_categories();
        assert_eq!(preset.category, vec!["B".to_string(), "A".to_string()]);
    }
}
