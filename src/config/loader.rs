//! Loading a single configuration file into a [`PartialConfig`].

use super::partial::PartialConfig;
use crate::error::{IoError, LoadError, ParseError};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Known keys per section. Anything else is reported as a soft warning.
const KNOWN_SECTIONS: &[(&str, &[&str])] = &[
    (
        "appearance",
        &[
            "theme",
            "transparency",
            "position",
            "show_window",
            "show_window_display_number",
            "font_size",
            "max_results",
            "enable_system_tray",
            "start_in_tray",
            "minimize_to_tray",
        ],
    ),
    (
        "behavior",
        &[
            "hotkey",
            "auto_hide",
            "max_results",
            "rebuild_index_on_startup",
            "save_search_history",
            "record_usage_stats",
        ],
    ),
    (
        "search",
        &[
            "include_paths",
            "exclude_patterns",
            "fuzzy_threshold",
            "enable_file_search",
            "enable_app_search",
            "enable_web_search",
        ],
    ),
    ("plugins", &["enabled", "disabled", "plugin_settings"]),
    (
        "sync",
        &["enabled", "provider", "auto_sync_interval", "encrypt_data"],
    ),
];

/// An unknown key that was ignored while loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadWarning {
    pub path: PathBuf,
    /// Dotted key path, e.g. `appearance.colour`.
    pub key: String,
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown key '{}' in {}", self.key, self.path.display())
    }
}

/// A parsed document plus the soft warnings produced while reading it.
#[derive(Debug, Clone, Default)]
pub struct LoadedDocument {
    pub document: PartialConfig,
    pub warnings: Vec<LoadWarning>,
}

/// Reads and parses configuration files.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentLoader;

impl DocumentLoader {
    /// Load a present file.
    ///
    /// Not-found is filtered out by the locator; if the file vanished in between
    /// it surfaces here as an [`IoError`].
    pub fn load(&self, path: &Path) -> Result<LoadedDocument, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| IoError::new(path, e))?;
        let loaded = self.parse(path, &content)?;
        debug!(
            path = %path.display(),
            warnings = loaded.warnings.len(),
            "loaded config document"
        );
        Ok(loaded)
    }

    /// Parse document text. `path` is only used for error and warning context.
    pub fn parse(&self, path: &Path, content: &str) -> Result<LoadedDocument, ParseError> {
        let raw: Value =
            serde_json::from_str(content).map_err(|e| ParseError::new(path, e.to_string()))?;

        let Value::Object(root) = &raw else {
            return Err(ParseError::new(
                path,
                format!("expected a JSON object at top level, found {}", kind(&raw)),
            ));
        };

        let warnings = unknown_keys(path, root)?;
        for warning in &warnings {
            warn!(path = %warning.path.display(), key = %warning.key, "ignoring unknown config key");
        }

        let document =
            PartialConfig::from_value(raw).map_err(|e| ParseError::new(path, e.to_string()))?;

        Ok(LoadedDocument { document, warnings })
    }
}

fn unknown_keys(path: &Path, root: &Map<String, Value>) -> Result<Vec<LoadWarning>, ParseError> {
    let mut warnings = Vec::new();
    for (section, value) in root {
        let Some((_, fields)) = KNOWN_SECTIONS.iter().find(|(name, _)| *name == section.as_str()) else {
            warnings.push(LoadWarning {
                path: path.to_path_buf(),
                key: section.clone(),
            });
            continue;
        };

        let fields_map = match value {
            Value::Object(map) => map,
            Value::Null => continue,
            other => {
                return Err(ParseError::new(
                    path,
                    format!("section '{}' must be an object, found {}", section, kind(other)),
                ));
            }
        };

        // plugin_settings is free-form, so only its own siblings are checked.
        for key in fields_map.keys() {
            if !fields.contains(&key.as_str()) {
                warnings.push(LoadWarning {
                    path: path.to_path_buf(),
                    key: format!("{}.{}", section, key),
                });
            }
        }
    }
    Ok(warnings)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn parse(content: &str) -> Result<LoadedDocument, ParseError> {
        DocumentLoader.parse(Path::new("config.json"), content)
    }

    #[test]
    fn test_parse_partial_document() {
        let loaded = parse(r#"{ "appearance": { "transparency": 0.8 } }"#).unwrap();
        let appearance = loaded.document.appearance.unwrap();
        assert_eq!(appearance.transparency, Some(0.8));
        assert_eq!(appearance.theme, None);
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn test_empty_object_is_empty_document() {
        let loaded = parse("{}").unwrap();
        assert!(loaded.document.is_empty());
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = parse(r#"{ "appearance": { "transparency": 0.8 "#).unwrap_err();
        assert_eq!(err.path, PathBuf::from("config.json"));
        assert!(!err.detail.is_empty());
    }

    #[test]
    fn test_non_object_root_is_parse_error() {
        let err = parse("[1, 2, 3]").unwrap_err();
        assert!(err.detail.contains("an array"));
    }

    #[test]
    fn test_non_object_section_is_parse_error() {
        let err = parse(r#"{ "behavior": "fast" }"#).unwrap_err();
        assert!(err.detail.contains("behavior"));
    }

    #[test]
    fn test_wrong_field_type_is_parse_error() {
        assert!(parse(r#"{ "appearance": { "transparency": "high" } }"#).is_err());
    }

    #[test]
    fn test_unknown_keys_are_soft_warnings() {
        let loaded = parse(
            r#"{
                "appearance": { "colour": "red", "font_size": 12 },
                "telemetry": { "enabled": true }
            }"#,
        )
        .unwrap();

        let keys: Vec<&str> = loaded.warnings.iter().map(|w| w.key.as_str()).collect();
        assert_eq!(keys, vec!["appearance.colour", "telemetry"]);
        assert_eq!(loaded.document.appearance.unwrap().font_size, Some(12));
    }

    #[test]
    fn test_plugin_settings_preserved_opaquely() {
        let loaded = parse(
            r#"{
                "plugins": {
                    "plugin_settings": {
                        "translator": { "target": "ja", "engines": ["a", "b"] },
                        "anything-goes": 42
                    }
                }
            }"#,
        )
        .unwrap();

        assert!(loaded.warnings.is_empty());
        let settings = loaded.document.plugins.unwrap().plugin_settings.unwrap();
        assert_eq!(
            settings["translator"],
            json!({ "target": "ja", "engines": ["a", "b"] })
        );
        assert_eq!(settings["anything-goes"], json!(42));
    }

    #[test]
    fn test_load_reads_from_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.local.json");
        std::fs::write(&path, r#"{ "sync": { "auto_sync_interval": 0 } }"#).unwrap();

        let loaded = DocumentLoader.load(&path).unwrap();
        assert_eq!(loaded.document.sync.unwrap().auto_sync_interval, Some(0));
    }

    #[test]
    fn test_load_unreadable_path_is_io_error() {
        let temp = TempDir::new().unwrap();
        // A directory exists but cannot be read as a file.
        let err = DocumentLoader.load(temp.path()).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }
}
