//! Effective configuration types.
//!
//! [`EffectiveConfig`] is the fully merged and fully defaulted snapshot handed to
//! the rest of the launcher. Every field is concrete; "not specified" only exists
//! in [`PartialConfig`](super::PartialConfig).

use crate::platform::PlatformTag;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Color theme.
///
/// Unknown names are kept as [`Theme::Unrecognized`] so the validator can
/// report them instead of the parser rejecting the whole file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Theme {
    Light,
    Dark,
    System,
    Unrecognized(String),
}

impl Theme {
    pub const NAMES: &'static [&'static str] = &["Light", "Dark", "System"];
}

impl From<String> for Theme {
    fn from(name: String) -> Self {
        match name.as_str() {
            "Light" => Theme::Light,
            "Dark" => Theme::Dark,
            "System" => Theme::System,
            _ => Theme::Unrecognized(name),
        }
    }
}

impl From<Theme> for String {
    fn from(theme: Theme) -> Self {
        theme.to_string()
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "Light"),
            Theme::Dark => write!(f, "Dark"),
            Theme::System => write!(f, "System"),
            Theme::Unrecognized(name) => write!(f, "{}", name),
        }
    }
}

/// Which display the launcher window opens on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ShowWindow {
    /// Display under the mouse cursor.
    Mouse,
    /// Fixed display, see `show_window_display_number`.
    Display,
    Unrecognized(String),
}

impl ShowWindow {
    pub const NAMES: &'static [&'static str] = &["Mouse", "Display"];
}

impl From<String> for ShowWindow {
    fn from(name: String) -> Self {
        match name.as_str() {
            "Mouse" => ShowWindow::Mouse,
            "Display" => ShowWindow::Display,
            _ => ShowWindow::Unrecognized(name),
        }
    }
}

impl From<ShowWindow> for String {
    fn from(show: ShowWindow) -> Self {
        show.to_string()
    }
}

impl fmt::Display for ShowWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShowWindow::Mouse => write!(f, "Mouse"),
            ShowWindow::Display => write!(f, "Display"),
            ShowWindow::Unrecognized(name) => write!(f, "{}", name),
        }
    }
}

/// Screen coordinates for a custom window position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Window placement.
///
/// Serialized as `"Center"`, `"Cursor"` or `{"Custom": {"x": 10, "y": 20}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PositionRepr", into = "PositionRepr")]
pub enum WindowPosition {
    Center,
    Cursor,
    Custom { x: i32, y: i32 },
    Unrecognized(String),
}

impl WindowPosition {
    pub const NAMES: &'static [&'static str] = &["Center", "Cursor", "Custom"];
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum PositionRepr {
    Name(String),
    Tagged(BTreeMap<String, Point>),
}

impl From<PositionRepr> for WindowPosition {
    fn from(repr: PositionRepr) -> Self {
        match repr {
            PositionRepr::Name(name) => match name.as_str() {
                "Center" => WindowPosition::Center,
                "Cursor" => WindowPosition::Cursor,
                _ => WindowPosition::Unrecognized(name),
            },
            PositionRepr::Tagged(map) => {
                let mut entries = map.into_iter();
                match (entries.next(), entries.next()) {
                    (Some((tag, point)), None) if tag == "Custom" => WindowPosition::Custom {
                        x: point.x,
                        y: point.y,
                    },
                    (Some((tag, _)), _) => WindowPosition::Unrecognized(tag),
                    (None, _) => WindowPosition::Unrecognized(String::new()),
                }
            }
        }
    }
}

impl From<WindowPosition> for PositionRepr {
    fn from(position: WindowPosition) -> Self {
        match position {
            WindowPosition::Center => PositionRepr::Name("Center".to_string()),
            WindowPosition::Cursor => PositionRepr::Name("Cursor".to_string()),
            WindowPosition::Custom { x, y } => {
                PositionRepr::Tagged(BTreeMap::from([("Custom".to_string(), Point { x, y })]))
            }
            WindowPosition::Unrecognized(name) => PositionRepr::Name(name),
        }
    }
}

impl fmt::Display for WindowPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowPosition::Center => write!(f, "Center"),
            WindowPosition::Cursor => write!(f, "Cursor"),
            WindowPosition::Custom { x, y } => write!(f, "Custom({}, {})", x, y),
            WindowPosition::Unrecognized(name) => write!(f, "{}", name),
        }
    }
}

/// Window look and placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppearanceConfig {
    pub theme: Theme,
    /// Window opacity in `[0.0, 1.0]`.
    pub transparency: f32,
    pub position: WindowPosition,
    pub show_window: ShowWindow,
    pub show_window_display_number: u32,
    pub font_size: i64,
    pub max_results: i64,
    pub enable_system_tray: bool,
    pub start_in_tray: bool,
    pub minimize_to_tray: bool,
}

/// Interaction behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorConfig {
    /// Global activation hotkey, e.g. `Ctrl+Space`.
    pub hotkey: String,
    pub auto_hide: bool,
    pub max_results: i64,
    pub rebuild_index_on_startup: bool,
    pub save_search_history: bool,
    pub record_usage_stats: bool,
}

/// Search and indexing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Directories to index, keyed by platform token.
    pub include_paths: BTreeMap<String, Vec<String>>,
    pub exclude_patterns: Vec<String>,
    /// Minimum fuzzy match score in `[0.0, 1.0]`.
    pub fuzzy_threshold: f64,
    pub enable_file_search: bool,
    pub enable_app_search: bool,
    pub enable_web_search: bool,
}

/// Plugin selection and opaque per-plugin settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginConfig {
    pub enabled: Vec<String>,
    pub disabled: Vec<String>,
    /// Plugin id to plugin-owned settings. Never interpreted here.
    pub plugin_settings: BTreeMap<String, Value>,
}

/// Cross-machine sync settings. Only user scope is meant to be synchronized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    pub enabled: bool,
    pub provider: Option<String>,
    /// Seconds between automatic syncs; 0 disables the timer.
    pub auto_sync_interval: i64,
    pub encrypt_data: bool,
}

/// Fully merged launcher configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub appearance: AppearanceConfig,
    pub behavior: BehaviorConfig,
    pub search: SearchConfig,
    pub plugins: PluginConfig,
    pub sync: SyncConfig,
}

impl EffectiveConfig {
    /// Built-in defaults for the given platform.
    ///
    /// Only `search.include_paths` depends on the platform.
    pub fn defaults_for(platform: PlatformTag) -> Self {
        Self {
            appearance: AppearanceConfig {
                theme: Theme::System,
                transparency: 0.95,
                position: WindowPosition::Center,
                show_window: ShowWindow::Mouse,
                show_window_display_number: 0,
                font_size: 14,
                max_results: 10,
                enable_system_tray: true,
                start_in_tray: false,
                minimize_to_tray: true,
            },
            behavior: BehaviorConfig {
                hotkey: "Ctrl+Space".to_string(),
                auto_hide: true,
                max_results: 10,
                rebuild_index_on_startup: true,
                save_search_history: true,
                record_usage_stats: true,
            },
            search: SearchConfig {
                include_paths: default_include_paths(platform),
                exclude_patterns: vec!["*.tmp".to_string(), "*.log".to_string()],
                fuzzy_threshold: 0.6,
                enable_file_search: true,
                enable_app_search: true,
                enable_web_search: false,
            },
            plugins: PluginConfig {
                enabled: vec!["calculator".to_string(), "translator".to_string()],
                disabled: vec!["weather".to_string()],
                plugin_settings: BTreeMap::new(),
            },
            sync: SyncConfig {
                enabled: false,
                provider: None,
                auto_sync_interval: 3600, // 1 hour
                encrypt_data: true,
            },
        }
    }

    /// Index roots for the given platform, if any are configured.
    pub fn include_paths_for(&self, platform: PlatformTag) -> &[String] {
        platform
            .include_paths_key()
            .and_then(|key| self.search.include_paths.get(key))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Settings payload for one plugin, if any tier provided one.
    pub fn plugin_settings(&self, plugin_id: &str) -> Option<&Value> {
        self.plugins.plugin_settings.get(plugin_id)
    }

    /// Whether a plugin is listed as enabled and not also disabled.
    pub fn is_plugin_enabled(&self, plugin_id: &str) -> bool {
        self.plugins.enabled.iter().any(|p| p == plugin_id)
            && !self.plugins.disabled.iter().any(|p| p == plugin_id)
    }
}

fn default_include_paths(platform: PlatformTag) -> BTreeMap<String, Vec<String>> {
    let paths: &[&str] = match platform {
        PlatformTag::Windows => &["C:\\Program Files", "C:\\Program Files (x86)"],
        PlatformTag::MacOS => &["~/Applications", "/Applications"],
        PlatformTag::Linux | PlatformTag::Ubuntu => {
            &["/usr/bin", "/usr/local/bin", "~/.local/share/applications"]
        }
        PlatformTag::Generic => &[],
    };

    let mut map = BTreeMap::new();
    if let Some(key) = platform.include_paths_key() {
        map.insert(key.to_string(), paths.iter().map(|p| p.to_string()).collect());
    }
    map
}
