//! Partial configuration documents.
//!
//! A [`PartialConfig`] mirrors [`EffectiveConfig`] with every leaf and every
//! section optional. `None` means "this source did not say", which is distinct
//! from any concrete value including zero, `false` or an empty list.
//!
//! JSON `null` is read as "not specified" everywhere except `sync.provider`,
//! where an explicit `null` means "no provider" and is kept as `Some(None)`.

use super::types::{
    AppearanceConfig, BehaviorConfig, EffectiveConfig, PluginConfig, SearchConfig, ShowWindow,
    SyncConfig, Theme, WindowPosition,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// What one configuration file said.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appearance: Option<PartialAppearance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<PartialBehavior>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<PartialSearch>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugins: Option<PartialPlugins>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync: Option<PartialSync>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialAppearance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transparency: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<WindowPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_window: Option<ShowWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_window_display_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_system_tray: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_in_tray: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimize_to_tray: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialBehavior {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_hide: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebuild_index_on_startup: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_search_history: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_usage_stats: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialSearch {
    /// Keyed by platform token; merged key by key. A `null` entry is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_paths: Option<BTreeMap<String, Option<Vec<String>>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_patterns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuzzy_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_file_search: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_app_search: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_web_search: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialPlugins {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<Vec<String>>,
    /// Opaque per-plugin payloads; merged key by key. A `null` entry is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_settings: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialSync {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(
        default,
        deserialize_with = "explicit_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    pub provider: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_sync_interval: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypt_data: Option<bool>,
}

/// Present key (including `null`) becomes `Some(_)`; an absent key stays `None`
/// through `#[serde(default)]`.
fn explicit_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl PartialConfig {
    /// Whether this document specifies nothing at all.
    pub fn is_empty(&self) -> bool {
        self == &PartialConfig::default()
    }

    /// Parse a document from a JSON value.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// Mutable appearance section, created on first use.
    pub fn appearance_mut(&mut self) -> &mut PartialAppearance {
        self.appearance.get_or_insert_with(Default::default)
    }

    pub fn behavior_mut(&mut self) -> &mut PartialBehavior {
        self.behavior.get_or_insert_with(Default::default)
    }

    pub fn search_mut(&mut self) -> &mut PartialSearch {
        self.search.get_or_insert_with(Default::default)
    }

    pub fn plugins_mut(&mut self) -> &mut PartialPlugins {
        self.plugins.get_or_insert_with(Default::default)
    }

    pub fn sync_mut(&mut self) -> &mut PartialSync {
        self.sync.get_or_insert_with(Default::default)
    }
}

/// A fully specified document; used for the built-in defaults tier and for
/// writing a restored snapshot back to disk.
impl From<EffectiveConfig> for PartialConfig {
    fn from(config: EffectiveConfig) -> Self {
        let EffectiveConfig {
            appearance,
            behavior,
            search,
            plugins,
            sync,
        } = config;
        Self {
            appearance: Some(appearance.into()),
            behavior: Some(behavior.into()),
            search: Some(search.into()),
            plugins: Some(plugins.into()),
            sync: Some(sync.into()),
        }
    }
}

impl From<AppearanceConfig> for PartialAppearance {
    fn from(a: AppearanceConfig) -> Self {
        Self {
            theme: Some(a.theme),
            transparency: Some(a.transparency),
            position: Some(a.position),
            show_window: Some(a.show_window),
            show_window_display_number: Some(a.show_window_display_number),
            font_size: Some(a.font_size),
            max_results: Some(a.max_results),
            enable_system_tray: Some(a.enable_system_tray),
            start_in_tray: Some(a.start_in_tray),
            minimize_to_tray: Some(a.minimize_to_tray),
        }
    }
}

impl From<BehaviorConfig> for PartialBehavior {
    fn from(b: BehaviorConfig) -> Self {
        Self {
            hotkey: Some(b.hotkey),
            auto_hide: Some(b.auto_hide),
            max_results: Some(b.max_results),
            rebuild_index_on_startup: Some(b.rebuild_index_on_startup),
            save_search_history: Some(b.save_search_history),
            record_usage_stats: Some(b.record_usage_stats),
        }
    }
}

impl From<SearchConfig> for PartialSearch {
    fn from(s: SearchConfig) -> Self {
        Self {
            include_paths: Some(
                s.include_paths
                    .into_iter()
                    .map(|(platform, paths)| (platform, Some(paths)))
                    .collect(),
            ),
            exclude_patterns: Some(s.exclude_patterns),
            fuzzy_threshold: Some(s.fuzzy_threshold),
            enable_file_search: Some(s.enable_file_search),
            enable_app_search: Some(s.enable_app_search),
            enable_web_search: Some(s.enable_web_search),
        }
    }
}

impl From<PluginConfig> for PartialPlugins {
    fn from(p: PluginConfig) -> Self {
        Self {
            enabled: Some(p.enabled),
            disabled: Some(p.disabled),
            plugin_settings: Some(p.plugin_settings),
        }
    }
}

impl From<SyncConfig> for PartialSync {
    fn from(s: SyncConfig) -> Self {
        Self {
            enabled: Some(s.enabled),
            provider: Some(s.provider),
            auto_sync_interval: Some(s.auto_sync_interval),
            encrypt_data: Some(s.encrypt_data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformTag;
    use serde_json::json;

    #[test]
    fn test_absent_keys_are_unset() {
        let doc = PartialConfig::from_value(json!({
            "appearance": { "transparency": 0.0, "start_in_tray": false }
        }))
        .unwrap();

        let appearance = doc.appearance.as_ref().unwrap();
        assert_eq!(appearance.transparency, Some(0.0));
        assert_eq!(appearance.start_in_tray, Some(false));
        assert_eq!(appearance.font_size, None);
        assert!(doc.behavior.is_none());
    }

    #[test]
    fn test_null_is_unset_except_for_provider() {
        let doc = PartialConfig::from_value(json!({
            "behavior": { "hotkey": null },
            "sync": { "provider": null, "enabled": null }
        }))
        .unwrap();

        assert_eq!(doc.behavior.as_ref().unwrap().hotkey, None);
        let sync = doc.sync.as_ref().unwrap();
        assert_eq!(sync.provider, Some(None));
        assert_eq!(sync.enabled, None);

        let absent = PartialConfig::from_value(json!({ "sync": {} })).unwrap();
        assert_eq!(absent.sync.unwrap().provider, None);
    }

    #[test]
    fn test_serialization_omits_unset_fields() {
        let mut doc = PartialConfig::default();
        doc.behavior_mut().max_results = Some(8);
        doc.sync_mut().provider = Some(None);

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            value,
            json!({ "behavior": { "max_results": 8 }, "sync": { "provider": null } })
        );
    }

    #[test]
    fn test_from_effective_sets_every_section() {
        let doc = PartialConfig::from(EffectiveConfig::defaults_for(PlatformTag::Windows));
        assert!(doc.appearance.is_some());
        assert!(doc.behavior.is_some());
        assert!(doc.search.is_some());
        assert!(doc.plugins.is_some());
        assert_eq!(doc.sync.as_ref().unwrap().provider, Some(None));
        assert!(!doc.is_empty());
        assert!(PartialConfig::default().is_empty());
    }
}
