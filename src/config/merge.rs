//! Field-by-field merging of ranked partial documents.
//!
//! Higher rank values override lower rank values per leaf field.
//! Lists are replaced entirely, not concatenated.
//! Maps (`include_paths`, `plugin_settings`) are unioned key by key, with the
//! same override rule applied per key.
//! The built-in defaults act as rank 0 and set every field.

use super::partial::{
    PartialAppearance, PartialBehavior, PartialConfig, PartialPlugins, PartialSearch, PartialSync,
};
use super::sources::Rank;
use super::types::EffectiveConfig;
use serde_json::Value;
use std::collections::BTreeMap;

/// A loaded document together with the rank of its source.
#[derive(Debug, Clone)]
pub struct RankedDocument {
    pub rank: Rank,
    pub document: PartialConfig,
}

impl RankedDocument {
    pub fn new(rank: Rank, document: PartialConfig) -> Self {
        Self { rank, document }
    }
}

/// Layering of one partial document over a lower-ranked one.
trait Overlay {
    /// Apply `higher` on top of `self`; fields `higher` leaves unset are kept.
    fn overlay(&mut self, higher: Self);
}

fn take<T>(slot: &mut Option<T>, higher: Option<T>) {
    if higher.is_some() {
        *slot = higher;
    }
}

fn section<T: Overlay + Default>(slot: &mut Option<T>, higher: Option<T>) {
    if let Some(higher) = higher {
        slot.get_or_insert_with(T::default).overlay(higher);
    }
}

impl Overlay for PartialConfig {
    fn overlay(&mut self, higher: Self) {
        section(&mut self.appearance, higher.appearance);
        section(&mut self.behavior, higher.behavior);
        section(&mut self.search, higher.search);
        section(&mut self.plugins, higher.plugins);
        section(&mut self.sync, higher.sync);
    }
}

impl Overlay for PartialAppearance {
    fn overlay(&mut self, higher: Self) {
        take(&mut self.theme, higher.theme);
        take(&mut self.transparency, higher.transparency);
        take(&mut self.position, higher.position);
        take(&mut self.show_window, higher.show_window);
        take(
            &mut self.show_window_display_number,
            higher.show_window_display_number,
        );
        take(&mut self.font_size, higher.font_size);
        take(&mut self.max_results, higher.max_results);
        take(&mut self.enable_system_tray, higher.enable_system_tray);
        take(&mut self.start_in_tray, higher.start_in_tray);
        take(&mut self.minimize_to_tray, higher.minimize_to_tray);
    }
}

impl Overlay for PartialBehavior {
    fn overlay(&mut self, higher: Self) {
        take(&mut self.hotkey, higher.hotkey);
        take(&mut self.auto_hide, higher.auto_hide);
        take(&mut self.max_results, higher.max_results);
        take(
            &mut self.rebuild_index_on_startup,
            higher.rebuild_index_on_startup,
        );
        take(&mut self.save_search_history, higher.save_search_history);
        take(&mut self.record_usage_stats, higher.record_usage_stats);
    }
}

impl Overlay for PartialSearch {
    fn overlay(&mut self, higher: Self) {
        if let Some(paths) = higher.include_paths {
            let merged = self.include_paths.get_or_insert_with(BTreeMap::new);
            for (platform, entry) in paths {
                if entry.is_some() {
                    merged.insert(platform, entry);
                }
            }
        }
        take(&mut self.exclude_patterns, higher.exclude_patterns);
        take(&mut self.fuzzy_threshold, higher.fuzzy_threshold);
        take(&mut self.enable_file_search, higher.enable_file_search);
        take(&mut self.enable_app_search, higher.enable_app_search);
        take(&mut self.enable_web_search, higher.enable_web_search);
    }
}

impl Overlay for PartialPlugins {
    fn overlay(&mut self, higher: Self) {
        take(&mut self.enabled, higher.enabled);
        take(&mut self.disabled, higher.disabled);
        if let Some(settings) = higher.plugin_settings {
            let merged = self.plugin_settings.get_or_insert_with(BTreeMap::new);
            // Payloads are opaque: a key's value is replaced whole, never merged.
            merged.extend(settings.into_iter().filter(|(_, v)| !v.is_null()));
        }
    }
}

impl Overlay for PartialSync {
    fn overlay(&mut self, higher: Self) {
        take(&mut self.enabled, higher.enabled);
        take(&mut self.provider, higher.provider);
        take(&mut self.auto_sync_interval, higher.auto_sync_interval);
        take(&mut self.encrypt_data, higher.encrypt_data);
    }
}

/// Merges ranked documents over the built-in defaults.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigMerger;

impl ConfigMerger {
    /// Merge documents (any order; sorted by rank here) over `defaults`.
    ///
    /// Equal ranks keep their input order, later wins.
    pub fn merge(&self, defaults: &EffectiveConfig, documents: Vec<RankedDocument>) -> EffectiveConfig {
        let mut documents = documents;
        documents.sort_by_key(|doc| doc.rank);

        let merged = documents
            .into_iter()
            .fold(PartialConfig::default(), |mut acc, doc| {
                acc.overlay(doc.document);
                acc
            });

        apply(defaults.clone(), merged)
    }
}

/// Fill `base` (rank 0) with every field `merged` specifies.
fn apply(mut base: EffectiveConfig, merged: PartialConfig) -> EffectiveConfig {
    if let Some(a) = merged.appearance {
        let out = &mut base.appearance;
        set(&mut out.theme, a.theme);
        set(&mut out.transparency, a.transparency);
        set(&mut out.position, a.position);
        set(&mut out.show_window, a.show_window);
        set(&mut out.show_window_display_number, a.show_window_display_number);
        set(&mut out.font_size, a.font_size);
        set(&mut out.max_results, a.max_results);
        set(&mut out.enable_system_tray, a.enable_system_tray);
        set(&mut out.start_in_tray, a.start_in_tray);
        set(&mut out.minimize_to_tray, a.minimize_to_tray);
    }

    if let Some(b) = merged.behavior {
        let out = &mut base.behavior;
        set(&mut out.hotkey, b.hotkey);
        set(&mut out.auto_hide, b.auto_hide);
        set(&mut out.max_results, b.max_results);
        set(&mut out.rebuild_index_on_startup, b.rebuild_index_on_startup);
        set(&mut out.save_search_history, b.save_search_history);
        set(&mut out.record_usage_stats, b.record_usage_stats);
    }

    if let Some(s) = merged.search {
        let out = &mut base.search;
        if let Some(paths) = s.include_paths {
            out.include_paths.extend(
                paths
                    .into_iter()
                    .filter_map(|(platform, entry)| entry.map(|paths| (platform, paths))),
            );
        }
        set(&mut out.exclude_patterns, s.exclude_patterns);
        set(&mut out.fuzzy_threshold, s.fuzzy_threshold);
        set(&mut out.enable_file_search, s.enable_file_search);
        set(&mut out.enable_app_search, s.enable_app_search);
        set(&mut out.enable_web_search, s.enable_web_search);
    }

    if let Some(p) = merged.plugins {
        let out = &mut base.plugins;
        set(&mut out.enabled, p.enabled);
        set(&mut out.disabled, p.disabled);
        if let Some(settings) = p.plugin_settings {
            out.plugin_settings.extend(
                settings
                    .into_iter()
                    .filter(|(_, v): &(String, Value)| !v.is_null()),
            );
        }
    }

    if let Some(s) = merged.sync {
        let out = &mut base.sync;
        set(&mut out.enabled, s.enabled);
        set(&mut out.provider, s.provider);
        set(&mut out.auto_sync_interval, s.auto_sync_interval);
        set(&mut out.encrypt_data, s.encrypt_data);
    }

    base
}

fn set<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::sources::SourceTier;
    use crate::platform::PlatformTag;
    use serde_json::json;

    fn rank(tier: SourceTier) -> Rank {
        Rank {
            tier,
            specificity: 0,
        }
    }

    fn doc(tier: SourceTier, value: Value) -> RankedDocument {
        RankedDocument::new(rank(tier), PartialConfig::from_value(value).unwrap())
    }

    fn defaults() -> EffectiveConfig {
        EffectiveConfig::defaults_for(PlatformTag::Linux)
    }

    #[test]
    fn test_no_documents_yields_defaults() {
        let merged = ConfigMerger.merge(&defaults(), Vec::new());
        assert_eq!(merged, defaults());
    }

    #[test]
    fn test_highest_rank_wins_per_field() {
        let merged = ConfigMerger.merge(
            &defaults(),
            vec![
                doc(SourceTier::User, json!({"appearance": {"transparency": 0.9, "font_size": 18}})),
                doc(SourceTier::PlatformUser, json!({"appearance": {"transparency": 0.8}})),
                doc(SourceTier::Debug, json!({"appearance": {"transparency": 0.95}})),
                doc(SourceTier::PlatformDebug, json!({"appearance": {"transparency": 0.99}})),
            ],
        );
        assert_eq!(merged.appearance.transparency, 0.99);
        // Untouched by higher tiers.
        assert_eq!(merged.appearance.font_size, 18);
        // From defaults.
        assert_eq!(merged.behavior.hotkey, "Ctrl+Space");
    }

    #[test]
    fn test_merge_is_independent_of_input_order() {
        let docs = vec![
            doc(SourceTier::Local, json!({"behavior": {"max_results": 12}})),
            doc(SourceTier::User, json!({"behavior": {"max_results": 5}})),
            doc(SourceTier::PlatformLocal, json!({"behavior": {"max_results": 15}})),
        ];
        let mut reversed = docs.clone();
        reversed.reverse();

        let a = ConfigMerger.merge(&defaults(), docs);
        let b = ConfigMerger.merge(&defaults(), reversed);
        assert_eq!(a, b);
        assert_eq!(a.behavior.max_results, 15);
    }

    #[test]
    fn test_explicit_zero_and_false_override() {
        let merged = ConfigMerger.merge(
            &defaults(),
            vec![doc(
                SourceTier::User,
                json!({
                    "appearance": {"transparency": 0.0, "enable_system_tray": false},
                    "sync": {"auto_sync_interval": 0}
                }),
            )],
        );
        assert_eq!(merged.appearance.transparency, 0.0);
        assert!(!merged.appearance.enable_system_tray);
        assert_eq!(merged.sync.auto_sync_interval, 0);
    }

    #[test]
    fn test_lists_replaced_not_concatenated() {
        let merged = ConfigMerger.merge(
            &defaults(),
            vec![
                doc(SourceTier::User, json!({"search": {"exclude_patterns": ["*.bak", "*.tmp"]}})),
                doc(SourceTier::Local, json!({"search": {"exclude_patterns": ["*.iso"]}})),
                doc(SourceTier::Local, json!({"plugins": {"enabled": []}})),
            ],
        );
        assert_eq!(merged.search.exclude_patterns, vec!["*.iso"]);
        assert!(merged.plugins.enabled.is_empty());
        // Not set by any document.
        assert_eq!(merged.plugins.disabled, vec!["weather"]);
    }

    #[test]
    fn test_maps_union_key_by_key() {
        let merged = ConfigMerger.merge(
            &defaults(),
            vec![
                doc(
                    SourceTier::User,
                    json!({
                        "search": {"include_paths": {"windows": ["D:\\Apps"]}},
                        "plugins": {"plugin_settings": {
                            "translator": {"target": "en", "cache": true},
                            "calculator": {"precision": 4}
                        }}
                    }),
                ),
                doc(
                    SourceTier::Local,
                    json!({
                        "search": {"include_paths": {"linux": ["/opt/apps"]}},
                        "plugins": {"plugin_settings": {"translator": {"target": "ja"}}}
                    }),
                ),
            ],
        );

        assert_eq!(merged.search.include_paths["windows"], vec!["D:\\Apps"]);
        assert_eq!(merged.search.include_paths["linux"], vec!["/opt/apps"]);

        let settings = &merged.plugins.plugin_settings;
        assert_eq!(settings["calculator"], json!({"precision": 4}));
        // Opaque payload replaced whole at the key.
        assert_eq!(settings["translator"], json!({"target": "ja"}));
    }

    #[test]
    fn test_null_map_entries_do_not_erase_lower_tiers() {
        let merged = ConfigMerger.merge(
            &defaults(),
            vec![
                doc(SourceTier::User, json!({"plugins": {"plugin_settings": {"weather": {"unit": "C"}}}})),
                doc(SourceTier::Local, json!({"plugins": {"plugin_settings": {"weather": null}}})),
                doc(SourceTier::Local, json!({"search": {"include_paths": {"linux": null}}})),
            ],
        );
        assert_eq!(merged.plugins.plugin_settings["weather"], json!({"unit": "C"}));
        assert_eq!(
            merged.search.include_paths["linux"],
            defaults().search.include_paths["linux"]
        );
    }

    #[test]
    fn test_provider_explicit_null_overrides_lower_tier() {
        let merged = ConfigMerger.merge(
            &defaults(),
            vec![
                doc(SourceTier::User, json!({"sync": {"enabled": true, "provider": "dropbox"}})),
                doc(SourceTier::Local, json!({"sync": {"provider": null}})),
            ],
        );
        assert!(merged.sync.enabled);
        assert_eq!(merged.sync.provider, None);

        let kept = ConfigMerger.merge(
            &defaults(),
            vec![
                doc(SourceTier::User, json!({"sync": {"provider": "dropbox"}})),
                doc(SourceTier::Local, json!({"sync": {}})),
            ],
        );
        assert_eq!(kept.sync.provider.as_deref(), Some("dropbox"));
    }

    #[test]
    fn test_specificity_breaks_ties_within_tier() {
        let linux = RankedDocument::new(
            Rank {
                tier: SourceTier::PlatformUser,
                specificity: 0,
            },
            PartialConfig::from_value(json!({"appearance": {"font_size": 11, "theme": "Dark"}}))
                .unwrap(),
        );
        let ubuntu = RankedDocument::new(
            Rank {
                tier: SourceTier::PlatformUser,
                specificity: 1,
            },
            PartialConfig::from_value(json!({"appearance": {"font_size": 13}})).unwrap(),
        );

        let merged = ConfigMerger.merge(&defaults(), vec![ubuntu, linux]);
        assert_eq!(merged.appearance.font_size, 13);
        assert_eq!(merged.appearance.theme, crate::config::Theme::Dark);
    }
}
