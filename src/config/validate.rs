//! Advisory validation of an [`EffectiveConfig`].
//!
//! Validation never aborts and never corrects: every violated constraint is
//! reported as a [`ValidationIssue`] and the configuration keeps the value.

use super::types::{EffectiveConfig, ShowWindow, Theme, WindowPosition};
use regex_lite::Regex;
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;
use std::sync::LazyLock;

/// Upper bound on `behavior.max_results`.
pub const MAX_BEHAVIOR_RESULTS: i64 = 100;

const MODIFIERS: &[&str] = &[
    "ctrl", "control", "alt", "shift", "cmd", "command", "super", "win", "meta", "option",
];

/// `Modifier+...+Key`, at least one modifier.
static HOTKEY_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^(?:(?:{})\+)+[^+\s]+$", MODIFIERS.join("|"))).ok()
});

/// The final segment must be a key, not another modifier.
fn is_hotkey(combo: &str) -> bool {
    let combo = combo.trim();
    let key_is_modifier = combo
        .rsplit('+')
        .next()
        .is_some_and(|key| MODIFIERS.contains(&key.to_lowercase().as_str()));
    !key_is_modifier
        && HOTKEY_PATTERN
            .as_ref()
            .is_some_and(|re| re.is_match(combo))
}

/// The rule a value broke.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Constraint {
    /// Inclusive numeric range.
    Range { min: f64, max: f64 },
    /// Integer greater than zero.
    Positive,
    /// Integer greater than or equal to zero.
    NonNegative,
    /// One of a fixed set of names.
    OneOf { allowed: Vec<String> },
    /// Non-empty `Modifier+Key` combination.
    Hotkey,
    /// Value must not appear in another list at the same time.
    Disjoint { other: String },
    /// Field is required by another field's value.
    RequiredBy { field: String },
}

impl Constraint {
    fn one_of(names: &[&str]) -> Self {
        Constraint::OneOf {
            allowed: names.iter().map(|n| n.to_string()).collect(),
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Range { min, max } => write!(f, "must be between {} and {}", min, max),
            Constraint::Positive => write!(f, "must be a positive integer"),
            Constraint::NonNegative => write!(f, "must be zero or greater"),
            Constraint::OneOf { allowed } => write!(f, "must be one of: {}", allowed.join(", ")),
            Constraint::Hotkey => write!(f, "must be a modifier+key combination like Ctrl+Space"),
            Constraint::Disjoint { other } => write!(f, "must not also appear in {}", other),
            Constraint::RequiredBy { field } => write!(f, "is required when {} is set", field),
        }
    }
}

/// One violated constraint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    /// Dotted field path, e.g. `appearance.transparency`.
    pub path: String,
    pub constraint: Constraint,
    pub value: Value,
}

impl ValidationIssue {
    fn new(path: &str, constraint: Constraint, value: Value) -> Self {
        Self {
            path: path.to_string(),
            constraint,
            value,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} (got {})", self.path, self.constraint, self.value)
    }
}

/// Checks merged configurations against domain constraints.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    pub fn validate(&self, config: &EffectiveConfig) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let appearance = &config.appearance;

        if let Theme::Unrecognized(name) = &appearance.theme {
            issues.push(ValidationIssue::new(
                "appearance.theme",
                Constraint::one_of(Theme::NAMES),
                json!(name),
            ));
        }
        check_unit_range(
            &mut issues,
            "appearance.transparency",
            f64::from(appearance.transparency),
        );
        if let WindowPosition::Unrecognized(name) = &appearance.position {
            issues.push(ValidationIssue::new(
                "appearance.position",
                Constraint::one_of(WindowPosition::NAMES),
                json!(name),
            ));
        }
        if let ShowWindow::Unrecognized(name) = &appearance.show_window {
            issues.push(ValidationIssue::new(
                "appearance.show_window",
                Constraint::one_of(ShowWindow::NAMES),
                json!(name),
            ));
        }
        check_positive(&mut issues, "appearance.font_size", appearance.font_size);
        check_positive(&mut issues, "appearance.max_results", appearance.max_results);

        let behavior = &config.behavior;
        if !is_hotkey(&behavior.hotkey) {
            issues.push(ValidationIssue::new(
                "behavior.hotkey",
                Constraint::Hotkey,
                json!(behavior.hotkey),
            ));
        }
        if behavior.max_results <= 0 {
            check_positive(&mut issues, "behavior.max_results", behavior.max_results);
        } else if behavior.max_results > MAX_BEHAVIOR_RESULTS {
            issues.push(ValidationIssue::new(
                "behavior.max_results",
                Constraint::Range {
                    min: 1.0,
                    max: MAX_BEHAVIOR_RESULTS as f64,
                },
                json!(behavior.max_results),
            ));
        }

        check_unit_range(
            &mut issues,
            "search.fuzzy_threshold",
            config.search.fuzzy_threshold,
        );

        for plugin in &config.plugins.enabled {
            if config.plugins.disabled.contains(plugin) {
                issues.push(ValidationIssue::new(
                    "plugins.enabled",
                    Constraint::Disjoint {
                        other: "plugins.disabled".to_string(),
                    },
                    json!(plugin),
                ));
            }
        }

        let sync = &config.sync;
        if sync.auto_sync_interval < 0 {
            issues.push(ValidationIssue::new(
                "sync.auto_sync_interval",
                Constraint::NonNegative,
                json!(sync.auto_sync_interval),
            ));
        }
        if sync.enabled && sync.provider.as_deref().is_none_or(|p| p.trim().is_empty()) {
            issues.push(ValidationIssue::new(
                "sync.provider",
                Constraint::RequiredBy {
                    field: "sync.enabled".to_string(),
                },
                json!(sync.provider),
            ));
        }

        issues
    }
}

fn check_unit_range(issues: &mut Vec<ValidationIssue>, path: &str, value: f64) {
    // NaN fails both comparisons, so test containment rather than exclusion.
    if !(0.0..=1.0).contains(&value) {
        issues.push(ValidationIssue::new(
            path,
            Constraint::Range { min: 0.0, max: 1.0 },
            json!(value),
        ));
    }
}

fn check_positive(issues: &mut Vec<ValidationIssue>, path: &str, value: i64) {
    if value <= 0 {
        issues.push(ValidationIssue::new(path, Constraint::Positive, json!(value)));
    }
}
