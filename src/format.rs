//! Output formatting for JSON, YAML and plain-text listings.

use crate::config::{BackupEntry, ConfigSource, ValidationIssue};
use serde::Serialize;
use std::fmt::Write;

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    /// Tables for listings; structured values fall back to YAML.
    Text,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "yaml" | "yml" => Some(OutputFormat::Yaml),
            "text" | "txt" => Some(OutputFormat::Text),
            _ => None,
        }
    }

    /// Render any serializable value.
    pub fn render<T: Serialize>(self, value: &T) -> anyhow::Result<String> {
        Ok(match self {
            OutputFormat::Json => serde_json::to_string_pretty(value)?,
            OutputFormat::Yaml | OutputFormat::Text => serde_yaml::to_string(value)?,
        })
    }
}

/// One line per validation issue.
pub fn format_issues(issues: &[ValidationIssue]) -> String {
    let mut out = String::new();
    for issue in issues {
        let _ = writeln!(out, "- {}", issue);
    }
    out
}

/// Sources table, ascending rank.
pub fn format_sources(sources: &[ConfigSource]) -> String {
    if sources.is_empty() {
        return "(no configuration files present; using built-in defaults)\n".to_string();
    }
    let mut out = String::new();
    for source in sources {
        let _ = writeln!(
            out,
            "{:<15} {:<8} {}",
            source.rank.tier.to_string(),
            source.platform.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string()),
            source.path.display()
        );
    }
    out
}

/// Backup listing, oldest first.
pub fn format_backups(entries: &[BackupEntry]) -> String {
    if entries.is_empty() {
        return "(no backups)\n".to_string();
    }
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(
            out,
            "#{:<4} slot {}  {}",
            entry.sequence,
            entry.slot(),
            entry.created_at.to_rfc3339()
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EffectiveConfig;
    use crate::platform::PlatformTag;

    #[test]
    fn test_from_str() {
        assert_eq!(OutputFormat::from_str("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_str("yml"), Some(OutputFormat::Yaml));
        assert_eq!(OutputFormat::from_str("text"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::from_str("toml"), None);
    }

    #[test]
    fn test_render_yaml_contains_sections() {
        let config = EffectiveConfig::defaults_for(PlatformTag::Linux);
        let yaml = OutputFormat::Yaml.render(&config).unwrap();
        assert!(yaml.contains("appearance:"));
        assert!(yaml.contains("hotkey: Ctrl+Space"));
    }

    #[test]
    fn test_empty_listings() {
        assert!(format_sources(&[]).contains("built-in defaults"));
        assert_eq!(format_backups(&[]), "(no backups)\n");
        assert_eq!(format_issues(&[]), "");
    }
}
