//! Source discovery across configuration tiers.
//!
//! Tiers, lowest to highest priority:
//! 1. **Defaults** - built in, never a file
//! 2. **User** - `config.json`
//! 3. **Platform user** - `config.<platform>.json`
//! 4. **Local** - `config.local.json`
//! 5. **Platform local** - `config.<platform>.local.json`
//! 6. **Debug** - `config.debug.json` (debug builds only)
//! 7. **Platform debug** - `config.debug.<platform>.json` (debug builds only)
//!
//! Inside a platform tier on Ubuntu the `linux` file ranks directly below the
//! `ubuntu` file, so both contribute and Ubuntu wins per field.

use crate::platform::{BuildMode, PlatformTag};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Configuration level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Synchronized across machines.
    User,
    /// Machine specific, never synchronized.
    Local,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::User => write!(f, "user"),
            Scope::Local => write!(f, "local"),
        }
    }
}

impl std::str::FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Scope::User),
            "local" => Ok(Scope::Local),
            other => Err(format!("unknown scope '{}', expected user or local", other)),
        }
    }
}

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTier {
    Defaults = 0,
    User = 1,
    PlatformUser = 2,
    Local = 3,
    PlatformLocal = 4,
    Debug = 5,
    PlatformDebug = 6,
}

impl SourceTier {
    /// Tier for a (scope, platform-tagged, debug) combination.
    ///
    /// Debug tiers are not split by scope.
    pub fn of(scope: Scope, platform_tagged: bool, debug: bool) -> Self {
        match (debug, scope, platform_tagged) {
            (true, _, false) => SourceTier::Debug,
            (true, _, true) => SourceTier::PlatformDebug,
            (false, Scope::User, false) => SourceTier::User,
            (false, Scope::User, true) => SourceTier::PlatformUser,
            (false, Scope::Local, false) => SourceTier::Local,
            (false, Scope::Local, true) => SourceTier::PlatformLocal,
        }
    }

    pub fn is_debug(self) -> bool {
        matches!(self, SourceTier::Debug | SourceTier::PlatformDebug)
    }
}

impl fmt::Display for SourceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceTier::Defaults => write!(f, "defaults"),
            SourceTier::User => write!(f, "user"),
            SourceTier::PlatformUser => write!(f, "platform user"),
            SourceTier::Local => write!(f, "local"),
            SourceTier::PlatformLocal => write!(f, "platform local"),
            SourceTier::Debug => write!(f, "debug"),
            SourceTier::PlatformDebug => write!(f, "platform debug"),
        }
    }
}

/// Total order over sources: tier first, then platform specificity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Rank {
    pub tier: SourceTier,
    /// 0 for untagged and generic-platform files, 1 for `ubuntu` under `linux`.
    pub specificity: u8,
}

impl Rank {
    pub const DEFAULTS: Rank = Rank {
        tier: SourceTier::Defaults,
        specificity: 0,
    };
}

/// One candidate configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSource {
    pub scope: Scope,
    pub platform: Option<PlatformTag>,
    /// Only enumerated in debug builds.
    pub debug: bool,
    pub rank: Rank,
    pub path: PathBuf,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} source", self.rank.tier)?;
        if let Some(platform) = self.platform {
            write!(f, " [{}]", platform)?;
        }
        write!(f, " ({})", self.path.display())
    }
}

/// File name for a (scope, platform, debug) combination.
pub fn file_name(scope: Scope, platform: Option<PlatformTag>, debug: bool) -> String {
    let token = platform.and_then(PlatformTag::token);
    match (debug, scope, token) {
        (true, _, None) => "config.debug.json".to_string(),
        (true, _, Some(p)) => format!("config.debug.{}.json", p),
        (false, Scope::User, None) => "config.json".to_string(),
        (false, Scope::User, Some(p)) => format!("config.{}.json", p),
        (false, Scope::Local, None) => "config.local.json".to_string(),
        (false, Scope::Local, Some(p)) => format!("config.{}.local.json", p),
    }
}

/// Enumerates the present configuration files under one base directory.
#[derive(Debug, Clone)]
pub struct SourceLocator {
    base_dir: PathBuf,
    platform: PlatformTag,
    build_mode: BuildMode,
}

impl SourceLocator {
    pub fn new(base_dir: impl Into<PathBuf>, platform: PlatformTag, build_mode: BuildMode) -> Self {
        Self {
            base_dir: base_dir.into(),
            platform,
            build_mode,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn platform(&self) -> PlatformTag {
        self.platform
    }

    pub fn build_mode(&self) -> BuildMode {
        self.build_mode
    }

    /// Path of the file for a (scope, platform, debug) combination.
    pub fn path_for(&self, scope: Scope, platform: Option<PlatformTag>, debug: bool) -> PathBuf {
        self.base_dir.join(file_name(scope, platform, debug))
    }

    /// Every candidate source in ascending rank, present or not.
    ///
    /// Debug tiers are only produced for [`BuildMode::Debug`].
    pub fn candidates(&self) -> Vec<ConfigSource> {
        let mut layout = vec![
            (Scope::User, false, false),
            (Scope::User, true, false),
            (Scope::Local, false, false),
            (Scope::Local, true, false),
        ];
        if self.build_mode.is_debug() {
            layout.push((Scope::User, false, true));
            layout.push((Scope::User, true, true));
        }

        let mut candidates = Vec::new();
        for (scope, platform_tagged, debug) in layout {
            let tier = SourceTier::of(scope, platform_tagged, debug);
            if platform_tagged {
                for (specificity, &tag) in self.platform.eligible_tags().iter().enumerate() {
                    candidates.push(ConfigSource {
                        scope,
                        platform: Some(tag),
                        debug,
                        rank: Rank {
                            tier,
                            specificity: specificity as u8,
                        },
                        path: self.path_for(scope, Some(tag), debug),
                    });
                }
            } else {
                candidates.push(ConfigSource {
                    scope,
                    platform: None,
                    debug,
                    rank: Rank {
                        tier,
                        specificity: 0,
                    },
                    path: self.path_for(scope, None, debug),
                });
            }
        }
        candidates
    }

    /// Present sources in ascending rank. Missing files are skipped silently.
    ///
    /// A candidate whose presence cannot be determined (e.g. the base directory
    /// is not searchable) is kept, so loading it reports the I/O error.
    pub fn enumerate(&self) -> Vec<ConfigSource> {
        self.candidates()
            .into_iter()
            .filter(|source| match source.path.try_exists() {
                Ok(present) => {
                    debug!(
                        path = %source.path.display(),
                        tier = %source.rank.tier,
                        present,
                        "config source candidate"
                    );
                    present
                }
                Err(e) => {
                    warn!(
                        path = %source.path.display(),
                        error = %e,
                        "cannot check config source"
                    );
                    true
                }
            })
            .collect()
    }
}

/// Base directories for live configuration and backups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    /// Directory holding the `config*.json` files.
    pub config_dir: PathBuf,
    /// Dedicated backup store directory.
    pub backup_dir: PathBuf,
}

impl ConfigPaths {
    /// Discover directories from environment and build mode.
    ///
    /// - `FALCOMMAND_CONFIG_DIR` overrides the config directory. Otherwise debug
    ///   builds use `$CWD/.falcommand` and release builds the platform config dir.
    /// - `FALCOMMAND_BACKUP_DIR` overrides the backup directory (default
    ///   `<config_dir>/backups`).
    pub fn discover(build_mode: BuildMode) -> Self {
        let config_dir = std::env::var("FALCOMMAND_CONFIG_DIR")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::default_config_dir(build_mode));

        let backup_dir = std::env::var("FALCOMMAND_BACKUP_DIR")
            .ok()
            .map(PathBuf::from)
            .unwrap_or_else(|| config_dir.join("backups"));

        Self {
            config_dir,
            backup_dir,
        }
    }

    /// Paths rooted at an explicit config directory.
    pub fn with_config_dir(config_dir: impl Into<PathBuf>) -> Self {
        let config_dir = config_dir.into();
        Self {
            backup_dir: config_dir.join("backups"),
            config_dir,
        }
    }

    fn default_config_dir(build_mode: BuildMode) -> PathBuf {
        match build_mode {
            BuildMode::Debug => std::env::current_dir()
                .map(|cwd| cwd.join(".falcommand"))
                .unwrap_or_else(|_| PathBuf::from(".falcommand")),
            BuildMode::Release => dirs::config_dir()
                .map(|dir| dir.join("falcommand"))
                .or_else(|| dirs::home_dir().map(|home| home.join(".falcommand")))
                .unwrap_or_else(|| PathBuf::from(".falcommand")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn names(sources: &[ConfigSource]) -> Vec<String> {
        sources
            .iter()
            .map(|s| s.path.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_file_name_grammar() {
        let linux = Some(PlatformTag::Linux);
        assert_eq!(file_name(Scope::User, None, false), "config.json");
        assert_eq!(file_name(Scope::User, linux, false), "config.linux.json");
        assert_eq!(file_name(Scope::Local, None, false), "config.local.json");
        assert_eq!(file_name(Scope::Local, linux, false), "config.linux.local.json");
        assert_eq!(file_name(Scope::User, None, true), "config.debug.json");
        assert_eq!(file_name(Scope::User, linux, true), "config.debug.linux.json");
        assert_eq!(
            file_name(Scope::User, Some(PlatformTag::Generic), false),
            "config.json"
        );
    }

    #[test]
    fn test_release_candidates_exclude_debug_tiers() {
        let locator = SourceLocator::new("/cfg", PlatformTag::Windows, BuildMode::Release);
        assert_eq!(
            names(&locator.candidates()),
            vec![
                "config.json",
                "config.windows.json",
                "config.local.json",
                "config.windows.local.json",
            ]
        );
    }

    #[test]
    fn test_debug_candidates_append_debug_tiers() {
        let locator = SourceLocator::new("/cfg", PlatformTag::MacOS, BuildMode::Debug);
        let candidates = locator.candidates();
        assert_eq!(
            names(&candidates)[4..],
            ["config.debug.json", "config.debug.macos.json"]
        );
        assert!(candidates[4..].iter().all(|s| s.debug));
    }

    #[test]
    fn test_ubuntu_candidates_rank_linux_below_ubuntu() {
        let locator = SourceLocator::new("/cfg", PlatformTag::Ubuntu, BuildMode::Release);
        let candidates = locator.candidates();
        assert_eq!(
            names(&candidates),
            vec![
                "config.json",
                "config.linux.json",
                "config.ubuntu.json",
                "config.local.json",
                "config.linux.local.json",
                "config.ubuntu.local.json",
            ]
        );
        assert!(candidates[1].rank < candidates[2].rank);
        assert_eq!(candidates[1].rank.tier, candidates[2].rank.tier);
    }

    #[test]
    fn test_candidate_ranks_strictly_increase() {
        let locator = SourceLocator::new("/cfg", PlatformTag::Ubuntu, BuildMode::Debug);
        let candidates = locator.candidates();
        assert!(candidates.windows(2).all(|w| w[0].rank < w[1].rank));
        assert!(candidates.iter().all(|c| c.rank > Rank::DEFAULTS));
    }

    #[test]
    fn test_generic_platform_has_no_tagged_sources() {
        let locator = SourceLocator::new("/cfg", PlatformTag::Generic, BuildMode::Debug);
        assert_eq!(
            names(&locator.candidates()),
            vec!["config.json", "config.local.json", "config.debug.json"]
        );
    }

    #[test]
    fn test_enumerate_skips_missing_files() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("config.json"), "{}").unwrap();
        std::fs::write(temp.path().join("config.linux.local.json"), "{}").unwrap();
        std::fs::write(temp.path().join("config.debug.json"), "{}").unwrap();

        let release = SourceLocator::new(temp.path(), PlatformTag::Linux, BuildMode::Release);
        assert_eq!(
            names(&release.enumerate()),
            vec!["config.json", "config.linux.local.json"]
        );

        let debug = SourceLocator::new(temp.path(), PlatformTag::Linux, BuildMode::Debug);
        assert_eq!(
            names(&debug.enumerate()),
            vec!["config.json", "config.linux.local.json", "config.debug.json"]
        );
    }

    #[test]
    fn test_enumerate_keeps_unverifiable_candidates() {
        let temp = TempDir::new().unwrap();
        let not_a_dir = temp.path().join("cfg");
        std::fs::write(&not_a_dir, "").unwrap();

        let locator = SourceLocator::new(&not_a_dir, PlatformTag::Linux, BuildMode::Release);
        assert_eq!(locator.enumerate(), locator.candidates());
    }

    #[test]
    fn test_with_config_dir_places_backups_in_subdir() {
        let paths = ConfigPaths::with_config_dir("/home/me/.falcommand");
        assert_eq!(paths.backup_dir, PathBuf::from("/home/me/.falcommand/backups"));
    }
}
