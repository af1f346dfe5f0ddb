//! Platform and build-mode identification.
//!
//! Both values are decided once at process start and passed explicitly into
//! source enumeration. Nothing in the resolution engine consults `cfg!` on its
//! own, so a release binary can still be exercised in debug mode (and vice
//! versa) by handing it a different [`BuildMode`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operating-system platform a configuration file may be tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformTag {
    Windows,
    MacOS,
    Linux,
    /// Refinement of Linux; both `linux` and `ubuntu` files are eligible.
    Ubuntu,
    /// Unknown OS; no platform-tagged files are eligible.
    Generic,
}

impl PlatformTag {
    /// Detect the platform of the running process.
    pub fn detect() -> Self {
        if cfg!(target_os = "windows") {
            PlatformTag::Windows
        } else if cfg!(target_os = "macos") {
            PlatformTag::MacOS
        } else if cfg!(target_os = "linux") {
            match std::fs::read_to_string("/etc/os-release") {
                Ok(content) if os_release_is_ubuntu(&content) => PlatformTag::Ubuntu,
                _ => PlatformTag::Linux,
            }
        } else {
            PlatformTag::Generic
        }
    }

    /// File-name token for this platform, or `None` for [`PlatformTag::Generic`].
    pub fn token(self) -> Option<&'static str> {
        match self {
            PlatformTag::Windows => Some("windows"),
            PlatformTag::MacOS => Some("macos"),
            PlatformTag::Linux => Some("linux"),
            PlatformTag::Ubuntu => Some("ubuntu"),
            PlatformTag::Generic => None,
        }
    }

    /// Platform tags whose files are eligible on this platform, least specific first.
    pub fn eligible_tags(self) -> &'static [PlatformTag] {
        match self {
            PlatformTag::Windows => &[PlatformTag::Windows],
            PlatformTag::MacOS => &[PlatformTag::MacOS],
            PlatformTag::Linux => &[PlatformTag::Linux],
            PlatformTag::Ubuntu => &[PlatformTag::Linux, PlatformTag::Ubuntu],
            PlatformTag::Generic => &[],
        }
    }

    /// Key used for this platform in `search.include_paths`.
    ///
    /// Ubuntu shares the `linux` entry.
    pub fn include_paths_key(self) -> Option<&'static str> {
        match self {
            PlatformTag::Ubuntu => Some("linux"),
            other => other.token(),
        }
    }
}

impl fmt::Display for PlatformTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token().unwrap_or("generic"))
    }
}

impl FromStr for PlatformTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "windows" => Ok(PlatformTag::Windows),
            "macos" => Ok(PlatformTag::MacOS),
            "linux" => Ok(PlatformTag::Linux),
            "ubuntu" => Ok(PlatformTag::Ubuntu),
            "generic" => Ok(PlatformTag::Generic),
            other => Err(format!(
                "unknown platform '{}', expected one of: windows, macos, linux, ubuntu, generic",
                other
            )),
        }
    }
}

fn os_release_is_ubuntu(content: &str) -> bool {
    content.lines().any(|line| {
        let Some((key, value)) = line.split_once('=') else {
            return false;
        };
        let value = value.trim().trim_matches('"').to_lowercase();
        match key.trim() {
            "ID" => value == "ubuntu",
            "ID_LIKE" => value.split_whitespace().any(|id| id == "ubuntu"),
            _ => false,
        }
    })
}

/// Build mode of the running binary. Debug unlocks the debug source tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Debug,
    Release,
}

impl BuildMode {
    /// Build mode this binary was compiled with.
    pub fn of_binary() -> Self {
        if cfg!(debug_assertions) {
            BuildMode::Debug
        } else {
            BuildMode::Release
        }
    }

    pub fn is_debug(self) -> bool {
        self == BuildMode::Debug
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildMode::Debug => write!(f, "debug"),
            BuildMode::Release => write!(f, "release"),
        }
    }
}

impl FromStr for BuildMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(BuildMode::Debug),
            "release" => Ok(BuildMode::Release),
            other => Err(format!(
                "unknown build mode '{}', expected debug or release",
                other
            )),
        }
    }
}
