//! Resolution entry point.
//!
//! [`ConfigService::resolve`] runs locate → load → merge → validate inside a
//! backup scope and installs the result into a shared [`ConfigHandle`].
//! Snapshots are immutable; a reload replaces the `Arc`, it never mutates one
//! that readers may still hold.

use super::backup::{BackupEntry, BackupManager};
use super::loader::{DocumentLoader, LoadWarning};
use super::merge::{ConfigMerger, RankedDocument};
use super::partial::PartialConfig;
use super::sources::{ConfigPaths, ConfigSource, Scope, SourceLocator};
use super::types::EffectiveConfig;
use super::validate::{ValidationIssue, Validator};
use crate::error::{BackupError, IoError, ResolutionError};
use crate::platform::{BuildMode, PlatformTag};
use arc_swap::ArcSwapOption;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Read-mostly handle to the live configuration, shared with collaborators.
#[derive(Debug, Clone, Default)]
pub struct ConfigHandle {
    inner: Arc<ArcSwapOption<EffectiveConfig>>,
}

impl ConfigHandle {
    /// Current snapshot, or `None` before the first successful resolve.
    pub fn load(&self) -> Option<Arc<EffectiveConfig>> {
        self.inner.load_full()
    }

    fn store(&self, config: Arc<EffectiveConfig>) {
        self.inner.store(Some(config));
    }
}

/// Outcome of a successful resolve.
#[derive(Debug)]
pub struct Resolution {
    pub config: Arc<EffectiveConfig>,
    /// Advisory; the configuration is returned regardless.
    pub issues: Vec<ValidationIssue>,
    /// Unknown keys ignored while loading.
    pub warnings: Vec<LoadWarning>,
    /// Sources that contributed, ascending rank.
    pub sources: Vec<ConfigSource>,
    /// Backup written for this resolve, or why it could not be.
    pub backup: Result<BackupEntry, BackupError>,
}

impl Resolution {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Owns one configuration directory and its backup ring.
#[derive(Debug)]
pub struct ConfigService {
    locator: SourceLocator,
    loader: DocumentLoader,
    merger: ConfigMerger,
    validator: Validator,
    backups: BackupManager,
    handle: ConfigHandle,
}

impl ConfigService {
    pub fn new(locator: SourceLocator, backups: BackupManager) -> Self {
        Self {
            locator,
            loader: DocumentLoader,
            merger: ConfigMerger,
            validator: Validator,
            backups,
            handle: ConfigHandle::default(),
        }
    }

    /// Service over `paths` with a file-backed backup ring.
    pub fn with_paths(paths: &ConfigPaths, platform: PlatformTag, build_mode: BuildMode) -> Self {
        Self::new(
            SourceLocator::new(&paths.config_dir, platform, build_mode),
            BackupManager::open(&paths.backup_dir),
        )
    }

    pub fn locator(&self) -> &SourceLocator {
        &self.locator
    }

    pub fn backups(&self) -> &BackupManager {
        &self.backups
    }

    /// Handle collaborators keep to observe reloads.
    pub fn handle(&self) -> ConfigHandle {
        self.handle.clone()
    }

    /// Last installed snapshot.
    pub fn current(&self) -> Option<Arc<EffectiveConfig>> {
        self.handle.load()
    }

    /// Install a caller-chosen snapshot (e.g. a restored backup) without touching disk.
    pub fn adopt(&self, config: EffectiveConfig) -> Arc<EffectiveConfig> {
        let config = Arc::new(config);
        self.handle.store(Arc::clone(&config));
        config
    }

    /// Resolve the effective configuration from all present sources.
    ///
    /// Fails with the lowest-ranked source that could not be read or parsed; in
    /// that case the backup ring and the installed snapshot are left untouched.
    pub fn resolve(&self) -> Result<Resolution, ResolutionError> {
        let guard = self.backups.begin_resolve();

        let sources = self.locator.enumerate();
        let mut documents = Vec::with_capacity(sources.len());
        let mut warnings = Vec::new();
        for source in &sources {
            match self.loader.load(&source.path) {
                Ok(loaded) => {
                    warnings.extend(loaded.warnings);
                    documents.push(RankedDocument::new(source.rank, loaded.document));
                }
                Err(cause) => {
                    guard.abort();
                    warn!(source = %source, error = %cause, "config resolution failed");
                    return Err(ResolutionError {
                        origin: source.clone(),
                        cause,
                    });
                }
            }
        }

        let defaults = EffectiveConfig::defaults_for(self.locator.platform());
        let config = self.merger.merge(&defaults, documents);
        let issues = self.validator.validate(&config);
        for issue in &issues {
            warn!(path = %issue.path, "{}", issue);
        }

        let backup = guard.commit(&config);
        if let Err(e) = &backup {
            warn!(error = %e, "failed to record config backup");
        }

        let config = Arc::new(config);
        self.handle.store(Arc::clone(&config));
        info!(
            sources = sources.len(),
            issues = issues.len(),
            platform = %self.locator.platform(),
            build_mode = %self.locator.build_mode(),
            "resolved configuration"
        );

        Ok(Resolution {
            config,
            issues,
            warnings,
            sources,
            backup,
        })
    }

    /// Write `document` to the file for `scope`/`platform`, creating parent
    /// directories. No other file is touched.
    pub fn persist(
        &self,
        scope: Scope,
        platform: Option<PlatformTag>,
        document: &PartialConfig,
    ) -> Result<PathBuf, IoError> {
        let path = self.locator.path_for(scope, platform, false);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| IoError::new(parent, e))?;
        }

        std::fs::write(&path, render(&path, document)?).map_err(|e| IoError::new(&path, e))?;

        info!(path = %path.display(), scope = %scope, "persisted config document");
        Ok(path)
    }

    /// Write the built-in defaults to the user `config.json` if it does not
    /// exist yet. Returns the path when a file was created; an existing file is
    /// never modified.
    pub fn init_defaults(&self) -> Result<Option<PathBuf>, IoError> {
        let path = self.locator.path_for(Scope::User, None, false);
        if path.try_exists().map_err(|e| IoError::new(&path, e))? {
            debug!(path = %path.display(), "user config already present");
            return Ok(None);
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| IoError::new(parent, e))?;
        }

        let defaults = PartialConfig::from(EffectiveConfig::defaults_for(self.locator.platform()));
        let content = render(&path, &defaults)?;
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(None),
            Err(e) => return Err(IoError::new(&path, e)),
        };
        file.write_all(content.as_bytes())
            .map_err(|e| IoError::new(&path, e))?;

        info!(path = %path.display(), "created default user config");
        Ok(Some(path))
    }

    /// Configuration recorded under backup `sequence`.
    pub fn restore(&self, sequence: u64) -> Result<EffectiveConfig, BackupError> {
        self.backups.restore(sequence)
    }
}

fn render(path: &Path, document: &PartialConfig) -> Result<String, IoError> {
    serde_json::to_string_pretty(document).map_err(|e| IoError::new(path, std::io::Error::other(e)))
}
