//! Hierarchical launcher configuration.
//!
//! Resolves one [`EffectiveConfig`] from up to seven tiers with field-by-field merging:
//! 1. **Defaults** - built in
//! 2. **User** - `config.json`, `config.<platform>.json`
//! 3. **Local** - `config.local.json`, `config.<platform>.local.json`
//! 4. **Debug** - `config.debug.json`, `config.debug.<platform>.json` (debug builds only)
//!
//! ## Merge Strategy
//! - Scalars: highest tier that sets the field wins
//! - Lists: replaced wholesale
//! - Maps (`include_paths`, `plugin_settings`): unioned key by key
//!
//! ## Environment Variables
//! - `FALCOMMAND_CONFIG_DIR` - Base directory for `config*.json`
//! - `FALCOMMAND_BACKUP_DIR` - Backup ring directory (default: `<config dir>/backups`)

mod backup;
mod loader;
mod merge;
mod partial;
mod service;
mod sources;
mod types;
mod validate;

pub use backup::{
    BACKUP_GENERATIONS, BackupEntry, BackupManager, BackupStore, FileBackupStore,
    MemoryBackupStore, ResolveGuard,
};
pub use loader::{DocumentLoader, LoadWarning, LoadedDocument};
pub use merge::{ConfigMerger, RankedDocument};
pub use partial::{
    PartialAppearance, PartialBehavior, PartialConfig, PartialPlugins, PartialSearch, PartialSync,
};
pub use service::{ConfigHandle, ConfigService, Resolution};
pub use sources::{ConfigPaths, ConfigSource, Rank, Scope, SourceLocator, SourceTier, file_name};
pub use types::*;
pub use validate::{Constraint, MAX_BEHAVIOR_RESULTS, ValidationIssue, Validator};
