//! Settings storage for the `matchbar` namespace.
//!
//! On disk the settings are a TOML file with a single `[matchbar]` table:
//!
//! ```toml
//! [matchbar]
//! pattern = 'version = "(.*)"'
//! filePath = "Cargo.toml"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{MatchbarError, MatchbarResult};

/// Namespace every settings key lives under.
pub const NAMESPACE: &str = "matchbar";

/// Default settings file name, relative to the workspace root.
pub const SETTINGS_FILE: &str = ".matchbar.toml";

/// The two persisted values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Regex source, unvalidated until evaluation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Workspace-relative or absolute target path.
    #[serde(default, rename = "filePath", skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl Settings {
    /// Pattern, treating an empty string as absent.
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref().filter(|p| !p.is_empty())
    }

    /// Target path, treating an empty string as absent.
    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref().filter(|p| !p.is_empty())
    }
}

/// Settings file layout: everything under the namespace table.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsDocument {
    #[serde(default)]
    matchbar: Settings,
}

/// Host-provided settings storage.
pub trait SettingsStore: Send {
    /// Read the current settings.
    fn load(&self) -> MatchbarResult<Settings>;

    /// Persist the given settings, replacing what was stored.
    fn save(&mut self, settings: &Settings) -> MatchbarResult<()>;

    /// File backing the store, if any. Saving it counts as a settings change.
    fn location(&self) -> Option<&Path> {
        None
    }
}

/// Settings kept in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: Settings,
}

impl MemoryStore {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> MatchbarResult<Settings> {
        Ok(self.settings.clone())
    }

    fn save(&mut self, settings: &Settings) -> MatchbarResult<()> {
        self.settings = settings.clone();
        Ok(())
    }
}

/// Settings persisted as TOML on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location inside a workspace.
    pub fn in_workspace(root: &Path) -> Self {
        Self::new(root.join(SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileStore {
    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }

    fn load(&self) -> MatchbarResult<Settings> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| MatchbarError::config(&self.path, e.to_string()))?;
        let doc: SettingsDocument = toml::from_str(&content)
            .map_err(|e| MatchbarError::config(&self.path, e.message().to_string()))?;
        Ok(doc.matchbar)
    }

    /// Uses the temp file + rename pattern so a reader never sees a
    /// half-written file.
    fn save(&mut self, settings: &Settings) -> MatchbarResult<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if !dir.exists() {
                fs::create_dir_all(dir)
                    .map_err(|e| MatchbarError::config(&self.path, e.to_string()))?;
            }
        }

        let doc = SettingsDocument {
            matchbar: settings.clone(),
        };
        let text = toml::to_string_pretty(&doc)
            .map_err(|e| MatchbarError::config(&self.path, e.to_string()))?;

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| SETTINGS_FILE.to_string());
        let temp_path = self.path.with_file_name(format!(
            "{}.{}.{}.tmp",
            file_name,
            std::process::id(),
            nanos
        ));

        fs::write(&temp_path, text)
            .map_err(|e| MatchbarError::config(&temp_path, e.to_string()))?;

        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            MatchbarError::config(&self.path, e.to_string())
        })?;

        tracing::debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    static TEST_COUNTER: AtomicU64 = AtomicU64::new(0);

    fn create_temp_dir(name: &str) -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let temp_dir = std::env::temp_dir()
            .join("matchbar_config_test")
            .join(format!("{}_{}_{}", name, std::process::id(), id));
        if temp_dir.exists() {
            fs::remove_dir_all(&temp_dir).ok();
        }
        fs::create_dir_all(&temp_dir).unwrap();
        temp_dir
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = create_temp_dir("missing");
        let store = FileStore::in_workspace(&dir);
        assert_eq!(store.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = create_temp_dir("save_load");
        let mut store = FileStore::in_workspace(&dir);
        let settings = Settings {
            pattern: Some(r"value=(\d+)".to_string()),
            file_path: Some("config/.env".to_string()),
        };
        store.save(&settings).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("[matchbar]"));
        assert!(text.contains("filePath"));
        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let dir = create_temp_dir("no_temp");
        let mut store = FileStore::in_workspace(&dir);
        store.save(&Settings::default()).unwrap();

        let leftovers: Vec<_> = fs::read_dir(&dir)
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_load_hand_written_file() {
        let dir = create_temp_dir("hand_written");
        fs::write(
            dir.join(SETTINGS_FILE),
            "[matchbar]\npattern = '^name = \"(.*)\"'\n",
        )
        .unwrap();

        let settings = FileStore::in_workspace(&dir).load().unwrap();
        assert_eq!(settings.pattern(), Some("^name = \"(.*)\""));
        assert_eq!(settings.file_path(), None);
    }

    #[test]
    fn test_load_corrupted_file() {
        let dir = create_temp_dir("corrupted");
        fs::write(dir.join(SETTINGS_FILE), "[matchbar\npattern = ").unwrap();

        let err = FileStore::in_workspace(&dir).load().unwrap_err();
        assert!(matches!(err, MatchbarError::Config { .. }));
    }

    #[test]
    fn test_empty_strings_are_absent() {
        let settings = Settings {
            pattern: Some(String::new()),
            file_path: Some(String::new()),
        };
        assert_eq!(settings.pattern(), None);
        assert_eq!(settings.file_path(), None);
    }

    #[test]
    fn test_store_locations() {
        let dir = create_temp_dir("location");
        let store = FileStore::in_workspace(&dir);
        assert_eq!(store.location(), Some(dir.join(SETTINGS_FILE).as_path()));
        assert_eq!(MemoryStore::default().location(), None);
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::default();
        let settings = Settings {
            pattern: Some("x".into()),
            file_path: None,
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);
    }
}
