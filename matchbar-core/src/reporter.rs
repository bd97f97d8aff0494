//! The Match Reporter: one explicit context object owning the settings
//! store, the file source, the editor context and the status item.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::{Settings, SettingsStore};
use crate::error::{MatchbarError, MatchbarResult};
use crate::evaluate::{effective_target, evaluate};
use crate::status::{StatusItem, StatusLabel};
use crate::workspace::{normalize, storage_form, FileSource};

/// How the user chose a target file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSelection {
    /// Picked from the workspace file listing (workspace-relative or absolute).
    Picked(String),
    /// Typed by the user, relative to the workspace root unless absolute.
    Typed(String),
}

impl TargetSelection {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Picked(p) | Self::Typed(p) => p,
        }
    }
}

pub struct MatchReporter {
    store: Box<dyn SettingsStore>,
    files: Box<dyn FileSource>,
    workspace_root: Option<PathBuf>,
    active_document: Option<PathBuf>,
    status: StatusItem,
    evaluations: u64,
}

impl MatchReporter {
    pub fn new(
        store: Box<dyn SettingsStore>,
        files: Box<dyn FileSource>,
        workspace_root: Option<PathBuf>,
    ) -> Self {
        Self {
            store,
            files,
            workspace_root: workspace_root.map(|r| normalize(&r)),
            active_document: None,
            status: StatusItem::new(),
            evaluations: 0,
        }
    }

    pub fn workspace_root(&self) -> Option<&Path> {
        self.workspace_root.as_deref()
    }

    pub fn active_document(&self) -> Option<&Path> {
        self.active_document.as_deref()
    }

    /// Record which document has focus. Does not re-evaluate.
    pub fn set_active_document(&mut self, path: Option<PathBuf>) {
        self.active_document = path.map(|p| normalize(&p));
    }

    pub fn settings(&self) -> MatchbarResult<Settings> {
        self.store.load()
    }

    /// Mutable access to the settings store, for hosts that push settings in.
    pub fn store_mut(&mut self) -> &mut dyn SettingsStore {
        self.store.as_mut()
    }

    pub fn status(&self) -> &StatusItem {
        &self.status
    }

    /// How many times [`Self::evaluate`] has run.
    pub fn evaluation_count(&self) -> u64 {
        self.evaluations
    }

    /// Recompute the label from scratch and show it.
    pub fn evaluate(&mut self) -> StatusLabel {
        self.evaluations += 1;

        let result = self.store.load().and_then(|settings| {
            evaluate(
                &settings,
                self.workspace_root.as_deref(),
                self.active_document.as_deref(),
                self.files.as_ref(),
            )
        });

        if let Err(err) = &result {
            debug!(error = %err, "evaluation ended without a match");
        }

        let label = StatusLabel::from_evaluation(&result);
        debug!(label = %label.text, state = ?label.state, "status updated");
        self.status.set(label.clone());
        self.status.show();
        label
    }

    /// Persist a new pattern and re-evaluate.
    ///
    /// `None` or an empty string is treated as a cancelled prompt and changes
    /// nothing. The pattern is not validated here.
    pub fn set_pattern(&mut self, pattern: Option<&str>) -> MatchbarResult<bool> {
        let Some(pattern) = pattern.filter(|p| !p.is_empty()) else {
            return Ok(false);
        };

        let mut settings = self.store.load()?;
        settings.pattern = Some(pattern.to_string());
        self.store.save(&settings)?;
        info!(pattern = %pattern, "pattern updated");

        self.evaluate();
        Ok(true)
    }

    /// Validate, persist and re-evaluate a new target file.
    ///
    /// Returns the stored form of the path. Nothing is persisted on error.
    pub fn set_target_file(&mut self, selection: &TargetSelection) -> MatchbarResult<String> {
        let raw = selection.as_str().trim();
        if raw.is_empty() {
            return Err(MatchbarError::invalid_argument("empty file path"));
        }

        let path = Path::new(raw);
        let absolute = if path.is_absolute() {
            normalize(path)
        } else {
            let root = self
                .workspace_root
                .as_deref()
                .ok_or(MatchbarError::NoWorkspace)?;
            normalize(&root.join(path))
        };

        if !self.files.exists(&absolute) {
            warn!(path = %absolute.display(), "target file does not exist");
            return Err(MatchbarError::file_not_found(&absolute, raw));
        }

        let stored = storage_form(self.workspace_root.as_deref(), &absolute);
        let mut settings = self.store.load()?;
        settings.file_path = Some(stored.clone());
        self.store.save(&settings)?;
        info!(file_path = %stored, "target file updated");

        self.evaluate();
        Ok(stored)
    }

    /// Whether saving `saved` should trigger a re-evaluation.
    ///
    /// With a configured target only that file counts; otherwise only the
    /// active document does.
    pub fn is_watched(&self, saved: &Path) -> bool {
        let settings = match self.store.load() {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "could not read settings while filtering save event");
                return false;
            }
        };

        effective_target(
            &settings,
            self.workspace_root.as_deref(),
            self.active_document.as_deref(),
        )
        .is_some_and(|target| normalize(&target.path) == normalize(saved))
    }

    /// Whether `path` is the file the settings store persists to.
    pub fn is_settings_file(&self, path: &Path) -> bool {
        self.store
            .location()
            .is_some_and(|location| normalize(location) == normalize(path))
    }

    /// Release the status item.
    pub fn dispose(&mut self) {
        self.status.dispose();
    }
}
