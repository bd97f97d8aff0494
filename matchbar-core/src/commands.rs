//! Interactive "Set Pattern" and "Set Target File" flows.
//!
//! The prompts themselves belong to the host; a [`Prompter`] adapts them.

use tracing::warn;

use crate::error::MatchbarError;
use crate::extension::Extension;
use crate::reporter::TargetSelection;
use crate::workspace::list_workspace_files;

pub const SET_PATTERN: &str = "matchbar.setPattern";
pub const SET_FILE_PATH: &str = "matchbar.setFilePath";

const BROWSE: &str = "Browse files";
const TYPE_PATH: &str = "Type a path";

/// Host-side prompts. `None` means the user cancelled.
pub trait Prompter {
    fn input(&mut self, prompt: &str, placeholder: &str) -> Option<String>;

    /// Returns the index of the chosen item.
    fn pick(&mut self, placeholder: &str, items: &[String]) -> Option<usize>;

    fn error(&mut self, message: &str);
}

/// Prompt for a pattern and store it. Returns true if settings changed.
pub fn set_pattern(extension: &mut Extension, prompter: &mut dyn Prompter) -> bool {
    let pattern = prompter.input("Enter a regular expression", r"e.g. \d+");
    match extension.set_pattern(pattern.as_deref()) {
        Ok(changed) => changed,
        Err(e) => {
            report(prompter, &e);
            false
        }
    }
}

/// Let the user browse or type a target file and store it.
/// Returns true if settings changed.
pub fn set_target_file(extension: &mut Extension, prompter: &mut dyn Prompter) -> bool {
    let Some(root) = extension.reporter().workspace_root().map(|r| r.to_path_buf()) else {
        report(prompter, &MatchbarError::NoWorkspace);
        return false;
    };

    let modes = [BROWSE.to_string(), TYPE_PATH.to_string()];
    let selection = match prompter.pick("How do you want to choose the file?", &modes) {
        Some(0) => {
            let files = match list_workspace_files(&root) {
                Ok(files) => files,
                Err(e) => {
                    warn!(error = %e, "workspace listing failed");
                    prompter.error(&format!("{:#}", e));
                    return false;
                }
            };
            let Some(index) = prompter.pick("Select a file to analyze", &files) else {
                return false;
            };
            match files.get(index) {
                Some(file) => TargetSelection::Picked(file.clone()),
                None => return false,
            }
        }
        Some(1) => {
            let typed = prompter.input(
                "Enter the file path (relative to the workspace)",
                "e.g. .env, config/settings.json",
            );
            match typed.filter(|t| !t.trim().is_empty()) {
                Some(t) => TargetSelection::Typed(t),
                None => return false,
            }
        }
        _ => return false,
    };

    match extension.set_target_file(&selection) {
        Ok(_) => true,
        Err(e) => {
            report(prompter, &e);
            false
        }
    }
}

fn report(prompter: &mut dyn Prompter, err: &MatchbarError) {
    let message = match err {
        MatchbarError::FileNotFound { name, .. } => {
            format!("The file \"{}\" does not exist in the workspace.", name)
        }
        other => other.to_string(),
    };
    prompter.error(&message);
}
