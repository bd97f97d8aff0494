//! Status label rendering and the status item it is shown in.

use serde::Serialize;

use crate::error::{MatchbarError, MatchbarResult};
use crate::evaluate::MatchOutcome;

/// Glyph shown next to the label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Regex,
    Error,
}

impl Icon {
    /// Codicon name used by editors that render `$(name)` glyphs.
    pub fn codicon(self) -> &'static str {
        match self {
            Self::Regex => "regex",
            Self::Error => "error",
        }
    }
}

/// Which of the label families the last evaluation produced.
///
/// Derived from each evaluation, never stored as a state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayState {
    Unconfigured,
    Error,
    Matched,
    NoMatch,
}

/// One rendered status label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusLabel {
    pub text: String,
    pub icon: Icon,
    pub state: DisplayState,
}

impl StatusLabel {
    /// Render whichever variant an evaluation returned.
    pub fn from_evaluation(result: &MatchbarResult<MatchOutcome>) -> Self {
        match result {
            Ok(outcome) => Self::from_outcome(outcome),
            Err(err) => {
                let text = match err {
                    MatchbarError::InvalidPattern { .. }
                    | MatchbarError::Read { .. }
                    | MatchbarError::Config { .. }
                    | MatchbarError::InvalidArgument { .. } => format!("Error: {}", err),
                    _ => err.to_string(),
                };
                Self {
                    text,
                    icon: err.icon(),
                    state: err.display_state(),
                }
            }
        }
    }

    fn from_outcome(outcome: &MatchOutcome) -> Self {
        let (text, state) = match outcome {
            MatchOutcome::Captured(group) => (format!("Match: {}", group), DisplayState::Matched),
            MatchOutcome::Matched(whole) => {
                (format!("Match found: {}", whole), DisplayState::Matched)
            }
            MatchOutcome::NoMatch => ("No match found".to_string(), DisplayState::NoMatch),
        };
        Self {
            text,
            icon: Icon::Regex,
            state,
        }
    }

    /// Label with its glyph in `$(icon) text` form.
    pub fn rendered(&self) -> String {
        format!("$({}) {}", self.icon.codicon(), self.text)
    }
}

/// The single status indicator owned by a reporter.
///
/// Every update overwrites the label wholesale.
#[derive(Debug, Default)]
pub struct StatusItem {
    label: Option<StatusLabel>,
    visible: bool,
    disposed: bool,
}

impl StatusItem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the label. Ignored once disposed.
    pub fn set(&mut self, label: StatusLabel) {
        if !self.disposed {
            self.label = Some(label);
        }
    }

    /// Make the item visible. No-op if already visible or disposed.
    pub fn show(&mut self) {
        if !self.disposed {
            self.visible = true;
        }
    }

    /// Release the item; it never shows anything again.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.visible = false;
        self.label = None;
    }

    pub fn label(&self) -> Option<&StatusLabel> {
        self.label.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_labels() {
        let captured = StatusLabel::from_evaluation(&Ok(MatchOutcome::Captured("42".into())));
        assert_eq!(captured.text, "Match: 42");
        assert_eq!(captured.icon, Icon::Regex);
        assert_eq!(captured.state, DisplayState::Matched);

        let whole = StatusLabel::from_evaluation(&Ok(MatchOutcome::Matched("42".into())));
        assert_eq!(whole.text, "Match found: 42");

        let none = StatusLabel::from_evaluation(&Ok(MatchOutcome::NoMatch));
        assert_eq!(none.text, "No match found");
        assert_eq!(none.state, DisplayState::NoMatch);
    }

    #[test]
    fn test_error_labels() {
        let unconfigured = StatusLabel::from_evaluation(&Err(MatchbarError::PatternNotConfigured));
        assert_eq!(unconfigured.text, "Pattern not configured");
        assert_eq!(unconfigured.icon, Icon::Regex);

        let missing =
            StatusLabel::from_evaluation(&Err(MatchbarError::file_not_found("/w/.env", ".env")));
        assert_eq!(missing.text, "File not found: .env");
        assert_eq!(missing.icon, Icon::Error);

        let invalid = StatusLabel::from_evaluation(&Err(MatchbarError::InvalidPattern {
            message: "unclosed group".into(),
        }));
        assert_eq!(invalid.text, "Error: unclosed group");
        assert_eq!(invalid.rendered(), "$(error) Error: unclosed group");
    }

    #[test]
    fn test_status_item_lifecycle() {
        let mut item = StatusItem::new();
        assert!(!item.is_visible());

        item.set(StatusLabel::from_evaluation(&Ok(MatchOutcome::NoMatch)));
        item.show();
        item.show();
        assert!(item.is_visible());
        assert_eq!(item.label().map(|l| l.text.as_str()), Some("No match found"));

        item.dispose();
        item.set(StatusLabel::from_evaluation(&Ok(MatchOutcome::NoMatch)));
        item.show();
        assert!(item.is_disposed());
        assert!(!item.is_visible());
        assert!(item.label().is_none());
    }
}
