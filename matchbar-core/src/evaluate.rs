//! The evaluation itself: settings + target + file content in, outcome out.

use regex::RegexBuilder;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::{MatchbarError, MatchbarResult};
use crate::workspace::{resolve_target, FileSource};

/// Result of running the pattern over the file content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// First match had a non-empty capture group 1.
    Captured(String),
    /// First match had no (or an empty) group 1; holds the whole match.
    Matched(String),
    NoMatch,
}

/// Where the target came from, used for the "File not found" name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub path: PathBuf,
    pub display_name: String,
}

/// Effective target: the configured `filePath`, else the active document.
pub fn effective_target(
    settings: &Settings,
    workspace_root: Option<&Path>,
    active_document: Option<&Path>,
) -> Option<Target> {
    match settings.file_path() {
        Some(configured) => resolve_target(workspace_root, configured).map(|path| Target {
            path,
            display_name: configured.to_string(),
        }),
        None => active_document.map(|path| Target {
            path: path.to_path_buf(),
            display_name: path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string()),
        }),
    }
}

/// Run a multi-line search for the first match of `pattern` in `content`.
pub fn match_content(pattern: &str, content: &str) -> MatchbarResult<MatchOutcome> {
    let regex = RegexBuilder::new(pattern)
        .multi_line(true)
        .build()
        .map_err(|e| MatchbarError::invalid_pattern(&e))?;

    let Some(captures) = regex.captures(content) else {
        return Ok(MatchOutcome::NoMatch);
    };

    match captures.get(1).map(|g| g.as_str()).filter(|g| !g.is_empty()) {
        Some(group) => Ok(MatchOutcome::Captured(group.to_string())),
        None => Ok(MatchOutcome::Matched(
            captures
                .get(0)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
        )),
    }
}

/// Evaluate the settings against the target file.
///
/// Never panics; every failure comes back as a [`MatchbarError`] for the
/// caller to render.
pub fn evaluate(
    settings: &Settings,
    workspace_root: Option<&Path>,
    active_document: Option<&Path>,
    files: &dyn FileSource,
) -> MatchbarResult<MatchOutcome> {
    let pattern = settings.pattern().ok_or(MatchbarError::PatternNotConfigured)?;

    let target = effective_target(settings, workspace_root, active_document)
        .ok_or(MatchbarError::NoFileSpecified)?;

    if !files.exists(&target.path) {
        return Err(MatchbarError::file_not_found(
            &target.path,
            target.display_name,
        ));
    }

    let content = files.read_to_string(&target.path)?;
    match_content(pattern, &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeFiles(HashMap<PathBuf, String>);

    impl FakeFiles {
        fn with(path: &str, content: &str) -> Self {
            let mut map = HashMap::new();
            map.insert(PathBuf::from(path), content.to_string());
            Self(map)
        }
    }

    impl FileSource for FakeFiles {
        fn exists(&self, path: &Path) -> bool {
            self.0.contains_key(path)
        }

        fn read_to_string(&self, path: &Path) -> MatchbarResult<String> {
            self.0.get(path).cloned().ok_or_else(|| {
                MatchbarError::read(
                    path,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
                )
            })
        }
    }

    fn settings(pattern: Option<&str>, file_path: Option<&str>) -> Settings {
        Settings {
            pattern: pattern.map(String::from),
            file_path: file_path.map(String::from),
        }
    }

    #[test]
    fn test_capture_group() {
        assert_eq!(
            match_content(r"value=(\d+)", "value=42").unwrap(),
            MatchOutcome::Captured("42".into())
        );
    }

    #[test]
    fn test_whole_match() {
        assert_eq!(
            match_content(r"\d+", "value=42").unwrap(),
            MatchOutcome::Matched("42".into())
        );
    }

    #[test]
    fn test_empty_group_falls_back_to_whole_match() {
        assert_eq!(
            match_content(r"key=(\d*);", "key=;").unwrap(),
            MatchOutcome::Matched("key=;".into())
        );
    }

    #[test]
    fn test_unmatched_optional_group_falls_back() {
        assert_eq!(
            match_content(r"a(b)?", "ac").unwrap(),
            MatchOutcome::Matched("a".into())
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(match_content("zzz", "value=42").unwrap(), MatchOutcome::NoMatch);
    }

    #[test]
    fn test_multi_line_anchors() {
        let content = "first line\nversion = 3\nlast";
        assert_eq!(
            match_content(r"^version = (\d+)$", content).unwrap(),
            MatchOutcome::Captured("3".into())
        );
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(
            match_content(r"id=(\w+)", "id=alpha id=beta").unwrap(),
            MatchOutcome::Captured("alpha".into())
        );
    }

    #[test]
    fn test_invalid_pattern() {
        let err = match_content("(", "anything").unwrap_err();
        assert!(matches!(err, MatchbarError::InvalidPattern { .. }));
    }

    #[test]
    fn test_invalid_pattern_reports_error_not_pattern() {
        match match_content("error: (.*", "error: boom").unwrap_err() {
            MatchbarError::InvalidPattern { message } => assert_eq!(message, "unclosed group"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_evaluate_pattern_missing_wins() {
        let files = FakeFiles(HashMap::new());
        let err = evaluate(&settings(None, Some("/nope")), None, None, &files).unwrap_err();
        assert!(matches!(err, MatchbarError::PatternNotConfigured));
    }

    #[test]
    fn test_evaluate_no_file() {
        let files = FakeFiles(HashMap::new());
        let err = evaluate(&settings(Some("x"), None), None, None, &files).unwrap_err();
        assert!(matches!(err, MatchbarError::NoFileSpecified));

        let err = evaluate(&settings(Some("x"), Some("rel.txt")), None, None, &files).unwrap_err();
        assert!(matches!(err, MatchbarError::NoFileSpecified));
    }

    #[test]
    fn test_evaluate_missing_file_ignores_pattern_validity() {
        let files = FakeFiles(HashMap::new());
        let root = Path::new("/ws");
        let err = evaluate(&settings(Some("("), Some(".env")), Some(root), None, &files)
            .unwrap_err();
        match err {
            MatchbarError::FileNotFound { name, path } => {
                assert_eq!(name, ".env");
                assert_eq!(path, PathBuf::from("/ws/.env"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_evaluate_active_document_fallback() {
        let files = FakeFiles::with("/ws/src/main.txt", "value=7");
        let outcome = evaluate(
            &settings(Some(r"value=(\d+)"), None),
            Some(Path::new("/ws")),
            Some(Path::new("/ws/src/main.txt")),
            &files,
        )
        .unwrap();
        assert_eq!(outcome, MatchOutcome::Captured("7".into()));
    }

    #[test]
    fn test_evaluate_configured_target_beats_active_document() {
        let mut map = HashMap::new();
        map.insert(PathBuf::from("/ws/a.txt"), "value=1".to_string());
        map.insert(PathBuf::from("/ws/b.txt"), "value=2".to_string());
        let files = FakeFiles(map);

        let outcome = evaluate(
            &settings(Some(r"value=(\d+)"), Some("b.txt")),
            Some(Path::new("/ws")),
            Some(Path::new("/ws/a.txt")),
            &files,
        )
        .unwrap();
        assert_eq!(outcome, MatchOutcome::Captured("2".into()));
    }

    #[test]
    fn test_active_document_display_name() {
        let target = effective_target(
            &Settings::default(),
            None,
            Some(Path::new("/ws/notes/today.md")),
        )
        .unwrap();
        assert_eq!(target.display_name, "today.md");
    }
}
