//! matchbar-core: evaluate a regular expression against a file and render
//! the first match as an editor status label.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use matchbar_core::{DiskFiles, Extension, FileStore, MatchReporter};
//!
//! let root = std::path::PathBuf::from("/path/to/workspace");
//! let reporter = MatchReporter::new(
//!     Box::new(FileStore::in_workspace(&root)),
//!     Box::new(DiskFiles),
//!     Some(root),
//! );
//! let extension = Extension::activate(reporter);
//! println!("{}", extension.label().unwrap().rendered());
//! ```
//!
//! # Module Organization
//!
//! - [`evaluate`]: target resolution and the multi-line regex search
//! - [`reporter`]: the context object holding settings, files and status
//! - [`extension`]: activation, event subscriptions, deactivation
//! - [`events`]: host events and the subscribe/unsubscribe registry
//! - [`commands`]: interactive set-pattern / set-target-file flows
//! - [`config`]: settings storage
//! - [`status`]: label rendering and the status item
//! - [`workspace`]: path policy, file listing, disk access
//! - [`error`]: typed error handling

pub mod commands;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod events;
pub mod extension;
pub mod logging;
pub mod reporter;
pub mod status;
pub mod workspace;

// Error types
pub use error::{IoResultExt, MatchbarError, MatchbarResult};

// Settings
pub use config::{FileStore, MemoryStore, Settings, SettingsStore, NAMESPACE, SETTINGS_FILE};

// Evaluation
pub use evaluate::{effective_target, evaluate, match_content, MatchOutcome, Target};

// Events and lifecycle
pub use events::{EventBus, EventKind, HostEvent, SubscriptionId};
pub use extension::Extension;
pub use reporter::{MatchReporter, TargetSelection};

// Commands
pub use commands::Prompter;

// Logging
pub use logging::init_structured_logging;

// Status rendering
pub use status::{DisplayState, Icon, StatusItem, StatusLabel};

// Workspace
pub use workspace::{list_workspace_files, normalize, resolve_target, DiskFiles, FileSource};
