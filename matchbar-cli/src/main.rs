//! matchbar CLI - evaluate a configured regex against a workspace file and
//! print the status label an editor would show.
//!
//! Settings live in `<workspace>/.matchbar.toml` unless `--settings` points
//! elsewhere, so the CLI and the LSP server share them.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use matchbar_core::{
    commands, init_structured_logging, list_workspace_files, DiskFiles, Extension, FileStore,
    HostEvent, MatchReporter, Prompter, StatusLabel, TargetSelection, SETTINGS_FILE,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Show the first regex match of a file, the way a status bar would")]
pub struct Cli {
    /// Workspace root that relative file paths are resolved against
    #[arg(long, default_value = ".")]
    workspace: PathBuf,

    /// Settings file (defaults to <workspace>/.matchbar.toml)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Output the label in JSON format
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate the current settings and print the label
    Status {
        /// Document treated as the active editor when no target file is set
        #[arg(long)]
        active: Option<PathBuf>,
    },
    /// Store the pattern to search for (prompts when omitted)
    SetPattern { pattern: Option<String> },
    /// Store the target file (interactive browse/type when omitted)
    SetFile { path: Option<String> },
    /// List the files that can be chosen as target
    Files,
    /// Simulate saving a document and print the resulting label
    Saved {
        path: PathBuf,
        /// Document treated as the active editor when no target file is set
        #[arg(long)]
        active: Option<PathBuf>,
    },
}

/// Prompts on stderr, answers from stdin. An empty answer cancels.
struct StdinPrompter;

impl StdinPrompter {
    fn read_line(&self) -> Option<String> {
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()).filter(|l| !l.is_empty()),
        }
    }
}

impl Prompter for StdinPrompter {
    fn input(&mut self, prompt: &str, placeholder: &str) -> Option<String> {
        eprint!("{} ({}): ", prompt, placeholder);
        let _ = io::stderr().flush();
        self.read_line()
    }

    fn pick(&mut self, placeholder: &str, items: &[String]) -> Option<usize> {
        if items.is_empty() {
            eprintln!("Nothing to choose from.");
            return None;
        }
        eprintln!("{}", placeholder);
        for (i, item) in items.iter().enumerate() {
            eprintln!("  {:>3}) {}", i + 1, item);
        }
        eprint!("> ");
        let _ = io::stderr().flush();
        self.read_line()?
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .filter(|i| *i < items.len())
    }

    fn error(&mut self, message: &str) {
        eprintln!("ERROR: {}", message);
    }
}

fn open_extension(cli: &Cli, active: Option<&Path>) -> Result<Extension> {
    let root = cli
        .workspace
        .canonicalize()
        .with_context(|| format!("Workspace not found: {}", cli.workspace.display()))?;
    let settings_path = match &cli.settings {
        Some(path) => absolute(path)?,
        None => root.join(SETTINGS_FILE),
    };

    let mut reporter = MatchReporter::new(
        Box::new(FileStore::new(settings_path)),
        Box::new(DiskFiles),
        Some(root),
    );
    if let Some(active) = active {
        reporter.set_active_document(Some(absolute(active)?));
    }
    Ok(Extension::activate(reporter))
}

/// Resolve `path` the same way the workspace root is resolved, so paths
/// through symlinks still compare equal. Paths that do not exist yet are
/// only made absolute.
fn absolute(path: &Path) -> Result<PathBuf> {
    if let Ok(canonical) = path.canonicalize() {
        return Ok(canonical);
    }
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()?.join(path))
}

fn print_label(extension: &Extension, json: bool) -> Result<()> {
    let label: Option<&StatusLabel> = extension.label();
    if json {
        let out = serde_json::json!({
            "text": label.map(|l| l.text.as_str()),
            "icon": label.map(|l| l.icon),
            "state": label.map(|l| l.state),
            "visible": extension.reporter().status().is_visible(),
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if let Some(label) = label {
        println!("{}", label.rendered());
    }
    Ok(())
}

fn main() -> Result<()> {
    std::panic::set_hook(Box::new(|info| {
        eprintln!("[PANIC] matchbar internal error: {}", info);
    }));

    init_structured_logging();

    let cli = Cli::parse();

    match &cli.command {
        Command::Status { active } => {
            let extension = open_extension(&cli, active.as_deref())?;
            print_label(&extension, cli.json)?;
        }
        Command::SetPattern { pattern } => {
            let mut extension = open_extension(&cli, None)?;
            let changed = match pattern {
                Some(p) => extension.set_pattern(Some(p.as_str()))?,
                None => commands::set_pattern(&mut extension, &mut StdinPrompter),
            };
            if changed {
                print_label(&extension, cli.json)?;
            }
        }
        Command::SetFile { path } => {
            let mut extension = open_extension(&cli, None)?;
            match path {
                Some(p) => {
                    let stored =
                        extension.set_target_file(&TargetSelection::Typed(p.clone()))?;
                    eprintln!("INFO: target file set to {}", stored);
                }
                None => {
                    if !commands::set_target_file(&mut extension, &mut StdinPrompter) {
                        return Ok(());
                    }
                }
            }
            print_label(&extension, cli.json)?;
        }
        Command::Files => {
            let root = cli
                .workspace
                .canonicalize()
                .with_context(|| format!("Workspace not found: {}", cli.workspace.display()))?;
            let files = list_workspace_files(&root)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&files)?);
            } else {
                for file in files {
                    println!("{}", file);
                }
            }
        }
        Command::Saved { path, active } => {
            let mut extension = open_extension(&cli, active.as_deref())?;
            extension.handle(&HostEvent::DocumentSaved {
                path: absolute(path)?,
            });
            print_label(&extension, cli.json)?;
        }
    }

    Ok(())
}
