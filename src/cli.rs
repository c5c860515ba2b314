use std::{
    io::Write,
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use pathdiff::diff_paths;

use crate::{
    invoke::{BuildRunner, InvokeError, MakeInvoker},
    menu::{self, Menu, MenuError},
    scan::{scan, ScanError, ScanReport, Target},
};

pub mod value_parser;

/// Pick a Makefile target from a list and build it.
///
/// All the files named `Makefile` below the root directory are scanned for
/// target declarations. The chosen target is then passed to `make`, which
/// runs in the current directory.
#[derive(Parser, Debug)]
#[clap(styles = cli_styles::CLAP_STYLES, version, verbatim_doc_comment)]
pub struct Cli {
    /// Directory to scan for Makefiles
    #[clap(short = 'C', long, value_name = "DIR", default_value = ".")]
    root: PathBuf,

    /// Build command, the target is appended as its last argument
    #[clap(long = "make", value_name = "COMMAND", default_value = "make")]
    make: MakeInvoker,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Choose a target interactively and build it (default)
    Pick,
    /// List the discovered targets
    List(List),
}

#[derive(Parser, Debug)]
pub struct List {
    /// Only print target names
    #[clap(short, long)]
    names_only: bool,

    /// Output format
    #[clap(short, long, value_enum)]
    format: Option<OutputFormat>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[derive(ValueEnum)]
pub enum OutputFormat {
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("No Makefiles found.")]
    NoMakefiles,
    #[error("No targets found in Makefiles.")]
    NoTargets,
    #[error(transparent)]
    Menu(#[from] MenuError),
    #[error(transparent)]
    Invoke(#[from] InvokeError),
    #[error("Failed to get current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
    #[error("Failed to serialize targets: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Process exit code for this error.
    ///
    /// A failed build passes its own exit code through.
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::Invoke(e) => e
                .exit_code()
                .and_then(|code| u8::try_from(code).ok())
                .filter(|&code| code != 0)
                .unwrap_or(1),
            _ => 1,
        }
    }
}

pub fn main(args: &Cli) -> Result<(), CliError> {
    let targets = require_targets(scan(&args.root)?)?;

    match &args.command {
        None | Some(Command::Pick) => pick(targets, &args.make),
        Some(Command::List(list_args)) => {
            let cwd = std::env::current_dir().map_err(CliError::CurrentDir)?;
            let mut stdout = std::io::stdout().lock();
            list(&targets, list_args, &cwd, &mut stdout)
        }
    }
}

/// Turns the empty scan outcomes into errors.
pub fn require_targets(report: ScanReport) -> Result<Vec<Target>, CliError> {
    if report.makefiles.is_empty() {
        return Err(CliError::NoMakefiles);
    }
    if report.targets.is_empty() {
        return Err(CliError::NoTargets);
    }
    Ok(report.targets)
}

fn pick(targets: Vec<Target>, runner: &impl BuildRunner) -> Result<(), CliError> {
    let names = targets.into_iter().map(|target| target.name).collect();
    let selected = menu::select(Menu::new(names)?)?;
    build_selected(selected.as_deref(), runner)
}

/// Builds the selected target, if the user picked one.
pub fn build_selected(selected: Option<&str>, runner: &impl BuildRunner) -> Result<(), CliError> {
    let Some(target) = selected else {
        log::info!("no target selected");
        return Ok(());
    };
    runner.run(target)?;
    Ok(())
}

fn list(targets: &[Target], args: &List, cwd: &Path, out: &mut impl Write) -> Result<(), CliError> {
    if let Some(OutputFormat::Json) = args.format {
        #[derive(serde::Serialize)]
        struct TargetEntry<'a> {
            name: &'a str,
            makefile: PathBuf,
        }

        let entries = targets
            .iter()
            .map(|target| TargetEntry {
                name: &target.name,
                makefile: relative_to(&target.makefile, cwd),
            })
            .collect::<Vec<_>>();

        serde_json::to_writer(&mut *out, &entries)?;
        writeln!(out)?;
        return Ok(());
    }

    for target in targets {
        if args.names_only {
            writeln!(out, "{}", target.name)?;
        } else {
            let makefile = relative_to(&target.makefile, cwd);
            writeln!(
                out,
                "{:<24} {}",
                target.name.cyan().bold(),
                makefile.display().to_string().bright_black()
            )?;
        }
    }

    Ok(())
}

fn relative_to(path: &Path, cwd: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    diff_paths(&absolute, cwd).unwrap_or(absolute)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use clap::CommandFactory;

    use super::*;
    use crate::menu::MenuEvent;

    #[derive(Default)]
    struct RecordingRunner {
        calls: RefCell<Vec<String>>,
    }

    impl BuildRunner for RecordingRunner {
        fn run(&self, target: &str) -> Result<(), InvokeError> {
            self.calls.borrow_mut().push(target.to_string());
            Ok(())
        }
    }

    fn target(name: &str, makefile: &str) -> Target {
        Target {
            name: name.to_string(),
            makefile: PathBuf::from(makefile),
        }
    }

    fn menu() -> Menu<String> {
        Menu::new(["build", "test", "clean"].map(String::from).to_vec()).unwrap()
    }

    #[test]
    fn cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["makepick"]).unwrap();
        assert_eq!(cli.root, PathBuf::from("."));
        assert_eq!(cli.make, MakeInvoker::default());
        assert!(cli.command.is_none());
    }

    #[test]
    fn make_command_is_split() {
        let cli = Cli::try_parse_from(["makepick", "--make", "make -j 4 'FOO=a b'", "-C", "src", "list", "-n"])
            .unwrap();
        assert_eq!(cli.make.program(), "make");
        assert_eq!(cli.make.args(), ["-j", "4", "FOO=a b"]);
        assert_eq!(cli.root, PathBuf::from("src"));
        assert!(matches!(cli.command, Some(Command::List(List { names_only: true, format: None }))));
    }

    #[test]
    fn bad_make_command_is_rejected() {
        assert!(Cli::try_parse_from(["makepick", "--make", ""]).is_err());
        assert!(Cli::try_parse_from(["makepick", "--make", "make 'unterminated"]).is_err());
    }

    #[test]
    fn confirm_builds_exactly_once() {
        let mut m = menu();
        m.feed([MenuEvent::Down, MenuEvent::Confirm]);

        let runner = RecordingRunner::default();
        build_selected(m.selected().map(String::as_str), &runner).unwrap();
        assert_eq!(*runner.calls.borrow(), ["test"]);
    }

    #[test]
    fn quit_builds_nothing() {
        let mut m = menu();
        m.feed([MenuEvent::Down, MenuEvent::Quit]);

        let runner = RecordingRunner::default();
        build_selected(m.selected().map(String::as_str), &runner).unwrap();
        assert!(runner.calls.borrow().is_empty());
    }

    #[test]
    fn empty_scans() {
        let err = require_targets(ScanReport::default()).unwrap_err();
        assert!(matches!(err, CliError::NoMakefiles));
        assert_eq!(err.to_string(), "No Makefiles found.");
        assert_eq!(err.exit_code(), 1);

        let report = ScanReport {
            makefiles: vec![PathBuf::from("Makefile")],
            targets: vec![],
        };
        let err = require_targets(report).unwrap_err();
        assert!(matches!(err, CliError::NoTargets));
        assert_eq!(err.exit_code(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn failed_build_exit_code_passes_through() {
        use std::{os::unix::process::ExitStatusExt, process::ExitStatus};

        let failed = |status: ExitStatus| {
            CliError::from(InvokeError::Failed {
                command: "make all".to_string(),
                status,
            })
        };

        // wait status encoding: exit code in the second byte
        assert_eq!(failed(ExitStatus::from_raw(2 << 8)).exit_code(), 2);
        // killed by SIGKILL
        assert_eq!(failed(ExitStatus::from_raw(9)).exit_code(), 1);
    }

    #[test]
    fn list_names_only() {
        let targets = [target("build", "/work/Makefile"), target("build", "/work/sub/Makefile")];
        let args = List {
            names_only: true,
            format: None,
        };

        let mut out = Vec::new();
        list(&targets, &args, Path::new("/work"), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "build\nbuild\n");
    }

    #[test]
    fn list_table_shows_relative_makefiles() {
        let targets = [target("all", "./Makefile"), target("lib", "/work/sub/Makefile")];
        let args = List {
            names_only: false,
            format: None,
        };

        let mut out = Vec::new();
        list(&targets, &args, Path::new("/work"), &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        let lines = out.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("all") && lines[0].contains("Makefile"));
        assert!(lines[1].contains("lib") && lines[1].contains("sub/Makefile"));
        assert!(!out.contains("/work"));
    }

    #[test]
    fn list_json() {
        let targets = [target("all", "./Makefile"), target("lib", "/work/sub/Makefile")];
        let args = List {
            names_only: false,
            format: Some(OutputFormat::Json),
        };

        let mut out = Vec::new();
        list(&targets, &args, Path::new("/work"), &mut out).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "name": "all", "makefile": "Makefile" },
                { "name": "lib", "makefile": "sub/Makefile" },
            ])
        );
    }
}
