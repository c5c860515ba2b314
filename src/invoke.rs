use std::{
    process::{Command, ExitStatus, Stdio},
    sync::Once,
};

/// Something that can build a target
pub trait BuildRunner {
    fn run(&self, target: &str) -> Result<(), InvokeError>;
}

#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("'{command}' failed with {status}")]
    Failed { command: String, status: ExitStatus },
}

impl InvokeError {
    /// Exit code of the failed build, if it exited on its own
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            InvokeError::Spawn { .. } => None,
            InvokeError::Failed { status, .. } => status.code(),
        }
    }
}

/// Runs `make <target>` (or a configured replacement) with inherited stdio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MakeInvoker {
    program: String,
    args: Vec<String>,
}

impl Default for MakeInvoker {
    fn default() -> Self {
        Self::new("make")
    }
}

impl MakeInvoker {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Builds an invoker from a words list, the first one being the program.
    pub fn from_words(words: impl IntoIterator<Item = String>) -> Option<Self> {
        let mut words = words.into_iter();
        let program = words.next()?;
        Some(Self {
            program,
            args: words.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The full command line for `target`, quoted for display
    pub fn display_command(&self, target: &str) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .chain(std::iter::once(target))
            .map(|word| shlex::try_quote(word).map_or_else(|_| word.to_string(), |q| q.into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Runs the command and waits for it.
    pub fn status(&self, target: &str) -> Result<ExitStatus, InvokeError> {
        log::debug!("running {}", self.display_command(target));

        ignore_interrupts();

        Command::new(&self.program)
            .args(&self.args)
            .arg(target)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| InvokeError::Spawn {
                program: self.program.clone(),
                source,
            })
    }
}

impl BuildRunner for MakeInvoker {
    fn run(&self, target: &str) -> Result<(), InvokeError> {
        let status = self.status(target)?;
        if !status.success() {
            return Err(InvokeError::Failed {
                command: self.display_command(target),
                status,
            });
        }
        Ok(())
    }
}

/// Keeps this process alive on ctrl-c while the build runs.
///
/// The terminal sends the signal to the whole foreground group, so the build
/// still receives it and we get to report its status.
fn ignore_interrupts() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        if let Err(e) = ctrlc::set_handler(|| {}) {
            log::warn!("Failed to install the ctrl-c handler: {e}");
        }
    });
}
