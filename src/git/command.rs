//! Git Command Execution
//!
//! A [`GitRequest`] is a plain description of one git invocation: program,
//! already-translated arguments, working directory and optional stdin. A
//! [`GitRunner`] executes it in one of three modes (capture, status, stream).
//! The process working directory is never touched; every child gets the
//! repository root through `current_dir`.

use std::{
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    process::{Command, ExitStatus, Stdio},
    thread,
};

use tracing::{debug, trace};

use crate::{
    errors::{GitError, PoolError, Result},
    git::log::LogStream,
};

/// One git invocation, built before anything is executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRequest {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub stdin: Option<String>,
    pub discard_stdout: bool,
}

impl GitRequest {
    pub fn new(program: impl Into<String>, cwd: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.as_ref().to_path_buf(),
            stdin: None,
            discard_stdout: false,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Payload written to the child's stdin, which is then closed.
    #[must_use]
    pub fn stdin(mut self, payload: impl Into<String>) -> Self {
        self.stdin = Some(payload.into());
        self
    }

    /// Sends the child's stdout to the null device in status mode.
    #[must_use]
    pub fn quiet(mut self) -> Self {
        self.discard_stdout = true;
        self
    }

    /// The composed command, each word shell-quoted.
    #[must_use]
    pub fn command_line(&self) -> String {
        let words = std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str));
        shell_words::join(words)
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).current_dir(&self.cwd);
        command
    }

    fn spawn_error(&self, source: std::io::Error) -> PoolError {
        PoolError::Git(GitError::Spawn {
            command: self.command_line(),
            source,
        })
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Stdout without its final newline on success,
    /// [`GitError::CommandFailed`] otherwise.
    ///
    /// Only one `\n` is removed: paths may legitimately end in whitespace.
    ///
    /// # Errors
    /// * If the command exited non-zero
    pub fn into_stdout(self, request: &GitRequest) -> Result<String> {
        if self.success() {
            let mut stdout = self.stdout;
            if stdout.ends_with('\n') {
                stdout.pop();
            }
            return Ok(stdout);
        }

        let output = if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        };

        Err(command_failed(request, self.code, output))
    }
}

pub(crate) fn command_failed(request: &GitRequest, status: i32, output: &str) -> PoolError {
    PoolError::Git(GitError::CommandFailed {
        command: request.command_line(),
        status,
        output: output.to_string(),
    })
}

/// Executes [`GitRequest`]s.
///
/// Implementations never treat a non-zero exit as an error; that decision
/// belongs to the caller. Only failing to start the process is an error.
#[cfg_attr(test, mockall::automock)]
pub trait GitRunner: Send + Sync {
    /// Runs to completion, capturing stdout and stderr.
    ///
    /// # Errors
    /// * If the process cannot be spawned or waited on
    fn output(&self, request: &GitRequest) -> Result<CommandOutput>;

    /// Runs to completion with inherited stdio and returns the exit code.
    ///
    /// # Errors
    /// * If the process cannot be spawned or waited on
    fn status(&self, request: &GitRequest) -> Result<i32>;

    /// Starts the process and hands back its stdout as a line stream.
    ///
    /// # Errors
    /// * If the process cannot be spawned
    fn stream(&self, request: &GitRequest) -> Result<LogStream>;
}

/// [`GitRunner`] backed by `std::process::Command`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl GitRunner for SystemRunner {
    fn output(&self, request: &GitRequest) -> Result<CommandOutput> {
        debug!(command = %request.command_line(), cwd = %request.cwd.display(), "running git");

        let mut command = request.to_command();
        command
            .stdin(if request.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|e| request.spawn_error(e))?;

        // Fed from a separate thread so a chatty child cannot deadlock us.
        let writer = match (child.stdin.take(), request.stdin.clone()) {
            (Some(mut stdin), Some(payload)) => Some(thread::spawn(move || {
                match stdin.write_all(payload.as_bytes()) {
                    Err(e) if e.kind() != ErrorKind::BrokenPipe => Err(e),
                    _ => Ok(()),
                }
            })),
            _ => None,
        };

        let output = child.wait_with_output().map_err(|e| request.spawn_error(e))?;

        if let Some(writer) = writer
            && let Ok(Err(e)) = writer.join()
        {
            return Err(request.spawn_error(e));
        }

        let code = exit_code(output.status);
        trace!(code, "git exited");

        Ok(CommandOutput {
            code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn status(&self, request: &GitRequest) -> Result<i32> {
        debug!(command = %request.command_line(), cwd = %request.cwd.display(), "running git");

        let mut command = request.to_command();
        if request.discard_stdout {
            command.stdout(Stdio::null());
        }

        let status = command.status().map_err(|e| request.spawn_error(e))?;
        let code = exit_code(status);
        trace!(code, "git exited");

        Ok(code)
    }

    fn stream(&self, request: &GitRequest) -> Result<LogStream> {
        debug!(command = %request.command_line(), cwd = %request.cwd.display(), "streaming git");

        let child = request
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .map_err(|e| request.spawn_error(e))?;

        LogStream::new(child, request)
    }
}

/// Exit code, or `128 + signal` for a child killed by a signal.
#[must_use]
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}
