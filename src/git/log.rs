//! Streaming command output
//!
//! [`LogStream`] yields the stdout of a running git process line by line.
//! It is single-pass. Dropping it early kills and reaps the child.

use std::{
    io::{self, BufRead, BufReader, Lines},
    process::{Child, ChildStdout},
};

use crate::{
    errors::{GitError, PoolError, Result},
    git::command::{GitRequest, command_failed, exit_code},
};

/// Live line stream over a child process's stdout.
#[derive(Debug)]
pub struct LogStream {
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
    request: GitRequest,
}

impl LogStream {
    /// Takes ownership of `child`, whose stdout must be piped.
    ///
    /// # Errors
    /// * If the child was spawned without a piped stdout
    pub fn new(mut child: Child, request: &GitRequest) -> Result<Self> {
        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(PoolError::Git(GitError::Spawn {
                command: request.command_line(),
                source: io::Error::other("stdout was not captured"),
            }));
        };

        Ok(Self {
            child,
            lines: BufReader::new(stdout).lines(),
            request: request.clone(),
        })
    }

    /// Drains whatever is left and waits for the process.
    ///
    /// # Errors
    /// * If reading the remaining output fails
    /// * If the process exited non-zero
    pub fn finish(mut self) -> Result<()> {
        for line in self.lines.by_ref() {
            line?;
        }

        let code = exit_code(self.child.wait()?);
        if code == 0 {
            Ok(())
        } else {
            Err(command_failed(&self.request, code, ""))
        }
    }

    /// Kills the process without reading the rest of its output.
    ///
    /// # Errors
    /// * If the process cannot be reaped
    pub fn terminate(mut self) -> Result<()> {
        self.kill_running();
        self.child.wait()?;
        Ok(())
    }

    fn kill_running(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
        }
    }
}

impl Iterator for LogStream {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.next()
    }
}

impl Drop for LogStream {
    fn drop(&mut self) {
        self.kill_running();
        let _ = self.child.wait();
    }
}
