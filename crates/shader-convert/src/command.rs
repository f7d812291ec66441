//! Utilities for executing external tool [commands](Command).

use std::{
    io,
    process::{Command, Output},
};

/// An error indicating failure while executing some external tool.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
#[expect(clippy::module_name_repetitions, reason = "this is intended")]
pub enum CommandExecError {
    /// IO error occurred while spawning the tool.
    #[error("IO error occurred while calling `{command:?}`: {source}")]
    Io {
        /// The command which was called.
        command: Box<Command>,
        /// Source of the error.
        source: io::Error,
    },
    /// The tool exited with a non-zero status.
    #[error(
        "calling `{command:?}` was not successful ({}): {}",
        .output.status,
        String::from_utf8_lossy(&.output.stderr).trim()
    )]
    ExecFail {
        /// The command which was called.
        command: Box<Command>,
        /// The captured output of the called command.
        output: Output,
    },
}

impl CommandExecError {
    /// Creates [`Io`](CommandExecError::Io) variant from given arguments.
    fn io(command: Command, source: io::Error) -> Self {
        Self::Io {
            command: Box::new(command),
            source,
        }
    }

    /// Creates [`ExecFail`](CommandExecError::ExecFail) variant from given arguments.
    fn exec_fail(command: Command, output: Output) -> Self {
        Self::ExecFail {
            command: Box::new(command),
            output,
        }
    }

    /// Returns the command which was called.
    #[inline]
    #[expect(clippy::must_use_candidate, reason = "returns a reference")]
    pub fn command(&self) -> &Command {
        match self {
            Self::Io { command, .. } | Self::ExecFail { command, .. } => command.as_ref(),
        }
    }

    /// Returns whatever the tool wrote to stderr, if it ran at all.
    #[inline]
    #[must_use]
    pub fn stderr(&self) -> Option<String> {
        match self {
            Self::Io { .. } => None,
            Self::ExecFail { output, .. } => {
                Some(String::from_utf8_lossy(&output.stderr).into_owned())
            }
        }
    }
}

/// Executes the command to completion, returning its output.
///
/// Blocks until the process exits; there is no timeout.
pub(crate) fn execute_command(mut command: Command) -> Result<Output, CommandExecError> {
    log::debug!("executing {command:?}");
    let output = match command.output() {
        Ok(output) => output,
        Err(source) => return Err(CommandExecError::io(command, source)),
    };
    if !output.status.success() {
        return Err(CommandExecError::exec_fail(command, output));
    }
    Ok(output)
}
