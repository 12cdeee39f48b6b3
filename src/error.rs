//! Error types for procexec.

use thiserror::Error;

/// Main error type for procexec operations.
#[derive(Error, Debug)]
pub enum ProcExecError {
    /// A builder received a value it cannot represent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The process ran to completion but exited with a non-zero code.
    #[error("Non-zero exit code #{code} of '{program}'")]
    NonZeroExit {
        code: i32,
        program: String,
        stdout: String,
        stderr: String,
    },

    /// The process could not be started, or a pipe failed while it ran.
    #[error("I/O error while running '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Checked form of [`ProcExecError::Io`].
    #[error("failed to execute '{program}': {source}")]
    Execution {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting for the process was cancelled by the caller.
    #[error("execution interrupted: {0}")]
    Interrupted(String),
}

impl ProcExecError {
    /// Whether the process could not be run at all (spawn or pipe failure).
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::Execution { .. })
    }

    /// Whether the process ran and returned a non-zero exit code.
    pub fn is_non_zero_exit(&self) -> bool {
        matches!(self, Self::NonZeroExit { .. })
    }

    /// Exit code carried by a [`ProcExecError::NonZeroExit`].
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Reclassify an I/O failure the way the checked entry points report it.
    pub(crate) fn into_checked(self) -> Self {
        match self {
            Self::Io { program, source } => Self::Execution { program, source },
            other => other,
        }
    }
}

/// Convenience Result type for procexec operations.
pub type Result<T> = std::result::Result<T, ProcExecError>;
