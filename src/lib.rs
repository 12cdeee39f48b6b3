//! # procexec
//!
//! Run an external program, feed it stdin, and capture its output.
//!
//! A [`Command`] is an immutable description of what to run: its
//! arguments, working directory, environment, stdin and where its output
//! goes. Each `with_*` call returns a new `Command`, so a base command can
//! be shared and reused freely.
//!
//! Executing a command spawns the process directly (never through a
//! shell), writes stdin and drains stdout/stderr on separate threads so a
//! chatty child can never deadlock against a full pipe, then waits for it
//! to exit.
//!
//! ## Quick Start
//!
//! ```no_run
//! use procexec::Command;
//!
//! fn main() -> procexec::Result<()> {
//!     // Initialize logging
//!     procexec::logging::try_init().ok();
//!
//!     let year = Command::new(["date", "+%Y"])?.exec()?.stdout;
//!     println!("It is {}", year.trim());
//!
//!     // Non-zero exit codes are failures unless checking is disabled
//!     let result = Command::new(["cat", "/nonexistent-file"])?
//!         .with_check(false)
//!         .exec()?;
//!     println!("exit {}: {}", result.exit_code, result.stderr);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Logging
//!
//! The command line and every stdout line are logged at `DEBUG`, stderr
//! lines at `WARN`, through the `tracing` target `procexec::process`.
//! Supply your own [`LogSink`] to a [`CommandExecutor`] to capture them
//! elsewhere.

pub mod cli;
pub mod config;
pub mod error;
pub mod execution;
pub mod logging;

// Re-export commonly used types
pub use error::{ProcExecError, Result};
pub use execution::{
    Command, CommandExecutor, ExecutionResult, Input, LogSink, LogSource, Redirect, TracingSink,
};
