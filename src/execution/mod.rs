//! Command configuration and execution.
//!
//! This module provides:
//! - An immutable [`Command`] built through chained `with_*` calls
//! - A [`CommandExecutor`] that spawns the process, feeds stdin and drains
//!   stdout/stderr concurrently
//! - A pluggable [`LogSink`] receiving the command line and output lines
//!
//! # Example
//!
//! ```no_run
//! use procexec::Command;
//!
//! # fn main() -> procexec::Result<()> {
//! let result = Command::new(["cat"])?.with_stdin("Hello, world!").exec()?;
//! assert!(result.stdout.starts_with("Hello"));
//!
//! let result = Command::new(["cat", "/nonexistent-file"])?
//!     .with_check(false)
//!     .exec()?;
//! assert_ne!(result.exit_code, 0);
//! assert!(result.stdout.is_empty());
//! # Ok(())
//! # }
//! ```

mod command;
mod executor;
mod result;
mod sink;
mod stdio;

pub use command::Command;
pub use executor::CommandExecutor;
pub use result::ExecutionResult;
pub use sink::{LogSink, LogSource, TracingSink, LOG_TARGET};
pub use stdio::{Input, Redirect, SharedReader};
