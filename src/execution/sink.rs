//! Log sink receiving the command line and the process output.

use std::fmt;

use tracing::Level;

/// Target used for events emitted by [`TracingSink`].
pub const LOG_TARGET: &str = "procexec::process";

/// What a log message is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogSource {
    /// The command line being executed, or the engine itself.
    Command,
    /// A line from the child's stdout (or merged output).
    Stdout,
    /// A line from the child's stderr.
    Stderr,
}

impl LogSource {
    /// Short lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives everything an execution logs.
///
/// Implementations are called from the stream-draining threads, so lines
/// from stdout and stderr may arrive interleaved.
pub trait LogSink: Send + Sync {
    /// Record one message.
    fn log(&self, level: Level, source: LogSource, message: &str);
}

/// Default sink forwarding to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: Level, source: LogSource, message: &str) {
        let source = source.as_str();
        if level == Level::ERROR {
            tracing::error!(target: LOG_TARGET, source, "{}", message);
        } else if level == Level::WARN {
            tracing::warn!(target: LOG_TARGET, source, "{}", message);
        } else if level == Level::INFO {
            tracing::info!(target: LOG_TARGET, source, "{}", message);
        } else if level == Level::DEBUG {
            tracing::debug!(target: LOG_TARGET, source, "{}", message);
        } else {
            tracing::trace!(target: LOG_TARGET, source, "{}", message);
        }
    }
}
