//! Command-line interface for procexec.
//!
//! Uses lexopt for minimal binary size overhead.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::config::Config;
use crate::execution::{Command, Redirect};

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Working directory for the command.
    pub home: Option<PathBuf>,
    /// Environment variables, in the order given.
    pub env: Vec<(String, String)>,
    /// Text sent to the command's stdin.
    pub stdin: Option<String>,
    /// File piped into the command's stdin.
    pub stdin_file: Option<PathBuf>,
    /// File receiving the command's stdout.
    pub stdout_file: Option<PathBuf>,
    /// File receiving the command's stderr.
    pub stderr_file: Option<PathBuf>,
    /// Do not fail on non-zero exit codes.
    pub no_check: bool,
    /// Merge stderr into stdout.
    pub redirect: bool,
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
    /// Program and its arguments.
    pub command: Vec<String>,
}

impl Args {
    /// Build the command described by these arguments on top of `config`.
    pub fn to_command(&self, config: &Config) -> crate::Result<Command> {
        let mut command = config.apply_to(&Command::new(self.command.iter().cloned())?)?;

        if let Some(ref text) = self.stdin {
            command = command.with_stdin(text.as_str());
        }
        if let Some(ref path) = self.stdin_file {
            command = command.with_stdin_file(path)?;
        }
        if let Some(ref path) = self.stdout_file {
            command = command.with_stdout(Redirect::to(path));
        }
        if let Some(ref path) = self.stderr_file {
            command = command.with_stderr(Redirect::to(path));
        }

        Ok(command)
    }
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('d') | Long("home") => {
                result.home = Some(parser.value()?.parse()?);
            }
            Short('e') | Long("env") => {
                let value: String = parser.value()?.string()?;
                let (name, val) = value
                    .split_once('=')
                    .ok_or_else(|| ArgsError::InvalidValue("env", value.clone()))?;
                result.env.push((name.to_string(), val.to_string()));
            }
            Short('i') | Long("stdin") => {
                result.stdin = Some(parser.value()?.string()?);
            }
            Long("stdin-file") => {
                result.stdin_file = Some(parser.value()?.parse()?);
            }
            Long("stdout-file") => {
                result.stdout_file = Some(parser.value()?.parse()?);
            }
            Long("stderr-file") => {
                result.stderr_file = Some(parser.value()?.parse()?);
            }
            Long("no-check") => {
                result.no_check = true;
            }
            Long("redirect") => {
                result.redirect = true;
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.string()?);
            }
            Value(program) => {
                // Everything after the program belongs to it, dashes included.
                result.command.push(program.string()?);
                for raw in parser.raw_args()? {
                    result.command.push(raw.string()?);
                }
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    if result.command.is_empty() && !result.help && !result.version {
        return Err(ArgsError::MissingProgram);
    }

    Ok(result)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"procexec {version}
Run a program, feed it stdin and capture its output

USAGE:
    procexec [OPTIONS] [--] <PROGRAM> [ARGS...]

OPTIONS:
    -d, --home <DIR>         Working directory [default: current directory]
    -e, --env <KEY=VALUE>    Set an environment variable (repeatable)
    -i, --stdin <TEXT>       Send TEXT to the program's stdin
        --stdin-file <FILE>  Send FILE to the program's stdin
        --stdout-file <FILE> Write the program's stdout to FILE
        --stderr-file <FILE> Write the program's stderr to FILE (ignored with --redirect)
        --no-check           Do not fail on a non-zero exit code
        --redirect           Merge stderr into stdout
    -c, --config <FILE>      Path to configuration file (JSON)
    -l, --log-level <LVL>    Log level (error, warn, info, debug, trace)
    -h, --help               Print help
    -V, --version            Print version

ENVIRONMENT VARIABLES:
    PROCEXEC_HOME            Working directory (overrides config)
    PROCEXEC_LOG_LEVEL       Log level (overrides config)
    RUST_LOG                 Alternative log level setting

EXAMPLES:
    # Capture the output of ls
    procexec ls -al /tmp

    # Feed stdin, capturing stderr together with stdout
    procexec --redirect -i 'Hello, world!' cat

    # Log every line the program prints
    procexec -l procexec=debug -- make -j4
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("procexec {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// Invalid argument value.
    InvalidValue(&'static str, String),
    /// No program was given.
    MissingProgram,
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::InvalidValue(name, value) => {
                write!(f, "invalid value for --{}: '{}'", name, value)
            }
            Self::MissingProgram => write!(f, "missing program to run"),
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}
