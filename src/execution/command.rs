//! Immutable command configuration.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use super::stdio::{Input, Redirect};
use crate::error::ProcExecError;
use crate::Result;

/// A command to be executed as an external process.
///
/// Every `with_*` method borrows `self` and returns a new `Command`; the
/// original is never changed, so a base command can be reused and shared
/// between threads.
///
/// ```no_run
/// use procexec::Command;
///
/// # fn main() -> procexec::Result<()> {
/// let stdout = Command::new(["ls", "-al", "/tmp"])?
///     .with_home("/home/me")?
///     .with_redirect(true)
///     .exec()?
///     .stdout;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    args: Vec<String>,
    home: PathBuf,
    env: HashMap<String, String>,
    check: bool,
    redirect: bool,
    stdin: Input,
    stdout: Redirect,
    stderr: Redirect,
}

impl Command {
    /// Create a command from its argument vector.
    ///
    /// The first element names the program, the rest are its parameters.
    pub fn new<I, S>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::default().with_args(args)
    }

    /// Append one argument.
    pub fn with_arg(&self, arg: impl Into<String>) -> Result<Self> {
        self.with_args([arg])
    }

    /// Append several arguments.
    pub fn with_args<I, S>(&self, args: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut extra = self.args.clone();
        for (pos, arg) in args.into_iter().enumerate() {
            let arg = arg.into();
            if arg.contains('\0') {
                return Err(ProcExecError::InvalidArgument(format!(
                    "The argument no.{} can't contain a NUL byte",
                    pos + 1
                )));
            }
            extra.push(arg);
        }
        Ok(Self {
            args: extra,
            ..self.clone()
        })
    }

    /// Set the directory the process runs in.
    pub fn with_home(&self, dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        if dir.as_os_str().is_empty() {
            return Err(ProcExecError::InvalidArgument(
                "The HOME can't be empty".to_string(),
            ));
        }
        Ok(Self {
            home: dir.to_path_buf(),
            ..self.clone()
        })
    }

    /// Whether a non-zero exit code is reported as a failure.
    pub fn with_check(&self, check: bool) -> Self {
        Self {
            check,
            ..self.clone()
        }
    }

    /// Whether stderr is merged into stdout by the operating system. Off by default.
    pub fn with_redirect(&self, redirect: bool) -> Self {
        Self {
            redirect,
            ..self.clone()
        }
    }

    /// Redirect stdout.
    pub fn with_stdout(&self, target: Redirect) -> Self {
        Self {
            stdout: target,
            ..self.clone()
        }
    }

    /// Redirect stderr. Ignored while stderr is merged into stdout.
    pub fn with_stderr(&self, target: Redirect) -> Self {
        Self {
            stderr: target,
            ..self.clone()
        }
    }

    /// Set the bytes sent to the process as stdin. Text is sent as UTF-8.
    pub fn with_stdin(&self, input: impl Into<Input>) -> Self {
        Self {
            stdin: input.into(),
            ..self.clone()
        }
    }

    /// Pipe a reader into the process as stdin.
    pub fn with_stdin_reader<R>(&self, reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        self.with_stdin(Input::reader(reader))
    }

    /// Pipe a file into the process as stdin.
    pub fn with_stdin_file(&self, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ProcExecError::InvalidArgument(
                "The STDIN file can't be empty".to_string(),
            ));
        }
        Ok(self.with_stdin(Input::File(path.to_path_buf())))
    }

    /// Set an environment variable on top of the inherited environment.
    pub fn with_env(&self, name: impl Into<String>, value: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let value = value.into();
        if name.is_empty() || name.contains('=') || name.contains('\0') {
            return Err(ProcExecError::InvalidArgument(format!(
                "The name of the env variable can't be empty or contain '=' or NUL: {:?}",
                name
            )));
        }
        if value.contains('\0') {
            return Err(ProcExecError::InvalidArgument(format!(
                "The value of the env variable {} can't contain NUL",
                name
            )));
        }
        let mut env = self.env.clone();
        env.insert(name, value);
        Ok(Self {
            env,
            ..self.clone()
        })
    }

    /// The argument vector.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The program name, i.e. the first argument.
    pub fn program(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Arguments joined by single spaces, as logged before execution.
    pub fn command_line(&self) -> String {
        self.args.join(" ")
    }

    /// Working directory of the process.
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Environment overrides.
    pub fn env(&self) -> &HashMap<String, String> {
        &self.env
    }

    /// Whether non-zero exit codes fail the execution.
    pub fn check(&self) -> bool {
        self.check
    }

    /// Whether stderr is merged into stdout.
    pub fn redirect(&self) -> bool {
        self.redirect
    }

    /// Stdin source.
    pub fn stdin(&self) -> &Input {
        &self.stdin
    }

    /// Stdout target.
    pub fn stdout_target(&self) -> &Redirect {
        &self.stdout
    }

    /// Stderr target.
    pub fn stderr_target(&self) -> &Redirect {
        &self.stderr
    }
}

impl Default for Command {
    /// An empty command running in the current directory, captured once here.
    fn default() -> Self {
        Self {
            args: Vec::new(),
            home: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env: HashMap::new(),
            check: true,
            redirect: false,
            stdin: Input::Empty,
            stdout: Redirect::Pipe,
            stderr: Redirect::Pipe,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_new() {
        let cmd = Command::new(["ls", "-la"]).unwrap();
        assert_eq!(cmd.args(), ["ls", "-la"]);
        assert_eq!(cmd.program(), Some("ls"));
        assert_eq!(cmd.home(), std::env::current_dir().unwrap());
        assert!(cmd.env().is_empty());
        assert!(cmd.check());
        assert!(!cmd.redirect());
        assert_eq!(cmd.stdin(), &Input::Empty);
        assert!(cmd.stdout_target().is_pipe());
        assert!(cmd.stderr_target().is_pipe());
    }

    #[test]
    fn test_command_default_is_empty() {
        let cmd = Command::default();
        assert!(cmd.args().is_empty());
        assert_eq!(cmd.program(), None);
        assert_eq!(cmd.command_line(), "");
    }

    #[test]
    fn test_command_builder_chain() {
        let cmd = Command::new(["cargo"])
            .unwrap()
            .with_arg("build")
            .unwrap()
            .with_home("/project")
            .unwrap()
            .with_env("RUST_LOG", "debug")
            .unwrap()
            .with_check(false)
            .with_redirect(true)
            .with_stdin("input")
            .with_stdout(Redirect::Null);

        assert_eq!(cmd.command_line(), "cargo build");
        assert_eq!(cmd.home(), Path::new("/project"));
        assert_eq!(cmd.env().get("RUST_LOG"), Some(&"debug".to_string()));
        assert!(!cmd.check());
        assert!(cmd.redirect());
        assert_eq!(cmd.stdin(), &Input::from("input"));
        assert_eq!(cmd.stdout_target(), &Redirect::Null);
    }

    #[test]
    fn test_withers_leave_original_untouched() {
        let base = Command::new(["echo"]).unwrap();
        let saved = base.clone();

        let _ = base.with_arg("hello").unwrap();
        let _ = base.with_home("/tmp").unwrap();
        let _ = base.with_env("KEY", "value").unwrap();
        let _ = base.with_check(false);
        let _ = base.with_redirect(true);
        let _ = base.with_stdin("text");
        let _ = base.with_stdout(Redirect::Null);
        let _ = base.with_stderr(Redirect::Inherit);

        assert_eq!(base, saved);
    }

    #[test]
    fn test_withers_are_idempotent() {
        let base = Command::new(["env"]).unwrap();
        let once = base.with_env("A", "1").unwrap();
        let twice = once.with_env("A", "1").unwrap();
        assert_eq!(once, twice);

        let once = base.with_check(false);
        assert_eq!(once, once.with_check(false));

        let once = base.with_home("/tmp").unwrap();
        assert_eq!(once, once.with_home("/tmp").unwrap());
    }

    #[test]
    fn test_with_args_appends_in_order() {
        let cmd = Command::default()
            .with_args(vec!["date", "+%Y"])
            .unwrap()
            .with_args(Vec::<String>::new())
            .unwrap();
        assert_eq!(cmd.args(), ["date", "+%Y"]);
    }

    #[test]
    fn test_nul_argument_rejected() {
        let err = Command::new(["echo"])
            .unwrap()
            .with_args(["ok", "bad\0arg"])
            .unwrap_err();
        assert!(matches!(err, ProcExecError::InvalidArgument(_)));
        assert!(err.to_string().contains("argument no.2"));
    }

    #[test]
    fn test_empty_home_rejected() {
        let err = Command::default().with_home("").unwrap_err();
        assert!(matches!(err, ProcExecError::InvalidArgument(_)));
    }

    #[test]
    fn test_env_validation() {
        let cmd = Command::default();
        assert!(cmd.with_env("", "value").is_err());
        assert!(cmd.with_env("A=B", "value").is_err());
        assert!(cmd.with_env("KEY", "va\0lue").is_err());
        assert!(cmd.with_env("KEY", "").is_ok());
    }

    #[test]
    fn test_env_overwrites() {
        let cmd = Command::default()
            .with_env("KEY", "first")
            .unwrap()
            .with_env("KEY", "second")
            .unwrap();
        assert_eq!(cmd.env().len(), 1);
        assert_eq!(cmd.env().get("KEY"), Some(&"second".to_string()));
    }

    #[test]
    fn test_stdin_file() {
        let cmd = Command::default().with_stdin_file("/tmp/input.txt").unwrap();
        assert_eq!(cmd.stdin(), &Input::File(PathBuf::from("/tmp/input.txt")));
        assert!(Command::default().with_stdin_file("").is_err());
    }
}
