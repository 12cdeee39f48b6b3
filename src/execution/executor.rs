//! Command execution engine.

use std::io::{self, BufRead, BufReader, Read};
use std::panic;
use std::process::{Child, ChildStdin, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread::{self, ScopedJoinHandle};
use std::time::Instant;

use tokio::task::JoinError;
use tracing::Level;

use super::command::Command;
use super::result::ExecutionResult;
use super::sink::{LogSink, LogSource, TracingSink};
use super::stdio::{OpenedInput, Redirect};
use crate::error::ProcExecError;
use crate::Result;

/// Output stream handed to a draining thread.
type OutputStream = Box<dyn Read + Send>;

/// Runs commands, reporting to a [`LogSink`].
#[derive(Clone)]
pub struct CommandExecutor {
    sink: Arc<dyn LogSink>,
}

impl CommandExecutor {
    /// Create an executor logging to the given sink.
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self { sink }
    }

    /// Execute a command and wait for it to finish.
    ///
    /// Spawn and pipe failures are reported as [`ProcExecError::Execution`].
    pub fn execute(&self, command: &Command) -> Result<ExecutionResult> {
        self.execute_unsafe(command)
            .map_err(ProcExecError::into_checked)
    }

    /// Execute a command and wait for it to finish.
    ///
    /// Spawn and pipe failures are reported as [`ProcExecError::Io`], apart
    /// from the [`ProcExecError::NonZeroExit`] raised by the exit-code check.
    pub fn execute_unsafe(&self, command: &Command) -> Result<ExecutionResult> {
        let program = command
            .program()
            .ok_or_else(|| {
                ProcExecError::InvalidArgument("The list of arguments can't be empty".to_string())
            })?
            .to_string();
        self.sink.log(
            Level::DEBUG,
            LogSource::Command,
            &format!("+{}", command.command_line()),
        );

        let start = Instant::now();
        let (code, stdout, stderr) =
            self.run(command).map_err(|source| ProcExecError::Io {
                program: program.clone(),
                source,
            })?;
        let duration = start.elapsed();

        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();

        if command.check() && code != 0 {
            self.sink.log(Level::ERROR, LogSource::Stderr, &stderr);
            return Err(ProcExecError::NonZeroExit {
                code,
                program,
                stdout,
                stderr,
            });
        }

        Ok(ExecutionResult::new(code, stdout, stderr).with_duration(duration))
    }

    /// Async form of [`CommandExecutor::execute`].
    pub async fn execute_async(&self, command: &Command) -> Result<ExecutionResult> {
        self.execute_unsafe_async(command)
            .await
            .map_err(ProcExecError::into_checked)
    }

    /// Async form of [`CommandExecutor::execute_unsafe`].
    ///
    /// The engine runs on the blocking pool. If that task is cancelled the
    /// result is [`ProcExecError::Interrupted`]; a panic inside it is resumed
    /// here.
    pub async fn execute_unsafe_async(&self, command: &Command) -> Result<ExecutionResult> {
        let executor = self.clone();
        let command = command.clone();
        match tokio::task::spawn_blocking(move || executor.execute_unsafe(&command)).await {
            Ok(result) => result,
            Err(err) => Err(join_error(err)),
        }
    }

    /// Spawn, pump and wait. Returns the exit code and the raw captures.
    fn run(&self, command: &Command) -> io::Result<(i32, Vec<u8>, Vec<u8>)> {
        let input = command.stdin().open()?;
        let Spawned {
            mut child,
            stdout,
            stderr,
        } = spawn(command)?;
        let stdin = child.stdin.take();
        let sink: &dyn LogSink = &*self.sink;

        let pumped = thread::scope(|scope| {
            let writer = scope.spawn(move || feed(input, stdin, sink));
            let out = stdout.map(|stream| {
                scope.spawn(move || drain(stream, LogSource::Stdout, Level::DEBUG, sink))
            });
            let err = stderr.map(|stream| {
                scope.spawn(move || drain(stream, LogSource::Stderr, Level::WARN, sink))
            });

            let written = join(writer);
            let out = out.map(join).transpose();
            let err = err.map(join).transpose();
            written.and(out.and_then(|out| Ok((out, err?))))
        });

        let (out, err) = match pumped {
            Ok(captured) => captured,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        };
        let status = child.wait()?;
        Ok((
            exit_code(status),
            out.unwrap_or_default(),
            err.unwrap_or_default(),
        ))
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl std::fmt::Debug for CommandExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandExecutor").finish_non_exhaustive()
    }
}

impl Command {
    /// Execute with the default tracing sink. See [`CommandExecutor::execute`].
    pub fn exec(&self) -> Result<ExecutionResult> {
        CommandExecutor::default().execute(self)
    }

    /// Execute with the default tracing sink. See [`CommandExecutor::execute_unsafe`].
    pub fn exec_unsafe(&self) -> Result<ExecutionResult> {
        CommandExecutor::default().execute_unsafe(self)
    }

    /// Async form of [`Command::exec`].
    pub async fn exec_async(&self) -> Result<ExecutionResult> {
        CommandExecutor::default().execute_async(self).await
    }

    /// Async form of [`Command::exec_unsafe`].
    pub async fn exec_unsafe_async(&self) -> Result<ExecutionResult> {
        CommandExecutor::default().execute_unsafe_async(self).await
    }
}

/// A live child with the output streams the library reads.
struct Spawned {
    child: Child,
    stdout: Option<OutputStream>,
    stderr: Option<OutputStream>,
}

fn spawn(command: &Command) -> io::Result<Spawned> {
    let args = command.args();
    let mut cmd = std::process::Command::new(&args[0]);
    cmd.args(&args[1..])
        .current_dir(command.home())
        .envs(command.env())
        .stdin(Stdio::piped());

    let mut merged = None;
    if command.redirect() {
        match command.stdout_target() {
            Redirect::Pipe => {
                let (reader, writer) = io::pipe()?;
                cmd.stdout(writer.try_clone()?).stderr(writer);
                merged = Some(reader);
            }
            target => {
                let (out, err) = target.merged_stdio()?;
                cmd.stdout(out).stderr(err);
            }
        }
    } else {
        cmd.stdout(command.stdout_target().stdio()?)
            .stderr(command.stderr_target().stdio()?);
    }

    let mut child = cmd.spawn()?;
    // Our copies of the merged pipe's write end live in `cmd`; the reader
    // sees end-of-stream only once they are closed.
    drop(cmd);

    let stdout: Option<OutputStream> = match merged {
        Some(reader) => Some(Box::new(reader) as OutputStream),
        None => child.stdout.take().map(|s| Box::new(s) as OutputStream),
    };
    let stderr = child.stderr.take().map(|s| Box::new(s) as OutputStream);
    Ok(Spawned {
        child,
        stdout,
        stderr,
    })
}

/// Writer task: copy the input into the child and close the pipe.
fn feed(input: OpenedInput, stdin: Option<ChildStdin>, sink: &dyn LogSink) -> io::Result<()> {
    let Some(mut pipe) = stdin else {
        return Ok(());
    };
    match input.copy_to(&mut pipe) {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            sink.log(
                Level::DEBUG,
                LogSource::Command,
                "stdin closed by the process before all input was written",
            );
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Reader task: capture a stream to its end, logging each line.
fn drain(
    stream: OutputStream,
    source: LogSource,
    level: Level,
    sink: &dyn LogSink,
) -> io::Result<Vec<u8>> {
    let mut reader = BufReader::new(stream);
    let mut captured = Vec::new();
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            break;
        }
        captured.extend_from_slice(&line);
        let text = String::from_utf8_lossy(&line);
        sink.log(level, source, text.trim_end_matches(['\n', '\r']));
    }
    Ok(captured)
}

/// Classify a blocking task that did not complete. Panics are resumed.
fn join_error(err: JoinError) -> ProcExecError {
    if err.is_panic() {
        panic::resume_unwind(err.into_panic());
    }
    ProcExecError::Interrupted(err.to_string())
}

fn join<T>(handle: ScopedJoinHandle<'_, io::Result<T>>) -> io::Result<T> {
    match handle.join() {
        Ok(result) => result,
        Err(payload) => panic::resume_unwind(payload),
    }
}

/// Exit code, with signal deaths reported as `128 + signal`.
fn exit_code(status: ExitStatus) -> i32 {
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
