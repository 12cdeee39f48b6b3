//! Standard stream sources and redirection targets.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};

/// A reader shared between clones of a [`Command`](super::Command).
pub type SharedReader = Arc<Mutex<Box<dyn Read + Send>>>;

/// Source of bytes fed to the child's standard input.
///
/// `Bytes` and `File` are replayed on every execution. A `Reader` is
/// consumed by whichever execution drains it first; later executions
/// see an immediate end of input.
#[derive(Clone, Default)]
pub enum Input {
    /// No input: the pipe is closed right after spawning.
    #[default]
    Empty,
    /// In-memory bytes.
    Bytes(Arc<[u8]>),
    /// A file opened fresh for each execution.
    File(PathBuf),
    /// An arbitrary reader.
    Reader(SharedReader),
}

impl Input {
    /// Wrap a reader as an input source.
    pub fn reader<R>(reader: R) -> Self
    where
        R: Read + Send + 'static,
    {
        Self::Reader(Arc::new(Mutex::new(Box::new(reader))))
    }

    /// Whether this source carries no data at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Bytes(bytes) => bytes.is_empty(),
            _ => false,
        }
    }

    /// Resolve the source into something the writer task can drain.
    pub(crate) fn open(&self) -> io::Result<OpenedInput> {
        Ok(match self {
            Self::Empty => OpenedInput::Empty,
            Self::Bytes(bytes) => OpenedInput::Bytes(Arc::clone(bytes)),
            Self::File(path) => OpenedInput::File(File::open(path)?),
            Self::Reader(reader) => OpenedInput::Reader(Arc::clone(reader)),
        })
    }
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Empty"),
            Self::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
            Self::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

impl PartialEq for Input {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Empty, Self::Empty) => true,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::File(a), Self::File(b)) => a == b,
            (Self::Reader(a), Self::Reader(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Self::Bytes(Arc::from(text.as_bytes()))
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Self::Bytes(Arc::from(text.into_bytes()))
    }
}

impl From<&[u8]> for Input {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(Arc::from(bytes))
    }
}

impl From<Vec<u8>> for Input {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Arc::from(bytes))
    }
}

/// Input resolved for a single execution.
pub(crate) enum OpenedInput {
    Empty,
    Bytes(Arc<[u8]>),
    File(File),
    Reader(SharedReader),
}

impl OpenedInput {
    /// Copy everything into `pipe`, returning the number of bytes written.
    pub(crate) fn copy_to<W: Write>(self, pipe: &mut W) -> io::Result<u64> {
        match self {
            Self::Empty => Ok(0),
            Self::Bytes(bytes) => {
                pipe.write_all(&bytes)?;
                Ok(bytes.len() as u64)
            }
            Self::File(mut file) => io::copy(&mut file, pipe),
            Self::Reader(reader) => {
                let mut reader = reader
                    .lock()
                    .map_err(|_| io::Error::other("stdin reader lock poisoned"))?;
                io::copy(&mut *reader, pipe)
            }
        }
    }
}

/// Where a child's output stream goes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Redirect {
    /// Capture in memory and forward to the log sink.
    #[default]
    Pipe,
    /// Share the parent's stream.
    Inherit,
    /// Discard.
    Null,
    /// Create or truncate the file and write to it.
    File(PathBuf),
    /// Create the file if needed and append to it.
    Append(PathBuf),
}

impl Redirect {
    /// Redirect to a file, truncating it.
    pub fn to(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    /// Redirect to a file, appending to it.
    pub fn append_to(path: impl Into<PathBuf>) -> Self {
        Self::Append(path.into())
    }

    /// Whether the stream is captured by the library.
    pub fn is_pipe(&self) -> bool {
        matches!(self, Self::Pipe)
    }

    /// Path of a file target, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) | Self::Append(path) => Some(path),
            _ => None,
        }
    }

    fn open_file(path: &Path, append: bool) -> io::Result<File> {
        if append {
            OpenOptions::new().create(true).append(true).open(path)
        } else {
            File::create(path)
        }
    }

    /// Build the `Stdio` for one stream.
    pub(crate) fn stdio(&self) -> io::Result<Stdio> {
        Ok(match self {
            Self::Pipe => Stdio::piped(),
            Self::Inherit => Stdio::inherit(),
            Self::Null => Stdio::null(),
            Self::File(path) => Self::open_file(path, false)?.into(),
            Self::Append(path) => Self::open_file(path, true)?.into(),
        })
    }

    /// Build `(stdout, stderr)` for a non-pipe target that both streams share.
    pub(crate) fn merged_stdio(&self) -> io::Result<(Stdio, Stdio)> {
        Ok(match self {
            Self::Pipe => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "a piped target is merged through an explicit pipe",
                ))
            }
            Self::Inherit => (Stdio::inherit(), Stdio::from(io::stdout())),
            Self::Null => (Stdio::null(), Stdio::null()),
            Self::File(path) | Self::Append(path) => {
                let file = Self::open_file(path, matches!(self, Self::Append(_)))?;
                (file.try_clone()?.into(), file.into())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_from_text_is_utf8() {
        let input = Input::from("Привет");
        match input {
            Input::Bytes(bytes) => assert_eq!(&*bytes, "Привет".as_bytes()),
            other => panic!("unexpected input: {:?}", other),
        }
    }

    #[test]
    fn test_input_is_empty() {
        assert!(Input::Empty.is_empty());
        assert!(Input::from("").is_empty());
        assert!(!Input::from("x").is_empty());
        assert!(!Input::File(PathBuf::from("/tmp/in")).is_empty());
    }

    #[test]
    fn test_input_equality() {
        assert_eq!(Input::from("abc"), Input::from(b"abc".to_vec()));
        assert_ne!(Input::from("abc"), Input::Empty);

        let reader = Input::reader(std::io::Cursor::new(b"data".to_vec()));
        assert_eq!(reader.clone(), reader);
        assert_ne!(reader, Input::reader(std::io::Cursor::new(b"data".to_vec())));
    }

    #[test]
    fn test_opened_bytes_copy() {
        let mut sink = Vec::new();
        let written = Input::from("hello").open().unwrap().copy_to(&mut sink).unwrap();
        assert_eq!(written, 5);
        assert_eq!(sink, b"hello");
    }

    #[test]
    fn test_shared_reader_is_consumed_once() {
        let input = Input::reader(std::io::Cursor::new(b"once".to_vec()));

        let mut first = Vec::new();
        input.open().unwrap().copy_to(&mut first).unwrap();
        let mut second = Vec::new();
        input.open().unwrap().copy_to(&mut second).unwrap();

        assert_eq!(first, b"once");
        assert!(second.is_empty());
    }

    #[test]
    fn test_missing_input_file() {
        let input = Input::File(PathBuf::from("/definitely/not/here.txt"));
        assert!(input.open().is_err());
    }

    #[test]
    fn test_redirect_helpers() {
        assert!(Redirect::default().is_pipe());
        assert!(!Redirect::Null.is_pipe());
        assert_eq!(
            Redirect::to("/tmp/out.log").path(),
            Some(Path::new("/tmp/out.log"))
        );
        assert_eq!(
            Redirect::append_to("/tmp/out.log"),
            Redirect::Append(PathBuf::from("/tmp/out.log"))
        );
        assert!(Redirect::Inherit.path().is_none());
    }

    #[test]
    fn test_merged_pipe_is_rejected() {
        assert!(Redirect::Pipe.merged_stdio().is_err());
    }
}
