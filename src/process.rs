//! Shell commands as chain stages.
//!
//! A [`Command`] is a shell command line run through `sh -c`. Commands
//! compose with `|` into a single shell pipeline. Input is written to the
//! child's stdin on a background thread while stdout is read lazily, line by
//! line. [`OutputBytes`] yields raw lines; [`OutputLines`] decodes them as
//! UTF-8, replacing invalid sequences with `U+FFFD`.

use std::fmt::{self, Display, Formatter};
use std::io::{self, BufRead, BufReader, Write};
use std::ops::BitOr;
use std::process::{Child, ChildStdout, Stdio};
use std::thread::JoinHandle;

use crate::chain::{Chain, Pipe, Stage, Step, impl_pipe_operators};
use crate::error::{Error, Result};
use crate::recorder::Recorder;
use crate::value::Value;

// =============================================================================
// ProcessInput
// =============================================================================

/// What is fed to a command's stdin.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ProcessInput {
    /// Stdin is closed immediately.
    #[default]
    None,
    /// A single block of text.
    Text(String),
    /// Lines written one after another, as-is.
    Lines(Vec<String>),
    /// Raw bytes written unchanged.
    Bytes(Vec<u8>),
}

impl TryFrom<Value> for ProcessInput {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Nil => Ok(Self::None),
            Value::Str(text) => Ok(Self::Text(text)),
            Value::List(items) | Value::Tuple(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Str(line) => Ok(line),
                    other => Err(Error::InvalidProcessInput {
                        type_name: other.type_name(),
                    }),
                })
                .collect::<Result<Vec<_>>>()
                .map(Self::Lines),
            other => Err(Error::InvalidProcessInput {
                type_name: other.type_name(),
            }),
        }
    }
}

// =============================================================================
// Command
// =============================================================================

/// A shell command line.
///
/// # Examples
///
/// ```rust
/// use pipewright::process::Command;
///
/// let pipeline = Command::new("grep 1") | Command::new("sort -r");
/// assert_eq!(pipeline.line(), "grep 1 | sort -r");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Command {
    line: String,
}

impl Command {
    /// Wraps a command line; nothing runs until the command is invoked.
    pub fn new(line: impl Into<String>) -> Self {
        Self { line: line.into() }
    }

    /// The shell command line.
    pub fn line(&self) -> &str {
        &self.line
    }

    /// Connects stdout of `self` to stdin of `other`.
    #[must_use]
    pub fn pipe(&self, other: &Self) -> Self {
        Self::new(format!("{} | {}", self.line, other.line))
    }

    /// Spawns the command and starts feeding `input`; stdout is decoded
    /// lossily as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the shell cannot be spawned. Failures after
    /// the spawn are reported by the returned iterator.
    pub fn invoke(&self, input: ProcessInput) -> Result<OutputLines> {
        self.invoke_bytes(input).map(|bytes| OutputLines { bytes })
    }

    /// Spawns the command and starts feeding `input`; stdout lines are
    /// yielded as raw bytes.
    ///
    /// # Errors
    ///
    /// See [`Command::invoke`].
    pub fn invoke_bytes(&self, input: ProcessInput) -> Result<OutputBytes> {
        let mut command = std::process::Command::new("sh");
        command
            .arg("-c")
            .arg(&self.line)
            .stdout(Stdio::piped())
            .stdin(match input {
                ProcessInput::None => Stdio::null(),
                ProcessInput::Text(_) | ProcessInput::Lines(_) | ProcessInput::Bytes(_) => {
                    Stdio::piped()
                }
            });

        tracing::debug!(command = %self.line, "spawning process");
        let mut child = command.spawn()?;

        let writer = match (child.stdin.take(), input) {
            (Some(mut stdin), ProcessInput::Text(text)) => {
                Some(std::thread::spawn(move || ignore_broken_pipe(stdin.write_all(text.as_bytes()))))
            }
            (Some(mut stdin), ProcessInput::Lines(lines)) => Some(std::thread::spawn(move || {
                ignore_broken_pipe(
                    lines
                        .iter()
                        .try_for_each(|line| stdin.write_all(line.as_bytes())),
                )
            })),
            (Some(mut stdin), ProcessInput::Bytes(bytes)) => {
                Some(std::thread::spawn(move || ignore_broken_pipe(stdin.write_all(&bytes))))
            }
            _ => None,
        };

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::failed(self.line.clone(), "stdout was not captured"))?;

        Ok(OutputBytes {
            command: self.line.clone(),
            reader: BufReader::new(stdout),
            child: Some(child),
            writer,
        })
    }
}

/// A reader that exits early closes its stdin; that is not a failure.
fn ignore_broken_pipe(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

impl Display for Command {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "$({})", self.line)
    }
}

impl BitOr for Command {
    type Output = Self;

    fn bitor(self, other: Self) -> Self {
        self.pipe(&other)
    }
}

impl Stage for Command {
    fn name(&self) -> String {
        self.to_string()
    }

    fn run(&self, input: Value) -> Result<Value> {
        self.invoke(ProcessInput::try_from(input)?)?
            .map(|line| line.map(Value::Str))
            .collect::<Result<Vec<_>>>()
            .map(Value::List)
    }
}

impl From<Command> for Step {
    fn from(command: Command) -> Self {
        Self::stage(command)
    }
}

impl_pipe_operators!(Command);

// =============================================================================
// OutputBytes and OutputLines
// =============================================================================

/// Lazily read stdout lines as raw bytes, terminators included.
///
/// Once stdout is exhausted the writer thread is joined and the child is
/// reaped; a non-zero exit yields one final [`Error::ProcessFailed`]. A read
/// error kills the child and ends the iteration after reporting the error.
/// Dropping the iterator early kills the child.
pub struct OutputBytes {
    command: String,
    reader: BufReader<ChildStdout>,
    child: Option<Child>,
    writer: Option<JoinHandle<io::Result<()>>>,
}

impl OutputBytes {
    fn finish(&mut self, mut child: Child) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer
                .join()
                .map_err(|_| Error::failed(self.command.clone(), "stdin writer panicked"))??;
        }
        let status = child.wait()?;
        tracing::debug!(command = %self.command, %status, "process exited");
        if status.success() {
            Ok(())
        } else {
            Err(Error::ProcessFailed {
                command: self.command.clone(),
                status: status.to_string(),
            })
        }
    }
}

impl Iterator for OutputBytes {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut child = self.child.take()?;
        let mut line = Vec::new();
        match self.reader.read_until(b'\n', &mut line) {
            Ok(0) => self.finish(child).err().map(Err),
            Ok(_) => {
                self.child = Some(child);
                Some(Ok(line))
            }
            Err(error) => {
                if let Err(kill) = child.kill() {
                    tracing::warn!(command = %self.command, %kill, "could not kill process");
                }
                if let Err(exit) = self.finish(child) {
                    tracing::warn!(command = %self.command, %exit, "process stopped after a read error");
                }
                Some(Err(Error::from(error)))
            }
        }
    }
}

impl Drop for OutputBytes {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
            if let Some(writer) = self.writer.take() {
                let _ = writer.join();
            }
        }
    }
}

impl fmt::Debug for OutputBytes {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("OutputBytes")
            .field("command", &self.command)
            .field("running", &self.child.is_some())
            .finish_non_exhaustive()
    }
}

/// Lazily read stdout lines decoded as UTF-8, terminators included.
///
/// Invalid sequences become `U+FFFD`. Exit status and early-drop behavior
/// are those of [`OutputBytes`].
#[derive(Debug)]
pub struct OutputLines {
    bytes: OutputBytes,
}

impl Iterator for OutputLines {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.bytes.next().map(|line| {
            line.map(|bytes| {
                String::from_utf8(bytes)
                    .unwrap_or_else(|error| String::from_utf8_lossy(error.as_bytes()).into_owned())
            })
        })
    }
}
