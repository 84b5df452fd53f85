//! Record-oriented sinks and sources.
//!
//! A [`Sink`] accepts a batch of records and reports an identifier; a
//! [`Source`] yields records lazily. Both are thin adapters: the chain only
//! sees them through the [`Stage`] implementations [`SinkStage`], [`Tee`] and
//! [`SourceStage`].
//!
//! Files are opened through a [`FileRegistry`], which picks the
//! [`FileType`] whose matcher accepts the path. Types registered later take
//! priority over earlier ones. The default registry knows `text`, which
//! accepts every path, and `gzip`, which handles gzip-compressed text under
//! a `.gz` extension.
//!
//! # Examples
//!
//! ```rust
//! use pipewright::builtins::reversed;
//! use pipewright::io::MemorySink;
//! use pipewright::{P, Value};
//!
//! let sink = MemorySink::new("numbers");
//! let identifier = (Value::from_iter([1, 2, 3]) | P | reversed())
//!     .redirect(sink.clone())
//!     .unwrap();
//!
//! assert_eq!(identifier, Value::from("numbers"));
//! assert_eq!(sink.records(), vec![Value::Int(3), Value::Int(2), Value::Int(1)]);
//! ```

use std::fmt::{self, Debug, Formatter};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::ops::BitOr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use parking_lot::Mutex;

use crate::chain::{Chain, Pipe, Stage, Step, impl_pipe_operators};
use crate::error::{Error, Result};
use crate::recorder::Recorder;
use crate::value::Value;

/// Lazily produced records.
pub type Records = Box<dyn Iterator<Item = Result<Value>> + Send>;

// =============================================================================
// Sink / Source
// =============================================================================

/// Destination of a batch of records.
pub trait Sink: Send + Sync {
    /// Value returned by a terminal write.
    fn identifier(&self) -> Value;

    /// Writes `records` and returns [`Sink::identifier`].
    ///
    /// # Errors
    ///
    /// Implementation defined; file sinks return [`Error::Io`].
    fn write(&self, records: Vec<Value>) -> Result<Value>;
}

/// Origin of a lazily read sequence of records.
pub trait Source: Send + Sync {
    /// Starts reading.
    ///
    /// # Errors
    ///
    /// Returns an error when the source cannot be opened. Errors raised
    /// while reading are yielded by the iterator.
    fn read(&self) -> Result<Records>;
}

/// Splits a chain value into records.
///
/// `Nil` is an empty batch and a string is a single record.
fn records_of(value: &Value) -> Result<Vec<Value>> {
    match value {
        Value::Nil => Ok(Vec::new()),
        Value::Str(_) => Ok(vec![value.clone()]),
        other => other.to_sequence(),
    }
}

// =============================================================================
// Mode
// =============================================================================

/// How a [`CallableFile`] is opened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Read only; writes are rejected.
    #[default]
    Read,
    /// Create or truncate, then write.
    Write,
    /// Create if needed, then append.
    Append,
}

impl Mode {
    /// Parses the single-letter flags `r`, `w` and `a`.
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "r" => Some(Self::Read),
            "w" => Some(Self::Write),
            "a" => Some(Self::Append),
            _ => None,
        }
    }
}

// =============================================================================
// MemorySink
// =============================================================================

/// An in-memory sink and source sharing its buffer between clones.
#[derive(Clone, Default)]
pub struct MemorySink {
    name: String,
    mode: Mode,
    records: Arc<Mutex<Vec<Value>>>,
}

impl MemorySink {
    /// Creates an empty sink that replaces its contents on every write.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mode: Mode::Write,
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Makes writes append instead of replacing.
    #[must_use]
    pub fn appending(mut self) -> Self {
        self.mode = Mode::Append;
        self
    }

    /// Snapshot of the stored records.
    pub fn records(&self) -> Vec<Value> {
        self.records.lock().clone()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Drops every stored record.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Debug for MemorySink {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("MemorySink")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("records", &self.len())
            .finish()
    }
}

impl Sink for MemorySink {
    fn identifier(&self) -> Value {
        Value::Str(self.name.clone())
    }

    fn write(&self, records: Vec<Value>) -> Result<Value> {
        let mut stored = self.records.lock();
        if self.mode != Mode::Append {
            stored.clear();
        }
        tracing::debug!(sink = %self.name, records = records.len(), "writing to memory sink");
        stored.extend(records);
        Ok(self.identifier())
    }
}

impl Source for MemorySink {
    fn read(&self) -> Result<Records> {
        Ok(Box::new(self.records().into_iter().map(Ok)))
    }
}

// =============================================================================
// FileType / FileRegistry
// =============================================================================

type Matcher = Arc<dyn Fn(&Path) -> bool + Send + Sync>;
type Reader = Arc<dyn Fn(File) -> Records + Send + Sync>;
type Writer = Arc<dyn Fn(&mut dyn Write, &[Value]) -> Result<()> + Send + Sync>;

/// A named file format: which paths it accepts and how records are encoded.
#[derive(Clone)]
pub struct FileType {
    name: String,
    matcher: Matcher,
    reader: Reader,
    writer: Writer,
}

impl FileType {
    /// Creates a file type from its three behaviors.
    pub fn new<M, R, W>(name: impl Into<String>, matcher: M, reader: R, writer: W) -> Self
    where
        M: Fn(&Path) -> bool + Send + Sync + 'static,
        R: Fn(File) -> Records + Send + Sync + 'static,
        W: Fn(&mut dyn Write, &[Value]) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            matcher: Arc::new(matcher),
            reader: Arc::new(reader),
            writer: Arc::new(writer),
        }
    }

    /// Plain text: accepts every path, one record per line.
    pub fn text() -> Self {
        Self::new("text", |_| true, |file: File| read_lines(file), write_text)
    }

    /// Plain text restricted to paths with the given extension.
    pub fn text_with_extension(name: impl Into<String>, extension: &'static str) -> Self {
        Self::new(
            name,
            move |path: &Path| path.extension().is_some_and(|found| found == extension),
            |file: File| read_lines(file),
            write_text,
        )
    }

    /// Gzip-compressed text under a `.gz` extension, one record per line.
    ///
    /// Appending adds a new gzip member; reading decodes every member.
    pub fn gzip() -> Self {
        Self::new(
            "gzip",
            |path: &Path| path.extension().is_some_and(|found| found == "gz"),
            |file: File| read_lines(MultiGzDecoder::new(file)),
            write_gzip,
        )
    }

    /// The registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` when this type handles `path`.
    pub fn matches(&self, path: &Path) -> bool {
        (self.matcher)(path)
    }
}

impl Debug for FileType {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("FileType").field("name", &self.name).finish_non_exhaustive()
    }
}

/// Yields lines with their terminators; stops after the first error.
fn read_lines(input: impl Read + Send + 'static) -> Records {
    let mut reader = BufReader::new(input);
    let mut failed = false;
    Box::new(std::iter::from_fn(move || {
        if failed {
            return None;
        }
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(Ok(Value::Str(line))),
            Err(error) => {
                failed = true;
                Some(Err(Error::from(error)))
            }
        }
    }))
}

/// Writes each record's text as-is.
fn write_text(output: &mut dyn Write, records: &[Value]) -> Result<()> {
    for record in records {
        match record {
            Value::Str(text) => output.write_all(text.as_bytes())?,
            other => write!(output, "{other}")?,
        }
    }
    Ok(())
}

fn write_gzip(output: &mut dyn Write, records: &[Value]) -> Result<()> {
    let mut encoder = GzEncoder::new(output, Compression::default());
    write_text(&mut encoder, records)?;
    encoder.try_finish()?;
    Ok(())
}

/// Ordered collection of file types.
#[derive(Clone, Debug)]
pub struct FileRegistry {
    types: Vec<FileType>,
}

impl Default for FileRegistry {
    fn default() -> Self {
        Self {
            types: vec![FileType::text(), FileType::gzip()],
        }
    }
}

impl FileRegistry {
    /// A registry without any type.
    pub const fn empty() -> Self {
        Self { types: Vec::new() }
    }

    /// Adds a type with priority over every type registered before it.
    pub fn register(&mut self, file_type: FileType) -> &mut Self {
        self.types.push(file_type);
        self
    }

    /// Removes the most recently registered type called `name`.
    ///
    /// Returns the removed type, if any.
    pub fn unregister(&mut self, name: &str) -> Option<FileType> {
        let index = self.types.iter().rposition(|file_type| file_type.name == name)?;
        Some(self.types.remove(index))
    }

    /// Names in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.types.iter().map(FileType::name).collect()
    }

    /// The type that handles `path`.
    pub fn resolve(&self, path: &Path) -> Option<&FileType> {
        self.types.iter().rev().find(|file_type| file_type.matches(path))
    }

    /// Opens `path` with the type that handles it.
    ///
    /// Nothing touches the filesystem until the file is read or written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFileType`] when no registered type matches.
    pub fn open(&self, path: impl AsRef<Path>, mode: Mode) -> Result<CallableFile> {
        let path = path.as_ref();
        let file_type = self.resolve(path).ok_or_else(|| Error::UnknownFileType {
            path: path.display().to_string(),
        })?;
        Ok(CallableFile {
            path: path.to_path_buf(),
            mode,
            file_type: file_type.clone(),
        })
    }
}

// =============================================================================
// CallableFile
// =============================================================================

/// A file usable as a sink (write or append mode) and as a source.
#[derive(Clone, Debug)]
pub struct CallableFile {
    path: PathBuf,
    mode: Mode,
    file_type: FileType,
}

impl CallableFile {
    /// Opens `path` through the default registry.
    ///
    /// # Errors
    ///
    /// See [`FileRegistry::open`].
    pub fn open(path: impl AsRef<Path>, mode: Mode) -> Result<Self> {
        FileRegistry::default().open(path, mode)
    }

    /// The file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The open mode.
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// The file type chosen for the path.
    pub const fn file_type(&self) -> &FileType {
        &self.file_type
    }
}

impl Sink for CallableFile {
    fn identifier(&self) -> Value {
        Value::Str(self.path.display().to_string())
    }

    fn write(&self, records: Vec<Value>) -> Result<Value> {
        let mut options = OpenOptions::new();
        match self.mode {
            Mode::Write => options.write(true).create(true).truncate(true),
            Mode::Append => options.append(true).create(true),
            Mode::Read => {
                return Err(Error::from(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    format!("`{}` is opened for reading", self.path.display()),
                )));
            }
        };
        tracing::debug!(
            path = %self.path.display(),
            file_type = %self.file_type.name,
            records = records.len(),
            "writing file"
        );
        let mut output = BufWriter::new(options.open(&self.path)?);
        (self.file_type.writer)(&mut output, &records)?;
        output.flush()?;
        Ok(self.identifier())
    }
}

impl Source for CallableFile {
    fn read(&self) -> Result<Records> {
        tracing::debug!(path = %self.path.display(), file_type = %self.file_type.name, "reading file");
        let file = File::open(&self.path)?;
        Ok((self.file_type.reader)(file))
    }
}

// =============================================================================
// Stages
// =============================================================================

/// Terminal write: consumes the running value and yields the sink identifier.
#[derive(Clone)]
pub struct SinkStage {
    sink: Arc<dyn Sink>,
}

impl SinkStage {
    /// Wraps a sink.
    pub fn new(sink: impl Sink + 'static) -> Self {
        Self { sink: Arc::new(sink) }
    }
}

impl Stage for SinkStage {
    fn name(&self) -> String {
        format!("write({})", self.sink.identifier())
    }

    fn run(&self, input: Value) -> Result<Value> {
        self.sink.write(records_of(&input)?)
    }
}

/// Non-terminal write: stores the running value and passes it through.
#[derive(Clone)]
pub struct Tee {
    sink: Arc<dyn Sink>,
}

impl Tee {
    /// Wraps a sink.
    pub fn new(sink: impl Sink + 'static) -> Self {
        Self { sink: Arc::new(sink) }
    }
}

impl Stage for Tee {
    fn name(&self) -> String {
        format!("tee({})", self.sink.identifier())
    }

    fn run(&self, input: Value) -> Result<Value> {
        self.sink.write(records_of(&input)?)?;
        Ok(input)
    }
}

/// Ignores the running value and yields every record of a source as a list.
#[derive(Clone)]
pub struct SourceStage {
    source: Arc<dyn Source>,
}

impl SourceStage {
    /// Wraps a source.
    pub fn new(source: impl Source + 'static) -> Self {
        Self {
            source: Arc::new(source),
        }
    }
}

impl Stage for SourceStage {
    fn name(&self) -> String {
        "read".to_string()
    }

    fn run(&self, _: Value) -> Result<Value> {
        self.source.read()?.collect::<Result<Vec<_>>>().map(Value::List)
    }
}

impl From<SinkStage> for Step {
    fn from(stage: SinkStage) -> Self {
        Self::stage(stage)
    }
}

impl From<Tee> for Step {
    fn from(stage: Tee) -> Self {
        Self::stage(stage)
    }
}

impl From<SourceStage> for Step {
    fn from(stage: SourceStage) -> Self {
        Self::stage(stage)
    }
}

impl_pipe_operators!(SinkStage, Tee, SourceStage);

impl Chain {
    /// Appends a write to `sink` that passes the value on unchanged.
    #[must_use]
    pub fn tee(self, sink: impl Sink + 'static) -> Self {
        self.append(Tee::new(sink))
    }

    /// Appends a terminal write to `sink` and evaluates the pending input.
    ///
    /// # Errors
    ///
    /// See [`Chain::evaluate`].
    pub fn redirect(self, sink: impl Sink + 'static) -> Result<Value> {
        self.append(SinkStage::new(sink)).end()
    }
}

static_assertions::assert_impl_all!(MemorySink: Send, Sync, Clone);
static_assertions::assert_impl_all!(CallableFile: Send, Sync, Clone);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::P;
    use crate::recorder::{Symbolic, X};
    use rstest::{fixture, rstest};

    #[fixture]
    fn sink() -> MemorySink {
        MemorySink::new("memory")
    }

    #[rstest]
    fn test_memory_sink_write_replaces_contents(sink: MemorySink) {
        sink.write(vec![Value::Int(1)]).unwrap();
        sink.write(vec![Value::Int(2), Value::Int(3)]).unwrap();
        assert_eq!(sink.records(), vec![Value::Int(2), Value::Int(3)]);
    }

    #[rstest]
    fn test_appending_sink_keeps_contents(sink: MemorySink) {
        let sink = sink.appending();
        sink.write(vec![Value::Int(1)]).unwrap();
        sink.write(vec![Value::Int(2)]).unwrap();
        assert_eq!(sink.len(), 2);
    }

    #[rstest]
    fn test_clones_share_the_buffer(sink: MemorySink) {
        let handle = sink.clone();
        sink.write(vec![Value::from("a")]).unwrap();
        assert_eq!(handle.records(), vec![Value::from("a")]);
        handle.clear();
        assert!(sink.is_empty());
    }

    #[rstest]
    fn test_memory_sink_reads_back(sink: MemorySink) {
        sink.write(vec![Value::Int(1), Value::Int(2)]).unwrap();
        let read: Vec<Value> = sink.read().unwrap().map(Result::unwrap).collect();
        assert_eq!(read, vec![Value::Int(1), Value::Int(2)]);
    }

    #[rstest]
    #[case(Value::Nil, vec![])]
    #[case(Value::from("line\n"), vec![Value::from("line\n")])]
    #[case(Value::from_iter([1, 2]), vec![Value::Int(1), Value::Int(2)])]
    fn test_records_of(#[case] input: Value, #[case] expected: Vec<Value>) {
        assert_eq!(records_of(&input).unwrap(), expected);
    }

    #[rstest]
    fn test_records_of_rejects_scalars() {
        assert!(records_of(&Value::Int(3)).is_err());
    }

    #[rstest]
    fn test_redirect_returns_identifier(sink: MemorySink) {
        let result = (Value::from_iter([1, 2, 3]) | P | crate::builtins::reversed())
            .redirect(sink.clone())
            .unwrap();
        assert_eq!(result, Value::from("memory"));
        assert_eq!(sink.records(), vec![Value::Int(3), Value::Int(2), Value::Int(1)]);
    }

    #[rstest]
    fn test_tee_passes_value_through(sink: MemorySink) {
        let chain = (P | X.get(0)).tee(sink.clone()) | crate::builtins::len();
        let nested = Value::List(vec![Value::from_iter([7, 8])]);
        assert_eq!(chain.evaluate(nested).unwrap(), Value::Int(2));
        assert_eq!(sink.records(), vec![Value::Int(7), Value::Int(8)]);
    }

    #[rstest]
    fn test_source_stage_ignores_input(sink: MemorySink) {
        sink.write(vec![Value::from("x")]).unwrap();
        let chain = P | SourceStage::new(sink);
        assert_eq!(chain.evaluate(Value::Int(0)).unwrap(), Value::from_iter(["x"]));
    }

    #[rstest]
    fn test_stage_names(sink: MemorySink) {
        let chain = P | Tee::new(sink.clone()) | SinkStage::new(sink);
        assert_eq!(chain.to_string(), r#"[P: tee("memory") -> write("memory") ]"#);
    }

    #[rstest]
    #[case("r", Some(Mode::Read))]
    #[case("w", Some(Mode::Write))]
    #[case("a", Some(Mode::Append))]
    #[case("x", None)]
    fn test_mode_from_flag(#[case] flag: &str, #[case] expected: Option<Mode>) {
        assert_eq!(Mode::from_flag(flag), expected);
    }

    #[rstest]
    fn test_later_registration_wins() {
        let mut registry = FileRegistry::default();
        registry.register(FileType::text_with_extension("log", "log"));
        assert_eq!(registry.resolve(Path::new("a.log")).map(FileType::name), Some("log"));
        assert_eq!(registry.resolve(Path::new("a.txt")).map(FileType::name), Some("text"));
        assert_eq!(registry.resolve(Path::new("a.txt.gz")).map(FileType::name), Some("gzip"));
    }

    #[rstest]
    fn test_unregister_removes_latest_with_name() {
        let mut registry = FileRegistry::default();
        registry.register(FileType::text_with_extension("text", "txt"));
        let removed = registry.unregister("text").unwrap();
        assert!(!removed.matches(Path::new("a.csv")));
        assert_eq!(registry.names(), vec!["text", "gzip"]);
        assert!(registry.unregister("missing").is_none());
    }

    #[rstest]
    fn test_open_without_matching_type() {
        let error = FileRegistry::empty().open("a.txt", Mode::Read).unwrap_err();
        assert!(matches!(error, Error::UnknownFileType { path } if path == "a.txt"));
    }

    #[rstest]
    fn test_write_in_read_mode_is_rejected() {
        let file = CallableFile::open("never-written.txt", Mode::Read).unwrap();
        let error = file.write(vec![Value::from("x")]).unwrap_err();
        assert!(matches!(error, Error::Io(_)));
    }
}
