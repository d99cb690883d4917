//! Exclusive ownership of one open file plus its health state.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};

use tracing::{debug, info};

use crate::config::WriteMode;
use crate::error::{StreamError, StreamResult};

/// Direction a stream is opened in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    Write,
}

/// Health of a handle, checked before every read or write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleState {
    Good,
    /// Natural end reached and no recovery applies.
    Eof,
    /// I/O failure or undecodable bytes. Terminal.
    Failed,
}

enum Io {
    Read(BufReader<File>),
    Write(BufWriter<File>),
}

/// An open byte channel bound to a resource name.
///
/// Not `Clone`: exactly one stream owns a handle for its whole lifetime and
/// the file closes when the handle drops.
pub struct StreamHandle {
    name: String,
    io: Io,
    state: HandleState,
}

impl StreamHandle {
    /// Open `name` in the given direction.
    ///
    /// Reading opens an existing file, FIFO or character device read-only;
    /// anything else (a directory, say) is a `BadFile`. Writing creates the
    /// file if needed and either appends or truncates per `write_mode`.
    pub fn open(name: impl Into<String>, mode: AccessMode, write_mode: WriteMode) -> StreamResult<Self> {
        let name = name.into();
        let io = match mode {
            AccessMode::Read => {
                let file = File::open(&name).map_err(|e| StreamError::bad_file(&name, e))?;
                let meta = file
                    .metadata()
                    .map_err(|e| StreamError::bad_file(&name, format!("failed to stat: {e}")))?;
                if !is_readable_type(&meta) {
                    return Err(StreamError::bad_file(&name, "not a regular file or FIFO"));
                }
                Io::Read(BufReader::new(file))
            }
            AccessMode::Write => {
                let mut options = OpenOptions::new();
                options.create(true);
                match write_mode {
                    WriteMode::Append => options.append(true),
                    WriteMode::Truncate => options.write(true).truncate(true),
                };
                let file = options.open(&name).map_err(|e| StreamError::bad_file(&name, e))?;
                Io::Write(BufWriter::new(file))
            }
        };
        debug!(name = %name, ?mode, "opened stream handle");
        Ok(Self {
            name,
            io,
            state: HandleState::Good,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> AccessMode {
        match self.io {
            Io::Read(_) => AccessMode::Read,
            Io::Write(_) => AccessMode::Write,
        }
    }

    pub fn state(&self) -> HandleState {
        self.state
    }

    /// The reader, checked okay for reading.
    pub fn reader(&mut self) -> StreamResult<&mut BufReader<File>> {
        match self.state {
            HandleState::Eof => {
                info!(name = %self.name, "EOF");
                return Err(StreamError::exhausted(&self.name, "EOF"));
            }
            HandleState::Failed => {
                return Err(StreamError::internal(&self.name, "stream bad"));
            }
            HandleState::Good => {}
        }
        match &mut self.io {
            Io::Read(reader) => Ok(reader),
            Io::Write(_) => Err(StreamError::internal(&self.name, "not open for reading")),
        }
    }

    /// The writer, checked okay for writing.
    pub fn writer(&mut self) -> StreamResult<&mut BufWriter<File>> {
        if self.state == HandleState::Failed {
            return Err(StreamError::internal(&self.name, "stream bad"));
        }
        match &mut self.io {
            Io::Write(writer) => Ok(writer),
            Io::Read(_) => Err(StreamError::internal(&self.name, "not open for writing")),
        }
    }

    pub fn mark_eof(&mut self) {
        self.state = HandleState::Eof;
    }

    pub fn mark_failed(&mut self) {
        self.state = HandleState::Failed;
    }

    /// Close and reopen for reading from the start, clearing any end state.
    pub fn reopen(&mut self) -> StreamResult<()> {
        if self.mode() != AccessMode::Read {
            return Err(StreamError::internal(&self.name, "reopen requires a read handle"));
        }
        let file = File::open(&self.name).map_err(|e| {
            self.state = HandleState::Failed;
            StreamError::bad_file(&self.name, e)
        })?;
        self.io = Io::Read(BufReader::new(file));
        self.state = HandleState::Good;
        debug!(name = %self.name, "reopened stream handle");
        Ok(())
    }

    /// Push buffered bytes to the file. A no-op for read handles.
    pub fn flush(&mut self) -> StreamResult<()> {
        if let Io::Write(writer) = &mut self.io {
            if let Err(e) = writer.flush() {
                self.state = HandleState::Failed;
                return Err(StreamError::internal(&self.name, e));
            }
        }
        Ok(())
    }

    /// Whether the resource is a named pipe that can be reopened for more data.
    pub fn is_fifo(&self) -> StreamResult<bool> {
        is_fifo_path(&self.name)
    }
}

/// Stat `path` and report whether it names a FIFO.
pub fn is_fifo_path(path: &str) -> StreamResult<bool> {
    let meta = fs::metadata(path)
        .map_err(|e| StreamError::bad_file(path, format!("failed to stat: {e}")))?;
    Ok(is_fifo_type(&meta))
}

#[cfg(unix)]
fn is_fifo_type(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::FileTypeExt;
    meta.file_type().is_fifo()
}

#[cfg(not(unix))]
fn is_fifo_type(_meta: &fs::Metadata) -> bool {
    false
}

#[cfg(unix)]
fn is_readable_type(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::FileTypeExt;
    let ft = meta.file_type();
    ft.is_file() || ft.is_fifo() || ft.is_char_device()
}

#[cfg(not(unix))]
fn is_readable_type(meta: &fs::Metadata) -> bool {
    meta.is_file()
}
