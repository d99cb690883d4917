//! Records as the elements of one JSON array.
//!
//! Read mode slurps the whole input at construction and drains it front to
//! back. Write mode buffers until [`flush`](RecordStream::flush); each flush
//! writes one independent array, so a single-document output needs exactly
//! one flush, normally the implicit one at teardown.

use std::collections::VecDeque;
use std::io::{self, Write};

use serde_json::Value;
use tracing::{debug, error, info};

use crate::error::{StreamError, StreamResult};
use crate::handle::{AccessMode, StreamHandle};
use crate::record::{into_record, value_kind, Record};
use crate::stream::RecordStream;

/// Container framing over one handle.
pub struct WrappedArrayStream {
    handle: StreamHandle,
    buffer: VecDeque<Value>,
}

impl WrappedArrayStream {
    /// Wrap `handle`. A read handle is decoded in full right away; anything
    /// other than a single well-formed array is a `StreamCorrupt` here.
    pub fn new(handle: StreamHandle) -> StreamResult<Self> {
        let mut stream = Self {
            handle,
            buffer: VecDeque::new(),
        };
        if stream.handle.mode() == AccessMode::Read {
            stream.slurp()?;
        }
        Ok(stream)
    }

    /// Records still buffered: unread input, or unflushed output.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn slurp(&mut self) -> StreamResult<()> {
        let reader = self.handle.reader()?;
        let value: Value = match serde_json::from_reader(reader) {
            Ok(value) => value,
            Err(e) if e.is_io() => {
                self.handle.mark_failed();
                return Err(StreamError::internal(self.handle.name(), e));
            }
            Err(e) => {
                self.handle.mark_failed();
                return Err(StreamError::corrupt(self.handle.name(), e));
            }
        };
        match value {
            Value::Array(items) => {
                debug!(name = self.handle.name(), records = items.len(), "slurped array");
                self.buffer = items.into();
                Ok(())
            }
            other => Err(StreamError::corrupt(
                self.handle.name(),
                format!("want: array, got: {}", value_kind(&other)),
            )),
        }
    }
}

impl RecordStream for WrappedArrayStream {
    fn name(&self) -> &str {
        self.handle.name()
    }

    fn get(&mut self) -> StreamResult<Record> {
        if self.handle.mode() != AccessMode::Read {
            return Err(StreamError::internal(self.handle.name(), "not open for reading"));
        }
        match self.buffer.pop_front() {
            Some(value) => into_record(self.handle.name(), value),
            None => {
                info!(name = self.handle.name(), "array end");
                Err(StreamError::exhausted(self.handle.name(), "array end"))
            }
        }
    }

    fn put(&mut self, record: Record) -> StreamResult<()> {
        self.handle.writer()?;
        self.buffer.push_back(Value::Object(record));
        Ok(())
    }

    fn flush(&mut self) -> StreamResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let writer = self.handle.writer()?;
        let written = serde_json::to_writer(&mut *writer, &self.buffer)
            .map_err(io::Error::from)
            .and_then(|()| writer.flush());
        if let Err(e) = written {
            // The handle is unusable from here on, so the records cannot be
            // retried; the error returned here is their only report.
            self.handle.mark_failed();
            self.buffer.clear();
            return Err(StreamError::internal(self.handle.name(), e));
        }
        debug!(name = self.handle.name(), records = self.buffer.len(), "flushed array");
        self.buffer.clear();
        Ok(())
    }
}

impl Drop for WrappedArrayStream {
    fn drop(&mut self) {
        if self.handle.mode() != AccessMode::Write || self.buffer.is_empty() {
            return;
        }
        if let Err(e) = self.flush() {
            error!(
                name = self.handle.name(),
                records = self.buffer.len(),
                error = %e,
                "final flush failed; buffered records dropped"
            );
        }
    }
}
