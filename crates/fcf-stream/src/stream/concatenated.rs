//! Records as back-to-back JSON values with no enclosing container.
//!
//! See <https://en.wikipedia.org/wiki/JSON_streaming>. Each value delimits
//! itself, so a reader can resume at any value boundary. A named pipe is
//! *loop-eligible*: on a clean end the handle is reopened, which blocks
//! until the next writer connects, and decoding resumes.

use std::io::{self, Write};

use serde_json::{Deserializer, Value};
use tracing::{debug, info, warn};

use crate::error::{StreamError, StreamResult};
use crate::handle::{AccessMode, StreamHandle};
use crate::record::{into_record, Record};
use crate::stream::RecordStream;

/// Streaming framing over one handle.
pub struct ConcatenatedStream {
    handle: StreamHandle,
    loop_eligible: bool,
    reopen_limit: u32,
}

impl ConcatenatedStream {
    /// Wrap `handle`. A read handle naming a FIFO becomes loop-eligible and
    /// may reopen up to `reopen_limit` times within one `get()`.
    pub fn new(handle: StreamHandle, reopen_limit: u32) -> StreamResult<Self> {
        let loop_eligible = handle.mode() == AccessMode::Read && handle.is_fifo()?;
        debug!(name = handle.name(), loop_eligible, "concatenated stream");
        Ok(Self {
            handle,
            loop_eligible,
            reopen_limit,
        })
    }

    pub fn is_loop_eligible(&self) -> bool {
        self.loop_eligible
    }

    /// Decode at most one value from the current position.
    ///
    /// A fresh deserializer per call reads no further than the closing byte
    /// of an object, so nothing past a returned record is consumed. Numbers
    /// and literals are only delimited by the byte after them, which is lost.
    fn next_value(&mut self) -> StreamResult<Option<Result<Value, serde_json::Error>>> {
        let reader = self.handle.reader()?;
        Ok(Deserializer::from_reader(reader).into_iter::<Value>().next())
    }
}

impl RecordStream for ConcatenatedStream {
    fn name(&self) -> &str {
        self.handle.name()
    }

    fn get(&mut self) -> StreamResult<Record> {
        let mut reopens = 0;
        loop {
            match self.next_value()? {
                Some(Ok(value)) => {
                    // A bare scalar may have cost one byte of lookahead, so the
                    // read position can no longer be trusted.
                    let record = into_record(self.handle.name(), value);
                    if record.is_err() {
                        self.handle.mark_failed();
                    }
                    return record;
                }
                Some(Err(e)) if e.is_io() => {
                    self.handle.mark_failed();
                    return Err(StreamError::internal(self.handle.name(), e));
                }
                Some(Err(e)) => {
                    self.handle.mark_failed();
                    warn!(name = self.handle.name(), error = %e, "undecodable record");
                    return Err(StreamError::corrupt(self.handle.name(), e));
                }
                None if self.loop_eligible && reopens < self.reopen_limit => {
                    reopens += 1;
                    debug!(name = self.handle.name(), attempt = reopens, "end of data; reopening");
                    self.handle.reopen()?;
                }
                None => {
                    self.handle.mark_eof();
                    info!(name = self.handle.name(), "EOF");
                    return Err(StreamError::exhausted(self.handle.name(), "EOF"));
                }
            }
        }
    }

    fn put(&mut self, record: Record) -> StreamResult<()> {
        let writer = self.handle.writer()?;
        let written = serde_json::to_writer(&mut *writer, &record)
            .map_err(io::Error::from)
            .and_then(|()| writer.flush());
        if let Err(e) = written {
            self.handle.mark_failed();
            return Err(StreamError::internal(self.handle.name(), e));
        }
        Ok(())
    }
}
