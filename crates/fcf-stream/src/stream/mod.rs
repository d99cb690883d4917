//! Object streams: records in, records out, over one owned handle.
//!
//! Two framings exist and no third is expected, so [`ObjectStream`] is a
//! closed enum over them. Both variants also implement [`RecordStream`] on
//! their own for callers that build them directly from a [`StreamHandle`].
//!
//! [`StreamHandle`]: crate::handle::StreamHandle

pub mod array;
pub mod concatenated;

pub use array::WrappedArrayStream;
pub use concatenated::ConcatenatedStream;

use crate::error::StreamResult;
use crate::location::Framing;
use crate::record::Record;

/// The get/put/flush contract shared by every framing.
pub trait RecordStream {
    /// Name of the underlying resource.
    fn name(&self) -> &str;

    /// Next decoded record.
    ///
    /// Fails with `StreamExhausted` at a clean end, `StreamCorrupt` on bytes
    /// that are not a map record, and `Internal` on a bad handle.
    fn get(&mut self) -> StreamResult<Record>;

    /// Encode one record, writing or buffering it.
    fn put(&mut self, record: Record) -> StreamResult<()>;

    /// Write out anything buffered. Streams that never buffer do nothing.
    fn flush(&mut self) -> StreamResult<()> {
        Ok(())
    }
}

/// A stream in one of the two supported framings.
pub enum ObjectStream {
    Concatenated(ConcatenatedStream),
    Array(WrappedArrayStream),
}

impl ObjectStream {
    pub fn framing(&self) -> Framing {
        match self {
            Self::Concatenated(_) => Framing::Concatenated,
            Self::Array(_) => Framing::Array,
        }
    }

    /// Flush buffered records and release the handle, reporting any failure
    /// that an implicit flush on drop could only log. A failed flush discards
    /// the buffer, so the drop that follows does not retry it.
    pub fn close(mut self) -> StreamResult<()> {
        self.flush()
    }
}

impl RecordStream for ObjectStream {
    fn name(&self) -> &str {
        match self {
            Self::Concatenated(s) => s.name(),
            Self::Array(s) => s.name(),
        }
    }

    fn get(&mut self) -> StreamResult<Record> {
        match self {
            Self::Concatenated(s) => s.get(),
            Self::Array(s) => s.get(),
        }
    }

    fn put(&mut self, record: Record) -> StreamResult<()> {
        match self {
            Self::Concatenated(s) => s.put(record),
            Self::Array(s) => s.put(record),
        }
    }

    fn flush(&mut self) -> StreamResult<()> {
        match self {
            Self::Concatenated(s) => s.flush(),
            Self::Array(s) => s.flush(),
        }
    }
}

impl From<ConcatenatedStream> for ObjectStream {
    fn from(s: ConcatenatedStream) -> Self {
        Self::Concatenated(s)
    }
}

impl From<WrappedArrayStream> for ObjectStream {
    fn from(s: WrappedArrayStream) -> Self {
        Self::Array(s)
    }
}
