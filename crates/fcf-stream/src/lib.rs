//! Object streams over local files and named pipes.
//!
//! Turns a byte-oriented file handle into a sequence of map-rooted JSON
//! records, read one at a time by a command consumer or written one at a
//! time by a producer.
//!
//! # Framings
//!
//! - [`ConcatenatedStream`] (`jstream`) -- records back to back, decoded one
//!   at a time. A FIFO source is reopened at end of data so it can serve as
//!   a long-lived command channel.
//! - [`WrappedArrayStream`] (`json`) -- records inside one array, read in
//!   full up front or buffered until flush.
//!
//! # Entry points
//!
//! - [`open_stream`] resolves a location such as `cmds.json` or
//!   `file:///tmp/cmds.fifo?fmt=jstream` and opens the matching framing.
//! - [`CommandChannel`] runs a dispatcher over a read stream until it ends.
//!
//! # Rules
//!
//! 1. One stream exclusively owns one handle; neither is `Clone`.
//! 2. Every record handed out is a JSON object; anything else is corruption.
//! 3. Only the local file scheme is supported.
//! 4. Buffered output is flushed before the handle closes.

pub mod channel;
pub mod config;
pub mod error;
pub mod handle;
pub mod location;
pub mod record;
pub mod selector;
pub mod stream;

pub use channel::{CommandChannel, CommandDispatcher};
pub use config::{StreamConfig, WriteMode};
pub use error::{StreamError, StreamResult};
pub use handle::{AccessMode, HandleState, StreamHandle};
pub use location::{Framing, Location};
pub use record::Record;
pub use selector::{open_location, open_stream, SourceDescriptor};
pub use stream::{ConcatenatedStream, ObjectStream, RecordStream, WrappedArrayStream};
