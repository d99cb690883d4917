//! Drive a command stream: receive records and hand them to a dispatcher.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::info;

use crate::config::StreamConfig;
use crate::error::StreamResult;
use crate::handle::AccessMode;
use crate::record::Record;
use crate::selector::open_stream;
use crate::stream::{ObjectStream, RecordStream};

/// Receives one decoded command at a time and executes it.
///
/// The returned text describes the outcome and is only logged.
pub trait CommandDispatcher {
    fn execute(&mut self, command: Record) -> String;
}

impl<F> CommandDispatcher for F
where
    F: FnMut(Record) -> String,
{
    fn execute(&mut self, command: Record) -> String {
        self(command)
    }
}

/// A read stream of commands.
pub struct CommandChannel {
    stream: ObjectStream,
}

impl CommandChannel {
    /// Open `location` for reading.
    pub fn open(location: &str, config: &StreamConfig) -> StreamResult<Self> {
        Ok(Self::from_stream(open_stream(location, AccessMode::Read, config)?))
    }

    pub fn from_stream(stream: ObjectStream) -> Self {
        Self { stream }
    }

    pub fn name(&self) -> &str {
        self.stream.name()
    }

    /// The next command.
    pub fn recv(&mut self) -> StreamResult<Record> {
        self.stream.get()
    }

    /// Execute commands until the stream ends or `keep_running` is cleared.
    ///
    /// The flag is checked between commands only; a `recv` blocked on an
    /// idle FIFO is not interrupted. Returns the number of commands executed.
    /// The stream is closed on every exit path.
    pub fn run<D>(mut self, keep_running: &AtomicBool, dispatcher: &mut D) -> StreamResult<usize>
    where
        D: CommandDispatcher + ?Sized,
    {
        let mut executed = 0;
        while keep_running.load(Ordering::SeqCst) {
            let command = match self.recv() {
                Ok(command) => command,
                Err(e) if e.is_exhausted() => {
                    info!(name = self.name(), "command stream end");
                    break;
                }
                Err(e) => return Err(e),
            };
            let result = dispatcher.execute(command);
            executed += 1;
            info!(name = self.name(), %result, "command execution complete");
        }
        self.stream.close()?;
        Ok(executed)
    }
}
