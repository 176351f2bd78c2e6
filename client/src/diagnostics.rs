//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Diagnostics sinks for the debug trace and the error records
//!
//! A [`Sink`] is an append-only message store whose [`SinkDestination`]
//! decides what happens on `save`: nothing, an in-memory buffer, a line on
//! standard output, or a line appended to a file. [`Diagnostics`] pairs a
//! debug sink with an error sink behind a shared handle, so the executor and
//! its backend write to the same place.

use crate::{ErrorRecord, SinkDestination};
use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, warn};

/// Which diagnostics buffers to re-initialise
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BufferKind {
    /// Both the debug and the error sink
    #[default]
    All,
    /// Only the error sink
    Error,
    /// Only the debug sink
    Debug,
}

/// Append-only message store
///
/// File destinations are written line by line and mirrored in memory, so
/// [`Sink::messages`] answers for both `buffer` and `file:` destinations.
/// `discard` and `console` keep nothing.
#[derive(Debug)]
pub struct Sink<M> {
    destination: SinkDestination,
    buffer: Vec<M>,
}

impl<M: Clone + Display> Sink<M> {
    /// Creates a sink and initialises its destination.
    pub fn new(destination: SinkDestination) -> Self {
        let mut sink = Sink {
            destination,
            buffer: Vec::new(),
        };
        sink.reinit();
        sink
    }

    /// The configured destination
    pub fn destination(&self) -> &SinkDestination {
        &self.destination
    }

    /// Empties the buffer and truncates a file destination.
    pub fn reinit(&mut self) {
        self.buffer.clear();
        if let SinkDestination::File(path) = &self.destination {
            if let Err(err) = File::create(path) {
                warn!("Failed to truncate diagnostics file {}: {}", path.display(), err);
            }
        }
    }

    /// Stores one message according to the destination.
    pub fn save(&mut self, message: M) {
        match &self.destination {
            SinkDestination::Discard => {}
            SinkDestination::Buffer => self.buffer.push(message),
            SinkDestination::Console => println!("{message}"),
            SinkDestination::File(path) => {
                let written = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .and_then(|mut file| writeln!(file, "{message}"));
                if let Err(err) = written {
                    warn!("Failed to append to diagnostics file {}: {}", path.display(), err);
                }
                self.buffer.push(message);
            }
        }
    }

    /// All stored messages, oldest first
    pub fn messages(&self) -> &[M] {
        &self.buffer
    }

    /// The most recent message, if any
    pub fn last_message(&self) -> Option<&M> {
        self.buffer.last()
    }
}

#[derive(Debug)]
struct DiagnosticsInner {
    debug: Sink<String>,
    error: Sink<ErrorRecord>,
}

/// Shared handle to the debug and error sinks of one executor.
///
/// Cloning the handle shares the sinks.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    inner: Arc<Mutex<DiagnosticsInner>>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Diagnostics::new(SinkDestination::Buffer, SinkDestination::Buffer)
    }
}

impl Diagnostics {
    /// Creates both sinks with the given destinations.
    pub fn new(debug: SinkDestination, error: SinkDestination) -> Self {
        Diagnostics {
            inner: Arc::new(Mutex::new(DiagnosticsInner {
                debug: Sink::new(debug),
                error: Sink::new(error),
            })),
        }
    }

    /// Points each sink at a new destination. A sink whose destination is
    /// unchanged keeps its messages.
    pub fn reconfigure(&self, debug: SinkDestination, error: SinkDestination) {
        let mut inner = self.lock();
        if inner.debug.destination() != &debug {
            inner.debug = Sink::new(debug);
        }
        if inner.error.destination() != &error {
            inner.error = Sink::new(error);
        }
    }

    /// Saves `source : message` to the debug sink.
    pub fn debug(&self, source: &str, message: impl Display) {
        let line = format!("{source} : {message}");
        debug!("{}", line);
        self.lock().debug.save(line);
    }

    /// Saves the record to the error sink and an `ERROR:` line to the debug sink.
    pub fn error(&self, record: ErrorRecord) {
        error!("{}", record);
        let mut inner = self.lock();
        inner
            .debug
            .save(format!("{} : ERROR: {}", record.source, record.message));
        inner.error.save(record);
    }

    /// Debug trace, oldest first
    pub fn debug_messages(&self) -> Vec<String> {
        self.lock().debug.messages().to_vec()
    }

    /// Error records, oldest first
    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.lock().error.messages().to_vec()
    }

    /// The most recent error record
    pub fn last_error(&self) -> Option<ErrorRecord> {
        self.lock().error.last_message().cloned()
    }

    /// Re-initialises the chosen sinks.
    pub fn clear(&self, kind: BufferKind) {
        let mut inner = self.lock();
        if matches!(kind, BufferKind::All | BufferKind::Error) {
            inner.error.reinit();
        }
        if matches!(kind, BufferKind::All | BufferKind::Debug) {
            inner.debug.reinit();
        }
    }

    fn lock(&self) -> MutexGuard<'_, DiagnosticsInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
