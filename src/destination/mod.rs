// Copyright 2024 FastLabs Developers
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Destinations receiving dispatched log records.

use std::fmt;

use crate::Error;
use crate::record::Record;

mod console;
mod file;
mod local_file;
mod remote;
mod testing;

pub use self::console::Console;
pub use self::console::ConsoleChannel;
pub use self::file::FileDestination;
pub use self::file::LogStore;
pub use self::local_file::LocalFile;
pub use self::remote::Remote;
pub use self::remote::ROTATION_FAILED_MESSAGE;
pub use self::remote::RemoteBackend;
pub use self::testing::Testing;

/// The kinds of destination a [`LogLevelPreset`](crate::LogLevelPreset) derives thresholds for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DestinationKind {
    /// The console or system log.
    Console,
    /// The rotating log file.
    File,
    /// The remote crash and error reporting backend.
    Remote,
    /// Any other destination; it needs an explicit threshold.
    Other,
}

/// How the facade hands records to a destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DispatchMode {
    /// Emit on the calling thread.
    Inline,
    /// Emit on a dedicated thread owned by the destination's slot.
    Worker,
}

/// Identifies an attached destination, see [`Steamclog::attach`](crate::Steamclog::attach).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DestinationId(pub(crate) u64);

/// A sink that can process log records.
///
/// Implementations never see records below their threshold: the facade filters before emitting.
pub trait Destination: fmt::Debug + Send + Sync + 'static {
    /// The kind of the destination, used to look up its threshold in the active preset.
    fn kind(&self) -> DestinationKind;

    /// How records are handed to the destination.
    ///
    /// Default to [`DispatchMode::Inline`].
    fn dispatch_mode(&self) -> DispatchMode {
        DispatchMode::Inline
    }

    /// Emit a log record.
    fn emit(&self, record: &Record) -> Result<(), Error>;

    /// Flush any buffered records.
    ///
    /// Default to a no-op.
    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Read back everything the destination has persisted, if it persists anything.
    ///
    /// Default to `Ok(None)`.
    fn read_back(&self) -> Result<Option<String>, Error> {
        Ok(None)
    }

    /// Delete everything the destination has persisted.
    ///
    /// Default to a no-op.
    fn delete_contents(&self) -> Result<(), Error> {
        Ok(())
    }
}

impl<T: Destination> From<T> for Box<dyn Destination> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}
