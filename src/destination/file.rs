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

use std::fmt;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use crate::Error;
use crate::ErrorKind;
use crate::destination::Destination;
use crate::destination::DestinationKind;
use crate::destination::DispatchMode;
use crate::layout::FileLayout;
use crate::layout::Layout;
use crate::record::Record;

/// The storage behind a [`FileDestination`].
///
/// Calls are serialized by the destination; implementations need no locking of their own.
pub trait LogStore: fmt::Debug + Send + 'static {
    /// Append bytes to the live log file.
    fn append(&mut self, bytes: &[u8]) -> Result<(), Error>;

    /// Rotate the live log file out if it has been written to for long enough.
    fn rotate_if_due(&mut self) -> Result<(), Error>;

    /// Read the whole live log file.
    fn read_all(&mut self) -> Result<Vec<u8>, Error>;

    /// Delete the live log file.
    fn delete(&mut self) -> Result<(), Error>;

    /// Flush buffered bytes.
    ///
    /// Default to a no-op.
    fn flush(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

/// A destination appending log records to a rotating log file.
///
/// Records are written on a dedicated worker thread, the single writer of the store.
///
/// # Examples
///
/// ```no_run
/// use steamclog::config::AutoRotateConfig;
/// use steamclog::destination::FileDestination;
/// use steamclog::destination::LocalFile;
///
/// let store = LocalFile::new("logs", "steamclog.txt", AutoRotateConfig::default()).unwrap();
/// let file = FileDestination::new(store);
/// ```
#[derive(Debug)]
pub struct FileDestination {
    store: Mutex<Box<dyn LogStore>>,
    layout: Box<dyn Layout>,
}

impl FileDestination {
    /// Create a file destination writing to the given store with [`FileLayout`].
    pub fn new(store: impl LogStore) -> Self {
        Self {
            store: Mutex::new(Box::new(store)),
            layout: Box::new(FileLayout::default()),
        }
    }

    /// Set the layout. Default to [`FileLayout`].
    pub fn with_layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }

    fn store(&self) -> MutexGuard<'_, Box<dyn LogStore>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Destination for FileDestination {
    fn kind(&self) -> DestinationKind {
        DestinationKind::File
    }

    fn dispatch_mode(&self) -> DispatchMode {
        DispatchMode::Worker
    }

    fn emit(&self, record: &Record) -> Result<(), Error> {
        let mut bytes = self.layout.format(record)?;
        bytes.push(b'\n');

        let mut store = self.store();
        // a failed rotation must not lose the record
        let rotated = store.rotate_if_due();
        store.append(&bytes)?;
        rotated.map_err(|err| {
            Error::new("failed to rotate log file")
                .with_kind(ErrorKind::FileRotation)
                .with_source(err)
        })
    }

    fn flush(&self) -> Result<(), Error> {
        self.store().flush()
    }

    fn read_back(&self) -> Result<Option<String>, Error> {
        let mut store = self.store();
        store.flush()?;
        let bytes = store.read_all()?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }

    fn delete_contents(&self) -> Result<(), Error> {
        self.store().delete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LogLevel;

    #[derive(Debug, Default)]
    struct MemoryStore {
        bytes: Vec<u8>,
        fail_rotation: bool,
    }

    impl LogStore for MemoryStore {
        fn append(&mut self, bytes: &[u8]) -> Result<(), Error> {
            self.bytes.extend_from_slice(bytes);
            Ok(())
        }

        fn rotate_if_due(&mut self) -> Result<(), Error> {
            if self.fail_rotation {
                return Err(Error::new("read-only file system"));
            }
            Ok(())
        }

        fn read_all(&mut self) -> Result<Vec<u8>, Error> {
            Ok(self.bytes.clone())
        }

        fn delete(&mut self) -> Result<(), Error> {
            self.bytes.clear();
            Ok(())
        }
    }

    fn record(payload: &str) -> Record {
        Record::builder()
            .level(LogLevel::Info)
            .target("steamclog")
            .payload(payload)
            .build()
    }

    #[test]
    fn test_lines_are_read_back() {
        let file = FileDestination::new(MemoryStore::default());
        file.emit(&record("first")).unwrap();
        file.emit(&record("second")).unwrap();

        let contents = file.read_back().unwrap().unwrap();
        let lines = contents.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("> first"));
        assert!(lines[1].ends_with("> second"));

        file.delete_contents().unwrap();
        assert_eq!(file.read_back().unwrap().unwrap(), "");
    }

    #[test]
    fn test_rotation_failure_keeps_the_record() {
        let file = FileDestination::new(MemoryStore {
            fail_rotation: true,
            ..Default::default()
        });

        let err = file.emit(&record("kept")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileRotation);
        assert!(file.read_back().unwrap().unwrap().contains("kept"));
    }
}
