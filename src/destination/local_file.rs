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

use std::fs;
use std::fs::File;
use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use jiff::SignedDuration;
use jiff::Timestamp;

use crate::Error;
use crate::ErrorKind;
use crate::config::AutoRotateConfig;
use crate::destination::LogStore;

/// A [`LogStore`] writing to a local file, rotated out after a fixed interval.
///
/// Rotated files are archived next to the live one as `<filename>.<unix millis>`; only the newest
/// [`AutoRotateConfig::max_archived_files`] archives are kept.
#[derive(Debug)]
pub struct LocalFile {
    log_dir: PathBuf,
    filename: String,
    writer: Option<File>,
    opened_at: Timestamp,
    rotate_after: Duration,
    max_archived_files: usize,
    clock: Clock,
}

impl LocalFile {
    /// Open or create `filename` in `dir`, creating the directory if needed.
    pub fn new(
        dir: impl AsRef<Path>,
        filename: impl Into<String>,
        auto_rotate: AutoRotateConfig,
    ) -> Result<LocalFile, Error> {
        Self::with_clock(dir, filename, auto_rotate, Clock::DefaultClock)
    }

    fn with_clock(
        dir: impl AsRef<Path>,
        filename: impl Into<String>,
        auto_rotate: AutoRotateConfig,
        clock: Clock,
    ) -> Result<LocalFile, Error> {
        let filename = filename.into();
        if filename.is_empty() {
            return Err(Error::new("filename must not be empty"));
        }

        let log_dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&log_dir).map_err(|err| {
            Error::new("failed to create log directory")
                .with_kind(ErrorKind::FileWrite)
                .with_context("path", log_dir.display())
                .with_source(err)
        })?;

        let mut store = LocalFile {
            log_dir,
            filename,
            writer: None,
            opened_at: clock.now(),
            rotate_after: auto_rotate.rotate_after,
            max_archived_files: auto_rotate.max_archived_files,
            clock,
        };

        // continue an existing file from its last modification
        if let Ok(mtime) = fs::metadata(store.current_path()).and_then(|m| m.modified()) {
            if let Ok(mtime) = Timestamp::try_from(mtime) {
                store.opened_at = mtime;
            }
        }
        store.writer = Some(store.open_writer()?);
        Ok(store)
    }

    /// The path of the live log file.
    pub fn current_path(&self) -> PathBuf {
        self.log_dir.join(&self.filename)
    }

    fn open_writer(&self) -> Result<File, Error> {
        let path = self.current_path();
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|err| {
                Error::new("failed to open log file")
                    .with_kind(ErrorKind::FileWrite)
                    .with_context("path", path.display())
                    .with_source(err)
            })
    }

    // the first unused `<filename>.<millis>` at or after `now`, so that archives keep their order
    fn archive_path(&self, now: Timestamp) -> PathBuf {
        let mut millis = now.as_millisecond();
        loop {
            let path = self.log_dir.join(format!("{}.{millis}", self.filename));
            if !path.exists() {
                return path;
            }
            millis += 1;
        }
    }

    // oldest first
    fn list_archives(&self) -> io::Result<Vec<(i64, PathBuf)>> {
        let prefix = format!("{}.", self.filename);
        let mut archives = fs::read_dir(&self.log_dir)?
            .filter_map(|entry| {
                let entry = entry.ok()?;
                if !entry.file_type().ok()?.is_file() {
                    return None;
                }

                let filename = entry.file_name();
                let millis = filename.to_str()?.strip_prefix(&prefix)?;
                let millis = millis.parse::<i64>().ok()?;
                Some((millis, entry.path()))
            })
            .collect::<Vec<_>>();
        archives.sort();
        Ok(archives)
    }

    fn delete_oldest_archives(&self) -> io::Result<()> {
        let archives = self.list_archives()?;
        let excess = archives.len().saturating_sub(self.max_archived_files);
        for (_, path) in archives.iter().take(excess) {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn rotate(&mut self, now: Timestamp) -> Result<(), Error> {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }

        let current = self.current_path();
        let archive = self.archive_path(now);
        let renamed = match fs::exists(&current) {
            Ok(true) => fs::rename(&current, &archive),
            Ok(false) => Ok(()),
            Err(err) => Err(err),
        };

        // the live file is reopened either way, so that writing continues
        let reopened = self.open_writer().map(|writer| self.writer = Some(writer));

        renamed.map_err(|err| {
            Error::new("failed to archive log file")
                .with_kind(ErrorKind::FileRotation)
                .with_context("path", current.display())
                .with_source(err)
        })?;
        reopened?;

        self.delete_oldest_archives().map_err(|err| {
            Error::new("failed to delete oldest log files")
                .with_kind(ErrorKind::FileRotation)
                .with_source(err)
        })
    }
}

impl LogStore for LocalFile {
    fn append(&mut self, bytes: &[u8]) -> Result<(), Error> {
        if self.writer.is_none() {
            self.opened_at = self.clock.now();
            self.writer = Some(self.open_writer()?);
        }

        match self.writer.as_mut() {
            Some(writer) => writer.write_all(bytes).map_err(|err| {
                Error::new("failed to write log file")
                    .with_kind(ErrorKind::FileWrite)
                    .with_source(err)
            }),
            None => Err(Error::new("log file is not open").with_kind(ErrorKind::FileWrite)),
        }
    }

    fn rotate_if_due(&mut self) -> Result<(), Error> {
        let now = self.clock.now();
        let elapsed = now.duration_since(self.opened_at);
        let rotate_after = SignedDuration::try_from(self.rotate_after).unwrap_or(SignedDuration::MAX);
        if elapsed < rotate_after {
            return Ok(());
        }

        // the interval restarts even if rotating fails, so that failures are not retried per line
        self.opened_at = now;
        self.rotate(now)
    }

    fn read_all(&mut self) -> Result<Vec<u8>, Error> {
        self.flush()?;
        let path = self.current_path();
        fs::read(&path).map_err(|err| {
            Error::new("failed to read log file")
                .with_kind(ErrorKind::FileRead)
                .with_context("path", path.display())
                .with_source(err)
        })
    }

    fn delete(&mut self) -> Result<(), Error> {
        self.writer = None;
        let path = self.current_path();
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::new("failed to delete log file")
                .with_kind(ErrorKind::FileRead)
                .with_context("path", path.display())
                .with_source(err)),
        }
    }

    fn flush(&mut self) -> Result<(), Error> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush().map_err(|err| {
                Error::new("failed to flush log file")
                    .with_kind(ErrorKind::FileWrite)
                    .with_source(err)
            }),
            None => Ok(()),
        }
    }
}

impl Drop for LocalFile {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            let _ = writer.flush();
        }
    }
}

#[derive(Debug)]
enum Clock {
    DefaultClock,
    #[cfg(test)]
    ManualClock(ManualClock),
}

impl Clock {
    fn now(&self) -> Timestamp {
        match self {
            Clock::DefaultClock => Timestamp::now(),
            #[cfg(test)]
            Clock::ManualClock(clock) => clock.now(),
        }
    }

    #[cfg(test)]
    fn set_now(&mut self, new_time: Timestamp) {
        if let Clock::ManualClock(clock) = self {
            clock.set_now(new_time);
        }
    }
}

/// The time could be reset.
#[derive(Debug)]
#[cfg(test)]
struct ManualClock {
    now: Timestamp,
}

#[cfg(test)]
impl ManualClock {
    fn new(now: Timestamp) -> ManualClock {
        ManualClock { now }
    }

    fn now(&self) -> Timestamp {
        self.now
    }

    fn set_now(&mut self, now: Timestamp) {
        self.now = now;
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use jiff::ToSpan;
    use rand::Rng;
    use rand::distr::Alphanumeric;
    use tempfile::TempDir;

    use super::*;

    fn generate_random_line() -> String {
        let mut rng = rand::rng();
        let len = rng.random_range(50..=100);
        let mut line: String = std::iter::repeat(())
            .map(|()| rng.sample(Alphanumeric))
            .map(char::from)
            .take(len)
            .collect();
        line.push('\n');
        line
    }

    fn store(dir: &TempDir, max_archived_files: usize, start: Timestamp) -> LocalFile {
        let auto_rotate = AutoRotateConfig {
            rotate_after: Duration::from_secs(600),
            max_archived_files,
        };
        LocalFile::with_clock(
            dir.path(),
            "steamclog.txt",
            auto_rotate,
            Clock::ManualClock(ManualClock::new(start)),
        )
        .unwrap()
    }

    #[test]
    fn test_no_rotation_before_interval() {
        let dir = TempDir::new().unwrap();
        let start = Timestamp::from_str("2024-08-10T00:00:00Z").unwrap();
        let mut store = store(&dir, 3, start);

        let mut expected = String::new();
        for minute in 0..10 {
            store.clock.set_now(start + minute.minutes());
            store.rotate_if_due().unwrap();

            let line = generate_random_line();
            store.append(line.as_bytes()).unwrap();
            expected.push_str(&line);
        }

        assert_eq!(store.read_all().unwrap(), expected.into_bytes());
        assert!(store.list_archives().unwrap().is_empty());
    }

    #[test]
    fn test_rotation_archives_and_prunes() {
        let max_archived_files = 3;
        let dir = TempDir::new().unwrap();
        let start = Timestamp::from_str("2024-08-10T00:00:00Z").unwrap();
        let mut store = store(&dir, max_archived_files, start);

        for i in 1..=(max_archived_files * 2) {
            store.append(generate_random_line().as_bytes()).unwrap();

            let now = start + (i as i64 * 10).minutes();
            store.clock.set_now(now);
            store.rotate_if_due().unwrap();

            let last_line = generate_random_line();
            store.append(last_line.as_bytes()).unwrap();
            assert_eq!(store.read_all().unwrap(), last_line.as_bytes());

            let archives = store.list_archives().unwrap();
            assert_eq!(archives.len(), i.min(max_archived_files));
            let newest = archives.last().unwrap();
            assert_eq!(newest.0, now.as_millisecond());
        }

        // one live file besides the archives
        assert_eq!(
            fs::read_dir(dir.path()).unwrap().count(),
            max_archived_files + 1
        );
    }

    #[test]
    fn test_rotations_in_the_same_millisecond_keep_both_archives() {
        let dir = TempDir::new().unwrap();
        let now = Timestamp::from_str("2024-08-10T00:00:00Z").unwrap();
        let mut store = store(&dir, 3, now);

        store.append(b"first\n").unwrap();
        store.rotate(now).unwrap();
        store.append(b"second\n").unwrap();
        store.rotate(now).unwrap();

        let archives = store.list_archives().unwrap();
        assert_eq!(archives.len(), 2);
        assert_eq!(archives[0].0, now.as_millisecond());
        assert_eq!(archives[1].0, now.as_millisecond() + 1);
        assert_eq!(fs::read(&archives[0].1).unwrap(), b"first\n");
        assert_eq!(fs::read(&archives[1].1).unwrap(), b"second\n");
    }

    #[test]
    fn test_delete_then_append_recreates() {
        let dir = TempDir::new().unwrap();
        let start = Timestamp::from_str("2024-08-10T00:00:00Z").unwrap();
        let mut store = store(&dir, 3, start);

        store.append(b"before\n").unwrap();
        store.delete().unwrap();
        assert!(!store.current_path().exists());
        assert_eq!(store.read_all().unwrap_err().kind(), ErrorKind::FileRead);

        store.append(b"after\n").unwrap();
        assert_eq!(store.read_all().unwrap(), b"after\n");
    }

    #[test]
    fn test_empty_filename_is_rejected() {
        let dir = TempDir::new().unwrap();
        assert!(LocalFile::new(dir.path(), "", AutoRotateConfig::default()).is_err());
    }
}
