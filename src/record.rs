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

//! Log events and their call-site metadata.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use jiff::Timestamp;

use crate::LogLevel;

/// The source location of a logging call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    module_path: Option<&'static str>,
    file: &'static str,
    line: u32,
}

impl Location {
    /// The location of the caller of the `#[track_caller]` function invoking this.
    #[track_caller]
    pub fn caller() -> Location {
        let location = std::panic::Location::caller();
        Location {
            module_path: None,
            file: location.file(),
            line: location.line(),
        }
    }

    /// Create a location from its parts.
    pub const fn new(module_path: Option<&'static str>, file: &'static str, line: u32) -> Self {
        Location {
            module_path,
            file,
            line,
        }
    }

    /// The module path of the call, if known.
    pub fn module_path(&self) -> Option<&'static str> {
        self.module_path
    }

    /// The source file containing the call.
    pub fn file(&self) -> &'static str {
        self.file
    }

    /// The filename of the source file.
    pub fn filename(&self) -> Cow<'static, str> {
        std::path::Path::new(self.file)
            .file_name()
            .map(std::ffi::OsStr::to_string_lossy)
            .unwrap_or_default()
    }

    /// The line containing the call.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// A human readable description of the call site, embedded in fatal crash messages.
    ///
    /// # Examples
    ///
    /// ```
    /// use steamclog::record::Location;
    ///
    /// let location = Location::new(Some("app::net"), "src/net/client.rs", 42);
    /// assert_eq!(location.describe(), "client.app::net - Line 42");
    ///
    /// let location = Location::new(None, "src/main.rs", 7);
    /// assert_eq!(location.describe(), "main - Line 7");
    /// ```
    pub fn describe(&self) -> String {
        let filename = self.filename();
        let stem = filename.strip_suffix(".rs").unwrap_or(filename.as_ref());
        match self.module_path {
            Some(module_path) => format!("{stem}.{module_path} - Line {}", self.line),
            None => format!("{stem} - Line {}", self.line),
        }
    }
}

/// Where an event came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Origin {
    /// A leveled call made by the application.
    Application,
    /// A problem report submitted by the user.
    UserReport,
    /// A failure of the logging infrastructure itself.
    Internal(InternalFailure),
}

/// Failures of the logging infrastructure that are reported through the destinations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InternalFailure {
    /// The log file could not be rotated.
    FileRotation,
}

/// A log event.
///
/// Created per call and consumed by the dispatch step.
#[derive(Clone, Debug)]
pub struct Record {
    // the observed time
    now: Timestamp,

    // the metadata
    level: LogLevel,
    target: String,
    location: Location,
    thread: Option<String>,
    origin: Origin,

    // the rendered message
    payload: String,

    // extra info
    kvs: BTreeMap<String, String>,
}

impl Record {
    /// Returns a new builder.
    #[track_caller]
    pub fn builder() -> RecordBuilder {
        RecordBuilder::default()
    }

    /// The observed time.
    pub fn time(&self) -> Timestamp {
        self.now
    }

    /// The severity of the event.
    pub fn level(&self) -> LogLevel {
        self.level
    }

    /// The identifier the event is noted under.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Where the event was logged from.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The name of the thread that logged the event.
    pub fn thread(&self) -> Option<&str> {
        self.thread.as_deref()
    }

    /// Where the event came from.
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// The rendered message.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// The extra key-values attached to the event.
    pub fn key_values(&self) -> &BTreeMap<String, String> {
        &self.kvs
    }

    /// Create a builder initialized with the current record's values.
    pub fn to_builder(&self) -> RecordBuilder {
        RecordBuilder {
            record: self.clone(),
        }
    }
}

/// Builder for [`Record`].
#[derive(Debug)]
pub struct RecordBuilder {
    record: Record,
}

impl Default for RecordBuilder {
    #[track_caller]
    fn default() -> Self {
        RecordBuilder {
            record: Record {
                now: Timestamp::now(),
                level: LogLevel::Info,
                target: String::new(),
                location: Location::caller(),
                thread: std::thread::current().name().map(ToOwned::to_owned),
                origin: Origin::Application,
                payload: String::new(),
                kvs: BTreeMap::new(),
            },
        }
    }
}

impl RecordBuilder {
    /// Set [`payload`](Record::payload).
    pub fn payload(mut self, payload: impl Into<String>) -> Self {
        self.record.payload = payload.into();
        self
    }

    /// Set [`level`](Record::level).
    pub fn level(mut self, level: LogLevel) -> Self {
        debug_assert_ne!(level, LogLevel::None, "events never carry the none level");
        self.record.level = level;
        self
    }

    /// Set [`target`](Record::target).
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.record.target = target.into();
        self
    }

    /// Set [`location`](Record::location).
    pub fn location(mut self, location: Location) -> Self {
        self.record.location = location;
        self
    }

    /// Set [`origin`](Record::origin).
    pub fn origin(mut self, origin: Origin) -> Self {
        self.record.origin = origin;
        self
    }

    /// Set [`time`](Record::time).
    pub fn time(mut self, now: Timestamp) -> Self {
        self.record.now = now;
        self
    }

    /// Set [`key_values`](Record::key_values).
    pub fn key_values(mut self, kvs: BTreeMap<String, String>) -> Self {
        self.record.kvs = kvs;
        self
    }

    /// Invoke the builder and return a `Record`.
    pub fn build(self) -> Record {
        self.record
    }
}

/// Displays the key-values of a record as ` key=value` pairs.
pub struct KvDisplay<'a>(&'a BTreeMap<String, String>);

impl<'a> KvDisplay<'a> {
    pub fn new(kvs: &'a BTreeMap<String, String>) -> Self {
        Self(kvs)
    }
}

impl fmt::Display for KvDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in self.0 {
            write!(f, " {key}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_captures_caller() {
        let record = Record::builder().payload("hello").build();
        assert!(record.location().file().ends_with("record.rs"));
        assert_eq!(record.origin(), Origin::Application);
        assert_eq!(record.payload(), "hello");
    }

    #[test]
    fn test_kv_display() {
        let mut kvs = BTreeMap::new();
        kvs.insert("b".to_string(), "2".to_string());
        kvs.insert("a".to_string(), "1".to_string());
        assert_eq!(KvDisplay::new(&kvs).to_string(), " a=1 b=2");
    }
}
