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

use std::collections::BTreeMap;
use std::fmt;

use crate::Error;
use crate::LogLevel;
use crate::destination::Destination;
use crate::destination::DestinationKind;
use crate::destination::DispatchMode;
use crate::record::InternalFailure;
use crate::record::Origin;
use crate::record::Record;

/// The breadcrumb message every log file rotation failure is reported with.
pub const ROTATION_FAILED_MESSAGE: &str = "Log file rotation failed";

/// A crash and error reporting client.
pub trait RemoteBackend: fmt::Debug + Send + Sync + 'static {
    /// Record a non-alerting annotation, attached to later events as context.
    fn record_breadcrumb(&self, level: LogLevel, category: &str, message: &str)
    -> Result<(), Error>;

    /// Submit a reportable event.
    fn capture_event(
        &self,
        level: LogLevel,
        message: &str,
        extra: &BTreeMap<String, String>,
    ) -> Result<(), Error>;
}

/// A destination reporting log records to a crash and error reporting backend.
///
/// Records below [`LogLevel::Error`] become breadcrumbs; error and fatal records and user reports
/// are captured as events. Failures to rotate the log file are reported as a breadcrumb with the
/// fixed [`ROTATION_FAILED_MESSAGE`], so that a failing disk does not open a new issue per line.
#[derive(Debug)]
pub struct Remote {
    backend: Box<dyn RemoteBackend>,
}

impl Remote {
    /// Create a remote destination reporting to the given backend.
    pub fn new(backend: impl RemoteBackend) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }
}

impl Destination for Remote {
    fn kind(&self) -> DestinationKind {
        DestinationKind::Remote
    }

    fn dispatch_mode(&self) -> DispatchMode {
        DispatchMode::Worker
    }

    fn emit(&self, record: &Record) -> Result<(), Error> {
        let level = record.level();
        let category = record.target();
        match record.origin() {
            Origin::Internal(InternalFailure::FileRotation) => {
                self.backend
                    .record_breadcrumb(level, category, ROTATION_FAILED_MESSAGE)
            }
            Origin::UserReport => {
                self.backend
                    .capture_event(level, record.payload(), record.key_values())
            }
            Origin::Application if level >= LogLevel::Error => {
                self.backend
                    .capture_event(level, record.payload(), record.key_values())
            }
            Origin::Application => self
                .backend
                .record_breadcrumb(level, category, record.payload()),
        }
    }
}
