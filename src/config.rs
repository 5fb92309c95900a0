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

//! The immutable configuration snapshot of a [`Steamclog`](crate::Steamclog) facade.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use crate::LogLevelPreset;

/// The error type handed to the error filter.
pub type DynError = dyn std::error::Error + 'static;

/// Why extra info is requested from [`Config::with_extra_info`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExtraInfoPurpose {
    /// A user-submitted problem report.
    UserReport,
    /// An error-level event.
    Error,
    /// A fatal event.
    Fatal,
}

/// Tuning of the auto-rotating log file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AutoRotateConfig {
    /// How long a log file is written to before it is rotated out.
    pub rotate_after: Duration,
    /// How many rotated files are kept next to the live one.
    pub max_archived_files: usize,
}

impl AutoRotateConfig {
    /// Rotate after the given interval, keeping the default number of archives.
    pub fn new(rotate_after: Duration) -> Self {
        Self {
            rotate_after,
            ..Default::default()
        }
    }
}

impl Default for AutoRotateConfig {
    fn default() -> Self {
        Self {
            rotate_after: Duration::from_secs(600),
            max_archived_files: 10,
        }
    }
}

type ErrorFilter = Arc<dyn Fn(&DynError) -> bool + Send + Sync>;
type ExtraInfo = Arc<dyn Fn(ExtraInfoPurpose) -> BTreeMap<String, String> + Send + Sync>;

/// The process terminating primitive invoked by [`Steamclog::fatal`](crate::Steamclog::fatal).
pub type CrashHandler = fn(&str) -> !;

/// An immutable configuration snapshot.
///
/// Cloning is cheap. Swap a running facade's configuration with
/// [`Steamclog::replace_config`](crate::Steamclog::replace_config).
///
/// # Examples
///
/// ```
/// use steamclog::Config;
/// use steamclog::LogLevelPreset;
///
/// let config = Config::default()
///     .with_preset(LogLevelPreset::Release)
///     .with_identifier("my-app")
///     .with_require_redacted(true);
/// assert!(config.require_redacted());
/// ```
#[derive(Clone)]
pub struct Config {
    preset: LogLevelPreset,
    identifier: String,
    require_redacted: bool,
    error_filter: ErrorFilter,
    auto_rotate: AutoRotateConfig,
    extra_info: Option<ExtraInfo>,
    crash_handler: CrashHandler,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            preset: LogLevelPreset::default(),
            identifier: "steamclog".to_string(),
            require_redacted: false,
            error_filter: Arc::new(suppress_nothing),
            auto_rotate: AutoRotateConfig::default(),
            extra_info: None,
            crash_handler: abort_process,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("preset", &self.preset)
            .field("identifier", &self.identifier)
            .field("require_redacted", &self.require_redacted)
            .field("auto_rotate", &self.auto_rotate)
            .field("extra_info", &self.extra_info.is_some())
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Set the level preset. Default to [`LogLevelPreset::Develop`].
    pub fn with_preset(mut self, preset: LogLevelPreset) -> Self {
        self.preset = preset;
        self
    }

    /// Set the identifier events are noted under. Default to `"steamclog"`.
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    /// Require attached values to be [`Redacted`](crate::Redacted). Default to `false`.
    ///
    /// When set, plain values are withheld entirely and replaced by a fixed notice.
    pub fn with_require_redacted(mut self, require_redacted: bool) -> Self {
        self.require_redacted = require_redacted;
        self
    }

    /// Set the predicate deciding which errors are demoted to warnings.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io;
    ///
    /// use steamclog::Config;
    ///
    /// let config = Config::default().with_error_filter(|err| {
    ///     err.downcast_ref::<io::Error>()
    ///         .is_some_and(|err| err.kind() == io::ErrorKind::TimedOut)
    /// });
    /// ```
    pub fn with_error_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&DynError) -> bool + Send + Sync + 'static,
    {
        self.error_filter = Arc::new(filter);
        self
    }

    /// Set the log file rotation tuning.
    pub fn with_auto_rotate(mut self, auto_rotate: AutoRotateConfig) -> Self {
        self.auto_rotate = auto_rotate;
        self
    }

    /// Set the callback providing extra key-values for error, fatal and user report events.
    pub fn with_extra_info<F>(mut self, extra_info: F) -> Self
    where
        F: Fn(ExtraInfoPurpose) -> BTreeMap<String, String> + Send + Sync + 'static,
    {
        self.extra_info = Some(Arc::new(extra_info));
        self
    }

    /// Set the function terminating the process after a fatal event was flushed.
    ///
    /// Default to printing the crash description to stderr and aborting the process.
    pub fn with_crash_handler(mut self, crash_handler: CrashHandler) -> Self {
        self.crash_handler = crash_handler;
        self
    }

    pub fn preset(&self) -> LogLevelPreset {
        self.preset
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn require_redacted(&self) -> bool {
        self.require_redacted
    }

    pub fn auto_rotate(&self) -> AutoRotateConfig {
        self.auto_rotate
    }

    /// Whether the given error should be demoted to a warning.
    pub fn should_suppress(&self, err: &DynError) -> bool {
        (self.error_filter)(err)
    }

    /// Extra key-values for the given purpose; empty when no callback is set.
    pub fn extra_info(&self, purpose: ExtraInfoPurpose) -> BTreeMap<String, String> {
        match &self.extra_info {
            Some(extra_info) => extra_info(purpose),
            None => BTreeMap::new(),
        }
    }

    pub(crate) fn crash_handler(&self) -> CrashHandler {
        self.crash_handler
    }
}

fn suppress_nothing(_: &DynError) -> bool {
    false
}

fn abort_process(crash: &str) -> ! {
    let _ = writeln!(std::io::stderr(), "Fatal error: {crash}");
    std::process::abort()
}
