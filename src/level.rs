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

//! Severity levels.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;

/// An enum representing the available severities, from the most verbose to the most severe.
///
/// [`LogLevel::None`] is a threshold sentinel meaning "never emit". It is never assigned to an
/// event.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Verbose,
    /// Designates lower priority information.
    Debug,
    /// Designates useful information.
    Info,
    /// Designates hazardous situations.
    Warn,
    /// Designates errors the application recovers from.
    Error,
    /// Designates errors the application cannot continue after.
    Fatal,
    /// Disables a destination.
    None,
}

impl LogLevel {
    /// Every level that may be assigned to an event, most verbose first.
    pub const EVENT_LEVELS: [LogLevel; 6] = [
        LogLevel::Verbose,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    /// The integer rank of the level; higher is more severe.
    pub const fn rank(&self) -> u8 {
        match self {
            LogLevel::Verbose => 0,
            LogLevel::Debug => 1,
            LogLevel::Info => 2,
            LogLevel::Warn => 3,
            LogLevel::Error => 4,
            LogLevel::Fatal => 5,
            LogLevel::None => 6,
        }
    }

    /// Check whether an event of this level passes the given threshold.
    ///
    /// A [`LogLevel::None`] threshold rejects every event.
    ///
    /// # Examples
    ///
    /// ```
    /// use steamclog::LogLevel;
    ///
    /// assert!(LogLevel::Warn.passes(LogLevel::Info));
    /// assert!(LogLevel::Info.passes(LogLevel::Info));
    /// assert!(!LogLevel::Debug.passes(LogLevel::Info));
    /// assert!(!LogLevel::Fatal.passes(LogLevel::None));
    /// ```
    pub fn passes(&self, threshold: LogLevel) -> bool {
        threshold != LogLevel::None && *self != LogLevel::None && self.rank() >= threshold.rank()
    }

    /// Return the string representation of the `LogLevel`.
    ///
    /// This returns the same string as the `fmt::Display` implementation.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Verbose => "VERBOSE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
            LogLevel::None => "NONE",
        }
    }
}

impl PartialOrd for LogLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LogLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Debug for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = Error;
    fn from_str(s: &str) -> Result<LogLevel, Self::Err> {
        for (name, level) in [
            ("verbose", LogLevel::Verbose),
            ("debug", LogLevel::Debug),
            ("info", LogLevel::Info),
            ("warn", LogLevel::Warn),
            ("error", LogLevel::Error),
            ("fatal", LogLevel::Fatal),
            ("none", LogLevel::None),
        ] {
            if s.eq_ignore_ascii_case(name) {
                return Ok(level);
            }
        }

        Err(Error::new(format!("malformed level: {s:?}")))
    }
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => LogLevel::Error,
            log::Level::Warn => LogLevel::Warn,
            log::Level::Info => LogLevel::Info,
            log::Level::Debug => LogLevel::Debug,
            log::Level::Trace => LogLevel::Verbose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_follows_rank() {
        let mut levels = vec![
            LogLevel::None,
            LogLevel::Error,
            LogLevel::Verbose,
            LogLevel::Fatal,
            LogLevel::Info,
        ];
        levels.sort();
        assert_eq!(
            levels,
            vec![
                LogLevel::Verbose,
                LogLevel::Info,
                LogLevel::Error,
                LogLevel::Fatal,
                LogLevel::None
            ]
        );
    }

    #[test]
    fn test_passes_matrix() {
        for threshold in LogLevel::EVENT_LEVELS {
            for level in LogLevel::EVENT_LEVELS {
                assert_eq!(level.passes(threshold), level.rank() >= threshold.rank());
            }
            assert!(!threshold.passes(LogLevel::None));
        }
    }

    #[test]
    fn test_parse_and_serde_names() {
        assert_eq!("WARN".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("none".parse::<LogLevel>().unwrap(), LogLevel::None);
        assert!("loud".parse::<LogLevel>().is_err());

        let json = serde_json::to_string(&LogLevel::Verbose).unwrap();
        assert_eq!(json, "\"verbose\"");
        let level: LogLevel = serde_json::from_str("\"fatal\"").unwrap();
        assert_eq!(level, LogLevel::Fatal);
    }
}
