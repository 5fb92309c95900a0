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

//! Named bundles of per-destination thresholds.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::LogLevel;
use crate::destination::DestinationKind;

/// A preset deriving every destination threshold from a single value.
///
/// | preset             | global  | console | file    | remote | analytics |
/// |--------------------|---------|---------|---------|--------|-----------|
/// | `Firehose`         | verbose | verbose | verbose | none   | no        |
/// | `Develop`          | debug   | debug   | none    | none   | no        |
/// | `ReleaseAdvanced`  | verbose | none    | verbose | warn   | yes       |
/// | `Release`          | warn    | none    | none    | warn   | yes       |
///
/// `Custom` overrides some thresholds and inherits the rest, see
/// [`LogLevelPreset::custom_using_base`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevelPreset {
    /// Everything goes to the console and the log file, nothing is reported remotely.
    Firehose,
    /// Debug output on the console only.
    #[default]
    Develop,
    /// Verbose log file plus remote reporting from warnings up.
    ReleaseAdvanced,
    /// Remote reporting from warnings up only.
    Release,
    /// Explicit thresholds.
    Custom(CustomLevels),
}

/// Explicit thresholds of a [`LogLevelPreset::Custom`] preset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomLevels {
    pub global: LogLevel,
    pub console: LogLevel,
    pub file: LogLevel,
    pub remote: LogLevel,
    pub analytics_enabled: bool,
}

/// Optional overrides for [`LogLevelPreset::custom_using_base`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PresetOverrides {
    pub global: Option<LogLevel>,
    pub console: Option<LogLevel>,
    pub file: Option<LogLevel>,
    pub remote: Option<LogLevel>,
    pub analytics_enabled: Option<bool>,
}

impl LogLevelPreset {
    /// Create a custom preset from `base`, replacing only the thresholds set in `overrides`.
    ///
    /// # Examples
    ///
    /// ```
    /// use steamclog::LogLevel;
    /// use steamclog::LogLevelPreset;
    /// use steamclog::preset::PresetOverrides;
    ///
    /// let preset = LogLevelPreset::custom_using_base(
    ///     LogLevelPreset::Release,
    ///     PresetOverrides {
    ///         file: Some(LogLevel::Info),
    ///         ..Default::default()
    ///     },
    /// );
    /// assert_eq!(preset.file(), LogLevel::Info);
    /// assert_eq!(preset.remote(), LogLevel::Warn);
    /// ```
    pub fn custom_using_base(base: LogLevelPreset, overrides: PresetOverrides) -> LogLevelPreset {
        LogLevelPreset::Custom(CustomLevels {
            global: overrides.global.unwrap_or(base.global()),
            console: overrides.console.unwrap_or(base.console()),
            file: overrides.file.unwrap_or(base.file()),
            remote: overrides.remote.unwrap_or(base.remote()),
            analytics_enabled: overrides
                .analytics_enabled
                .unwrap_or(base.analytics_enabled()),
        })
    }

    /// The gate every non-fatal event must pass before any destination is considered.
    pub fn global(&self) -> LogLevel {
        match self {
            LogLevelPreset::Firehose => LogLevel::Verbose,
            LogLevelPreset::Develop => LogLevel::Debug,
            LogLevelPreset::ReleaseAdvanced => LogLevel::Verbose,
            LogLevelPreset::Release => LogLevel::Warn,
            LogLevelPreset::Custom(levels) => levels.global,
        }
    }

    /// Threshold of console destinations.
    pub fn console(&self) -> LogLevel {
        match self {
            LogLevelPreset::Firehose => LogLevel::Verbose,
            LogLevelPreset::Develop => LogLevel::Debug,
            LogLevelPreset::ReleaseAdvanced => LogLevel::None,
            LogLevelPreset::Release => LogLevel::None,
            LogLevelPreset::Custom(levels) => levels.console,
        }
    }

    /// Threshold of log file destinations.
    pub fn file(&self) -> LogLevel {
        match self {
            LogLevelPreset::Firehose => LogLevel::Verbose,
            LogLevelPreset::Develop => LogLevel::None,
            LogLevelPreset::ReleaseAdvanced => LogLevel::Verbose,
            LogLevelPreset::Release => LogLevel::None,
            LogLevelPreset::Custom(levels) => levels.file,
        }
    }

    /// Threshold of remote crash reporting destinations.
    pub fn remote(&self) -> LogLevel {
        match self {
            LogLevelPreset::Firehose => LogLevel::None,
            LogLevelPreset::Develop => LogLevel::None,
            LogLevelPreset::ReleaseAdvanced => LogLevel::Warn,
            LogLevelPreset::Release => LogLevel::Warn,
            LogLevelPreset::Custom(levels) => levels.remote,
        }
    }

    /// Whether analytics events are forwarded to the analytics backend.
    pub fn analytics_enabled(&self) -> bool {
        match self {
            LogLevelPreset::Firehose => false,
            LogLevelPreset::Develop => false,
            LogLevelPreset::ReleaseAdvanced => true,
            LogLevelPreset::Release => true,
            LogLevelPreset::Custom(levels) => levels.analytics_enabled,
        }
    }

    /// The threshold of the given destination kind, or `None` for kinds the preset does not cover.
    pub fn level_for(&self, kind: DestinationKind) -> Option<LogLevel> {
        match kind {
            DestinationKind::Console => Some(self.console()),
            DestinationKind::File => Some(self.file()),
            DestinationKind::Remote => Some(self.remote()),
            DestinationKind::Other => None,
        }
    }
}

impl fmt::Display for LogLevelPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LogLevelPreset(global={}, console={}, file={}, remote={}, analytics={})",
            self.global(),
            self.console(),
            self.file(),
            self.remote(),
            self.analytics_enabled()
        )
    }
}

impl FromStr for LogLevelPreset {
    type Err = Error;
    fn from_str(s: &str) -> Result<LogLevelPreset, Self::Err> {
        for (name, preset) in [
            ("firehose", LogLevelPreset::Firehose),
            ("develop", LogLevelPreset::Develop),
            ("release_advanced", LogLevelPreset::ReleaseAdvanced),
            ("release", LogLevelPreset::Release),
        ] {
            if s.eq_ignore_ascii_case(name) {
                return Ok(preset);
            }
        }

        Err(Error::new(format!("malformed preset: {s:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMED: [LogLevelPreset; 4] = [
        LogLevelPreset::Firehose,
        LogLevelPreset::Develop,
        LogLevelPreset::ReleaseAdvanced,
        LogLevelPreset::Release,
    ];

    #[test]
    fn test_every_kind_has_a_threshold() {
        for preset in NAMED {
            for kind in [
                DestinationKind::Console,
                DestinationKind::File,
                DestinationKind::Remote,
            ] {
                assert!(preset.level_for(kind).is_some(), "{preset} {kind:?}");
            }
            assert_eq!(preset.level_for(DestinationKind::Other), None);
        }
    }

    #[test]
    fn test_global_never_stricter_than_destinations() {
        for preset in NAMED {
            let most_verbose = [preset.console(), preset.file(), preset.remote()]
                .into_iter()
                .min()
                .unwrap();
            assert!(preset.global() <= most_verbose, "{preset}");
        }
    }

    #[test]
    fn test_develop_thresholds() {
        let preset = LogLevelPreset::Develop;
        assert_eq!(preset.console(), LogLevel::Debug);
        assert_eq!(preset.file(), LogLevel::None);
        assert_eq!(preset.remote(), LogLevel::None);
        assert!(!preset.analytics_enabled());
    }

    #[test]
    fn test_custom_inherits_from_base() {
        let preset = LogLevelPreset::custom_using_base(
            LogLevelPreset::Firehose,
            PresetOverrides {
                remote: Some(LogLevel::Error),
                ..Default::default()
            },
        );
        assert_eq!(preset.global(), LogLevel::Verbose);
        assert_eq!(preset.console(), LogLevel::Verbose);
        assert_eq!(preset.file(), LogLevel::Verbose);
        assert_eq!(preset.remote(), LogLevel::Error);
        assert!(!preset.analytics_enabled());
    }

    #[test]
    fn test_parse_and_serde() {
        assert_eq!(
            "release_advanced".parse::<LogLevelPreset>().unwrap(),
            LogLevelPreset::ReleaseAdvanced
        );
        assert!("custom".parse::<LogLevelPreset>().is_err());

        let preset: LogLevelPreset = serde_json::from_str("\"firehose\"").unwrap();
        assert_eq!(preset, LogLevelPreset::Firehose);
    }
}
