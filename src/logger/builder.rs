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

use std::path::Path;

use crate::AnalyticsBackend;
use crate::Config;
use crate::Error;
use crate::LogLevel;
use crate::Steamclog;
use crate::Trap;
use crate::destination::Console;
use crate::destination::Destination;
use crate::destination::FileDestination;
use crate::destination::LocalFile;
use crate::destination::Remote;
use crate::logger::dispatch::Threshold;
use crate::trap::DefaultTrap;

/// A builder for configuring a [`Steamclog`] facade.
///
/// Destinations added with [`console`](Builder::console), [`file`](Builder::file),
/// [`remote`](Builder::remote) and [`destination`](Builder::destination) take their threshold
/// from the active preset by their kind, and follow configuration swaps.
///
/// # Examples
///
/// ```
/// use steamclog::Config;
/// use steamclog::LogLevel;
/// use steamclog::LogLevelPreset;
/// use steamclog::Steamclog;
/// use steamclog::destination::Console;
/// use steamclog::destination::Testing;
///
/// let log = Steamclog::builder(Config::default().with_preset(LogLevelPreset::Firehose))
///     .console(Console::default())
///     .destination_with_level(Testing::default(), LogLevel::Warn)
///     .build();
/// ```
#[must_use = "call `build` to create the facade"]
#[derive(Debug)]
pub struct Builder {
    config: Config,
    destinations: Vec<(Box<dyn Destination>, Threshold)>,
    analytics: Option<Box<dyn AnalyticsBackend>>,
    trap: Box<dyn Trap>,
}

impl Builder {
    /// Create a new builder without destinations.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            destinations: vec![],
            analytics: None,
            trap: Box::new(DefaultTrap::default()),
        }
    }

    /// Add a console destination.
    pub fn console(self, console: Console) -> Self {
        self.destination(console)
    }

    /// Add a log file destination.
    pub fn file(self, file: FileDestination) -> Self {
        self.destination(file)
    }

    /// Add a log file destination writing `filename` under `dir`, rotated by the configured
    /// [`AutoRotateConfig`](crate::config::AutoRotateConfig).
    ///
    /// # Errors
    ///
    /// Return an error if the store cannot be created, see [`LocalFile::new`].
    pub fn local_file(
        self,
        dir: impl AsRef<Path>,
        filename: impl Into<String>,
    ) -> Result<Self, Error> {
        let store = LocalFile::new(dir, filename, self.config.auto_rotate())?;
        Ok(self.file(FileDestination::new(store)))
    }

    /// Add a remote crash reporting destination.
    pub fn remote(self, remote: Remote) -> Self {
        self.destination(remote)
    }

    /// Add a destination whose threshold follows the active preset.
    pub fn destination(mut self, destination: impl Into<Box<dyn Destination>>) -> Self {
        self.destinations
            .push((destination.into(), Threshold::Preset));
        self
    }

    /// Add a destination with a fixed threshold.
    pub fn destination_with_level(
        mut self,
        destination: impl Into<Box<dyn Destination>>,
        level: LogLevel,
    ) -> Self {
        self.destinations
            .push((destination.into(), Threshold::Fixed(level)));
        self
    }

    /// Set the analytics backend.
    pub fn analytics(mut self, analytics: impl Into<Box<dyn AnalyticsBackend>>) -> Self {
        self.analytics = Some(analytics.into());
        self
    }

    /// Set the trap receiving destination failures. Default to [`DefaultTrap`].
    pub fn trap(mut self, trap: impl Into<Box<dyn Trap>>) -> Self {
        self.trap = trap.into();
        self
    }

    /// Build the facade, spawning the workers of worker-mode destinations.
    pub fn build(self) -> Steamclog {
        let Self {
            config,
            destinations,
            analytics,
            trap,
        } = self;

        Steamclog::new(config, destinations, analytics, trap)
    }
}
