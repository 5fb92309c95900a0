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
use std::io::Write;

use crate::Error;
use crate::destination::Destination;
use crate::destination::DestinationKind;
use crate::layout::Layout;
use crate::layout::TextLayout;
use crate::record::Record;

/// The platform channel a [`Console`] writes lines to.
pub trait ConsoleChannel: fmt::Debug + Send + Sync + 'static {
    /// Write one formatted line.
    fn write_line(&self, line: &str) -> Result<(), Error>;
}

#[derive(Debug)]
enum Channel {
    Stdout,
    Stderr,
    Custom(Box<dyn ConsoleChannel>),
}

/// A destination that prints log records to the console.
///
/// Default to standard output with [`TextLayout`].
///
/// # Examples
///
/// ```
/// use steamclog::destination::Console;
///
/// let console = Console::default().stderr();
/// ```
#[derive(Debug)]
pub struct Console {
    channel: Channel,
    layout: Box<dyn Layout>,
}

impl Default for Console {
    fn default() -> Self {
        Self {
            channel: Channel::Stdout,
            layout: Box::new(TextLayout::default()),
        }
    }
}

impl Console {
    /// Write to standard error instead of standard output.
    pub fn stderr(mut self) -> Self {
        self.channel = Channel::Stderr;
        self
    }

    /// Write to the given channel, such as a platform system log.
    pub fn channel(mut self, channel: impl ConsoleChannel) -> Self {
        self.channel = Channel::Custom(Box::new(channel));
        self
    }

    /// Set the layout. Default to [`TextLayout`].
    pub fn with_layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }
}

impl Destination for Console {
    fn kind(&self) -> DestinationKind {
        DestinationKind::Console
    }

    fn emit(&self, record: &Record) -> Result<(), Error> {
        let mut bytes = self.layout.format(record)?;
        match &self.channel {
            Channel::Custom(channel) => channel.write_line(&String::from_utf8_lossy(&bytes)),
            Channel::Stdout => {
                bytes.push(b'\n');
                std::io::stdout()
                    .write_all(&bytes)
                    .map_err(Error::from_io_error)
            }
            Channel::Stderr => {
                bytes.push(b'\n');
                std::io::stderr()
                    .write_all(&bytes)
                    .map_err(Error::from_io_error)
            }
        }
    }

    fn flush(&self) -> Result<(), Error> {
        match &self.channel {
            Channel::Stdout => std::io::stdout().flush().map_err(Error::from_io_error),
            Channel::Stderr => std::io::stderr().flush().map_err(Error::from_io_error),
            Channel::Custom(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex;

    use super::*;
    use crate::LogLevel;

    #[derive(Debug, Default, Clone)]
    struct Lines(Arc<Mutex<Vec<String>>>);

    impl ConsoleChannel for Lines {
        fn write_line(&self, line: &str) -> Result<(), Error> {
            self.0.lock().unwrap().push(line.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_writes_one_line_per_record() {
        let lines = Lines::default();
        let console = Console::default().channel(lines.clone());

        let record = Record::builder()
            .level(LogLevel::Error)
            .target("steamclog")
            .payload("disk full")
            .build();
        console.emit(&record).unwrap();

        let lines = lines.0.lock().unwrap();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("[steamclog] console.rs:"));
        assert!(lines[0].ends_with("🚫 disk full"));
        assert!(!lines[0].ends_with('\n'));
    }
}
