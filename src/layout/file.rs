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

use std::fmt::Write;

use jiff::tz::TimeZone;

use crate::Error;
use crate::layout::Layout;
use crate::record::KvDisplay;
use crate::record::Record;

/// A layout that formats log records as lines of the log file.
///
/// Output format:
///
/// ```text
/// 2024-08-11.22:44:57.1721 steamclog[4242:main] [ERROR] (client.rs:51): app::net > Hello error!
/// 2024-08-11.22:44:57.1722 steamclog[4242:worker] [INFO] (client.rs:53): app::net > Hello info!
/// ```
///
/// The module falls back to the identifier when the call site does not know its module.
#[derive(Debug, Clone, Default)]
pub struct FileLayout {
    tz: Option<TimeZone>,
}

impl FileLayout {
    /// Set the timezone of the timestamp.
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.tz = Some(tz);
        self
    }
}

impl Layout for FileLayout {
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error> {
        let tz = self.tz.clone().unwrap_or_else(TimeZone::system);
        let time = record.time().to_zoned(tz).strftime("%Y-%m-%d.%H:%M:%S.%4f");
        let identifier = record.target();
        let pid = std::process::id();
        let thread = record.thread().unwrap_or("unnamed");
        let level = record.level();
        let file = record.location().filename();
        let line = record.location().line();
        let module = record.location().module_path().unwrap_or(identifier);

        let mut text = String::new();
        // SAFETY: write to a string always succeeds
        write!(
            &mut text,
            "{time} {identifier}[{pid}:{thread}] [{level}] ({file}:{line}): {module} > {}{}",
            record.payload(),
            KvDisplay::new(record.key_values())
        )
        .unwrap();

        Ok(text.into_bytes())
    }
}
