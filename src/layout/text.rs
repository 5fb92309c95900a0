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

#[cfg(feature = "colored")]
use colored::Color;
#[cfg(feature = "colored")]
use colored::ColoredString;
#[cfg(feature = "colored")]
use colored::Colorize;
use jiff::tz::TimeZone;

use crate::Error;
use crate::LogLevel;
use crate::layout::Layout;
use crate::layout::glyph;
use crate::record::KvDisplay;
use crate::record::Record;

/// A layout that formats log records as console text.
///
/// Output format:
///
/// ```text
/// 2024-08-11T22:44:57.172105+08:00 ERROR [steamclog] main.rs:51 🚫 Hello error!
/// 2024-08-11T22:44:57.172219+08:00  WARN [steamclog] main.rs:52 ⚠️ Hello warn!
/// 2024-08-11T22:44:57.172276+08:00  INFO [steamclog] main.rs:53 Hello info!
/// ```
///
/// With the `colored` feature on, levels are colored; customize the colors with
/// [`TextLayout::colors`].
///
/// You can customize the timezone of the timestamp with [`TextLayout::timezone`]. Otherwise, the
/// system timezone is used.
///
/// # Examples
///
/// ```
/// use steamclog::layout::TextLayout;
///
/// let layout = TextLayout::default().no_glyphs();
/// ```
#[derive(Debug, Clone)]
pub struct TextLayout {
    #[cfg(feature = "colored")]
    colors: LevelColor,
    glyphs: bool,
    tz: Option<TimeZone>,
}

impl Default for TextLayout {
    fn default() -> Self {
        Self {
            #[cfg(feature = "colored")]
            colors: LevelColor::default(),
            glyphs: true,
            tz: None,
        }
    }
}

impl TextLayout {
    /// Set the timezone of the timestamp.
    pub fn timezone(mut self, tz: TimeZone) -> Self {
        self.tz = Some(tz);
        self
    }

    /// Do not prefix warn, error and fatal messages with a glyph.
    pub fn no_glyphs(mut self) -> Self {
        self.glyphs = false;
        self
    }

    /// Customize the color of each log level.
    #[cfg(feature = "colored")]
    pub fn colors(mut self, colors: LevelColor) -> Self {
        self.colors = colors;
        self
    }

    #[cfg(feature = "colored")]
    fn format_level(&self, level: LogLevel) -> String {
        let color = match level {
            LogLevel::Fatal | LogLevel::Error => self.colors.error,
            LogLevel::Warn => self.colors.warn,
            LogLevel::Info => self.colors.info,
            LogLevel::Debug => self.colors.debug,
            LogLevel::Verbose | LogLevel::None => self.colors.verbose,
        };
        format!("{:>5}", ColoredString::from(level.as_str()).color(color))
    }

    #[cfg(not(feature = "colored"))]
    fn format_level(&self, level: LogLevel) -> String {
        format!("{level:>5}")
    }
}

/// Customize the color of each log level.
#[cfg(feature = "colored")]
#[derive(Debug, Clone)]
pub struct LevelColor {
    pub error: Color,
    pub warn: Color,
    pub info: Color,
    pub debug: Color,
    pub verbose: Color,
}

#[cfg(feature = "colored")]
impl Default for LevelColor {
    fn default() -> Self {
        Self {
            error: Color::Red,
            warn: Color::Yellow,
            info: Color::Green,
            debug: Color::Blue,
            verbose: Color::Magenta,
        }
    }
}

impl Layout for TextLayout {
    fn format(&self, record: &Record) -> Result<Vec<u8>, Error> {
        let tz = self.tz.clone().unwrap_or_else(TimeZone::system);
        let time = record
            .time()
            .to_zoned(tz)
            .strftime("%Y-%m-%dT%H:%M:%S.%6f%:z");
        let level = self.format_level(record.level());
        let identifier = record.target();
        let file = record.location().filename();
        let line = record.location().line();

        let mut text = format!("{time} {level} [{identifier}] {file}:{line} ");
        if let Some(glyph) = glyph(record.level()).filter(|_| self.glyphs) {
            text.push_str(glyph);
            text.push(' ');
        }

        // SAFETY: write to a string always succeeds
        write!(
            &mut text,
            "{}{}",
            record.payload(),
            KvDisplay::new(record.key_values())
        )
        .unwrap();

        Ok(text.into_bytes())
    }
}

#[cfg(all(test, not(feature = "colored")))]
mod tests {
    use std::collections::BTreeMap;

    use jiff::Timestamp;

    use super::*;
    use crate::record::Location;

    fn record(level: LogLevel, payload: &str) -> Record {
        Record::builder()
            .level(level)
            .target("steamclog")
            .location(Location::new(None, "src/net/client.rs", 42))
            .time("2024-08-10T00:00:00.123456Z".parse::<Timestamp>().unwrap())
            .payload(payload)
            .build()
    }

    fn format(layout: &TextLayout, record: &Record) -> String {
        String::from_utf8(layout.format(record).unwrap()).unwrap()
    }

    #[test]
    fn test_text_layout() {
        let layout = TextLayout::default().timezone(TimeZone::UTC);
        insta::assert_snapshot!(
            format(&layout, &record(LogLevel::Info, "connected")),
            @"2024-08-10T00:00:00.123456+00:00  INFO [steamclog] client.rs:42 connected"
        );
        insta::assert_snapshot!(
            format(&layout, &record(LogLevel::Warn, "slow")),
            @"2024-08-10T00:00:00.123456+00:00  WARN [steamclog] client.rs:42 ⚠️ slow"
        );
    }

    #[test]
    fn test_glyphs_for_severe_levels() {
        let layout = TextLayout::default().timezone(TimeZone::UTC);
        for level in [LogLevel::Error, LogLevel::Fatal] {
            assert!(format(&layout, &record(level, "x")).contains("🚫 x"));
        }

        let layout = layout.no_glyphs();
        assert!(!format(&layout, &record(LogLevel::Error, "x")).contains("🚫"));
    }

    #[test]
    fn test_key_values_are_appended() {
        let mut kvs = BTreeMap::new();
        kvs.insert("session".to_string(), "42".to_string());
        let record = record(LogLevel::Error, "failed")
            .to_builder()
            .key_values(kvs)
            .build();

        let layout = TextLayout::default().timezone(TimeZone::UTC);
        assert!(format(&layout, &record).ends_with("failed session=42"));
    }
}
