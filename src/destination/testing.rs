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

use crate::Error;
use crate::destination::Destination;
use crate::destination::DestinationKind;
use crate::layout::Layout;
use crate::layout::TextLayout;
use crate::record::Record;

/// A destination that writes log records that can be captured by a test harness (like
/// `cargo test`), and thus the outputs are suppressed unless `--nocapture` or `--show-output` is
/// specified.
///
/// It is a console destination, so its threshold follows the preset's console level.
///
/// # Examples
///
/// ```
/// use steamclog::destination::Testing;
///
/// let test_destination = Testing::default();
/// ```
#[derive(Debug)]
pub struct Testing {
    layout: Box<dyn Layout>,
}

impl Default for Testing {
    fn default() -> Self {
        Self {
            layout: Box::new(TextLayout::default()),
        }
    }
}

impl Testing {
    /// Set the layout for the [`Testing`] destination.
    ///
    /// Default to [`TextLayout`].
    pub fn with_layout(mut self, layout: impl Into<Box<dyn Layout>>) -> Self {
        self.layout = layout.into();
        self
    }
}

impl Destination for Testing {
    fn kind(&self) -> DestinationKind {
        DestinationKind::Console
    }

    fn emit(&self, record: &Record) -> Result<(), Error> {
        let bytes = self.layout.format(record)?;
        eprintln!("{}", String::from_utf8_lossy(&bytes));
        Ok(())
    }
}
