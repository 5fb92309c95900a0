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

//! Rendering of a message and an attached value into the text handed to destinations.

use std::fmt;

use serde::Serialize;

use crate::Error;
use crate::ErrorKind;
use crate::redact::Redacted;
use crate::redact::render_redacted;

/// Appended in place of a plain value when redaction is required.
pub const REDACTION_REQUIRED_NOTICE: &str =
    "Object redacted due to require_redacted set to true";

/// A value that can be encoded as JSON.
///
/// Implemented for every [`Serialize`] type.
pub trait PlainEncodable {
    /// Encode the value as a JSON string.
    fn encode_json(&self) -> Result<String, Error>;
}

impl<T: Serialize + ?Sized> PlainEncodable for T {
    fn encode_json(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(|err| {
            Error::new("failed to encode attached value")
                .with_kind(ErrorKind::Encode)
                .with_source(err)
        })
    }
}

/// A value attached to a log call.
///
/// The branch is chosen by the caller: plain values are JSON encoded unless the configuration
/// requires redaction, redacted values always render through [`render_redacted`].
#[derive(Clone, Copy)]
pub enum Attachment<'a> {
    /// A plain structured value.
    Plain(&'a dyn PlainEncodable),
    /// A value implementing the redaction contract.
    Redacted(&'a dyn Redacted),
}

impl<'a> Attachment<'a> {
    /// Attach a plain serializable value.
    pub fn plain<T: Serialize>(value: &'a T) -> Self {
        Attachment::Plain(value)
    }

    /// Attach a value implementing [`Redacted`].
    pub fn redacted<T: Redacted>(value: &'a T) -> Self {
        Attachment::Redacted(value)
    }
}

impl fmt::Debug for Attachment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attachment::Plain(_) => f.write_str("Attachment::Plain(..)"),
            Attachment::Redacted(value) => {
                write!(f, "Attachment::Redacted({})", value.type_name())
            }
        }
    }
}

/// Render an attached value on its own.
///
/// Returns `None` when a plain value fails to encode.
pub fn render_attachment(attachment: &Attachment, require_redacted: bool) -> Option<String> {
    match attachment {
        Attachment::Redacted(value) => Some(render_redacted(*value)),
        Attachment::Plain(_) if require_redacted => Some(REDACTION_REQUIRED_NOTICE.to_string()),
        Attachment::Plain(value) => PlainEncodable::encode_json(*value).ok(),
    }
}

/// Render `message` with an optional attachment as `message: rendered`.
///
/// Encoding failures fall back to the bare message.
///
/// # Examples
///
/// ```
/// use steamclog::encode::Attachment;
/// use steamclog::encode::render_message;
///
/// let point = (1, 2);
/// assert_eq!(
///     render_message("moved", Some(&Attachment::plain(&point)), false),
///     "moved: [1,2]"
/// );
/// assert_eq!(
///     render_message("moved", Some(&Attachment::plain(&point)), true),
///     "moved: Object redacted due to require_redacted set to true"
/// );
/// ```
pub fn render_message(
    message: &str,
    attachment: Option<&Attachment>,
    require_redacted: bool,
) -> String {
    match attachment.and_then(|attachment| render_attachment(attachment, require_redacted)) {
        Some(rendered) => format!("{message}: {rendered}"),
        None => message.to_string(),
    }
}
