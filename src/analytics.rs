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

//! The optional analytics collaborator.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::Error;
use crate::ErrorKind;
use crate::REDACTION_REQUIRED_NOTICE;
use crate::redact::Redacted;
use crate::redact::render_redacted;

/// The property carrying a value tracked as a whole.
pub const VALUE_PROPERTY: &str = "value";

/// An event tracking backend.
///
/// Events only reach it while the active preset enables analytics.
pub trait AnalyticsBackend: fmt::Debug + Send + Sync + 'static {
    /// Log one named event with its properties.
    fn log_event(&self, name: &str, properties: &BTreeMap<String, String>) -> Result<(), Error>;
}

impl<T: AnalyticsBackend> From<T> for Box<dyn AnalyticsBackend> {
    fn from(value: T) -> Self {
        Box::new(value)
    }
}

/// Flatten a serializable struct or map into event properties.
///
/// String values are taken verbatim, every other value is JSON encoded.
///
/// # Examples
///
/// ```
/// use serde::Serialize;
/// use steamclog::analytics::encode_properties;
///
/// #[derive(Serialize)]
/// struct Purchase {
///     sku: &'static str,
///     quantity: u32,
/// }
///
/// let properties = encode_properties(&Purchase { sku: "hat", quantity: 2 }).unwrap();
/// assert_eq!(properties["sku"], "hat");
/// assert_eq!(properties["quantity"], "2");
/// ```
pub fn encode_properties<T: Serialize + ?Sized>(
    value: &T,
) -> Result<BTreeMap<String, String>, Error> {
    let value = serde_json::to_value(value).map_err(|err| {
        Error::new("failed to encode event properties")
            .with_kind(ErrorKind::Encode)
            .with_source(err)
    })?;

    match value {
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(key, value)| match value {
                Value::String(value) => (key, value),
                value => (key, value.to_string()),
            })
            .collect()),
        value => Err(Error::new("event properties must encode to a map")
            .with_kind(ErrorKind::Encode)
            .with_context("encoded", kind_of(&value))),
    }
}

/// Properties carrying the redacted rendering of `value` under [`VALUE_PROPERTY`].
///
/// # Examples
///
/// ```
/// use steamclog::analytics::redacted_properties;
///
/// struct Login {
///     user: String,
///     password: String,
/// }
///
/// steamclog::impl_redacted!(Login, safe = [user], fields = [user, password]);
///
/// let login = Login {
///     user: "a".to_string(),
///     password: "hunter2".to_string(),
/// };
/// let properties = redacted_properties(&login);
/// assert_eq!(properties["value"], r#"Login(user: "a", password: <redacted>)"#);
/// ```
pub fn redacted_properties(value: &dyn Redacted) -> BTreeMap<String, String> {
    BTreeMap::from([(VALUE_PROPERTY.to_string(), render_redacted(value))])
}

/// Properties sent in place of a plain value when redaction is required.
pub fn withheld_properties() -> BTreeMap<String, String> {
    BTreeMap::from([(
        VALUE_PROPERTY.to_string(),
        REDACTION_REQUIRED_NOTICE.to_string(),
    )])
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
