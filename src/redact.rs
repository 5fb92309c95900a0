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

//! The redaction contract.
//!
//! A type opts into redacted rendering by listing its fields explicitly and declaring which of
//! them are safe to render verbatim. Every other field is rendered as [`REDACTED_MARKER`].
//!
//! ```
//! use steamclog::redact::render_redacted;
//!
//! struct User {
//!     name: String,
//!     secret: String,
//! }
//!
//! steamclog::impl_redacted!(User, safe = [name], fields = [name, secret]);
//!
//! let user = User {
//!     name: "a".to_string(),
//!     secret: "b".to_string(),
//! };
//! assert_eq!(render_redacted(&user), r#"User(name: "a", secret: <redacted>)"#);
//! ```

use std::fmt;
use std::fmt::Write;

/// Rendered in place of every field missing from the safe set.
pub const REDACTED_MARKER: &str = "<redacted>";

/// Receives the fields of a [`Redacted`] value in declaration order.
pub trait FieldVisitor {
    /// Visit one field.
    fn visit(&mut self, name: &'static str, value: &dyn fmt::Display);
}

/// A value whose fields can be rendered with sensitive data withheld.
pub trait Redacted {
    /// The name rendered in front of the field list.
    fn type_name(&self) -> &'static str;

    /// The fields rendered verbatim.
    ///
    /// Default to no field, so that everything is redacted.
    fn safe_fields(&self) -> &'static [&'static str] {
        &[]
    }

    /// Visit every field of the value, in a stable order.
    fn visit_fields(&self, visitor: &mut dyn FieldVisitor);
}

impl<T: Redacted + ?Sized> Redacted for &T {
    fn type_name(&self) -> &'static str {
        (**self).type_name()
    }

    fn safe_fields(&self) -> &'static [&'static str] {
        (**self).safe_fields()
    }

    fn visit_fields(&self, visitor: &mut dyn FieldVisitor) {
        (**self).visit_fields(visitor)
    }
}

struct RedactingWriter {
    safe: &'static [&'static str],
    text: String,
    first: bool,
}

impl FieldVisitor for RedactingWriter {
    fn visit(&mut self, name: &'static str, value: &dyn fmt::Display) {
        if !self.first {
            self.text.push_str(", ");
        }
        self.first = false;

        // SAFETY: write to a string always succeeds
        if self.safe.contains(&name) {
            write!(&mut self.text, "{name}: \"{value}\"").unwrap();
        } else {
            write!(&mut self.text, "{name}: {REDACTED_MARKER}").unwrap();
        }
    }
}

/// Render a value as `TypeName(safe: "value", other: <redacted>)`.
///
/// Unsafe field values are never formatted.
pub fn render_redacted(value: &dyn Redacted) -> String {
    let mut writer = RedactingWriter {
        safe: value.safe_fields(),
        text: format!("{}(", value.type_name()),
        first: true,
    };
    value.visit_fields(&mut writer);
    writer.text.push(')');
    writer.text
}

/// Implement [`Redacted`] for a struct by listing its safe fields and all rendered fields.
///
/// Every listed field must implement [`Display`](std::fmt::Display).
///
/// ```
/// struct Card {
///     holder: String,
///     number: String,
///     cvc: u16,
/// }
///
/// steamclog::impl_redacted!(Card, safe = [holder], fields = [holder, number, cvc]);
/// ```
#[macro_export]
macro_rules! impl_redacted {
    ($ty:ident, safe = [$($safe:ident),* $(,)?], fields = [$($field:ident),* $(,)?]) => {
        impl $crate::Redacted for $ty {
            fn type_name(&self) -> &'static str {
                stringify!($ty)
            }

            fn safe_fields(&self) -> &'static [&'static str] {
                &[$(stringify!($safe)),*]
            }

            fn visit_fields(&self, visitor: &mut dyn $crate::redact::FieldVisitor) {
                $(visitor.visit(stringify!($field), &self.$field);)*
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LoginInfo {
        name: String,
        password: String,
        token: String,
    }

    crate::impl_redacted!(LoginInfo, safe = [name], fields = [name, password, token]);

    struct Opaque {
        id: u32,
        label: &'static str,
    }

    crate::impl_redacted!(Opaque, safe = [], fields = [id, label]);

    struct Empty;

    impl Redacted for Empty {
        fn type_name(&self) -> &'static str {
            "Empty"
        }

        fn safe_fields(&self) -> &'static [&'static str] {
            &["ghost"]
        }

        fn visit_fields(&self, _: &mut dyn FieldVisitor) {}
    }

    struct Undeclared {
        pin: u16,
    }

    impl Redacted for Undeclared {
        fn type_name(&self) -> &'static str {
            "Undeclared"
        }

        fn visit_fields(&self, visitor: &mut dyn FieldVisitor) {
            visitor.visit("pin", &self.pin);
        }
    }

    struct Panicking;

    impl fmt::Display for Panicking {
        fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
            panic!("redacted values must never be formatted");
        }
    }

    struct Guarded {
        visible: u8,
        hidden: Panicking,
    }

    crate::impl_redacted!(Guarded, safe = [visible], fields = [visible, hidden]);

    fn login() -> LoginInfo {
        LoginInfo {
            name: "cooldude".to_string(),
            password: "supersecretpassword".to_string(),
            token: "supersecrettoken".to_string(),
        }
    }

    #[test]
    fn test_safe_fields_verbatim_others_redacted() {
        let rendered = render_redacted(&login());
        insta::assert_snapshot!(rendered, @r#"LoginInfo(name: "cooldude", password: <redacted>, token: <redacted>)"#);
        assert!(!rendered.contains("supersecret"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let value = login();
        assert_eq!(render_redacted(&value), render_redacted(&value));
    }

    #[test]
    fn test_empty_safe_set_redacts_everything() {
        let rendered = render_redacted(&Opaque { id: 7, label: "x" });
        assert_eq!(rendered, "Opaque(id: <redacted>, label: <redacted>)");
    }

    #[test]
    fn test_undeclared_safe_set_redacts_everything() {
        assert_eq!(
            render_redacted(&Undeclared { pin: 1234 }),
            "Undeclared(pin: <redacted>)"
        );
    }

    #[test]
    fn test_zero_fields() {
        assert_eq!(render_redacted(&Empty), "Empty()");
    }

    #[test]
    fn test_redacted_values_are_never_formatted() {
        let rendered = render_redacted(&Guarded {
            visible: 1,
            hidden: Panicking,
        });
        assert_eq!(rendered, r#"Guarded(visible: "1", hidden: <redacted>)"#);
    }

    #[test]
    fn test_reference_forwarding() {
        let value = login();
        let by_ref: &LoginInfo = &value;
        assert_eq!(render_redacted(&by_ref), render_redacted(&value));
    }
}
