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

//! Steamclog is a leveled logging facade that fans events out to console, log file and crash
//! reporting destinations, with redaction-aware rendering of attached values.
//!
//! # Overview
//!
//! A [`Steamclog`] facade holds an immutable [`Config`] snapshot and a set of destinations. Each
//! destination takes the events at or above its threshold, which by default follows the active
//! [`LogLevelPreset`]. Attached values are JSON encoded, unless the configuration requires values
//! to implement [`Redacted`], which withholds every field not declared safe.
//!
//! Logging calls never fail. Destination failures are handed to a [`Trap`]; a failure to rotate
//! the log file is also reported through the other destinations.
//!
//! # Examples
//!
//! ```
//! use steamclog::Attachment;
//! use steamclog::Config;
//! use steamclog::LogLevelPreset;
//! use steamclog::Steamclog;
//! use steamclog::destination::Console;
//!
//! struct User {
//!     name: String,
//!     email: String,
//! }
//!
//! steamclog::impl_redacted!(User, safe = [name], fields = [name, email]);
//!
//! let log = Steamclog::builder(
//!     Config::default()
//!         .with_preset(LogLevelPreset::Develop)
//!         .with_require_redacted(true),
//! )
//! .console(Console::default())
//! .build();
//!
//! let user = User {
//!     name: "ferris".to_string(),
//!     email: "ferris@example.com".to_string(),
//! };
//! log.info("started");
//! log.warn_with("login throttled", Attachment::redacted(&user));
//! ```
//!
//! Forward records of the `log` crate:
//!
//! ```
//! use std::sync::Arc;
//!
//! use steamclog::Config;
//! use steamclog::Steamclog;
//! use steamclog::destination::Console;
//!
//! let log = Arc::new(Steamclog::builder(Config::default()).console(Console::default()).build());
//! steamclog::bridge::setup_log_crate(log);
//!
//! log::info!("This is an info message.");
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod analytics;
pub mod bridge;
pub mod config;
pub mod destination;
pub mod encode;
pub mod layout;
pub mod preset;
pub mod record;
pub mod redact;
pub mod trap;

mod error;
mod level;
mod logger;

pub use self::analytics::AnalyticsBackend;
pub use self::bridge::LogBridge;
pub use self::config::Config;
pub use self::destination::Destination;
pub use self::destination::DestinationId;
pub use self::encode::Attachment;
pub use self::encode::REDACTION_REQUIRED_NOTICE;
pub use self::error::Error;
pub use self::error::ErrorKind;
pub use self::layout::Layout;
pub use self::level::LogLevel;
pub use self::logger::Builder;
pub use self::logger::SUPPRESSED_PREFIX;
pub use self::logger::Steamclog;
pub use self::preset::CustomLevels;
pub use self::preset::LogLevelPreset;
pub use self::preset::PresetOverrides;
pub use self::redact::Redacted;
pub use self::trap::DefaultTrap;
pub use self::trap::Trap;
