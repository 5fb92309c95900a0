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

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::LogLevel;
use crate::Steamclog;
use crate::record::Location;

/// A [`log::Log`] implementation forwarding `log` crate records to a [`Steamclog`] facade.
///
/// `log` levels map to the closest [`LogLevel`], with `trace` becoming
/// [`LogLevel::Verbose`]. Key-values are kept as the record's extra info.
#[derive(Debug, Clone)]
pub struct LogBridge {
    logger: Arc<Steamclog>,
}

impl LogBridge {
    /// Create a bridge forwarding to the given facade.
    pub fn new(logger: Arc<Steamclog>) -> Self {
        Self { logger }
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.logger.enabled(metadata.level().into())
    }

    fn log(&self, record: &log::Record) {
        let level = LogLevel::from(record.level());
        if !self.logger.enabled(level) {
            return;
        }

        let location = Location::new(
            record.module_path_static(),
            record.file_static().unwrap_or("<unknown>"),
            record.line().unwrap_or_default(),
        );

        struct KeyValueVisitor<'a> {
            kvs: &'a mut BTreeMap<String, String>,
        }

        impl<'kvs> log::kv::VisitSource<'kvs> for KeyValueVisitor<'_> {
            fn visit_pair(
                &mut self,
                key: log::kv::Key<'kvs>,
                value: log::kv::Value<'kvs>,
            ) -> Result<(), log::kv::Error> {
                self.kvs.insert(key.as_str().to_string(), value.to_string());
                Ok(())
            }
        }

        let mut kvs = BTreeMap::new();
        // the visitor never fails
        let _ = record
            .key_values()
            .visit(&mut KeyValueVisitor { kvs: &mut kvs });

        self.logger
            .log_record(level, location, record.args().to_string(), kvs);
    }

    fn flush(&self) {
        self.logger.flush();
    }
}

/// Set up the log crate global logger.
///
/// This function calls [`log::set_boxed_logger`] with a [`LogBridge`], so that all logs from the
/// log crate are forwarded to the given facade.
///
/// This should be called early in the execution of a Rust program. Any log events that occur
/// before initialization will be ignored.
///
/// This function will set the global maximum log level to `Trace`. To override this, call
/// [`log::set_max_level`] after this function.
///
/// # Errors
///
/// Return an error if the log crate global logger has already been set.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
///
/// use steamclog::Config;
/// use steamclog::Steamclog;
///
/// let log = Arc::new(Steamclog::builder(Config::default()).build());
/// if let Err(err) = steamclog::bridge::try_setup_log_crate(log) {
///     eprintln!("failed to setup log crate: {err}");
/// }
/// ```
pub fn try_setup_log_crate(logger: Arc<Steamclog>) -> Result<(), log::SetLoggerError> {
    log::set_boxed_logger(Box::new(LogBridge::new(logger)))?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

/// Set up the log crate global logger.
///
/// See [`try_setup_log_crate`].
///
/// # Panics
///
/// Panic if the log crate global logger has already been set.
pub fn setup_log_crate(logger: Arc<Steamclog>) {
    try_setup_log_crate(logger).expect(
        "steamclog::bridge::setup_log_crate must be called before the log crate global logger initialized",
    )
}
