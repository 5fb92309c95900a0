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
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use arc_swap::ArcSwap;
use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use serde::Serialize;

use crate::AnalyticsBackend;
use crate::Config;
use crate::ErrorKind;
use crate::LogLevel;
use crate::Redacted;
use crate::Trap;
use crate::analytics::encode_properties;
use crate::analytics::redacted_properties;
use crate::analytics::withheld_properties;
use crate::config::DynError;
use crate::config::ExtraInfoPurpose;
use crate::destination::Destination;
use crate::destination::DestinationId;
use crate::destination::DestinationKind;
use crate::encode::Attachment;
use crate::encode::render_message;
use crate::logger::builder::Builder;
use crate::logger::dispatch::Slot;
use crate::logger::dispatch::Threshold;
use crate::logger::dispatch::passes_gate;
use crate::logger::worker::Failure;
use crate::record::InternalFailure;
use crate::record::Location;
use crate::record::Origin;
use crate::record::Record;

/// The prefix of errors demoted to warnings by the error filter.
pub const SUPPRESSED_PREFIX: &str = "[suppressed] ";

/// The logging facade.
///
/// Fans every leveled call out to the attached destinations whose threshold under the active
/// [`Config`] accepts it. Logging calls never fail; destination failures go to the
/// [`Trap`](crate::Trap).
///
/// # Examples
///
/// ```
/// use steamclog::Config;
/// use steamclog::Steamclog;
/// use steamclog::destination::Console;
///
/// let log = Steamclog::builder(Config::default())
///     .console(Console::default())
///     .build();
///
/// log.info("connected");
/// log.debug_with("session", steamclog::Attachment::plain(&("id", 42)));
/// ```
pub struct Steamclog {
    config: ArcSwap<Config>,
    slots: ArcSwap<Vec<Arc<Slot>>>,
    next_id: AtomicU64,
    analytics: Option<Box<dyn AnalyticsBackend>>,
    trap: Box<dyn Trap>,
    failures: Sender<Failure>,
    failed: Receiver<Failure>,
    crashing: AtomicBool,
}

impl fmt::Debug for Steamclog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Steamclog")
            .field("config", &self.config.load_full())
            .field("slots", &self.slots.load_full())
            .field("analytics", &self.analytics)
            .field("trap", &self.trap)
            .finish_non_exhaustive()
    }
}

impl Steamclog {
    /// Create a [`Builder`] for a facade with the given configuration.
    pub fn builder(config: Config) -> Builder {
        Builder::new(config)
    }

    pub(crate) fn new(
        config: Config,
        destinations: Vec<(Box<dyn Destination>, Threshold)>,
        analytics: Option<Box<dyn AnalyticsBackend>>,
        trap: Box<dyn Trap>,
    ) -> Steamclog {
        let (failures, failed) = crossbeam_channel::unbounded();

        let slots = destinations
            .into_iter()
            .enumerate()
            .map(|(i, (destination, threshold))| {
                let id = DestinationId(i as u64);
                Arc::new(Slot::new(id, destination, threshold, &failures, &*trap))
            })
            .collect::<Vec<_>>();

        Steamclog {
            config: ArcSwap::from_pointee(config),
            next_id: AtomicU64::new(slots.len() as u64),
            slots: ArcSwap::from_pointee(slots),
            analytics,
            trap,
            failures,
            failed,
            crashing: AtomicBool::new(false),
        }
    }

    /// Log a verbose message.
    #[track_caller]
    pub fn verbose(&self, message: &str) {
        self.log(LogLevel::Verbose, message, None, Location::caller());
    }

    /// Log a verbose message with an attached value.
    #[track_caller]
    pub fn verbose_with(&self, message: &str, attachment: Attachment) {
        self.log(
            LogLevel::Verbose,
            message,
            Some(&attachment),
            Location::caller(),
        );
    }

    /// Log a debug message.
    #[track_caller]
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message, None, Location::caller());
    }

    /// Log a debug message with an attached value.
    #[track_caller]
    pub fn debug_with(&self, message: &str, attachment: Attachment) {
        self.log(LogLevel::Debug, message, Some(&attachment), Location::caller());
    }

    /// Log an info message.
    #[track_caller]
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, None, Location::caller());
    }

    /// Log an info message with an attached value.
    #[track_caller]
    pub fn info_with(&self, message: &str, attachment: Attachment) {
        self.log(LogLevel::Info, message, Some(&attachment), Location::caller());
    }

    /// Log a warning.
    #[track_caller]
    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message, None, Location::caller());
    }

    /// Log a warning with an attached value.
    #[track_caller]
    pub fn warn_with(&self, message: &str, attachment: Attachment) {
        self.log(LogLevel::Warn, message, Some(&attachment), Location::caller());
    }

    /// Log an error.
    #[track_caller]
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message, None, Location::caller());
    }

    /// Log an error with an attached value.
    #[track_caller]
    pub fn error_with(&self, message: &str, attachment: Attachment) {
        self.log(LogLevel::Error, message, Some(&attachment), Location::caller());
    }

    /// Log an error value.
    ///
    /// When the configured error filter matches `err`, the event is demoted to a warning
    /// prefixed with `[suppressed]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io;
    ///
    /// use steamclog::Config;
    /// use steamclog::Steamclog;
    ///
    /// let config = Config::default().with_error_filter(|err| {
    ///     err.downcast_ref::<io::Error>()
    ///         .is_some_and(|err| err.kind() == io::ErrorKind::TimedOut)
    /// });
    /// let log = Steamclog::builder(config).build();
    ///
    /// // logged as "[suppressed] net failed: timed out" at warn level
    /// log.error_from("net failed", &io::Error::from(io::ErrorKind::TimedOut));
    /// ```
    #[track_caller]
    pub fn error_from(&self, message: &str, err: &DynError) {
        self.log_error(message, err, None, Location::caller());
    }

    /// Log an error value with an attached value, see [`Steamclog::error_from`].
    #[track_caller]
    pub fn error_from_with(&self, message: &str, err: &DynError, attachment: Attachment) {
        self.log_error(message, err, Some(&attachment), Location::caller());
    }

    /// Log a fatal message, flush every destination, then crash.
    ///
    /// This never returns: the configured crash handler terminates the process with a
    /// description of the call site.
    #[track_caller]
    pub fn fatal(&self, message: &str) -> ! {
        self.crash(message, None, None, Location::caller())
    }

    /// Log a fatal message with an attached value, then crash. See [`Steamclog::fatal`].
    #[track_caller]
    pub fn fatal_with(&self, message: &str, attachment: Attachment) -> ! {
        self.crash(message, None, Some(&attachment), Location::caller())
    }

    /// Log a fatal error value, then crash. See [`Steamclog::fatal`].
    #[track_caller]
    pub fn fatal_from(&self, message: &str, err: &DynError) -> ! {
        self.crash(message, Some(err), None, Location::caller())
    }

    /// Log a fatal error value with an attached value, then crash. See [`Steamclog::fatal`].
    #[track_caller]
    pub fn fatal_from_with(&self, message: &str, err: &DynError, attachment: Attachment) -> ! {
        self.crash(message, Some(err), Some(&attachment), Location::caller())
    }

    /// Submit a problem report on behalf of the user.
    ///
    /// Reports bypass level thresholds: every enabled destination not switched off takes them, and
    /// remote destinations capture them as events.
    #[track_caller]
    pub fn user_report(&self, title: &str, description: &str) {
        let config = self.config.load();
        let record = Record::builder()
            .level(LogLevel::Info)
            .origin(Origin::UserReport)
            .target(config.identifier())
            .location(Location::caller())
            .payload(format!("{title}: {description}"))
            .key_values(config.extra_info(ExtraInfoPurpose::UserReport))
            .build();
        self.dispatch(&config, &record);
    }

    /// Track an analytics event.
    ///
    /// When the active preset disables analytics or no backend is attached, an info message is
    /// logged instead.
    #[track_caller]
    pub fn track(&self, name: &str, properties: &BTreeMap<String, String>) {
        let enabled = self.config.load().preset().analytics_enabled();
        match &self.analytics {
            Some(analytics) if enabled => {
                if let Err(err) = analytics.log_event(name, properties) {
                    self.trap.trap(&err);
                }
            }
            _ => self.info(&format!("Skipped logging analytics event: {name} ...")),
        }
    }

    /// Track an analytics event whose properties are the fields of `value`.
    ///
    /// See [`encode_properties`](crate::analytics::encode_properties) for the encoding. When the
    /// configuration requires redaction, the fields are withheld and the single `value` property
    /// carries [`REDACTION_REQUIRED_NOTICE`](crate::REDACTION_REQUIRED_NOTICE) instead; use
    /// [`track_redacted`](Steamclog::track_redacted) for values that must reach analytics.
    #[track_caller]
    pub fn track_encodable<T: Serialize + ?Sized>(&self, name: &str, value: &T) {
        if self.config.load().require_redacted() {
            self.track(name, &withheld_properties());
            return;
        }

        match encode_properties(value) {
            Ok(properties) => self.track(name, &properties),
            Err(_) => self.warn(&format!("Failed to encode {name} to dictionary.")),
        }
    }

    /// Track an analytics event whose `value` property is the redacted rendering of `value`.
    #[track_caller]
    pub fn track_redacted(&self, name: &str, value: &dyn Redacted) {
        self.track(name, &redacted_properties(value));
    }

    /// Attach a destination with a fixed threshold.
    ///
    /// The threshold does not follow later configuration swaps.
    pub fn attach(
        &self,
        destination: impl Into<Box<dyn Destination>>,
        level: LogLevel,
    ) -> DestinationId {
        self.attach_slot(destination.into(), Threshold::Fixed(level))
    }

    /// Attach a destination whose threshold follows the active preset.
    pub fn attach_following_preset(
        &self,
        destination: impl Into<Box<dyn Destination>>,
    ) -> DestinationId {
        self.attach_slot(destination.into(), Threshold::Preset)
    }

    fn attach_slot(
        &self,
        destination: Box<dyn Destination>,
        threshold: Threshold,
    ) -> DestinationId {
        let id = DestinationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let slot = Arc::new(Slot::new(
            id,
            destination,
            threshold,
            &self.failures,
            &*self.trap,
        ));
        self.slots.rcu(|slots| {
            let mut slots = Vec::clone(slots);
            slots.push(slot.clone());
            slots
        });
        id
    }

    /// Detach a destination. Returns whether it was attached.
    ///
    /// Records already handed to its worker are still emitted.
    pub fn detach(&self, id: DestinationId) -> bool {
        let previous = self.slots.rcu(|slots| {
            slots
                .iter()
                .filter(|slot| slot.id() != id)
                .cloned()
                .collect::<Vec<_>>()
        });
        previous.iter().any(|slot| slot.id() == id)
    }

    /// Enable or disable a destination without detaching it. Returns whether it is attached.
    pub fn set_enabled(&self, id: DestinationId, enabled: bool) -> bool {
        match self.slots.load().iter().find(|slot| slot.id() == id) {
            Some(slot) => {
                slot.set_enabled(enabled);
                true
            }
            None => false,
        }
    }

    /// Atomically replace the configuration.
    ///
    /// The next dispatched event uses the thresholds of the new preset. Dispatches that already
    /// started complete under the previous configuration.
    pub fn replace_config(&self, config: Config) {
        self.config.store(Arc::new(config));
    }

    /// The active configuration.
    pub fn config(&self) -> Arc<Config> {
        self.config.load_full()
    }

    /// Whether any destination would take an event of the given level.
    pub fn enabled(&self, level: LogLevel) -> bool {
        let config = self.config.load();
        self.any_accepts(&config, level)
    }

    /// Read the contents of the log file.
    ///
    /// Returns `None` if there is no file destination; read failures are logged as a warning.
    #[track_caller]
    pub fn get_log_file_contents(&self) -> Option<String> {
        let slots = self.slots.load();
        let slot = slots
            .iter()
            .find(|slot| slot.destination().kind() == DestinationKind::File)?;

        if let Err(err) = slot.flush() {
            self.trap.trap(&err);
        }
        match slot.destination().read_back() {
            Ok(contents) => contents,
            Err(err) => {
                self.warn(&format!("Failed to retrieve log file data: {err}"));
                None
            }
        }
    }

    /// Delete the log file. Returns whether there was a file destination that succeeded.
    ///
    /// Delete failures are logged as a warning.
    #[track_caller]
    pub fn delete_log_file(&self) -> bool {
        let slots = self.slots.load();
        let Some(slot) = slots
            .iter()
            .find(|slot| slot.destination().kind() == DestinationKind::File)
        else {
            return false;
        };

        if let Err(err) = slot.flush() {
            self.trap.trap(&err);
        }
        match slot.destination().delete_contents() {
            Ok(()) => true,
            Err(err) => {
                self.warn(&format!("Failed to delete log file: {err}"));
                false
            }
        }
    }

    /// Block until every destination emitted what was dispatched to it, then flush them.
    pub fn flush(&self) {
        let config = self.config.load();
        self.flush_slots();
        // handling failures may dispatch internal records, which need flushing too
        if self.drain_failures(&config) {
            self.flush_slots();
            self.drain_failures(&config);
        }
    }

    /// Dispatch a record built outside of the leveled calls, such as by the `log` bridge.
    pub(crate) fn log_record(
        &self,
        level: LogLevel,
        location: Location,
        payload: String,
        mut kvs: BTreeMap<String, String>,
    ) {
        let config = self.config.load();
        if !self.any_accepts(&config, level) {
            return;
        }

        if level == LogLevel::Error {
            kvs.extend(config.extra_info(ExtraInfoPurpose::Error));
        }
        let record = Record::builder()
            .level(level)
            .target(config.identifier())
            .location(location)
            .payload(payload)
            .key_values(kvs)
            .build();
        self.dispatch(&config, &record);
    }

    fn log(
        &self,
        level: LogLevel,
        message: &str,
        attachment: Option<&Attachment>,
        location: Location,
    ) {
        let config = self.config.load();
        if !self.any_accepts(&config, level) {
            return;
        }

        let payload = render_message(message, attachment, config.require_redacted());
        let kvs = match level {
            LogLevel::Error => config.extra_info(ExtraInfoPurpose::Error),
            _ => BTreeMap::new(),
        };
        let record = Record::builder()
            .level(level)
            .target(config.identifier())
            .location(location)
            .payload(payload)
            .key_values(kvs)
            .build();
        self.dispatch(&config, &record);
    }

    fn log_error(
        &self,
        message: &str,
        err: &DynError,
        attachment: Option<&Attachment>,
        location: Location,
    ) {
        let message = format!("{message}: {err}");
        if self.config.load().should_suppress(err) {
            // the demoted event keeps the error description and the attachment
            let message = format!("{SUPPRESSED_PREFIX}{message}");
            self.log(LogLevel::Warn, &message, attachment, location);
        } else {
            self.log(LogLevel::Error, &message, attachment, location);
        }
    }

    fn crash(
        &self,
        message: &str,
        err: Option<&DynError>,
        attachment: Option<&Attachment>,
        location: Location,
    ) -> ! {
        let config = self.config.load_full();
        let message = match err {
            Some(err) => format!("{message}: {err}"),
            None => message.to_string(),
        };

        let record = Record::builder()
            .level(LogLevel::Fatal)
            .target(config.identifier())
            .location(location)
            .payload(render_message(&message, attachment, config.require_redacted()))
            .key_values(config.extra_info(ExtraInfoPurpose::Fatal))
            .build();
        self.dispatch(&config, &record);
        self.flush();

        if self.crashing.swap(true, Ordering::AcqRel) {
            // another thread is already crashing the process
            loop {
                std::thread::park();
            }
        }

        let crash = format!("{}: {message}", location.describe());
        (config.crash_handler())(&crash)
    }

    fn any_accepts(&self, config: &Config, level: LogLevel) -> bool {
        let preset = config.preset();
        if level != LogLevel::Fatal && !level.passes(preset.global()) {
            return false;
        }
        self.slots
            .load()
            .iter()
            .any(|slot| slot.accepts(&preset, level))
    }

    fn dispatch(&self, config: &Config, record: &Record) {
        self.drain_failures(config);

        let preset = config.preset();
        if !passes_gate(&preset, record) {
            return;
        }

        let slots = self.slots.load();
        for slot in slots.iter().filter(|slot| slot.accepts_record(&preset, record)) {
            if let Err(error) = slot.deliver(record) {
                self.handle_failure(
                    config,
                    Failure {
                        slot: slot.id(),
                        record: Some(record.clone()),
                        error,
                    },
                );
            }
        }
    }

    // returns whether any failure was handled
    fn drain_failures(&self, config: &Config) -> bool {
        let mut drained = false;
        while let Ok(failure) = self.failed.try_recv() {
            drained = true;
            self.handle_failure(config, failure);
        }
        drained
    }

    fn handle_failure(&self, config: &Config, failure: Failure) {
        let Failure {
            slot,
            record,
            error,
        } = failure;
        self.trap.trap(&error);

        let Some(record) = record else {
            return;
        };
        if error.kind() != ErrorKind::FileRotation || record.origin() != Origin::Application {
            return;
        }

        // report through every other destination; failures doing so are only trapped
        let internal = Record::builder()
            .level(LogLevel::Error)
            .origin(Origin::Internal(InternalFailure::FileRotation))
            .target(config.identifier())
            .location(*record.location())
            .payload(format!("Log file rotation failed: {error}"))
            .build();
        let preset = config.preset();
        let slots = self.slots.load();
        for other in slots
            .iter()
            .filter(|other| other.id() != slot && other.accepts_record(&preset, &internal))
        {
            if let Err(err) = other.deliver(&internal) {
                self.trap.trap(&err);
            }
        }
    }

    fn flush_slots(&self) {
        for slot in self.slots.load().iter() {
            if let Err(err) = slot.flush() {
                self.trap.trap(&err);
            }
        }
    }
}

impl Drop for Steamclog {
    fn drop(&mut self) {
        // joining the workers drains their queues
        self.slots.store(Arc::new(Vec::new()));
        while let Ok(failure) = self.failed.try_recv() {
            self.trap.trap(&failure.error);
        }
    }
}
