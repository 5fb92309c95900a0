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

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use crossbeam_channel::Sender;

use crate::Error;
use crate::LogLevel;
use crate::LogLevelPreset;
use crate::Trap;
use crate::destination::Destination;
use crate::destination::DestinationId;
use crate::destination::DestinationKind;
use crate::destination::DispatchMode;
use crate::logger::worker::Failure;
use crate::logger::worker::Worker;
use crate::record::Origin;
use crate::record::Record;

/// Where the threshold of an attached destination comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Threshold {
    /// Derived from the active preset by the destination's kind.
    Preset,
    /// Fixed when attached.
    Fixed(LogLevel),
}

/// An attached destination.
#[derive(Debug)]
pub(crate) struct Slot {
    id: DestinationId,
    destination: Arc<dyn Destination>,
    threshold: Threshold,
    enabled: AtomicBool,
    worker: Option<Worker>,
}

impl Slot {
    pub(crate) fn new(
        id: DestinationId,
        destination: Box<dyn Destination>,
        threshold: Threshold,
        failures: &Sender<Failure>,
        trap: &dyn Trap,
    ) -> Slot {
        let destination: Arc<dyn Destination> = Arc::from(destination);

        let worker = match destination.dispatch_mode() {
            DispatchMode::Inline => None,
            DispatchMode::Worker => {
                let thread_name = format!("steamclog-{}", kind_name(destination.kind()));
                match Worker::spawn(thread_name, id, destination.clone(), failures.clone()) {
                    Ok(worker) => Some(worker),
                    Err(err) => {
                        // emit on the calling threads instead
                        trap.trap(&err);
                        None
                    }
                }
            }
        };

        Slot {
            id,
            destination,
            threshold,
            enabled: AtomicBool::new(true),
            worker,
        }
    }

    pub(crate) fn id(&self) -> DestinationId {
        self.id
    }

    pub(crate) fn destination(&self) -> &dyn Destination {
        &*self.destination
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    /// The threshold under the given preset.
    ///
    /// Kinds the preset has no threshold for never accept anything unless attached with a fixed
    /// level.
    pub(crate) fn threshold(&self, preset: &LogLevelPreset) -> LogLevel {
        match self.threshold {
            Threshold::Fixed(level) => level,
            Threshold::Preset => preset
                .level_for(self.destination.kind())
                .unwrap_or(LogLevel::None),
        }
    }

    /// Whether an event of the given level is emitted to this destination.
    pub(crate) fn accepts(&self, preset: &LogLevelPreset, level: LogLevel) -> bool {
        self.enabled.load(Ordering::Acquire) && level.passes(self.threshold(preset))
    }

    /// Whether the record is emitted to this destination.
    ///
    /// User reports are explicit user actions: every enabled destination that is not switched off
    /// takes them, whatever their level.
    pub(crate) fn accepts_record(&self, preset: &LogLevelPreset, record: &Record) -> bool {
        match record.origin() {
            Origin::UserReport => {
                self.enabled.load(Ordering::Acquire) && self.threshold(preset) != LogLevel::None
            }
            Origin::Application | Origin::Internal(_) => self.accepts(preset, record.level()),
        }
    }

    /// Hand the record to the destination, or to its worker.
    pub(crate) fn deliver(&self, record: &Record) -> Result<(), Error> {
        match &self.worker {
            Some(worker) => worker.send(record),
            None => self.destination.emit(record),
        }
    }

    /// Flush the destination, waiting for its worker to drain.
    pub(crate) fn flush(&self) -> Result<(), Error> {
        match &self.worker {
            Some(worker) => worker.flush(),
            None => self.destination.flush(),
        }
    }
}

/// Whether the record passes the preset's global gate.
///
/// Fatal events, user reports and internal failures are never held back by the gate.
pub(crate) fn passes_gate(preset: &LogLevelPreset, record: &Record) -> bool {
    match record.origin() {
        Origin::Application if record.level() != LogLevel::Fatal => {
            record.level().passes(preset.global())
        }
        _ => true,
    }
}

fn kind_name(kind: DestinationKind) -> &'static str {
    match kind {
        DestinationKind::Console => "console",
        DestinationKind::File => "file",
        DestinationKind::Remote => "remote",
        DestinationKind::Other => "destination",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::CustomLevels;
    use crate::trap::DefaultTrap;

    #[derive(Debug)]
    struct Null(DestinationKind);

    impl Destination for Null {
        fn kind(&self) -> DestinationKind {
            self.0
        }

        fn emit(&self, _: &Record) -> Result<(), Error> {
            Ok(())
        }
    }

    fn slot(kind: DestinationKind, threshold: Threshold) -> Slot {
        let (failures, _) = crossbeam_channel::unbounded();
        Slot::new(
            DestinationId(0),
            Box::new(Null(kind)),
            threshold,
            &failures,
            &DefaultTrap::default(),
        )
    }

    fn custom(console: LogLevel, file: LogLevel, remote: LogLevel) -> LogLevelPreset {
        LogLevelPreset::Custom(CustomLevels {
            global: LogLevel::Verbose,
            console,
            file,
            remote,
            analytics_enabled: false,
        })
    }

    #[test]
    fn test_acceptance_matrix() {
        let thresholds = [
            LogLevel::Verbose,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
            LogLevel::Fatal,
            LogLevel::None,
        ];

        for threshold in thresholds {
            let preset = custom(threshold, LogLevel::None, LogLevel::None);
            let slot = slot(DestinationKind::Console, Threshold::Preset);

            for level in LogLevel::EVENT_LEVELS {
                let expected = threshold != LogLevel::None && level.rank() >= threshold.rank();
                assert_eq!(slot.accepts(&preset, level), expected, "{level} at {threshold}");

                slot.set_enabled(false);
                assert!(!slot.accepts(&preset, level));
                slot.set_enabled(true);
            }
        }
    }

    #[test]
    fn test_fixed_threshold_ignores_preset() {
        let slot = slot(DestinationKind::Remote, Threshold::Fixed(LogLevel::Info));
        let preset = LogLevelPreset::Develop;
        assert_eq!(slot.threshold(&preset), LogLevel::Info);
        assert!(slot.accepts(&preset, LogLevel::Info));
        assert!(!slot.accepts(&preset, LogLevel::Debug));
    }

    #[test]
    fn test_other_kind_needs_fixed_threshold() {
        let slot = slot(DestinationKind::Other, Threshold::Preset);
        assert_eq!(slot.threshold(&LogLevelPreset::Firehose), LogLevel::None);
        assert!(!slot.accepts(&LogLevelPreset::Firehose, LogLevel::Fatal));
    }

    #[test]
    fn test_user_reports_skip_rank_comparison() {
        let preset = LogLevelPreset::Release;
        let remote = slot(DestinationKind::Remote, Threshold::Preset);
        let console = slot(DestinationKind::Console, Threshold::Preset);

        let report = Record::builder()
            .level(LogLevel::Info)
            .origin(Origin::UserReport)
            .build();
        assert!(remote.accepts_record(&preset, &report));
        assert!(!console.accepts_record(&preset, &report));
    }

    #[test]
    fn test_gate() {
        let preset = LogLevelPreset::Release;
        let info = Record::builder().level(LogLevel::Info).build();
        let fatal = Record::builder().level(LogLevel::Fatal).build();
        assert!(!passes_gate(&preset, &info));
        assert!(passes_gate(&preset, &fatal));

        let preset = LogLevelPreset::Custom(CustomLevels {
            global: LogLevel::None,
            console: LogLevel::Verbose,
            file: LogLevel::None,
            remote: LogLevel::None,
            analytics_enabled: false,
        });
        assert!(!passes_gate(&preset, &Record::builder().level(LogLevel::Error).build()));
        assert!(passes_gate(&preset, &fatal));
    }
}
