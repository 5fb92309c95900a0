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
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;

use crate::Error;
use crate::ErrorKind;
use crate::destination::Destination;
use crate::destination::DestinationId;
use crate::record::Record;

pub(crate) enum Task {
    Emit(Box<Record>),
    Flush(Sender<()>),
}

/// A destination failure, reported back from wherever the destination ran.
#[derive(Debug)]
pub(crate) struct Failure {
    pub(crate) slot: DestinationId,
    // absent for flush failures
    pub(crate) record: Option<Record>,
    pub(crate) error: Error,
}

/// The dedicated thread of a worker-mode destination, the single caller of its `emit`.
#[derive(Debug)]
pub(crate) struct Worker(Option<State>);

#[derive(Debug)]
struct State {
    sender: Sender<Task>,
    handle: JoinHandle<()>,
}

impl Worker {
    pub(crate) fn spawn(
        thread_name: String,
        slot: DestinationId,
        destination: Arc<dyn Destination>,
        failures: Sender<Failure>,
    ) -> Result<Worker, Error> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let handle = std::thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || run(receiver, slot, destination, failures))
            .map_err(|err| {
                Error::new("failed to spawn destination worker")
                    .with_context("thread", thread_name)
                    .with_source(err)
            })?;

        Ok(Worker(Some(State { sender, handle })))
    }

    pub(crate) fn send(&self, record: &Record) -> Result<(), Error> {
        self.send_task(Task::Emit(Box::new(record.clone())))
    }

    /// Wait until every record sent before was emitted and the destination flushed.
    pub(crate) fn flush(&self) -> Result<(), Error> {
        let (ack, done) = crossbeam_channel::bounded(1);
        self.send_task(Task::Flush(ack))?;
        done.recv().map_err(|_| {
            Error::new("destination worker exited before flushing")
                .with_kind(ErrorKind::WorkerDisconnected)
        })
    }

    fn send_task(&self, task: Task) -> Result<(), Error> {
        let state = self.0.as_ref().ok_or_else(disconnected)?;
        state.sender.send(task).map_err(|_| disconnected())
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if let Some(State { sender, handle }) = self.0.take() {
            // drop our sender, the thread breaks the loop after processing what is queued
            drop(sender);

            // wait for the thread to finish
            let _ = handle.join();
        }
    }
}

fn disconnected() -> Error {
    Error::new("destination worker is gone").with_kind(ErrorKind::WorkerDisconnected)
}

fn run(
    receiver: Receiver<Task>,
    slot: DestinationId,
    destination: Arc<dyn Destination>,
    failures: Sender<Failure>,
) {
    while let Ok(task) = receiver.recv() {
        match task {
            Task::Emit(record) => {
                if let Err(error) = destination.emit(&record) {
                    let _ = failures.send(Failure {
                        slot,
                        record: Some(*record),
                        error,
                    });
                }
            }
            Task::Flush(ack) => {
                if let Err(error) = destination.flush() {
                    let _ = failures.send(Failure {
                        slot,
                        record: None,
                        error,
                    });
                }
                let _ = ack.send(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::LogLevel;
    use crate::destination::DestinationKind;
    use crate::destination::DispatchMode;

    #[derive(Debug, Default)]
    struct Collect {
        payloads: Mutex<Vec<String>>,
        threads: Mutex<Vec<Option<String>>>,
    }

    impl Destination for Arc<Collect> {
        fn kind(&self) -> DestinationKind {
            DestinationKind::Other
        }

        fn dispatch_mode(&self) -> DispatchMode {
            DispatchMode::Worker
        }

        fn emit(&self, record: &Record) -> Result<(), Error> {
            if record.payload() == "bad" {
                return Err(Error::new("rejected"));
            }
            let thread = std::thread::current().name().map(ToOwned::to_owned);
            self.threads.lock().unwrap().push(thread);
            self.payloads.lock().unwrap().push(record.payload().to_string());
            Ok(())
        }
    }

    fn record(payload: &str) -> Record {
        Record::builder()
            .level(LogLevel::Info)
            .payload(payload)
            .build()
    }

    #[test]
    fn test_flush_waits_for_queued_records() {
        let collect = Arc::new(Collect::default());
        let (failures, failed) = crossbeam_channel::unbounded();
        let worker = Worker::spawn(
            "steamclog-test".to_string(),
            DestinationId(7),
            Arc::new(collect.clone()),
            failures,
        )
        .unwrap();

        for i in 0..100 {
            worker.send(&record(&i.to_string())).unwrap();
        }
        worker.send(&record("bad")).unwrap();
        worker.flush().unwrap();

        let payloads = collect.payloads.lock().unwrap().clone();
        assert_eq!(payloads, (0..100).map(|i| i.to_string()).collect::<Vec<_>>());
        assert!(
            collect
                .threads
                .lock()
                .unwrap()
                .iter()
                .all(|thread| thread.as_deref() == Some("steamclog-test"))
        );

        let failure = failed.try_recv().unwrap();
        assert_eq!(failure.slot, DestinationId(7));
        assert_eq!(failure.record.unwrap().payload(), "bad");
        assert!(failed.try_recv().is_err());
    }

    #[test]
    fn test_drop_drains_the_queue() {
        let collect = Arc::new(Collect::default());
        let (failures, _failed) = crossbeam_channel::unbounded();
        let worker = Worker::spawn(
            "steamclog-test".to_string(),
            DestinationId(0),
            Arc::new(collect.clone()),
            failures,
        )
        .unwrap();

        worker.send(&record("last words")).unwrap();
        drop(worker);

        assert_eq!(*collect.payloads.lock().unwrap(), vec!["last words"]);
    }
}
