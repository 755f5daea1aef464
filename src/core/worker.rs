//! Bounded queue plus one dedicated worker thread per writer

use super::{
    error::{LoggerError, Result},
    metrics::WriterMetrics,
    record::Record,
    supervisor,
    writer::Sink,
};
use crossbeam_channel::{bounded, never, select, unbounded, Receiver, Sender};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Default per-writer queue capacity
pub const DEFAULT_BUFFER_LENGTH: usize = 32;

/// Out-of-band requests handled by the worker between records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Rotate,
}

enum Event {
    Control(Option<Control>),
    Record(Option<Arc<Record>>),
}

/// Owns the queue and the thread draining it into a [`Sink`].
///
/// The queue stays open for as long as the handle lives, even after the
/// worker has stopped on a sink error: records then pile up until the queue
/// is full and further callers block instead of losing records silently.
pub struct Worker {
    name: String,
    sender: RwLock<Option<Sender<Arc<Record>>>>,
    control: Sender<Control>,
    _parked: Receiver<Arc<Record>>,
    handle: Mutex<Option<JoinHandle<()>>>,
    metrics: Arc<WriterMetrics>,
}

impl Worker {
    /// Start a worker that owns `sink` exclusively.
    ///
    /// # Errors
    ///
    /// Returns error if the thread cannot be spawned
    pub fn spawn<S: Sink>(sink: S, capacity: usize, metrics: Arc<WriterMetrics>) -> Result<Self> {
        let name = sink.name().to_string();
        let (sender, receiver) = bounded(capacity.max(1));
        let (control_tx, control_rx) = unbounded();
        let parked = receiver.clone();

        metrics.set_alive(true);
        let worker_metrics = Arc::clone(&metrics);
        let thread_name = format!("log-writer-{}", name);

        let handle = thread::Builder::new()
            .name(thread_name)
            .spawn(move || {
                let mut sink = sink;
                let name = sink.name().to_string();
                supervisor::supervise(
                    &name,
                    &worker_metrics,
                    &mut sink,
                    |sink| drain(sink, &receiver, &control_rx),
                    |sink| sink.close(),
                );
                worker_metrics.set_alive(false);
            })
            .map_err(|source| {
                metrics.set_alive(false);
                LoggerError::WorkerSpawn {
                    name: name.clone(),
                    source,
                }
            })?;

        Ok(Self {
            name,
            sender: RwLock::new(Some(sender)),
            control: control_tx,
            _parked: parked,
            handle: Mutex::new(Some(handle)),
            metrics,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metrics(&self) -> &WriterMetrics {
        &self.metrics
    }

    /// Enqueue a record, blocking while the queue is full.
    pub fn push(&self, record: Arc<Record>) {
        // Clone so a blocked caller never holds the lock `close` needs
        let sender = self.sender.read().clone();
        match sender {
            Some(sender) => {
                if sender.send(record).is_err() {
                    self.metrics.record_failed();
                }
            }
            None => self.metrics.record_failed(),
        }
    }

    /// Ask the worker to run its sink's rotation between records.
    pub fn request(&self, control: Control) {
        if self.control.send(control).is_err() {
            eprintln!(
                "[LOGGER WARNING] Writer '{}' is gone, {:?} request ignored",
                self.name, control
            );
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender.read().is_none()
    }

    /// Close the queue and wait for the worker to drain it and release the sink.
    pub fn close(&self) {
        let Some(sender) = self.sender.write().take() else {
            return;
        };
        drop(sender);

        if let Some(handle) = self.handle.lock().take() {
            if let Err(e) = handle.join() {
                eprintln!(
                    "[LOGGER ERROR] Worker thread for '{}' panicked during shutdown: {:?}",
                    self.name, e
                );
            }
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.close();
    }
}

fn drain<S: Sink>(
    sink: &mut S,
    records: &Receiver<Arc<Record>>,
    control: &Receiver<Control>,
) -> Result<()> {
    let disabled = never();
    let mut control_open = true;

    loop {
        let control_rx = if control_open { control } else { &disabled };
        let event = select! {
            recv(control_rx) -> msg => Event::Control(msg.ok()),
            recv(records) -> msg => Event::Record(msg.ok()),
        };

        match event {
            Event::Control(Some(Control::Rotate)) => sink.rotate()?,
            Event::Control(None) => control_open = false,
            Event::Record(Some(record)) => {
                sink.write(&record)?;
                if records.is_empty() {
                    sink.flush()?;
                }
            }
            Event::Record(None) => return sink.flush(),
        }
    }
}
