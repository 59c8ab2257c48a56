use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::{self, JoinHandle};

use tracing::{Span, debug, warn};

use crate::WorkerError;

/// Run state of a [`Worker`]. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum WorkerState {
    Created = 0,
    Prepared = 1,
    Working = 2,
    Finished = 3,
}

impl WorkerState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Created,
            1 => Self::Prepared,
            2 => Self::Working,
            _ => Self::Finished,
        }
    }
}

/// A background task with prepare → work → finish hooks.
///
/// `prepare` acquires the task's resource (an open file, say), `work`
/// borrows it, and `finish` consumes it. `finish` runs right after `work`
/// returns, whether it returned `Ok`, `Err` or panicked. If `prepare` fails
/// nothing else runs. Either way the state ends at
/// [`WorkerState::Finished`].
///
/// Running consumes the worker, so an instance can never be restarted.
#[derive(Debug)]
pub struct Worker {
    name: String,
    state: Arc<AtomicU8>,
    span: Span,
}

impl Worker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(AtomicU8::new(WorkerState::Created as u8)),
            span: Span::none(),
        }
    }

    /// Log handle the worker enters while it runs.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> WorkerState {
        load(&self.state)
    }

    fn set(&self, state: WorkerState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Drives the full lifecycle on the calling thread.
    pub fn run<S, T, P, W, F>(self, prepare: P, work: W, finish: F) -> Result<T, WorkerError>
    where
        P: FnOnce() -> Result<S, WorkerError>,
        W: FnOnce(&mut S) -> Result<T, WorkerError>,
        F: FnOnce(S),
    {
        let span = self.span.clone();
        let _entered = span.enter();

        let mut resource = match prepare() {
            Ok(resource) => resource,
            Err(e) => {
                self.set(WorkerState::Finished);
                warn!(worker = %self.name, error = %e, "prepare failed");
                return Err(e);
            }
        };
        self.set(WorkerState::Prepared);
        debug!(worker = %self.name, "prepared");

        self.set(WorkerState::Working);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(&mut resource)));

        finish(resource);
        self.set(WorkerState::Finished);

        match outcome {
            Ok(Ok(value)) => {
                debug!(worker = %self.name, "finished");
                Ok(value)
            }
            Ok(Err(e)) => {
                warn!(worker = %self.name, error = %e, "work failed");
                Err(e)
            }
            Err(payload) => {
                let msg = panic_message(payload.as_ref());
                warn!(worker = %self.name, panic = %msg, "work panicked");
                Err(WorkerError::Panicked(msg))
            }
        }
    }

    /// Runs the lifecycle on a new named OS thread.
    pub fn spawn<S, T, P, W, F>(
        self,
        prepare: P,
        work: W,
        finish: F,
    ) -> Result<WorkerHandle<T>, WorkerError>
    where
        S: 'static,
        T: Send + 'static,
        P: FnOnce() -> Result<S, WorkerError> + Send + 'static,
        W: FnOnce(&mut S) -> Result<T, WorkerError> + Send + 'static,
        F: FnOnce(S) + Send + 'static,
    {
        let name = self.name.clone();
        let state = Arc::clone(&self.state);
        let thread = thread::Builder::new()
            .name(name.clone())
            .spawn(move || self.run(prepare, work, finish))
            .map_err(WorkerError::Spawn)?;

        Ok(WorkerHandle {
            name,
            state,
            thread,
        })
    }
}

/// Owner's view of a spawned [`Worker`].
#[derive(Debug)]
pub struct WorkerHandle<T> {
    name: String,
    state: Arc<AtomicU8>,
    thread: JoinHandle<Result<T, WorkerError>>,
}

impl<T> WorkerHandle<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> WorkerState {
        load(&self.state)
    }

    pub fn is_finished(&self) -> bool {
        self.state() == WorkerState::Finished
    }

    /// Waits for the worker thread and returns what its work produced.
    pub fn join(self) -> Result<T, WorkerError> {
        self.thread
            .join()
            .unwrap_or_else(|payload| Err(WorkerError::Panicked(panic_message(payload.as_ref()))))
    }
}

fn load(state: &AtomicU8) -> WorkerState {
    WorkerState::from_u8(state.load(Ordering::Acquire))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".into()
    }
}
