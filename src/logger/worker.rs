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

use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::thread::JoinHandle;

use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;

use crate::Error;
use crate::ErrorKind;
use crate::logger::event::Callback;
use crate::logger::event::Emitter;
use crate::logger::event::Event;
use crate::logger::event::Logged;
use crate::meta::Meta;
use crate::transport::Entry;
use crate::transport::Transport;
use crate::trap::DefaultTrap;
use crate::trap::Trap;

/// An entry owned by the workers it was fanned out to.
#[derive(Debug)]
pub(crate) struct OwnedEntry {
    pub(crate) level: String,
    pub(crate) id: Option<String>,
    pub(crate) message: String,
    pub(crate) meta: Meta,
}

impl OwnedEntry {
    fn as_entry(&self) -> Entry<'_> {
        Entry {
            level: &self.level,
            id: self.id.as_deref(),
            message: &self.message,
            meta: &self.meta,
        }
    }

    fn logged(&self) -> Logged {
        Logged {
            level: self.level.clone(),
            message: self.message.clone(),
            meta: self.meta.clone(),
        }
    }
}

/// What the workers of one logger share.
#[derive(Debug, Clone)]
pub(crate) struct WorkerContext {
    pub(crate) emitter: Arc<Emitter>,
    pub(crate) trap: Arc<dyn Trap>,
}

impl Default for WorkerContext {
    fn default() -> Self {
        Self {
            emitter: Arc::new(Emitter::default()),
            trap: Arc::new(DefaultTrap::default()),
        }
    }
}

/// Tracks the fan-out of one log call.
///
/// The first error finalizes the call. Otherwise the call is finalized when the last eligible
/// transport has written the entry. Either way the callback runs at most once and
/// [`Event::Logged`] fires at most once.
pub(crate) struct Progress {
    remaining: AtomicUsize,
    finished: AtomicBool,
    callback: Mutex<Option<Callback>>,
    emit_errors: bool,
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Progress")
            .field("remaining", &self.remaining)
            .field("finished", &self.finished)
            .field("emit_errors", &self.emit_errors)
            .finish_non_exhaustive()
    }
}

impl Progress {
    pub(crate) fn new(targets: usize, callback: Option<Callback>, emit_errors: bool) -> Self {
        Self {
            remaining: AtomicUsize::new(targets),
            finished: AtomicBool::new(false),
            callback: Mutex::new(callback),
            emit_errors,
        }
    }

    pub(crate) fn succeed(&self, entry: &OwnedEntry, ctx: &WorkerContext) {
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.finish(Ok(entry), ctx);
        }
    }

    pub(crate) fn fail(&self, err: Error, ctx: &WorkerContext) {
        self.finish(Err(err), ctx);
    }

    fn finish(&self, outcome: Result<&OwnedEntry, Error>, ctx: &WorkerContext) {
        if self.finished.swap(true, Ordering::AcqRel) {
            // a later failure of an already finalized call has no one to report to
            if let Err(err) = outcome {
                ctx.trap.trap(&err);
            }
            return;
        }

        let callback = self
            .callback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match outcome {
            Ok(entry) => {
                let logged = entry.logged();
                if let Some(callback) = callback {
                    callback(Ok(Some(logged.clone())));
                }
                ctx.emitter.emit(Event::Logged(logged));
            }
            Err(err) => report_error(err, callback, self.emit_errors, &ctx.emitter),
        }
    }
}

/// Route a failed log call to its callback, or to an [`Event::Error`] if errors are emitted.
/// Otherwise the error is dropped.
pub(crate) fn report_error(
    err: Error,
    callback: Option<Callback>,
    emit_errors: bool,
    emitter: &Emitter,
) {
    if let Some(callback) = callback {
        callback(Err(err));
    } else if emit_errors {
        emitter.emit(Event::Error(Arc::new(err)));
    }
}

pub(crate) enum Task {
    Log {
        entry: Arc<OwnedEntry>,
        progress: Arc<Progress>,
    },
    Flush {
        done: Sender<()>,
    },
}

/// A registered transport together with the worker thread that drives it.
pub(crate) struct Target {
    transport: Arc<dyn Transport>,
    sender: Option<Sender<Task>>,
    handle: Option<JoinHandle<()>>,
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Target")
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl Target {
    /// Spawn the worker thread of `transport`.
    pub(crate) fn spawn(transport: Arc<dyn Transport>, ctx: WorkerContext) -> Result<Self, Error> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let worker = Worker {
            transport: transport.clone(),
            receiver,
            ctx,
        };
        let handle = std::thread::Builder::new()
            .name(format!("logu-{}", transport.name()))
            .spawn(move || worker.run())
            .map_err(|err| {
                Error::new(ErrorKind::Io, "failed to spawn transport worker thread")
                    .with_context("transport", transport.name())
                    .with_source(err)
            })?;

        Ok(Self {
            transport,
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Queue `entry` for writing. On failure the call is finalized with a write error.
    pub(crate) fn log(&self, entry: Arc<OwnedEntry>, progress: Arc<Progress>, ctx: &WorkerContext) {
        let task = Task::Log {
            entry,
            progress: progress.clone(),
        };
        if self.send(task).is_err() {
            let err = Error::new(ErrorKind::Io, "transport worker has stopped");
            progress.fail(Error::transport_write(self.transport.name(), err), ctx);
        }
    }

    /// Queue a flush. The returned receiver yields once the flush has run.
    pub(crate) fn flush(&self) -> Option<Receiver<()>> {
        let (done, receiver) = crossbeam_channel::bounded(1);
        self.send(Task::Flush { done }).ok().map(|()| receiver)
    }

    fn send(&self, task: Task) -> Result<(), Task> {
        match &self.sender {
            Some(sender) => sender.send(task).map_err(|err| err.0),
            None => Err(task),
        }
    }
}

impl Drop for Target {
    fn drop(&mut self) {
        // dropping the sender lets the worker drain its queue and exit
        drop(self.sender.take());

        if let Some(handle) = self.handle.take() {
            // a listener running on this very worker may have removed its transport
            if handle.thread().id() != std::thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

struct Worker {
    transport: Arc<dyn Transport>,
    receiver: Receiver<Task>,
    ctx: WorkerContext,
}

impl Worker {
    fn run(self) {
        let Self {
            transport,
            receiver,
            ctx,
        } = self;
        let name = transport.name().to_string();

        while let Ok(task) = receiver.recv() {
            match task {
                Task::Log { entry, progress } => match transport.log(&entry.as_entry()) {
                    Ok(()) => {
                        ctx.emitter.emit(Event::Logging {
                            transport: name.clone(),
                            level: entry.level.clone(),
                            message: entry.message.clone(),
                            meta: entry.meta.clone(),
                        });
                        progress.succeed(&entry, &ctx);
                    }
                    Err(err) => progress.fail(Error::transport_write(&name, err), &ctx),
                },
                Task::Flush { done } => {
                    if let Err(err) = transport.flush() {
                        let err = Error::new(ErrorKind::TransportWrite, "failed to flush")
                            .with_context("transport", &name)
                            .with_source(err);
                        ctx.trap.trap(&err);
                    }
                    let _ = done.send(());
                }
            }
        }
    }
}
