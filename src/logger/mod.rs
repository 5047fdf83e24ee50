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

//! The dispatcher: turns log calls into entries and fans them out to transports.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::sync::RwLock;
use std::sync::RwLockReadGuard;
use std::sync::RwLockWriteGuard;
use std::time::Instant;

use crossbeam_channel::Receiver;
use indexmap::IndexMap;

use crate::Arg;
use crate::Error;
use crate::ErrorKind;
use crate::Timestamp;
use crate::args::ParsedArgs;
use crate::args::parse_log_args;
use crate::config;
use crate::level;
use crate::level::Levels;
use crate::meta::Meta;
use crate::render::Colorize;
use crate::render::RenderOptions;
use crate::render::strip_ansi;
use crate::transport::Transport;

mod builder;
mod event;
mod method;
mod profile;
mod router;
mod worker;

pub use self::builder::DuplicatePolicy;
pub use self::builder::LoggerBuilder;
pub use self::event::Callback;
pub use self::event::Completion;
pub use self::event::Event;
pub use self::event::Logged;
pub use self::event::Subscription;
pub use self::method::LevelMethod;
pub use self::profile::Profiler;
use self::router::Registration;
use self::router::select_targets;
use self::worker::OwnedEntry;
use self::worker::Progress;
use self::worker::Target;
use self::worker::WorkerContext;
use self::worker::report_error;

/// Rewrites the metadata of an entry, given `(level, id, message, meta, logger)`.
pub type Rewriter = Arc<dyn Fn(&str, Option<&str>, &str, Meta, &Logger) -> Meta + Send + Sync>;

/// Rewrites the message, or the message and the metadata, given
/// `(level, message, meta, logger)`.
pub type Filter = Arc<dyn Fn(&str, &str, &Meta, &Logger) -> FilterOutput + Send + Sync>;

/// The result of a [`Filter`].
#[derive(Debug, Clone)]
pub enum FilterOutput {
    /// Replace the message.
    Message(String),
    /// Replace both the message and the metadata.
    Both {
        /// The new message.
        message: String,
        /// The new metadata.
        meta: Meta,
    },
}

impl From<String> for FilterOutput {
    fn from(message: String) -> Self {
        FilterOutput::Message(message)
    }
}

impl From<&str> for FilterOutput {
    fn from(message: &str) -> Self {
        FilterOutput::Message(message.to_string())
    }
}

/// A structured logger dispatching entries to a set of transports.
///
/// A `Logger` is a cheap handle: clones share the same transports, levels and listeners. The
/// transports are shut down once the last handle is dropped or [`Logger::close`] is called.
///
/// # Examples
///
/// ```
/// use logu::Logger;
/// use logu::Memory;
/// use logu::args;
///
/// let memory = Memory::default();
/// let logger = Logger::builder().transport(memory.clone()).build().unwrap();
///
/// logger.log("info", args!["build", "finished in %dms", 42]);
/// logger.flush();
/// assert_eq!(memory.lines(), vec!["info:  build      finished in 42ms".to_string()]);
/// ```
#[derive(Clone)]
pub struct Logger {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    state: RwLock<State>,
    ctx: WorkerContext,
    timers: Mutex<HashMap<String, Instant>>,
}

struct State {
    levels: Levels,
    level: String,
    methods: IndexMap<String, LevelMethod>,
    registrations: Vec<Registration>,
    rewriters: Vec<Rewriter>,
    filters: Vec<Filter>,
    emit_errors: bool,
    pad_levels: bool,
    strip_colors: bool,
    duplicates: DuplicatePolicy,
}

/// What one log call needs from the logger state, copied out so that no lock is held while
/// user code runs.
struct Dispatch {
    targets: Vec<Arc<Target>>,
    rewriters: Vec<Rewriter>,
    filters: Vec<Filter>,
    pad_to: Option<usize>,
    strip_colors: bool,
}

impl State {
    fn prepare(&self, level: &str) -> Result<Dispatch, Error> {
        if self.registrations.is_empty() {
            return Err(Error::no_transports());
        }
        if !self.levels.contains(level) {
            return Err(Error::unknown_level(level));
        }

        let targets = select_targets(&self.registrations, &self.levels, &self.level, level)
            .into_iter()
            .map(|registration| registration.target.clone())
            .collect();
        Ok(Dispatch {
            targets,
            rewriters: self.rewriters.clone(),
            filters: self.filters.clone(),
            pad_to: self.pad_levels.then(|| self.levels.longest()),
            strip_colors: self.strip_colors,
        })
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Logger")
            .field("levels", &state.levels)
            .field("level", &state.level)
            .field(
                "transports",
                &state
                    .registrations
                    .iter()
                    .map(|r| r.name.as_str())
                    .collect::<Vec<_>>(),
            )
            .field("emit_errors", &state.emit_errors)
            .field("pad_levels", &state.pad_levels)
            .field("strip_colors", &state.strip_colors)
            .finish_non_exhaustive()
    }
}

impl Logger {
    /// Create a [`LoggerBuilder`].
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    fn state(&self) -> RwLockReadGuard<'_, State> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, State> {
        self.inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Log an entry at `level`.
    ///
    /// `args` is interpreted by [`parse_log_args`]: an optional id, the message with
    /// printf-style arguments, optional metadata and an optional trailing completion callback.
    ///
    /// The call returns as soon as the entry is queued on every eligible transport. Failures
    /// are reported to the callback; without a callback they are emitted as [`Event::Error`]
    /// if [`Logger::set_emit_errors`] is on, and dropped otherwise.
    pub fn log(&self, level: &str, args: Vec<Arg>) {
        self.dispatch(level, parse_log_args(args), None);
    }

    /// Log an entry at `level` and call `callback` once the entry is written or has failed.
    ///
    /// `callback` takes precedence over a trailing callback in `args`.
    pub fn log_with(
        &self,
        level: &str,
        args: Vec<Arg>,
        callback: impl FnOnce(Completion) + Send + 'static,
    ) {
        self.dispatch(level, parse_log_args(args), Some(Box::new(callback)));
    }

    /// Log an entry at `level` and block until it is written or has failed.
    ///
    /// Must not be called from an event listener, which runs on a transport worker.
    pub fn log_sync(&self, level: &str, args: Vec<Arg>) -> Completion {
        let (sender, receiver) = crossbeam_channel::bounded(1);
        self.log_with(level, args, move |outcome| {
            let _ = sender.send(outcome);
        });
        receiver.recv().unwrap_or_else(|_| {
            Err(Error::new(
                ErrorKind::TransportWrite,
                "log entry was dropped before completion",
            ))
        })
    }

    pub(crate) fn dispatch(&self, level: &str, parsed: ParsedArgs, callback: Option<Callback>) {
        let ParsedArgs {
            id,
            mut message,
            mut meta,
            callback: trailing,
        } = parsed;
        let callback = callback.or(trailing);

        let (emit_errors, prepared) = {
            let state = self.state();
            (state.emit_errors, state.prepare(level))
        };
        let dispatch = match prepared {
            Ok(dispatch) => dispatch,
            Err(err) => {
                report_error(err, callback, emit_errors, &self.inner.ctx.emitter);
                return;
            }
        };

        if dispatch.targets.is_empty() {
            if let Some(callback) = callback {
                callback(Ok(None));
            }
            return;
        }

        for rewriter in &dispatch.rewriters {
            meta = rewriter(level, id.as_deref(), &message, meta, self);
        }
        for filter in &dispatch.filters {
            match filter(level, &message, &meta, self) {
                FilterOutput::Message(filtered) => message = filtered,
                FilterOutput::Both {
                    message: filtered,
                    meta: filtered_meta,
                } => {
                    message = filtered;
                    meta = filtered_meta;
                }
            }
        }
        if let Some(longest) = dispatch.pad_to {
            let padding = " ".repeat(longest.saturating_sub(level.len()));
            message.insert_str(0, &padding);
        }
        if dispatch.strip_colors {
            message = strip_ansi(&message);
        }

        let entry = Arc::new(OwnedEntry {
            level: level.to_string(),
            id,
            message,
            meta,
        });
        let progress = Arc::new(Progress::new(
            dispatch.targets.len(),
            callback,
            emit_errors,
        ));
        for target in &dispatch.targets {
            target.log(entry.clone(), progress.clone(), &self.inner.ctx);
        }
    }

    /// Look up the convenience method of a level.
    ///
    /// The table follows the active level set and is rebuilt by [`Logger::set_levels`].
    pub fn method(&self, level: &str) -> Option<LevelMethod> {
        self.state().methods.get(level).cloned()
    }

    /// The names of every level method, from most to least severe.
    pub fn methods(&self) -> Vec<String> {
        self.state().methods.keys().cloned().collect()
    }

    /// Register a transport under its [`Transport::name`].
    ///
    /// # Errors
    ///
    /// Returns a [`ErrorKind::DuplicateTransport`] error if a transport with the same name is
    /// registered and the duplicate policy is [`DuplicatePolicy::Error`].
    pub fn add(&self, transport: impl Transport) -> Result<(), Error> {
        self.add_shared(Arc::new(transport))
    }

    /// Register a shared transport under its [`Transport::name`].
    ///
    /// # Errors
    ///
    /// See [`Logger::add`].
    pub fn add_shared(&self, transport: Arc<dyn Transport>) -> Result<(), Error> {
        let name = transport.name().to_string();
        let level = transport.level().map(str::to_string);

        let mut state = self.state_mut();
        let existing = state.registrations.iter().position(|r| r.name == name);
        if existing.is_some() && state.duplicates == DuplicatePolicy::Error {
            return Err(
                Error::new(ErrorKind::DuplicateTransport, "transport already attached")
                    .with_context("transport", name),
            );
        }

        let target = Arc::new(Target::spawn(transport, self.inner.ctx.clone())?);
        let registration = Registration {
            name,
            level,
            target,
        };
        let replaced = match existing {
            Some(index) => Some(std::mem::replace(
                &mut state.registrations[index],
                registration,
            )),
            None => {
                state.registrations.push(registration);
                None
            }
        };
        drop(state);

        // joins the worker of the replaced transport, outside the lock
        drop(replaced);
        Ok(())
    }

    /// Unregister the transport named `name`. Entries already queued on it are still written.
    ///
    /// # Errors
    ///
    /// Returns a [`ErrorKind::NotFound`] error if no such transport is registered; the other
    /// transports are unaffected.
    pub fn remove(&self, name: &str) -> Result<(), Error> {
        let removed = {
            let mut state = self.state_mut();
            let index = state.registrations.iter().position(|r| r.name == name);
            index.map(|index| state.registrations.remove(index))
        };
        match removed {
            Some(_) => Ok(()),
            None => Err(Error::new(ErrorKind::NotFound, "transport not attached")
                .with_context("transport", name)),
        }
    }

    /// Unregister every transport.
    pub fn clear(&self) {
        let removed = std::mem::take(&mut self.state_mut().registrations);
        drop(removed);
    }

    /// Write out everything queued so far, then unregister every transport and stop their
    /// workers.
    pub fn close(&self) {
        self.flush();
        self.clear();
    }

    /// Whether a transport named `name` is registered.
    pub fn has_transport(&self, name: &str) -> bool {
        self.state().registrations.iter().any(|r| r.name == name)
    }

    /// The names of the registered transports, in registration order.
    pub fn transports(&self) -> Vec<String> {
        self.state()
            .registrations
            .iter()
            .map(|r| r.name.clone())
            .collect()
    }

    /// The transport named `name`, if registered.
    pub fn transport(&self, name: &str) -> Option<Arc<dyn Transport>> {
        self.state()
            .registrations
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.target.transport().clone())
    }

    /// Set the minimum level of every registered transport; `None` makes them inherit the
    /// logger's level.
    pub fn set_transport_levels(&self, level: Option<&str>) {
        for registration in &mut self.state_mut().registrations {
            registration.level = level.map(str::to_string);
        }
    }

    /// Adjust the rendering options of the transport named `name`.
    ///
    /// Returns `false` if there is no such transport or it does not support configuration.
    pub fn configure_transport(&self, name: &str, mut f: impl FnMut(&mut RenderOptions)) -> bool {
        match self.transport(name) {
            Some(transport) => transport.configure(&mut f),
            None => false,
        }
    }

    /// Block until every transport has written and flushed the entries queued so far.
    ///
    /// Flush failures are reported to the trap.
    pub fn flush(&self) {
        let targets = self
            .state()
            .registrations
            .iter()
            .map(|r| r.target.clone())
            .collect::<Vec<_>>();
        let pending = targets
            .iter()
            .filter_map(|target| target.flush())
            .collect::<Vec<_>>();
        for done in pending {
            let _ = done.recv();
        }
    }

    /// The active level set.
    pub fn levels(&self) -> Levels {
        self.state().levels.clone()
    }

    /// Replace the active level set and rebuild the level methods.
    ///
    /// Transports configured with levels missing from the new set stop receiving entries; log
    /// calls at missing levels fail with [`ErrorKind::UnknownLevel`].
    pub fn set_levels(&self, levels: Levels) {
        let methods = LevelMethod::table(&levels, Arc::downgrade(&self.inner));
        let mut state = self.state_mut();
        state.levels = levels;
        state.methods = methods;
    }

    /// Merge colors into the process-wide color table.
    pub fn add_colors<K, V>(&self, colors: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: AsRef<str>,
    {
        level::add_colors(colors);
    }

    /// The default level inherited by transports without a level of their own.
    pub fn level(&self) -> String {
        self.state().level.clone()
    }

    /// Set the default level.
    pub fn set_level(&self, level: impl Into<String>) {
        self.state_mut().level = level.into();
    }

    /// Whether failures without a callback are emitted as [`Event::Error`].
    pub fn emit_errors(&self) -> bool {
        self.state().emit_errors
    }

    /// Emit failures without a callback as [`Event::Error`].
    pub fn set_emit_errors(&self, emit_errors: bool) {
        self.state_mut().emit_errors = emit_errors;
    }

    /// Whether messages are padded to align with the longest level name.
    pub fn pad_levels(&self) -> bool {
        self.state().pad_levels
    }

    /// Pad messages to align with the longest level name.
    pub fn set_pad_levels(&self, pad_levels: bool) {
        self.state_mut().pad_levels = pad_levels;
    }

    /// Whether ANSI escape codes are stripped from messages.
    pub fn strip_colors(&self) -> bool {
        self.state().strip_colors
    }

    /// Strip ANSI escape codes from messages before they reach the transports.
    pub fn set_strip_colors(&self, strip_colors: bool) {
        self.state_mut().strip_colors = strip_colors;
    }

    /// Append a metadata rewriter. Rewriters run in registration order.
    pub fn add_rewriter(
        &self,
        rewriter: impl Fn(&str, Option<&str>, &str, Meta, &Logger) -> Meta + Send + Sync + 'static,
    ) {
        self.state_mut().rewriters.push(Arc::new(rewriter));
    }

    /// Append a message filter. Filters run in registration order, after the rewriters.
    pub fn add_filter(
        &self,
        filter: impl Fn(&str, &str, &Meta, &Logger) -> FilterOutput + Send + Sync + 'static,
    ) {
        self.state_mut().filters.push(Arc::new(filter));
    }

    /// Call `listener` on every event.
    ///
    /// Listeners run on transport worker threads.
    pub fn subscribe(&self, listener: impl Fn(&Event) + Send + Sync + 'static) -> Subscription {
        self.inner.ctx.emitter.subscribe(Arc::new(listener))
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.inner.ctx.emitter.unsubscribe(subscription)
    }

    /// A channel receiving every event from now on.
    pub fn events(&self) -> Receiver<Event> {
        self.inner.ctx.emitter.channel()
    }

    /// Start a timer named `id` on the first call; on the second call, stop it and log `id` at
    /// `info` with a `durationMs` metadata field.
    pub fn profile(&self, id: &str) {
        let started = self
            .inner
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        match started {
            Some(start) => {
                let mut meta = Meta::object();
                meta.insert("durationMs", start.elapsed().as_millis() as u64);
                self.log("info", vec![Arg::from(id), Arg::from(meta)]);
            }
            None => {
                self.inner
                    .timers
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(id.to_string(), Instant::now());
            }
        }
    }

    /// Start a timer that logs its duration when [`Profiler::done`] is called.
    pub fn start_timer(&self) -> Profiler {
        Profiler::new(self.clone())
    }

    /// Configure the logger for command-line tools: the `cli` level set and colors, and a
    /// colorized `console` transport without timestamps, further adjusted by `configure`.
    ///
    /// A console that already colors more than the level token keeps its setting.
    pub fn cli(&self, configure: impl FnOnce(&mut RenderOptions)) -> &Self {
        let preset = config::cli();
        self.set_levels(preset.levels);
        level::add_colors(preset.colors.iter().copied());

        let mut configure = Some(configure);
        self.configure_transport("console", |options| {
            if options.colorize == Colorize::Off {
                options.colorize = Colorize::On;
            }
            options.timestamp = Timestamp::Off;
            if let Some(configure) = configure.take() {
                configure(options);
            }
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::args;
    use crate::transport::Memory;

    fn logger() -> (Logger, Memory) {
        let memory = Memory::default();
        let logger = Logger::builder()
            .transport(memory.clone())
            .build()
            .unwrap();
        (logger, memory)
    }

    #[test]
    fn test_rewriters_then_filters() {
        let (logger, memory) = logger();
        logger.add_rewriter(|_, id, _, mut meta, _| {
            meta.insert("rewritten", id.unwrap_or("none"));
            meta
        });
        logger.add_filter(|level, message, _, _| format!("[{level}] {message}").into());

        logger.log_sync("info", args!["svc", "started"]).unwrap();
        assert_eq!(memory.lines(), vec!["info:  svc        [info] started rewritten=svc"]);
    }

    #[test]
    fn test_filter_replaces_meta() {
        let (logger, memory) = logger();
        logger.add_filter(|_, message, _, _| FilterOutput::Both {
            message: message.to_uppercase(),
            meta: Meta::from(json!({"secret": "***"})),
        });

        logger.log_sync("warn", args!["password is %s", "hunter2", json!({"secret": "hunter2"})]).unwrap();
        assert_eq!(memory.lines(), vec!["warn:  PASSWORD IS HUNTER2 secret=***"]);
    }

    #[test]
    fn test_pad_levels_and_strip_colors() {
        let (logger, memory) = logger();
        logger.set_pad_levels(true);
        logger.set_strip_colors(true);

        logger.log_sync("info", args!["\u{1b}[31mred\u{1b}[39m"]).unwrap();
        // "verbose" is the longest npm level
        assert_eq!(memory.lines(), vec!["info:     red"]);
    }

    #[test]
    fn test_methods_follow_levels() {
        let (logger, memory) = logger();
        assert_eq!(logger.methods(), vec!["error", "warn", "info", "verbose", "debug", "silly"]);
        assert!(logger.method("help").is_none());

        logger.set_levels(config::cli().levels);
        logger.set_level("help");
        let help = logger.method("help").unwrap();
        assert_eq!(help.level(), "help");
        help.log_sync(args!["usage"]).unwrap();
        assert_eq!(memory.lines(), vec!["help:  usage"]);
    }

    #[test]
    fn test_profile() {
        let (logger, memory) = logger();
        logger.profile("db");
        logger.profile("db");
        logger.flush();

        let lines = memory.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("info:  db durationMs="), "{}", lines[0]);
    }

    #[test]
    fn test_configure_transport() {
        let (logger, memory) = logger();
        assert!(logger.configure_transport("memory", |options| options.show_level = false));
        assert!(!logger.configure_transport("missing", |_| {}));

        logger.log_sync("info", args!["bare"]).unwrap();
        assert_eq!(memory.lines(), vec!["bare"]);
    }

    #[test]
    fn test_cli_keeps_richer_colorize() {
        let console = Memory::builder()
            .name("console")
            .colorize(Colorize::All)
            .timestamp("short")
            .build();
        let logger = Logger::builder().transport(console).build().unwrap();
        logger.cli(|_| {});

        let mut seen = None;
        logger.configure_transport("console", |options| {
            seen = Some((options.colorize, options.timestamp.is_off()));
        });
        assert_eq!(seen, Some((Colorize::All, true)));
        assert!(logger.method("help").is_some());

        let plain = Memory::builder().name("console").build();
        let logger = Logger::builder().transport(plain).build().unwrap();
        logger.cli(|_| {});
        let mut colorize = None;
        logger.configure_transport("console", |options| colorize = Some(options.colorize));
        assert_eq!(colorize, Some(Colorize::On));
    }
}
