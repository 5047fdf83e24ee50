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

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::RwLock;

use crate::Error;
use crate::config;
use crate::config::LevelConfig;
use crate::level;
use crate::level::Levels;
use crate::logger::Filter;
use crate::logger::FilterOutput;
use crate::logger::Inner;
use crate::logger::LevelMethod;
use crate::logger::Logger;
use crate::logger::Rewriter;
use crate::logger::State;
use crate::logger::event::Emitter;
use crate::logger::worker::WorkerContext;
use crate::meta::Meta;
use crate::transport::Transport;
use crate::trap::DefaultTrap;
use crate::trap::Trap;

/// What to do when a transport is added under a name that is already registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Fail with [`ErrorKind::DuplicateTransport`](crate::ErrorKind::DuplicateTransport).
    #[default]
    Error,
    /// Replace the registered transport.
    Replace,
}

/// A builder for configuring a [`Logger`].
///
/// # Examples
///
/// ```
/// use logu::Console;
/// use logu::Logger;
///
/// let logger = Logger::builder()
///     .config(logu::config::cli())
///     .level("debug")
///     .transport(Console::builder().colorize(true).build().unwrap())
///     .emit_errors(true)
///     .build()
///     .unwrap();
/// ```
#[must_use = "call `build` to create the logger"]
pub struct LoggerBuilder {
    levels: Levels,
    colors: Vec<(String, String)>,
    level: String,
    transports: Vec<Arc<dyn Transport>>,
    emit_errors: bool,
    pad_levels: bool,
    strip_colors: bool,
    duplicates: DuplicatePolicy,
    rewriters: Vec<Rewriter>,
    filters: Vec<Filter>,
    trap: Arc<dyn Trap>,
}

impl fmt::Debug for LoggerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerBuilder")
            .field("levels", &self.levels)
            .field("level", &self.level)
            .field("transports", &self.transports)
            .field("emit_errors", &self.emit_errors)
            .field("pad_levels", &self.pad_levels)
            .field("strip_colors", &self.strip_colors)
            .field("duplicates", &self.duplicates)
            .field("trap", &self.trap)
            .finish_non_exhaustive()
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggerBuilder {
    /// Create a builder with the npm level set, default level `info` and no transports.
    pub fn new() -> Self {
        Self {
            levels: config::npm().levels,
            colors: vec![],
            level: "info".to_string(),
            transports: vec![],
            emit_errors: false,
            pad_levels: false,
            strip_colors: false,
            duplicates: DuplicatePolicy::Error,
            rewriters: vec![],
            filters: vec![],
            trap: Arc::new(DefaultTrap::default()),
        }
    }

    /// Use the level set and colors of a preset.
    pub fn config(mut self, config: LevelConfig) -> Self {
        self.levels = config.levels;
        self.colors.extend(
            config
                .colors
                .into_iter()
                .map(|(level, color)| (level.to_string(), color.to_string())),
        );
        self
    }

    /// Set the level set.
    pub fn levels(mut self, levels: Levels) -> Self {
        self.levels = levels;
        self
    }

    /// Merge colors into the process-wide color table when the logger is built.
    pub fn colors<K, V>(mut self, colors: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.colors
            .extend(colors.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set the default level inherited by transports without a level of their own.
    ///
    /// Default to `info`.
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Add a transport.
    pub fn transport(mut self, transport: impl Transport) -> Self {
        self.transports.push(Arc::new(transport));
        self
    }

    /// Add a shared transport.
    pub fn shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transports.push(transport);
        self
    }

    /// Emit failures without a callback as [`Event::Error`](crate::Event::Error).
    ///
    /// Default to `false`.
    pub fn emit_errors(mut self, emit_errors: bool) -> Self {
        self.emit_errors = emit_errors;
        self
    }

    /// Pad messages to align with the longest level name.
    ///
    /// Default to `false`.
    pub fn pad_levels(mut self, pad_levels: bool) -> Self {
        self.pad_levels = pad_levels;
        self
    }

    /// Strip ANSI escape codes from messages.
    ///
    /// Default to `false`.
    pub fn strip_colors(mut self, strip_colors: bool) -> Self {
        self.strip_colors = strip_colors;
        self
    }

    /// Set the policy for transports added under a registered name.
    ///
    /// Default to [`DuplicatePolicy::Error`].
    pub fn duplicates(mut self, duplicates: DuplicatePolicy) -> Self {
        self.duplicates = duplicates;
        self
    }

    /// Append a metadata rewriter.
    pub fn rewriter(
        mut self,
        rewriter: impl Fn(&str, Option<&str>, &str, Meta, &Logger) -> Meta + Send + Sync + 'static,
    ) -> Self {
        self.rewriters.push(Arc::new(rewriter));
        self
    }

    /// Append a message filter.
    pub fn filter(
        mut self,
        filter: impl Fn(&str, &str, &Meta, &Logger) -> FilterOutput + Send + Sync + 'static,
    ) -> Self {
        self.filters.push(Arc::new(filter));
        self
    }

    /// Set the trap for errors that have no caller to report to.
    ///
    /// Default to [`DefaultTrap`].
    pub fn trap(mut self, trap: impl Trap) -> Self {
        self.trap = Arc::new(trap);
        self
    }

    /// Build the [`Logger`] and start one worker per transport.
    ///
    /// # Errors
    ///
    /// Returns an error if two transports share a name under [`DuplicatePolicy::Error`], or if
    /// a worker thread cannot be spawned.
    pub fn build(self) -> Result<Logger, Error> {
        let (logger, transports) = self.into_parts();
        for transport in transports {
            logger.add_shared(transport)?;
        }
        Ok(logger)
    }

    /// Create the logger without registering the configured transports.
    pub(crate) fn into_parts(self) -> (Logger, Vec<Arc<dyn Transport>>) {
        let LoggerBuilder {
            levels,
            colors,
            level,
            transports,
            emit_errors,
            pad_levels,
            strip_colors,
            duplicates,
            rewriters,
            filters,
            trap,
        } = self;

        if !colors.is_empty() {
            level::add_colors(colors);
        }

        let inner = Arc::new_cyclic(|weak| Inner {
            state: RwLock::new(State {
                methods: LevelMethod::table(&levels, weak.clone()),
                levels,
                level,
                registrations: vec![],
                rewriters,
                filters,
                emit_errors,
                pad_levels,
                strip_colors,
                duplicates,
            }),
            ctx: WorkerContext {
                emitter: Arc::new(Emitter::default()),
                trap,
            },
            timers: Mutex::new(HashMap::new()),
        });

        (Logger { inner }, transports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::Memory;

    #[test]
    fn test_defaults() {
        let logger = Logger::builder().build().unwrap();
        assert_eq!(logger.level(), "info");
        assert_eq!(logger.levels().len(), 6);
        assert!(!logger.emit_errors());
        assert!(!logger.pad_levels());
        assert!(!logger.strip_colors());
        assert!(logger.transports().is_empty());
    }

    #[test]
    fn test_duplicate_names() {
        let err = Logger::builder()
            .transport(Memory::default())
            .transport(Memory::default())
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateTransport);
        assert_eq!(err.transport(), Some("memory"));

        let first = Memory::default();
        let second = Memory::default();
        let logger = Logger::builder()
            .duplicates(DuplicatePolicy::Replace)
            .transport(first.clone())
            .transport(second.clone())
            .build()
            .unwrap();
        assert_eq!(logger.transports(), vec!["memory"]);

        logger.log_sync("info", crate::args!["hello"]).unwrap();
        assert!(first.lines().is_empty());
        assert_eq!(second.lines(), vec!["info:  hello"]);
    }
}
