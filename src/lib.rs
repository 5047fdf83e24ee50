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

//! Logu is a leveled logging facade dispatching structured entries to pluggable transports.
//!
//! # Overview
//!
//! A [`Logger`] owns a level set, a registry of [`Transport`]s and a chain of rewriters and
//! filters. A log call is a level name plus a list of loosely typed arguments: an optional
//! id, a message with printf-style placeholders, optional metadata and an optional
//! completion callback. Every transport whose level admits the entry receives it on its own
//! worker thread and renders it as a column-aligned string, JSON, raw JSON or logstash JSON.
//!
//! # Examples
//!
//! Log through the default logger, which writes to the console:
//!
//! ```
//! logu::log("info", logu::args!["server listening on port %d", 8080]);
//! logu::flush();
//! ```
//!
//! Build a logger of your own:
//!
//! ```
//! use logu::Logger;
//! use logu::Memory;
//! use serde_json::json;
//!
//! let memory = Memory::default();
//! let logger = Logger::builder()
//!     .level("debug")
//!     .transport(memory.clone())
//!     .build()
//!     .unwrap();
//!
//! logu::log!(logger, "debug", "cache", "miss for %s", "users", json!({"ms": 3}));
//! logger.flush();
//!
//! assert_eq!(memory.lines(), vec!["debug: cache      miss for users ms=3"]);
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

use std::sync::LazyLock;

pub mod config;
pub mod level;
pub mod meta;
pub mod render;
pub mod transport;
pub mod trap;

#[cfg(feature = "bridge-log")]
pub mod bridge;

mod args;
mod container;
mod error;
mod logger;
mod timestamp;

pub use self::args::Arg;
pub use self::args::ParsedArgs;
pub use self::args::format_message;
pub use self::args::parse_log_args;
pub use self::container::Container;
pub use self::container::loggers;
pub use self::error::Error;
pub use self::error::ErrorKind;
pub use self::level::Colors;
pub use self::level::Levels;
pub use self::level::add_colors;
pub use self::level::colorize;
pub use self::logger::Callback;
pub use self::logger::Completion;
pub use self::logger::DuplicatePolicy;
pub use self::logger::Event;
pub use self::logger::Filter;
pub use self::logger::FilterOutput;
pub use self::logger::LevelMethod;
pub use self::logger::Logged;
pub use self::logger::Logger;
pub use self::logger::LoggerBuilder;
pub use self::logger::Profiler;
pub use self::logger::Rewriter;
pub use self::logger::Subscription;
pub use self::meta::ErrorMeta;
pub use self::meta::Meta;
pub use self::meta::MetaMap;
pub use self::meta::SharedMeta;
pub use self::render::Colorize;
pub use self::render::RenderOptions;
pub use self::timestamp::Timestamp;
pub use self::timestamp::format_timestamp;
pub use self::transport::Console;
pub use self::transport::ConsoleBuilder;
pub use self::transport::Entry;
pub use self::transport::File;
pub use self::transport::FileBuilder;
pub use self::transport::Memory;
pub use self::transport::MemoryBuilder;
pub use self::transport::Transport;
pub use self::trap::DefaultTrap;
pub use self::trap::Trap;

/// Log through `logger` at `level`, building the arguments with [`args!`].
///
/// # Examples
///
/// ```
/// let logger = logu::Logger::builder()
///     .transport(logu::Memory::default())
///     .build()
///     .unwrap();
/// logu::log!(logger, "warn", "disk %d%% full", 91);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr $(, $arg:expr)* $(,)?) => {
        $logger.log($level, $crate::args![$($arg),*])
    };
}

/// The process-wide default logger: npm levels, default level `info` and a console
/// transport.
pub fn default_logger() -> &'static Logger {
    static DEFAULT: LazyLock<Logger> = LazyLock::new(|| {
        let (logger, _) = LoggerBuilder::new().into_parts();
        if let Err(err) = logger.add(Console::default()) {
            DefaultTrap::default().trap(&err);
        }
        logger
    });
    &DEFAULT
}

/// Log an entry at `level` through the default logger. See [`Logger::log`].
pub fn log(level: &str, args: Vec<Arg>) {
    default_logger().log(level, args);
}

/// Log an entry at `level` through the default logger and call `callback` on completion.
/// See [`Logger::log_with`].
pub fn log_with(level: &str, args: Vec<Arg>, callback: impl FnOnce(Completion) + Send + 'static) {
    default_logger().log_with(level, args, callback);
}

/// Register a transport with the default logger.
///
/// # Errors
///
/// See [`Logger::add`].
pub fn add(transport: impl Transport) -> Result<(), Error> {
    default_logger().add(transport)
}

/// Unregister a transport of the default logger.
///
/// # Errors
///
/// See [`Logger::remove`].
pub fn remove(name: &str) -> Result<(), Error> {
    default_logger().remove(name)
}

/// Unregister every transport of the default logger.
pub fn clear() {
    default_logger().clear();
}

/// Configure the default logger for command-line tools.
///
/// Switches to the `cli` level set and colors, and makes the `console` transport colorized and
/// timestamp-free. `host`, if given, prefixes every console line; `configure` adjusts the
/// console's options further.
pub fn cli(host: Option<&str>, configure: impl FnOnce(&mut RenderOptions)) -> &'static Logger {
    let host = host.map(str::to_string);
    default_logger().cli(move |options| {
        if host.is_some() {
            options.host = host;
        }
        configure(options);
    })
}

/// Replace the level set of the default logger. See [`Logger::set_levels`].
pub fn set_levels(levels: Levels) {
    default_logger().set_levels(levels);
}

/// Set the default level of the default logger and the level of each of its transports.
pub fn set_level(level: &str) {
    let logger = default_logger();
    logger.set_level(level);
    logger.set_transport_levels(Some(level));
}

/// The default level of the default logger.
pub fn level() -> String {
    default_logger().level()
}

/// Append a metadata rewriter to the default logger.
pub fn add_rewriter(
    rewriter: impl Fn(&str, Option<&str>, &str, Meta, &Logger) -> Meta + Send + Sync + 'static,
) {
    default_logger().add_rewriter(rewriter);
}

/// Append a message filter to the default logger.
pub fn add_filter(
    filter: impl Fn(&str, &str, &Meta, &Logger) -> FilterOutput + Send + Sync + 'static,
) {
    default_logger().add_filter(filter);
}

/// Start or stop the default logger's timer named `id`. See [`Logger::profile`].
pub fn profile(id: &str) {
    default_logger().profile(id);
}

/// Start a [`Profiler`] on the default logger.
pub fn start_timer() -> Profiler {
    default_logger().start_timer()
}

/// See [`Logger::set_emit_errors`].
pub fn set_emit_errors(emit_errors: bool) {
    default_logger().set_emit_errors(emit_errors);
}

/// See [`Logger::set_pad_levels`].
pub fn set_pad_levels(pad_levels: bool) {
    default_logger().set_pad_levels(pad_levels);
}

/// See [`Logger::set_strip_colors`].
pub fn set_strip_colors(strip_colors: bool) {
    default_logger().set_strip_colors(strip_colors);
}

/// Block until every transport of the default logger has written what is queued.
pub fn flush() {
    default_logger().flush();
}

/// Listen to the events of the default logger. See [`Logger::subscribe`].
pub fn subscribe(listener: impl Fn(&Event) + Send + Sync + 'static) -> Subscription {
    default_logger().subscribe(listener)
}

/// A channel receiving the events of the default logger from now on.
pub fn events() -> crossbeam_channel::Receiver<Event> {
    default_logger().events()
}
