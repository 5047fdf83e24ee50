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

//! Bridge from the [`log`] crate to `logu`.

use crate::Logger;
use crate::args::ParsedArgs;
use crate::default_logger;
use crate::meta::Meta;

/// The default environment variable for the directives of [`LogBridge::from_default_env`].
pub const DEFAULT_FILTER_ENV: &str = "RUST_LOG";

/// A [`log::Log`] implementation forwarding records to a [`Logger`].
///
/// Record levels map to the npm level names: `Error` to `error`, `Warn` to `warn`, `Info` to
/// `info`, `Debug` to `debug` and `Trace` to `silly`. If the mapped name is missing from the
/// active level set, the logger's default level is used instead. The record target becomes the
/// id and the record key-values become the metadata.
///
/// # Examples
///
/// ```
/// use logu::Logger;
/// use logu::Memory;
/// use logu::bridge::LogBridge;
///
/// let memory = Memory::default();
/// let logger = Logger::builder().transport(memory.clone()).build().unwrap();
/// let bridge = LogBridge::new().logger(logger.clone()).env_filter("info");
///
/// let record = log::Record::builder()
///     .level(log::Level::Warn)
///     .target("db")
///     .args(format_args!("slow query"))
///     .build();
/// log::Log::log(&bridge, &record);
/// logger.flush();
///
/// assert_eq!(memory.lines(), vec!["warn:  db         slow query".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct LogBridge {
    logger: Option<Logger>,
    filter: Option<env_filter::Filter>,
}

impl LogBridge {
    /// Create a bridge forwarding every record to the default logger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward records to `logger` instead of the default logger.
    pub fn logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Only forward records enabled by `directives`, in the `env_logger` syntax, e.g.
    /// `info,my_crate::db=debug`.
    pub fn env_filter(mut self, directives: &str) -> Self {
        let mut builder = env_filter::Builder::new();
        builder.parse(directives);
        self.filter = Some(builder.build());
        self
    }

    /// Read the filter directives from the environment variable `name`, if set.
    pub fn from_env(self, name: &str) -> Self {
        match std::env::var(name) {
            Ok(directives) => self.env_filter(&directives),
            Err(_) => self,
        }
    }

    /// Read the filter directives from `RUST_LOG`, if set.
    pub fn from_default_env(self) -> Self {
        self.from_env(DEFAULT_FILTER_ENV)
    }

    fn target(&self) -> &Logger {
        self.logger.as_ref().unwrap_or_else(|| default_logger())
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.filter
            .as_ref()
            .is_none_or(|filter| filter.enabled(metadata))
    }

    fn log(&self, record: &log::Record) {
        if let Some(filter) = &self.filter {
            if !filter.matches(record) {
                return;
            }
        }

        let logger = self.target();
        let level = level_name(record.level());
        let level = if logger.levels().contains(level) {
            level.to_string()
        } else {
            logger.level()
        };

        let mut collector = MetaCollector(Meta::object());
        // visiting fails only if the collector does
        let _ = record.key_values().visit(&mut collector);

        let target = record.target();
        let parsed = ParsedArgs {
            id: (!target.is_empty()).then(|| target.to_string()),
            message: record.args().to_string(),
            meta: collector.0,
            callback: None,
        };
        logger.dispatch(&level, parsed, None);
    }

    fn flush(&self) {
        self.target().flush();
    }
}

fn level_name(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "error",
        log::Level::Warn => "warn",
        log::Level::Info => "info",
        log::Level::Debug => "debug",
        log::Level::Trace => "silly",
    }
}

struct MetaCollector(Meta);

impl<'kvs> log::kv::VisitSource<'kvs> for MetaCollector {
    fn visit_pair(
        &mut self,
        key: log::kv::Key<'kvs>,
        value: log::kv::Value<'kvs>,
    ) -> Result<(), log::kv::Error> {
        let value = if let Some(b) = value.to_bool() {
            Meta::from(b)
        } else if let Some(n) = value.to_i64() {
            Meta::from(n)
        } else if let Some(n) = value.to_u64() {
            Meta::from(n)
        } else if let Some(n) = value.to_f64() {
            Meta::from(n)
        } else {
            Meta::from(value.to_string())
        };
        self.0.insert(key.as_str(), value);
        Ok(())
    }
}

/// Set up the log crate global logger.
///
/// This function calls [`log::set_boxed_logger`] to install a [`LogBridge`] forwarding every
/// record of the log crate to the default `logu` logger, filtered by the `RUST_LOG`
/// directives if that variable is set.
///
/// This function will set the global maximum log level to `Trace`. To override this, call
/// [`log::set_max_level`] after this function.
///
/// # Errors
///
/// Return an error if the log crate global logger has already been set.
pub fn try_setup_log_crate() -> Result<(), log::SetLoggerError> {
    log::set_boxed_logger(Box::new(LogBridge::new().from_default_env()))?;
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
pub fn setup_log_crate() {
    try_setup_log_crate().expect(
        "logu::bridge::setup_log_crate must be called before the log crate global logger initialized",
    )
}

#[cfg(test)]
mod tests {
    use log::Log;

    use super::*;
    use crate::Memory;

    fn bridge() -> (LogBridge, Logger, Memory) {
        let memory = Memory::default();
        let logger = Logger::builder()
            .level("silly")
            .transport(memory.clone())
            .build()
            .unwrap();
        (LogBridge::new().logger(logger.clone()), logger, memory)
    }

    #[test]
    fn test_levels_and_key_values() {
        let (bridge, logger, memory) = bridge();
        let kvs: &[(&str, i64)] = &[("port", 8080)];
        let record = log::Record::builder()
            .level(log::Level::Trace)
            .target("http")
            .args(format_args!("100% up"))
            .key_values(&kvs)
            .build();
        bridge.log(&record);
        logger.flush();

        assert_eq!(memory.lines(), vec!["silly: http       100% up port=8080"]);
    }

    #[test]
    fn test_unknown_level_falls_back() {
        let (bridge, logger, memory) = bridge();
        logger.set_levels(crate::config::syslog().levels);
        logger.set_level("notice");

        let record = log::Record::builder()
            .level(log::Level::Warn)
            .target("")
            .args(format_args!("careful"))
            .build();
        bridge.log(&record);
        logger.flush();

        assert_eq!(memory.lines(), vec!["notice: careful"]);
    }

    #[test]
    fn test_env_filter() {
        let (bridge, logger, memory) = bridge();
        let bridge = bridge.env_filter("warn");

        let metadata = log::Metadata::builder()
            .level(log::Level::Info)
            .target("app")
            .build();
        assert!(!bridge.enabled(&metadata));

        let record = log::Record::builder()
            .level(log::Level::Info)
            .target("app")
            .args(format_args!("dropped"))
            .build();
        bridge.log(&record);
        logger.flush();
        assert!(memory.lines().is_empty());
    }
}
