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

//! Named loggers.

use std::sync::LazyLock;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use indexmap::IndexMap;

use crate::Error;
use crate::Logger;
use crate::LoggerBuilder;
use crate::transport::Console;

/// A registry of named loggers, created on first use and reused afterwards.
///
/// # Examples
///
/// ```
/// let db = logu::loggers().get("db").unwrap();
/// let again = logu::loggers().get("db").unwrap();
/// assert_eq!(db.transports(), again.transports());
/// ```
#[derive(Debug, Default)]
pub struct Container {
    loggers: Mutex<IndexMap<String, Logger>>,
}

impl Container {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    fn loggers(&self) -> MutexGuard<'_, IndexMap<String, Logger>> {
        self.loggers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The logger named `name`, created with a console transport if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the logger has to be created and its worker cannot be started.
    pub fn get(&self, name: &str) -> Result<Logger, Error> {
        let mut loggers = self.loggers();
        if let Some(logger) = loggers.get(name) {
            return Ok(logger.clone());
        }

        let logger = Logger::builder().transport(Console::default()).build()?;
        loggers.insert(name.to_string(), logger.clone());
        Ok(logger)
    }

    /// The logger named `name`, built from `builder` if it does not exist yet.
    ///
    /// An existing logger is returned as is and `builder` is discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if building the logger fails.
    pub fn add(&self, name: &str, builder: LoggerBuilder) -> Result<Logger, Error> {
        let mut loggers = self.loggers();
        if let Some(logger) = loggers.get(name) {
            return Ok(logger.clone());
        }

        let logger = builder.build()?;
        loggers.insert(name.to_string(), logger.clone());
        Ok(logger)
    }

    /// Whether a logger named `name` exists.
    pub fn has(&self, name: &str) -> bool {
        self.loggers().contains_key(name)
    }

    /// The names of every logger, in creation order.
    pub fn names(&self) -> Vec<String> {
        self.loggers().keys().cloned().collect()
    }

    /// Close and forget the logger named `name`. Returns `false` if there is no such logger.
    pub fn close(&self, name: &str) -> bool {
        let removed = self.loggers().shift_remove(name);
        match removed {
            Some(logger) => {
                logger.close();
                true
            }
            None => false,
        }
    }

    /// Close and forget every logger.
    pub fn close_all(&self) {
        let loggers = std::mem::take(&mut *self.loggers());
        for logger in loggers.into_values() {
            logger.close();
        }
    }
}

/// The process-wide logger container.
pub fn loggers() -> &'static Container {
    static LOGGERS: LazyLock<Container> = LazyLock::new(Container::new);
    &LOGGERS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Memory;
    use crate::args;

    #[test]
    fn test_named_singletons() {
        let container = Container::new();
        assert!(!container.has("api"));

        let memory = Memory::default();
        let api = container
            .add("api", Logger::builder().transport(memory.clone()))
            .unwrap();
        let again = container.add("api", Logger::builder()).unwrap();
        assert_eq!(again.transports(), vec!["memory"]);

        let db = container.get("db").unwrap();
        assert_eq!(db.transports(), vec!["console"]);
        assert_eq!(container.names(), vec!["api", "db"]);

        api.log_sync("info", args!["ready"]).unwrap();
        assert_eq!(memory.lines(), vec!["info:  ready"]);

        assert!(container.close("api"));
        assert!(!container.close("api"));
        assert!(api.transports().is_empty());

        container.close_all();
        assert!(container.names().is_empty());
    }
}
