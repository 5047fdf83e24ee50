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

use std::sync::Weak;

use indexmap::IndexMap;

use crate::Arg;
use crate::Error;
use crate::ErrorKind;
use crate::level::Levels;
use crate::logger::Completion;
use crate::logger::Inner;
use crate::logger::Logger;

/// A logging method bound to one level, e.g. the `warn` method of a logger.
///
/// Obtained from [`Logger::method`]. A method does not keep its logger alive; calls made after
/// every [`Logger`] handle was dropped do nothing.
#[derive(Debug, Clone)]
pub struct LevelMethod {
    level: String,
    logger: Weak<Inner>,
}

impl LevelMethod {
    pub(crate) fn table(levels: &Levels, logger: Weak<Inner>) -> IndexMap<String, LevelMethod> {
        levels
            .names()
            .map(|name| {
                let method = LevelMethod {
                    level: name.to_string(),
                    logger: logger.clone(),
                };
                (name.to_string(), method)
            })
            .collect()
    }

    /// The level this method logs at.
    pub fn level(&self) -> &str {
        &self.level
    }

    fn logger(&self) -> Option<Logger> {
        self.logger.upgrade().map(|inner| Logger { inner })
    }

    /// Same as [`Logger::log`] at this level.
    pub fn log(&self, args: Vec<Arg>) {
        if let Some(logger) = self.logger() {
            logger.log(&self.level, args);
        }
    }

    /// Same as [`Logger::log_sync`] at this level.
    pub fn log_sync(&self, args: Vec<Arg>) -> Completion {
        match self.logger() {
            Some(logger) => logger.log_sync(&self.level, args),
            None => Err(Error::new(ErrorKind::NotFound, "logger has been dropped")
                .with_context("level", &self.level)),
        }
    }
}
