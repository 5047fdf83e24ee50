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

use std::time::Duration;
use std::time::Instant;

use crate::Arg;
use crate::logger::Logger;
use crate::meta::Meta;

/// A running timer created by [`Logger::start_timer`].
#[derive(Debug)]
#[must_use = "call `done` to log the elapsed time"]
pub struct Profiler {
    logger: Logger,
    start: Instant,
}

impl Profiler {
    pub(crate) fn new(logger: Logger) -> Self {
        Self {
            logger,
            start: Instant::now(),
        }
    }

    /// Time elapsed since the timer was started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Log `message` at `info` with the elapsed milliseconds as `durationMs` metadata.
    pub fn done(self, message: impl Into<String>) {
        let mut meta = Meta::object();
        meta.insert("durationMs", self.elapsed().as_millis() as u64);
        self.logger
            .log("info", vec![Arg::from(message.into()), Arg::from(meta)]);
    }
}

#[cfg(test)]
mod tests {
    use crate::Logger;
    use crate::Memory;

    #[test]
    fn test_profiler_done() {
        let memory = Memory::default();
        let logger = Logger::builder()
            .transport(memory.clone())
            .build()
            .unwrap();

        let profiler = logger.start_timer();
        profiler.done("migrated");
        logger.flush();

        let lines = memory.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("info:  migrated durationMs="), "{}", lines[0]);
    }
}
