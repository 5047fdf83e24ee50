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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use crate::Error;
use crate::render::RenderOptions;
use crate::transport::Entry;
use crate::transport::Rendering;
use crate::transport::Transport;
use crate::transport::default_stderr_levels;

/// A builder to configure and create a [`Memory`] transport.
#[derive(Debug)]
#[must_use = "call `build` to create the transport"]
pub struct MemoryBuilder {
    name: String,
    level: Option<String>,
    options: RenderOptions,
    compact: Option<bool>,
    stderr_levels: Vec<String>,
}

impl Default for MemoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBuilder {
    /// Create a new builder for a transport named `memory`.
    ///
    /// The compact layout is used unless [`MemoryBuilder::compact`] says otherwise, so the
    /// captured lines do not depend on the terminal.
    pub fn new() -> Self {
        Self {
            name: "memory".to_string(),
            level: None,
            options: RenderOptions::default(),
            compact: Some(true),
            stderr_levels: default_stderr_levels(false),
        }
    }

    super::render_option_setters!();

    /// Set the levels captured in [`Memory::error_output`] instead of [`Memory::output`].
    ///
    /// Default to `["error", "debug"]`.
    pub fn stderr_levels<I, S>(mut self, levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stderr_levels = levels.into_iter().map(Into::into).collect();
        self
    }

    /// Build the [`Memory`] transport.
    pub fn build(self) -> Memory {
        let MemoryBuilder {
            name,
            level,
            options,
            compact,
            stderr_levels,
        } = self;

        Memory {
            inner: Arc::new(MemoryInner {
                name,
                level,
                rendering: Rendering::new(options, compact),
                stderr_levels,
                lines: Mutex::new(Lines::default()),
            }),
        }
    }
}

/// A transport that keeps rendered lines in memory.
///
/// Cloning a `Memory` yields another handle to the same buffer, so a clone can be kept to read
/// the captured lines after the transport is handed to a logger.
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
/// logger.log_sync("info", args!["hello"]).unwrap();
/// assert_eq!(memory.output(), vec!["info:  hello".to_string()]);
/// ```
#[derive(Debug, Clone)]
pub struct Memory {
    inner: Arc<MemoryInner>,
}

#[derive(Debug)]
struct MemoryInner {
    name: String,
    level: Option<String>,
    rendering: Rendering,
    stderr_levels: Vec<String>,
    lines: Mutex<Lines>,
}

#[derive(Debug, Default)]
struct Lines {
    all: Vec<String>,
    output: Vec<String>,
    error_output: Vec<String>,
}

impl Default for Memory {
    fn default() -> Self {
        MemoryBuilder::new().build()
    }
}

impl Memory {
    /// Create a [`MemoryBuilder`].
    pub fn builder() -> MemoryBuilder {
        MemoryBuilder::new()
    }

    /// Every captured line, in write order.
    pub fn lines(&self) -> Vec<String> {
        self.captured().all.clone()
    }

    /// Lines captured at levels other than the stderr levels.
    pub fn output(&self) -> Vec<String> {
        self.captured().output.clone()
    }

    /// Lines captured at the stderr levels.
    pub fn error_output(&self) -> Vec<String> {
        self.captured().error_output.clone()
    }

    /// Discard every captured line.
    pub fn clear(&self) {
        *self.captured() = Lines::default();
    }

    fn captured(&self) -> MutexGuard<'_, Lines> {
        self.inner
            .lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for Memory {
    fn name(&self) -> &str {
        &self.inner.name
    }

    fn level(&self) -> Option<&str> {
        self.inner.level.as_deref()
    }

    fn log(&self, entry: &Entry<'_>) -> Result<(), Error> {
        let line = self.inner.rendering.render(entry);
        let is_stderr = self.inner.stderr_levels.iter().any(|l| l == entry.level);

        let mut lines = self.captured();
        lines.all.push(line.clone());
        if is_stderr {
            lines.error_output.push(line);
        } else {
            lines.output.push(line);
        }
        Ok(())
    }

    fn configure(&self, f: &mut dyn FnMut(&mut RenderOptions)) -> bool {
        self.inner.rendering.configure(f);
        true
    }
}
