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

use std::io::Write;
use std::sync::Arc;

use crate::Error;
use crate::ErrorKind;
use crate::render::RenderOptions;
use crate::transport::Entry;
use crate::transport::Rendering;
use crate::transport::Transport;
use crate::transport::default_stderr_levels;

#[cfg(windows)]
const DEFAULT_EOL: &str = "\r\n";
#[cfg(not(windows))]
const DEFAULT_EOL: &str = "\n";

/// A builder to configure and create a [`Console`] transport.
#[derive(Debug)]
#[must_use = "call `build` to create the transport"]
pub struct ConsoleBuilder {
    name: String,
    level: Option<String>,
    options: RenderOptions,
    compact: Option<bool>,
    stderr_levels: Option<Vec<String>>,
    debug_stdout: bool,
    eol: String,
    silent: bool,
}

impl Default for ConsoleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleBuilder {
    /// Create a new builder for a transport named `console`.
    pub fn new() -> Self {
        Self {
            name: "console".to_string(),
            level: None,
            options: RenderOptions::default(),
            compact: None,
            stderr_levels: None,
            debug_stdout: false,
            eol: DEFAULT_EOL.to_string(),
            silent: false,
        }
    }

    super::render_option_setters!();

    /// Set the levels written to stderr instead of stdout.
    ///
    /// Default to `["error", "debug"]`.
    pub fn stderr_levels<I, S>(mut self, levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stderr_levels = Some(levels.into_iter().map(Into::into).collect());
        self
    }

    /// Write `debug` entries to stdout, leaving only `error` on stderr.
    ///
    /// Cannot be combined with [`ConsoleBuilder::stderr_levels`].
    pub fn debug_stdout(mut self, debug_stdout: bool) -> Self {
        self.debug_stdout = debug_stdout;
        self
    }

    /// Set the line terminator.
    ///
    /// Default to the platform newline.
    pub fn eol(mut self, eol: impl Into<String>) -> Self {
        self.eol = eol.into();
        self
    }

    /// Drop every entry without writing it.
    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Build the [`Console`] transport.
    ///
    /// # Errors
    ///
    /// Returns an [`ErrorKind::InvalidConfig`] error if both `debug_stdout` and
    /// `stderr_levels` are set.
    pub fn build(self) -> Result<Console, Error> {
        let ConsoleBuilder {
            name,
            level,
            mut options,
            compact,
            stderr_levels,
            debug_stdout,
            eol,
            silent,
        } = self;

        let stderr_levels = match (stderr_levels, debug_stdout) {
            (Some(_), true) => {
                return Err(Error::new(
                    ErrorKind::InvalidConfig,
                    "cannot set debug_stdout and stderr_levels together",
                )
                .with_context("transport", &name));
            }
            (Some(levels), false) => levels,
            (None, debug_stdout) => default_stderr_levels(debug_stdout),
        };

        if options.json && options.stringify.is_none() {
            options.stringify = Some(Arc::new(|value| {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }));
        }

        Ok(Console {
            name,
            level,
            rendering: Rendering::new(options, compact),
            stderr_levels,
            eol,
            silent,
        })
    }
}

/// A transport that writes rendered entries to stdout or stderr.
///
/// Entries whose level is one of the configured stderr levels go to stderr, everything else
/// goes to stdout.
///
/// # Examples
///
/// ```
/// use logu::Console;
///
/// let console = Console::builder().colorize(true).timestamp(true).build().unwrap();
/// ```
#[derive(Debug)]
pub struct Console {
    name: String,
    level: Option<String>,
    rendering: Rendering,
    stderr_levels: Vec<String>,
    eol: String,
    silent: bool,
}

impl Default for Console {
    fn default() -> Self {
        Self {
            name: "console".to_string(),
            level: None,
            rendering: Rendering::new(RenderOptions::default(), None),
            stderr_levels: default_stderr_levels(false),
            eol: DEFAULT_EOL.to_string(),
            silent: false,
        }
    }
}

impl Console {
    /// Create a [`ConsoleBuilder`].
    pub fn builder() -> ConsoleBuilder {
        ConsoleBuilder::new()
    }

    /// Whether entries at `level` are written to stderr.
    pub fn is_stderr_level(&self, level: &str) -> bool {
        self.stderr_levels.iter().any(|l| l == level)
    }

    fn format(&self, entry: &Entry<'_>) -> Vec<u8> {
        let mut line = self.rendering.render(entry);
        line.push_str(&self.eol);
        line.into_bytes()
    }
}

impl Transport for Console {
    fn name(&self) -> &str {
        &self.name
    }

    fn level(&self) -> Option<&str> {
        self.level.as_deref()
    }

    fn log(&self, entry: &Entry<'_>) -> Result<(), Error> {
        if self.silent {
            return Ok(());
        }

        let bytes = self.format(entry);
        if self.is_stderr_level(entry.level) {
            std::io::stderr()
                .write_all(&bytes)
                .map_err(Error::from_io_error)
        } else {
            std::io::stdout()
                .write_all(&bytes)
                .map_err(Error::from_io_error)
        }
    }

    fn flush(&self) -> Result<(), Error> {
        std::io::stdout().flush().map_err(Error::from_io_error)?;
        std::io::stderr().flush().map_err(Error::from_io_error)
    }

    fn configure(&self, f: &mut dyn FnMut(&mut RenderOptions)) -> bool {
        self.rendering.configure(f);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::Meta;

    #[test]
    fn test_stderr_levels() {
        let console = Console::builder().build().unwrap();
        assert!(console.is_stderr_level("error"));
        assert!(console.is_stderr_level("debug"));
        assert!(!console.is_stderr_level("info"));

        let console = Console::builder().debug_stdout(true).build().unwrap();
        assert!(console.is_stderr_level("error"));
        assert!(!console.is_stderr_level("debug"));

        let console = Console::builder().stderr_levels(["warn"]).build().unwrap();
        assert!(console.is_stderr_level("warn"));
        assert!(!console.is_stderr_level("error"));
    }

    #[test]
    fn test_conflicting_stderr_options() {
        let err = Console::builder()
            .debug_stdout(true)
            .stderr_levels(["error"])
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
        assert_eq!(err.context("transport"), Some("console"));
    }

    #[test]
    fn test_json_is_pretty_by_default() {
        let console = Console::builder().json(true).eol("|").build().unwrap();
        let meta = Meta::Undefined;
        let entry = Entry {
            level: "info",
            id: None,
            message: "hi",
            meta: &meta,
        };
        let text = String::from_utf8(console.format(&entry)).unwrap();
        assert_eq!(text, "{\n  \"level\": \"info\",\n  \"message\": \"hi\"\n}|");
    }

    #[test]
    fn test_silent() {
        let console = Console::builder().silent(true).build().unwrap();
        let meta = Meta::Undefined;
        let entry = Entry {
            level: "error",
            id: None,
            message: "never printed",
            meta: &meta,
        };
        assert!(console.log(&entry).is_ok());
    }
}
