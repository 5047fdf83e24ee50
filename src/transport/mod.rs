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

//! Output sinks for log entries.

use std::fmt;
use std::sync::PoisonError;
use std::sync::RwLock;

use crate::Error;
use crate::meta::Meta;
use crate::render::LogRecord;
use crate::render::RenderOptions;
use crate::render::Renderer;

mod console;
mod file;
mod memory;

pub use self::console::Console;
pub use self::console::ConsoleBuilder;
pub use self::file::File;
pub use self::file::FileBuilder;
pub use self::memory::Memory;
pub use self::memory::MemoryBuilder;

/// A log entry handed to a transport.
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a> {
    /// Level name.
    pub level: &'a str,
    /// Free-form identifier, if any.
    pub id: Option<&'a str>,
    /// The final message text.
    pub message: &'a str,
    /// Attached metadata.
    pub meta: &'a Meta,
}

/// An output sink for log entries.
///
/// Transports are invoked from a dedicated worker thread, one per registered transport, so
/// `log` may block on I/O without holding up the caller of [`Logger::log`].
///
/// [`Logger::log`]: crate::Logger::log
pub trait Transport: fmt::Debug + Send + Sync + 'static {
    /// The name the transport is registered under. Names are unique within a logger.
    fn name(&self) -> &str;

    /// The minimum level of this transport; `None` inherits the level of the logger.
    fn level(&self) -> Option<&str> {
        None
    }

    /// Write one entry.
    fn log(&self, entry: &Entry<'_>) -> Result<(), Error>;

    /// Flush any buffered entries.
    ///
    /// Default to a no-op.
    fn flush(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Adjust the rendering options in place.
    ///
    /// Returns `false` if the transport does not render through [`RenderOptions`]. Default to
    /// `false`.
    fn configure(&self, f: &mut dyn FnMut(&mut RenderOptions)) -> bool {
        let _ = f;
        false
    }
}

/// Rendering state shared by the bundled transports.
#[derive(Debug)]
pub(crate) struct Rendering {
    renderer: Renderer,
    options: RwLock<RenderOptions>,
}

impl Rendering {
    pub(crate) fn new(options: RenderOptions, compact: Option<bool>) -> Self {
        let renderer = match compact {
            Some(compact) => Renderer::new().compact(compact),
            None => Renderer::new(),
        };
        Self {
            renderer,
            options: RwLock::new(options),
        }
    }

    /// Render `entry`, taking the label from a string `label` metadata field if there is one.
    pub(crate) fn render(&self, entry: &Entry<'_>) -> String {
        let options = self.options.read().unwrap_or_else(PoisonError::into_inner);
        let meta_label = match entry.meta.get("label") {
            Some(Meta::String(label)) => Some(label),
            _ => None,
        };
        let record = LogRecord {
            level: entry.level,
            id: entry.id,
            message: entry.message,
            meta: entry.meta,
            label: meta_label.as_deref().or(options.label.as_deref()),
            options: &options,
        };
        self.renderer.render(&record)
    }

    pub(crate) fn configure(&self, f: &mut dyn FnMut(&mut RenderOptions)) {
        let mut options = self.options.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut options);
    }
}

/// The levels written to the error stream when none are configured.
pub(crate) fn default_stderr_levels(debug_stdout: bool) -> Vec<String> {
    if debug_stdout {
        vec!["error".to_string()]
    } else {
        vec!["error".to_string(), "debug".to_string()]
    }
}

/// Generates the rendering option setters shared by the transport builders.
macro_rules! render_option_setters {
    () => {
        /// Prefix every line with `host`.
        pub fn host(mut self, host: impl Into<String>) -> Self {
            self.options.host = Some(host.into());
            self
        }

        /// Render entries as JSON.
        pub fn json(mut self, json: bool) -> Self {
            self.options.json = json;
            self
        }

        /// Render entries as flat JSON with ANSI codes stripped.
        pub fn raw(mut self, raw: bool) -> Self {
            self.options.raw = raw;
            self
        }

        /// Render entries as logstash JSON.
        pub fn logstash(mut self, logstash: bool) -> Self {
            self.options.logstash = logstash;
            self
        }

        /// Choose which parts of a line are colored.
        pub fn colorize(mut self, colorize: impl Into<$crate::render::Colorize>) -> Self {
            self.options.colorize = colorize.into();
            self
        }

        /// Choose how metadata is printed.
        pub fn pretty_print(mut self, pretty_print: $crate::render::PrettyPrint) -> Self {
            self.options.pretty_print = pretty_print;
            self
        }

        /// Set the timestamp of each line.
        pub fn timestamp(mut self, timestamp: impl Into<$crate::Timestamp>) -> Self {
            self.options.timestamp = timestamp.into();
            self
        }

        /// Whether to print the level token.
        pub fn show_level(mut self, show_level: bool) -> Self {
            self.options.show_level = show_level;
            self
        }

        /// Set a label printed before the id. Setting a label enables the labeled layout.
        pub fn label(mut self, label: impl Into<String>) -> Self {
            self.options.label = Some(label.into());
            self.options.show_label = true;
            self
        }

        /// Whether the labeled layout is used when the terminal is wide enough.
        pub fn show_label(mut self, show_label: bool) -> Self {
            self.options.show_label = show_label;
            self
        }

        /// Limit the depth of structural pretty printing.
        pub fn depth(mut self, depth: usize) -> Self {
            self.options.depth = Some(depth);
            self
        }

        /// Set a custom JSON encoder.
        pub fn stringify(mut self, stringify: impl Fn(&serde_json::Value) -> String + Send + Sync + 'static) -> Self {
            self.options.stringify = Some(::std::sync::Arc::new(stringify));
            self
        }

        /// Replace string mode rendering with a custom formatter.
        pub fn formatter(
            mut self,
            formatter: impl Fn(&$crate::render::LogRecord<'_>) -> String + Send + Sync + 'static,
        ) -> Self {
            self.options.formatter = Some(::std::sync::Arc::new(formatter));
            self
        }

        /// Whether unhandled exception metadata prints its stack line by line.
        pub fn human_readable_unhandled_exception(mut self, enabled: bool) -> Self {
            self.options.human_readable_unhandled_exception = enabled;
            self
        }

        /// Replace all rendering options at once.
        pub fn render_options(mut self, options: $crate::render::RenderOptions) -> Self {
            self.options = options;
            self
        }

        /// Force the compact (`true`) or labeled (`false`) id layout instead of choosing by
        /// terminal width.
        pub fn compact(mut self, compact: bool) -> Self {
            self.compact = Some(compact);
            self
        }

        /// Set the minimum level of this transport.
        pub fn level(mut self, level: impl Into<String>) -> Self {
            self.level = Some(level.into());
            self
        }

        /// Set the name the transport is registered under.
        pub fn name(mut self, name: impl Into<String>) -> Self {
            self.name = name.into();
            self
        }
    };
}

pub(crate) use render_option_setters;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_label_from_meta() {
        let options = RenderOptions {
            label: Some("fallback".to_string()),
            show_label: true,
            ..RenderOptions::default()
        };
        let rendering = Rendering::new(options, Some(false));

        let meta = Meta::from(json!({"label": "web"}));
        let entry = Entry {
            level: "info",
            id: Some("http"),
            message: "listening",
            meta: &meta,
        };
        assert!(rendering.render(&entry).starts_with("info:  web"));

        let meta = Meta::object();
        let entry = Entry { meta: &meta, ..entry };
        assert!(rendering.render(&entry).starts_with("info:  fallback"));
    }

    #[test]
    fn test_configure() {
        let rendering = Rendering::new(RenderOptions::default(), Some(true));
        rendering.configure(&mut |options| options.show_level = false);
        let meta = Meta::Undefined;
        let entry = Entry {
            level: "info",
            id: None,
            message: "hello",
            meta: &meta,
        };
        assert_eq!(rendering.render(&entry), "hello");
    }
}
