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

//! Rendering of log records into lines of text.
//!
//! A [`Renderer`] produces one of three encodings:
//!
//! * raw: a flat JSON object with ANSI codes stripped, suitable for streaming to stdout;
//! * json: a JSON object, optionally repackaged in the logstash `@message`/`@fields` layout;
//! * string: a column-aligned, optionally colored line.
//!
//! String mode output looks like:
//!
//! ```text
//! [13:04:05.123] info:  build      Hello, this is a logging event foo=bar, arr=[1, 2]
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use colored::Colorize as _;
use serde_json::Map;
use serde_json::Value;

pub use self::inspect::inspect;
pub use self::serialize::serialize;
use crate::level;
use crate::meta::Meta;
use crate::meta::MetaKind;
use crate::timestamp::Timestamp;

mod inspect;
mod serialize;

/// Which parts of a string-mode line are colored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Colorize {
    /// No colors.
    #[default]
    Off,
    /// Level token and id.
    On,
    /// Level token and id.
    Level,
    /// Message and id.
    Message,
    /// Level token, id and message.
    All,
}

impl Colorize {
    fn enabled(self) -> bool {
        self != Colorize::Off
    }

    fn level(self) -> bool {
        matches!(self, Colorize::On | Colorize::Level | Colorize::All)
    }

    fn message(self) -> bool {
        matches!(self, Colorize::Message | Colorize::All)
    }
}

impl From<bool> for Colorize {
    fn from(enabled: bool) -> Self {
        if enabled { Colorize::On } else { Colorize::Off }
    }
}

/// The metadata printer used in string mode.
#[derive(Clone, Default)]
pub enum PrettyPrint {
    /// `key=value` serialization.
    #[default]
    Off,
    /// Structural pretty printing on a new line.
    On,
    /// A user-defined printer.
    Custom(Arc<dyn Fn(&Meta) -> String + Send + Sync>),
}

impl fmt::Debug for PrettyPrint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrettyPrint::Off => f.write_str("Off"),
            PrettyPrint::On => f.write_str("On"),
            PrettyPrint::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Encodes the JSON object of json mode.
pub type Stringify = Arc<dyn Fn(&Value) -> String + Send + Sync>;

/// Replaces string mode rendering entirely.
pub type Formatter = Arc<dyn Fn(&LogRecord<'_>) -> String + Send + Sync>;

/// Options controlling how a transport renders its entries.
#[derive(Clone)]
pub struct RenderOptions {
    /// Prefix every line with this host name.
    pub host: Option<String>,
    /// Render as JSON.
    pub json: bool,
    /// Render as flat JSON without ANSI codes. Takes precedence over `json`.
    pub raw: bool,
    /// Render as logstash JSON.
    pub logstash: bool,
    /// Which parts of a string-mode line are colored.
    pub colorize: Colorize,
    /// How metadata is printed in string mode.
    pub pretty_print: PrettyPrint,
    /// Timestamp of each entry.
    pub timestamp: Timestamp,
    /// Whether the level token is printed in string mode.
    pub show_level: bool,
    /// A label printed before the id in the labeled layout.
    pub label: Option<String>,
    /// Whether the labeled layout is used when the terminal is wide enough.
    pub show_label: bool,
    /// Maximum depth of structural pretty printing.
    pub depth: Option<usize>,
    /// Custom encoder for json mode.
    pub stringify: Option<Stringify>,
    /// Custom string mode renderer.
    pub formatter: Option<Formatter>,
    /// Print the stack of unhandled exception metadata line by line.
    pub human_readable_unhandled_exception: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            host: None,
            json: false,
            raw: false,
            logstash: false,
            colorize: Colorize::Off,
            pretty_print: PrettyPrint::Off,
            timestamp: Timestamp::Off,
            show_level: true,
            label: None,
            show_label: false,
            depth: None,
            stringify: None,
            formatter: None,
            human_readable_unhandled_exception: true,
        }
    }
}

impl fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderOptions")
            .field("host", &self.host)
            .field("json", &self.json)
            .field("raw", &self.raw)
            .field("logstash", &self.logstash)
            .field("colorize", &self.colorize)
            .field("pretty_print", &self.pretty_print)
            .field("timestamp", &self.timestamp)
            .field("show_level", &self.show_level)
            .field("label", &self.label)
            .field("show_label", &self.show_label)
            .field("depth", &self.depth)
            .field("stringify", &self.stringify.is_some())
            .field("formatter", &self.formatter.is_some())
            .finish_non_exhaustive()
    }
}

/// The output encoding chosen for a record, first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// `raw` is set.
    Raw,
    /// `json` or `logstash` is set.
    Json,
    /// Neither.
    String,
}

impl RenderOptions {
    /// The output encoding these options select.
    pub fn mode(&self) -> OutputMode {
        if self.raw {
            OutputMode::Raw
        } else if self.json || self.logstash {
            OutputMode::Json
        } else {
            OutputMode::String
        }
    }
}

/// A single log entry as seen by a [`Renderer`].
#[derive(Debug, Clone, Copy)]
pub struct LogRecord<'a> {
    /// Level name.
    pub level: &'a str,
    /// Free-form identifier, e.g. a subsystem tag.
    pub id: Option<&'a str>,
    /// The message text.
    pub message: &'a str,
    /// Attached metadata.
    pub meta: &'a Meta,
    /// The label, already resolved against the metadata.
    pub label: Option<&'a str>,
    /// Rendering options.
    pub options: &'a RenderOptions,
}

#[derive(Debug, Clone, Copy)]
struct Widths {
    id: usize,
    label: usize,
    level: usize,
    sumup: usize,
}

impl Default for Widths {
    fn default() -> Self {
        Self {
            id: 10,
            label: 8,
            level: 6,
            sumup: 5,
        }
    }
}

/// Renders [`LogRecord`]s into text.
///
/// A renderer keeps column widths across calls so that successive lines stay aligned: when an
/// id, a label or a level token is wider than its column, the column grows and keeps that width
/// for every later record. Columns never shrink. The widths sit behind a mutex, so a renderer may
/// be shared between threads.
#[derive(Debug)]
pub struct Renderer {
    widths: Mutex<Widths>,
    compact: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    /// Create a renderer, choosing the compact layout if the terminal is narrower than 120
    /// columns or its width is unknown.
    pub fn new() -> Self {
        let compact = crossterm::terminal::size().map_or(true, |(columns, _)| columns < 120);
        Self {
            widths: Mutex::new(Widths::default()),
            compact,
        }
    }

    /// Force the compact (`true`) or labeled (`false`) id layout.
    pub fn compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Current width of the id column.
    pub fn id_width(&self) -> usize {
        self.widths().id
    }

    /// Current width of the label column.
    pub fn label_width(&self) -> usize {
        self.widths().label
    }

    /// Current width of the level column.
    pub fn level_width(&self) -> usize {
        self.widths().level
    }

    fn widths(&self) -> std::sync::MutexGuard<'_, Widths> {
        self.widths.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Render `record` into a single string.
    pub fn render(&self, record: &LogRecord<'_>) -> String {
        let timestamp = record.options.timestamp.resolve();
        match record.options.mode() {
            OutputMode::Raw => self.render_raw(timestamp, record),
            OutputMode::Json => self.render_json(timestamp, record),
            OutputMode::String => self.render_string(timestamp, record),
        }
    }

    fn render_raw(&self, timestamp: Option<String>, record: &LogRecord<'_>) -> String {
        let mut output = meta_fields(record.meta);
        if let Some(id) = record.id.filter(|id| !id.is_empty()) {
            output.insert("id".to_string(), id.into());
        }
        if let Some(label) = record.label {
            output.insert("label".to_string(), label.into());
        }
        output.insert("level".to_string(), record.level.into());
        output.insert("message".to_string(), strip_ansi(record.message).into());
        if let Some(timestamp) = timestamp {
            output.insert("timestamp".to_string(), strip_ansi(&timestamp).into());
        }
        Value::Object(output).to_string()
    }

    fn render_json(&self, timestamp: Option<String>, record: &LogRecord<'_>) -> String {
        let options = record.options;
        let mut output = meta_fields(record.meta);
        output.insert("level".to_string(), record.level.into());
        output.insert("message".to_string(), record.message.into());
        if let Some(id) = record.id.filter(|id| !id.is_empty()) {
            output.insert("id".to_string(), id.into());
        }
        if let Some(label) = record.label {
            output.insert("label".to_string(), label.into());
        }
        if let Some(timestamp) = timestamp {
            output.insert("timestamp".to_string(), timestamp.into());
        }

        if options.logstash {
            let mut logstash = Map::new();
            if let Some(message) = output.shift_remove("message") {
                logstash.insert("@message".to_string(), message);
            }
            if let Some(timestamp) = output.shift_remove("timestamp") {
                logstash.insert("@timestamp".to_string(), timestamp);
            }
            logstash.insert("@fields".to_string(), Value::Object(output));
            output = logstash;
        }

        let output = Value::Object(output);
        match &options.stringify {
            Some(stringify) => stringify(&output),
            None => output.to_string(),
        }
    }

    fn render_string(&self, timestamp: Option<String>, record: &LogRecord<'_>) -> String {
        let options = record.options;
        if let Some(formatter) = &options.formatter {
            return formatter(record);
        }

        let colorize = options.colorize;
        let by_level = |text: &str| {
            if colorize.enabled() {
                level::colorize(record.level, text)
            } else {
                text.to_string()
            }
        };

        let mut output = String::new();
        if let Some(timestamp) = timestamp {
            let timestamp = format!("[{timestamp}]");
            if colorize.enabled() {
                output.push_str(&timestamp.as_str().dimmed().to_string());
            } else {
                output.push_str(&timestamp);
            }
            output.push(' ');
        }
        if let Some(host) = options.host.as_deref().filter(|host| !host.is_empty()) {
            output.push_str(host);
            output.push(' ');
        }

        let mut widths = self.widths();

        if options.show_level {
            let token = format!("{}:", record.level);
            let token_width = token.chars().count();
            widths.level = widths.level.max(token_width);
            let spaces = widths.level - token_width + 1;
            if colorize.level() {
                output.push_str(&level::colorize(record.level, &token));
            } else {
                output.push_str(&token);
            }
            output.push_str(&" ".repeat(spaces));
        }

        if let Some(id) = record.id.filter(|id| !id.is_empty()) {
            if self.compact || !options.show_label {
                // an overflowing id widens the column for subsequent records
                let id_width = id.chars().count();
                if id_width > widths.id {
                    widths.id = id_width + widths.sumup;
                }
                output.push_str(&by_level(&format!("{id:<width$}", width = widths.id)));
                output.push(' ');
            } else {
                let label = record.label.unwrap_or_default();
                let length = id.chars().count() + label.chars().count() + 1;
                while widths.id + widths.label < length + 1 {
                    widths.label += widths.sumup;
                }
                let spaces = widths.id + widths.label - length;
                if colorize.enabled() {
                    output.push_str(&label.green().to_string());
                } else {
                    output.push_str(label);
                }
                output.push_str(&" ".repeat(spaces));
                output.push_str(&by_level(id));
                output.push(' ');
            }
        }
        drop(widths);

        if colorize.message() {
            output.push_str(&level::colorize(record.level, record.message));
        } else {
            output.push_str(record.message);
        }

        let suffix = self.meta_suffix(record);
        if !suffix.is_empty() {
            if !output.ends_with(' ') {
                output.push(' ');
            }
            output.push_str(&suffix);
        }

        output
    }

    fn meta_suffix(&self, record: &LogRecord<'_>) -> String {
        let options = record.options;
        let meta = record.meta.decycle();
        match &meta {
            Meta::Undefined | Meta::Null => String::new(),
            Meta::Error(err) if err.stack.is_some() => err.stack.clone().unwrap_or_default(),
            meta if meta.kind() == MetaKind::Scalar => serialize(meta, None),
            meta if meta.key_count().unwrap_or_else(|| array_len(meta)) == 0 => String::new(),
            meta if options.human_readable_unhandled_exception && is_unhandled_exception(meta) => {
                let mut rest = meta.clone();
                let mut stack = Meta::Undefined;
                if let Meta::Object(map) = &mut rest {
                    map.shift_remove("trace");
                    stack = map.shift_remove("stack").unwrap_or_default();
                }
                let mut text = serialize(&rest, None);
                if let Meta::Array(lines) = stack {
                    let lines = lines
                        .iter()
                        .map(|line| serialize(line, None))
                        .collect::<Vec<_>>();
                    text.push('\n');
                    text.push_str(&lines.join("\n"));
                }
                text
            }
            meta => match &options.pretty_print {
                PrettyPrint::Custom(print) => print(meta),
                PrettyPrint::On => {
                    format!("\n{}", inspect(meta, options.depth, options.colorize.enabled()))
                }
                PrettyPrint::Off => serialize(meta, None),
            },
        }
    }
}

fn array_len(meta: &Meta) -> usize {
    match meta {
        Meta::Array(items) => items.len(),
        _ => 0,
    }
}

fn is_unhandled_exception(meta: &Meta) -> bool {
    match meta {
        Meta::Object(map) => {
            map.len() == 5
                && ["date", "process", "os", "trace", "stack"]
                    .iter()
                    .all(|key| map.contains_key(*key))
        }
        _ => false,
    }
}

/// The JSON fields contributed by metadata: objects are cloned, anything else is wrapped as
/// `{"data": value}`.
fn meta_fields(meta: &Meta) -> Map<String, Value> {
    if meta.is_nothing() {
        return Map::new();
    }
    match meta.to_json() {
        Value::Object(map) if meta.kind() == MetaKind::Object => map,
        value => {
            let mut map = Map::new();
            map.insert("data".to_string(), value);
            map
        }
    }
}

/// Remove ANSI escape sequences from `text`.
pub fn strip_ansi(text: &str) -> String {
    strip_ansi_escapes::strip_str(text)
}
