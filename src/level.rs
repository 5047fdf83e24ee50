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

//! Named levels and their colors.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::LazyLock;
use std::sync::PoisonError;
use std::sync::RwLock;

use colored::Color;
use colored::ColoredString;
use colored::Colorize;
use indexmap::IndexMap;

/// A table of level names and their severities.
///
/// A higher severity number means a more verbose level, e.g. `error=0` and `silly=110`. A
/// transport configured at level `info` receives every call whose severity is lower than or
/// equal to the severity of `info`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Levels {
    map: IndexMap<String, u32>,
}

impl Levels {
    /// Create an empty level table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a level, replacing the severity if the name is already present.
    pub fn with(mut self, name: impl Into<String>, severity: u32) -> Self {
        self.map.insert(name.into(), severity);
        self
    }

    /// Return the severity of the given level name.
    pub fn severity(&self, name: &str) -> Option<u32> {
        self.map.get(name).copied()
    }

    /// Whether the given level name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Level names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    /// Iterate over `(name, severity)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.map.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// The length of the longest level name.
    pub fn longest(&self) -> usize {
        self.map.keys().map(|name| name.len()).max().unwrap_or(0)
    }

    /// Number of levels.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for Levels {
    fn from_iter<T: IntoIterator<Item = (S, u32)>>(iter: T) -> Self {
        Levels {
            map: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// A parsed color specification, e.g. `"bold red"` or `"grey"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColorSpec {
    fg: Option<Color>,
    bold: bool,
    dimmed: bool,
    italic: bool,
    underline: bool,
}

impl ColorSpec {
    /// A spec with only a foreground color.
    pub fn fg(color: Color) -> Self {
        Self {
            fg: Some(color),
            ..Self::default()
        }
    }

    /// Apply this spec to `text`.
    pub fn paint(&self, text: &str) -> ColoredString {
        let mut s = ColoredString::from(text);
        if let Some(fg) = self.fg {
            s = s.color(fg);
        }
        if self.bold {
            s = s.bold();
        }
        if self.dimmed {
            s = s.dimmed();
        }
        if self.italic {
            s = s.italic();
        }
        if self.underline {
            s = s.underline();
        }
        s
    }
}

impl FromStr for ColorSpec {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut spec = ColorSpec::default();
        for word in s.split_whitespace() {
            match word.to_ascii_lowercase().as_str() {
                "bold" => spec.bold = true,
                "dim" | "dimmed" => spec.dimmed = true,
                "italic" => spec.italic = true,
                "underline" => spec.underline = true,
                "grey" | "gray" => spec.fg = Some(Color::BrightBlack),
                other => spec.fg = Some(Color::from_str(other)?),
            }
        }
        Ok(spec)
    }
}

/// A mapping from level names to colors.
///
/// The key `default` is used for levels without a color of their own.
#[derive(Debug, Clone, Default)]
pub struct Colors {
    map: HashMap<String, ColorSpec>,
}

impl Colors {
    /// Merge `colors` into this table. Later entries override earlier ones for the same level.
    ///
    /// Unparsable color names are ignored.
    pub fn add<K, V>(&mut self, colors: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: AsRef<str>,
    {
        for (level, color) in colors {
            if let Ok(spec) = color.as_ref().parse::<ColorSpec>() {
                self.map.insert(level.into(), spec);
            }
        }
    }

    /// The color of `level`, falling back to the `default` entry.
    pub fn get(&self, level: &str) -> Option<ColorSpec> {
        self.map
            .get(level)
            .or_else(|| self.map.get("default"))
            .copied()
    }

    /// Colorize `text` with the color of `level`. Returns `text` unmodified if no color applies.
    pub fn colorize(&self, level: &str, text: &str) -> String {
        match self.get(level) {
            Some(spec) => spec.paint(text).to_string(),
            None => text.to_string(),
        }
    }
}

static COLORS: LazyLock<RwLock<Colors>> = LazyLock::new(|| {
    let mut colors = Colors::default();
    colors.add(crate::config::npm().colors);
    RwLock::new(colors)
});

/// Merge `colors` into the process-wide color table used by every renderer.
pub fn add_colors<K, V>(colors: impl IntoIterator<Item = (K, V)>)
where
    K: Into<String>,
    V: AsRef<str>,
{
    COLORS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .add(colors);
}

/// Colorize `text` with the process-wide color of `level`.
pub fn colorize(level: &str, text: &str) -> String {
    COLORS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .colorize(level, text)
}
