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

use std::fmt;
use std::sync::Arc;

use jiff::Zoned;

const SHORT: &str = "%H:%M:%S.%3f";
const ISO: &str = "%Y-%m-%dT%H:%M:%S.%3f%:z";
const LONG: &str = "%Y-%m-%d %H:%M:%S.%3f";
const DATE: &str = "%Y-%m-%d";

/// How a rendered entry is timestamped.
#[derive(Clone, Default)]
pub enum Timestamp {
    /// No timestamp.
    #[default]
    Off,
    /// A named style (`short`, `iso`, `long`, `date`) or a strftime pattern.
    Named(String),
    /// A user-defined timestamp function.
    Custom(Arc<dyn Fn() -> String + Send + Sync>),
}

impl Timestamp {
    /// The `short` style.
    pub fn short() -> Self {
        Timestamp::Named("short".to_string())
    }

    /// Use `f` to produce timestamps.
    pub fn custom(f: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Timestamp::Custom(Arc::new(f))
    }

    /// Whether no timestamp is produced.
    pub fn is_off(&self) -> bool {
        matches!(self, Timestamp::Off)
    }

    pub(crate) fn resolve(&self) -> Option<String> {
        match self {
            Timestamp::Off => None,
            Timestamp::Named(name) => Some(format_timestamp(name)),
            Timestamp::Custom(f) => Some(f()),
        }
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Off => f.write_str("Off"),
            Timestamp::Named(name) => f.debug_tuple("Named").field(name).finish(),
            Timestamp::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl From<bool> for Timestamp {
    fn from(enabled: bool) -> Self {
        if enabled {
            Timestamp::short()
        } else {
            Timestamp::Off
        }
    }
}

impl From<&str> for Timestamp {
    fn from(name: &str) -> Self {
        Timestamp::Named(name.to_string())
    }
}

/// Format the current time in the named style.
///
/// Unrecognized names containing `%` are used as strftime patterns; anything else falls back to
/// the `short` style.
pub fn format_timestamp(name: &str) -> String {
    format_timestamp_at(name, &Zoned::now())
}

pub(crate) fn format_timestamp_at(name: &str, time: &Zoned) -> String {
    let pattern = match name.to_ascii_lowercase().as_str() {
        "short" => SHORT,
        "iso" => ISO,
        "long" => LONG,
        "date" => DATE,
        _ if name.contains('%') => name,
        _ => SHORT,
    };

    jiff::fmt::strtime::format(pattern, time)
        .or_else(|_| jiff::fmt::strtime::format(SHORT, time))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed() -> Zoned {
        "2024-08-10T13:04:05.123+00:00[UTC]".parse().unwrap()
    }

    #[test]
    fn test_named_styles() {
        let time = fixed();
        assert_eq!(format_timestamp_at("short", &time), "13:04:05.123");
        assert_eq!(format_timestamp_at("SHORT", &time), "13:04:05.123");
        assert_eq!(format_timestamp_at("iso", &time), "2024-08-10T13:04:05.123+00:00");
        assert_eq!(format_timestamp_at("long", &time), "2024-08-10 13:04:05.123");
        assert_eq!(format_timestamp_at("date", &time), "2024-08-10");
    }

    #[test]
    fn test_pattern_and_fallback() {
        let time = fixed();
        assert_eq!(format_timestamp_at("%Y/%m", &time), "2024/08");
        assert_eq!(format_timestamp_at("whatever", &time), "13:04:05.123");
    }

    #[test]
    fn test_resolve() {
        assert_eq!(Timestamp::Off.resolve(), None);
        assert_eq!(
            Timestamp::custom(|| "now".to_string()).resolve().as_deref(),
            Some("now")
        );
        assert!(Timestamp::from(true).resolve().is_some());
    }
}
