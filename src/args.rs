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

//! Interpretation of variadic log call arguments.
//!
//! A log call carries a list of [`Arg`]s after its level. [`parse_log_args`] decides which of
//! them is the completion callback, the metadata, the id and the message:
//!
//! 1. trailing `null`s are dropped;
//! 2. a trailing callback is taken as the completion callback;
//! 3. if the first argument is a format string (contains `%s`, `%d`, `%j` or `%%`), only a
//!    trailing object is taken as metadata; otherwise a trailing object, error or array is;
//! 4. without a format string, if more than one argument remains, the first one is the id;
//! 5. the rest is interpolated printf-style into the message.

use std::fmt;

use crate::logger::Callback;
use crate::logger::Completion;
use crate::meta::ErrorMeta;
use crate::meta::Meta;
use crate::meta::MetaKind;
use crate::meta::MetaMap;
use crate::meta::SharedMeta;
use crate::meta::float_text;
use crate::meta::number_text;
use crate::render::inspect;

/// One argument of a log call.
pub enum Arg {
    /// A value: message text, interpolation argument, id or metadata.
    Value(Meta),
    /// The completion callback.
    Callback(Callback),
}

impl Arg {
    /// Wrap `f` as a completion callback argument.
    pub fn callback(f: impl FnOnce(Completion) + Send + 'static) -> Arg {
        Arg::Callback(Box::new(f))
    }

    fn as_meta(&self) -> Option<&Meta> {
        match self {
            Arg::Value(meta) => Some(meta),
            Arg::Callback(_) => None,
        }
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Value(meta) => f.debug_tuple("Value").field(meta).finish(),
            Arg::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

macro_rules! impl_arg_from {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Arg {
                fn from(value: $t) -> Self {
                    Arg::Value(Meta::from(value))
                }
            }
        )*
    };
}

impl_arg_from!(
    &str,
    String,
    bool,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    usize,
    isize,
    f64,
    jiff::Timestamp,
    serde_json::Value,
    MetaMap,
    ErrorMeta,
    SharedMeta,
    Vec<Meta>
);

impl From<Meta> for Arg {
    fn from(value: Meta) -> Self {
        Arg::Value(value)
    }
}

impl From<&String> for Arg {
    fn from(value: &String) -> Self {
        Arg::Value(Meta::from(value.as_str()))
    }
}

impl From<Callback> for Arg {
    fn from(value: Callback) -> Self {
        Arg::Callback(value)
    }
}

/// `None` is `undefined`.
impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => value.into(),
            None => Arg::Value(Meta::Undefined),
        }
    }
}

/// Build a `Vec<Arg>` from heterogeneous values.
///
/// ```
/// use logu::args;
///
/// let args = args!["db", "connected to %s", "localhost", serde_json::json!({"port": 5432})];
/// assert_eq!(args.len(), 4);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Arg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::Arg::from($arg)),+]
    };
}

/// The outcome of [`parse_log_args`].
pub struct ParsedArgs {
    /// The id, if one was given.
    pub id: Option<String>,
    /// The interpolated message.
    pub message: String,
    /// The metadata; an empty object if none was given.
    pub meta: Meta,
    /// The completion callback, if one was given.
    pub callback: Option<Callback>,
}

impl fmt::Debug for ParsedArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParsedArgs")
            .field("id", &self.id)
            .field("message", &self.message)
            .field("meta", &self.meta)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

/// Split the arguments of a log call into id, message, metadata and callback.
pub fn parse_log_args(mut args: Vec<Arg>) -> ParsedArgs {
    while matches!(args.last(), Some(Arg::Value(Meta::Null))) {
        args.pop();
    }

    let callback = match args.pop() {
        Some(Arg::Callback(callback)) => Some(callback),
        Some(other) => {
            args.push(other);
            None
        }
        None => None,
    };

    let is_format = args
        .first()
        .and_then(Arg::as_meta)
        .is_some_and(|first| match first {
            Meta::String(s) => is_format_string(s),
            _ => false,
        });

    let valid_meta = args.last().and_then(Arg::as_meta).is_some_and(|last| {
        let kind = last.kind();
        if is_format {
            kind == MetaKind::Object
        } else {
            matches!(kind, MetaKind::Object | MetaKind::Error | MetaKind::Array)
        }
    });

    let meta = match valid_meta.then(|| args.pop()).flatten() {
        Some(Arg::Value(meta)) => meta,
        _ => Meta::object(),
    };

    let id = if args.len() > 1 && !is_format {
        Some(display_arg(&args.remove(0)))
    } else {
        None
    };

    ParsedArgs {
        id,
        message: format_message(&args),
        meta,
        callback,
    }
}

fn is_format_string(s: &str) -> bool {
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '%' && matches!(chars.clone().next(), Some('s' | 'd' | 'j' | '%')) {
            return true;
        }
    }
    false
}

/// Interpolate `%s`, `%d`, `%j` and `%%` in the first argument with the following ones, then
/// append the remaining arguments separated by spaces.
///
/// Strings are inserted verbatim, other values are pretty printed. Placeholders without a
/// matching argument are kept as-is.
pub fn format_message(args: &[Arg]) -> String {
    let mut output = String::new();
    let mut rest = args.iter();

    if let Some(Arg::Value(Meta::String(format))) = args.first() {
        rest.next();
        let mut chars = format.chars().peekable();
        while let Some(c) = chars.next() {
            if c != '%' {
                output.push(c);
                continue;
            }
            match chars.peek().copied() {
                Some('%') => {
                    chars.next();
                    output.push('%');
                }
                Some(spec @ ('s' | 'd' | 'j')) => {
                    chars.next();
                    match rest.next() {
                        Some(arg) => output.push_str(&interpolate(spec, arg)),
                        None => {
                            output.push('%');
                            output.push(spec);
                        }
                    }
                }
                _ => output.push('%'),
            }
        }
    } else if let Some(first) = rest.next() {
        output.push_str(&display_arg(first));
    }

    for arg in rest {
        output.push(' ');
        output.push_str(&display_arg(arg));
    }
    output
}

fn interpolate(spec: char, arg: &Arg) -> String {
    let Arg::Value(meta) = arg else {
        return "[Function]".to_string();
    };
    match spec {
        'd' => number(meta),
        'j' => meta.to_json().to_string(),
        _ => display_arg(arg),
    }
}

fn number(meta: &Meta) -> String {
    let value = match meta {
        Meta::Number(n) => return number_text(n),
        Meta::Bool(b) => f64::from(u8::from(*b)),
        Meta::Null => 0.0,
        Meta::String(s) if s.trim().is_empty() => 0.0,
        Meta::String(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        Meta::Date(ts) => ts.as_millisecond() as f64,
        _ => f64::NAN,
    };
    float_text(value)
}

fn display_arg(arg: &Arg) -> String {
    match arg {
        Arg::Value(Meta::String(s)) => s.clone(),
        Arg::Value(meta) => inspect(meta, None, false),
        Arg::Callback(_) => "[Function]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(args: Vec<Arg>) -> ParsedArgs {
        parse_log_args(args)
    }

    #[test]
    fn test_format_string() {
        let parsed = parse(args!["test message %s", "my string"]);
        assert_eq!(parsed.message, "test message my string");
        assert_eq!(parsed.id, None);
        assert_eq!(parsed.meta.key_count(), Some(0));
    }

    #[test]
    fn test_undefined_message() {
        let parsed = parse(args![None::<&str>]);
        assert_eq!(parsed.message, "undefined");
        assert!(parsed.callback.is_none());
    }

    #[test]
    fn test_error_is_meta() {
        let parsed = parse(args!["An error happened: ", ErrorMeta::new("I am something bad")]);
        assert!(matches!(parsed.meta, Meta::Error(ref err) if err.message == "I am something bad"));
        assert_eq!(parsed.message, "An error happened: ");
        assert_eq!(parsed.id, None);
    }

    #[test]
    fn test_id_split() {
        let parsed = parse(args![
            "build",
            "Hello, this is a logging event",
            json!({"foo": "bar"})
        ]);
        assert_eq!(parsed.id.as_deref(), Some("build"));
        assert_eq!(parsed.message, "Hello, this is a logging event");
        assert_eq!(parsed.meta.get_str("foo").as_deref(), Some("bar"));
    }

    #[test]
    fn test_no_interpolation_symbols() {
        let parsed = parse(args!["No interpolation symbols", "ok", "why", json!({"meta": "is-this"})]);
        assert_eq!(parsed.id.as_deref(), Some("No interpolation symbols"));
        assert_eq!(parsed.message, "ok why");
        assert_eq!(parsed.meta.get_str("meta").as_deref(), Some("is-this"));
    }

    #[test]
    fn test_format_string_keeps_arrays_in_message() {
        let parsed = parse(args!["values %s", "a", json!([1, 2])]);
        assert_eq!(parsed.id, None);
        assert_eq!(parsed.message, "values a [ 1, 2 ]");
        assert_eq!(parsed.meta.key_count(), Some(0));
    }

    #[test]
    fn test_trailing_nulls_and_callback() {
        let parsed = parse(vec![
            Arg::from("hello"),
            Arg::callback(|_| {}),
            Arg::from(Meta::Null),
            Arg::from(Meta::Null),
        ]);
        assert!(parsed.callback.is_some());
        assert_eq!(parsed.message, "hello");
    }

    #[test]
    fn test_placeholders() {
        let parsed = parse(args!["%d%% of %j, %s", "42.0", json!(["a", 1])]);
        assert_eq!(parsed.message, r#"42% of ["a",1], %s"#);
        let parsed = parse(args!["%d", "abc"]);
        assert_eq!(parsed.message, "NaN");
    }

    #[test]
    fn test_whole_floats_print_as_integers() {
        let parsed = parse(args!["%d items, %s", 3.0, 2.0]);
        assert_eq!(parsed.message, "3 items, 2");
        let parsed = parse(args!["took", 2.0]);
        assert_eq!(parsed.message, "2");
        let parsed = parse(args!["%d and %s", 2.5, -0.25]);
        assert_eq!(parsed.message, "2.5 and -0.25");
    }

    #[test]
    fn test_single_object_is_meta() {
        let parsed = parse(args![json!({"foo": "bar"})]);
        assert_eq!(parsed.message, "");
        assert_eq!(parsed.id, None);
        assert_eq!(parsed.meta.key_count(), Some(1));
    }

    #[test]
    fn test_empty() {
        let parsed = parse(args![]);
        assert_eq!(parsed.message, "");
        assert!(parsed.callback.is_none());
    }
}
