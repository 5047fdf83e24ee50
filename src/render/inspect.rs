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

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use colored::Colorize;

use crate::meta::Meta;
use crate::meta::number_text;

const LINE_WIDTH: usize = 72;

/// Structural pretty printing of metadata, e.g. `{ a: 1, b: 'x', list: [ 1, 2 ] }`.
///
/// Values nested deeper than `depth` are abbreviated as `[Object]` or `[Array]`; `None` means
/// unlimited. Objects whose one-line form exceeds 72 columns are broken over several lines.
pub fn inspect(meta: &Meta, depth: Option<usize>, colors: bool) -> String {
    let meta = meta.decycle();
    Inspector { depth, colors }.value(&meta, 0, 0)
}

struct Inspector {
    depth: Option<usize>,
    colors: bool,
}

impl Inspector {
    fn value(&self, meta: &Meta, level: usize, indent: usize) -> String {
        match meta {
            Meta::Undefined => self.paint("undefined", |s| s.bright_black().to_string()),
            Meta::Null => self.paint("null", |s| s.bold().to_string()),
            Meta::Bool(b) => self.paint(&b.to_string(), |s| s.yellow().to_string()),
            Meta::Number(n) => self.paint(&number_text(n), |s| s.yellow().to_string()),
            Meta::String(s) => self.paint(&quote(s), |s| s.green().to_string()),
            Meta::Date(ts) => self.paint(&ts.to_string(), |s| s.magenta().to_string()),
            Meta::Bytes(b) => format!("<Buffer {}>", STANDARD.encode(b)),
            Meta::Error(err) => match &err.stack {
                Some(stack) => stack.clone(),
                None => format!("[{err}]"),
            },
            Meta::Array(items) => {
                if items.is_empty() {
                    return "[]".to_string();
                }
                if self.too_deep(level) {
                    return self.paint("[Array]", |s| s.cyan().to_string());
                }
                let entries = items
                    .iter()
                    .map(|item| self.value(item, level + 1, indent + 2))
                    .collect::<Vec<_>>();
                self.group("[", entries, "]", indent)
            }
            Meta::Object(map) => {
                if map.is_empty() {
                    return "{}".to_string();
                }
                if self.too_deep(level) {
                    return self.paint("[Object]", |s| s.cyan().to_string());
                }
                let entries = map
                    .iter()
                    .map(|(k, v)| format!("{}: {}", key(k), self.value(v, level + 1, indent + 2)))
                    .collect::<Vec<_>>();
                self.group("{", entries, "}", indent)
            }
            Meta::Shared(shared) => self.value(&shared.read(), level, indent),
        }
    }

    fn too_deep(&self, level: usize) -> bool {
        self.depth.is_some_and(|depth| level > depth)
    }

    fn group(&self, open: &str, entries: Vec<String>, close: &str, indent: usize) -> String {
        let single = format!("{open} {} {close}", entries.join(", "));
        if single.len() + indent <= LINE_WIDTH && !single.contains('\n') {
            return single;
        }
        let pad = " ".repeat(indent + 2);
        let body = entries
            .iter()
            .map(|entry| format!("{pad}{entry}"))
            .collect::<Vec<_>>()
            .join(",\n");
        format!("{open}\n{body}\n{}{close}", " ".repeat(indent))
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> String) -> String {
        if self.colors {
            style(text)
        } else {
            text.to_string()
        }
    }
}

fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn key(k: &str) -> String {
    let mut chars = k.chars();
    let is_ident = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if is_ident { k.to_string() } else { quote(k) }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::meta::SharedMeta;

    #[test]
    fn test_inspect_one_line() {
        let meta = Meta::from(json!({"a": 1, "b": "x", "list": [1, 2], "nested": {"ok": true}}));
        insta::assert_snapshot!(
            inspect(&meta, None, false),
            @"{ a: 1, b: 'x', list: [ 1, 2 ], nested: { ok: true } }"
        );
    }

    #[test]
    fn test_inspect_depth_and_keys() {
        let meta = Meta::from(json!({"outer": {"inner": {"deep": 1}}, "with space": null}));
        insta::assert_snapshot!(
            inspect(&meta, Some(1), false),
            @"{ outer: { inner: [Object] }, 'with space': null }"
        );
    }

    #[test]
    fn test_inspect_breaks_long_objects() {
        let meta = Meta::from(json!({
            "first": "a fairly long string value",
            "second": "another fairly long string value",
        }));
        let text = inspect(&meta, None, false);
        assert_eq!(
            text,
            "{\n  first: 'a fairly long string value',\n  second: 'another fairly long string value'\n}"
        );
    }

    #[test]
    fn test_inspect_circular() {
        let m = SharedMeta::new(Meta::object());
        m.insert("self", m.clone());
        assert_eq!(inspect(&Meta::Shared(m), None, false), "{ self: '[Circular $]' }");
    }
}
