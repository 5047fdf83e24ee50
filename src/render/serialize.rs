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

use crate::meta::Meta;
use crate::meta::number_text;

/// Serialize metadata into the `key=value, key=value` text appended to rendered lines.
///
/// * `null`, `undefined` and `false` render as literal words;
/// * scalars render as `key=value`, or the bare value without a key;
/// * arrays under a key render as `key=[v1, v2]`, elements serialized without keys;
/// * dates render in RFC 3339 and bytes as base64;
/// * nested objects are flattened into their own `key=value` pairs;
/// * a top-level array is treated as an object keyed by index.
///
/// The value is decycled before serialization, so circular metadata is safe.
pub fn serialize(meta: &Meta, key: Option<&str>) -> String {
    serialize_acyclic(&meta.decycle(), key)
}

fn serialize_acyclic(meta: &Meta, key: Option<&str>) -> String {
    let scalar = match meta {
        Meta::Undefined => "undefined".to_string(),
        Meta::Null => "null".to_string(),
        Meta::Bool(b) => b.to_string(),
        Meta::Number(n) => number_text(n),
        Meta::String(s) => s.clone(),
        Meta::Bytes(b) => STANDARD.encode(b),
        Meta::Date(ts) => ts.to_string(),
        Meta::Error(err) => err.to_string(),
        Meta::Object(map) => {
            return join_pairs(map.iter().map(|(k, v)| (k.as_str(), v)));
        }
        Meta::Array(items) => {
            let keys = (0..items.len()).map(|i| i.to_string()).collect::<Vec<_>>();
            return join_pairs(keys.iter().map(String::as_str).zip(items.iter()));
        }
        Meta::Shared(shared) => return serialize_acyclic(&shared.read(), key),
    };

    match key {
        Some(key) => format!("{key}={scalar}"),
        None => scalar,
    }
}

fn join_pairs<'a>(pairs: impl Iterator<Item = (&'a str, &'a Meta)>) -> String {
    pairs
        .map(|(key, value)| match value {
            Meta::Array(items) => {
                let items = items
                    .iter()
                    .map(|item| serialize_acyclic(item, None))
                    .collect::<Vec<_>>();
                format!("{key}=[{}]", items.join(", "))
            }
            value => serialize_acyclic(value, Some(key)),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::meta::ErrorMeta;
    use crate::meta::SharedMeta;

    #[test]
    fn test_serialize_scalars() {
        assert_eq!(serialize(&Meta::Null, None), "null");
        assert_eq!(serialize(&Meta::Undefined, Some("k")), "k=undefined");
        assert_eq!(serialize(&Meta::from(false), Some("ok")), "ok=false");
        assert_eq!(serialize(&Meta::from(42), None), "42");
        assert_eq!(serialize(&Meta::from(1.0), Some("ratio")), "ratio=1");
        assert_eq!(serialize(&Meta::bytes(b"hi".to_vec()), Some("b")), "b=aGk=");
    }

    #[test]
    fn test_serialize_object() {
        let meta = Meta::from(json!({
            "foo": "bar",
            "label": "logu#*",
            "arr": [1, 2],
            "nested": {"a": null, "b": [true, "x"]},
        }));
        insta::assert_snapshot!(
            serialize(&meta, None),
            @"foo=bar, label=logu#*, arr=[1, 2], a=null, b=[true, x]"
        );
    }

    #[test]
    fn test_serialize_is_stable() {
        let mut meta = Meta::object();
        meta.insert("when", jiff::Timestamp::UNIX_EPOCH);
        meta.insert("err", ErrorMeta::new("boom"));
        let first = serialize(&meta, None);
        assert_eq!(first, serialize(&meta, None));
        assert_eq!(first, "when=1970-01-01T00:00:00Z, err=Error: boom");
    }

    #[test]
    fn test_serialize_circular() {
        let m = SharedMeta::new(Meta::object());
        m.insert("name", "loop");
        m.insert("self", m.clone());
        assert_eq!(
            serialize(&Meta::Shared(m), None),
            "name=loop, self=[Circular $]"
        );
    }

    #[test]
    fn test_serialize_top_level_array() {
        let meta = Meta::from(json!(["a", {"b": 1}]));
        assert_eq!(serialize(&meta, None), "0=a, b=1");
    }
}
