//! Record wire encoding for the guest boundary.
//!
//! A record travels to the guest as a JSON object with short field names:
//! `k` (key), `v` (value), `h` (headers). Byte fields are standard base64
//! strings and a logically empty field is omitted outright, so the receiver
//! can tell absent from present-but-empty. Header keys serialize in sorted
//! order.
//!
//! Header text uses plain JSON string escaping: `&`, `<`, and `>` stay raw
//! rather than taking the `\u00XX` forms HTML-safe encoders substitute.
//! Any JSON decoder sees identical header strings either way, and the
//! base64 alphabet contains none of those characters.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Serialize, Serializer};

use crate::error::{Result, SinkError};

/// One unit of work handed to a sink.
///
/// Borrowed for the duration of a single produce call and never retained
/// afterwards.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub key: &'a [u8],
    pub value: &'a [u8],
    pub headers: &'a BTreeMap<String, String>,
}

struct Base64Bytes<'a>(&'a [u8]);

impl Serialize for Base64Bytes<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(self.0))
    }
}

#[derive(Serialize)]
struct Wire<'a> {
    #[serde(rename = "k", skip_serializing_if = "Option::is_none")]
    key: Option<Base64Bytes<'a>>,
    #[serde(rename = "v", skip_serializing_if = "Option::is_none")]
    value: Option<Base64Bytes<'a>>,
    #[serde(rename = "h", skip_serializing_if = "Option::is_none")]
    headers: Option<&'a BTreeMap<String, String>>,
}

impl Record<'_> {
    /// Serialize this record for the guest's input channel.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let wire = Wire {
            key: (!self.key.is_empty()).then_some(Base64Bytes(self.key)),
            value: (!self.value.is_empty()).then_some(Base64Bytes(self.value)),
            headers: (!self.headers.is_empty()).then_some(self.headers),
        };
        serde_json::to_vec(&wire)
            .map_err(|e| SinkError::protocol(format!("failed to encode record: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(key: &[u8], value: &[u8], headers: &BTreeMap<String, String>) -> String {
        let bytes = Record {
            key,
            value,
            headers,
        }
        .encode()
        .unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_empty_fields_omitted() {
        assert_eq!(encode(b"", b"", &BTreeMap::new()), "{}");
    }

    #[test]
    fn test_bytes_encode_as_base64() {
        assert_eq!(
            encode(b"k", b"hello", &BTreeMap::new()),
            r#"{"k":"aw==","v":"aGVsbG8="}"#
        );
    }

    #[test]
    fn test_value_only() {
        assert_eq!(encode(b"", b"hi", &BTreeMap::new()), r#"{"v":"aGk="}"#);
    }

    #[test]
    fn test_key_only() {
        assert_eq!(encode(&[1, 2, 3], b"", &BTreeMap::new()), r#"{"k":"AQID"}"#);
    }

    #[test]
    fn test_headers_sorted_and_last() {
        let mut headers = BTreeMap::new();
        headers.insert("b".to_string(), "2".to_string());
        headers.insert("a".to_string(), "1".to_string());
        assert_eq!(
            encode(b"", b"hi", &headers),
            r#"{"v":"aGk=","h":{"a":"1","b":"2"}}"#
        );
    }

    #[test]
    fn test_header_text_keeps_html_characters_raw() {
        let mut headers = BTreeMap::new();
        headers.insert("link".to_string(), "<a&b>".to_string());
        assert_eq!(encode(b"", b"", &headers), r#"{"h":{"link":"<a&b>"}}"#);
    }
}
