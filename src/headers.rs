//! Stored response headers
//!
//! Headers are persisted as a JSON object keyed by lower-case header
//! name. A header that appears once maps to a string; a repeated header
//! (for example `set-cookie`) maps to an array of strings.

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredHeaderValue {
    One(String),
    Many(Vec<String>),
}

/// Header mapping as written to and read from the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredHeaders(BTreeMap<String, StoredHeaderValue>);

impl StoredHeaders {
    /// Snapshot a header map. Values that are not visible ASCII are skipped.
    pub fn from_header_map(headers: &HeaderMap) -> Self {
        let mut stored = BTreeMap::new();

        for name in headers.keys() {
            let mut values: Vec<String> = headers
                .get_all(name)
                .iter()
                .filter_map(|v| v.to_str().ok().map(str::to_owned))
                .collect();

            let value = match values.len() {
                0 => continue,
                1 => StoredHeaderValue::One(values.remove(0)),
                _ => StoredHeaderValue::Many(values),
            };
            stored.insert(name.as_str().to_owned(), value);
        }

        Self(stored)
    }

    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_json(raw: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(raw)
    }

    /// Write every stored header onto `headers`, replacing existing values
    /// of the same name. Names or values that no longer parse are dropped.
    pub fn apply_to(&self, headers: &mut HeaderMap) {
        for (name, value) in &self.0 {
            let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
                tracing::debug!(header = %name, "skipping unparseable cached header name");
                continue;
            };

            headers.remove(&name);
            let values = match value {
                StoredHeaderValue::One(v) => std::slice::from_ref(v),
                StoredHeaderValue::Many(vs) => vs.as_slice(),
            };
            for v in values {
                if let Ok(header_value) = HeaderValue::from_str(v) {
                    headers.append(name.clone(), header_value);
                }
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&StoredHeaderValue> {
        self.0.get(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::{CONTENT_TYPE, SET_COOKIE};

    #[test]
    fn single_and_repeated_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));

        let stored = StoredHeaders::from_header_map(&headers);
        assert_eq!(stored.len(), 2);
        assert_eq!(
            stored.get("Content-Type"),
            Some(&StoredHeaderValue::One("application/json".to_string()))
        );

        let json: serde_json::Value = serde_json::from_slice(&stored.to_json().unwrap()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "content-type": "application/json",
                "set-cookie": ["a=1", "b=2"],
            })
        );
    }

    #[test]
    fn non_ascii_values_are_skipped() {
        let mut headers = HeaderMap::new();
        headers.insert("x-raw", HeaderValue::from_bytes(b"caf\xe9").unwrap());

        let stored = StoredHeaders::from_header_map(&headers);
        assert!(stored.is_empty());
    }

    #[test]
    fn apply_replaces_existing_values() {
        let stored = StoredHeaders::from_json(
            br#"{"content-type":"text/plain","set-cookie":["a=1","b=2"],"bad name":"x"}"#,
        )
        .unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
        stored.apply_to(&mut headers);

        assert_eq!(headers[CONTENT_TYPE], "text/plain");
        let cookies: Vec<_> = headers.get_all(SET_COOKIE).iter().collect();
        assert_eq!(cookies, vec!["a=1", "b=2"]);
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(StoredHeaders::from_json(b"{not json").is_err());
        assert!(StoredHeaders::from_json(b"[1,2]").is_err());
    }
}
