//! Semi-structured value extraction and strict percent-encoding helpers.
//!
//! Provider responses are never deserialized into schemas; the gateway pulls
//! named fields out of opaque JSON or URL-encoded text and treats everything
//! else as noise. The percent-encoding functions implement the strict OAuth
//! rule (RFC 3986 unreserved characters only) and also back the account token
//! string, whose field delimiter must never appear inside a field value.

// crates.io
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde_json::Value;
// self
use crate::_prelude::*;

/// Characters left bare by the strict OAuth encoding rule: letters, digits, `-._~`.
const UNRESERVED: &AsciiSet =
	&NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Percent-encodes every character outside the RFC 3986 unreserved set.
pub fn percent_encode(value: &str) -> String {
	utf8_percent_encode(value, UNRESERVED).to_string()
}

/// Reverses [`percent_encode`], replacing invalid UTF-8 sequences losslessly.
pub fn percent_decode(value: &str) -> String {
	percent_decode_str(value).decode_utf8_lossy().into_owned()
}

/// Finds the value of a named parameter in a URL or a bare URL-encoded string.
///
/// Accepts both full URLs (`https://x/cb?code=1`) and raw response bodies in
/// `key=value&key=value` form, which is how OAuth1 endpoints answer.
pub fn find_url_value(text: &str, key: &str) -> Option<String> {
	let query = match Url::parse(text) {
		Ok(url) => url.query()?.to_owned(),
		Err(_) => text.to_owned(),
	};

	url::form_urlencoded::parse(query.as_bytes())
		.find(|(name, _)| name == key)
		.map(|(_, value)| value.into_owned())
}

/// Finds the first scalar value stored under `key` anywhere in a JSON body.
///
/// Numbers and booleans are coerced to their text form; objects and arrays are
/// descended depth-first so nested identity payloads still resolve.
pub fn find_json_value(body: &str, key: &str) -> Option<String> {
	let root = serde_json::from_str::<Value>(body).ok()?;

	find_in(&root, key)
}

fn find_in(value: &Value, key: &str) -> Option<String> {
	match value {
		Value::Object(map) => {
			if let Some(direct) = map.get(key).and_then(scalar) {
				return Some(direct);
			}

			map.values().find_map(|nested| find_in(nested, key))
		},
		Value::Array(items) => items.iter().find_map(|nested| find_in(nested, key)),
		_ => None,
	}
}

fn scalar(value: &Value) -> Option<String> {
	match value {
		Value::String(text) => Some(text.clone()),
		Value::Number(number) => Some(number.to_string()),
		Value::Bool(flag) => Some(flag.to_string()),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn strict_encoding_keeps_unreserved_and_escapes_the_rest() {
		assert_eq!(percent_encode("Az09-._~"), "Az09-._~");
		assert_eq!(percent_encode("a b+c:/d"), "a%20b%2Bc%3A%2Fd");
		assert_eq!(percent_decode("a%20b%2Bc%3A%2Fd"), "a b+c:/d");
	}

	#[test]
	fn url_values_resolve_from_full_urls_and_bare_bodies() {
		assert_eq!(
			find_url_value("https://app.example/cb?domain=slack&code=c1", "code"),
			Some("c1".into())
		);
		assert_eq!(
			find_url_value("oauth_token=tok&oauth_token_secret=sec", "oauth_token_secret"),
			Some("sec".into())
		);
		assert_eq!(find_url_value("https://app.example/cb", "code"), None);
		assert_eq!(find_url_value("a=1&b=2", "c"), None);
	}

	#[test]
	fn json_values_resolve_nested_fields_and_coerce_numbers() {
		let body = r#"{"user":{"profile":{"email":"jane@example.com"},"id":42},"ok":true}"#;

		assert_eq!(find_json_value(body, "email"), Some("jane@example.com".into()));
		assert_eq!(find_json_value(body, "id"), Some("42".into()));
		assert_eq!(find_json_value(body, "ok"), Some("true".into()));
		assert_eq!(find_json_value(body, "missing"), None);
		assert_eq!(find_json_value("not json", "email"), None);
	}
}
