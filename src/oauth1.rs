//! OAuth 1.0a request signing and three-legged handshake state.
//!
//! Every OAuth1 request is signed individually: the canonical signature base
//! string is `METHOD&percent-encode(url)&percent-encode(parameter-string)`
//! where the parameter string holds every parameter (oauth_* plus request
//! parameters) sorted alphabetically, each key and value percent-encoded per
//! the strict unreserved-character rule. Any deviation in encoding or ordering
//! invalidates the signature at the provider.

// std
use std::collections::BTreeMap;
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use rand::{Rng, distr::Alphanumeric};
use sha1::Sha1;
// self
use crate::{_prelude::*, extract};

type HmacSha1 = Hmac<Sha1>;

const NONCE_LEN: usize = 16;
/// How long a temporary request-token secret stays redeemable before the
/// abandoned flow is pruned.
pub const REQUEST_TOKEN_TTL: Duration = Duration::minutes(15);

/// Generates a random nonce with the minimum entropy providers require.
pub fn nonce() -> String {
	rand::rng().sample_iter(Alphanumeric).take(NONCE_LEN).map(char::from).collect()
}

/// Consumer and (optional) user credentials a signature is derived from.
///
/// `user_token`/`user_secret` are absent during the request-token step of the
/// three-legged flow and present everywhere else.
#[derive(Clone, Copy, Debug)]
pub struct SigningCredentials<'a> {
	/// Consumer key (app id) registered with the provider.
	pub consumer_key: &'a str,
	/// Consumer secret matching the key.
	pub consumer_secret: &'a str,
	/// Token identifying the user context, when one exists yet.
	pub user_token: Option<&'a str>,
	/// Secret paired with `user_token`.
	pub user_secret: Option<&'a str>,
}

/// Signs a canonical base string with HMAC-SHA1 and base64-encodes the digest.
///
/// The signing key is `percent-encode(consumer_secret) & percent-encode(user_secret_or_empty)`.
pub fn signature(
	url: &str,
	method: &str,
	parameter_string: &str,
	consumer_secret: &str,
	user_secret: Option<&str>,
) -> String {
	let base = format!(
		"{method}&{}&{}",
		extract::percent_encode(url),
		extract::percent_encode(parameter_string)
	);
	let key = format!(
		"{}&{}",
		extract::percent_encode(consumer_secret),
		extract::percent_encode(user_secret.unwrap_or_default())
	);
	let mut mac =
		HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC-SHA1 accepts keys of any length.");

	mac.update(base.as_bytes());

	STANDARD.encode(mac.finalize().into_bytes())
}

/// Builds the full `Authorization: OAuth ...` header for one request.
///
/// `params` are the request parameters that will travel in the query or form
/// body; they participate in the signature but only `oauth_*` pairs appear in
/// the header, comma-separated, double-quoted, alphabetically ordered.
/// `callback` is set only when requesting a temporary token.
pub fn authorization_header(
	url: &str,
	method: &str,
	params: &[(String, String)],
	callback: Option<&str>,
	nonce: &str,
	timestamp: i64,
	credentials: &SigningCredentials<'_>,
) -> String {
	let mut auth = BTreeMap::new();

	for (key, value) in params {
		auth.insert(key.clone(), value.clone());
	}
	if let Some(callback) = callback {
		auth.insert("oauth_callback".into(), callback.into());
	}

	auth.insert("oauth_consumer_key".into(), credentials.consumer_key.into());
	auth.insert("oauth_nonce".into(), nonce.into());
	auth.insert("oauth_signature_method".into(), "HMAC-SHA1".into());
	auth.insert("oauth_timestamp".into(), timestamp.to_string());

	if let Some(token) = credentials.user_token {
		auth.insert("oauth_token".into(), token.into());
	}

	auth.insert("oauth_version".into(), "1.0".into());

	let parameter_string = auth
		.iter()
		.map(|(key, value)| {
			format!("{}={}", extract::percent_encode(key), extract::percent_encode(value))
		})
		.collect::<Vec<_>>()
		.join("&");
	let signed =
		signature(url, method, &parameter_string, credentials.consumer_secret, credentials.user_secret);

	auth.insert("oauth_signature".into(), signed);

	let header = auth
		.iter()
		.filter(|(key, _)| key.starts_with("oauth_"))
		.map(|(key, value)| {
			format!("{}=\"{}\"", extract::percent_encode(key), extract::percent_encode(value))
		})
		.collect::<Vec<_>>()
		.join(", ");

	format!("OAuth {header}")
}

struct PendingSecret {
	secret: String,
	stored_at: OffsetDateTime,
}

/// In-memory store for request-token secrets awaiting their callback.
///
/// The redirect leg of the three-legged flow carries only the temporary token,
/// so its secret must survive in-process between `authorization_url` and
/// `complete_authorization`. Entries expire after the configured TTL and are
/// pruned on insert, so abandoned flows cannot accumulate without bound.
#[derive(Debug)]
pub struct RequestTokenCache {
	ttl: Duration,
	entries: Mutex<HashMap<String, PendingSecret>>,
}
impl RequestTokenCache {
	/// Creates a cache whose entries expire after `ttl`.
	pub fn with_ttl(ttl: Duration) -> Self {
		Self { ttl, entries: Mutex::new(HashMap::new()) }
	}

	/// Stores the secret for a freshly issued request token.
	pub fn store(&self, token: impl Into<String>, secret: impl Into<String>) {
		let now = OffsetDateTime::now_utc();
		let mut guard = self.entries.lock();

		guard.retain(|_, pending| now - pending.stored_at < self.ttl);
		guard.insert(token.into(), PendingSecret { secret: secret.into(), stored_at: now });
	}

	/// Atomically removes and returns the secret for a returned token.
	///
	/// The check-and-remove happens under one lock, so concurrent callbacks for
	/// the same token redeem the secret at most once. Expired entries are gone.
	pub fn consume(&self, token: &str) -> Option<String> {
		let pending = self.entries.lock().remove(token)?;

		(OffsetDateTime::now_utc() - pending.stored_at < self.ttl).then_some(pending.secret)
	}
}
impl Default for RequestTokenCache {
	fn default() -> Self {
		Self::with_ttl(REQUEST_TOKEN_TTL)
	}
}
impl Debug for PendingSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PendingSecret").field("stored_at", &self.stored_at).finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const SHOW_URL: &str = "https://api.example.com/1.1/users/show.json";

	#[test]
	fn signature_is_deterministic_and_pinned() {
		assert_eq!(
			signature(SHOW_URL, "GET", "user_id=42", "cs", None),
			"z0/6eNvRsLYZOJkIZNB09xHjFFU="
		);
		// Any single changed parameter value yields a different digest.
		assert_eq!(
			signature(SHOW_URL, "GET", "user_id=43", "cs", None),
			"Gfz35bQgOb/jpFjTq4JldkbSMjs="
		);
	}

	#[test]
	fn header_orders_and_encodes_oauth_parameters() {
		let credentials = SigningCredentials {
			consumer_key: "ck",
			consumer_secret: "cs",
			user_token: Some("ut"),
			user_secret: Some("us"),
		};
		let params = vec![("user_id".to_owned(), "42".to_owned())];
		let header = authorization_header(
			SHOW_URL,
			"GET",
			&params,
			None,
			"0123456789abcdef",
			1_234_567_890,
			&credentials,
		);

		assert_eq!(
			header,
			"OAuth oauth_consumer_key=\"ck\", oauth_nonce=\"0123456789abcdef\", \
			 oauth_signature=\"wV6FyuQguX7Sqpc29DpZCkPnlvs%3D\", \
			 oauth_signature_method=\"HMAC-SHA1\", oauth_timestamp=\"1234567890\", \
			 oauth_token=\"ut\", oauth_version=\"1.0\""
		);
		assert!(!header.contains("user_id"), "Request parameters stay out of the header.");
	}

	#[test]
	fn callback_participates_in_the_signature() {
		let credentials = SigningCredentials {
			consumer_key: "ck",
			consumer_secret: "cs",
			user_token: None,
			user_secret: None,
		};
		let with_callback = authorization_header(
			SHOW_URL,
			"POST",
			&[],
			Some("https://app.example/cb?domain=twitter"),
			"0123456789abcdef",
			1_234_567_890,
			&credentials,
		);
		let without_callback = authorization_header(
			SHOW_URL,
			"POST",
			&[],
			None,
			"0123456789abcdef",
			1_234_567_890,
			&credentials,
		);

		assert!(with_callback.contains("oauth_callback=\"https%3A%2F%2Fapp.example%2Fcb"));
		assert_ne!(with_callback, without_callback);
		assert!(!without_callback.contains("oauth_token="), "No user token during request-token.");
	}

	#[test]
	fn nonce_carries_enough_entropy() {
		let one = nonce();
		let two = nonce();

		assert_eq!(one.len(), 16);
		assert!(one.chars().all(|c| c.is_ascii_alphanumeric()));
		assert_ne!(one, two);
	}

	#[test]
	fn request_token_secrets_are_consumed_at_most_once() {
		let cache = RequestTokenCache::default();

		cache.store("req-tok", "req-sec");

		assert_eq!(cache.consume("req-tok"), Some("req-sec".into()));
		assert_eq!(cache.consume("req-tok"), None);
		assert_eq!(cache.consume("never-stored"), None);
	}

	#[test]
	fn expired_request_token_secrets_are_gone() {
		let cache = RequestTokenCache::with_ttl(Duration::ZERO);

		cache.store("req-tok", "req-sec");

		assert_eq!(cache.consume("req-tok"), None);
	}
}
