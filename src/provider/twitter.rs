//! Twitter binding: three-legged OAuth1 handshake, per-request HMAC-SHA1
//! signing, and rate-limit window tracking.
//!
//! There is no reusable session credential: every single API request is signed
//! individually. The "access token" stored on the account is a composite of
//! user id, access token, and access token secret joined by `_`, because all
//! three are needed separately when computing the authorization header.

// self
use crate::{
	_prelude::*,
	account::Account,
	error::ConfigError,
	extract,
	http::{HttpMethod, HttpTransport, TransportRequest, TransportResponse},
	oauth1::{self, SigningCredentials},
	provider::{self, Binding, Provider},
	ratelimit::DEFAULT_RATE_LIMIT_WINDOW,
};

const COMPOSITE_SEPARATOR: char = '_';
const COMPOSITE_PARTS: usize = 3;
const MAX_TIMELINE_COUNT: u32 = 3_200;

/// Filters for [`Binding::tweets`](crate::provider::Binding::tweets).
#[derive(Clone, Debug)]
pub struct TweetQuery {
	/// User to read the timeline of; defaults to the bound account.
	pub user_id: Option<String>,
	/// Maximum number of tweets to return, clamped to the provider ceiling.
	pub count: u32,
	/// Trim user detail objects from each tweet.
	pub exclude_user_details: bool,
	/// Skip tweets that are replies.
	pub exclude_replies: bool,
	/// Skip tweets that are retweets.
	pub exclude_retweets: bool,
}
impl TweetQuery {
	/// Targets another user's timeline.
	pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
		self.user_id = Some(user_id.into());

		self
	}

	/// Caps the number of returned tweets; zero or out-of-range values resolve
	/// to the provider ceiling.
	pub fn with_count(mut self, count: u32) -> Self {
		self.count = clamp_count(count);

		self
	}

	/// Toggles trimming of per-tweet user details.
	pub fn exclude_user_details(mut self, exclude: bool) -> Self {
		self.exclude_user_details = exclude;

		self
	}

	/// Toggles skipping of replies.
	pub fn exclude_replies(mut self, exclude: bool) -> Self {
		self.exclude_replies = exclude;

		self
	}

	/// Toggles skipping of retweets.
	pub fn exclude_retweets(mut self, exclude: bool) -> Self {
		self.exclude_retweets = exclude;

		self
	}
}
impl Default for TweetQuery {
	fn default() -> Self {
		Self {
			user_id: None,
			count: MAX_TIMELINE_COUNT,
			exclude_user_details: false,
			exclude_replies: false,
			exclude_retweets: false,
		}
	}
}

fn clamp_count(count: u32) -> u32 {
	if count == 0 || count > MAX_TIMELINE_COUNT { MAX_TIMELINE_COUNT } else { count }
}

fn oauth_url<T>(binding: &Binding<T>, service: &str) -> Result<Url>
where
	T: ?Sized + HttpTransport,
{
	binding
		.profile()
		.oauth_endpoint
		.join(service)
		.map_err(|source| ConfigError::InvalidUrl { source }.into())
}

fn app_credentials<T>(binding: &Binding<T>) -> SigningCredentials<'_>
where
	T: ?Sized + HttpTransport,
{
	SigningCredentials {
		consumer_key: &binding.profile().app_id,
		consumer_secret: &binding.profile().app_secret,
		user_token: None,
		user_secret: None,
	}
}

pub(crate) async fn authorization_url<T>(
	binding: &Binding<T>,
	redirect_url: &Url,
	state: &str,
) -> Result<Url>
where
	T: ?Sized + HttpTransport,
{
	// The consent link requires a single-use request token; no user token or
	// secret exists at this point.
	let callback = {
		let mut url = provider::redirect_with_domain(redirect_url, Provider::Twitter);

		url.query_pairs_mut().append_pair("state", state);

		url
	};
	let endpoint = oauth_url(binding, "request_token")?;
	let header = oauth1::authorization_header(
		endpoint.as_str(),
		HttpMethod::Post.as_str(),
		&[],
		Some(callback.as_str()),
		&oauth1::nonce(),
		OffsetDateTime::now_utc().unix_timestamp(),
		&app_credentials(binding),
	);
	let request =
		TransportRequest::new(endpoint, HttpMethod::Post).with_header("Authorization", header);
	let response = binding.http(request).await.map_err(|_| Error::AuthorizationFailed)?;

	if extract::find_url_value(&response.body, "oauth_callback_confirmed").as_deref()
		!= Some("true")
	{
		return Err(Error::AuthorizationFailed);
	}

	let token = extract::find_url_value(&response.body, "oauth_token")
		.ok_or(Error::AuthorizationFailed)?;
	let secret = extract::find_url_value(&response.body, "oauth_token_secret")
		.ok_or(Error::AuthorizationFailed)?;

	// The callback leg only carries the token, so its secret must survive
	// in-process until the user returns.
	binding.request_tokens().store(&token, secret);

	let mut url = oauth_url(binding, "authenticate")?;

	url.query_pairs_mut().append_pair("oauth_token", &token);

	Ok(url)
}

pub(crate) async fn complete_authorization<T>(
	binding: &Binding<T>,
	returned_url: &Url,
) -> Result<Account>
where
	T: ?Sized + HttpTransport,
{
	let verifier = extract::find_url_value(returned_url.as_str(), "oauth_verifier")
		.ok_or(Error::AuthorizationFailed)?;
	let token = extract::find_url_value(returned_url.as_str(), "oauth_token")
		.ok_or(Error::AuthorizationFailed)?;
	// Consumed at most once; a replayed callback fails here.
	let secret = binding.request_tokens().consume(&token).ok_or(Error::AuthorizationFailed)?;
	let profile = binding.profile();
	let endpoint = oauth_url(binding, "access_token")?;
	let params = vec![("oauth_verifier".to_owned(), verifier)];
	let header = oauth1::authorization_header(
		endpoint.as_str(),
		HttpMethod::Post.as_str(),
		&params,
		None,
		&oauth1::nonce(),
		OffsetDateTime::now_utc().unix_timestamp(),
		&SigningCredentials {
			consumer_key: &profile.app_id,
			consumer_secret: &profile.app_secret,
			user_token: Some(&token),
			user_secret: Some(&secret),
		},
	);
	// The verifier already travels inside the header; repeating it in the body
	// would double-count it in the provider's signature check.
	let request =
		TransportRequest::new(endpoint, HttpMethod::Post).with_header("Authorization", header);
	let response = binding.http(request).await.map_err(|_| Error::AuthorizationFailed)?;
	let user_token = extract::find_url_value(&response.body, "oauth_token")
		.ok_or(Error::AuthorizationFailed)?;
	let user_secret = extract::find_url_value(&response.body, "oauth_token_secret")
		.ok_or(Error::AuthorizationFailed)?;
	let user_id = extract::find_url_value(&response.body, "user_id")
		.ok_or(Error::AuthorizationFailed)?;
	let params = vec![("user_id".to_owned(), user_id.clone())];
	let show = binding.api_url("users/show.json")?;
	let header = oauth1::authorization_header(
		show.as_str(),
		HttpMethod::Get.as_str(),
		&params,
		None,
		&oauth1::nonce(),
		OffsetDateTime::now_utc().unix_timestamp(),
		&SigningCredentials {
			consumer_key: &profile.app_id,
			consumer_secret: &profile.app_secret,
			user_token: Some(&user_token),
			user_secret: Some(&user_secret),
		},
	);
	let lookup = TransportRequest::new(show, HttpMethod::Get)
		.with_params(params)
		.with_header("Authorization", header);
	let identity = binding.http(lookup).await.map_err(|_| Error::AuthorizationFailed)?;

	if !identity.is_success() {
		return Err(Error::AuthorizationFailed);
	}

	let id = extract::find_json_value(&identity.body, "id_str").unwrap_or_else(|| user_id.clone());
	let name = extract::find_json_value(&identity.body, "name").unwrap_or_default();
	let composite = format!(
		"{user_id}{COMPOSITE_SEPARATOR}{user_token}{COMPOSITE_SEPARATOR}{user_secret}"
	);

	Ok(Account::new(Provider::Twitter.domain(), id, composite, "", name)?)
}

pub(crate) async fn dispatch<T>(
	binding: &Binding<T>,
	account: &Account,
	service: &str,
	method: HttpMethod,
	body: Option<&str>,
	params: &[(String, String)],
) -> Result<TransportResponse>
where
	T: ?Sized + HttpTransport,
{
	// Pre-emptive backpressure: refuse locally while the window is open.
	if binding.rate_limits().is_limited(&account.token) {
		return Ok(TransportResponse::new(429, ""));
	}

	let parts = account.token.splitn(COMPOSITE_PARTS, COMPOSITE_SEPARATOR).collect::<Vec<_>>();
	let &[_, user_token, user_secret] = parts.as_slice() else {
		return Err(ConfigError::MalformedCompositeToken {
			provider: Provider::Twitter.domain(),
			expected: COMPOSITE_PARTS,
		}
		.into());
	};
	let url = binding.api_url(service)?;
	let header = oauth1::authorization_header(
		url.as_str(),
		method.as_str(),
		params,
		None,
		&oauth1::nonce(),
		OffsetDateTime::now_utc().unix_timestamp(),
		&SigningCredentials {
			consumer_key: &binding.profile().app_id,
			consumer_secret: &binding.profile().app_secret,
			user_token: Some(user_token),
			user_secret: Some(user_secret),
		},
	);
	let mut request = TransportRequest::new(url, method)
		.with_params(params.to_vec())
		.with_header("Authorization", header);

	if let Some(body) = body {
		request = request.with_body(body);
	}

	let response = binding.http(request).await?;
	let exhausted =
		response.status == 429 || response.header("x-rate-limit-remaining") == Some("0");

	if exhausted {
		let reset = response
			.header("x-rate-limit-reset")
			.and_then(|raw| raw.trim().parse::<i64>().ok())
			.and_then(|seconds| OffsetDateTime::from_unix_timestamp(seconds).ok());

		match reset {
			Some(clears_at) => {
				binding.rate_limits().restrict_until(&account.token, clears_at);
			},
			None => {
				binding.rate_limits().restrict_for(&account.token, DEFAULT_RATE_LIMIT_WINDOW);
			},
		}
	}

	Ok(response)
}

pub(crate) async fn user_info<T>(
	binding: &Binding<T>,
	account: &Account,
	user_id: Option<&str>,
) -> Result<Option<String>>
where
	T: ?Sized + HttpTransport,
{
	let target = user_id.unwrap_or(&account.id);
	let params = vec![("user_id".to_owned(), target.to_owned())];

	binding.execute("users/show.json", HttpMethod::Get, None, &params).await
}

pub(crate) async fn followers<T>(
	binding: &Binding<T>,
	account: &Account,
	user_id: Option<&str>,
) -> Result<Option<String>>
where
	T: ?Sized + HttpTransport,
{
	let target = user_id.unwrap_or(&account.id);
	let params = vec![
		("user_id".to_owned(), target.to_owned()),
		("stringify_ids".to_owned(), "true".to_owned()),
	];

	binding.execute("followers/ids.json", HttpMethod::Get, None, &params).await
}

pub(crate) async fn tweets<T>(
	binding: &Binding<T>,
	account: &Account,
	query: &TweetQuery,
) -> Result<Option<String>>
where
	T: ?Sized + HttpTransport,
{
	let target = query.user_id.as_deref().unwrap_or(&account.id);
	let params = vec![
		("user_id".to_owned(), target.to_owned()),
		("exclude_replies".to_owned(), query.exclude_replies.to_string()),
		("trim_user".to_owned(), query.exclude_user_details.to_string()),
		("include_rts".to_owned(), (!query.exclude_retweets).to_string()),
		// Queries are plain data; the ceiling holds however they were built.
		("count".to_owned(), clamp_count(query.count).to_string()),
	];

	binding.execute("statuses/user_timeline.json", HttpMethod::Get, None, &params).await
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::stub_gateway;

	#[test]
	fn tweet_query_clamps_count_to_the_provider_ceiling() {
		assert_eq!(TweetQuery::default().count, MAX_TIMELINE_COUNT);
		assert_eq!(TweetQuery::default().with_count(0).count, MAX_TIMELINE_COUNT);
		assert_eq!(TweetQuery::default().with_count(5_000).count, MAX_TIMELINE_COUNT);
		assert_eq!(TweetQuery::default().with_count(200).count, 200);
	}

	#[tokio::test]
	async fn timeline_dispatch_clamps_literal_query_counts() {
		let (gateway, transport) = stub_gateway();
		let account = Account::new("twitter", "7", "7_user-tok_user-sec", "", "")
			.expect("Account fixture should be valid.");
		let binding = gateway
			.binding_for_account(&account.serialize())
			.expect("Stored account should reconstruct.");

		transport.push_response(TransportResponse::new(200, "[]"));

		// Bypassing the builder must not bypass the ceiling.
		let query = TweetQuery { count: 5_000, ..Default::default() };

		binding.tweets(&query).await.expect("Timeline dispatch should succeed.");

		let recorded = transport.requests();

		assert_eq!(recorded.len(), 1);
		assert!(
			recorded[0]
				.params
				.contains(&("count".to_owned(), MAX_TIMELINE_COUNT.to_string()))
		);
	}
}
