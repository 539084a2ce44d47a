//! Provider bindings: the closed set of supported services and their
//! authorization, signing, and dispatch policies.
//!
//! Each [`Binding`] owns an immutable [`ProviderProfile`] set at construction;
//! nothing is shared mutably between bindings except the injected rate-limit
//! registry and request-token cache, both of which are synchronized stores.

pub mod dropbox;
pub mod facebook;
pub mod slack;
pub mod twitter;

pub use twitter::TweetQuery;

// self
use crate::{
	_prelude::*,
	account::Account,
	error::ConfigError,
	http::{HttpMethod, HttpTransport, TransportRequest, TransportResponse},
	oauth1::RequestTokenCache,
	obs::{FlowKind, FlowSpan},
	ratelimit::RateLimitRegistry,
};

/// Closed set of supported providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
	/// Dropbox: OAuth2 authorization code, Bearer-header dispatch.
	Dropbox,
	/// Facebook: OAuth2 authorization code, `access_token` query dispatch.
	Facebook,
	/// Slack: OAuth2 authorization code, `token` query dispatch.
	Slack,
	/// Twitter: three-legged OAuth1, per-request HMAC-SHA1 signing.
	Twitter,
}
impl Provider {
	/// Every supported provider, in registry order.
	pub const ALL: [Provider; 4] =
		[Provider::Dropbox, Provider::Facebook, Provider::Slack, Provider::Twitter];

	/// Resolves a case-insensitive domain string, with or without a trailing
	/// `.com`, to a provider.
	pub fn from_domain(domain: &str) -> Option<Self> {
		let lowered = domain.trim().to_ascii_lowercase();
		let key = lowered.strip_suffix(".com").unwrap_or(&lowered);

		match key {
			"dropbox" => Some(Provider::Dropbox),
			"facebook" => Some(Provider::Facebook),
			"slack" => Some(Provider::Slack),
			"twitter" => Some(Provider::Twitter),
			_ => None,
		}
	}

	/// Canonical domain key used in account records and redirect markers.
	pub fn domain(self) -> &'static str {
		match self {
			Provider::Dropbox => "dropbox",
			Provider::Facebook => "facebook",
			Provider::Slack => "slack",
			Provider::Twitter => "twitter",
		}
	}

	fn default_authorize_endpoint(self) -> &'static str {
		match self {
			Provider::Dropbox => "https://www.dropbox.com/oauth2/authorize",
			Provider::Facebook => "https://www.facebook.com/v2.8/dialog/oauth",
			Provider::Slack => "https://slack.com/oauth/authorize",
			Provider::Twitter => "https://api.twitter.com/oauth/authenticate",
		}
	}

	fn default_api_endpoint(self) -> &'static str {
		match self {
			Provider::Dropbox => "https://api.dropboxapi.com/",
			Provider::Facebook => "https://graph.facebook.com/",
			Provider::Slack => "https://slack.com/api/",
			Provider::Twitter => "https://api.twitter.com/1.1/",
		}
	}

	fn default_oauth_endpoint(self) -> &'static str {
		match self {
			Provider::Twitter => "https://api.twitter.com/oauth/",
			// Only the OAuth1 provider has a dedicated handshake host.
			other => other.default_api_endpoint(),
		}
	}
}
impl Display for Provider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.domain())
	}
}

/// Immutable per-provider configuration owned by each binding.
///
/// Endpoints default to the live provider hosts and can be overridden, which
/// is how the test suite points bindings at a mock server.
#[derive(Clone, Debug)]
pub struct ProviderProfile {
	/// Which provider this profile configures.
	pub provider: Provider,
	/// App id (client id / consumer key) issued by the provider console.
	pub app_id: String,
	/// App secret matching the id.
	pub app_secret: String,
	/// Endpoint the user is sent to for consent.
	pub authorize_endpoint: Url,
	/// Base URL every API service path is joined onto.
	pub api_endpoint: Url,
	/// Base URL of the OAuth1 handshake endpoints; only Twitter reads it.
	pub oauth_endpoint: Url,
}
impl ProviderProfile {
	/// Creates a profile with the provider's default endpoints.
	pub fn new(provider: Provider, app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
		let parse = |raw: &str| Url::parse(raw).expect("Built-in endpoint URLs are valid.");

		Self {
			provider,
			app_id: app_id.into(),
			app_secret: app_secret.into(),
			authorize_endpoint: parse(provider.default_authorize_endpoint()),
			api_endpoint: parse(provider.default_api_endpoint()),
			oauth_endpoint: parse(provider.default_oauth_endpoint()),
		}
	}

	/// Overrides the consent endpoint.
	pub fn with_authorize_endpoint(mut self, url: Url) -> Self {
		self.authorize_endpoint = url;

		self
	}

	/// Overrides the API base URL.
	pub fn with_api_endpoint(mut self, url: Url) -> Self {
		self.api_endpoint = url;

		self
	}

	/// Overrides the OAuth1 handshake base URL.
	pub fn with_oauth_endpoint(mut self, url: Url) -> Self {
		self.oauth_endpoint = url;

		self
	}
}

/// Execution context binding one provider profile to at most one account.
///
/// A binding starts unauthenticated; completing a handshake (or reconstructing
/// a stored account through the gateway) binds the account, after which every
/// call is signed and dispatched under that identity.
pub struct Binding<T>
where
	T: ?Sized + HttpTransport,
{
	profile: ProviderProfile,
	transport: Arc<T>,
	rate_limits: Arc<RateLimitRegistry>,
	request_tokens: Arc<RequestTokenCache>,
	account: Option<Account>,
}
impl<T> Binding<T>
where
	T: ?Sized + HttpTransport,
{
	pub(crate) fn new(
		profile: ProviderProfile,
		transport: Arc<T>,
		rate_limits: Arc<RateLimitRegistry>,
		request_tokens: Arc<RequestTokenCache>,
	) -> Self {
		Self { profile, transport, rate_limits, request_tokens, account: None }
	}

	/// Which provider this binding talks to.
	pub fn provider(&self) -> Provider {
		self.profile.provider
	}

	/// The immutable configuration the binding was constructed with.
	pub fn profile(&self) -> &ProviderProfile {
		&self.profile
	}

	/// The bound account, present once authorization has completed.
	pub fn account(&self) -> Option<&Account> {
		self.account.as_ref()
	}

	pub(crate) fn bind_account(&mut self, account: Account) {
		self.account = Some(account);
	}

	pub(crate) fn rate_limits(&self) -> &RateLimitRegistry {
		&self.rate_limits
	}

	pub(crate) fn request_tokens(&self) -> &RequestTokenCache {
		&self.request_tokens
	}

	pub(crate) fn api_url(&self, service: &str) -> Result<Url> {
		self.profile
			.api_endpoint
			.join(service)
			.map_err(|source| ConfigError::InvalidUrl { source }.into())
	}

	pub(crate) async fn http(
		&self,
		request: TransportRequest,
	) -> Result<TransportResponse, crate::error::TransportError> {
		self.transport.call(request).await
	}

	/// Builds the provider-specific login URL the user should be sent to.
	///
	/// OAuth2 providers answer immediately; the OAuth1 provider first performs
	/// a signed request-token call and caches the returned token secret for the
	/// callback leg.
	pub async fn authorization_url(&self, redirect_url: &Url, state: &str) -> Result<Url> {
		let span = FlowSpan::new(FlowKind::Authorize, self.profile.provider.domain());

		span.instrument(async {
			match self.profile.provider {
				Provider::Dropbox => dropbox::authorization_url(self, redirect_url, state),
				Provider::Facebook => facebook::authorization_url(self, redirect_url, state),
				Provider::Slack => slack::authorization_url(self, redirect_url, state),
				Provider::Twitter => twitter::authorization_url(self, redirect_url, state).await,
			}
		})
		.await
	}

	/// Completes the handshake from the provider's callback URL.
	///
	/// On success the resulting account is bound to this binding and returned;
	/// any failed step yields [`Error::AuthorizationFailed`] with no partial
	/// account.
	pub async fn complete_authorization(&mut self, returned_url: &Url) -> Result<Account> {
		let span = FlowSpan::new(FlowKind::Finalize, self.profile.provider.domain());
		let account = span
			.instrument(async {
				match self.profile.provider {
					Provider::Dropbox => dropbox::complete_authorization(self, returned_url).await,
					Provider::Facebook =>
						facebook::complete_authorization(self, returned_url).await,
					Provider::Slack => slack::complete_authorization(self, returned_url).await,
					Provider::Twitter => twitter::complete_authorization(self, returned_url).await,
				}
			})
			.await?;

		self.account = Some(account.clone());

		Ok(account)
	}

	/// Issues one authenticated API call through the provider's request layer.
	///
	/// Returns the raw status and body; rate-limit refusals surface as a 429
	/// response rather than an error so callers check status, not exceptions.
	pub async fn dispatch(
		&self,
		service: &str,
		method: HttpMethod,
		body: Option<&str>,
		params: &[(String, String)],
	) -> Result<TransportResponse> {
		let account = self.account.as_ref().ok_or(ConfigError::MissingAccount)?;
		let span = FlowSpan::new(FlowKind::Dispatch, self.profile.provider.domain());

		span.instrument(async {
			match self.profile.provider {
				Provider::Dropbox =>
					dropbox::dispatch(self, account, service, method, body, params).await,
				Provider::Facebook =>
					facebook::dispatch(self, account, service, method, body, params).await,
				Provider::Slack =>
					slack::dispatch(self, account, service, method, body, params).await,
				Provider::Twitter =>
					twitter::dispatch(self, account, service, method, body, params).await,
			}
		})
		.await
	}

	/// Uniform success/failure interpretation over [`Binding::dispatch`]: any
	/// 2xx status yields the response body, anything else yields `None`.
	pub async fn execute(
		&self,
		service: &str,
		method: HttpMethod,
		body: Option<&str>,
		params: &[(String, String)],
	) -> Result<Option<String>> {
		let response = self.dispatch(service, method, body, params).await?;
		let succeeded = response.is_success();

		Ok(succeeded.then_some(response.body))
	}

	/// Fetches profile information for the bound user, or for `user_id`.
	pub async fn user_info(&self, user_id: Option<&str>) -> Result<Option<String>> {
		let account = self.account.as_ref().ok_or(ConfigError::MissingAccount)?;

		match self.profile.provider {
			Provider::Dropbox => dropbox::user_info(self, account, user_id).await,
			Provider::Facebook => facebook::user_info(self, account, user_id).await,
			Provider::Slack => slack::user_info(self, account, user_id).await,
			Provider::Twitter => twitter::user_info(self, account, user_id).await,
		}
	}

	/// Fetches follower ids for the bound user, or for `user_id` (Twitter only).
	pub async fn followers(&self, user_id: Option<&str>) -> Result<Option<String>> {
		self.require_twitter("followers")?;

		let account = self.account.as_ref().ok_or(ConfigError::MissingAccount)?;

		twitter::followers(self, account, user_id).await
	}

	/// Fetches a user timeline (Twitter only).
	pub async fn tweets(&self, query: &TweetQuery) -> Result<Option<String>> {
		self.require_twitter("tweets")?;

		let account = self.account.as_ref().ok_or(ConfigError::MissingAccount)?;

		twitter::tweets(self, account, query).await
	}

	fn require_twitter(&self, operation: &'static str) -> Result<()> {
		if self.profile.provider == Provider::Twitter {
			Ok(())
		} else {
			Err(ConfigError::UnsupportedOperation {
				provider: self.profile.provider.domain(),
				operation,
			}
			.into())
		}
	}
}
impl<T> Debug for Binding<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Binding")
			.field("provider", &self.profile.provider)
			.field("authenticated", &self.account.is_some())
			.finish()
	}
}

/// Clones the redirect URL with the `domain` marker appended, so the callback
/// can be routed back to the right binding.
pub(crate) fn redirect_with_domain(redirect_url: &Url, provider: Provider) -> Url {
	let mut url = redirect_url.clone();

	url.query_pairs_mut().append_pair("domain", provider.domain());

	url
}

/// Rebuilds the redirect URI a token exchange must echo: the callback URL
/// stripped of its query/fragment with only the `domain` marker re-applied.
pub(crate) fn exchange_redirect(returned_url: &Url, provider: Provider) -> Url {
	let mut url = returned_url.clone();

	url.set_query(None);
	url.set_fragment(None);

	redirect_with_domain(&url, provider)
}
