//! The provider registry and top-level authorization entry points.

// self
use crate::{
	_prelude::*,
	account::Account,
	error::ConfigError,
	extract,
	http::HttpTransport,
	oauth1::RequestTokenCache,
	provider::{Binding, Provider, ProviderProfile},
	ratelimit::RateLimitRegistry,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// Gateway specialized for the crate's default reqwest transport.
#[cfg(feature = "reqwest")]
pub type ReqwestGateway = Gateway<ReqwestTransport>;

/// Registry of provider profiles and the single entry point for authorization.
///
/// The gateway owns the transport and the two process-wide synchronized
/// stores (rate-limit registry and request-token cache) and hands out fresh
/// [`Binding`] instances that share them. Registering a profile for a provider
/// is the sole way new services are wired in; the provider set itself is
/// closed.
pub struct Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	transport: Arc<T>,
	profiles: HashMap<Provider, ProviderProfile>,
	rate_limits: Arc<RateLimitRegistry>,
	request_tokens: Arc<RequestTokenCache>,
}
impl<T> Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a gateway over the caller-provided transport with no profiles
	/// registered yet.
	pub fn with_transport(transport: impl Into<Arc<T>>) -> Self {
		Self {
			transport: transport.into(),
			profiles: HashMap::new(),
			rate_limits: Arc::new(RateLimitRegistry::default()),
			request_tokens: Arc::new(RequestTokenCache::default()),
		}
	}

	/// Registers (or replaces) the profile for one provider.
	pub fn register(mut self, profile: ProviderProfile) -> Self {
		self.profiles.insert(profile.provider, profile);

		self
	}

	/// Replaces the rate-limit registry, e.g. to share one across gateways.
	pub fn with_rate_limits(mut self, rate_limits: Arc<RateLimitRegistry>) -> Self {
		self.rate_limits = rate_limits;

		self
	}

	/// Replaces the request-token cache.
	pub fn with_request_tokens(mut self, request_tokens: Arc<RequestTokenCache>) -> Self {
		self.request_tokens = request_tokens;

		self
	}

	/// The rate-limit registry shared by every binding this gateway creates.
	pub fn rate_limits(&self) -> &Arc<RateLimitRegistry> {
		&self.rate_limits
	}

	/// Resolves a domain string to a fresh, unauthenticated binding.
	pub fn binding(&self, domain: &str) -> Result<Binding<T>> {
		let provider = Provider::from_domain(domain)
			.ok_or_else(|| ConfigError::UnknownProvider { domain: domain.to_owned() })?;
		let profile = self
			.profiles
			.get(&provider)
			.cloned()
			.ok_or(ConfigError::UnregisteredProvider { provider: provider.domain() })?;

		Ok(Binding::new(
			profile,
			self.transport.clone(),
			self.rate_limits.clone(),
			self.request_tokens.clone(),
		))
	}

	/// Builds a provider login URL embedding the app id, scopes, redirect
	/// target, and the caller's opaque `state` for session binding.
	pub async fn create_authorization_url(
		&self,
		domain: &str,
		redirect_url: &Url,
		state: &str,
	) -> Result<Url> {
		self.binding(domain)?.authorization_url(redirect_url, state).await
	}

	/// Completes an authorization from the URL the provider redirected back to.
	///
	/// The `domain` marker embedded by [`Gateway::create_authorization_url`]
	/// selects the binding; the binding's handshake completion produces the
	/// account. The returned binding is authenticated and ready to dispatch.
	pub async fn finalize_authorization(&self, returned_url: &Url) -> Result<Binding<T>> {
		let domain = extract::find_url_value(returned_url.as_str(), "domain")
			.ok_or(ConfigError::MissingDomainMarker)?;
		let mut binding = self.binding(&domain)?;

		binding.complete_authorization(returned_url).await?;

		Ok(binding)
	}

	/// Reconstructs an authenticated binding from a serialized account token.
	pub fn binding_for_account(&self, serialized: &str) -> Result<Binding<T>> {
		let account = Account::parse(serialized)?;
		let mut binding = self.binding(&account.domain)?;

		binding.bind_account(account);

		Ok(binding)
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestTransport> {
	/// Creates a gateway backed by a default reqwest transport.
	pub fn new() -> Self {
		Self::with_transport(ReqwestTransport::default())
	}
}
#[cfg(feature = "reqwest")]
impl Default for Gateway<ReqwestTransport> {
	fn default() -> Self {
		Self::new()
	}
}
impl<T> Debug for Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("providers", &self.profiles.keys().collect::<Vec<_>>())
			.finish()
	}
}
