//! Slack binding: OAuth2 authorization-code handshake and `token`
//! query-parameter dispatch.
//!
//! Slack spreads identity across three services, so handshake completion
//! chains `oauth.access` (token), `auth.test` (user id), and `users.info`
//! (name and email).

// self
use crate::{
	_prelude::*,
	account::Account,
	extract,
	http::{HttpMethod, HttpTransport, TransportRequest, TransportResponse},
	provider::{self, Binding, Provider},
};

const SCOPES: &str =
	"channels:read groups:read files:read files:write:user search:read users:read";

pub(crate) fn authorization_url<T>(
	binding: &Binding<T>,
	redirect_url: &Url,
	state: &str,
) -> Result<Url>
where
	T: ?Sized + HttpTransport,
{
	let redirect = provider::redirect_with_domain(redirect_url, Provider::Slack);
	let mut url = binding.profile().authorize_endpoint.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("scope", SCOPES);
	pairs.append_pair("client_id", &binding.profile().app_id);
	pairs.append_pair("redirect_uri", redirect.as_str());
	pairs.append_pair("state", state);

	drop(pairs);

	Ok(url)
}

pub(crate) async fn complete_authorization<T>(
	binding: &Binding<T>,
	returned_url: &Url,
) -> Result<Account>
where
	T: ?Sized + HttpTransport,
{
	let code = extract::find_url_value(returned_url.as_str(), "code")
		.ok_or(Error::AuthorizationFailed)?;
	let redirect = provider::exchange_redirect(returned_url, Provider::Slack);
	let profile = binding.profile();
	let exchange = TransportRequest::new(binding.api_url("oauth.access")?, HttpMethod::Post)
		.with_param("client_id", profile.app_id.clone())
		.with_param("client_secret", profile.app_secret.clone())
		.with_param("redirect_uri", redirect.as_str())
		.with_param("code", code);
	let response = binding.http(exchange).await.map_err(|_| Error::AuthorizationFailed)?;
	let token = extract::find_json_value(&response.body, "access_token")
		.ok_or(Error::AuthorizationFailed)?;
	let whoami = TransportRequest::new(binding.api_url("auth.test")?, HttpMethod::Post)
		.with_param("token", token.clone());
	let tested = binding.http(whoami).await.map_err(|_| Error::AuthorizationFailed)?;
	let user_id =
		extract::find_json_value(&tested.body, "user_id").ok_or(Error::AuthorizationFailed)?;
	let lookup = TransportRequest::new(binding.api_url("users.info")?, HttpMethod::Post)
		.with_param("token", token.clone())
		.with_param("user", user_id.clone());
	let identity = binding.http(lookup).await.map_err(|_| Error::AuthorizationFailed)?;

	if !identity.is_success() {
		return Err(Error::AuthorizationFailed);
	}

	let email = extract::find_json_value(&identity.body, "email").unwrap_or_default();
	// Users may withhold their real name; fall back to the screen name.
	let name = extract::find_json_value(&identity.body, "real_name")
		.or_else(|| extract::find_json_value(&identity.body, "name"))
		.unwrap_or_default();

	Ok(Account::new(Provider::Slack.domain(), user_id, token, email, name)?)
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
	let mut request = TransportRequest::new(binding.api_url(service)?, method)
		.with_params(params.to_vec())
		.with_param("token", account.token.clone());

	if let Some(body) = body {
		request = request.with_body(body);
	}

	Ok(binding.http(request).await?)
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
	let params = vec![("user".to_owned(), target.to_owned())];

	binding.execute("users.info", HttpMethod::Post, None, &params).await
}
