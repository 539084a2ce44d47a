//! Facebook binding: OAuth2 authorization-code handshake and `access_token`
//! query-parameter dispatch against the Graph API.

// self
use crate::{
	_prelude::*,
	account::Account,
	extract,
	http::{HttpMethod, HttpTransport, TransportRequest, TransportResponse},
	provider::{self, Binding, Provider},
};

const SCOPES: &str = "public_profile,user_friends,email";
const PROFILE_FIELDS: &str = "id,email,first_name,last_name";

pub(crate) fn authorization_url<T>(
	binding: &Binding<T>,
	redirect_url: &Url,
	state: &str,
) -> Result<Url>
where
	T: ?Sized + HttpTransport,
{
	let redirect = provider::redirect_with_domain(redirect_url, Provider::Facebook);
	let mut url = binding.profile().authorize_endpoint.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", "code");
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
	let redirect = provider::exchange_redirect(returned_url, Provider::Facebook);
	let profile = binding.profile();
	let exchange =
		TransportRequest::new(binding.api_url("v2.8/oauth/access_token")?, HttpMethod::Post)
			.with_param("client_id", profile.app_id.clone())
			.with_param("client_secret", profile.app_secret.clone())
			.with_param("redirect_uri", redirect.as_str())
			.with_param("code", code);
	let response = binding.http(exchange).await.map_err(|_| Error::AuthorizationFailed)?;
	let token = extract::find_json_value(&response.body, "access_token")
		.ok_or(Error::AuthorizationFailed)?;
	let lookup = TransportRequest::new(binding.api_url("me")?, HttpMethod::Post)
		.with_param("access_token", token.clone())
		.with_param("fields", PROFILE_FIELDS);
	let identity = binding.http(lookup).await.map_err(|_| Error::AuthorizationFailed)?;

	if !identity.is_success() {
		return Err(Error::AuthorizationFailed);
	}

	let id = extract::find_json_value(&identity.body, "id").unwrap_or_default();
	let email = extract::find_json_value(&identity.body, "email").unwrap_or_default();
	let first = extract::find_json_value(&identity.body, "first_name").unwrap_or_default();
	let last = extract::find_json_value(&identity.body, "last_name").unwrap_or_default();
	let name = format!("{first} {last}").trim().to_owned();

	Ok(Account::new(Provider::Facebook.domain(), id, token, email, name)?)
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
		.with_param("access_token", account.token.clone());

	if let Some(body) = body {
		request = request.with_body(body);
	}

	Ok(binding.http(request).await?)
}

pub(crate) async fn user_info<T>(
	binding: &Binding<T>,
	_account: &Account,
	user_id: Option<&str>,
) -> Result<Option<String>>
where
	T: ?Sized + HttpTransport,
{
	// The Graph API resolves `me` from the token itself; an explicit id swaps
	// the path instead of a parameter.
	let service = user_id.unwrap_or("me");

	binding.execute(service, HttpMethod::Get, None, &[]).await
}
