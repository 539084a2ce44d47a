//! Dropbox binding: OAuth2 authorization-code handshake and Bearer-header dispatch.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
// self
use crate::{
	_prelude::*,
	account::Account,
	extract,
	http::{HttpMethod, HttpTransport, TransportRequest, TransportResponse},
	provider::{self, Binding, Provider},
};

pub(crate) fn authorization_url<T>(
	binding: &Binding<T>,
	redirect_url: &Url,
	state: &str,
) -> Result<Url>
where
	T: ?Sized + HttpTransport,
{
	let redirect = provider::redirect_with_domain(redirect_url, Provider::Dropbox);
	let mut url = binding.profile().authorize_endpoint.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("disable_signup", "true");
	pairs.append_pair("response_type", "code");
	pairs.append_pair("redirect_uri", redirect.as_str());
	pairs.append_pair("client_id", &binding.profile().app_id);
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
	let redirect = provider::exchange_redirect(returned_url, Provider::Dropbox);
	let profile = binding.profile();
	let basic =
		format!("Basic {}", STANDARD.encode(format!("{}:{}", profile.app_id, profile.app_secret)));
	let exchange = TransportRequest::new(binding.api_url("oauth2/token")?, HttpMethod::Post)
		.with_header("Accept", "application/json")
		.with_header("Authorization", basic)
		.with_param("grant_type", "authorization_code")
		.with_param("redirect_uri", redirect.as_str())
		.with_param("code", code);
	let response = binding.http(exchange).await.map_err(|_| Error::AuthorizationFailed)?;
	let token = extract::find_json_value(&response.body, "access_token")
		.ok_or(Error::AuthorizationFailed)?;
	let account_id = extract::find_json_value(&response.body, "account_id")
		.ok_or(Error::AuthorizationFailed)?;
	// The fresh token replaces the app credentials for the profile fetch.
	let lookup = TransportRequest::new(binding.api_url("2/users/get_account")?, HttpMethod::Post)
		.with_header("Accept", "application/json")
		.with_header("Content-Type", "application/json")
		.with_header("Authorization", format!("Bearer {token}"))
		.with_body(serde_json::json!({ "account_id": account_id }).to_string());
	let identity = binding.http(lookup).await.map_err(|_| Error::AuthorizationFailed)?;

	if !identity.is_success() {
		return Err(Error::AuthorizationFailed);
	}

	let email = extract::find_json_value(&identity.body, "email").unwrap_or_default();
	let name = extract::find_json_value(&identity.body, "display_name").unwrap_or_default();

	Ok(Account::new(Provider::Dropbox.domain(), account_id, token, email, name)?)
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
		.with_header("Accept", "application/json, text/javascript")
		.with_header("Content-Type", "application/json")
		.with_header("Authorization", format!("Bearer {}", account.token))
		.with_params(params.to_vec());

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
	let body = serde_json::json!({ "account_id": target }).to_string();

	binding.execute("2/users/get_account", HttpMethod::Post, Some(&body), &[]).await
}
