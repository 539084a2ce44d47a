#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use cloud_oauth_gateway::{
	gateway::Gateway,
	provider::{Provider, ProviderProfile},
	url::Url,
};

const APP_ID: &str = "slack-app";
const APP_SECRET: &str = "slack-secret";

fn build_gateway(server: &MockServer) -> Gateway<cloud_oauth_gateway::http::ReqwestTransport> {
	let profile = ProviderProfile::new(Provider::Slack, APP_ID, APP_SECRET)
		.with_authorize_endpoint(
			Url::parse(&server.url("/authorize"))
				.expect("Mock authorize endpoint should parse successfully."),
		)
		.with_api_endpoint(
			Url::parse(&server.url("/api/")).expect("Mock API endpoint should parse successfully."),
		);

	Gateway::new().register(profile)
}

#[tokio::test]
async fn authorization_url_carries_credentials_scopes_and_state() {
	let server = MockServer::start_async().await;
	let gateway = build_gateway(&server);
	let redirect =
		Url::parse("https://app.example.com/callback").expect("Redirect URI should parse.");
	let url = gateway
		.create_authorization_url("slack.com", &redirect, "state-123")
		.await
		.expect("Authorization URL should build without network traffic.");
	let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

	assert!(url.as_str().starts_with(&server.url("/authorize")));
	assert_eq!(pairs.get("client_id"), Some(&APP_ID.into()));
	assert_eq!(pairs.get("state"), Some(&"state-123".into()));
	assert!(pairs.get("scope").is_some_and(|scope| scope.contains("users:read")));

	let embedded = pairs.get("redirect_uri").expect("Redirect URI should be embedded.");

	assert!(embedded.contains("domain=slack"), "Redirect must carry the routing marker.");
}

#[tokio::test]
async fn callback_finalizes_into_a_portable_account() {
	let server = MockServer::start_async().await;
	let gateway = build_gateway(&server);
	let exchange_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/oauth.access");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"ok":true,"access_token":"slack-tok","scope":"users:read"}"#);
		})
		.await;
	let whoami_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth.test");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"ok":true,"user_id":"U1","team_id":"T1"}"#);
		})
		.await;
	let identity_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/users.info");
			then.status(200).header("content-type", "application/json").body(
				r#"{"ok":true,"user":{"id":"U1","name":"jdoe","real_name":"Jane Doe","profile":{"email":"jane@example.com"}}}"#,
			);
		})
		.await;
	let callback =
		Url::parse("https://app.example.com/callback?domain=slack&code=c1&state=state-123")
			.expect("Callback URL should parse.");
	let binding = gateway
		.finalize_authorization(&callback)
		.await
		.expect("Authorization should finalize against the mock provider.");

	exchange_mock.assert_async().await;
	whoami_mock.assert_async().await;
	identity_mock.assert_async().await;

	let account = binding.account().expect("Finalization must bind an account.").clone();

	assert_eq!(account.domain, "slack");
	assert_eq!(account.id, "U1");
	assert_eq!(account.token, "slack-tok");
	assert_eq!(account.email, "jane@example.com");
	assert_eq!(account.name, "Jane Doe");

	// The serialized token string must reconstruct an equivalent binding.
	let restored = gateway
		.binding_for_account(&account.serialize())
		.expect("Serialized account should reconstruct a binding.");

	assert_eq!(restored.account(), Some(&account));
	assert_eq!(restored.provider(), Provider::Slack);
}

#[tokio::test]
async fn denied_callbacks_fail_without_binding_an_account() {
	let server = MockServer::start_async().await;
	let gateway = build_gateway(&server);
	let exchange_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/oauth.access");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"ok":false,"error":"invalid_code"}"#);
		})
		.await;
	let callback = Url::parse("https://app.example.com/callback?domain=slack&code=bad")
		.expect("Callback URL should parse.");

	gateway
		.finalize_authorization(&callback)
		.await
		.expect_err("An exchange without a token must fail the handshake.");

	exchange_mock.assert_async().await;
}
