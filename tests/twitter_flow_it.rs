#![cfg(feature = "reqwest")]

// std
use std::time::{SystemTime, UNIX_EPOCH};
// crates.io
use httpmock::prelude::*;
// self
use cloud_oauth_gateway::{
	gateway::Gateway,
	http::HttpMethod,
	provider::{Provider, ProviderProfile},
	url::Url,
};

const APP_ID: &str = "twitter-app";
const APP_SECRET: &str = "twitter-secret";

fn build_gateway(server: &MockServer) -> Gateway<cloud_oauth_gateway::http::ReqwestTransport> {
	let profile = ProviderProfile::new(Provider::Twitter, APP_ID, APP_SECRET)
		.with_oauth_endpoint(
			Url::parse(&server.url("/oauth/"))
				.expect("Mock OAuth endpoint should parse successfully."),
		)
		.with_api_endpoint(
			Url::parse(&server.url("/1.1/")).expect("Mock API endpoint should parse successfully."),
		);

	Gateway::new().register(profile)
}

fn unix_now() -> i64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System clock should be past the epoch.")
		.as_secs() as _
}

#[tokio::test]
async fn three_legged_handshake_yields_a_composite_token() {
	let server = MockServer::start_async().await;
	let gateway = build_gateway(&server);
	let request_token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/request_token").header_exists("authorization");
			then.status(200)
				.body("oauth_token=req-tok&oauth_token_secret=req-sec&oauth_callback_confirmed=true");
		})
		.await;
	let redirect =
		Url::parse("https://app.example.com/callback").expect("Redirect URI should parse.");
	let url = gateway
		.create_authorization_url("twitter", &redirect, "state-123")
		.await
		.expect("Request-token leg should succeed against the mock provider.");

	request_token_mock.assert_async().await;

	assert!(url.as_str().starts_with(&server.url("/oauth/authenticate")));
	assert!(url.query_pairs().any(|(key, value)| key == "oauth_token" && value == "req-tok"));

	let access_token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/access_token").header_exists("authorization");
			then.status(200).body(
				"oauth_token=user-tok&oauth_token_secret=user-sec&user_id=7&screen_name=jdoe",
			);
		})
		.await;
	let identity_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/1.1/users/show.json").header_exists("authorization");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"id_str":"7","name":"Jane Doe","screen_name":"jdoe"}"#);
		})
		.await;
	let callback = Url::parse(
		"https://app.example.com/callback?domain=twitter&oauth_token=req-tok&oauth_verifier=v1",
	)
	.expect("Callback URL should parse.");
	let binding = gateway
		.finalize_authorization(&callback)
		.await
		.expect("Access-token leg should succeed against the mock provider.");

	access_token_mock.assert_async().await;
	identity_mock.assert_async().await;

	let account = binding.account().expect("Finalization must bind an account.");

	assert_eq!(account.domain, "twitter");
	assert_eq!(account.id, "7");
	assert_eq!(account.token, "7_user-tok_user-sec");
	assert_eq!(account.name, "Jane Doe");

	// The request-token secret is single-use; replaying the callback fails.
	gateway
		.finalize_authorization(&callback)
		.await
		.expect_err("A replayed callback must not complete a second handshake.");
}

#[tokio::test]
async fn exhausted_windows_suppress_further_dispatches() {
	let server = MockServer::start_async().await;
	let gateway = build_gateway(&server);
	let account = cloud_oauth_gateway::account::Account::new(
		"twitter",
		"7",
		"7_user-tok_user-sec",
		"",
		"Jane Doe",
	)
	.expect("Account fixture should be valid.");
	let binding = gateway
		.binding_for_account(&account.serialize())
		.expect("Serialized account should reconstruct a binding.");
	let timeline_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/1.1/statuses/user_timeline.json");
			then.status(200)
				.header("content-type", "application/json")
				.header("x-rate-limit-remaining", "0")
				.header("x-rate-limit-reset", (unix_now() + 300).to_string())
				.body("[]");
		})
		.await;
	let first = binding
		.dispatch("statuses/user_timeline.json", HttpMethod::Get, None, &[])
		.await
		.expect("The first dispatch should reach the mock provider.");

	assert_eq!(first.status, 200);

	// The exhausted-window headers arm the registry; the next call never
	// leaves the process.
	let second = binding
		.dispatch("statuses/user_timeline.json", HttpMethod::Get, None, &[])
		.await
		.expect("A suppressed dispatch is a response, not an error.");

	assert_eq!(second.status, 429);

	timeline_mock.assert_hits_async(1).await;
}
