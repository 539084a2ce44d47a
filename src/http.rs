//! Transport boundary for provider HTTP calls.
//!
//! The gateway never opens sockets itself: every binding hands a fully
//! described [`TransportRequest`] to an [`HttpTransport`] implementation and
//! interprets the [`TransportResponse`] that comes back. The default
//! implementation wraps [`ReqwestClient`] behind the `reqwest` feature.

// std
use std::ops::Deref;
// self
use crate::{_prelude::*, error::TransportError};

/// Boxed future returned by [`HttpTransport::call`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + 'a + Send>>;

/// HTTP methods used by provider bindings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
	/// HTTP GET.
	Get,
	/// HTTP POST.
	Post,
}
impl HttpMethod {
	/// Returns the canonical uppercase method name used in signature bases.
	pub fn as_str(self) -> &'static str {
		match self {
			HttpMethod::Get => "GET",
			HttpMethod::Post => "POST",
		}
	}
}
impl Display for HttpMethod {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// One outbound provider request, fully described for the transport.
///
/// `params` travel in the query string for GET requests (and for POST requests
/// that carry an explicit body); otherwise they are submitted as a
/// form-encoded body.
#[derive(Clone, Debug)]
pub struct TransportRequest {
	/// Target URL without the request parameters.
	pub url: Url,
	/// HTTP method.
	pub method: HttpMethod,
	/// Optional raw request body.
	pub body: Option<String>,
	/// Request parameters, in insertion order.
	pub params: Vec<(String, String)>,
	/// Request headers, in insertion order.
	pub headers: Vec<(String, String)>,
}
impl TransportRequest {
	/// Creates a request with no body, parameters, or headers.
	pub fn new(url: Url, method: HttpMethod) -> Self {
		Self { url, method, body: None, params: Vec::new(), headers: Vec::new() }
	}

	/// Sets the raw request body.
	pub fn with_body(mut self, body: impl Into<String>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Appends one request parameter.
	pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.params.push((key.into(), value.into()));

		self
	}

	/// Appends a batch of request parameters.
	pub fn with_params(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
		self.params.extend(params);

		self
	}

	/// Appends one request header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}
}

/// Status, body, and headers of one provider response.
#[derive(Clone, Debug, Default)]
pub struct TransportResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body as text.
	pub body: String,
	/// Response headers with lowercased names.
	pub headers: HashMap<String, String>,
}
impl TransportResponse {
	/// Creates a response with the given status and body and no headers.
	pub fn new(status: u16, body: impl Into<String>) -> Self {
		Self { status, body: body.into(), headers: HashMap::new() }
	}

	/// Adds a response header, lowercasing its name.
	pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
		self.headers.insert(name.to_ascii_lowercase(), value.into());

		self
	}

	/// Whether the status is in the 2xx success range.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Looks up a header value by case-insensitive name.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
	}
}

/// Abstraction over HTTP stacks capable of executing provider calls.
///
/// Implementations must be `Send + Sync` so one transport can back concurrent
/// authorization flows and dispatches; the returned futures block their caller
/// until the transport resolves — there is no built-in timeout or retry here.
pub trait HttpTransport
where
	Self: Send + Sync,
{
	/// Executes the request and resolves with the provider's response.
	fn call(&self, request: TransportRequest) -> TransportFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn call(&self, request: TransportRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let TransportRequest { mut url, method, body, params, headers } = request;
			let params_in_query =
				!params.is_empty() && (method == HttpMethod::Get || body.is_some());

			if params_in_query {
				url.query_pairs_mut()
					.extend_pairs(params.iter().map(|(key, value)| (key.as_str(), value.as_str())));
			}

			let mut builder = match method {
				HttpMethod::Get => client.get(url),
				HttpMethod::Post => client.post(url),
			};

			for (name, value) in &headers {
				builder = builder.header(name, value);
			}
			if let Some(body) = body {
				builder = builder.body(body);
			} else if method == HttpMethod::Post && !params.is_empty() {
				builder = builder.form(&params);
			}

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let response_headers = response
				.headers()
				.iter()
				.map(|(name, value)| {
					(name.as_str().to_ascii_lowercase(), value.to_str().unwrap_or_default().to_owned())
				})
				.collect();
			let body = response.text().await.map_err(TransportError::from)?;

			Ok(TransportResponse { status, body, headers: response_headers })
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn response_headers_resolve_case_insensitively() {
		let response = TransportResponse::new(200, "ok").with_header("X-Rate-Limit-Remaining", "0");

		assert_eq!(response.header("x-rate-limit-remaining"), Some("0"));
		assert_eq!(response.header("X-RATE-LIMIT-REMAINING"), Some("0"));
		assert_eq!(response.header("x-rate-limit-reset"), None);
	}

	#[test]
	fn success_covers_the_full_2xx_range() {
		assert!(TransportResponse::new(200, "").is_success());
		assert!(TransportResponse::new(204, "").is_success());
		assert!(!TransportResponse::new(199, "").is_success());
		assert!(!TransportResponse::new(301, "").is_success());
		assert!(!TransportResponse::new(429, "").is_success());
	}
}
