//! Provider-agnostic OAuth gateway—one handshake surface and one dispatch
//! pipeline over Dropbox, Facebook, Slack, and Twitter, with portable account
//! tokens and per-token rate limiting built in.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod account;
pub mod error;
pub mod extract;
pub mod gateway;
pub mod http;
pub mod oauth1;
pub mod obs;
pub mod provider;
pub mod ratelimit;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience stubs and helpers for tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// self
	use crate::{
		gateway::Gateway,
		http::{HttpTransport, TransportFuture, TransportRequest, TransportResponse},
		provider::{Provider, ProviderProfile},
	};

	/// App credentials the stub gateway registers for each provider.
	#[derive(Clone, Copy, Debug)]
	pub struct StubAppIds {
		/// Dropbox client id.
		pub dropbox: &'static str,
		/// Facebook client id.
		pub facebook: &'static str,
		/// Slack client id.
		pub slack: &'static str,
		/// Twitter consumer key.
		pub twitter: &'static str,
	}

	impl StubAppIds {
		/// The app id registered for `provider`.
		pub fn id(&self, provider: Provider) -> &'static str {
			match provider {
				Provider::Dropbox => self.dropbox,
				Provider::Facebook => self.facebook,
				Provider::Slack => self.slack,
				Provider::Twitter => self.twitter,
			}
		}
	}

	/// Credentials used by [`stub_gateway`].
	pub const STUB_APP_IDS: StubAppIds = StubAppIds {
		dropbox: "dropbox-app",
		facebook: "facebook-app",
		slack: "slack-app",
		twitter: "twitter-app",
	};

	/// In-memory transport that records every request and answers from a queue
	/// of canned responses, falling back to a 500 when the queue runs dry.
	#[derive(Debug, Default)]
	pub struct StubTransport {
		requests: Mutex<Vec<TransportRequest>>,
		responses: Mutex<VecDeque<TransportResponse>>,
	}
	impl StubTransport {
		/// Queues the next canned response.
		pub fn push_response(&self, response: TransportResponse) {
			self.responses.lock().push_back(response);
		}

		/// Every request issued so far, in order.
		pub fn requests(&self) -> Vec<TransportRequest> {
			self.requests.lock().clone()
		}

		/// Number of requests issued so far.
		pub fn request_count(&self) -> usize {
			self.requests.lock().len()
		}
	}
	impl HttpTransport for StubTransport {
		fn call(&self, request: TransportRequest) -> TransportFuture<'_> {
			self.requests.lock().push(request);

			let response = self
				.responses
				.lock()
				.pop_front()
				.unwrap_or_else(|| TransportResponse::new(500, ""));

			Box::pin(async move { Ok(response) })
		}
	}

	/// Constructs a [`Gateway`] over a shared [`StubTransport`] with every
	/// provider registered under [`STUB_APP_IDS`].
	pub fn stub_gateway() -> (Gateway<StubTransport>, Arc<StubTransport>) {
		let transport = Arc::new(StubTransport::default());
		let gateway =
			Provider::ALL.into_iter().fold(Gateway::with_transport(transport.clone()), |gateway, provider| {
				gateway.register(ProviderProfile::new(
					provider,
					STUB_APP_IDS.id(provider),
					format!("{}-secret", provider.domain()),
				))
			});

		(gateway, transport)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use httpmock as _;
