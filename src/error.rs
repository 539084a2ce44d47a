//! Gateway-level error types shared by the registry, provider bindings, and transports.

// self
use crate::_prelude::*;

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Account construction or token-string parsing failure.
	#[error(transparent)]
	Account(#[from] AccountError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS) outside an authorization handshake.
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The authorization handshake failed at some step.
	///
	/// Missing callback parameters, a rejected token exchange, a failed profile
	/// fetch, and a declined consent screen all collapse into this one variant;
	/// no partial account is ever produced.
	#[error("Authorization could not be completed.")]
	AuthorizationFailed,
}

/// Configuration and validation failures raised by the gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// The domain string does not name a supported provider.
	#[error("No provider matches domain `{domain}`.")]
	UnknownProvider {
		/// Domain string as supplied by the caller.
		domain: String,
	},
	/// The provider is supported but no app credentials were registered for it.
	#[error("Provider `{provider}` has no registered app credentials.")]
	UnregisteredProvider {
		/// Canonical provider domain key.
		provider: &'static str,
	},
	/// A callback URL lacks the `domain` marker embedded at authorization time.
	#[error("Redirect URL is missing the `domain` marker parameter.")]
	MissingDomainMarker,
	/// The binding has no bound account to issue calls for.
	#[error("No account is bound; complete an authorization first.")]
	MissingAccount,
	/// An endpoint or service path produced an invalid URL.
	#[error("URL is invalid.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The stored access token is not the composite shape the provider requires.
	#[error("Access token for `{provider}` must be a composite of {expected} parts.")]
	MalformedCompositeToken {
		/// Canonical provider domain key.
		provider: &'static str,
		/// Number of separator-delimited parts expected.
		expected: usize,
	},
	/// The operation only exists on a different provider's binding.
	#[error("Provider `{provider}` does not support `{operation}`.")]
	UnsupportedOperation {
		/// Canonical provider domain key.
		provider: &'static str,
		/// Name of the refused operation.
		operation: &'static str,
	},
}

/// Account validation failures raised at construction or parse time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum AccountError {
	/// A required account field was empty.
	#[error("Account field `{field}` must not be empty.")]
	EmptyField {
		/// Name of the offending field.
		field: &'static str,
	},
	/// The serialized token string has too few delimited fields.
	#[error("Serialized account has {found} fields where at least {min} are required.")]
	MalformedToken {
		/// Number of fields found.
		found: usize,
		/// Minimum number of fields required.
		min: usize,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
