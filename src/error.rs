//! Gateway-level error types shared across transports, stores, and the refresh coordinator.

// self
use crate::{_prelude::*, gateway::GatewayConfigError, session::SessionEndReason};

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
///
/// A caller can always tell a normal HTTP outcome (returned as a response, whatever its status)
/// apart from [`Error::SessionEnded`], which means the credentials are gone and the user must sign
/// in again.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeouts); never retried by the gateway.
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Credentials could not be renewed and were cleared.
	#[error("Session ended: {reason}.")]
	SessionEnded {
		/// Why the refresh episode failed.
		reason: SessionEndReason,
	},
	/// Upstream answered with a non-success status while a decoded body was expected.
	#[error("API request failed with status {status}.")]
	Api {
		/// HTTP status code returned upstream.
		status: u16,
		/// Response body rendered as text for diagnostics.
		body: String,
	},
	/// Response body could not be decoded into the requested type.
	#[error("Response body with status {status} is not valid JSON for the requested type.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// The identity endpoint rejected the username/password pair.
	#[error("Login rejected: invalid username or password.")]
	InvalidCredentials,
	/// The identity endpoint issued an empty access or refresh credential.
	#[error("Identity endpoint issued an empty credential.")]
	BlankCredential,
	/// The identity endpoint is rate limiting login attempts.
	#[error("Login attempts are throttled.")]
	LoginThrottled {
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
}
impl Error {
	/// Returns `true` when the error means the session was terminated.
	pub fn is_session_ended(&self) -> bool {
		matches!(self, Self::SessionEnded { .. })
	}

	/// Returns the session end reason, if any.
	pub fn session_end_reason(&self) -> Option<&SessionEndReason> {
		match self {
			Self::SessionEnded { reason } => Some(reason),
			_ => None,
		}
	}
}
impl From<SessionEndReason> for Error {
	fn from(reason: SessionEndReason) -> Self {
		Self::SessionEnded { reason }
	}
}

/// Configuration and request-construction failures raised by the gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Gateway configuration failed validation.
	#[error(transparent)]
	Gateway(#[from] GatewayConfigError),
	/// Request target cannot be resolved into an absolute URL.
	#[error("Request target `{target}` is not a valid URL.")]
	InvalidTarget {
		/// Caller-supplied target.
		target: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Header value contains characters HTTP does not allow.
	#[error("Header `{name}` has an invalid value.")]
	InvalidHeader {
		/// Header name whose value was rejected.
		name: String,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized to JSON.")]
	RequestBody(#[from] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {url}.")]
	Network {
		/// Target of the failed exchange.
		url: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during an HTTP exchange.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error for the given target.
	pub fn network(url: &Url, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { url: url.to_string(), source: Box::new(src) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn session_end_is_distinguishable_from_api_failures() {
		let ended = Error::from(SessionEndReason::RefreshUnavailable);
		let api = Error::Api { status: 401, body: String::new() };

		assert!(ended.is_session_ended());
		assert_eq!(ended.session_end_reason(), Some(&SessionEndReason::RefreshUnavailable));
		assert!(!api.is_session_ended());
		assert!(api.session_end_reason().is_none());
	}

	#[test]
	fn network_error_names_the_target() {
		let url = Url::parse("http://localhost:8080/api/tasks").expect("Fixture URL should parse.");
		let err = TransportError::network(&url, std::io::Error::other("connection refused"));

		assert_eq!(
			err.to_string(),
			"Network error occurred while calling http://localhost:8080/api/tasks."
		);
		assert!(StdError::source(&err).is_some());
	}
}
