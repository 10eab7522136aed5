//! Transport primitives for gateway exchanges.
//!
//! [`HttpTransport`] is the gateway's only dependency on an HTTP stack. It performs exactly one
//! exchange per call, resolves ordinary error statuses into an [`ApiResponse`], and reserves `Err`
//! for failures where no response exists at all (DNS, TCP, TLS, timeouts). The crate ships
//! [`ReqwestTransport`] behind the default `reqwest` feature; tests and embedders can plug in their
//! own implementation.

// std
#[cfg(feature = "reqwest")] use std::time::Duration as StdDuration;
use std::borrow::Cow;
// crates.io
use http::{HeaderMap, Method, StatusCode, header::RETRY_AFTER};
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::TransportError};
#[cfg(feature = "reqwest")] use crate::error::ConfigError;

/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks able to run a single request/response exchange.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by many gateways
/// behind an `Arc`, and their futures must be `Send` so gateway calls can hop executor threads.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes `request` and returns the upstream response, whatever its status.
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_>;
}
impl<T> HttpTransport for Arc<T>
where
	T: ?Sized + HttpTransport,
{
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
		(**self).execute(request)
	}
}

/// Fully resolved outbound request.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute target URL, query included.
	pub url: Url,
	/// Outbound headers after defaults and credentials were merged.
	pub headers: HeaderMap,
	/// Optional request body.
	pub body: Option<Vec<u8>>,
}
impl ApiRequest {
	/// Creates a bodiless request without headers.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: HeaderMap::new(), body: None }
	}
}

/// Response captured from a transport exchange.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	status: StatusCode,
	headers: HeaderMap,
	body: Vec<u8>,
}
impl ApiResponse {
	/// Assembles a response from its parts.
	pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers, body: body.into() }
	}

	/// HTTP status code.
	pub fn status(&self) -> StatusCode {
		self.status
	}

	/// Response headers.
	pub fn headers(&self) -> &HeaderMap {
		&self.headers
	}

	/// Raw body bytes.
	pub fn body(&self) -> &[u8] {
		&self.body
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Body rendered as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> Cow<'_, str> {
		String::from_utf8_lossy(&self.body)
	}

	/// Parsed `Retry-After` hint, if present.
	pub fn retry_after(&self) -> Option<Duration> {
		parse_retry_after(&self.headers)
	}

	/// Decodes the body as JSON regardless of status.
	pub fn json<T>(&self) -> Result<T>
	where
		T: for<'de> Deserialize<'de>,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| Error::Decode { source, status: self.status.as_u16() })
	}

	/// Decodes a successful body, turning any non-2xx status into [`Error::Api`].
	pub fn parse<T>(&self) -> Result<T>
	where
		T: for<'de> Deserialize<'de>,
	{
		if !self.is_success() {
			return Err(Error::Api { status: self.status.as_u16(), body: self.text().into_owned() });
		}

		self.json()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client that aborts any exchange still running after `timeout`.
	///
	/// An elapsed timeout surfaces as [`TransportError::Network`], so the gateway never retries it.
	pub fn with_timeout(timeout: StdDuration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().timeout(timeout).build()?;

		Ok(Self::with_client(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: ApiRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let ApiRequest { method, url, headers, body } = request;
			let mut builder = client.request(method, url.clone()).headers(headers);

			if let Some(body) = body {
				builder = builder.body(body);
			}

			let response =
				builder.send().await.map_err(|e| TransportError::network(&url, e))?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let body = response.bytes().await.map_err(|e| TransportError::network(&url, e))?;

			Ok(ApiResponse::new(status, headers, body.to_vec()))
		})
	}
}

pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// crates.io
	use http::HeaderValue;
	// self
	use super::*;

	#[derive(Debug, Deserialize)]
	struct Task {
		id: u64,
		title: String,
	}

	fn response(status: u16, body: &str) -> ApiResponse {
		ApiResponse::new(
			StatusCode::from_u16(status).expect("Fixture status should be valid."),
			HeaderMap::new(),
			body.as_bytes().to_vec(),
		)
	}

	#[test]
	fn parse_decodes_success_bodies() {
		let task: Task =
			response(200, r#"{"id":7,"title":"Write docs"}"#).parse().expect("Body should decode.");

		assert_eq!(task.id, 7);
		assert_eq!(task.title, "Write docs");
	}

	#[test]
	fn parse_surfaces_status_and_body_for_failures() {
		let err = response(404, "Task not found").parse::<Task>().expect_err("404 must fail.");

		assert!(
			matches!(err, Error::Api { status: 404, ref body } if body == "Task not found"),
			"Unexpected error: {err:?}"
		);
	}

	#[test]
	fn decode_errors_point_at_the_field() {
		let err = response(200, r#"{"id":"seven","title":"x"}"#)
			.json::<Task>()
			.expect_err("A string id must not decode.");

		match err {
			Error::Decode { source, status } => {
				assert_eq!(status, 200);
				assert_eq!(source.path().to_string(), "id");
			},
			other => panic!("Unexpected error: {other:?}"),
		}
	}

	#[test]
	fn bodiless_requests_start_without_headers() {
		let url = Url::parse("http://localhost:8080/api/tasks").expect("Fixture URL should parse.");
		let request = ApiRequest::new(Method::DELETE, url.clone());

		assert_eq!(request.method, Method::DELETE);
		assert_eq!(request.url, url);
		assert!(request.headers.is_empty());
		assert!(request.body.is_none());
	}

	#[cfg(feature = "reqwest")]
	#[tokio::test]
	async fn timed_out_exchanges_are_network_errors() {
		// crates.io
		use httpmock::prelude::*;

		let server = MockServer::start_async().await;
		let _slow = server
			.mock_async(|when, then| {
				when.method(GET).path("/api/slow");
				then.status(200).delay(StdDuration::from_secs(2));
			})
			.await;
		let transport = ReqwestTransport::with_timeout(StdDuration::from_millis(100))
			.expect("Client with a timeout should build.");
		let url = Url::parse(&server.url("/api/slow")).expect("Mock URL should parse.");
		let err = transport
			.execute(ApiRequest::new(http::Method::GET, url))
			.await
			.expect_err("Slow exchanges must time out.");

		assert!(matches!(err, TransportError::Network { .. }), "Unexpected error: {err:?}");
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn client_build_failures_are_config_errors() {
		let err = ConfigError::http_client_build(std::io::Error::other("no TLS backend"));

		assert!(matches!(err, ConfigError::HttpClientBuild { .. }));
		assert_eq!(err.to_string(), "HTTP client could not be constructed.");
		assert!(StdError::source(&err).is_some());
	}

	#[test]
	fn retry_after_accepts_delta_seconds() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static("120"));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(120)));
	}

	#[test]
	fn retry_after_ignores_past_dates_and_garbage() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));

		assert_eq!(parse_retry_after(&headers), None);

		headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));

		assert_eq!(parse_retry_after(&headers), None);
	}
}
