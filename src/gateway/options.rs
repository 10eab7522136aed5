//! Per-request parameter object and outbound header assembly.

// crates.io
use http::{
	HeaderMap, HeaderName, HeaderValue,
	header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

fn json_header() -> HeaderValue {
	HeaderValue::from_static("application/json")
}

/// Caller-supplied headers, body, and query parameters for one request.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
	/// Headers that override the gateway defaults (except `Authorization` when signed in).
	pub headers: HeaderMap,
	/// Raw request body.
	pub body: Option<Vec<u8>>,
	/// Query parameters appended to the resolved URL.
	pub query: Vec<(String, String)>,
}
impl RequestOptions {
	/// Creates empty options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets a typed header.
	pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Sets a header from strings, validating both parts.
	pub fn try_header(self, name: &str, value: &str) -> Result<Self, ConfigError> {
		let invalid = || ConfigError::InvalidHeader { name: name.to_owned() };
		let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
		let value = HeaderValue::from_str(value).map_err(|_| invalid())?;

		Ok(self.header(name, value))
	}

	/// Serializes `body` as the JSON payload and marks it as `application/json`.
	pub fn json(mut self, body: &impl Serialize) -> Result<Self, ConfigError> {
		self.body = Some(serde_json::to_vec(body)?);
		self.headers.insert(CONTENT_TYPE, json_header());

		Ok(self)
	}

	/// Sets a raw body.
	pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Appends a query parameter.
	pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
		self.query.push((key.into(), value.to_string()));

		self
	}

	/// Applies query parameters to `url`.
	pub(crate) fn apply_query(&self, url: &mut Url) {
		if self.query.is_empty() {
			return;
		}

		let mut pairs = url.query_pairs_mut();

		for (key, value) in &self.query {
			pairs.append_pair(key, value);
		}
	}

	/// Merges JSON defaults, caller headers, and the bearer credential.
	///
	/// Defaults only fill gaps; caller headers win for every key except `Authorization`, which the
	/// stored credential always sets when one is present.
	pub(crate) fn outbound_headers(
		&self,
		credential: Option<&TokenSecret>,
	) -> Result<HeaderMap, ConfigError> {
		let mut headers = self.headers.clone();

		if !headers.contains_key(CONTENT_TYPE) {
			headers.insert(CONTENT_TYPE, json_header());
		}
		if !headers.contains_key(ACCEPT) {
			headers.insert(ACCEPT, json_header());
		}
		if let Some(secret) = credential {
			headers.insert(AUTHORIZATION, secret.bearer_header()?);
		}

		Ok(headers)
	}
}
