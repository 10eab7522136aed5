//! Redacting wrapper for bearer and refresh token material.

// crates.io
use http::HeaderValue;
// self
use crate::{_prelude::*, error::ConfigError};

/// Token secret that never shows its value in `Debug` or `Display` output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Renders an `Authorization` header value carrying this secret as a bearer credential.
	///
	/// The value is flagged sensitive so HTTP stacks that honor the flag skip it in their logs.
	pub fn bearer_header(&self) -> Result<HeaderValue, ConfigError> {
		let mut value =
			HeaderValue::from_str(&format!("Bearer {}", self.0)).map_err(|_| {
				ConfigError::InvalidHeader { name: http::header::AUTHORIZATION.to_string() }
			})?;

		value.set_sensitive(true);

		Ok(value)
	}
}
impl From<&str> for TokenSecret {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl From<String> for TokenSecret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn bearer_header_is_sensitive() {
		let header = TokenSecret::new("A1").bearer_header().expect("Plain token should render.");

		assert_eq!(header.to_str().expect("Header should be visible ASCII."), "Bearer A1");
		assert!(header.is_sensitive());
	}

	#[test]
	fn bearer_header_rejects_control_characters() {
		let err = TokenSecret::new("bad\ntoken")
			.bearer_header()
			.expect_err("Newlines must not reach an HTTP header.");

		assert!(matches!(err, ConfigError::InvalidHeader { ref name } if name == "authorization"));
	}
}
