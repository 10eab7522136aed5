//! Best-effort inspection of JWT access tokens so near-expiry credentials can be rotated early.
//!
//! Signatures are never verified here; the identity service remains the authority. A token that is
//! not a three-segment JWT with a base64url JSON payload simply has no known expiry.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::_prelude::*;

/// Registered claims the gateway cares about.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AccessClaims {
	/// Expiry as seconds since the Unix epoch.
	#[serde(default)]
	pub exp: Option<i64>,
}
impl AccessClaims {
	/// Decodes the payload segment of `token`, returning `None` for anything that is not a JWT.
	pub fn decode(token: &str) -> Option<Self> {
		let mut segments = token.split('.');
		let (Some(_), Some(payload), Some(_), None) =
			(segments.next(), segments.next(), segments.next(), segments.next())
		else {
			return None;
		};
		let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;

		serde_json::from_slice(&bytes).ok()
	}

	/// Expiry instant, when the token carries a representable `exp` claim.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		OffsetDateTime::from_unix_timestamp(self.exp?).ok()
	}
}

#[cfg(test)]
pub(crate) fn jwt_with_exp(exp: i64) -> String {
	let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
	let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"demo","exp":{exp}}}"#));

	format!("{header}.{payload}.signature")
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn decodes_expiry_from_jwt_payload() {
		let token = jwt_with_exp(1_767_225_600);
		let claims = AccessClaims::decode(&token).expect("Fixture JWT should decode.");

		assert_eq!(claims.exp, Some(1_767_225_600));
		assert_eq!(claims.expires_at(), Some(macros::datetime!(2026-01-01 00:00 UTC)));
	}

	#[test]
	fn opaque_tokens_have_no_claims() {
		assert_eq!(AccessClaims::decode("opaque-access-token"), None);
		assert_eq!(AccessClaims::decode("a.b"), None);
		assert_eq!(AccessClaims::decode("a.b.c.d"), None);
		assert_eq!(AccessClaims::decode("header.!!not-base64!!.sig"), None);
	}

	#[test]
	fn padded_payloads_are_accepted() {
		let payload = format!("{}==", URL_SAFE_NO_PAD.encode(br#"{"exp":10}"#));
		let claims =
			AccessClaims::decode(&format!("h.{payload}.s")).expect("Padded payload should decode.");

		assert_eq!(claims.exp, Some(10));
	}
}
