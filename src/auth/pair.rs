//! The access/refresh credential pair and its storage keys.

// self
use crate::{
	_prelude::*,
	auth::{AccessClaims, TokenSecret},
};

/// Access and refresh credentials that are always stored, replaced, and cleared together.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPair {
	/// Short-lived bearer credential attached to every outbound request.
	pub access_token: TokenSecret,
	/// Longer-lived credential used only to obtain a new pair.
	pub refresh_token: TokenSecret,
}
impl CredentialPair {
	/// Builds a pair from raw token strings.
	pub fn new(access_token: impl Into<TokenSecret>, refresh_token: impl Into<TokenSecret>) -> Self {
		Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
	}

	/// Returns the secret stored under `key`.
	pub fn get(&self, key: CredentialKey) -> &TokenSecret {
		match key {
			CredentialKey::AccessToken => &self.access_token,
			CredentialKey::RefreshToken => &self.refresh_token,
		}
	}

	/// Expiry of the access token, when it is a JWT carrying `exp`.
	pub fn access_expires_at(&self) -> Option<OffsetDateTime> {
		AccessClaims::decode(self.access_token.expose())?.expires_at()
	}

	/// Returns `true` when the access token expires within `window` of `now`.
	///
	/// Tokens with an unknown expiry never qualify, and a zero window disables the check.
	pub fn access_expires_within(&self, window: Duration, now: OffsetDateTime) -> bool {
		if !window.is_positive() {
			return false;
		}

		match self.access_expires_at() {
			Some(expires_at) => expires_at - now < window,
			None => false,
		}
	}
}
impl Debug for CredentialPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialPair")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.finish()
	}
}

/// Keys under which the pair's halves are persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CredentialKey {
	/// The bearer credential.
	AccessToken,
	/// The refresh credential.
	RefreshToken,
}
impl CredentialKey {
	/// Returns the persisted key label.
	pub const fn as_str(self) -> &'static str {
		match self {
			CredentialKey::AccessToken => "accessToken",
			CredentialKey::RefreshToken => "refreshToken",
		}
	}
}
impl Display for CredentialKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
