//! Identity service exchanges: password login and credential refresh.
//!
//! Both endpoints live under the configured auth base (`<auth-base>/login`, `<auth-base>/refresh`)
//! and answer with the same JSON shape: `{ accessToken, refreshToken, type, user }`. These
//! exchanges go straight to the transport; they never pass through the gateway's 401 handling.

// crates.io
use http::{
	HeaderValue, Method, StatusCode,
	header::{ACCEPT, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	auth::{CredentialPair, TokenSecret},
	error::ConfigError,
	http::{ApiRequest, HttpTransport},
	session::SessionEndReason,
};

/// Role granted to an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
	/// Regular account.
	User,
	/// Administrator.
	Admin,
}

/// Account summary returned alongside issued credentials.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
	/// Account identifier.
	pub id: i64,
	/// Login name.
	pub username: String,
	/// Contact e-mail.
	pub email: String,
	/// Given name.
	#[serde(default)]
	pub first_name: Option<String>,
	/// Family name.
	#[serde(default)]
	pub last_name: Option<String>,
	/// Granted role.
	pub role: Role,
}

/// Credentials issued by the login or refresh endpoint.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
	/// New bearer credential.
	pub access_token: TokenSecret,
	/// New refresh credential.
	pub refresh_token: TokenSecret,
	/// Token type label; the identity service always issues bearer tokens.
	#[serde(rename = "type", default = "LoginResponse::default_token_type")]
	pub token_type: String,
	/// Signed-in account, when the endpoint includes it.
	#[serde(default)]
	pub user: Option<UserProfile>,
}
impl LoginResponse {
	fn default_token_type() -> String {
		"Bearer".into()
	}

	/// Returns the issued pair.
	pub fn credentials(&self) -> CredentialPair {
		CredentialPair::new(self.access_token.clone(), self.refresh_token.clone())
	}

	fn has_blank_secret(&self) -> bool {
		self.access_token.expose().is_empty() || self.refresh_token.expose().is_empty()
	}
}
impl Debug for LoginResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginResponse")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("user", &self.user)
			.finish()
	}
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
	refresh_token: &'a str,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
	username: &'a str,
	password: &'a str,
}

/// Exchanges `refresh_token` for a new pair.
///
/// Every failure is expressed as the [`SessionEndReason`] the gateway reports once it clears the
/// store.
pub(crate) async fn exchange_refresh<T>(
	transport: &T,
	endpoint: &Url,
	refresh_token: &TokenSecret,
) -> Result<CredentialPair, SessionEndReason>
where
	T: ?Sized + HttpTransport,
{
	let request = json_request(endpoint, &RefreshRequest { refresh_token: refresh_token.expose() })
		.map_err(|e| SessionEndReason::RefreshMalformed { message: e.to_string() })?;
	let response = transport
		.execute(request)
		.await
		.map_err(|e| SessionEndReason::RefreshUnreachable { message: e.to_string() })?;

	if !response.is_success() {
		return Err(SessionEndReason::RefreshRejected { status: response.status().as_u16() });
	}

	let issued: LoginResponse = response
		.json()
		.map_err(|e| SessionEndReason::RefreshMalformed { message: decode_message(&e) })?;

	if issued.has_blank_secret() {
		return Err(SessionEndReason::RefreshMalformed {
			message: "identity endpoint issued an empty token".into(),
		});
	}

	Ok(issued.credentials())
}

/// Exchanges a username/password pair for credentials.
pub(crate) async fn exchange_login<T>(
	transport: &T,
	endpoint: &Url,
	username: &str,
	password: &str,
) -> Result<LoginResponse>
where
	T: ?Sized + HttpTransport,
{
	let request = json_request(endpoint, &LoginRequest { username, password })?;
	let response = transport.execute(request).await?;

	match response.status() {
		StatusCode::UNAUTHORIZED => Err(Error::InvalidCredentials),
		StatusCode::TOO_MANY_REQUESTS =>
			Err(Error::LoginThrottled { retry_after: response.retry_after() }),
		_ => {
			let issued: LoginResponse = response.parse()?;

			if issued.has_blank_secret() {
				return Err(Error::BlankCredential);
			}

			Ok(issued)
		},
	}
}

fn json_request(endpoint: &Url, body: &impl Serialize) -> Result<ApiRequest, ConfigError> {
	let mut request = ApiRequest::new(Method::POST, endpoint.clone());

	request.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
	request.headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
	request.body = Some(serde_json::to_vec(body)?);

	Ok(request)
}

fn decode_message(err: &Error) -> String {
	match err {
		Error::Decode { source, .. } => format!("{} at `{}`", source.inner(), source.path()),
		other => other.to_string(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn login_response_accepts_backend_shape() {
		let body = r#"{
			"accessToken": "A1",
			"refreshToken": "R1",
			"type": "Bearer",
			"user": {
				"id": 1,
				"username": "admin",
				"email": "admin@example.com",
				"firstName": "Ada",
				"lastName": null,
				"role": "ADMIN"
			}
		}"#;
		let response: LoginResponse =
			serde_json::from_str(body).expect("Backend login body should decode.");
		let user = response.user.as_ref().expect("User should be present.");

		assert_eq!(response.credentials(), CredentialPair::new("A1", "R1"));
		assert_eq!(user.role, Role::Admin);
		assert_eq!(user.first_name.as_deref(), Some("Ada"));
		assert_eq!(user.last_name, None);
	}

	#[test]
	fn refresh_body_uses_camel_case() {
		let request = json_request(
			&Url::parse("http://localhost:8080/api/auth/refresh").expect("Fixture URL should parse."),
			&RefreshRequest { refresh_token: "R1" },
		)
		.expect("Refresh request should build.");

		assert_eq!(request.method, Method::POST);
		assert_eq!(request.body.as_deref(), Some(br#"{"refreshToken":"R1"}"#.as_slice()));
		assert_eq!(request.headers[CONTENT_TYPE], "application/json");
	}

	#[test]
	fn token_type_defaults_to_bearer() {
		let response: LoginResponse =
			serde_json::from_str(r#"{"accessToken":"A2","refreshToken":"R2"}"#)
				.expect("Minimal refresh body should decode.");

		assert_eq!(response.token_type, "Bearer");
		assert!(response.user.is_none());
		assert!(!format!("{response:?}").contains("A2"));
	}
}
