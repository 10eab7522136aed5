//! Validated gateway configuration and its builder.

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, error::ConfigError};

/// Environment variable consulted by [`GatewayConfig::from_env`].
pub const API_BASE_URL_ENV: &str = "API_BASE_URL";
/// API base used when [`API_BASE_URL_ENV`] is unset.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

/// Errors raised while constructing or validating a [`GatewayConfig`].
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum GatewayConfigError {
	/// The API base URL is mandatory.
	#[error("Missing API base URL.")]
	MissingApiBase,
	/// Base URLs must accept relative joins.
	#[error("The {endpoint} base cannot be used as a base URL: {url}.")]
	CannotBeABase {
		/// Which base failed validation.
		endpoint: &'static str,
		/// Offending URL.
		url: String,
	},
	/// HTTPS was required but a base uses another scheme.
	#[error("The {endpoint} base must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which base failed validation.
		endpoint: &'static str,
		/// Offending URL.
		url: String,
	},
	/// A URL could not be parsed or joined.
	#[error("The {endpoint} URL is invalid.")]
	InvalidUrl {
		/// Which URL failed to parse.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}

/// Identity endpoints derived from the auth base.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityEndpoints {
	/// `POST` target for password login.
	pub login: Url,
	/// `POST` target for credential refresh.
	pub refresh: Url,
}

/// Immutable gateway configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
	/// Base URL relative request targets are joined onto; always ends with `/`.
	pub api_base: Url,
	/// Base URL of the identity service; always ends with `/`.
	pub auth_base: Url,
	/// Endpoints derived from [`GatewayConfig::auth_base`].
	pub identity: IdentityEndpoints,
	/// Access tokens expiring within this window are rotated before use; zero disables it.
	pub preemptive_window: Duration,
	/// Deadline for one refresh exchange; elapsed deadlines end the session.
	pub refresh_timeout: Option<StdDuration>,
	/// Whether both bases must use HTTPS.
	pub require_https: bool,
}
impl GatewayConfig {
	/// Default pre-emptive rotation window.
	pub const DEFAULT_PREEMPTIVE_WINDOW: Duration = Duration::seconds(60);

	/// Creates a new builder.
	pub fn builder() -> GatewayConfigBuilder {
		GatewayConfigBuilder::default()
	}

	/// Builds a configuration from `API_BASE_URL`, falling back to the local development backend.
	pub fn from_env() -> Result<Self, GatewayConfigError> {
		let raw =
			std::env::var(API_BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_owned());
		let api_base = Url::parse(raw.trim())
			.map_err(|source| GatewayConfigError::InvalidUrl { endpoint: "api", source })?;

		Self::builder().api_base(api_base).build()
	}

	/// Resolves a caller-supplied target into an absolute URL.
	///
	/// Absolute targets pass through untouched; see [`GatewayConfig::is_api_origin`] for how the
	/// gateway treats those on other origins. Relative targets lose one leading `/` and are joined
	/// onto [`GatewayConfig::api_base`], so `"/api/tasks"` and `"api/tasks"` resolve identically.
	pub fn resolve(&self, target: &str) -> Result<Url, ConfigError> {
		let invalid = |source| ConfigError::InvalidTarget { target: target.to_owned(), source };

		match Url::parse(target) {
			Ok(url) => Ok(url),
			Err(url::ParseError::RelativeUrlWithoutBase) => {
				let relative = target.strip_prefix('/').unwrap_or(target);

				self.api_base.join(relative).map_err(invalid)
			},
			Err(source) => Err(invalid(source)),
		}
	}

	/// Returns `true` when `url` shares scheme, host, and port with [`GatewayConfig::api_base`].
	///
	/// Only these targets receive the stored bearer credential or take part in `401` recovery.
	pub fn is_api_origin(&self, url: &Url) -> bool {
		url.origin() == self.api_base.origin()
	}
}

/// Builder for [`GatewayConfig`] values.
#[derive(Debug, Default)]
pub struct GatewayConfigBuilder {
	/// Base URL for API requests.
	pub api_base: Option<Url>,
	/// Optional identity base; defaults to `<api_base>/api/auth/`.
	pub auth_base: Option<Url>,
	/// Optional pre-emptive window override.
	pub preemptive_window: Option<Duration>,
	/// Optional refresh deadline.
	pub refresh_timeout: Option<StdDuration>,
	/// Whether HTTPS is mandatory.
	pub require_https: bool,
}
impl GatewayConfigBuilder {
	/// Sets the API base URL.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Sets the identity service base URL.
	pub fn auth_base(mut self, url: Url) -> Self {
		self.auth_base = Some(url);

		self
	}

	/// Overrides the pre-emptive rotation window (negative values clamp to zero).
	pub fn preemptive_window(mut self, window: Duration) -> Self {
		self.preemptive_window = Some(if window.is_negative() { Duration::ZERO } else { window });

		self
	}

	/// Bounds each refresh exchange; requires a Tokio runtime with timers.
	pub fn refresh_timeout(mut self, timeout: StdDuration) -> Self {
		self.refresh_timeout = Some(timeout);

		self
	}

	/// Requires HTTPS for both bases.
	pub fn require_https(mut self, required: bool) -> Self {
		self.require_https = required;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<GatewayConfig, GatewayConfigError> {
		let api_base = self.api_base.ok_or(GatewayConfigError::MissingApiBase)?;
		let api_base = normalize_base("api", api_base)?;
		let auth_base = match self.auth_base {
			Some(url) => normalize_base("auth", url)?,
			None => api_base
				.join("api/auth/")
				.map_err(|source| GatewayConfigError::InvalidUrl { endpoint: "auth", source })?,
		};
		let identity = IdentityEndpoints {
			login: join_endpoint(&auth_base, "login")?,
			refresh: join_endpoint(&auth_base, "refresh")?,
		};
		let config = GatewayConfig {
			api_base,
			auth_base,
			identity,
			preemptive_window: self
				.preemptive_window
				.unwrap_or(GatewayConfig::DEFAULT_PREEMPTIVE_WINDOW),
			refresh_timeout: self.refresh_timeout,
			require_https: self.require_https,
		};

		config.validate()?;

		Ok(config)
	}
}

impl GatewayConfig {
	fn validate(&self) -> Result<(), GatewayConfigError> {
		if self.require_https {
			validate_https("api", &self.api_base)?;
			validate_https("auth", &self.auth_base)?;
		}

		Ok(())
	}
}

fn normalize_base(endpoint: &'static str, mut url: Url) -> Result<Url, GatewayConfigError> {
	if url.cannot_be_a_base() {
		return Err(GatewayConfigError::CannotBeABase { endpoint, url: url.to_string() });
	}
	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());

		url.set_path(&path);
	}

	url.set_query(None);
	url.set_fragment(None);

	Ok(url)
}

fn join_endpoint(base: &Url, name: &'static str) -> Result<Url, GatewayConfigError> {
	base.join(name).map_err(|source| GatewayConfigError::InvalidUrl { endpoint: name, source })
}

fn validate_https(endpoint: &'static str, url: &Url) -> Result<(), GatewayConfigError> {
	if url.scheme() != "https" {
		Err(GatewayConfigError::InsecureEndpoint { endpoint, url: url.to_string() })
	} else {
		Ok(())
	}
}

#[cfg(test)]
static API_BASE_URL_LOCK: Mutex<()> = parking_lot::const_mutex(());

/// Runs `f` with `API_BASE_URL` set to `value` (or unset), restoring the previous value afterwards.
#[cfg(test)]
pub(crate) fn with_api_base_var<R>(value: Option<&str>, f: impl FnOnce() -> R) -> R {
	fn apply(value: Option<&std::ffi::OsStr>) {
		// SAFETY: every test reading or writing `API_BASE_URL` holds `API_BASE_URL_LOCK`.
		unsafe {
			match value {
				Some(value) => std::env::set_var(API_BASE_URL_ENV, value),
				None => std::env::remove_var(API_BASE_URL_ENV),
			}
		}
	}

	let _guard = API_BASE_URL_LOCK.lock();
	let previous = std::env::var_os(API_BASE_URL_ENV);

	apply(value.map(std::ffi::OsStr::new));

	let output = f();

	apply(previous.as_deref());

	output
}
