//! The authenticated request gateway.
//!
//! [`Gateway::request`] resolves the target, attaches the stored bearer credential, and runs the
//! exchange through the configured [`HttpTransport`]. A `401` answer triggers one coordinated
//! refresh followed by exactly one retry; every other status, `403` included, is handed back
//! untouched. When the refresh fails the gateway clears the [`CredentialStore`], notifies the
//! [`SessionListener`] once for the episode, and returns [`Error::SessionEnded`] to every caller
//! that was waiting on it.

pub mod config;
pub mod coordinator;
pub mod options;

mod metrics;

pub use config::*;
pub use coordinator::RefreshPhase;
pub use metrics::RefreshMetrics;
pub use options::*;

// crates.io
use http::{Method, StatusCode};
// self
use crate::{
	_prelude::*,
	auth::{CredentialKey, CredentialPair},
	gateway::coordinator::{RefreshCoordinator, Settlement, Turn},
	http::{ApiRequest, ApiResponse, HttpTransport},
	identity::{self, LoginResponse},
	obs::{self, OpKind, OpOutcome, OpSpan},
	session::{NoopSessionListener, SessionEndReason, SessionListener},
	store::{CredentialStore, StoreError},
};
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, http::ReqwestTransport};

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport.
pub type ReqwestGateway = Gateway<ReqwestTransport>;

/// Keeps outbound requests authenticated against one API and one identity service.
///
/// Each gateway owns its refresh coordinator, so independent instances (per test, per tenant) never
/// share refresh state. Clones share everything, including the coordinator.
pub struct Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	transport: Arc<T>,
	store: Arc<dyn CredentialStore>,
	config: GatewayConfig,
	listener: Arc<dyn SessionListener>,
	refresh_metrics: Arc<RefreshMetrics>,
	coordinator: Arc<RefreshCoordinator>,
}
impl<T> Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a gateway that sends every exchange through `transport`.
	pub fn with_transport(
		config: GatewayConfig,
		store: Arc<dyn CredentialStore>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			config,
			listener: Arc::new(NoopSessionListener),
			refresh_metrics: Default::default(),
			coordinator: Default::default(),
		}
	}

	/// Installs the listener notified once per failed refresh episode.
	pub fn with_session_listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
		self.listener = listener;

		self
	}

	/// Configuration this gateway was built with.
	pub fn config(&self) -> &GatewayConfig {
		&self.config
	}

	/// Credential store shared with the embedding application.
	pub fn store(&self) -> &Arc<dyn CredentialStore> {
		&self.store
	}

	/// Current refresh coordinator phase.
	pub fn refresh_phase(&self) -> RefreshPhase {
		self.coordinator.phase()
	}

	/// Refresh counters for this gateway and its clones.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		&self.refresh_metrics
	}

	/// Issues an authenticated request.
	///
	/// Returns the upstream response for every status, including a `401` that survived the single
	/// retry. Absolute targets outside the API origin are sent without the stored credential and
	/// their responses are returned untouched. Transport failures propagate as [`Error::Transport`] and are never retried. A failed
	/// refresh yields [`Error::SessionEnded`].
	pub async fn request(
		&self,
		method: Method,
		target: &str,
		options: RequestOptions,
	) -> Result<ApiResponse> {
		const KIND: OpKind = OpKind::Request;

		let span = OpSpan::new(KIND, "request");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.dispatch(method, target, options)).await;

		obs::record_result(KIND, &result);

		result
	}

	/// Issues a `GET` request.
	pub async fn get(&self, target: &str, options: RequestOptions) -> Result<ApiResponse> {
		self.request(Method::GET, target, options).await
	}

	/// Issues a `POST` request.
	pub async fn post(&self, target: &str, options: RequestOptions) -> Result<ApiResponse> {
		self.request(Method::POST, target, options).await
	}

	/// Issues a `PUT` request.
	pub async fn put(&self, target: &str, options: RequestOptions) -> Result<ApiResponse> {
		self.request(Method::PUT, target, options).await
	}

	/// Issues a `DELETE` request.
	pub async fn delete(&self, target: &str, options: RequestOptions) -> Result<ApiResponse> {
		self.request(Method::DELETE, target, options).await
	}

	/// Signs in with a username and password and stores the issued pair.
	///
	/// Requests that were already in flight with the previous credential and later hit `401` retry
	/// with this pair instead of starting a refresh.
	pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
		const KIND: OpKind = OpKind::Login;

		let span = OpSpan::new(KIND, "login");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result: Result<LoginResponse> = span
			.instrument(async {
				let issued = identity::exchange_login(
					self.transport.as_ref(),
					&self.config.identity.login,
					username,
					password,
				)
				.await?;
				let pair = issued.credentials();
				let saved = pair.clone();

				self.coordinator
					.publish(move || self.store.save(saved), Settlement::Renewed(pair))
					.await?;

				Ok(issued)
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}

	/// Clears the stored pair.
	///
	/// In-flight requests that hit `401` afterwards fail with [`SessionEndReason::SignedOut`]; the
	/// session listener is not notified because the user ended the session.
	pub async fn logout(&self) -> Result<()> {
		self.coordinator
			.publish(|| self.store.clear(), Settlement::Ended(SessionEndReason::SignedOut))
			.await?;

		Ok(())
	}

	async fn dispatch(
		&self,
		method: Method,
		target: &str,
		options: RequestOptions,
	) -> Result<ApiResponse> {
		let mut url = self.config.resolve(target)?;

		options.apply_query(&mut url);

		if !self.config.is_api_origin(&url) {
			// Foreign origins never see the credential, and their 401s are not ours to recover.
			return self.send(&method, &url, &options, None).await;
		}

		// The generation must be read before the store so a refresh that lands in between is joined.
		let observed = self.coordinator.generation();
		let mut current = self.store.fetch().await?;
		let expiring = current.as_ref().is_some_and(|pair| {
			pair.access_expires_within(self.config.preemptive_window, OffsetDateTime::now_utc())
		});

		if expiring {
			current = Some(self.renew(observed).await?);
		}

		let response = self.send(&method, &url, &options, current.as_ref()).await?;

		if response.status() != StatusCode::UNAUTHORIZED || expiring {
			return Ok(response);
		}

		let renewed = self.renew(observed).await?;

		self.send(&method, &url, &options, Some(&renewed)).await
	}

	async fn send(
		&self,
		method: &Method,
		url: &Url,
		options: &RequestOptions,
		credential: Option<&CredentialPair>,
	) -> Result<ApiResponse> {
		let request = ApiRequest {
			method: method.clone(),
			url: url.clone(),
			headers: options.outbound_headers(credential.map(|pair| &pair.access_token))?,
			body: options.body.clone(),
		};

		Ok(self.transport.execute(request).await?)
	}

	async fn renew(&self, observed: u64) -> Result<CredentialPair> {
		let turn = self.coordinator.settle(observed, || self.lead_refresh()).await;

		if matches!(turn, Turn::Joined(_)) {
			self.refresh_metrics.record_joined();
			obs::refresh_joined(self.coordinator.generation());
		}

		match turn.into_settlement() {
			Settlement::Renewed(pair) => Ok(pair),
			Settlement::Ended(reason) => Err(Error::SessionEnded { reason }),
		}
	}

	async fn lead_refresh(&self) -> Settlement {
		const KIND: OpKind = OpKind::Refresh;

		let span = OpSpan::new(KIND, "lead_refresh");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);
		obs::refresh_led(self.coordinator.generation());
		self.refresh_metrics.record_attempt();

		let result = span.instrument(self.rotate()).await;

		obs::record_result(KIND, &result);

		match result {
			Ok(pair) => {
				self.refresh_metrics.record_success();

				Settlement::Renewed(pair)
			},
			Err(reason) => {
				self.refresh_metrics.record_failure();
				self.end_session(&reason).await;

				Settlement::Ended(reason)
			},
		}
	}

	async fn rotate(&self) -> Result<CredentialPair, SessionEndReason> {
		let exchange = self.exchange();

		match self.config.refresh_timeout {
			Some(limit) => tokio::time::timeout(limit, exchange)
				.await
				.unwrap_or(Err(SessionEndReason::RefreshTimedOut)),
			None => exchange.await,
		}
	}

	async fn exchange(&self) -> Result<CredentialPair, SessionEndReason> {
		let store_failure = |e: StoreError| SessionEndReason::StoreFailure { message: e.to_string() };
		let refresh_token = self
			.store
			.get(CredentialKey::RefreshToken)
			.await
			.map_err(store_failure)?
			.ok_or(SessionEndReason::RefreshUnavailable)?;
		let pair = identity::exchange_refresh(
			self.transport.as_ref(),
			&self.config.identity.refresh,
			&refresh_token,
		)
		.await?;

		self.store.save(pair.clone()).await.map_err(store_failure)?;

		Ok(pair)
	}

	async fn end_session(&self, reason: &SessionEndReason) {
		if let Err(e) = self.store.clear().await {
			obs::store_clear_failed(&e);
		}

		obs::session_ended(reason);
		self.listener.session_ended(reason);
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestTransport> {
	/// Creates a gateway backed by a default reqwest client.
	pub fn new(config: GatewayConfig, store: Arc<dyn CredentialStore>) -> Self {
		Self::with_transport(config, store, ReqwestTransport::default())
	}

	/// Creates a gateway for the API named by `API_BASE_URL`; see [`GatewayConfig::from_env`].
	pub fn from_env(store: Arc<dyn CredentialStore>) -> Result<Self, ConfigError> {
		Ok(Self::new(GatewayConfig::from_env()?, store))
	}
}
impl<T> Clone for Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			store: self.store.clone(),
			config: self.config.clone(),
			listener: self.listener.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			coordinator: self.coordinator.clone(),
		}
	}
}
impl<T> Debug for Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("config", &self.config)
			.field("coordinator", &self.coordinator)
			.finish()
	}
}
