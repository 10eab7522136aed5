//! Authenticated request gateway: attaches bearer credentials to outbound HTTP calls, recovers from
//! `401` with exactly one coalesced refresh, and degrades cleanly to a signed-out state when
//! renewal fails.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod error;
pub mod gateway;
pub mod http;
pub mod identity;
pub mod obs;
pub mod session;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		gateway::{GatewayConfig, ReqwestGateway},
		session::SessionLog,
		store::{CredentialStore, MemoryStore},
	};

	/// Builds a reqwest-backed [`ReqwestGateway`] pointed at `api_base` (typically an `httpmock`
	/// server), with an in-memory store and a recording session listener.
	pub fn build_reqwest_test_gateway(
		api_base: &str,
	) -> (ReqwestGateway, Arc<MemoryStore>, Arc<SessionLog>) {
		let api_base = Url::parse(api_base).expect("Test API base should parse.");
		let config = GatewayConfig::builder()
			.api_base(api_base)
			.build()
			.expect("Test gateway configuration should build.");
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn CredentialStore> = store_backend.clone();
		let log = Arc::new(SessionLog::default());
		let gateway = ReqwestGateway::new(config, store).with_session_listener(log.clone());

		(gateway, store_backend, log)
	}
}

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use ::http as http_types;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
